//! # Storefront
//!
//! 小型店面服务器：三个 HTML 页面，加上账号与商品的 JSON 接口，
//! 数据持久化为两个平面 JSON 文件。
//!
//! - `app`：按功能划分的路由、处理函数与业务服务
//! - `core`：错误类型、响应封装、会话与中间件
//! - `infrastructure`：配置、日志与文件存储

pub mod app;
pub mod core;
pub mod infrastructure;

pub use app::{router, AppState};
