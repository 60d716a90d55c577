//! 所有处理函数共用的框架层组件

pub mod error;
pub mod middleware;
pub mod response;
pub mod session;
