//! HTML 页面与静态资源

pub mod handler;

use axum::{routing::get, Router};
use std::path::Path;
use tower_http::services::ServeDir;

use super::AppState;

/// 页面路由，未匹配的路径到 `static_dir` 中查找
pub fn routes(static_dir: &Path) -> Router<AppState> {
    Router::new()
        .route("/", get(handler::home_redirect))
        .route("/index.html", get(handler::home_redirect))
        .route("/main", get(handler::main_page))
        .route("/market.html", get(handler::market_page))
        .fallback_service(ServeDir::new(static_dir))
}
