//! 页面处理函数

use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use std::path::Path;
use tracing::warn;

use crate::app::AppState;
use crate::core::{error::AppError, session::MaybeUser};

pub async fn home_redirect() -> Redirect {
    Redirect::to("/main")
}

pub async fn main_page(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    read_page(&state.static_dir, "index.html").await
}

/// 市场页需要登录，未登录访客跳回首页
pub async fn market_page(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
) -> Result<Response, AppError> {
    if user.is_none() {
        return Ok(Redirect::to("/main?login_required=1").into_response());
    }
    Ok(read_page(&state.static_dir, "market.html").await?.into_response())
}

async fn read_page(dir: &Path, file: &str) -> Result<Html<String>, AppError> {
    let path = dir.join(file);
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => Ok(Html(content)),
        Err(e) => {
            warn!("无法读取 {}: {}", path.display(), e);
            Err(AppError::NotFound(format!("{file} not found")))
        }
    }
}
