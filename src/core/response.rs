//! 核心响应处理

use axum::{
    extract::FromRequest,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use super::error::AppError;

/// 成功响应体：`{"ok": true, ...data}`
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(flatten)]
    pub data: T,
    pub request_id: String,
    pub timestamp: String,
}

/// 仅确认成功的接口使用的空载荷
#[derive(Debug, Serialize)]
pub struct Ack {}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            ok: true,
            data,
            request_id: Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl ApiResponse<Ack> {
    pub fn ack() -> Self {
        Self::success(Ack {})
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// 拒绝类型为 [`AppError`] 的 `Json` 提取器，请求体格式错误时返回统一的错误结构
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);
