//! 账号模块：注册、登录、资料修改与验证码流程

pub mod handler;
pub mod model;
pub mod password;
pub mod service;
pub mod verification;

use axum::{
    routing::{get, post},
    Router,
};

use super::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handler::register))
        // 旧客户端通过此路径注册；数据导出已停用
        .route(
            "/storage",
            post(handler::register).get(handler::storage_disabled),
        )
        .route("/login", post(handler::login))
        .route("/logout", post(handler::logout))
        .route("/me", get(handler::me))
        .route("/account_exists", get(handler::account_exists))
        .route("/update_profile", post(handler::update_profile))
        .route("/request_code", post(handler::request_code))
        .route("/verify_code", post(handler::verify_code))
        .route("/reset_password", post(handler::reset_password))
        .route("/request_email_change", post(handler::request_email_change))
        .route("/confirm_email_change", post(handler::confirm_email_change))
}
