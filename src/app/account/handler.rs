//! 账号接口处理函数

use axum::{
    extract::{Query, State},
    http::header::SET_COOKIE,
    response::IntoResponse,
};
use tracing::info;

use super::model::{
    AccountExists, AccountQuery, CodeRequest, Credentials, EmailChangeRequest, LoggedIn, Profile,
    ResetPasswordRequest, ResetToken, UpdateProfileRequest,
};
use super::verification::is_valid_code;
use crate::app::AppState;
use crate::core::{
    error::AppError,
    response::{ApiJson, ApiResponse},
    session::CurrentUser,
};

pub async fn register(
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> Result<impl IntoResponse, AppError> {
    state.users.register(credentials).await?;
    Ok(ApiResponse::ack())
}

/// 旧版的整库导出接口，已停用
pub async fn storage_disabled() -> AppError {
    AppError::NotFound("not allowed".to_string())
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .users
        .authenticate(&credentials.username, &credentials.password)
        .await?;
    info!("{} 已登录", user.username);

    let cookie = state.sessions.login_cookie(&user.username);
    Ok((
        [(SET_COOKIE, cookie)],
        ApiResponse::success(LoggedIn {
            username: user.username,
        }),
    ))
}

pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    ([(SET_COOKIE, state.sessions.logout_cookie())], ApiResponse::ack())
}

pub async fn me(
    State(state): State<AppState>,
    CurrentUser(username): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let user = state.users.profile(&username)?;
    Ok(ApiResponse::success(Profile::from(user)))
}

pub async fn account_exists(
    State(state): State<AppState>,
    Query(query): Query<AccountQuery>,
) -> Result<impl IntoResponse, AppError> {
    let username = query.username.trim();
    let exists = !username.is_empty() && state.users.exists(username)?;
    Ok(ApiResponse::success(AccountExists { exists }))
}

/// 修改用户名时会话随之迁移
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(username): CurrentUser,
    ApiJson(request): ApiJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .users
        .update_profile(&username, request.field, &request.value)?;

    let cookie = state.sessions.login_cookie(&user.username);
    Ok(([(SET_COOKIE, cookie)], ApiResponse::ack()))
}

pub async fn request_code(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CodeRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .verification
        .request_code(request.username.trim(), request.code.trim())?;
    Ok(ApiResponse::ack())
}

/// 验证码正确即登录，并返回重置密码用的令牌
pub async fn verify_code(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CodeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let username = request.username.trim();
    if username.is_empty() || request.code.trim().is_empty() {
        return Err(AppError::BadRequest("username and code are required".to_string()));
    }

    let token = state.verification.verify_code(username, request.code.trim())?;
    let cookie = state.sessions.login_cookie(username);
    Ok(([(SET_COOKIE, cookie)], ApiResponse::success(ResetToken { token })))
}

pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let username = request.username.trim();
    let new_password = request.new_password.trim();
    let token = request.token.trim();
    if username.is_empty() || new_password.is_empty() || token.is_empty() {
        return Err(AppError::BadRequest(
            "username, new_password and token are required".to_string(),
        ));
    }

    state.verification.redeem_token(username, token)?;
    state.users.set_password(username, new_password).await?;
    info!("{} 已重置密码", username);
    Ok(ApiResponse::ack())
}

pub async fn request_email_change(
    State(state): State<AppState>,
    CurrentUser(username): CurrentUser,
    ApiJson(request): ApiJson<EmailChangeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let new_email = request.new_email.trim();
    let code = request.code.trim();
    if new_email.is_empty() || !is_valid_code(code) {
        return Err(AppError::BadRequest("invalid input".to_string()));
    }
    if state.users.exists(new_email)? {
        return Err(AppError::Conflict("email exists".to_string()));
    }

    state
        .verification
        .request_email_change(&username, new_email, code)?;
    Ok(ApiResponse::ack())
}

pub async fn confirm_email_change(
    State(state): State<AppState>,
    CurrentUser(username): CurrentUser,
    ApiJson(request): ApiJson<EmailChangeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let new_email = request.new_email.trim();
    let code = request.code.trim();
    if new_email.is_empty() || code.is_empty() {
        return Err(AppError::BadRequest("new_email and code are required".to_string()));
    }

    state
        .verification
        .check_email_change(&username, new_email, code)?;
    let user = state.users.rename(&username, new_email)?;
    state.verification.finish_email_change(&username);

    let cookie = state.sessions.login_cookie(&user.username);
    Ok(([(SET_COOKIE, cookie)], ApiResponse::ack()))
}
