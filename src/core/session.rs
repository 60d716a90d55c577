//! 签名会话 cookie
//!
//! cookie 值为 `base64url(payload).hex(hmac_sha256(base64url(payload)))`，
//! 其中 payload 为 `{"sub": <用户名>, "iat": <Unix 秒>}`。服务端不保存会话，
//! 签名即凭证。

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;

use super::error::AppError;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("malformed session token")]
    Malformed,
    #[error("bad session signature")]
    BadSignature,
    #[error("session expired")]
    Expired,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
}

/// 使用进程密钥签发与校验会话 cookie
#[derive(Clone)]
pub struct SessionKeys {
    secret: Arc<[u8]>,
    cookie_name: Arc<str>,
    max_age_seconds: u64,
}

impl SessionKeys {
    pub fn new(secret: &str, cookie_name: &str, max_age_seconds: u64) -> Self {
        Self {
            secret: Arc::from(secret.as_bytes()),
            cookie_name: Arc::from(cookie_name),
            max_age_seconds,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC 接受任意长度的密钥
        HmacSha256::new_from_slice(&self.secret).expect("HMAC key of any size")
    }

    pub fn sign(&self, username: &str) -> String {
        self.sign_at(username, chrono::Utc::now().timestamp())
    }

    fn sign_at(&self, username: &str, issued_at: i64) -> String {
        let claims = Claims {
            sub: username.to_string(),
            iat: issued_at,
        };
        // 仅含字符串与整数的结构体序列化不会失败
        let json = serde_json::to_vec(&claims).unwrap_or_default();
        let payload = URL_SAFE_NO_PAD.encode(json);

        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        format!("{payload}.{signature}")
    }

    /// 返回有效且未过期令牌中的用户名
    pub fn verify(&self, token: &str) -> Result<String, SessionError> {
        let (payload, signature) = token.split_once('.').ok_or(SessionError::Malformed)?;
        let signature = hex::decode(signature).map_err(|_| SessionError::Malformed)?;

        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| SessionError::BadSignature)?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| SessionError::Malformed)?;
        let claims: Claims = serde_json::from_slice(&json).map_err(|_| SessionError::Malformed)?;

        let age = chrono::Utc::now().timestamp() - claims.iat;
        if age < 0 || age as u64 > self.max_age_seconds {
            return Err(SessionError::Expired);
        }
        Ok(claims.sub)
    }

    /// 为 `username` 建立会话的 `Set-Cookie` 值
    pub fn login_cookie(&self, username: &str) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.cookie_name,
            self.sign(username),
            self.max_age_seconds
        )
    }

    /// 清除会话 cookie 的 `Set-Cookie` 值
    pub fn logout_cookie(&self) -> String {
        format!(
            "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
            self.cookie_name
        )
    }

    /// 请求 `Cookie` 头中会话对应的用户名
    pub fn principal(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .filter(|(name, _)| *name == self.cookie_name())
            .find_map(|(_, value)| self.verify(value).ok())
    }
}

/// 已登录用户，无有效会话时返回 401
#[derive(Debug, Clone)]
pub struct CurrentUser(pub String);

/// 已登录用户（可选）
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    SessionKeys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        SessionKeys::from_ref(state)
            .principal(&parts.headers)
            .map(CurrentUser)
            .ok_or(AppError::Unauthorized)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    SessionKeys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(SessionKeys::from_ref(state).principal(&parts.headers)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn keys() -> SessionKeys {
        SessionKeys::new("test-secret", "session", 3600)
    }

    #[test]
    fn test_sign_then_verify() {
        let keys = keys();
        let token = keys.sign("alice@example.com");
        assert_eq!(keys.verify(&token).unwrap(), "alice@example.com");
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let keys = keys();
        let token = keys.sign("alice");
        let (_, signature) = token.split_once('.').unwrap();
        let forged_payload = URL_SAFE_NO_PAD.encode(br#"{"sub":"mallory","iat":0}"#);

        let forged = format!("{forged_payload}.{signature}");
        assert_eq!(keys.verify(&forged), Err(SessionError::BadSignature));
    }

    #[test]
    fn test_other_secret_is_rejected() {
        let token = SessionKeys::new("another-secret", "session", 3600).sign("alice");
        assert_eq!(keys().verify(&token), Err(SessionError::BadSignature));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let keys = keys();
        let token = keys.sign_at("alice", chrono::Utc::now().timestamp() - 7200);
        assert_eq!(keys.verify(&token), Err(SessionError::Expired));
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert_eq!(keys().verify("no-dot-here"), Err(SessionError::Malformed));
        assert_eq!(keys().verify("abc.zz"), Err(SessionError::Malformed));
    }

    #[test]
    fn test_principal_from_cookie_header() {
        let keys = keys();
        let mut headers = HeaderMap::new();
        let cookie = format!("theme=dark; session={}; lang=en", keys.sign("bob"));
        headers.insert(header::COOKIE, HeaderValue::from_str(&cookie).unwrap());

        assert_eq!(keys.principal(&headers).as_deref(), Some("bob"));
    }

    #[test]
    fn test_logout_cookie_expires_immediately() {
        assert!(keys().logout_cookie().contains("Max-Age=0"));
    }
}
