//! 短时效验证状态
//!
//! 验证码由客户端生成并自行发送邮件，服务端只保存用于之后比对。
//! 所有状态都在进程内存中，重启即丢失。

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::core::error::AppError;

pub const CODE_TTL: Duration = Duration::from_secs(5 * 60);
pub const TOKEN_TTL: Duration = Duration::from_secs(5 * 60);

struct Expiring<T> {
    value: T,
    expires_at: Instant,
}

impl<T> Expiring<T> {
    fn new(value: T, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

struct PendingEmailChange {
    new_email: String,
    code: String,
}

#[derive(Default)]
struct Entries {
    /// 用户名 -> 登录/重置验证码
    codes: HashMap<String, Expiring<String>>,
    /// 用户名 -> 重置密码令牌
    tokens: HashMap<String, Expiring<String>>,
    /// 当前用户名 -> 待确认的邮箱变更
    email_changes: HashMap<String, Expiring<PendingEmailChange>>,
}

impl Entries {
    fn purge_expired(&mut self) {
        let now = Instant::now();
        self.codes.retain(|_, e| e.is_live(now));
        self.tokens.retain(|_, e| e.is_live(now));
        self.email_changes.retain(|_, e| e.is_live(now));
    }
}

#[derive(Clone)]
pub struct VerificationStore {
    entries: Arc<Mutex<Entries>>,
    code_ttl: Duration,
    token_ttl: Duration,
}

impl Default for VerificationStore {
    fn default() -> Self {
        Self::with_ttl(CODE_TTL, TOKEN_TTL)
    }
}

/// 六位 ASCII 数字
pub fn is_valid_code(code: &str) -> bool {
    code.len() == 6 && code.bytes().all(|b| b.is_ascii_digit())
}

fn invalid() -> AppError {
    AppError::BadRequest("invalid or expired code".to_string())
}

impl VerificationStore {
    pub fn with_ttl(code_ttl: Duration, token_ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(Entries::default())),
            code_ttl,
            token_ttl,
        }
    }

    /// 加锁并清理已过期的条目
    fn live(&self) -> MutexGuard<'_, Entries> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.purge_expired();
        entries
    }

    /// 记录 `username` 的验证码，覆盖之前的值
    pub fn request_code(&self, username: &str, code: &str) -> Result<(), AppError> {
        if username.is_empty() || !is_valid_code(code) {
            return Err(AppError::BadRequest("a 6 digit code is required".to_string()));
        }
        self.live().codes.insert(
            username.to_string(),
            Expiring::new(code.to_string(), self.code_ttl),
        );
        Ok(())
    }

    /// 消费匹配的验证码，签发一次性重置令牌
    pub fn verify_code(&self, username: &str, code: &str) -> Result<String, AppError> {
        let mut entries = self.live();
        let matches = entries
            .codes
            .get(username)
            .is_some_and(|entry| !code.is_empty() && entry.value == code);
        if !matches {
            return Err(invalid());
        }
        entries.codes.remove(username);

        let token = Uuid::new_v4().simple().to_string();
        entries.tokens.insert(
            username.to_string(),
            Expiring::new(token.clone(), self.token_ttl),
        );
        Ok(token)
    }

    /// 令牌匹配时将其消费
    pub fn redeem_token(&self, username: &str, token: &str) -> Result<(), AppError> {
        let mut entries = self.live();
        let matches = entries
            .tokens
            .get(username)
            .is_some_and(|entry| !token.is_empty() && entry.value == token);
        if !matches {
            return Err(AppError::BadRequest("invalid or expired token".to_string()));
        }
        entries.tokens.remove(username);
        Ok(())
    }

    pub fn request_email_change(
        &self,
        current: &str,
        new_email: &str,
        code: &str,
    ) -> Result<(), AppError> {
        if new_email.is_empty() || !is_valid_code(code) {
            return Err(AppError::BadRequest("invalid input".to_string()));
        }
        let pending = PendingEmailChange {
            new_email: new_email.to_string(),
            code: code.to_string(),
        };
        self.live()
            .email_changes
            .insert(current.to_string(), Expiring::new(pending, self.code_ttl));
        Ok(())
    }

    /// 校验待确认的变更，但不消费
    pub fn check_email_change(
        &self,
        current: &str,
        new_email: &str,
        code: &str,
    ) -> Result<(), AppError> {
        match self.live().email_changes.get(current) {
            Some(entry) if entry.value.new_email == new_email && entry.value.code == code => Ok(()),
            _ => Err(invalid()),
        }
    }

    pub fn finish_email_change(&self, current: &str) {
        self.live().email_changes.remove(current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_format() {
        assert!(is_valid_code("012345"));
        assert!(!is_valid_code("12345"));
        assert!(!is_valid_code("12345a"));
        assert!(!is_valid_code("１２３４５６"));
    }

    #[test]
    fn test_code_is_single_use() {
        let store = VerificationStore::default();
        store.request_code("alice", "123456").unwrap();

        assert!(store.verify_code("alice", "654321").is_err());
        let token = store.verify_code("alice", "123456").unwrap();
        assert!(!token.is_empty());
        assert!(store.verify_code("alice", "123456").is_err());
    }

    #[test]
    fn test_token_is_single_use() {
        let store = VerificationStore::default();
        store.request_code("alice", "123456").unwrap();
        let token = store.verify_code("alice", "123456").unwrap();

        assert!(store.redeem_token("alice", "wrong").is_err());
        assert!(store.redeem_token("bob", &token).is_err());
        store.redeem_token("alice", &token).unwrap();
        assert!(store.redeem_token("alice", &token).is_err());
    }

    #[test]
    fn test_expired_code_is_rejected() {
        let store = VerificationStore::with_ttl(Duration::ZERO, TOKEN_TTL);
        store.request_code("alice", "123456").unwrap();
        assert!(store.verify_code("alice", "123456").is_err());
    }

    #[test]
    fn test_email_change_must_match() {
        let store = VerificationStore::default();
        store
            .request_email_change("alice", "new@example.com", "111111")
            .unwrap();

        assert!(store.check_email_change("alice", "other@example.com", "111111").is_err());
        assert!(store.check_email_change("alice", "new@example.com", "222222").is_err());
        store
            .check_email_change("alice", "new@example.com", "111111")
            .unwrap();

        store.finish_email_change("alice");
        assert!(store.check_email_change("alice", "new@example.com", "111111").is_err());
    }
}
