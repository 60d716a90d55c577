//! 密码哈希与用户编码
//!
//! argon2 计算耗时，异步路径上统一通过 `hash_password_blocking` /
//! `verify_password_blocking` 放到阻塞线程池执行，避免占住 tokio 工作线程。

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::{distributions::Alphanumeric, Rng};
use std::collections::HashSet;

use crate::core::error::AppError;

pub const USER_CODE_LEN: usize = 7;

/// 生成 `password` 的 argon2id PHC 字符串
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

/// 校验 `candidate`。无法解析为 PHC 的存量值是旧版明文，直接比较。
pub fn verify_password(stored: &str, candidate: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => !stored.is_empty() && stored == candidate,
    }
}

/// 存量值是否为旧版明文（需要重新哈希）
pub fn needs_rehash(stored: &str) -> bool {
    PasswordHash::new(stored).is_err()
}

/// 在阻塞线程池中执行 `hash_password`
pub async fn hash_password_blocking(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(format!("password hashing task failed: {e}")))?
}

/// 在阻塞线程池中执行 `verify_password`
pub async fn verify_password_blocking(stored: String, candidate: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify_password(&stored, &candidate))
        .await
        .map_err(|e| AppError::Internal(format!("password check task failed: {e}")))
}

/// 随机编码：首字符为字母，其余为字母或数字，且不与 `existing` 重复
pub fn generate_user_code(existing: &HashSet<String>) -> String {
    let mut rng = rand::thread_rng();
    loop {
        let first = loop {
            let c = rng.sample(Alphanumeric) as char;
            if c.is_ascii_alphabetic() {
                break c;
            }
        };
        let code: String = std::iter::once(first)
            .chain((1..USER_CODE_LEN).map(|_| rng.sample(Alphanumeric) as char))
            .collect();
        if !existing.contains(&code) {
            return code;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("pw123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "pw123"));
        assert!(!verify_password(&hash, "pw124"));
    }

    #[test]
    fn test_legacy_plaintext() {
        assert!(verify_password("letmein", "letmein"));
        assert!(!verify_password("letmein", "letmeout"));
        assert!(!verify_password("", ""));
    }

    #[tokio::test]
    async fn test_blocking_wrappers() {
        let hash = hash_password_blocking("pw123".to_string()).await.unwrap();
        assert!(verify_password_blocking(hash.clone(), "pw123".to_string())
            .await
            .unwrap());
        assert!(!verify_password_blocking(hash, "nope".to_string())
            .await
            .unwrap());
    }

    #[test]
    fn test_user_code_shape() {
        let existing = HashSet::new();
        for _ in 0..50 {
            let code = generate_user_code(&existing);
            assert_eq!(code.len(), USER_CODE_LEN);
            assert!(code.chars().next().unwrap().is_ascii_alphabetic());
            assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }
}
