//! 账号业务逻辑
//!
//! 所有读改写都在 `write_lock` 内完成；argon2 计算放在锁外的阻塞线程池中。

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

use super::model::{Credentials, ProfileField, User};
use super::password::{
    generate_user_code, hash_password_blocking, needs_rehash, verify_password_blocking,
};
use crate::core::error::AppError;
use crate::infrastructure::storage::Storage;

#[derive(Clone)]
pub struct UserService {
    storage: Arc<dyn Storage<User>>,
    write_lock: Arc<Mutex<()>>,
}

impl UserService {
    pub fn new(storage: Arc<dyn Storage<User>>) -> Self {
        Self {
            storage,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// 进程内串行化读改写
    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn find(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .storage
            .load()?
            .into_iter()
            .find(|u| u.username == username))
    }

    pub fn exists(&self, username: &str) -> Result<bool, AppError> {
        Ok(self.find(username)?.is_some())
    }

    /// 为缺少编码的用户补齐编码，返回补齐的数量
    pub fn backfill_codes(&self) -> Result<usize, AppError> {
        let _guard = self.lock();
        let mut users = self.storage.load()?;

        let mut changed = 0;
        for idx in 0..users.len() {
            if ensure_code(&mut users, idx) {
                changed += 1;
            }
        }
        if changed > 0 {
            self.storage.save(&users)?;
        }
        Ok(changed)
    }

    /// 注册新账号。哈希在加锁前完成，锁内只做查重与写入。
    pub async fn register(&self, credentials: Credentials) -> Result<User, AppError> {
        let username = credentials.username.trim();
        let password = credentials.password.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AppError::BadRequest(
                "username and password are required".to_string(),
            ));
        }
        // 提前拒绝已存在的账号，省去一次哈希；锁内仍会再查一次
        if self.exists(username)? {
            return Err(AppError::Conflict("account exists".to_string()));
        }

        let hash = hash_password_blocking(password.to_string()).await?;
        let user = self.insert(User {
            username: username.to_string(),
            password: hash,
            name: credentials.name.trim().to_string(),
            created_at: chrono::Utc::now().timestamp(),
            code: None,
            email_changed: false,
            name_changed: false,
        })?;

        info!("已注册账号 {}", user.username);
        Ok(user)
    }

    fn insert(&self, user: User) -> Result<User, AppError> {
        let _guard = self.lock();
        let mut users = self.storage.load()?;
        if users.iter().any(|u| u.username == user.username) {
            return Err(AppError::Conflict("account exists".to_string()));
        }

        users.push(user);
        let idx = users.len() - 1;
        ensure_code(&mut users, idx);
        self.storage.save(&users)?;
        Ok(users[idx].clone())
    }

    /// 校验凭据。旧版明文密码在登录成功后升级为哈希。
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, AppError> {
        let username = username.trim();
        let password = password.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AppError::BadRequest(
                "username and password are required".to_string(),
            ));
        }

        let user = self.find(username)?.ok_or(AppError::Unauthorized)?;
        if !verify_password_blocking(user.password.clone(), password.to_string()).await? {
            return Err(AppError::Unauthorized);
        }

        let upgraded = if needs_rehash(&user.password) {
            Some(hash_password_blocking(password.to_string()).await?)
        } else {
            None
        };
        self.record_login(username, &user.password, upgraded)
    }

    /// 登录成功后的写回：补齐编码，并在密码未被并发修改时写入升级后的哈希
    fn record_login(
        &self,
        username: &str,
        verified: &str,
        upgraded: Option<String>,
    ) -> Result<User, AppError> {
        let _guard = self.lock();
        let mut users = self.storage.load()?;
        let idx = users
            .iter()
            .position(|u| u.username == username)
            .ok_or(AppError::Unauthorized)?;

        let mut dirty = ensure_code(&mut users, idx);
        if let Some(hash) = upgraded {
            if users[idx].password == verified {
                users[idx].password = hash;
                dirty = true;
            }
        }
        if dirty {
            self.storage.save(&users)?;
        }
        Ok(users[idx].clone())
    }

    /// 会话对应的用户，必要时补齐编码
    pub fn profile(&self, username: &str) -> Result<User, AppError> {
        let _guard = self.lock();
        let mut users = self.storage.load()?;
        let idx = position(&users, username)?;
        if ensure_code(&mut users, idx) {
            self.storage.save(&users)?;
        }
        Ok(users[idx].clone())
    }

    /// 修改用户名或昵称，各自只能修改一次
    pub fn update_profile(
        &self,
        current: &str,
        field: ProfileField,
        value: &str,
    ) -> Result<User, AppError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(AppError::BadRequest("value is required".to_string()));
        }

        let _guard = self.lock();
        let mut users = self.storage.load()?;
        let idx = position(&users, current)?;

        match field {
            ProfileField::Email => {
                if users[idx].email_changed {
                    return Err(AppError::Forbidden("email already changed".to_string()));
                }
                if value != current && users.iter().any(|u| u.username == value) {
                    return Err(AppError::Conflict("email exists".to_string()));
                }
                users[idx].username = value.to_string();
                users[idx].email_changed = true;
            }
            ProfileField::Name => {
                if users[idx].name_changed {
                    return Err(AppError::Forbidden("name already changed".to_string()));
                }
                users[idx].name = value.to_string();
                users[idx].name_changed = true;
            }
        }

        self.storage.save(&users)?;
        Ok(users[idx].clone())
    }

    /// 验证通过后把账号迁移到新用户名
    pub fn rename(&self, current: &str, new_username: &str) -> Result<User, AppError> {
        let _guard = self.lock();
        let mut users = self.storage.load()?;
        if users.iter().any(|u| u.username == new_username) {
            return Err(AppError::Conflict("email exists".to_string()));
        }
        let idx = position(&users, current)?;

        users[idx].username = new_username.to_string();
        users[idx].email_changed = true;
        self.storage.save(&users)?;

        info!("账号 {} 已更名为 {}", current, new_username);
        Ok(users[idx].clone())
    }

    pub async fn set_password(&self, username: &str, new_password: &str) -> Result<(), AppError> {
        let hash = hash_password_blocking(new_password.to_string()).await?;

        let _guard = self.lock();
        let mut users = self.storage.load()?;
        let idx = position(&users, username)?;

        users[idx].password = hash;
        self.storage.save(&users)?;
        Ok(())
    }
}

fn position(users: &[User], username: &str) -> Result<usize, AppError> {
    users
        .iter()
        .position(|u| u.username == username)
        .ok_or_else(|| AppError::NotFound("account not found".to_string()))
}

/// `users[idx]` 没有编码时分配一个唯一编码，返回是否有改动
fn ensure_code(users: &mut [User], idx: usize) -> bool {
    if users[idx].code.as_deref().is_some_and(|c| !c.is_empty()) {
        return false;
    }
    let existing: HashSet<String> = users.iter().filter_map(|u| u.code.clone()).collect();
    users[idx].code = Some(generate_user_code(&existing));
    true
}
