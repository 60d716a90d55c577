//! 账号数据模型

use serde::{Deserialize, Serialize};

/// 存储的用户记录。`username` 是唯一键，历史上存的是邮箱，
/// 因此仍兼容旧字段名 `email`/`pass`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(alias = "email")]
    pub username: String,
    /// argon2 PHC 字符串，或旧版明文密码
    #[serde(alias = "pass")]
    pub password: String,
    #[serde(default)]
    pub name: String,
    /// Unix 时间戳（秒）
    #[serde(default)]
    pub created_at: i64,
    /// 不可变的公开编码，缺失时补齐
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub email_changed: bool,
    #[serde(default)]
    pub name_changed: bool,
}

/// `GET /api/me` 返回的当前用户信息
#[derive(Debug, Serialize)]
pub struct Profile {
    pub username: String,
    pub name: String,
    pub email_changed: bool,
    pub name_changed: bool,
    pub code: String,
}

impl From<User> for Profile {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            name: user.name,
            email_changed: user.email_changed,
            name_changed: user.name_changed,
            code: user.code.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default, alias = "email")]
    pub username: String,
    #[serde(default, alias = "pass")]
    pub password: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AccountQuery {
    #[serde(default, alias = "email")]
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct AccountExists {
    pub exists: bool,
}

#[derive(Debug, Serialize)]
pub struct LoggedIn {
    pub username: String,
}

/// 各自只能修改一次的资料字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileField {
    /// 用户名（邮箱）
    Email,
    Name,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub field: ProfileField,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct CodeRequest {
    #[serde(default, alias = "email")]
    pub username: String,
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct ResetToken {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default, alias = "email")]
    pub username: String,
    #[serde(default, alias = "new_pass")]
    pub new_password: String,
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailChangeRequest {
    #[serde(default)]
    pub new_email: String,
    #[serde(default)]
    pub code: String,
}
