//! 应用层：共享状态与路由表

pub mod account;
pub mod market;
pub mod pages;

use axum::{extract::FromRef, middleware, Router};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::core::{middleware::request_logging_middleware, session::SessionKeys};
use crate::infrastructure::{config::Config, storage::JsonFileStorage};
use account::{service::UserService, verification::VerificationStore};
use market::service::ProductService;

/// 注入到每个处理函数的状态
#[derive(Clone, FromRef)]
pub struct AppState {
    pub users: UserService,
    pub products: ProductService,
    pub sessions: SessionKeys,
    pub verification: VerificationStore,
    pub static_dir: PathBuf,
}

impl AppState {
    /// 基于 `config` 中 JSON 文件的状态
    pub fn from_config(config: &Config) -> Self {
        let users = UserService::new(Arc::new(JsonFileStorage::new(config.storage.users_path())));
        let products =
            ProductService::new(Arc::new(JsonFileStorage::new(config.storage.products_path())));
        let sessions = SessionKeys::new(
            &config.session.secret_key,
            &config.session.cookie_name,
            config.session.max_age_seconds,
        );

        Self {
            users,
            products,
            sessions,
            verification: VerificationStore::default(),
            static_dir: config.storage.static_dir.clone(),
        }
    }
}

/// 完整路由：`/api/*` 接口、页面与静态文件
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    let api = Router::new()
        .merge(account::routes())
        .merge(market::routes());

    Router::new()
        .nest("/api", api)
        .merge(pages::routes(&state.static_dir))
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}
