//! 市场接口处理函数

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
};

use super::model::{Created, NewProduct, ProductFilter, ProductItem, ProductView, Seller};
use crate::app::AppState;
use crate::core::{
    error::AppError,
    response::{ApiJson, ApiResponse},
    session::{CurrentUser, MaybeUser},
};

/// 商品列表以 JSON 数组返回，可按 `cat` 与 `sub` 过滤
pub async fn list_products(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<Vec<ProductView>>, AppError> {
    let products = state.products.list(&filter)?;
    let views = products
        .into_iter()
        .map(|p| ProductView::for_viewer(p, viewer.as_deref()))
        .collect();
    Ok(Json(views))
}

pub async fn create_product(
    State(state): State<AppState>,
    CurrentUser(username): CurrentUser,
    ApiJson(new): ApiJson<NewProduct>,
) -> Result<impl IntoResponse, AppError> {
    let seller = seller_for(&state, &username)?;
    let product = state.products.create(&seller, new)?;
    Ok(ApiResponse::success(Created { id: product.id }))
}

pub async fn get_product(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let product = state.products.get(&id)?;
    Ok(ApiResponse::success(ProductItem {
        item: ProductView::for_viewer(product, viewer.as_deref()),
    }))
}

pub async fn delete_product(
    State(state): State<AppState>,
    CurrentUser(username): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.products.delete(&id, &username)?;
    Ok(ApiResponse::ack())
}

/// `username` 的卖家信息，没有昵称时取 `@` 之前的部分
fn seller_for(state: &AppState, username: &str) -> Result<Seller, AppError> {
    let user = state.users.find(username)?;
    let fallback = username.split('@').next().unwrap_or(username);
    let (name, code) = match user {
        Some(user) if !user.name.is_empty() => (user.name, user.code.unwrap_or_default()),
        Some(user) => (fallback.to_string(), user.code.unwrap_or_default()),
        None => (fallback.to_string(), String::new()),
    };
    Ok(Seller {
        username: username.to_string(),
        name,
        code,
    })
}
