//! 市场业务逻辑

use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;
use uuid::Uuid;

use super::model::{NewProduct, Product, ProductFilter, Seller};
use crate::core::error::AppError;
use crate::infrastructure::storage::Storage;

#[derive(Clone)]
pub struct ProductService {
    storage: Arc<dyn Storage<Product>>,
    write_lock: Arc<Mutex<()>>,
}

impl ProductService {
    pub fn new(storage: Arc<dyn Storage<Product>>) -> Self {
        Self {
            storage,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn count(&self) -> Result<usize, AppError> {
        Ok(self.storage.load()?.len())
    }

    /// 按存储顺序返回经 `filter` 过滤的商品
    pub fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, AppError> {
        let mut products = self.storage.load()?;
        products.retain(|p| filter.matches(p));
        Ok(products)
    }

    pub fn get(&self, id: &str) -> Result<Product, AppError> {
        self.storage
            .load()?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::NotFound("product not found".to_string()))
    }

    pub fn create(&self, seller: &Seller, new: NewProduct) -> Result<Product, AppError> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("product name is required".to_string()));
        }

        let _guard = self.lock();
        let mut products = self.storage.load()?;

        let mut id = new_product_id();
        while products.iter().any(|p| p.id == id) {
            id = new_product_id();
        }

        let product = Product {
            id,
            name: name.to_string(),
            price: new.price.trim().to_string(),
            owner: seller.username.clone(),
            created_at: chrono::Utc::now().timestamp(),
            category: new.category.trim().to_string(),
            subcategory: new.subcategory.trim().to_string(),
            description: new.description.trim().to_string(),
            contact: new.contact.trim().to_string(),
            image: new.image.trim().to_string(),
            seller_name: seller.name.clone(),
            seller_code: seller.code.clone(),
        };
        products.push(product.clone());
        self.storage.save(&products)?;

        info!("{} 发布了商品 {} ({})", seller.username, product.id, product.name);
        Ok(product)
    }

    /// 删除商品，仅限发布者本人
    pub fn delete(&self, id: &str, requester: &str) -> Result<(), AppError> {
        let _guard = self.lock();
        let mut products = self.storage.load()?;

        let idx = products
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| AppError::NotFound("product not found".to_string()))?;
        if products[idx].owner != requester {
            return Err(AppError::Forbidden("not authorized".to_string()));
        }

        products.remove(idx);
        self.storage.save(&products)?;
        info!("{} 删除了商品 {}", requester, id);
        Ok(())
    }
}

fn new_product_id() -> String {
    Uuid::new_v4().simple().to_string()
}
