//! 市场数据模型

use serde::{Deserialize, Deserializer, Serialize};

/// 存储的商品记录。字段别名兼容旧版驼峰命名的数据。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// 自由格式的价格标签，如 "25 USD"
    #[serde(default, alias = "priceLabel", deserialize_with = "price_label")]
    pub price: String,
    /// 卖家用户名
    #[serde(default, alias = "sellerEmail")]
    pub owner: String,
    /// Unix 时间戳（秒）
    #[serde(default)]
    pub created_at: i64,
    #[serde(default, alias = "catTitle")]
    pub category: String,
    #[serde(default, alias = "subTitle")]
    pub subcategory: String,
    #[serde(default, alias = "desc")]
    pub description: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub image: String,
    #[serde(default, alias = "sellerName")]
    pub seller_name: String,
    #[serde(default, alias = "sellerCode")]
    pub seller_code: String,
}

/// 针对特定请求者返回的商品
#[derive(Debug, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub can_delete: bool,
}

impl ProductView {
    pub fn for_viewer(product: Product, viewer: Option<&str>) -> Self {
        let can_delete = viewer.is_some_and(|v| !v.is_empty() && v == product.owner);
        Self {
            product,
            can_delete,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductFilter {
    #[serde(default)]
    pub cat: String,
    #[serde(default)]
    pub sub: String,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        let cat = self.cat.trim();
        let sub = self.sub.trim();
        (cat.is_empty() || product.category.trim() == cat)
            && (sub.is_empty() || product.subcategory.trim() == sub)
    }
}

#[derive(Debug, Deserialize)]
pub struct NewProduct {
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "priceLabel", deserialize_with = "price_label")]
    pub price: String,
    #[serde(default, alias = "catTitle")]
    pub category: String,
    #[serde(default, alias = "subTitle")]
    pub subcategory: String,
    #[serde(default, alias = "desc")]
    pub description: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub image: String,
}

/// 卖家信息，从账号存储中解析
#[derive(Debug, Clone)]
pub struct Seller {
    pub username: String,
    pub name: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct Created {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct ProductItem {
    pub item: ProductView,
}

/// 价格可以是字符串或 JSON 数字
fn price_label<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
        Missing(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text.trim().to_string(),
        Raw::Number(number) => number.to_string(),
        Raw::Missing(()) => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_accepts_number_or_text() {
        let a: NewProduct = serde_json::from_str(r#"{"name": "Lamp", "price": 12.5}"#).unwrap();
        let b: NewProduct = serde_json::from_str(r#"{"name": "Lamp", "priceLabel": " 12 USD "}"#).unwrap();
        let c: NewProduct = serde_json::from_str(r#"{"name": "Lamp", "price": null}"#).unwrap();
        assert_eq!(a.price, "12.5");
        assert_eq!(b.price, "12 USD");
        assert_eq!(c.price, "");
    }

    #[test]
    fn test_legacy_record_deserializes() {
        let product: Product = serde_json::from_str(
            r#"{"id": "p1", "name": "Chair", "catTitle": "Home", "sellerEmail": "a@example.com"}"#,
        )
        .unwrap();
        assert_eq!(product.category, "Home");
        assert_eq!(product.owner, "a@example.com");
        assert_eq!(product.price, "");
    }

    #[test]
    fn test_filter() {
        let product: Product = serde_json::from_str(
            r#"{"id": "p1", "name": "Chair", "category": "Home", "subcategory": "Seating"}"#,
        )
        .unwrap();

        assert!(ProductFilter::default().matches(&product));
        let home = ProductFilter { cat: "Home".into(), sub: String::new() };
        assert!(home.matches(&product));
        let tables = ProductFilter { cat: "Home".into(), sub: "Tables".into() };
        assert!(!tables.matches(&product));
    }

    #[test]
    fn test_can_delete_only_for_owner() {
        let product: Product =
            serde_json::from_str(r#"{"id": "p1", "name": "Chair", "owner": "alice"}"#).unwrap();
        assert!(ProductView::for_viewer(product.clone(), Some("alice")).can_delete);
        assert!(!ProductView::for_viewer(product.clone(), Some("bob")).can_delete);
        assert!(!ProductView::for_viewer(product, None).can_delete);
    }
}
