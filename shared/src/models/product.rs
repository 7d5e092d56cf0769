//! Product Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ordering::{OrderedItem, Ranked};

/// Product entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Image object key in the storage bucket
    pub image_url: Option<String>,
    /// Owning category. `None` (or an id whose category was deleted) means
    /// the product is uncategorized.
    pub category_id: Option<i64>,
    /// Dense zero-based position inside the owning category's product list
    pub sort_order: i32,
    #[serde(default = "default_true")]
    pub is_available: bool,
    /// Creation time (Unix millis)
    pub created_at: i64,
}

fn default_true() -> bool {
    true
}

impl Ranked for Product {
    fn id(&self) -> i64 {
        self.id
    }

    fn sort_order(&self) -> i32 {
        self.sort_order
    }

    fn set_sort_order(&mut self, sort_order: i32) {
        self.sort_order = sort_order;
    }

    fn ordered_item(&self) -> OrderedItem {
        OrderedItem {
            id: self.id,
            parent_id: self.category_id,
            sort_order: self.sort_order,
        }
    }
}

/// Create product payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub image_url: Option<String>,
    pub category_id: Option<i64>,
    pub is_available: Option<bool>,
}

/// Update product payload
///
/// `category_id: Some(None)` moves the product to the uncategorized list;
/// a missing field leaves the category untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub category_id: Option<Option<i64>>,
    pub is_available: Option<bool>,
}

/// Distinguishes an absent field from an explicit `null`
pub(crate) mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S, T>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}
