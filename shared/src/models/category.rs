//! Category Model

use serde::{Deserialize, Serialize};

use super::ordering::{OrderedItem, Ranked};

/// Category entity
///
/// Categories form a single flat level: they never have a parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Image object key in the storage bucket
    pub image_url: Option<String>,
    /// Dense zero-based position among all categories
    pub sort_order: i32,
    /// Whether the category is shown on the public menu
    #[serde(default = "default_true")]
    pub is_available: bool,
    /// Creation time (Unix millis)
    pub created_at: i64,
}

fn default_true() -> bool {
    true
}

impl Ranked for Category {
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
            parent_id: None,
            sort_order: self.sort_order,
        }
    }
}

/// Create category payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryCreate {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_available: Option<bool>,
}

/// Update category payload
///
/// `sort_order` is not editable here; ordering goes through the reorder
/// endpoints so ranks stay dense.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_available: Option<bool>,
}
