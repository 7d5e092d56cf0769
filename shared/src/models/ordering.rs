//! Ordering primitives shared by categories and products
//!
//! A record's rank lives in its `sort_order` field. Ranks are dense and
//! zero-based inside each sibling collection: the category list, or the
//! product list of one category (with all uncategorized products forming one
//! more list).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which collection a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Category,
    Product,
}

impl ItemKind {
    /// Resource name used in sync messages and logs
    pub fn resource(&self) -> &'static str {
        match self {
            ItemKind::Category => "category",
            ItemKind::Product => "product",
        }
    }

    pub fn from_resource(resource: &str) -> Option<Self> {
        match resource {
            "category" => Some(ItemKind::Category),
            "product" => Some(ItemKind::Product),
            _ => None,
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resource())
    }
}

/// The ordering-relevant view of any record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedItem {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub sort_order: i32,
}

/// Records that carry a rank
pub trait Ranked {
    fn id(&self) -> i64;
    fn sort_order(&self) -> i32;
    fn set_sort_order(&mut self, sort_order: i32);
    fn ordered_item(&self) -> OrderedItem;
}

/// True when the ranks of `items` are exactly `0..n-1` in some order
pub fn ranks_are_dense<T: Ranked>(items: &[T]) -> bool {
    let mut seen = vec![false; items.len()];
    for item in items {
        let rank = item.sort_order();
        if rank < 0 {
            return false;
        }
        match seen.get_mut(rank as usize) {
            Some(slot) if !*slot => *slot = true,
            _ => return false,
        }
    }
    true
}

/// A product list a product can be dropped into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerId {
    /// The product list of an existing category
    Category(i64),
    /// Products without a (resolvable) category
    Uncategorized,
}

impl ContainerId {
    /// The `category_id` a product gets when placed in this container
    pub fn category_id(&self) -> Option<i64> {
        match self {
            ContainerId::Category(id) => Some(*id),
            ContainerId::Uncategorized => None,
        }
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerId::Category(id) => write!(f, "category:{}", id),
            ContainerId::Uncategorized => f.write_str("uncategorized"),
        }
    }
}

/// Containers that exist only in the admin view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VirtualContainer {
    Uncategorized,
}

/// Raw drop target id as reported by the drag surface
///
/// Serialized as a bare number (a record id) or the string
/// `"uncategorized"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OverId {
    Record(i64),
    Virtual(VirtualContainer),
}

/// Drag gesture result: what was dragged and what it was dropped on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveIntent {
    pub active_id: i64,
    /// `None` when the pointer was released outside any drop target
    #[serde(default)]
    pub over_id: Option<OverId>,
}

impl MoveIntent {
    pub fn new(active_id: i64, over_id: i64) -> Self {
        Self {
            active_id,
            over_id: Some(OverId::Record(over_id)),
        }
    }

    pub fn onto_uncategorized(active_id: i64) -> Self {
        Self {
            active_id,
            over_id: Some(OverId::Virtual(VirtualContainer::Uncategorized)),
        }
    }

    pub fn outside(active_id: i64) -> Self {
        Self {
            active_id,
            over_id: None,
        }
    }

    /// Dropped onto itself
    pub fn is_self_drop(&self) -> bool {
        matches!(self.over_id, Some(OverId::Record(id)) if id == self.active_id)
    }
}

/// Drop target after resolution against the current collections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveTarget {
    /// Take the position of another record of the same kind
    Item(i64),
    /// Append to the end of a product list
    Container(ContainerId),
    /// Nothing valid under the pointer
    None,
}

/// Fields written by a single `update_fields` call
///
/// `category_id: Some(None)` clears the category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Option<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
}

impl FieldPatch {
    /// Rank only (categories)
    pub fn rank(sort_order: i32) -> Self {
        Self {
            sort_order: Some(sort_order),
            ..Self::default()
        }
    }

    /// Rank plus parent, written together even when the parent is unchanged
    pub fn placement(sort_order: i32, category_id: Option<i64>) -> Self {
        Self {
            sort_order: Some(sort_order),
            category_id: Some(category_id),
            is_available: None,
        }
    }

    pub fn availability(is_available: bool) -> Self {
        Self {
            is_available: Some(is_available),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sort_order.is_none() && self.category_id.is_none() && self.is_available.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Rank(i64, i32);

    impl Ranked for Rank {
        fn id(&self) -> i64 {
            self.0
        }
        fn sort_order(&self) -> i32 {
            self.1
        }
        fn set_sort_order(&mut self, sort_order: i32) {
            self.1 = sort_order;
        }
        fn ordered_item(&self) -> OrderedItem {
            OrderedItem {
                id: self.0,
                parent_id: None,
                sort_order: self.1,
            }
        }
    }

    #[test]
    fn test_ranks_are_dense() {
        assert!(ranks_are_dense::<Rank>(&[]));
        assert!(ranks_are_dense(&[Rank(1, 1), Rank(2, 0), Rank(3, 2)]));
        assert!(!ranks_are_dense(&[Rank(1, 0), Rank(2, 2)]));
        assert!(!ranks_are_dense(&[Rank(1, 0), Rank(2, 0)]));
        assert!(!ranks_are_dense(&[Rank(1, -1)]));
    }

    #[test]
    fn test_move_intent_wire_format() {
        let intent: MoveIntent =
            serde_json::from_str(r#"{"active_id":1,"over_id":2}"#).unwrap();
        assert_eq!(intent, MoveIntent::new(1, 2));

        let intent: MoveIntent =
            serde_json::from_str(r#"{"active_id":1,"over_id":"uncategorized"}"#).unwrap();
        assert_eq!(intent, MoveIntent::onto_uncategorized(1));

        let intent: MoveIntent = serde_json::from_str(r#"{"active_id":1}"#).unwrap();
        assert_eq!(intent, MoveIntent::outside(1));

        assert!(serde_json::from_str::<MoveIntent>(r#"{"active_id":1,"over_id":"bogus"}"#).is_err());
    }

    #[test]
    fn test_self_drop() {
        assert!(MoveIntent::new(5, 5).is_self_drop());
        assert!(!MoveIntent::new(5, 6).is_self_drop());
        assert!(!MoveIntent::outside(5).is_self_drop());
    }

    #[test]
    fn test_field_patch_constructors() {
        assert!(FieldPatch::default().is_empty());
        assert_eq!(FieldPatch::rank(3).sort_order, Some(3));
        let p = FieldPatch::placement(0, None);
        assert_eq!(p.category_id, Some(None));
        assert!(!p.is_empty());
        assert_eq!(FieldPatch::availability(false).is_available, Some(false));
    }

    #[test]
    fn test_item_kind_resource() {
        assert_eq!(ItemKind::Category.resource(), "category");
        assert_eq!(ItemKind::from_resource("product"), Some(ItemKind::Product));
        assert_eq!(ItemKind::from_resource("order"), None);
        assert_eq!(ContainerId::Category(9).to_string(), "category:9");
    }
}
