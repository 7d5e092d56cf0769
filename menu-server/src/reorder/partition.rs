//! Product partitions
//!
//! Products are grouped by their effective parent: the owning category when
//! it exists, otherwise the virtual uncategorized container. A product whose
//! `category_id` points at a deleted category is uncategorized.

use std::collections::HashSet;

use serde::Serialize;
use shared::models::{Category, ContainerId, Product, Ranked};

/// Sort by rank, ties by id (the store's fetch order)
pub fn sort_by_rank<T: Ranked>(items: &mut [T]) {
    items.sort_by_key(|item| (item.sort_order(), item.id()));
}

/// Rank for a record appended to `items`
///
/// Equals the list length while ranks are dense. After a partial failure the
/// stored ranks can have gaps or repeats, so the highest rank wins.
pub fn next_rank<'a, T: Ranked + 'a>(items: impl IntoIterator<Item = &'a T>) -> i32 {
    items
        .into_iter()
        .map(|item| item.sort_order())
        .max()
        .map_or(0, |max| max + 1)
}

/// Rank for a product appended to `container`
pub fn next_product_rank(
    products: &[Product],
    category_ids: &HashSet<i64>,
    container: ContainerId,
) -> i32 {
    next_rank(
        products
            .iter()
            .filter(|p| container_of(p, category_ids) == container),
    )
}

pub fn category_ids(categories: &[Category]) -> HashSet<i64> {
    categories.iter().map(|c| c.id).collect()
}

/// Effective container of a product
pub fn container_of(product: &Product, category_ids: &HashSet<i64>) -> ContainerId {
    match product.category_id {
        Some(id) if category_ids.contains(&id) => ContainerId::Category(id),
        _ => ContainerId::Uncategorized,
    }
}

/// Ids of the products in `container`, in rank order
pub fn partition_ids(
    products: &[Product],
    category_ids: &HashSet<i64>,
    container: ContainerId,
) -> Vec<i64> {
    let mut members: Vec<&Product> = products
        .iter()
        .filter(|p| container_of(p, category_ids) == container)
        .collect();
    members.sort_by_key(|p| (p.sort_order, p.id));
    members.into_iter().map(|p| p.id).collect()
}

/// One product list as shown in the admin view
#[derive(Debug, Clone, Serialize)]
pub struct ProductGroup {
    pub container: ContainerId,
    /// `None` for the uncategorized group
    pub category: Option<Category>,
    pub products: Vec<Product>,
}

/// Every category (by rank) with its products, then the uncategorized group
///
/// The uncategorized group is always present, possibly empty, since it is a
/// drop target of its own.
pub fn group_products(categories: &[Category], products: &[Product]) -> Vec<ProductGroup> {
    let ids = category_ids(categories);
    let mut ordered_categories = categories.to_vec();
    sort_by_rank(&mut ordered_categories);

    let mut sorted_products = products.to_vec();
    sort_by_rank(&mut sorted_products);

    let members = |container: ContainerId| -> Vec<Product> {
        sorted_products
            .iter()
            .filter(|p| container_of(p, &ids) == container)
            .cloned()
            .collect()
    };

    let mut groups: Vec<ProductGroup> = ordered_categories
        .into_iter()
        .map(|category| ProductGroup {
            container: ContainerId::Category(category.id),
            products: members(ContainerId::Category(category.id)),
            category: Some(category),
        })
        .collect();

    groups.push(ProductGroup {
        container: ContainerId::Uncategorized,
        category: None,
        products: members(ContainerId::Uncategorized),
    });
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reorder::test_support::{category, product};

    #[test]
    fn test_orphaned_product_is_uncategorized() {
        let categories = vec![category(1, 0)];
        let ids = category_ids(&categories);

        assert_eq!(container_of(&product(10, Some(1), 0), &ids), ContainerId::Category(1));
        assert_eq!(container_of(&product(11, None, 0), &ids), ContainerId::Uncategorized);
        assert_eq!(container_of(&product(12, Some(99), 0), &ids), ContainerId::Uncategorized);
    }

    #[test]
    fn test_partition_ids_in_rank_order() {
        let ids = category_ids(&[category(1, 0)]);
        let products = vec![
            product(10, Some(1), 1),
            product(11, None, 0),
            product(12, Some(1), 0),
            product(13, Some(42), 1),
        ];

        assert_eq!(partition_ids(&products, &ids, ContainerId::Category(1)), vec![12, 10]);
        assert_eq!(partition_ids(&products, &ids, ContainerId::Uncategorized), vec![11, 13]);
    }

    #[test]
    fn test_next_rank_after_gaps_and_repeats() {
        let empty: Vec<Category> = Vec::new();
        assert_eq!(next_rank(&empty), 0);
        assert_eq!(next_rank(&[category(1, 0), category(2, 1)]), 2);
        // [0, 0, 3]: the length (3) would collide with the last rank
        assert_eq!(next_rank(&[category(1, 0), category(2, 0), category(3, 3)]), 4);

        let ids = category_ids(&[category(1, 0)]);
        let products = vec![product(10, Some(1), 5), product(11, None, 0), product(12, Some(7), 2)];
        assert_eq!(next_product_rank(&products, &ids, ContainerId::Category(1)), 6);
        assert_eq!(next_product_rank(&products, &ids, ContainerId::Uncategorized), 3);
    }

    #[test]
    fn test_group_products_follows_category_rank() {
        let categories = vec![category(1, 1), category(2, 0)];
        let products = vec![product(10, Some(1), 0), product(11, Some(2), 0), product(12, None, 0)];

        let groups = group_products(&categories, &products);
        let containers: Vec<ContainerId> = groups.iter().map(|g| g.container).collect();
        assert_eq!(
            containers,
            vec![
                ContainerId::Category(2),
                ContainerId::Category(1),
                ContainerId::Uncategorized
            ]
        );
        assert_eq!(groups[0].products[0].id, 11);
        assert_eq!(groups[2].products[0].id, 12);
        assert!(groups[2].category.is_none());
    }

    #[test]
    fn test_uncategorized_group_always_present() {
        let groups = group_products(&[category(1, 0)], &[]);
        assert_eq!(groups.len(), 2);
        assert!(groups[1].products.is_empty());
    }
}
