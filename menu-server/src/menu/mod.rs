//! Public menu
//!
//! What guests see: available categories by rank, each with its available
//! products. Uncategorized products are never shown.

mod feed;

pub use feed::MenuFeed;

use serde::Serialize;
use shared::models::{Category, Product, Profile};

use crate::reorder::partition::sort_by_rank;

/// One category section of the public menu
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuSection {
    pub category: Category,
    pub products: Vec<Product>,
}

/// Public menu built from a category and a product collection
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MenuView {
    pub sections: Vec<MenuSection>,
}

impl MenuView {
    pub fn build(categories: &[Category], products: &[Product]) -> Self {
        let mut categories: Vec<Category> =
            categories.iter().filter(|c| c.is_available).cloned().collect();
        sort_by_rank(&mut categories);

        let mut products: Vec<&Product> = products.iter().filter(|p| p.is_available).collect();
        products.sort_by_key(|p| (p.sort_order, p.id));

        let sections = categories
            .into_iter()
            .map(|category| MenuSection {
                products: products
                    .iter()
                    .filter(|p| p.category_id == Some(category.id))
                    .map(|p| (*p).clone())
                    .collect(),
                category,
            })
            .collect();

        Self { sections }
    }

    pub fn product_count(&self) -> usize {
        self.sections.iter().map(|s| s.products.len()).sum()
    }
}

/// GET /api/menu response
#[derive(Debug, Clone, Serialize)]
pub struct PublicMenu {
    pub profile: Profile,
    #[serde(flatten)]
    pub view: MenuView,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reorder::test_support::{category, product};

    fn ids<T>(items: &[T], id: impl Fn(&T) -> i64) -> Vec<i64> {
        items.iter().map(id).collect()
    }

    #[test]
    fn test_sections_follow_category_rank() {
        let categories = vec![category(1, 2), category(2, 0), category(3, 1)];
        let view = MenuView::build(&categories, &[]);
        assert_eq!(ids(&view.sections, |s| s.category.id), vec![2, 3, 1]);
    }

    #[test]
    fn test_hidden_records_are_skipped() {
        let mut hidden_category = category(2, 1);
        hidden_category.is_available = false;
        let mut hidden_product = product(11, Some(1), 1);
        hidden_product.is_available = false;

        let view = MenuView::build(
            &[category(1, 0), hidden_category],
            &[product(10, Some(1), 0), hidden_product, product(20, Some(2), 0)],
        );

        assert_eq!(view.sections.len(), 1);
        assert_eq!(ids(&view.sections[0].products, |p| p.id), vec![10]);
    }

    #[test]
    fn test_uncategorized_products_are_not_shown() {
        let view = MenuView::build(
            &[category(1, 0)],
            &[product(10, None, 0), product(11, Some(99), 0), product(12, Some(1), 0)],
        );
        assert_eq!(view.product_count(), 1);
        assert_eq!(view.sections[0].products[0].id, 12);
    }

    #[test]
    fn test_products_ordered_by_rank_within_section() {
        let view = MenuView::build(
            &[category(1, 0)],
            &[product(10, Some(1), 2), product(11, Some(1), 0), product(12, Some(1), 1)],
        );
        assert_eq!(ids(&view.sections[0].products, |p| p.id), vec![11, 12, 10]);
    }
}
