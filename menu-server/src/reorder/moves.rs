//! Move planning
//!
//! Pure functions turning a drop into the final `sort_order` (and, for
//! products, `category_id`) of every record in the touched collections.
//! Nothing here mutates engine state or talks to the store.

use std::collections::HashSet;

use shared::models::{ContainerId, MoveIntent, MoveTarget, OverId, Product, VirtualContainer};

use super::partition::{container_of, partition_ids};

/// Final position of one record after a move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub id: i64,
    pub sort_order: i32,
    /// Always `None` for categories
    pub category_id: Option<i64>,
}

/// Remove the element at `from` and insert it at `to`
///
/// The moved element ends up at index `to` of the result; elements in
/// between shift by one. This is a splice, not a swap.
pub fn array_move<T>(items: &mut Vec<T>, from: usize, to: usize) {
    if from >= items.len() || to >= items.len() || from == to {
        return;
    }
    let item = items.remove(from);
    items.insert(to, item);
}

/// Dense ranks for `ids` in the given order
pub fn rank_placements(ids: &[i64], category_id: impl Fn(i64) -> Option<i64>) -> Vec<Placement> {
    ids.iter()
        .enumerate()
        .map(|(index, &id)| Placement {
            id,
            sort_order: index as i32,
            category_id: category_id(id),
        })
        .collect()
}

/// Plan a category drop
///
/// `order` is the current category id order. Returns `None` when the drop
/// changes nothing: self-drop, no target, or an id that is not a category.
pub fn plan_category_move(order: &[i64], intent: &MoveIntent) -> Option<Vec<Placement>> {
    if intent.is_self_drop() {
        return None;
    }
    let Some(OverId::Record(over_id)) = intent.over_id else {
        return None;
    };

    let from = order.iter().position(|&id| id == intent.active_id)?;
    let to = order.iter().position(|&id| id == over_id)?;

    let mut next = order.to_vec();
    array_move(&mut next, from, to);
    Some(rank_placements(&next, |_| None))
}

/// Resolve a product drop target against the current collections
///
/// A record id resolves to a product first, then to a category drop zone.
pub fn resolve_product_target(
    intent: &MoveIntent,
    category_ids: &HashSet<i64>,
    products: &[Product],
) -> MoveTarget {
    match intent.over_id {
        None => MoveTarget::None,
        Some(OverId::Virtual(VirtualContainer::Uncategorized)) => {
            MoveTarget::Container(ContainerId::Uncategorized)
        }
        Some(OverId::Record(id)) if id == intent.active_id => MoveTarget::None,
        Some(OverId::Record(id)) => {
            if products.iter().any(|p| p.id == id) {
                MoveTarget::Item(id)
            } else if category_ids.contains(&id) {
                MoveTarget::Container(ContainerId::Category(id))
            } else {
                MoveTarget::None
            }
        }
    }
}

/// Planned product move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductMovePlan {
    pub active_id: i64,
    pub source: ContainerId,
    pub destination: ContainerId,
    /// Every product of the touched partitions
    pub placements: Vec<Placement>,
}

impl ProductMovePlan {
    pub fn is_reparent(&self) -> bool {
        self.source != self.destination
    }
}

/// Plan a product drop
///
/// Returns `None` when the drop changes nothing.
pub fn plan_product_move(
    products: &[Product],
    category_ids: &HashSet<i64>,
    active_id: i64,
    target: MoveTarget,
) -> Option<ProductMovePlan> {
    let active = products.iter().find(|p| p.id == active_id)?;
    let source = container_of(active, category_ids);

    // Records that stay put keep their stored category_id, orphans included
    let current_parent = |id: i64| products.iter().find(|p| p.id == id).and_then(|p| p.category_id);

    match target {
        MoveTarget::None => None,

        MoveTarget::Item(over_id) => {
            if over_id == active_id {
                return None;
            }
            let over = products.iter().find(|p| p.id == over_id)?;
            let destination = container_of(over, category_ids);

            if destination == source {
                let mut ids = partition_ids(products, category_ids, source);
                let from = ids.iter().position(|&id| id == active_id)?;
                let to = ids.iter().position(|&id| id == over_id)?;
                array_move(&mut ids, from, to);
                return Some(ProductMovePlan {
                    active_id,
                    source,
                    destination,
                    placements: rank_placements(&ids, current_parent),
                });
            }

            let mut source_ids = partition_ids(products, category_ids, source);
            source_ids.retain(|&id| id != active_id);

            let mut destination_ids = partition_ids(products, category_ids, destination);
            let at = destination_ids.iter().position(|&id| id == over_id)?;
            destination_ids.insert(at, active_id);

            Some(reparent_plan(
                active_id,
                source,
                destination,
                &source_ids,
                &destination_ids,
                current_parent,
            ))
        }

        MoveTarget::Container(destination) => {
            if destination == source {
                return None;
            }
            if let ContainerId::Category(id) = destination
                && !category_ids.contains(&id)
            {
                return None;
            }

            let mut source_ids = partition_ids(products, category_ids, source);
            source_ids.retain(|&id| id != active_id);

            // Appended: rank = destination length before insertion
            let mut destination_ids = partition_ids(products, category_ids, destination);
            destination_ids.push(active_id);

            Some(reparent_plan(
                active_id,
                source,
                destination,
                &source_ids,
                &destination_ids,
                current_parent,
            ))
        }
    }
}

fn reparent_plan(
    active_id: i64,
    source: ContainerId,
    destination: ContainerId,
    source_ids: &[i64],
    destination_ids: &[i64],
    current_parent: impl Fn(i64) -> Option<i64>,
) -> ProductMovePlan {
    let mut placements = rank_placements(source_ids, &current_parent);
    placements.extend(rank_placements(destination_ids, |id| {
        if id == active_id {
            destination.category_id()
        } else {
            current_parent(id)
        }
    }));

    ProductMovePlan {
        active_id,
        source,
        destination,
        placements,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reorder::test_support::{category, product};
    use crate::reorder::partition::category_ids;

    fn ranks(placements: &[Placement]) -> Vec<(i64, i32)> {
        placements.iter().map(|p| (p.id, p.sort_order)).collect()
    }

    #[test]
    fn test_array_move_is_a_splice() {
        let mut v = vec!['a', 'b', 'c', 'd'];
        array_move(&mut v, 0, 2);
        assert_eq!(v, vec!['b', 'c', 'a', 'd']);

        array_move(&mut v, 3, 0);
        assert_eq!(v, vec!['d', 'b', 'c', 'a']);

        array_move(&mut v, 1, 9);
        assert_eq!(v, vec!['d', 'b', 'c', 'a']);
    }

    #[test]
    fn test_category_move_onto_last() {
        // [A0, B1, C2], A onto C -> [B0, C1, A2]
        let plan = plan_category_move(&[1, 2, 3], &MoveIntent::new(1, 3)).unwrap();
        assert_eq!(ranks(&plan), vec![(2, 0), (3, 1), (1, 2)]);
        assert!(plan.iter().all(|p| p.category_id.is_none()));
    }

    #[test]
    fn test_category_move_upwards() {
        let plan = plan_category_move(&[1, 2, 3, 4], &MoveIntent::new(4, 2)).unwrap();
        assert_eq!(ranks(&plan), vec![(1, 0), (4, 1), (2, 2), (3, 3)]);
    }

    #[test]
    fn test_category_move_noops() {
        let order = [1, 2, 3];
        assert!(plan_category_move(&order, &MoveIntent::new(2, 2)).is_none());
        assert!(plan_category_move(&order, &MoveIntent::outside(2)).is_none());
        assert!(plan_category_move(&order, &MoveIntent::new(2, 99)).is_none());
        assert!(plan_category_move(&order, &MoveIntent::new(99, 2)).is_none());
        assert!(plan_category_move(&order, &MoveIntent::onto_uncategorized(2)).is_none());
    }

    #[test]
    fn test_resolve_product_target() {
        let ids = category_ids(&[category(1, 0)]);
        let products = vec![product(10, Some(1), 0), product(11, None, 0)];

        assert_eq!(
            resolve_product_target(&MoveIntent::new(10, 11), &ids, &products),
            MoveTarget::Item(11)
        );
        assert_eq!(
            resolve_product_target(&MoveIntent::new(11, 1), &ids, &products),
            MoveTarget::Container(ContainerId::Category(1))
        );
        assert_eq!(
            resolve_product_target(&MoveIntent::onto_uncategorized(10), &ids, &products),
            MoveTarget::Container(ContainerId::Uncategorized)
        );
        assert_eq!(
            resolve_product_target(&MoveIntent::new(10, 10), &ids, &products),
            MoveTarget::None
        );
        assert_eq!(
            resolve_product_target(&MoveIntent::new(10, 77), &ids, &products),
            MoveTarget::None
        );
        assert_eq!(
            resolve_product_target(&MoveIntent::outside(10), &ids, &products),
            MoveTarget::None
        );
    }

    #[test]
    fn test_product_move_within_category() {
        let ids = category_ids(&[category(1, 0), category(2, 1)]);
        let products = vec![
            product(10, Some(1), 0),
            product(11, Some(1), 1),
            product(12, Some(1), 2),
            product(20, Some(2), 0),
        ];

        let plan = plan_product_move(&products, &ids, 12, MoveTarget::Item(10)).unwrap();
        assert!(!plan.is_reparent());
        assert_eq!(ranks(&plan.placements), vec![(12, 0), (10, 1), (11, 2)]);
        // parent written unchanged, other category untouched
        assert!(plan.placements.iter().all(|p| p.category_id == Some(1)));
    }

    #[test]
    fn test_product_move_onto_item_of_other_category() {
        let ids = category_ids(&[category(1, 0), category(2, 1)]);
        let products = vec![
            product(10, Some(1), 0),
            product(11, Some(1), 1),
            product(20, Some(2), 0),
            product(21, Some(2), 1),
        ];

        let plan = plan_product_move(&products, &ids, 10, MoveTarget::Item(21)).unwrap();
        assert!(plan.is_reparent());
        assert_eq!(plan.source, ContainerId::Category(1));
        assert_eq!(plan.destination, ContainerId::Category(2));

        let expected = vec![
            Placement { id: 11, sort_order: 0, category_id: Some(1) },
            Placement { id: 20, sort_order: 0, category_id: Some(2) },
            Placement { id: 10, sort_order: 1, category_id: Some(2) },
            Placement { id: 21, sort_order: 2, category_id: Some(2) },
        ];
        assert_eq!(plan.placements, expected);
    }

    #[test]
    fn test_product_drop_on_empty_category() {
        // [{1, None, 0}] dropped onto empty category X -> [{1, X, 0}]
        let ids = category_ids(&[category(5, 0)]);
        let products = vec![product(1, None, 0)];

        let plan = plan_product_move(
            &products,
            &ids,
            1,
            MoveTarget::Container(ContainerId::Category(5)),
        )
        .unwrap();
        assert_eq!(
            plan.placements,
            vec![Placement { id: 1, sort_order: 0, category_id: Some(5) }]
        );
    }

    #[test]
    fn test_product_drop_on_container_appends_and_compacts_source() {
        let ids = category_ids(&[category(1, 0), category(2, 1)]);
        let products = vec![
            product(10, Some(1), 0),
            product(11, Some(1), 1),
            product(12, Some(1), 2),
            product(20, Some(2), 0),
            product(21, Some(2), 1),
        ];

        let plan = plan_product_move(
            &products,
            &ids,
            10,
            MoveTarget::Container(ContainerId::Category(2)),
        )
        .unwrap();

        let moved = plan.placements.iter().find(|p| p.id == 10).unwrap();
        assert_eq!(moved.sort_order, 2);
        assert_eq!(moved.category_id, Some(2));
        assert_eq!(ranks(&plan.placements[..2]), vec![(11, 0), (12, 1)]);
    }

    #[test]
    fn test_product_drop_on_own_container_is_noop() {
        let ids = category_ids(&[category(1, 0)]);
        let products = vec![product(10, Some(1), 0), product(11, None, 0), product(12, Some(9), 1)];

        assert!(
            plan_product_move(&products, &ids, 10, MoveTarget::Container(ContainerId::Category(1)))
                .is_none()
        );
        // orphan already lives in the uncategorized list
        assert!(
            plan_product_move(&products, &ids, 12, MoveTarget::Container(ContainerId::Uncategorized))
                .is_none()
        );
    }

    #[test]
    fn test_product_move_to_uncategorized_clears_parent() {
        let ids = category_ids(&[category(1, 0)]);
        let products = vec![product(10, Some(1), 0), product(11, None, 0)];

        let plan = plan_product_move(
            &products,
            &ids,
            10,
            MoveTarget::Container(ContainerId::Uncategorized),
        )
        .unwrap();
        let moved = plan.placements.iter().find(|p| p.id == 10).unwrap();
        assert_eq!(moved.category_id, None);
        assert_eq!(moved.sort_order, 1);
    }

    #[test]
    fn test_orphan_sibling_keeps_stored_parent() {
        let ids = category_ids(&[]);
        let products = vec![product(10, Some(9), 0), product(11, None, 1)];

        let plan = plan_product_move(&products, &ids, 11, MoveTarget::Item(10)).unwrap();
        let orphan = plan.placements.iter().find(|p| p.id == 10).unwrap();
        assert_eq!(orphan.category_id, Some(9));
        assert_eq!(orphan.sort_order, 1);
    }

    #[test]
    fn test_unknown_active_is_noop() {
        let ids = category_ids(&[category(1, 0)]);
        let products = vec![product(10, Some(1), 0)];
        assert!(plan_product_move(&products, &ids, 99, MoveTarget::Item(10)).is_none());
        assert!(
            plan_product_move(&products, &ids, 10, MoveTarget::Container(ContainerId::Category(8)))
                .is_none()
        );
    }
}
