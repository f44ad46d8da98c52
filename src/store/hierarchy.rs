// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Hierarchy building.
//!
//! Providers hand over their items as a flat list. Menus only carry the
//! ordered identifiers of their children, so the hierarchy has to be
//! rebuilt by walking the __level zero__ list, i.e., the persisted ordered
//! identifiers of the top-level items, and recursing into every menu placed
//! along the way.
//!
//! Items are moved out of the flat pool as they get placed. An item is thus
//! placed at most once, even if several menus list it, or a menu lists
//! itself. Items that no list mentions are __leftovers__, and end up at the
//! end of the top level.

use crate::{
    config::Settings,
    item::{tree::ItemTree, ItemNode, NodeId},
    provider::registry::ProviderRegistry,
};

use tracing::{debug, instrument, warn};

/// Read items from every readable provider into `tree`.
///
/// Returned handles form the flat pool of detached items, in provider order
/// first, then in the order each provider returned them. Every pooled item
/// is tagged with the identifier of the provider it came from.
#[instrument(skip_all, level = "debug")]
pub fn merge_providers(
    registry: &ProviderRegistry,
    settings: &Settings,
    tree: &mut ItemTree,
    messages: &mut Vec<String>,
) -> Vec<NodeId> {
    let mut pool = Vec::new();

    for record in registry.records() {
        let Some(backend) = record.backend() else {
            continue;
        };

        if !backend.hooks().read_items {
            debug!("provider {:?} cannot read items", record.id());
            continue;
        }

        if !record.is_readable(settings) {
            debug!("provider {:?} is not readable", record.id());
            continue;
        }

        let items = backend.read_items(tree, messages);
        debug!("read {} items from provider {:?}", items.len(), record.id());

        for item in items {
            let Some(node) = tree.get_mut(item) else {
                warn!("provider {:?} returned unknown node {item}", record.id());
                continue;
            };

            if !node.kind().is_item() {
                warn!(
                    "provider {:?} returned {} {:?} outside of an action",
                    record.id(),
                    node.kind().name(),
                    node.id()
                );
                tree.remove(item);
                continue;
            }

            node.provider = Some(record.id().to_owned());
            pool.push(item);
        }
    }

    pool
}

/// Place pooled items into the hierarchy of `tree`.
///
/// With an empty `level_zero`, every pooled item becomes a top-level item
/// in pool order. Otherwise items are placed by following `level_zero` and
/// the child lists of placed menus, and whatever remains gets appended to
/// the top level.
///
/// Returns the number of leftover items appended to the top level.
#[instrument(skip(tree, pool), level = "debug")]
pub fn build_hierarchy(tree: &mut ItemTree, mut pool: Vec<NodeId>, level_zero: &[String]) -> usize {
    if level_zero.is_empty() {
        debug!("no level zero order, keep {} items flat", pool.len());
        for item in pool {
            tree.push_root(item);
        }
        return 0;
    }

    place(tree, &mut pool, level_zero, None);

    let leftovers = pool.len();
    for item in pool {
        debug!(
            "append leftover item {:?} to top level",
            tree.get(item).map(ItemNode::id).unwrap_or_default()
        );
        tree.push_root(item);
    }

    leftovers
}

fn place(tree: &mut ItemTree, pool: &mut Vec<NodeId>, ids: &[String], parent: Option<NodeId>) {
    for id in ids {
        let Some(index) = pool.iter().position(|item| {
            tree.get(*item)
                .is_some_and(|node| node.kind().is_item() && node.id() == id)
        }) else {
            debug!("no item {id:?} left to place");
            continue;
        };

        let item = pool.remove(index);
        match parent {
            Some(parent) => tree.append_child(parent, item),
            None => tree.push_root(item),
        }

        let child_order = tree
            .get(item)
            .and_then(ItemNode::child_order)
            .map(<[String]>::to_vec);
        if let Some(child_order) = child_order {
            place(tree, pool, &child_order, Some(item));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemData;

    use pretty_assertions::assert_eq;

    fn ids(tree: &ItemTree, nodes: &[NodeId]) -> Vec<String> {
        nodes
            .iter()
            .filter_map(|node| tree.get(*node))
            .map(|node| node.id().to_owned())
            .collect()
    }

    fn level_zero(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn follow_level_zero_and_child_order() {
        let mut tree = ItemTree::new();
        let pool = vec![
            tree.insert(ItemData::menu("a", "A", ["b"])),
            tree.insert(ItemData::action("b", "B")),
            tree.insert(ItemData::action("c", "C")),
            tree.insert(ItemData::action("d", "D")),
        ];

        let leftovers = build_hierarchy(&mut tree, pool, &level_zero(&["c", "a"]));

        assert_eq!(leftovers, 1);
        assert_eq!(ids(&tree, tree.roots()), vec!["c", "a", "d"]);
        let a = tree.find("a").unwrap();
        assert_eq!(ids(&tree, tree.children(a)), vec!["b"]);
        assert_eq!(tree.id_path(tree.find("b").unwrap()), "a/b");
    }

    #[test]
    fn empty_level_zero_keeps_pool_flat() {
        let mut tree = ItemTree::new();
        let pool = vec![
            tree.insert(ItemData::menu("a", "A", ["b"])),
            tree.insert(ItemData::action("b", "B")),
        ];

        let leftovers = build_hierarchy(&mut tree, pool, &[]);

        assert_eq!(leftovers, 0);
        assert_eq!(ids(&tree, tree.roots()), vec!["a", "b"]);
        assert!(tree.children(tree.find("a").unwrap()).is_empty());
    }

    #[test]
    fn every_pooled_item_is_placed_once() {
        let mut tree = ItemTree::new();
        let pool = vec![
            tree.insert(ItemData::menu("loop", "Loop", ["loop", "x"])),
            tree.insert(ItemData::menu("other", "Other", ["x"])),
            tree.insert(ItemData::action("x", "X")),
            tree.insert(ItemData::action("x", "Second X")),
        ];

        let leftovers = build_hierarchy(&mut tree, pool, &level_zero(&["loop", "other", "gone"]));

        assert_eq!(leftovers, 0);
        assert_eq!(ids(&tree, tree.roots()), vec!["loop", "other"]);
        let looping = tree.find("loop").unwrap();
        let other = tree.find("other").unwrap();
        assert_eq!(ids(&tree, tree.children(looping)), vec!["x"]);
        assert_eq!(ids(&tree, tree.children(other)), vec!["x"]);
        assert_eq!(tree.get(tree.children(other)[0]).unwrap().label(), "Second X");
        assert_eq!(tree.depth_first().len(), 4);
    }
}
