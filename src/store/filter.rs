// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Load-time filtering of the hierarchy.
//!
//! Relies on the cached status of every node, so the hierarchy must have had
//! its status checked beforehand. A dropped node takes its whole subtree
//! with it.

use crate::{
    duplicable,
    item::{tree::ItemTree, NodeId},
    store::LoadFlags,
};

use tracing::debug;

/// Diagnostic record of a node dropped while loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedItem {
    /// Item identifier of dropped node.
    pub id: String,

    /// Identifier path of dropped node at the time it was dropped.
    pub path: String,

    /// Kind of dropped node.
    pub kind: &'static str,

    pub valid: bool,
    pub enabled: bool,
}

/// Drop every node of `tree` that `flags` do not allow to be loaded.
///
/// Profiles only need to be valid. Menus and actions also need to be
/// enabled. A menu or action that loses every child to filtering is invalid
/// from then on, and gets dropped too unless invalid nodes are loaded.
pub fn filter_tree(tree: &mut ItemTree, flags: LoadFlags) -> Vec<DroppedItem> {
    let mut dropped = Vec::new();
    for root in tree.roots().to_vec() {
        filter_node(tree, root, flags, &mut dropped);
    }

    dropped
}

fn filter_node(
    tree: &mut ItemTree,
    id: NodeId,
    flags: LoadFlags,
    dropped: &mut Vec<DroppedItem>,
) {
    let Some(node) = tree.get(id) else {
        return;
    };

    let valid = duplicable::is_valid(&*tree, id);
    let enabled = node.is_enabled();
    let is_item = node.kind().is_item();
    let keep = (valid || flags.load_invalid) && (!is_item || enabled || flags.load_disabled);
    if !keep {
        drop_node(tree, id, valid, enabled, dropped);
        return;
    }

    for child in tree.children(id).to_vec() {
        filter_node(tree, child, flags, dropped);
    }

    if is_item && !flags.load_invalid && tree.children(id).is_empty() {
        drop_node(tree, id, false, enabled, dropped);
    }
}

fn drop_node(
    tree: &mut ItemTree,
    id: NodeId,
    valid: bool,
    enabled: bool,
    dropped: &mut Vec<DroppedItem>,
) {
    let Some(node) = tree.get(id) else {
        return;
    };

    let item = DroppedItem {
        id: node.id().to_owned(),
        path: tree.id_path(id),
        kind: node.kind().name(),
        valid,
        enabled,
    };
    debug!(
        "drop {} {:?}: valid={}, enabled={}",
        item.kind, item.path, item.valid, item.enabled
    );
    dropped.push(item);
    tree.remove(id);
}
