// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Arena of item nodes.
//!
//! All nodes of a hierarchy are owned by one [`ItemTree`]. Nodes refer to
//! their parent and children through [`NodeId`] handles, and the tree keeps
//! the ordered list of top-level nodes. A node that was inserted but never
//! attached to a parent or to the top level is __detached__: it stays in the
//! arena, owned by whoever holds its handle, until it gets attached or
//! removed.
//!
//! Removing a node frees its slot for the next insertion. Every slot keeps a
//! generation that is bumped on removal, so a stale handle simply stops
//! resolving instead of pointing at whatever took the slot over.

use crate::{
    config::OrderMode,
    duplicable::{self, Duplicable, DuplicableState, DuplicateMode, StatusBus},
    item::{ItemData, ItemKind, ItemNode, NodeId},
};

use std::{cmp::Ordering, mem::take};

#[derive(Default, Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<ItemNode>,
}

/// Owner of every node of an item hierarchy.
#[derive(Default, Debug, Clone)]
pub struct ItemTree {
    slots: Vec<Slot>,
    free: Vec<usize>,
    roots: Vec<NodeId>,
}

impl ItemTree {
    /// Construct new empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert new detached node.
    pub fn insert(&mut self, data: ItemData) -> NodeId {
        let node = Some(ItemNode::new(data));

        // INVARIANT: Free list only holds indices of existing, empty slots.
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.node = node;
            return NodeId {
                index,
                generation: slot.generation,
            };
        }

        self.slots.push(Slot {
            generation: 0,
            node,
        });
        NodeId {
            index: self.slots.len() - 1,
            generation: 0,
        }
    }

    /// Insert new node as last child of `parent`.
    pub fn insert_child(&mut self, parent: NodeId, data: ItemData) -> NodeId {
        let child = self.insert(data);
        self.append_child(parent, child);
        child
    }

    pub fn get(&self, id: NodeId) -> Option<&ItemNode> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut ItemNode> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live nodes, attached or not.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ordered top-level nodes.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Ordered children of node.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(ItemNode::children).unwrap_or_default()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(ItemNode::parent)
    }

    /// Append node to the top level.
    pub fn push_root(&mut self, id: NodeId) {
        if let Some(node) = self.get_mut(id) {
            node.parent = None;
            self.roots.push(id);
        }
    }

    /// Replace the top level.
    pub fn set_roots(&mut self, roots: Vec<NodeId>) {
        for &root in &roots {
            if let Some(node) = self.get_mut(root) {
                node.parent = None;
            }
        }
        self.roots = roots;
    }

    /// Append `child` as last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.contains(child) {
            return;
        }

        if let Some(node) = self.get_mut(parent) {
            node.children.push(child);
        } else {
            return;
        }

        if let Some(node) = self.get_mut(child) {
            node.parent = Some(parent);
        }
    }

    /// Remove node and its whole subtree.
    ///
    /// The node is unlinked from its parent, or from the top level.
    pub fn remove(&mut self, id: NodeId) {
        let Some(parent) = self.get(id).map(ItemNode::parent) else {
            return;
        };

        match parent {
            Some(parent) => {
                if let Some(parent) = self.get_mut(parent) {
                    parent.children.retain(|child| *child != id);
                }
            }
            None => self.roots.retain(|root| *root != id),
        }

        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            let Some(slot) = self
                .slots
                .get_mut(next.index)
                .filter(|slot| slot.generation == next.generation)
            else {
                continue;
            };

            if let Some(node) = slot.node.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(next.index);
                pending.extend(node.children);
            }
        }
    }

    /// Find first node with given item identifier, searching from the top
    /// level down.
    pub fn find(&self, item_id: &str) -> Option<NodeId> {
        self.depth_first()
            .into_iter()
            .find(|id| self.get(*id).is_some_and(|node| node.id() == item_id))
    }

    /// Every node reachable from the top level, parents before children.
    pub fn depth_first(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut pending = self.roots.iter().rev().copied().collect::<Vec<_>>();
        while let Some(id) = pending.pop() {
            order.push(id);
            pending.extend(self.children(id).iter().rev().copied());
        }

        order
    }

    /// Slash separated item identifiers from the top level down to node.
    pub fn id_path(&self, id: NodeId) -> String {
        let mut parts = Vec::new();
        let mut current = Some(id);
        while let Some(next) = current {
            let Some(node) = self.get(next) else {
                break;
            };
            parts.push(node.id());
            current = node.parent;
        }
        parts.reverse();
        parts.join("/")
    }

    /// Check status of node, and of its whole subtree first.
    ///
    /// Children are checked before their parent, because the validity and
    /// equality of a container depend on the cached status of its children.
    pub fn check_status(&mut self, id: NodeId, bus: &mut StatusBus<NodeId>) {
        for child in self.children(id).to_vec() {
            self.check_status(child, bus);
        }
        duplicable::check_status(self, id, bus);
    }

    /// Sort the top level and every menu's children by label.
    ///
    /// Profiles keep their order. Does nothing in manual mode.
    pub fn sort_by_label(&mut self, mode: OrderMode) {
        if mode == OrderMode::Manual {
            return;
        }

        let mut roots = take(&mut self.roots);
        self.sort_siblings(&mut roots, mode);
        self.roots = roots;

        for id in self.depth_first() {
            if !self.get(id).is_some_and(|node| node.kind().is_menu()) {
                continue;
            }

            let mut children = self
                .get_mut(id)
                .map(|node| take(&mut node.children))
                .unwrap_or_default();
            self.sort_siblings(&mut children, mode);
            if let Some(node) = self.get_mut(id) {
                node.children = children;
            }
        }
    }

    fn sort_siblings(&self, siblings: &mut [NodeId], mode: OrderMode) {
        siblings.sort_by(|a, b| {
            let a = self.get(*a).map(ItemNode::label).unwrap_or_default();
            let b = self.get(*b).map(ItemNode::label).unwrap_or_default();
            let order = collate(a, b);
            match mode {
                OrderMode::Descending => order.reverse(),
                _ => order,
            }
        });
    }
}

/// Compare labels the way a reader expects: case-insensitive first, then
/// exact, so that the result is still total.
fn collate(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

impl Duplicable for ItemTree {
    type Handle = NodeId;

    fn state(&self, object: NodeId) -> Option<&DuplicableState<NodeId>> {
        self.get(object).and_then(|node| node.status.as_ref())
    }

    fn state_mut(&mut self, object: NodeId) -> Option<&mut DuplicableState<NodeId>> {
        self.get_mut(object)
            .map(|node| node.status.get_or_insert_with(Default::default))
    }

    fn new_like(&mut self, object: NodeId) -> Option<NodeId> {
        let kind = self.get(object)?.kind().empty_like();
        Some(self.insert(ItemData::new("", "", kind)))
    }

    /// Copy node content.
    ///
    /// Provider provenance and read-only flag come along. Provider-specific
    /// data does not: it has to be duplicated through the provider itself.
    /// Children of `target` are replaced by duplicates of the children of
    /// `source` when `mode` asks for them.
    fn copy(&mut self, target: NodeId, source: NodeId, mode: DuplicateMode) {
        let Some(node) = self.get(source) else {
            return;
        };

        let data = node.data.clone();
        let readonly = node.readonly;
        let provider = node.provider.clone();
        let children = match (mode, node.kind()) {
            (DuplicateMode::Recursive, _) => node.children.clone(),
            (DuplicateMode::Object, ItemKind::Action(_)) => node.children.clone(),
            _ => Vec::new(),
        };

        let Some(node) = self.get_mut(target) else {
            return;
        };
        node.data = data;
        node.readonly = readonly;
        node.provider = provider;
        let previous = take(&mut node.children);
        for child in previous {
            self.remove(child);
        }

        for child in children {
            if let Some(dup) = duplicable::duplicate(self, child, mode) {
                self.append_child(target, dup);
            }
        }
    }

    /// Compare content, then ordered child identifiers.
    ///
    /// A container whose child is flagged modified is never equal to its
    /// origin, so children must have their status checked first.
    fn are_equal(&self, origin: NodeId, object: NodeId) -> bool {
        let (Some(origin), Some(node)) = (self.get(origin), self.get(object)) else {
            return false;
        };

        if origin.data != node.data {
            return false;
        }

        let origin_ids = origin.children.iter().filter_map(|id| self.get(*id)).map(ItemNode::id);
        let node_ids = node.children.iter().filter_map(|id| self.get(*id)).map(ItemNode::id);
        if !origin_ids.eq(node_ids) {
            return false;
        }

        !node
            .children
            .iter()
            .any(|child| duplicable::is_modified(self, *child))
    }

    /// Validate node.
    ///
    /// - A profile needs a command and non-empty file filters.
    /// - An action needs a label for its targets, and at least one valid
    ///   profile.
    /// - A menu needs a label, and at least one valid child.
    fn is_valid(&self, object: NodeId) -> bool {
        let Some(node) = self.get(object) else {
            return false;
        };

        if !node.has_valid_content() {
            return false;
        }

        let mut children = node
            .children
            .iter()
            .filter_map(|id| self.get(*id).map(|child| (*id, child)));
        match node.kind() {
            ItemKind::Profile(_) => true,
            ItemKind::Action(_) => children
                .any(|(id, child)| child.kind().is_profile() && duplicable::is_valid(self, id)),
            ItemKind::Menu(_) => children.any(|(id, _)| duplicable::is_valid(self, id)),
        }
    }
}
