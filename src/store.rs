// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Item store management.
//!
//! The __item store__ is the session object that owns everything needed to
//! load and save menus and actions: the layered preferences, the provider
//! registry, and the bus that status changes get reported on.
//!
//! # Loading
//!
//! [`ItemStore::load_items`] turns whatever the providers hold into one
//! hierarchy:
//!
//! 1. Read the flat item lists of every readable provider.
//! 2. Rebuild the hierarchy out of the level zero list and the child lists
//!    of menus.
//! 3. Rewrite level zero if it was empty, or if items were left over. This
//!    can fail, e.g., because level zero is mandatory, in which case loading
//!    carries on regardless.
//! 4. Sort by label, unless manual ordering is preferred.
//! 5. Check status of every node, children first.
//! 6. Drop every node the [`LoadFlags`] do not allow.
//! 7. Compute the writability verdict of every remaining node.
//!
//! The resulting tree is owned by the caller.
//!
//! # See Also
//!
//! 1. [`hierarchy`]
//! 2. [`filter`]

pub mod filter;
pub mod hierarchy;

pub use filter::DroppedItem;

use crate::{
    config::Settings,
    duplicable::{ConsumerHandle, StatusBus, StatusConsumer},
    item::{tree::ItemTree, NodeId},
    provider::{registry::ProviderRegistry, IoProvider, OperationStatus, ProviderHooks},
};

use std::fmt::Arguments;
use tracing::{debug, info, instrument, warn};

/// Which otherwise dropped nodes to keep while loading.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadFlags {
    /// Keep disabled menus and actions.
    pub load_disabled: bool,

    /// Keep invalid nodes.
    pub load_invalid: bool,
}

impl LoadFlags {
    /// Keep everything.
    pub const fn all() -> Self {
        Self {
            load_disabled: true,
            load_invalid: true,
        }
    }
}

/// Result of loading items.
#[derive(Debug)]
pub struct LoadReport {
    /// Loaded hierarchy.
    pub tree: ItemTree,

    /// Nodes dropped by filtering, in the order they were dropped.
    pub dropped: Vec<DroppedItem>,

    /// Level zero got rewritten to preferences.
    pub level_zero_repaired: bool,
}

/// Session over every known provider.
#[derive(Debug)]
pub struct ItemStore {
    settings: Settings,
    registry: ProviderRegistry,
    bus: StatusBus<NodeId>,
}

impl ItemStore {
    /// Construct new item store out of preferences and loaded backends.
    pub fn new(
        settings: Settings,
        backends: impl IntoIterator<Item = Box<dyn IoProvider>>,
    ) -> Self {
        let registry = ProviderRegistry::new(&settings, backends);
        Self {
            settings,
            registry,
            bus: StatusBus::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Mutable access to preferences.
    ///
    /// Call [`ItemStore::refresh_writability`] after changing provider
    /// locks.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Recompute writability of every provider.
    pub fn refresh_writability(&mut self) {
        self.registry.refresh_writability(&self.settings);
    }

    /// Register consumer of every status change reported by this store.
    pub fn register_consumer(
        &mut self,
        consumer: impl StatusConsumer<NodeId> + 'static,
    ) -> ConsumerHandle {
        self.bus.register_consumer(consumer)
    }

    /// Unregister consumer, returning whether it was registered.
    pub fn unregister_consumer(&mut self, handle: ConsumerHandle) -> bool {
        self.bus.unregister_consumer(handle)
    }

    /// Check status of node and its subtree, reporting changes to registered
    /// consumers.
    pub fn check_status(&mut self, tree: &mut ItemTree, node: NodeId) {
        tree.check_status(node, &mut self.bus);
    }

    /// Load the item hierarchy out of every readable provider.
    ///
    /// Failures of providers are reported through `messages`, and never stop
    /// the load.
    #[instrument(skip(self, messages), level = "debug")]
    pub fn load_items(&mut self, flags: LoadFlags, messages: &mut Vec<String>) -> LoadReport {
        let mut tree = ItemTree::new();
        let pool = hierarchy::merge_providers(&self.registry, &self.settings, &mut tree, messages);
        let pooled = pool.len();

        let level_zero = self.settings.level_zero_order().value;
        let leftovers = hierarchy::build_hierarchy(&mut tree, pool, &level_zero);
        let level_zero_repaired =
            (level_zero.is_empty() || leftovers > 0) && self.repair_level_zero(&tree);

        tree.sort_by_label(self.settings.order_mode().value);

        for root in tree.roots().to_vec() {
            tree.check_status(root, &mut self.bus);
        }

        let dropped = filter::filter_tree(&mut tree, flags);

        for node in tree.depth_first() {
            let writability = self.registry.item_writability(&tree, node, &self.settings);
            if let Some(node) = tree.get_mut(node) {
                node.writability = writability;
            }
        }

        info!(
            "load {} nodes out of {pooled} items, drop {}",
            tree.len(),
            dropped.len()
        );

        LoadReport {
            tree,
            dropped,
            level_zero_repaired,
        }
    }

    /// Write item through target provider.
    ///
    /// On success the item remembers `provider_id` as its provider.
    ///
    /// # Panics
    ///
    /// In debug builds, if the item or the provider is unknown, if the
    /// provider has no backend, or if it cannot write. Release builds log it
    /// and return [`OperationStatus::ProgramError`] instead.
    #[instrument(skip(self, tree, messages), level = "debug")]
    pub fn write_item(
        &self,
        tree: &mut ItemTree,
        item: NodeId,
        provider_id: &str,
        messages: &mut Vec<String>,
    ) -> OperationStatus {
        if !tree.contains(item) {
            return precondition_failed("write_item", format_args!("no node {item}"));
        }

        let backend = self.backend_for("write_item", provider_id, |hooks| hooks.write_item);
        let Some(backend) = backend else {
            return OperationStatus::ProgramError;
        };

        let status = backend.write_item(tree, item, messages);
        if status.is_ok() {
            if let Some(node) = tree.get_mut(item) {
                node.provider = Some(provider_id.to_owned());
            }
        }

        debug!("write {:?} through {provider_id:?}: {status}", tree.id_path(item));
        status
    }

    /// Delete item through target provider.
    ///
    /// # Panics
    ///
    /// In debug builds, if the item or the provider is unknown, if the
    /// provider has no backend, or if it cannot delete. Release builds log it
    /// and return [`OperationStatus::ProgramError`] instead.
    #[instrument(skip(self, tree, messages), level = "debug")]
    pub fn delete_item(
        &self,
        tree: &ItemTree,
        item: NodeId,
        provider_id: &str,
        messages: &mut Vec<String>,
    ) -> OperationStatus {
        if !tree.contains(item) {
            return precondition_failed("delete_item", format_args!("no node {item}"));
        }

        let backend = self.backend_for("delete_item", provider_id, |hooks| hooks.delete_item);
        let Some(backend) = backend else {
            return OperationStatus::ProgramError;
        };

        let status = backend.delete_item(tree, item, messages);
        debug!("delete {:?} through {provider_id:?}: {status}", tree.id_path(item));
        status
    }

    /// Duplicate provider-specific data of `source` onto `dest`.
    ///
    /// Provider-specific data of `dest` is always cleared first.
    ///
    /// # Panics
    ///
    /// In debug builds, if either node or the provider is unknown, if the
    /// provider has no backend, or if it cannot duplicate its data. Release
    /// builds log it and return [`OperationStatus::ProgramError`] instead.
    #[instrument(skip(self, tree, messages), level = "debug")]
    pub fn duplicate_data(
        &self,
        tree: &mut ItemTree,
        dest: NodeId,
        source: NodeId,
        provider_id: &str,
        messages: &mut Vec<String>,
    ) -> OperationStatus {
        let Some(node) = tree.get_mut(dest) else {
            return precondition_failed("duplicate_data", format_args!("no node {dest}"));
        };
        node.provider_data = None;

        if !tree.contains(source) {
            return precondition_failed("duplicate_data", format_args!("no node {source}"));
        }

        let backend = self.backend_for("duplicate_data", provider_id, |hooks| hooks.duplicate_data);
        let Some(backend) = backend else {
            return OperationStatus::ProgramError;
        };

        backend.duplicate_data(tree, dest, source, messages)
    }

    /// Tear down store, releasing every backend.
    pub fn shutdown(self) {
        self.registry.shutdown();
    }

    fn repair_level_zero(&mut self, tree: &ItemTree) -> bool {
        let ids = tree
            .roots()
            .iter()
            .filter_map(|root| tree.get(*root))
            .map(|root| root.id().to_owned())
            .collect::<Vec<_>>();

        match self.settings.set_level_zero_order(ids) {
            Ok(()) => {
                info!("rewrite level zero order");
                true
            }
            Err(err) => {
                warn!("cannot rewrite level zero order: {err}");
                false
            }
        }
    }

    fn backend_for(
        &self,
        operation: &str,
        provider_id: &str,
        hook: impl Fn(&ProviderHooks) -> bool,
    ) -> Option<&dyn IoProvider> {
        let Some(record) = self.registry.find_by_id(provider_id) else {
            precondition_failed(operation, format_args!("unknown provider {provider_id:?}"));
            return None;
        };

        let Some(backend) = record.backend() else {
            precondition_failed(operation, format_args!("provider {provider_id:?} has no backend"));
            return None;
        };

        if !hook(&backend.hooks()) {
            precondition_failed(
                operation,
                format_args!("provider {provider_id:?} does not implement it"),
            );
            return None;
        }

        Some(backend)
    }
}

fn precondition_failed(operation: &str, reason: Arguments<'_>) -> OperationStatus {
    warn!("{operation}: {reason}");
    debug_assert!(false, "{operation}: {reason}");
    OperationStatus::ProgramError
}
