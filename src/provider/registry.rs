// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Provider registration.
//!
//! The __provider registry__ keeps one [`ProviderRecord`] per known provider
//! identifier. A record exists either because a backend announced itself, or
//! because the identifier was mentioned in preferences, i.e., a record does
//! not need a backend to exist.
//!
//! # Record Ordering
//!
//! Records are kept in write order. Identifiers listed by
//! `io-providers-write-order` come first, in that order. Backends unknown to
//! the write order follow in the order they were handed over. Identifiers
//! that only have a preference group come last.
//!
//! # Writability
//!
//! Every record caches a [`Writability`] verdict computed when its backend
//! gets attached. The first disqualifier found wins:
//!
//! 1. No backend attached.
//! 2. Backend lacks any of the hooks needed for writing.
//! 3. Backend is not willing to write.
//! 4. Backend is not able to write right now.
//! 5. Preferences set `writable = false` for the provider.

use crate::{
    config::Settings,
    item::{tree::ItemTree, NodeId},
    provider::{IoProvider, Writability, WritabilityReason},
};

use tracing::{debug, info, instrument, warn};

/// Entry of the provider registry.
#[derive(Debug)]
pub struct ProviderRecord {
    id: String,
    backend: Option<Box<dyn IoProvider>>,
    writability: Writability,
}

impl ProviderRecord {
    fn placeholder(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            backend: None,
            writability: Writability::denied(WritabilityReason::Unavailable),
        }
    }

    /// Identifier of provider.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Displayable name of provider.
    ///
    /// Falls back to the identifier if no backend is attached.
    pub fn name(&self) -> &str {
        match &self.backend {
            Some(backend) => backend.name(),
            None => &self.id,
        }
    }

    /// Attached backend, if any.
    pub fn backend(&self) -> Option<&dyn IoProvider> {
        self.backend.as_deref()
    }

    /// Whether a backend is attached.
    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    /// Whether items should be read from this provider.
    pub fn is_readable(&self, settings: &Settings) -> bool {
        settings.provider_readable(&self.id).value
    }

    /// Cached writability verdict.
    pub fn writability(&self) -> Writability {
        self.writability
    }

    /// Recompute cached writability verdict.
    pub fn refresh_writability(&mut self, settings: &Settings) {
        self.writability = resolve_writability(self.backend(), &self.id, settings);
    }

    fn attach(&mut self, backend: Box<dyn IoProvider>, settings: &Settings) {
        self.backend = Some(backend);
        self.refresh_writability(settings);
        debug!(
            "attach backend to provider {:?}: {}",
            self.id, self.writability.reason
        );
    }
}

/// Resolve writability of a provider.
///
/// See [module level documentation](self) for the order in which
/// disqualifiers are checked.
pub fn resolve_writability(
    backend: Option<&dyn IoProvider>,
    id: &str,
    settings: &Settings,
) -> Writability {
    let Some(backend) = backend else {
        return Writability::denied(WritabilityReason::Unavailable);
    };

    if !backend.hooks().is_write_complete() {
        return Writability::denied(WritabilityReason::IncompleteApi);
    }

    if !backend.is_willing_to_write() {
        return Writability::denied(WritabilityReason::NotWilling);
    }

    if !backend.is_able_to_write() {
        return Writability::denied(WritabilityReason::NotAble);
    }

    let writable = settings.provider_writable(id);
    if !writable.value {
        return Writability::denied(match writable.mandatory {
            true => WritabilityReason::LockedByAdmin,
            false => WritabilityReason::LockedByUser,
        });
    }

    Writability::writable()
}

/// Registry of every known provider.
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    records: Vec<ProviderRecord>,
}

impl ProviderRegistry {
    /// Build registry out of preferences and loaded backends.
    ///
    /// A backend announcing an identifier that already has a backend
    /// attached is ignored.
    #[instrument(skip(settings, backends), level = "debug")]
    pub fn new(
        settings: &Settings,
        backends: impl IntoIterator<Item = Box<dyn IoProvider>>,
    ) -> Self {
        let mut registry = Self::default();

        for id in settings.io_providers_write_order().value {
            registry.ensure_record(id);
        }

        for backend in backends {
            let id = backend.id().to_owned();
            let index = registry.ensure_record(id.as_str());
            let record = &mut registry.records[index];
            if record.is_available() {
                warn!("provider {id:?} already has a backend, ignore {:?}", backend.name());
                continue;
            }
            record.attach(backend, settings);
        }

        for id in settings.io_provider_ids() {
            registry.ensure_record(id);
        }

        info!("register {} providers", registry.len());
        registry
    }

    /// Every record in write order.
    pub fn records(&self) -> &[ProviderRecord] {
        &self.records
    }

    /// Find record by provider identifier.
    pub fn find_by_id(&self, id: &str) -> Option<&ProviderRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    /// First writable record in write order.
    pub fn find_writable(&self) -> Option<&ProviderRecord> {
        self.records
            .iter()
            .find(|record| record.writability.writable)
    }

    /// Identifiers of every record in write order.
    pub fn write_order(&self) -> Vec<&str> {
        self.records.iter().map(ProviderRecord::id).collect()
    }

    /// Recompute writability of every record, e.g., after preferences
    /// changed.
    pub fn refresh_writability(&mut self, settings: &Settings) {
        for record in &mut self.records {
            record.refresh_writability(settings);
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Writability verdict of a node.
    ///
    /// Profiles take the verdict of the action that owns them.
    pub fn item_writability(
        &self,
        tree: &ItemTree,
        node: NodeId,
        settings: &Settings,
    ) -> Writability {
        let Some(item) = tree.get(node) else {
            warn!("no node {node} to compute writability of");
            debug_assert!(false, "writability of missing node {node}");
            return Writability::denied(WritabilityReason::Undetermined);
        };

        if let (true, Some(parent)) = (item.kind().is_profile(), item.parent()) {
            return self.item_writability(tree, parent, settings);
        }

        if settings.is_admin_locked() {
            return Writability::denied(WritabilityReason::LockedByAdmin);
        }

        if item.readonly {
            return Writability::denied(WritabilityReason::ItemReadonly);
        }

        let verdict = match item.provider.as_deref() {
            Some(id) => self
                .find_by_id(id)
                .map(ProviderRecord::writability)
                .unwrap_or(Writability::denied(WritabilityReason::NoProviderFound)),
            None => self
                .find_writable()
                .map(ProviderRecord::writability)
                .unwrap_or(Writability::denied(WritabilityReason::NoProviderFound)),
        };

        if verdict.writable && item.parent().is_none() && !settings.is_level_zero_writable() {
            return Writability::denied(WritabilityReason::LevelZeroNotWritable);
        }

        verdict
    }

    /// Tear down registry, releasing every backend.
    pub fn shutdown(self) {
        info!("shutdown {} providers", self.records.len());
        for record in self.records {
            if record.is_available() {
                debug!("release backend of provider {:?}", record.id);
            }
        }
    }

    fn ensure_record(&mut self, id: impl AsRef<str> + Into<String>) -> usize {
        if let Some(index) = self.records.iter().position(|record| record.id == id.as_ref()) {
            return index;
        }

        self.records.push(ProviderRecord::placeholder(id));
        self.records.len() - 1
    }
}
