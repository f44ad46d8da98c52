// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT


use fma_repository::{
    config::PrefsLayout, IoProvider, ItemData, ItemTree, NodeId, OperationStatus, ProviderHooks,
    Settings,
};

use anyhow::Result;
use std::{cell::RefCell, rc::Rc};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install log output for a test, once per test binary.
pub(crate) fn init_tracing() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time()
        .with_test_writer();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    let _ = tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .try_init();
}

/// Settings out of in-memory user and mandatory layers.
pub(crate) fn settings(user: &str, mandatory: &str) -> Result<Settings> {
    Ok(Settings::new(
        user.parse::<PrefsLayout>()?,
        mandatory.parse::<PrefsLayout>()?,
    ))
}

/// Shared record of the write calls a provider received.
pub(crate) type Journal = Rc<RefCell<Vec<String>>>;

/// Item held by a [`MemoryProvider`].
#[derive(Debug, Clone)]
pub(crate) struct FixtureItem {
    pub(crate) data: ItemData,
    pub(crate) profiles: Vec<ItemData>,
    pub(crate) readonly: bool,
}

impl FixtureItem {
    pub(crate) fn menu(id: &str, label: &str, children: &[&str]) -> Self {
        Self {
            data: ItemData::menu(id, label, children.iter().copied()),
            profiles: Vec::new(),
            readonly: false,
        }
    }

    /// Action with one valid profile.
    pub(crate) fn action(id: &str, label: &str) -> Self {
        Self {
            data: ItemData::action(id, label),
            profiles: vec![ItemData::profile(
                format!("{id}-profile"),
                "Default profile",
                "/usr/bin/true",
            )],
            readonly: false,
        }
    }

    pub(crate) fn disabled(mut self) -> Self {
        self.data.enabled = false;
        self
    }

    pub(crate) fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }
}

/// In-memory storage backend.
#[derive(Debug, Clone)]
pub(crate) struct MemoryProvider {
    id: String,
    hooks: ProviderHooks,
    willing: bool,
    able: bool,
    items: Vec<FixtureItem>,
    read_error: Option<String>,
    write_status: OperationStatus,
    journal: Journal,
}

impl MemoryProvider {
    pub(crate) fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            hooks: ProviderHooks::all(),
            willing: true,
            able: true,
            items: Vec::new(),
            read_error: None,
            write_status: OperationStatus::Ok,
            journal: Journal::default(),
        }
    }

    pub(crate) fn with_hooks(mut self, hooks: ProviderHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub(crate) fn unwilling(mut self) -> Self {
        self.willing = false;
        self
    }

    pub(crate) fn unable(mut self) -> Self {
        self.able = false;
        self
    }

    pub(crate) fn with_item(mut self, item: FixtureItem) -> Self {
        self.items.push(item);
        self
    }

    pub(crate) fn with_read_error(mut self, message: impl Into<String>) -> Self {
        self.read_error = Some(message.into());
        self
    }

    pub(crate) fn with_write_status(mut self, status: OperationStatus) -> Self {
        self.write_status = status;
        self
    }

    pub(crate) fn journal(&self) -> Journal {
        self.journal.clone()
    }

    pub(crate) fn boxed(self) -> Box<dyn IoProvider> {
        Box::new(self)
    }

    fn cookie(&self, item_id: &str) -> String {
        format!("{}:{item_id}", self.id)
    }

    fn note(&self, entry: String) {
        self.journal.borrow_mut().push(entry);
    }
}

impl IoProvider for MemoryProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn hooks(&self) -> ProviderHooks {
        self.hooks
    }

    fn read_items(&self, tree: &mut ItemTree, messages: &mut Vec<String>) -> Vec<NodeId> {
        if let Some(error) = &self.read_error {
            messages.push(error.clone());
        }

        let mut read = Vec::new();
        for item in &self.items {
            let node = tree.insert(item.data.clone());
            for profile in &item.profiles {
                tree.insert_child(node, profile.clone());
            }

            if let Some(node) = tree.get_mut(node) {
                node.readonly = item.readonly;
                node.provider_data = Some(self.cookie(&item.data.id));
            }
            read.push(node);
        }

        read
    }

    fn is_willing_to_write(&self) -> bool {
        self.willing
    }

    fn is_able_to_write(&self) -> bool {
        self.able
    }

    fn write_item(
        &self,
        tree: &mut ItemTree,
        item: NodeId,
        messages: &mut Vec<String>,
    ) -> OperationStatus {
        let Some(node) = tree.get_mut(item) else {
            return OperationStatus::ProgramError;
        };

        self.note(format!("write {}", node.id()));
        if !self.write_status.is_ok() {
            messages.push(format!("cannot write {}: {}", node.id(), self.write_status));
            return self.write_status;
        }

        node.provider_data = Some(self.cookie(&node.data.id));
        OperationStatus::Ok
    }

    fn delete_item(&self, tree: &ItemTree, item: NodeId, _: &mut Vec<String>) -> OperationStatus {
        let Some(node) = tree.get(item) else {
            return OperationStatus::ProgramError;
        };

        self.note(format!("delete {}", node.id()));
        OperationStatus::Ok
    }

    fn duplicate_data(
        &self,
        tree: &mut ItemTree,
        dest: NodeId,
        source: NodeId,
        _: &mut Vec<String>,
    ) -> OperationStatus {
        let Some(cookie) = tree.get(source).and_then(|node| node.provider_data.clone()) else {
            return OperationStatus::ProgramError;
        };

        let Some(node) = tree.get_mut(dest) else {
            return OperationStatus::ProgramError;
        };

        self.note(format!("duplicate {}", node.id()));
        node.provider_data = Some(format!("{cookie}+copy"));
        OperationStatus::Ok
    }
}
