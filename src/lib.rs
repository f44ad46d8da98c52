// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Repository of file manager actions.
//!
//! File manager context menus are made of __menus__ and __actions__ read
//! from one or more storage __providers__. This crate merges whatever the
//! providers hold into one ordered hierarchy, keeps track of which nodes an
//! edit session changed, and works out which nodes can be written back.
//!
//! # Getting Started
//!
//! Hand every storage backend over to an [`ItemStore`], together with the
//! layered [`Settings`], and load the hierarchy:
//!
//! ```no_run
//! use fma_repository::{ItemStore, LoadFlags, Settings};
//!
//! let settings = Settings::open_default()?;
//! let mut store = ItemStore::new(settings, Vec::new());
//! let mut messages = Vec::new();
//! let report = store.load_items(LoadFlags::default(), &mut messages);
//! for node in report.tree.depth_first() {
//!     println!("{}", report.tree.id_path(node));
//! }
//! store.shutdown();
//! # Ok::<(), fma_repository::config::ConfigError>(())
//! ```
//!
//! # See Also
//!
//! 1. [`duplicable`]
//! 2. [`provider`]
//! 3. [`store`]

pub mod config;
pub mod duplicable;
pub mod item;
pub mod path;
pub mod provider;
pub mod store;

pub use config::Settings;
pub use item::{tree::ItemTree, ItemData, ItemKind, ItemNode, NodeId};
pub use provider::{
    registry::ProviderRegistry, IoProvider, OperationStatus, ProviderHooks, Writability,
    WritabilityReason,
};
pub use store::{ItemStore, LoadFlags, LoadReport};
