// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Menu, action, and profile nodes.
//!
//! Every node of the item hierarchy is one of three kinds:
//!
//! - A __menu__ groups other menus and actions.
//! - An __action__ is what the user eventually runs. It owns one or more
//!   profiles.
//! - A __profile__ says which command an action runs, and for which files.
//!
//! Menus and actions are __items__. Only items take part in the hierarchy
//! built out of provider data, i.e., profiles always stay under the action
//! that owns them.
//!
//! Nodes live in an [`ItemTree`](tree::ItemTree) arena and refer to each
//! other through [`NodeId`] handles.

pub mod tree;

use crate::{duplicable::DuplicableState, provider::Writability};

use std::fmt::{Display, Formatter, Result as FmtResult};

/// Handle of a node inside an [`ItemTree`](tree::ItemTree).
///
/// Slots of removed nodes get reused, so a handle also remembers the
/// generation of the slot it was handed out for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId {
    pub(crate) index: usize,
    pub(crate) generation: u32,
}

impl Display for NodeId {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self.generation {
            0 => write!(fmt, "#{}", self.index),
            generation => write!(fmt, "#{}.{generation}", self.index),
        }
    }
}

/// Kind-specific node data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    /// Groups other menus and actions.
    Menu(MenuData),

    /// Runs one of its profiles.
    Action(ActionData),

    /// Command and file filters of an action.
    Profile(ProfileData),
}

impl ItemKind {
    /// Whether node is a menu or an action.
    pub fn is_item(&self) -> bool {
        !self.is_profile()
    }

    pub fn is_menu(&self) -> bool {
        matches!(self, Self::Menu(_))
    }

    pub fn is_action(&self) -> bool {
        matches!(self, Self::Action(_))
    }

    pub fn is_profile(&self) -> bool {
        matches!(self, Self::Profile(_))
    }

    /// Empty data of the same kind.
    pub fn empty_like(&self) -> Self {
        match self {
            Self::Menu(_) => Self::Menu(MenuData::default()),
            Self::Action(_) => Self::Action(ActionData::default()),
            Self::Profile(_) => Self::Profile(ProfileData::default()),
        }
    }

    /// Short name of kind, for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Menu(_) => "menu",
            Self::Action(_) => "action",
            Self::Profile(_) => "profile",
        }
    }
}

/// Menu data.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct MenuData {
    /// Persisted ordering of the identifiers of the menu's children.
    pub child_order: Vec<String>,
}

/// Action data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionData {
    /// Shown in the selection context menu.
    pub target_context: bool,

    /// Shown in the location context menu.
    pub target_location: bool,

    /// Shown in the toolbar.
    pub target_toolbar: bool,

    /// Label used in the toolbar. Falls back to the item label if empty.
    pub toolbar_label: String,
}

impl Default for ActionData {
    fn default() -> Self {
        Self {
            target_context: true,
            target_location: false,
            target_toolbar: false,
            toolbar_label: String::new(),
        }
    }
}

/// Profile data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileData {
    /// Command to run.
    pub path: String,

    /// Command parameters.
    pub parameters: String,

    /// File name patterns the profile applies to.
    pub basenames: Vec<String>,

    /// Mimetype patterns the profile applies to.
    pub mimetypes: Vec<String>,
}

impl Default for ProfileData {
    fn default() -> Self {
        Self {
            path: String::new(),
            parameters: String::new(),
            basenames: vec!["*".into()],
            mimetypes: vec!["*/*".into()],
        }
    }
}

/// Node content compared by duplicate tracking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemData {
    /// Identifier, unique within its provider.
    pub id: String,

    /// Label shown to the user.
    pub label: String,

    /// Tooltip shown to the user.
    pub tooltip: String,

    /// Icon name or path.
    pub icon: String,

    /// Disabled nodes are only loaded on request.
    pub enabled: bool,

    /// Kind-specific data.
    pub kind: ItemKind,
}

impl ItemData {
    /// Construct new node data of given kind.
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            tooltip: String::new(),
            icon: String::new(),
            enabled: true,
            kind,
        }
    }

    /// Construct new menu data with ordered child identifiers.
    pub fn menu(
        id: impl Into<String>,
        label: impl Into<String>,
        child_order: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let child_order = child_order.into_iter().map(Into::into).collect();
        Self::new(id, label, ItemKind::Menu(MenuData { child_order }))
    }

    /// Construct new action data targeting the selection context menu.
    pub fn action(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(id, label, ItemKind::Action(ActionData::default()))
    }

    /// Construct new profile data running given command on any file.
    pub fn profile(
        id: impl Into<String>,
        label: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self::new(
            id,
            label,
            ItemKind::Profile(ProfileData {
                path: path.into(),
                ..ProfileData::default()
            }),
        )
    }
}

/// Node of the item hierarchy.
///
/// Beyond its [`ItemData`], a node keeps track of where it belongs: its
/// parent and children inside the arena, which provider it came from, and
/// the writability verdict computed when it was loaded.
#[derive(Debug, Clone)]
pub struct ItemNode {
    /// Content of node.
    pub data: ItemData,

    /// Set by the provider when its storage cannot be modified.
    pub readonly: bool,

    /// Identifier of provider that last read or wrote this node.
    pub provider: Option<String>,

    /// Opaque provider-specific data, e.g., where the node is stored.
    pub provider_data: Option<String>,

    /// Writability verdict, computed at load time.
    pub writability: Writability,

    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) status: Option<DuplicableState<NodeId>>,
}

impl ItemNode {
    /// Construct new detached node.
    pub fn new(data: ItemData) -> Self {
        Self {
            data,
            readonly: false,
            provider: None,
            provider_data: None,
            writability: Writability::default(),
            parent: None,
            children: Vec::new(),
            status: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.data.id
    }

    pub fn label(&self) -> &str {
        &self.data.label
    }

    pub fn kind(&self) -> &ItemKind {
        &self.data.kind
    }

    pub fn is_enabled(&self) -> bool {
        self.data.enabled
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Persisted child ordering, if node is a menu.
    pub fn child_order(&self) -> Option<&[String]> {
        match self.kind() {
            ItemKind::Menu(menu) => Some(&menu.child_order),
            _ => None,
        }
    }

    /// Whether own content is valid, regardless of children.
    pub(crate) fn has_valid_content(&self) -> bool {
        match self.kind() {
            ItemKind::Menu(_) => !self.label().trim().is_empty(),
            ItemKind::Action(action) => {
                let label_ok = !(action.target_context || action.target_location)
                    || !self.label().trim().is_empty();
                let toolbar_ok = !action.target_toolbar
                    || !action.toolbar_label.trim().is_empty()
                    || !self.label().trim().is_empty();
                label_ok && toolbar_ok
            }
            ItemKind::Profile(profile) => {
                !profile.path.trim().is_empty()
                    && !profile.basenames.is_empty()
                    && !profile.mimetypes.is_empty()
            }
        }
    }
}
