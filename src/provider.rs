// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Storage provider interface.
//!
//! A __provider__ is a pluggable storage backend that menus and actions are
//! read from and written to. Backends are external to this crate: they only
//! need to implement [`IoProvider`]. Nothing here knows how or where a
//! backend stores its items.
//!
//! # Hooks
//!
//! Backends advertise which operations they actually implement through
//! [`ProviderHooks`]. A missing hook is never an error. It only degrades what
//! the backend can be used for, e.g., a backend without a delete hook is
//! never considered writable.
//!
//! # See Also
//!
//! 1. [`registry`]

pub mod registry;

use crate::item::{tree::ItemTree, NodeId};

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};

/// Operations a backend implements.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderHooks {
    pub read_items: bool,
    pub is_willing_to_write: bool,
    pub is_able_to_write: bool,
    pub write_item: bool,
    pub delete_item: bool,
    pub duplicate_data: bool,
}

impl ProviderHooks {
    /// Every hook implemented.
    pub const fn all() -> Self {
        Self {
            read_items: true,
            is_willing_to_write: true,
            is_able_to_write: true,
            write_item: true,
            delete_item: true,
            duplicate_data: true,
        }
    }

    /// Only reading implemented.
    pub const fn read_only() -> Self {
        Self {
            read_items: true,
            is_willing_to_write: false,
            is_able_to_write: false,
            write_item: false,
            delete_item: false,
            duplicate_data: false,
        }
    }

    /// Whether every hook needed for writing is implemented.
    pub fn is_write_complete(&self) -> bool {
        self.is_willing_to_write && self.is_able_to_write && self.write_item && self.delete_item
    }
}

/// Storage backend for menus and actions.
///
/// Only [`IoProvider::id`] and [`IoProvider::hooks`] are required. Every
/// other operation is only ever called when its hook is advertised, and
/// defaults to doing nothing.
pub trait IoProvider: Debug {
    /// Stable identifier of backend.
    fn id(&self) -> &str;

    /// Displayable name of backend.
    fn name(&self) -> &str {
        self.id()
    }

    /// Operations this backend implements.
    fn hooks(&self) -> ProviderHooks;

    /// Read every menu and action the backend holds.
    ///
    /// New nodes are inserted into `tree` as a flat list: menus carry their
    /// ordered child identifiers in [`MenuData`](crate::item::MenuData), and
    /// actions already own their profiles. Failures are reported through
    /// `messages`.
    fn read_items(&self, tree: &mut ItemTree, messages: &mut Vec<String>) -> Vec<NodeId> {
        let _ = (tree, messages);
        Vec::new()
    }

    /// Whether backend supports writing at all.
    fn is_willing_to_write(&self) -> bool {
        false
    }

    /// Whether backend is currently able to write.
    fn is_able_to_write(&self) -> bool {
        false
    }

    /// Write item, replacing any previous version of it.
    fn write_item(
        &self,
        tree: &mut ItemTree,
        item: NodeId,
        messages: &mut Vec<String>,
    ) -> OperationStatus {
        let _ = (tree, item, messages);
        OperationStatus::ProgramError
    }

    /// Delete item from storage.
    fn delete_item(
        &self,
        tree: &ItemTree,
        item: NodeId,
        messages: &mut Vec<String>,
    ) -> OperationStatus {
        let _ = (tree, item, messages);
        OperationStatus::ProgramError
    }

    /// Duplicate backend-specific data of `source` onto `dest`.
    fn duplicate_data(
        &self,
        tree: &mut ItemTree,
        dest: NodeId,
        source: NodeId,
        messages: &mut Vec<String>,
    ) -> OperationStatus {
        let _ = (tree, dest, source, messages);
        OperationStatus::ProgramError
    }
}

/// Result code of a provider operation.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    Ok = 0,
    ProgramError = 12,
    NotWillingToRun = 13,
    WriteError = 14,
    SchemaDeleteError = 15,
    ConfigDeleteError = 16,
}

impl OperationStatus {
    /// Stable integer code.
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}

impl TryFrom<u8> for OperationStatus {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Ok),
            12 => Ok(Self::ProgramError),
            13 => Ok(Self::NotWillingToRun),
            14 => Ok(Self::WriteError),
            15 => Ok(Self::SchemaDeleteError),
            16 => Ok(Self::ConfigDeleteError),
            unknown => Err(unknown),
        }
    }
}

impl Display for OperationStatus {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(match self {
            Self::Ok => "operation succeeded",
            Self::ProgramError => "program flow error",
            Self::NotWillingToRun => "provider is not willing to run",
            Self::WriteError => "unable to write item",
            Self::SchemaDeleteError => "unable to delete schemas",
            Self::ConfigDeleteError => "unable to delete configuration",
        })
    }
}

/// Why something is, or is not, writable.
#[repr(u8)]
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritabilityReason {
    Writable = 0,
    Unavailable = 1,
    IncompleteApi = 2,
    NotWilling = 3,
    NotAble = 4,
    LockedByAdmin = 5,
    LockedByUser = 6,
    ItemReadonly = 7,
    NoProviderFound = 8,
    LevelZeroNotWritable = 9,
    #[default]
    Undetermined = 10,
}

impl WritabilityReason {
    /// Stable integer code.
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn is_writable(self) -> bool {
        self == Self::Writable
    }
}

impl TryFrom<u8> for WritabilityReason {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Writable),
            1 => Ok(Self::Unavailable),
            2 => Ok(Self::IncompleteApi),
            3 => Ok(Self::NotWilling),
            4 => Ok(Self::NotAble),
            5 => Ok(Self::LockedByAdmin),
            6 => Ok(Self::LockedByUser),
            7 => Ok(Self::ItemReadonly),
            8 => Ok(Self::NoProviderFound),
            9 => Ok(Self::LevelZeroNotWritable),
            10 => Ok(Self::Undetermined),
            unknown => Err(unknown),
        }
    }
}

impl Display for WritabilityReason {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(match self {
            Self::Writable => "writable",
            Self::Unavailable => "provider is not available",
            Self::IncompleteApi => "provider does not implement the write interface",
            Self::NotWilling => "provider is not willing to write",
            Self::NotAble => "provider is not able to write",
            Self::LockedByAdmin => "locked by the administrator",
            Self::LockedByUser => "locked by the user",
            Self::ItemReadonly => "item is read-only",
            Self::NoProviderFound => "no writable provider found",
            Self::LevelZeroNotWritable => "level zero order is not writable",
            Self::Undetermined => "writability status is undetermined",
        })
    }
}

/// Cached writability verdict.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Writability {
    pub writable: bool,
    pub reason: WritabilityReason,
}

impl Writability {
    /// Writable verdict.
    pub const fn writable() -> Self {
        Self {
            writable: true,
            reason: WritabilityReason::Writable,
        }
    }

    /// Non-writable verdict for given reason.
    pub const fn denied(reason: WritabilityReason) -> Self {
        Self {
            writable: false,
            reason,
        }
    }
}
