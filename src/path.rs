// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine where preference files live when the caller does not supply
//! explicit locations.

use std::path::PathBuf;

/// Determine default absolute path to the preference directory.
///
/// Uses XDG Base Directory path `$XDG_CONFIG_HOME/fma-repository`. Does not
/// check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if configuration directory cannot be determined.
///
/// # See Also
///
/// - [XDG Base Directory](https://wiki.archlinux.org/title/XDG_Base_Directory)
pub fn default_prefs_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|path| path.join("fma-repository"))
        .ok_or(NoWayHome)
}

/// Determine default absolute path to the user preference layer.
///
/// # Errors
///
/// - Return [`NoWayHome`] if configuration directory cannot be determined.
pub fn default_user_prefs_path() -> Result<PathBuf> {
    default_prefs_dir().map(|dir| dir.join("settings.toml"))
}

/// Determine default absolute path to the mandatory preference layer.
///
/// The mandatory layer is owned by an administrator. Nothing in this crate
/// writes to it.
///
/// # Errors
///
/// - Return [`NoWayHome`] if configuration directory cannot be determined.
pub fn default_mandatory_prefs_path() -> Result<PathBuf> {
    default_prefs_dir().map(|dir| dir.join("mandatory.toml"))
}

/// No way to determine user's configuration directory.
///
/// # See Also
///
/// - [`dirs::config_dir`](https://docs.rs/dirs/latest/dirs/fn.config_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's configuration directory")]
pub struct NoWayHome;

/// Friendly result alias :3
pub type Result<T, E = NoWayHome> = std::result::Result<T, E>;
