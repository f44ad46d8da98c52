// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Preference layout.
//!
//! Specify the layout of the preference files that drive provider
//! registration and item loading, and layer them together.
//!
//! # Layers
//!
//! Preferences come in two layers with the same layout. The __user layer__ is
//! read from and written back to disk. The __mandatory layer__ is set by an
//! administrator and is never written. Any key present in the mandatory layer
//! overrides the user layer, and is reported as locked through
//! [`Setting::mandatory`].
//!
//! # General Layout
//!
//! ```toml
//! [runtime]
//! items-level-zero-order = ["menu-1", "action-2"]
//! items-list-order-mode = "manual"
//! io-providers-write-order = ["io-desktop", "io-xml"]
//! lock-all = false
//!
//! [io-provider.io-desktop]
//! readable = true
//! writable = true
//! ```

use crate::path::{default_mandatory_prefs_path, default_user_prefs_path};

use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    fs::{create_dir_all, read_to_string, write},
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{debug, instrument};

/// Preference file layout.
///
/// Shared by both the user layer and the mandatory layer. Every value is
/// optional so that a layer only speaks for the keys it actually sets.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct PrefsLayout {
    /// Global runtime preferences.
    #[serde(default)]
    pub runtime: RuntimePrefs,

    /// Per-provider preference groups keyed by provider identifier.
    #[serde(
        default,
        rename = "io-provider",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub io_providers: BTreeMap<String, ProviderPrefs>,
}

impl FromStr for PrefsLayout {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        toml::de::from_str(data).map_err(ConfigError::Deserialize)
    }
}

impl Display for PrefsLayout {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Global runtime preferences.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RuntimePrefs {
    /// Ordered identifiers of the items shown at the top of the hierarchy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_level_zero_order: Option<Vec<String>>,

    /// How the loaded hierarchy gets sorted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_list_order_mode: Option<OrderMode>,

    /// Ordered identifiers of providers, most preferred for writing first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub io_providers_write_order: Option<Vec<String>>,

    /// Administrator lock over the whole configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_all: Option<bool>,
}

/// Preferences of one storage provider.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct ProviderPrefs {
    /// Whether items should be read from this provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readable: Option<bool>,

    /// Whether items may be written through this provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub writable: Option<bool>,
}

/// Sorting applied to the loaded hierarchy.
#[derive(Default, Debug, PartialEq, Eq, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderMode {
    /// Alphabetical by label.
    #[default]
    Ascending,

    /// Reverse alphabetical by label.
    Descending,

    /// Keep the order given by level zero and menu child lists.
    Manual,
}

/// Effective value of a preference key.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Setting<T> {
    /// Value after layering.
    pub value: T,

    /// Value comes from the mandatory layer, and cannot be changed.
    pub mandatory: bool,
}

/// Layered preferences.
///
/// Owns the user layer and the mandatory layer. Writes only ever touch the
/// user layer, and are saved back to disk if the user layer was opened from
/// a file.
#[derive(Default, Debug, Clone)]
pub struct Settings {
    user: PrefsLayout,
    mandatory: PrefsLayout,
    user_path: Option<PathBuf>,
}

impl Settings {
    /// Construct settings from in-memory layers.
    ///
    /// Nothing gets saved to disk.
    pub fn new(user: PrefsLayout, mandatory: PrefsLayout) -> Self {
        Self {
            user,
            mandatory,
            user_path: None,
        }
    }

    /// Open settings from preference files.
    ///
    /// Missing files are treated as empty layers. The user layer path is
    /// remembered so writes can be saved back to it.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Read`] if an existing file cannot be read.
    /// - Return [`ConfigError::Deserialize`] if a file has invalid layout.
    #[instrument(skip(user_path, mandatory_path), level = "debug")]
    pub fn open(user_path: impl Into<PathBuf>, mandatory_path: impl AsRef<Path>) -> Result<Self> {
        let user_path = user_path.into();
        let user = read_layer(&user_path)?;
        let mandatory = read_layer(mandatory_path.as_ref())?;

        Ok(Self {
            user,
            mandatory,
            user_path: Some(user_path),
        })
    }

    /// Open settings from default preference file locations.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::NoWayHome`] if default locations cannot be
    ///   determined.
    /// - Return any error of [`Settings::open`].
    pub fn open_default() -> Result<Self> {
        Self::open(default_user_prefs_path()?, default_mandatory_prefs_path()?)
    }

    /// Save user layer back to its file.
    ///
    /// Does nothing if settings were not opened from a file.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Write`] if user layer cannot be written.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.user_path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            create_dir_all(parent).map_err(|err| ConfigError::Write {
                source: err,
                path: path.clone(),
            })?;
        }

        debug!("save user preferences to {:?}", path.display());
        write(path, self.user.to_string().as_bytes()).map_err(|err| ConfigError::Write {
            source: err,
            path: path.clone(),
        })
    }

    /// User preference layer.
    pub fn user_layer(&self) -> &PrefsLayout {
        &self.user
    }

    /// Mandatory preference layer.
    pub fn mandatory_layer(&self) -> &PrefsLayout {
        &self.mandatory
    }

    /// Ordered identifiers of level zero items.
    pub fn level_zero_order(&self) -> Setting<Vec<String>> {
        self.layered(|prefs| prefs.runtime.items_level_zero_order.clone(), Vec::new())
    }

    /// Rewrite level zero ordering.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Locked`] if level zero is not writable.
    /// - Return [`ConfigError::Write`] if user layer cannot be saved, leaving
    ///   the previous ordering in place.
    pub fn set_level_zero_order(
        &mut self,
        ids: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<()> {
        if self.is_admin_locked() {
            return Err(ConfigError::Locked { key: "lock-all" });
        }

        if self.level_zero_order().mandatory {
            return Err(ConfigError::Locked {
                key: "items-level-zero-order",
            });
        }

        let ids = ids.into_iter().map(Into::into).collect();
        let previous = self.user.runtime.items_level_zero_order.replace(ids);
        self.save().inspect_err(|_| {
            self.user.runtime.items_level_zero_order = previous;
        })
    }

    /// Sorting mode of the loaded hierarchy.
    pub fn order_mode(&self) -> Setting<OrderMode> {
        self.layered(|prefs| prefs.runtime.items_list_order_mode, OrderMode::default())
    }

    /// Ordered identifiers of providers for writing.
    pub fn io_providers_write_order(&self) -> Setting<Vec<String>> {
        self.layered(|prefs| prefs.runtime.io_providers_write_order.clone(), Vec::new())
    }

    /// Whether items should be read from target provider.
    pub fn provider_readable(&self, id: &str) -> Setting<bool> {
        self.layered(
            |prefs| prefs.io_providers.get(id).and_then(|group| group.readable),
            true,
        )
    }

    /// Whether items may be written through target provider.
    pub fn provider_writable(&self, id: &str) -> Setting<bool> {
        self.layered(
            |prefs| prefs.io_providers.get(id).and_then(|group| group.writable),
            true,
        )
    }

    /// Identifiers of every provider that has a preference group in any
    /// layer.
    pub fn io_provider_ids(&self) -> Vec<String> {
        self.user
            .io_providers
            .keys()
            .chain(self.mandatory.io_providers.keys())
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Whether the administrator locked the whole configuration.
    pub fn is_admin_locked(&self) -> bool {
        self.layered(|prefs| prefs.runtime.lock_all, false).value
    }

    /// Whether level zero ordering can be rewritten.
    pub fn is_level_zero_writable(&self) -> bool {
        !self.is_admin_locked() && !self.level_zero_order().mandatory
    }

    fn layered<T>(&self, select: impl Fn(&PrefsLayout) -> Option<T>, default: T) -> Setting<T> {
        if let Some(value) = select(&self.mandatory) {
            return Setting {
                value,
                mandatory: true,
            };
        }

        Setting {
            value: select(&self.user).unwrap_or(default),
            mandatory: false,
        }
    }
}

fn read_layer(path: &Path) -> Result<PrefsLayout> {
    if !path.exists() {
        debug!("no preferences at {:?}, use empty layer", path.display());
        return Ok(PrefsLayout::default());
    }

    read_to_string(path)
        .map_err(|err| ConfigError::Read {
            source: err,
            path: path.to_path_buf(),
        })?
        .parse()
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize preferences.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize preferences.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Preference file cannot be read.
    #[error("failed to read preferences at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Preference file cannot be written.
    #[error("failed to write preferences at {:?}", path.display())]
    Write {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Preference key is locked by the mandatory layer.
    #[error("preference {key:?} is locked by mandatory policy")]
    Locked { key: &'static str },

    /// Default preference locations cannot be determined.
    #[error(transparent)]
    NoWayHome(#[from] crate::path::NoWayHome),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    #[test]
    fn deserialize_prefs_layout() -> anyhow::Result<()> {
        let result: PrefsLayout = indoc! {r#"
            [runtime]
            items-level-zero-order = ["C", "A"]
            items-list-order-mode = "descending"
            io-providers-write-order = ["io-desktop", "io-xml"]

            [io-provider.io-xml]
            readable = false
        "#}
        .parse()?;

        let expect = PrefsLayout {
            runtime: RuntimePrefs {
                items_level_zero_order: Some(vec!["C".into(), "A".into()]),
                items_list_order_mode: Some(OrderMode::Descending),
                io_providers_write_order: Some(vec!["io-desktop".into(), "io-xml".into()]),
                lock_all: None,
            },
            io_providers: BTreeMap::from([(
                "io-xml".into(),
                ProviderPrefs {
                    readable: Some(false),
                    writable: None,
                },
            )]),
        };

        assert_eq!(result, expect);

        Ok(())
    }

    #[test]
    fn serialize_prefs_layout() {
        let result = PrefsLayout {
            runtime: RuntimePrefs {
                items_level_zero_order: Some(vec!["C".into(), "A".into()]),
                items_list_order_mode: Some(OrderMode::Manual),
                ..Default::default()
            },
            ..Default::default()
        }
        .to_string();

        let expect = indoc! {r#"
            [runtime]
            items-level-zero-order = [
                "C",
                "A",
            ]
            items-list-order-mode = "manual"
        "#};

        assert_eq!(result, expect);
    }

    #[test]
    fn mandatory_layer_overrides_user_layer() -> anyhow::Result<()> {
        let user: PrefsLayout = indoc! {r#"
            [runtime]
            items-list-order-mode = "descending"

            [io-provider.io-desktop]
            writable = true
        "#}
        .parse()?;
        let mandatory: PrefsLayout = indoc! {r#"
            [io-provider.io-desktop]
            writable = false
        "#}
        .parse()?;
        let settings = Settings::new(user, mandatory);

        assert_eq!(
            settings.provider_writable("io-desktop"),
            Setting {
                value: false,
                mandatory: true
            }
        );
        assert_eq!(
            settings.order_mode(),
            Setting {
                value: OrderMode::Descending,
                mandatory: false
            }
        );

        Ok(())
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let settings = Settings::default();

        assert!(settings.provider_readable("io-gconf").value);
        assert!(settings.provider_writable("io-gconf").value);
        assert_eq!(settings.order_mode().value, OrderMode::Ascending);
        assert!(settings.level_zero_order().value.is_empty());
        assert!(!settings.is_admin_locked());
        assert!(settings.is_level_zero_writable());
    }

    #[test]
    fn io_provider_ids_merge_both_layers() -> anyhow::Result<()> {
        let user: PrefsLayout = indoc! {r#"
            [io-provider.io-xml]
            readable = true

            [io-provider.io-desktop]
            readable = true
        "#}
        .parse()?;
        let mandatory: PrefsLayout = indoc! {r#"
            [io-provider.io-gconf]
            writable = false

            [io-provider.io-xml]
            writable = false
        "#}
        .parse()?;
        let settings = Settings::new(user, mandatory);

        assert_eq!(
            settings.io_provider_ids(),
            vec!["io-desktop", "io-gconf", "io-xml"]
        );

        Ok(())
    }

    #[test]
    fn locked_level_zero_cannot_be_rewritten() -> anyhow::Result<()> {
        let mandatory: PrefsLayout = indoc! {r#"
            [runtime]
            items-level-zero-order = ["A"]
        "#}
        .parse()?;
        let mut settings = Settings::new(PrefsLayout::default(), mandatory);

        assert!(!settings.is_level_zero_writable());
        let result = settings.set_level_zero_order(["A", "B"]);
        assert!(matches!(
            result,
            Err(ConfigError::Locked {
                key: "items-level-zero-order"
            })
        ));
        assert_eq!(settings.level_zero_order().value, vec!["A"]);

        Ok(())
    }

    #[test]
    fn admin_lock_blocks_level_zero() -> anyhow::Result<()> {
        let mandatory: PrefsLayout = indoc! {r#"
            [runtime]
            lock-all = true
        "#}
        .parse()?;
        let mut settings = Settings::new(PrefsLayout::default(), mandatory);

        assert!(settings.is_admin_locked());
        assert!(!settings.is_level_zero_writable());
        assert!(settings.set_level_zero_order(["A"]).is_err());

        Ok(())
    }

    #[sealed_test]
    fn level_zero_rewrite_is_saved_to_user_layer() -> anyhow::Result<()> {
        write(
            "mandatory.toml",
            indoc! {r#"
                [runtime]
                items-list-order-mode = "manual"
            "#},
        )?;

        let mut settings = Settings::open("prefs/settings.toml", "mandatory.toml")?;
        settings.set_level_zero_order(["C", "A", "D"])?;

        let saved: PrefsLayout = read_to_string("prefs/settings.toml")?.parse()?;
        assert_eq!(
            saved.runtime.items_level_zero_order,
            Some(vec!["C".into(), "A".into(), "D".into()])
        );
        assert_eq!(saved.runtime.items_list_order_mode, None);

        let reopened = Settings::open("prefs/settings.toml", "mandatory.toml")?;
        assert_eq!(reopened.level_zero_order().value, vec!["C", "A", "D"]);
        assert_eq!(reopened.order_mode().value, OrderMode::Manual);

        Ok(())
    }

    #[sealed_test]
    fn failed_level_zero_save_keeps_previous_order() -> anyhow::Result<()> {
        write("prefs", "not a directory")?;

        let mut settings = Settings::open("prefs/settings.toml", "mandatory.toml")?;
        settings.user.runtime.items_level_zero_order = Some(vec!["A".into()]);

        let result = settings.set_level_zero_order(["C", "A", "D"]);
        assert!(matches!(result, Err(ConfigError::Write { .. })));
        assert_eq!(settings.level_zero_order().value, vec!["A"]);
        assert_eq!(read_to_string("prefs")?, "not a directory");

        Ok(())
    }

    #[sealed_test]
    fn invalid_layout_is_reported() -> anyhow::Result<()> {
        write("settings.toml", "[runtime]\nitems-list-order-mode = \"sideways\"\n")?;

        let result = Settings::open("settings.toml", "mandatory.toml");
        assert!(matches!(result, Err(ConfigError::Deserialize(_))));

        Ok(())
    }
}
