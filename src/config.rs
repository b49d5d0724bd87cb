use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::identity::IdentityStrategy;

/// Where the block of new tracks goes relative to the main catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppendPosition {
    Start,
    #[default]
    End,
}

/// Settings for one merge run. Built once, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    pub identity_strategy: IdentityStrategy,
    pub append_position: AppendPosition,
    /// Sort the new tracks by album, then name
    pub sort_new_by_album: bool,
    pub create_backup: bool,
    pub show_preview: bool,
    /// Overrides the generated `<stem>.backup.<timestamp><ext>` name
    pub backup_path: Option<PathBuf>,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            identity_strategy: IdentityStrategy::default(),
            append_position: AppendPosition::default(),
            sort_new_by_album: true,
            create_backup: true,
            show_preview: true,
            backup_path: None,
        }
    }
}

impl MergeOptions {
    /// A copy with every field set in `overrides` replaced
    pub fn with_overrides(self, overrides: &MergeOverrides) -> Self {
        Self {
            identity_strategy: overrides
                .identity_strategy
                .unwrap_or(self.identity_strategy),
            append_position: overrides.append_position.unwrap_or(self.append_position),
            sort_new_by_album: overrides
                .sort_new_by_album
                .unwrap_or(self.sort_new_by_album),
            create_backup: overrides.create_backup.unwrap_or(self.create_backup),
            show_preview: overrides.show_preview.unwrap_or(self.show_preview),
            backup_path: overrides.backup_path.clone().or(self.backup_path),
        }
    }
}

/// Partial settings, from a config file or the command line
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct MergeOverrides {
    pub identity_strategy: Option<IdentityStrategy>,
    pub append_position: Option<AppendPosition>,
    pub sort_new_by_album: Option<bool>,
    pub create_backup: Option<bool>,
    pub show_preview: Option<bool>,
    pub backup_path: Option<PathBuf>,
}

impl MergeOverrides {
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path).map_err(|source| CatalogError::InputRead {
            path: path.to_owned(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| CatalogError::Config {
            path: path.to_owned(),
            source,
        })
    }
}
