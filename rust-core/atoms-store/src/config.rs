// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Table configuration.
//
// The table handle is opened once at startup from a [`StoreConfig`] and
// handed explicitly to every store that needs it.
//
// Environment variables read by [`StoreConfig::from_env`]:
// - `ATOMS_BACKEND`: `memory` (default) or `redb`
// - `ATOMS_TABLE`: table name, default `atoms`
// - `ATOMS_PERSISTENCE_DIR`: directory for the redb file, required for `redb`

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::StoreError;
use crate::memory::InMemoryTable;
use crate::table::Table;

/// File name of the redb database inside the persistence directory.
pub const REDB_FILE: &str = "atoms.redb";

/// Which table implementation to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Process-local, lost on exit.
    Memory,
    /// Single-file redb database (feature `redb-backend`).
    Redb,
}

impl FromStr for BackendKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" => Ok(BackendKind::Memory),
            "redb" => Ok(BackendKind::Redb),
            other => Err(StoreError::BackendUnavailable(format!(
                "unknown backend '{}' (expected 'memory' or 'redb')",
                other
            ))),
        }
    }
}

/// Configuration for the item table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Table implementation.
    pub backend: BackendKind,
    /// Name of the table holding item rows.
    pub table_name: String,
    /// Directory holding persistent table files.
    pub persistence_dir: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Memory,
            table_name: "atoms".to_string(),
            persistence_dir: None,
        }
    }
}

impl StoreConfig {
    /// Build a configuration from `ATOMS_*` environment variables, falling
    /// back to the defaults for anything unset.
    pub fn from_env() -> Result<Self, StoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let backend = match lookup("ATOMS_BACKEND") {
            Some(raw) if !raw.trim().is_empty() => raw.parse()?,
            _ => defaults.backend,
        };
        let table_name = lookup("ATOMS_TABLE")
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(defaults.table_name);
        let persistence_dir = lookup("ATOMS_PERSISTENCE_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            backend,
            table_name,
            persistence_dir,
        })
    }
}

/// Open the table described by `config`.
///
/// Called once per process; the returned handle is shared by every store.
pub fn open_table(config: &StoreConfig) -> Result<Arc<dyn Table>, StoreError> {
    match config.backend {
        BackendKind::Memory => {
            if config.persistence_dir.is_some() {
                warn!("ATOMS_PERSISTENCE_DIR is ignored by the in-memory backend");
            }
            info!(table = %config.table_name, "opening in-memory table");
            Ok(Arc::new(InMemoryTable::named(&config.table_name)))
        }
        BackendKind::Redb => open_redb(config),
    }
}

#[cfg(feature = "redb-backend")]
fn open_redb(config: &StoreConfig) -> Result<Arc<dyn Table>, StoreError> {
    let dir = config.persistence_dir.as_ref().ok_or_else(|| {
        StoreError::BackendUnavailable(
            "redb backend requires ATOMS_PERSISTENCE_DIR".to_string(),
        )
    })?;
    let table = crate::redb_table::RedbTable::open(dir.join(REDB_FILE), &config.table_name)?;
    info!(table = %config.table_name, path = %table.path().display(), "opened redb table");
    Ok(Arc::new(table))
}

#[cfg(not(feature = "redb-backend"))]
fn open_redb(_config: &StoreConfig) -> Result<Arc<dyn Table>, StoreError> {
    Err(StoreError::BackendUnavailable(
        "redb backend not compiled in (enable the `redb-backend` feature)".to_string(),
    ))
}
