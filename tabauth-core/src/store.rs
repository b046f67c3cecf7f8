//! Authenticator entry persistence
//!
//! [`EntryStore`] is the narrow interface the rest of the crate needs from a
//! backend: create, ordered list, delete and bulk reorder. Two backends ship
//! here, an in-memory one and a TOML file in the config directory.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{StoreError, TabAuthError};
use crate::types::{AuthenticatorEntry, NewEntry};

/// File name used by [`TomlEntryStore`] inside the config directory
pub const ENTRIES_FILE_NAME: &str = "entries.toml";

/// Persistence backend for authenticator entries
pub trait EntryStore {
    /// Persist a new entry at the end of the user's list
    fn create(&mut self, user_id: &str, entry: NewEntry) -> Result<AuthenticatorEntry, StoreError>;

    /// All entries of a user, ascending by sort order
    fn list(&self, user_id: &str) -> Result<Vec<AuthenticatorEntry>, StoreError>;

    /// Remove one of the user's entries by id
    fn delete(&mut self, user_id: &str, id: &str) -> Result<(), StoreError>;

    /// Rewrite sort orders so entries follow `ids`, which must list every
    /// entry of the user exactly once
    fn reorder(&mut self, user_id: &str, ids: &[String]) -> Result<(), StoreError>;
}

/// Entries as laid out on disk, one `[[entry]]` table each
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct EntryTable {
    #[serde(default, rename = "entry")]
    entries: Vec<AuthenticatorEntry>,
}

impl EntryTable {
    fn create(&mut self, user_id: &str, entry: NewEntry) -> AuthenticatorEntry {
        let max_order = self
            .entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .map(|e| e.sort_order)
            .max()
            .unwrap_or(0)
            .max(0);
        let now = Utc::now().to_rfc3339();

        let record = AuthenticatorEntry {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            issuer: entry.issuer,
            account_name: entry.account_name,
            secret: entry.secret.expose().to_string(),
            sort_order: max_order + 1,
            created_at: now.clone(),
            updated_at: now,
        };
        self.entries.push(record.clone());
        record
    }

    fn list(&self, user_id: &str) -> Vec<AuthenticatorEntry> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.sort_order);
        entries
    }

    fn delete(&mut self, user_id: &str, id: &str) -> Result<(), StoreError> {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id || e.user_id != user_id);
        if self.entries.len() == before {
            return Err(StoreError::NotFound { id: id.to_string() });
        }
        Ok(())
    }

    fn reorder(&mut self, user_id: &str, ids: &[String]) -> Result<(), StoreError> {
        let owned = self.entries.iter().filter(|e| e.user_id == user_id).count();
        if ids.len() != owned {
            return Err(StoreError::ReorderMismatch);
        }
        let mut positions = Vec::with_capacity(ids.len());
        for id in ids {
            let index = self
                .entries
                .iter()
                .position(|e| &e.id == id && e.user_id == user_id)
                .ok_or(StoreError::ReorderMismatch)?;
            if positions.contains(&index) {
                return Err(StoreError::ReorderMismatch);
            }
            positions.push(index);
        }

        let now = Utc::now().to_rfc3339();
        for (order, index) in positions.into_iter().enumerate() {
            let entry = &mut self.entries[index];
            entry.sort_order = order as i64;
            entry.updated_at = now.clone();
        }
        Ok(())
    }
}

/// Store that lives only as long as the process
#[derive(Debug, Clone, Default)]
pub struct MemoryEntryStore {
    table: EntryTable,
}

impl MemoryEntryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EntryStore for MemoryEntryStore {
    fn create(&mut self, user_id: &str, entry: NewEntry) -> Result<AuthenticatorEntry, StoreError> {
        Ok(self.table.create(user_id, entry))
    }

    fn list(&self, user_id: &str) -> Result<Vec<AuthenticatorEntry>, StoreError> {
        Ok(self.table.list(user_id))
    }

    fn delete(&mut self, user_id: &str, id: &str) -> Result<(), StoreError> {
        self.table.delete(user_id, id)
    }

    fn reorder(&mut self, user_id: &str, ids: &[String]) -> Result<(), StoreError> {
        self.table.reorder(user_id, ids)
    }
}

/// Store backed by a TOML file, rewritten after every change
///
/// Changes are applied to a copy of the table and kept only once the file
/// has been written, so a failed save leaves the store as it was.
#[derive(Debug, Clone)]
pub struct TomlEntryStore {
    path: PathBuf,
    table: EntryTable,
}

impl TomlEntryStore {
    /// Open the store at `path`; a missing file is an empty store
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let table = match std::fs::read_to_string(&path) {
            Ok(contents) => toml::from_str(&contents).map_err(|e| StoreError::ReadFailed {
                message: format!("{}: {}", path.display(), e),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No entries file at {}, starting empty", path.display());
                EntryTable::default()
            }
            Err(e) => {
                return Err(StoreError::ReadFailed {
                    message: format!("{}: {}", path.display(), e),
                })
            }
        };
        Ok(Self { path, table })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, table: &EntryTable) -> Result<(), StoreError> {
        let write_failed = |message: String| StoreError::WriteFailed { message };

        let contents = toml::to_string_pretty(table).map_err(|e| write_failed(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| write_failed(e.to_string()))?;
        }

        // Secrets live in this file
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options
            .open(&self.path)
            .map_err(|e| write_failed(e.to_string()))?;

        // `mode` only applies on creation; tighten files left by older versions
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .map_err(|e| write_failed(e.to_string()))?;
        }

        file.write_all(contents.as_bytes())
            .map_err(|e| write_failed(e.to_string()))
    }

    /// Run `change` on a copy of the table and keep it only if it saves
    fn commit<T>(
        &mut self,
        change: impl FnOnce(&mut EntryTable) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut table = self.table.clone();
        let value = change(&mut table)?;
        self.save(&table)?;
        self.table = table;
        Ok(value)
    }
}

impl EntryStore for TomlEntryStore {
    fn create(&mut self, user_id: &str, entry: NewEntry) -> Result<AuthenticatorEntry, StoreError> {
        let record = self.commit(|table| Ok(table.create(user_id, entry)))?;
        info!("Added authenticator entry {} ({})", record.id, record.issuer);
        Ok(record)
    }

    fn list(&self, user_id: &str) -> Result<Vec<AuthenticatorEntry>, StoreError> {
        Ok(self.table.list(user_id))
    }

    fn delete(&mut self, user_id: &str, id: &str) -> Result<(), StoreError> {
        self.commit(|table| table.delete(user_id, id))?;
        info!("Deleted authenticator entry {}", id);
        Ok(())
    }

    fn reorder(&mut self, user_id: &str, ids: &[String]) -> Result<(), StoreError> {
        self.commit(|table| table.reorder(user_id, ids))
    }
}

/// Add an entry typed in by the user
///
/// The secret is required. With `strict` set it must also be well-formed
/// Base32; otherwise it is stored as given and decoded leniently later.
pub fn add_manual_entry<S: EntryStore + ?Sized>(
    store: &mut S,
    user_id: &str,
    issuer: &str,
    account_name: &str,
    secret: &str,
    strict: bool,
) -> Result<AuthenticatorEntry, TabAuthError> {
    if secret.trim().is_empty() {
        return Err(StoreError::MissingSecret.into());
    }
    let entry = NewEntry::new(issuer, account_name, secret);
    if strict {
        entry.secret.validate_base32()?;
    }
    Ok(store.create(user_id, entry)?)
}
