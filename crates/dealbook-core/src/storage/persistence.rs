//! JSON table persistence
//!
//! Handles saving and loading tables to/from the filesystem.
//! Uses atomic writes (write to temp file, then rename) so a crash mid-write
//! leaves the previous table file in place.
//!
//! Storage location: `~/.local/share/dealbook/` (configurable via `Config`)

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::error::{StorageError, StorageResult};
use crate::config::Config;
use crate::models::EntityKind;
use crate::table::{Entity, Table};

const ALL_KINDS: [EntityKind; 4] = [
    EntityKind::Deal,
    EntityKind::Vendor,
    EntityKind::Project,
    EntityKind::Task,
];

/// Sizes of the table files on disk
#[derive(Debug, Clone, Default)]
pub struct StorageStats {
    /// (table name, size in bytes) for every table file that exists
    pub tables: Vec<(&'static str, u64)>,
}

impl StorageStats {
    pub fn total_size(&self) -> u64 {
        self.tables.iter().map(|(_, size)| size).sum()
    }

    /// Total size formatted for people, e.g. "12.4 KB"
    pub fn total_size_human(&self) -> String {
        format_size(self.total_size())
    }
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

/// Persistence layer for record tables
///
/// Provides whole-file load and atomic save for each entity type.
pub struct JsonPersistence {
    config: Config,
}

impl JsonPersistence {
    /// Create a new persistence handler with the given configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Check if a table file exists on disk
    pub fn exists(&self, kind: EntityKind) -> bool {
        self.config.table_path(kind).exists()
    }

    /// Make sure the data directory exists
    pub fn ensure_data_dir(&self) -> StorageResult<()> {
        let dir = &self.config.data_dir;
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|source| StorageError::CreateDirectory {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Load one table from disk
    ///
    /// A missing or blank file is an empty table. A file that does not parse,
    /// or that holds two records with the same id, is copied aside to
    /// `<file>.corrupt.backup` and reported as `CorruptTable`; it is never
    /// silently replaced.
    pub fn load_table<E: Entity>(&self) -> StorageResult<Table<E>> {
        let path = self.config.table_path(E::KIND);

        if !path.exists() {
            debug!("No {} table at {:?}, starting empty", E::KIND, path);
            return Ok(Table::new());
        }

        let content =
            fs::read_to_string(&path).map_err(|e| StorageError::from_read(e, path.clone()))?;

        if content.trim().is_empty() {
            return Ok(Table::new());
        }

        let parsed = serde_json::from_str::<Vec<E>>(&content)
            .map_err(|e| e.to_string())
            .and_then(|records| Table::from_records(records).map_err(|e| e.to_string()));

        match parsed {
            Ok(table) => {
                debug!("Loaded {} {} record(s) from {:?}", table.len(), E::KIND, path);
                Ok(table)
            }
            Err(details) => {
                let backup_path = backup_path_for(&path);
                warn!("{} table at {:?} is corrupted: {}", E::KIND, path, details);
                fs::copy(&path, &backup_path)
                    .map_err(|err| StorageError::from_io(err, backup_path.clone()))?;
                Err(StorageError::CorruptTable {
                    path,
                    backup_path,
                    details,
                })
            }
        }
    }

    /// Write one table to disk, replacing the previous file atomically
    pub fn save_table<E: Entity>(&self, table: &Table<E>) -> StorageResult<()> {
        let path = self.config.table_path(E::KIND);
        let bytes =
            serde_json::to_vec_pretty(&table.snapshot()).map_err(|e| StorageError::Encode {
                table: E::KIND.table_name().to_string(),
                details: e.to_string(),
            })?;

        atomic_write(&path, &bytes)?;
        debug!("Saved {} {} record(s) to {:?}", table.len(), E::KIND, path);
        Ok(())
    }

    /// Report the size of every table file
    pub fn stats(&self) -> StorageStats {
        let tables = ALL_KINDS
            .iter()
            .filter_map(|kind| {
                let size = fs::metadata(self.config.table_path(*kind)).ok()?.len();
                Some((kind.table_name(), size))
            })
            .collect();
        StorageStats { tables }
    }
}

fn backup_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".corrupt.backup");
    PathBuf::from(name)
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let temp_path = path.with_extension("tmp");

    let mut file =
        File::create(&temp_path).map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    file.write_all(data)
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    file.sync_all()
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    fs::rename(&temp_path, path).map_err(|source| StorageError::AtomicWriteFailed {
        from: temp_path.clone(),
        to: path.to_path_buf(),
        source,
    })?;

    Ok(())
}
