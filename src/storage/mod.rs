//! Local data directory.
//!
//! Layout under `data_dir`:
//! - `matches/{region}/{puuid}.jsonl` match archive, one record per line
//! - `players/{region}/{puuid}.json` last resolved identity
//! - `reports/{region}/{puuid}.json` last computed statistics report

mod archive;
mod jsonl;

pub use archive::MatchArchive;
pub use jsonl::JsonlFile;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::models::PlatformRegion;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),
}

/// Paths inside the data directory.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn matches_dir(&self) -> PathBuf {
        self.data_dir.join("matches")
    }

    pub fn players_dir(&self) -> PathBuf {
        self.data_dir.join("players")
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.data_dir.join("reports")
    }

    pub fn match_archive_path(&self, region: PlatformRegion, puuid: &str) -> PathBuf {
        self.matches_dir()
            .join(region.code())
            .join(format!("{}.jsonl", file_stem(puuid)))
    }

    pub fn player_path(&self, region: PlatformRegion, puuid: &str) -> PathBuf {
        self.players_dir()
            .join(region.code())
            .join(format!("{}.json", file_stem(puuid)))
    }

    pub fn report_path(&self, region: PlatformRegion, puuid: &str) -> PathBuf {
        self.reports_dir()
            .join(region.code())
            .join(format!("{}.json", file_stem(puuid)))
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}

/// Keep ids usable as file names.
fn file_stem(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Write `value` as pretty JSON, creating parent directories.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    debug!("Wrote {:?}", path);
    Ok(())
}

/// Read a JSON document written by [`write_json`].
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StorageError> {
    if !path.exists() {
        return Err(StorageError::PathNotFound(path.to_path_buf()));
    }
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}
