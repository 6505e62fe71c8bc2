//! Save/load persistence
//!
//! Features:
//! - Versioned JSON envelope
//! - Per-world saves (singularity state + growth overrides)
//! - One global save for scheduled growth mutations
//! - Pluggable stores: in-memory, or a directory with tmp-then-rename writes

pub mod envelope;

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::WorldKey;
use crate::collapse::SingularityRecord;
use crate::error::{CollapseError, Result};
use crate::growth::{GrowthOverrides, ScheduledMutation};
use crate::scheduler::TickScheduler;

pub use envelope::{SAVE_VERSION, SaveEnvelope, decode, encode};

/// Store key for the scheduled mutation queue
pub const SCHEDULER_KEY: &str = "scheduler";

/// Store key for a world's save
pub fn world_key(world: &WorldKey) -> String {
    format!("world/{}", world)
}

/// Overrides for one block position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthEntry {
    pub pos: [i32; 3],
    pub overrides: GrowthOverrides,
}

/// Everything persisted for one world
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSave {
    pub singularity: Option<SingularityRecord>,
    pub growth: Vec<GrowthEntry>,
}

/// Pending growth mutations across all worlds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSave {
    pub mutations: TickScheduler<ScheduledMutation>,
}

/// Key/value blob storage for saves
pub trait SaveStore {
    fn write(&mut self, key: &str, data: &str) -> Result<()>;
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn remove(&mut self, key: &str) -> Result<()>;

    /// Encode and write a value
    fn save<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()>
    where
        Self: Sized,
    {
        let json = encode(value)?;
        self.write(key, &json)
    }

    /// Read and decode a value, if present
    fn load<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>>
    where
        Self: Sized,
    {
        self.read(key)?.map(|json| decode(&json)).transpose()
    }
}

/// In-memory store, used by tests and the headless driver
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blobs: BTreeMap<String, String>,
    writes: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total writes since creation
    pub fn writes(&self) -> u64 {
        self.writes
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.blobs.keys().map(String::as_str)
    }
}

impl SaveStore for MemoryStore {
    fn write(&mut self, key: &str, data: &str) -> Result<()> {
        self.blobs.insert(key.to_string(), data.to_string());
        self.writes += 1;
        Ok(())
    }

    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.blobs.get(key).cloned())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.blobs.remove(key);
        Ok(())
    }
}

/// Directory-backed store
///
/// Writes go to `<name>.json.tmp` first and are renamed over the previous
/// file, which is kept as `<name>.json.bak`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| io_error(&root, e))?;
        Ok(Self { root })
    }

    fn path(&self, key: &str, ext: &str) -> PathBuf {
        self.root.join(format!("{}.{ext}", file_stem(key)))
    }
}

impl SaveStore for FileStore {
    fn write(&mut self, key: &str, data: &str) -> Result<()> {
        let target = self.path(key, "json");
        let tmp = self.path(key, "json.tmp");
        fs::write(&tmp, data).map_err(|e| io_error(&tmp, e))?;
        if target.exists() {
            let backup = self.path(key, "json.bak");
            fs::rename(&target, &backup).map_err(|e| io_error(&backup, e))?;
        }
        fs::rename(&tmp, &target).map_err(|e| io_error(&target, e))?;
        log::debug!("Saved {} ({} bytes)", key, data.len());
        Ok(())
    }

    fn read(&self, key: &str) -> Result<Option<String>> {
        let target = self.path(key, "json");
        match fs::read_to_string(&target) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&target, e)),
        }
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let target = self.path(key, "json");
        match fs::remove_file(&target) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&target, e)),
        }
    }
}

/// Percent-encode every byte outside `[A-Za-z0-9_-]`, so distinct keys never
/// share a file
fn file_stem(key: &str) -> String {
    let mut stem = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            stem.push(char::from(byte));
        } else {
            stem.push_str(&format!("%{byte:02X}"));
        }
    }
    stem
}

fn io_error(path: &std::path::Path, err: io::Error) -> CollapseError {
    CollapseError::Io {
        path: path.display().to_string(),
        source: err,
    }
}
