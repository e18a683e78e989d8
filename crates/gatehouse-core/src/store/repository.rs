// ── Configuration repository ──

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use super::aggregate::{ChangeNote, SystemConfig};
use crate::error::CoreError;

/// Loads and persists the configuration aggregate.
pub trait Repository: Send + Sync {
    fn load(&self) -> Result<SystemConfig, CoreError>;

    /// Write the aggregate as-is.
    fn persist(&self, config: &SystemConfig) -> Result<(), CoreError>;

    /// Record the change, restore invariants, then persist.
    fn save(&self, config: &mut SystemConfig, note: ChangeNote) -> Result<(), CoreError> {
        config.record(note);
        config.normalize();
        self.persist(config)
    }
}

// ── File-backed ──────────────────────────────────────────────────────

/// JSON document on disk, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct FileRepository {
    path: PathBuf,
}

impl FileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Repository for FileRepository {
    /// A missing file yields the factory configuration.
    fn load(&self) -> Result<SystemConfig, CoreError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "store missing, using factory configuration");
            return Ok(SystemConfig::seeded());
        }
        let bytes = fs::read(&self.path)?;
        serde_json::from_slice(&bytes).map_err(|e| CoreError::Store {
            message: format!("{}: {e}", self.path.display()),
        })
    }

    fn persist(&self, config: &SystemConfig) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_vec_pretty(config)?;
        let tmp = self.temp_path();
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "configuration written");
        Ok(())
    }
}

// ── In-memory ────────────────────────────────────────────────────────

/// Process-local store, mainly for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    config: Mutex<SystemConfig>,
    saves: AtomicUsize,
}

impl MemoryRepository {
    pub fn new(config: SystemConfig) -> Self {
        Self {
            config: Mutex::new(config),
            saves: AtomicUsize::new(0),
        }
    }

    /// Number of successful persists so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> SystemConfig {
        self.config.lock().clone()
    }
}

impl Repository for MemoryRepository {
    fn load(&self) -> Result<SystemConfig, CoreError> {
        Ok(self.config.lock().clone())
    }

    fn persist(&self, config: &SystemConfig) -> Result<(), CoreError> {
        *self.config.lock() = config.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
