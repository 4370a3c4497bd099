//! Platform-scoped baseline persistence
//!
//! One PNG per `{test_name, platform_key}` under a fixed snapshots
//! directory, named `<test_name>-<platform_key>.png`. A normal comparison
//! run never overwrites an existing baseline; overwriting is a separate
//! operator action (`update`).

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use image::RgbaImage;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::error::Result;
use crate::platform::PlatformKey;

/// Key identifying one baseline: test name plus rendering platform
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BaselineKey {
    pub test_name: String,
    pub platform: PlatformKey,
}

impl BaselineKey {
    pub fn new(test_name: impl Into<String>, platform: PlatformKey) -> Self {
        Self {
            test_name: test_name.into(),
            platform,
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}-{}.png", self.test_name, self.platform)
    }
}

/// A previously accepted snapshot loaded from disk
#[derive(Debug, Clone)]
pub struct Baseline {
    image: RgbaImage,
    path: PathBuf,
    sha256: String,
}

impl Baseline {
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Hex SHA-256 of the PNG bytes, for the byte-identical fast path
    pub fn sha256(&self) -> &str {
        &self.sha256
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Whether `create_if_absent` wrote a new baseline or found an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
}

/// Maps `{test_name, platform_key}` to persisted baseline images
///
/// Writes for the same key are serialized so concurrent "absent -> create"
/// attempts from parallel cases cannot race. Reads need no locking:
/// baselines are immutable once written outside the operator-update path.
pub struct BaselineStore {
    dir: PathBuf,
    write_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl BaselineStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            write_locks: DashMap::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &BaselineKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Load the baseline for a key, or `None` on the first run
    pub fn load(&self, key: &BaselineKey) -> Result<Option<Baseline>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let image = image::open(&path)?.to_rgba8();
        let sha256 = sha256_file(&path)?;

        Ok(Some(Baseline {
            image,
            path,
            sha256,
        }))
    }

    /// First-run path: persist the captured PNG as the baseline unless one
    /// already exists for this key
    pub fn create_if_absent(&self, key: &BaselineKey, source_png: &Path) -> Result<CreateOutcome> {
        let lock = self.write_lock(key);
        let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let path = self.path_for(key);
        if path.exists() {
            return Ok(CreateOutcome::AlreadyExists);
        }

        fs::copy(source_png, &path)?;
        info!("created baseline {}", path.display());
        Ok(CreateOutcome::Created)
    }

    /// Explicit operator path: replace the baseline with a new capture
    pub fn update(&self, key: &BaselineKey, source_png: &Path) -> Result<()> {
        let lock = self.write_lock(key);
        let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let path = self.path_for(key);
        fs::copy(source_png, &path)?;
        info!("updated baseline {}", path.display());
        Ok(())
    }

    /// File stems of all persisted baselines
    pub fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "png").unwrap_or(false) {
                if let Some(stem) = path.file_stem() {
                    names.push(stem.to_string_lossy().to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn write_lock(&self, key: &BaselineKey) -> Arc<Mutex<()>> {
        self.write_locks
            .entry(key.file_name())
            .or_default()
            .clone()
    }
}

/// Hex SHA-256 of a file's bytes
pub fn sha256_file(path: &Path) -> Result<String> {
    let data = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}
