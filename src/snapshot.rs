use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{farm::FarmSnapshot, rng::RngState};

pub const SAVE_VERSION: u32 = 1;

/// Everything needed to resume a run: farm state, tick count and the exact
/// position of every random stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveRecord {
    pub version: u32,
    pub scenario: String,
    pub tick: u64,
    pub farm: FarmSnapshot,
    pub rng: RngState,
}

pub struct SnapshotWriter {
    dir: PathBuf,
    interval: u64,
}

impl SnapshotWriter {
    pub fn new(dir: &Path, interval: u64) -> Self {
        Self {
            dir: dir.to_path_buf(),
            interval,
        }
    }

    pub fn is_due(&self, tick: u64) -> bool {
        self.interval != 0 && tick % self.interval == 0
    }

    /// Writes `<dir>/<scenario>/tick_<NNNNNN>.json`.
    pub fn write(&self, record: &SaveRecord) -> Result<PathBuf> {
        let scenario_dir = self.dir.join(&record.scenario);
        fs::create_dir_all(&scenario_dir).with_context(|| {
            format!(
                "Failed to create snapshot directory {}",
                scenario_dir.display()
            )
        })?;
        let path = scenario_dir.join(format!("tick_{:06}.json", record.tick));
        let payload = serde_json::to_string_pretty(record)?;
        fs::write(&path, payload)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
        info!(tick = record.tick, path = %path.display(), "snapshot written");
        Ok(path)
    }
}

pub fn load(path: impl AsRef<Path>) -> Result<SaveRecord> {
    let path = path.as_ref();
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    let record: SaveRecord = serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse snapshot {}", path.display()))?;
    Ok(record)
}
