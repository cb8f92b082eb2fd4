//! Result history persisted as one JSON document keyed by game.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use vision_games::{GameKind, HistoryStore, MemoryHistory, ResultRecord};

use crate::error::DaemonError;

/// [`MemoryHistory`] mirrored to disk after every change.
///
/// Write failures are logged and the in-memory copy stays authoritative, so a
/// read-only data directory never stops play.
#[derive(Debug)]
pub struct FileHistory {
    path: PathBuf,
    inner: MemoryHistory,
}

impl FileHistory {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let inner = match load(&path) {
            Ok(Some(mut h)) => {
                h.enforce_caps();
                h
            }
            Ok(None) => MemoryHistory::new(),
            Err(e) => {
                warn!("Starting with empty history: {}", e);
                MemoryHistory::new()
            }
        };
        Self { path, inner }
    }

    pub fn save(&self) -> Result<(), DaemonError> {
        let raw =
            serde_json::to_string_pretty(&self.inner).map_err(|e| DaemonError::json(&self.path, e))?;
        fs::write(&self.path, raw).map_err(|e| DaemonError::io(&self.path, e))
    }

    fn persist(&self) {
        if let Err(e) = self.save() {
            warn!("History not saved: {}", e);
        }
    }
}

fn load(path: &Path) -> Result<Option<MemoryHistory>, DaemonError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(DaemonError::io(path, e)),
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| DaemonError::json(path, e))
}

impl HistoryStore for FileHistory {
    fn append(&mut self, record: ResultRecord) {
        info!(game = %record.game(), result = %record.payload().label(), "Result recorded");
        self.inner.append(record);
        self.persist();
    }

    fn clear(&mut self, game: GameKind) {
        self.inner.clear(game);
        self.persist();
    }

    fn list(&self, game: GameKind) -> Vec<ResultRecord> {
        self.inner.list(game)
    }
}
