//! On-disk state: every puzzle, the audit log, sessions and subscriptions in
//! one pretty-printed JSON file.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::audit::AuditLog;
use crate::error::Result;
use crate::notify::StatusSubscription;
use crate::testsolve::TestsolveSession;
use crate::workflow::Puzzle;

fn first_id() -> u64 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerState {
    #[serde(default)]
    pub puzzles: BTreeMap<u64, Puzzle>,
    #[serde(default)]
    pub log: AuditLog,
    #[serde(default)]
    pub sessions: BTreeMap<u64, TestsolveSession>,
    #[serde(default)]
    pub subscriptions: Vec<StatusSubscription>,
    #[serde(default = "first_id")]
    pub next_puzzle_id: u64,
    #[serde(default = "first_id")]
    pub next_session_id: u64,
}

impl Default for TrackerState {
    fn default() -> Self {
        Self {
            puzzles: BTreeMap::new(),
            log: AuditLog::new(),
            sessions: BTreeMap::new(),
            subscriptions: Vec::new(),
            next_puzzle_id: first_id(),
            next_session_id: first_id(),
        }
    }
}

impl TrackerState {
    /// Reads state from `path`. A missing file is an empty tracker.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No state file yet; starting empty");
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Writes state to `path`, replacing it only once the new contents are
    /// fully on disk.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        debug!(path = %path.display(), puzzles = self.puzzles.len(), "Saved state");
        Ok(())
    }

    pub fn allocate_puzzle_id(&mut self) -> u64 {
        let id = self.next_puzzle_id;
        self.next_puzzle_id += 1;
        id
    }

    pub fn allocate_session_id(&mut self) -> u64 {
        let id = self.next_session_id;
        self.next_session_id += 1;
        id
    }
}
