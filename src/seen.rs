//! Persisted set of settlement ids that were already posted.
//!
//! On disk: `{"seen_ids": [ ...sorted... ]}`. Writes go to a temp sibling
//! and are renamed into place, so readers never see a half-written file.

use anyhow::{Context, Result};
use metrics::{counter, gauge};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Serialize, Deserialize)]
struct SeenFile {
    #[serde(default)]
    seen_ids: Vec<String>,
}

#[derive(Debug)]
pub struct SeenStore {
    path: PathBuf,
    ids: BTreeSet<String>,
}

impl SeenStore {
    /// Empty store bound to `path`; nothing is read until `load`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ids: BTreeSet::new(),
        }
    }

    /// Open and load in one step.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let mut s = Self::new(path);
        s.load();
        s
    }

    /// Replace the in-memory set with the file contents. A missing or corrupt
    /// file leaves the store empty.
    pub fn load(&mut self) {
        self.ids = match read_seen_file(&self.path) {
            Ok(Some(ids)) => {
                tracing::info!(
                    target: "seen",
                    count = ids.len(),
                    path = %self.path.display(),
                    "loaded seen settlements"
                );
                ids
            }
            Ok(None) => {
                tracing::info!(
                    target: "seen",
                    path = %self.path.display(),
                    "no seen file, starting empty"
                );
                BTreeSet::new()
            }
            Err(e) => {
                tracing::warn!(
                    target: "seen",
                    error = ?e,
                    path = %self.path.display(),
                    "seen file unreadable, starting empty"
                );
                BTreeSet::new()
            }
        };
        gauge!("seen_ids").set(self.ids.len() as f64);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Returns true when the id was not present before.
    pub fn add(&mut self, id: impl Into<String>) -> bool {
        let inserted = self.ids.insert(id.into());
        gauge!("seen_ids").set(self.ids.len() as f64);
        inserted
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Write the whole set. Failures are logged; the in-memory set is kept.
    pub fn persist(&self) -> bool {
        match write_seen_file(&self.path, &self.ids) {
            Ok(()) => {
                tracing::debug!(target: "seen", count = self.ids.len(), "saved seen settlements");
                true
            }
            Err(e) => {
                tracing::warn!(
                    target: "seen",
                    error = ?e,
                    path = %self.path.display(),
                    "failed to save seen file"
                );
                counter!("seen_persist_errors_total").increment(1);
                false
            }
        }
    }
}

fn read_seen_file(path: &Path) -> Result<Option<BTreeSet<String>>> {
    if !path.exists() {
        return Ok(None);
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let parsed: SeenFile = serde_json::from_str(&content)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(
        parsed
            .seen_ids
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
    ))
}

fn write_seen_file(path: &Path, ids: &BTreeSet<String>) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let body = SeenFile {
        seen_ids: ids.iter().cloned().collect(),
    };
    let json = serde_json::to_vec_pretty(&body).context("serializing seen ids")?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("renaming into {}", path.display()))?;
    Ok(())
}
