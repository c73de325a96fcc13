use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

/// Identifier → original label mapping, mirrored to a JSON file.
///
/// The file is the resumability ledger: a country whose identifier is already
/// present is never re-fetched. Every successful download rewrites the whole
/// store through a temp file + rename, so the on-disk snapshot is always a
/// complete valid JSON object — at worst the in-flight entry is lost when the
/// run is interrupted.
pub struct Catalog {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl Catalog {
    /// Load a prior snapshot. A missing or unreadable store starts empty; an
    /// interrupted earlier run must never block the next one.
    pub fn load(path: &Path) -> Self {
        let entries = match fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str::<BTreeMap<String, String>>(&text) {
                Ok(map) => map,
                Err(e) => {
                    warn!("Ignoring corrupt catalog {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(_) => BTreeMap::new(),
        };
        if !entries.is_empty() {
            info!("Resuming: {} flags already in catalog", entries.len());
        }
        Self {
            path: path.to_path_buf(),
            entries,
        }
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert an entry and rewrite the store. Committing an identifier that
    /// is already present leaves the stored mapping unchanged.
    pub fn commit(&mut self, identifier: &str, label: &str) -> Result<()> {
        self.entries
            .insert(identifier.to_string(), label.to_string());
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        // BTreeMap keeps keys sorted; serde_json writes non-ASCII literally.
        let json = serde_json::to_string_pretty(&self.entries)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}
