//! Per-corpus progress and session history, persisted as one JSON file.

use chrono::{DateTime, Local};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::app_dirs::AppDirs;
use crate::error::{Error, Result};
use crate::stats::{self, Stats};

/// One finished typing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub timestamp: DateTime<Local>,
    pub wpm: f64,
    pub accuracy: f64,
    pub errors: u64,
    #[serde(alias = "characters_typed")]
    pub characters_typed_raw: u64,
    #[serde(default)]
    pub characters_typed_effective: u64,
    pub duration_seconds: u64,
}

/// Saved progress for one corpus, keyed by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusState {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub character_position: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_hash: Option<String>,
    #[serde(default)]
    pub text_length: u64,
    #[serde(default)]
    pub percent_complete: f64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sessions: Vec<SessionRecord>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<SessionRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<SessionRecord>>::deserialize(deserializer)?.unwrap_or_default())
}

fn percent(position: u64, length: u64) -> f64 {
    if length == 0 {
        return 0.0;
    }
    (position as f64 / length as f64 * 100.0).clamp(0.0, 100.0)
}

impl CorpusState {
    fn empty(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            character_position: 0,
            last_hash: None,
            text_length: 0,
            percent_complete: 0.0,
            sessions: Vec::new(),
        }
    }

    /// Applies the on-load rules: stale positions reset, percent recomputed.
    fn normalize(&mut self) {
        if self.text_length > 0 && self.character_position > self.text_length {
            warn!(
                id = %self.id,
                position = self.character_position,
                length = self.text_length,
                "saved position beyond text length, restarting from the top"
            );
            self.character_position = 0;
        }
        self.percent_complete = percent(self.character_position, self.text_length);
    }
}

/// Owns the state file and the in-memory map loaded from it.
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    states: BTreeMap<String, CorpusState>,
}

impl StateStore {
    /// Store backed by `<home>/.<app_name>.json`.
    pub fn open(app_name: &str) -> Result<Self> {
        Self::with_path(AppDirs::state_path(app_name)?)
    }

    pub fn with_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let states = load(&path)?;
        Ok(Self { path, states })
    }

    /// Rebinds the store to another application's state file and reloads.
    /// On failure the store keeps its current file and contents.
    pub fn configure(&mut self, app_name: &str) -> Result<()> {
        let path = AppDirs::state_path(app_name)?;
        let states = load(&path)?;
        info!(path = %path.display(), entries = states.len(), "state store configured");
        self.path = path;
        self.states = states;
        Ok(())
    }

    pub fn state_file_path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&CorpusState> {
        self.states.get(key)
    }

    pub fn states(&self) -> impl Iterator<Item = &CorpusState> + Clone {
        self.states.values()
    }

    pub fn save_progress(
        &mut self,
        key: &str,
        name: &str,
        char_pos: u64,
        text_length: u64,
    ) -> Result<()> {
        validate_key(key)?;
        let previous = self.states.get(key).cloned();
        let entry = self
            .states
            .entry(key.to_string())
            .or_insert_with(|| CorpusState::empty(key, name));
        entry.name = name.to_string();
        entry.character_position = if text_length > 0 {
            char_pos.min(text_length)
        } else {
            char_pos
        };
        entry.text_length = text_length;
        entry.percent_complete = percent(entry.character_position, text_length);

        if let Err(err) = self.persist() {
            match previous {
                Some(previous) => self.states.insert(key.to_string(), previous),
                None => self.states.remove(key),
            };
            return Err(err);
        }
        debug!(key, char_pos, text_length, "progress saved");
        Ok(())
    }

    pub fn record_session(&mut self, key: &str, name: &str, record: SessionRecord) -> Result<()> {
        validate_key(key)?;
        let created = !self.states.contains_key(key);
        let entry = self
            .states
            .entry(key.to_string())
            .or_insert_with(|| CorpusState::empty(key, name));
        if !name.is_empty() {
            entry.name = name.to_string();
        }
        entry.sessions.push(record);

        if let Err(err) = self.persist() {
            if created {
                self.states.remove(key);
            } else if let Some(entry) = self.states.get_mut(key) {
                entry.sessions.pop();
            }
            return Err(err);
        }
        debug!(key, "session recorded");
        Ok(())
    }

    pub fn get_stats(&self, key: &str) -> Stats {
        Stats::for_corpus(self.get(key))
    }

    pub fn get_global_stats(&self) -> Stats {
        Stats::global(self.states())
    }

    pub fn format_stats(&self, stats: &Stats, title: &str) -> String {
        stats::format_stats(stats, title)
    }

    pub fn clear_state(&mut self, key: &str) -> Result<()> {
        validate_key(key)?;
        if let Some(removed) = self.states.remove(key) {
            if let Err(err) = self.persist() {
                self.states.insert(key.to_string(), removed);
                return Err(err);
            }
            info!(key, "corpus state cleared");
        }
        Ok(())
    }

    /// Deletes the state file and forgets everything.
    pub fn wipe_all(&mut self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(source) => {
                return Err(Error::Persistence {
                    path: self.path.clone(),
                    source,
                })
            }
        }
        self.states.clear();
        info!(path = %self.path.display(), "all state wiped");
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        let entries: Vec<&CorpusState> = self.states.values().collect();
        let bytes = serde_json::to_vec_pretty(&entries).map_err(|err| Error::Persistence {
            path: self.path.clone(),
            source: err.into(),
        })?;
        write_atomic(&self.path, &bytes).map_err(|source| {
            warn!(path = %self.path.display(), %source, "state write failed");
            Error::Persistence {
                path: self.path.clone(),
                source,
            }
        })
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::invalid_input("state key cannot be empty"));
    }
    Ok(())
}

fn load(path: &Path) -> Result<BTreeMap<String, CorpusState>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "no state file yet");
            return Ok(BTreeMap::new());
        }
        Err(source) => {
            return Err(Error::Persistence {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let entries: Vec<CorpusState> =
        serde_json::from_slice(&bytes).map_err(|source| Error::CorruptState {
            path: path.to_path_buf(),
            source,
        })?;

    let mut states = BTreeMap::new();
    for mut state in entries {
        if state.id.is_empty() {
            warn!(name = %state.name, "skipping state entry without an id");
            continue;
        }
        state.normalize();
        states.insert(state.id.clone(), state);
    }
    debug!(path = %path.display(), entries = states.len(), "state loaded");
    Ok(states)
}

/// Temp file in the destination directory, synced, then renamed over `path`.
fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.as_file_mut().write_all(bytes)?;
    tmp.as_file_mut().flush()?;
    tmp.as_file().sync_all()?;

    match tmp.persist(path) {
        Ok(_) => Ok(()),
        Err(err) if err.error.kind() == ErrorKind::AlreadyExists => {
            let _ = fs::remove_file(path);
            err.file.persist(path).map(|_| ()).map_err(|e| e.error)
        }
        Err(err) => Err(err.error),
    }
}
