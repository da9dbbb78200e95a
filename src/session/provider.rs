use chrono::Local;

use crate::error::Result;
use crate::store::{SessionRecord, StateStore};

/// Numbers produced when a session is finalized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionMetrics {
    pub wpm: f64,
    pub accuracy: f64,
    pub errors: u64,
    pub chars_raw: u64,
    pub chars_effective: u64,
    pub duration_seconds: u64,
}

/// What the session engine needs from persistence, and nothing more.
pub trait StateProvider {
    fn saved_char_pos(&self) -> u64;
    fn save_progress(&mut self, char_pos: u64) -> Result<()>;
    /// Appends the session and returns the refreshed stats block for display.
    fn record_session(&mut self, metrics: &SessionMetrics) -> Result<String>;
    fn reset_state(&mut self) -> Result<()>;
}

impl<T: StateProvider + ?Sized> StateProvider for &mut T {
    fn saved_char_pos(&self) -> u64 {
        (**self).saved_char_pos()
    }

    fn save_progress(&mut self, char_pos: u64) -> Result<()> {
        (**self).save_progress(char_pos)
    }

    fn record_session(&mut self, metrics: &SessionMetrics) -> Result<String> {
        (**self).record_session(metrics)
    }

    fn reset_state(&mut self) -> Result<()> {
        (**self).reset_state()
    }
}

const STATS_TITLE: &str = "CONTENT STATISTICS";

/// Provider writing through to a [`StateStore`] under one corpus key.
pub struct StoreProvider<'a> {
    store: &'a mut StateStore,
    key: String,
    name: String,
    text_length: u64,
}

impl<'a> StoreProvider<'a> {
    pub fn new(
        store: &'a mut StateStore,
        key: impl Into<String>,
        name: impl Into<String>,
        text_length: usize,
    ) -> Self {
        Self {
            store,
            key: key.into(),
            name: name.into(),
            text_length: text_length as u64,
        }
    }
}

impl StateProvider for StoreProvider<'_> {
    fn saved_char_pos(&self) -> u64 {
        match self.store.get(&self.key) {
            Some(state) if state.character_position <= self.text_length => state.character_position,
            _ => 0,
        }
    }

    fn save_progress(&mut self, char_pos: u64) -> Result<()> {
        self.store
            .save_progress(&self.key, &self.name, char_pos, self.text_length)
    }

    fn record_session(&mut self, metrics: &SessionMetrics) -> Result<String> {
        let record = SessionRecord {
            timestamp: Local::now(),
            wpm: metrics.wpm,
            accuracy: metrics.accuracy,
            errors: metrics.errors,
            characters_typed_raw: metrics.chars_raw,
            characters_typed_effective: metrics.chars_effective,
            duration_seconds: metrics.duration_seconds,
        };
        self.store.record_session(&self.key, &self.name, record)?;
        let stats = self.store.get_stats(&self.key);
        Ok(self.store.format_stats(&stats, STATS_TITLE))
    }

    fn reset_state(&mut self) -> Result<()> {
        self.store.clear_state(&self.key)
    }
}

/// In-memory provider; records what the engine asked for.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryProvider {
    pub saved_pos: u64,
    pub saves: Vec<u64>,
    pub sessions: Vec<SessionMetrics>,
    pub resets: usize,
    pub fail_saves: bool,
}

#[cfg(test)]
impl MemoryProvider {
    pub fn resuming_at(pos: u64) -> Self {
        Self {
            saved_pos: pos,
            ..Self::default()
        }
    }
}

#[cfg(test)]
impl StateProvider for MemoryProvider {
    fn saved_char_pos(&self) -> u64 {
        self.saved_pos
    }

    fn save_progress(&mut self, char_pos: u64) -> Result<()> {
        if self.fail_saves {
            return Err(crate::error::Error::Persistence {
                path: "memory".into(),
                source: std::io::Error::other("disk full"),
            });
        }
        self.saves.push(char_pos);
        self.saved_pos = char_pos;
        Ok(())
    }

    fn record_session(&mut self, metrics: &SessionMetrics) -> Result<String> {
        self.sessions.push(*metrics);
        Ok(format!("\nSessions Completed:  {}\n", self.sessions.len()))
    }

    fn reset_state(&mut self) -> Result<()> {
        self.resets += 1;
        self.saved_pos = 0;
        Ok(())
    }
}
