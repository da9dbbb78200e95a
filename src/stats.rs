use crate::metrics::wpm_from_counts;
use crate::store::{CorpusState, SessionRecord};
use crate::util::{format_duration, mean};

/// Aggregated view over one corpus' sessions, or over every corpus.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Stats {
    pub sessions_completed: usize,
    pub total_time: u64,
    pub total_characters_raw: u64,
    pub total_characters_effective: u64,
    pub average_wpm: f64,
    pub best_wpm: f64,
    pub average_accuracy: f64,
    pub text_progress_typed: u64,
    pub text_progress_total: u64,
}

impl SessionRecord {
    /// WPM from the stored counters. The stored `wpm` field is ignored here
    /// because older releases computed it differently.
    pub fn recomputed_wpm(&self) -> f64 {
        wpm_from_counts(self.characters_typed_raw, self.duration_seconds)
    }
}

impl Stats {
    fn from_sessions<'a>(sessions: impl IntoIterator<Item = &'a SessionRecord>) -> Self {
        let mut stats = Stats::default();
        let mut accuracies = Vec::new();
        for session in sessions {
            stats.sessions_completed += 1;
            stats.total_time += session.duration_seconds;
            stats.total_characters_raw += session.characters_typed_raw;
            stats.total_characters_effective += session.characters_typed_effective;
            stats.best_wpm = stats.best_wpm.max(session.recomputed_wpm());
            accuracies.push(session.accuracy);
        }
        stats.average_wpm = wpm_from_counts(stats.total_characters_raw, stats.total_time);
        stats.average_accuracy = mean(&accuracies).unwrap_or(0.0);
        stats
    }

    /// Stats for a single corpus; zeroed when it has no state yet.
    pub fn for_corpus(state: Option<&CorpusState>) -> Self {
        match state {
            Some(state) => Stats {
                text_progress_typed: state.character_position,
                text_progress_total: state.text_length,
                ..Self::from_sessions(&state.sessions)
            },
            None => Stats::default(),
        }
    }

    /// Stats over every corpus, with text progress summed across them.
    pub fn global<'a>(states: impl IntoIterator<Item = &'a CorpusState> + Clone) -> Self {
        let (typed, total) = states
            .clone()
            .into_iter()
            .fold((0, 0), |(typed, total), s| {
                (typed + s.character_position, total + s.text_length)
            });
        Stats {
            text_progress_typed: typed,
            text_progress_total: total,
            ..Self::from_sessions(states.into_iter().flat_map(|s| s.sessions.iter()))
        }
    }
}

const RULE: &str = "──────────────────────────────────";

/// Fixed-layout stats block shown in the menu and after a session.
pub fn format_stats(stats: &Stats, title: &str) -> String {
    let title = if title.is_empty() { "STATISTICS" } else { title };
    format!(
        "\n📊 {title}\n{RULE}\n\
         Sessions Completed:  {}\n\
         Total Time:          {}\n\
         Average WPM:         {:.1}\n\
         Best WPM:            {:.1}\n\
         Average Accuracy:    {:.1}%\n\
         Total Characters:    {}\n\
         Effective Chars:     {}\n\
         Text Progress:       {}/{}\n\
         {RULE}\n",
        stats.sessions_completed,
        format_duration(stats.total_time),
        stats.average_wpm,
        stats.best_wpm,
        stats.average_accuracy,
        stats.total_characters_raw,
        stats.total_characters_effective,
        stats.text_progress_typed,
        stats.text_progress_total,
    )
}
