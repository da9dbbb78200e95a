//! The typing session: input handling, scoring, resume and finalization.

mod layout;
mod provider;

pub use layout::WrapLayout;
#[cfg(test)]
pub use provider::MemoryProvider;
pub use provider::{SessionMetrics, StateProvider, StoreProvider};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::metrics;
use crate::runtime::AppEvent;
use crate::whitespace::{is_excessive_whitespace, NonExcessiveIndex};

/// Rows above the text: title, key help and the status/flash line.
pub const HEADER_ROWS: u16 = 3;

pub const DEFAULT_WIDTH: u16 = 80;
pub const DEFAULT_HEIGHT: u16 = 24;

/// How one text position is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    /// Whitespace that is shown but never scored.
    Excessive,
    Correct,
    Incorrect,
    Cursor,
    Pending,
}

/// Why the session loop should stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionExit {
    /// `ctrl+c`: nothing persisted.
    Quit,
    /// A key was pressed on the results screen.
    Done,
    /// `esc`: progress persisted, go back to the menu.
    BackToMenu,
}

#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub context_rows: u16,
    pub debug_overlay: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            context_rows: 3,
            debug_overlay: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Persistence {
    /// Both writes went through; carries the refreshed stats block.
    Saved(String),
    Failed(String),
    Unsaved,
}

/// Outcome of a finalized session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub elapsed: Duration,
    pub metrics: SessionMetrics,
    pub char_pos: usize,
    pub text_len: usize,
    pub persistence: Persistence,
}

impl SessionSummary {
    pub fn results_text(&self) -> String {
        let m = &self.metrics;
        let mut out = format!(
            "Duration: {:.2} seconds\nWPM: {:.2}\nAccuracy: {:.2}%\nErrors: {}\n\
             Typed this session (raw/eff): {}/{}\nText Progress: {}/{}\n",
            self.elapsed.as_secs_f64(),
            m.wpm,
            m.accuracy,
            m.errors,
            m.chars_raw,
            m.chars_effective,
            self.char_pos,
            self.text_len,
        );
        match &self.persistence {
            Persistence::Saved(stats) => {
                out.push_str("Progress saved!");
                out.push_str(stats);
            }
            Persistence::Failed(warning) => out.push_str(warning),
            Persistence::Unsaved => out.push_str("Progress not saved."),
        }
        out
    }

    /// One-line message for the menu after `esc`.
    pub fn flash(&self) -> String {
        match &self.persistence {
            Persistence::Saved(_) => "Progress saved.".to_string(),
            Persistence::Failed(warning) => warning.clone(),
            Persistence::Unsaved => "Progress not saved.".to_string(),
        }
    }
}

pub struct SessionEngine<'a> {
    text: String,
    input: String,
    source_name: String,
    provider: Option<Box<dyn StateProvider + 'a>>,
    started: bool,
    start_time: Option<Instant>,
    finished: bool,
    width: u16,
    height: u16,
    text_index: NonExcessiveIndex,
    input_index: NonExcessiveIndex,
    layout: WrapLayout,
    baseline_raw: usize,
    baseline_effective: usize,
    awaiting_reset: bool,
    debug_overlay: bool,
    context_rows: u16,
    scroll_top: Option<usize>,
    flash: Option<String>,
    summary: Option<SessionSummary>,
}

impl<'a> SessionEngine<'a> {
    pub fn new(
        text: impl Into<String>,
        source_name: impl Into<String>,
        provider: Option<Box<dyn StateProvider + 'a>>,
        options: SessionOptions,
    ) -> Self {
        let text = text.into();
        let input = match &provider {
            Some(p) => {
                let saved = usize::try_from(p.saved_char_pos()).unwrap_or(0);
                if saved > 0 && saved <= text.len() && text.is_char_boundary(saved) {
                    text[..saved].to_string()
                } else {
                    String::new()
                }
            }
            None => String::new(),
        };
        let text_index = NonExcessiveIndex::build(text.as_bytes());
        let input_index = NonExcessiveIndex::build(input.as_bytes());
        let layout = WrapLayout::build(text.as_bytes(), DEFAULT_WIDTH);
        debug!(len = text.len(), resumed_at = input.len(), "session created");

        Self {
            baseline_raw: input.len(),
            baseline_effective: input_index.count(),
            text,
            input,
            source_name: source_name.into(),
            provider,
            started: false,
            start_time: None,
            finished: false,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            text_index,
            input_index,
            layout,
            awaiting_reset: false,
            debug_overlay: options.debug_overlay,
            context_rows: options.context_rows,
            scroll_top: None,
            flash: None,
            summary: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn viewport(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    pub fn layout(&self) -> &WrapLayout {
        &self.layout
    }

    pub fn flash(&self) -> Option<&str> {
        self.flash.as_deref()
    }

    pub fn awaiting_reset(&self) -> bool {
        self.awaiting_reset
    }

    pub fn debug_overlay_visible(&self) -> bool {
        self.debug_overlay
    }

    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.map(|t| t.elapsed()).unwrap_or_default()
    }

    pub fn handle_event(&mut self, event: &AppEvent) -> Option<SessionExit> {
        match event {
            AppEvent::Key(key) => self.handle_key(*key),
            AppEvent::Resize(width, height) => {
                self.resize(*width, *height);
                None
            }
            AppEvent::Tick => None,
        }
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        if usize::from(width.max(1)) != self.layout.width() {
            self.layout = WrapLayout::build(self.text.as_bytes(), width);
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<SessionExit> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        let ctrl_char = match key.code {
            KeyCode::Char(c) if ctrl => Some(c.to_ascii_lowercase()),
            _ => None,
        };

        if ctrl_char == Some('c') {
            return Some(SessionExit::Quit);
        }
        if self.finished {
            return Some(SessionExit::Done);
        }
        if matches!(ctrl_char, Some('q' | 's')) {
            self.awaiting_reset = false;
            self.finalize();
            return None;
        }
        if self.awaiting_reset {
            self.confirm_reset(key);
            return None;
        }

        match (key.code, ctrl_char) {
            (KeyCode::Esc, _) => {
                self.finalize();
                return Some(SessionExit::BackToMenu);
            }
            (_, Some('r')) => {
                self.awaiting_reset = true;
                self.flash = Some("Reset progress and stats for this content? (y/n)".into());
            }
            (_, Some('d')) => self.debug_overlay = !self.debug_overlay,
            (_, Some('w')) => self.trim_to_last_correct(),
            (KeyCode::Backspace, _) if ctrl || alt => self.trim_to_last_correct(),
            (_, Some('j')) => self.scroll_by(1),
            (_, Some('k')) => self.scroll_by(-1),
            (_, Some('f')) => self.scroll_by(self.page_rows() as isize),
            (_, Some('b')) => self.scroll_by(-(self.page_rows() as isize)),
            (KeyCode::Backspace, None) => {
                if self.input.pop().is_some() {
                    self.input_changed();
                }
            }
            (KeyCode::Enter, None) => self.push_byte(b'\n'),
            (KeyCode::Tab, None) => self.push_byte(b'\t'),
            (KeyCode::Char(c), None) if !alt && (' '..='~').contains(&c) => {
                self.push_byte(c as u8)
            }
            _ => {}
        }
        None
    }

    fn confirm_reset(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y' | 'Y') => {
                let result = match self.provider.as_mut() {
                    Some(provider) => provider.reset_state(),
                    None => Ok(()),
                };
                self.awaiting_reset = false;
                match result {
                    Ok(()) => {
                        self.input.clear();
                        self.input_index.sync(self.input.as_bytes());
                        self.baseline_raw = 0;
                        self.baseline_effective = 0;
                        self.started = false;
                        self.start_time = None;
                        self.scroll_top = None;
                        self.flash = Some("Progress and stats reset.".into());
                        info!(source = %self.source_name, "progress reset");
                    }
                    Err(err) => {
                        warn!(%err, "reset failed");
                        self.flash = Some(format!("Reset failed: {err}"));
                    }
                }
            }
            KeyCode::Char('n' | 'N') | KeyCode::Esc => {
                self.awaiting_reset = false;
                self.flash = Some("Reset cancelled.".into());
            }
            _ => {}
        }
    }

    fn push_byte(&mut self, b: u8) {
        self.input.push(char::from(b));
        self.input_changed();
    }

    fn input_changed(&mut self) {
        if !self.started {
            self.started = true;
            self.start_time = Some(Instant::now());
            debug!(source = %self.source_name, "timer started");
        }
        self.input_index.sync(self.input.as_bytes());
        self.scroll_top = None;
    }

    /// Drops trailing input back to the last correctly typed scored character,
    /// never cutting into the resumed prefix.
    fn trim_to_last_correct(&mut self) {
        let text = self.text.as_bytes();
        let input = self.input.as_bytes();
        let pairs = self.input_index.count().min(self.text_index.count());
        let last_match = (0..pairs).rev().find_map(|rank| {
            let ti = self.text_index.get(rank)?;
            let ui = self.input_index.get(rank)?;
            (text[ti] == input[ui]).then_some(ui)
        });
        let cut = last_match.map_or(0, |ui| ui + 1).max(self.baseline_raw);
        if cut < self.input.len() {
            self.input.truncate(cut);
            self.input_changed();
        }
    }

    fn scroll_by(&mut self, delta: isize) {
        let last = self.layout.line_count().saturating_sub(1);
        let top = self.top_line() as isize + delta;
        self.scroll_top = Some(top.clamp(0, last as isize) as usize);
    }

    /// Rows available to the text body.
    pub fn page_rows(&self) -> usize {
        let overlay = u16::from(self.debug_overlay);
        usize::from(self.height.saturating_sub(HEADER_ROWS + overlay).max(1))
    }

    /// Display position of the cursor; `text.len()` once everything is typed.
    pub fn cursor_pos(&self) -> usize {
        self.text_index
            .get(self.input_index.count())
            .unwrap_or(self.text.len())
    }

    /// First visible line: the manual scroll position, or enough context
    /// above the cursor line.
    pub fn top_line(&self) -> usize {
        match self.scroll_top {
            Some(top) => top,
            None => {
                let cursor_line = self.layout.line_of(self.cursor_pos());
                let context = usize::from(self.context_rows).min(self.page_rows().saturating_sub(1));
                cursor_line.saturating_sub(context)
            }
        }
    }

    /// How display position `p` of the text should be drawn.
    pub fn char_class(&self, p: usize) -> CharClass {
        let text = self.text.as_bytes();
        if is_excessive_whitespace(text, p) {
            return CharClass::Excessive;
        }
        let Some(rank) = self.text_index.rank_of(p) else {
            return CharClass::Pending;
        };
        let typed = self.input_index.count();
        if rank < typed {
            match self.input_index.get(rank) {
                Some(ui) if self.input.as_bytes()[ui] == text[p] => CharClass::Correct,
                _ => CharClass::Incorrect,
            }
        } else if rank == typed {
            CharClass::Cursor
        } else {
            CharClass::Pending
        }
    }

    pub fn session_raw(&self) -> usize {
        self.input.len().saturating_sub(self.baseline_raw)
    }

    pub fn session_effective(&self) -> usize {
        self.input_index.count().saturating_sub(self.baseline_effective)
    }

    fn session_input(&self) -> &str {
        &self.input[self.baseline_raw.min(self.input.len())..]
    }

    pub fn live_wpm(&self) -> f64 {
        metrics::wpm(self.session_input(), self.elapsed())
    }

    pub fn debug_line(&self) -> String {
        format!(
            "[Debug] raw={} eff={} elapsed={:.2}s wpm={:.2}",
            self.session_raw(),
            self.session_effective(),
            self.elapsed().as_secs_f64(),
            self.live_wpm(),
        )
    }

    /// Progress to persist: just past the last scored text byte consumed.
    pub fn char_pos(&self) -> usize {
        let consumed = self.input_index.count().min(self.text_index.count());
        match consumed {
            0 => 0,
            n => self.text_index.get(n - 1).map_or(0, |p| p + 1),
        }
    }

    /// Every scored input byte, resumed prefix included, and the text bytes
    /// it pairs with.
    fn effective_strings(&self) -> (Vec<u8>, Vec<u8>) {
        let text = self.text.as_bytes();
        let input = self.input.as_bytes();
        let typed: Vec<u8> = self
            .input_index
            .positions()
            .iter()
            .map(|&i| input[i])
            .collect();
        let expected: Vec<u8> = self
            .text_index
            .positions()
            .iter()
            .take(typed.len())
            .map(|&i| text[i])
            .collect();
        (expected, typed)
    }

    /// Scores the session and persists it. Runs once; later calls return the
    /// first summary.
    pub fn finalize(&mut self) -> &SessionSummary {
        let summary = match self.summary.take() {
            Some(summary) => summary,
            None => self.compute_summary(),
        };
        self.finished = true;
        &*self.summary.insert(summary)
    }

    fn compute_summary(&mut self) -> SessionSummary {
        let raw = self.session_raw();
        let effective = self.session_effective();
        let mut elapsed = self.elapsed();
        if raw > 0 && elapsed < Duration::from_secs(1) {
            elapsed = Duration::from_secs(1);
        }
        let (expected, typed) = self.effective_strings();
        let session_metrics = SessionMetrics {
            wpm: metrics::wpm(self.session_input(), elapsed),
            accuracy: metrics::accuracy(&expected, &typed),
            errors: metrics::errors(&expected, &typed) as u64,
            chars_raw: raw as u64,
            chars_effective: effective as u64,
            duration_seconds: elapsed.as_secs(),
        };
        let char_pos = self.char_pos();

        let persistence = match self.provider.as_mut() {
            None => Persistence::Unsaved,
            Some(provider) => match provider.save_progress(char_pos as u64) {
                Err(err) => {
                    warn!(%err, "progress not saved, skipping session record");
                    Persistence::Failed(format!("Warning: could not save progress ({err})."))
                }
                Ok(()) => match provider.record_session(&session_metrics) {
                    Ok(stats) => Persistence::Saved(stats),
                    Err(err) => {
                        warn!(%err, "session not recorded");
                        Persistence::Failed(format!(
                            "Progress saved, but the session was not recorded ({err})."
                        ))
                    }
                },
            },
        };
        info!(
            source = %self.source_name,
            wpm = session_metrics.wpm,
            accuracy = session_metrics.accuracy,
            char_pos,
            "session finalized"
        );

        SessionSummary {
            elapsed,
            metrics: session_metrics,
            char_pos,
            text_len: self.text.len(),
            persistence,
        }
    }
}
