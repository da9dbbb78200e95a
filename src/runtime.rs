use std::collections::VecDeque;
use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::Terminal;
use tracing::debug;

use crate::error::Result;
use crate::menu::{Menu, MenuOutcome};
use crate::session::{SessionEngine, SessionExit};
use crate::ui;

pub const TICK_RATE_MS: u64 = 250;

/// Unified event type consumed by the menu and the session engine
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize(u16, u16),
    Tick,
}

/// Source of terminal events (keyboard, resize)
pub trait EventSource {
    /// Waits up to `timeout` for an event; `Ok(None)` when it expires.
    fn next_event(&mut self, timeout: Duration) -> io::Result<Option<AppEvent>>;
}

/// Production event source; polls crossterm on the calling thread.
#[derive(Debug, Default)]
pub struct CrosstermEventSource;

impl EventSource for CrosstermEventSource {
    fn next_event(&mut self, timeout: Duration) -> io::Result<Option<AppEvent>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        Ok(match event::read()? {
            CtEvent::Key(key) => Some(AppEvent::Key(key)),
            CtEvent::Resize(w, h) => Some(AppEvent::Resize(w, h)),
            _ => None,
        })
    }
}

/// Replays a fixed list of events, then reports end of input.
#[derive(Debug, Default)]
pub struct ScriptedEventSource {
    events: VecDeque<AppEvent>,
}

impl ScriptedEventSource {
    pub fn new(events: impl IntoIterator<Item = AppEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl EventSource for ScriptedEventSource {
    fn next_event(&mut self, _timeout: Duration) -> io::Result<Option<AppEvent>> {
        match self.events.pop_front() {
            Some(event) => Ok(Some(event)),
            None => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "scripted events exhausted",
            )),
        }
    }
}

/// Configurable ticker interface
pub trait Ticker {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for FixedTicker {
    fn default() -> Self {
        Self::new(Duration::from_millis(TICK_RATE_MS))
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: EventSource, T: Ticker = FixedTicker> {
    event_source: E,
    ticker: T,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&mut self) -> io::Result<AppEvent> {
        Ok(self
            .event_source
            .next_event(self.ticker.interval())?
            .unwrap_or(AppEvent::Tick))
    }

    pub fn event_source_mut(&mut self) -> &mut E {
        &mut self.event_source
    }
}

/// A ratatui terminal plus the event loop driving the menu and sessions.
pub struct Tui<B: Backend, E: EventSource> {
    terminal: Terminal<B>,
    runner: Runner<E>,
    restore_on_drop: bool,
}

impl Tui<CrosstermBackend<Stdout>, CrosstermEventSource> {
    /// Raw mode plus alternate screen; both are undone when the value drops.
    pub fn crossterm() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(err) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(err.into());
        }
        let terminal = match Terminal::new(CrosstermBackend::new(stdout)) {
            Ok(terminal) => terminal,
            Err(err) => {
                let _ = execute!(io::stdout(), LeaveAlternateScreen);
                let _ = disable_raw_mode();
                return Err(err.into());
            }
        };
        debug!("terminal initialized");
        Ok(Self {
            terminal,
            runner: Runner::new(CrosstermEventSource, FixedTicker::default()),
            restore_on_drop: true,
        })
    }
}

impl<B: Backend, E: EventSource> Tui<B, E> {
    pub fn new(terminal: Terminal<B>, event_source: E) -> Self {
        Self {
            terminal,
            runner: Runner::new(event_source, FixedTicker::default()),
            restore_on_drop: false,
        }
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    pub fn event_source_mut(&mut self) -> &mut E {
        self.runner.event_source_mut()
    }

    pub fn run_menu(&mut self, menu: &mut Menu<'_>) -> Result<MenuOutcome> {
        let size = self.terminal.size()?;
        menu.resize(size.width, size.height);
        loop {
            self.terminal.draw(|f| ui::draw_menu(f, menu))?;
            let event = self.runner.step()?;
            if let Some(outcome) = menu.handle_event(&event) {
                return Ok(outcome);
            }
        }
    }

    pub fn run_session(&mut self, engine: &mut SessionEngine<'_>) -> Result<SessionExit> {
        let size = self.terminal.size()?;
        engine.resize(size.width, size.height);
        loop {
            self.terminal.draw(|f| ui::draw_session(f, engine))?;
            let event = self.runner.step()?;
            if let Some(exit) = engine.handle_event(&event) {
                return Ok(exit);
            }
        }
    }
}

impl<B: Backend, E: EventSource> Drop for Tui<B, E> {
    fn drop(&mut self) {
        if self.restore_on_drop {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            let _ = self.terminal.show_cursor();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};

    #[test]
    fn step_returns_tick_on_timeout() {
        struct Silent;
        impl EventSource for Silent {
            fn next_event(&mut self, _timeout: Duration) -> io::Result<Option<AppEvent>> {
                Ok(None)
            }
        }
        let mut runner = Runner::new(Silent, FixedTicker::new(Duration::from_millis(1)));
        assert_eq!(runner.step().unwrap(), AppEvent::Tick);
    }

    #[test]
    fn step_passes_through_events() {
        let key = AppEvent::Key(KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE));
        let source = ScriptedEventSource::new([AppEvent::Resize(100, 40), key.clone()]);
        let mut runner = Runner::new(source, FixedTicker::new(Duration::from_millis(10)));

        assert_eq!(runner.step().unwrap(), AppEvent::Resize(100, 40));
        assert_eq!(runner.step().unwrap(), key);
        assert_eq!(runner.event_source_mut().remaining(), 0);
    }

    #[test]
    fn exhausted_script_is_an_error() {
        let mut runner = Runner::new(ScriptedEventSource::default(), FixedTicker::default());
        let err = runner.step().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
