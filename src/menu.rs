//! Corpus picker: navigation, incremental search and a per-corpus stats view.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use itertools::Itertools;

use crate::content::LastSearch;
use crate::runtime::AppEvent;
use crate::stats::format_stats;
use crate::store::StateStore;

pub const HELP_LINE: &str = "Select content (j/k navigate, f/b or PgDn/PgUp page, / search, n/N next/prev result, i info, Enter select, q quit)";
pub const SEARCH_PROMPT: &str = "Select content (searching... Press Enter to search, Esc to cancel)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchDirection {
    #[default]
    Forward,
    Backward,
}

impl SearchDirection {
    pub fn prefix(self) -> char {
        match self {
            SearchDirection::Forward => '/',
            SearchDirection::Backward => '?',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub name: String,
    /// State store key of the corpus.
    pub key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuMode {
    Navigate,
    Search,
    Stats(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOutcome {
    Selected(usize),
    Cancelled,
}

pub struct Menu<'a> {
    items: Vec<MenuItem>,
    store: &'a StateStore,
    selected: usize,
    y_offset: usize,
    width: u16,
    height: u16,
    mode: MenuMode,
    query: String,
    direction: SearchDirection,
    results: Vec<usize>,
    result_idx: usize,
    flash: Option<String>,
}

impl<'a> Menu<'a> {
    pub fn new(items: Vec<MenuItem>, store: &'a StateStore) -> Self {
        Self {
            items,
            store,
            selected: 0,
            y_offset: 0,
            width: crate::session::DEFAULT_WIDTH,
            height: crate::session::DEFAULT_HEIGHT,
            mode: MenuMode::Navigate,
            query: String::new(),
            direction: SearchDirection::Forward,
            results: Vec::new(),
            result_idx: 0,
            flash: None,
        }
    }

    pub fn with_flash(mut self, flash: Option<String>) -> Self {
        self.flash = flash;
        self
    }

    /// Restores a previous search so `n`/`N` keep cycling its matches.
    pub fn with_last_search(mut self, last: Option<&LastSearch>) -> Self {
        if let Some(last) = last {
            self.query = last.query.clone();
            self.direction = last.direction;
            self.results = self.matches(&self.query);
            self.result_idx = match self.direction {
                SearchDirection::Forward => 0,
                SearchDirection::Backward => self.results.len().saturating_sub(1),
            };
        }
        self
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn y_offset(&self) -> usize {
        self.y_offset
    }

    pub fn mode(&self) -> MenuMode {
        self.mode
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn direction(&self) -> SearchDirection {
        self.direction
    }

    pub fn results(&self) -> &[usize] {
        &self.results
    }

    pub fn flash(&self) -> Option<&str> {
        self.flash.as_deref()
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    /// The executed search worth remembering, if any.
    pub fn last_search(&self) -> Option<LastSearch> {
        (!self.query.is_empty() && self.mode != MenuMode::Search).then(|| LastSearch {
            query: self.query.clone(),
            direction: self.direction,
        })
    }

    pub fn header_rows(&self) -> u16 {
        match self.mode {
            MenuMode::Search => 4,
            _ => 3,
        }
    }

    /// Rows available to the item list.
    pub fn list_rows(&self) -> usize {
        usize::from(self.height.saturating_sub(self.header_rows()).max(1))
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.sync_viewport();
    }

    /// Item text with its progress badge.
    pub fn item_label(&self, index: usize) -> String {
        let Some(item) = self.items.get(index) else {
            return String::new();
        };
        match self.store.get(&item.key) {
            Some(state) if state.character_position > 0 => {
                format!("{} ({:.1}%)", item.name, state.percent_complete)
            }
            _ => item.name.clone(),
        }
    }

    /// Corpus block plus the overall block, for the stats view.
    pub fn stats_text(&self, index: usize) -> String {
        let Some(item) = self.items.get(index) else {
            return String::new();
        };
        let corpus = format_stats(&self.store.get_stats(&item.key), "CONTENT STATISTICS");
        let overall = format_stats(&self.store.get_global_stats(), "OVERALL STATISTICS");
        format!("Content: {}\n{corpus}{overall}\nPress any key to continue...", item.name)
    }

    pub fn handle_event(&mut self, event: &AppEvent) -> Option<MenuOutcome> {
        match event {
            AppEvent::Key(key) => self.handle_key(*key),
            AppEvent::Resize(width, height) => {
                self.resize(*width, *height);
                None
            }
            AppEvent::Tick => None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<MenuOutcome> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && matches!(key.code, KeyCode::Char('c' | 'C')) {
            return Some(MenuOutcome::Cancelled);
        }
        self.flash = None;

        match self.mode {
            MenuMode::Stats(_) => {
                self.mode = MenuMode::Navigate;
                None
            }
            MenuMode::Search => {
                self.handle_search_key(key, ctrl);
                None
            }
            MenuMode::Navigate => self.handle_navigate_key(key, ctrl),
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent, ctrl: bool) {
        match key.code {
            KeyCode::Enter => {
                self.mode = MenuMode::Navigate;
                self.execute_search();
            }
            KeyCode::Esc => {
                self.mode = MenuMode::Navigate;
                self.query.clear();
                self.results.clear();
                self.sync_viewport();
            }
            KeyCode::Backspace => {
                self.query.pop();
            }
            KeyCode::Char(c) if !ctrl && (' '..='~').contains(&c) => self.query.push(c),
            _ => {}
        }
    }

    fn handle_navigate_key(&mut self, key: KeyEvent, ctrl: bool) -> Option<MenuOutcome> {
        if ctrl {
            return None;
        }
        let page = self.list_rows();
        let last = self.items.len().saturating_sub(1);
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.select(self.selected.saturating_add(1).min(last)),
            KeyCode::Char('k') | KeyCode::Up => self.select(self.selected.saturating_sub(1)),
            KeyCode::Char('f') | KeyCode::PageDown => self.select(self.selected.saturating_add(page).min(last)),
            KeyCode::Char('b') | KeyCode::PageUp => self.select(self.selected.saturating_sub(page)),
            KeyCode::Char('g') | KeyCode::Home => self.select(0),
            KeyCode::Char('G') | KeyCode::End => self.select(last),
            KeyCode::Char('n') => self.step_result(true),
            KeyCode::Char('N') => self.step_result(false),
            KeyCode::Char('/') => self.start_search(SearchDirection::Forward),
            KeyCode::Char('?') => self.start_search(SearchDirection::Backward),
            KeyCode::Char('i') if !self.items.is_empty() => {
                self.mode = MenuMode::Stats(self.selected);
            }
            KeyCode::Enter if !self.items.is_empty() => {
                return Some(MenuOutcome::Selected(self.selected));
            }
            KeyCode::Char('q') | KeyCode::Esc => return Some(MenuOutcome::Cancelled),
            _ => {}
        }
        None
    }

    fn start_search(&mut self, direction: SearchDirection) {
        self.mode = MenuMode::Search;
        self.direction = direction;
        self.query.clear();
        self.sync_viewport();
    }

    fn matches(&self, query: &str) -> Vec<usize> {
        if query.is_empty() {
            return Vec::new();
        }
        let needle = query.to_lowercase();
        self.items
            .iter()
            .positions(|item| item.name.to_lowercase().contains(&needle))
            .collect()
    }

    fn execute_search(&mut self) {
        self.results = self.matches(&self.query);
        if self.results.is_empty() {
            self.sync_viewport();
            return;
        }
        self.result_idx = match self.direction {
            SearchDirection::Forward => 0,
            SearchDirection::Backward => self.results.len() - 1,
        };
        self.select(self.results[self.result_idx]);
    }

    /// `n` (`forward == true`) or `N`; reversed after a `?` search.
    fn step_result(&mut self, forward: bool) {
        let len = self.results.len();
        if len == 0 {
            return;
        }
        let ahead = forward == (self.direction == SearchDirection::Forward);
        self.result_idx = if ahead {
            (self.result_idx + 1) % len
        } else {
            (self.result_idx + len - 1) % len
        };
        self.select(self.results[self.result_idx]);
    }

    fn select(&mut self, index: usize) {
        self.selected = index;
        self.sync_viewport();
    }

    /// Scrolls the minimum distance that keeps the selection visible.
    fn sync_viewport(&mut self) {
        let rows = self.list_rows();
        if self.selected < self.y_offset {
            self.y_offset = self.selected;
        } else if self.selected >= self.y_offset + rows {
            self.y_offset = self.selected + 1 - rows;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    fn press(menu: &mut Menu<'_>, code: KeyCode) -> Option<MenuOutcome> {
        menu.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_keys(menu: &mut Menu<'_>, keys: &str) {
        for c in keys.chars() {
            press(menu, KeyCode::Char(c));
        }
    }

    fn items(names: &[&str]) -> Vec<MenuItem> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| MenuItem {
                name: name.to_string(),
                key: (i + 1).to_string(),
            })
            .collect()
    }

    fn empty_store() -> (TempDir, StateStore) {
        let dir = tempdir().unwrap();
        let store = StateStore::with_path(dir.path().join(".menu.json")).unwrap();
        (dir, store)
    }

    #[test]
    fn search_cycles_matches() {
        let (_dir, store) = empty_store();
        let mut menu = Menu::new(items(&["Alpha", "Beta", "alphabet", "Gamma"]), &store);
        press(&mut menu, KeyCode::Char('/'));
        assert_eq!(menu.mode(), MenuMode::Search);
        type_keys(&mut menu, "alp");
        press(&mut menu, KeyCode::Enter);

        assert_eq!(menu.mode(), MenuMode::Navigate);
        assert_eq!(menu.results(), &[0, 2]);
        assert_eq!(menu.selected(), 0);
        press(&mut menu, KeyCode::Char('n'));
        assert_eq!(menu.selected(), 2);
        press(&mut menu, KeyCode::Char('n'));
        assert_eq!(menu.selected(), 0);
        press(&mut menu, KeyCode::Char('N'));
        assert_eq!(menu.selected(), 2);
    }

    #[test]
    fn backward_search_starts_at_last_match() {
        let (_dir, store) = empty_store();
        let mut menu = Menu::new(items(&["Alpha", "Beta", "alphabet", "Gamma"]), &store);
        press(&mut menu, KeyCode::Char('?'));
        type_keys(&mut menu, "ALP");
        press(&mut menu, KeyCode::Enter);
        assert_eq!(menu.selected(), 2);
        press(&mut menu, KeyCode::Char('n'));
        assert_eq!(menu.selected(), 0);
        press(&mut menu, KeyCode::Char('N'));
        assert_eq!(menu.selected(), 2);
    }

    #[test]
    fn search_editing_and_cancel() {
        let (_dir, store) = empty_store();
        let mut menu = Menu::new(items(&["Alpha", "Beta"]), &store);
        press(&mut menu, KeyCode::Char('/'));
        type_keys(&mut menu, "bx");
        press(&mut menu, KeyCode::Backspace);
        assert_eq!(menu.query(), "b");
        press(&mut menu, KeyCode::Esc);
        assert_eq!(menu.mode(), MenuMode::Navigate);
        assert_eq!(menu.query(), "");
        assert!(menu.results().is_empty());
        assert_eq!(menu.selected(), 0);
    }

    #[test]
    fn navigation_and_paging() {
        let (_dir, store) = empty_store();
        let names: Vec<String> = (0..50).map(|i| format!("Book {i:02}")).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut menu = Menu::new(items(&names), &store);
        menu.resize(80, 13);
        assert_eq!(menu.list_rows(), 10);

        press(&mut menu, KeyCode::Char('j'));
        press(&mut menu, KeyCode::Down);
        assert_eq!(menu.selected(), 2);
        press(&mut menu, KeyCode::Char('k'));
        assert_eq!(menu.selected(), 1);

        press(&mut menu, KeyCode::PageDown);
        assert_eq!(menu.selected(), 11);
        assert_eq!(menu.y_offset(), 2);

        press(&mut menu, KeyCode::Char('G'));
        assert_eq!(menu.selected(), 49);
        assert_eq!(menu.y_offset(), 40);
        press(&mut menu, KeyCode::Char('j'));
        assert_eq!(menu.selected(), 49);

        press(&mut menu, KeyCode::Char('b'));
        assert_eq!(menu.selected(), 39);
        assert_eq!(menu.y_offset(), 39);

        press(&mut menu, KeyCode::Char('g'));
        assert_eq!((menu.selected(), menu.y_offset()), (0, 0));
        press(&mut menu, KeyCode::Char('k'));
        assert_eq!(menu.selected(), 0);
    }

    #[test]
    fn selection_and_quit() {
        let (_dir, store) = empty_store();
        let mut menu = Menu::new(items(&["A", "B"]), &store);
        press(&mut menu, KeyCode::Char('j'));
        assert_eq!(press(&mut menu, KeyCode::Enter), Some(MenuOutcome::Selected(1)));
        assert_eq!(press(&mut menu, KeyCode::Char('q')), Some(MenuOutcome::Cancelled));
        assert_eq!(press(&mut menu, KeyCode::Esc), Some(MenuOutcome::Cancelled));
        assert_eq!(
            menu.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(MenuOutcome::Cancelled)
        );
    }

    #[test]
    fn empty_menu_cannot_select() {
        let (_dir, store) = empty_store();
        let mut menu = Menu::new(Vec::new(), &store);
        assert_eq!(press(&mut menu, KeyCode::Enter), None);
        assert_eq!(press(&mut menu, KeyCode::Char('i')), None);
        assert_eq!(menu.mode(), MenuMode::Navigate);
    }

    #[test]
    fn labels_show_progress_badges() {
        let (_dir, mut store) = empty_store();
        store.save_progress("1", "Alpha", 25, 100).unwrap();
        store.save_progress("2", "Beta", 0, 100).unwrap();
        let menu = Menu::new(items(&["Alpha", "Beta", "Gamma"]), &store);
        assert_eq!(menu.item_label(0), "Alpha (25.0%)");
        assert_eq!(menu.item_label(1), "Beta");
        assert_eq!(menu.item_label(2), "Gamma");
    }

    #[test]
    fn stats_view_round_trip() {
        let (_dir, mut store) = empty_store();
        store.save_progress("1", "Alpha", 10, 100).unwrap();
        let mut menu = Menu::new(items(&["Alpha"]), &store);
        press(&mut menu, KeyCode::Char('i'));
        assert_eq!(menu.mode(), MenuMode::Stats(0));
        let text = menu.stats_text(0);
        assert!(text.starts_with("Content: Alpha\n"));
        assert!(text.contains("CONTENT STATISTICS"));
        assert!(text.contains("OVERALL STATISTICS"));
        press(&mut menu, KeyCode::Char('i'));
        assert_eq!(menu.mode(), MenuMode::Navigate);
    }

    #[test]
    fn restored_search_keeps_n_working() {
        let (_dir, store) = empty_store();
        let last = LastSearch {
            query: "a".into(),
            direction: SearchDirection::Forward,
        };
        let mut menu = Menu::new(items(&["Alpha", "Beta", "Omega", "Zed"]), &store)
            .with_last_search(Some(&last))
            .with_flash(Some("Progress saved.".into()));
        assert_eq!(menu.flash(), Some("Progress saved."));
        assert_eq!(menu.results(), &[0, 1, 2]);
        press(&mut menu, KeyCode::Char('n'));
        assert_eq!(menu.selected(), 1);
        assert_eq!(menu.flash(), None);
        assert_eq!(menu.last_search(), Some(last));
    }

    #[test]
    fn resize_keeps_selection_visible() {
        let (_dir, store) = empty_store();
        let names: Vec<String> = (0..30).map(|i| i.to_string()).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut menu = Menu::new(items(&names), &store);
        press(&mut menu, KeyCode::Char('G'));
        menu.handle_event(&AppEvent::Resize(80, 8));
        assert_eq!(menu.list_rows(), 5);
        assert_eq!(menu.y_offset(), 25);
    }
}
