//! Flag parsing and the menu → session loop shared by both binaries.

use std::ffi::OsString;
use std::io;

use clap::{error::ErrorKind, CommandFactory, FromArgMatches, Parser};
use crossterm::tty::IsTty;
use ratatui::backend::Backend;
use tracing::{debug, info};

use crate::config::{FileSettingsStore, Settings, SettingsStore};
use crate::content::{AssetSource, ContentManager, ContentMode, CorpusDescriptor};
use crate::error::{Error, Result};
use crate::logging;
use crate::menu::{Menu, MenuItem, MenuOutcome};
use crate::runtime::{EventSource, Tui};
use crate::session::{SessionEngine, SessionExit, SessionOptions, StoreProvider};
use crate::store::StateStore;

/// Names printed by `--list`.
pub type ListItems = fn(&ContentManager) -> Vec<String>;
/// Loads the chosen corpus.
pub type SelectAndLoad = fn(&mut ContentManager, &CorpusDescriptor) -> Result<Selection>;
/// Runs after flag parsing, before anything touches the state file.
pub type ConfigureHook = fn(&mut StateStore, &Settings) -> Result<()>;

#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// List available entries
    #[arg(short = 'l', long)]
    pub list: bool,

    /// Print version information
    #[arg(short = 'v', long)]
    pub version: bool,
}

/// A corpus ready to type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub key: String,
    pub name: String,
    pub text: String,
}

pub struct AppConfig {
    pub name: &'static str,
    pub version: &'static str,
    pub list_description: &'static str,
    pub mode: ContentMode,
    pub assets: Box<dyn AssetSource>,
    pub list_items: Option<ListItems>,
    pub select_and_load: Option<SelectAndLoad>,
    pub configure: Vec<ConfigureHook>,
}

/// Default `--list` handler: every descriptor name in menu order.
pub fn descriptor_names(manager: &ContentManager) -> Vec<String> {
    manager.available().iter().map(|d| d.name.clone()).collect()
}

/// Loads by id; works for both content modes.
pub fn load_by_id(manager: &mut ContentManager, descriptor: &CorpusDescriptor) -> Result<Selection> {
    let key = manager.source_key_for(descriptor);
    let corpus = manager.load_by_id(descriptor.id)?;
    Ok(Selection {
        key,
        name: corpus.descriptor.name.clone(),
        text: corpus.text.clone(),
    })
}

/// Loads a directory-mode corpus by its display name.
pub fn load_by_name(manager: &mut ContentManager, descriptor: &CorpusDescriptor) -> Result<Selection> {
    let key = manager.source_key_for(descriptor);
    let corpus = manager.load_by_name(&descriptor.name)?;
    Ok(Selection {
        key,
        name: corpus.descriptor.name.clone(),
        text: corpus.text.clone(),
    })
}

/// Points the store at `settings.state_name` when one is configured.
pub fn apply_state_name(store: &mut StateStore, settings: &Settings) -> Result<()> {
    match settings.state_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => store.configure(name),
        _ => Ok(()),
    }
}

/// Parses flags. `Ok(None)` means help was printed and there is nothing left to do.
pub fn parse_args<I, T>(config: &AppConfig, args: I) -> Result<Option<Cli>>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let command = Cli::command()
        .name(config.name)
        .mut_arg("list", |arg| arg.help(config.list_description));
    let matches = match command.try_get_matches_from(args) {
        Ok(matches) => matches,
        Err(err) if err.kind() == ErrorKind::DisplayHelp => {
            err.print()?;
            return Ok(None);
        }
        Err(err) => return Err(err.into()),
    };
    Ok(Some(Cli::from_arg_matches(&matches)?))
}

pub fn run_app<I, T>(config: AppConfig, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let Some(list_items) = config.list_items else {
        return Err(Error::invalid_input("no list handler configured"));
    };
    let Some(select_and_load) = config.select_and_load else {
        return Err(Error::invalid_input("no content loader configured"));
    };
    let Some(cli) = parse_args(&config, args)? else {
        return Ok(());
    };
    if cli.version {
        println!("{}", config.version);
        return Ok(());
    }

    logging::init(config.name);
    let settings = FileSettingsStore::new(config.name).load();
    let mut store = StateStore::open(config.name)?;
    for hook in &config.configure {
        hook(&mut store, &settings)?;
    }
    let mut manager = ContentManager::new(config.assets, config.mode)?;

    if cli.list {
        for name in list_items(&manager) {
            println!("{name}");
        }
        return Ok(());
    }

    if !io::stdin().is_tty() {
        return Err(Error::invalid_input("stdin must be a terminal"));
    }
    let options = SessionOptions {
        context_rows: settings.context_rows,
        debug_overlay: settings.debug_overlay,
    };
    let mut tui = Tui::crossterm()?;
    run_loop(&mut tui, &mut manager, &mut store, options, select_and_load)
}

/// Menu, then a session, then back to the menu after `esc`; returns when the
/// user quits from either.
pub fn run_loop<B: Backend, E: EventSource>(
    tui: &mut Tui<B, E>,
    manager: &mut ContentManager,
    store: &mut StateStore,
    options: SessionOptions,
    select_and_load: SelectAndLoad,
) -> Result<()> {
    loop {
        let Some(descriptor) = pick(tui, manager, store)? else {
            info!("menu closed without a selection");
            return Ok(());
        };
        let selection = select_and_load(manager, &descriptor)?;
        info!(key = %selection.key, name = %selection.name, "starting session");

        let text_len = selection.text.len();
        let provider = StoreProvider::new(store, selection.key, selection.name.clone(), text_len);
        let mut engine =
            SessionEngine::new(selection.text, selection.name, Some(Box::new(provider)), options);
        let exit = tui.run_session(&mut engine)?;
        debug!(?exit, "session ended");

        match exit {
            SessionExit::BackToMenu => {
                if let Some(summary) = engine.summary() {
                    manager.set_pending_flash(summary.flash());
                }
            }
            SessionExit::Done | SessionExit::Quit => return Ok(()),
        }
    }
}

fn pick<B: Backend, E: EventSource>(
    tui: &mut Tui<B, E>,
    manager: &mut ContentManager,
    store: &StateStore,
) -> Result<Option<CorpusDescriptor>> {
    let items = manager
        .available()
        .iter()
        .map(|d| MenuItem {
            name: d.name.clone(),
            key: manager.source_key_for(d),
        })
        .collect();
    let mut menu = Menu::new(items, store)
        .with_flash(manager.take_pending_flash())
        .with_last_search(manager.last_search());
    let outcome = tui.run_menu(&mut menu)?;
    if let Some(last) = menu.last_search() {
        manager.set_last_search(last.query, last.direction);
    }
    Ok(match outcome {
        MenuOutcome::Selected(index) => manager.available().get(index).cloned(),
        MenuOutcome::Cancelled => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::DirectoryAssets;
    use assert_matches::assert_matches;

    fn config() -> AppConfig {
        AppConfig {
            name: "doctype",
            version: "1.2.3",
            list_description: "List available docs",
            mode: ContentMode::Directory,
            assets: Box::new(DirectoryAssets::new(".")),
            list_items: Some(descriptor_names),
            select_and_load: Some(load_by_name),
            configure: vec![apply_state_name],
        }
    }

    #[test]
    fn parses_short_and_long_flags() {
        let cli = parse_args(&config(), ["doctype", "-l"]).unwrap().unwrap();
        assert!(cli.list && !cli.version);
        let cli = parse_args(&config(), ["doctype", "--version"]).unwrap().unwrap();
        assert!(cli.version);
        let cli = parse_args(&config(), ["doctype"]).unwrap().unwrap();
        assert_eq!(cli, Cli::default());
    }

    #[test]
    fn unknown_flags_are_usage_errors() {
        let err = parse_args(&config(), ["doctype", "--bogus"]).unwrap_err();
        assert_matches!(err, Error::Usage(_));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn help_uses_the_list_description() {
        let help = Cli::command()
            .name("doctype")
            .mut_arg("list", |arg| arg.help("List available docs"))
            .render_help()
            .to_string();
        assert!(help.contains("List available docs"));
    }

    #[test]
    fn missing_handlers_are_rejected() {
        let mut cfg = config();
        cfg.select_and_load = None;
        assert_matches!(run_app(cfg, ["doctype"]), Err(Error::InvalidInput(_)));

        let mut cfg = config();
        cfg.list_items = None;
        assert_matches!(run_app(cfg, ["doctype", "-v"]), Err(Error::InvalidInput(_)));
    }

    #[test]
    fn blank_state_name_keeps_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".keep.json");
        let mut store = StateStore::with_path(&path).unwrap();
        let settings = Settings {
            state_name: Some("  ".into()),
            ..Settings::default()
        };
        apply_state_name(&mut store, &settings).unwrap();
        assert_eq!(store.state_file_path(), path);
    }
}
