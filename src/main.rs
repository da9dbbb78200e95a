use std::process::ExitCode;

use include_dir::{include_dir, Dir};
use pagetype::content::{ContentMode, EmbeddedAssets};
use pagetype::shell::{self, AppConfig};

const APP_NAME: &str = "pagetype";

static BOOKS: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/assets/books");

fn main() -> ExitCode {
    let config = AppConfig {
        name: APP_NAME,
        version: env!("CARGO_PKG_VERSION"),
        list_description: "List available books",
        mode: ContentMode::Manifest,
        assets: Box::new(EmbeddedAssets::new(&BOOKS)),
        list_items: Some(shell::descriptor_names),
        select_and_load: Some(shell::load_by_id),
        configure: vec![shell::apply_state_name],
    };

    match shell::run_app(config, std::env::args_os()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{APP_NAME}: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}
