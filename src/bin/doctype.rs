use std::process::ExitCode;

use include_dir::{include_dir, Dir};
use pagetype::content::{ContentMode, EmbeddedAssets};
use pagetype::shell::{self, AppConfig};

const APP_NAME: &str = "doctype";

static DOCS: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/assets/docs");

fn main() -> ExitCode {
    let config = AppConfig {
        name: APP_NAME,
        version: env!("CARGO_PKG_VERSION"),
        list_description: "List available documentation pages",
        mode: ContentMode::Directory,
        assets: Box::new(EmbeddedAssets::new(&DOCS)),
        list_items: Some(shell::descriptor_names),
        select_and_load: Some(shell::load_by_name),
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
