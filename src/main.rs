#![forbid(unsafe_code)]

mod args;
mod config;
mod constants;
mod event_handler;
mod events;
mod host;
mod lifecycle;
mod logging;
mod persistence;
mod signals;
mod types;
mod window;
mod x11_host;
mod x11_utils;

#[cfg(test)]
mod testing;

use anyhow::Result;
use std::process::ExitCode;
use tracing::{debug, error, info};

use args::ParsedArguments;
use config::{AppPaths, ConfigStore};
use constants::settings::{DOCUMENT, LOG_LEVEL_OPTION, OPEN_DEVTOOLS, STAY_RESIDENT};
use lifecycle::{AppLifecycle, PlatformConvention};
use persistence::SnapshotStore;
use window::WindowOptions;
use x11_host::X11Host;

fn run(args: &ParsedArguments, paths: &AppPaths) -> Result<()> {
    info!(root = %paths.root.display(), "Starting application shell");
    args.dump();
    info!(user_data = %paths.user_data.display(), "User data directory");

    let config_store = ConfigStore::new(&paths.settings);
    let config = config_store.resolve(args);
    for (name, value) in config.iter() {
        debug!(setting = %name, value = %value, "Resolved setting");
    }

    let convention = if config.get_bool(STAY_RESIDENT) {
        PlatformConvention::StayResident
    } else {
        PlatformConvention::detect()
    };
    let options = WindowOptions {
        open_dev_tools: config.get_bool(OPEN_DEVTOOLS),
    };
    let document = paths.document(config.get(DOCUMENT));
    let snapshot = SnapshotStore::load(&paths.snapshot);
    debug!(snapshot = %snapshot.path().display(), "Window snapshot loaded");

    let host = X11Host::connect()?;
    let mut lifecycle = AppLifecycle::new(host, snapshot, document, options, convention);
    lifecycle.run()?;
    debug!(state = ?lifecycle.state(), "Lifecycle stopped");
    Ok(())
}

/// The one-line stderr diagnostic for a fatal error
fn fatal_message(error: &anyhow::Error) -> String {
    format!("error: {error:#}")
}

fn main() -> ExitCode {
    let args = ParsedArguments::from_env();
    let paths = AppPaths::from_current_dir();

    let level = logging::resolve_level(Some(args.get_str(LOG_LEVEL_OPTION)));
    if let Err(e) = logging::init(level, &paths.log) {
        eprintln!("{}", fatal_message(&e));
        return ExitCode::FAILURE;
    }
    logging::install_panic_hook();

    match run(&args, &paths) {
        Ok(()) => {
            info!("Application shell exited");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "Fatal error in main process");
            eprintln!("{}", fatal_message(&e));
            ExitCode::FAILURE
        }
    }
}
