//! budgetsh interactive entry point.
//!
//! Loads the local config, builds a session over the in-process budgeting
//! service, and runs the read loop on stdin/stdout until `exit` or EOF. With
//! `stay_logged_in` set the session token is saved on the way out and
//! resumed on the next start.
//! Set `RUST_LOG=debug` to watch registry transitions.

use anyhow::Result;

use budgetsh_platform::MemoryService;
use budgetsh_terminal::{Shell, run_repl};
use budgetsh_types::config::ShellConfig;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config_path = ShellConfig::config_path();
    let config = match ShellConfig::load_from(&config_path) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load {}: {e}", config_path.display());
            eprintln!("warning: ignoring {} ({e}); using defaults", config_path.display());
            ShellConfig::default()
        },
    };
    log::info!("Starting budgetsh against {}", config.base_url);

    let mut shell = Shell::new(Box::new(MemoryService::new()), config).with_config_path(config_path);
    shell.resume_session();

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    run_repl(&mut shell, stdin.lock(), stdout.lock())?;

    if let Err(e) = shell.persist_session() {
        log::error!("Failed to save session: {e}");
        eprintln!("warning: session not saved ({e})");
    }
    Ok(())
}
