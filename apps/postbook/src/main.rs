//! # Postbook
//!
//! Terminal console for writing, publishing and searching posts.

mod config;
mod console;
mod state;
mod telemetry;

use std::io;

use config::AppConfig;
use console::Console;
use postbook_core::Notice;
use state::AppState;
use telemetry::TelemetryConfig;

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    telemetry::init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();
    tracing::info!(
        backend = %config.backend,
        key = %config.store.storage_key,
        "Starting Postbook"
    );

    let AppState {
        store,
        load_report,
        backend,
    } = AppState::new(&config);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut console = Console::new(store, stdin.lock(), stdout.lock());

    if backend != config.backend {
        console.notice(&Notice::warning(format!(
            "{} storage is unavailable; posts will not be kept after exit",
            config.backend
        )))?;
    }
    console.report_load(&load_report)?;
    console.run()?;

    tracing::info!(posts = console.store().len(), "Postbook finished");
    Ok(())
}
