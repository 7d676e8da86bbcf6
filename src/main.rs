mod board;
mod command;
mod config;
mod devices;
mod error;
mod poller;
mod prefs;
mod printers;
mod render;
mod sheet;
mod status;
mod transport;
mod ui;
mod web;

use crate::board::BoardStore;
use crate::command::CommandHandler;
use crate::config::AppConfig;
use crate::poller::{PrinterPoller, SheetPoller};
use crate::prefs::{JsonFileStore, MemoryStore, PreferenceStore, Preferences};
use crate::transport::{HttpTransport, StatusTransport};
use crate::web::AppState;
use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let config = Arc::new(AppConfig::from_env());

    tracing::info!(
        "Starting statusboard on {} ({} printers, sheet source: {})",
        config.http_bind,
        config.printers.len(),
        config.sheet_api_url.as_deref().unwrap_or("unset")
    );

    let store: Arc<dyn PreferenceStore> = if config.preferences_path.is_empty() {
        tracing::warn!("PREFERENCES_PATH is empty, preferences will not survive a restart");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(JsonFileStore::open(&config.preferences_path)?)
    };
    let prefs = Preferences::new(store);
    let transport: Arc<dyn StatusTransport> = Arc::new(HttpTransport::new(config.request_timeout)?);
    let board = Arc::new(BoardStore::new(config.printers.clone()));

    let sheet = Arc::new(SheetPoller::new(
        Arc::clone(&board),
        Arc::clone(&transport),
        prefs.clone(),
        config.sheet_api_url.clone(),
    ));
    let printers = Arc::new(PrinterPoller::new(Arc::clone(&board), Arc::clone(&transport)));
    let commands = Arc::new(CommandHandler::new(Arc::clone(&board), transport));

    let sheet_task = poller::spawn_sheet_loop(Arc::clone(&sheet), config.sheet_refresh);
    let printer_task = (!config.printers.is_empty())
        .then(|| poller::spawn_printer_loop(Arc::clone(&printers), config.printer_refresh));

    let state = AppState {
        config: config.clone(),
        store: board,
        prefs,
        sheet,
        printers,
        commands,
    };

    web::serve(state).await?;

    sheet_task.abort();
    if let Some(task) = printer_task {
        task.abort();
    }
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));
    let _ = fmt().with_env_filter(env_filter).try_init();
}
