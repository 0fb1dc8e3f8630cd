use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use dotenvy::dotenv;
use eframe::egui;
use room_chat::completion::CompletionClient;
use room_chat::config::{self, StorageConfig};
use room_chat::error::StoreError;
use room_chat::storage::{MemoryStore, MessageStore, SqliteStore};
use room_chat::ui::ChatApp;

#[derive(Parser)]
#[command(
    name = "room_chat",
    version,
    about = "Shared chat room with a language-model participant"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// SQLite file holding the room (overrides storage.database_path)
    #[arg(long, value_name = "FILE")]
    database: Option<String>,
    /// Keep the room in memory for this run only
    #[arg(long, conflicts_with = "database")]
    memory: bool,
    /// Enter the room directly under this display name
    #[arg(long)]
    name: Option<String>,
    /// Write a config file with default settings to --config and exit
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> Result<(), eframe::Error> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    if cli.init_config {
        if std::path::Path::new(&cli.config).exists() {
            log::error!("Config {} already exists; not overwriting", cli.config);
            process::exit(1);
        }
        match config::save_config(&cli.config, &config::AppConfig::default()) {
            Ok(()) => log::info!("Wrote default config to {}", cli.config),
            Err(err) => {
                log::error!("Cannot write config {}: {err}", cli.config);
                process::exit(1);
            }
        }
        return Ok(());
    }

    let mut app_config = config::load_config(&cli.config);
    if let Some(database) = cli.database {
        app_config.storage.database_path = database;
    }

    let store = match open_store(cli.memory, &app_config.storage) {
        Ok(store) => store,
        Err(err) => {
            log::error!(
                "Cannot open message store {}: {err}",
                app_config.storage.database_path
            );
            process::exit(1);
        }
    };

    let completion = match CompletionClient::new(app_config.completion) {
        Ok(client) => client,
        Err(err) => {
            log::error!("Cannot build completion client: {err}");
            process::exit(1);
        }
    };

    let runtime = tokio::runtime::Handle::current();
    let initial_name = cli.name;
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([420.0, 720.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Room Chat",
        options,
        Box::new(move |cc| {
            log::info!("Client started");
            Ok(Box::new(ChatApp::new(
                cc,
                runtime,
                store,
                completion,
                initial_name,
            )))
        }),
    )
}

fn open_store(
    memory: bool,
    storage: &StorageConfig,
) -> Result<Arc<dyn MessageStore>, StoreError> {
    if memory {
        log::info!("Using in-memory room");
        return Ok(Arc::new(MemoryStore::new()));
    }

    log::info!("Using room database {}", storage.database_path);
    let poll_interval = Duration::from_millis(storage.poll_interval_ms);
    Ok(Arc::new(SqliteStore::open(&storage.database_path, poll_interval)?))
}
