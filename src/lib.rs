pub mod config;
pub mod console;
pub mod db;
pub mod labels;
pub mod sensing;
pub mod session;
pub mod settings;
pub mod utils;

use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;

use config::{Args, Config};
use console::Console;
use db::{Database, SegmentLog};
use labels::TagRegistry;
use sensing::{SystemWindowSource, WindowWatcher};
use session::SessionController;
use settings::SettingsStore;

pub async fn run(args: Args) -> Result<()> {
    utils::logging::init();

    let config = Config::load(args)?;
    info!("Window monitor starting; data in {}", config.data_dir.display());

    std::fs::create_dir_all(&config.data_dir).with_context(|| {
        format!("failed to create data directory {}", config.data_dir.display())
    })?;

    let database = Database::new(config.database_path())?;
    let sink = Arc::new(SegmentLog::new(database.clone())?);
    let tags = TagRegistry::load(Box::new(SettingsStore::new(config.settings_path())));

    let watcher = WindowWatcher::new(
        Arc::new(SystemWindowSource),
        sink,
        config.watcher_config(),
    );
    let controller = SessionController::new(tags, watcher);

    Console::new(controller, database, config.window_title.clone())
        .run()
        .await?;

    info!("Window monitor stopped");
    Ok(())
}
