use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use parking_lot::Mutex;

use zenith_core::{Config, StorageBackendKind};
use zenith_reminders::{Notifier, ReminderScanner, TracingNotifier};
use zenith_tasks::{views, FileStorage, SqliteStorage, StorageBackend, TaskStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize core
    zenith_core::init()?;

    let (config, _validation) = Config::load_validated()?;

    let storage = open_storage(&config)?;
    let store = Arc::new(Mutex::new(TaskStore::load(storage.clone())));

    {
        let store = store.lock();
        let (pending, completed) = views::partition(store.tasks());

        println!("Zenith - Personal Task Manager");
        match store.user() {
            Some(user) => println!("Signed in as {}", user),
            None => println!("No active session"),
        }
        println!("\nConfiguration:");
        println!("  Data directory: {}", config.data_dir.display());
        println!("  Pending tasks: {}", pending.len());
        println!("  Completed tasks: {}", completed.len());

        tracing::info!(
            "Loaded {} tasks ({} pending, {} completed)",
            store.tasks().len(),
            pending.len(),
            completed.len()
        );
    }

    let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier::new());
    notifier.request_permission();

    let scanner = if config.reminders.enabled && config.reminders.poll_seconds > 0 {
        let scanner = ReminderScanner::new(store.clone(), notifier.clone(), storage);
        Some(scanner.spawn(Duration::from_secs(config.reminders.poll_seconds)))
    } else {
        tracing::info!("Reminder scanning disabled");
        None
    };

    tracing::info!("Zenith application started");
    tokio::signal::ctrl_c().await?;

    // Graceful shutdown
    if let Some(handle) = scanner {
        handle.shutdown().await;
    }
    tracing::info!("Zenith application stopped");

    Ok(())
}

fn open_storage(config: &Config) -> Result<Arc<dyn StorageBackend>> {
    std::fs::create_dir_all(&config.data_dir)?;
    let storage: Arc<dyn StorageBackend> = match config.storage.backend {
        StorageBackendKind::File => Arc::new(FileStorage::open(&config.data_dir)?),
        StorageBackendKind::Sqlite => {
            Arc::new(SqliteStorage::open(config.storage.sqlite_path(&config.data_dir))?)
        }
    };
    Ok(storage)
}
