//! Interest sync CLI
//!
//! Operator tool for inspecting and driving a device's interest sync state.
//!
//! # Commands
//!
//! - `start` - Register the device with a push token
//! - `subscribe` / `unsubscribe` / `set` / `clear` - Change interests
//! - `status` - Show device ID, interests and queued jobs
//! - `sync` - Process whatever is still queued

mod commands;

use std::path::PathBuf;
use std::time::Duration;

use api::{ClientConfig, StorageBackend};
use clap::{Parser, Subcommand, ValueEnum};
use db::DbConfig;
use tracing_subscriber::EnvFilter;

/// Keep a device's push notification interests in sync.
#[derive(Parser)]
#[command(name = "interest-sync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Instance the device belongs to
    #[arg(global = true, long, env = "INTEREST_SYNC_INSTANCE_ID")]
    instance_id: Option<String>,

    /// Override the registry base URL
    #[arg(global = true, long, env = "INTEREST_SYNC_BASE_URL")]
    base_url: Option<String>,

    /// Where to keep the job queue and device state
    #[arg(global = true, long, env = "INTEREST_SYNC_STORAGE", value_enum, default_value = "files")]
    storage: Storage,

    /// Data directory
    #[arg(
        global = true,
        long,
        env = "INTEREST_SYNC_DATA_DIR",
        default_value = api::DEFAULT_DATA_DIR
    )]
    data_dir: PathBuf,

    /// Seconds to wait for queued jobs before giving up
    #[arg(global = true, long, default_value = "30")]
    timeout: u64,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Storage {
    Files,
    Surreal,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Register the device with a push token
    Start {
        #[arg(long)]
        token: String,

        /// Device IDs this installation was registered under before
        #[arg(long = "known-device-id")]
        known_device_ids: Vec<String>,
    },

    /// Replace the push token of the registered device
    RefreshToken { token: String },

    /// Subscribe to interests
    Subscribe {
        #[arg(required = true)]
        interests: Vec<String>,
    },

    /// Unsubscribe from interests
    Unsubscribe {
        #[arg(required = true)]
        interests: Vec<String>,
    },

    /// Replace the whole interest set
    Set { interests: Vec<String> },

    /// Unsubscribe from everything
    Clear,

    /// Show device ID, interests and queued jobs
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Process whatever is still queued
    Sync,
}

impl Cli {
    fn client_config(&self) -> anyhow::Result<ClientConfig> {
        let instance_id = self
            .instance_id
            .clone()
            .ok_or_else(|| anyhow::anyhow!("--instance-id or INTEREST_SYNC_INSTANCE_ID is required"))?;

        let storage = match self.storage {
            Storage::Files => StorageBackend::Files {
                dir: self.data_dir.clone(),
            },
            Storage::Surreal => StorageBackend::Surreal(DbConfig::rocksdb(
                self.data_dir.join("db").to_string_lossy(),
            )),
        };

        let mut config = ClientConfig::new(instance_id).with_storage(storage);
        if let Some(ref base_url) = self.base_url {
            config = config.with_base_url(base_url);
        }
        if let Command::Start {
            ref known_device_ids,
            ..
        } = self.command
        {
            config = config.with_known_previous_device_ids(known_device_ids.clone());
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = cli.client_config()?;
    let timeout = Duration::from_secs(cli.timeout);

    match config.storage.clone() {
        StorageBackend::Files { dir } => {
            let instance = api::connect_files(&config, &dir).await?;
            commands::run(instance, cli.command, timeout).await
        }
        StorageBackend::Surreal(db_config) => {
            let instance = api::connect_surreal(&config, &db_config).await?;
            commands::run(instance, cli.command, timeout).await
        }
    }
}
