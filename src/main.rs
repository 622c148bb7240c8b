//! Binary entrypoint for the arena economy CLI.
//!
//! Commands:
//! - `start` - run the console dispatcher with periodic autosave
//! - `init` - create a starter `config.toml`, the profile directory and the default catalog documents
//! - `status` - print stored profile count, catalog summary and limits
//!
//! See the library crate docs for module-level details: `arena_economy::`.
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;

use arena_economy::catalog::loader;
use arena_economy::config::Config;
use arena_economy::server::GameServer;

#[derive(Parser)]
#[command(name = "arena-economy")]
#[command(about = "Token economy, item catalog and loadout persistence for an arena game mode")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the economy server, reading commands from stdin
    Start,
    /// Write a default configuration and catalog
    Init {
        /// Overwrite existing catalog documents
        #[arg(long)]
        force: bool,
    },
    /// Show stored profiles and catalog summary
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start => {
            let config = Config::load(&cli.config).await?;
            init_logging(&Some(config.clone()), cli.verbose);
            info!("Starting arena-economy v{}", env!("CARGO_PKG_VERSION"));
            let server = GameServer::new(config).await?;
            server.run().await?;
        }
        Commands::Init { force } => {
            init_logging(&None, cli.verbose);
            info!("Initializing new arena economy configuration");
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);

            let cfg = Config::default();
            tokio::fs::create_dir_all(cfg.storage.profiles_dir()).await?;
            let catalog_dir = cfg.storage.catalog_dir();
            if force || !catalog_dir.join(loader::WEAPONS_FILE).exists() {
                loader::write_defaults(&catalog_dir)?;
                info!("Default catalog written to {}", catalog_dir.display());
            } else {
                info!("Keeping existing catalog in {}", catalog_dir.display());
            }
        }
        Commands::Status => {
            let config = Config::load(&cli.config).await?;
            init_logging(&Some(config.clone()), cli.verbose);
            let server = GameServer::new(config).await?;
            server.show_status().await?;
        }
    }

    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|c| c.logging.level.parse().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let file = config
        .as_ref()
        .and_then(|c| c.logging.file.as_ref())
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });
    let Some(file) = file else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
        let _ = builder.try_init();
        return;
    };

    let security_path = config
        .as_ref()
        .and_then(|c| c.logging.security_file.clone());
    let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(file));
    // Mirror to the console only when attached to a terminal
    let is_tty = atty::is(atty::Stream::Stdout);

    builder.format(move |fmt, record| {
        let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
        let line = format!("{} [{}] {}", ts, record.level(), record.args());

        if let Ok(mut guard) = write_mutex.lock() {
            let _ = writeln!(guard, "{}", line);
        }

        if record.target() == "security" {
            if let Some(ref sec_path) = security_path {
                if let Ok(mut sf) = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(sec_path)
                {
                    let _ = writeln!(sf, "{}", line);
                }
            }
        }

        if is_tty {
            writeln!(fmt, "{}", line)
        } else {
            Ok(())
        }
    });
    let _ = builder.try_init();
}
