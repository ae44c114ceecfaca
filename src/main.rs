//! Binary entrypoint for the chatgames CLI.
//!
//! Commands:
//! - `init` - write a starter `config.toml`
//! - `check` - load and validate the configuration
//! - `console --user <id> [--platform <p>]` - play the minigames from stdin,
//!   one command per line, against the sled store
//! - `status` - print how many user records are stored
//!
//! See the library crate docs for module-level details: `chatgames::`.
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};

use chatgames::bot::{dispatch, TextEvent};
use chatgames::config::Config;
use chatgames::games::GameService;
use chatgames::storage::SledKvStore;

#[derive(Parser)]
#[command(name = "chatgames")]
#[command(about = "Chat-bot minigames: sign-in, lottery, shop, cow, prize wheel and more")]
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
    /// Write a default configuration file
    Init,
    /// Load the configuration and report problems
    Check,
    /// Read commands from stdin and print replies
    Console {
        /// User id to play as
        #[arg(short, long)]
        user: String,

        /// Platform name used in the record key
        #[arg(short, long, default_value = "console")]
        platform: String,
    },
    /// Show stored record count
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Init runs before a config file exists
    let pre_config = match cli.command {
        Commands::Init => None,
        _ => Config::load(&cli.config).await.ok(),
    };
    init_logging(&pre_config, cli.verbose);

    match cli.command {
        Commands::Init => {
            info!("Initializing new chatgames configuration");
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);
            println!("Wrote {}", cli.config);
        }
        Commands::Check => {
            let config = match pre_config {
                Some(config) => config,
                None => Config::load(&cli.config).await?,
            };
            config.validate()?;
            println!(
                "{} OK: {} shop items, {} wheel prizes, daily limit {}",
                cli.config,
                config.shop_catalog().len(),
                config.spin.prizes.len(),
                config.limits.daily_command_limit
            );
        }
        Commands::Console { user, platform } => {
            let config = match pre_config {
                Some(config) => config,
                None => {
                    warn!("No usable config at {}; using defaults", cli.config);
                    Config::default()
                }
            };
            config.validate()?;
            let store = SledKvStore::open(config.storage.records_path())?;
            info!(
                "Starting chatgames v{} console for {}:{}",
                env!("CARGO_PKG_VERSION"),
                platform,
                user
            );
            let service = GameService::new(config, Arc::new(store))?;
            run_console(&service, &user, &platform).await?;
        }
        Commands::Status => {
            let config = pre_config.unwrap_or_default();
            let path = config.storage.records_path();
            let store = SledKvStore::open(&path)?;
            let keys = store.list_keys()?;
            println!("Records at {}: {}", path.display(), keys.len());
            for key in keys.iter().take(20) {
                println!("  {}", key);
            }
        }
    }

    Ok(())
}

async fn run_console(service: &GameService, user: &str, platform: &str) -> Result<()> {
    println!("Type 'help' for commands, 'exit' to quit.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut event = TextEvent::new(user, platform);
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }
        if line.is_empty() {
            continue;
        }
        if dispatch(service, &mut event, line).await {
            if let Some(reply) = event.take_reply() {
                println!("{}", reply);
            }
        } else {
            println!("Unknown command. Type 'help'.");
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
            .and_then(|c| c.logging.level.parse::<log::LevelFilter>().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);
    let log_file = config.as_ref().and_then(|c| c.logging.file.clone());
    if let Some(file) = log_file {
        if let Ok(f) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file)
        {
            let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
            // Echo to the console only when stderr is a terminal
            let is_tty = atty::is(atty::Stream::Stderr);

            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());
                if let Ok(mut guard) = write_mutex.lock() {
                    let _ = writeln!(guard, "{}", line);
                }
                if is_tty {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
            let _ = builder.try_init();
            return;
        }
    }
    builder.format(|fmt, record| {
        let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
        writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
    });
    let _ = builder.try_init();
}
