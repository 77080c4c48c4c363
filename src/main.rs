//! Kolwatch - watch a live KOL tweet feed from the terminal.

use anyhow::Context;
use clap::{Parser, Subcommand};
use kolwatch::config::{self, LoggingConfig};
use kolwatch::simulator::SimulatorServer;
use kolwatch::{App, Config};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "kolwatch", version, about = "Live KOL tweet feed client")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Connect to the feed and log incoming tweets (default)
    Watch {
        /// Override the feed URL
        #[arg(long)]
        url: Option<String>,
    },
    /// Run the local development feed server
    Simulate {
        /// Override the bind address
        #[arg(long)]
        bind: Option<String>,
    },
    /// Print the effective configuration
    Config {
        /// Also write it to the configuration file
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::load(cli.config.clone()).context("failed to load configuration")?;

    // Initialize logging; the guard flushes the log file on exit
    let _guard = init_logging(&config.logging)?;

    match cli.command.unwrap_or(Command::Watch { url: None }) {
        Command::Watch { url } => {
            if let Some(url) = url {
                config.feed.url = url;
            }
            let mut app = App::new(config);
            app.run().await?;
        }
        Command::Simulate { bind } => {
            if let Some(bind) = bind {
                config.simulator.bind = bind;
            }
            let server = SimulatorServer::bind(config.simulator.clone())
                .await
                .with_context(|| format!("failed to bind {}", config.simulator.bind))?;
            server
                .run_until(async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await?;
        }
        Command::Config { save } => {
            print!("{}", config.to_toml()?);
            if save {
                config.save(cli.config)?;
            }
        }
    }

    Ok(())
}

fn init_logging(logging: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));

    let (file_layer, guard) = if logging.file {
        let dir = config::log_dir().context("no log directory available")?;
        let appender = tracing_appender::rolling::daily(dir, "kolwatch.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (
            Some(fmt::layer().with_ansi(false).with_writer(writer)),
            Some(guard),
        )
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .init();

    Ok(guard)
}
