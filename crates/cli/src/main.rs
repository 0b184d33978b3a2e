mod config;
mod credential;
mod overlay;
mod page_source;
mod watch;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "tornwatch",
    about = "Overlay a Torn attack target's last action, refreshed every 10 seconds"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the target of an attack page and show its last-action age
    Watch {
        /// Attack-page URL as copied from the browser
        #[arg(required_unless_present = "url_file", conflicts_with = "url_file")]
        url: Option<String>,

        /// Re-read the current URL from this file on every refresh
        #[arg(long)]
        url_file: Option<PathBuf>,

        /// Override the configured refresh interval in seconds
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Show or set configuration
    Config {
        /// Set the Torn API key
        #[arg(long)]
        api_key: Option<String>,

        /// Set the Torn API base URL
        #[arg(long)]
        server: Option<String>,

        /// Set the refresh interval in seconds
        #[arg(long)]
        interval: Option<u64>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Watch {
            url,
            url_file,
            interval,
        } => watch::run_watch(url, url_file, interval).await,
        Commands::Config {
            api_key,
            server,
            interval,
        } => {
            if api_key.is_none() && server.is_none() && interval.is_none() {
                config::show_config()
            } else {
                config::set_config(api_key, server, interval)
            }
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
