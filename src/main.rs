use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Context, Result};
use std::path::PathBuf;
use todostore::config::CONFIG_ENV;
use todostore::{AppState, Config, TodoStore, server};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "todostore")]
#[command(about = "TodoStore - in-memory TodoMVC server with change subscriptions")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to a YAML config file (default: <config dir>/todostore/config.yaml)
    #[arg(short, long, global = true, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the operation and subscription server
    Serve {
        /// Address to listen on, overrides the config file
        #[arg(short, long)]
        bind: Option<String>,

        /// Start with an empty store
        #[arg(long)]
        no_seed: bool,
    },

    /// Print the effective configuration as YAML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { bind, no_seed } => {
            if let Some(bind) = bind {
                config.bind = bind;
            }
            if no_seed {
                config.seed.clear();
            }

            let store = TodoStore::with_seed(&config.seed).into_shared();
            let listener = TcpListener::bind(&config.bind)
                .await
                .wrap_err_with(|| format!("Failed to bind {}", config.bind))?;
            let addr = listener.local_addr()?;

            println!("{} at http://{}/graphql", "Server ready".green().bold(), addr);
            println!("{} at ws://{}/subscriptions", "Subscriptions ready".green().bold(), addr);

            server::serve(listener, AppState::new(store)).await?;
        }
        Commands::Config => {
            print!("{}", config.to_yaml()?);
        }
    }

    Ok(())
}
