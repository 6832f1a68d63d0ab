use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use dreammap_api::{AppState, DreamResponse, Server};
use dreammap_core::{
    AnalysisRequest, ConfigManager, DreamError, DreamMapConfig, LoggingConfig,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "dreammap")]
#[command(about = "DreamMap - Dream analysis with a local LLM and the moon phase", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./.dreammap.toml, then ~/.dreammap/config.toml)
    #[arg(short, long, global = true, env = "DREAMMAP_CONFIG")]
    config: Option<PathBuf>,

    /// Output format (json, pretty)
    #[arg(short, long, global = true, default_value = "pretty")]
    output: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Analyze a single dream and store it
    Analyze {
        #[arg(short, long, default_value = "")]
        title: String,

        /// Dream narrative (at least 8 characters)
        #[arg(long)]
        text: String,

        /// Date of the dream, YYYY-MM-DD (defaults to today)
        #[arg(short, long)]
        date: Option<chrono::NaiveDate>,

        /// Astronomy place id, e.g. usa/new-york
        #[arg(short, long)]
        place: Option<String>,
    },

    /// List saved dreams, newest first
    List,

    /// Delete a saved dream
    Delete {
        /// Dream ID
        id: Uuid,
    },

    /// List models installed in the inference backend
    Models,

    /// Write a default config file
    InitConfig {
        /// Target path (defaults to ~/.dreammap/config.toml)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::InitConfig { path, force } = &cli.command {
        return init_config(path.clone(), *force);
    }

    let manager = match &cli.config {
        Some(path) => ConfigManager::load_from(path),
        None => ConfigManager::load(),
    }
    .context("Failed to load configuration")?;
    let config = manager.config().clone();

    init_tracing(&config.logging, cli.verbose);
    if let Some(path) = manager.config_path() {
        tracing::debug!(path = %path.display(), "Configuration file loaded");
    }

    match execute_command(&cli, config).await {
        Ok(Some(output)) => print_output(&cli.output, &output),
        Ok(None) => Ok(()),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn init_tracing(logging: &LoggingConfig, verbose: bool) {
    let default_level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "dreammap={lvl},dreammap_api={lvl},dreammap_pipeline={lvl},dreammap_ai={lvl},dreammap_moon={lvl},dreammap_core={lvl},tower_http=info",
            lvl = default_level
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "compact" {
        registry
            .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn init_config(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = match path.or_else(ConfigManager::user_config_path) {
        Some(path) => path,
        None => bail!("Could not determine a home directory; pass a path explicitly"),
    };
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    ConfigManager::create_default_config(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("{} {}", "Wrote".green(), path.display());
    Ok(())
}

async fn execute_command(cli: &Cli, config: DreamMapConfig) -> Result<Option<serde_json::Value>> {
    match &cli.command {
        Commands::Serve { host, port } => {
            let host = host.clone().unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let addr: SocketAddr = format!("{}:{}", host, port)
                .parse()
                .with_context(|| format!("Invalid listen address {}:{}", host, port))?;

            let state = AppState::new(config)
                .await
                .context("Failed to open dream store")?;
            Server::new(addr, state).run().await.context("Server error")?;
            Ok(None)
        }

        Commands::Analyze {
            title,
            text,
            date,
            place,
        } => {
            let state = AppState::new(config)
                .await
                .context("Failed to open dream store")?;

            let mut request = AnalysisRequest::new(title.clone(), text.clone());
            if let Some(date) = date {
                request = request.with_date(*date);
            }
            if let Some(place) = place {
                request = request.with_location(place.clone());
            }

            match state.orchestrator.submit(request).await {
                Ok(record) => Ok(Some(serde_json::to_value(DreamResponse::from(record))?)),
                Err(DreamError::Persistence { source, record }) => {
                    eprintln!(
                        "{} analysis was not saved: {}",
                        "Warning:".yellow().bold(),
                        source
                    );
                    Ok(Some(serde_json::to_value(DreamResponse::from(*record))?))
                }
                Err(e) => Err(e.into()),
            }
        }

        Commands::List => {
            let store = persistent_store(&config).await?;
            let records = store.list_recent().await.context("Failed to list dreams")?;
            let dreams: Vec<DreamResponse> =
                records.into_iter().map(DreamResponse::from).collect();
            Ok(Some(serde_json::to_value(dreams)?))
        }

        Commands::Delete { id } => {
            let store = persistent_store(&config).await?;
            if !store.delete(*id).await.context("Failed to delete dream")? {
                bail!("Dream {} not found", id);
            }
            Ok(Some(serde_json::json!({ "deleted": id.to_string() })))
        }

        Commands::Models => {
            let state = AppState::new(config)
                .await
                .context("Failed to open dream store")?;
            let models = state
                .orchestrator
                .list_models()
                .await
                .context("Inference backend is not reachable")?;
            Ok(Some(serde_json::json!({
                "configured": state.config.llm.model,
                "installed": models,
            })))
        }

        Commands::InitConfig { .. } => Ok(None),
    }
}

/// `list` and `delete` only make sense against a file-backed store.
async fn persistent_store(
    config: &DreamMapConfig,
) -> Result<std::sync::Arc<dyn dreammap_core::PersistenceGateway>> {
    if config.storage.path.is_none() {
        bail!("No dream store configured; set storage.path or DREAMMAP_STORE_PATH");
    }
    dreammap_api::open_store(config)
        .await
        .context("Failed to open dream store")
}

fn print_output(format: &OutputFormat, value: &serde_json::Value) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        OutputFormat::Pretty => {
            print_pretty(value)?;
        }
    }
    Ok(())
}

fn print_pretty(value: &serde_json::Value) -> Result<()> {
    match value {
        serde_json::Value::Object(map) => {
            for (key, val) in map {
                let key_colored = key.cyan().bold();
                match val {
                    serde_json::Value::String(s) => {
                        println!("{}: {}", key_colored, s.green());
                    }
                    serde_json::Value::Number(n) => {
                        println!("{}: {}", key_colored, n.to_string().yellow());
                    }
                    serde_json::Value::Array(items) if items.iter().all(|i| i.is_string()) => {
                        println!("{}:", key_colored);
                        for item in items.iter().filter_map(|i| i.as_str()) {
                            println!("  - {}", item);
                        }
                    }
                    serde_json::Value::Array(items) => {
                        println!("{}:", key_colored);
                        for item in items {
                            match (item["symbol"].as_str(), item["meaning"].as_str()) {
                                (Some(symbol), Some(meaning)) => {
                                    println!("  - {}: {}", symbol.magenta(), meaning)
                                }
                                _ => println!("  - {}", item),
                            }
                        }
                    }
                    serde_json::Value::Null => {
                        println!("{}: {}", key_colored, "-".dimmed());
                    }
                    _ => {
                        println!("{}: {}", key_colored, val);
                    }
                }
            }
        }
        serde_json::Value::Array(arr) => {
            if arr.is_empty() {
                println!("{}", "No dreams saved yet".dimmed());
            }
            for (i, item) in arr.iter().enumerate() {
                println!("\n{}{}:", "Dream ".cyan(), (i + 1).to_string().yellow());
                print_pretty(item)?;
            }
        }
        _ => {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
    }
    Ok(())
}
