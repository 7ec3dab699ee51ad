use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use weather_core::{Config, ProviderId};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-server", version, about = "Weather forecast HTTP API")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server.
    Serve {
        /// Listen address, e.g. "0.0.0.0:8000".
        #[arg(long)]
        bind: Option<String>,

        /// SQLite database file.
        #[arg(long)]
        database: Option<PathBuf>,
    },

    /// Point a provider at a different base URL.
    Configure {
        /// Provider short name, e.g. "wttr" or "openmeteo".
        provider: String,

        /// New base URL; prompted for when absent.
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Print the effective configuration.
    ShowConfig,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<Config> {
        match &self.config {
            Some(path) => Config::load_from(path),
            None => Config::load(),
        }
    }

    fn save_config(&self, config: &Config) -> anyhow::Result<PathBuf> {
        let path = match &self.config {
            Some(path) => path.clone(),
            None => Config::config_file_path()?,
        };
        config.save_to(&path)?;
        Ok(path)
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = self.load_config()?;

        match &self.command {
            Command::Serve { bind, database } => {
                if let Some(bind) = bind {
                    config.server.bind = bind.clone();
                }
                if let Some(database) = database {
                    config.database.path = database.clone();
                }
                config.validate()?;
                serve(&config).await?;
            }
            Command::Configure { provider, base_url } => {
                let id = ProviderId::try_from(provider.as_str())?;

                let base_url = match base_url {
                    Some(url) => url.clone(),
                    None => inquire::Text::new(&format!("Base URL for {id}:"))
                        .with_default(config.provider_base_url(id))
                        .prompt()
                        .context("Failed to read base URL")?,
                };

                config.upsert_provider_base_url(id, base_url.trim().to_string());
                config.validate()?;
                let path = self.save_config(&config)?;
                println!("Saved {id} base URL to {}", path.display());
            }
            Command::ShowConfig => {
                print!("{}", config.to_toml()?);
            }
        }

        Ok(())
    }
}

async fn serve(config: &Config) -> anyhow::Result<()> {
    let app = weather_server::app_from_config(config)?;
    let addr = config.bind_addr()?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!(
        %addr,
        database = %config.database.path.display(),
        "Weather API listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("Weather API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
