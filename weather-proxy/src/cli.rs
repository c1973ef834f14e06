use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};
use std::path::PathBuf;
use tokio::net::TcpListener;
use weather_core::{Config, WeatherError, WeatherRequest, provider_from_config};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-proxy", version, about = "Weather lookup proxy")]
pub struct Cli {
    /// Config file path. Defaults to the platform config directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP proxy.
    Serve {
        /// Listen address, e.g. "127.0.0.1:3001". Overrides the config file.
        #[arg(long)]
        bind: Option<String>,
    },

    /// Look up current weather for a city once and print it as JSON.
    Lookup {
        /// City name, passed to the provider as-is.
        city: String,
    },

    /// Store the OpenWeather API key in the config file.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let path = match self.config {
            Some(path) => path,
            None => Config::config_file_path()?,
        };

        match self.command {
            Command::Serve { bind } => {
                let config = Config::load_from(&path)?;
                let provider = provider_from_config(&config.upstream)?;
                let bind = bind.unwrap_or(config.server.bind);

                let listener = TcpListener::bind(&bind)
                    .await
                    .with_context(|| format!("Failed to bind {bind}"))?;

                weather_proxy::serve(listener, provider).await?;
            }
            Command::Lookup { city } => {
                let config = Config::load_from(&path)?;
                let provider = provider_from_config(&config.upstream)?;

                let request =
                    WeatherRequest::from_param(Some(city.as_str())).map_err(lookup_error)?;
                let snapshot = provider.current(&request).await.map_err(lookup_error)?;

                let json = serde_json::to_string_pretty(&snapshot)
                    .context("Failed to serialize weather snapshot")?;
                println!("{json}");
            }
            Command::Configure => {
                let mut config = Config::load_file(&path)?;

                let api_key = Password::new("OpenWeather API key:")
                    .with_display_mode(PasswordDisplayMode::Masked)
                    .without_confirmation()
                    .prompt()
                    .context("Failed to read API key")?;

                let api_key = api_key.trim();
                if api_key.is_empty() {
                    return Err(anyhow!("API key must not be empty"));
                }

                config.set_api_key(api_key.to_string());
                config.save_to(&path)?;

                println!("Saved configuration to {}", path.display());
            }
        }

        Ok(())
    }
}

fn lookup_error(err: WeatherError) -> anyhow::Error {
    tracing::debug!("lookup failed: {err}");
    anyhow!(err.user_message())
}
