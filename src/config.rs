use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "takeboard", about = "Backend for a hot-takes social app")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to data directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub moderation: ModerationConfig,
    pub presence: PresenceConfig,
    pub notify: NotifyConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ModerationConfig {
    /// Submissions at or above this toxicity probability go to review.
    pub review_threshold: f64,
    /// Maximum take length in characters.
    pub max_take_chars: usize,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PresenceConfig {
    /// Seconds since last heartbeat before a user stops counting as active.
    pub ttl_secs: u64,
    /// How often the background sweep marks stale users offline.
    pub sweep_secs: u64,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct NotifyConfig {
    /// Push gateway endpoint. Notifications are logged and dropped when unset.
    pub gateway_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            review_threshold: 0.7,
            max_take_chars: 150,
        }
    }
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            sweep_secs: 300,
        }
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let data_dir = Self::data_dir(cli);
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config: Config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        // CLI overrides
        if let Some(ref host) = cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }

        // Resolve paths relative to data dir
        if config.database.path.is_none() {
            config.database.path = Some(data_dir.join("takeboard.db"));
        }

        if let Some(ref gateway) = config.notify.gateway_url {
            url::Url::parse(gateway)
                .map_err(|e| anyhow::anyhow!("invalid notify.gateway_url {gateway:?}: {e}"))?;
        }
        if !(0.0..=1.0).contains(&config.moderation.review_threshold) {
            anyhow::bail!(
                "moderation.review_threshold must be within 0.0..=1.0, got {}",
                config.moderation.review_threshold
            );
        }

        Ok(config)
    }

    pub fn data_dir(cli: &Cli) -> PathBuf {
        cli.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .expect("Could not determine home directory")
                .join(".takeboard")
        })
    }

    pub fn db_path(&self) -> &PathBuf {
        self.database.path.as_ref().unwrap()
    }
}
