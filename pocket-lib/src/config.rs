use anyhow::{anyhow, Context};
use serde::Deserialize;
use std::path::PathBuf;
use std::{env, fs};

#[derive(Deserialize, Debug, PartialEq)]
pub struct SSLConfig {
    pub private_key_file: PathBuf,
    pub certificate_chain_file: PathBuf,
}

#[derive(Deserialize, Debug, PartialEq)]
pub struct Config {
    pub database_url: String,
    #[serde(default = "default_signups_enabled")]
    pub signups_enabled: bool,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: u32,
    pub jwt_secret: Option<String>,
    pub honeycomb_api_key: Option<String>,
    pub ssl: Option<SSLConfig>,
}

fn default_signups_enabled() -> bool {
    true
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_owned()
}

fn default_max_pool_size() -> u32 {
    10
}

impl Config {
    pub fn from_file(path: PathBuf) -> Result<Config, anyhow::Error> {
        let config = fs::read_to_string(path).context("Unable to read config file")?;
        Config::parse(&config)
    }

    pub fn parse(config: &str) -> Result<Config, anyhow::Error> {
        toml::from_str(config).context("Unable to parse config")
    }

    pub fn from_env() -> Result<Config, anyhow::Error> {
        Config::from_vars(|key| env::var(key).ok())
    }

    /// Builds the config from variables looked up through `var`. `DATABASE_URL` wins over the
    /// individual `DB_*` variables.
    pub fn from_vars<F>(var: F) -> Result<Config, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = match var("DATABASE_URL") {
            Some(url) => url,
            None => {
                let read = |key: &str| var(key).ok_or_else(|| anyhow!("Unable to read env var: {}", key));
                let host = var("DB_HOST").unwrap_or_else(|| "localhost".to_owned());
                let port = var("DB_PORT").map(|p| format!(":{}", p)).unwrap_or_default();
                format!(
                    "postgres://{}:{}@{}{}/{}",
                    read("DB_USER")?,
                    var("DB_PASSWORD").unwrap_or_default(),
                    host,
                    port,
                    var("DB_NAME").unwrap_or_else(|| "pocketledger".to_owned()),
                )
            }
        };

        let signups_enabled = match var("SIGNUPS_ENABLED") {
            Some(value) => value
                .parse()
                .context("Unable to parse SIGNUPS_ENABLED value")?,
            None => default_signups_enabled(),
        };
        let bind_address = match var("API_PORT") {
            Some(port) => {
                let port: u16 = port.parse().context("Unable to parse API_PORT value")?;
                format!("0.0.0.0:{}", port)
            }
            None => default_bind_address(),
        };
        let max_pool_size = match var("MAX_POOL_SIZE") {
            Some(size) => size.parse().context("Unable to parse MAX_POOL_SIZE value")?,
            None => default_max_pool_size(),
        };

        Ok(Config {
            database_url,
            signups_enabled,
            bind_address,
            max_pool_size,
            jwt_secret: var("JWT_SECRET"),
            honeycomb_api_key: var("HONEYCOMB_API_KEY"),
            ssl: None,
        })
    }
}
