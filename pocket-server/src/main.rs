#[macro_use]
extern crate tracing;

use std::error::Error;
use std::fs;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use actix_cors::Cors;
use actix_web::{App, HttpServer};
use anyhow::{anyhow, Context};
use rand::Rng;
use rustls::{Certificate, PrivateKey, ServerConfig};
use rustls_pemfile::{certs, pkcs8_private_keys};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry;

use pocket_lib::auth::jwt::JWTAuth;
use pocket_lib::config::{Config, SSLConfig};

const SERVICE_NAME: &str = "pocket-server";

#[actix_web::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let subscriber = registry::Registry::default()
        .with(LevelFilter::INFO)
        .with(tracing_subscriber::fmt::Layer::default());
    let tracing_guard = tracing::subscriber::set_default(subscriber);
    info!("tracing initialized");

    let config = match get_config_file() {
        Some(config_path) => {
            info!(?config_path, "Loading config file");
            Config::from_file(config_path)?
        }
        None => {
            info!("No config file found, reading config from environment");
            Config::from_env()?
        }
    };

    let telemetry_layer = match &config.honeycomb_api_key {
        Some(api_key) => Some(pocket_lib::tracing::create_opentelemetry_layer(
            SERVICE_NAME,
            api_key,
        )?),
        None => None,
    };

    let subscriber = registry::Registry::default()
        .with(LevelFilter::INFO)
        .with(tracing_subscriber::fmt::Layer::default())
        .with(telemetry_layer);
    tracing::subscriber::set_global_default(subscriber).context("Unable to set up subscriber")?;
    drop(tracing_guard);

    let repos =
        pocket_repo::sqlx_repo::create_repos(&config.database_url, config.max_pool_size).await?;

    let jwt_auth = JWTAuth::from_secret(get_secret(&config)?);
    let signups_enabled = config.signups_enabled;
    if !signups_enabled {
        warn!("Signups are disabled");
    }

    let app_repos = repos.clone();
    let server = HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(pocket_lib::tracing::create_middleware())
            .configure(pocket_lib::app_config_func(
                jwt_auth.clone(),
                app_repos.clone(),
                signups_enabled,
            ))
    });
    let server = match config.ssl {
        None => {
            warn!(address = %config.bind_address, "Using http");
            server.bind(&config.bind_address)?
        }
        Some(ssl_config) => {
            info!(address = %config.bind_address, "Using https");
            server.bind_rustls(&config.bind_address, load_tls_config(ssl_config)?)?
        }
    };
    server.run().await?;

    info!("Server stopped, closing database pool");
    repos.health_check.close().await;

    Ok(())
}

fn load_tls_config(ssl_config: SSLConfig) -> Result<ServerConfig, anyhow::Error> {
    let config = ServerConfig::builder()
        .with_safe_defaults()
        .with_no_client_auth();

    let mut cert_file = BufReader::new(
        File::open(ssl_config.certificate_chain_file)
            .context("Error opening certificate chain file")?,
    );
    let mut key_file = BufReader::new(
        File::open(ssl_config.private_key_file).context("Error opening private key file")?,
    );

    let cert_chain = certs(&mut cert_file)
        .context("Unable to read certificate chain file")?
        .into_iter()
        .map(Certificate)
        .collect();
    let key = pkcs8_private_keys(&mut key_file)
        .context("Unable to read private key file")?
        .into_iter()
        .map(PrivateKey)
        .next()
        .ok_or_else(|| anyhow!("No private key found in file"))?;

    config
        .with_single_cert(cert_chain, key)
        .context("Invalid certificate or key")
}

fn get_config_file() -> Option<PathBuf> {
    let config_current_dir = PathBuf::from("config.toml");
    if config_current_dir.exists() {
        return Some(config_current_dir);
    }
    if let Ok(config_env) = std::env::var("CONFIGURATION_DIRECTORY") {
        let config_path = PathBuf::from(config_env).join("config.toml");
        if config_path.exists() {
            return Some(config_path);
        }
    }

    None
}

fn get_state_dir() -> PathBuf {
    if let Ok(state_env) = std::env::var("STATE_DIRECTORY") {
        return PathBuf::from(state_env);
    }

    PathBuf::from("data")
}

/// Uses the configured secret if there is one. Otherwise reads it from the state directory,
/// generating and saving a new one on first start.
fn get_secret(config: &Config) -> Result<Vec<u8>, anyhow::Error> {
    if let Some(secret) = &config.jwt_secret {
        return Ok(secret.as_bytes().to_vec());
    }

    let state_dir = get_state_dir();
    let secret_file = state_dir.join("secret");
    if secret_file.exists() {
        fs::read(&secret_file).context("Unable to read secret file")
    } else {
        info!(?secret_file, "Generating new secret");
        let mut rng = rand::thread_rng();
        let mut secret: [u8; 128] = [0; 128];
        rng.fill(&mut secret);

        fs::create_dir_all(&state_dir).context("Unable to create state directory")?;
        fs::write(&secret_file, secret).context("Unable to write secret file")?;

        Ok(secret.to_vec())
    }
}
