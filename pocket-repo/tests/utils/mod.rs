#![allow(dead_code)]

pub mod generator;
pub mod test_user;

use pocket_repo::Repos;
use serde::Deserialize;
use std::fs;
use tracing::warn;

#[derive(Deserialize)]
struct TestConfig {
    database_url: String,
}

#[derive(Debug)]
pub enum RepoType {
    SQLx,
    Mem,
}

/// Returns `None` when the SQLx backend is requested but `config_test.toml` is absent
pub async fn build_repos(repo_type: RepoType) -> Option<Repos> {
    match repo_type {
        RepoType::SQLx => {
            let Ok(config) = fs::read_to_string("config_test.toml") else {
                warn!("config_test.toml not found, skipping database test");
                return None;
            };
            let config: TestConfig = toml::from_str(config.as_str()).unwrap();
            Some(
                pocket_repo::sqlx_repo::create_repos(&config.database_url, 1)
                    .await
                    .unwrap(),
            )
        }
        RepoType::Mem => Some(pocket_repo::mem_repo::create_repos()),
    }
}
