mod analytics_repo;
mod budget_repo;
mod tag_repo;
mod transaction_repo;
mod user_repo;

use crate::user_repo::UserId;
use crate::{HealthCheck, Repos};
use anyhow::Context;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{query, query_scalar, PgConnection, Pool, Postgres};
use std::sync::Arc;
use tracing::{info, instrument};

pub struct SQLxRepo {
    pool: Pool<Postgres>,
}

impl SQLxRepo {
    pub fn new(pool: Pool<Postgres>) -> SQLxRepo {
        SQLxRepo { pool }
    }

    /// Whether `tag_id` names a non-archived tag owned by `user` or global
    #[instrument(skip(conn))]
    async fn is_usable_tag(
        conn: &mut PgConnection,
        user: UserId,
        tag_id: i32,
    ) -> Result<bool, anyhow::Error> {
        let usable = query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM tags WHERE id = $1 AND (user_id = $2 OR user_id IS NULL) AND archived_at IS NULL)",
        )
        .bind(tag_id)
        .bind(user)
        .fetch_one(conn)
        .await
        .with_context(|| format!("Unable to look up tag {}", tag_id))?;
        Ok(usable)
    }
}

#[async_trait]
impl HealthCheck for SQLxRepo {
    async fn check(&self) -> bool {
        query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    async fn close(&self) {
        self.pool.close().await
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

/// Connects to the database and brings the schema up to date
pub async fn create_repos(database_url: &str, max_pool_size: u32) -> Result<Repos, anyhow::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_pool_size)
        .connect(database_url)
        .await
        .context("Unable to connect to database")?;

    info!("Running migrations");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Unable to run migrations")?;

    Ok(Repos::from_shared(Arc::new(SQLxRepo::new(pool))))
}
