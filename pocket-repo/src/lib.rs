use analytics_repo::AnalyticsRepo;
use async_trait::async_trait;
use budget_repo::BudgetRepo;
use std::sync::Arc;
use tag_repo::TagRepo;
use transaction_repo::TransactionRepo;
use user_repo::UserRepo;

pub mod analytics_repo;
pub mod budget_repo;
pub mod tag_repo;
pub mod transaction_repo;
pub mod user_repo;

// implementation modules
pub mod mem_repo;
pub mod sqlx_repo;

#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn check(&self) -> bool;

    /// Releases the underlying resources. Called once on shutdown.
    async fn close(&self) {}
}

/// Every repository the handlers need, backed by one shared implementation
#[derive(Clone)]
pub struct Repos {
    pub user_repo: Arc<dyn UserRepo>,
    pub tag_repo: Arc<dyn TagRepo>,
    pub transaction_repo: Arc<dyn TransactionRepo>,
    pub analytics_repo: Arc<dyn AnalyticsRepo>,
    pub budget_repo: Arc<dyn BudgetRepo>,
    pub health_check: Arc<dyn HealthCheck>,
}

impl Repos {
    fn from_shared<R>(repo: Arc<R>) -> Repos
    where
        R: UserRepo + TagRepo + TransactionRepo + AnalyticsRepo + BudgetRepo + HealthCheck + 'static,
    {
        Repos {
            user_repo: repo.clone(),
            tag_repo: repo.clone(),
            transaction_repo: repo.clone(),
            analytics_repo: repo.clone(),
            budget_repo: repo.clone(),
            health_check: repo,
        }
    }
}
