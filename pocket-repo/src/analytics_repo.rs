use crate::user_repo::UserId;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Half-open time range `[from, until)`
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub struct Window {
    pub from: NaiveDateTime,
    pub until: NaiveDateTime,
}

impl Window {
    pub fn new(from: NaiveDateTime, until: NaiveDateTime) -> Window {
        Window { from, until }
    }

    pub fn contains(&self, t: NaiveDateTime) -> bool {
        self.from <= t && t < self.until
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct DirectionTotals {
    pub income_minor: i64,
    pub expense_minor: i64,
}

/// Expense sum for one tag. `tag_id` is `None` for untagged transactions.
#[derive(Clone, PartialEq, Eq, Debug, sqlx::FromRow)]
pub struct CategoryTotal {
    pub tag_id: Option<i32>,
    pub name: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub total_minor: i64,
    pub count: i64,
}

#[derive(Error, Debug)]
pub enum AnalyticsRepoError {
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[async_trait]
pub trait AnalyticsRepo: Sync + Send {
    async fn get_totals(
        &self,
        user: UserId,
        window: Window,
    ) -> Result<DirectionTotals, AnalyticsRepoError>;

    /// Largest expense groups first, at most `limit` rows
    async fn get_expense_categories(
        &self,
        user: UserId,
        window: Window,
        limit: i64,
    ) -> Result<Vec<CategoryTotal>, AnalyticsRepoError>;
}
