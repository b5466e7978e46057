use crate::analytics_repo::Window;
use crate::user_repo::UserId;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Weekly,
    Monthly,
    Yearly,
}

impl BudgetPeriod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            BudgetPeriod::Weekly => "weekly",
            BudgetPeriod::Monthly => "monthly",
            BudgetPeriod::Yearly => "yearly",
        }
    }
}

impl Display for BudgetPeriod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid budget period: {0}")]
pub struct ParseBudgetPeriodError(pub String);

impl FromStr for BudgetPeriod {
    type Err = ParseBudgetPeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weekly" => Ok(BudgetPeriod::Weekly),
            "monthly" => Ok(BudgetPeriod::Monthly),
            "yearly" => Ok(BudgetPeriod::Yearly),
            _ => Err(ParseBudgetPeriodError(s.to_owned())),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct BudgetCategory {
    pub id: i32,
    pub tag_id: i32,
    pub amount_minor: i64,
    pub spent_minor: i64,
    pub tag_name: String,
    pub tag_color: Option<String>,
    pub tag_icon: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct Budget {
    pub id: i32,
    pub name: String,
    pub amount_minor: i64,
    pub spent_minor: i64,
    pub period: BudgetPeriod,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub categories: Vec<BudgetCategory>,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct NewBudgetCategory {
    pub tag_id: i32,
    pub amount_minor: i64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NewBudget {
    pub name: String,
    pub amount_minor: i64,
    pub period: BudgetPeriod,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
    pub categories: Vec<NewBudgetCategory>,
}

/// Expenses count toward a budget from the start of `start_date` until the end of `end_date`
pub fn spending_window(start_date: NaiveDate, end_date: NaiveDate) -> Window {
    let until = end_date.succ_opt().unwrap_or(NaiveDate::MAX);
    Window::new(
        start_date.and_time(NaiveTime::MIN),
        until.and_time(NaiveTime::MIN),
    )
}

#[derive(Error, Debug)]
pub enum BudgetRepoError {
    #[error("Budget with id {0} not found")]
    BudgetNotFound(i32),
    #[error("Tag with id {0} not found")]
    TagNotFound(i32),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// `spent_minor` on budgets and their categories is computed from expense transactions on every
/// read
#[async_trait]
pub trait BudgetRepo: Sync + Send {
    /// Active budgets, newest first
    async fn get_active_budgets(&self, user: UserId) -> Result<Vec<Budget>, BudgetRepoError>;

    async fn get_budget(&self, user: UserId, budget_id: i32) -> Result<Budget, BudgetRepoError>;

    async fn create_budget(
        &self,
        user: UserId,
        new_budget: NewBudget,
    ) -> Result<Budget, BudgetRepoError>;

    /// Replaces the budget and all of its category allocations
    async fn update_budget(
        &self,
        user: UserId,
        budget_id: i32,
        updated_budget: NewBudget,
    ) -> Result<Budget, BudgetRepoError>;

    async fn delete_budget(&self, user: UserId, budget_id: i32)
        -> Result<Budget, BudgetRepoError>;
}
