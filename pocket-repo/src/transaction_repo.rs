use crate::user_repo::UserId;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::cmp::Ordering::Equal;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

#[derive(Clone, Copy, Debug)]
pub struct PageOptions {
    pub offset: i64,
    pub limit: i64,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Income,
    Expense,
}

impl Direction {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Direction::Income => "income",
            Direction::Expense => "expense",
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid direction: {0}")]
pub struct ParseDirectionError(pub String);

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(Direction::Income),
            "expense" => Ok(Direction::Expense),
            _ => Err(ParseDirectionError(s.to_owned())),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug, sqlx::FromRow)]
pub struct TagRef {
    pub id: i32,
    pub name: String,
    pub color: Option<String>,
    pub icon: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct Transaction {
    pub id: i32,
    pub amount_minor: i64,
    pub currency: String,
    pub direction: Direction,
    pub occurred_at: NaiveDateTime,
    pub description: String,
    pub merchant: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub tags: Vec<TagRef>,
}

impl PartialOrd for Transaction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        let date_ordering = self.occurred_at.partial_cmp(&other.occurred_at);
        if let Some(Equal) = date_ordering {
            self.id.partial_cmp(&other.id)
        } else {
            date_ordering
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NewTransaction {
    pub amount_minor: i64,
    pub currency: String,
    pub direction: Direction,
    pub occurred_at: NaiveDateTime,
    pub description: String,
    pub merchant: Option<String>,
    pub tag_id: Option<i32>,
}

impl NewTransaction {
    pub fn new(
        amount_minor: i64,
        currency: String,
        direction: Direction,
        occurred_at: NaiveDateTime,
        description: String,
        merchant: Option<String>,
        tag_id: Option<i32>,
    ) -> NewTransaction {
        NewTransaction {
            amount_minor,
            currency,
            direction,
            occurred_at,
            description,
            merchant,
            tag_id,
        }
    }
}

#[derive(Default, Clone, Debug)]
pub struct Filter {
    pub direction: Option<Direction>,
    pub tag_id: Option<i32>,
}

impl Filter {
    pub const NONE: Filter = Filter {
        direction: None,
        tag_id: None,
    };
}

/// One page of transactions along with the number of rows matching the filter
#[derive(Clone, Debug)]
pub struct TransactionPage {
    pub transactions: Vec<Transaction>,
    pub total: i64,
}

#[derive(Error, Debug)]
pub enum TransactionRepoError {
    #[error("Transaction with id {0} not found")]
    TransactionNotFound(i32),
    #[error("Tag with id {0} not found")]
    TagNotFound(i32),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[async_trait]
pub trait TransactionRepo: Sync + Send {
    async fn get_transaction(
        &self,
        user: UserId,
        transaction_id: i32,
    ) -> Result<Transaction, TransactionRepoError>;

    /// Newest first
    async fn get_transactions(
        &self,
        user: UserId,
        filter: Filter,
        page_options: Option<PageOptions>,
    ) -> Result<TransactionPage, TransactionRepoError>;

    async fn create_new_transaction(
        &self,
        user: UserId,
        new_transaction: NewTransaction,
    ) -> Result<Transaction, TransactionRepoError>;

    /// Replaces the transaction and its tag link
    async fn update_transaction(
        &self,
        user: UserId,
        transaction_id: i32,
        updated_transaction: NewTransaction,
    ) -> Result<Transaction, TransactionRepoError>;

    async fn delete_transaction(
        &self,
        user: UserId,
        transaction_id: i32,
    ) -> Result<Transaction, TransactionRepoError>;
}
