mod handlers;

use crate::amount::{from_minor_units, AmountInput};
use crate::error::HandlerError;
use actix_web::{web, Scope};
use chrono::{DateTime, Local, NaiveDateTime};
use pocket_repo::transaction_repo::{Direction, NewTransaction, TagRef, Transaction};
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize};

const DEFAULT_CURRENCY: &str = "USD";

pub fn transaction_service() -> Scope {
    web::scope("/transactions")
        .service(handlers::get_transactions)
        .service(handlers::get_transaction)
        .service(handlers::create_new_transaction)
        .service(handlers::update_transaction)
        .service(handlers::delete_transaction)
}

/// Body of create and update requests. Everything is optional here so that missing fields produce
/// a specific 400 rather than a generic parse error.
#[derive(Deserialize, Debug, Default)]
pub struct TransactionRequest {
    pub amount: Option<AmountInput>,
    pub description: Option<String>,
    #[serde(alias = "type")]
    pub direction: Option<String>,
    pub currency: Option<String>,
    #[serde(
        default,
        alias = "occurredAt",
        deserialize_with = "deserialize_timestamp"
    )]
    pub occurred_at: Option<NaiveDateTime>,
    pub merchant: Option<String>,
    #[serde(alias = "tagId")]
    pub tag_id: Option<i32>,
}

/// Parses an RFC 3339 timestamp, converted to server-local time, or a naive
/// `YYYY-MM-DDTHH:MM:SS[.fff]` one taken as is
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, String> {
    let value = value.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.with_timezone(&Local).naive_local());
    }
    value
        .parse::<NaiveDateTime>()
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .map_err(|_| format!("Invalid timestamp: {}", value))
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(value) if !value.trim().is_empty() => {
            parse_timestamp(&value).map(Some).map_err(de::Error::custom)
        }
        _ => Ok(None),
    }
}

impl TransactionRequest {
    /// Validates the request. `occurred_at` and `currency` fall back to the given defaults when
    /// not supplied.
    fn into_new_transaction(
        self,
        default_occurred_at: NaiveDateTime,
        default_currency: &str,
    ) -> Result<NewTransaction, HandlerError> {
        let amount_minor = self
            .amount
            .ok_or_else(|| HandlerError::bad_request("Amount is required"))?
            .to_positive_minor_units()?;
        let direction: Direction = self
            .direction
            .as_deref()
            .unwrap_or_default()
            .parse()
            .map_err(|_| HandlerError::bad_request("Direction must be 'income' or 'expense'"))?;
        let description = self
            .description
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty())
            .ok_or_else(|| HandlerError::bad_request("Description is required"))?;
        let currency = match self.currency.map(|c| c.trim().to_uppercase()) {
            None => default_currency.to_owned(),
            Some(c) if c.len() == 3 && c.chars().all(|c| c.is_ascii_alphabetic()) => c,
            Some(_) => return Err(HandlerError::bad_request("Currency must be a 3-letter code")),
        };
        let merchant = self
            .merchant
            .map(|m| m.trim().to_owned())
            .filter(|m| !m.is_empty());

        Ok(NewTransaction::new(
            amount_minor,
            currency,
            direction,
            self.occurred_at.unwrap_or(default_occurred_at),
            description,
            merchant,
            self.tag_id,
        ))
    }

    /// Replacement for `current`. An omitted `occurred_at` or `currency` keeps the stored value.
    pub fn into_update(self, current: &Transaction) -> Result<NewTransaction, HandlerError> {
        self.into_new_transaction(current.occurred_at, &current.currency)
    }
}

impl TryFrom<TransactionRequest> for NewTransaction {
    type Error = HandlerError;

    fn try_from(request: TransactionRequest) -> Result<Self, Self::Error> {
        request.into_new_transaction(Local::now().naive_local(), DEFAULT_CURRENCY)
    }
}

/// A stored transaction plus its amount as a decimal. The `tag_*` fields repeat `tags` as
/// comma-joined lists and are null for untagged transactions.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct TransactionResponse {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub amount: Decimal,
    #[serde(default)]
    pub tag_names: Option<String>,
    #[serde(default)]
    pub tag_colors: Option<String>,
    #[serde(default)]
    pub tag_icons: Option<String>,
}

fn join_tags(tags: &[TagRef], field: impl Fn(&TagRef) -> Option<&str>) -> Option<String> {
    if tags.is_empty() {
        return None;
    }
    Some(
        tags.iter()
            .map(|t| field(t).unwrap_or_default())
            .collect::<Vec<&str>>()
            .join(","),
    )
}

impl From<Transaction> for TransactionResponse {
    fn from(transaction: Transaction) -> Self {
        TransactionResponse {
            amount: from_minor_units(transaction.amount_minor),
            tag_names: join_tags(&transaction.tags, |t| Some(t.name.as_str())),
            tag_colors: join_tags(&transaction.tags, |t| t.color.as_deref()),
            tag_icons: join_tags(&transaction.tags, |t| t.icon.as_deref()),
            transaction,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    pub const DEFAULT_LIMIT: i64 = 20;
    pub const MAX_LIMIT: i64 = 100;

    pub fn new(page: Option<i64>, limit: Option<i64>) -> Pagination {
        Pagination {
            page: page.unwrap_or(1).max(1),
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
            total: 0,
            pages: 0,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn with_total(self, total: i64) -> Pagination {
        Pagination {
            total,
            pages: (total + self.limit - 1) / self.limit,
            ..self
        }
    }
}
