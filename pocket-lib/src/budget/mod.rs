mod handlers;

use crate::amount::{from_minor_units, AmountInput};
use crate::error::HandlerError;
use actix_web::{web, Scope};
use chrono::{NaiveDate, NaiveDateTime};
use pocket_repo::budget_repo::{
    Budget, BudgetCategory, BudgetPeriod, NewBudget, NewBudgetCategory,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub fn budget_service() -> Scope {
    web::scope("/budgets")
        .service(handlers::get_budgets)
        .service(handlers::get_budget)
        .service(handlers::create_budget)
        .service(handlers::update_budget)
        .service(handlers::delete_budget)
}

#[derive(Deserialize, Debug)]
pub struct CategoryRequest {
    #[serde(alias = "tagId")]
    pub tag_id: i32,
    pub amount: AmountInput,
}

#[derive(Deserialize, Debug, Default)]
pub struct BudgetRequest {
    pub name: Option<String>,
    pub amount: Option<AmountInput>,
    pub period: Option<String>,
    #[serde(alias = "startDate")]
    pub start_date: Option<String>,
    #[serde(alias = "endDate")]
    pub end_date: Option<String>,
    pub categories: Option<Vec<CategoryRequest>>,
    #[serde(alias = "isActive")]
    pub is_active: Option<bool>,
}

/// Accepts `2024-03-01` as well as a full timestamp, of which only the date is kept
fn parse_date(field: &str, value: Option<String>) -> Result<NaiveDate, HandlerError> {
    let value = value.ok_or_else(|| HandlerError::BadRequest(format!("{} is required", field)))?;
    let value = value.trim();
    NaiveDate::parse_from_str(value.get(..10).unwrap_or(value), "%Y-%m-%d")
        .map_err(|_| HandlerError::BadRequest(format!("{} must be a date (YYYY-MM-DD)", field)))
}

impl BudgetRequest {
    /// Validates the request. `is_active` falls back to `default_active` when not given.
    pub fn into_new_budget(self, default_active: bool) -> Result<NewBudget, HandlerError> {
        let name = self
            .name
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| HandlerError::bad_request("Name is required"))?;
        let amount_minor = self
            .amount
            .ok_or_else(|| HandlerError::bad_request("Amount is required"))?
            .to_positive_minor_units()?;
        let period: BudgetPeriod = self
            .period
            .as_deref()
            .unwrap_or_default()
            .parse()
            .map_err(|_| {
                HandlerError::bad_request("Period must be 'weekly', 'monthly' or 'yearly'")
            })?;
        let start_date = parse_date("start_date", self.start_date)?;
        let end_date = parse_date("end_date", self.end_date)?;
        if end_date < start_date {
            return Err(HandlerError::bad_request(
                "end_date must not be before start_date",
            ));
        }

        let mut seen = HashSet::new();
        let mut categories = Vec::new();
        for category in self.categories.unwrap_or_default() {
            if !seen.insert(category.tag_id) {
                return Err(HandlerError::BadRequest(format!(
                    "Tag {} is allocated more than once",
                    category.tag_id
                )));
            }
            categories.push(NewBudgetCategory {
                tag_id: category.tag_id,
                amount_minor: category.amount.to_positive_minor_units()?,
            });
        }

        Ok(NewBudget {
            name,
            amount_minor,
            period,
            start_date,
            end_date,
            is_active: self.is_active.unwrap_or(default_active),
            categories,
        })
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct BudgetCategoryResponse {
    pub id: i32,
    pub tag_id: i32,
    pub tag_name: String,
    pub tag_color: Option<String>,
    pub tag_icon: Option<String>,
    pub amount: Decimal,
    pub amount_minor: i64,
    pub spent: Decimal,
    pub spent_minor: i64,
}

impl From<BudgetCategory> for BudgetCategoryResponse {
    fn from(category: BudgetCategory) -> Self {
        BudgetCategoryResponse {
            id: category.id,
            tag_id: category.tag_id,
            tag_name: category.tag_name,
            tag_color: category.tag_color,
            tag_icon: category.tag_icon,
            amount: from_minor_units(category.amount_minor),
            amount_minor: category.amount_minor,
            spent: from_minor_units(category.spent_minor),
            spent_minor: category.spent_minor,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct BudgetResponse {
    pub id: i32,
    pub name: String,
    pub amount: Decimal,
    pub amount_minor: i64,
    pub spent: Decimal,
    pub spent_minor: i64,
    pub period: BudgetPeriod,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub categories: Vec<BudgetCategoryResponse>,
}

impl From<Budget> for BudgetResponse {
    fn from(budget: Budget) -> Self {
        BudgetResponse {
            id: budget.id,
            name: budget.name,
            amount: from_minor_units(budget.amount_minor),
            amount_minor: budget.amount_minor,
            spent: from_minor_units(budget.spent_minor),
            spent_minor: budget.spent_minor,
            period: budget.period,
            start_date: budget.start_date,
            end_date: budget.end_date,
            is_active: budget.is_active,
            created_at: budget.created_at,
            categories: budget
                .categories
                .into_iter()
                .map(BudgetCategoryResponse::from)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BudgetRequest;
    use chrono::NaiveDate;
    use pocket_repo::budget_repo::BudgetPeriod;
    use rstest::rstest;
    use serde_json::json;

    fn request(json: serde_json::Value) -> BudgetRequest {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn camel_case_dates_and_categories() {
        let new_budget = request(json!({
            "name": "Groceries",
            "amount": "400,00",
            "period": "monthly",
            "startDate": "2024-03-01T00:00:00.000Z",
            "endDate": "2024-03-31",
            "categories": [{"tag_id": 1, "amount": 150}],
        }))
        .into_new_budget(true)
        .unwrap();
        assert_eq!(new_budget.amount_minor, 40_000);
        assert_eq!(new_budget.period, BudgetPeriod::Monthly);
        assert_eq!(
            new_budget.start_date,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert!(new_budget.is_active);
        assert_eq!(new_budget.categories.len(), 1);
        assert_eq!(new_budget.categories[0].amount_minor, 15_000);
    }

    #[test]
    fn is_active_defaults() {
        let body = json!({
            "name": "B", "amount": 1, "period": "weekly",
            "start_date": "2024-01-01", "end_date": "2024-01-07",
        });
        assert!(!request(body.clone()).into_new_budget(false).unwrap().is_active);

        let mut explicit = body;
        explicit["is_active"] = json!(true);
        assert!(request(explicit).into_new_budget(false).unwrap().is_active);
    }

    #[rstest]
    #[case(json!({"amount": 1, "period": "weekly", "start_date": "2024-01-01", "end_date": "2024-01-07"}))]
    #[case(json!({"name": "B", "period": "weekly", "start_date": "2024-01-01", "end_date": "2024-01-07"}))]
    #[case(json!({"name": "B", "amount": 0, "period": "weekly", "start_date": "2024-01-01", "end_date": "2024-01-07"}))]
    #[case(json!({"name": "B", "amount": 1, "period": "daily", "start_date": "2024-01-01", "end_date": "2024-01-07"}))]
    #[case(json!({"name": "B", "amount": 1, "period": "weekly", "start_date": "yesterday", "end_date": "2024-01-07"}))]
    #[case(json!({"name": "B", "amount": 1, "period": "weekly", "start_date": "2024-01-07", "end_date": "2024-01-01"}))]
    #[case(json!({"name": "B", "amount": 1, "period": "weekly", "start_date": "2024-01-01", "end_date": "2024-01-07",
                  "categories": [{"tag_id": 1, "amount": 1}, {"tag_id": 1, "amount": 2}]}))]
    fn invalid_requests(#[case] body: serde_json::Value) {
        assert!(request(body).into_new_budget(true).is_err());
    }
}
