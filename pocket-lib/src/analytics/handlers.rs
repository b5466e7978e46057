use crate::amount::from_minor_units;
use crate::analytics::Period;
use crate::error::HandlerError;
use crate::transaction::TransactionResponse;
use crate::user::UserId;
use actix_web::{web, HttpResponse, Responder};
use chrono::{Local, NaiveDateTime};
use pocket_repo::analytics_repo::{AnalyticsRepo, CategoryTotal};
use pocket_repo::transaction_repo::{Filter, PageOptions, TransactionRepo};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const CATEGORY_LIMIT: i64 = 10;
const RECENT_LIMIT: i64 = 5;
const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Deserialize)]
pub struct AnalyticsQuery {
    pub period: Option<String>,
}

/// Analytics amounts are plain JSON numbers so clients can add them up directly
#[derive(Serialize)]
struct Totals {
    #[serde(with = "rust_decimal::serde::float")]
    income: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    expense: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    net: Decimal,
}

#[derive(Serialize)]
struct CategoryResponse {
    tag_id: Option<i32>,
    category_name: String,
    category_color: Option<String>,
    category_icon: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    total: Decimal,
    count: i64,
}

impl From<CategoryTotal> for CategoryResponse {
    fn from(category: CategoryTotal) -> Self {
        CategoryResponse {
            tag_id: category.tag_id,
            category_name: category.name.unwrap_or_else(|| UNCATEGORIZED.to_owned()),
            category_color: category.color,
            category_icon: category.icon,
            total: from_minor_units(category.total_minor),
            count: category.count,
        }
    }
}

#[derive(Serialize)]
struct AnalyticsResponse {
    period: Period,
    from: NaiveDateTime,
    until: NaiveDateTime,
    totals: Totals,
    categories: Vec<CategoryResponse>,
    recent: Vec<TransactionResponse>,
}

#[get("")]
pub async fn get_analytics(
    analytics_repo: web::Data<Arc<dyn AnalyticsRepo>>,
    transaction_repo: web::Data<Arc<dyn TransactionRepo>>,
    user_id: web::ReqData<UserId>,
    query: web::Query<AnalyticsQuery>,
) -> Result<impl Responder, HandlerError> {
    let period = match query.into_inner().period.as_deref() {
        None | Some("") => Period::default(),
        Some(period) => period
            .parse::<Period>()
            .map_err(|e| HandlerError::BadRequest(e.to_string()))?,
    };
    let user = user_id.into_inner();
    let window = period.window(Local::now().naive_local());

    let totals = analytics_repo.get_totals(user, window).await?;
    let categories = analytics_repo
        .get_expense_categories(user, window, CATEGORY_LIMIT)
        .await?;
    let recent = transaction_repo
        .get_transactions(
            user,
            Filter::NONE,
            Some(PageOptions {
                offset: 0,
                limit: RECENT_LIMIT,
            }),
        )
        .await?;

    Ok(HttpResponse::Ok().json(AnalyticsResponse {
        period,
        from: window.from,
        until: window.until,
        totals: Totals {
            income: from_minor_units(totals.income_minor),
            expense: from_minor_units(totals.expense_minor),
            net: from_minor_units(totals.income_minor - totals.expense_minor),
        },
        categories: categories.into_iter().map(CategoryResponse::from).collect(),
        recent: recent
            .transactions
            .into_iter()
            .map(TransactionResponse::from)
            .collect(),
    }))
}
