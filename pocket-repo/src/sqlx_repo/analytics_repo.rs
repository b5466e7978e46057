use crate::analytics_repo::{
    AnalyticsRepo, AnalyticsRepoError, CategoryTotal, DirectionTotals, Window,
};
use crate::sqlx_repo::SQLxRepo;
use crate::user_repo::UserId;
use anyhow::Context;
use async_trait::async_trait;
use sqlx::query_as;
use tracing::instrument;

#[derive(sqlx::FromRow)]
struct TotalsResult {
    income_minor: i64,
    expense_minor: i64,
}

#[async_trait]
impl AnalyticsRepo for SQLxRepo {
    #[instrument(skip(self))]
    async fn get_totals(
        &self,
        user: UserId,
        window: Window,
    ) -> Result<DirectionTotals, AnalyticsRepoError> {
        let totals: TotalsResult = query_as(
            r#"
            SELECT COALESCE(SUM(amount_minor) FILTER (WHERE direction = 'income'), 0)::BIGINT  AS income_minor,
                   COALESCE(SUM(amount_minor) FILTER (WHERE direction = 'expense'), 0)::BIGINT AS expense_minor
            FROM transactions
            WHERE user_id = $1 AND occurred_at >= $2 AND occurred_at < $3
            "#,
        )
        .bind(user)
        .bind(window.from)
        .bind(window.until)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("Unable to get totals for user {}", user))?;

        Ok(DirectionTotals {
            income_minor: totals.income_minor,
            expense_minor: totals.expense_minor,
        })
    }

    #[instrument(skip(self))]
    async fn get_expense_categories(
        &self,
        user: UserId,
        window: Window,
        limit: i64,
    ) -> Result<Vec<CategoryTotal>, AnalyticsRepoError> {
        let categories: Vec<CategoryTotal> = query_as(
            r#"
            SELECT t.id                          AS tag_id,
                   t.name                        AS name,
                   t.color                       AS color,
                   t.icon                        AS icon,
                   SUM(tr.amount_minor)::BIGINT  AS total_minor,
                   COUNT(*)                      AS count
            FROM transactions tr
                     LEFT JOIN transaction_tags tt ON tt.transaction_id = tr.id
                     LEFT JOIN tags t ON t.id = tt.tag_id
            WHERE tr.user_id = $1
              AND tr.direction = 'expense'
              AND tr.occurred_at >= $2
              AND tr.occurred_at < $3
            GROUP BY t.id, t.name, t.color, t.icon
            ORDER BY total_minor DESC, tag_id ASC NULLS FIRST
            LIMIT $4
            "#,
        )
        .bind(user)
        .bind(window.from)
        .bind(window.until)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Unable to get expense categories for user {}", user))?;
        Ok(categories)
    }
}
