use crate::budget_repo::BudgetRepoError::{BudgetNotFound, TagNotFound};
use crate::budget_repo::{
    Budget, BudgetCategory, BudgetRepo, BudgetRepoError, NewBudget, NewBudgetCategory,
};
use crate::sqlx_repo::SQLxRepo;
use crate::user_repo::UserId;
use anyhow::Context;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::{query, query_as, query_scalar, PgConnection};
use tracing::instrument;

/// Budgets joined with their allocations. Budgets without allocations produce one row with null
/// category columns.
const BUDGET_SELECT: &str = r#"
    SELECT b.id,
           b.name,
           b.amount_minor,
           (SELECT COALESCE(SUM(tr.amount_minor), 0)::BIGINT
            FROM transactions tr
            WHERE tr.user_id = b.user_id
              AND tr.direction = 'expense'
              AND tr.occurred_at >= b.start_date
              AND tr.occurred_at < b.end_date + 1)     AS spent_minor,
           b.period,
           b.start_date,
           b.end_date,
           b.is_active,
           b.created_at,
           bc.id                                       AS category_id,
           bc.tag_id                                   AS category_tag_id,
           bc.amount_minor                             AS category_amount_minor,
           (SELECT COALESCE(SUM(tr.amount_minor), 0)::BIGINT
            FROM transactions tr
                     JOIN transaction_tags tt ON tt.transaction_id = tr.id AND tt.tag_id = bc.tag_id
            WHERE tr.user_id = b.user_id
              AND tr.direction = 'expense'
              AND tr.occurred_at >= b.start_date
              AND tr.occurred_at < b.end_date + 1)     AS category_spent_minor,
           t.name                                      AS tag_name,
           t.color                                     AS tag_color,
           t.icon                                      AS tag_icon
    FROM budgets b
             LEFT JOIN budget_categories bc ON bc.budget_id = b.id
             LEFT JOIN tags t ON t.id = bc.tag_id
"#;

const BUDGET_ORDER: &str = " ORDER BY b.created_at DESC, b.id DESC, bc.id ASC";

#[derive(sqlx::FromRow)]
struct BudgetRow {
    id: i32,
    name: String,
    amount_minor: i64,
    spent_minor: i64,
    period: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    is_active: bool,
    created_at: NaiveDateTime,
    category_id: Option<i32>,
    category_tag_id: Option<i32>,
    category_amount_minor: Option<i64>,
    category_spent_minor: Option<i64>,
    tag_name: Option<String>,
    tag_color: Option<String>,
    tag_icon: Option<String>,
}

/// Rebuilds nested budgets from the flattened join. Rows of one budget must be adjacent.
fn fold_budget_rows(rows: Vec<BudgetRow>) -> Result<Vec<Budget>, anyhow::Error> {
    let mut budgets: Vec<Budget> = Vec::new();
    for row in rows {
        let category = match (row.category_id, row.category_tag_id, row.category_amount_minor) {
            (Some(id), Some(tag_id), Some(amount_minor)) => Some(BudgetCategory {
                id,
                tag_id,
                amount_minor,
                spent_minor: row.category_spent_minor.unwrap_or(0),
                tag_name: row.tag_name.unwrap_or_default(),
                tag_color: row.tag_color,
                tag_icon: row.tag_icon,
            }),
            _ => None,
        };

        if budgets.last().map(|b| b.id) != Some(row.id) {
            budgets.push(Budget {
                id: row.id,
                name: row.name,
                amount_minor: row.amount_minor,
                spent_minor: row.spent_minor,
                period: row.period.parse()?,
                start_date: row.start_date,
                end_date: row.end_date,
                is_active: row.is_active,
                created_at: row.created_at,
                categories: Vec::new(),
            });
        }
        if let (Some(budget), Some(category)) = (budgets.last_mut(), category) {
            budget.categories.push(category);
        }
    }
    Ok(budgets)
}

impl SQLxRepo {
    #[instrument(skip(conn))]
    async fn fetch_budget(
        conn: &mut PgConnection,
        user: UserId,
        budget_id: i32,
    ) -> Result<Option<Budget>, BudgetRepoError> {
        let rows: Vec<BudgetRow> = query_as(&format!(
            "{} WHERE b.user_id = $1 AND b.id = $2 {}",
            BUDGET_SELECT, BUDGET_ORDER
        ))
        .bind(user)
        .bind(budget_id)
        .fetch_all(conn)
        .await
        .with_context(|| format!("Unable to get budget {}", budget_id))?;
        Ok(fold_budget_rows(rows)?.pop())
    }

    #[instrument(skip(conn, categories))]
    async fn insert_categories(
        conn: &mut PgConnection,
        user: UserId,
        budget_id: i32,
        categories: &[NewBudgetCategory],
    ) -> Result<(), BudgetRepoError> {
        if categories.is_empty() {
            return Ok(());
        }

        let tag_ids: Vec<i32> = categories.iter().map(|c| c.tag_id).collect();
        let usable: Vec<i32> = query_scalar(
            "SELECT id FROM tags WHERE id = ANY($1) AND (user_id = $2 OR user_id IS NULL) AND archived_at IS NULL",
        )
        .bind(&tag_ids)
        .bind(user)
        .fetch_all(&mut *conn)
        .await
        .context("Unable to look up budget tags")?;
        if let Some(missing) = tag_ids.iter().find(|id| !usable.contains(id)) {
            return Err(TagNotFound(*missing));
        }

        for category in categories {
            query("INSERT INTO budget_categories(budget_id, tag_id, amount_minor) VALUES ($1, $2, $3)")
                .bind(budget_id)
                .bind(category.tag_id)
                .bind(category.amount_minor)
                .execute(&mut *conn)
                .await
                .with_context(|| format!("Unable to add category to budget {}", budget_id))?;
        }
        Ok(())
    }
}

#[async_trait]
impl BudgetRepo for SQLxRepo {
    #[instrument(skip(self))]
    async fn get_active_budgets(&self, user: UserId) -> Result<Vec<Budget>, BudgetRepoError> {
        let rows: Vec<BudgetRow> = query_as(&format!(
            "{} WHERE b.user_id = $1 AND b.is_active {}",
            BUDGET_SELECT, BUDGET_ORDER
        ))
        .bind(user)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Unable to get budgets for user {}", user))?;
        Ok(fold_budget_rows(rows)?)
    }

    #[instrument(skip(self))]
    async fn get_budget(&self, user: UserId, budget_id: i32) -> Result<Budget, BudgetRepoError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .context("Unable to acquire connection")?;
        Self::fetch_budget(&mut conn, user, budget_id)
            .await?
            .ok_or(BudgetNotFound(budget_id))
    }

    #[instrument(skip(self, new_budget))]
    async fn create_budget(
        &self,
        user: UserId,
        new_budget: NewBudget,
    ) -> Result<Budget, BudgetRepoError> {
        let mut db_transaction = self
            .pool
            .begin()
            .await
            .context("Unable to begin transaction")?;

        let id: i32 = query_scalar(
            "INSERT INTO budgets(user_id, name, amount_minor, period, start_date, end_date, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
        )
        .bind(user)
        .bind(&new_budget.name)
        .bind(new_budget.amount_minor)
        .bind(new_budget.period.as_str())
        .bind(new_budget.start_date)
        .bind(new_budget.end_date)
        .bind(new_budget.is_active)
        .fetch_one(&mut *db_transaction)
        .await
        .context("Unable to insert budget")?;

        Self::insert_categories(&mut db_transaction, user, id, &new_budget.categories).await?;

        let budget = Self::fetch_budget(&mut db_transaction, user, id)
            .await?
            .ok_or(BudgetNotFound(id))?;

        db_transaction
            .commit()
            .await
            .context("Unable to commit transaction")?;
        Ok(budget)
    }

    #[instrument(skip(self, updated_budget))]
    async fn update_budget(
        &self,
        user: UserId,
        budget_id: i32,
        updated_budget: NewBudget,
    ) -> Result<Budget, BudgetRepoError> {
        let mut db_transaction = self
            .pool
            .begin()
            .await
            .context("Unable to begin transaction")?;

        let result = query(
            "UPDATE budgets SET name = $1, amount_minor = $2, period = $3, start_date = $4, end_date = $5, \
             is_active = $6 WHERE user_id = $7 AND id = $8",
        )
        .bind(&updated_budget.name)
        .bind(updated_budget.amount_minor)
        .bind(updated_budget.period.as_str())
        .bind(updated_budget.start_date)
        .bind(updated_budget.end_date)
        .bind(updated_budget.is_active)
        .bind(user)
        .bind(budget_id)
        .execute(&mut *db_transaction)
        .await
        .with_context(|| format!("Unable to update budget {}", budget_id))?;
        if result.rows_affected() == 0 {
            return Err(BudgetNotFound(budget_id));
        }

        query("DELETE FROM budget_categories WHERE budget_id = $1")
            .bind(budget_id)
            .execute(&mut *db_transaction)
            .await
            .with_context(|| format!("Unable to clear categories of budget {}", budget_id))?;
        Self::insert_categories(
            &mut db_transaction,
            user,
            budget_id,
            &updated_budget.categories,
        )
        .await?;

        let budget = Self::fetch_budget(&mut db_transaction, user, budget_id)
            .await?
            .ok_or(BudgetNotFound(budget_id))?;

        db_transaction
            .commit()
            .await
            .context("Unable to commit transaction")?;
        Ok(budget)
    }

    #[instrument(skip(self))]
    async fn delete_budget(
        &self,
        user: UserId,
        budget_id: i32,
    ) -> Result<Budget, BudgetRepoError> {
        let mut db_transaction = self
            .pool
            .begin()
            .await
            .context("Unable to begin transaction")?;

        let budget = Self::fetch_budget(&mut db_transaction, user, budget_id)
            .await?
            .ok_or(BudgetNotFound(budget_id))?;

        query("DELETE FROM budgets WHERE user_id = $1 AND id = $2")
            .bind(user)
            .bind(budget_id)
            .execute(&mut *db_transaction)
            .await
            .with_context(|| format!("Unable to delete budget {}", budget_id))?;

        db_transaction
            .commit()
            .await
            .context("Unable to commit transaction")?;
        Ok(budget)
    }
}
