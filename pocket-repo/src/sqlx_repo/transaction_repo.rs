use crate::sqlx_repo::SQLxRepo;
use crate::transaction_repo::TransactionRepoError::{TagNotFound, TransactionNotFound};
use crate::transaction_repo::{
    Filter, NewTransaction, PageOptions, TagRef, Transaction, TransactionPage, TransactionRepo,
    TransactionRepoError,
};
use crate::user_repo::UserId;
use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{query, query_as, query_scalar, PgConnection, Postgres, QueryBuilder};
use std::collections::HashMap;
use tracing::instrument;

const TRANSACTION_COLUMNS: &str =
    "id, amount_minor, currency, direction, occurred_at, description, merchant, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct TransactionEntry {
    id: i32,
    amount_minor: i64,
    currency: String,
    direction: String,
    occurred_at: NaiveDateTime,
    description: String,
    merchant: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl TransactionEntry {
    fn into_transaction(self, tags: Vec<TagRef>) -> Result<Transaction, anyhow::Error> {
        Ok(Transaction {
            id: self.id,
            amount_minor: self.amount_minor,
            currency: self.currency,
            direction: self.direction.parse()?,
            occurred_at: self.occurred_at,
            description: self.description,
            merchant: self.merchant,
            created_at: self.created_at,
            updated_at: self.updated_at,
            tags,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TransactionTagEntry {
    transaction_id: i32,
    id: i32,
    name: String,
    color: Option<String>,
    icon: Option<String>,
}

fn push_filter(query_builder: &mut QueryBuilder<'_, Postgres>, user: UserId, filter: &Filter) {
    query_builder.push(" WHERE user_id = ").push_bind(user);
    if let Some(direction) = filter.direction {
        query_builder
            .push(" AND direction = ")
            .push_bind(direction.as_str());
    }
    if let Some(tag_id) = filter.tag_id {
        query_builder
            .push(" AND EXISTS (SELECT 1 FROM transaction_tags tt WHERE tt.transaction_id = transactions.id AND tt.tag_id = ")
            .push_bind(tag_id)
            .push(")");
    }
}

impl SQLxRepo {
    /// Resolves entries into transactions, loading all their tags with one query
    #[instrument(skip(conn, entries))]
    async fn attach_tags(
        conn: &mut PgConnection,
        entries: Vec<TransactionEntry>,
    ) -> Result<Vec<Transaction>, TransactionRepoError> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = entries.iter().map(|e| e.id).collect();
        let tag_entries: Vec<TransactionTagEntry> = query_as(
            "SELECT tt.transaction_id, t.id, t.name, t.color, t.icon FROM transaction_tags tt \
             JOIN tags t ON t.id = tt.tag_id WHERE tt.transaction_id = ANY($1) ORDER BY t.name, t.id",
        )
        .bind(ids)
        .fetch_all(conn)
        .await
        .context("Unable to get transaction tags")?;

        let mut tags: HashMap<i32, Vec<TagRef>> = HashMap::new();
        for t in tag_entries {
            tags.entry(t.transaction_id).or_default().push(TagRef {
                id: t.id,
                name: t.name,
                color: t.color,
                icon: t.icon,
            });
        }

        let transactions = entries
            .into_iter()
            .map(|e| {
                let transaction_tags = tags.remove(&e.id).unwrap_or_default();
                e.into_transaction(transaction_tags)
            })
            .collect::<Result<Vec<Transaction>, anyhow::Error>>()?;
        Ok(transactions)
    }

    #[instrument(skip(conn))]
    async fn fetch_transaction(
        conn: &mut PgConnection,
        user: UserId,
        transaction_id: i32,
    ) -> Result<Option<Transaction>, TransactionRepoError> {
        let entry: Option<TransactionEntry> = query_as(&format!(
            "SELECT {} FROM transactions WHERE id = $1 AND user_id = $2",
            TRANSACTION_COLUMNS
        ))
        .bind(transaction_id)
        .bind(user)
        .fetch_optional(&mut *conn)
        .await
        .with_context(|| format!("Unable to get transaction {}", transaction_id))?;

        match entry {
            Some(entry) => Ok(Self::attach_tags(conn, vec![entry]).await?.pop()),
            None => Ok(None),
        }
    }

    #[instrument(skip(conn))]
    async fn link_tag(
        conn: &mut PgConnection,
        user: UserId,
        transaction_id: i32,
        tag_id: Option<i32>,
    ) -> Result<(), TransactionRepoError> {
        let Some(tag_id) = tag_id else {
            return Ok(());
        };
        if !Self::is_usable_tag(&mut *conn, user, tag_id).await? {
            return Err(TagNotFound(tag_id));
        }
        query("INSERT INTO transaction_tags(transaction_id, tag_id) VALUES ($1, $2)")
            .bind(transaction_id)
            .bind(tag_id)
            .execute(conn)
            .await
            .with_context(|| format!("Unable to tag transaction {}", transaction_id))?;
        Ok(())
    }
}

#[async_trait]
impl TransactionRepo for SQLxRepo {
    #[instrument(skip(self))]
    async fn get_transaction(
        &self,
        user: UserId,
        transaction_id: i32,
    ) -> Result<Transaction, TransactionRepoError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .context("Unable to acquire connection")?;
        Self::fetch_transaction(&mut conn, user, transaction_id)
            .await?
            .ok_or(TransactionNotFound(transaction_id))
    }

    #[instrument(skip(self))]
    async fn get_transactions(
        &self,
        user: UserId,
        filter: Filter,
        page_options: Option<PageOptions>,
    ) -> Result<TransactionPage, TransactionRepoError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .context("Unable to acquire connection")?;

        let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM transactions");
        push_filter(&mut count_query, user, &filter);
        let total: i64 = count_query
            .build_query_scalar::<i64>()
            .fetch_one(&mut *conn)
            .await
            .with_context(|| format!("Unable to count transactions for user {}", user))?;

        let mut query_builder =
            QueryBuilder::new(format!("SELECT {} FROM transactions", TRANSACTION_COLUMNS));
        push_filter(&mut query_builder, user, &filter);
        query_builder.push(" ORDER BY occurred_at DESC, id DESC");
        if let Some(po) = page_options {
            query_builder
                .push(" OFFSET ")
                .push_bind(po.offset)
                .push(" LIMIT ")
                .push_bind(po.limit);
        }
        let entries: Vec<TransactionEntry> = query_builder
            .build_query_as::<TransactionEntry>()
            .fetch_all(&mut *conn)
            .await
            .with_context(|| format!("Unable to get transactions for user {}", user))?;

        let transactions = Self::attach_tags(&mut conn, entries).await?;
        Ok(TransactionPage {
            transactions,
            total,
        })
    }

    #[instrument(skip(self, new_transaction))]
    async fn create_new_transaction(
        &self,
        user: UserId,
        new_transaction: NewTransaction,
    ) -> Result<Transaction, TransactionRepoError> {
        let mut db_transaction = self
            .pool
            .begin()
            .await
            .context("Unable to begin transaction")?;

        let id: i32 = query_scalar(
            "INSERT INTO transactions(user_id, amount_minor, currency, direction, occurred_at, description, merchant) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
        )
        .bind(user)
        .bind(new_transaction.amount_minor)
        .bind(&new_transaction.currency)
        .bind(new_transaction.direction.as_str())
        .bind(new_transaction.occurred_at)
        .bind(&new_transaction.description)
        .bind(&new_transaction.merchant)
        .fetch_one(&mut *db_transaction)
        .await
        .context("Unable to insert transaction")?;

        Self::link_tag(&mut db_transaction, user, id, new_transaction.tag_id).await?;

        let transaction = Self::fetch_transaction(&mut db_transaction, user, id)
            .await?
            .ok_or(TransactionNotFound(id))?;

        db_transaction
            .commit()
            .await
            .context("Unable to commit transaction")?;
        Ok(transaction)
    }

    #[instrument(skip(self, updated_transaction))]
    async fn update_transaction(
        &self,
        user: UserId,
        transaction_id: i32,
        updated_transaction: NewTransaction,
    ) -> Result<Transaction, TransactionRepoError> {
        let mut db_transaction = self
            .pool
            .begin()
            .await
            .context("Unable to begin transaction")?;

        let result = query(
            "UPDATE transactions SET amount_minor = $1, currency = $2, direction = $3, occurred_at = $4, \
             description = $5, merchant = $6, updated_at = LOCALTIMESTAMP WHERE user_id = $7 AND id = $8",
        )
        .bind(updated_transaction.amount_minor)
        .bind(&updated_transaction.currency)
        .bind(updated_transaction.direction.as_str())
        .bind(updated_transaction.occurred_at)
        .bind(&updated_transaction.description)
        .bind(&updated_transaction.merchant)
        .bind(user)
        .bind(transaction_id)
        .execute(&mut *db_transaction)
        .await
        .with_context(|| format!("Unable to update transaction {}", transaction_id))?;
        if result.rows_affected() == 0 {
            return Err(TransactionNotFound(transaction_id));
        }

        query("DELETE FROM transaction_tags WHERE transaction_id = $1")
            .bind(transaction_id)
            .execute(&mut *db_transaction)
            .await
            .with_context(|| format!("Unable to untag transaction {}", transaction_id))?;
        Self::link_tag(
            &mut db_transaction,
            user,
            transaction_id,
            updated_transaction.tag_id,
        )
        .await?;

        let transaction = Self::fetch_transaction(&mut db_transaction, user, transaction_id)
            .await?
            .ok_or(TransactionNotFound(transaction_id))?;

        db_transaction
            .commit()
            .await
            .context("Unable to commit transaction")?;
        Ok(transaction)
    }

    #[instrument(skip(self))]
    async fn delete_transaction(
        &self,
        user: UserId,
        transaction_id: i32,
    ) -> Result<Transaction, TransactionRepoError> {
        let mut db_transaction = self
            .pool
            .begin()
            .await
            .context("Unable to begin transaction")?;

        let transaction = Self::fetch_transaction(&mut db_transaction, user, transaction_id)
            .await?
            .ok_or(TransactionNotFound(transaction_id))?;

        query("DELETE FROM transactions WHERE user_id = $1 AND id = $2")
            .bind(user)
            .bind(transaction_id)
            .execute(&mut *db_transaction)
            .await
            .with_context(|| format!("Unable to delete transaction {}", transaction_id))?;

        db_transaction
            .commit()
            .await
            .context("Unable to commit transaction")?;
        Ok(transaction)
    }
}
