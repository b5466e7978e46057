use crate::sqlx_repo::{is_unique_violation, SQLxRepo};
use crate::tag_repo::TagRepoError::{GlobalTag, SlugAlreadyExists, TagNotFound};
use crate::tag_repo::{NewTag, Tag, TagRepo, TagRepoError, TagUpdate};
use crate::user_repo::UserId;
use anyhow::Context;
use async_trait::async_trait;
use sqlx::{query_as, PgConnection};
use tracing::instrument;

const TAG_COLUMNS: &str =
    "id, user_id, name, slug, color, icon, is_default, archived_at, created_at";

impl SQLxRepo {
    /// Locks the tag row and checks that `user` may modify it
    #[instrument(skip(conn))]
    async fn get_owned_tag_for_update(
        conn: &mut PgConnection,
        user: UserId,
        tag_id: i32,
    ) -> Result<Tag, TagRepoError> {
        let tag: Option<Tag> = query_as(&format!(
            "SELECT {} FROM tags WHERE id = $1 AND (user_id = $2 OR user_id IS NULL) FOR UPDATE",
            TAG_COLUMNS
        ))
        .bind(tag_id)
        .bind(user)
        .fetch_optional(conn)
        .await
        .with_context(|| format!("Unable to get tag {}", tag_id))?;

        let tag = tag.ok_or(TagNotFound(tag_id))?;
        if tag.is_global() {
            return Err(GlobalTag(tag_id));
        }
        Ok(tag)
    }
}

#[async_trait]
impl TagRepo for SQLxRepo {
    #[instrument(skip(self))]
    async fn get_visible_tags(&self, user: UserId) -> Result<Vec<Tag>, TagRepoError> {
        let tags: Vec<Tag> = query_as(&format!(
            "SELECT {} FROM tags WHERE (user_id = $1 OR user_id IS NULL) AND archived_at IS NULL \
             ORDER BY is_default DESC, (user_id IS NULL) DESC, name ASC, id ASC",
            TAG_COLUMNS
        ))
        .bind(user)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Unable to get tags for user {}", user))?;
        Ok(tags)
    }

    #[instrument(skip(self))]
    async fn get_tag(&self, user: UserId, tag_id: i32) -> Result<Tag, TagRepoError> {
        let tag: Option<Tag> = query_as(&format!(
            "SELECT {} FROM tags WHERE id = $1 AND (user_id = $2 OR user_id IS NULL)",
            TAG_COLUMNS
        ))
        .bind(tag_id)
        .bind(user)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Unable to get tag {}", tag_id))?;
        tag.ok_or(TagNotFound(tag_id))
    }

    #[instrument(skip(self))]
    async fn create_tag(&self, user: UserId, new_tag: NewTag) -> Result<Tag, TagRepoError> {
        let result = query_as::<_, Tag>(&format!(
            "INSERT INTO tags(user_id, name, slug, color, icon) VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            TAG_COLUMNS
        ))
        .bind(user)
        .bind(&new_tag.name)
        .bind(&new_tag.slug)
        .bind(&new_tag.color)
        .bind(&new_tag.icon)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(tag) => Ok(tag),
            Err(e) if is_unique_violation(&e) => Err(SlugAlreadyExists(new_tag.slug)),
            Err(e) => Err(anyhow::Error::new(e)
                .context("Unable to insert tag")
                .into()),
        }
    }

    #[instrument(skip(self))]
    async fn update_tag(
        &self,
        user: UserId,
        tag_id: i32,
        update: TagUpdate,
    ) -> Result<Tag, TagRepoError> {
        let mut db_transaction = self
            .pool
            .begin()
            .await
            .context("Unable to begin transaction")?;

        Self::get_owned_tag_for_update(&mut db_transaction, user, tag_id).await?;

        let result = query_as::<_, Tag>(&format!(
            "UPDATE tags SET name = COALESCE($1, name), slug = COALESCE($2, slug), \
             color = COALESCE($3, color), icon = COALESCE($4, icon), \
             archived_at = CASE WHEN $5::BOOLEAN IS NULL THEN archived_at \
                                WHEN $5::BOOLEAN THEN COALESCE(archived_at, LOCALTIMESTAMP) \
                                ELSE NULL END \
             WHERE id = $6 RETURNING {}",
            TAG_COLUMNS
        ))
        .bind(&update.name)
        .bind(&update.slug)
        .bind(&update.color)
        .bind(&update.icon)
        .bind(update.archived)
        .bind(tag_id)
        .fetch_one(&mut *db_transaction)
        .await;

        let tag = match result {
            Ok(tag) => tag,
            Err(e) if is_unique_violation(&e) => {
                return Err(SlugAlreadyExists(update.slug.unwrap_or_default()))
            }
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("Unable to update tag {}", tag_id))
                    .into())
            }
        };

        db_transaction
            .commit()
            .await
            .context("Unable to commit transaction")?;
        Ok(tag)
    }

    #[instrument(skip(self))]
    async fn delete_tag(&self, user: UserId, tag_id: i32) -> Result<Tag, TagRepoError> {
        let mut db_transaction = self
            .pool
            .begin()
            .await
            .context("Unable to begin transaction")?;

        Self::get_owned_tag_for_update(&mut db_transaction, user, tag_id).await?;

        // transaction_tags and budget_categories rows go with it through ON DELETE CASCADE
        let tag: Tag = query_as(&format!(
            "DELETE FROM tags WHERE id = $1 RETURNING {}",
            TAG_COLUMNS
        ))
        .bind(tag_id)
        .fetch_one(&mut *db_transaction)
        .await
        .with_context(|| format!("Unable to delete tag {}", tag_id))?;

        db_transaction
            .commit()
            .await
            .context("Unable to commit transaction")?;
        Ok(tag)
    }
}
