use crate::user_repo::UserId;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, sqlx::FromRow)]
pub struct Tag {
    pub id: i32,
    pub user_id: Option<UserId>,
    pub name: String,
    pub slug: String,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub is_default: bool,
    pub archived_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl Tag {
    /// Global tags belong to no user and are read-only
    pub fn is_global(&self) -> bool {
        self.user_id.is_none()
    }

    pub fn is_visible_to(&self, user: UserId) -> bool {
        self.user_id.map_or(true, |owner| owner == user)
    }

    /// Listing order: defaults first, then global tags, then by name
    pub fn listing_order(&self, other: &Tag) -> Ordering {
        other
            .is_default
            .cmp(&self.is_default)
            .then_with(|| other.is_global().cmp(&self.is_global()))
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| self.id.cmp(&other.id))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NewTag {
    pub name: String,
    pub slug: String,
    pub color: Option<String>,
    pub icon: Option<String>,
}

impl NewTag {
    pub fn new(name: String, slug: String, color: Option<String>, icon: Option<String>) -> Self {
        NewTag {
            name,
            slug,
            color,
            icon,
        }
    }
}

/// Partial update. `None` leaves the field unchanged.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct TagUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub archived: Option<bool>,
}

#[derive(Error, Debug)]
pub enum TagRepoError {
    #[error("Tag with id {0} not found")]
    TagNotFound(i32),
    #[error("Tag with id {0} is global and cannot be modified")]
    GlobalTag(i32),
    #[error("Tag with slug {0} already exists")]
    SlugAlreadyExists(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[async_trait]
pub trait TagRepo: Sync + Send {
    /// Tags owned by `user` plus global tags, archived ones excluded, in listing order
    async fn get_visible_tags(&self, user: UserId) -> Result<Vec<Tag>, TagRepoError>;

    async fn get_tag(&self, user: UserId, tag_id: i32) -> Result<Tag, TagRepoError>;

    async fn create_tag(&self, user: UserId, new_tag: NewTag) -> Result<Tag, TagRepoError>;

    async fn update_tag(
        &self,
        user: UserId,
        tag_id: i32,
        update: TagUpdate,
    ) -> Result<Tag, TagRepoError>;

    /// Removes the tag along with its transaction links and budget allocations
    async fn delete_tag(&self, user: UserId, tag_id: i32) -> Result<Tag, TagRepoError>;
}
