use crate::mem_repo::{now, MemRepo};
use crate::tag_repo::TagRepoError::{GlobalTag, SlugAlreadyExists, TagNotFound};
use crate::tag_repo::{NewTag, Tag, TagRepo, TagRepoError, TagUpdate};
use crate::user_repo::UserId;
use async_trait::async_trait;

#[async_trait]
impl TagRepo for MemRepo {
    async fn get_visible_tags(&self, user: UserId) -> Result<Vec<Tag>, TagRepoError> {
        let read_guard = self.read_lock()?;

        let mut tags: Vec<Tag> = read_guard
            .tags
            .values()
            .filter(|t| t.is_visible_to(user) && t.archived_at.is_none())
            .cloned()
            .collect();
        tags.sort_by(|a, b| a.listing_order(b));
        Ok(tags)
    }

    async fn get_tag(&self, user: UserId, tag_id: i32) -> Result<Tag, TagRepoError> {
        let read_guard = self.read_lock()?;

        read_guard
            .visible_tag(user, tag_id)
            .cloned()
            .ok_or(TagNotFound(tag_id))
    }

    async fn create_tag(&self, user: UserId, new_tag: NewTag) -> Result<Tag, TagRepoError> {
        let mut write_guard = self.write_lock()?;

        if write_guard
            .tags
            .values()
            .any(|t| t.user_id == Some(user) && t.slug == new_tag.slug)
        {
            return Err(SlugAlreadyExists(new_tag.slug));
        }

        let id = write_guard.next_tag_id;
        write_guard.next_tag_id += 1;

        let tag = Tag {
            id,
            user_id: Some(user),
            name: new_tag.name,
            slug: new_tag.slug,
            color: new_tag.color,
            icon: new_tag.icon,
            is_default: false,
            archived_at: None,
            created_at: now(),
        };
        write_guard.tags.insert(id, tag.clone());
        Ok(tag)
    }

    async fn update_tag(
        &self,
        user: UserId,
        tag_id: i32,
        update: TagUpdate,
    ) -> Result<Tag, TagRepoError> {
        let mut write_guard = self.write_lock()?;

        let tag = write_guard
            .visible_tag(user, tag_id)
            .ok_or(TagNotFound(tag_id))?;
        if tag.is_global() {
            return Err(GlobalTag(tag_id));
        }

        if let Some(slug) = &update.slug {
            if write_guard
                .tags
                .values()
                .any(|t| t.user_id == Some(user) && &t.slug == slug && t.id != tag_id)
            {
                return Err(SlugAlreadyExists(slug.clone()));
            }
        }

        let tag = write_guard
            .tags
            .get_mut(&tag_id)
            .ok_or(TagNotFound(tag_id))?;
        if let Some(name) = update.name {
            tag.name = name;
        }
        if let Some(slug) = update.slug {
            tag.slug = slug;
        }
        if let Some(color) = update.color {
            tag.color = Some(color);
        }
        if let Some(icon) = update.icon {
            tag.icon = Some(icon);
        }
        match update.archived {
            Some(true) if tag.archived_at.is_none() => tag.archived_at = Some(now()),
            Some(false) => tag.archived_at = None,
            _ => {}
        }
        Ok(tag.clone())
    }

    async fn delete_tag(&self, user: UserId, tag_id: i32) -> Result<Tag, TagRepoError> {
        let mut write_guard = self.write_lock()?;

        let tag = write_guard
            .visible_tag(user, tag_id)
            .ok_or(TagNotFound(tag_id))?;
        if tag.is_global() {
            return Err(GlobalTag(tag_id));
        }

        let state = &mut *write_guard;
        let tag = state.tags.remove(&tag_id).ok_or(TagNotFound(tag_id))?;
        state.transaction_tags.retain(|(_, t)| *t != tag_id);
        state.budget_categories.retain(|_, c| c.tag_id != tag_id);
        Ok(tag)
    }
}
