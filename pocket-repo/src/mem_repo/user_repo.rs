use crate::mem_repo::{now, MemRepo};
use crate::user_repo::UserRepoError::{EmailAlreadyExists, UserNotFound};
use crate::user_repo::{NewUser, User, UserId, UserRepo, UserRepoError};
use async_trait::async_trait;

#[async_trait]
impl UserRepo for MemRepo {
    async fn get_user(&self, user_id: UserId) -> Result<User, UserRepoError> {
        let read_guard = self.read_lock()?;

        read_guard
            .users
            .get(&user_id)
            .cloned()
            .ok_or_else(|| UserNotFound(user_id.to_string()))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<User, UserRepoError> {
        let read_guard = self.read_lock()?;

        read_guard
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| UserNotFound(email.to_owned()))
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, UserRepoError> {
        let mut write_guard = self.write_lock()?;

        if write_guard.users.values().any(|u| u.email == new_user.email) {
            return Err(EmailAlreadyExists(new_user.email));
        }

        let id = write_guard.next_user_id;
        write_guard.next_user_id += 1;

        let user = User {
            id,
            email: new_user.email,
            name: new_user.name,
            password_hash: new_user.password_hash,
            created_at: now(),
        };
        write_guard.users.insert(id, user.clone());
        Ok(user)
    }

    async fn update_profile(
        &self,
        user_id: UserId,
        name: &str,
        email: &str,
    ) -> Result<User, UserRepoError> {
        let mut write_guard = self.write_lock()?;

        if write_guard
            .users
            .values()
            .any(|u| u.email == email && u.id != user_id)
        {
            return Err(EmailAlreadyExists(email.to_owned()));
        }

        let user = write_guard
            .users
            .get_mut(&user_id)
            .ok_or_else(|| UserNotFound(user_id.to_string()))?;
        user.name = name.to_owned();
        user.email = email.to_owned();
        Ok(user.clone())
    }

    async fn update_password_hash(
        &self,
        user_id: UserId,
        password_hash: &str,
    ) -> Result<(), UserRepoError> {
        let mut write_guard = self.write_lock()?;

        let user = write_guard
            .users
            .get_mut(&user_id)
            .ok_or_else(|| UserNotFound(user_id.to_string()))?;
        user.password_hash = password_hash.to_owned();
        Ok(())
    }

    async fn delete_user(&self, user_id: UserId) -> Result<(), UserRepoError> {
        let mut write_guard = self.write_lock()?;

        if write_guard.users.remove(&user_id).is_none() {
            return Err(UserNotFound(user_id.to_string()));
        }

        // Mirror ON DELETE CASCADE
        let state = &mut *write_guard;
        let transaction_ids: Vec<i32> = state
            .transactions
            .iter()
            .filter(|(_, t)| t.user_id == user_id)
            .map(|(id, _)| *id)
            .collect();
        for id in &transaction_ids {
            state.transactions.remove(id);
        }
        state
            .transaction_tags
            .retain(|(transaction_id, _)| !transaction_ids.contains(transaction_id));

        let tag_ids: Vec<i32> = state
            .tags
            .values()
            .filter(|t| t.user_id == Some(user_id))
            .map(|t| t.id)
            .collect();
        for id in &tag_ids {
            state.tags.remove(id);
        }
        state
            .transaction_tags
            .retain(|(_, tag_id)| !tag_ids.contains(tag_id));

        let budget_ids: Vec<i32> = state
            .budgets
            .iter()
            .filter(|(_, b)| b.user_id == user_id)
            .map(|(id, _)| *id)
            .collect();
        for id in &budget_ids {
            state.budgets.remove(id);
        }
        state.budget_categories.retain(|_, c| {
            !budget_ids.contains(&c.budget_id) && !tag_ids.contains(&c.tag_id)
        });

        Ok(())
    }
}
