use pocket_repo::user_repo::{NewUser, UserId, UserRepo};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub struct TestUser {
    pub id: UserId,
    pub email: String,
    repo: Arc<dyn UserRepo>,
}

impl TestUser {
    pub async fn new(user_repo: &Arc<dyn UserRepo>) -> TestUser {
        let email = format!("test-user-{}@example.com", Uuid::new_v4());
        let new_user = NewUser::new(
            email.clone(),
            "Test User".to_owned(),
            "not a real hash".to_owned(),
        );
        let user = user_repo.create_user(new_user).await.unwrap();
        info!(user_id = user.id, %email, "Created user");
        TestUser {
            id: user.id,
            email,
            repo: user_repo.clone(),
        }
    }

    pub async fn delete(&self) {
        self.repo.delete_user(self.id).await.unwrap()
    }
}
