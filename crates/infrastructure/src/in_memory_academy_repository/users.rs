use academy_application::UserRepository;
use academy_core::{AppError, AppResult, UserId};
use academy_domain::{EmailAddress, UserAccount};
use async_trait::async_trait;

use super::InMemoryAcademyRepository;

#[async_trait]
impl UserRepository for InMemoryAcademyRepository {
    async fn find_user(&self, user_id: UserId) -> AppResult<Option<UserAccount>> {
        Ok(self.tables.read().await.users.get(&user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &EmailAddress) -> AppResult<Option<UserAccount>> {
        Ok(self
            .tables
            .read()
            .await
            .users
            .values()
            .find(|account| account.email() == email)
            .cloned())
    }

    async fn insert_user(&self, account: &UserAccount) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .values()
            .any(|existing| existing.email() == account.email())
        {
            return Err(AppError::Conflict(
                "an account with this email already exists".to_owned(),
            ));
        }
        if tables.users.contains_key(&account.id()) {
            return Err(AppError::Conflict(format!(
                "account '{}' already exists",
                account.id()
            )));
        }

        tables.users.insert(account.id(), account.clone());
        Ok(())
    }
}
