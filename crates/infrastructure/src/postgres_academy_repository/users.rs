use academy_application::UserRepository;
use academy_domain::EmailAddress;
use async_trait::async_trait;
use sqlx::PgConnection;

use super::*;

const USER_COLUMNS: &str = "id, display_name, email, role";

/// Inserts an account; a taken email hits the `lower(email)` index as a conflict.
pub(super) async fn insert_account(
    connection: &mut PgConnection,
    account: &UserAccount,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO users (id, display_name, email, role)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(account.id().as_uuid())
    .bind(account.display_name().as_str())
    .bind(account.email().as_str())
    .bind(account.role().as_str())
    .execute(&mut *connection)
    .await
    .map_err(|error| write_error(error, "insert user"))?;

    Ok(())
}

#[async_trait]
impl UserRepository for PostgresAcademyRepository {
    async fn find_user(&self, user_id: UserId) -> AppResult<Option<UserAccount>> {
        sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| read_error(error, "find user"))?
            .map(UserAccount::try_from)
            .transpose()
    }

    async fn find_user_by_email(&self, email: &EmailAddress) -> AppResult<Option<UserAccount>> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| read_error(error, "find user by email"))?
        .map(UserAccount::try_from)
        .transpose()
    }

    async fn insert_user(&self, account: &UserAccount) -> AppResult<()> {
        let mut connection = self
            .pool
            .acquire()
            .await
            .map_err(|error| read_error(error, "acquire user connection"))?;

        insert_account(&mut *connection, account).await
    }
}
