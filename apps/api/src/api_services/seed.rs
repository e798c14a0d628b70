use academy_application::UserRepository;
use academy_core::{AppError, AppResult, Role, UserId};
use academy_domain::{EmailAddress, UserAccount};
use tracing::info;

use crate::api_config::ApiConfig;

/// Ensures the configured admin and teacher accounts exist.
///
/// Staff accounts have no HTTP route, so this is how they are provisioned.
/// An email already held by an account with another role aborts startup.
pub async fn seed_staff_accounts(
    user_repository: &dyn UserRepository,
    config: &ApiConfig,
) -> AppResult<()> {
    if let Some(email) = config.bootstrap_admin_email.as_deref() {
        ensure_account(user_repository, email, Role::Admin).await?;
    }
    for email in &config.bootstrap_teacher_emails {
        ensure_account(user_repository, email, Role::Teacher).await?;
    }

    Ok(())
}

async fn ensure_account(
    user_repository: &dyn UserRepository,
    email: &str,
    role: Role,
) -> AppResult<()> {
    let address = EmailAddress::new(email)?;
    match user_repository.find_user_by_email(&address).await? {
        Some(existing) if existing.role() == role => Ok(()),
        Some(existing) => Err(AppError::Conflict(format!(
            "bootstrap {} '{}' is already registered as {}",
            role.as_str(),
            address.as_str(),
            existing.role().as_str()
        ))),
        None => {
            let account =
                UserAccount::new(UserId::new(), address.as_str(), address.as_str(), role)?;
            user_repository.insert_user(&account).await?;
            info!(user_id = %account.id(), role = role.as_str(), "staff account seeded");
            Ok(())
        }
    }
}
