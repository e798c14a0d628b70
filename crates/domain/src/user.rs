//! User account types and validation rules.

use academy_core::{AppError, AppResult, NonEmptyString, Role, UserId};
use serde::{Deserialize, Serialize};

/// Validated, lowercase email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated email address.
    ///
    /// Performs basic structural validation: non-empty, contains exactly one `@`,
    /// local part and domain are non-empty, domain contains at least one `.`.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_lowercase();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "email address must not be empty".to_owned(),
            ));
        }

        let Some((local, domain)) = trimmed.split_once('@') else {
            return Err(AppError::Validation(
                "email address must contain exactly one '@'".to_owned(),
            ));
        };

        if domain.contains('@') {
            return Err(AppError::Validation(
                "email address must contain exactly one '@'".to_owned(),
            ));
        }

        if local.is_empty() {
            return Err(AppError::Validation(
                "email local part must not be empty".to_owned(),
            ));
        }

        if domain.is_empty() || !domain.contains('.') {
            return Err(AppError::Validation(
                "email domain must contain at least one '.'".to_owned(),
            ));
        }

        if trimmed.len() > 254 {
            return Err(AppError::Validation(
                "email address must not exceed 254 characters".to_owned(),
            ));
        }

        Ok(Self(trimmed))
    }

    /// Returns the validated email string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// Account for a person who can sign in: admin, teacher or parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    id: UserId,
    display_name: NonEmptyString,
    email: EmailAddress,
    role: Role,
}

impl UserAccount {
    /// Creates a validated user account.
    pub fn new(
        id: UserId,
        display_name: impl Into<String>,
        email: impl Into<String>,
        role: Role,
    ) -> AppResult<Self> {
        Ok(Self {
            id,
            display_name: NonEmptyString::new(display_name)?,
            email: EmailAddress::new(email)?,
            role,
        })
    }

    /// Returns the account identifier.
    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &NonEmptyString {
        &self.display_name
    }

    /// Returns the normalized email address.
    #[must_use]
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Returns the account role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }
}

#[cfg(test)]
mod tests {
    use academy_core::{Role, UserId};

    use super::{EmailAddress, UserAccount};

    #[test]
    fn email_is_normalized_to_lowercase() {
        let email = EmailAddress::new("  Parent@Example.COM ");
        assert_eq!(
            email.map(String::from).unwrap_or_default(),
            "parent@example.com"
        );
    }

    #[test]
    fn email_rejects_malformed_values() {
        assert!(EmailAddress::new("").is_err());
        assert!(EmailAddress::new("no-at-sign.example.com").is_err());
        assert!(EmailAddress::new("a@b@example.com").is_err());
        assert!(EmailAddress::new("@example.com").is_err());
        assert!(EmailAddress::new("parent@localhost").is_err());
    }

    #[test]
    fn account_requires_display_name() {
        let account = UserAccount::new(UserId::new(), " ", "p@example.com", Role::Parent);
        assert!(account.is_err());
    }
}
