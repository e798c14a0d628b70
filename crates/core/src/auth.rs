use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{AppError, UserId};

/// Closed set of roles a caller can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Academy administrator with universal ownership.
    Admin,
    /// Teacher owning zero or more batches.
    Teacher,
    /// Parent owning one or more students.
    Parent,
}

impl Role {
    /// Returns the stable storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Teacher => "TEACHER",
            Self::Parent => "PARENT",
        }
    }

    /// Returns all known roles.
    #[must_use]
    pub fn all() -> &'static [Self] {
        &[Self::Admin, Self::Teacher, Self::Parent]
    }
}

impl Display for Role {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ADMIN" => Ok(Self::Admin),
            "TEACHER" => Ok(Self::Teacher),
            "PARENT" => Ok(Self::Parent),
            _ => Err(AppError::Validation(format!("unknown role value '{value}'"))),
        }
    }
}

/// Authenticated identity making a request.
///
/// Established by the session layer and treated as trusted input by the
/// authorization guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    id: UserId,
    role: Role,
}

impl Caller {
    /// Creates a caller identity.
    #[must_use]
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    /// Returns the caller's user id.
    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Returns the caller's role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::Role;

    #[test]
    fn role_roundtrip_storage_value() {
        for role in Role::all() {
            let restored = Role::from_str(role.as_str());
            assert!(matches!(restored, Ok(value) if value == *role));
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(Role::from_str("SUPERUSER").is_err());
        assert!(Role::from_str("admin").is_err());
    }
}
