use std::fmt::{Display, Formatter};

use academy_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID value.
            #[must_use]
            pub fn from_uuid(value: Uuid) -> Self {
                Self(value)
            }

            /// Parses a transport value into an identifier.
            pub fn parse(value: &str) -> AppResult<Self> {
                Uuid::parse_str(value.trim()).map(Self).map_err(|error| {
                    AppError::Validation(format!(
                        concat!("invalid ", $label, " '{}': {}"),
                        value, error
                    ))
                })
            }

            /// Returns the underlying UUID value.
            #[must_use]
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Display for $name {
            fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
                write!(formatter, "{}", self.0)
            }
        }
    };
}

uuid_identifier!(
    /// Unique identifier for a batch (class group).
    BatchId,
    "batch id"
);

uuid_identifier!(
    /// Unique identifier for a student.
    StudentId,
    "student id"
);

uuid_identifier!(
    /// Unique identifier for a fee record.
    FeeId,
    "fee id"
);

#[cfg(test)]
mod tests {
    use super::{BatchId, StudentId};

    #[test]
    fn parse_accepts_display_output() {
        let batch_id = BatchId::new();
        let parsed = BatchId::parse(batch_id.to_string().as_str());
        assert!(matches!(parsed, Ok(value) if value == batch_id));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(StudentId::parse("not-a-uuid").is_err());
    }
}
