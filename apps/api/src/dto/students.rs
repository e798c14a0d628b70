use academy_application::{
    PageRequest, ParentReference, Sort, StudentFilter, StudentSortField, StudentWrite,
};
use academy_core::{AppResult, UserId};
use academy_domain::{BatchId, Student};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::common::{invalid_field, parse_bool, parse_field, parse_optional, parse_sort};

/// Query parameters accepted by the student listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub batch_id: Option<String>,
    pub parent_id: Option<String>,
    pub is_active: Option<String>,
    pub level: Option<String>,
    pub search: Option<String>,
}

impl StudentListQuery {
    /// Splits the query into filter, sort and page.
    pub fn into_parts(self) -> AppResult<(StudentFilter, Sort<StudentSortField>, PageRequest)> {
        let filter = StudentFilter {
            batch_id: parse_optional("batch_id", self.batch_id.as_deref(), BatchId::parse)?,
            parent_id: parse_optional("parent_id", self.parent_id.as_deref(), UserId::parse)?,
            is_active: parse_optional("is_active", self.is_active.as_deref(), parse_bool)?,
            level: self.level.filter(|level| !level.trim().is_empty()),
            search: self.search.filter(|search| !search.trim().is_empty()),
        };
        let sort = parse_sort(
            self.sort.as_deref(),
            self.order.as_deref(),
            StudentSortField::parse_transport,
        )?;

        Ok((filter, sort, PageRequest::new(self.page, self.limit)))
    }
}

/// Incoming payload for student create and update.
///
/// Exactly one of `parentId` and `parentEmail` identifies the parent.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/student-request.ts"
)]
pub struct StudentRequest {
    pub name: String,
    pub level: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[ts(optional)]
    pub parent_id: Option<String>,
    #[ts(optional)]
    pub parent_email: Option<String>,
    #[ts(optional)]
    pub parent_name: Option<String>,
    #[ts(optional)]
    pub batch_id: Option<String>,
}

fn default_active() -> bool {
    true
}

impl StudentRequest {
    /// Validates transport fields and builds the service input.
    pub fn into_write(self) -> AppResult<StudentWrite> {
        let parent_id = self.parent_id.filter(|value| !value.trim().is_empty());
        let parent_email = self.parent_email.filter(|value| !value.trim().is_empty());
        let parent = match (parent_id, parent_email) {
            (Some(parent_id), None) => {
                ParentReference::Existing(parse_field("parent_id", &parent_id, UserId::parse)?)
            }
            (None, Some(email)) => ParentReference::Email {
                email,
                display_name: self.parent_name.unwrap_or_default(),
            },
            _ => {
                return Err(invalid_field(
                    "parent_id",
                    "provide exactly one of parentId or parentEmail",
                ));
            }
        };

        Ok(StudentWrite {
            name: self.name,
            level: self.level,
            is_active: self.is_active,
            parent,
            batch_id: parse_optional("batch_id", self.batch_id.as_deref(), BatchId::parse)?,
        })
    }
}

/// API representation of a student.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/student-response.ts"
)]
pub struct StudentResponse {
    pub id: String,
    pub name: String,
    pub level: String,
    pub is_active: bool,
    pub parent_id: String,
    pub batch_id: Option<String>,
}

impl From<Student> for StudentResponse {
    fn from(student: Student) -> Self {
        Self {
            id: student.id().to_string(),
            name: student.name().to_owned(),
            level: student.level().to_owned(),
            is_active: student.is_active(),
            parent_id: student.parent_id().to_string(),
            batch_id: student.batch_id().map(|batch_id| batch_id.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use academy_application::ParentReference;
    use academy_core::AppError;

    use super::StudentRequest;

    fn request() -> StudentRequest {
        StudentRequest {
            name: "Asha".to_owned(),
            level: "L1".to_owned(),
            is_active: true,
            parent_id: None,
            parent_email: None,
            parent_name: None,
            batch_id: None,
        }
    }

    #[test]
    fn parent_must_be_given_exactly_once() {
        assert!(matches!(
            request().into_write(),
            Err(AppError::InvalidFields(_))
        ));

        let mut both = request();
        both.parent_id = Some("0b8f7d1e-5c1a-4b7e-9d33-3f0c2a6f8d11".to_owned());
        both.parent_email = Some("parent@example.com".to_owned());
        assert!(matches!(both.into_write(), Err(AppError::InvalidFields(_))));
    }

    #[test]
    fn parent_email_becomes_an_email_reference() {
        let mut by_email = request();
        by_email.parent_email = Some("Parent@Example.com".to_owned());

        let write = by_email.into_write();
        assert!(matches!(
            write,
            Ok(ref write) if matches!(
                write.parent,
                ParentReference::Email { ref email, .. } if email == "Parent@Example.com"
            )
        ));
    }

    #[test]
    fn malformed_batch_id_is_a_field_error() {
        let mut invalid = request();
        invalid.parent_email = Some("parent@example.com".to_owned());
        invalid.batch_id = Some("not-a-uuid".to_owned());

        let result = invalid.into_write();
        assert!(matches!(result, Err(AppError::InvalidFields(ref v)) if v[0].field == "batch_id"));
    }
}
