//! Post-commit side effects: activity log entries and parent notifications.
//!
//! Every method here runs after the owning write has committed. Failures are
//! logged and swallowed so they never change the outcome of the write.

use std::sync::Arc;

use academy_core::{AppResult, Caller, UserId};
use academy_domain::{ActivityAction, Permission, StudentId};
use tracing::warn;

use crate::{
    ActivityEntry, ActivityLogEntry, ActivityLogQuery, ActivityLogRepository,
    AuthorizationService, NotificationSender, ScopePredicate, StudentRepository, UserRepository,
};

/// Largest activity page an admin may request.
const MAX_ACTIVITY_LIMIT: usize = 200;

/// Application service for activity logging and notification fan-out.
#[derive(Clone)]
pub struct ActivityService {
    activity_repository: Arc<dyn ActivityLogRepository>,
    notification_sender: Arc<dyn NotificationSender>,
    student_repository: Arc<dyn StudentRepository>,
    user_repository: Arc<dyn UserRepository>,
}

impl ActivityService {
    /// Creates a new activity service.
    #[must_use]
    pub fn new(
        activity_repository: Arc<dyn ActivityLogRepository>,
        notification_sender: Arc<dyn NotificationSender>,
        student_repository: Arc<dyn StudentRepository>,
        user_repository: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            activity_repository,
            notification_sender,
            student_repository,
            user_repository,
        }
    }

    /// Appends one activity entry, logging instead of failing.
    pub async fn record(
        &self,
        caller: &Caller,
        action: ActivityAction,
        resource_type: &str,
        resource_id: impl ToString,
        detail: Option<String>,
    ) {
        let entry = ActivityEntry {
            actor_id: caller.id(),
            action,
            resource_type: resource_type.to_owned(),
            resource_id: resource_id.to_string(),
            detail,
        };

        if let Err(error) = self.activity_repository.append_entry(entry).await {
            warn!(
                error = %error,
                caller_id = %caller.id(),
                action = action.as_str(),
                "activity log append failed after commit"
            );
        }
    }

    /// Sends a message to the account's email address, logging instead of failing.
    pub async fn notify_user(&self, user_id: UserId, subject: &str, body: &str) {
        if let Err(error) = self.try_notify_user(user_id, subject, body).await {
            warn!(error = %error, user_id = %user_id, subject, "notification delivery failed");
        }
    }

    /// Sends a message to the parent owning `student_id`, logging instead of failing.
    pub async fn notify_parent_of(&self, student_id: StudentId, subject: &str, body: &str) {
        let student = match self
            .student_repository
            .find_student(&ScopePredicate::Unrestricted, student_id)
            .await
        {
            Ok(Some(student)) => student,
            Ok(None) => {
                warn!(student_id = %student_id, "notification skipped for unknown student");
                return;
            }
            Err(error) => {
                warn!(
                    error = %error,
                    student_id = %student_id,
                    "student lookup failed before notification"
                );
                return;
            }
        };

        self.notify_user(student.parent_id(), subject, body).await;
    }

    /// Lists recent activity, newest first. Admin only.
    pub async fn list_recent(
        &self,
        caller: &Caller,
        mut query: ActivityLogQuery,
    ) -> AppResult<Vec<ActivityLogEntry>> {
        AuthorizationService::require_permission(caller, Permission::ActivityLogRead)?;
        query.limit = query.limit.clamp(1, MAX_ACTIVITY_LIMIT);
        self.activity_repository.list_recent_entries(query).await
    }

    async fn try_notify_user(&self, user_id: UserId, subject: &str, body: &str) -> AppResult<()> {
        let Some(account) = self.user_repository.find_user(user_id).await? else {
            warn!(user_id = %user_id, "notification skipped for unknown account");
            return Ok(());
        };

        self.notification_sender
            .send(account.email().as_str(), subject, body)
            .await
    }
}

#[cfg(test)]
mod tests {
    use academy_core::{AppError, Caller, Role, UserId};
    use academy_domain::ActivityAction;

    use crate::ActivityLogQuery;
    use crate::test_support::TestWorld;

    #[tokio::test]
    async fn failing_activity_store_is_swallowed() {
        let world = TestWorld::new();
        world.fail_activity_appends().await;
        let admin = world.admin();

        world
            .activity_service()
            .record(&admin, ActivityAction::BatchCreated, "batch", "b-1", None)
            .await;

        assert!(world.activity_entries().await.is_empty());
    }

    #[tokio::test]
    async fn notification_reaches_parent_email() {
        let world = TestWorld::new();
        let parent = world.add_parent("parent@example.com").await;
        let student = world.add_student(parent.id(), None).await;

        world
            .activity_service()
            .notify_parent_of(student.id(), "Absence", "Asha was absent")
            .await;

        let sent = world.sent_notifications().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "parent@example.com");
    }

    #[tokio::test]
    async fn listing_activity_requires_admin() {
        let world = TestWorld::new();
        let teacher = Caller::new(UserId::new(), Role::Teacher);
        let query = ActivityLogQuery {
            limit: 10,
            offset: 0,
            action: None,
            actor_id: None,
        };

        let result = world.activity_service().list_recent(&teacher, query).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
