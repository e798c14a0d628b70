//! Scoped student access.

use std::sync::Arc;

use academy_core::{AppError, AppResult, Caller, FieldViolation, Role, UserId};
use academy_domain::{
    ActivityAction, BatchId, EmailAddress, Permission, Student, StudentId, StudentInput,
    UserAccount,
};
use tracing::info;

use crate::{
    ActivityService, AuthorizationService, Page, PageRequest, ResourceScope, ScopedQuery, Sort,
    StudentFilter, StudentRepository, StudentSortField, UserRepository,
};

/// How a student write identifies the owning parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentReference {
    /// An existing PARENT account.
    Existing(UserId),
    /// A parent identified by email, created on first use.
    Email {
        /// Parent email address.
        email: String,
        /// Display name used if the account has to be created.
        display_name: String,
    },
}

/// Student attributes accepted by create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentWrite {
    /// Student full name.
    pub name: String,
    /// Curriculum level.
    pub level: String,
    /// Whether the student is enrolled.
    pub is_active: bool,
    /// Owning parent.
    pub parent: ParentReference,
    /// Batch the student attends.
    pub batch_id: Option<BatchId>,
}

/// Application service for students.
#[derive(Clone)]
pub struct StudentService {
    authorization_service: AuthorizationService,
    scope: Arc<dyn ResourceScope>,
    repository: Arc<dyn StudentRepository>,
    user_repository: Arc<dyn UserRepository>,
    activity_service: ActivityService,
}

impl StudentService {
    /// Creates a new student service.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        scope: Arc<dyn ResourceScope>,
        repository: Arc<dyn StudentRepository>,
        user_repository: Arc<dyn UserRepository>,
        activity_service: ActivityService,
    ) -> Self {
        Self {
            authorization_service,
            scope,
            repository,
            user_repository,
            activity_service,
        }
    }

    /// Lists students visible to the caller.
    pub async fn list(
        &self,
        caller: &Caller,
        filter: StudentFilter,
        sort: Sort<StudentSortField>,
        page: PageRequest,
    ) -> AppResult<Page<Student>> {
        AuthorizationService::require_permission(caller, Permission::StudentRead)?;
        let query = ScopedQuery::new(self.scope.predicate_for(caller), filter, sort, page);
        self.repository.list_students(&query).await
    }

    /// Returns one student visible to the caller.
    pub async fn get(&self, caller: &Caller, student_id: StudentId) -> AppResult<Student> {
        AuthorizationService::require_permission(caller, Permission::StudentRead)?;
        self.find_in_scope(caller, student_id).await
    }

    /// Creates a student, resolving or creating the parent account.
    pub async fn create(&self, caller: &Caller, input: StudentWrite) -> AppResult<Student> {
        self.authorization_service
            .authorize_write(caller, Permission::StudentWrite)
            .await?;
        Student::validate_profile(&input.name, &input.level)?;

        let (student, created_parent) = self
            .store(StudentId::new(), &input, StoreMode::Insert)
            .await?;

        info!(caller_id = %caller.id(), student_id = %student.id(), "student created");
        self.activity_service
            .record(caller, ActivityAction::StudentCreated, "student", student.id(), None)
            .await;
        if created_parent {
            self.activity_service
                .record(
                    caller,
                    ActivityAction::ParentAccountCreated,
                    "user",
                    student.parent_id(),
                    Some(format!("created while enrolling student '{}'", student.id())),
                )
                .await;
            self.activity_service
                .notify_user(
                    student.parent_id(),
                    "Welcome to the academy",
                    &format!(
                        "{} has been enrolled. You can now sign in to follow their progress.",
                        student.name()
                    ),
                )
                .await;
        }

        Ok(student)
    }

    /// Replaces a student's attributes.
    pub async fn update(
        &self,
        caller: &Caller,
        student_id: StudentId,
        input: StudentWrite,
    ) -> AppResult<Student> {
        self.authorization_service
            .authorize_write(caller, Permission::StudentWrite)
            .await?;
        self.find_in_scope(caller, student_id).await?;
        Student::validate_profile(&input.name, &input.level)?;

        let (student, created_parent) = self.store(student_id, &input, StoreMode::Update).await?;

        self.activity_service
            .record(caller, ActivityAction::StudentUpdated, "student", student_id, None)
            .await;
        if created_parent {
            self.activity_service
                .record(
                    caller,
                    ActivityAction::ParentAccountCreated,
                    "user",
                    student.parent_id(),
                    None,
                )
                .await;
        }

        Ok(student)
    }

    /// Deletes a student with no attendance or fee history.
    pub async fn delete(&self, caller: &Caller, student_id: StudentId) -> AppResult<()> {
        self.authorization_service
            .authorize_write(caller, Permission::StudentWrite)
            .await?;
        self.find_in_scope(caller, student_id).await?;
        self.repository.delete_student(student_id).await?;

        self.activity_service
            .record(caller, ActivityAction::StudentDeleted, "student", student_id, None)
            .await;
        Ok(())
    }

    async fn find_in_scope(&self, caller: &Caller, student_id: StudentId) -> AppResult<Student> {
        self.repository
            .find_student(&self.scope.predicate_for(caller), student_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "{} '{student_id}' does not exist",
                    self.scope.resource()
                ))
            })
    }

    /// Writes the student together with any parent account it needs.
    ///
    /// Returns whether a parent account was created.
    async fn store(
        &self,
        student_id: StudentId,
        input: &StudentWrite,
        mode: StoreMode,
    ) -> AppResult<(Student, bool)> {
        let mut parent = self.resolve_parent(&input.parent).await?;
        loop {
            let student = Student::new(
                student_id,
                StudentInput {
                    name: input.name.clone(),
                    level: input.level.clone(),
                    is_active: input.is_active,
                    parent_id: parent.id(),
                    batch_id: input.batch_id,
                },
            )?;
            let new_parent = parent.new_account();
            let creates_parent = new_parent.is_some();
            let stored = match mode {
                StoreMode::Insert => self.repository.insert_student(&student, new_parent).await,
                StoreMode::Update => self.repository.update_student(&student, new_parent).await,
            };

            match stored {
                Ok(()) => return Ok((student, creates_parent)),
                Err(AppError::Conflict(message)) if creates_parent => {
                    // Another write may have created this parent first; reuse it.
                    match self.resolve_parent(&input.parent).await? {
                        ResolvedParent::Existing(parent_id) => {
                            parent = ResolvedParent::Existing(parent_id);
                        }
                        ResolvedParent::New(_) => return Err(AppError::Conflict(message)),
                    }
                }
                Err(error) => return Err(error),
            }
        }
    }

    async fn resolve_parent(&self, parent: &ParentReference) -> AppResult<ResolvedParent> {
        match parent {
            ParentReference::Existing(parent_id) => {
                let account = self.user_repository.find_user(*parent_id).await?;
                match account {
                    Some(account) if account.role() == Role::Parent => {
                        Ok(ResolvedParent::Existing(account.id()))
                    }
                    Some(_) => Err(AppError::InvalidFields(vec![FieldViolation::new(
                        "parent_id",
                        "must reference a parent account",
                    )])),
                    None => Err(AppError::InvalidFields(vec![FieldViolation::new(
                        "parent_id",
                        "does not exist",
                    )])),
                }
            }
            ParentReference::Email {
                email,
                display_name,
            } => {
                let email = EmailAddress::new(email.as_str()).map_err(|_| {
                    AppError::InvalidFields(vec![FieldViolation::new(
                        "parent_email",
                        "must be a valid email address",
                    )])
                })?;

                match self.user_repository.find_user_by_email(&email).await? {
                    Some(account) if account.role() == Role::Parent => {
                        Ok(ResolvedParent::Existing(account.id()))
                    }
                    Some(account) => Err(AppError::Conflict(format!(
                        "email '{}' belongs to a {} account",
                        email.as_str(),
                        account.role()
                    ))),
                    None => {
                        let display_name = match display_name.trim() {
                            "" => email.as_str(),
                            trimmed => trimmed,
                        };
                        let account = UserAccount::new(
                            UserId::new(),
                            display_name,
                            email.as_str(),
                            Role::Parent,
                        )?;
                        Ok(ResolvedParent::New(account))
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum StoreMode {
    Insert,
    Update,
}

/// Parent side of a student write.
enum ResolvedParent {
    Existing(UserId),
    New(UserAccount),
}

impl ResolvedParent {
    fn id(&self) -> UserId {
        match self {
            Self::Existing(parent_id) => *parent_id,
            Self::New(account) => account.id(),
        }
    }

    fn new_account(&self) -> Option<&UserAccount> {
        match self {
            Self::Existing(_) => None,
            Self::New(account) => Some(account),
        }
    }
}
