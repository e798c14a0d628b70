//! Shared fakes for service tests.

use std::collections::BTreeSet;
use std::sync::Arc;

use academy_core::{AppError, AppResult, Caller, Role, UserId};
use academy_domain::{
    AttendanceRecord, Batch, BatchId, BatchInput, DayOfWeek, EmailAddress, FeeId, FeeRecord,
    Student, StudentId, StudentInput, UserAccount,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tokio::sync::Mutex;

use crate::{
    ActivityEntry, ActivityLogEntry, ActivityLogQuery, ActivityLogRepository, ActivityService,
    AttemptInfo, AttendanceLedger, AttendanceQuery, AttendanceScope, AttendanceService,
    AuthorizationService, BatchQuery, BatchRepository, BatchScope, BatchService, FeeQuery,
    FeeRepository, FeeScope, FeeService, NotificationSender, Page, RateLimitRepository,
    RateLimitRule, RateLimitService, ScopePredicate, StudentQuery, StudentRepository,
    StudentScope, StudentService, UserRepository,
};

#[derive(Default)]
pub(crate) struct FakeStore {
    users: Mutex<Vec<UserAccount>>,
    students: Mutex<Vec<Student>>,
    batches: Mutex<Vec<Batch>>,
    fees: Mutex<Vec<FeeRecord>>,
    attendance: Mutex<Vec<AttendanceRecord>>,
    activity: Mutex<Vec<ActivityEntry>>,
    notifications: Mutex<Vec<(String, String, String)>>,
    ledger_calls: Mutex<usize>,
    fail_activity: Mutex<bool>,
}

impl FakeStore {
    async fn student_visible(&self, scope: &ScopePredicate, student: &Student) -> bool {
        match scope {
            ScopePredicate::Unrestricted => true,
            ScopePredicate::ParentOf(parent_id) => student.parent_id() == *parent_id,
            ScopePredicate::TeacherOf(teacher_id) => match student.batch_id() {
                Some(batch_id) => self.batch_taught_by(batch_id, *teacher_id).await,
                None => false,
            },
        }
    }

    async fn batch_taught_by(&self, batch_id: BatchId, teacher_id: UserId) -> bool {
        self.batches
            .lock()
            .await
            .iter()
            .any(|batch| batch.id() == batch_id && batch.is_taught_by(teacher_id))
    }

    async fn batch_visible(&self, scope: &ScopePredicate, batch: &Batch) -> bool {
        match scope {
            ScopePredicate::Unrestricted => true,
            ScopePredicate::TeacherOf(teacher_id) => batch.is_taught_by(*teacher_id),
            ScopePredicate::ParentOf(parent_id) => {
                self.students.lock().await.iter().any(|student| {
                    student.batch_id() == Some(batch.id()) && student.parent_id() == *parent_id
                })
            }
        }
    }

    async fn student_by_id(&self, student_id: StudentId) -> Option<Student> {
        self.students
            .lock()
            .await
            .iter()
            .find(|student| student.id() == student_id)
            .cloned()
    }

    async fn check_references(
        &self,
        student: &Student,
        new_parent: Option<&UserAccount>,
    ) -> AppResult<()> {
        let users = self.users.lock().await;
        if let Some(parent) = new_parent
            && users.iter().any(|user| user.email() == parent.email())
        {
            return Err(AppError::Conflict("email already in use".to_owned()));
        }
        let parent_known = new_parent.is_some_and(|parent| parent.id() == student.parent_id())
            || users.iter().any(|user| user.id() == student.parent_id());
        if !parent_known {
            return Err(AppError::Conflict("unknown parent".to_owned()));
        }
        if let Some(batch_id) = student.batch_id()
            && !self.batches.lock().await.iter().any(|batch| batch.id() == batch_id)
        {
            return Err(AppError::Conflict("unknown batch".to_owned()));
        }
        Ok(())
    }

    async fn fee_visible(&self, scope: &ScopePredicate, fee: &FeeRecord) -> bool {
        match self.student_by_id(fee.student_id()).await {
            Some(student) => self.student_visible(scope, &student).await,
            None => false,
        }
    }

    async fn record_visible(&self, scope: &ScopePredicate, record: &AttendanceRecord) -> bool {
        match scope {
            ScopePredicate::Unrestricted => true,
            ScopePredicate::TeacherOf(teacher_id) => {
                self.batch_taught_by(record.batch_id(), *teacher_id).await
            }
            ScopePredicate::ParentOf(parent_id) => self
                .student_by_id(record.student_id())
                .await
                .is_some_and(|student| student.parent_id() == *parent_id),
        }
    }
}

fn paginate<T>(rows: Vec<T>, request: crate::PageRequest) -> Page<T> {
    let total = rows.len() as u64;
    let data = rows
        .into_iter()
        .skip(request.offset() as usize)
        .take(request.limit() as usize)
        .collect();
    Page::new(data, total, request)
}

#[async_trait]
impl StudentRepository for FakeStore {
    async fn list_students(&self, query: &StudentQuery) -> AppResult<Page<Student>> {
        let students = self.students.lock().await.clone();
        let mut visible = Vec::new();
        for student in students {
            let filter = query.filter();
            if filter.batch_id.is_some_and(|id| student.batch_id() != Some(id)) {
                continue;
            }
            if filter.parent_id.is_some_and(|id| student.parent_id() != id) {
                continue;
            }
            if self.student_visible(query.scope(), &student).await {
                visible.push(student);
            }
        }
        Ok(paginate(visible, query.page()))
    }

    async fn find_student(
        &self,
        scope: &ScopePredicate,
        student_id: StudentId,
    ) -> AppResult<Option<Student>> {
        match self.student_by_id(student_id).await {
            Some(student) if self.student_visible(scope, &student).await => Ok(Some(student)),
            _ => Ok(None),
        }
    }

    async fn insert_student(
        &self,
        student: &Student,
        new_parent: Option<&UserAccount>,
    ) -> AppResult<()> {
        self.check_references(student, new_parent).await?;
        if let Some(parent) = new_parent {
            self.users.lock().await.push(parent.clone());
        }
        self.students.lock().await.push(student.clone());
        Ok(())
    }

    async fn update_student(
        &self,
        student: &Student,
        new_parent: Option<&UserAccount>,
    ) -> AppResult<()> {
        self.check_references(student, new_parent).await?;
        if let Some(parent) = new_parent {
            self.users.lock().await.push(parent.clone());
        }
        let mut students = self.students.lock().await;
        if let Some(stored) = students.iter_mut().find(|stored| stored.id() == student.id()) {
            *stored = student.clone();
        }
        Ok(())
    }

    async fn delete_student(&self, student_id: StudentId) -> AppResult<()> {
        let has_history = self
            .attendance
            .lock()
            .await
            .iter()
            .any(|record| record.student_id() == student_id);
        if has_history {
            return Err(AppError::Conflict("student has attendance".to_owned()));
        }
        self.students
            .lock()
            .await
            .retain(|student| student.id() != student_id);
        Ok(())
    }
}

#[async_trait]
impl BatchRepository for FakeStore {
    async fn list_batches(&self, query: &BatchQuery) -> AppResult<Page<Batch>> {
        let batches = self.batches.lock().await.clone();
        let mut visible = Vec::new();
        for batch in batches {
            if self.batch_visible(query.scope(), &batch).await {
                visible.push(batch);
            }
        }
        Ok(paginate(visible, query.page()))
    }

    async fn find_batch(
        &self,
        scope: &ScopePredicate,
        batch_id: BatchId,
    ) -> AppResult<Option<Batch>> {
        let batch = self
            .batches
            .lock()
            .await
            .iter()
            .find(|batch| batch.id() == batch_id)
            .cloned();
        match batch {
            Some(batch) if self.batch_visible(scope, &batch).await => Ok(Some(batch)),
            _ => Ok(None),
        }
    }

    async fn insert_batch(&self, batch: &Batch) -> AppResult<()> {
        self.batches.lock().await.push(batch.clone());
        Ok(())
    }

    async fn update_batch(&self, batch: &Batch) -> AppResult<()> {
        let mut batches = self.batches.lock().await;
        if let Some(stored) = batches.iter_mut().find(|stored| stored.id() == batch.id()) {
            *stored = batch.clone();
        }
        Ok(())
    }

    async fn delete_batch(&self, batch_id: BatchId) -> AppResult<()> {
        self.batches.lock().await.retain(|batch| batch.id() != batch_id);
        Ok(())
    }
}

#[async_trait]
impl FeeRepository for FakeStore {
    async fn list_fees(&self, query: &FeeQuery) -> AppResult<Page<FeeRecord>> {
        let fees = self.fees.lock().await.clone();
        let mut visible = Vec::new();
        for fee in fees {
            if self.fee_visible(query.scope(), &fee).await {
                visible.push(fee);
            }
        }
        Ok(paginate(visible, query.page()))
    }

    async fn find_fee(
        &self,
        scope: &ScopePredicate,
        fee_id: FeeId,
    ) -> AppResult<Option<FeeRecord>> {
        let fee = self
            .fees
            .lock()
            .await
            .iter()
            .find(|fee| fee.id() == fee_id)
            .cloned();
        match fee {
            Some(fee) if self.fee_visible(scope, &fee).await => Ok(Some(fee)),
            _ => Ok(None),
        }
    }

    async fn insert_fee(&self, fee: &FeeRecord) -> AppResult<()> {
        if self.student_by_id(fee.student_id()).await.is_none() {
            return Err(AppError::Conflict("unknown student".to_owned()));
        }
        self.fees.lock().await.push(fee.clone());
        Ok(())
    }

    async fn update_fee(&self, fee: &FeeRecord) -> AppResult<()> {
        let mut fees = self.fees.lock().await;
        if let Some(stored) = fees.iter_mut().find(|stored| stored.id() == fee.id()) {
            *stored = fee.clone();
        }
        Ok(())
    }

    async fn delete_fee(&self, fee_id: FeeId) -> AppResult<()> {
        self.fees.lock().await.retain(|fee| fee.id() != fee_id);
        Ok(())
    }

    async fn mark_overdue_fees(&self, today: NaiveDate) -> AppResult<Vec<FeeRecord>> {
        let mut fees = self.fees.lock().await;
        let mut changed = Vec::new();
        for fee in fees.iter_mut() {
            if fee.mark_overdue_if_due(today) {
                changed.push(fee.clone());
            }
        }
        Ok(changed)
    }
}

#[async_trait]
impl AttendanceLedger for FakeStore {
    async fn list_attendance(
        &self,
        query: &AttendanceQuery,
    ) -> AppResult<Page<AttendanceRecord>> {
        let records = self.attendance.lock().await.clone();
        let mut visible = Vec::new();
        for record in records {
            let filter = query.filter();
            if filter.batch_id.is_some_and(|id| record.batch_id() != id) {
                continue;
            }
            if self.record_visible(query.scope(), &record).await {
                visible.push(record);
            }
        }
        Ok(paginate(visible, query.page()))
    }

    async fn upsert_record(&self, record: &AttendanceRecord) -> AppResult<AttendanceRecord> {
        let stored = self.upsert_records(std::slice::from_ref(record)).await?;
        stored
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Internal("upsert returned no row".to_owned()))
    }

    async fn upsert_records(
        &self,
        records: &[AttendanceRecord],
    ) -> AppResult<Vec<AttendanceRecord>> {
        *self.ledger_calls.lock().await += 1;
        for record in records {
            if self.student_by_id(record.student_id()).await.is_none() {
                return Err(AppError::Conflict(format!(
                    "student '{}' does not exist",
                    record.student_id()
                )));
            }
        }

        let mut ledger = self.attendance.lock().await;
        let mut stored = Vec::with_capacity(records.len());
        for record in records {
            match ledger.iter_mut().find(|row| row.key() == record.key()) {
                Some(row) => {
                    if row.status() != record.status() {
                        row.remark(record.status(), record.marked_by(), record.marked_at());
                    }
                    stored.push(row.clone());
                }
                None => {
                    ledger.push(record.clone());
                    stored.push(record.clone());
                }
            }
        }
        Ok(stored)
    }
}

#[async_trait]
impl UserRepository for FakeStore {
    async fn find_user(&self, user_id: UserId) -> AppResult<Option<UserAccount>> {
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .find(|user| user.id() == user_id)
            .cloned())
    }

    async fn find_user_by_email(&self, email: &EmailAddress) -> AppResult<Option<UserAccount>> {
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .find(|user| user.email() == email)
            .cloned())
    }

    async fn insert_user(&self, account: &UserAccount) -> AppResult<()> {
        self.users.lock().await.push(account.clone());
        Ok(())
    }
}

#[async_trait]
impl ActivityLogRepository for FakeStore {
    async fn append_entry(&self, entry: ActivityEntry) -> AppResult<()> {
        if *self.fail_activity.lock().await {
            return Err(AppError::Internal("activity store offline".to_owned()));
        }
        self.activity.lock().await.push(entry);
        Ok(())
    }

    async fn list_recent_entries(
        &self,
        _query: ActivityLogQuery,
    ) -> AppResult<Vec<ActivityLogEntry>> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl NotificationSender for FakeStore {
    async fn send(&self, target: &str, subject: &str, body: &str) -> AppResult<()> {
        self.notifications.lock().await.push((
            target.to_owned(),
            subject.to_owned(),
            body.to_owned(),
        ));
        Ok(())
    }
}

#[async_trait]
impl RateLimitRepository for FakeStore {
    async fn record_attempt(&self, _key: &str, _window: i64) -> AppResult<AttemptInfo> {
        Ok(AttemptInfo {
            attempt_count: 1,
            window_started_at: Utc::now(),
        })
    }

    async fn cleanup_expired(&self, _before: DateTime<Utc>) -> AppResult<u64> {
        Ok(0)
    }
}

/// Fully wired services over one [`FakeStore`].
pub(crate) struct TestWorld {
    store: Arc<FakeStore>,
}

impl TestWorld {
    pub(crate) fn new() -> Self {
        Self {
            store: Arc::new(FakeStore::default()),
        }
    }

    pub(crate) fn admin(&self) -> Caller {
        Caller::new(UserId::new(), Role::Admin)
    }

    fn authorization_service(&self) -> AuthorizationService {
        AuthorizationService::new(
            RateLimitService::new(self.store.clone()),
            RateLimitRule::default_write_rule(),
        )
    }

    pub(crate) fn activity_service(&self) -> ActivityService {
        ActivityService::new(
            self.store.clone(),
            self.store.clone(),
            self.store.clone(),
            self.store.clone(),
        )
    }

    pub(crate) fn student_service(&self) -> StudentService {
        StudentService::new(
            self.authorization_service(),
            Arc::new(StudentScope),
            self.store.clone(),
            self.store.clone(),
            self.activity_service(),
        )
    }

    pub(crate) fn batch_service(&self) -> BatchService {
        BatchService::new(
            self.authorization_service(),
            Arc::new(BatchScope),
            self.store.clone(),
            self.store.clone(),
            self.activity_service(),
        )
    }

    pub(crate) fn fee_service(&self) -> FeeService {
        FeeService::new(
            self.authorization_service(),
            Arc::new(FeeScope),
            self.store.clone(),
            self.activity_service(),
        )
    }

    pub(crate) fn attendance_service(&self) -> AttendanceService {
        AttendanceService::new(
            self.authorization_service(),
            Arc::new(AttendanceScope),
            self.store.clone(),
            self.store.clone(),
            self.activity_service(),
        )
    }

    async fn add_user(&self, email: &str, role: Role) -> UserAccount {
        let account = match UserAccount::new(UserId::new(), email, email, role) {
            Ok(account) => account,
            Err(error) => panic!("test account should be valid: {error}"),
        };
        self.store.users.lock().await.push(account.clone());
        account
    }

    pub(crate) async fn add_parent(&self, email: &str) -> UserAccount {
        self.add_user(email, Role::Parent).await
    }

    pub(crate) async fn add_teacher(&self, email: &str) -> UserAccount {
        self.add_user(email, Role::Teacher).await
    }

    pub(crate) async fn add_batch(&self, teacher_id: Option<UserId>) -> Batch {
        let batch = Batch::new(BatchId::new(), batch_input(teacher_id));
        let Ok(batch) = batch else {
            panic!("test batch should be valid");
        };
        self.store.batches.lock().await.push(batch.clone());
        batch
    }

    pub(crate) async fn add_student(
        &self,
        parent_id: UserId,
        batch_id: Option<BatchId>,
    ) -> Student {
        let student = Student::new(
            StudentId::new(),
            StudentInput {
                name: "Asha".to_owned(),
                level: "L1".to_owned(),
                is_active: true,
                parent_id,
                batch_id,
            },
        );
        let Ok(student) = student else {
            panic!("test student should be valid");
        };
        self.store.students.lock().await.push(student.clone());
        student
    }

    pub(crate) async fn users(&self) -> Vec<UserAccount> {
        self.store.users.lock().await.clone()
    }

    pub(crate) async fn activity_entries(&self) -> Vec<ActivityEntry> {
        self.store.activity.lock().await.clone()
    }

    pub(crate) async fn sent_notifications(&self) -> Vec<(String, String, String)> {
        self.store.notifications.lock().await.clone()
    }

    pub(crate) async fn attendance_rows(&self) -> Vec<AttendanceRecord> {
        self.store.attendance.lock().await.clone()
    }

    pub(crate) async fn ledger_calls(&self) -> usize {
        *self.store.ledger_calls.lock().await
    }

    pub(crate) async fn fail_activity_appends(&self) {
        *self.store.fail_activity.lock().await = true;
    }
}

pub(crate) fn batch_input(teacher_id: Option<UserId>) -> BatchInput {
    BatchInput {
        name: "Evening Abacus".to_owned(),
        level: "L2".to_owned(),
        days: BTreeSet::from([DayOfWeek::Monday, DayOfWeek::Thursday]),
        start_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default(),
        end_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or_default(),
        teacher_id,
    }
}

pub(crate) fn class_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 15).unwrap_or_default()
}
