use std::collections::BTreeSet;

use academy_application::{
    AttendanceFilter, AttendanceLedger, BatchRepository, FeeRepository, PageRequest,
    ScopePredicate, ScopedQuery, StudentFilter, StudentRepository, UserRepository,
};
use academy_core::{AppError, Role, UserId};
use academy_domain::{
    AttendanceKey, AttendanceRecord, AttendanceStatus, Batch, BatchId, BatchInput, DayOfWeek,
    EmailAddress, FeeId, FeeInput, FeeRecord, FeeStatus, Student, StudentId, StudentInput,
    UserAccount,
};
use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use super::PostgresAcademyRepository;
use crate::postgres_test_support::test_pool;

fn class_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 15).unwrap_or_default()
}

fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@academy.test", Uuid::new_v4())
}

async fn seed_user(repository: &PostgresAcademyRepository, role: Role) -> UserAccount {
    let account = UserAccount::new(UserId::new(), "Seeded User", unique_email("user"), role)
        .unwrap_or_else(|error| panic!("valid account: {error}"));
    if let Err(error) = repository.insert_user(&account).await {
        panic!("failed to seed user: {error}");
    }
    account
}

async fn seed_batch(
    repository: &PostgresAcademyRepository,
    teacher_id: Option<UserId>,
) -> Batch {
    let batch = Batch::new(
        BatchId::new(),
        BatchInput {
            name: "Morning Phonics".to_owned(),
            level: "L1".to_owned(),
            days: BTreeSet::from([DayOfWeek::Monday, DayOfWeek::Thursday]),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap_or_default(),
            teacher_id,
        },
    )
    .unwrap_or_else(|error| panic!("valid batch: {error}"));
    if let Err(error) = repository.insert_batch(&batch).await {
        panic!("failed to seed batch: {error}");
    }
    batch
}

async fn seed_student(
    repository: &PostgresAcademyRepository,
    parent_id: UserId,
    batch_id: Option<BatchId>,
) -> Student {
    let student = Student::new(
        StudentId::new(),
        StudentInput {
            name: "Mira".to_owned(),
            level: "L1".to_owned(),
            is_active: true,
            parent_id,
            batch_id,
        },
    )
    .unwrap_or_else(|error| panic!("valid student: {error}"));
    if let Err(error) = repository.insert_student(&student, None).await {
        panic!("failed to seed student: {error}");
    }
    student
}

fn mark(
    student: &Student,
    batch: &Batch,
    status: AttendanceStatus,
    by: UserId,
) -> AttendanceRecord {
    AttendanceRecord::new(
        AttendanceKey {
            date: class_date(),
            student_id: student.id(),
            batch_id: batch.id(),
        },
        status,
        by,
        Utc::now(),
    )
}

#[tokio::test]
async fn parent_scope_and_filter_are_both_applied() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresAcademyRepository::new(pool);
    let teacher = seed_user(&repository, Role::Teacher).await;
    let parent = seed_user(&repository, Role::Parent).await;
    let other_parent = seed_user(&repository, Role::Parent).await;
    let own_batch = seed_batch(&repository, Some(teacher.id())).await;
    let foreign_batch = seed_batch(&repository, Some(teacher.id())).await;
    let child = seed_student(&repository, parent.id(), Some(own_batch.id())).await;
    seed_student(&repository, other_parent.id(), Some(foreign_batch.id())).await;

    let scoped = repository
        .list_students(&ScopedQuery::new(
            ScopePredicate::ParentOf(parent.id()),
            StudentFilter::default(),
            Default::default(),
            PageRequest::default(),
        ))
        .await;
    let Ok(scoped) = scoped else {
        panic!("scoped listing should succeed");
    };
    assert_eq!(scoped.meta.total, 1);
    assert_eq!(scoped.data[0].id(), child.id());

    let foreign = repository
        .list_students(&ScopedQuery::new(
            ScopePredicate::ParentOf(parent.id()),
            StudentFilter {
                batch_id: Some(foreign_batch.id()),
                ..StudentFilter::default()
            },
            Default::default(),
            PageRequest::default(),
        ))
        .await;
    assert!(matches!(foreign, Ok(ref page) if page.data.is_empty() && page.meta.total == 0));

    let teacher_view = repository
        .find_student(&ScopePredicate::TeacherOf(teacher.id()), child.id())
        .await;
    assert!(matches!(teacher_view, Ok(Some(_))));
    let stranger_view = repository
        .find_student(&ScopePredicate::TeacherOf(UserId::new()), child.id())
        .await;
    assert!(matches!(stranger_view, Ok(None)));
}

#[tokio::test]
async fn remarking_with_same_status_keeps_original_marker() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresAcademyRepository::new(pool);
    let teacher = seed_user(&repository, Role::Teacher).await;
    let parent = seed_user(&repository, Role::Parent).await;
    let batch = seed_batch(&repository, Some(teacher.id())).await;
    let student = seed_student(&repository, parent.id(), Some(batch.id())).await;

    let first = repository
        .upsert_record(&mark(&student, &batch, AttendanceStatus::Absent, teacher.id()))
        .await;
    let again = repository
        .upsert_record(&mark(&student, &batch, AttendanceStatus::Absent, UserId::new()))
        .await;
    let changed = repository
        .upsert_record(&mark(&student, &batch, AttendanceStatus::Late, teacher.id()))
        .await;

    assert!(matches!(first, Ok(ref row) if row.marked_by() == teacher.id()));
    assert!(matches!(again, Ok(ref row) if row.marked_by() == teacher.id()));
    assert!(matches!(changed, Ok(ref row) if row.status() == AttendanceStatus::Late));

    let rows = repository
        .list_attendance(&ScopedQuery::new(
            ScopePredicate::Unrestricted,
            AttendanceFilter {
                student_id: Some(student.id()),
                ..AttendanceFilter::default()
            },
            Default::default(),
            PageRequest::default(),
        ))
        .await;
    assert!(matches!(rows, Ok(ref page) if page.meta.total == 1));
}

#[tokio::test]
async fn bulk_upsert_writes_nothing_when_one_row_fails() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresAcademyRepository::new(pool);
    let teacher = seed_user(&repository, Role::Teacher).await;
    let parent = seed_user(&repository, Role::Parent).await;
    let batch = seed_batch(&repository, Some(teacher.id())).await;
    let first = seed_student(&repository, parent.id(), Some(batch.id())).await;
    let second = seed_student(&repository, parent.id(), Some(batch.id())).await;
    let ghost = Student::new(
        StudentId::new(),
        StudentInput {
            name: "Ghost".to_owned(),
            level: "L1".to_owned(),
            is_active: true,
            parent_id: parent.id(),
            batch_id: Some(batch.id()),
        },
    )
    .unwrap_or_else(|error| panic!("valid student: {error}"));

    let records = vec![
        mark(&first, &batch, AttendanceStatus::Present, teacher.id()),
        mark(&second, &batch, AttendanceStatus::Absent, teacher.id()),
        mark(&ghost, &batch, AttendanceStatus::Present, teacher.id()),
    ];
    let result = repository.upsert_records(&records).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    let rows = repository
        .list_attendance(&ScopedQuery::new(
            ScopePredicate::Unrestricted,
            AttendanceFilter {
                batch_id: Some(batch.id()),
                ..AttendanceFilter::default()
            },
            Default::default(),
            PageRequest::default(),
        ))
        .await;
    assert!(matches!(rows, Ok(ref page) if page.meta.total == 0));
}

fn student_of(parent_id: UserId, batch_id: Option<BatchId>) -> Student {
    Student::new(
        StudentId::new(),
        StudentInput {
            name: "Dev".to_owned(),
            level: "L1".to_owned(),
            is_active: true,
            parent_id,
            batch_id,
        },
    )
    .unwrap_or_else(|error| panic!("valid student: {error}"))
}

#[tokio::test]
async fn new_parent_commits_or_rolls_back_with_its_student() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresAcademyRepository::new(pool);
    let email = EmailAddress::new(unique_email("parent"))
        .unwrap_or_else(|error| panic!("valid email: {error}"));
    let parent = UserAccount::new(UserId::new(), "Family", email.as_str(), Role::Parent)
        .unwrap_or_else(|error| panic!("valid account: {error}"));

    let orphan = student_of(parent.id(), Some(BatchId::new()));
    let failed = repository.insert_student(&orphan, Some(&parent)).await;
    assert!(matches!(failed, Err(AppError::Conflict(_))));
    assert!(matches!(repository.find_user_by_email(&email).await, Ok(None)));

    let enrolled = student_of(parent.id(), None);
    assert!(repository.insert_student(&enrolled, Some(&parent)).await.is_ok());
    assert!(matches!(
        repository.find_user_by_email(&email).await,
        Ok(Some(ref account)) if account.id() == parent.id()
    ));

    let duplicate = UserAccount::new(UserId::new(), "Again", email.as_str(), Role::Parent)
        .unwrap_or_else(|error| panic!("valid account: {error}"));
    let sibling = student_of(duplicate.id(), None);
    let clash = repository.insert_student(&sibling, Some(&duplicate)).await;
    assert!(matches!(clash, Err(AppError::Conflict(_))));
    let stored = repository
        .find_student(&ScopePredicate::Unrestricted, sibling.id())
        .await;
    assert!(matches!(stored, Ok(None)));
}

#[tokio::test]
async fn parent_attendance_with_foreign_batch_filter_is_empty() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresAcademyRepository::new(pool);
    let teacher = seed_user(&repository, Role::Teacher).await;
    let parent = seed_user(&repository, Role::Parent).await;
    let other_parent = seed_user(&repository, Role::Parent).await;
    let own_batch = seed_batch(&repository, Some(teacher.id())).await;
    let foreign_batch = seed_batch(&repository, Some(teacher.id())).await;
    let child = seed_student(&repository, parent.id(), Some(own_batch.id())).await;
    let stranger = seed_student(&repository, other_parent.id(), Some(foreign_batch.id())).await;
    let marked = repository
        .upsert_records(&[
            mark(&child, &own_batch, AttendanceStatus::Present, teacher.id()),
            mark(&stranger, &foreign_batch, AttendanceStatus::Absent, teacher.id()),
        ])
        .await;
    assert!(marked.is_ok());

    let foreign = repository
        .list_attendance(&ScopedQuery::new(
            ScopePredicate::ParentOf(parent.id()),
            AttendanceFilter {
                batch_id: Some(foreign_batch.id()),
                ..AttendanceFilter::default()
            },
            Default::default(),
            PageRequest::default(),
        ))
        .await;
    assert!(matches!(foreign, Ok(ref page) if page.data.is_empty() && page.meta.total == 0));

    let own = repository
        .list_attendance(&ScopedQuery::new(
            ScopePredicate::ParentOf(parent.id()),
            AttendanceFilter::default(),
            Default::default(),
            PageRequest::default(),
        ))
        .await;
    let Ok(own) = own else {
        panic!("parent listing should succeed");
    };
    assert_eq!(own.meta.total, 1);
    assert_eq!(own.data[0].student_id(), child.id());
}

#[tokio::test]
async fn overdue_sweep_only_touches_pending_fees_past_due() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresAcademyRepository::new(pool);
    let parent = seed_user(&repository, Role::Parent).await;
    let student = seed_student(&repository, parent.id(), None).await;
    let today = Utc::now().date_naive();

    let mut fees = Vec::new();
    for offset in [-3_i64, 3] {
        let fee = FeeRecord::new(
            FeeId::new(),
            FeeInput {
                student_id: student.id(),
                amount_minor: 2_500,
                due_date: today + Duration::days(offset),
            },
        )
        .unwrap_or_else(|error| panic!("valid fee: {error}"));
        if let Err(error) = repository.insert_fee(&fee).await {
            panic!("failed to seed fee: {error}");
        }
        fees.push(fee);
    }

    let changed = repository.mark_overdue_fees(today).await;
    let Ok(changed) = changed else {
        panic!("overdue sweep should succeed");
    };
    assert!(changed.iter().any(|fee| fee.id() == fees[0].id()));
    assert!(changed.iter().all(|fee| fee.id() != fees[1].id()));

    let stored = repository
        .find_fee(&ScopePredicate::ParentOf(parent.id()), fees[0].id())
        .await;
    assert!(matches!(stored, Ok(Some(ref fee)) if fee.status() == FeeStatus::Overdue));
}

#[tokio::test]
async fn batch_with_attendance_cannot_be_deleted() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresAcademyRepository::new(pool);
    let teacher = seed_user(&repository, Role::Teacher).await;
    let parent = seed_user(&repository, Role::Parent).await;
    let batch = seed_batch(&repository, Some(teacher.id())).await;
    let student = seed_student(&repository, parent.id(), Some(batch.id())).await;

    if let Err(error) = repository
        .upsert_record(&mark(&student, &batch, AttendanceStatus::Present, teacher.id()))
        .await
    {
        panic!("failed to mark attendance: {error}");
    }

    let deleted = repository.delete_batch(batch.id()).await;
    assert!(matches!(deleted, Err(AppError::Conflict(_))));

    let empty = seed_batch(&repository, None).await;
    let enrolled = seed_student(&repository, parent.id(), Some(empty.id())).await;
    assert!(repository.delete_batch(empty.id()).await.is_ok());
    let detached = repository
        .find_student(&ScopePredicate::Unrestricted, enrolled.id())
        .await;
    assert!(matches!(detached, Ok(Some(ref student)) if student.batch_id().is_none()));
}
