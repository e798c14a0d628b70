use std::sync::Arc;

use academy_application::RateLimitRule;
use academy_core::{Caller, Role, UserId};
use academy_domain::{EmailAddress, UserAccount};
use academy_infrastructure::InMemoryRateLimitRepository;
use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::api_services::{StorageSet, assemble_state};
use crate::dto::{
    AttendanceListQuery, BatchRequest, BulkAttendanceRequest, FeeRequest, StudentListQuery,
    StudentRequest,
};
use crate::error::ApiError;
use crate::state::AppState;

use super::{attendance, batches, fees, students};

fn test_state() -> AppState {
    assemble_state(
        StorageSet::in_memory(Arc::new(InMemoryRateLimitRepository::new())),
        RateLimitRule::default_write_rule(),
        "http://localhost:3000".to_owned(),
        "0123456789abcdef".to_owned(),
    )
}

async fn seed_staff(state: &AppState, email: &str, role: Role) -> Caller {
    let account = match UserAccount::new(UserId::new(), email, email, role) {
        Ok(account) => account,
        Err(error) => panic!("account should be valid: {error}"),
    };
    if let Err(error) = state.user_repository.insert_user(&account).await {
        panic!("account should be stored: {error}");
    }
    Caller::new(account.id(), role)
}

async fn parent_caller(state: &AppState, email: &str) -> Caller {
    let Ok(email) = EmailAddress::new(email) else {
        panic!("email should be valid");
    };
    match state.user_repository.find_user_by_email(&email).await {
        Ok(Some(account)) => Caller::new(account.id(), account.role()),
        other => panic!("parent account should exist: {other:?}"),
    }
}

fn status_of(error: ApiError) -> StatusCode {
    error.into_response().status()
}

fn student_request(name: &str, parent_email: &str, batch_id: Option<String>) -> StudentRequest {
    StudentRequest {
        name: name.to_owned(),
        level: "L1".to_owned(),
        is_active: true,
        parent_id: None,
        parent_email: Some(parent_email.to_owned()),
        parent_name: None,
        batch_id,
    }
}

fn batch_request(teacher_id: UserId) -> BatchRequest {
    BatchRequest {
        name: "Evening Abacus".to_owned(),
        level: "L1".to_owned(),
        days: vec!["MONDAY".to_owned()],
        start_time: "17:00".to_owned(),
        end_time: "18:00".to_owned(),
        teacher_id: Some(teacher_id.to_string()),
    }
}

#[tokio::test]
async fn missing_session_caller_is_unauthorized() {
    let state = test_state();

    let result = students::list_students_handler(
        State(state),
        Extension(None),
        Query(StudentListQuery::default()),
    )
    .await;

    let Err(error) = result else {
        panic!("listing without a caller should fail");
    };
    assert_eq!(status_of(error), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_path_id_is_bad_request() {
    let state = test_state();
    let admin = seed_staff(&state, "admin@academy.test", Role::Admin).await;

    let result = students::get_student_handler(
        State(state),
        Extension(Some(admin)),
        Path("not-a-uuid".to_owned()),
    )
    .await;

    let Err(error) = result else {
        panic!("malformed id should fail");
    };
    assert_eq!(status_of(error), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn class_marked_by_teacher_is_visible_only_to_each_childs_parent() {
    let state = test_state();
    let admin = seed_staff(&state, "admin@academy.test", Role::Admin).await;
    let teacher = seed_staff(&state, "teacher@academy.test", Role::Teacher).await;

    let created = batches::create_batch_handler(
        State(state.clone()),
        Extension(Some(admin)),
        Json(batch_request(teacher.id())),
    )
    .await;
    let Ok((status, Json(batch))) = created else {
        panic!("batch should be created");
    };
    assert_eq!(status, StatusCode::CREATED);

    let mut student_ids = Vec::new();
    for (name, parent_email) in [("Asha", "p1@academy.test"), ("Ravi", "p2@academy.test")] {
        let created = students::create_student_handler(
            State(state.clone()),
            Extension(Some(admin)),
            Json(student_request(name, parent_email, Some(batch.id.clone()))),
        )
        .await;
        let Ok((_, Json(student))) = created else {
            panic!("student should be created");
        };
        student_ids.push(student.id);
    }

    let submission: BulkAttendanceRequest = match serde_json::from_value(serde_json::json!({
        "date": "2024-01-15",
        "entries": [
            { "studentId": student_ids[0], "status": "PRESENT" },
            { "studentId": student_ids[1], "status": "ABSENT" },
        ],
    })) {
        Ok(submission) => submission,
        Err(error) => panic!("submission should deserialize: {error}"),
    };
    let marked = attendance::mark_bulk_attendance_handler(
        State(state.clone()),
        Extension(Some(teacher)),
        Path(batch.id.clone()),
        Json(submission),
    )
    .await;
    assert!(matches!(marked, Ok(Json(ref records)) if records.len() == 2));

    let parent = parent_caller(&state, "p2@academy.test").await;
    let listed = attendance::list_attendance_handler(
        State(state.clone()),
        Extension(Some(parent)),
        Query(AttendanceListQuery::default()),
    )
    .await;
    let Ok(Json(page)) = listed else {
        panic!("parent listing should succeed");
    };
    assert_eq!(page.meta.total, 1);
    assert_eq!(page.data[0].student_id, student_ids[1]);
    assert_eq!(page.data[0].status, "ABSENT");
}

#[tokio::test]
async fn teacher_cannot_read_fees_and_paid_fee_cannot_be_paid_again() {
    let state = test_state();
    let admin = seed_staff(&state, "admin@academy.test", Role::Admin).await;
    let teacher = seed_staff(&state, "teacher@academy.test", Role::Teacher).await;

    let created = students::create_student_handler(
        State(state.clone()),
        Extension(Some(admin)),
        Json(student_request("Asha", "p1@academy.test", None)),
    )
    .await;
    let Ok((_, Json(student))) = created else {
        panic!("student should be created");
    };

    let created = fees::create_fee_handler(
        State(state.clone()),
        Extension(Some(admin)),
        Json(FeeRequest {
            student_id: student.id,
            amount: 45_000,
            due_date: "2024-03-10".to_owned(),
        }),
    )
    .await;
    let Ok((status, Json(fee))) = created else {
        panic!("fee should be created");
    };
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(fee.status, "PENDING");

    let teacher_read = fees::get_fee_handler(
        State(state.clone()),
        Extension(Some(teacher)),
        Path(fee.id.clone()),
    )
    .await;
    let Err(error) = teacher_read else {
        panic!("teachers hold no fee permission");
    };
    assert_eq!(status_of(error), StatusCode::FORBIDDEN);

    let paid = fees::pay_fee_handler(
        State(state.clone()),
        Extension(Some(admin)),
        Path(fee.id.clone()),
        None,
    )
    .await;
    assert!(matches!(paid, Ok(Json(ref fee)) if fee.status == "PAID" && fee.paid_date.is_some()));

    let paid_again =
        fees::pay_fee_handler(State(state), Extension(Some(admin)), Path(fee.id), None).await;
    let Err(error) = paid_again else {
        panic!("paid is terminal");
    };
    assert_eq!(status_of(error), StatusCode::CONFLICT);
}
