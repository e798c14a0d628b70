use academy_core::{AppError, Caller, Role};
use academy_domain::{FeeInput, FeeStatus};
use chrono::NaiveDate;

use crate::test_support::TestWorld;
use crate::{FeeFilter, PageRequest, Sort};

fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).unwrap_or_default()
}

#[tokio::test]
async fn parent_reads_only_own_childrens_fees() {
    let world = TestWorld::new();
    let admin = world.admin();
    let parent = world.add_parent("p@example.com").await;
    let other = world.add_parent("o@example.com").await;
    let child = world.add_student(parent.id(), None).await;
    let stranger = world.add_student(other.id(), None).await;
    let service = world.fee_service();

    for student_id in [child.id(), stranger.id()] {
        let created = service
            .create(
                &admin,
                FeeInput {
                    student_id,
                    amount_minor: 45_000,
                    due_date: date(3, 10),
                },
            )
            .await;
        assert!(created.is_ok());
    }

    let page = service
        .list(
            &Caller::new(parent.id(), Role::Parent),
            FeeFilter::default(),
            Sort::default(),
            PageRequest::default(),
        )
        .await;
    let Ok(page) = page else {
        panic!("listing should succeed");
    };
    assert_eq!(page.meta.total, 1);
    assert_eq!(page.data[0].student_id(), child.id());
}

#[tokio::test]
async fn teachers_cannot_read_fees() {
    let world = TestWorld::new();
    let teacher = world.add_teacher("t@example.com").await;

    let result = world
        .fee_service()
        .list(
            &Caller::new(teacher.id(), Role::Teacher),
            FeeFilter::default(),
            Sort::default(),
            PageRequest::default(),
        )
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn overdue_sweep_then_payment() {
    let world = TestWorld::new();
    let admin = world.admin();
    let parent = world.add_parent("p@example.com").await;
    let child = world.add_student(parent.id(), None).await;
    let service = world.fee_service();

    let fee = service
        .create(
            &admin,
            FeeInput {
                student_id: child.id(),
                amount_minor: 12_050,
                due_date: date(3, 1),
            },
        )
        .await;
    let Ok(fee) = fee else {
        panic!("fee should be created");
    };

    let swept = service.mark_overdue(&admin, date(3, 2)).await;
    assert!(matches!(swept, Ok(ref changed) if changed.len() == 1));

    let paid = service.mark_paid(&admin, fee.id(), date(3, 5)).await;
    assert!(matches!(paid, Ok(ref fee) if fee.status() == FeeStatus::Paid));
    assert!(matches!(
        service.mark_paid(&admin, fee.id(), date(3, 6)).await,
        Err(AppError::Conflict(_))
    ));

    // One message for the new fee, one for the payment.
    let sent = world.sent_notifications().await;
    assert_eq!(sent.len(), 2);
    assert!(sent[1].2.contains("120.50"));
}
