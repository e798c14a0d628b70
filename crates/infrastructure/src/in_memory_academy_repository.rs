//! In-memory academy storage used by tests and the `memory` storage backend.
//!
//! All tables sit behind one lock so scope checks that cross tables see a
//! consistent snapshot, and multi-row writes validate every row before any
//! of them is applied.

use std::collections::{BTreeMap, HashMap};

use academy_application::{Page, PageRequest, ScopePredicate};
use academy_core::UserId;
use academy_domain::{
    AttendanceKey, AttendanceRecord, Batch, BatchId, FeeId, FeeRecord, Student, StudentId,
    UserAccount,
};
use tokio::sync::RwLock;

mod attendance;
mod batches;
mod fees;
mod students;
mod users;


/// In-memory implementation of every academy storage port.
#[derive(Debug, Default)]
pub struct InMemoryAcademyRepository {
    tables: RwLock<AcademyTables>,
}

impl InMemoryAcademyRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Default)]
struct AcademyTables {
    users: HashMap<UserId, UserAccount>,
    batches: HashMap<BatchId, Batch>,
    students: HashMap<StudentId, Student>,
    fees: HashMap<FeeId, FeeRecord>,
    attendance: BTreeMap<AttendanceKey, AttendanceRecord>,
}

impl AcademyTables {
    fn batch_taught_by(&self, batch_id: Option<BatchId>, teacher_id: UserId) -> bool {
        batch_id
            .and_then(|batch_id| self.batches.get(&batch_id))
            .is_some_and(|batch| batch.is_taught_by(teacher_id))
    }

    fn student_in_scope(&self, scope: &ScopePredicate, student: &Student) -> bool {
        match scope {
            ScopePredicate::Unrestricted => true,
            ScopePredicate::TeacherOf(teacher_id) => {
                self.batch_taught_by(student.batch_id(), *teacher_id)
            }
            ScopePredicate::ParentOf(parent_id) => student.parent_id() == *parent_id,
        }
    }

    fn batch_in_scope(&self, scope: &ScopePredicate, batch: &Batch) -> bool {
        match scope {
            ScopePredicate::Unrestricted => true,
            ScopePredicate::TeacherOf(teacher_id) => batch.is_taught_by(*teacher_id),
            ScopePredicate::ParentOf(parent_id) => self.students.values().any(|student| {
                student.batch_id() == Some(batch.id()) && student.parent_id() == *parent_id
            }),
        }
    }

    fn fee_in_scope(&self, scope: &ScopePredicate, fee: &FeeRecord) -> bool {
        self.students
            .get(&fee.student_id())
            .is_some_and(|student| self.student_in_scope(scope, student))
    }

    fn record_in_scope(&self, scope: &ScopePredicate, record: &AttendanceRecord) -> bool {
        match scope {
            ScopePredicate::Unrestricted => true,
            ScopePredicate::TeacherOf(teacher_id) => {
                self.batch_taught_by(Some(record.batch_id()), *teacher_id)
            }
            ScopePredicate::ParentOf(parent_id) => self
                .students
                .get(&record.student_id())
                .is_some_and(|student| student.parent_id() == *parent_id),
        }
    }
}

fn paginate<T>(rows: Vec<T>, request: PageRequest) -> Page<T> {
    let total = rows.len() as u64;
    let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
    let data = rows
        .into_iter()
        .skip(offset)
        .take(request.limit() as usize)
        .collect();

    Page::new(data, total, request)
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.trim().to_lowercase())
}
