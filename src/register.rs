use tracing::{debug, info, warn};

use crate::error::{AppError, StoreError};
use crate::models::{RawRow, RegistrationOutcome, RowRejection, ValidatedStudentInput};
use crate::normalize::normalize;
use crate::store::StudentStore;
use crate::validate::{validate, CredentialPolicy};

pub const DUPLICATE_EMAIL: &str = "email already exists";
pub const SAVE_FAILED: &str = "could not save student";

/// Result of a batch whose rows all passed validation.
///
/// Holds exactly one outcome per input row, in row order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub outcomes: Vec<RegistrationOutcome>,
}

impl BatchReport {
    pub fn successful(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.successful()
    }
}

pub struct BatchRegistrar<'a, S> {
    store: &'a S,
    credentials: &'a CredentialPolicy,
}

impl<'a, S: StudentStore> BatchRegistrar<'a, S> {
    pub fn new(store: &'a S, credentials: &'a CredentialPolicy) -> Self {
        Self { store, credentials }
    }

    /// Validates every row before writing any. A single invalid row rejects
    /// the batch with `AppError::Validation`; once writing starts, each row
    /// succeeds or fails on its own.
    pub async fn register_all(&self, rows: &[RawRow]) -> Result<BatchReport, AppError> {
        let students = self.validate_all(rows)?;

        let mut outcomes = Vec::with_capacity(students.len());
        for student in &students {
            outcomes.push(self.persist(student).await);
        }

        let report = BatchReport { outcomes };
        info!(
            successful = report.successful(),
            failed = report.failed(),
            "student batch registered"
        );
        Ok(report)
    }

    fn validate_all(&self, rows: &[RawRow]) -> Result<Vec<ValidatedStudentInput>, AppError> {
        let mut students = Vec::with_capacity(rows.len());
        let mut rejections: Vec<RowRejection> = Vec::new();

        for (index, row) in rows.iter().enumerate() {
            match validate(normalize(row), index + 1, self.credentials) {
                Ok(student) => students.push(student),
                Err(rejection) => rejections.push(rejection),
            }
        }

        if !rejections.is_empty() {
            warn!(rejected = rejections.len(), "student batch failed validation");
            return Err(AppError::Validation {
                details: rejections,
            });
        }
        Ok(students)
    }

    async fn persist(&self, student: &ValidatedStudentInput) -> RegistrationOutcome {
        match self.store.insert_student(student).await {
            Ok(record) => {
                debug!(row = student.row, student = %record.id, "student registered");
                RegistrationOutcome::Success {
                    row: student.row,
                    email: record.email,
                    name: record.name,
                }
            }
            Err(StoreError::DuplicateKey(_)) => {
                warn!(row = student.row, email = %student.email, "duplicate student email");
                failure(student, DUPLICATE_EMAIL.to_string())
            }
            Err(err) => {
                warn!(
                    row = student.row,
                    email = %student.email,
                    error = %err,
                    "student insert failed"
                );
                failure(student, SAVE_FAILED.to_string())
            }
        }
    }
}

fn failure(student: &ValidatedStudentInput, reason: String) -> RegistrationOutcome {
    RegistrationOutcome::Failure {
        row: student.row,
        email: student.email.clone(),
        name: student.name.clone(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    use super::*;
    use crate::models::StudentRecord;

    #[derive(Default)]
    struct MemoryStudents {
        inserted: Mutex<Vec<ValidatedStudentInput>>,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl StudentStore for MemoryStudents {
        async fn insert_student(
            &self,
            student: &ValidatedStudentInput,
        ) -> Result<StudentRecord, StoreError> {
            *self.calls.lock().unwrap() += 1;
            let mut inserted = self.inserted.lock().unwrap();
            if inserted.iter().any(|s| s.email == student.email) {
                return Err(StoreError::DuplicateKey(student.email.clone()));
            }
            inserted.push(student.clone());
            Ok(StudentRecord {
                id: Uuid::new_v4(),
                name: student.name.clone(),
                email: student.email.clone(),
            })
        }
    }

    struct UnreachableStudents;

    #[async_trait]
    impl StudentStore for UnreachableStudents {
        async fn insert_student(
            &self,
            _student: &ValidatedStudentInput,
        ) -> Result<StudentRecord, StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }
    }

    fn row(name: &str, email: &str, role: &str) -> RawRow {
        [("name", name), ("email", email), ("role", role)]
            .into_iter()
            .collect()
    }

    #[tokio::test]
    async fn invalid_row_rejects_whole_batch_without_writes() {
        let store = MemoryStudents::default();
        let policy = CredentialPolicy::new("@123");
        let rows = vec![row("A", "a@x.com", "student"), row("", "b@x.com", "student")];

        let err = BatchRegistrar::new(&store, &policy)
            .register_all(&rows)
            .await
            .unwrap_err();

        let AppError::Validation { details } = err else {
            panic!("expected validation error");
        };
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].row, 2);
        assert_eq!(*store.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn duplicate_email_fails_only_its_row() {
        let store = MemoryStudents::default();
        let policy = CredentialPolicy::new("@123");
        let rows = vec![
            row("A", "a@x.com", "student"),
            row("B", "a@x.com", "student"),
            row("C", "c@x.com", "coordinator"),
        ];

        let report = BatchRegistrar::new(&store, &policy)
            .register_all(&rows)
            .await
            .unwrap();

        assert_eq!(report.successful(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(
            report.outcomes[1],
            RegistrationOutcome::Failure {
                row: 2,
                email: "a@x.com".to_string(),
                name: "B".to_string(),
                reason: DUPLICATE_EMAIL.to_string(),
            }
        );
        assert!(report.outcomes[2].is_success());
    }

    #[tokio::test]
    async fn every_row_gets_exactly_one_outcome_in_order() {
        let store = MemoryStudents::default();
        let policy = CredentialPolicy::new("@123");
        let rows: Vec<RawRow> = (0..5)
            .map(|i| row(&format!("S{i}"), &format!("s{}@x.com", i % 3), "student"))
            .collect();

        let report = BatchRegistrar::new(&store, &policy)
            .register_all(&rows)
            .await
            .unwrap();

        assert_eq!(report.outcomes.len(), rows.len());
        let order: Vec<usize> = report
            .outcomes
            .iter()
            .map(|outcome| match outcome {
                RegistrationOutcome::Success { row, .. } => *row,
                RegistrationOutcome::Failure { row, .. } => *row,
            })
            .collect();
        assert_eq!(order, vec![1, 2, 3, 4, 5]);
        assert_eq!(report.successful(), 3);
    }

    #[tokio::test]
    async fn stored_student_carries_derived_password() {
        let store = MemoryStudents::default();
        let policy = CredentialPolicy::new("#init");
        let mut input = row("A", "a@x.com", "student");
        input.push("Roll No", "CS7");

        BatchRegistrar::new(&store, &policy)
            .register_all(&[input])
            .await
            .unwrap();

        let inserted = store.inserted.lock().unwrap();
        assert_eq!(inserted[0].initial_password, "CS7#init");
    }

    #[tokio::test]
    async fn store_errors_fail_rows_without_leaking_details() {
        let policy = CredentialPolicy::new("@123");
        let rows = vec![row("A", "a@x.com", "student"), row("B", "b@x.com", "student")];

        let report = BatchRegistrar::new(&UnreachableStudents, &policy)
            .register_all(&rows)
            .await
            .unwrap();

        assert_eq!(report.failed(), 2);
        assert_eq!(
            report.outcomes[0],
            RegistrationOutcome::Failure {
                row: 1,
                email: "a@x.com".to_string(),
                name: "A".to_string(),
                reason: SAVE_FAILED.to_string(),
            }
        );
    }
}
