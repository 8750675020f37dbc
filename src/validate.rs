use crate::models::{CanonicalStudentInput, Role, RowRejection, ValidatedStudentInput};

pub const MISSING_REQUIRED_FIELDS: &str = "missing required fields";
pub const INVALID_ROLE: &str = "invalid role";

/// Derives the initial password a freshly registered student logs in with.
#[derive(Debug, Clone)]
pub struct CredentialPolicy {
    suffix: String,
}

impl CredentialPolicy {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    pub fn initial_password(&self, roll_no: &str) -> String {
        format!("{roll_no}{}", self.suffix)
    }
}

/// Checks row-local invariants only; uniqueness is left to the store.
///
/// `row` is the 1-based position of the data row in the upload.
pub fn validate(
    input: CanonicalStudentInput,
    row: usize,
    credentials: &CredentialPolicy,
) -> Result<ValidatedStudentInput, RowRejection> {
    let reject = |reason: &str| RowRejection {
        row,
        email: input.email.clone(),
        name: input.name.clone(),
        reason: reason.to_string(),
    };

    if input.name.is_empty() || input.email.is_empty() {
        return Err(reject(MISSING_REQUIRED_FIELDS));
    }
    let Some(role) = Role::parse(&input.role) else {
        return Err(reject(INVALID_ROLE));
    };

    let initial_password = credentials.initial_password(&input.roll_no);
    Ok(ValidatedStudentInput {
        row,
        name: input.name,
        email: input.email,
        roll_no: input.roll_no,
        role,
        semester: input.semester,
        course: input.course,
        graduation_year: input.graduation_year,
        default_resume: input.default_resume,
        initial_password,
    })
}
