use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// One decoded row of an uploaded sheet, in column order.
///
/// Header spelling is whatever the uploader used; `normalize` resolves it.
/// When a header repeats, lookups see the first occurrence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: Vec<(String, String)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, header: impl Into<String>, value: impl Into<String>) {
        self.cells.push((header.into(), value.into()));
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(header, _)| header.as_str())
    }

    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(candidate, _)| candidate == header)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, value)| value.trim().is_empty())
    }
}

impl<H, V> FromIterator<(H, V)> for RawRow
where
    H: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (H, V)>>(iter: I) -> Self {
        let mut row = RawRow::new();
        for (header, value) in iter {
            row.push(header, value);
        }
        row
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalStudentInput {
    pub name: String,
    pub email: String,
    pub roll_no: String,
    pub role: String,
    pub semester: String,
    pub course: String,
    pub graduation_year: Option<i32>,
    pub default_resume: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Student,
    Coordinator,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "student" => Some(Role::Student),
            "coordinator" => Some(Role::Coordinator),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Coordinator => "coordinator",
        }
    }
}

/// A row that passed validation, still tied to its source row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedStudentInput {
    pub row: usize,
    pub name: String,
    pub email: String,
    pub roll_no: String,
    pub role: Role,
    pub semester: String,
    pub course: String,
    pub graduation_year: Option<i32>,
    pub default_resume: String,
    pub initial_password: String,
}

/// Why a row was turned away before anything was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowRejection {
    pub row: usize,
    pub email: String,
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Success {
        row: usize,
        email: String,
        name: String,
    },
    Failure {
        row: usize,
        email: String,
        name: String,
        reason: String,
    },
}

impl RegistrationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RegistrationOutcome::Success { .. })
    }
}

#[derive(Debug, Clone)]
pub struct StudentRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependentApplication {
    pub id: Uuid,
    pub company_id: Uuid,
    pub resume_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    Raw,
    Image,
    Video,
}

impl ResourceKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "raw" => Some(ResourceKind::Raw),
            "image" => Some(ResourceKind::Image),
            "video" => Some(ResourceKind::Video),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Raw => "raw",
            ResourceKind::Image => "image",
            ResourceKind::Video => "video",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    pub storage_id: String,
    pub kind: ResourceKind,
}

impl ResourceRef {
    pub fn within(&self, prefix: &str) -> bool {
        self.storage_id.starts_with(prefix)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupReport {
    pub dependent_records_deleted: u64,
    pub resources_requested: usize,
    pub resources_deleted: usize,
}
