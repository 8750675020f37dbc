use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{ObjectStoreError, StoreError};
use crate::models::{
    Company, DependentApplication, ResourceKind, StudentRecord, ValidatedStudentInput,
};

#[async_trait]
pub trait StudentStore: Send + Sync {
    /// Fails with `StoreError::DuplicateKey` when the email is taken.
    async fn insert_student(
        &self,
        student: &ValidatedStudentInput,
    ) -> Result<StudentRecord, StoreError>;
}

#[async_trait]
pub trait CompanyStore: Send + Sync {
    async fn find_company(&self, id: Uuid) -> Result<Option<Company>, StoreError>;

    async fn applications_for_company(
        &self,
        company_id: Uuid,
    ) -> Result<Vec<DependentApplication>, StoreError>;

    async fn all_applications(&self) -> Result<Vec<DependentApplication>, StoreError>;

    /// Removes every application of the company, then the company itself,
    /// as one unit. Returns the number of applications removed.
    async fn delete_company_with_applications(&self, company_id: Uuid) -> Result<u64, StoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestroyStatus {
    Ok,
    NotFound,
    Error(String),
}

impl DestroyStatus {
    /// An already-absent resource counts as deleted.
    pub fn is_deleted(&self) -> bool {
        matches!(self, DestroyStatus::Ok | DestroyStatus::NotFound)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipRequest {
    pub ids: Vec<String>,
    pub kind: ResourceKind,
    pub archive_name: String,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn destroy(&self, storage_id: &str, kind: ResourceKind) -> DestroyStatus;

    async fn build_zip_link(&self, request: &ZipRequest) -> Result<String, ObjectStoreError>;
}
