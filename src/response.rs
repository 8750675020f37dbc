use serde::Serialize;

use crate::cascade::CascadeOutcome;
use crate::models::{CleanupReport, Company, RegistrationOutcome, RowRejection};
use crate::register::BatchReport;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisteredStudent {
    pub row: usize,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct RegistrationResponse {
    pub message: String,
    pub successful: usize,
    pub failed: usize,
    pub results: Vec<RegisteredStudent>,
    pub errors: Vec<RowRejection>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionResponse {
    pub message: String,
    pub deleted_company: Company,
    pub cleanup: CleanupReport,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZipResponse {
    pub message: String,
    pub zip_url: String,
}

impl From<BatchReport> for RegistrationResponse {
    fn from(report: BatchReport) -> Self {
        let successful = report.successful();
        let failed = report.failed();

        let mut results = Vec::new();
        let mut errors = Vec::new();
        for outcome in report.outcomes {
            match outcome {
                RegistrationOutcome::Success { row, email, name } => {
                    results.push(RegisteredStudent { row, email, name })
                }
                RegistrationOutcome::Failure {
                    row,
                    email,
                    name,
                    reason,
                } => errors.push(RowRejection {
                    row,
                    email,
                    name,
                    reason,
                }),
            }
        }

        let message = if failed == 0 {
            format!("Registered {successful} students")
        } else {
            format!("Registered {successful} students, {failed} failed")
        };

        Self {
            message,
            successful,
            failed,
            results,
            errors,
        }
    }
}

impl From<CascadeOutcome> for DeletionResponse {
    fn from(outcome: CascadeOutcome) -> Self {
        let cleanup = outcome.cleanup;
        let message = if cleanup.resources_deleted < cleanup.resources_requested {
            format!(
                "Company deleted; {} of {} resumes could not be removed from storage",
                cleanup.resources_requested - cleanup.resources_deleted,
                cleanup.resources_requested
            )
        } else {
            "Company and related applications deleted".to_string()
        };

        Self {
            message,
            deleted_company: outcome.company,
            cleanup,
        }
    }
}

impl ZipResponse {
    pub fn new(zip_url: String) -> Self {
        Self {
            message: "Zip link generated".to_string(),
            zip_url,
        }
    }
}
