//! Company deletion with best-effort cleanup of stored resumes.
//!
//! Resume files are destroyed first, concurrently, and their failures only
//! lower `resources_deleted`. The application and company rows are removed
//! afterwards in one store call, whatever the object store reported.

use std::collections::BTreeMap;
use std::future::Future;

use futures::future::join_all;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{CleanupReport, Company, DependentApplication, ResourceKind};
use crate::resource::extract;
use crate::store::{CompanyStore, DestroyStatus, ObjectStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeOutcome {
    pub company: Company,
    pub cleanup: CleanupReport,
}

/// Drives every task to completion and returns each result next to its key,
/// in input order. No task's result affects the others.
pub async fn settle_all<K, F, T>(tasks: impl IntoIterator<Item = (K, F)>) -> Vec<(K, T)>
where
    F: Future<Output = T>,
{
    let (keys, futures): (Vec<K>, Vec<F>) = tasks.into_iter().unzip();
    keys.into_iter().zip(join_all(futures).await).collect()
}

/// Unique in-namespace resume ids of the given applications, with their kind.
pub fn resume_refs(
    applications: &[DependentApplication],
    prefix: &str,
) -> BTreeMap<String, ResourceKind> {
    let mut refs = BTreeMap::new();
    for application in applications {
        let Some(resource) = extract(application.resume_url.as_deref()) else {
            if application
                .resume_url
                .as_deref()
                .is_some_and(|url| !url.trim().is_empty())
            {
                warn!(
                    application = %application.id,
                    company = %application.company_id,
                    "unparseable resume reference, skipping"
                );
            }
            continue;
        };
        if !resource.within(prefix) {
            warn!(
                application = %application.id,
                company = %application.company_id,
                storage_id = %resource.storage_id,
                "resume reference outside the resume namespace, skipping"
            );
            continue;
        }
        refs.entry(resource.storage_id).or_insert(resource.kind);
    }
    refs
}

pub struct CascadingDeleter<'a, C, O> {
    companies: &'a C,
    objects: &'a O,
    prefix: &'a str,
}

impl<'a, C: CompanyStore, O: ObjectStore> CascadingDeleter<'a, C, O> {
    pub fn new(companies: &'a C, objects: &'a O, prefix: &'a str) -> Self {
        Self {
            companies,
            objects,
            prefix,
        }
    }

    pub async fn delete_company_cascade(
        &self,
        company_id: Uuid,
    ) -> Result<CascadeOutcome, AppError> {
        let company = self
            .companies
            .find_company(company_id)
            .await?
            .ok_or_else(|| AppError::NotFound("company".to_string()))?;

        let applications = self.companies.applications_for_company(company_id).await?;
        let refs = resume_refs(&applications, self.prefix);
        let resources_requested = refs.len();

        let results = settle_all(refs.iter().map(|(storage_id, kind)| {
            (storage_id, self.objects.destroy(storage_id, *kind))
        }))
        .await;

        let mut resources_deleted = 0;
        for (storage_id, status) in &results {
            match status {
                s if s.is_deleted() => resources_deleted += 1,
                DestroyStatus::Error(reason) => {
                    warn!(%storage_id, %reason, "failed to destroy resume");
                }
                _ => {}
            }
        }

        let dependent_records_deleted = self
            .companies
            .delete_company_with_applications(company_id)
            .await?;

        let cleanup = CleanupReport {
            dependent_records_deleted,
            resources_requested,
            resources_deleted,
        };
        if cleanup.resources_deleted < cleanup.resources_requested {
            warn!(
                company = %company_id,
                requested = cleanup.resources_requested,
                deleted = cleanup.resources_deleted,
                "resume cleanup incomplete"
            );
        }
        info!(
            company = %company_id,
            applications = cleanup.dependent_records_deleted,
            "company deleted"
        );

        Ok(CascadeOutcome { company, cleanup })
    }
}
