use std::collections::{BTreeMap, BTreeSet};

use tracing::{info, warn};
use uuid::Uuid;

use crate::cascade::resume_refs;
use crate::error::AppError;
use crate::models::ResourceKind;
use crate::store::{CompanyStore, ObjectStore, ZipRequest};

const FALLBACK_ARCHIVE_NAME: &str = "resumes";

/// Reduces a display name to `[A-Za-z0-9_-]`, one `_` per run of anything else.
pub fn sanitize_archive_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        FALLBACK_ARCHIVE_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

pub async fn generate_zip_link<O: ObjectStore>(
    objects: &O,
    ids: &BTreeSet<String>,
    kind: ResourceKind,
    archive_name: &str,
) -> Result<String, AppError> {
    if ids.is_empty() {
        return Err(AppError::NotFound("resumes".to_string()));
    }

    let request = ZipRequest {
        ids: ids.iter().cloned().collect(),
        kind,
        archive_name: sanitize_archive_name(archive_name),
    };
    let url = objects.build_zip_link(&request).await?;
    info!(
        archive = %request.archive_name,
        resumes = request.ids.len(),
        "zip link generated"
    );
    Ok(url)
}

/// Resume bundles for the download endpoints.
pub struct ResumeArchiver<'a, C, O> {
    companies: &'a C,
    objects: &'a O,
    prefix: &'a str,
}

impl<'a, C: CompanyStore, O: ObjectStore> ResumeArchiver<'a, C, O> {
    pub fn new(companies: &'a C, objects: &'a O, prefix: &'a str) -> Self {
        Self {
            companies,
            objects,
            prefix,
        }
    }

    pub async fn all_resumes(&self) -> Result<String, AppError> {
        let applications = self.companies.all_applications().await?;
        self.bundle(resume_refs(&applications, self.prefix), "all_resumes")
            .await
    }

    pub async fn company_resumes(&self, company_id: Uuid) -> Result<String, AppError> {
        let company = self
            .companies
            .find_company(company_id)
            .await?
            .ok_or_else(|| AppError::NotFound("company".to_string()))?;
        let applications = self.companies.applications_for_company(company_id).await?;
        let name = format!("{}_resumes", company.name);
        self.bundle(resume_refs(&applications, self.prefix), &name)
            .await
    }

    async fn bundle(
        &self,
        refs: BTreeMap<String, ResourceKind>,
        archive_name: &str,
    ) -> Result<String, AppError> {
        let Some((kind, ids)) = largest_group(refs) else {
            return Err(AppError::NotFound("resumes".to_string()));
        };
        generate_zip_link(self.objects, &ids, kind, archive_name).await
    }
}

/// One provider archive holds a single kind; keep the biggest group.
fn largest_group(refs: BTreeMap<String, ResourceKind>) -> Option<(ResourceKind, BTreeSet<String>)> {
    let mut groups: BTreeMap<ResourceKind, BTreeSet<String>> = BTreeMap::new();
    for (id, kind) in refs {
        groups.entry(kind).or_default().insert(id);
    }

    // Ties go to the smallest kind, so `raw` wins.
    let (&kind, _) = groups
        .iter()
        .max_by(|(ka, a), (kb, b)| a.len().cmp(&b.len()).then(kb.cmp(ka)))?;
    for (skipped, ids) in groups.iter().filter(|(k, _)| **k != kind) {
        warn!(kind = skipped.as_str(), count = ids.len(), "resumes left out of archive");
    }
    groups.remove(&kind).map(|ids| (kind, ids))
}
