use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::debug;
use url::Url;

use crate::config::CloudinaryConfig;
use crate::error::ObjectStoreError;
use crate::models::ResourceKind;
use crate::store::{DestroyStatus, ObjectStore, ZipRequest};

pub struct CloudinaryStore {
    http: reqwest::Client,
    config: CloudinaryConfig,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

impl CloudinaryStore {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self, kind: ResourceKind, action: &str) -> String {
        format!(
            "{}/{}/{}/{action}",
            self.config.api_base.trim_end_matches('/'),
            self.config.cloud_name,
            kind.as_str()
        )
    }

    /// Adds `timestamp`, `api_key` and `signature` to the given parameters.
    fn signed(&self, mut params: BTreeMap<String, String>) -> BTreeMap<String, String> {
        params.insert(
            "timestamp".to_string(),
            chrono::Utc::now().timestamp().to_string(),
        );
        let signature = sign(&params, &self.config.api_secret);
        params.insert("api_key".to_string(), self.config.api_key.clone());
        params.insert("signature".to_string(), signature);
        params
    }

    async fn try_destroy(
        &self,
        storage_id: &str,
        kind: ResourceKind,
    ) -> Result<DestroyStatus, ObjectStoreError> {
        let params = self.signed(BTreeMap::from([
            ("public_id".to_string(), storage_id.to_string()),
            ("invalidate".to_string(), "true".to_string()),
        ]));

        let resp = self
            .http
            .post(self.endpoint(kind, "destroy"))
            .form(&params)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ObjectStoreError::Api {
                status: status.as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }

        let body: DestroyResponse = resp.json().await?;
        Ok(destroy_status(&body.result))
    }
}

fn destroy_status(result: &str) -> DestroyStatus {
    match result {
        "ok" => DestroyStatus::Ok,
        "not found" => DestroyStatus::NotFound,
        other => DestroyStatus::Error(format!("unexpected result: {other}")),
    }
}

/// Request signature: sorted `key=value` pairs joined by `&`, followed by the
/// secret, SHA-256 hex encoded.
pub fn sign(params: &BTreeMap<String, String>, secret: &str) -> String {
    let payload = params
        .iter()
        .filter(|(key, value)| {
            !value.is_empty() && !matches!(key.as_str(), "api_key" | "file" | "resource_type")
        })
        .map(|(key, value)| format!("{}={value}", key.trim_end_matches("[]")))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl ObjectStore for CloudinaryStore {
    async fn destroy(&self, storage_id: &str, kind: ResourceKind) -> DestroyStatus {
        match self.try_destroy(storage_id, kind).await {
            Ok(status) => {
                debug!(%storage_id, ?status, "destroy finished");
                status
            }
            Err(err) => DestroyStatus::Error(err.to_string()),
        }
    }

    async fn build_zip_link(&self, request: &ZipRequest) -> Result<String, ObjectStoreError> {
        if request.ids.is_empty() {
            return Err(ObjectStoreError::InvalidRequest(
                "archive needs at least one public id".to_string(),
            ));
        }

        let params = self.signed(BTreeMap::from([
            ("mode".to_string(), "download".to_string()),
            ("flatten_folders".to_string(), "true".to_string()),
            ("target_public_id".to_string(), request.archive_name.clone()),
            ("public_ids[]".to_string(), request.ids.join(",")),
        ]));

        let mut url = Url::parse(&self.endpoint(request.kind, "generate_archive"))
            .map_err(|e| ObjectStoreError::InvalidRequest(e.to_string()))?;
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in &params {
                if key == "public_ids[]" {
                    for id in &request.ids {
                        query.append_pair(key, id);
                    }
                } else {
                    query.append_pair(key, value);
                }
            }
        }

        Ok(url.into())
    }
}
