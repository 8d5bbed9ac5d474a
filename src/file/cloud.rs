//! Cloudinary blob store.
//!
//! Uploads go through the signed upload API; deletes through `destroy`.
//! Blob references have the form `{resource_type}/{public_id}` because the
//! destroy and delivery endpoints are scoped by resource type.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::blob::{BlobError, BlobStore, StoredBlob};
use crate::config::BlobConfig;

/// Credentials and endpoints for a Cloudinary account.
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    /// Cloud name.
    pub cloud_name: String,
    /// API key.
    pub api_key: String,
    /// API secret used for request signatures.
    pub api_secret: String,
    /// Remote folder uploads are placed in.
    pub folder: String,
    /// Upload API base URL.
    pub api_base_url: String,
    /// Delivery base URL.
    pub delivery_base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl From<&BlobConfig> for CloudinaryConfig {
    fn from(config: &BlobConfig) -> Self {
        Self {
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            folder: config.folder.clone(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            delivery_base_url: config.delivery_base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
    resource_type: String,
    #[serde(default)]
    bytes: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Blob store backed by Cloudinary.
pub struct CloudinaryBlobStore {
    config: CloudinaryConfig,
    client: Client,
}

impl CloudinaryBlobStore {
    /// Create a store with its own HTTP client.
    pub fn new(config: CloudinaryConfig) -> Result<Self, BlobError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BlobError::Http(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    fn endpoint(&self, resource_type: &str, action: &str) -> String {
        format!(
            "{}/v1_1/{}/{}/{}",
            self.config.api_base_url, self.config.cloud_name, resource_type, action
        )
    }

    /// Sign request parameters: `k=v` pairs sorted by key, joined with `&`,
    /// followed by the API secret, hashed with SHA-256.
    pub fn sign(params: &BTreeMap<&str, String>, api_secret: &str) -> String {
        let joined = params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(joined.as_bytes());
        hasher.update(api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Parameters signed for an upload. Cloudinary drops empty values
    /// before checking the signature, so an empty folder is left out.
    fn upload_params(&self, timestamp: i64) -> BTreeMap<&'static str, String> {
        let mut params = BTreeMap::new();
        if !self.config.folder.is_empty() {
            params.insert("folder", self.config.folder.clone());
        }
        params.insert("timestamp", timestamp.to_string());
        params
    }

    fn signed_form(&self, params: BTreeMap<&str, String>) -> Form {
        let signature = Self::sign(&params, &self.config.api_secret);
        let mut form = Form::new();
        for (key, value) in params {
            form = form.text(key.to_string(), value);
        }
        form.text("api_key", self.config.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256")
    }

    async fn error_message(response: reqwest::Response) -> String {
        let status = response.status();
        match response.json::<ErrorResponse>().await {
            Ok(body) => format!("{status}: {}", body.error.message),
            Err(_) => status.to_string(),
        }
    }

    /// Split a blob reference into `(resource_type, public_id)`.
    pub fn split_ref(blob_ref: &str) -> Option<(&str, &str)> {
        blob_ref
            .split_once('/')
            .filter(|(kind, id)| !kind.is_empty() && !id.is_empty())
    }
}

#[async_trait]
impl BlobStore for CloudinaryBlobStore {
    async fn put(
        &self,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<StoredBlob, BlobError> {
        let size = data.len() as u64;
        let params = self.upload_params(chrono::Utc::now().timestamp());

        let mut part = Part::bytes(data).file_name(filename.to_string());
        if !content_type.is_empty() {
            part = part
                .mime_str(content_type)
                .map_err(|e| BlobError::Storage(format!("invalid content type: {e}")))?;
        }
        let form = self.signed_form(params).part("file", part);

        let response = self
            .client
            .post(self.endpoint("auto", "upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| BlobError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let message = Self::error_message(response).await;
            warn!(filename = %filename, error = %message, "Cloudinary upload rejected");
            return Err(BlobError::Http(message));
        }

        let body = response
            .json::<UploadResponse>()
            .await
            .map_err(|e| BlobError::InvalidResponse(e.to_string()))?;

        debug!(public_id = %body.public_id, "Uploaded blob to Cloudinary");

        Ok(StoredBlob {
            blob_ref: format!("{}/{}", body.resource_type, body.public_id),
            url: body.secure_url,
            size: body.bytes.unwrap_or(size),
        })
    }

    async fn delete(&self, blob_ref: &str) -> Result<bool, BlobError> {
        let (resource_type, public_id) = Self::split_ref(blob_ref)
            .ok_or_else(|| BlobError::Storage(format!("malformed blob reference: {blob_ref}")))?;

        let mut params = BTreeMap::new();
        params.insert("public_id", public_id.to_string());
        params.insert("timestamp", chrono::Utc::now().timestamp().to_string());

        let response = self
            .client
            .post(self.endpoint(resource_type, "destroy"))
            .multipart(self.signed_form(params))
            .send()
            .await
            .map_err(|e| BlobError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let message = Self::error_message(response).await;
            return Err(BlobError::Http(message));
        }

        let body = response
            .json::<DestroyResponse>()
            .await
            .map_err(|e| BlobError::InvalidResponse(e.to_string()))?;

        match body.result.as_str() {
            "ok" => Ok(true),
            "not found" => Ok(false),
            other => Err(BlobError::InvalidResponse(format!("destroy result: {other}"))),
        }
    }

    fn download_url(&self, blob_ref: &str) -> String {
        let (resource_type, public_id) = Self::split_ref(blob_ref).unwrap_or(("raw", blob_ref));
        format!(
            "{}/{}/{}/upload/fl_attachment/{}",
            self.config.delivery_base_url, self.config.cloud_name, resource_type, public_id
        )
    }

    fn name(&self) -> &'static str {
        "cloudinary"
    }
}
