//! Google Cloud Storage adapter over the JSON API.

use crate::error::StoreError;
use crate::store::ObjectStore;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::CONTENT_TYPE;
use std::path::Path;
use tracing::{debug, info};

pub const DEFAULT_GCS_ENDPOINT: &str = "https://storage.googleapis.com";

/// Blocking GCS client. Credentials are a pre-minted OAuth bearer token; minting
/// and refreshing it is left to whoever configures the process.
#[derive(Debug, Clone)]
pub struct GcsObjectStore {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl GcsObjectStore {
    #[must_use]
    pub fn new(endpoint: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Client against the public endpoint.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self::new(DEFAULT_GCS_ENDPOINT, Some(token.into()))
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn check(response: Response, bucket: &str, path: &str) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound { bucket: bucket.to_string(), path: path.to_string() });
        }
        let body = response.text().unwrap_or_default();
        Err(StoreError::Status {
            status: status.as_u16(),
            bucket: bucket.to_string(),
            path: path.to_string(),
            body,
        })
    }
}

impl ObjectStore for GcsObjectStore {
    fn id(&self) -> &'static str {
        "gcs"
    }

    fn upload(&self, bucket: &str, path: &str, local_file: &Path) -> Result<(), StoreError> {
        let body = std::fs::read(local_file)?;
        let url = format!("{}/upload/storage/v1/b/{}/o", self.endpoint, urlencoding::encode(bucket));
        debug!(bucket, path, bytes = body.len(), "uploading object");

        let request = self
            .client
            .post(url)
            .query(&[("uploadType", "media"), ("name", path)])
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(body);
        let response = self.authorize(request).send()?;
        Self::check(response, bucket, path)?;

        info!("uploaded gs://{}/{}", bucket, path);
        Ok(())
    }

    fn download(&self, bucket: &str, path: &str, local_file: &Path) -> Result<(), StoreError> {
        let url = format!(
            "{}/storage/v1/b/{}/o/{}",
            self.endpoint,
            urlencoding::encode(bucket),
            urlencoding::encode(path)
        );
        debug!(bucket, path, "downloading object");

        let request = self.client.get(url).query(&[("alt", "media")]);
        let response = Self::check(self.authorize(request).send()?, bucket, path)?;
        let bytes = response.bytes()?;
        std::fs::write(local_file, &bytes)?;

        info!("downloaded gs://{}/{} ({} bytes)", bucket, path, bytes.len());
        Ok(())
    }
}
