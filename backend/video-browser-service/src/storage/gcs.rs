/// Cloud Storage JSON API client
///
/// Lists and fetches object metadata for a bucket. Object names are fully
/// percent-encoded in the request path, including `/`.
use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{Client as HttpClient, StatusCode};

use super::auth::{ServiceAccountKey, TokenProvider, TokenSource};
use super::{ObjectStore, StorageError, StorageResult};
use crate::config::GcsConfig;
use crate::models::{BucketObject, ObjectList};

/// Characters that must be percent-encoded in a path segment
const SEGMENT_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub const DEFAULT_API_BASE: &str = "https://storage.googleapis.com/storage/v1";

/// Storage client backed by the JSON API
pub struct GcsObjectStore {
    api_base: String,
    http_client: HttpClient,
    tokens: TokenProvider,
}

impl GcsObjectStore {
    pub fn new(api_base: impl Into<String>, http_client: HttpClient, tokens: TokenProvider) -> Self {
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            http_client,
            tokens,
        }
    }

    /// Build a client from configuration.
    ///
    /// An unset credentials path selects the metadata server.
    pub fn from_config(cfg: &GcsConfig) -> StorageResult<Self> {
        let source = match cfg.credentials_path {
            Some(ref path) => TokenSource::ServiceAccount(ServiceAccountKey::from_file(path)?),
            None => TokenSource::metadata_server(),
        };

        let http_client = HttpClient::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| StorageError::Http(format!("Failed to create HTTP client: {e}")))?;

        tracing::info!(
            bucket = %cfg.bucket,
            project_id = %cfg.project_id,
            api_base = %cfg.api_base,
            "GCS storage client initialized"
        );

        Ok(Self::new(
            cfg.api_base.clone(),
            http_client.clone(),
            TokenProvider::new(source, http_client),
        ))
    }

    fn objects_url(&self, bucket: &str) -> String {
        format!(
            "{}/b/{}/o",
            self.api_base,
            utf8_percent_encode(bucket, SEGMENT_SET)
        )
    }

    fn object_url(&self, bucket: &str, name: &str) -> String {
        format!(
            "{}/{}",
            self.objects_url(bucket),
            utf8_percent_encode(name, SEGMENT_SET)
        )
    }

    async fn send(&self, request: reqwest::RequestBuilder, what: &str) -> StorageResult<reqwest::Response> {
        let token = self.tokens.access_token().await?;
        let response = request.bearer_auth(token).send().await?;

        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(StorageError::NotFound(what.to_string())),
            status => {
                let message = response.text().await.unwrap_or_default();
                Err(StorageError::Api {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    async fn list_page(&self, bucket: &str, page_token: Option<&str>) -> StorageResult<ObjectList> {
        let mut request = self.http_client.get(self.objects_url(bucket));
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = self.send(request, &format!("bucket {bucket}")).await?;
        Ok(response.json::<ObjectList>().await?)
    }
}

#[async_trait]
impl ObjectStore for GcsObjectStore {
    async fn list_objects(&self, bucket: &str) -> StorageResult<Vec<BucketObject>> {
        let mut objects = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.list_page(bucket, page_token.as_deref()).await?;
            objects.extend(page.items);

            match page.next_page_token {
                Some(next) if !next.is_empty() => page_token = Some(next),
                _ => break,
            }
        }

        tracing::debug!(bucket = %bucket, count = objects.len(), "Listed bucket objects");
        Ok(objects)
    }

    async fn get_object(&self, bucket: &str, name: &str) -> StorageResult<BucketObject> {
        let request = self.http_client.get(self.object_url(bucket, name));
        let response = self.send(request, &format!("object {name}")).await?;
        Ok(response.json::<BucketObject>().await?)
    }
}
