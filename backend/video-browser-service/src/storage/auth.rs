/// OAuth2 access tokens for the storage API
///
/// Service-account keys use the JWT-bearer grant against the key's
/// `token_uri`. Without a key file, tokens come from the compute metadata
/// server. Tokens are cached until shortly before they expire.
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::{StorageError, StorageResult};

/// Read-only access to bucket objects
pub const STORAGE_READ_ONLY_SCOPE: &str = "https://www.googleapis.com/auth/devstorage.read_only";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Refresh this long before the token actually expires
const EXPIRY_MARGIN_SECS: i64 = 60;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The fields of a service-account JSON key that matter here
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    pub fn from_json(raw: &str) -> StorageResult<Self> {
        serde_json::from_str(raw)
            .map_err(|e| StorageError::Credentials(format!("Invalid service account JSON: {e}")))
    }

    pub fn from_file(path: &Path) -> StorageResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            StorageError::Credentials(format!(
                "Failed to read service account JSON at {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json(&raw)
    }
}

/// Where access tokens come from
#[derive(Debug, Clone)]
pub enum TokenSource {
    ServiceAccount(ServiceAccountKey),
    MetadataServer { url: String },
}

impl TokenSource {
    pub fn metadata_server() -> Self {
        TokenSource::MetadataServer {
            url: METADATA_TOKEN_URL.to_string(),
        }
    }
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Clone)]
struct CachedToken {
    value: String,
    refresh_at: DateTime<Utc>,
}

/// Hands out access tokens, minting new ones when the cached one is stale
pub struct TokenProvider {
    source: TokenSource,
    http_client: reqwest::Client,
    cached: RwLock<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(source: TokenSource, http_client: reqwest::Client) -> Self {
        Self {
            source,
            http_client,
            cached: RwLock::new(None),
        }
    }

    pub fn source(&self) -> &TokenSource {
        &self.source
    }

    /// A valid bearer token, refreshed if the cached one is about to expire
    pub async fn access_token(&self) -> StorageResult<String> {
        let now = Utc::now();
        if let Some(token) = self.cached.read().await.as_ref() {
            if token.refresh_at > now {
                return Ok(token.value.clone());
            }
        }

        let mut cached = self.cached.write().await;
        if let Some(token) = cached.as_ref() {
            if token.refresh_at > now {
                return Ok(token.value.clone());
            }
        }

        let response = match &self.source {
            TokenSource::ServiceAccount(key) => self.exchange_assertion(key, now).await?,
            TokenSource::MetadataServer { url } => self.fetch_from_metadata(url).await?,
        };

        let lifetime = response.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS);
        let refresh_at = now + Duration::seconds((lifetime - EXPIRY_MARGIN_SECS).max(0));
        tracing::debug!(refresh_at = %refresh_at, "Obtained storage access token");

        *cached = Some(CachedToken {
            value: response.access_token.clone(),
            refresh_at,
        });
        Ok(response.access_token)
    }

    async fn exchange_assertion(
        &self,
        key: &ServiceAccountKey,
        now: DateTime<Utc>,
    ) -> StorageResult<TokenResponse> {
        let claims = AssertionClaims {
            iss: &key.client_email,
            scope: STORAGE_READ_ONLY_SCOPE,
            aud: &key.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };

        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| StorageError::Credentials(format!("Invalid service account key: {e}")))?;
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
            .map_err(|e| StorageError::Auth(format!("Failed to sign token assertion: {e}")))?;

        let response = self
            .http_client
            .post(&key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| StorageError::Auth(format!("Token request failed: {e}")))?;

        Self::parse_token_response(response).await
    }

    async fn fetch_from_metadata(&self, url: &str) -> StorageResult<TokenResponse> {
        let response = self
            .http_client
            .get(url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| StorageError::Auth(format!("Metadata request failed: {e}")))?;

        Self::parse_token_response(response).await
    }

    async fn parse_token_response(response: reqwest::Response) -> StorageResult<TokenResponse> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Auth(format!(
                "Token endpoint returned {status}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| StorageError::Auth(format!("Failed to parse token response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_account_defaults_token_uri() {
        let key = ServiceAccountKey::from_json(
            r#"{"client_email": "svc@example.iam.gserviceaccount.com", "private_key": "pem"}"#,
        )
        .unwrap();

        assert_eq!(key.token_uri, DEFAULT_TOKEN_URI);
        assert!(key.project_id.is_none());
    }

    #[test]
    fn test_service_account_rejects_missing_fields() {
        let err = ServiceAccountKey::from_json(r#"{"client_email": "svc@example.com"}"#).unwrap_err();
        assert!(matches!(err, StorageError::Credentials(_)));
    }

    #[test]
    fn test_debug_hides_private_key() {
        let key = ServiceAccountKey::from_json(
            r#"{"client_email": "svc@example.com", "private_key": "SECRET-MATERIAL"}"#,
        )
        .unwrap();
        assert!(!format!("{key:?}").contains("SECRET-MATERIAL"));
    }

    #[test]
    fn test_missing_credentials_file() {
        let err = ServiceAccountKey::from_file(Path::new("/nonexistent/key.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/key.json"));
    }

    #[tokio::test]
    async fn test_malformed_key_fails_before_any_request() {
        let key = ServiceAccountKey::from_json(
            r#"{"client_email": "svc@example.com", "private_key": "garbage", "token_uri": "http://127.0.0.1:1/token"}"#,
        )
        .unwrap();
        let provider = TokenProvider::new(TokenSource::ServiceAccount(key), reqwest::Client::new());

        let err = provider.access_token().await.unwrap_err();
        assert!(matches!(err, StorageError::Credentials(_)));
    }
}
