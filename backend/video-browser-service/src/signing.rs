/// Signed URL generation for direct object playback
///
/// Produces GCS V2 signed URLs: an RSA-SHA256 signature over
/// `GET\n\n\n{expires}\n/{bucket}/{object}` carried in the query string
/// together with the signing identity and the expiry.
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::RsaPrivateKey;
use sha2::Sha256;
use thiserror::Error;

/// Bytes left as-is by query escaping; everything else is percent-encoded
const QUERY_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Host serving signed object downloads
pub const SIGNED_URL_HOST: &str = "storage.googleapis.com";

/// Signed URLs stay valid for six hours
pub const SIGNED_URL_TTL_SECS: i64 = 6 * 60 * 60;

/// Errors raised while signing a URL
#[derive(Debug, Error)]
pub enum SigningError {
    #[error("invalid private key: {0}")]
    InvalidKey(String),

    #[error("signing failed: {0}")]
    Signing(String),
}

/// A signed download URL with its expiry
#[derive(Debug, Clone)]
pub struct SignedUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs read-only URLs for objects in one bucket
pub struct UrlSigner {
    google_access_id: String,
    bucket: String,
    private_key: Result<RsaPrivateKey, String>,
}

impl UrlSigner {
    /// Build a signer from PEM key material.
    ///
    /// A key that does not parse is kept as a failure and reported on every
    /// sign attempt, so pages still render without playable links.
    pub fn new(google_access_id: impl Into<String>, bucket: impl Into<String>, pem: &str) -> Self {
        let private_key = RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .map_err(|e| e.to_string());

        if let Err(ref e) = private_key {
            tracing::warn!(error = %e, "Signing key did not parse; signed URLs will be empty");
        }

        Self {
            google_access_id: google_access_id.into(),
            bucket: bucket.into(),
            private_key,
        }
    }

    pub fn google_access_id(&self) -> &str {
        &self.google_access_id
    }

    /// Sign a GET URL for `object_name` valid for six hours from now
    pub fn sign(&self, object_name: &str) -> Result<SignedUrl, SigningError> {
        self.sign_at(object_name, Utc::now())
    }

    /// Sign a GET URL as if the current time were `now`
    pub fn sign_at(&self, object_name: &str, now: DateTime<Utc>) -> Result<SignedUrl, SigningError> {
        let private_key = self
            .private_key
            .as_ref()
            .map_err(|e| SigningError::InvalidKey(e.clone()))?;

        let expires_at = now + Duration::seconds(SIGNED_URL_TTL_SECS);
        let expires = expires_at.timestamp();
        let escaped_name = escape_object_name(object_name);

        let string_to_sign = string_to_sign(&self.bucket, &escaped_name, expires);

        let signing_key = SigningKey::<Sha256>::new(private_key.clone());
        let signature = signing_key
            .try_sign(string_to_sign.as_bytes())
            .map_err(|e| SigningError::Signing(e.to_string()))?
            .to_bytes();
        let encoded_signature = STANDARD.encode(signature);

        let url = format!(
            "https://{SIGNED_URL_HOST}/{bucket}/{escaped_name}?GoogleAccessId={access_id}&Expires={expires}&Signature={signature}",
            bucket = self.bucket,
            access_id = query_escape(&self.google_access_id),
            signature = query_escape(&encoded_signature),
        );

        Ok(SignedUrl { url, expires_at })
    }

    /// Sign `object_name`, logging failures and returning an empty string.
    ///
    /// Callers treat the empty string as "no playable link".
    pub fn sign_or_empty(&self, object_name: &str) -> String {
        self.sign_or_empty_at(object_name, Utc::now())
    }

    pub fn sign_or_empty_at(&self, object_name: &str, now: DateTime<Utc>) -> String {
        match self.sign_at(object_name, now) {
            Ok(signed) => signed.url,
            Err(e) => {
                tracing::warn!(object_name = %object_name, error = %e, "Error signing URL");
                String::new()
            }
        }
    }
}

/// Canonical string covered by a V2 signature for a plain GET
fn string_to_sign(bucket: &str, escaped_name: &str, expires: i64) -> String {
    format!("GET\n\n\n{expires}\n/{bucket}/{escaped_name}")
}

/// Form-style escaping: spaces become `+`, reserved bytes are percent-encoded
pub fn query_escape(input: &str) -> String {
    input
        .split(' ')
        .map(|part| utf8_percent_encode(part, QUERY_SET).to_string())
        .collect::<Vec<_>>()
        .join("+")
}

/// Escape an object name for the URL path.
///
/// Storage expects `%20` for spaces in paths, so every `+` left by query
/// escaping is rewritten. Literal `+` in names is already `%2B` here.
pub fn escape_object_name(object_name: &str) -> String {
    query_escape(object_name).replace('+', "%20")
}
