//! OAuth 1.0a request signing.
//!
//! # Design
//! `Signer` is the seam the client depends on: given the method, the full URL
//! and both credential pairs it returns the `Authorization` header value.
//! `OAuth1Signer` is the default implementation using HMAC-SHA1, the only
//! method the accounting API accepts. Query parameters in the URL take part
//! in the signature base string, so the URL passed in must be the exact URL
//! that is sent.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::http::HttpMethod;

type HmacSha1 = Hmac<Sha1>;

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";

/// Consumer key and secret issued to the application.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    identifier: String,
    secret: String,
}

impl ClientCredentials {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

/// Access token and secret authorizing access to one company.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenCredentials {
    identifier: String,
    secret: String,
}

impl TokenCredentials {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

/// Produces the `Authorization` header for one request.
pub trait Signer: Send + Sync {
    fn authorization_header(
        &self,
        method: HttpMethod,
        url: &str,
        client: &ClientCredentials,
        token: &TokenCredentials,
    ) -> Result<String>;
}

/// HMAC-SHA1 OAuth 1.0a signer with a fresh nonce and timestamp per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct OAuth1Signer;

impl OAuth1Signer {
    pub fn new() -> Self {
        Self
    }

    /// Sign with an explicit nonce and timestamp.
    pub fn sign(
        &self,
        method: HttpMethod,
        url: &str,
        client: &ClientCredentials,
        token: &TokenCredentials,
        nonce: &str,
        timestamp: u64,
    ) -> Result<String> {
        let timestamp = timestamp.to_string();
        let mut oauth_params = vec![
            ("oauth_consumer_key", client.identifier()),
            ("oauth_nonce", nonce),
            ("oauth_signature_method", SIGNATURE_METHOD),
            ("oauth_timestamp", timestamp.as_str()),
            ("oauth_token", token.identifier()),
            ("oauth_version", OAUTH_VERSION),
        ];

        let base = base_string(method, url, &oauth_params)?;
        let key = format!("{}&{}", encode(client.secret()), encode(token.secret()));

        let mut mac = HmacSha1::new_from_slice(key.as_bytes())
            .map_err(|e| ApiError::Signing(e.to_string()))?;
        mac.update(base.as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());

        oauth_params.push(("oauth_signature", signature.as_str()));
        oauth_params.sort();

        let fields: Vec<String> = oauth_params
            .iter()
            .map(|(k, v)| format!("{k}=\"{}\"", encode(v)))
            .collect();
        Ok(format!("OAuth {}", fields.join(", ")))
    }
}

impl Signer for OAuth1Signer {
    fn authorization_header(
        &self,
        method: HttpMethod,
        url: &str,
        client: &ClientCredentials,
        token: &TokenCredentials,
    ) -> Result<String> {
        let nonce = Uuid::new_v4().simple().to_string();
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| ApiError::Signing(e.to_string()))?
            .as_secs();
        self.sign(method, url, client, token, &nonce, timestamp)
    }
}

/// RFC 3986 percent-encoding: everything but `A-Z a-z 0-9 - . _ ~`.
fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

fn decode(value: &str) -> Result<String> {
    urlencoding::decode(value)
        .map(|v| v.into_owned())
        .map_err(|e| ApiError::Signing(format!("invalid query encoding: {e}")))
}

/// `METHOD&enc(base_url)&enc(normalized parameters)`
fn base_string(method: HttpMethod, url: &str, oauth_params: &[(&str, &str)]) -> Result<String> {
    let (base_url, query) = match url.split_once('?') {
        Some((base, query)) => (base, query),
        None => (url, ""),
    };

    let mut params: Vec<(String, String)> = oauth_params
        .iter()
        .map(|(k, v)| (encode(k), encode(v)))
        .collect();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
        params.push((encode(&decode(k)?), encode(&decode(v)?)));
    }
    params.sort();

    let normalized: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
    Ok(format!(
        "{}&{}&{}",
        method.as_str(),
        encode(base_url),
        encode(&normalized.join("&"))
    ))
}
