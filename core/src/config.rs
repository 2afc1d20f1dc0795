//! Credentials and client configuration.

use std::fmt;
use std::time::Duration;

use crate::error::{ApiError, Result};
use crate::oauth::{ClientCredentials, TokenCredentials};

/// Version segment used in every API URL.
pub const API_VERSION: u32 = 3;

pub const PRODUCTION_BASE_URL: &str = "https://quickbooks.api.intuit.com";
pub const SANDBOX_BASE_URL: &str = "https://sandbox-quickbooks.api.intuit.com";

/// The five values needed to sign requests for one company.
///
/// All fields are required and immutable once constructed. `Debug` redacts
/// both secrets.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    consumer_key: String,
    consumer_secret: String,
    access_token: String,
    access_token_secret: String,
    realm_id: String,
}

impl Credentials {
    pub fn new(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        access_token: impl Into<String>,
        access_token_secret: impl Into<String>,
        realm_id: impl Into<String>,
    ) -> Result<Self> {
        let credentials = Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            access_token: access_token.into(),
            access_token_secret: access_token_secret.into(),
            realm_id: realm_id.into(),
        };

        for (name, value) in [
            ("consumer_key", &credentials.consumer_key),
            ("consumer_secret", &credentials.consumer_secret),
            ("access_token", &credentials.access_token),
            ("access_token_secret", &credentials.access_token_secret),
            ("realm_id", &credentials.realm_id),
        ] {
            if value.is_empty() {
                return Err(ApiError::missing(name));
            }
        }

        Ok(credentials)
    }

    pub fn consumer_key(&self) -> &str {
        &self.consumer_key
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn realm_id(&self) -> &str {
        &self.realm_id
    }

    /// Consumer key and secret, as the signer expects them.
    pub fn client_credentials(&self) -> ClientCredentials {
        ClientCredentials::new(&self.consumer_key, &self.consumer_secret)
    }

    /// Access token and secret, as the signer expects them.
    pub fn token_credentials(&self) -> TokenCredentials {
        TokenCredentials::new(&self.access_token, &self.access_token_secret)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("access_token", &self.access_token)
            .field("access_token_secret", &"<redacted>")
            .field("realm_id", &self.realm_id)
            .finish()
    }
}

/// Client configuration options.
///
/// # Example
///
/// ```
/// use quickbooks_core::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::sandbox()
///     .with_timeout(Duration::from_secs(10))
///     .with_user_agent("my-app/1.0");
/// assert_eq!(config.api_base_url(), "https://sandbox-quickbooks.api.intuit.com/v3");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Scheme and host, without a trailing slash
    pub base_url: String,
    /// Version number placed after `/v`
    pub api_version: u32,
    /// Optional User-Agent header value
    pub user_agent: Option<String>,
    /// Global timeout applied by the default transport
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: PRODUCTION_BASE_URL.to_string(),
            api_version: API_VERSION,
            user_agent: None,
            timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sandbox() -> Self {
        Self::default().with_base_url(SANDBOX_BASE_URL)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_version(mut self, version: u32) -> Self {
        self.api_version = version;
        self
    }

    /// Set the User-Agent header. An empty value disables the header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        let user_agent = user_agent.into();
        self.user_agent = (!user_agent.is_empty()).then_some(user_agent);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `<base_url>/v<api_version>`
    pub fn api_base_url(&self) -> String {
        format!("{}/v{}", self.base_url, self.api_version)
    }
}
