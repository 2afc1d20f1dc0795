//! Signed request builder and response parser for the accounting API.
//!
//! # Design
//! Each operation is split into a `build_*` method that produces a signed
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`;
//! `create`, `read`, `update`, `delete` and `query` glue the two halves
//! together through the configured `HttpTransport`. The entity name is set
//! through the consuming `with_entity` builder, so one configured client can
//! be cloned once per entity instead of being mutated between calls.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::config::{ClientConfig, Credentials};
use crate::error::{ApiError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use crate::oauth::{OAuth1Signer, Signer};
use crate::transport::UreqTransport;
use crate::types::Record;

const JSON: &str = "application/json";

/// Synchronous client for one company's resources.
///
/// # Example
///
/// ```no_run
/// use quickbooks_core::{EntityClient, Record};
/// use serde_json::json;
///
/// # fn example() -> quickbooks_core::Result<()> {
/// let customers = EntityClient::configure("key", "secret", "token", "token-secret", "1234")?
///     .with_user_agent(Some("my-app/1.0"))
///     .with_entity("Customer");
///
/// if let Record::Customer(customer) = customers.create(&json!({"DisplayName": "Acme"}))? {
///     println!("created {:?}", customer.id());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct EntityClient {
    credentials: Credentials,
    config: ClientConfig,
    entity: String,
    signer: Arc<dyn Signer>,
    transport: Arc<dyn HttpTransport>,
}

impl EntityClient {
    /// Build a client from the five required credential strings using the
    /// default configuration, signer and transport.
    pub fn configure(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        access_token: impl Into<String>,
        access_token_secret: impl Into<String>,
        realm_id: impl Into<String>,
    ) -> Result<Self> {
        let credentials = Credentials::new(
            consumer_key,
            consumer_secret,
            access_token,
            access_token_secret,
            realm_id,
        )?;
        Ok(Self::from_credentials(credentials, ClientConfig::default()))
    }

    pub fn from_credentials(credentials: Credentials, config: ClientConfig) -> Self {
        let transport = UreqTransport::new(config.timeout);
        Self {
            credentials,
            config,
            entity: String::new(),
            signer: Arc::new(OAuth1Signer::new()),
            transport: Arc::new(transport),
        }
    }

    /// Set or clear the `User-Agent` header. `None` and `""` both clear it.
    pub fn with_user_agent(mut self, user_agent: Option<&str>) -> Self {
        self.config.user_agent = user_agent.filter(|ua| !ua.is_empty()).map(str::to_string);
        self
    }

    /// Select the target resource. Empty names are rejected when a URL is built.
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = entity.into();
        self
    }

    pub fn with_signer(mut self, signer: impl Signer + 'static) -> Self {
        self.signer = Arc::new(signer);
        self
    }

    pub fn with_transport(mut self, transport: impl HttpTransport + 'static) -> Self {
        self.transport = Arc::new(transport);
        self
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.config.user_agent.as_deref()
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn api_base_url(&self) -> String {
        self.config.api_base_url()
    }

    pub fn entity_url(&self) -> Result<String> {
        Ok(format!("{}/{}", self.api_base_url(), self.require_entity()?))
    }

    fn require_entity(&self) -> Result<&str> {
        if self.entity.is_empty() {
            return Err(ApiError::missing("entity name"));
        }
        Ok(&self.entity)
    }

    // -----------------------------------------------------------------------
    // Request building
    // -----------------------------------------------------------------------

    pub fn build_create<P: Serialize + ?Sized>(&self, payload: &P) -> Result<HttpRequest> {
        let url = self.entity_url()?;
        self.signed(HttpMethod::Post, url, Some(encode_body(payload)?))
    }

    /// The id is percent-encoded as a single path segment.
    pub fn build_read(&self, id: &str) -> Result<HttpRequest> {
        let entity_url = self.entity_url()?;
        if id.is_empty() {
            return Err(ApiError::missing("id"));
        }
        let url = format!("{entity_url}/{}", urlencoding::encode(id));
        self.signed(HttpMethod::Get, url, None)
    }

    pub fn build_update<P: Serialize + ?Sized>(&self, payload: &P) -> Result<HttpRequest> {
        let url = format!("{}?operation=update", self.entity_url()?);
        self.signed(HttpMethod::Post, url, Some(encode_body(payload)?))
    }

    pub fn build_delete<P: Serialize + ?Sized>(&self, payload: &P) -> Result<HttpRequest> {
        let url = format!("{}?operation=delete", self.entity_url()?);
        self.signed(HttpMethod::Post, url, Some(encode_body(payload)?))
    }

    /// Without `query`, selects every row of the current entity. The query
    /// text is percent-encoded into the URL.
    pub fn build_query(&self, query: Option<&str>) -> Result<HttpRequest> {
        let query = match query {
            Some(query) => query.to_string(),
            None => format!("select * from {}", self.require_entity()?),
        };
        let url = format!("{}?query={}", self.api_base_url(), urlencoding::encode(&query));
        self.signed(HttpMethod::Get, url, None)
    }

    /// Accept, Content-Type, Authorization and, when configured, User-Agent.
    pub fn headers(&self, method: HttpMethod, url: &str) -> Result<Vec<(String, String)>> {
        let authorization = self.signer.authorization_header(
            method,
            url,
            &self.credentials.client_credentials(),
            &self.credentials.token_credentials(),
        )?;

        let mut headers = vec![
            ("Accept".to_string(), JSON.to_string()),
            ("Content-Type".to_string(), JSON.to_string()),
            ("Authorization".to_string(), authorization),
        ];
        if let Some(user_agent) = &self.config.user_agent {
            headers.push(("User-Agent".to_string(), user_agent.clone()));
        }
        Ok(headers)
    }

    fn signed(&self, method: HttpMethod, url: String, body: Option<String>) -> Result<HttpRequest> {
        let headers = self.headers(method, &url)?;
        Ok(HttpRequest {
            method,
            url,
            headers,
            body,
        })
    }

    // -----------------------------------------------------------------------
    // Response parsing
    // -----------------------------------------------------------------------

    pub fn parse_record(&self, response: HttpResponse) -> Result<Record> {
        check_status(&response)?;
        Record::from_json(&response.body)
    }

    /// Delete responses are status-checked only; the body is discarded.
    pub fn parse_delete(&self, response: HttpResponse) -> Result<()> {
        check_status(&response)
    }

    // -----------------------------------------------------------------------
    // Round trips
    // -----------------------------------------------------------------------

    #[instrument(skip(self, payload), fields(entity = %self.entity))]
    pub fn create<P: Serialize + ?Sized>(&self, payload: &P) -> Result<Record> {
        let request = self.build_create(payload)?;
        self.parse_record(self.execute(&request)?)
    }

    #[instrument(skip(self), fields(entity = %self.entity))]
    pub fn read(&self, id: &str) -> Result<Record> {
        let request = self.build_read(id)?;
        self.parse_record(self.execute(&request)?)
    }

    #[instrument(skip(self, payload), fields(entity = %self.entity))]
    pub fn update<P: Serialize + ?Sized>(&self, payload: &P) -> Result<Record> {
        let request = self.build_update(payload)?;
        self.parse_record(self.execute(&request)?)
    }

    #[instrument(skip(self, payload), fields(entity = %self.entity))]
    pub fn delete<P: Serialize + ?Sized>(&self, payload: &P) -> Result<()> {
        let request = self.build_delete(payload)?;
        self.parse_delete(self.execute(&request)?)
    }

    #[instrument(skip(self), fields(entity = %self.entity))]
    pub fn query(&self, query: Option<&str>) -> Result<Record> {
        let request = self.build_query(query)?;
        self.parse_record(self.execute(&request)?)
    }

    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        debug!(method = %request.method, url = %request.url, "request");
        let response = self.transport.send(request).map_err(ApiError::Transport)?;
        debug!(status = response.status, "response");
        Ok(response)
    }
}

impl fmt::Debug for EntityClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityClient")
            .field("credentials", &self.credentials)
            .field("config", &self.config)
            .field("entity", &self.entity)
            .finish_non_exhaustive()
    }
}

fn encode_body<P: Serialize + ?Sized>(payload: &P) -> Result<String> {
    serde_json::to_string(payload).map_err(|e| ApiError::Serialization(e.to_string()))
}

/// Any 2xx passes; everything else becomes `RemoteRequest` with the raw body.
fn check_status(response: &HttpResponse) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }
    warn!(status = response.status, "request rejected");
    Err(ApiError::RemoteRequest {
        status: response.status,
        body: response.body.clone(),
    })
}
