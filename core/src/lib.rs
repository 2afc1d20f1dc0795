//! Synchronous client core for the QuickBooks Online accounting API.
//!
//! # Overview
//! `EntityClient` turns create/read/update/delete/query calls against one
//! entity (Customer, Invoice, ...) into a single OAuth1-signed HTTP request
//! and decodes the JSON envelope into a typed `Record`.
//!
//! # Design
//! - Requests and responses are plain data (`HttpRequest` / `HttpResponse`);
//!   every operation also has `build_*` / `parse_*` halves so callers can run
//!   the round trip themselves.
//! - Signing and I/O sit behind the `Signer` and `HttpTransport` traits.
//!   `OAuth1Signer` (HMAC-SHA1) and `UreqTransport` are the defaults.
//! - Response kinds dispatch through a static registry; unknown kinds decode
//!   to `Record::Generic` instead of failing.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod oauth;
pub mod transport;
pub mod types;

pub use client::EntityClient;
pub use config::{ClientConfig, Credentials, API_VERSION};
pub use error::{ApiError, BoxError, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
pub use oauth::{ClientCredentials, OAuth1Signer, Signer, TokenCredentials};
pub use transport::UreqTransport;
pub use types::{
    Account, Bill, CreditMemo, Customer, Employee, Entity, Estimate, Fields, Invoice, Item,
    JournalEntry, Payment, Purchase, QueryResponse, Record, SalesReceipt, Vendor,
};
