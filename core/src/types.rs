//! Decoded API resources.
//!
//! # Design
//! Every response is an envelope with one meaningful top-level key naming the
//! resource kind, e.g. `{"Customer": {...}, "time": "..."}`. The kind is
//! looked up in `REGISTRY`, a static table from kind name to constructor.
//! Kinds with no entry decode to `Record::Generic`, so new resource types
//! never fail to decode; they just arrive untyped.
//!
//! Field maps keep the server's key order (`serde_json` is built with
//! `preserve_order`), which is what makes "first key" well defined.

use std::ops::Deref;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ApiError, Result};

/// Field name to value mapping of one resource.
pub type Fields = Map<String, Value>;

/// An untyped resource: the raw field map plus accessors for the fields every
/// resource carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entity {
    fields: Fields,
}

impl Entity {
    pub fn new(fields: Fields) -> Self {
        Self { fields }
    }

    /// Server-assigned identifier (`Id`).
    pub fn id(&self) -> Option<&str> {
        self.get_str("Id")
    }

    /// Optimistic-locking version (`SyncToken`), required by update and delete.
    pub fn sync_token(&self) -> Option<&str> {
        self.get_str("SyncToken")
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn into_fields(self) -> Fields {
        self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<Fields> for Entity {
    fn from(fields: Fields) -> Self {
        Self::new(fields)
    }
}

macro_rules! typed_records {
    ($($kind:ident),+ $(,)?) => {
        $(
            #[doc = concat!("A decoded `", stringify!($kind), "` resource.")]
            #[derive(Debug, Clone, PartialEq, Serialize)]
            #[serde(transparent)]
            pub struct $kind(Entity);

            impl $kind {
                pub const KIND: &'static str = stringify!($kind);

                pub fn new(fields: Fields) -> Self {
                    Self(Entity::new(fields))
                }

                pub fn into_entity(self) -> Entity {
                    self.0
                }
            }

            impl Deref for $kind {
                type Target = Entity;

                fn deref(&self) -> &Entity {
                    &self.0
                }
            }
        )+

        /// One decoded resource, typed when its kind is registered.
        #[derive(Debug, Clone, PartialEq)]
        pub enum Record {
            $($kind($kind),)+
            QueryResponse(QueryResponse),
            /// A kind with no registry entry. `kind` is empty when the
            /// envelope had no keys at all.
            Generic { kind: String, entity: Entity },
        }

        static REGISTRY: &[(&str, fn(Fields) -> Record)] = &[
            $((stringify!($kind), |fields| Record::$kind($kind::new(fields))),)+
            (QueryResponse::KIND, |fields| Record::QueryResponse(QueryResponse::new(fields))),
        ];

        impl Record {
            /// The envelope key this record was decoded from.
            pub fn kind(&self) -> &str {
                match self {
                    $(Record::$kind(_) => $kind::KIND,)+
                    Record::QueryResponse(_) => QueryResponse::KIND,
                    Record::Generic { kind, .. } => kind,
                }
            }

            pub fn entity(&self) -> &Entity {
                match self {
                    $(Record::$kind(r) => &r.0,)+
                    Record::QueryResponse(r) => &r.0,
                    Record::Generic { entity, .. } => entity,
                }
            }

            pub fn into_entity(self) -> Entity {
                match self {
                    $(Record::$kind(r) => r.0,)+
                    Record::QueryResponse(r) => r.0,
                    Record::Generic { entity, .. } => entity,
                }
            }
        }
    };
}

typed_records!(
    Account,
    Bill,
    CreditMemo,
    Customer,
    Employee,
    Estimate,
    Invoice,
    Item,
    JournalEntry,
    Payment,
    Purchase,
    SalesReceipt,
    Vendor,
);

impl Record {
    /// Build the record registered under `kind`, or a generic one.
    pub fn from_kind(kind: &str, fields: Fields) -> Record {
        match REGISTRY.iter().find(|(name, _)| *name == kind) {
            Some((_, construct)) => construct(fields),
            None => Record::Generic {
                kind: kind.to_string(),
                entity: Entity::new(fields),
            },
        }
    }

    /// Decode a response envelope. The first key names the kind and its
    /// value supplies the fields; a non-object value contributes no fields.
    pub fn from_value(value: Value) -> Result<Record> {
        let Value::Object(envelope) = value else {
            return Err(ApiError::Deserialization(
                "expected a JSON object at the top level".to_string(),
            ));
        };

        match envelope.into_iter().next() {
            Some((kind, Value::Object(fields))) => Ok(Record::from_kind(&kind, fields)),
            Some((kind, _)) => Ok(Record::from_kind(&kind, Fields::new())),
            None => Ok(Record::Generic {
                kind: String::new(),
                entity: Entity::default(),
            }),
        }
    }

    pub fn from_json(body: &str) -> Result<Record> {
        let value: Value =
            serde_json::from_str(body).map_err(|e| ApiError::Deserialization(e.to_string()))?;
        Record::from_value(value)
    }

    pub fn is_generic(&self) -> bool {
        matches!(self, Record::Generic { .. })
    }
}

impl Customer {
    pub fn display_name(&self) -> Option<&str> {
        self.get_str("DisplayName")
    }
}

impl Vendor {
    pub fn display_name(&self) -> Option<&str> {
        self.get_str("DisplayName")
    }
}

impl Invoice {
    pub fn doc_number(&self) -> Option<&str> {
        self.get_str("DocNumber")
    }

    pub fn total_amount(&self) -> Option<f64> {
        self.get("TotalAmt").and_then(Value::as_f64)
    }

    /// `value` of the `CustomerRef` reference.
    pub fn customer_ref(&self) -> Option<&str> {
        self.get("CustomerRef")
            .and_then(|r| r.get("value"))
            .and_then(Value::as_str)
    }
}

impl Item {
    pub fn unit_price(&self) -> Option<f64> {
        self.get("UnitPrice").and_then(Value::as_f64)
    }
}

/// Result of a `select` query: arrays of resources keyed by kind plus paging
/// counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct QueryResponse(Entity);

impl QueryResponse {
    pub const KIND: &'static str = "QueryResponse";

    pub fn new(fields: Fields) -> Self {
        Self(Entity::new(fields))
    }

    pub fn start_position(&self) -> Option<u64> {
        self.0.get("startPosition").and_then(Value::as_u64)
    }

    pub fn max_results(&self) -> Option<u64> {
        self.0.get("maxResults").and_then(Value::as_u64)
    }

    pub fn total_count(&self) -> Option<u64> {
        self.0.get("totalCount").and_then(Value::as_u64)
    }

    /// Resources of one kind, in document order. Empty when the kind is absent.
    pub fn entities(&self, kind: &str) -> Vec<Entity> {
        self.0
            .get(kind)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_object)
                    .map(|fields| Entity::new(fields.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every array member decoded through the registry.
    pub fn records(&self) -> Vec<Record> {
        self.0
            .fields()
            .iter()
            .filter_map(|(kind, value)| value.as_array().map(|items| (kind, items)))
            .flat_map(|(kind, items)| {
                items
                    .iter()
                    .filter_map(Value::as_object)
                    .map(move |fields| Record::from_kind(kind, fields.clone()))
            })
            .collect()
    }

    pub fn into_entity(self) -> Entity {
        self.0
    }
}
