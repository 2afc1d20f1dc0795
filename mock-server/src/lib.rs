use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};

pub type Fields = Map<String, Value>;

/// Resources by entity name, then by numeric id.
#[derive(Default)]
pub struct Store {
    next_id: u64,
    entities: HashMap<String, BTreeMap<u64, Fields>>,
}

pub type Db = Arc<RwLock<Store>>;

type ApiResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

#[derive(Deserialize)]
pub struct OperationParams {
    pub operation: Option<String>,
}

#[derive(Deserialize)]
pub struct QueryParams {
    pub query: String,
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/v3", get(run_query))
        .route("/v3/{entity}", post(write_entity))
        .route("/v3/{entity}/{id}", get(read_entity))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock accounting api listening");
    }
    axum::serve(listener, app()).await
}

/// QuickBooks-style fault body.
pub fn fault(status: StatusCode, kind: &str, message: &str) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({
            "Fault": {
                "Error": [{"Message": message, "Detail": message}],
                "type": kind
            }
        })),
    )
}

fn authorize(headers: &HeaderMap) -> Result<(), (StatusCode, Json<Value>)> {
    let signed = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("OAuth "));
    if signed {
        Ok(())
    } else {
        Err(fault(
            StatusCode::UNAUTHORIZED,
            "AUTHENTICATION",
            "Authentication Failed",
        ))
    }
}

fn envelope(entity: &str, fields: Fields) -> Json<Value> {
    let mut body = Map::new();
    body.insert(entity.to_string(), Value::Object(fields));
    Json(Value::Object(body))
}

fn parse_id(fields: &Fields) -> Option<u64> {
    fields.get("Id").and_then(Value::as_str)?.parse().ok()
}

async fn write_entity(
    State(db): State<Db>,
    Path(entity): Path<String>,
    Query(params): Query<OperationParams>,
    headers: HeaderMap,
    Json(input): Json<Fields>,
) -> ApiResult {
    authorize(&headers)?;
    debug!(%entity, operation = ?params.operation, "write");
    match params.operation.as_deref() {
        None => create(db, entity, input).await,
        Some("update") => update(db, entity, input).await,
        Some("delete") => delete(db, entity, input).await,
        Some(other) => Err(fault(
            StatusCode::BAD_REQUEST,
            "ValidationFault",
            &format!("Unsupported operation: {other}"),
        )),
    }
}

async fn create(db: Db, entity: String, mut input: Fields) -> ApiResult {
    let mut store = db.write().await;
    store.next_id += 1;
    let id = store.next_id;
    input.insert("Id".to_string(), json!(id.to_string()));
    input.insert("SyncToken".to_string(), json!("0"));
    store
        .entities
        .entry(entity.clone())
        .or_default()
        .insert(id, input.clone());
    Ok(envelope(&entity, input))
}

async fn update(db: Db, entity: String, input: Fields) -> ApiResult {
    let mut store = db.write().await;
    let id = parse_id(&input).ok_or_else(|| {
        fault(StatusCode::BAD_REQUEST, "ValidationFault", "Id is required")
    })?;
    let existing = store
        .entities
        .get_mut(&entity)
        .and_then(|rows| rows.get_mut(&id))
        .ok_or_else(|| fault(StatusCode::BAD_REQUEST, "ValidationFault", "Object Not Found"))?;

    if input.get("SyncToken") != existing.get("SyncToken") {
        return Err(fault(
            StatusCode::BAD_REQUEST,
            "ValidationFault",
            "Stale Object Error",
        ));
    }

    let version: u64 = existing
        .get("SyncToken")
        .and_then(Value::as_str)
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    for (key, value) in input {
        existing.insert(key, value);
    }
    existing.insert("SyncToken".to_string(), json!((version + 1).to_string()));
    Ok(envelope(&entity, existing.clone()))
}

async fn delete(db: Db, entity: String, input: Fields) -> ApiResult {
    let mut store = db.write().await;
    let id = parse_id(&input).ok_or_else(|| {
        fault(StatusCode::BAD_REQUEST, "ValidationFault", "Id is required")
    })?;
    store
        .entities
        .get_mut(&entity)
        .and_then(|rows| rows.remove(&id))
        .ok_or_else(|| fault(StatusCode::BAD_REQUEST, "ValidationFault", "Object Not Found"))?;

    let mut body = Map::new();
    body.insert("Id".to_string(), json!(id.to_string()));
    body.insert("status".to_string(), json!("Deleted"));
    Ok(envelope(&entity, body))
}

async fn read_entity(
    State(db): State<Db>,
    Path((entity, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> ApiResult {
    authorize(&headers)?;
    let store = db.read().await;
    let fields = id
        .parse::<u64>()
        .ok()
        .and_then(|id| store.entities.get(&entity)?.get(&id))
        .cloned()
        .ok_or_else(|| fault(StatusCode::BAD_REQUEST, "ValidationFault", "Object Not Found"))?;
    Ok(envelope(&entity, fields))
}

/// Supports `select * from <Entity>` only, which is all the client emits by
/// default.
async fn run_query(
    State(db): State<Db>,
    Query(params): Query<QueryParams>,
    headers: HeaderMap,
) -> ApiResult {
    authorize(&headers)?;
    let entity = parse_select_all(&params.query).ok_or_else(|| {
        fault(
            StatusCode::BAD_REQUEST,
            "QueryParserError",
            &format!("Invalid query: {}", params.query),
        )
    })?;

    let store = db.read().await;
    let rows: Vec<Value> = store
        .entities
        .get(entity)
        .map(|rows| rows.values().cloned().map(Value::Object).collect())
        .unwrap_or_default();

    let mut response = Map::new();
    if !rows.is_empty() {
        let count = rows.len();
        response.insert(entity.to_string(), Value::Array(rows));
        response.insert("startPosition".to_string(), json!(1));
        response.insert("maxResults".to_string(), json!(count));
    }
    Ok(envelope("QueryResponse", response))
}

/// Entity name from `select * from <Entity>`, case-insensitive on keywords.
pub fn parse_select_all(query: &str) -> Option<&str> {
    let mut words = query.split_whitespace();
    let select = words.next()?;
    let star = words.next()?;
    let from = words.next()?;
    let entity = words.next()?;
    if words.next().is_some()
        || !select.eq_ignore_ascii_case("select")
        || star != "*"
        || !from.eq_ignore_ascii_case("from")
    {
        return None;
    }
    Some(entity)
}
