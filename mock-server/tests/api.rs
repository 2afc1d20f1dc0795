use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::app;
use serde_json::{json, Value};
use tower::ServiceExt;

const AUTH: &str = "OAuth oauth_consumer_key=\"key\", oauth_token=\"token\"";

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .header(http::header::AUTHORIZATION, AUTH)
        .body(body.to_string())
        .unwrap()
}

fn get_request(uri: &str) -> Request<String> {
    Request::builder()
        .uri(uri)
        .header(http::header::AUTHORIZATION, AUTH)
        .body(String::new())
        .unwrap()
}

// --- auth ---

#[tokio::test]
async fn unsigned_request_returns_401() {
    let resp = app()
        .oneshot(Request::builder().uri("/v3/Customer/1").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert_eq!(body["Fault"]["type"], "AUTHENTICATION");
}

// --- create ---

#[tokio::test]
async fn create_assigns_id_and_sync_token() {
    let resp = app()
        .oneshot(json_request("/v3/Customer", r#"{"DisplayName":"Acme"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(
        body,
        json!({"Customer": {"DisplayName": "Acme", "Id": "1", "SyncToken": "0"}})
    );
}

#[tokio::test]
async fn create_non_object_body_is_rejected() {
    let resp = app()
        .oneshot(json_request("/v3/Customer", "[1,2]"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn unknown_operation_returns_400() {
    let resp = app()
        .oneshot(json_request("/v3/Customer?operation=void", r#"{"Id":"1"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- read ---

#[tokio::test]
async fn read_missing_returns_400() {
    let resp = app().oneshot(get_request("/v3/Invoice/42")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["Fault"]["Error"][0]["Message"], "Object Not Found");
}

// --- update / delete ---

#[tokio::test]
async fn update_without_id_returns_400() {
    let resp = app()
        .oneshot(json_request("/v3/Customer?operation=update", r#"{"SyncToken":"0"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_missing_returns_400() {
    let resp = app()
        .oneshot(json_request(
            "/v3/Customer?operation=delete",
            r#"{"Id":"7","SyncToken":"0"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- query ---

#[tokio::test]
async fn query_empty_entity_returns_empty_response() {
    let resp = app()
        .oneshot(get_request("/v3?query=select%20%2A%20from%20Customer"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({"QueryResponse": {}}));
}

#[tokio::test]
async fn unsupported_query_returns_400() {
    let resp = app()
        .oneshot(get_request("/v3?query=select%20Id%20from%20Customer"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["Fault"]["type"], "QueryParserError");
}

// --- full lifecycle ---

#[tokio::test]
async fn crud_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    // create
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("/v3/Customer", r#"{"DisplayName":"Acme"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let created = body_json(resp).await;
    let id = created["Customer"]["Id"].as_str().unwrap().to_string();

    // read
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get_request(&format!("/v3/Customer/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, created);

    // update with a stale token
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "/v3/Customer?operation=update",
            &json!({"Id": &id, "SyncToken": "5", "DisplayName": "Acme Ltd"}).to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["Fault"]["Error"][0]["Message"], "Stale Object Error");

    // update
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "/v3/Customer?operation=update",
            &json!({"Id": &id, "SyncToken": "0", "DisplayName": "Acme Ltd"}).to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated = body_json(resp).await;
    assert_eq!(updated["Customer"]["DisplayName"], "Acme Ltd");
    assert_eq!(updated["Customer"]["SyncToken"], "1");

    // query
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get_request("/v3?query=select%20%2A%20from%20Customer"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["QueryResponse"]["Customer"][0]["Id"], id.as_str());
    assert_eq!(body["QueryResponse"]["maxResults"], 1);

    // delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "/v3/Customer?operation=delete",
            &json!({"Id": &id, "SyncToken": "1"}).to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["Customer"]["status"], "Deleted");

    // read after delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get_request(&format!("/v3/Customer/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
