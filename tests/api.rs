//! End-to-end tests driving the router against the in-memory object store.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header::CONTENT_TYPE};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use patrimoniu::auth::MockCredentials;
use patrimoniu::config::Config;
use patrimoniu::state::{AppState, Stores};
use patrimoniu::store::MemoryStore;

fn test_config() -> Config {
    Config {
        port: 0,
        storage: Err(Vec::new()),
        credentials: MockCredentials {
            email: "admin@example.org".to_string(),
            password: "hunter2".to_string(),
        },
    }
}

fn test_app() -> Router {
    let store = Arc::new(MemoryStore::new());
    let stores = Stores::with_store(store, "places", "trips");
    patrimoniu::app(AppState::with_stores(test_config(), Ok(stores)))
}

fn misconfigured_app() -> Router {
    patrimoniu::app(AppState::with_stores(
        test_config(),
        Err(vec!["S3_REGION", "S3_BUCKET"]),
    ))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(body) => Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn place_payload(title: &str, category: &str) -> Value {
    json!({
        "title": title,
        "description": "A place worth the drive",
        "category": category,
        "municipality": "Dili",
        "coordinates": { "lat": -8.55, "lng": 125.57 },
        "languages": ["tet", "en"],
    })
}

#[tokio::test]
async fn create_canonicalizes_category_and_stamps_defaults() {
    let app = test_app();

    let (status, body) = send(
        &app,
        "POST",
        "/places",
        Some(place_payload("Santa Cruz cemetery", "memorial")),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["category"], "memorials");
    assert_eq!(body["status"], "published");
    assert_eq!(body["createdAt"], body["updatedAt"]);

    let id = body["id"].as_str().unwrap();
    let (status, fetched) = send(&app, "GET", &format!("/places/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["category"], "memorials");
}

#[tokio::test]
async fn patch_is_a_shallow_merge_and_refreshes_updated_at() {
    let app = test_app();

    let (_, created) = send(
        &app,
        "POST",
        "/places",
        Some(place_payload("Cristo Rei", "monument")),
    )
    .await;
    let id = created["id"].as_str().unwrap();
    let before = created["updatedAt"].as_i64().unwrap();

    let (status, merged) = send(
        &app,
        "PATCH",
        &format!("/places/{id}"),
        Some(json!({ "description": "Updated text", "featured": true })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(merged["description"], "Updated text");
    assert_eq!(merged["featured"], true);
    // Fields absent from the patch are untouched.
    assert_eq!(merged["title"], created["title"]);
    assert_eq!(merged["category"], created["category"]);
    assert_eq!(merged["createdAt"], created["createdAt"]);
    assert!(merged["updatedAt"].as_i64().unwrap() >= before);
}

#[tokio::test]
async fn missing_place_reads_are_not_found() {
    let app = test_app();

    let (status, body) = send(&app, "GET", "/places/no-such-id", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Not found" }));

    let (status, _) = send(
        &app,
        "PATCH",
        "/places/no-such-id",
        Some(json!({ "featured": true })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_is_idempotent() {
    let app = test_app();

    let (_, created) = send(
        &app,
        "POST",
        "/places",
        Some(place_payload("Aileu markets", "cultural")),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = send(&app, "DELETE", &format!("/places/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));

    // Deleting again (or deleting an id that never existed) still succeeds.
    let (status, body) = send(&app, "DELETE", &format!("/places/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));

    let (status, _) = send(&app, "GET", &format!("/places/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_applies_filters_and_sorting() {
    let app = test_app();

    for (title, category) in [
        ("Tasitolu park", "park"),
        ("Resistance museum", "museum"),
        ("Balide memorial", "memorial"),
    ] {
        let (status, _) = send(&app, "POST", "/places", Some(place_payload(title, category))).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, "GET", "/places?categories=park", None).await;
    assert_eq!(status, StatusCode::OK);
    let places = body.as_array().unwrap();
    assert_eq!(places.len(), 1);
    assert_eq!(places[0]["category"], "park");

    // "memorial" in the filter canonicalizes like it does on writes.
    let (_, body) = send(&app, "GET", "/places?categories=memorial", None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    // A supplied category set that nothing can belong to matches nothing.
    let (status, body) = send(&app, "GET", "/places?categories=castle", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 0);

    let (_, body) = send(&app, "GET", "/places?sort=title", None).await;
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap())
        .collect();
    assert_eq!(
        titles,
        ["Balide memorial", "Resistance museum", "Tasitolu park"]
    );
}

#[tokio::test]
async fn filtering_handles_accents_and_never_rejects_bad_inputs() {
    let app = test_app();

    let mut payload = place_payload("Com beach", "nature");
    payload["municipality"] = json!("Lautém");
    let (status, _) = send(&app, "POST", "/places", Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED);

    // Case-insensitive matching has to survive non-ASCII names.
    let (status, body) = send(&app, "GET", "/places?municipalities=LAUT%C3%89M", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    // Unparseable filter values degrade to no-ops instead of a 400.
    let (status, body) = send(
        &app,
        "GET",
        "/places?sort=bogus&featured=banana&fromYear=last-century",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn invalid_payloads_are_rejected_before_any_write() {
    let app = test_app();

    let mut payload = place_payload("Too many pictures", "park");
    payload["images"] = json!(["a", "b", "c", "d", "e", "f"]);

    let (status, body) = send(&app, "POST", "/places", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid payload");

    let (_, body) = send(&app, "GET", "/places", None).await;
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn missing_storage_settings_surface_in_every_handler() {
    let app = misconfigured_app();

    for (method, uri) in [
        ("GET", "/places"),
        ("GET", "/places/x"),
        ("DELETE", "/trips/x"),
    ] {
        let (status, body) = send(&app, method, uri, None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Server misconfigured");
        let detail = body["detail"].as_str().unwrap();
        assert!(detail.contains("S3_REGION"), "detail was: {detail}");
        assert!(detail.contains("S3_BUCKET"), "detail was: {detail}");
    }
}

#[tokio::test]
async fn trip_lifecycle_and_stats() {
    let app = test_app();

    let (status, created) = send(
        &app,
        "POST",
        "/trips",
        Some(json!({
            "name": "North coast loop",
            "description": "Dili to Baucau",
            "public": true,
            "transportMode": "car",
            "roadCondition": "mixed",
            "stops": [
                { "placeId": "dili", "title": "Dili", "coordinates": { "lat": -8.5586, "lng": 125.5736 } },
                { "placeId": "baucau", "title": "Baucau", "coordinates": { "lat": -8.4745, "lng": 126.4565 } },
            ],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap();

    let (status, stats) = send(&app, "GET", &format!("/trips/{id}/stats"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(stats["distanceKm"].as_f64().unwrap() > 50.0);
    assert!(stats["durationHours"].as_f64().unwrap() > 0.0);
    assert!(stats["days"].as_u64().unwrap() >= 1);

    // A dangling place reference is tolerated, not rejected.
    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/trips/{id}"),
        Some(json!({
            "stops": [
                { "placeId": "gone", "title": "Removed place", "coordinates": { "lat": -8.5, "lng": 125.5 } },
            ],
            "distanceKm": 250.0,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, stats) = send(&app, "GET", &format!("/trips/{id}/stats"), None).await;
    assert_eq!(stats["distanceKm"].as_f64().unwrap(), 250.0);

    let (status, body) = send(&app, "DELETE", &format!("/trips/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));
}

#[tokio::test]
async fn mock_login_accepts_only_the_configured_pair() {
    let app = test_app();

    let (status, body) = send(
        &app,
        "POST",
        "/auth/login",
        Some(json!({ "email": "admin@example.org", "password": "hunter2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "admin@example.org");

    let (status, body) = send(
        &app,
        "POST",
        "/auth/login",
        Some(json!({ "email": "admin@example.org", "password": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");
}
