use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;
use trendarr::config::Config;

async fn spawn_app() -> (Router, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");

    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.general.defaults_path = dir
        .path()
        .join("defaultkw.json")
        .to_string_lossy()
        .into_owned();

    let state = trendarr::api::create_app_state_from_config(config)
        .await
        .expect("Failed to create app state");
    (trendarr::api::router(state).await, dir)
}

async fn request(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

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

async fn create_keyword(app: &Router, keyword: &str) -> i64 {
    let (status, body) = request(
        app,
        "POST",
        "/api/keywords",
        Some(json!({ "keyword": keyword })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_create_keyword_and_duplicate() {
    let (app, _dir) = spawn_app().await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/keywords",
        Some(json!({ "keyword": "solar eclipse" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], json!(true));
    let id = body["id"].as_i64().unwrap();

    let (status, body) = request(
        &app,
        "POST",
        "/api/keywords",
        Some(json!({ "keyword": "solar eclipse" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["id"].as_i64().unwrap(), id);
    assert_eq!(body["message"], json!("Keyword already exists"));
}

#[tokio::test]
async fn test_resubmit_with_provenance_updates_record() {
    let (app, _dir) = spawn_app().await;

    create_keyword(&app, "car unblocked games").await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/keywords",
        Some(json!({
            "keyword": "car unblocked games",
            "source": "x",
            "trend_percentage": 350.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("Keyword updated"));

    let (status, body) = request(&app, "GET", "/api/keywords", None).await;
    assert_eq!(status, StatusCode::OK);
    let record = &body["keywords"][0];
    assert_eq!(record["keyword"], json!("car unblocked games"));
    assert_eq!(record["source"], json!("x"));
    assert_eq!(record["trend_percentage"], json!(350.0));
    assert!(record["last_updated"].is_string());
    assert!(record["first_created_time"].is_string());
}

#[tokio::test]
async fn test_partial_provenance_keeps_stored_fields() {
    let (app, _dir) = spawn_app().await;

    let (status, _) = request(
        &app,
        "POST",
        "/api/keywords",
        Some(json!({
            "keyword": "lunar halo",
            "source": "x",
            "trend_percentage": 350.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // A source-only resubmit must not null out the stored trend value.
    let (status, body) = request(
        &app,
        "POST",
        "/api/keywords",
        Some(json!({ "keyword": "lunar halo", "source": "y" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("Keyword updated"));

    let (_, body) = request(&app, "GET", "/api/keywords", None).await;
    let record = &body["keywords"][0];
    assert_eq!(record["source"], json!("y"));
    assert_eq!(record["trend_percentage"], json!(350.0));

    // And the symmetric case: a trend-only resubmit keeps the source.
    let (status, _) = request(
        &app,
        "POST",
        "/api/keywords",
        Some(json!({ "keyword": "lunar halo", "trend_percentage": 410.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = request(&app, "GET", "/api/keywords", None).await;
    let record = &body["keywords"][0];
    assert_eq!(record["source"], json!("y"));
    assert_eq!(record["trend_percentage"], json!(410.0));
}

#[tokio::test]
async fn test_create_keyword_validation() {
    let (app, _dir) = spawn_app().await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/keywords",
        Some(json!({ "keyword": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_pagination_walks_newest_first() {
    let (app, _dir) = spawn_app().await;

    for i in 1..=25 {
        create_keyword(&app, &format!("kw-{i:02}")).await;
    }

    let (status, body) = request(&app, "GET", "/api/keywords?page=2&limit=10", None).await;
    assert_eq!(status, StatusCode::OK);

    let pagination = &body["pagination"];
    assert_eq!(pagination["total"], json!(25));
    assert_eq!(pagination["totalPages"], json!(3));
    assert_eq!(pagination["page"], json!(2));
    assert_eq!(pagination["hasNextPage"], json!(true));
    assert_eq!(pagination["hasPrevPage"], json!(true));

    let keywords = body["keywords"].as_array().unwrap();
    assert_eq!(keywords.len(), 10);
    // Newest-identifier-first: page 2 of 25 starts at the 11th newest.
    assert_eq!(keywords[0]["keyword"], json!("kw-15"));
    assert_eq!(keywords[9]["keyword"], json!("kw-06"));

    let stats = &body["stats"];
    assert_eq!(stats["total"], json!(25));
    assert_eq!(stats["unused"], json!(25));
}

#[tokio::test]
async fn test_before_filter_includes_never_used_keywords() {
    let (app, _dir) = spawn_app().await;

    let used_id = create_keyword(&app, "already consumed").await;
    create_keyword(&app, "never consumed").await;

    let (status, _) = request(&app, "PUT", &format!("/api/keywords/{used_id}/use"), None).await;
    assert_eq!(status, StatusCode::OK);

    // Far-past cutoff: the used keyword falls out, the never-used one stays.
    let (status, body) = request(
        &app,
        "GET",
        "/api/keywords?before=1970-01-01T00:00:00Z",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let keywords = body["keywords"].as_array().unwrap();
    assert_eq!(keywords.len(), 1);
    assert_eq!(keywords[0]["keyword"], json!("never consumed"));

    // Far-future cutoff keeps both.
    let (status, body) = request(
        &app,
        "GET",
        "/api/keywords?before=2999-01-01T00:00:00Z",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["keywords"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_overlong_phrases_counted_but_not_listed() {
    let (app, _dir) = spawn_app().await;

    create_keyword(&app, "one two three four five").await;

    let (status, body) = request(&app, "GET", "/api/keywords", None).await;
    assert_eq!(status, StatusCode::OK);
    // The phrase exceeds the word limit: present in totals, absent from rows.
    assert_eq!(body["pagination"]["total"], json!(1));
    assert!(body["keywords"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_ignore_hides_from_listing_but_not_snapshot() {
    let (app, _dir) = spawn_app().await;

    let id = create_keyword(&app, "stale trend").await;
    create_keyword(&app, "live trend").await;

    let (status, body) = request(
        &app,
        "PUT",
        "/api/keywords/ignore",
        Some(json!({ "keywordId": id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));

    // Ignoring twice is idempotent.
    let (status, _) = request(
        &app,
        "PUT",
        "/api/keywords/ignore",
        Some(json!({ "keywordId": id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = request(&app, "GET", "/api/keywords", None).await;
    let listed: Vec<&str> = body["keywords"]
        .as_array()
        .unwrap()
        .iter()
        .map(|k| k["keyword"].as_str().unwrap())
        .collect();
    assert_eq!(listed, vec!["live trend"]);

    let (status, body) = request(&app, "GET", "/api/keywords/all", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], json!(2));
    assert_eq!(body["sample"].as_array().unwrap().len(), 2);

    let (status, _) = request(
        &app,
        "PUT",
        "/api/keywords/ignore",
        Some(json!({ "keywordId": 9999 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_use_endpoints_and_types() {
    let (app, _dir) = spawn_app().await;

    create_keyword(&app, "alpha").await;
    create_keyword(&app, "beta").await;

    let (status, _) = request(&app, "PUT", "/api/keywords/9999/use", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = request(
        &app,
        "PUT",
        "/api/keywords/use-batch",
        Some(json!({ "keywords": ["alpha", "beta", "missing"], "type": "movie" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], json!(2));

    // An empty batch is a no-op, not an error.
    let (status, body) = request(
        &app,
        "PUT",
        "/api/keywords/use-batch",
        Some(json!({ "keywords": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["updated"], json!(0));

    create_keyword(&app, "gamma").await;
    let (_, _) = request(
        &app,
        "PUT",
        "/api/keywords/use-batch",
        Some(json!({ "keywords": ["gamma"], "type": "show" })),
    )
    .await;

    let (status, body) = request(&app, "GET", "/api/keywords/types", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["movie", "show"]));
}

#[tokio::test]
async fn test_type_filter_keeps_unclassified_keywords() {
    let (app, _dir) = spawn_app().await;

    create_keyword(&app, "classified").await;
    create_keyword(&app, "unclassified").await;

    let (_, _) = request(
        &app,
        "PUT",
        "/api/keywords/use-batch",
        Some(json!({ "keywords": ["classified"], "type": "movie" })),
    )
    .await;

    let (status, body) = request(&app, "GET", "/api/keywords?type=movie", None).await;
    assert_eq!(status, StatusCode::OK);
    let listed: Vec<&str> = body["keywords"]
        .as_array()
        .unwrap()
        .iter()
        .map(|k| k["keyword"].as_str().unwrap())
        .collect();
    // Unset type means "not yet classified" and stays eligible.
    assert!(listed.contains(&"classified"));
    assert!(listed.contains(&"unclassified"));
}

#[tokio::test]
async fn test_debug_endpoint() {
    let (app, _dir) = spawn_app().await;

    create_keyword(&app, "one").await;

    let (status, body) = request(&app, "GET", "/api/debug", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("ok"));
    assert_eq!(body["store"]["connected"], json!(true));
    assert_eq!(body["store"]["total_keywords"], json!(1));
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_default_keyword_endpoints() {
    let (app, _dir) = spawn_app().await;

    let (status, body) = request(&app, "GET", "/api/defaultkw", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, body) = request(
        &app,
        "POST",
        "/api/defaultkw",
        Some(json!({ "keyword": "https://example.com/trending/solar-eclipse" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["keywords"], json!(["solar eclipse"]));

    let (status, body) = request(
        &app,
        "POST",
        "/api/defaultkw",
        Some(json!({ "keyword": "meteor shower" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["keywords"], json!(["meteor shower", "solar eclipse"]));

    let (status, _) = request(
        &app,
        "POST",
        "/api/defaultkw",
        Some(json!({ "keyword": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = request(&app, "GET", "/api/defaultkw", None).await;
    assert_eq!(body, json!(["meteor shower", "solar eclipse"]));
}
