use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::IntoResponse;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::sync::Mutex;
use tower::ServiceExt;

use closet_server::api::{build_router, AppState};
use closet_server::config::ServerConfig;
use closet_server::image_store::ImageStore;
use closet_server::rate_limit::RequestThrottle;
use closet_server::recommend::{CredentialSource, Recommender};
use closet_server::session::SessionIssuer;
use closet_shared::session::generate_signing_key;
use closet_store::Database;

const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13, 1, 2, 3];

struct TestApp {
    router: Router,
    _dir: TempDir,
}

struct Options {
    registration_open: bool,
    gemini_base_url: String,
    api_key: Option<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            registration_open: true,
            gemini_base_url: "http://127.0.0.1:9".into(),
            api_key: Some("test-key".into()),
        }
    }
}

async fn setup() -> Result<TestApp> {
    setup_with(Options::default()).await
}

async fn setup_with(opts: Options) -> Result<TestApp> {
    let dir = TempDir::new()?;
    let config = ServerConfig {
        database_path: dir.path().join("closet.db"),
        image_storage_path: dir.path().join("images"),
        max_image_size: 1024,
        registration_open: opts.registration_open,
        gemini_base_url: opts.gemini_base_url.clone(),
        ..ServerConfig::default()
    };

    let db = Database::open_at(&config.database_path)?;
    let images = ImageStore::new(config.image_storage_path.clone(), config.max_image_size).await?;
    let recommender = Recommender::new(opts.gemini_base_url, Duration::from_secs(5))?
        .with_credentials(CredentialSource::Fixed {
            api_key: opts.api_key,
            model: "test-model".into(),
        });

    let state = AppState {
        db: Arc::new(Mutex::new(db)),
        sessions: SessionIssuer::new(generate_signing_key(), chrono::Duration::hours(1)),
        images: Arc::new(images),
        recommender: Arc::new(recommender),
        throttle: RequestThrottle::new(100.0, 100.0),
        config: Arc::new(config),
    };

    Ok(TestApp {
        router: build_router(state),
        _dir: dir,
    })
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> Result<(StatusCode, Value)> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = response.into_body().collect().await?.to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        Ok((status, body))
    }

    async fn signup(&self, email: &str) -> Result<String> {
        let (status, body) = self
            .send(json_request(
                "POST",
                "/auth/signup",
                None,
                json!({ "email": email, "password": "pw", "name": "A" }),
            ))
            .await?;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        Ok(body["token"].as_str().unwrap().to_string())
    }

    async fn create_item(&self, token: &str, category: &str, name: &str) -> Result<Value> {
        let (status, body) = self
            .send(json_request(
                "POST",
                "/items",
                Some(token),
                json!({ "category": category, "name": name }),
            ))
            .await?;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        Ok(body)
    }
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn delete(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

fn multipart_upload(token: &str, data: &[u8]) -> Request<Body> {
    let boundary = "closet-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.png\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/images")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Serve `reply` (status + JSON body) for every request on an ephemeral
/// port, standing in for the generation API. Requests without the
/// expected API key get a 401.
async fn fake_upstream(status: StatusCode, reply: Value) -> Result<String> {
    let handler = move |req: Request<Body>| {
        let reply = reply.clone();
        async move {
            let keyed = req
                .headers()
                .get("x-goog-api-key")
                .map_or(false, |v| v == "test-key");
            let path_ok = req.uri().path().ends_with("/test-model:generateContent");
            if !keyed || !path_ok {
                return (StatusCode::UNAUTHORIZED, axum::Json(json!({}))).into_response();
            }
            (status, axum::Json(reply)).into_response()
        }
    };
    let app = Router::new().fallback(handler);

    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(format!("http://{addr}/models"))
}

// ─── Health ───

#[tokio::test]
async fn test_health() -> Result<()> {
    let app = setup().await?;
    let (status, body) = app.send(get("/health", None)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    Ok(())
}

// ─── Auth ───

#[tokio::test]
async fn test_signup_then_duplicate() -> Result<()> {
    let app = setup().await?;
    app.signup("e1@x.com").await?;

    let (status, body) = app
        .send(json_request(
            "POST",
            "/auth/signup",
            None,
            json!({ "email": "E1@x.com ", "password": "other", "name": "B" }),
        ))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User already exists");
    Ok(())
}

#[tokio::test]
async fn test_signup_missing_fields() -> Result<()> {
    let app = setup().await?;
    let (status, body) = app
        .send(json_request(
            "POST",
            "/auth/signup",
            None,
            json!({ "email": "a@x.com" }),
        ))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    Ok(())
}

#[tokio::test]
async fn test_signup_rejected_when_registration_closed() -> Result<()> {
    let app = setup_with(Options {
        registration_open: false,
        ..Options::default()
    })
    .await?;
    let (status, _) = app
        .send(json_request(
            "POST",
            "/auth/signup",
            None,
            json!({ "email": "a@x.com", "password": "pw", "name": "A" }),
        ))
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn test_login_and_me() -> Result<()> {
    let app = setup().await?;
    app.signup("e1@x.com").await?;

    let (status, body) = app
        .send(json_request(
            "POST",
            "/auth/login",
            None,
            json!({ "email": "e1@x.com", "password": "pw" }),
        ))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "e1@x.com");
    assert!(body.get("passwordHash").is_none());
    let token = body["token"].as_str().unwrap().to_string();

    let (status, me) = app.send(get("/auth/me", Some(&token))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], body["id"]);
    assert_eq!(me["name"], "A");

    let (status, _) = app
        .send(json_request(
            "POST",
            "/auth/login",
            None,
            json!({ "email": "e1@x.com", "password": "wrong" }),
        ))
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_missing_or_tampered_token_is_unauthorized() -> Result<()> {
    let app = setup().await?;
    let token = app.signup("e1@x.com").await?;

    let (status, body) = app.send(get("/items", None)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let mut tampered = token.clone();
    let last = tampered.pop().unwrap();
    tampered.push(if last == 'A' { 'B' } else { 'A' });
    let (status, _) = app.send(get("/items", Some(&tampered))).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send(get("/items", Some("not-a-token"))).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A token from another server instance (different key).
    let other = setup().await?;
    let foreign = other.signup("e1@x.com").await?;
    let (status, _) = app.send(get("/items", Some(&foreign))).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

// ─── Items ───

#[tokio::test]
async fn test_items_lifecycle() -> Result<()> {
    let app = setup().await?;
    let token = app.signup("e1@x.com").await?;

    let (status, body) = app.send(get("/items", Some(&token))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let tee = app.create_item(&token, "shirts", "Blue Tee").await?;
    assert_eq!(tee["category"], "shirts");
    assert_eq!(tee["brand"], "");
    assert!(tee["createdAt"].is_string());
    app.create_item(&token, "shoes", "Boots").await?;

    let (_, all) = app.send(get("/items", Some(&token))).await?;
    let names: Vec<&str> = all
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Boots", "Blue Tee"]);

    let (_, shirts) = app.send(get("/items?category=shirts", Some(&token))).await?;
    assert_eq!(shirts.as_array().unwrap().len(), 1);

    let (status, _) = app.send(get("/items?category=hats", Some(&token))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send(json_request(
            "DELETE",
            "/items",
            Some(&token),
            json!({ "id": tee["id"] }),
        ))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));

    let (status, _) = app
        .send(json_request(
            "DELETE",
            "/items",
            Some(&token),
            json!({ "id": tee["id"] }),
        ))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_item_validation() -> Result<()> {
    let app = setup().await?;
    let token = app.signup("e1@x.com").await?;

    for body in [
        json!({ "category": "hats", "name": "Cap" }),
        json!({ "category": "shirts", "name": "" }),
        json!({ "name": "No category" }),
    ] {
        let (status, _) = app
            .send(json_request("POST", "/items", Some(&token), body))
            .await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let request = Request::builder()
        .method("POST")
        .uri("/items")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))?;
    let (status, body) = app.send(request).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    Ok(())
}

#[tokio::test]
async fn test_items_are_owner_scoped() -> Result<()> {
    let app = setup().await?;
    let alice = app.signup("alice@x.com").await?;
    let bob = app.signup("bob@x.com").await?;

    let item = app.create_item(&alice, "dresses", "Red Dress").await?;

    let (_, bobs) = app.send(get("/items", Some(&bob))).await?;
    assert_eq!(bobs, json!([]));

    let (status, _) = app
        .send(json_request(
            "DELETE",
            "/items",
            Some(&bob),
            json!({ "id": item["id"] }),
        ))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, alices) = app.send(get("/items", Some(&alice))).await?;
    assert_eq!(alices.as_array().unwrap().len(), 1);
    Ok(())
}

// ─── Outfits ───

#[tokio::test]
async fn test_outfit_example_flow() -> Result<()> {
    let app = setup().await?;
    let token = app.signup("e1@x.com").await?;
    let tee = app.create_item(&token, "shirts", "Blue Tee").await?;

    let (status, created) = app
        .send(json_request(
            "POST",
            "/outfits",
            Some(&token),
            json!({ "name": "Casual", "itemIds": [tee["id"]] }),
        ))
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{created}");

    let id = created["id"].as_str().unwrap();
    let (status, outfit) = app.send(get(&format!("/outfits/{id}"), Some(&token))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outfit["name"], "Casual");
    let items = outfit["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "Blue Tee");
    assert_eq!(items[0]["category"], "shirts");

    let (_, list) = app.send(get("/outfits", Some(&token))).await?;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["name"], "Casual");
    assert!(list[0].get("items").is_none());
    Ok(())
}

#[tokio::test]
async fn test_outfit_validation_creates_nothing() -> Result<()> {
    let app = setup().await?;
    let alice = app.signup("alice@x.com").await?;
    let bob = app.signup("bob@x.com").await?;
    let tee = app.create_item(&alice, "shirts", "Blue Tee").await?;
    let bobs_shoe = app.create_item(&bob, "shoes", "Sneaker").await?;

    for body in [
        json!({ "name": "Empty", "itemIds": [] }),
        json!({ "name": "", "itemIds": [tee["id"]] }),
        json!({ "name": "Mixed", "itemIds": [tee["id"], bobs_shoe["id"]] }),
        json!({ "name": "Ghost", "itemIds": [uuid::Uuid::new_v4()] }),
    ] {
        let (status, _) = app
            .send(json_request("POST", "/outfits", Some(&alice), body))
            .await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (_, list) = app.send(get("/outfits", Some(&alice))).await?;
    assert_eq!(list, json!([]));
    Ok(())
}

#[tokio::test]
async fn test_outfit_delete_then_get_is_not_found() -> Result<()> {
    let app = setup().await?;
    let token = app.signup("e1@x.com").await?;
    let other = app.signup("e2@x.com").await?;
    let tee = app.create_item(&token, "shirts", "Blue Tee").await?;

    let (_, created) = app
        .send(json_request(
            "POST",
            "/outfits",
            Some(&token),
            json!({ "name": "Casual", "itemIds": [tee["id"]] }),
        ))
        .await?;
    let uri = format!("/outfits/{}", created["id"].as_str().unwrap());

    let (status, _) = app.send(get(&uri, Some(&other))).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.send(delete(&uri, &other)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.send(delete(&uri, &token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    let (status, _) = app.send(get(&uri, Some(&token))).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.send(delete(&uri, &token)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_malformed_id_is_json_not_found() -> Result<()> {
    let app = setup().await?;
    let token = app.signup("e1@x.com").await?;

    let (status, body) = app.send(get("/outfits/not-a-uuid", Some(&token))).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found");

    let (status, body) = app.send(delete("/outfits/123", &token)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found");

    let (status, body) = app.send(get("/images/not-a-uuid", Some(&token))).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found");

    // Authentication is still checked first.
    let (status, _) = app.send(get("/outfits/not-a-uuid", None)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

// ─── Images ───

#[tokio::test]
async fn test_image_upload_download_delete() -> Result<()> {
    let app = setup().await?;
    let token = app.signup("e1@x.com").await?;
    let other = app.signup("e2@x.com").await?;

    let (status, body) = app.send(multipart_upload(&token, PNG)).await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let url = body["url"].as_str().unwrap().to_string();
    assert_eq!(url, format!("/images/{}", body["id"].as_str().unwrap()));

    let response = app.router.clone().oneshot(get(&url, Some(&token))).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    let bytes = response.into_body().collect().await?.to_bytes();
    assert_eq!(&bytes[..], PNG);

    let (status, _) = app.send(get(&url, Some(&other))).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.send(delete(&url, &token)).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.send(get(&url, Some(&token))).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_image_rejections() -> Result<()> {
    let app = setup().await?;
    let token = app.signup("e1@x.com").await?;

    let (status, _) = app.send(multipart_upload(&token, b"hello")).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut big = PNG.to_vec();
    big.resize(2048, 0);
    let (status, _) = app.send(multipart_upload(&token, &big)).await?;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    Ok(())
}

// ─── Recommendations ───

#[tokio::test]
async fn test_recommend_extracts_text() -> Result<()> {
    let upstream = fake_upstream(
        StatusCode::OK,
        json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Navy blazer, white tee." }] },
                "finishReason": "STOP"
            }]
        }),
    )
    .await?;
    let app = setup_with(Options {
        gemini_base_url: upstream,
        ..Options::default()
    })
    .await?;

    let (status, body) = app
        .send(json_request(
            "POST",
            "/recommend-outfit",
            None,
            json!({ "occasion": "dinner", "style": "smart casual" }),
        ))
        .await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body, json!({ "recommendation": "Navy blazer, white tee." }));
    Ok(())
}

#[tokio::test]
async fn test_recommend_without_text_returns_diagnostic() -> Result<()> {
    let upstream = fake_upstream(
        StatusCode::OK,
        json!({ "candidates": [{ "content": {}, "finishReason": "MAX_TOKENS" }] }),
    )
    .await?;
    let app = setup_with(Options {
        gemini_base_url: upstream,
        ..Options::default()
    })
    .await?;

    let (status, body) = app
        .send(json_request(
            "POST",
            "/recommend-outfit",
            None,
            json!({ "occasion": "hike", "style": "sporty" }),
        ))
        .await?;
    assert_eq!(status, StatusCode::OK);
    let text = body["recommendation"].as_str().unwrap();
    assert!(!text.is_empty());
    assert!(text.contains("MAX_TOKENS"));
    Ok(())
}

#[tokio::test]
async fn test_recommend_structured() -> Result<()> {
    let reply = r#"{"recommendedItems":["1"],"reasoning":"Light and bright.","stylingTips":["Roll the sleeves"]}"#;
    let upstream = fake_upstream(
        StatusCode::OK,
        json!({ "candidates": [{ "content": { "parts": [{ "text": reply }] } }] }),
    )
    .await?;
    let app = setup_with(Options {
        gemini_base_url: upstream,
        ..Options::default()
    })
    .await?;

    let (status, body) = app
        .send(json_request(
            "POST",
            "/recommend-outfit",
            None,
            json!({
                "occasion": "picnic",
                "style": "casual",
                "items": [{ "id": "1", "name": "Blue Tee", "category": "shirts" }]
            }),
        ))
        .await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["recommendedItems"], json!(["1"]));
    assert_eq!(body["reasoning"], "Light and bright.");
    assert_eq!(body["stylingTips"], json!(["Roll the sleeves"]));
    Ok(())
}

#[tokio::test]
async fn test_recommend_upstream_error_is_bad_gateway() -> Result<()> {
    let upstream = fake_upstream(StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "boom" })).await?;
    let app = setup_with(Options {
        gemini_base_url: upstream,
        ..Options::default()
    })
    .await?;

    let (status, body) = app
        .send(json_request(
            "POST",
            "/recommend-outfit",
            None,
            json!({ "occasion": "dinner", "style": "formal" }),
        ))
        .await?;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Failed to generate recommendation");
    Ok(())
}

#[tokio::test]
async fn test_recommend_missing_key_or_fields() -> Result<()> {
    let app = setup_with(Options {
        api_key: None,
        ..Options::default()
    })
    .await?;

    let (status, _) = app
        .send(json_request(
            "POST",
            "/recommend-outfit",
            None,
            json!({ "occasion": "dinner" }),
        ))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send(json_request(
            "POST",
            "/recommend-outfit",
            None,
            json!({ "occasion": "dinner", "style": "formal" }),
        ))
        .await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Server misconfiguration: missing API key");
    Ok(())
}

#[tokio::test]
async fn test_throttle_applies_to_auth_routes() -> Result<()> {
    let dir = TempDir::new()?;
    let config = ServerConfig {
        image_storage_path: dir.path().join("images"),
        ..ServerConfig::default()
    };
    let state = AppState {
        db: Arc::new(Mutex::new(Database::open_in_memory()?)),
        sessions: SessionIssuer::new(generate_signing_key(), chrono::Duration::hours(1)),
        images: Arc::new(ImageStore::new(config.image_storage_path.clone(), 1024).await?),
        recommender: Arc::new(Recommender::new("http://127.0.0.1:9", Duration::from_secs(1))?),
        throttle: RequestThrottle::new(0.001, 2.0),
        config: Arc::new(config),
    };
    let router = build_router(state);

    let login = || {
        Request::builder()
            .method("POST")
            .uri("/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", "203.0.113.9")
            .body(Body::from(json!({ "email": "a@x.com", "password": "pw" }).to_string()))
            .unwrap()
    };

    for _ in 0..2 {
        let response = router.clone().oneshot(login()).await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
    let response = router.clone().oneshot(login()).await?;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // Unthrottled routes keep working.
    let response = router.oneshot(get("/health", None)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}
