use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, PathRejection},
        DefaultBodyLimit, FromRequest, FromRequestParts, Multipart, Path, Query, Request, State,
    },
    http::{header, request::Parts, Method, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use uuid::Uuid;

use closet_shared::protocol::{
    AuthResponse, CreateItemRequest, CreateOutfitRequest, DeleteItemRequest, ImageUploadResponse,
    ItemQuery, LoginRequest, OkResponse, RecommendRequest, RecommendResponse, SignupRequest,
};
use closet_shared::types::{Category, ClothingItem, Outfit, OutfitSummary, PublicUser};
use closet_store::{Database, NewItem};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::image_store::ImageStore;
use crate::rate_limit::{throttle_middleware, RequestThrottle};
use crate::recommend::Recommender;
use crate::session::{AuthUser, SessionIssuer};

/// Room for multipart framing on top of the image itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub sessions: SessionIssuer,
    pub images: Arc<ImageStore>,
    pub recommender: Arc<Recommender>,
    pub throttle: RequestThrottle,
    pub config: Arc<ServerConfig>,
}

/// `axum::Json`, but a body that fails to parse is a 400 in the usual
/// `{"error": ...}` shape.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| ServerError::BadRequest(e.body_text()))?;
        Ok(ApiJson(value))
    }
}

/// `axum::extract::Path`, but a segment that does not parse (e.g. a
/// malformed id) names nothing: 404 in the usual `{"error": ...}` shape.
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(ApiPath(value)),
            Err(e @ PathRejection::FailedToDeserializePathParams(_)) => {
                debug!(path = %parts.uri.path(), error = %e.body_text(), "Unparseable path segment");
                Err(ServerError::NotFound("Not found".into()))
            }
            Err(e) => Err(ServerError::Internal(e.body_text())),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    // Credential and recommendation routes share the per-IP throttle.
    let throttled = Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/recommend-outfit", post(recommend_outfit))
        .route_layer(middleware::from_fn_with_state(
            state.throttle.clone(),
            throttle_middleware,
        ));

    let body_limit = state.config.max_image_size + MULTIPART_OVERHEAD;

    Router::new()
        .route("/health", get(health_check))
        .route("/items", get(list_items).post(create_item).delete(delete_item))
        .route("/outfits", get(list_outfits).post(create_outfit))
        .route("/outfits/:id", get(get_outfit).delete(delete_outfit))
        .route("/images", post(upload_image))
        .route("/images/:id", get(download_image).delete(delete_image))
        .merge(throttled)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ─── Auth ───

async fn signup(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ServerError> {
    if !state.config.registration_open {
        return Err(ServerError::Forbidden("Registration is closed".into()));
    }

    let user = {
        let db = state.db.lock().await;
        db.register_user(&req.email, &req.password, &req.name)?
    };

    Ok((StatusCode::CREATED, Json(state.sessions.issue(user))))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ServerError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ServerError::BadRequest("Missing fields".into()));
    }

    let user = {
        let db = state.db.lock().await;
        db.authenticate(&req.email, &req.password)?
    };

    info!(user_id = %user.id, "User logged in");
    Ok(Json(state.sessions.issue(user)))
}

async fn me(AuthUser(user): AuthUser) -> Json<PublicUser> {
    Json(user)
}

// ─── Items ───

async fn list_items(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<ItemQuery>,
) -> Result<Json<Vec<ClothingItem>>, ServerError> {
    let category = query
        .category
        .as_deref()
        .map(str::parse::<Category>)
        .transpose()
        .map_err(|e| ServerError::BadRequest(e.to_string()))?;

    let db = state.db.lock().await;
    Ok(Json(db.list_items(user.id, category)?))
}

async fn create_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<CreateItemRequest>,
) -> Result<(StatusCode, Json<ClothingItem>), ServerError> {
    let category = req
        .parsed_category()
        .map_err(|e| ServerError::BadRequest(e.to_string()))?;

    let new = NewItem {
        category,
        name: req.name,
        brand: req.brand,
        style: req.style,
        color: req.color,
        image_url: req.image_url,
    };

    let db = state.db.lock().await;
    let item = db.create_item(user.id, &new)?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn delete_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<DeleteItemRequest>,
) -> Result<Json<OkResponse>, ServerError> {
    let db = state.db.lock().await;
    db.delete_item(req.id, user.id)?;
    Ok(Json(OkResponse::ok()))
}

// ─── Outfits ───

async fn list_outfits(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<OutfitSummary>>, ServerError> {
    let db = state.db.lock().await;
    Ok(Json(db.list_outfits(user.id)?))
}

async fn create_outfit(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<CreateOutfitRequest>,
) -> Result<(StatusCode, Json<Outfit>), ServerError> {
    let mut db = state.db.lock().await;
    let outfit = db.create_outfit(user.id, &req.name, &req.item_ids)?;
    Ok((StatusCode::CREATED, Json(outfit)))
}

async fn get_outfit(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Outfit>, ServerError> {
    let db = state.db.lock().await;
    Ok(Json(db.get_outfit(id, user.id)?))
}

async fn delete_outfit(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<OkResponse>, ServerError> {
    let mut db = state.db.lock().await;
    db.delete_outfit(id, user.id)?;
    Ok(Json(OkResponse::ok()))
}

// ─── Images ───

async fn upload_image(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ImageUploadResponse>), ServerError> {
    let max = state.images.max_size();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let mut data = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| ServerError::BadRequest(format!("Failed to read field: {}", e)))?
        {
            data.extend_from_slice(&chunk);
            if data.len() > max {
                return Err(ServerError::ImageTooLarge {
                    size: data.len(),
                    max,
                });
            }
        }

        let id = state.images.store_image(user.id, &data).await?;
        info!(id = %id, user_id = %user.id, size = data.len(), "Image uploaded");

        return Ok((
            StatusCode::CREATED,
            Json(ImageUploadResponse {
                id,
                url: format!("/images/{id}"),
            }),
        ));
    }

    Err(ServerError::BadRequest(
        "Missing 'file' field in multipart form".to_string(),
    ))
}

async fn download_image(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ServerError> {
    let (data, content_type) = state.images.get_image(user.id, id).await?;
    Ok(([(header::CONTENT_TYPE, content_type)], data))
}

async fn delete_image(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<OkResponse>, ServerError> {
    state.images.delete_image(user.id, id).await?;
    Ok(Json(OkResponse::ok()))
}

// ─── Recommendations ───

async fn recommend_outfit(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RecommendRequest>,
) -> Result<Json<RecommendResponse>, ServerError> {
    Ok(Json(state.recommender.recommend(&req).await?))
}

pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
