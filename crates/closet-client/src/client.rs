use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use closet_shared::protocol::{
    AuthResponse, CreateItemRequest, CreateOutfitRequest, DeleteItemRequest, ErrorBody,
    ImageUploadResponse, LoginRequest, OkResponse, RecommendItem, RecommendRequest,
    RecommendResponse, SignupRequest,
};
use closet_shared::types::{Category, ClothingItem, Outfit, OutfitSummary, PublicUser};

use crate::error::{ClientError, Result};
use crate::session::{CachedSession, SessionCache};

/// Typed wrapper over the closet server's HTTP API.
///
/// Authenticated calls attach the cached bearer token; a 401 from the
/// server drops the cached session.
pub struct ClosetClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionCache,
}

impl ClosetClient {
    pub fn new(base_url: impl Into<String>, session: SessionCache) -> Self {
        Self::with_http(reqwest::Client::new(), base_url, session)
    }

    pub fn with_http(
        http: reqwest::Client,
        base_url: impl Into<String>,
        session: SessionCache,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn session(&self) -> &SessionCache {
        &self.session
    }

    pub fn current_user(&self) -> Option<&PublicUser> {
        self.session.current().map(|s| &s.user)
    }

    // ─── Auth ───

    pub async fn signup(&mut self, email: &str, password: &str, name: &str) -> Result<PublicUser> {
        let body = SignupRequest {
            email: email.to_string(),
            password: password.to_string(),
            name: name.to_string(),
        };
        let resp: AuthResponse = self.send_json(Method::POST, "/auth/signup", &body).await?;
        self.remember(resp)
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<PublicUser> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let resp: AuthResponse = self.send_json(Method::POST, "/auth/login", &body).await?;
        self.remember(resp)
    }

    /// Forget the cached session. Tokens are stateless, so there is
    /// nothing to tell the server.
    pub fn logout(&mut self) -> Result<()> {
        self.session.clear()
    }

    pub async fn me(&mut self) -> Result<PublicUser> {
        let req = self.authed(Method::GET, "/auth/me")?;
        self.dispatch(req).await
    }

    // ─── Items ───

    pub async fn list_items(&mut self, category: Option<Category>) -> Result<Vec<ClothingItem>> {
        let mut req = self.authed(Method::GET, "/items")?;
        if let Some(category) = category {
            req = req.query(&[("category", category.as_str())]);
        }
        self.dispatch(req).await
    }

    pub async fn create_item(&mut self, item: &CreateItemRequest) -> Result<ClothingItem> {
        let req = self.authed(Method::POST, "/items")?.json(item);
        self.dispatch(req).await
    }

    pub async fn delete_item(&mut self, id: Uuid) -> Result<()> {
        let req = self
            .authed(Method::DELETE, "/items")?
            .json(&DeleteItemRequest { id });
        let _: OkResponse = self.dispatch(req).await?;
        Ok(())
    }

    // ─── Outfits ───

    pub async fn list_outfits(&mut self) -> Result<Vec<OutfitSummary>> {
        let req = self.authed(Method::GET, "/outfits")?;
        self.dispatch(req).await
    }

    pub async fn create_outfit(&mut self, name: &str, item_ids: &[Uuid]) -> Result<Outfit> {
        let body = CreateOutfitRequest {
            name: name.to_string(),
            item_ids: item_ids.to_vec(),
        };
        let req = self.authed(Method::POST, "/outfits")?.json(&body);
        self.dispatch(req).await
    }

    pub async fn get_outfit(&mut self, id: Uuid) -> Result<Outfit> {
        let req = self.authed(Method::GET, &format!("/outfits/{id}"))?;
        self.dispatch(req).await
    }

    pub async fn delete_outfit(&mut self, id: Uuid) -> Result<()> {
        let req = self.authed(Method::DELETE, &format!("/outfits/{id}"))?;
        let _: OkResponse = self.dispatch(req).await?;
        Ok(())
    }

    // ─── Images ───

    pub async fn upload_image(
        &mut self,
        file_name: &str,
        data: Vec<u8>,
    ) -> Result<ImageUploadResponse> {
        let part = reqwest::multipart::Part::bytes(data).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        let req = self.authed(Method::POST, "/images")?.multipart(form);
        self.dispatch(req).await
    }

    pub async fn download_image(&mut self, id: Uuid) -> Result<Vec<u8>> {
        let req = self.authed(Method::GET, &format!("/images/{id}"))?;
        let resp = self.check(req.send().await?).await?;
        Ok(resp.bytes().await?.to_vec())
    }

    pub async fn delete_image(&mut self, id: Uuid) -> Result<()> {
        let req = self.authed(Method::DELETE, &format!("/images/{id}"))?;
        let _: OkResponse = self.dispatch(req).await?;
        Ok(())
    }

    // ─── Recommendations ───

    pub async fn recommend(&self, request: &RecommendRequest) -> Result<RecommendResponse> {
        let resp = self
            .http
            .post(self.url("/recommend-outfit"))
            .json(request)
            .send()
            .await?;
        decode(resp).await
    }

    /// Ask for a structured pick from the caller's own items.
    pub async fn recommend_from_closet(
        &mut self,
        occasion: &str,
        style: &str,
    ) -> Result<RecommendResponse> {
        let items = self.list_items(None).await?;
        let request = RecommendRequest {
            occasion: occasion.to_string(),
            style: style.to_string(),
            items: Some(items.iter().map(RecommendItem::from).collect()),
        };
        self.recommend(&request).await
    }

    // ─── Plumbing ───

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn remember(&mut self, resp: AuthResponse) -> Result<PublicUser> {
        let session = CachedSession::from(resp);
        let user = session.user.clone();
        self.session.store(session)?;
        info!(user_id = %user.id, "Session stored");
        Ok(user)
    }

    fn authed(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let session = self.session.current().ok_or(ClientError::NotLoggedIn)?;
        Ok(self
            .http
            .request(method, self.url(path))
            .bearer_auth(&session.token))
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let resp = self
            .http
            .request(method, self.url(path))
            .json(body)
            .send()
            .await?;
        decode(resp).await
    }

    async fn dispatch<T: DeserializeOwned>(&mut self, req: RequestBuilder) -> Result<T> {
        let resp = self.check(req.send().await?).await?;
        Ok(resp.json().await?)
    }

    /// Pass successful responses through; turn the rest into errors,
    /// dropping the session on 401.
    async fn check(&mut self, resp: Response) -> Result<Response> {
        if resp.status() == StatusCode::UNAUTHORIZED {
            warn!("Server rejected session; clearing cache");
            self.session.clear()?;
        }
        if resp.status().is_success() {
            return Ok(resp);
        }
        Err(api_error(resp).await)
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
    if !resp.status().is_success() {
        return Err(api_error(resp).await);
    }
    Ok(resp.json().await?)
}

async fn api_error(resp: Response) -> ClientError {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or_else(|_| {
            if text.is_empty() {
                status.canonical_reason().unwrap_or("Request failed").to_string()
            } else {
                text
            }
        });
    debug!(status = status.as_u16(), message = %message, "API error");
    ClientError::Api {
        status: status.as_u16(),
        message,
    }
}
