//! JSON bodies exchanged over the HTTP API.
//!
//! Request structs default every field so that a missing field reaches the
//! handler as an empty value and is reported as invalid input, rather than
//! failing deserialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::UnknownCategory;
use crate::types::{Category, ClothingItem, PublicUser};

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Returned by signup and login: the public user plus a session token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(flatten)]
    pub user: PublicUser,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateItemRequest {
    pub category: String,
    pub name: String,
    pub brand: String,
    pub style: String,
    pub color: String,
    pub image_url: String,
}

impl CreateItemRequest {
    pub fn parsed_category(&self) -> Result<Category, UnknownCategory> {
        self.category.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteItemRequest {
    pub id: Uuid,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemQuery {
    pub category: Option<String>,
}

// ---------------------------------------------------------------------------
// Outfits
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateOutfitRequest {
    pub name: String,
    pub item_ids: Vec<Uuid>,
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageUploadResponse {
    pub id: Uuid,
    pub url: String,
}

// ---------------------------------------------------------------------------
// Recommendations
// ---------------------------------------------------------------------------

/// `{occasion, style}` asks for free text; adding a non-empty `items` list
/// asks for a structured pick from those items.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendRequest {
    pub occasion: String,
    pub style: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<RecommendItem>>,
}

/// The item fields the stylist prompt cares about. Full `ClothingItem`
/// JSON deserializes into this too.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RecommendItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub category: String,
    pub brand: String,
    pub style: String,
    pub color: String,
}

impl From<&ClothingItem> for RecommendItem {
    fn from(item: &ClothingItem) -> Self {
        Self {
            id: Some(item.id.to_string()),
            name: item.name.clone(),
            category: item.category.to_string(),
            brand: item.brand.clone(),
            style: item.style.clone(),
            color: item.color.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextRecommendation {
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StructuredRecommendation {
    pub recommended_items: Vec<String>,
    pub reasoning: String,
    pub styling_tips: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RecommendResponse {
    Text(TextRecommendation),
    Structured(StructuredRecommendation),
}

// ---------------------------------------------------------------------------
// Misc
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
