//! Domain model shared between the server, the store, and the client.
//!
//! Every struct serializes with camelCase keys, which is the shape the HTTP
//! API speaks.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::UnknownCategory;

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// The closet section an item lives in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Shirts,
    Pants,
    Skirts,
    Dresses,
    Shoes,
    Accessories,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Shirts,
        Category::Pants,
        Category::Skirts,
        Category::Dresses,
        Category::Shoes,
        Category::Accessories,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Shirts => "shirts",
            Category::Pants => "pants",
            Category::Skirts => "skirts",
            Category::Dresses => "dresses",
            Category::Shoes => "shoes",
            Category::Accessories => "accessories",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// The fields of a user that may leave the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Clothing item
// ---------------------------------------------------------------------------

/// A single cataloged clothing object owned by a user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClothingItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category: Category,
    pub name: String,
    pub brand: String,
    pub style: String,
    pub color: String,
    /// Either an inline `data:` URL or a stored image reference (`/images/<id>`).
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Outfit
// ---------------------------------------------------------------------------

/// Outfit listing entry; items are not joined.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OutfitSummary {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A named outfit with its items resolved, in selection order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Outfit {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub items: Vec<ClothingItem>,
}

impl Outfit {
    pub fn summary(&self) -> OutfitSummary {
        OutfitSummary {
            id: self.id,
            name: self.name.clone(),
            created_at: self.created_at,
        }
    }
}
