//! Store-side records that never leave the server as-is.
//!
//! The shared shapes (`ClothingItem`, `Outfit`, ...) live in
//! `closet_shared::types` and are re-exported here for convenience.

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub use closet_shared::types::{
    Category, ClothingItem, Outfit, OutfitSummary, PublicUser,
};

/// A user row including the password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    /// argon2id hash in PHC string format.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
        }
    }
}

/// Fields supplied when adding an item; id, owner, and timestamp are
/// assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub category: Category,
    pub name: String,
    pub brand: String,
    pub style: String,
    pub color: String,
    pub image_url: String,
}

impl NewItem {
    /// An item with only the required fields set.
    pub fn new(category: Category, name: impl Into<String>) -> Self {
        Self {
            category,
            name: name.into(),
            brand: String::new(),
            style: String::new(),
            color: String::new(),
            image_url: String::new(),
        }
    }
}
