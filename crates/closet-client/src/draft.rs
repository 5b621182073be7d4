use uuid::Uuid;

use closet_shared::types::Outfit;

use crate::client::ClosetClient;
use crate::error::{ClientError, Result};

/// Items picked while composing an outfit, in the order they were picked.
/// Nothing is persisted until [`save`](Self::save).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OutfitDraft {
    items: Vec<Uuid>,
}

impl OutfitDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select `id`, or deselect it if already selected. Returns whether it
    /// is selected afterwards.
    pub fn toggle(&mut self, id: Uuid) -> bool {
        if let Some(pos) = self.items.iter().position(|i| *i == id) {
            self.items.remove(pos);
            false
        } else {
            self.items.push(id);
            true
        }
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.items.contains(&id)
    }

    pub fn items(&self) -> &[Uuid] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Create the outfit on the server. The selection is kept on failure.
    pub async fn save(&mut self, client: &mut ClosetClient, name: &str) -> Result<Outfit> {
        if self.is_empty() {
            return Err(ClientError::EmptyDraft);
        }
        let outfit = client.create_outfit(name, &self.items).await?;
        self.clear();
        Ok(outfit)
    }
}
