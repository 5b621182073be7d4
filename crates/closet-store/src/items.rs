//! CRUD operations for [`ClothingItem`] records.

use chrono::{SubsecRound, Utc};
use rusqlite::params;
use tracing::info;
use uuid::Uuid;

use crate::database::{ts_column, ts_to_sql, uuid_column, Database};
use crate::error::{not_found, Result, StoreError};
use crate::models::{Category, ClothingItem, NewItem};

pub(crate) const ITEM_COLUMNS: &str =
    "items.id, items.user_id, items.category, items.name, items.brand, items.style, \
     items.color, items.image_url, items.created_at";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Add an item to `user_id`'s closet.
    ///
    /// The user must exist ([`StoreError::UnknownUser`] otherwise) and the
    /// name must be non-empty.
    pub fn create_item(&self, user_id: Uuid, new: &NewItem) -> Result<ClothingItem> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(StoreError::InvalidInput("Item name is required".into()));
        }

        match self.get_user(user_id) {
            Ok(_) => {}
            Err(StoreError::NotFound) => return Err(StoreError::UnknownUser),
            Err(other) => return Err(other),
        }

        let item = ClothingItem {
            id: Uuid::new_v4(),
            user_id,
            category: new.category,
            name: name.to_string(),
            brand: new.brand.trim().to_string(),
            style: new.style.trim().to_string(),
            color: new.color.trim().to_string(),
            image_url: new.image_url.clone(),
            // Column precision is microseconds.
            created_at: Utc::now().trunc_subsecs(6),
        };

        self.conn().execute(
            "INSERT INTO items (id, user_id, category, name, brand, style, color, image_url, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                item.id.to_string(),
                item.user_id.to_string(),
                item.category.as_str(),
                item.name,
                item.brand,
                item.style,
                item.color,
                item.image_url,
                ts_to_sql(&item.created_at),
            ],
        )?;

        info!(item_id = %item.id, user_id = %user_id, category = %item.category, "Item created");
        Ok(item)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Items owned by `user_id`, newest first, optionally limited to one
    /// category. Returns an empty vector when there are none.
    pub fn list_items(&self, user_id: Uuid, category: Option<Category>) -> Result<Vec<ClothingItem>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {ITEM_COLUMNS}
             FROM items
             WHERE items.user_id = ?1 AND (?2 IS NULL OR items.category = ?2)
             ORDER BY items.created_at DESC, items.rowid DESC"
        ))?;

        let rows = stmt.query_map(
            params![user_id.to_string(), category.map(|c| c.as_str())],
            row_to_item,
        )?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }

    /// Fetch one item, scoped to its owner.
    pub fn get_item(&self, item_id: Uuid, user_id: Uuid) -> Result<ClothingItem> {
        self.conn()
            .query_row(
                &format!("SELECT {ITEM_COLUMNS} FROM items WHERE items.id = ?1 AND items.user_id = ?2"),
                params![item_id.to_string(), user_id.to_string()],
                row_to_item,
            )
            .map_err(not_found)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete an item owned by `user_id`. Items that do not exist or belong
    /// to someone else yield [`StoreError::NotFound`] and nothing is removed.
    ///
    /// Join rows referencing the item cascade, so it disappears from any
    /// outfit that used it.
    pub fn delete_item(&self, item_id: Uuid, user_id: Uuid) -> Result<()> {
        let affected = self.conn().execute(
            "DELETE FROM items WHERE id = ?1 AND user_id = ?2",
            params![item_id.to_string(), user_id.to_string()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        info!(item_id = %item_id, user_id = %user_id, "Item deleted");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a row selected with [`ITEM_COLUMNS`] to a [`ClothingItem`].
pub(crate) fn row_to_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<ClothingItem> {
    let category_str: String = row.get(2)?;
    let category: Category = category_str.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(ClothingItem {
        id: uuid_column(row, 0)?,
        user_id: uuid_column(row, 1)?,
        category,
        name: row.get(3)?,
        brand: row.get(4)?,
        style: row.get(5)?,
        color: row.get(6)?,
        image_url: row.get(7)?,
        created_at: ts_column(row, 8)?,
    })
}
