//! CRUD operations for [`Outfit`] records and their join rows.
//!
//! Creation and deletion touch several rows and always run inside a
//! transaction: either every row lands (or goes) or none does.

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Transaction};
use tracing::info;
use uuid::Uuid;

use crate::database::{ts_column, ts_to_sql, uuid_column, Database};
use crate::error::{not_found, Result, StoreError};
use crate::items::{row_to_item, ITEM_COLUMNS};
use crate::models::{ClothingItem, Outfit, OutfitSummary};

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Create a named outfit from a selection of item ids.
    ///
    /// Duplicate ids collapse onto their first occurrence. Every id must name
    /// an item owned by `user_id`.
    pub fn create_outfit(&mut self, user_id: Uuid, name: &str, item_ids: &[Uuid]) -> Result<Outfit> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::InvalidInput("Outfit name is required".into()));
        }
        if item_ids.is_empty() {
            return Err(StoreError::InvalidInput("Select at least one item".into()));
        }

        let mut ordered: Vec<Uuid> = Vec::with_capacity(item_ids.len());
        for id in item_ids {
            if !ordered.contains(id) {
                ordered.push(*id);
            }
        }

        let id = Uuid::new_v4();
        let created_at = Utc::now();

        let tx = self.conn_mut().transaction()?;

        for item_id in &ordered {
            if !item_owned_by(&tx, *item_id, user_id)? {
                // Dropping the transaction rolls back.
                return Err(StoreError::InvalidInput(format!("Unknown item: {item_id}")));
            }
        }

        tx.execute(
            "INSERT INTO outfits (id, user_id, name, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![id.to_string(), user_id.to_string(), name, ts_to_sql(&created_at)],
        )?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO outfit_items (outfit_id, item_id, position) VALUES (?1, ?2, ?3)",
            )?;
            for (position, item_id) in ordered.iter().enumerate() {
                stmt.execute(params![id.to_string(), item_id.to_string(), position as i64])?;
            }
        }

        tx.commit()?;

        info!(outfit_id = %id, user_id = %user_id, items = ordered.len(), "Outfit created");
        self.get_outfit(id, user_id)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Outfits owned by `user_id`, newest first, without their items.
    pub fn list_outfits(&self, user_id: Uuid) -> Result<Vec<OutfitSummary>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, name, created_at
             FROM outfits
             WHERE user_id = ?1
             ORDER BY created_at DESC, rowid DESC",
        )?;

        let rows = stmt.query_map(params![user_id.to_string()], |row| {
            Ok(OutfitSummary {
                id: uuid_column(row, 0)?,
                name: row.get(1)?,
                created_at: ts_column(row, 2)?,
            })
        })?;

        let mut outfits = Vec::new();
        for row in rows {
            outfits.push(row?);
        }
        Ok(outfits)
    }

    /// Fetch an outfit with its items resolved in selection order.
    /// [`StoreError::NotFound`] unless it belongs to `user_id`.
    pub fn get_outfit(&self, outfit_id: Uuid, user_id: Uuid) -> Result<Outfit> {
        let summary = self
            .conn()
            .query_row(
                "SELECT id, name, created_at FROM outfits WHERE id = ?1 AND user_id = ?2",
                params![outfit_id.to_string(), user_id.to_string()],
                |row| {
                    Ok(OutfitSummary {
                        id: uuid_column(row, 0)?,
                        name: row.get(1)?,
                        created_at: ts_column(row, 2)?,
                    })
                },
            )
            .map_err(not_found)?;

        Ok(Outfit {
            id: summary.id,
            user_id,
            name: summary.name,
            created_at: summary.created_at,
            items: self.outfit_items(outfit_id)?,
        })
    }

    fn outfit_items(&self, outfit_id: Uuid) -> Result<Vec<ClothingItem>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {ITEM_COLUMNS}
             FROM outfit_items
             JOIN items ON items.id = outfit_items.item_id
             WHERE outfit_items.outfit_id = ?1
             ORDER BY outfit_items.position ASC"
        ))?;

        let rows = stmt.query_map(params![outfit_id.to_string()], row_to_item)?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete an outfit owned by `user_id`: join rows first, then the outfit
    /// row, in one transaction.
    pub fn delete_outfit(&mut self, outfit_id: Uuid, user_id: Uuid) -> Result<()> {
        let tx = self.conn_mut().transaction()?;

        let owned = tx
            .query_row(
                "SELECT 1 FROM outfits WHERE id = ?1 AND user_id = ?2",
                params![outfit_id.to_string(), user_id.to_string()],
                |_| Ok(()),
            )
            .optional()?;
        if owned.is_none() {
            return Err(StoreError::NotFound);
        }

        let join_rows = tx.execute(
            "DELETE FROM outfit_items WHERE outfit_id = ?1",
            params![outfit_id.to_string()],
        )?;
        tx.execute(
            "DELETE FROM outfits WHERE id = ?1",
            params![outfit_id.to_string()],
        )?;

        tx.commit()?;

        info!(outfit_id = %outfit_id, user_id = %user_id, join_rows, "Outfit deleted");
        Ok(())
    }

    /// Number of join rows for an outfit, regardless of owner.
    pub fn count_outfit_item_rows(&self, outfit_id: Uuid) -> Result<u64> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM outfit_items WHERE outfit_id = ?1",
            params![outfit_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

fn item_owned_by(tx: &Transaction<'_>, item_id: Uuid, user_id: Uuid) -> Result<bool> {
    let found = tx
        .query_row(
            "SELECT 1 FROM items WHERE id = ?1 AND user_id = ?2",
            params![item_id.to_string(), user_id.to_string()],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}
