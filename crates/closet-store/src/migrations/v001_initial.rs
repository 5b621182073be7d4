//! v001 -- Initial schema creation.
//!
//! Creates `users`, `items`, `outfits`, and the `outfit_items` join table.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id            TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    email         TEXT NOT NULL UNIQUE,       -- trimmed, lower-cased
    name          TEXT NOT NULL,
    password_hash TEXT NOT NULL,              -- argon2id PHC string
    created_at    TEXT NOT NULL               -- RFC-3339, microseconds
);

-- ----------------------------------------------------------------
-- Clothing items
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS items (
    id         TEXT PRIMARY KEY NOT NULL,     -- UUID v4
    user_id    TEXT NOT NULL,                 -- FK -> users(id)
    category   TEXT NOT NULL CHECK (category IN
                   ('shirts', 'pants', 'skirts', 'dresses', 'shoes', 'accessories')),
    name       TEXT NOT NULL,
    brand      TEXT NOT NULL DEFAULT '',
    style      TEXT NOT NULL DEFAULT '',
    color      TEXT NOT NULL DEFAULT '',
    image_url  TEXT NOT NULL DEFAULT '',      -- data: URL or /images/<id>
    created_at TEXT NOT NULL,

    FOREIGN KEY (user_id) REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_items_user_created
    ON items(user_id, created_at DESC);

-- ----------------------------------------------------------------
-- Outfits
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS outfits (
    id         TEXT PRIMARY KEY NOT NULL,     -- UUID v4
    user_id    TEXT NOT NULL,                 -- FK -> users(id)
    name       TEXT NOT NULL,
    created_at TEXT NOT NULL,

    FOREIGN KEY (user_id) REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_outfits_user_created
    ON outfits(user_id, created_at DESC);

-- ----------------------------------------------------------------
-- Outfit <-> item join rows
--
-- No cascade from outfits: join rows are removed explicitly before the
-- outfit row. Removing an item drops it from every outfit.
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS outfit_items (
    outfit_id TEXT NOT NULL,                  -- FK -> outfits(id)
    item_id   TEXT NOT NULL,                  -- FK -> items(id)
    position  INTEGER NOT NULL,               -- selection order

    PRIMARY KEY (outfit_id, item_id),
    FOREIGN KEY (outfit_id) REFERENCES outfits(id),
    FOREIGN KEY (item_id) REFERENCES items(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_outfit_items_item ON outfit_items(item_id);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
