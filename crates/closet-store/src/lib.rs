//! # closet-store
//!
//! SQLite persistence for the virtual closet.
//!
//! The crate exposes a synchronous [`Database`] handle wrapping a
//! `rusqlite::Connection`, with typed helpers for the three repositories:
//! credentials (`users`), clothing items, and outfits. Multi-statement
//! mutations run inside a transaction.

pub mod database;
pub mod items;
pub mod migrations;
pub mod models;
pub mod outfits;
pub mod users;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;
