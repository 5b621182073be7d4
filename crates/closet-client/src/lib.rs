//! # closet-client
//!
//! Typed HTTP client for the closet server, with a persistent session
//! cache and the transient outfit selection used while building an outfit.

pub mod client;
pub mod draft;
pub mod error;
pub mod session;

pub use client::ClosetClient;
pub use draft::OutfitDraft;
pub use error::{ClientError, Result};
pub use session::{CachedSession, SessionCache};
