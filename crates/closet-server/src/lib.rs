//! # closet-server
//!
//! HTTP backend for the virtual closet.
//!
//! - **REST API** (axum) for accounts, clothing items, outfits, and item
//!   images
//! - **Signed session tokens** checked on every authenticated route
//! - **Outfit recommendations** proxied to the Gemini generation API
//! - **Per-IP throttling** on the credential and recommendation routes

pub mod api;
pub mod config;
pub mod error;
pub mod image_store;
pub mod rate_limit;
pub mod recommend;
pub mod session;
