//! # closet-shared
//!
//! Types shared by the closet server, store, and client: the clothing
//! domain model, the JSON request/response bodies of the HTTP API, session
//! token signing, and password hashing.

pub mod constants;
pub mod error;
pub mod password;
pub mod protocol;
pub mod session;
pub mod types;
