//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development. The Gemini API key and model are
//! absent: they are read on every recommendation request.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use closet_shared::constants::{
    DEFAULT_HTTP_PORT, DEFAULT_SESSION_TTL_HOURS, GEMINI_BASE_URL, MAX_IMAGE_SIZE,
};

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: `./closet.db`
    pub database_path: PathBuf,

    /// Directory where uploaded item images are stored.
    /// Env: `IMAGE_STORAGE_PATH`
    /// Default: `./images`
    pub image_storage_path: PathBuf,

    /// Maximum image size in bytes.
    /// Env: `MAX_IMAGE_SIZE`
    /// Default: 10 MiB
    pub max_image_size: usize,

    /// Secret the session signing key is derived from.
    /// Env: `SESSION_SECRET`
    /// Default: unset (random key per process; sessions end on restart).
    pub session_secret: Option<String>,

    /// Session token lifetime in hours.
    /// Env: `SESSION_TTL_HOURS`
    /// Default: `168`
    pub session_ttl_hours: i64,

    /// Whether new accounts may sign up.
    /// Env: `REGISTRATION_OPEN` (true/false)
    /// Default: `true`
    pub registration_open: bool,

    /// Sustained requests per second per IP on auth and recommendation routes.
    /// Env: `THROTTLE_RATE`
    /// Default: `5`
    pub throttle_rate: f64,

    /// Burst size for the same routes.
    /// Env: `THROTTLE_BURST`
    /// Default: `20`
    pub throttle_burst: f64,

    /// Gemini REST prefix; `/{model}:generateContent` is appended.
    /// Env: `GEMINI_BASE_URL`
    pub gemini_base_url: String,

    /// Timeout for one call to the generation endpoint.
    /// Env: `GEMINI_TIMEOUT_SECS`
    /// Default: `60`
    pub gemini_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_path: PathBuf::from("./closet.db"),
            image_storage_path: PathBuf::from("./images"),
            max_image_size: MAX_IMAGE_SIZE,
            session_secret: None,
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            registration_open: true,
            throttle_rate: 5.0,
            throttle_burst: 20.0,
            gemini_base_url: GEMINI_BASE_URL.to_string(),
            gemini_timeout_secs: 60,
        }
    }
}

// Hand-written so the session secret never reaches the logs.
impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("http_addr", &self.http_addr)
            .field("database_path", &self.database_path)
            .field("image_storage_path", &self.image_storage_path)
            .field("max_image_size", &self.max_image_size)
            .field(
                "session_secret",
                &self.session_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("session_ttl_hours", &self.session_ttl_hours)
            .field("registration_open", &self.registration_open)
            .field("throttle_rate", &self.throttle_rate)
            .field("throttle_burst", &self.throttle_burst)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("gemini_timeout_secs", &self.gemini_timeout_secs)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reading from any key/value
    /// source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("HTTP_ADDR") {
            match addr.parse::<SocketAddr>() {
                Ok(parsed) => config.http_addr = parsed,
                Err(_) => tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default"),
            }
        }

        if let Some(path) = lookup("DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }

        if let Some(path) = lookup("IMAGE_STORAGE_PATH") {
            config.image_storage_path = PathBuf::from(path);
        }

        if let Some(size) = parse_var(&lookup, "MAX_IMAGE_SIZE") {
            config.max_image_size = size;
        }

        if let Some(secret) = lookup("SESSION_SECRET") {
            if !secret.is_empty() {
                config.session_secret = Some(secret);
            }
        }

        if let Some(hours) = parse_var::<i64>(&lookup, "SESSION_TTL_HOURS") {
            if hours > 0 {
                config.session_ttl_hours = hours;
            } else {
                tracing::warn!(hours, "SESSION_TTL_HOURS must be positive, using default");
            }
        }

        if let Some(val) = lookup("REGISTRATION_OPEN") {
            config.registration_open = val != "false" && val != "0";
        }

        if let Some(rate) = parse_var(&lookup, "THROTTLE_RATE") {
            config.throttle_rate = rate;
        }

        if let Some(burst) = parse_var(&lookup, "THROTTLE_BURST") {
            config.throttle_burst = burst;
        }

        if let Some(url) = lookup("GEMINI_BASE_URL") {
            config.gemini_base_url = url.trim_end_matches('/').to_string();
        }

        if let Some(secs) = parse_var(&lookup, "GEMINI_TIMEOUT_SECS") {
            config.gemini_timeout_secs = secs;
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter.

        config
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Invalid value, using default");
            None
        }
    }
}
