/// Application name
pub const APP_NAME: &str = "Virtual Closet";

/// Default HTTP API port (server)
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Key derivation context for the session signing key (BLAKE3)
pub const KDF_CONTEXT_SESSION_KEY: &str = "closet-session-key-v1";

/// Default session lifetime in hours (one week)
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 168;

/// Maximum uploaded image size in bytes (10 MiB)
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// Default Gemini model used for recommendations
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Gemini REST endpoint prefix
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Output token cap sent with every recommendation request
pub const RECOMMENDATION_MAX_OUTPUT_TOKENS: u32 = 1024;
