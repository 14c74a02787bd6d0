//! # Client Constants
//!
//! Default configuration values and the operation names used for cache keys
//! and TTL lookup.

/// Default configuration values
pub mod defaults {
    pub const BASE_URL: &str = "http://localhost:8080";
    pub const TIMEOUT_MS: u64 = 30_000;

    pub const MAX_RETRY_ATTEMPTS: u32 = 3;
    pub const BASE_BACKOFF_MS: u64 = 200;
    pub const MAX_BACKOFF_MS: u64 = 5_000;
    pub const CIRCUIT_FAILURE_THRESHOLD: u32 = 5;
    pub const CIRCUIT_COOLDOWN_MS: u64 = 30_000;

    pub const CACHE_TTL_MS: u64 = 60_000;
    pub const LIST_TTL_MS: u64 = 30_000;
    pub const GET_TTL_MS: u64 = 120_000;

    pub const COLLECTION_ROUTE: &str = "/api/{resource}";
    pub const ITEM_ROUTE: &str = "/api/{resource}/{id}";
    pub const HEALTH_ROUTE: &str = "/health";

    pub const STALENESS_WINDOW_MS: u64 = 60_000;
    pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";
}

/// Logical operation names
pub mod operations {
    pub const LIST: &str = "list";
    pub const GET: &str = "get";
    pub const CREATE: &str = "create";
    pub const UPDATE: &str = "update";
    pub const DELETE: &str = "delete";
}

/// Well-known query parameter names for paginated listings
pub mod query {
    pub const PAGE: &str = "page";
    pub const PAGE_SIZE: &str = "page_size";
    pub const SEARCH: &str = "search";
}
