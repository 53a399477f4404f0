//! Shared cache-control policies for HTTP handlers.

/// Responses that must never be stored by any cache.
pub const NO_STORE_MUST_REVALIDATE: &str = "no-cache, no-store, must-revalidate";

/// Build the `Cache-Control` header tuple forbidding storage.
pub const fn no_store_header() -> (&'static str, &'static str) {
    ("Cache-Control", NO_STORE_MUST_REVALIDATE)
}

/// Build the legacy `Pragma` header tuple for HTTP/1.0 caches.
pub const fn pragma_no_cache_header() -> (&'static str, &'static str) {
    ("Pragma", "no-cache")
}
