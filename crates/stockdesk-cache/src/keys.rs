//! Cache key builders.
//!
//! Every key the application writes is built here. Provider-level
//! prefixes (`cache.redis.key_prefix`) are applied on top.

/// Key of a named lease.
pub fn lease(name: &str) -> String {
    format!("lease:{name}")
}
