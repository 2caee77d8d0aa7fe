//! Limit/offset clamps for listing endpoints.

/// Default page size for submission listings.
pub const DEFAULT_LIST_LIMIT: i64 = 50;

/// Upper bound for any caller-supplied page size.
pub const MAX_LIST_LIMIT: i64 = 200;

/// Clamp a user-provided limit into `1..=max`, using `default` when absent.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).clamp(1, max)
}

/// Clamp a user-provided offset to non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}
