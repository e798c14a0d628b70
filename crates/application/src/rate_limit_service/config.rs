/// Configuration for a rate limit rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitRule {
    /// Category name prefixed to every key (e.g., "write").
    pub category: String,
    /// Maximum number of attempts allowed in the window.
    pub max_attempts: i32,
    /// Window duration in seconds.
    pub window_seconds: i64,
}

impl RateLimitRule {
    /// Creates a new rate limit rule.
    #[must_use]
    pub fn new(category: impl Into<String>, max_attempts: i32, window_seconds: i64) -> Self {
        Self {
            category: category.into(),
            max_attempts,
            window_seconds,
        }
    }

    /// Default budget for mutating requests: 60 writes per caller per minute.
    #[must_use]
    pub fn default_write_rule() -> Self {
        Self::new("write", 60, 60)
    }
}
