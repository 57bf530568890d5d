use crate::config::LimitsConfig;

/// Resolves caller-supplied result sizes against the configured bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultLimits {
    pub default_limit: u64,
    pub max_limit: u64,
}

impl ResultLimits {
    /// Effective limit for a request.
    ///
    /// Missing, zero or negative values fall back to the default; values
    /// above the ceiling are clamped to it.
    pub fn resolve(&self, requested: Option<i64>) -> u64 {
        let Some(requested) = requested.filter(|n| *n > 0) else {
            return self.default_limit;
        };

        let requested = requested as u64;
        if requested > self.max_limit {
            tracing::warn!(
                requested,
                max_limit = self.max_limit,
                "Result limit clamped to configured maximum"
            );
            return self.max_limit;
        }
        requested
    }
}

impl Default for ResultLimits {
    fn default() -> Self {
        Self::from(&LimitsConfig::default())
    }
}

impl From<&LimitsConfig> for ResultLimits {
    fn from(config: &LimitsConfig) -> Self {
        Self {
            default_limit: config.default_limit,
            max_limit: config.max_limit,
        }
    }
}
