use crate::config::CapacityConfig;
use crate::core::{Result, StasisError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allow,
    Deny,
}

/// Admission check against the global stasis cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityGuard {
    enabled: bool,
    limit: usize,
}

impl CapacityGuard {
    pub fn new(enabled: bool, limit: usize) -> Self {
        Self { enabled, limit }
    }

    pub fn from_config(config: &CapacityConfig) -> Self {
        Self::new(config.enabled, config.max_total)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn admit(&self, current_count: usize) -> Admission {
        if self.enabled && current_count >= self.limit {
            Admission::Deny
        } else {
            Admission::Allow
        }
    }

    /// `admit` as a `Result`, for use with `?`.
    pub fn check(&self, current_count: usize) -> Result<()> {
        match self.admit(current_count) {
            Admission::Allow => Ok(()),
            Admission::Deny => Err(StasisError::CapacityExceeded { limit: self.limit }),
        }
    }

    /// Free slots left, or `None` when the cap is disabled.
    pub fn remaining(&self, current_count: usize) -> Option<usize> {
        self.enabled
            .then(|| self.limit.saturating_sub(current_count))
    }
}

impl Default for CapacityGuard {
    fn default() -> Self {
        Self::from_config(&CapacityConfig::default())
    }
}
