//! Transient vs. permanent classification of control-plane failures.

use crate::domain::errors::ClientError;

/// Whether a failure is worth retrying
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultClass {
    /// Expected to clear on its own (timeouts, specific server errors)
    Transient,
    /// Retrying will not help (authorization, malformed request, ...)
    Permanent,
}

/// Pure classifier; it never touches retry counters.
///
/// Retryable: any status in the configured set, and transport-level
/// timeouts where no status is available. Everything else is permanent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryClassifier {
    retryable_statuses: Vec<u16>,
}

impl RetryClassifier {
    pub fn new(retryable_statuses: impl Into<Vec<u16>>) -> Self {
        Self {
            retryable_statuses: retryable_statuses.into(),
        }
    }

    pub fn classify(&self, error: &ClientError) -> FaultClass {
        match error {
            ClientError::Status { status, .. } if self.retryable_statuses.contains(status) => {
                FaultClass::Transient
            }
            ClientError::Timeout(_) => FaultClass::Transient,
            _ => FaultClass::Permanent,
        }
    }

    pub fn is_transient(&self, error: &ClientError) -> bool {
        self.classify(error) == FaultClass::Transient
    }
}

impl Default for RetryClassifier {
    /// 500 and the gateway errors 502/504
    fn default() -> Self {
        Self::new([500, 502, 504])
    }
}
