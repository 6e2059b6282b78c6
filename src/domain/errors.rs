//! Error taxonomy for the controller.
//!
//! Three layers, from the wire upwards:
//! - [`ClientError`]: one failed call to the control plane or identity service
//! - [`ConvergeError`]: why a convergence run ended without reaching a target
//! - [`OperationError`]: which phase of a lifecycle operation failed

use std::time::Duration;

use thiserror::Error;

use crate::domain::models::{ObservedState, ResourceRef, StateSet};

/// A failed call to a remote collaborator.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// The remote answered with a non-success HTTP status
    #[error("remote returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The request timed out at the transport layer (no status available)
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Connection-level failure other than a timeout
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body could not be decoded
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ClientError {
    /// HTTP status code, when the remote produced one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Status {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Failure to obtain an access token.
#[derive(Debug, Clone, Error)]
pub enum CredentialError {
    #[error("no credentials configured: {0}")]
    NotConfigured(String),

    #[error("token request failed: {0}")]
    Request(#[from] ClientError),

    #[error("token response rejected: {0}")]
    InvalidResponse(String),
}

/// Terminal outcome of a convergence run that did not reach a target state.
#[derive(Debug, Clone, Error)]
pub enum ConvergeError {
    /// The list call failed permanently, or transient faults exhausted the budget
    #[error("error in getting resource list: {0}")]
    ListFailed(#[source] ClientError),

    /// The resource stayed absent from its collection past the budget
    #[error("failed to find resource {id} in list")]
    NotFoundInList { id: String },

    /// The remote entered a state the run did not anticipate
    #[error("unexpected state '{state}', wanted {targets}")]
    UnexpectedState { state: ObservedState, targets: String },

    /// The deadline elapsed before a target state was observed
    #[error("timeout after {elapsed:?} waiting for {targets} (last state: {})", .last_state.as_ref().map_or("none", ObservedState::as_str))]
    Timeout {
        elapsed: Duration,
        targets: String,
        last_state: Option<ObservedState>,
    },

    /// The caller cancelled the run
    #[error("convergence cancelled")]
    Cancelled,

    /// A fresh token could not be obtained for a poll
    #[error("error in getting token: {0}")]
    Credentials(#[from] CredentialError),

    /// A state set was built with no members
    #[error("state set must not be empty")]
    EmptyStateSet,
}

impl ConvergeError {
    pub(crate) fn unexpected(state: ObservedState, targets: &StateSet) -> Self {
        Self::UnexpectedState {
            state,
            targets: targets.to_string(),
        }
    }

    /// Deadline exceeded; the caller may re-drive a fresh run for the same id
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// The run was cancelled by the caller
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Failure of a lifecycle operation, tagged with the phase that failed.
#[derive(Debug, Error)]
pub enum OperationError {
    /// Phase (a): the mutating call was rejected; nothing changed remotely
    #[error("{operation} failed: {source}")]
    Mutation {
        operation: &'static str,
        #[source]
        source: ClientError,
    },

    /// Phase (b): the mutation took effect but convergence did not finish.
    /// Re-drive convergence for `resource` rather than repeating the mutation.
    #[error("{resource} did not converge: {source}")]
    Convergence {
        resource: ResourceRef,
        #[source]
        source: ConvergeError,
    },

    /// Phase (c) or a plain read: the authoritative read failed
    #[error("failed to read {resource}: {source}")]
    Read {
        resource: ResourceRef,
        #[source]
        source: ClientError,
    },

    /// Listing a collection failed
    #[error("failed to list {kind} in {scope}: {source}")]
    List {
        kind: &'static str,
        scope: String,
        #[source]
        source: ClientError,
    },

    /// A lookup by name found nothing
    #[error("{kind} '{name}' not found in {scope}")]
    NotFound {
        kind: &'static str,
        name: String,
        scope: String,
    },

    #[error("error in getting token: {0}")]
    Credentials(#[from] CredentialError),
}

impl OperationError {
    /// The underlying convergence error, if this failed in phase (b)
    pub fn convergence(&self) -> Option<&ConvergeError> {
        match self {
            Self::Convergence { source, .. } => Some(source),
            _ => None,
        }
    }
}
