//! Resource identity and lifecycle state as seen by the convergence engine.
//!
//! The engine only needs three things from a remote object: its id, the
//! scope it is listed under, and the lifecycle state the control plane
//! reports for it. Everything else lives in the richer models in
//! [`super::cluster`].

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::errors::ConvergeError;

/// Identifies one remote object within one collection scope.
///
/// The scope is the parent the collection is listed under (a space for
/// clusters, a site for blueprints). Immutable once a run starts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    /// Opaque resource identifier assigned by the control plane
    pub id: String,
    /// Opaque parent scope identifier (space or site id)
    pub scope: String,
}

impl ResourceRef {
    /// Create a reference from an id and its parent scope
    pub fn new(id: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            scope: scope.into(),
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.scope)
    }
}

/// Lifecycle state reported by the control plane.
///
/// Wire strings the control plane is known to emit map onto named
/// variants; anything else is kept verbatim so that it can be reported
/// as an unexpected state instead of being silently coerced.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObservedState {
    Initializing,
    Provisioning,
    Creating,
    Updating,
    Deleting,
    Ready,
    Deleted,
    /// A state string this controller does not know about
    Unrecognized(String),
}

impl ObservedState {
    /// Canonical wire representation
    pub fn as_str(&self) -> &str {
        match self {
            Self::Initializing => "initializing",
            Self::Provisioning => "infra-provisioning",
            Self::Creating => "creating",
            Self::Updating => "updating",
            Self::Deleting => "deleting",
            Self::Ready => "ready",
            Self::Deleted => "deleted",
            Self::Unrecognized(raw) => raw,
        }
    }
}

impl fmt::Display for ObservedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObservedState {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "initializing" => Self::Initializing,
            "infra-provisioning" | "provisioning" => Self::Provisioning,
            "creating" => Self::Creating,
            "updating" => Self::Updating,
            "deleting" => Self::Deleting,
            "ready" => Self::Ready,
            "deleted" => Self::Deleted,
            _ => Self::Unrecognized(s.to_string()),
        })
    }
}

impl Serialize for ObservedState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ObservedState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let Ok(state) = raw.parse::<Self>();
        Ok(state)
    }
}

/// A non-empty set of lifecycle states.
///
/// Used both for the states that end a run successfully (targets) and for
/// the in-progress states a run tolerates while waiting (pending).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSet(Vec<ObservedState>);

impl StateSet {
    /// Build a set, rejecting an empty list
    pub fn new(states: impl IntoIterator<Item = ObservedState>) -> Result<Self, ConvergeError> {
        let mut unique: Vec<ObservedState> = Vec::new();
        for state in states {
            if !unique.contains(&state) {
                unique.push(state);
            }
        }
        if unique.is_empty() {
            return Err(ConvergeError::EmptyStateSet);
        }
        Ok(Self(unique))
    }

    /// Target set for create and update runs
    pub fn ready() -> Self {
        Self(vec![ObservedState::Ready])
    }

    /// Target set for delete runs
    pub fn deleted() -> Self {
        Self(vec![ObservedState::Deleted])
    }

    /// In-progress states tolerated while waiting for `targets`.
    ///
    /// A deletion only ever passes through `deleting`; every other run may
    /// see any of the build-up states.
    pub fn pending_for(targets: &Self) -> Self {
        if targets.contains(&ObservedState::Deleted) {
            Self(vec![ObservedState::Deleting])
        } else {
            Self(vec![
                ObservedState::Initializing,
                ObservedState::Provisioning,
                ObservedState::Creating,
                ObservedState::Updating,
            ])
        }
    }

    /// Whether `state` is a member of this set
    pub fn contains(&self, state: &ObservedState) -> bool {
        self.0.contains(state)
    }

    /// Iterate over members in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &ObservedState> {
        self.0.iter()
    }
}

impl fmt::Display for StateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(ObservedState::as_str).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}

/// Minimal projection of a listed resource: its id and state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceStatus {
    pub id: String,
    pub state: ObservedState,
}

impl ResourceStatus {
    pub fn new(id: impl Into<String>, state: ObservedState) -> Self {
        Self {
            id: id.into(),
            state,
        }
    }
}

/// Why a probe could not produce an authoritative state this cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientCause {
    /// The list call failed with a fault classified as transient
    RemoteFault,
    /// The list succeeded but did not contain the resource
    AbsentFromList,
}

/// Result of one observation cycle of a refresh probe.
#[derive(Debug)]
pub enum Observation {
    /// The control plane reported this state for the resource
    Authoritative(ObservedState),
    /// No authoritative state is available right now; poll again
    Transient(TransientCause),
    /// The run cannot continue
    Terminal(ConvergeError),
}

/// Parameters of one convergence run.
#[derive(Debug, Clone)]
pub struct ConvergencePlan {
    /// States that end the run successfully
    pub targets: StateSet,
    /// In-progress states tolerated while waiting
    pub pending: StateSet,
    /// Wait before the first poll
    pub initial_delay: Duration,
    /// Fixed wait between polls
    pub interval: Duration,
    /// Overall deadline, measured from the start of the run
    pub timeout: Duration,
}

impl ConvergencePlan {
    /// Plan for arbitrary targets with the derived pending set
    pub fn new(targets: StateSet, initial_delay: Duration, interval: Duration, timeout: Duration) -> Self {
        let pending = StateSet::pending_for(&targets);
        Self {
            targets,
            pending,
            initial_delay,
            interval,
            timeout,
        }
    }

    /// Wait for a freshly created resource to become ready; polls at once
    pub fn for_create(interval: Duration, timeout: Duration) -> Self {
        Self::new(StateSet::ready(), Duration::ZERO, interval, timeout)
    }

    /// Wait for an updated resource to settle back to ready.
    ///
    /// The first poll is delayed one interval, otherwise the pre-update
    /// `ready` state would end the run before the update begins.
    pub fn for_update(interval: Duration, timeout: Duration) -> Self {
        Self::new(StateSet::ready(), interval, interval, timeout)
    }

    /// Wait for a resource to disappear; first poll after one interval
    pub fn for_delete(interval: Duration, timeout: Duration) -> Self {
        Self::new(StateSet::deleted(), interval, interval, timeout)
    }
}
