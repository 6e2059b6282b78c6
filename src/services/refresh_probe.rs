//! Refresh probes: one observation cycle per call, with per-run retry budgets.
//!
//! A [`ProbeFactory`] holds the shared collaborators (lister, credentials,
//! classifier) and stamps out a [`RefreshProbe`] per convergence run. The
//! probe owns its [`RetryBudget`] exclusively and is driven through
//! `&mut self`, so concurrent runs never share counters.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::retry_classifier::{FaultClass, RetryClassifier};
use crate::domain::errors::{ClientError, ConvergeError};
use crate::domain::models::{Observation, ObservedState, ResourceRef, StateSet, TransientCause};
use crate::domain::ports::{CredentialProvider, ResourceLister};

/// One observation cycle against the remote system.
///
/// Implementations never panic across this boundary; every failure is an
/// [`Observation::Terminal`].
#[async_trait]
pub trait Probe: Send {
    async fn observe(&mut self) -> Observation;
}

/// Two independent counters of consecutive unsuccessful polls.
///
/// Each category allows `limit` consecutive retries; the next failure of
/// that category is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    limit: u32,
    transient_faults: u32,
    absences: u32,
}

impl RetryBudget {
    pub const fn new(limit: u32) -> Self {
        Self {
            limit,
            transient_faults: 0,
            absences: 0,
        }
    }

    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Consecutive transient list failures so far
    pub const fn transient_faults(&self) -> u32 {
        self.transient_faults
    }

    /// Consecutive polls where the resource was missing from the list
    pub const fn absences(&self) -> u32 {
        self.absences
    }

    /// Spend one transient retry; `false` once the budget is gone
    fn consume_transient(&mut self) -> bool {
        if self.transient_faults < self.limit {
            self.transient_faults += 1;
            true
        } else {
            false
        }
    }

    /// Spend one absence retry; `false` once the count exceeds the limit
    fn consume_absence(&mut self) -> bool {
        self.absences = self.absences.saturating_add(1);
        self.absences <= self.limit
    }

    fn reset_transient(&mut self) {
        self.transient_faults = 0;
    }

    fn reset_absence(&mut self) {
        self.absences = 0;
    }
}

/// Builds refresh probes bound to one resource and one target set
#[derive(Clone)]
pub struct ProbeFactory {
    lister: Arc<dyn ResourceLister>,
    credentials: Arc<dyn CredentialProvider>,
    classifier: RetryClassifier,
    retry_limit: u32,
}

impl ProbeFactory {
    pub fn new(
        lister: Arc<dyn ResourceLister>,
        credentials: Arc<dyn CredentialProvider>,
        classifier: RetryClassifier,
        retry_limit: u32,
    ) -> Self {
        Self {
            lister,
            credentials,
            classifier,
            retry_limit,
        }
    }

    /// A fresh probe with zeroed counters
    pub fn probe_for(&self, resource: ResourceRef, targets: &StateSet) -> RefreshProbe {
        RefreshProbe {
            lister: Arc::clone(&self.lister),
            credentials: Arc::clone(&self.credentials),
            classifier: self.classifier.clone(),
            expect_deletion: targets.contains(&ObservedState::Deleted),
            resource,
            budget: RetryBudget::new(self.retry_limit),
        }
    }
}

/// Observes one resource by listing its collection scope.
///
/// Absence from the list means success when the run waits for deletion;
/// otherwise it is a transient anomaly with its own budget.
pub struct RefreshProbe {
    lister: Arc<dyn ResourceLister>,
    credentials: Arc<dyn CredentialProvider>,
    classifier: RetryClassifier,
    resource: ResourceRef,
    expect_deletion: bool,
    budget: RetryBudget,
}

impl RefreshProbe {
    pub fn resource(&self) -> &ResourceRef {
        &self.resource
    }

    /// Current counters, mostly for diagnostics and tests
    pub const fn budget(&self) -> RetryBudget {
        self.budget
    }

    fn on_list_error(&mut self, error: ClientError) -> Observation {
        if self.classifier.classify(&error) == FaultClass::Transient {
            if self.budget.consume_transient() {
                warn!(
                    resource = %self.resource,
                    attempt = self.budget.transient_faults(),
                    limit = self.budget.limit(),
                    error = %error,
                    "transient error listing resources, retrying"
                );
                return Observation::Transient(TransientCause::RemoteFault);
            }
            warn!(resource = %self.resource, error = %error, "transient error budget exhausted");
        }
        Observation::Terminal(ConvergeError::ListFailed(error))
    }

    fn on_absent(&mut self) -> Observation {
        if self.expect_deletion {
            debug!(resource = %self.resource, "resource gone from list");
            return Observation::Authoritative(ObservedState::Deleted);
        }
        if self.budget.consume_absence() {
            warn!(
                resource = %self.resource,
                attempt = self.budget.absences(),
                limit = self.budget.limit(),
                "resource missing from list, retrying"
            );
            Observation::Transient(TransientCause::AbsentFromList)
        } else {
            Observation::Terminal(ConvergeError::NotFoundInList {
                id: self.resource.id.clone(),
            })
        }
    }
}

#[async_trait]
impl Probe for RefreshProbe {
    async fn observe(&mut self) -> Observation {
        // Fetched on every cycle: tokens can expire between polls
        let token = match self.credentials.token().await {
            Ok(token) => token,
            Err(err) => return Observation::Terminal(err.into()),
        };

        let statuses = match self.lister.list_statuses(&token, &self.resource.scope).await {
            Ok(statuses) => statuses,
            Err(err) => return self.on_list_error(err),
        };
        self.budget.reset_transient();

        match statuses.into_iter().find(|s| s.id == self.resource.id) {
            Some(found) => {
                self.budget.reset_absence();
                Observation::Authoritative(found.state)
            }
            None => self.on_absent(),
        }
    }
}
