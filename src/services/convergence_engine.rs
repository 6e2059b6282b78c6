//! Convergence engine: poll a probe until the remote reaches a target state.
//!
//! One call to [`ConvergenceEngine::converge`] is one convergence run. The
//! run waits the plan's initial delay, then invokes the probe, classifies
//! the observation, and either stops or sleeps a fixed interval before the
//! next poll. Every wait (and the probe call itself) is raced against the
//! caller's [`CancellationToken`].
//!
//! Outcomes, exactly one per run:
//! - target state observed: `Ok(ConvergenceReport)`
//! - state outside targets and pending: [`ConvergeError::UnexpectedState`]
//! - probe terminal error: propagated as-is
//! - deadline passed: [`ConvergeError::Timeout`]
//! - token cancelled: [`ConvergeError::Cancelled`]

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

use super::refresh_probe::Probe;
use crate::domain::errors::ConvergeError;
use crate::domain::models::{ConvergencePlan, Observation, ObservedState, ResourceRef};

/// Successful end of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvergenceReport {
    /// The target state that ended the run
    pub state: ObservedState,
    /// Number of probe invocations, including transient ones
    pub polls: u32,
    /// Wall-clock time from start to the final observation
    pub elapsed: Duration,
}

/// Drives refresh probes to a target state.
///
/// Stateless: all per-run state lives in the probe and on the stack of
/// `converge`, so one engine can serve any number of concurrent runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConvergenceEngine;

impl ConvergenceEngine {
    pub const fn new() -> Self {
        Self
    }

    /// Run one convergence to completion.
    ///
    /// `resource` only labels the tracing span; the probe is already bound
    /// to it.
    pub async fn converge<P>(
        &self,
        resource: &ResourceRef,
        probe: &mut P,
        plan: &ConvergencePlan,
        cancel: &CancellationToken,
    ) -> Result<ConvergenceReport, ConvergeError>
    where
        P: Probe + ?Sized,
    {
        let span = info_span!(
            "converge",
            run_id = %Uuid::new_v4(),
            resource = %resource,
            targets = %plan.targets,
        );
        Self::run(probe, plan, cancel).instrument(span).await
    }

    async fn run<P>(
        probe: &mut P,
        plan: &ConvergencePlan,
        cancel: &CancellationToken,
    ) -> Result<ConvergenceReport, ConvergeError>
    where
        P: Probe + ?Sized,
    {
        let started = Instant::now();
        // A timeout too large to represent never expires
        let deadline = started.checked_add(plan.timeout);
        let mut polls: u32 = 0;
        let mut last_state: Option<ObservedState> = None;

        if !plan.initial_delay.is_zero() {
            debug!(delay = ?plan.initial_delay, "waiting before first poll");
            wait(sleep(plan.initial_delay), cancel).await?;
        }

        loop {
            polls += 1;
            let observation = wait(probe.observe(), cancel).await?;

            match observation {
                Observation::Terminal(err) => {
                    error!(polls, error = %err, "convergence failed");
                    return Err(err);
                }
                Observation::Authoritative(state) if plan.targets.contains(&state) => {
                    let elapsed = started.elapsed();
                    info!(polls, state = %state, elapsed = ?elapsed, "target state reached");
                    return Ok(ConvergenceReport {
                        state,
                        polls,
                        elapsed,
                    });
                }
                Observation::Authoritative(state) if !plan.pending.contains(&state) => {
                    error!(polls, state = %state, "unexpected state");
                    return Err(ConvergeError::unexpected(state, &plan.targets));
                }
                Observation::Authoritative(state) => {
                    if last_state.as_ref() != Some(&state) {
                        debug!(polls, state = %state, "state transition");
                    }
                    last_state = Some(state);
                }
                Observation::Transient(cause) => {
                    debug!(polls, ?cause, "no authoritative state this poll");
                }
            }

            let now = Instant::now();
            let pause = match deadline {
                Some(deadline) if now >= deadline => {
                    let elapsed = now - started;
                    error!(polls, elapsed = ?elapsed, "deadline exceeded");
                    return Err(ConvergeError::Timeout {
                        elapsed,
                        targets: plan.targets.to_string(),
                        last_state,
                    });
                }
                // Clamped so the last poll lands on the deadline
                Some(deadline) => plan.interval.min(deadline - now),
                None => plan.interval,
            };
            wait(sleep(pause), cancel).await?;
        }
    }
}

/// Await `fut` unless the token fires first
async fn wait<F: Future>(fut: F, cancel: &CancellationToken) -> Result<F::Output, ConvergeError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => {
            info!("convergence cancelled");
            Err(ConvergeError::Cancelled)
        }
        output = fut => Ok(output),
    }
}
