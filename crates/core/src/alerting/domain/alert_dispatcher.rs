use std::time::Duration;

use super::alert_job::{AlertJob, DispatchOutcome};

/// What was left when the dispatcher shut down.
#[derive(Debug, Default)]
pub struct ShutdownReport {
    /// Outcomes that arrived during the grace period.
    pub outcomes: Vec<DispatchOutcome>,
    /// Jobs still in flight when the grace period ran out.
    pub abandoned: usize,
}

/// Runs alert delivery off the frame loop.
///
/// This is a port. The loop submits jobs and polls for outcomes once per
/// tick; it never waits on delivery except in [`AlertDispatcher::shutdown`].
pub trait AlertDispatcher: Send {
    fn submit(&mut self, job: AlertJob);

    /// Returns every outcome that has arrived since the last call, without
    /// blocking.
    fn drain_outcomes(&mut self) -> Vec<DispatchOutcome>;

    /// Waits at most `grace` for in-flight jobs, then abandons the rest.
    fn shutdown(&mut self, grace: Duration) -> ShutdownReport;
}
