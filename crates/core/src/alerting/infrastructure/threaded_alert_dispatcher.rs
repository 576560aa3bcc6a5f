use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::alerting::domain::alert_dispatcher::{AlertDispatcher, ShutdownReport};
use crate::alerting::domain::alert_job::{AlertJob, DispatchOutcome};
use crate::alerting::domain::alert_notifier::AlertNotifier;

/// Dispatches each alert on its own detached worker thread.
///
/// Workers report back over an unbounded channel that only the frame loop
/// reads. Jobs cannot be cancelled once started.
pub struct ThreadedAlertDispatcher {
    notifier: Arc<AlertNotifier>,
    outcome_tx: Sender<DispatchOutcome>,
    outcome_rx: Receiver<DispatchOutcome>,
    in_flight: usize,
}

impl ThreadedAlertDispatcher {
    pub fn new(notifier: AlertNotifier) -> Self {
        let (outcome_tx, outcome_rx) = crossbeam_channel::unbounded();
        Self {
            notifier: Arc::new(notifier),
            outcome_tx,
            outcome_rx,
            in_flight: 0,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}

impl AlertDispatcher for ThreadedAlertDispatcher {
    fn submit(&mut self, job: AlertJob) {
        let job_id = job.id;
        let notifier = self.notifier.clone();
        let tx = self.outcome_tx.clone();
        self.in_flight += 1;

        let spawned = std::thread::Builder::new()
            .name(format!("alert-{}", job_id.0))
            .spawn(move || {
                log::info!("Sending alert {job_id}...");
                let outcome = match notifier.dispatch(&job) {
                    Ok(()) => {
                        log::info!("Alert {job_id} delivered");
                        DispatchOutcome::delivered(job_id)
                    }
                    Err(e) => {
                        log::error!("{e}");
                        DispatchOutcome::failed(job_id, e.to_string())
                    }
                };
                // The receiver outlives every worker unless the session is gone.
                let _ = tx.send(outcome);
            });

        if let Err(e) = spawned {
            log::error!("Failed to start worker for alert {job_id}: {e}");
            let _ = self
                .outcome_tx
                .send(DispatchOutcome::failed(job_id, e.to_string()));
        }
    }

    fn drain_outcomes(&mut self) -> Vec<DispatchOutcome> {
        let outcomes: Vec<_> = self.outcome_rx.try_iter().collect();
        self.in_flight = self.in_flight.saturating_sub(outcomes.len());
        outcomes
    }

    fn shutdown(&mut self, grace: Duration) -> ShutdownReport {
        let mut report = ShutdownReport {
            outcomes: self.drain_outcomes(),
            abandoned: 0,
        };
        let deadline = Instant::now() + grace;

        while self.in_flight > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.outcome_rx.recv_timeout(remaining) {
                Ok(outcome) => {
                    self.in_flight -= 1;
                    report.outcomes.push(outcome);
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        report.abandoned = self.in_flight;
        if report.abandoned > 0 {
            log::warn!(
                "Abandoning {} alert(s) still in flight after {:.1}s",
                report.abandoned,
                grace.as_secs_f64()
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerting::domain::alert_job::AlertJobId;
    use crate::alerting::domain::alert_message::AlertMessage;
    use crate::alerting::domain::evidence_encoder::EvidenceEncoder;
    use crate::alerting::domain::notification_transport::{
        NotificationTransport, TransportError,
    };
    use crate::shared::frame::Frame;
    use crate::shared::timestamp::Timestamp;

    struct PassthroughEncoder;

    impl EvidenceEncoder for PassthroughEncoder {
        fn content_type(&self) -> &'static str {
            "application/octet-stream"
        }

        fn encode(&self, frame: &Frame) -> Result<Vec<u8>, TransportError> {
            Ok(frame.data().to_vec())
        }
    }

    /// Transport that waits, then fails for odd job attachments.
    struct SlowTransport {
        delay: Duration,
    }

    impl NotificationTransport for SlowTransport {
        fn send(
            &self,
            _message: &AlertMessage,
            attachment: &[u8],
            _content_type: &str,
        ) -> Result<(), TransportError> {
            std::thread::sleep(self.delay);
            if attachment[0] % 2 == 1 {
                Err("mailbox unavailable".into())
            } else {
                Ok(())
            }
        }
    }

    fn dispatcher(delay: Duration) -> ThreadedAlertDispatcher {
        ThreadedAlertDispatcher::new(AlertNotifier::new(
            Box::new(PassthroughEncoder),
            Box::new(SlowTransport { delay }),
        ))
    }

    fn job(id: u64) -> AlertJob {
        AlertJob {
            id: AlertJobId(id),
            evidence: Frame::new(vec![id as u8; 3], 1, 1, 3, 0),
            fired_at: Timestamp::now(),
        }
    }

    #[test]
    fn test_submit_does_not_block() {
        let mut d = dispatcher(Duration::from_millis(300));
        let start = Instant::now();
        d.submit(job(2));
        assert!(start.elapsed() < Duration::from_millis(200));
        assert_eq!(d.in_flight(), 1);
        d.shutdown(Duration::from_secs(2));
    }

    #[test]
    fn test_outcomes_are_tagged_with_job_ids() {
        let mut d = dispatcher(Duration::ZERO);
        d.submit(job(2));
        d.submit(job(3));

        let mut outcomes = d.shutdown(Duration::from_secs(5)).outcomes;
        outcomes.sort_by_key(|o| o.job_id);
        assert_eq!(
            outcomes,
            vec![
                DispatchOutcome::delivered(AlertJobId(2)),
                DispatchOutcome::failed(
                    AlertJobId(3),
                    "failed to send alert #3: mailbox unavailable"
                ),
            ]
        );
    }

    #[test]
    fn test_drain_returns_each_outcome_once() {
        let mut d = dispatcher(Duration::ZERO);
        d.submit(job(4));

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut seen = Vec::new();
        while seen.is_empty() && Instant::now() < deadline {
            seen.extend(d.drain_outcomes());
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(seen.len(), 1);
        assert_eq!(d.in_flight(), 0);
        assert!(d.drain_outcomes().is_empty());
    }

    #[test]
    fn test_shutdown_abandons_after_grace() {
        let mut d = dispatcher(Duration::from_secs(2));
        d.submit(job(6));

        let start = Instant::now();
        let report = d.shutdown(Duration::from_millis(100));
        assert!(start.elapsed() < Duration::from_secs(1));
        assert!(report.outcomes.is_empty());
        assert_eq!(report.abandoned, 1);
    }

    #[test]
    fn test_shutdown_with_nothing_in_flight_returns_immediately() {
        let mut d = dispatcher(Duration::ZERO);
        let report = d.shutdown(Duration::from_secs(10));
        assert!(report.outcomes.is_empty());
        assert_eq!(report.abandoned, 0);
    }
}
