use std::fmt;
use std::sync::atomic::Ordering;
use std::time::Instant;

use chrono::{DateTime, Local};

use crate::alerting::domain::alert_dispatcher::AlertDispatcher;
use crate::alerting::domain::alert_job::DispatchOutcome;
use crate::alerting::domain::presence_machine::PresenceMachine;
use crate::detection::domain::detection::contains_person;
use crate::detection::domain::object_detector::ObjectDetector;
use crate::events::domain::event_boundary_logger::EventBoundaryLogger;
use crate::events::domain::event_log::EventLogEntry;
use crate::events::domain::event_log_store::EventLogStore;
use crate::motion::domain::gray_frame::GrayFrame;
use crate::motion::domain::motion_gate::MotionGate;
use crate::motion::domain::motion_status::{MotionEdge, MotionStatus};
use crate::shared::frame::Frame;
use crate::video::domain::frame_source::FrameSource;

use super::session_config::SessionConfig;
use super::session_logger::{NullSessionLogger, SessionLogger};

/// Why the frame loop stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// Quit was requested.
    Quit,
    /// The source ran out of frames.
    EndOfStream,
    /// Acquisition or motion gating failed.
    Failed,
}

/// Counters and episodes gathered over one session.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionReport {
    pub stop_reason: StopReason,
    pub frames_processed: usize,
    pub detector_runs: usize,
    pub detector_failures: usize,
    pub alerts_fired: usize,
    pub alerts_delivered: usize,
    pub dispatch_failures: usize,
    pub alerts_abandoned: usize,
    pub episodes: Vec<EventLogEntry>,
}

impl SessionReport {
    fn new() -> Self {
        Self {
            stop_reason: StopReason::Quit,
            frames_processed: 0,
            detector_runs: 0,
            detector_failures: 0,
            alerts_fired: 0,
            alerts_delivered: 0,
            dispatch_failures: 0,
            alerts_abandoned: 0,
            episodes: Vec::new(),
        }
    }
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Session summary ({:?}):", self.stop_reason)?;
        writeln!(f, "  frames processed : {}", self.frames_processed)?;
        writeln!(
            f,
            "  detector runs    : {} ({} failed)",
            self.detector_runs, self.detector_failures
        )?;
        writeln!(
            f,
            "  alerts           : {} fired, {} delivered, {} failed, {} abandoned",
            self.alerts_fired, self.alerts_delivered, self.dispatch_failures, self.alerts_abandoned
        )?;
        write!(f, "  motion episodes  : {}", self.episodes.len())
    }
}

/// Owns the frame loop: motion gate → detector → presence machine →
/// event boundaries, with alert delivery handed to the dispatcher.
///
/// Presence state and the event accumulator are touched only from the
/// thread calling [`MonitorSession::run`].
pub struct MonitorSession {
    source: Box<dyn FrameSource>,
    gate: Box<dyn MotionGate>,
    detector: Box<dyn ObjectDetector>,
    dispatcher: Box<dyn AlertDispatcher>,
    event_log: Box<dyn EventLogStore>,
    logger: Box<dyn SessionLogger>,
    config: SessionConfig,
}

impl MonitorSession {
    pub fn new(
        source: Box<dyn FrameSource>,
        gate: Box<dyn MotionGate>,
        detector: Box<dyn ObjectDetector>,
        dispatcher: Box<dyn AlertDispatcher>,
        event_log: Box<dyn EventLogStore>,
        config: SessionConfig,
    ) -> Self {
        Self {
            source,
            gate,
            detector,
            dispatcher,
            event_log,
            logger: Box::new(NullSessionLogger),
            config,
        }
    }

    pub fn with_logger(mut self, logger: Box<dyn SessionLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Runs until quit, end of stream, or failure, then tears down.
    ///
    /// The event log is flushed on every exit path. An acquisition failure
    /// is returned after the flush.
    pub fn run(mut self) -> Result<SessionReport, Box<dyn std::error::Error>> {
        let mut report = SessionReport::new();

        let background = match self.capture_background() {
            Ok(Some(bg)) => bg,
            Ok(None) => {
                self.source.close();
                report.stop_reason = if self.is_cancelled() {
                    StopReason::Quit
                } else {
                    StopReason::EndOfStream
                };
                return Ok(report);
            }
            Err(e) => {
                self.source.close();
                return Err(e);
            }
        };
        self.logger.info("Monitoring active");

        let mut presence = PresenceMachine::new(self.config.presence);
        let mut boundaries = EventBoundaryLogger::new();
        let mut last_seen: DateTime<Local> = Local::now();
        let mut first_error: Option<Box<dyn std::error::Error>> = None;

        loop {
            if self.is_cancelled() {
                report.stop_reason = StopReason::Quit;
                break;
            }

            for outcome in self.dispatcher.drain_outcomes() {
                apply_outcome(&mut presence, &mut report, &outcome);
            }

            let frame = match self.source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    report.stop_reason = StopReason::EndOfStream;
                    break;
                }
                Err(e) => {
                    log::error!("Frame acquisition failed: {e}");
                    report.stop_reason = StopReason::Failed;
                    first_error = Some(e);
                    break;
                }
            };
            last_seen = frame.timestamp().wall;

            match self.process_frame(&background, &frame, &mut presence, &mut boundaries, &mut report)
            {
                Ok(()) => {}
                Err(e) => {
                    log::error!("Motion gate failed: {e}");
                    report.stop_reason = StopReason::Failed;
                    first_error = Some(e);
                    break;
                }
            }
        }

        self.source.close();

        if report.stop_reason != StopReason::Failed && boundaries.close_open(last_seen) {
            self.logger
                .info("Motion was still active at shutdown; closed the open episode");
        }

        let shutdown = self.dispatcher.shutdown(self.config.shutdown_grace);
        for outcome in &shutdown.outcomes {
            apply_outcome(&mut presence, &mut report, outcome);
        }
        report.alerts_abandoned = shutdown.abandoned;

        report.episodes = boundaries.entries();
        if let Err(e) = self.event_log.save(&report.episodes) {
            log::error!("{e}");
            if first_error.is_none() {
                first_error = Some(Box::new(e));
            }
        }

        self.logger.summary();
        log::info!("{report}");

        match first_error {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }

    fn is_cancelled(&self) -> bool {
        self.config.cancelled.load(Ordering::Relaxed)
    }

    /// Discards warm-up frames, then prepares the next frame as background.
    fn capture_background(&mut self) -> Result<Option<GrayFrame>, Box<dyn std::error::Error>> {
        if self.config.warmup_frames > 0 {
            self.logger.info(&format!(
                "Waiting for the camera to settle ({} frames)...",
                self.config.warmup_frames
            ));
        }
        for _ in 0..self.config.warmup_frames {
            if self.is_cancelled() || self.source.next_frame()?.is_none() {
                return Ok(None);
            }
        }
        if self.is_cancelled() {
            return Ok(None);
        }
        Ok(self
            .source
            .next_frame()?
            .map(|frame| self.gate.reference(&frame)))
    }

    fn process_frame(
        &mut self,
        background: &GrayFrame,
        frame: &Frame,
        presence: &mut PresenceMachine,
        boundaries: &mut EventBoundaryLogger,
        report: &mut SessionReport,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let t0 = Instant::now();
        let reading = self.gate.detect(background, frame)?;
        self.logger
            .timing("motion", t0.elapsed().as_secs_f64() * 1000.0);

        let person = if reading.status == MotionStatus::Motion {
            self.logger.metric("blobs", reading.boxes.len() as f64);
            report.detector_runs += 1;
            let t0 = Instant::now();
            let result = self.detector.infer(frame, self.config.confidence);
            self.logger
                .timing("detect", t0.elapsed().as_secs_f64() * 1000.0);
            match result {
                Ok(detections) => contains_person(&detections),
                Err(e) => {
                    log::warn!("Detection failed on frame {}: {e}", frame.index());
                    report.detector_failures += 1;
                    false
                }
            }
        } else {
            false
        };

        if let Some(job) = presence.tick(person, frame) {
            log::warn!(
                "Person confirmed at {}; dispatching alert {}",
                job.fired_at.wall.format("%Y-%m-%d %H:%M:%S"),
                job.id
            );
            report.alerts_fired += 1;
            self.dispatcher.submit(job);
        }

        match boundaries.record(reading.status, frame.timestamp().wall) {
            Some(MotionEdge::Rising) => log::info!("Motion started"),
            Some(MotionEdge::Falling) => {
                log::info!("Motion ended");
                presence.motion_ended();
            }
            None => {}
        }

        report.frames_processed += 1;
        self.logger.progress(report.frames_processed);
        Ok(())
    }
}

fn apply_outcome(
    presence: &mut PresenceMachine,
    report: &mut SessionReport,
    outcome: &DispatchOutcome,
) {
    match &outcome.result {
        Ok(()) => report.alerts_delivered += 1,
        Err(message) => {
            report.dispatch_failures += 1;
            if presence.apply_outcome(outcome) {
                log::warn!(
                    "Alert {} failed ({message}); presence will be re-confirmed",
                    outcome.job_id
                );
            } else {
                log::debug!("Ignoring failure of stale alert {}", outcome.job_id);
            }
        }
    }
}
