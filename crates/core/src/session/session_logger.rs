use std::collections::HashMap;
use std::time::Instant;

/// Cross-cutting logger for monitoring-loop events.
///
/// Keeps the session loop independent of where its diagnostics end up.
pub trait SessionLogger: Send {
    /// Report that `frames` frames have been processed so far.
    fn progress(&mut self, frames: usize);

    /// Record how long a named stage took for one frame.
    fn timing(&mut self, stage: &'static str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. motion blob count).
    fn metric(&mut self, name: &'static str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-session summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullSessionLogger;

impl SessionLogger for NullSessionLogger {
    fn progress(&mut self, _frames: usize) {}
    fn timing(&mut self, _stage: &'static str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &'static str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Running count, sum and maximum of a stream of samples.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aggregate {
    pub count: usize,
    pub sum: f64,
    pub max: f64,
}

impl Aggregate {
    fn record(&mut self, value: f64) {
        if self.count == 0 || value > self.max {
            self.max = value;
        }
        self.count += 1;
        self.sum += value;
    }

    pub fn mean(&self) -> f64 {
        self.sum / self.count.max(1) as f64
    }
}

/// `log`-backed logger that aggregates per-stage timings and metrics and
/// reports them when the session ends.
///
/// Only running aggregates are kept, so memory stays flat however long the
/// camera runs. Progress output is throttled to every `throttle_frames` frames.
pub struct LogSessionLogger {
    throttle_frames: usize,
    timings: HashMap<&'static str, Aggregate>,
    metrics: HashMap<&'static str, Aggregate>,
    start_time: Instant,
    frames: usize,
}

impl LogSessionLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            frames: 0,
        }
    }

    /// Returns the formatted summary string, or `None` if no data recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let frames = self.frames;
        let mut lines = vec![format!(
            "Stage timings ({frames} frames, {:.1}s total):",
            elapsed_ms / 1000.0
        )];

        let mut stages: Vec<_> = self.timings.iter().collect();
        stages.sort_by_key(|(stage, _)| **stage);
        for (stage, agg) in stages {
            lines.push(format!(
                "  {stage:8}: avg {:6.1}ms  max {:6.1}ms  calls {:6}  total {:7.0}ms",
                agg.mean(),
                agg.max,
                agg.count,
                agg.sum
            ));
        }

        let mut names: Vec<_> = self.metrics.iter().collect();
        names.sort_by_key(|(name, _)| **name);
        for (name, agg) in names {
            lines.push(format!("  {name}: avg {:.1}  max {:.0}", agg.mean(), agg.max));
        }

        if frames > 0 && elapsed_ms > 0.0 {
            let fps = frames as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<Aggregate> {
        self.timings.get(stage).copied()
    }

    pub fn metrics_for(&self, name: &str) -> Option<Aggregate> {
        self.metrics.get(name).copied()
    }
}

impl Default for LogSessionLogger {
    fn default() -> Self {
        Self::new(300)
    }
}

impl SessionLogger for LogSessionLogger {
    fn progress(&mut self, frames: usize) {
        self.frames = frames;
        if frames % self.throttle_frames == 0 {
            log::debug!("Processed {frames} frames");
        }
    }

    fn timing(&mut self, stage: &'static str, duration_ms: f64) {
        self.timings.entry(stage).or_default().record(duration_ms);
    }

    fn metric(&mut self, name: &'static str, value: f64) {
        self.metrics.entry(name).or_default().record(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
