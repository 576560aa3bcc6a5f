use chrono::{DateTime, Local};

use crate::motion::domain::motion_status::{MotionEdge, MotionStatus, StatusWindow};

use super::event_log::{pair_timestamps, EventLogEntry};

/// Turns the per-frame motion status into start/end timestamps.
///
/// Timestamps are recorded only on edges of the two-slot window and never
/// go backwards, so every paired entry has `start <= end`.
#[derive(Debug, Default)]
pub struct EventBoundaryLogger {
    window: StatusWindow,
    timestamps: Vec<DateTime<Local>>,
}

impl EventBoundaryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one frame's status, appending a timestamp on an edge.
    pub fn record(&mut self, status: MotionStatus, at: DateTime<Local>) -> Option<MotionEdge> {
        let edge = self.window.push(status)?;
        self.push_timestamp(at);
        Some(edge)
    }

    /// Whether a start has been recorded without its end.
    pub fn is_open(&self) -> bool {
        self.timestamps.len() % 2 == 1
    }

    /// Closes an open episode at `at`. Returns whether one was open.
    pub fn close_open(&mut self, at: DateTime<Local>) -> bool {
        if !self.is_open() {
            return false;
        }
        self.push_timestamp(at);
        self.window.push(MotionStatus::None);
        true
    }

    pub fn timestamps(&self) -> &[DateTime<Local>] {
        &self.timestamps
    }

    pub fn entries(&self) -> Vec<EventLogEntry> {
        pair_timestamps(&self.timestamps)
    }

    fn push_timestamp(&mut self, at: DateTime<Local>) {
        let at = match self.timestamps.last() {
            Some(&last) if at < last => last,
            _ => at,
        };
        self.timestamps.push(at);
    }
}
