use std::path::PathBuf;

use thiserror::Error;

use super::event_log::EventLogEntry;

#[derive(Error, Debug)]
pub enum EventLogError {
    #[error("failed to open event log {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed event log {path}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("event log {path} has an entry ending before it starts (row {row})")]
    Inverted { path: PathBuf, row: usize },
}

/// Durable storage for completed episodes.
pub trait EventLogStore {
    /// Writes all entries. Writing an empty list leaves storage untouched.
    fn save(&self, entries: &[EventLogEntry]) -> Result<(), EventLogError>;

    fn load(&self) -> Result<Vec<EventLogEntry>, EventLogError>;
}
