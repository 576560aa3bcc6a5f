use std::fs::File;
use std::path::{Path, PathBuf};

use crate::events::domain::event_log::EventLogEntry;
use crate::events::domain::event_log_store::{EventLogError, EventLogStore};

/// Event log stored as a `Start,End` CSV with RFC 3339 timestamps.
pub struct CsvEventLog {
    path: PathBuf,
}

impl CsvEventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn format_err(&self, source: csv::Error) -> EventLogError {
        EventLogError::Format {
            path: self.path.clone(),
            source,
        }
    }
}

impl EventLogStore for CsvEventLog {
    fn save(&self, entries: &[EventLogEntry]) -> Result<(), EventLogError> {
        if entries.is_empty() {
            log::info!("No motion episodes recorded; {} left untouched", self.path.display());
            return Ok(());
        }

        let file = File::create(&self.path).map_err(|source| EventLogError::Open {
            path: self.path.clone(),
            source,
        })?;
        let mut writer = csv::Writer::from_writer(file);
        for entry in entries {
            writer.serialize(entry).map_err(|e| self.format_err(e))?;
        }
        writer
            .flush()
            .map_err(|e| self.format_err(csv::Error::from(e)))?;

        log::info!(
            "Wrote {} motion episode(s) to {}",
            entries.len(),
            self.path.display()
        );
        Ok(())
    }

    fn load(&self) -> Result<Vec<EventLogEntry>, EventLogError> {
        let file = File::open(&self.path).map_err(|source| EventLogError::Open {
            path: self.path.clone(),
            source,
        })?;
        let mut reader = csv::Reader::from_reader(file);
        let mut entries = Vec::new();
        for (i, record) in reader.deserialize::<EventLogEntry>().enumerate() {
            let entry = record.map_err(|e| self.format_err(e))?;
            if entry.end < entry.start {
                return Err(EventLogError::Inverted {
                    path: self.path.clone(),
                    row: i + 1,
                });
            }
            entries.push(entry);
        }
        Ok(entries)
    }
}
