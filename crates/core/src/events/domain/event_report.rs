use super::event_log::EventLogEntry;

/// One row of the episode table.
#[derive(Clone, Debug, PartialEq)]
pub struct EventRow {
    pub index: usize,
    pub entry: EventLogEntry,
    pub duration_secs: f64,
}

/// Read-only summary of a stored event log.
#[derive(Clone, Debug, PartialEq)]
pub struct EventReport {
    pub rows: Vec<EventRow>,
    pub total_secs: f64,
    pub longest_secs: f64,
}

impl EventReport {
    pub fn from_entries(entries: &[EventLogEntry]) -> Self {
        let rows: Vec<EventRow> = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| EventRow {
                index,
                entry: *entry,
                duration_secs: entry.duration().num_milliseconds() as f64 / 1000.0,
            })
            .collect();
        let total_secs = rows.iter().map(|r| r.duration_secs).sum();
        let longest_secs = rows.iter().map(|r| r.duration_secs).fold(0.0, f64::max);
        Self {
            rows,
            total_secs,
            longest_secs,
        }
    }

    pub fn mean_secs(&self) -> f64 {
        if self.rows.is_empty() {
            0.0
        } else {
            self.total_secs / self.rows.len() as f64
        }
    }

    /// Plain-text table: one line per episode, then totals.
    pub fn render_table(&self) -> String {
        let mut lines = vec![format!("Found {} motion event(s).", self.rows.len())];
        if self.rows.is_empty() {
            return lines.join("\n");
        }

        lines.push(format!(
            "{:>4}  {:19}  {:19}  {:>10}",
            "#", "Start", "End", "Duration"
        ));
        for row in &self.rows {
            lines.push(format!(
                "{:>4}  {}  {}  {:>9.1}s",
                row.index,
                row.entry.start.format("%Y-%m-%d %H:%M:%S"),
                row.entry.end.format("%Y-%m-%d %H:%M:%S"),
                row.duration_secs
            ));
        }
        lines.push(format!(
            "Total {:.1}s, mean {:.1}s, longest {:.1}s",
            self.total_secs,
            self.mean_secs(),
            self.longest_secs
        ));
        lines.join("\n")
    }
}
