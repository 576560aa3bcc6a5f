use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// One completed motion episode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLogEntry {
    #[serde(rename = "Start")]
    pub start: DateTime<Local>,
    #[serde(rename = "End")]
    pub end: DateTime<Local>,
}

impl EventLogEntry {
    pub fn duration(&self) -> chrono::Duration {
        self.end - self.start
    }
}

/// Pairs an alternating `start, end, start, end, ...` sequence into entries.
///
/// A trailing unpaired start is dropped. Pure: calling it twice on the same
/// input yields the same entries.
pub fn pair_timestamps(timestamps: &[DateTime<Local>]) -> Vec<EventLogEntry> {
    timestamps
        .chunks_exact(2)
        .map(|pair| EventLogEntry {
            start: pair[0],
            end: pair[1],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Local> {
        Local.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_pairs_in_order() {
        let entries = pair_timestamps(&[at(0), at(5), at(9), at(12)]);
        assert_eq!(
            entries,
            vec![
                EventLogEntry { start: at(0), end: at(5) },
                EventLogEntry { start: at(9), end: at(12) },
            ]
        );
    }

    #[test]
    fn test_trailing_start_is_dropped() {
        let entries = pair_timestamps(&[at(0), at(5), at(9)]);
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_empty_and_single() {
        assert!(pair_timestamps(&[]).is_empty());
        assert!(pair_timestamps(&[at(3)]).is_empty());
    }

    #[test]
    fn test_pairing_is_idempotent() {
        let ts = [at(0), at(2), at(4), at(8), at(11)];
        assert_eq!(pair_timestamps(&ts), pair_timestamps(&ts));
    }

    #[test]
    fn test_duration() {
        let entry = EventLogEntry { start: at(10), end: at(25) };
        assert_eq!(entry.duration().num_seconds(), 15);
    }
}
