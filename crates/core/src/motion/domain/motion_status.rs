/// Whether the motion gate saw anything in a frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MotionStatus {
    #[default]
    None,
    Motion,
}

/// A change of motion status between two consecutive frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotionEdge {
    /// `[None, Motion]`: an episode starts.
    Rising,
    /// `[Motion, None]`: an episode ends.
    Falling,
}

/// Two-slot ring buffer holding `[previous, current]` motion status.
///
/// Starts as `[None, None]`, so motion on the very first processed frame
/// counts as a rising edge.
#[derive(Clone, Debug, Default)]
pub struct StatusWindow {
    slots: [MotionStatus; 2],
    head: usize,
}

impl StatusWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes the newest status, evicting the oldest, and reports the edge
    /// the window now shows, if any.
    pub fn push(&mut self, status: MotionStatus) -> Option<MotionEdge> {
        self.head = (self.head + 1) % 2;
        self.slots[self.head] = status;
        match (self.previous(), self.current()) {
            (MotionStatus::None, MotionStatus::Motion) => Some(MotionEdge::Rising),
            (MotionStatus::Motion, MotionStatus::None) => Some(MotionEdge::Falling),
            _ => None,
        }
    }

    pub fn current(&self) -> MotionStatus {
        self.slots[self.head]
    }

    pub fn previous(&self) -> MotionStatus {
        self.slots[(self.head + 1) % 2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    use super::MotionStatus::{Motion, None as Still};

    #[test]
    fn test_starts_still() {
        let window = StatusWindow::new();
        assert_eq!(window.previous(), Still);
        assert_eq!(window.current(), Still);
    }

    #[test]
    fn test_push_shifts_current_into_previous() {
        let mut window = StatusWindow::new();
        window.push(Motion);
        window.push(Still);
        assert_eq!(window.previous(), Motion);
        assert_eq!(window.current(), Still);
    }

    #[rstest]
    #[case::rising(&[Motion], Some(MotionEdge::Rising))]
    #[case::falling(&[Motion, Still], Some(MotionEdge::Falling))]
    #[case::sustained_motion(&[Motion, Motion], None)]
    #[case::sustained_still(&[Still, Still], None)]
    #[case::second_rising(&[Motion, Still, Motion], Some(MotionEdge::Rising))]
    fn test_edge_after_sequence(
        #[case] statuses: &[MotionStatus],
        #[case] expected: Option<MotionEdge>,
    ) {
        let mut window = StatusWindow::new();
        let mut last = None;
        for &s in statuses {
            last = window.push(s);
        }
        assert_eq!(last, expected);
    }
}
