//! Time windows with closed-interval overlap semantics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("window start {start} is after end {end}")]
pub struct WindowError {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// A start/end interval during which a hero is committed to an expedition.
///
/// # Invariants
/// - `start <= end` (enforced by [`TimeWindow::new`])
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// # Errors
    /// Returns `WindowError` if `start > end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, WindowError> {
        if start > end {
            return Err(WindowError { start, end });
        }
        Ok(Self { start, end })
    }

    /// Closed-interval conflict check for an existing reservation window
    /// (`self`) against a query window.
    ///
    /// A reservation conflicts iff it straddles the query start, or its
    /// whole extent sits at or before the query end while starting at or
    /// after it, or it lies entirely inside the query window. Endpoints
    /// count: a reservation ending exactly at the query start conflicts.
    /// Note the predicate is not symmetric in its arguments; the sqlite
    /// store's overlap query encodes the same three clauses, keep them in
    /// sync.
    pub fn conflicts_with(&self, query: &TimeWindow) -> bool {
        (self.start <= query.start && self.end >= query.start)
            || (self.end <= query.end && self.start >= query.end)
            || (self.start >= query.start && self.end <= query.end)
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} .. {}]", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn window(start_h: u32, end_h: u32) -> TimeWindow {
        TimeWindow::new(
            Utc.with_ymd_and_hms(2025, 3, 20, start_h, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 20, end_h, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn rejects_inverted_window() {
        let w = window(5, 6);
        assert!(TimeWindow::new(w.end, w.start).is_err());
    }

    #[test]
    fn identical_windows_conflict() {
        assert!(window(2, 6).conflicts_with(&window(2, 6)));
    }

    #[test]
    fn reservation_ending_at_query_start_conflicts() {
        assert!(window(1, 3).conflicts_with(&window(3, 5)));
    }

    #[test]
    fn reservation_straddling_query_start_conflicts() {
        assert!(window(1, 4).conflicts_with(&window(3, 5)));
    }

    #[test]
    fn contained_reservation_conflicts() {
        assert!(window(3, 4).conflicts_with(&window(1, 8)));
        assert!(window(1, 8).conflicts_with(&window(3, 4)));
    }

    #[test]
    fn disjoint_reservation_is_free() {
        assert!(!window(1, 2).conflicts_with(&window(3, 5)));
        assert!(!window(6, 9).conflicts_with(&window(3, 5)));
    }
}
