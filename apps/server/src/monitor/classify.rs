use crate::models::VisitStatus;

/// Minutes before the expected end of a visit at which it counts as
/// approaching overstay. Fixed; the `overstay_warning_time` setting does not
/// move it.
pub const APPROACHING_WINDOW_MINUTES: i32 = 30;

/// Where an open visit stands relative to its expected duration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitClass {
    /// Elapsed time is strictly past the expected duration
    Overstay,
    /// Inside and within the lookahead window before the expected end
    Approaching { remaining_minutes: i64 },
    /// Nothing to do
    Clear,
}

/// Classifies a visit from its status and whole elapsed minutes.
///
/// A visit at exactly its expected duration is neither approaching nor
/// overstayed. Visits already marked overstayed are never downgraded to
/// approaching, and closed visits are always clear.
pub fn classify(status: VisitStatus, elapsed_minutes: i64, expected_duration: i32) -> VisitClass {
    if !status.is_open() {
        return VisitClass::Clear;
    }

    let expected = i64::from(expected_duration);
    if elapsed_minutes > expected {
        return VisitClass::Overstay;
    }

    let window_start = expected - i64::from(APPROACHING_WINDOW_MINUTES);
    if status == VisitStatus::Inside && elapsed_minutes >= window_start && elapsed_minutes < expected
    {
        return VisitClass::Approaching {
            remaining_minutes: expected - elapsed_minutes,
        };
    }

    VisitClass::Clear
}
