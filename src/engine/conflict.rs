use crate::model::*;

// ── Interval relationships ────────────────────────────────────────
//
// Each test compares a candidate `[cs, ce)` against a booked `[s, e)`:
// starts_within is `s <= cs < e`, ends_within is `s < ce <= e`, contains is
// `cs < s && ce > e`. Back-to-back windows never match any of them.

pub fn starts_within(candidate: &TimeWindow, booked: &TimeWindow) -> bool {
    candidate.start >= booked.start && candidate.start < booked.end
}

pub fn ends_within(candidate: &TimeWindow, booked: &TimeWindow) -> bool {
    candidate.end > booked.start && candidate.end <= booked.end
}

pub fn contains(candidate: &TimeWindow, booked: &TimeWindow) -> bool {
    candidate.start < booked.start && candidate.end > booked.end
}

pub fn conflicts(candidate: &TimeWindow, booked: &TimeWindow) -> bool {
    starts_within(candidate, booked) || ends_within(candidate, booked) || contains(candidate, booked)
}

/// Scan one customer's bookings for the first that overlaps `candidate`.
///
/// `exclude` skips the appointment being edited so it never conflicts with
/// itself. Ties go to input order.
pub fn find_conflict(
    candidate: &TimeWindow,
    existing: &[ExistingAppointment],
    exclude: Option<AppointmentId>,
) -> Option<AppointmentId> {
    existing
        .iter()
        .filter(|a| Some(a.id) != exclude)
        .find(|a| conflicts(candidate, &a.window))
        .map(|a| a.id)
}
