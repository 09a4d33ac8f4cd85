use chrono::{Duration, NaiveDateTime};

use crate::model::*;

/// Appointments in progress at `now` or starting within `lookahead` of it.
///
/// The upper bound is padded by one second so a start of exactly
/// `now + lookahead` still counts; a horizon past the calendar's end
/// saturates. All windows and `now` must be wall time in the same zone.
pub fn due_soon(
    now: NaiveDateTime,
    appointments: &[ExistingAppointment],
    lookahead: Duration,
) -> Vec<AppointmentSummary> {
    let horizon = now
        .checked_add_signed(lookahead)
        .and_then(|t| t.checked_add_signed(Duration::seconds(1)))
        .unwrap_or(NaiveDateTime::MAX);
    appointments
        .iter()
        .filter(|a| {
            let in_progress = a.window.contains_instant(now);
            let starting = a.window.start >= now && a.window.start < horizon;
            in_progress || starting
        })
        .map(|a| AppointmentSummary {
            id: a.id,
            customer_id: a.customer_id,
            start: a.window.start,
            end: a.window.end,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn t(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn appt(id: AppointmentId, start: NaiveDateTime, end: NaiveDateTime) -> ExistingAppointment {
        ExistingAppointment {
            id,
            customer_id: 1,
            window: TimeWindow::new(start, end),
        }
    }

    const LOOKAHEAD: i64 = 15;

    fn ids(found: &[AppointmentSummary]) -> Vec<AppointmentId> {
        found.iter().map(|s| s.id).collect()
    }

    #[test]
    fn starting_now_is_included() {
        let all = vec![appt(1, t(10, 0, 0), t(10, 30, 0))];
        let found = due_soon(t(10, 0, 0), &all, Duration::minutes(LOOKAHEAD));
        assert_eq!(ids(&found), vec![1]);
    }

    #[test]
    fn in_progress_is_included() {
        let all = vec![appt(1, t(9, 30, 0), t(10, 30, 0))];
        let found = due_soon(t(10, 0, 0), &all, Duration::minutes(LOOKAHEAD));
        assert_eq!(ids(&found), vec![1]);
    }

    #[test]
    fn ending_now_is_excluded() {
        let all = vec![appt(1, t(9, 0, 0), t(10, 0, 0))];
        assert!(due_soon(t(10, 0, 0), &all, Duration::minutes(LOOKAHEAD)).is_empty());
    }

    #[test]
    fn start_exactly_at_lookahead_is_included() {
        let all = vec![appt(1, t(10, 15, 0), t(10, 45, 0))];
        let found = due_soon(t(10, 0, 0), &all, Duration::minutes(LOOKAHEAD));
        assert_eq!(ids(&found), vec![1]);
    }

    #[test]
    fn one_second_past_lookahead_is_excluded() {
        let all = vec![appt(1, t(10, 15, 1), t(10, 45, 0))];
        assert!(due_soon(t(10, 0, 0), &all, Duration::minutes(LOOKAHEAD)).is_empty());
    }

    #[test]
    fn keeps_input_order_and_skips_far_future() {
        let all = vec![
            appt(3, t(10, 10, 0), t(10, 20, 0)),
            appt(1, t(13, 0, 0), t(14, 0, 0)),
            appt(2, t(9, 0, 0), t(11, 0, 0)),
        ];
        let found = due_soon(t(10, 0, 0), &all, Duration::minutes(LOOKAHEAD));
        assert_eq!(ids(&found), vec![3, 2]);
        assert_eq!(found[0].start, t(10, 10, 0));
    }

    #[test]
    fn horizon_past_calendar_end_saturates() {
        let all = vec![
            appt(1, t(9, 0, 0), t(9, 30, 0)),
            appt(2, t(23, 0, 0), t(23, 30, 0)),
        ];
        let found = due_soon(t(10, 0, 0), &all, Duration::MAX);
        assert_eq!(ids(&found), vec![2]);
    }

    #[test]
    fn nothing_due_is_empty_not_error() {
        assert!(due_soon(t(10, 0, 0), &[], Duration::minutes(LOOKAHEAD)).is_empty());
    }
}
