use chrono::{Duration, NaiveDate, NaiveTime, Timelike};
use chrono_tz::Tz;

use crate::limits::MINUTE_GRANULARITY;
use crate::model::*;

/// The organisation's operating window, defined once in a reference zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessHoursPolicy {
    pub reference_zone: Tz,
    pub daily_start: NaiveTime,
    pub daily_end: NaiveTime,
}

impl BusinessHoursPolicy {
    pub fn new(reference_zone: Tz, daily_start: NaiveTime, daily_end: NaiveTime) -> Self {
        Self {
            reference_zone,
            daily_start,
            daily_end,
        }
    }

    /// Operating window on `date`, as wall time in the reference zone.
    pub fn window_on(&self, date: NaiveDate) -> TimeWindow {
        TimeWindow::new(date.and_time(self.daily_start), date.and_time(self.daily_end))
    }

    /// Selectable times for a caller in `zone`, using today's date in the
    /// reference zone.
    pub fn available_hours(&self, zone: Tz) -> Vec<HourChoice> {
        let today = chrono::Utc::now()
            .with_timezone(&self.reference_zone)
            .date_naive();
        self.available_hours_on(zone, today)
    }

    /// Selectable times for a caller in `zone` on the reference-zone `date`.
    ///
    /// The daily window is converted as full date-times first and only then
    /// cut into time-of-day values, in 5-minute steps from start to end
    /// inclusive. Order is chronological, so a window that crosses midnight
    /// in `zone` lists evening values before morning ones.
    pub fn available_hours_on(&self, zone: Tz, date: NaiveDate) -> Vec<HourChoice> {
        let local = self.window_on(date).convert_to_zone(self.reference_zone, zone);
        let step = Duration::minutes(MINUTE_GRANULARITY as i64);

        let mut choices = Vec::new();
        let mut cursor = local.start;
        while cursor <= local.end {
            choices.push(HourChoice {
                hour: cursor.hour(),
                minute: cursor.minute(),
            });
            cursor += step;
        }
        choices
    }

    /// Whether `window` (wall time in `zone`) sits entirely inside one
    /// business day.
    pub fn contains(&self, window: &TimeWindow, zone: Tz) -> bool {
        let reference = window.convert_to_zone(zone, self.reference_zone);
        if reference.start.date() != reference.end.date() {
            return false;
        }
        let allowed = self.window_on(reference.start.date());
        reference.start >= allowed.start && reference.end <= allowed.end
    }
}
