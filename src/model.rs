use chrono::{Duration, LocalResult, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

pub type AppointmentId = i32;
pub type CustomerId = i32;
pub type UserId = i32;
pub type ContactId = i32;
pub type CountryId = i32;
pub type DivisionId = i32;

/// Zone every stored window is expressed in.
pub const STORAGE_ZONE: Tz = Tz::UTC;

/// Wall-clock interval `[start, end)`. Zone-less: the same pair means a
/// different absolute interval depending on who looks at it.
///
/// Unlike a span, a window does not enforce `start < end`; callers check
/// `duration()` and reject non-positive windows themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Reads the pair as wall time in `source` and returns the same instants
    /// as wall time in `target`. Works on full date-times, so a window may
    /// land on a different calendar day (or straddle two) after conversion.
    pub fn convert_to_zone(&self, source: Tz, target: Tz) -> TimeWindow {
        TimeWindow {
            start: convert_instant(self.start, source, target),
            end: convert_instant(self.end, source, target),
        }
    }

    pub fn contains_instant(&self, t: NaiveDateTime) -> bool {
        self.start <= t && t < self.end
    }
}

/// Pin a wall-clock value to an absolute instant in `zone`.
///
/// Fall-back ambiguity resolves to the earlier instant; a spring-forward gap
/// resolves to the first instant after the gap.
pub fn localize(zone: Tz, wall: NaiveDateTime) -> chrono::DateTime<Tz> {
    match zone.from_local_datetime(&wall) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            // Gaps are at most a few hours; walk forward until wall time exists again.
            let mut probe = wall;
            for _ in 0..(4 * 60) {
                probe += Duration::minutes(1);
                if let Some(dt) = zone.from_local_datetime(&probe).earliest() {
                    return dt;
                }
            }
            zone.from_utc_datetime(&wall)
        }
    }
}

pub fn convert_instant(wall: NaiveDateTime, source: Tz, target: Tz) -> NaiveDateTime {
    if source == target {
        return wall;
    }
    localize(source, wall).with_timezone(&target).naive_local()
}

// ── Appointments ─────────────────────────────────────────────────

/// A proposed or edited appointment, as entered by staff.
///
/// `customer_id` and `user_id` are kept as the raw text the caller typed;
/// parsing them is part of validation. `window` is wall time in the
/// submitting session's zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentDraft {
    /// Absent when creating.
    pub id: Option<AppointmentId>,
    pub title: String,
    pub description: String,
    pub location: String,
    pub kind: String,
    pub window: TimeWindow,
    pub customer_id: String,
    pub user_id: String,
    pub contact_id: ContactId,
}

/// Creation and modification audit columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStamp {
    pub created_at: NaiveDateTime,
    pub created_by: String,
    pub updated_at: NaiveDateTime,
    pub updated_by: String,
}

impl AuditStamp {
    pub fn created(session: &Session, at: NaiveDateTime) -> Self {
        Self {
            created_at: at,
            created_by: session.user_name.clone(),
            updated_at: at,
            updated_by: session.user_name.clone(),
        }
    }

    pub fn touched(&self, session: &Session, at: NaiveDateTime) -> Self {
        Self {
            created_at: self.created_at,
            created_by: self.created_by.clone(),
            updated_at: at,
            updated_by: session.user_name.clone(),
        }
    }
}

/// A committed appointment as the store holds it. `window` is in [`STORAGE_ZONE`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub title: String,
    pub description: String,
    pub location: String,
    pub kind: String,
    pub window: TimeWindow,
    pub customer_id: CustomerId,
    pub user_id: UserId,
    pub contact_id: ContactId,
    pub audit: AuditStamp,
}

impl Appointment {
    pub fn projection(&self) -> ExistingAppointment {
        ExistingAppointment {
            id: self.id,
            customer_id: self.customer_id,
            window: self.window,
        }
    }
}

/// Read projection of another booked appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingAppointment {
    pub id: AppointmentId,
    pub customer_id: CustomerId,
    pub window: TimeWindow,
}

impl ExistingAppointment {
    pub fn in_zone(&self, source: Tz, target: Tz) -> Self {
        Self {
            window: self.window.convert_to_zone(source, target),
            ..*self
        }
    }
}

/// One row of the login-time "appointment soon" report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AppointmentSummary {
    pub id: AppointmentId,
    pub customer_id: CustomerId,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl std::fmt::Display for AppointmentSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Appointment ID: {}, Start: {}, End: {}",
            self.id,
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%Y-%m-%d %H:%M")
        )
    }
}

// ── Reference data ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub id: CountryId,
    pub name: String,
}

/// First-level division (state, province). Belongs to a country by key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Division {
    pub id: DivisionId,
    pub name: String,
    pub country_id: CountryId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub address: String,
    pub postal_code: String,
    pub phone: String,
    pub division_id: DivisionId,
    pub audit: AuditStamp,
}

/// Customer form input. `division_id` is `None` when nothing was selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDraft {
    pub id: Option<CustomerId>,
    pub name: String,
    pub address: String,
    pub postal_code: String,
    pub phone: String,
    pub division_id: Option<DivisionId>,
}

// ── Session ──────────────────────────────────────────────────────

/// The authenticated staff member and the zone their wall-clock input is in.
/// Passed explicitly into every operation that writes audit columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_name: String,
    pub zone: Tz,
}

impl Session {
    pub fn new(user_name: impl Into<String>, zone: Tz) -> Self {
        Self {
            user_name: user_name.into(),
            zone,
        }
    }
}

/// One selectable time-of-day value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct HourChoice {
    pub hour: u32,
    pub minute: u32,
}

impl std::fmt::Display for HourChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}
