/// Column width of the appointment text fields (title, description, location, type).
pub const MAX_APPOINTMENT_TEXT_LEN: usize = 50;

/// Column width of the customer name, address, postal code and phone fields.
pub const MAX_CUSTOMER_TEXT_LEN: usize = 100;

/// Selector step for minute values.
pub const MINUTE_GRANULARITY: u32 = 5;

/// Default look-ahead for the login-time "appointment soon" check.
pub const DEFAULT_LOOKAHEAD_MINUTES: i64 = 15;

/// Upper bound accepted for the look-ahead: one day.
pub const MAX_LOOKAHEAD_MINUTES: i64 = 24 * 60;
