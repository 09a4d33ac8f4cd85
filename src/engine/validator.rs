use chrono::Duration;
use chrono_tz::Tz;

use crate::limits::*;
use crate::model::*;
use crate::store::{SchedulingStore, StoreError};

use super::business_hours::BusinessHoursPolicy;
use super::conflict::find_conflict;
use super::error::{Field, Reference, ValidationResult, Violation};

/// Checks a draft appointment against the form rules, the store's reference
/// data, business hours and the customer's existing schedule.
///
/// Every independent check runs; only checks that need a parsed or existing
/// reference are skipped when that reference is bad. Never writes.
pub struct AppointmentValidator<'a> {
    store: &'a dyn SchedulingStore,
    policy: &'a BusinessHoursPolicy,
    enforce_business_hours: bool,
}

impl<'a> AppointmentValidator<'a> {
    pub fn new(
        store: &'a dyn SchedulingStore,
        policy: &'a BusinessHoursPolicy,
        enforce_business_hours: bool,
    ) -> Self {
        Self {
            store,
            policy,
            enforce_business_hours,
        }
    }

    /// `zone` is the zone the draft's wall-clock window was entered in.
    pub async fn validate(
        &self,
        draft: &AppointmentDraft,
        zone: Tz,
    ) -> Result<ValidationResult, StoreError> {
        let mut result = ValidationResult::default();

        check_text(&mut result, Field::Title, &draft.title, MAX_APPOINTMENT_TEXT_LEN);
        check_text(&mut result, Field::Description, &draft.description, MAX_APPOINTMENT_TEXT_LEN);
        check_text(&mut result, Field::Location, &draft.location, MAX_APPOINTMENT_TEXT_LEN);
        check_text(&mut result, Field::Type, &draft.kind, MAX_APPOINTMENT_TEXT_LEN);

        let customer_id = parse_reference(&mut result, Reference::Customer, &draft.customer_id);
        let user_id = parse_reference(&mut result, Reference::User, &draft.user_id);

        let customer_id = match customer_id {
            Some(id) => self.store.customer_exists(id).await?.then_some(id),
            None => None,
        };

        let ordered = draft.window.duration() > Duration::zero();
        if !ordered {
            result.push(Violation::EndNotAfterStart);
        }

        match customer_id {
            Some(id) => {
                let booked = self.store.appointments_for_customer(id).await?;
                let candidate = draft.window.convert_to_zone(zone, STORAGE_ZONE);
                if let Some(other) = find_conflict(&candidate, &booked, draft.id) {
                    result.push(Violation::Overlap(other));
                }
            }
            None => result.push(Violation::UnknownReference(Reference::Customer)),
        }

        let user_valid = match user_id {
            Some(id) => self.store.user_exists(id).await?,
            None => false,
        };
        if !user_valid {
            result.push(Violation::UnknownReference(Reference::User));
        }

        if !self.store.contact_exists(draft.contact_id).await? {
            result.push(Violation::UnknownReference(Reference::Contact));
        }

        if self.enforce_business_hours && ordered && !self.policy.contains(&draft.window, zone) {
            result.push(Violation::OutsideBusinessHours);
        }

        tracing::debug!(
            appointment = ?draft.id,
            violations = result.violations.len(),
            "validated appointment draft"
        );
        Ok(result)
    }
}

/// Form rules for adding or editing a customer.
pub async fn validate_customer(
    store: &dyn SchedulingStore,
    draft: &CustomerDraft,
) -> Result<ValidationResult, StoreError> {
    let mut result = ValidationResult::default();

    check_text(&mut result, Field::Name, &draft.name, MAX_CUSTOMER_TEXT_LEN);
    check_text(&mut result, Field::Phone, &draft.phone, MAX_CUSTOMER_TEXT_LEN);
    check_text(&mut result, Field::Address, &draft.address, MAX_CUSTOMER_TEXT_LEN);
    check_text(&mut result, Field::PostalCode, &draft.postal_code, MAX_CUSTOMER_TEXT_LEN);

    match draft.division_id {
        None => result.push(Violation::MissingSelection(Reference::Division)),
        Some(id) => {
            if !store.division_exists(id).await? {
                result.push(Violation::UnknownReference(Reference::Division));
            }
        }
    }

    Ok(result)
}

fn check_text(result: &mut ValidationResult, field: Field, value: &str, max: usize) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        result.push(Violation::Blank(field));
    } else if trimmed.chars().count() > max {
        result.push(Violation::TooLong { field, max });
    }
}

/// Reference ids are typed as text; surrounding whitespace is ignored.
pub(super) fn parse_id(text: &str) -> Option<i32> {
    text.trim().parse().ok()
}

fn parse_reference(result: &mut ValidationResult, reference: Reference, text: &str) -> Option<i32> {
    let id = parse_id(text);
    if id.is_none() {
        result.push(Violation::NotAnInteger(reference));
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_after_trim_is_blank() {
        let mut r = ValidationResult::default();
        check_text(&mut r, Field::Title, "   \t", MAX_APPOINTMENT_TEXT_LEN);
        assert_eq!(r.violations, vec![Violation::Blank(Field::Title)]);
    }

    #[test]
    fn over_long_text_is_rejected() {
        let mut r = ValidationResult::default();
        let long = "x".repeat(MAX_APPOINTMENT_TEXT_LEN + 1);
        check_text(&mut r, Field::Location, &long, MAX_APPOINTMENT_TEXT_LEN);
        assert_eq!(
            r.violations,
            vec![Violation::TooLong {
                field: Field::Location,
                max: MAX_APPOINTMENT_TEXT_LEN
            }]
        );
    }

    #[test]
    fn reference_parsing() {
        let mut r = ValidationResult::default();
        assert_eq!(parse_reference(&mut r, Reference::Customer, " 42 "), Some(42));
        assert_eq!(parse_reference(&mut r, Reference::User, "4x2"), None);
        assert_eq!(parse_reference(&mut r, Reference::User, ""), None);
        assert_eq!(r.violations.len(), 2);
        assert!(r.has(&Violation::NotAnInteger(Reference::User)));
    }
}
