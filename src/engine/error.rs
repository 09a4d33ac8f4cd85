use crate::model::{AppointmentId, CustomerId};
use crate::store::StoreError;

/// Which text field a field violation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Description,
    Location,
    Type,
    Name,
    Address,
    PostalCode,
    Phone,
}

impl Field {
    fn noun(self) -> &'static str {
        match self {
            Field::Title => "a title",
            Field::Description => "a description",
            Field::Location => "a location",
            Field::Type => "a type",
            Field::Name => "a name",
            Field::Address => "an address",
            Field::PostalCode => "a postal code",
            Field::Phone => "a phone number",
        }
    }

    fn owner(self) -> &'static str {
        match self {
            Field::Title | Field::Description | Field::Location | Field::Type => "Appointment",
            Field::Name | Field::Address | Field::PostalCode | Field::Phone => "Customer",
        }
    }
}

/// A reference the caller typed or picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    Customer,
    User,
    Contact,
    Division,
}

impl Reference {
    fn label(self) -> &'static str {
        match self {
            Reference::Customer => "Customer",
            Reference::User => "User",
            Reference::Contact => "Contact",
            Reference::Division => "Division",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    Field,
    Reference,
    Ordering,
    Conflict,
    BusinessHours,
}

impl ViolationKind {
    pub fn label(self) -> &'static str {
        match self {
            ViolationKind::Field => "field",
            ViolationKind::Reference => "reference",
            ViolationKind::Ordering => "ordering",
            ViolationKind::Conflict => "conflict",
            ViolationKind::BusinessHours => "business_hours",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    Blank(Field),
    TooLong { field: Field, max: usize },
    NotAnInteger(Reference),
    UnknownReference(Reference),
    MissingSelection(Reference),
    EndNotAfterStart,
    Overlap(AppointmentId),
    OutsideBusinessHours,
}

impl Violation {
    pub fn kind(&self) -> ViolationKind {
        match self {
            Violation::Blank(_) | Violation::TooLong { .. } => ViolationKind::Field,
            Violation::NotAnInteger(_)
            | Violation::UnknownReference(_)
            | Violation::MissingSelection(_) => ViolationKind::Reference,
            Violation::EndNotAfterStart => ViolationKind::Ordering,
            Violation::Overlap(_) => ViolationKind::Conflict,
            Violation::OutsideBusinessHours => ViolationKind::BusinessHours,
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::Blank(field) => write!(f, "{} must have {}.", field.owner(), field.noun()),
            Violation::TooLong { field, max } => {
                write!(f, "{} must have {} of at most {max} characters.", field.owner(), field.noun())
            }
            Violation::NotAnInteger(r) => write!(f, "{} ID must be a valid integer.", r.label()),
            Violation::UnknownReference(r) => {
                let noun = r.label().to_lowercase();
                write!(f, "{} ID is not a valid {noun}.", r.label())
            }
            Violation::MissingSelection(Reference::Division) => {
                write!(f, "Please select a country and state or province.")
            }
            Violation::MissingSelection(r) => {
                write!(f, "Please select a {}.", r.label().to_lowercase())
            }
            Violation::EndNotAfterStart => {
                write!(f, "Appointment start must be before appointment end.")
            }
            Violation::Overlap(id) => write!(
                f,
                "Appointments for a customer cannot overlap. Overlapping appointment ID: {id}."
            ),
            Violation::OutsideBusinessHours => {
                write!(f, "Appointment must fall within business hours on a single day.")
            }
        }
    }
}

/// Ordered outcome of one validation pass. Empty means the draft may be committed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub violations: Vec<Violation>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(|v| v.to_string()).collect()
    }

    pub fn has(&self, violation: &Violation) -> bool {
        self.violations.contains(violation)
    }
}

impl std::fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.messages().join(" "))
    }
}

#[derive(Debug)]
pub enum EngineError {
    AppointmentNotFound(AppointmentId),
    CustomerNotFound(CustomerId),
    Rejected(ValidationResult),
    Store(StoreError),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::AppointmentNotFound(id) => write!(f, "appointment not found: {id}"),
            EngineError::CustomerNotFound(id) => write!(f, "customer not found: {id}"),
            EngineError::Rejected(result) => write!(f, "rejected: {result}"),
            EngineError::Store(e) => write!(f, "store error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        EngineError::Store(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_follow_form_wording() {
        assert_eq!(Violation::Blank(Field::Title).to_string(), "Appointment must have a title.");
        assert_eq!(
            Violation::Blank(Field::Phone).to_string(),
            "Customer must have a phone number."
        );
        assert_eq!(
            Violation::NotAnInteger(Reference::User).to_string(),
            "User ID must be a valid integer."
        );
        assert_eq!(
            Violation::UnknownReference(Reference::Customer).to_string(),
            "Customer ID is not a valid customer."
        );
        assert_eq!(
            Violation::Overlap(12).to_string(),
            "Appointments for a customer cannot overlap. Overlapping appointment ID: 12."
        );
        assert_eq!(
            Violation::MissingSelection(Reference::Division).to_string(),
            "Please select a country and state or province."
        );
    }

    #[test]
    fn kinds() {
        assert_eq!(Violation::Blank(Field::Type).kind(), ViolationKind::Field);
        assert_eq!(Violation::NotAnInteger(Reference::Customer).kind(), ViolationKind::Reference);
        assert_eq!(Violation::EndNotAfterStart.kind(), ViolationKind::Ordering);
        assert_eq!(Violation::Overlap(1).kind(), ViolationKind::Conflict);
        assert_eq!(Violation::OutsideBusinessHours.kind(), ViolationKind::BusinessHours);
    }

    #[test]
    fn result_display_joins_messages() {
        let mut r = ValidationResult::default();
        assert!(r.is_valid());
        r.push(Violation::Blank(Field::Title));
        r.push(Violation::EndNotAfterStart);
        assert!(!r.is_valid());
        assert_eq!(
            r.to_string(),
            "Appointment must have a title. Appointment start must be before appointment end."
        );
    }
}
