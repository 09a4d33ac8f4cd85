use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;

use crate::model::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store could not be reached or refused the operation.
    Unavailable(String),
    NotFound { entity: &'static str, id: i32 },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(f, "store unavailable: {msg}"),
            StoreError::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Data-access collaborator. Appointment windows crossing this boundary are
/// always wall time in [`STORAGE_ZONE`].
#[async_trait]
pub trait SchedulingStore: Send + Sync {
    async fn customer_exists(&self, id: CustomerId) -> Result<bool, StoreError>;
    async fn user_exists(&self, id: UserId) -> Result<bool, StoreError>;
    async fn contact_exists(&self, id: ContactId) -> Result<bool, StoreError>;
    async fn division_exists(&self, id: DivisionId) -> Result<bool, StoreError>;

    async fn appointments_for_customer(
        &self,
        id: CustomerId,
    ) -> Result<Vec<ExistingAppointment>, StoreError>;
    async fn all_appointments(&self) -> Result<Vec<ExistingAppointment>, StoreError>;

    async fn find_appointment(&self, id: AppointmentId) -> Result<Option<Appointment>, StoreError>;
    /// Persist a new appointment. The store assigns the id; `appointment.id` is ignored.
    async fn insert_appointment(&self, appointment: Appointment) -> Result<AppointmentId, StoreError>;
    async fn update_appointment(&self, appointment: Appointment) -> Result<(), StoreError>;
    async fn delete_appointment(&self, id: AppointmentId) -> Result<Appointment, StoreError>;

    async fn find_customer(&self, id: CustomerId) -> Result<Option<Customer>, StoreError>;
    /// Persist a new customer. The store assigns the id; `customer.id` is ignored.
    async fn insert_customer(&self, customer: Customer) -> Result<CustomerId, StoreError>;
    async fn update_customer(&self, customer: Customer) -> Result<(), StoreError>;
    /// Remove a customer together with all of its appointments. Returns the
    /// ids of the appointments removed.
    async fn delete_customer(&self, id: CustomerId) -> Result<Vec<AppointmentId>, StoreError>;
}

/// Seed data for an [`InMemoryStore`], as loaded from JSON.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub countries: Vec<Country>,
    pub divisions: Vec<Division>,
    pub contacts: Vec<Contact>,
    pub users: Vec<User>,
    pub customers: Vec<Customer>,
    pub appointments: Vec<Appointment>,
}

pub struct InMemoryStore {
    countries: DashMap<CountryId, Country>,
    divisions: DashMap<DivisionId, Division>,
    contacts: DashMap<ContactId, Contact>,
    users: DashMap<UserId, User>,
    customers: DashMap<CustomerId, Customer>,
    appointments: DashMap<AppointmentId, Appointment>,
    /// Highest id issued or seeded so far.
    last_customer_id: AtomicI32,
    last_appointment_id: AtomicI32,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            countries: DashMap::new(),
            divisions: DashMap::new(),
            contacts: DashMap::new(),
            users: DashMap::new(),
            customers: DashMap::new(),
            appointments: DashMap::new(),
            last_customer_id: AtomicI32::new(0),
            last_appointment_id: AtomicI32::new(0),
        }
    }

    /// Build a store from seed data, keeping the ids it carries. Sequences
    /// continue after the highest seeded id.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let store = Self::new();
        for c in snapshot.countries {
            store.insert_country(c);
        }
        for d in snapshot.divisions {
            store.insert_division(d);
        }
        for c in snapshot.contacts {
            store.insert_contact(c);
        }
        for u in snapshot.users {
            store.insert_user(u);
        }
        for c in snapshot.customers {
            store.last_customer_id.fetch_max(c.id, Ordering::SeqCst);
            store.customers.insert(c.id, c);
        }
        for a in snapshot.appointments {
            store.last_appointment_id.fetch_max(a.id, Ordering::SeqCst);
            store.appointments.insert(a.id, a);
        }
        store
    }

    // ── Reference data ───────────────────────────────────────

    pub fn insert_country(&self, country: Country) {
        self.countries.insert(country.id, country);
    }

    pub fn insert_division(&self, division: Division) {
        self.divisions.insert(division.id, division);
    }

    pub fn insert_contact(&self, contact: Contact) {
        self.contacts.insert(contact.id, contact);
    }

    pub fn insert_user(&self, user: User) {
        self.users.insert(user.id, user);
    }

    pub fn appointment_count(&self) -> usize {
        self.appointments.len()
    }

    pub fn customer_count(&self) -> usize {
        self.customers.len()
    }
}

#[async_trait]
impl SchedulingStore for InMemoryStore {
    async fn customer_exists(&self, id: CustomerId) -> Result<bool, StoreError> {
        Ok(self.customers.contains_key(&id))
    }

    async fn user_exists(&self, id: UserId) -> Result<bool, StoreError> {
        Ok(self.users.contains_key(&id))
    }

    async fn contact_exists(&self, id: ContactId) -> Result<bool, StoreError> {
        Ok(self.contacts.contains_key(&id))
    }

    async fn division_exists(&self, id: DivisionId) -> Result<bool, StoreError> {
        Ok(self.divisions.contains_key(&id))
    }

    async fn appointments_for_customer(
        &self,
        id: CustomerId,
    ) -> Result<Vec<ExistingAppointment>, StoreError> {
        let mut out: Vec<ExistingAppointment> = self
            .appointments
            .iter()
            .filter(|e| e.customer_id == id)
            .map(|e| e.projection())
            .collect();
        // DashMap iteration order is arbitrary; keep reports stable.
        out.sort_by_key(|a| a.id);
        Ok(out)
    }

    async fn all_appointments(&self) -> Result<Vec<ExistingAppointment>, StoreError> {
        let mut out: Vec<ExistingAppointment> =
            self.appointments.iter().map(|e| e.projection()).collect();
        out.sort_by_key(|a| a.id);
        Ok(out)
    }

    async fn find_appointment(&self, id: AppointmentId) -> Result<Option<Appointment>, StoreError> {
        Ok(self.appointments.get(&id).map(|e| e.value().clone()))
    }

    async fn insert_appointment(&self, mut appointment: Appointment) -> Result<AppointmentId, StoreError> {
        let id = next_id(&self.last_appointment_id, "appointment")?;
        appointment.id = id;
        self.appointments.insert(id, appointment);
        Ok(id)
    }

    async fn update_appointment(&self, appointment: Appointment) -> Result<(), StoreError> {
        match self.appointments.get_mut(&appointment.id) {
            Some(mut entry) => {
                *entry = appointment;
                Ok(())
            }
            None => Err(StoreError::NotFound {
                entity: "appointment",
                id: appointment.id,
            }),
        }
    }

    async fn delete_appointment(&self, id: AppointmentId) -> Result<Appointment, StoreError> {
        self.appointments
            .remove(&id)
            .map(|(_, a)| a)
            .ok_or(StoreError::NotFound {
                entity: "appointment",
                id,
            })
    }

    async fn find_customer(&self, id: CustomerId) -> Result<Option<Customer>, StoreError> {
        Ok(self.customers.get(&id).map(|e| e.value().clone()))
    }

    async fn insert_customer(&self, mut customer: Customer) -> Result<CustomerId, StoreError> {
        let id = next_id(&self.last_customer_id, "customer")?;
        customer.id = id;
        self.customers.insert(id, customer);
        Ok(id)
    }

    async fn update_customer(&self, customer: Customer) -> Result<(), StoreError> {
        match self.customers.get_mut(&customer.id) {
            Some(mut entry) => {
                *entry = customer;
                Ok(())
            }
            None => Err(StoreError::NotFound {
                entity: "customer",
                id: customer.id,
            }),
        }
    }

    async fn delete_customer(&self, id: CustomerId) -> Result<Vec<AppointmentId>, StoreError> {
        if self.customers.remove(&id).is_none() {
            return Err(StoreError::NotFound {
                entity: "customer",
                id,
            });
        }
        let mut removed: Vec<AppointmentId> = self
            .appointments
            .iter()
            .filter(|e| e.customer_id == id)
            .map(|e| *e.key())
            .collect();
        for appointment_id in &removed {
            self.appointments.remove(appointment_id);
        }
        removed.sort_unstable();
        Ok(removed)
    }
}

fn next_id(last: &AtomicI32, entity: &str) -> Result<i32, StoreError> {
    last.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |id| id.checked_add(1))
        .map(|prev| prev + 1)
        .map_err(|_| StoreError::Unavailable(format!("{entity} id sequence exhausted")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    fn stamp() -> AuditStamp {
        let at = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        AuditStamp {
            created_at: at,
            created_by: "test".into(),
            updated_at: at,
            updated_by: "test".into(),
        }
    }

    fn customer(id: CustomerId) -> Customer {
        Customer {
            id,
            name: "Ada".into(),
            address: "1 Main St".into(),
            postal_code: "12345".into(),
            phone: "555-0100".into(),
            division_id: 1,
            audit: stamp(),
        }
    }

    fn appointment(id: AppointmentId, customer_id: CustomerId, hour: u32) -> Appointment {
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        Appointment {
            id,
            title: "t".into(),
            description: "d".into(),
            location: "l".into(),
            kind: "k".into(),
            window: TimeWindow::new(
                day.and_hms_opt(hour, 0, 0).unwrap(),
                day.and_hms_opt(hour + 1, 0, 0).unwrap(),
            ),
            customer_id,
            user_id: 1,
            contact_id: 1,
            audit: stamp(),
        }
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids() {
        let store = InMemoryStore::new();
        let a = store.insert_appointment(appointment(0, 1, 9)).await.unwrap();
        let b = store.insert_appointment(appointment(0, 1, 10)).await.unwrap();
        assert_eq!((a, b), (1, 2));
        assert_eq!(store.find_appointment(2).await.unwrap().unwrap().id, 2);
    }

    #[tokio::test]
    async fn snapshot_ids_are_kept_and_sequences_continue() {
        let snapshot = Snapshot {
            customers: vec![customer(4)],
            appointments: vec![appointment(10, 4, 9)],
            ..Default::default()
        };
        let store = InMemoryStore::from_snapshot(snapshot);
        assert!(store.customer_exists(4).await.unwrap());
        let next = store.insert_appointment(appointment(0, 4, 11)).await.unwrap();
        assert_eq!(next, 11);
        let next_customer = store.insert_customer(customer(0)).await.unwrap();
        assert_eq!(next_customer, 5);
    }

    #[tokio::test]
    async fn exhausted_sequence_refuses_insert_without_overwriting() {
        let snapshot = Snapshot {
            customers: vec![customer(i32::MAX)],
            appointments: vec![appointment(i32::MAX, i32::MAX, 9)],
            ..Default::default()
        };
        let store = InMemoryStore::from_snapshot(snapshot);

        let err = store.insert_appointment(appointment(0, i32::MAX, 11)).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        let err = store.insert_customer(customer(0)).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));

        assert_eq!(store.appointment_count(), 1);
        let kept = store.find_appointment(i32::MAX).await.unwrap().unwrap();
        assert_eq!(kept.window.start.hour(), 9);
    }

    #[tokio::test]
    async fn appointments_for_customer_filters_and_sorts() {
        let snapshot = Snapshot {
            appointments: vec![
                appointment(3, 1, 12),
                appointment(1, 1, 9),
                appointment(2, 2, 10),
            ],
            ..Default::default()
        };
        let store = InMemoryStore::from_snapshot(snapshot);
        let ids: Vec<_> = store
            .appointments_for_customer(1)
            .await
            .unwrap()
            .iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(store.all_appointments().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn update_missing_appointment_is_not_found() {
        let store = InMemoryStore::new();
        let err = store.update_appointment(appointment(9, 1, 9)).await.unwrap_err();
        assert_eq!(
            err,
            StoreError::NotFound {
                entity: "appointment",
                id: 9
            }
        );
    }

    #[tokio::test]
    async fn delete_customer_cascades_appointments() {
        let snapshot = Snapshot {
            customers: vec![customer(1), customer(2)],
            appointments: vec![
                appointment(1, 1, 9),
                appointment(2, 2, 10),
                appointment(3, 1, 12),
            ],
            ..Default::default()
        };
        let store = InMemoryStore::from_snapshot(snapshot);
        let removed = store.delete_customer(1).await.unwrap();
        assert_eq!(removed, vec![1, 3]);
        assert_eq!(store.appointment_count(), 1);
        assert_eq!(store.customer_count(), 1);
        assert!(store.delete_customer(1).await.is_err());
    }

    #[test]
    fn snapshot_parses_from_json() {
        let json = r#"{
            "countries": [{"id": 1, "name": "U.S"}],
            "divisions": [{"id": 10, "name": "Ohio", "country_id": 1}],
            "users": [{"id": 1, "name": "test"}]
        }"#;
        let snapshot: Snapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.divisions[0].country_id, 1);
        assert!(snapshot.appointments.is_empty());
    }
}
