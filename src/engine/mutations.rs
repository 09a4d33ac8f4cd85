use tracing::{info, warn};

use crate::model::*;
use crate::observability::APPOINTMENTS_COMMITTED_TOTAL;
use crate::store::StoreError;

use super::validator::{parse_id, validate_customer};
use super::{storage_now, CustomerLock, Engine, EngineError, ValidationResult};

impl Engine {
    /// Validate and, only if there are no violations, persist a new appointment.
    /// Any id on the draft is ignored.
    pub async fn add_appointment(
        &self,
        session: &Session,
        mut draft: AppointmentDraft,
    ) -> Result<AppointmentId, EngineError> {
        draft.id = None;
        let _guard = self.lock_for_draft(&draft).await;

        let result = self.validate(session, &draft).await?;
        let (customer_id, user_id) = committable(&draft, result)?;

        let now = storage_now();
        let appointment = Appointment {
            id: 0,
            title: draft.title.trim().to_string(),
            description: draft.description.trim().to_string(),
            location: draft.location.trim().to_string(),
            kind: draft.kind.trim().to_string(),
            window: draft.window.convert_to_zone(session.zone, STORAGE_ZONE),
            customer_id,
            user_id,
            contact_id: draft.contact_id,
            audit: AuditStamp::created(session, now),
        };
        let id = self.store.insert_appointment(appointment).await?;

        metrics::counter!(APPOINTMENTS_COMMITTED_TOTAL, "op" => "insert").increment(1);
        info!(appointment = id, customer = customer_id, by = %session.user_name, "appointment added");
        Ok(id)
    }

    /// The appointment is excluded from its own conflict scan.
    pub async fn update_appointment(
        &self,
        session: &Session,
        id: AppointmentId,
        mut draft: AppointmentDraft,
    ) -> Result<(), EngineError> {
        draft.id = Some(id);
        let _guard = self.lock_for_draft(&draft).await;

        let existing = self
            .store
            .find_appointment(id)
            .await?
            .ok_or(EngineError::AppointmentNotFound(id))?;

        let result = self.validate(session, &draft).await?;
        let (customer_id, user_id) = committable(&draft, result)?;

        let appointment = Appointment {
            id,
            title: draft.title.trim().to_string(),
            description: draft.description.trim().to_string(),
            location: draft.location.trim().to_string(),
            kind: draft.kind.trim().to_string(),
            window: draft.window.convert_to_zone(session.zone, STORAGE_ZONE),
            customer_id,
            user_id,
            contact_id: draft.contact_id,
            audit: existing.audit.touched(session, storage_now()),
        };
        self.store
            .update_appointment(appointment)
            .await
            .map_err(|e| not_found_as(e, EngineError::AppointmentNotFound(id)))?;

        metrics::counter!(APPOINTMENTS_COMMITTED_TOTAL, "op" => "update").increment(1);
        info!(appointment = id, customer = customer_id, by = %session.user_name, "appointment updated");
        Ok(())
    }

    pub async fn delete_appointment(&self, id: AppointmentId) -> Result<Appointment, EngineError> {
        let existing = self
            .store
            .find_appointment(id)
            .await?
            .ok_or(EngineError::AppointmentNotFound(id))?;
        let _guard = self.lock_customer(existing.customer_id).await;

        let removed = self
            .store
            .delete_appointment(id)
            .await
            .map_err(|e| not_found_as(e, EngineError::AppointmentNotFound(id)))?;

        metrics::counter!(APPOINTMENTS_COMMITTED_TOTAL, "op" => "delete").increment(1);
        info!(appointment = id, kind = %removed.kind, "appointment cancelled");
        Ok(removed)
    }

    pub async fn add_customer(
        &self,
        session: &Session,
        draft: CustomerDraft,
    ) -> Result<CustomerId, EngineError> {
        let result = validate_customer(self.store.as_ref(), &draft).await?;
        let Some(division_id) = draft.division_id.filter(|_| result.is_valid()) else {
            warn!(violations = result.violations.len(), "customer rejected");
            return Err(EngineError::Rejected(result));
        };

        let customer = Customer {
            id: 0,
            name: draft.name.trim().to_string(),
            address: draft.address.trim().to_string(),
            postal_code: draft.postal_code.trim().to_string(),
            phone: draft.phone.trim().to_string(),
            division_id,
            audit: AuditStamp::created(session, storage_now()),
        };
        let id = self.store.insert_customer(customer).await?;
        info!(customer = id, by = %session.user_name, "customer added");
        Ok(id)
    }

    pub async fn update_customer(
        &self,
        session: &Session,
        id: CustomerId,
        draft: CustomerDraft,
    ) -> Result<(), EngineError> {
        let _guard = self.lock_customer(id).await;
        let existing = self
            .store
            .find_customer(id)
            .await?
            .ok_or(EngineError::CustomerNotFound(id))?;

        let result = validate_customer(self.store.as_ref(), &draft).await?;
        let Some(division_id) = draft.division_id.filter(|_| result.is_valid()) else {
            warn!(customer = id, violations = result.violations.len(), "customer update rejected");
            return Err(EngineError::Rejected(result));
        };

        let customer = Customer {
            id,
            name: draft.name.trim().to_string(),
            address: draft.address.trim().to_string(),
            postal_code: draft.postal_code.trim().to_string(),
            phone: draft.phone.trim().to_string(),
            division_id,
            audit: existing.audit.touched(session, storage_now()),
        };
        self.store
            .update_customer(customer)
            .await
            .map_err(|e| not_found_as(e, EngineError::CustomerNotFound(id)))?;
        info!(customer = id, by = %session.user_name, "customer updated");
        Ok(())
    }

    pub async fn delete_customer(&self, id: CustomerId) -> Result<Vec<AppointmentId>, EngineError> {
        let _guard = self.lock_customer(id).await;
        let removed = self
            .store
            .delete_customer(id)
            .await
            .map_err(|e| not_found_as(e, EngineError::CustomerNotFound(id)))?;

        metrics::counter!(APPOINTMENTS_COMMITTED_TOTAL, "op" => "delete")
            .increment(removed.len() as u64);
        info!(customer = id, appointments = removed.len(), "customer deleted with its appointments");
        Ok(removed)
    }

    // A customer id that does not parse touches no schedule; it is rejected anyway.
    async fn lock_for_draft(&self, draft: &AppointmentDraft) -> Option<CustomerLock<'_>> {
        match parse_id(&draft.customer_id) {
            Some(customer_id) => Some(self.lock_customer(customer_id).await),
            None => None,
        }
    }
}

fn committable(
    draft: &AppointmentDraft,
    result: ValidationResult,
) -> Result<(CustomerId, UserId), EngineError> {
    match (parse_id(&draft.customer_id), parse_id(&draft.user_id)) {
        (Some(customer_id), Some(user_id)) if result.is_valid() => Ok((customer_id, user_id)),
        _ => {
            warn!(
                appointment = ?draft.id,
                violations = result.violations.len(),
                "appointment rejected"
            );
            Err(EngineError::Rejected(result))
        }
    }
}

fn not_found_as(e: StoreError, mapped: EngineError) -> EngineError {
    match e {
        StoreError::NotFound { .. } => mapped,
        other => EngineError::Store(other),
    }
}
