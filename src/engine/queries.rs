use chrono::NaiveDateTime;
use chrono_tz::Tz;

use crate::model::*;
use crate::observability::{record_validation, DUE_SOON_MATCHES_TOTAL};

use super::upcoming::due_soon;
use super::{Engine, EngineError, ValidationResult};

impl Engine {
    /// Full validation pass for a draft entered in `session.zone`. Reads
    /// only; the caller decides whether to commit.
    pub async fn validate(
        &self,
        session: &Session,
        draft: &AppointmentDraft,
    ) -> Result<ValidationResult, EngineError> {
        let started = std::time::Instant::now();
        let result = self.validator().validate(draft, session.zone).await?;
        record_validation(&result, started.elapsed().as_secs_f64());
        Ok(result)
    }

    /// Appointments in progress or starting within the configured look-ahead,
    /// as seen by `session`. `now` is wall time in the session's zone.
    pub async fn due_soon_at_login(
        &self,
        session: &Session,
        now: NaiveDateTime,
    ) -> Result<Vec<AppointmentSummary>, EngineError> {
        let all: Vec<ExistingAppointment> = self
            .store
            .all_appointments()
            .await?
            .iter()
            .map(|a| a.in_zone(STORAGE_ZONE, session.zone))
            .collect();
        let found = due_soon(now, &all, self.lookahead);
        metrics::counter!(DUE_SOON_MATCHES_TOTAL).increment(found.len() as u64);
        tracing::debug!(user = %session.user_name, matches = found.len(), "due-soon check");
        Ok(found)
    }

    /// Same as [`Engine::due_soon_at_login`] at the current instant.
    pub async fn due_soon_now(&self, session: &Session) -> Result<Vec<AppointmentSummary>, EngineError> {
        let now = chrono::Utc::now().with_timezone(&session.zone).naive_local();
        self.due_soon_at_login(session, now).await
    }

    pub fn available_hours(&self, zone: Tz) -> Vec<HourChoice> {
        self.policy.available_hours(zone)
    }

    /// One appointment with its window expressed in `zone`.
    pub async fn appointment_in_zone(
        &self,
        id: AppointmentId,
        zone: Tz,
    ) -> Result<Appointment, EngineError> {
        let mut appointment = self
            .store
            .find_appointment(id)
            .await?
            .ok_or(EngineError::AppointmentNotFound(id))?;
        appointment.window = appointment.window.convert_to_zone(STORAGE_ZONE, zone);
        Ok(appointment)
    }

    /// A customer's booked appointments, windows expressed in `zone`.
    pub async fn customer_schedule(
        &self,
        customer_id: CustomerId,
        zone: Tz,
    ) -> Result<Vec<ExistingAppointment>, EngineError> {
        if !self.store.customer_exists(customer_id).await? {
            return Err(EngineError::CustomerNotFound(customer_id));
        }
        Ok(self
            .store
            .appointments_for_customer(customer_id)
            .await?
            .iter()
            .map(|a| a.in_zone(STORAGE_ZONE, zone))
            .collect())
    }
}
