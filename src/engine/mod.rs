mod business_hours;
mod conflict;
mod error;
mod mutations;
mod queries;
mod upcoming;
mod validator;

pub use business_hours::BusinessHoursPolicy;
pub use conflict::{conflicts, contains, ends_within, find_conflict, starts_within};
pub use error::{EngineError, Field, Reference, ValidationResult, Violation, ViolationKind};
pub use upcoming::due_soon;
pub use validator::{validate_customer, AppointmentValidator};

use std::sync::Arc;

use chrono::{Duration, NaiveDateTime};
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::config::SchedulerConfig;
use crate::model::*;
use crate::store::SchedulingStore;

/// Orchestrates validation and commits against a [`SchedulingStore`].
///
/// Writes touching one customer's schedule are serialised: the conflict scan
/// and the commit that follows it run under that customer's lock, so two
/// overlapping bookings racing each other cannot both succeed.
pub struct Engine {
    store: Arc<dyn SchedulingStore>,
    policy: BusinessHoursPolicy,
    lookahead: Duration,
    enforce_business_hours: bool,
    /// Per-customer write locks, created on first use.
    customer_locks: DashMap<CustomerId, Arc<Mutex<()>>>,
}

impl Engine {
    pub fn new(store: Arc<dyn SchedulingStore>, config: &SchedulerConfig) -> Self {
        Self {
            store,
            policy: config.policy(),
            lookahead: Duration::try_minutes(config.lookahead_minutes).unwrap_or(Duration::MAX),
            enforce_business_hours: config.enforce_business_hours,
            customer_locks: DashMap::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn SchedulingStore> {
        &self.store
    }

    pub fn policy(&self) -> &BusinessHoursPolicy {
        &self.policy
    }

    pub(super) fn validator(&self) -> AppointmentValidator<'_> {
        AppointmentValidator::new(self.store.as_ref(), &self.policy, self.enforce_business_hours)
    }

    /// Acquire the write lock for one customer's schedule. The map entry
    /// lives only while some writer holds or awaits it.
    pub(super) async fn lock_customer(&self, id: CustomerId) -> CustomerLock<'_> {
        let lock = self
            .customer_locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        CustomerLock {
            locks: &self.customer_locks,
            id,
            guard: Some(lock.lock_owned().await),
        }
    }
}

pub(super) struct CustomerLock<'a> {
    locks: &'a DashMap<CustomerId, Arc<Mutex<()>>>,
    id: CustomerId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for CustomerLock<'_> {
    fn drop(&mut self) {
        // Release first so the guard's own Arc no longer counts. Clones are
        // taken under the shard lock, so a waiter always keeps the entry alive.
        self.guard.take();
        self.locks.remove_if(&self.id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// Current wall time in the storage zone, for audit columns.
pub(crate) fn storage_now() -> NaiveDateTime {
    chrono::Utc::now().naive_utc()
}
