// libs/appointment-cell/src/services/store.rs
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use reqwest::Method;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use shared_backend::BackendClient;
use shared_prefs::{keys, PreferenceStore};

use crate::models::{Appointment, AppointmentSnapshot, AppointmentStatus, BookingRecord};
use crate::services::classify;

type Subscriber = Arc<dyn Fn(AppointmentSnapshot) + Send + Sync>;
type InFlightFetch = Shared<BoxFuture<'static, AppointmentSnapshot>>;

/// Single source of truth for booking data across the running application.
/// Views subscribe for snapshots; every mutation notifies synchronously.
///
/// Fetches are single-flight: concurrent `fetch_booked` callers share the
/// same in-flight future instead of racing duplicate requests.
pub struct AppointmentStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    backend: Arc<BackendClient>,
    prefs: Arc<dyn PreferenceStore>,
    state: Mutex<AppointmentSnapshot>,
    subscribers: Mutex<Vec<(Uuid, Subscriber)>>,
    in_flight: Mutex<Option<InFlightFetch>>,
}

impl AppointmentStore {
    pub fn new(backend: Arc<BackendClient>, prefs: Arc<dyn PreferenceStore>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                backend,
                prefs,
                state: Mutex::new(AppointmentSnapshot::default()),
                subscribers: Mutex::new(Vec::new()),
                in_flight: Mutex::new(None),
            }),
        }
    }

    /// Current in-memory snapshot. No I/O.
    pub fn snapshot(&self) -> AppointmentSnapshot {
        lock(&self.inner.state).clone()
    }

    /// Register a callback invoked with the full snapshot on every state
    /// change. Returns the id to pass to `unsubscribe`.
    pub fn subscribe(&self, callback: impl Fn(AppointmentSnapshot) + Send + Sync + 'static) -> Uuid {
        let id = Uuid::new_v4();
        lock(&self.inner.subscribers).push((id, Arc::new(callback)));
        id
    }

    /// Remove a subscription. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: Uuid) {
        lock(&self.inner.subscribers).retain(|(sub_id, _)| *sub_id != id);
    }

    /// Fetch the remote booking list, merge with the locally cached list,
    /// classify into buckets, persist, update state and notify.
    ///
    /// On fetch failure the previously loaded state is left untouched and an
    /// empty snapshot is returned; the caller owns its own error display.
    #[instrument(skip(self, auth_token))]
    pub async fn fetch_booked(&self, customer_id: &str, auth_token: &str) -> AppointmentSnapshot {
        let fetch = {
            let mut in_flight = lock(&self.inner.in_flight);
            if let Some(existing) = in_flight.as_ref() {
                debug!("Joining in-flight booking fetch");
                existing.clone()
            } else {
                let inner = Arc::clone(&self.inner);
                let customer_id = customer_id.to_string();
                let auth_token = auth_token.to_string();
                let fetch: InFlightFetch = async move {
                    let snapshot = inner.fetch_and_apply(&customer_id, &auth_token).await;
                    *lock(&inner.in_flight) = None;
                    snapshot
                }
                .boxed()
                .shared();
                *in_flight = Some(fetch.clone());
                fetch
            }
        };

        fetch.await
    }

    /// Move the matching appointment from upcoming to cancelled, stamping
    /// the cancellation time. Silent no-op when the id is not in upcoming,
    /// which also makes repeated calls idempotent.
    #[instrument(skip(self))]
    pub async fn move_to_cancelled(&self, appointment_id: &str) {
        let updated = {
            let mut state = lock(&self.inner.state);
            match state.upcoming.iter().position(|a| a.id == appointment_id) {
                Some(index) => {
                    let mut appointment = state.upcoming.remove(index);
                    appointment.status = AppointmentStatus::Cancelled;
                    appointment.cancelled_at = Some(Utc::now());
                    state.cancelled.push(appointment);
                    Some(state.clone())
                }
                None => {
                    debug!("moveToCancelled: {} not found in upcoming", appointment_id);
                    None
                }
            }
        };

        if let Some(snapshot) = updated {
            info!("Appointment {} moved to cancelled", appointment_id);
            self.inner.persist(&snapshot).await;
            self.inner.notify(&snapshot);
        }
    }
}

impl StoreInner {
    async fn fetch_and_apply(&self, customer_id: &str, auth_token: &str) -> AppointmentSnapshot {
        let path = format!("/api/customers/{}/bookings", customer_id);
        let records: Vec<BookingRecord> = match self
            .backend
            .request(Method::GET, &path, Some(auth_token), None)
            .await
        {
            Ok(records) => records,
            Err(e) => {
                error!("Failed to fetch booked appointments: {}", e);
                return AppointmentSnapshot::default();
            }
        };

        let remote: Vec<Appointment> = records.into_iter().map(classify::from_record).collect();
        let cached = self.load_cached().await;
        let merged = classify::merge(remote, cached);
        let snapshot = classify::partition(merged, Utc::now().date_naive());

        info!(
            "Booking fetch complete: {} upcoming, {} past, {} cancelled",
            snapshot.upcoming.len(),
            snapshot.past.len(),
            snapshot.cancelled.len()
        );

        self.persist(&snapshot).await;
        *lock(&self.state) = snapshot.clone();
        self.notify(&snapshot);
        snapshot
    }

    async fn load_cached(&self) -> Vec<Appointment> {
        match self.prefs.get(keys::CACHED_BOOKINGS).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(cached) => cached,
                Err(e) => {
                    warn!("Discarding unreadable booking cache: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to read booking cache: {}", e);
                Vec::new()
            }
        }
    }

    async fn persist(&self, snapshot: &AppointmentSnapshot) {
        let flat: Vec<&Appointment> = snapshot.all().collect();
        match serde_json::to_string(&flat) {
            Ok(raw) => {
                if let Err(e) = self.prefs.set(keys::CACHED_BOOKINGS, &raw).await {
                    warn!("Failed to persist booking cache: {}", e);
                }
            }
            Err(e) => warn!("Failed to encode booking cache: {}", e),
        }
    }

    fn notify(&self, snapshot: &AppointmentSnapshot) {
        let subscribers: Vec<Subscriber> = lock(&self.subscribers)
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in subscribers {
            callback(snapshot.clone());
        }
    }
}

/// Locks are only held for short, await-free sections; a poisoned lock means
/// a subscriber panicked and the state itself is still usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
