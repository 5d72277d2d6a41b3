use std::sync::Arc;

use tracing::{info, warn};

use appointment_cell::AppointmentStore;
use auth_cell::{AuthError, AuthService, LoginRequest};
use profile_cell::DocumentService;
use shared_backend::BackendClient;
use shared_models::auth::Session;
use shared_prefs::PreferenceStore;
use task_cell::TaskService;

/// One headless pass over the data a fresh app launch needs: a session,
/// the appointment buckets and the task tabs. A UI shell would keep the
/// stores alive and subscribe instead of exiting.
pub async fn run_sync_cycle(
    backend: Arc<BackendClient>,
    prefs: Arc<dyn PreferenceStore>,
) -> Result<(), Box<dyn std::error::Error>> {
    let auth = AuthService::new(Arc::clone(&backend), Arc::clone(&prefs));
    let session = establish_session(&auth).await?;

    let store = Arc::new(AppointmentStore::new(
        Arc::clone(&backend),
        Arc::clone(&prefs),
    ));
    let subscription = store.subscribe(|snapshot| {
        info!(
            "Appointments updated: {} upcoming / {} past / {} cancelled",
            snapshot.upcoming.len(),
            snapshot.past.len(),
            snapshot.cancelled.len()
        );
    });
    store.fetch_booked(&session.customer_id, session.bearer()).await;
    store.unsubscribe(subscription);

    let tasks = TaskService::new(Arc::clone(&backend));
    match tasks
        .fetch_buckets(&session.customer_id, None, session.bearer())
        .await
    {
        Ok(buckets) => info!(
            "Tasks: {} today, {} tomorrow, {} next 3 days, {} past",
            buckets.today.len(),
            buckets.tomorrow.len(),
            buckets.next3.len(),
            buckets.past.len()
        ),
        Err(e) => warn!("Task fetch failed: {}", e),
    }

    let documents = DocumentService::new(backend);
    match documents
        .fetch_documents(&session.customer_id, session.bearer())
        .await
    {
        Ok(list) => info!("{} documents available", list.len()),
        Err(e) => warn!("Document fetch failed: {}", e),
    }

    Ok(())
}

/// Reuse a persisted session when present, otherwise log in with the
/// credentials from the environment.
async fn establish_session(auth: &AuthService) -> Result<Session, AuthError> {
    match auth.restore_session().await {
        Ok(session) => {
            info!("Restored session for customer {}", session.customer_id);
            return Ok(session);
        }
        Err(AuthError::MissingSession) => {}
        Err(e) => return Err(e),
    }

    let username = std::env::var("APP_USERNAME").unwrap_or_default();
    let password = std::env::var("APP_PASSWORD").unwrap_or_default();
    let database_name = std::env::var("DATABASE_NAME").unwrap_or_default();

    if username.is_empty() || password.is_empty() {
        warn!("No stored session and no APP_USERNAME/APP_PASSWORD set");
        return Err(AuthError::MissingSession);
    }

    auth.login(LoginRequest {
        username,
        password,
        database_name,
    })
    .await
}
