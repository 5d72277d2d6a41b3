use std::sync::Arc;

use dotenv::dotenv;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod sync;

use shared_backend::BackendClient;
use shared_config::AppConfig;
use shared_prefs::FilePreferenceStore;

#[tokio::main]
async fn main() {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting patient app core");

    // Load configuration
    let config = AppConfig::from_env();
    if !config.is_configured() {
        error!("Missing API_BASE_URL / DATABASE_NAME, nothing to sync against");
        return;
    }

    let prefs_path = std::path::Path::new(&config.data_dir).join("preferences.json");
    let prefs = match FilePreferenceStore::open(&prefs_path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("Cannot open preference store at {}: {}", prefs_path.display(), e);
            return;
        }
    };

    let backend = Arc::new(BackendClient::new(&config));

    if let Err(e) = sync::run_sync_cycle(backend, prefs).await {
        error!("Sync cycle failed: {}", e);
    }
}
