//! chirpd: the chirp server binary

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use api::{init_error_mode, serve, AppState, ServerConfig};
use auth::AuthConfig;
use social_core::DeletePolicy;
use storage::{KvConfig, SledStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = ServerConfig::from_env()?;
    let auth_config = Arc::new(AuthConfig::from_env()?);
    init_error_mode(config.production);

    let store = Arc::new(SledStore::new(KvConfig::new(config.db_path.clone()))?);
    let state = AppState::build(store, auth_config, DeletePolicy::default())?;

    serve(&config, state).await
}
