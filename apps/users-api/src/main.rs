use axum::Router;
use axum_helpers::server::{create_production_app, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use std::time::Duration;
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

/// Time the MongoDB cleanup gets once the server has stopped accepting requests
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // A local .env file is optional; real environment variables win
    let dotenv_loaded = core_config::load_dotenv();

    // Colored reports for anything that fails during startup
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    if dotenv_loaded {
        info!("Loaded environment from .env");
    }

    info!(
        "Connecting to MongoDB at {} (database: {})",
        config.mongodb.redacted_url(),
        config.mongodb.database()
    );

    // The server is unusable without the store, so retry before giving up
    let mongo_client =
        database::mongodb::connect_from_config_with_retry(&config.mongodb, None).await?;
    let db = mongo_client.database(config.mongodb.database());

    // Unique email index backs the duplicate-email checks
    api::users::init_indexes(&db).await?;

    let state = AppState {
        config,
        mongo_client,
        db,
    };

    let app = build_app(&state).await?;

    info!(
        "Starting {} v{} on {}",
        state.config.app.name,
        state.config.app.version,
        state.config.server.address()
    );

    // Stops on SIGINT/SIGTERM, drains in-flight requests, then closes the client
    create_production_app(app, &state.config.server, SHUTDOWN_TIMEOUT, async move {
        info!("Closing MongoDB client");
        drop(state.mongo_client);
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Users API stopped");
    Ok(())
}

/// `/api/*` routes with OpenAPI docs, plus the liveness endpoint at `/health`
async fn build_app(state: &AppState) -> eyre::Result<Router> {
    let router = axum_helpers::create_router::<openapi::ApiDoc>(api::routes(state)).await?;
    Ok(router.merge(health_router(state.config.app)))
}
