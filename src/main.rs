use axum::{routing::get, Router};
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::env;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use analytics_exporter::handlers::analytics_routes;
use analytics_exporter::jobs::analytics_sync::{start_analytics_sync_job, SyncJobConfig};
use analytics_exporter::services::analytics_sync::AnalyticsSyncService;
use analytics_exporter::services::data_source::SeaOrmDataSource;
use analytics_exporter::services::host_context::ProcessHostContext;
use analytics_exporter::services::receiver_client::{ReceiverClient, ReceiverConfig};
use analytics_exporter::services::sync_state::SeaOrmSyncStateStore;
use analytics_exporter::AppState;

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,analytics_exporter=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    // Connect to database
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    tracing::info!("Connecting to database...");
    let db = Database::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    tracing::info!("Running migrations...");
    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    let host_db = connect_host_database(&db).await;

    let receiver_config = ReceiverConfig::from_env().expect("Invalid receiver configuration");
    tracing::info!(
        url = %receiver_config.url,
        max_retries = receiver_config.max_retries,
        "Receiver configured"
    );
    let receiver = ReceiverClient::new(receiver_config).expect("Failed to build receiver client");

    let sync_service = AnalyticsSyncService::new(
        Arc::new(SeaOrmDataSource::from_env(host_db)),
        Arc::new(receiver),
        Arc::new(SeaOrmSyncStateStore::new(db)),
        Arc::new(ProcessHostContext::new()),
    );

    start_analytics_sync_job(sync_service.clone(), SyncJobConfig::from_env()).await;

    let state = AppState { sync_service };

    // Build router
    let app = Router::new()
        .route("/", get(hello_exporter))
        .merge(analytics_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Start server
    let bind_address = env::var("BIND_ADDRESS").unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string());
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .unwrap();

    tracing::info!("Server listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}

/// Host tables may live in a separate database; default to the state database
async fn connect_host_database(db: &DatabaseConnection) -> DatabaseConnection {
    match env::var("HOST_DATABASE_URL") {
        Ok(url) if !url.trim().is_empty() => {
            tracing::info!("Connecting to host database...");
            Database::connect(&url)
                .await
                .expect("Failed to connect to host database")
        }
        _ => db.clone(),
    }
}

async fn hello_exporter() -> &'static str {
    "Analytics exporter is running"
}
