//! GraphQL HTTP server.

use std::future::Future;
use std::sync::Arc;

use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
};
use tracing::{info, warn};

use chronicle_core::ports::StorageHealth;

use crate::types::ChronicleSchema;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_playground: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            enable_playground: true,
        }
    }
}

#[derive(Clone)]
struct AppState {
    schema: ChronicleSchema,
    /// Database behind the cache, when one is configured.
    storage: Option<Arc<dyn StorageHealth>>,
}

fn router(state: AppState, config: &ServerConfig) -> Router {
    let mut app = Router::new()
        .route("/graphql", get(graphql_playground).post(graphql_handler))
        .route("/health", get(health_check));

    if config.enable_playground {
        app = app.route("/", get(graphql_playground));
    }
    app.with_state(state)
}

/// Start the GraphQL server with graceful shutdown support.
///
/// `/health` also checks `storage` when given.
pub async fn serve_with_shutdown<F>(
    schema: ChronicleSchema,
    storage: Option<Arc<dyn StorageHealth>>,
    config: ServerConfig,
    shutdown_signal: F,
) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(AppState { schema, storage }, &config);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("⚡ GraphQL server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
}

/// GraphQL query handler.
async fn graphql_handler(State(state): State<AppState>, req: GraphQLRequest) -> GraphQLResponse {
    state.schema.execute(req.into_inner()).await.into()
}

/// GraphQL Playground UI.
async fn graphql_playground() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> (StatusCode, &'static str) {
    let healthy = match &state.storage {
        Some(storage) => storage.is_healthy().await,
        None => true,
    };
    if !healthy {
        warn!("⚠️  Health check: database unreachable");
        return (StatusCode::SERVICE_UNAVAILABLE, "database unavailable");
    }
    (StatusCode::OK, "OK")
}
