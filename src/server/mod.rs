//! Server initialization and routing

use crate::api;
use crate::api::user::USER_ROUTES_PREFIX;
use crate::config::Config;
use crate::jwt::TokenVerifier;
use crate::keycloak::KeycloakClient;
use crate::middleware::{normalize_error_response, require_role_middleware, AuthMiddlewareState};
use crate::service::{KeycloakUserService, UserAdminService};
use anyhow::{Context, Result};
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<dyn UserAdminService>,
}

impl AppState {
    pub fn new(user_service: Arc<dyn UserAdminService>) -> Self {
        Self { user_service }
    }
}

pub async fn run(config: Config) -> Result<()> {
    let keycloak_client = KeycloakClient::new(config.keycloak.clone())
        .context("Failed to create Keycloak client")?;
    info!(
        "Managing realm '{}' at {}",
        keycloak_client.realm(),
        config.keycloak.url
    );

    let verifier = TokenVerifier::new(config.auth.clone()).context("Failed to load token key")?;
    info!(
        rsa = verifier.uses_rsa(),
        required_role = %verifier.required_role(),
        "Bearer token verification configured"
    );

    let user_service: Arc<dyn UserAdminService> =
        Arc::new(KeycloakUserService::new(Arc::new(keycloak_client)));
    let auth_state = AuthMiddlewareState::new(Arc::new(verifier));

    let addr = config.http_addr();
    let state = AppState::new(user_service);
    let app = build_router(state, auth_state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

/// Build the HTTP router.
///
/// Every route under `/keycloak/user` runs behind the role guard; `/health`
/// does not. Error responses leave the router as the JSON error envelope.
pub fn build_router(state: AppState, auth_state: AuthMiddlewareState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let user_routes = Router::new()
        .route("/search", get(api::user::find_all))
        .route("/search/{username}", get(api::user::search))
        .route("/create", post(api::user::create))
        .route("/update/{user_id}", put(api::user::update))
        .route("/delete/{user_id}", delete(api::user::delete))
        .route_layer(axum::middleware::from_fn_with_state(
            auth_state,
            require_role_middleware,
        ));

    Router::new()
        .route("/health", get(api::health::health))
        .nest(USER_ROUTES_PREFIX, user_routes)
        .layer(axum::middleware::from_fn(normalize_error_response))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
