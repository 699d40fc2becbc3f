use axum::{
    Json, Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};
use serde_json::{Value, json};

use std::{net::SocketAddr, sync::Arc};

use crate::{ServerError, accounts, transfer};
use engine::{Engine, EngineError};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// Resolve the bearer token to a [`engine::UserIdentity`] and hand it to the
/// read handlers as a request extension.
async fn auth(
    auth_header: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let TypedHeader(Authorization(bearer)) = auth_header.map_err(|rejection| {
        let reason = if rejection.is_missing() {
            "missing bearer token"
        } else {
            "malformed authorization header"
        };
        ServerError::Engine(EngineError::Unauthorized(reason.to_string()))
    })?;

    let identity = state.engine.authenticate_token(bearer.token()).await?;
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Build the HTTP surface around a shared engine.
///
/// `POST /transfer` authenticates inside the engine, after shape validation;
/// the read endpoints go through the `auth` middleware.
pub fn router(engine: Engine) -> Router {
    let state = ServerState {
        engine: Arc::new(engine),
    };

    let reads = Router::new()
        .route("/accounts", get(accounts::list))
        .route("/accounts/{id}/entries", get(accounts::entries))
        .route("/accounts/{id}/balance", get(accounts::balance))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth));

    Router::new()
        .route("/transfer", post(transfer::create))
        .route("/health", get(health))
        .merge(reads)
        .with_state(state)
}

pub async fn run(engine: Engine, addr: SocketAddr) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    run_with_listener(engine, listener).await
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(engine))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested, draining connections");
}
