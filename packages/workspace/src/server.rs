//! # Config Server
//!
//! HTTP surface of the durable store.
//!
//! | Route               | Method | Purpose                                   |
//! |---------------------|--------|-------------------------------------------|
//! | `/api/config`       | GET    | resolved durable configuration            |
//! | `/api/config`       | POST   | publish a full configuration              |
//! | `/api/preview`      | GET    | SSE stream of preview envelopes           |
//! | `/api/health`       | GET    | liveness                                  |
//!
//! A publish may ask for a restart. The serve loop then closes preview
//! streams, shuts the listener down gracefully and binds again, possibly
//! on another port, with the same state.

use crate::error::ServerError;
use crate::state::ServerState;
use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    routing::get,
    Json, Router,
};
use futures::stream::{self, Stream, StreamExt};
use serde_json::Value;
use siteconf_schema::{Envelope, PublishResponse, SiteConfiguration};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, oneshot};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Time given to the publish response to reach the client before a restart
const RESTART_GRACE: Duration = Duration::from_millis(250);

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

pub fn router(state: Arc<ServerState>) -> Router {
    let cors = cors_layer(&state.options().allowed_origins);

    Router::new()
        .route("/api/config", get(get_config).post(post_config))
        .route("/api/preview", get(preview_stream))
        .route("/api/health", get(|| async { "ok" }))
        .with_state(state)
        .layer(cors)
}

fn cors_layer(allowed: &[String]) -> CorsLayer {
    if allowed.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::permissive().allow_origin(AllowOrigin::list(origins))
}

pub async fn bind(host: &str, port: u16) -> Result<TcpListener, ServerError> {
    let addr = format!("{}:{}", host, port);
    TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })
}

/// Serve until the process ends, rebinding whenever a publish asks for a
/// restart
pub async fn serve(state: Arc<ServerState>, listener: TcpListener) -> Result<(), ServerError> {
    let mut restarts = state
        .take_restart_receiver()
        .ok_or(ServerError::AlreadyServing)?;
    let mut listener = listener;

    loop {
        let addr = listener.local_addr()?;
        state.set_port(addr.port());
        tracing::info!(%addr, "Serving site configuration");

        let (stop_tx, stop_rx) = oneshot::channel();
        let shutdown_state = Arc::clone(&state);
        let shutdown = async move {
            match restarts.recv().await {
                Some(request) => {
                    tokio::time::sleep(RESTART_GRACE).await;
                    tracing::info!(port = request.port, "Restarting listener after publish");
                    shutdown_state.close_streams();
                    let _ = stop_tx.send((request.port, restarts));
                }
                None => std::future::pending::<()>().await,
            }
        };

        axum::serve(listener, router(Arc::clone(&state)))
            .with_graceful_shutdown(shutdown)
            .await?;

        let Ok((port, receiver)) = stop_rx.await else {
            return Ok(());
        };
        restarts = receiver;
        listener = bind(&state.options().host, port).await?;
    }
}

async fn get_config(State(state): State<Arc<ServerState>>) -> Json<Value> {
    Json(state.current().to_value())
}

async fn post_config(
    State(state): State<Arc<ServerState>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let config = match SiteConfiguration::from_value(body) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected publish body");
            return (
                StatusCode::BAD_REQUEST,
                Json(PublishResponse::failure(format!("Invalid configuration: {}", e))),
            );
        }
    };

    match state.publish(config).await {
        Ok(response) => (StatusCode::OK, Json(response)),
        Err(e) => {
            tracing::error!(error = %e, "Publish failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(PublishResponse::failure(e.to_string())),
            )
        }
    }
}

/// SSE endpoint: the current configuration, then every broadcast
async fn preview_stream(
    State(state): State<Arc<ServerState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let initial = state.envelope_for(&state.current());
    let initial_stream = stream::iter(initial.map(|envelope| Ok(to_event(&envelope))));

    let receiver = state.subscribe();
    let generation = state.stream_generation();
    tracing::info!("Preview stream opened");

    let updates = stream::unfold((receiver, generation), |(mut rx, mut generation)| async move {
        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Ok(envelope) => {
                        return Some((Ok(to_event(&envelope)), (rx, generation)));
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("[SSE] Subscriber lagged by {} messages", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("[SSE] Broadcast channel closed");
                        return None;
                    }
                },
                _ = generation.changed() => {
                    tracing::info!("[SSE] Closing stream for restart");
                    return None;
                }
            }
        }
    });

    Sse::new(initial_stream.chain(updates)).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("ping"),
    )
}

fn to_event(envelope: &Envelope) -> Event {
    Event::default()
        .event("configUpdate")
        .json_data(envelope)
        .unwrap_or_else(|e| Event::default().comment(format!("serialization failed: {}", e)))
}
