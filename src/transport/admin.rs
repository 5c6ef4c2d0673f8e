//! Admin HTTP routes: `GET /debug` and `GET /export`.
//!
//! Both read a broker snapshot; neither touches live broker state. When a
//! token is configured, requests must carry `Authorization: Bearer <token>`.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::broker::BrokerHandle;
use crate::broker::track::Position;
use crate::utils::error::HubError;

#[derive(Clone)]
struct AdminState {
    broker: BrokerHandle,
    token: Option<Arc<str>>,
}

pub fn router(broker: BrokerHandle, token: Option<String>) -> Router {
    let state = AdminState {
        broker,
        token: token.map(Arc::from),
    };

    Router::new()
        .route("/debug", get(debug))
        .route("/export", get(export))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token))
        .with_state(state)
}

/// Bind `addr` and serve the admin routes.
pub async fn start_admin_server(
    addr: String,
    broker: BrokerHandle,
    token: Option<String>,
) -> Result<(), HubError> {
    let listener = TcpListener::bind(&addr).await?;
    info!("admin endpoints listening on http://{addr}");
    axum::serve(listener, router(broker, token)).await?;
    Ok(())
}

async fn require_token(State(state): State<AdminState>, request: Request, next: Next) -> Response {
    if let Some(expected) = state.token.as_deref() {
        let presented = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        if presented != Some(expected) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }
    next.run(request).await
}

async fn debug(State(state): State<AdminState>) -> Result<String, AdminError> {
    Ok(state.broker.debug_report().await?)
}

async fn export(
    State(state): State<AdminState>,
) -> Result<Json<BTreeMap<String, Vec<Position>>>, AdminError> {
    Ok(Json(state.broker.export_tracks().await?))
}

struct AdminError(HubError);

impl From<HubError> for AdminError {
    fn from(e: HubError) -> Self {
        Self(e)
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        error!("admin request failed: {}", self.0);
        (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string()).into_response()
    }
}
