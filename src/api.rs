//! Request-driven variant: a small HTTP interface that fetches a fresh
//! feed per request and answers with the aggregated departures for a stop.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::board::fetch_estimates;
use crate::config::Config;
use crate::departures::StopEstimates;
use crate::error::FeedError;
use crate::fetch::auth::ApiKey;
use crate::fetch::{BasicClient, HttpClient};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Shared handler state: the configuration plus an upstream client, which
/// is only present when the credential was available at startup. Requests
/// made without one get an error response instead of a crash.
#[derive(Clone)]
pub struct ApiState {
    config: Arc<Config>,
    client: Option<Arc<dyn HttpClient>>,
}

impl ApiState {
    pub fn new(config: Config) -> Self {
        let client = match config.require_api_key() {
            Ok(key) => ApiKey::x_api_key(BasicClient::new(), key)
                .map(|c| Arc::new(c) as Arc<dyn HttpClient>)
                .ok(),
            Err(e) => {
                warn!(error = %e, "Serving without an upstream credential");
                None
            }
        };
        ApiState {
            config: Arc::new(config),
            client,
        }
    }

    /// State with an explicit client, bypassing credential lookup.
    pub fn with_client(config: Config, client: Arc<dyn HttpClient>) -> Self {
        ApiState {
            config: Arc::new(config),
            client: Some(client),
        }
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/departures/{stop_id}", get(stop_departures))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn stop_departures(
    Path(stop_id): Path<String>,
    State(state): State<ApiState>,
) -> Result<Json<StopEstimates>, (StatusCode, Json<ErrorResponse>)> {
    let Some(client) = &state.client else {
        let err = FeedError::MissingCredential(crate::config::API_KEY_ENV);
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: err.to_string(),
            }),
        ));
    };

    let estimates = fetch_estimates(
        client.as_ref(),
        &state.config.feed_url,
        &stop_id,
        state.config.horizon_secs,
    )
    .await
    .map_err(|e| {
        (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
    })?;

    Ok(Json(estimates))
}
