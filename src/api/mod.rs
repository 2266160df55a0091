use axum::{
    Router,
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::post,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::{
    TintwaveError,
    models::{LocationQuery, WeatherRequest},
    weather::{AggregatedWeather, WeatherAggregator},
};

/// Body of every non-success reply
pub const SERVER_ERROR_MESSAGE: &str = "Server error";

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Clone)]
pub struct AppState {
    pub aggregator: WeatherAggregator,
}

impl AppState {
    pub fn new(aggregator: WeatherAggregator) -> Self {
        Self { aggregator }
    }
}

impl IntoResponse for TintwaveError {
    fn into_response(self) -> Response {
        let (status, message) = if self.is_client_error() {
            (StatusCode::BAD_REQUEST, self.user_message())
        } else {
            error!("Weather lookup failed: {self}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                SERVER_ERROR_MESSAGE.to_string(),
            )
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/weather", post(post_weather))
        .with_state(state)
}

async fn post_weather(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<AggregatedWeather>, TintwaveError> {
    let body = body.map_err(|e| TintwaveError::unexpected_payload(format!("request body: {e}")))?;
    let request: WeatherRequest = serde_json::from_slice(&body)
        .map_err(|e| TintwaveError::unexpected_payload(format!("request body: {e}")))?;
    let query = LocationQuery::try_from(request)?;

    info!("Weather lookup for {query}");
    let aggregated = state.aggregator.aggregate(&query).await?;
    Ok(Json(aggregated))
}
