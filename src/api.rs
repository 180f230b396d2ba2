//! HTTP surface: `POST /api/predict` and `GET /healthz`.

use crate::error::{Result, SentimentError};
use crate::inference::SentimentService;
use crate::label::Sentiment;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{debug, error};

/// Route of the prediction endpoint.
pub const PREDICT_ROUTE: &str = "/api/predict";
/// Route of the liveness check.
pub const HEALTH_ROUTE: &str = "/healthz";

#[derive(Debug, Default, Deserialize)]
struct PredictRequest {
    #[serde(default)]
    review: String,
}

/// Successful prediction body.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PredictResponse {
    /// `"Positive"` or `"Negative"`.
    pub sentiment: Sentiment,
}

/// Error body.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    /// Human-readable message.
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

/// Builds the application router around a loaded service.
pub fn router(service: Arc<SentimentService>, cors: CorsLayer) -> Router {
    Router::new()
        .route(HEALTH_ROUTE, get(healthz))
        .route(PREDICT_ROUTE, post(predict_handler))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .with_state(service)
}

/// CORS policy for the given origins; `*` (or an empty list) allows any.
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let origins: Vec<&str> = origins
        .iter()
        .map(|origin| origin.trim())
        .filter(|origin| !origin.is_empty())
        .collect();
    let allow = if origins.is_empty() || origins.contains(&"*") {
        AllowOrigin::any()
    } else {
        let values = origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin).map_err(|_| {
                    SentimentError::Config(format!("invalid CORS origin {origin:?}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        AllowOrigin::list(values)
    };
    Ok(CorsLayer::new()
        .allow_origin(allow)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]))
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn predict_handler(
    State(service): State<Arc<SentimentService>>,
    body: Bytes,
) -> std::result::Result<Json<PredictResponse>, ApiError> {
    let start = Instant::now();
    let review = review_from_body(&body);
    match service.predict(&review) {
        Ok(prediction) => {
            debug!(
                sentiment = %prediction.sentiment,
                probability = prediction.probability,
                chars = review.chars().count(),
                latency_us = start.elapsed().as_micros() as u64,
                "prediction served"
            );
            Ok(Json(PredictResponse {
                sentiment: prediction.sentiment,
            }))
        }
        Err(SentimentError::EmptyReview) => {
            debug!("rejected empty review");
            Err(bad_request(SentimentError::EmptyReview.to_string()))
        }
        Err(err) => {
            error!(error = %err, "prediction failed");
            Err(internal_error(err))
        }
    }
}

/// Malformed JSON and a missing or non-string `review` all read as empty.
fn review_from_body(body: &[u8]) -> String {
    serde_json::from_slice::<PredictRequest>(body)
        .unwrap_or_default()
        .review
}

fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

fn internal_error(err: SentimentError) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
}
