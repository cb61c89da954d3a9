//! HTTP surface: `/health`, `/predict` and `/predict/batch`.
//!
//! Every per-request failure is turned into a JSON body here. Nothing below
//! this layer knows about status codes.

use std::future::Future;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::common::error::{ErrorCode, PremiumError, PremiumResult};
use crate::features::service as features;
use crate::inference::domain::{ModelState, Prediction};
use crate::inference::service as inference;

pub const MODEL_NOT_INITIALIZED: &str = "Model not initialized";
pub const PREDICTION_FAILED: &str = "Prediction failed";
pub const INVALID_BODY: &str = "Invalid JSON body";
pub const BODY_TOO_LARGE: &str = "Request body too large";

#[derive(Clone, Debug)]
pub struct HttpState {
    pub model: ModelState,
    pub max_body_bytes: usize,
}

impl HttpState {
    pub fn new(model: ModelState, max_body_bytes: usize) -> Self {
        Self {
            model,
            max_body_bytes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictResponse {
    pub premium_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchPredictResponse {
    pub premium_prices: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug)]
pub struct HttpErr {
    pub(crate) status: StatusCode,
    pub(crate) response: ErrorResponse,
}

impl HttpErr {
    fn new(status: StatusCode, error: impl Into<String>, details: Option<String>) -> Self {
        Self {
            status,
            response: ErrorResponse {
                error: error.into(),
                details,
            },
        }
    }
}

impl From<PremiumError> for HttpErr {
    fn from(err: PremiumError) -> Self {
        match err {
            PremiumError::NotInitialized => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                MODEL_NOT_INITIALIZED,
                None,
            ),
            PremiumError::MissingKey(_) => {
                Self::new(StatusCode::BAD_REQUEST, err.to_string(), None)
            }
            PremiumError::InvalidBody(msg) => {
                Self::new(StatusCode::BAD_REQUEST, INVALID_BODY, Some(msg))
            }
            PremiumError::BodyTooLarge { .. } => Self::new(
                StatusCode::PAYLOAD_TOO_LARGE,
                BODY_TOO_LARGE,
                Some(err.to_string()),
            ),
            PremiumError::InvalidField { .. } | PremiumError::Inference(_) => Self::new(
                StatusCode::BAD_REQUEST,
                PREDICTION_FAILED,
                Some(err.to_string()),
            ),
            other => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                PREDICTION_FAILED,
                Some(other.to_string()),
            ),
        }
    }
}

impl IntoResponse for HttpErr {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/predict", post(predict))
        .route("/predict/batch", post(predict_batch))
        .layer(DefaultBodyLimit::max(state.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(
    listener: tokio::net::TcpListener,
    state: HttpState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(
            ev = "listening",
            %addr,
            model_loaded = state.model.is_loaded(),
            "premium prediction service ready"
        );
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn health(State(state): State<HttpState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        model_loaded: state.model.is_loaded(),
    })
}

async fn predict(
    State(state): State<HttpState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let started = Instant::now();
    match read_body(&state, body).and_then(|body| predict_impl(&state, &body)) {
        Ok(prediction) => {
            info!(
                ev = "predict",
                code = ErrorCode::Ok.as_u32(),
                dur_ms = started.elapsed().as_millis() as u64,
                premium_price = prediction.premium_price,
                "prediction served"
            );
            (
                StatusCode::OK,
                Json(PredictResponse {
                    premium_price: prediction.premium_price,
                }),
            )
                .into_response()
        }
        Err(err) => reject("predict", started, err).into_response(),
    }
}

async fn predict_batch(
    State(state): State<HttpState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let started = Instant::now();
    match read_body(&state, body).and_then(|body| predict_batch_impl(&state, &body)) {
        Ok(predictions) => {
            info!(
                ev = "predict_batch",
                code = ErrorCode::Ok.as_u32(),
                dur_ms = started.elapsed().as_millis() as u64,
                records = predictions.len(),
                "batch prediction served"
            );
            (
                StatusCode::OK,
                Json(BatchPredictResponse {
                    premium_prices: predictions.iter().map(|p| p.premium_price).collect(),
                }),
            )
                .into_response()
        }
        Err(err) => reject("predict_batch", started, err).into_response(),
    }
}

/// Accept the buffered body once the model is known to be available.
///
/// A degraded service answers 500 whatever was sent, including bodies over
/// the size limit.
fn read_body(state: &HttpState, body: Result<Bytes, BytesRejection>) -> PremiumResult<Bytes> {
    state.model.pipeline().ok_or(PremiumError::NotInitialized)?;
    body.map_err(|rejection| body_error(state.max_body_bytes, &rejection))
}

fn body_error(limit: usize, rejection: &BytesRejection) -> PremiumError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        PremiumError::BodyTooLarge { limit }
    } else {
        PremiumError::InvalidBody(rejection.body_text())
    }
}

pub(crate) fn predict_impl(state: &HttpState, body: &[u8]) -> PremiumResult<Prediction> {
    let pipeline = state.model.pipeline().ok_or(PremiumError::NotInitialized)?;
    let input = features::object_from_slice(body);
    let record = features::extract(&input)?;
    inference::infer(pipeline, &record)
}

pub(crate) fn predict_batch_impl(state: &HttpState, body: &[u8]) -> PremiumResult<Vec<Prediction>> {
    let pipeline = state.model.pipeline().ok_or(PremiumError::NotInitialized)?;
    let inputs = features::objects_from_slice(body)?;
    let records = inputs
        .iter()
        .enumerate()
        .map(|(idx, input)| {
            features::extract(input).map_err(|err| match err {
                PremiumError::InvalidField { field, reason } => PremiumError::InvalidField {
                    field,
                    reason: format!("{reason} (record {idx})"),
                },
                other => other,
            })
        })
        .collect::<PremiumResult<Vec<_>>>()?;
    inference::batch_infer(pipeline, &records)
}

fn reject(ev: &'static str, started: Instant, err: PremiumError) -> HttpErr {
    let dur_ms = started.elapsed().as_millis() as u64;
    let code = err.code().as_u32();
    match err.code() {
        ErrorCode::InferenceFailure | ErrorCode::ServiceUnavailable => {
            error!(ev, code, dur_ms, error = %err, "prediction failed")
        }
        _ => warn!(ev, code, dur_ms, error = %err, "prediction rejected"),
    }
    HttpErr::from(err)
}
