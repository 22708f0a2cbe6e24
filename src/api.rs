//! HTTP API handlers for Footprint.
//!
//! A single-user local API exposing the calculator page's interactions:
//!
//! - `GET /health` - Health check
//! - `GET /session` - Current form, estimate, result and history
//! - `PUT /session/form` - Update form fields
//! - `POST /estimate` - Estimate an arbitrary form without touching the session
//! - `POST /calculate` - Submit the form to the calculation service
//! - `POST /history/refresh` - Re-fetch history
//! - `DELETE /history/:id` - Delete a history entry
//!
//! Failures of the calculation service are answered with `502 Bad Gateway`
//! and a body naming the failed operation:
//!
//! ```json
//! { "error": "Error calculating footprint", "detail": "calculate returned status 500 ..." }
//! ```

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument, warn};

use crate::app::{AppError, FootprintApp};
use crate::estimator::{EstimationResult, estimate};
use crate::model::ActivityForm;
use crate::session::{FormUpdate, SessionError, SessionView};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub footprint: FootprintApp,
}

/// Build the router with request tracing.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/session", get(get_session))
        .route("/session/form", put(put_form))
        .route("/estimate", post(post_estimate))
        .route("/calculate", post(post_calculate))
        .route("/history/refresh", post(post_refresh_history))
        .route("/history/:id", delete(delete_history_entry))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Error response of the API.
#[derive(Debug)]
pub struct ApiError(AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            AppError::Session(SessionError::SubmissionInFlight) => {
                (StatusCode::CONFLICT, self.0.to_string())
            }
            AppError::Session(_) => (StatusCode::UNPROCESSABLE_ENTITY, self.0.to_string()),
            AppError::Service(e) => (StatusCode::BAD_GATEWAY, e.operation().notice().to_string()),
            AppError::Task(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string()),
        };

        let body = Json(json!({ "error": message, "detail": self.0.to_string() }));
        (status, body).into_response()
    }
}

/// GET /health - Simple health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// GET /session - Everything the page displays.
pub async fn get_session(State(state): State<AppState>) -> Json<SessionView> {
    Json(state.footprint.view().await)
}

/// PUT /session/form - Update some or all form fields.
///
/// # Request Body
///
/// ```json
/// {
///     "carKilometers": "500",
///     "usesRenewableEnergy": true,
///     "month": 3
/// }
/// ```
///
/// Returns `422 Unprocessable Entity` for an invalid month, year or user id.
#[instrument(skip(state, update))]
pub async fn put_form(
    State(state): State<AppState>,
    Json(update): Json<FormUpdate>,
) -> Result<Json<SessionView>, ApiError> {
    match state.footprint.update_form(update).await {
        Ok(view) => Ok(Json(view)),
        Err(e) => {
            warn!(error = %e, "Rejected form update");
            Err(e.into())
        }
    }
}

/// POST /estimate - Estimate a form without changing the session.
pub async fn post_estimate(Json(form): Json<ActivityForm>) -> Json<EstimationResult> {
    Json(estimate(&form.to_activity()))
}

/// POST /calculate - Submit the current form.
///
/// Returns `409 Conflict` while another calculation is outstanding.
#[instrument(skip(state))]
pub async fn post_calculate(State(state): State<AppState>) -> Result<Json<SessionView>, ApiError> {
    let view = state.footprint.submit().await?;

    info!(
        total = ?view.resolved.total,
        source = ?view.resolved.source,
        "Calculation resolved"
    );
    Ok(Json(view))
}

/// POST /history/refresh - Re-fetch history from the calculation service.
#[instrument(skip(state))]
pub async fn post_refresh_history(
    State(state): State<AppState>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(state.footprint.refresh_history().await?))
}

/// DELETE /history/:id - Delete an entry and re-fetch history.
#[instrument(skip(state))]
pub async fn delete_history_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(state.footprint.delete_entry(&id).await?))
}
