use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use tracing::{debug, error, info, instrument, warn};

use crate::{
    error::{AppError, ErrorKind, ValidationError},
    signups::{
        dto::{CreatedSignupResponse, SignupListResponse, SignupRequest},
        services,
    },
    state::AppState,
};

pub fn signup_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(create_signup))
        .route("/signups", get(list_signups))
}

fn failure(state: &AppState, err: AppError, op: &str) -> Response {
    match err.kind() {
        ErrorKind::Validation | ErrorKind::Conflict => warn!(error = %err, op, "request rejected"),
        ErrorKind::SchemaMissing => {
            error!(error = ?err, op, "signups table missing; run the migrations")
        }
        ErrorKind::DatastoreUnavailable => error!(error = ?err, op, "database unreachable"),
        ErrorKind::Internal => error!(error = ?err, op, "request failed"),
    }
    err.into_response_with(state.config.expose_error_details)
}

#[instrument(skip(state, payload))]
pub async fn create_signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedSignupResponse>), Response> {
    let Json(req) = payload.map_err(|rejection| {
        let err = ValidationError::MalformedBody(rejection.body_text());
        failure(&state, err.into(), "create_signup")
    })?;
    debug!(?req, "signup received");

    match services::create_signup(state.signups.as_ref(), &req).await {
        Ok(signup) => {
            info!(id = %signup.id, "signup created");
            Ok((StatusCode::CREATED, Json(CreatedSignupResponse::new(signup))))
        }
        Err(e) => Err(failure(&state, e, "create_signup")),
    }
}

#[instrument(skip(state))]
pub async fn list_signups(
    State(state): State<AppState>,
) -> Result<Json<SignupListResponse>, Response> {
    let rows = services::list_signups(state.signups.as_ref())
        .await
        .map_err(|e| failure(&state, e, "list_signups"))?;
    Ok(Json(rows.into()))
}
