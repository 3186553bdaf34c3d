use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse},
        services::verify_credentials,
    },
    error::{AppError, AppResult},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<LoginResponse>> {
    // A body without both credentials fails like a wrong password.
    let Json(payload) = payload.map_err(|e| {
        warn!(error = %e, "login body rejected");
        AppError::InvalidCredentials
    })?;

    let user = verify_credentials(state.users.as_ref(), &payload.username, &payload.password)
        .await?;

    let token = state.jwt.sign(&user).map_err(AppError::internal)?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(LoginResponse { user, token }))
}
