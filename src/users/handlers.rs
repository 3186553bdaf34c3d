use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{password::hash_password, AuthUser},
    error::{AppError, AppResult},
    extract::{JsonBody, PathParams},
    state::AppState,
    users::{
        dto::{MessageResponse, UserPayload},
        repo_types::{NewUser, User, UserChanges},
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register).get(list_users))
        .route(
            "/users/:username",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route(
            "/users/favorites/:username/:movie_id",
            post(add_favorite).delete(remove_favorite),
        )
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<UserPayload>,
) -> AppResult<(StatusCode, Json<User>)> {
    if let Err(errors) = payload.validate() {
        warn!(count = errors.len(), "registration rejected by validation");
        return Err(AppError::Validation(errors));
    }

    // Friendly pre-check; the store's unique constraint has the final word.
    if state.users.find_by_username(&payload.username).await?.is_some() {
        warn!(username = %payload.username, "username already registered");
        return Err(AppError::Conflict(format!(
            "{} already exists",
            payload.username
        )));
    }

    let password_hash = hash_password(&payload.password).map_err(AppError::internal)?;
    let user = state
        .users
        .create(NewUser {
            username: payload.username,
            password_hash,
            email: payload.email.trim().to_string(),
            birthday: payload.birthday,
        })
        .await?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, _caller))]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
) -> AppResult<Json<Vec<User>>> {
    Ok(Json(state.users.list().await?))
}

#[instrument(skip(state, _caller))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    PathParams(username): PathParams<String>,
) -> AppResult<Json<User>> {
    state
        .users
        .find_by_username(&username)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(&username))
}

#[instrument(skip(state, caller, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    PathParams(username): PathParams<String>,
    JsonBody(payload): JsonBody<UserPayload>,
) -> AppResult<Json<User>> {
    if let Err(errors) = payload.validate() {
        warn!(count = errors.len(), "profile update rejected by validation");
        return Err(AppError::Validation(errors));
    }

    let password_hash = hash_password(&payload.password).map_err(AppError::internal)?;
    let user = state
        .users
        .update(
            &username,
            UserChanges {
                username: payload.username,
                password_hash,
                email: payload.email.trim().to_string(),
                birthday: payload.birthday,
            },
        )
        .await?
        .ok_or_else(|| not_found(&username))?;

    info!(user_id = %user.id, caller_id = %caller.id, "user updated");
    Ok(Json(user))
}

#[instrument(skip(state, caller))]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    PathParams(username): PathParams<String>,
) -> AppResult<Json<MessageResponse>> {
    if !state.users.delete(&username).await? {
        return Err(not_found(&username));
    }
    info!(%username, caller_id = %caller.id, "user deleted");
    Ok(Json(MessageResponse::new(format!("{username} was deleted"))))
}

#[instrument(skip(state, _caller))]
pub async fn add_favorite(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    PathParams((username, movie_id)): PathParams<(String, Uuid)>,
) -> AppResult<Json<MessageResponse>> {
    if state.movies.find_by_id(movie_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "Movie with ID {movie_id} was not found"
        )));
    }
    state
        .users
        .add_favorite(&username, movie_id)
        .await?
        .ok_or_else(|| not_found(&username))?;

    Ok(Json(MessageResponse::new(format!(
        "Movie with ID {movie_id} was added"
    ))))
}

#[instrument(skip(state, _caller))]
pub async fn remove_favorite(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    PathParams((username, movie_id)): PathParams<(String, Uuid)>,
) -> AppResult<Json<MessageResponse>> {
    state
        .users
        .remove_favorite(&username, movie_id)
        .await?
        .ok_or_else(|| not_found(&username))?;

    Ok(Json(MessageResponse::new(format!(
        "Movie with ID {movie_id} was deleted"
    ))))
}

fn not_found(username: &str) -> AppError {
    AppError::NotFound(format!("{username} was not found"))
}
