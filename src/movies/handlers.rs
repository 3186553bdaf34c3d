use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use tracing::{debug, instrument};

use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
    extract::PathParams,
    movies::repo_types::{Director, Genre, Movie},
    state::AppState,
};

pub fn movie_routes() -> Router<AppState> {
    Router::new()
        .route("/movies", get(list_movies))
        .route("/movies/:title", get(get_movie))
        .route("/movies/genre/:name", get(get_genre))
        .route("/movies/director/:name", get(get_director))
}

#[instrument(skip(state, _user))]
pub async fn list_movies(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
) -> AppResult<Json<Vec<Movie>>> {
    let movies = state.movies.list().await?;
    debug!(count = movies.len(), "listed movies");
    Ok(Json(movies))
}

#[instrument(skip(state, _user))]
pub async fn get_movie(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    PathParams(title): PathParams<String>,
) -> AppResult<Json<Movie>> {
    state
        .movies
        .find_by_title(&title)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Movie {title} was not found")))
}

#[instrument(skip(state, _user))]
pub async fn get_genre(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    PathParams(name): PathParams<String>,
) -> AppResult<Json<Genre>> {
    state
        .movies
        .find_by_genre(&name)
        .await?
        .map(|m| Json(m.genre))
        .ok_or_else(|| AppError::NotFound(format!("Genre {name} was not found")))
}

#[instrument(skip(state, _user))]
pub async fn get_director(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    PathParams(name): PathParams<String>,
) -> AppResult<Json<Director>> {
    state
        .movies
        .find_by_director(&name)
        .await?
        .map(|m| Json(m.director))
        .ok_or_else(|| AppError::NotFound(format!("Director {name} was not found")))
}
