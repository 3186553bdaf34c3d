use std::sync::Arc;

use crate::auth::JwtKeys;
use crate::config::AppConfig;
use crate::db;
use crate::movies::{
    memory::MemoryMovieStore,
    repo::{MovieStore, PgMovieStore},
    repo_types::Movie,
};
use crate::users::{
    memory::MemoryUserStore,
    repo::{PgUserStore, UserStore},
};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub movies: Arc<dyn MovieStore>,
    pub config: Arc<AppConfig>,
    pub jwt: JwtKeys,
}

impl AppState {
    /// Connects to PostgreSQL when `DATABASE_URL` is set, otherwise falls back to
    /// empty in-memory stores.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let Some(url) = config.database_url.clone() else {
            tracing::warn!("DATABASE_URL not set; using in-memory stores");
            return Self::in_memory(config, Vec::new());
        };

        let timeout = config.store_timeout();
        let pool = db::connect(&url, timeout).await?;
        db::migrate(&pool).await?;

        let users = Arc::new(PgUserStore::new(pool.clone(), timeout)) as Arc<dyn UserStore>;
        let movies = Arc::new(PgMovieStore::new(pool, timeout)) as Arc<dyn MovieStore>;
        Self::from_parts(users, movies, config)
    }

    pub fn in_memory(config: AppConfig, movies: Vec<Movie>) -> anyhow::Result<Self> {
        let users = Arc::new(MemoryUserStore::new()) as Arc<dyn UserStore>;
        let movies = Arc::new(MemoryMovieStore::new(movies)) as Arc<dyn MovieStore>;
        Self::from_parts(users, movies, config)
    }

    pub fn from_parts(
        users: Arc<dyn UserStore>,
        movies: Arc<dyn MovieStore>,
        config: AppConfig,
    ) -> anyhow::Result<Self> {
        let jwt = JwtKeys::new(&config.jwt)?;
        Ok(Self {
            users,
            movies,
            config: Arc::new(config),
            jwt,
        })
    }
}
