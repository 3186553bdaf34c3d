use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{bounded, StoreError};
use crate::movies::repo_types::{Movie, MovieRow};

/// Read access to the movie catalogue.
#[async_trait]
pub trait MovieStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Movie>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Movie>, StoreError>;
    async fn find_by_title(&self, title: &str) -> Result<Option<Movie>, StoreError>;
    /// First movie whose genre is named `name`.
    async fn find_by_genre(&self, name: &str) -> Result<Option<Movie>, StoreError>;
    /// First movie directed by `name`.
    async fn find_by_director(&self, name: &str) -> Result<Option<Movie>, StoreError>;
}

const MOVIE_COLUMNS: &str = "id, title, description, genre_name, genre_description, \
     director_name, director_bio, actors, image_path, featured";

pub struct PgMovieStore {
    db: PgPool,
    timeout: Duration,
}

impl PgMovieStore {
    pub fn new(db: PgPool, timeout: Duration) -> Self {
        Self { db, timeout }
    }

    async fn find_one(&self, filter: &str, value: &str) -> Result<Option<Movie>, StoreError> {
        let sql = format!(
            "SELECT {MOVIE_COLUMNS} FROM movies WHERE {filter} = $1 ORDER BY title ASC LIMIT 1"
        );
        bounded(self.timeout, async {
            let row = sqlx::query_as::<_, MovieRow>(&sql)
                .bind(value)
                .fetch_optional(&self.db)
                .await?;
            Ok::<_, StoreError>(row.map(Movie::from))
        })
        .await
    }
}

#[async_trait]
impl MovieStore for PgMovieStore {
    async fn list(&self) -> Result<Vec<Movie>, StoreError> {
        let sql = format!("SELECT {MOVIE_COLUMNS} FROM movies ORDER BY title ASC");
        bounded(self.timeout, async {
            let rows = sqlx::query_as::<_, MovieRow>(&sql)
                .fetch_all(&self.db)
                .await?;
            Ok::<_, StoreError>(rows.into_iter().map(Movie::from).collect())
        })
        .await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Movie>, StoreError> {
        let sql = format!("SELECT {MOVIE_COLUMNS} FROM movies WHERE id = $1");
        bounded(self.timeout, async {
            let row = sqlx::query_as::<_, MovieRow>(&sql)
                .bind(id)
                .fetch_optional(&self.db)
                .await?;
            Ok::<_, StoreError>(row.map(Movie::from))
        })
        .await
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<Movie>, StoreError> {
        self.find_one("title", title).await
    }

    async fn find_by_genre(&self, name: &str) -> Result<Option<Movie>, StoreError> {
        self.find_one("genre_name", name).await
    }

    async fn find_by_director(&self, name: &str) -> Result<Option<Movie>, StoreError> {
        self.find_one("director_name", name).await
    }
}
