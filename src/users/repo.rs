use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{bounded, StoreError};
use crate::users::repo_types::{NewUser, User, UserChanges};

/// Persistence operations over user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn list(&self) -> Result<Vec<User>, StoreError>;
    /// Fails with `StoreError::Conflict` when the username is taken.
    async fn create(&self, new: NewUser) -> Result<User, StoreError>;
    /// Returns `None` when no user is named `username`.
    async fn update(&self, username: &str, changes: UserChanges)
        -> Result<Option<User>, StoreError>;
    /// Returns `false` when no user is named `username`.
    async fn delete(&self, username: &str) -> Result<bool, StoreError>;
    /// Adds `movie_id` unless already present. `None` when the user is missing.
    async fn add_favorite(&self, username: &str, movie_id: Uuid)
        -> Result<Option<User>, StoreError>;
    /// Removes every occurrence of `movie_id`. `None` when the user is missing.
    async fn remove_favorite(&self, username: &str, movie_id: Uuid)
        -> Result<Option<User>, StoreError>;
}

const USER_COLUMNS: &str =
    "id, username, password_hash, email, birthday, favorite_movies, created_at";

pub struct PgUserStore {
    db: PgPool,
    timeout: Duration,
}

impl PgUserStore {
    pub fn new(db: PgPool, timeout: Duration) -> Self {
        Self { db, timeout }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        bounded(self.timeout, async {
            Ok::<_, StoreError>(sqlx::query_as::<_, User>(&sql)
                .bind(username)
                .fetch_optional(&self.db)
                .await?)
        })
        .await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        bounded(self.timeout, async {
            Ok::<_, StoreError>(sqlx::query_as::<_, User>(&sql)
                .bind(id)
                .fetch_optional(&self.db)
                .await?)
        })
        .await
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC");
        bounded(self.timeout, async {
            Ok::<_, StoreError>(sqlx::query_as::<_, User>(&sql).fetch_all(&self.db).await?)
        })
        .await
    }

    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO users (id, username, password_hash, email, birthday)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        );
        bounded(self.timeout, async {
            sqlx::query_as::<_, User>(&sql)
                .bind(Uuid::new_v4())
                .bind(&new.username)
                .bind(&new.password_hash)
                .bind(&new.email)
                .bind(new.birthday)
                .fetch_one(&self.db)
                .await
                .map_err(|e| StoreError::from_sqlx(e, &new.username))
        })
        .await
    }

    async fn update(
        &self,
        username: &str,
        changes: UserChanges,
    ) -> Result<Option<User>, StoreError> {
        let sql = format!(
            r#"
            UPDATE users
               SET username = $2, password_hash = $3, email = $4, birthday = $5
             WHERE username = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        bounded(self.timeout, async {
            sqlx::query_as::<_, User>(&sql)
                .bind(username)
                .bind(&changes.username)
                .bind(&changes.password_hash)
                .bind(&changes.email)
                .bind(changes.birthday)
                .fetch_optional(&self.db)
                .await
                .map_err(|e| StoreError::from_sqlx(e, &changes.username))
        })
        .await
    }

    async fn delete(&self, username: &str) -> Result<bool, StoreError> {
        bounded(self.timeout, async {
            let res = sqlx::query("DELETE FROM users WHERE username = $1")
                .bind(username)
                .execute(&self.db)
                .await?;
            Ok::<_, StoreError>(res.rows_affected() > 0)
        })
        .await
    }

    async fn add_favorite(
        &self,
        username: &str,
        movie_id: Uuid,
    ) -> Result<Option<User>, StoreError> {
        let sql = format!(
            r#"
            UPDATE users
               SET favorite_movies = CASE
                   WHEN $2 = ANY(favorite_movies) THEN favorite_movies
                   ELSE array_append(favorite_movies, $2)
               END
             WHERE username = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        bounded(self.timeout, async {
            Ok::<_, StoreError>(sqlx::query_as::<_, User>(&sql)
                .bind(username)
                .bind(movie_id)
                .fetch_optional(&self.db)
                .await?)
        })
        .await
    }

    async fn remove_favorite(
        &self,
        username: &str,
        movie_id: Uuid,
    ) -> Result<Option<User>, StoreError> {
        let sql = format!(
            r#"
            UPDATE users
               SET favorite_movies = array_remove(favorite_movies, $2)
             WHERE username = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        bounded(self.timeout, async {
            Ok::<_, StoreError>(sqlx::query_as::<_, User>(&sql)
                .bind(username)
                .bind(movie_id)
                .fetch_optional(&self.db)
                .await?)
        })
        .await
    }
}
