use async_trait::async_trait;
use uuid::Uuid;

use crate::db::StoreError;
use crate::movies::repo::MovieStore;
use crate::movies::repo_types::Movie;

/// Fixed catalogue held in memory, ordered by title.
#[derive(Default)]
pub struct MemoryMovieStore {
    movies: Vec<Movie>,
}

impl MemoryMovieStore {
    pub fn new(mut movies: Vec<Movie>) -> Self {
        movies.sort_by(|a, b| a.title.cmp(&b.title));
        Self { movies }
    }

    fn first(&self, pred: impl Fn(&Movie) -> bool) -> Option<Movie> {
        self.movies.iter().find(|m| pred(m)).cloned()
    }
}

#[async_trait]
impl MovieStore for MemoryMovieStore {
    async fn list(&self) -> Result<Vec<Movie>, StoreError> {
        Ok(self.movies.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Movie>, StoreError> {
        Ok(self.first(|m| m.id == id))
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<Movie>, StoreError> {
        Ok(self.first(|m| m.title == title))
    }

    async fn find_by_genre(&self, name: &str) -> Result<Option<Movie>, StoreError> {
        Ok(self.first(|m| m.genre.name == name))
    }

    async fn find_by_director(&self, name: &str) -> Result<Option<Movie>, StoreError> {
        Ok(self.first(|m| m.director.name == name))
    }
}
