use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Director {
    pub name: String,
    pub bio: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub genre: Genre,
    pub director: Director,
    pub actors: Vec<String>,
    pub image_path: Option<String>,
    pub featured: bool,
}

/// Flat row as stored in `movies`.
#[derive(Debug, FromRow)]
pub struct MovieRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub genre_name: String,
    pub genre_description: String,
    pub director_name: String,
    pub director_bio: String,
    pub actors: Vec<String>,
    pub image_path: Option<String>,
    pub featured: bool,
}

impl From<MovieRow> for Movie {
    fn from(r: MovieRow) -> Self {
        Self {
            id: r.id,
            title: r.title,
            description: r.description,
            genre: Genre {
                name: r.genre_name,
                description: r.genre_description,
            },
            director: Director {
                name: r.director_name,
                bio: r.director_bio,
            },
            actors: r.actors,
            image_path: r.image_path,
            featured: r.featured,
        }
    }
}
