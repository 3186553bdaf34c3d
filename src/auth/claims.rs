use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use crate::users::repo_types::{birthday_format, User};

/// Copy of the public user record taken when the token was minted.
/// Only `id` is trusted afterwards; the rest may be stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(with = "birthday_format::option", default)]
    pub birthday: Option<Date>,
    pub favorite_movies: Vec<Uuid>,
}

impl From<&User> for UserSnapshot {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
            email: u.email.clone(),
            birthday: u.birthday,
            favorite_movies: u.favorite_movies.clone(),
        }
    }
}

/// JWT payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,        // username
    pub iat: usize,         // issued at (unix timestamp)
    pub exp: usize,         // expires at (unix timestamp)
    pub user: UserSnapshot, // embedded at issuance
}
