use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::StoreError;
use crate::users::repo::UserStore;
use crate::users::repo_types::{NewUser, User, UserChanges};

/// Process-local user store. Username uniqueness is checked under the write lock,
/// so concurrent duplicate inserts cannot both succeed.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn id_of(users: &HashMap<Uuid, User>, username: &str) -> Option<Uuid> {
    users
        .values()
        .find(|u| u.username == username)
        .map(|u| u.id)
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let mut all: Vec<User> = self.users.read().await.values().cloned().collect();
        all.sort_by_key(|u| u.created_at);
        Ok(all)
    }

    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if id_of(&users, &new.username).is_some() {
            return Err(StoreError::Conflict(new.username));
        }
        let user = User {
            id: Uuid::new_v4(),
            username: new.username,
            password_hash: new.password_hash,
            email: new.email,
            birthday: new.birthday,
            favorite_movies: Vec::new(),
            created_at: OffsetDateTime::now_utc(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(
        &self,
        username: &str,
        changes: UserChanges,
    ) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().await;
        let Some(id) = id_of(&users, username) else {
            return Ok(None);
        };
        if changes.username != username && id_of(&users, &changes.username).is_some() {
            return Err(StoreError::Conflict(changes.username));
        }
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        user.username = changes.username;
        user.password_hash = changes.password_hash;
        user.email = changes.email;
        user.birthday = changes.birthday;
        Ok(Some(user.clone()))
    }

    async fn delete(&self, username: &str) -> Result<bool, StoreError> {
        let mut users = self.users.write().await;
        match id_of(&users, username) {
            Some(id) => Ok(users.remove(&id).is_some()),
            None => Ok(false),
        }
    }

    async fn add_favorite(
        &self,
        username: &str,
        movie_id: Uuid,
    ) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().await;
        let user = users.values_mut().find(|u| u.username == username);
        Ok(user.map(|u| {
            if !u.favorite_movies.contains(&movie_id) {
                u.favorite_movies.push(movie_id);
            }
            u.clone()
        }))
    }

    async fn remove_favorite(
        &self,
        username: &str,
        movie_id: Uuid,
    ) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().await;
        let user = users.values_mut().find(|u| u.username == username);
        Ok(user.map(|u| {
            u.favorite_movies.retain(|m| *m != movie_id);
            u.clone()
        }))
    }
}
