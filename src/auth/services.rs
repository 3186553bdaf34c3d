use thiserror::Error;
use tracing::{debug, error, warn};

use crate::{
    auth::password::{verify_password, PasswordError},
    db::StoreError,
    error::AppError,
    users::{repo::UserStore, repo_types::User},
};

/// Why a credential check failed. Callers must not reveal which one happened.
#[derive(Debug, Error)]
pub enum AuthFailure {
    #[error("incorrect username")]
    UnknownUser,
    #[error("incorrect password")]
    BadPassword,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("stored password hash is unreadable")]
    CorruptHash(#[source] PasswordError),
}

impl From<AuthFailure> for AppError {
    fn from(f: AuthFailure) -> Self {
        match f {
            AuthFailure::UnknownUser | AuthFailure::BadPassword => AppError::InvalidCredentials,
            AuthFailure::Store(e) => AppError::Store(e),
            AuthFailure::CorruptHash(e) => AppError::internal(e),
        }
    }
}

/// Looks `username` up by exact match and checks `password` against its hash.
pub async fn verify_credentials(
    users: &dyn UserStore,
    username: &str,
    password: &str,
) -> Result<User, AuthFailure> {
    let Some(user) = users.find_by_username(username).await? else {
        warn!(%username, "login unknown username");
        return Err(AuthFailure::UnknownUser);
    };

    let ok = verify_password(password, &user.password_hash).map_err(|e| {
        error!(user_id = %user.id, error = %e, "stored hash could not be parsed");
        AuthFailure::CorruptHash(e)
    })?;
    if !ok {
        warn!(%username, user_id = %user.id, "login invalid password");
        return Err(AuthFailure::BadPassword);
    }

    debug!(user_id = %user.id, "credentials verified");
    Ok(user)
}
