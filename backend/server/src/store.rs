//! # Document Store
//!
//! Raffles, users and sessions sit behind [`Store`] so handlers never know
//! whether Redis or the in-memory map is underneath.
//!
//! ## Writes
//! - Existing raffles are only ever written through [`Store::swap_raffle`]
//! - Every swap carries the revision it was read at, stale revisions are rejected
//! - [`modify_raffle`] wraps load + apply + swap and retries a bounded number of times
//! - An error from the apply step aborts before anything is written
use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use documents::{raffle::Raffle, user::User};
use tracing::warn;
use uuid::Uuid;

use crate::error::AppError;

pub const MAX_SWAP_ATTEMPTS: usize = 8;

#[derive(Debug, Clone)]
pub struct Versioned<T> {
    pub revision: u64,
    pub doc: T,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_raffle(&self, raffle: &Raffle) -> Result<(), AppError>;

    async fn load_raffle(&self, id: Uuid) -> Result<Option<Versioned<Raffle>>, AppError>;

    async fn list_raffles(&self) -> Result<Vec<Raffle>, AppError>;

    /// Replaces the raffle only if it is still at `revision`.
    async fn swap_raffle(&self, id: Uuid, revision: u64, raffle: &Raffle)
    -> Result<bool, AppError>;

    /// Fails with [`AppError::EmailTaken`] if the email is already registered.
    async fn insert_user(&self, user: &User) -> Result<(), AppError>;

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn create_session(&self, user_id: Uuid, ttl: Duration) -> Result<String, AppError>;

    async fn session_user(&self, token: &str) -> Result<Option<Uuid>, AppError>;

    async fn delete_session(&self, token: &str) -> Result<(), AppError>;
}

pub type SharedStore = Arc<dyn Store>;

pub async fn find_raffle(store: &dyn Store, id: Uuid) -> Result<Raffle, AppError> {
    store
        .load_raffle(id)
        .await?
        .map(|versioned| versioned.doc)
        .ok_or(AppError::NotFound("Raffle"))
}

/// Applies `apply` to the current raffle and commits it as one conditional write.
pub async fn modify_raffle<T, F>(
    store: &dyn Store,
    id: Uuid,
    mut apply: F,
) -> Result<(Raffle, T), AppError>
where
    F: FnMut(&mut Raffle) -> Result<T, AppError> + Send,
    T: Send,
{
    for attempt in 1..=MAX_SWAP_ATTEMPTS {
        let Versioned { revision, mut doc } = store
            .load_raffle(id)
            .await?
            .ok_or(AppError::NotFound("Raffle"))?;

        let value = apply(&mut doc)?;
        doc.updated_at = Utc::now();

        if store.swap_raffle(id, revision, &doc).await? {
            return Ok((doc, value));
        }

        warn!("Raffle {id} moved past revision {revision}, retrying ({attempt}/{MAX_SWAP_ATTEMPTS})");
    }

    Err(AppError::Conflict)
}

pub fn new_session_token() -> String {
    Uuid::new_v4().simple().to_string()
}
