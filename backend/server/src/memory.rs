use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use documents::{raffle::Raffle, user::User};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::AppError,
    store::{Store, Versioned, new_session_token},
};

/// Process-local store for tests and single-node demos.
#[derive(Default)]
pub struct MemoryStore {
    raffles: RwLock<HashMap<Uuid, Versioned<Raffle>>>,
    users: RwLock<HashMap<Uuid, User>>,
    sessions: RwLock<HashMap<String, (Uuid, Instant)>>,
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_raffle(&self, raffle: &Raffle) -> Result<(), AppError> {
        self.raffles.write().await.insert(
            raffle.id,
            Versioned {
                revision: 0,
                doc: raffle.clone(),
            },
        );

        Ok(())
    }

    async fn load_raffle(&self, id: Uuid) -> Result<Option<Versioned<Raffle>>, AppError> {
        Ok(self.raffles.read().await.get(&id).cloned())
    }

    async fn list_raffles(&self) -> Result<Vec<Raffle>, AppError> {
        Ok(self
            .raffles
            .read()
            .await
            .values()
            .map(|versioned| versioned.doc.clone())
            .collect())
    }

    async fn swap_raffle(
        &self,
        id: Uuid,
        revision: u64,
        raffle: &Raffle,
    ) -> Result<bool, AppError> {
        let mut raffles = self.raffles.write().await;

        match raffles.get_mut(&id) {
            Some(current) if current.revision == revision => {
                current.revision += 1;
                current.doc = raffle.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        let mut users = self.users.write().await;

        if users.values().any(|existing| existing.email == user.email) {
            return Err(AppError::EmailTaken);
        }

        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn create_session(&self, user_id: Uuid, ttl: Duration) -> Result<String, AppError> {
        let token = new_session_token();

        self.sessions
            .write()
            .await
            .insert(token.clone(), (user_id, Instant::now() + ttl));

        Ok(token)
    }

    async fn session_user(&self, token: &str) -> Result<Option<Uuid>, AppError> {
        let mut sessions = self.sessions.write().await;

        match sessions.get(token).copied() {
            Some((user_id, expires_at)) if expires_at > Instant::now() => Ok(Some(user_id)),
            Some(_) => {
                sessions.remove(token);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete_session(&self, token: &str) -> Result<(), AppError> {
        self.sessions.write().await.remove(token);
        Ok(())
    }
}
