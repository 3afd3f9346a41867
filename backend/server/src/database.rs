//! # Redis
//!
//! Document store for raffles, users and login sessions.
//!
//! ## Layout
//!
//! - `raffle:<id>` hash: `doc` holds the raffle JSON, `rev` a counter bumped on every write
//! - `raffles` set: every raffle id, scanned by listings and the scheduled draw
//! - `user:<id>` string: user JSON
//! - `users:email` hash: email to user id, written with HSETNX so emails stay unique.
//!   The reservation and `user:<id>` are written by one script, never one without the other
//! - `session:<token>` string: user id, expires with the session TTL
//!
//! ## Conditional writes
//!
//! Raffle writes go through a Lua script comparing `rev` before replacing `doc`.
//! Redis runs scripts atomically, so two draws racing on the same raffle cannot
//! both commit: the loser sees a moved revision, reloads, and finds the winner set.
use std::time::Duration;

use async_trait::async_trait;
use documents::{raffle::Raffle, user::User};
use redis::{
    AsyncCommands, Client, RedisError, Script,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use uuid::Uuid;

use crate::{
    error::AppError,
    store::{Store, Versioned, new_session_token},
};

pub const RAFFLE_IDS: &str = "raffles";
pub const USER_EMAILS: &str = "users:email";

const DOC_FIELD: &str = "doc";
const REV_FIELD: &str = "rev";

const SWAP_SCRIPT: &str = r#"
    local current = redis.call('HGET', KEYS[1], 'rev')
    if not current then
        return -1
    end
    if current ~= ARGV[1] then
        return 0
    end
    redis.call('HSET', KEYS[1], 'doc', ARGV[2], 'rev', tostring(tonumber(ARGV[1]) + 1))
    return 1
"#;

const INSERT_USER_SCRIPT: &str = r#"
    if redis.call('HSETNX', KEYS[1], ARGV[1], ARGV[2]) == 0 then
        return 0
    end
    redis.call('SET', KEYS[2], ARGV[3])
    return 1
"#;

pub async fn init_redis(redis_url: &str) -> Result<ConnectionManager, RedisError> {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(500));

    let client = Client::open(redis_url)?;
    client.get_connection_manager_with_config(config).await
}

pub fn raffle_key(id: Uuid) -> String {
    format!("raffle:{id}")
}

pub fn user_key(id: Uuid) -> String {
    format!("user:{id}")
}

pub fn session_key(token: &str) -> String {
    format!("session:{token}")
}

fn raffle_keys(ids: &[String]) -> Result<Vec<String>, AppError> {
    ids.iter()
        .map(|id| -> Result<String, AppError> { Ok(raffle_key(Uuid::parse_str(id)?)) })
        .collect()
}

pub struct RedisStore {
    connection: ConnectionManager,
    swap: Script,
    insert_user: Script,
}

impl RedisStore {
    pub fn new(connection: ConnectionManager) -> Self {
        Self {
            connection,
            swap: Script::new(SWAP_SCRIPT),
            insert_user: Script::new(INSERT_USER_SCRIPT),
        }
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn insert_raffle(&self, raffle: &Raffle) -> Result<(), AppError> {
        let mut connection = self.connection.clone();
        let doc = serde_json::to_string(raffle)?;

        redis::pipe()
            .atomic()
            .hset_multiple(
                raffle_key(raffle.id),
                &[(DOC_FIELD, doc), (REV_FIELD, "0".to_string())],
            )
            .sadd(RAFFLE_IDS, raffle.id.to_string())
            .query_async::<()>(&mut connection)
            .await?;

        Ok(())
    }

    async fn load_raffle(&self, id: Uuid) -> Result<Option<Versioned<Raffle>>, AppError> {
        let mut connection = self.connection.clone();

        let (doc, revision): (Option<String>, Option<u64>) = redis::cmd("HMGET")
            .arg(raffle_key(id))
            .arg(DOC_FIELD)
            .arg(REV_FIELD)
            .query_async(&mut connection)
            .await?;

        match (doc, revision) {
            (Some(doc), Some(revision)) => Ok(Some(Versioned {
                revision,
                doc: serde_json::from_str(&doc)?,
            })),
            _ => Ok(None),
        }
    }

    async fn list_raffles(&self) -> Result<Vec<Raffle>, AppError> {
        let mut connection = self.connection.clone();
        let ids: Vec<String> = connection.smembers(RAFFLE_IDS).await?;

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        for key in raffle_keys(&ids)? {
            pipe.hget(key, DOC_FIELD);
        }
        let docs: Vec<Option<String>> = pipe.query_async(&mut connection).await?;

        docs.into_iter()
            .flatten()
            .map(|doc| serde_json::from_str(&doc).map_err(AppError::from))
            .collect()
    }

    async fn swap_raffle(
        &self,
        id: Uuid,
        revision: u64,
        raffle: &Raffle,
    ) -> Result<bool, AppError> {
        let mut connection = self.connection.clone();
        let doc = serde_json::to_string(raffle)?;

        let swapped: i64 = self
            .swap
            .key(raffle_key(id))
            .arg(revision.to_string())
            .arg(doc)
            .invoke_async(&mut connection)
            .await?;

        Ok(swapped == 1)
    }

    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        let mut connection = self.connection.clone();

        let doc = serde_json::to_string(user)?;

        let inserted: i64 = self
            .insert_user
            .key(USER_EMAILS)
            .key(user_key(user.id))
            .arg(&user.email)
            .arg(user.id.to_string())
            .arg(doc)
            .invoke_async(&mut connection)
            .await?;

        if inserted == 0 {
            return Err(AppError::EmailTaken);
        }

        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let mut connection = self.connection.clone();
        let doc: Option<String> = connection.get(user_key(id)).await?;

        doc.map(|doc| serde_json::from_str(&doc).map_err(AppError::from))
            .transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let mut connection = self.connection.clone();
        let id: Option<String> = connection.hget(USER_EMAILS, email).await?;

        match id {
            Some(id) => self.get_user(Uuid::parse_str(&id)?).await,
            None => Ok(None),
        }
    }

    async fn create_session(&self, user_id: Uuid, ttl: Duration) -> Result<String, AppError> {
        let mut connection = self.connection.clone();
        let token = new_session_token();

        connection
            .set_ex::<_, _, ()>(session_key(&token), user_id.to_string(), ttl.as_secs().max(1))
            .await?;

        Ok(token)
    }

    async fn session_user(&self, token: &str) -> Result<Option<Uuid>, AppError> {
        let mut connection = self.connection.clone();
        let id: Option<String> = connection.get(session_key(token)).await?;

        Ok(id.map(|id| Uuid::parse_str(&id)).transpose()?)
    }

    async fn delete_session(&self, token: &str) -> Result<(), AppError> {
        let mut connection = self.connection.clone();
        connection.del::<_, ()>(session_key(token)).await?;

        Ok(())
    }
}
