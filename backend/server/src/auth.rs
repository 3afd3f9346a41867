//! # Sessions
//!
//! Login hands out an opaque token in the `sid` cookie, the store maps it back to a user id.
//!
//! Extractors, from weakest to strongest:
//! - [`MaybeUser`]: whoever the cookie points at, if anyone
//! - [`RequireUser`]: 401 without a live session
//! - [`RequireHolder`]: 401 without a session, 403 unless the user holds raffles
use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::COOKIE, request::Parts},
};
use bcrypt::{hash, verify};
use documents::user::User;
use tokio::task::spawn_blocking;
use tracing::info;
use uuid::Uuid;

use crate::{config::Config, error::AppError, state::AppState, store::Store};

pub const SESSION_COOKIE: &str = "sid";

const BCRYPT_COST: u32 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub is_raffle_holder: bool,
}

pub async fn register(store: &dyn Store, registration: Registration) -> Result<User, AppError> {
    if store
        .find_user_by_email(&registration.email)
        .await?
        .is_some()
    {
        return Err(AppError::EmailTaken);
    }

    let password = registration.password;
    let password_hash = spawn_blocking(move || hash(password, BCRYPT_COST)).await??;

    let user = User {
        id: Uuid::new_v4(),
        name: registration.name,
        email: registration.email,
        password_hash,
        is_raffle_holder: registration.is_raffle_holder,
    };

    store.insert_user(&user).await?;
    info!("Registered user {} (raffle holder: {})", user.id, user.is_raffle_holder);

    Ok(user)
}

pub async fn login(store: &dyn Store, email: &str, password: &str) -> Result<User, AppError> {
    let user = store
        .find_user_by_email(email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let password = password.to_string();
    let password_hash = user.password_hash.clone();
    let matches = spawn_blocking(move || verify(password, &password_hash)).await??;

    if !matches {
        return Err(AppError::InvalidCredentials);
    }

    Ok(user)
}

pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token.to_string())
}

pub fn session_cookie(token: &str, config: &Config) -> String {
    let same_site = if config.secure_cookies {
        "Secure; SameSite=None"
    } else {
        "SameSite=Lax"
    };

    format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; Max-Age={}; {same_site}",
        config.session_ttl.as_secs()
    )
}

pub fn expired_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; Max-Age=0")
}

pub struct MaybeUser(pub Option<User>);

pub struct RequireUser(pub User);

pub struct RequireHolder(pub User);

impl FromRequestParts<Arc<AppState>> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = session_token(&parts.headers) else {
            return Ok(Self(None));
        };

        let Some(user_id) = state.store.session_user(&token).await? else {
            return Ok(Self(None));
        };

        Ok(Self(state.store.get_user(user_id).await?))
    }
}

impl FromRequestParts<Arc<AppState>> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let MaybeUser(user) = MaybeUser::from_request_parts(parts, state).await?;

        user.map(Self).ok_or(AppError::Unauthenticated)
    }
}

impl FromRequestParts<Arc<AppState>> for RequireHolder {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let RequireUser(user) = RequireUser::from_request_parts(parts, state).await?;

        if !user.is_raffle_holder {
            return Err(AppError::Forbidden(
                "You do not have permission to create raffles.",
            ));
        }

        Ok(Self(user))
    }
}
