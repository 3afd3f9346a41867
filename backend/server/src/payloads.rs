//! Request and response bodies exchanged with the frontend, all camelCase JSON.
use axum::{
    Json,
    extract::{FromRequest, Request},
};
use chrono::{DateTime, Utc};
use documents::raffle::{LuckyNumberWinner, Raffle, Winner};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::AppError;

/// JSON body whose rejections surface as [`AppError::Validation`].
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;

        Ok(Self(value))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPayload {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub is_raffle_holder: bool,
}

#[derive(Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRafflePayload {
    pub title: String,
    pub description: String,
    pub prize_details: String,
    pub draw_date: DateTime<Utc>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnterPayload {
    pub raffle_id: String,
    #[serde(default)]
    pub numbers: Vec<i64>,
    #[serde(default)]
    pub guest_email: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTicketsPayload {
    pub user_id: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClaimPayload {
    #[serde(default)]
    pub guest_email: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DrawOutcome {
    pub draw_date: DateTime<Utc>,
    pub main_prize_winner: Winner,
    pub lucky_number: u8,
    pub lucky_number_winners: Vec<LuckyNumberWinner>,
}

#[derive(Serialize)]
pub struct DrawResponse {
    pub message: &'static str,
    #[serde(flatten)]
    pub outcome: DrawOutcome,
}

#[derive(Serialize)]
pub struct EnterResponse {
    pub message: &'static str,
    pub raffle: Raffle,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResponse {
    pub message: &'static str,
    pub new_raffle: Raffle,
}
