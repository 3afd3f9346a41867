use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::IntoResponse,
};
use documents::user::PublicUser;
use rand::{SeedableRng, rngs::StdRng};
use serde_json::json;

use crate::{
    auth::{
        MaybeUser, RequireHolder, RequireUser, expired_cookie, login, register, session_cookie,
        session_token,
    },
    catalogue::{create_raffle, get_raffle, list_raffles},
    claim::claim_prize,
    draw::draw_winner,
    entry::{delete_tickets, enter_raffle},
    error::AppError,
    payloads::{
        ClaimPayload, CreateRafflePayload, CreateResponse, DeleteTicketsPayload, DrawResponse,
        EnterPayload, EnterResponse, LoginPayload, Payload, RegisterPayload,
    },
    state::AppState,
    utils::{claimant, enter_command, new_raffle, normalize_email, parse_id, parse_optional, registration},
};

pub async fn root_handler() -> &'static str {
    "Raffles Backend API"
}

pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Payload(payload): Payload<RegisterPayload>,
) -> Result<impl IntoResponse, AppError> {
    register(state.store.as_ref(), registration(payload)?).await?;

    Ok((StatusCode::CREATED, "User registered successfully"))
}

pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Payload(payload): Payload<LoginPayload>,
) -> Result<impl IntoResponse, AppError> {
    let email = normalize_email(&payload.email).map_err(|_| AppError::InvalidCredentials)?;
    let user = login(state.store.as_ref(), &email, &payload.password).await?;

    let token = state
        .store
        .create_session(user.id, state.config.session_ttl)
        .await?;

    Ok((
        [(SET_COOKIE, session_cookie(&token, &state.config))],
        Json(PublicUser::from(&user)),
    ))
}

pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    if let Some(token) = session_token(&headers) {
        state.store.delete_session(&token).await?;
    }

    Ok(([(SET_COOKIE, expired_cookie())], "Logged out successfully"))
}

pub async fn verify_session_handler(MaybeUser(user): MaybeUser) -> impl IntoResponse {
    match user {
        Some(user) => Json(json!({
            "isAuthenticated": true,
            "user": PublicUser::from(&user),
        })),
        None => Json(json!({ "isAuthenticated": false })),
    }
}

pub async fn create_handler(
    State(state): State<Arc<AppState>>,
    RequireHolder(holder): RequireHolder,
    Payload(payload): Payload<CreateRafflePayload>,
) -> Result<impl IntoResponse, AppError> {
    let new_raffle = create_raffle(state.store.as_ref(), holder.id, new_raffle(payload)?).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateResponse {
            message: "Raffle created successfully",
            new_raffle,
        }),
    ))
}

pub async fn list_handler(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(list_raffles(state.store.as_ref()).await?))
}

pub async fn raffle_handler(
    State(state): State<Arc<AppState>>,
    Path(raffle_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(get_raffle(state.store.as_ref(), parse_id(&raffle_id)?).await?))
}

pub async fn enter_handler(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    Payload(payload): Payload<EnterPayload>,
) -> Result<impl IntoResponse, AppError> {
    let command = enter_command(payload, user.as_ref())?;
    let raffle = enter_raffle(state.store.as_ref(), command).await?;

    Ok(Json(EnterResponse {
        message: "Successfully entered the raffle",
        raffle,
    }))
}

pub async fn draw_handler(
    State(state): State<Arc<AppState>>,
    Path(raffle_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mut rng = StdRng::from_entropy();
    let outcome = draw_winner(state.store.as_ref(), parse_id(&raffle_id)?, &mut rng).await?;

    Ok(Json(DrawResponse {
        message: "Winner drawn successfully",
        outcome,
    }))
}

pub async fn delete_tickets_handler(
    State(state): State<Arc<AppState>>,
    Path(raffle_id): Path<String>,
    RequireUser(user): RequireUser,
    Payload(payload): Payload<DeleteTicketsPayload>,
) -> Result<impl IntoResponse, AppError> {
    if parse_id(&payload.user_id)? != user.id {
        return Err(AppError::Forbidden("You can only delete your own tickets."));
    }

    delete_tickets(state.store.as_ref(), parse_id(&raffle_id)?, user.id).await?;

    Ok(Json(json!({ "message": "Tickets deleted successfully" })))
}

pub async fn claim_handler(
    State(state): State<Arc<AppState>>,
    Path(raffle_id): Path<String>,
    MaybeUser(user): MaybeUser,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let payload: ClaimPayload = parse_optional(&body)?;
    let claimant = claimant(payload, user.as_ref())?;

    claim_prize(state.store.as_ref(), parse_id(&raffle_id)?, &claimant).await?;

    Ok(Json(json!({ "message": "Prize successfully claimed." })))
}
