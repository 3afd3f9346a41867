use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("No entries in this raffle")]
    EmptyRaffle,

    #[error("This raffle has already been drawn")]
    AlreadyDrawn,

    #[error("This raffle has no winner yet.")]
    NoWinner,

    #[error("Prize has already been claimed.")]
    AlreadyClaimed,

    #[error("You are not the winner of this raffle.")]
    Unauthorized,

    #[error("You must be logged in to perform this action.")]
    Unauthenticated,

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("User already exists")]
    EmailTaken,

    #[error("Incorrect email or password.")]
    InvalidCredentials,

    #[error("Raffle was modified concurrently, try again")]
    Conflict,

    #[error("Unexpected error: {0}")]
    Unexpected(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl From<redis::RedisError> for AppError {
    fn from(e: redis::RedisError) -> Self {
        AppError::Unexpected(Box::new(e))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Unexpected(Box::new(e))
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(e: bcrypt::BcryptError) -> Self {
        AppError::Unexpected(Box::new(e))
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        AppError::Unexpected(Box::new(e))
    }
}

impl From<uuid::Error> for AppError {
    fn from(e: uuid::Error) -> Self {
        AppError::Unexpected(Box::new(e))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Validation { .. }
            | AppError::EmptyRaffle
            | AppError::NoWinner
            | AppError::AlreadyClaimed
            | AppError::EmailTaken => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::AlreadyDrawn | AppError::Conflict => StatusCode::CONFLICT,
            AppError::Unauthorized | AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::Unauthenticated | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Unexpected { .. } => {
                error!("{self}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, self.to_string()).into_response()
    }
}
