//! Documentation of the DojoDraw raffle backend.
//!
//! Raffle holders create raffles, registered users and guests buy numbered tickets,
//! and a daily job draws a main winner plus lucky number cash winners.
//!
//!
//!
//! # Raffle Lifecycle
//! - **Open**: tickets can be bought, owners can remove their own tickets
//! - **Drawn**: a main winner and a lucky number are recorded, guest tickets are purged
//! - **Claimed**: the recorded winner confirmed receipt, exactly once
//!
//! Both transitions are irreversible and each is committed as one conditional write,
//! see [`store::modify_raffle`].
//!
//!
//!
//! # Tickets
//! - Up to 5 numbers between 1 and 40, duplicates allowed, none is fine too
//! - A guest email makes the ticket a guest ticket, even for a logged in user
//! - No session and no guest email is rejected
//!
//!
//!
//! # Draw
//! - Main prize: any ticket, uniformly
//! - Lucky number: 1 to 40, uniformly
//! - Every ticket holding the lucky number splits 100 evenly, the main winner can win both
//! - Manual draws hit `POST /raffles/{raffleId}/draw-winner`
//! - Scheduled draws run daily at `DRAW_HOUR_UTC` over every raffle past its draw date
//!   without a winner
//!
//!
//!
//! # Claim
//! - Registered winners are identified by their session and must own the winning ticket
//! - Guest winners send the email snapshotted at draw time
//!
//!
//!
//! # Environment
//!
//! | Variable | Default |
//! |---|---|
//! | `RUST_PORT` | `3000` |
//! | `REDIS_URL` | `redis://127.0.0.1:6379` |
//! | `STORE_BACKEND` | `redis` (or `memory`) |
//! | `ALLOWED_ORIGINS` | local Vite ports + `https://dojodraw.netlify.app` |
//! | `SESSION_TTL_SECS` | 30 days |
//! | `SECURE_COOKIES` | `false` |
//! | `DRAW_HOUR_UTC` | `0` |
//! | `RUST_LOG` | unset |
//!
//! Secrets are read from `/run/secrets`, currently only `REDIS_PASSWORD`.
//!
//!
//!
//! # Setup
//!
//! View current docs.
//! ```sh
//! cargo doc --open
//! ```
//!
//! Run against a local Redis.
//! ```sh
//! RUST_LOG=info cargo run
//! ```
//!
//! Run without Redis.
//! ```sh
//! STORE_BACKEND=memory RUST_LOG=info cargo run
//! ```
//!
//! Draw everything due right now, outside the daily schedule.
//! ```sh
//! cargo run -p draw
//! ```
use std::{sync::Arc, time::Duration};

use anyhow::Result;
use axum::{
    Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{delete, get, post},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod auth;
pub mod catalogue;
pub mod claim;
pub mod config;
pub mod database;
pub mod draw;
pub mod entry;
pub mod error;
pub mod memory;
pub mod payloads;
pub mod routes;
pub mod scheduler;
pub mod state;
pub mod store;
pub mod utils;

use routes::{
    claim_handler, create_handler, delete_tickets_handler, draw_handler, enter_handler,
    list_handler, login_handler, logout_handler, raffle_handler, register_handler, root_handler,
    verify_session_handler,
};
use scheduler::run_scheduler;
use state::AppState;

pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(state.config.allowed_origins.clone()))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/", get(root_handler))
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", get(logout_handler))
        .route("/auth/verify-session", get(verify_session_handler))
        .route("/raffles", get(list_handler))
        .route("/raffles/", get(list_handler))
        .route("/raffles/create", post(create_handler))
        .route("/raffles/enter", post(enter_handler))
        .route("/raffles/{raffle_id}", get(raffle_handler))
        .route("/raffles/{raffle_id}/draw-winner", post(draw_handler))
        .route("/raffles/{raffle_id}/delete-tickets", delete(delete_tickets_handler))
        .route("/raffles/{raffle_id}/claim-prize", post(claim_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn start_server() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new().await?;

    info!("Starting scheduler...");
    tokio::spawn(run_scheduler(state.clone()));

    info!("Starting server...");
    let app = app(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
