//! # Draw Engine
//!
//! One draw per raffle:
//! 1. Main prize: one ticket picked uniformly from all tickets
//! 2. Lucky number: one integer picked uniformly from `1..=40`
//! 3. Every ticket holding the lucky number splits [`PRIZE_POOL`] evenly, the main
//!    winner included
//! 4. Winner snapshot, actual draw time, lucky number and lucky winners are committed
//!    together with the guest ticket purge in a single conditional write
//!
//! The write only lands while the raffle is still open, so a second draw (manual,
//! scheduled, or racing) fails with [`AppError::AlreadyDrawn`].
use chrono::{DateTime, Utc};
use documents::{
    LUCKY_NUMBERS, PRIZE_POOL,
    raffle::{LuckyNumberWinner, Raffle, RaffleStatus, Ticket, Winner},
};
use rand::Rng;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::AppError,
    payloads::DrawOutcome,
    store::{Store, modify_raffle},
};

/// Main winner index in `0..ticket_count` and a lucky number in `1..=40`.
pub fn pick<R: Rng + ?Sized>(rng: &mut R, ticket_count: usize) -> (usize, u8) {
    (rng.gen_range(0..ticket_count), rng.gen_range(LUCKY_NUMBERS))
}

/// Tickets holding `lucky_number`, in ticket order, each with an even share of the pool.
pub fn lucky_winners(tickets: &[Ticket], lucky_number: u8) -> Vec<LuckyNumberWinner> {
    let holders: Vec<&Ticket> = tickets
        .iter()
        .filter(|ticket| ticket.holds(lucky_number))
        .collect();

    if holders.is_empty() {
        return Vec::new();
    }

    let prize_share = PRIZE_POOL / holders.len() as f64;

    holders
        .into_iter()
        .map(|ticket| LuckyNumberWinner {
            ticket_id: ticket.id,
            prize_share,
            is_guest: ticket.is_guest,
            guest_email: ticket.guest_email.clone(),
        })
        .collect()
}

fn ensure_drawable(raffle: &Raffle) -> Result<(), AppError> {
    if raffle.status() != RaffleStatus::Open {
        return Err(AppError::AlreadyDrawn);
    }

    if raffle.tickets.is_empty() {
        return Err(AppError::EmptyRaffle);
    }

    Ok(())
}

/// Applies a draw with already chosen values.
pub fn settle_with(
    raffle: &mut Raffle,
    main_index: usize,
    lucky_number: u8,
    now: DateTime<Utc>,
) -> Result<DrawOutcome, AppError> {
    ensure_drawable(raffle)?;

    let main_prize_winner = raffle
        .tickets
        .get(main_index)
        .map(Winner::from)
        .ok_or_else(|| AppError::Validation(format!("No ticket at index {main_index}")))?;
    let winners = lucky_winners(&raffle.tickets, lucky_number);

    raffle.winner = Some(main_prize_winner.clone());
    raffle.draw_date = now;
    raffle.lucky_number = Some(lucky_number);
    raffle.lucky_number_winners.extend(winners.iter().cloned());
    raffle.purge_guest_tickets();

    Ok(DrawOutcome {
        draw_date: now,
        main_prize_winner,
        lucky_number,
        lucky_number_winners: winners,
    })
}

pub fn settle<R: Rng + ?Sized>(
    raffle: &mut Raffle,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Result<DrawOutcome, AppError> {
    ensure_drawable(raffle)?;

    let (main_index, lucky_number) = pick(rng, raffle.tickets.len());
    settle_with(raffle, main_index, lucky_number, now)
}

pub async fn draw_winner<R: Rng + Send>(
    store: &dyn Store,
    raffle_id: Uuid,
    rng: &mut R,
) -> Result<DrawOutcome, AppError> {
    let (_, outcome) =
        modify_raffle(store, raffle_id, |raffle| settle(raffle, rng, Utc::now())).await?;

    info!(
        "Raffle {raffle_id} drawn: ticket {} wins, lucky number {} with {} winners",
        outcome.main_prize_winner.ticket_id,
        outcome.lucky_number,
        outcome.lucky_number_winners.len()
    );

    Ok(outcome)
}
