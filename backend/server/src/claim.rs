use documents::raffle::{Raffle, RaffleStatus};
use tracing::info;
use uuid::Uuid;

use crate::{
    error::AppError,
    store::{Store, modify_raffle},
};

/// Whoever is asking to claim. Both halves may be present, either one can authorize.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Claimant {
    pub user_id: Option<Uuid>,
    pub guest_email: Option<String>,
}

pub fn authorize(raffle: &Raffle, claimant: &Claimant) -> Result<(), AppError> {
    let winner = raffle.winner.as_ref().ok_or(AppError::NoWinner)?;

    if claimant.user_id.is_none() && claimant.guest_email.is_none() {
        return Err(AppError::Unauthorized);
    }

    let registered = claimant.user_id.is_some_and(|user_id| {
        !winner.is_guest
            && raffle
                .ticket(winner.ticket_id)
                .is_some_and(|ticket| ticket.is_owned_by(user_id))
    });

    let guest = claimant.guest_email.as_deref().is_some_and(|email| {
        winner.is_guest && winner.guest_email.as_deref() == Some(email)
    });

    if registered || guest {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}

/// Flips `claimed` once, for the recorded winner only.
pub async fn claim_prize(
    store: &dyn Store,
    raffle_id: Uuid,
    claimant: &Claimant,
) -> Result<Raffle, AppError> {
    let (raffle, ()) = modify_raffle(store, raffle_id, |raffle| {
        authorize(raffle, claimant)?;

        if raffle.status() == RaffleStatus::Claimed {
            return Err(AppError::AlreadyClaimed);
        }

        raffle.claimed = true;
        Ok(())
    })
    .await?;

    info!("Prize of raffle {raffle_id} claimed");

    Ok(raffle)
}
