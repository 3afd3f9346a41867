//! Ticket entry and removal.
use documents::{MAX_NUMBERS, raffle::{Raffle, RaffleStatus, Ticket}};
use tracing::info;
use uuid::Uuid;

use crate::{
    error::AppError,
    store::{Store, modify_raffle},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Entrant {
    Registered { user_id: Uuid, name: String },
    Guest { email: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnterRaffle {
    pub raffle_id: Uuid,
    pub numbers: Vec<u8>,
    pub entrant: Entrant,
}

impl EnterRaffle {
    fn ticket(&self) -> Ticket {
        match &self.entrant {
            Entrant::Registered { user_id, name } => {
                Ticket::owned(*user_id, name.clone(), self.numbers.clone())
            }
            Entrant::Guest { email } => Ticket::guest(email.clone(), self.numbers.clone()),
        }
    }
}

/// Appends one ticket. Nothing stops the same entrant from buying several.
pub async fn enter_raffle(store: &dyn Store, command: EnterRaffle) -> Result<Raffle, AppError> {
    if command.numbers.len() > MAX_NUMBERS {
        return Err(AppError::Validation(format!(
            "You can only select up to {MAX_NUMBERS} numbers"
        )));
    }

    let ticket = command.ticket();

    let (raffle, ()) = modify_raffle(store, command.raffle_id, |raffle| {
        if raffle.status() != RaffleStatus::Open {
            return Err(AppError::AlreadyDrawn);
        }

        raffle.tickets.push(ticket.clone());
        Ok(())
    })
    .await?;

    info!(
        "Ticket {} entered into raffle {} (guest: {})",
        ticket.id, raffle.id, ticket.is_guest
    );

    Ok(raffle)
}

/// Removes every non-guest ticket owned by `user_id`, returning how many went.
pub async fn delete_tickets(
    store: &dyn Store,
    raffle_id: Uuid,
    user_id: Uuid,
) -> Result<usize, AppError> {
    let (_, removed) = modify_raffle(store, raffle_id, |raffle| {
        if raffle.status() != RaffleStatus::Open {
            return Err(AppError::AlreadyDrawn);
        }

        let before = raffle.tickets.len();
        raffle.tickets.retain(|ticket| !ticket.is_owned_by(user_id));

        Ok(before - raffle.tickets.len())
    })
    .await?;

    info!("Removed {removed} tickets of user {user_id} from raffle {raffle_id}");

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use documents::raffle::Winner;

    use super::*;
    use crate::{memory::MemoryStore, store::find_raffle};

    async fn seeded() -> (MemoryStore, Raffle) {
        let store = MemoryStore::default();
        let raffle = Raffle::new(
            Uuid::new_v4(),
            "Bike".to_string(),
            "A red bike".to_string(),
            "One bike".to_string(),
            Utc::now(),
            String::new(),
        );
        store.insert_raffle(&raffle).await.unwrap();

        (store, raffle)
    }

    fn guest(raffle_id: Uuid, numbers: Vec<u8>) -> EnterRaffle {
        EnterRaffle {
            raffle_id,
            numbers,
            entrant: Entrant::Guest {
                email: "g@x.com".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_enter_appends_tickets() {
        let (store, raffle) = seeded().await;
        let user_id = Uuid::new_v4();

        enter_raffle(
            &store,
            EnterRaffle {
                raffle_id: raffle.id,
                numbers: vec![7, 7],
                entrant: Entrant::Registered {
                    user_id,
                    name: "Ada".to_string(),
                },
            },
        )
        .await
        .unwrap();
        let updated = enter_raffle(&store, guest(raffle.id, vec![])).await.unwrap();
        let updated_again = enter_raffle(&store, guest(raffle.id, vec![1])).await.unwrap();

        assert_eq!(updated.tickets.len(), 2);
        assert_eq!(updated_again.tickets.len(), 3);

        let owned = &updated_again.tickets[0];
        assert!(owned.is_owned_by(user_id));
        assert_eq!(owned.numbers, vec![7, 7]);
        assert_eq!(owned.owner_name.as_deref(), Some("Ada"));

        let guest = &updated_again.tickets[1];
        assert!(guest.is_guest);
        assert!(guest.owner.is_none());
        assert_eq!(guest.guest_email.as_deref(), Some("g@x.com"));
    }

    #[tokio::test]
    async fn test_six_numbers_rejected() {
        let (store, raffle) = seeded().await;

        let result = enter_raffle(&store, guest(raffle.id, vec![1, 2, 3, 4, 5, 6])).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(find_raffle(&store, raffle.id).await.unwrap().tickets.is_empty());
    }

    #[tokio::test]
    async fn test_enter_missing_raffle() {
        let (store, _) = seeded().await;

        let result = enter_raffle(&store, guest(Uuid::new_v4(), vec![1])).await;

        assert!(matches!(result, Err(AppError::NotFound("Raffle"))));
    }

    #[tokio::test]
    async fn test_enter_after_draw_rejected() {
        let (store, mut raffle) = seeded().await;
        raffle.winner = Some(Winner {
            ticket_id: Uuid::new_v4(),
            is_guest: false,
            guest_email: None,
        });
        store.insert_raffle(&raffle).await.unwrap();

        let result = enter_raffle(&store, guest(raffle.id, vec![1])).await;

        assert!(matches!(result, Err(AppError::AlreadyDrawn)));
    }

    #[tokio::test]
    async fn test_delete_tickets_keeps_others() {
        let (store, mut raffle) = seeded().await;
        let user_id = Uuid::new_v4();
        let other = Uuid::new_v4();
        raffle.tickets = vec![
            Ticket::owned(user_id, "Ada".to_string(), vec![1]),
            Ticket::owned(other, "Bob".to_string(), vec![2]),
            Ticket::guest("g@x.com".to_string(), vec![3]),
            Ticket::owned(user_id, "Ada".to_string(), vec![4]),
        ];
        store.insert_raffle(&raffle).await.unwrap();

        let removed = delete_tickets(&store, raffle.id, user_id).await.unwrap();

        assert_eq!(removed, 2);
        let remaining = find_raffle(&store, raffle.id).await.unwrap().tickets;
        assert_eq!(remaining.len(), 2);
        assert!(remaining.iter().all(|ticket| !ticket.is_owned_by(user_id)));
    }
}
