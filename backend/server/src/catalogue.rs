use std::collections::HashMap;

use chrono::{DateTime, Utc};
use documents::{GUEST_NAME, UNKNOWN_NAME, raffle::Raffle};
use tracing::info;
use uuid::Uuid;

use crate::{
    error::AppError,
    store::{Store, find_raffle},
};

#[derive(Debug, Clone, PartialEq)]
pub struct NewRaffle {
    pub title: String,
    pub description: String,
    pub prize_details: String,
    pub draw_date: DateTime<Utc>,
    pub image_url: String,
}

pub async fn create_raffle(
    store: &dyn Store,
    holder: Uuid,
    new_raffle: NewRaffle,
) -> Result<Raffle, AppError> {
    let raffle = Raffle::new(
        holder,
        new_raffle.title,
        new_raffle.description,
        new_raffle.prize_details,
        new_raffle.draw_date,
        new_raffle.image_url,
    );

    store.insert_raffle(&raffle).await?;
    info!("Raffle {} created by {holder}, draws at {}", raffle.id, raffle.draw_date);

    Ok(raffle)
}

/// Every raffle, oldest first, with owner names resolved.
pub async fn list_raffles(store: &dyn Store) -> Result<Vec<Raffle>, AppError> {
    let mut raffles = store.list_raffles().await?;
    raffles.sort_by_key(|raffle| raffle.created_at);

    let mut names = HashMap::new();
    for raffle in &mut raffles {
        resolve_owner_names(store, raffle, &mut names).await?;
    }

    Ok(raffles)
}

pub async fn get_raffle(store: &dyn Store, raffle_id: Uuid) -> Result<Raffle, AppError> {
    let mut raffle = find_raffle(store, raffle_id).await?;
    resolve_owner_names(store, &mut raffle, &mut HashMap::new()).await?;

    Ok(raffle)
}

async fn resolve_owner_names(
    store: &dyn Store,
    raffle: &mut Raffle,
    names: &mut HashMap<Uuid, String>,
) -> Result<(), AppError> {
    for ticket in &mut raffle.tickets {
        let name = match ticket.owner {
            Some(owner) if !ticket.is_guest => match names.get(&owner) {
                Some(name) => name.clone(),
                None => {
                    let name = store
                        .get_user(owner)
                        .await?
                        .map(|user| user.name)
                        .unwrap_or_else(|| UNKNOWN_NAME.to_string());
                    names.insert(owner, name.clone());
                    name
                }
            },
            _ => GUEST_NAME.to_string(),
        };

        ticket.owner_name = Some(name);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use documents::{raffle::Ticket, user::User};

    use super::*;
    use crate::memory::MemoryStore;

    fn new_raffle(title: &str) -> NewRaffle {
        NewRaffle {
            title: title.to_string(),
            description: "A prize".to_string(),
            prize_details: "One prize".to_string(),
            draw_date: Utc::now() + Duration::days(1),
            image_url: String::new(),
        }
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let store = MemoryStore::default();
        let holder = Uuid::new_v4();

        let first = create_raffle(&store, holder, new_raffle("Bike")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = create_raffle(&store, holder, new_raffle("Lamp")).await.unwrap();

        let raffles = list_raffles(&store).await.unwrap();
        let ids: Vec<Uuid> = raffles.iter().map(|raffle| raffle.id).collect();

        assert_eq!(ids, vec![first.id, second.id]);
        assert_eq!(raffles[0].created_by, holder);
        assert!(!raffles[0].claimed);
        assert!(raffles[0].winner.is_none());
    }

    #[tokio::test]
    async fn test_owner_names_resolved() {
        let store = MemoryStore::default();
        let user = User {
            id: Uuid::new_v4(),
            name: "Ada Renamed".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "hash".to_string(),
            is_raffle_holder: false,
        };
        store.insert_user(&user).await.unwrap();

        let mut raffle = create_raffle(&store, Uuid::new_v4(), new_raffle("Bike"))
            .await
            .unwrap();
        raffle.tickets = vec![
            Ticket::owned(user.id, "Ada".to_string(), vec![1]),
            Ticket::guest("g@x.com".to_string(), vec![2]),
            Ticket::owned(Uuid::new_v4(), "Gone".to_string(), vec![3]),
        ];
        store.insert_raffle(&raffle).await.unwrap();

        let resolved = get_raffle(&store, raffle.id).await.unwrap();
        let names: Vec<&str> = resolved
            .tickets
            .iter()
            .filter_map(|ticket| ticket.owner_name.as_deref())
            .collect();

        assert_eq!(names, vec!["Ada Renamed", GUEST_NAME, UNKNOWN_NAME]);
    }

    #[tokio::test]
    async fn test_get_missing_raffle() {
        let store = MemoryStore::default();

        let result = get_raffle(&store, Uuid::new_v4()).await;

        assert!(matches!(result, Err(AppError::NotFound("Raffle"))));
    }
}
