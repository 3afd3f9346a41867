use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RaffleStatus {
    Open,
    Drawn,
    Claimed,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Raffle {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub prize_details: String,
    /// Scheduled draw time, overwritten with the actual time once drawn.
    pub draw_date: DateTime<Utc>,
    #[serde(default)]
    pub image_url: String,
    pub created_by: Uuid,
    #[serde(default)]
    pub tickets: Vec<Ticket>,
    #[serde(default)]
    pub winner: Option<Winner>,
    #[serde(default)]
    pub lucky_number: Option<u8>,
    #[serde(default)]
    pub lucky_number_winners: Vec<LuckyNumberWinner>,
    #[serde(default, rename = "hasBeenClaimed")]
    pub claimed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: Uuid,
    #[serde(default)]
    pub owner: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    pub numbers: Vec<u8>,
    #[serde(default)]
    pub is_guest: bool,
    #[serde(default)]
    pub guest_email: Option<String>,
}

/// Snapshot of the main prize ticket taken at draw time.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Winner {
    pub ticket_id: Uuid,
    pub is_guest: bool,
    #[serde(default)]
    pub guest_email: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LuckyNumberWinner {
    pub ticket_id: Uuid,
    pub prize_share: f64,
    pub is_guest: bool,
    #[serde(default)]
    pub guest_email: Option<String>,
}

impl Raffle {
    pub fn new(
        created_by: Uuid,
        title: String,
        description: String,
        prize_details: String,
        draw_date: DateTime<Utc>,
        image_url: String,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            title,
            description,
            prize_details,
            draw_date,
            image_url,
            created_by,
            tickets: Vec::new(),
            winner: None,
            lucky_number: None,
            lucky_number_winners: Vec::new(),
            claimed: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> RaffleStatus {
        match (&self.winner, self.claimed) {
            (None, _) => RaffleStatus::Open,
            (Some(_), false) => RaffleStatus::Drawn,
            (Some(_), true) => RaffleStatus::Claimed,
        }
    }

    /// Picked up by the scheduled draw.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.draw_date <= now && self.winner.is_none()
    }

    pub fn ticket(&self, ticket_id: Uuid) -> Option<&Ticket> {
        self.tickets.iter().find(|ticket| ticket.id == ticket_id)
    }

    /// Returns how many guest tickets were removed.
    pub fn purge_guest_tickets(&mut self) -> usize {
        let before = self.tickets.len();
        self.tickets.retain(|ticket| !ticket.is_guest);

        before - self.tickets.len()
    }
}

impl Ticket {
    pub fn owned(owner: Uuid, owner_name: String, numbers: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner: Some(owner),
            owner_name: Some(owner_name),
            numbers,
            is_guest: false,
            guest_email: None,
        }
    }

    pub fn guest(guest_email: String, numbers: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner: None,
            owner_name: None,
            numbers,
            is_guest: true,
            guest_email: Some(guest_email),
        }
    }

    pub fn holds(&self, number: u8) -> bool {
        self.numbers.contains(&number)
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        !self.is_guest && self.owner == Some(user_id)
    }
}

impl From<&Ticket> for Winner {
    fn from(ticket: &Ticket) -> Self {
        Self {
            ticket_id: ticket.id,
            is_guest: ticket.is_guest,
            guest_email: ticket.guest_email.clone(),
        }
    }
}
