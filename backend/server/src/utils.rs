//! Turns raw payloads into typed commands before any service sees them.
use std::sync::LazyLock;

use axum::body::Bytes;
use documents::{LUCKY_NUMBERS, MAX_NUMBERS, user::User};
use regex::Regex;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::{
    auth::Registration,
    catalogue::NewRaffle,
    claim::Claimant,
    entry::{EnterRaffle, Entrant},
    error::AppError::{self, Validation},
    payloads::{ClaimPayload, CreateRafflePayload, EnterPayload, RegisterPayload},
};

const MIN_PASSWORD_LEN: usize = 8;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
});

pub fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| Validation(format!("{raw} is not a valid id")))
}

pub fn normalize_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim().to_lowercase();

    if !EMAIL.is_match(&email) {
        return Err(Validation(format!("{raw} is not a valid email")));
    }

    Ok(email)
}

/// Duplicates and an empty selection are both allowed.
pub fn validate_numbers(numbers: &[i64]) -> Result<Vec<u8>, AppError> {
    if numbers.len() > MAX_NUMBERS {
        return Err(Validation(format!(
            "You can only select up to {MAX_NUMBERS} numbers"
        )));
    }

    numbers
        .iter()
        .map(|&number| {
            u8::try_from(number)
                .ok()
                .filter(|number| LUCKY_NUMBERS.contains(number))
                .ok_or_else(|| {
                    Validation(format!(
                        "{number} is outside {}..={}",
                        LUCKY_NUMBERS.start(),
                        LUCKY_NUMBERS.end()
                    ))
                })
        })
        .collect()
}

fn required(field: &str, value: String) -> Result<String, AppError> {
    let value = value.trim().to_string();

    if value.is_empty() {
        return Err(Validation(format!("{field} is required")));
    }

    Ok(value)
}

/// A guest email makes a guest ticket even with a session, and no session plus
/// no guest email is rejected instead of creating an unattributed ticket.
pub fn enter_command(payload: EnterPayload, user: Option<&User>) -> Result<EnterRaffle, AppError> {
    let numbers = validate_numbers(&payload.numbers)?;
    let raffle_id = parse_id(&payload.raffle_id)?;

    let guest_email = payload
        .guest_email
        .filter(|email| !email.trim().is_empty());

    let entrant = match (guest_email, user) {
        (Some(email), _) => Entrant::Guest {
            email: normalize_email(&email)?,
        },
        (None, Some(user)) => Entrant::Registered {
            user_id: user.id,
            name: user.name.clone(),
        },
        (None, None) => {
            return Err(Validation(
                "Log in or provide a guest email to enter".to_string(),
            ));
        }
    };

    Ok(EnterRaffle {
        raffle_id,
        numbers,
        entrant,
    })
}

pub fn new_raffle(payload: CreateRafflePayload) -> Result<NewRaffle, AppError> {
    Ok(NewRaffle {
        title: required("title", payload.title)?,
        description: required("description", payload.description)?,
        prize_details: required("prizeDetails", payload.prize_details)?,
        draw_date: payload.draw_date,
        image_url: payload.image_url.unwrap_or_default().trim().to_string(),
    })
}

pub fn registration(payload: RegisterPayload) -> Result<Registration, AppError> {
    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    Ok(Registration {
        name: required("name", payload.name)?,
        email: normalize_email(&payload.email)?,
        password: payload.password,
        is_raffle_holder: payload.is_raffle_holder,
    })
}

pub fn claimant(payload: ClaimPayload, user: Option<&User>) -> Result<Claimant, AppError> {
    let guest_email = payload
        .guest_email
        .filter(|email| !email.trim().is_empty())
        .map(|email| normalize_email(&email))
        .transpose()?;

    Ok(Claimant {
        user_id: user.map(|user| user.id),
        guest_email,
    })
}

/// Empty bodies decode to `T::default()`.
pub fn parse_optional<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    serde_json::from_slice(body).map_err(|e| Validation(format!("Malformed payload: {e}")))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "hash".to_string(),
            is_raffle_holder: false,
        }
    }

    fn enter(numbers: Vec<i64>, guest_email: Option<&str>) -> EnterPayload {
        EnterPayload {
            raffle_id: Uuid::nil().to_string(),
            numbers,
            guest_email: guest_email.map(str::to_string),
        }
    }

    #[test]
    fn test_numbers() {
        assert_eq!(validate_numbers(&[]).unwrap(), Vec::<u8>::new());
        assert_eq!(validate_numbers(&[3, 3, 40]).unwrap(), vec![3, 3, 40]);
        assert!(validate_numbers(&[1, 2, 3, 4, 5, 6]).is_err());
        assert!(validate_numbers(&[0]).is_err());
        assert!(validate_numbers(&[41]).is_err());
        assert!(validate_numbers(&[-7]).is_err());
        assert!(validate_numbers(&[300]).is_err());
    }

    #[test]
    fn test_email() {
        assert_eq!(normalize_email("  G@X.com ").unwrap(), "g@x.com");
        assert!(normalize_email("not-an-email").is_err());
        assert!(normalize_email("a@b").is_err());
    }

    #[test]
    fn test_enter_as_user() {
        let user = user();

        let command = enter_command(enter(vec![7], None), Some(&user)).unwrap();

        assert_eq!(
            command.entrant,
            Entrant::Registered {
                user_id: user.id,
                name: "Ada".to_string()
            }
        );
        assert_eq!(command.numbers, vec![7]);
    }

    #[test]
    fn test_enter_guest_email_wins() {
        let user = user();

        let command = enter_command(enter(vec![], Some("G@x.com")), Some(&user)).unwrap();

        assert_eq!(
            command.entrant,
            Entrant::Guest {
                email: "g@x.com".to_string()
            }
        );
    }

    #[test]
    fn test_enter_anonymous_rejected() {
        assert!(matches!(
            enter_command(enter(vec![1], None), None),
            Err(Validation(_))
        ));
        assert!(matches!(
            enter_command(enter(vec![1], Some("  ")), None),
            Err(Validation(_))
        ));
    }

    #[test]
    fn test_enter_bad_raffle_id() {
        let mut payload = enter(vec![1], Some("g@x.com"));
        payload.raffle_id = "507f1f77bcf86cd799439011".to_string();

        assert!(matches!(enter_command(payload, None), Err(Validation(_))));
    }

    #[test]
    fn test_new_raffle_requires_fields() {
        let payload = CreateRafflePayload {
            title: "   ".to_string(),
            description: "A bike".to_string(),
            prize_details: "One bike".to_string(),
            draw_date: Utc::now(),
            image_url: None,
        };

        assert!(matches!(new_raffle(payload), Err(Validation(_))));
    }

    #[test]
    fn test_registration_rules() {
        let payload = |password: &str| RegisterPayload {
            name: "Ada".to_string(),
            email: "Ada@Example.com".to_string(),
            password: password.to_string(),
            is_raffle_holder: false,
        };

        assert!(registration(payload("short")).is_err());
        assert_eq!(
            registration(payload("long enough")).unwrap().email,
            "ada@example.com"
        );
    }

    #[test]
    fn test_claimant() {
        let user = user();

        let both = claimant(
            ClaimPayload {
                guest_email: Some("G@x.com".to_string()),
            },
            Some(&user),
        )
        .unwrap();
        assert_eq!(both.user_id, Some(user.id));
        assert_eq!(both.guest_email.as_deref(), Some("g@x.com"));

        let anonymous = claimant(ClaimPayload::default(), None).unwrap();
        assert_eq!(anonymous, Claimant::default());
    }

    #[test]
    fn test_parse_optional() {
        let empty: ClaimPayload = parse_optional(&Bytes::new()).unwrap();
        assert!(empty.guest_email.is_none());

        let filled: ClaimPayload =
            parse_optional(&Bytes::from_static(br#"{"guestEmail":"g@x.com"}"#)).unwrap();
        assert_eq!(filled.guest_email.as_deref(), Some("g@x.com"));

        assert!(parse_optional::<ClaimPayload>(&Bytes::from_static(b"{oops")).is_err());
    }
}
