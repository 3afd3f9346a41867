//! # Scheduled Draw
//!
//! Once a day at `DRAW_HOUR_UTC`, every raffle whose draw date has passed and which has
//! no winner yet is drawn, one after another.
//!
//! - Raffles without tickets are skipped, they stay eligible for the next run
//! - A failing raffle is logged and counted, the batch moves on
//! - Nothing is retried within a run
use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Days, Utc};
use documents::raffle::Raffle;
use rand::{SeedableRng, rngs::StdRng};
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::{
    draw::draw_winner,
    error::AppError,
    payloads::DrawOutcome,
    state::AppState,
    store::Store,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub drawn: usize,
    pub skipped_empty: usize,
    pub failed: usize,
}

#[derive(Debug)]
pub enum Step {
    Drawn(DrawOutcome),
    SkippedEmpty,
    Failed(AppError),
}

pub async fn eligible_raffles(
    store: &dyn Store,
    now: DateTime<Utc>,
) -> Result<Vec<Raffle>, AppError> {
    let mut raffles: Vec<Raffle> = store
        .list_raffles()
        .await?
        .into_iter()
        .filter(|raffle| raffle.is_due(now))
        .collect();
    raffles.sort_by_key(|raffle| raffle.draw_date);

    Ok(raffles)
}

/// Draws each raffle independently, reporting every step to `observe`.
pub async fn run_batch<F>(store: &dyn Store, raffles: Vec<Raffle>, mut observe: F) -> BatchReport
where
    F: FnMut(&Raffle, &Step) + Send,
{
    let mut rng = StdRng::from_entropy();
    let mut report = BatchReport::default();

    for raffle in raffles {
        let step = if raffle.tickets.is_empty() {
            Step::SkippedEmpty
        } else {
            match draw_winner(store, raffle.id, &mut rng).await {
                Ok(outcome) => Step::Drawn(outcome),
                Err(AppError::EmptyRaffle) => Step::SkippedEmpty,
                Err(e) => Step::Failed(e),
            }
        };

        match step {
            Step::Drawn(_) => report.drawn += 1,
            Step::SkippedEmpty => report.skipped_empty += 1,
            Step::Failed(_) => report.failed += 1,
        }

        observe(&raffle, &step);
    }

    report
}

pub fn log_step(raffle: &Raffle, step: &Step) {
    match step {
        Step::Drawn(outcome) => info!(
            "Drew raffle {} ({}), lucky number {}",
            raffle.id, raffle.title, outcome.lucky_number
        ),
        Step::SkippedEmpty => warn!("Skipping raffle {} ({}), no tickets", raffle.id, raffle.title),
        Step::Failed(e) => error!("Error drawing winner for raffle {}: {e}", raffle.id),
    }
}

pub async fn draw_eligible(store: &dyn Store, now: DateTime<Utc>) -> Result<BatchReport, AppError> {
    let raffles = eligible_raffles(store, now).await?;
    info!("{} raffles eligible for drawing", raffles.len());

    Ok(run_batch(store, raffles, log_step).await)
}

/// Time left until the next `hour:00` UTC strictly after `now`.
pub fn until_next_run(now: DateTime<Utc>, hour: u32) -> Duration {
    let today = now
        .date_naive()
        .and_hms_opt(hour, 0, 0)
        .map(|run| run.and_utc());

    let next = match today {
        Some(run) if run > now => Some(run),
        Some(run) => run.checked_add_days(Days::new(1)),
        None => None,
    };

    next.and_then(|next| (next - now).to_std().ok())
        .unwrap_or(Duration::from_secs(24 * 60 * 60))
}

pub async fn run_scheduler(state: Arc<AppState>) {
    loop {
        let wait = until_next_run(Utc::now(), state.config.draw_hour);
        info!("Next automated draw in {} minutes", wait.as_secs() / 60);
        sleep(wait).await;

        info!("Initiating automated draw for eligible raffles...");
        match draw_eligible(state.store.as_ref(), Utc::now()).await {
            Ok(report) => info!(
                "Automated draw completed: {} drawn, {} skipped, {} failed",
                report.drawn, report.skipped_empty, report.failed
            ),
            Err(e) => error!("Error during automated draw: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration as ChronoDuration, TimeZone};
    use documents::raffle::{Ticket, Winner};
    use uuid::Uuid;

    use super::*;
    use crate::{memory::MemoryStore, store::find_raffle};

    fn raffle(draw_date: DateTime<Utc>, tickets: Vec<Ticket>) -> Raffle {
        let mut raffle = Raffle::new(
            Uuid::new_v4(),
            "Bike".to_string(),
            "A red bike".to_string(),
            "One bike".to_string(),
            draw_date,
            String::new(),
        );
        raffle.tickets = tickets;

        raffle
    }

    #[tokio::test]
    async fn test_batch_draws_only_due_raffles() {
        let store = MemoryStore::default();
        let now = Utc::now();
        let owner = Uuid::new_v4();

        let due = raffle(
            now - ChronoDuration::hours(2),
            vec![
                Ticket::owned(owner, "Ada".to_string(), vec![4]),
                Ticket::guest("g@x.com".to_string(), vec![4]),
            ],
        );
        let future = raffle(
            now + ChronoDuration::hours(2),
            vec![Ticket::owned(owner, "Ada".to_string(), vec![4])],
        );
        let mut already = raffle(
            now - ChronoDuration::hours(2),
            vec![Ticket::owned(owner, "Ada".to_string(), vec![4])],
        );
        let winner = Winner::from(&already.tickets[0]);
        already.winner = Some(winner);
        let empty = raffle(now - ChronoDuration::hours(1), Vec::new());

        for raffle in [&due, &future, &already, &empty] {
            store.insert_raffle(raffle).await.unwrap();
        }

        let report = draw_eligible(&store, now).await.unwrap();

        assert_eq!(
            report,
            BatchReport {
                drawn: 1,
                skipped_empty: 1,
                failed: 0
            }
        );

        let drawn = find_raffle(&store, due.id).await.unwrap();
        assert!(drawn.winner.is_some());
        assert!(drawn.lucky_number.is_some());
        assert!(drawn.tickets.iter().all(|ticket| !ticket.is_guest));

        assert_eq!(find_raffle(&store, future.id).await.unwrap(), future);
        assert_eq!(find_raffle(&store, already.id).await.unwrap(), already);
        assert!(find_raffle(&store, empty.id).await.unwrap().winner.is_none());
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_batch() {
        let store = MemoryStore::default();
        let now = Utc::now();
        let owner = Uuid::new_v4();

        let missing = raffle(
            now - ChronoDuration::hours(3),
            vec![Ticket::owned(owner, "Ada".to_string(), vec![1])],
        );
        let present = raffle(
            now - ChronoDuration::hours(1),
            vec![Ticket::owned(owner, "Ada".to_string(), vec![1])],
        );
        store.insert_raffle(&present).await.unwrap();

        let mut seen = Vec::new();
        let report = run_batch(&store, vec![missing.clone(), present.clone()], |raffle, step| {
            seen.push((raffle.id, matches!(step, Step::Failed(AppError::NotFound(_)))));
        })
        .await;

        assert_eq!(report.failed, 1);
        assert_eq!(report.drawn, 1);
        assert_eq!(seen, vec![(missing.id, true), (present.id, false)]);
        assert!(find_raffle(&store, present.id).await.unwrap().winner.is_some());
    }

    #[test]
    fn test_until_next_run() {
        let before = Utc.with_ymd_and_hms(2026, 10, 16, 22, 30, 0).unwrap();
        assert_eq!(until_next_run(before, 0), Duration::from_secs(90 * 60));
        assert_eq!(until_next_run(before, 23), Duration::from_secs(30 * 60));

        let on_the_hour = Utc.with_ymd_and_hms(2026, 10, 16, 0, 0, 0).unwrap();
        assert_eq!(until_next_run(on_the_hour, 0), Duration::from_secs(24 * 60 * 60));
    }
}
