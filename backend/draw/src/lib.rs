//! # Batch Draw
//!
//! Runs the same pass as the daily scheduler once, from the command line.
//!
//! ## Usage
//! - `draw` draws every raffle past its draw date without a winner
//! - `draw --until 2026-10-20T00:00:00Z` treats that instant as now
//! - `draw --dry-run` only lists what would be drawn
//!
//! Reads the same environment as the server, so `STORE_BACKEND` and `REDIS_URL`
//! must point at the live store.
use anyhow::Result;
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use server::{
    scheduler::{BatchReport, Step, eligible_raffles, log_step, run_batch},
    state::AppState,
};
use tracing_subscriber::{EnvFilter, fmt};

pub async fn draw_due(until: DateTime<Utc>, dry_run: bool) -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let state = AppState::new().await?;
    let raffles = eligible_raffles(state.store.as_ref(), until).await?;

    println!("Eligible Raffles: {}\n", raffles.len());

    if dry_run {
        for raffle in &raffles {
            println!(
                "{} | {} | due {} | {} tickets",
                raffle.id,
                raffle.title,
                raffle.draw_date,
                raffle.tickets.len()
            );
        }
        return Ok(());
    }

    if raffles.is_empty() {
        println!("Nothing to draw. Exiting.");
        return Ok(());
    }

    let pb = ProgressBar::new(raffles.len() as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )?
        .progress_chars("=> "),
    );

    let report = run_batch(state.store.as_ref(), raffles, |raffle, step| {
        log_step(raffle, step);
        pb.set_message(describe(step));
        pb.inc(1);
    })
    .await;

    pb.finish_with_message("Done");
    print_report(&report);

    Ok(())
}

fn describe(step: &Step) -> String {
    match step {
        Step::Drawn(outcome) => format!(
            "lucky number {}, {} lucky winners",
            outcome.lucky_number,
            outcome.lucky_number_winners.len()
        ),
        Step::SkippedEmpty => "skipped, no tickets".to_string(),
        Step::Failed(e) => format!("failed: {e}"),
    }
}

fn print_report(report: &BatchReport) {
    println!("\nDrawn: {}", report.drawn);
    println!("Skipped: {}", report.skipped_empty);
    println!("Failed: {}", report.failed);
}
