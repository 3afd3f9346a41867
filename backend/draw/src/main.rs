use chrono::{DateTime, Utc};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Draw raffles due at or before this instant (RFC 3339), defaults to now
    #[arg(long)]
    until: Option<DateTime<Utc>>,

    /// Only list the eligible raffles
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    draw::draw_due(args.until.unwrap_or_else(Utc::now), args.dry_run).await
}
