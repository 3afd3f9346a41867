//! # Documents
//!
//! Shapes persisted by the document store and shared between the server and
//! the batch draw tool.
//!
//! ## Raffle
//! - Owns its tickets, the main winner, the lucky number and the lucky number winners
//! - Lifecycle is `Open -> Drawn -> Claimed`, both transitions irreversible
//! - Guest tickets are purged as part of the draw commit
//!
//! ## User
//! - Separate aggregate, referenced by id from tickets and `createdBy`
//! - Only a cached display name ever lands inside a raffle
use std::ops::RangeInclusive;

pub mod raffle;
pub mod user;

/// Cash pool split evenly between lucky number winners.
pub const PRIZE_POOL: f64 = 100.0;

/// Most numbers a single ticket may carry.
pub const MAX_NUMBERS: usize = 5;

pub const LUCKY_NUMBERS: RangeInclusive<u8> = 1..=40;

pub const GUEST_NAME: &str = "Guest";
pub const UNKNOWN_NAME: &str = "Unknown";
