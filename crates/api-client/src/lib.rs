pub mod client;

pub use client::{FetchOutcome, TornClient};
