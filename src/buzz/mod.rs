// Buzz analysis — per-date keyword mentions and their join with prices.

pub mod aggregate;
pub mod merge;
pub mod periods;
