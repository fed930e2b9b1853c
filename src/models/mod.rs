//! Core data models: API payloads and derived statistics.

mod battle;
mod brawler;
mod club;
mod player;
mod stats;
mod tag;

pub use battle::*;
pub use brawler::*;
pub use club::*;
pub use player::*;
pub use stats::*;
pub use tag::*;

use serde::{Deserialize, Serialize};

/// The `{"items": [...], "paging": {...}}` envelope used by list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemList<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}
