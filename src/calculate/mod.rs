//! Statistics calculation engine.
//!
//! Pure functions over fetched snapshots:
//! - Battle-log win rates, per-mode partitions and table rows
//! - Brawler power and accessory aggregates
//! - Club trophy range, mean and role histogram
//! - Trophy distribution buckets
//!
//! Nothing here performs I/O or mutates its input.

mod battles;
mod brawlers;
mod clubs;

pub use battles::{
    battle_outcome, battle_stats, cumulative_trophy_changes, format_battle_log, star_player_count,
};
pub use brawlers::{
    brawler_rows, brawler_stats, count_at_or_above_power, highest_trophy_brawler,
    victory_breakdown, DEFAULT_POWER_THRESHOLD,
};
pub use clubs::{
    club_stats, members_by_trophies, rounded_mean, trophy_distribution, DEFAULT_HISTOGRAM_BINS,
};
