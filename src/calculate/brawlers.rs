//! Brawler collection aggregates.

use std::collections::BTreeSet;

use crate::models::{
    Accessory, BrawlerRecord, BrawlerRow, BrawlerStats, HighestTrophyBrawler, PlayerProfile,
    VictoryBreakdown, MAX_POWER_LEVEL,
};

/// Power level a brawler needs to count as "high level".
pub const DEFAULT_POWER_THRESHOLD: u8 = 9;

/// Brawlers at or above `threshold`.
pub fn count_at_or_above_power(brawlers: &[BrawlerRecord], threshold: u8) -> u32 {
    brawlers.iter().filter(|b| b.power >= threshold).count() as u32
}

/// The brawler with the most trophies. Ties go to the lexicographically
/// first name.
pub fn highest_trophy_brawler(brawlers: &[BrawlerRecord]) -> Option<HighestTrophyBrawler> {
    brawlers
        .iter()
        .min_by(|a, b| b.trophies.cmp(&a.trophies).then_with(|| a.name.cmp(&b.name)))
        .map(|b| HighestTrophyBrawler {
            name: b.name.clone(),
            trophies: b.trophies,
        })
}

pub fn brawler_stats(brawlers: &[BrawlerRecord], power_threshold: u8) -> BrawlerStats {
    let total_trophies: u64 = brawlers.iter().map(|b| b.trophies as u64).sum();

    BrawlerStats {
        total_brawlers: brawlers.len() as u32,
        power_threshold,
        high_level_brawlers: count_at_or_above_power(brawlers, power_threshold),
        max_level_brawlers: count_at_or_above_power(brawlers, MAX_POWER_LEVEL),
        total_gears: brawlers.iter().map(|b| b.gears.len() as u32).sum(),
        total_star_powers: brawlers.iter().map(|b| b.star_powers.len() as u32).sum(),
        total_gadgets: brawlers.iter().map(|b| b.gadgets.len() as u32).sum(),
        average_trophies: if brawlers.is_empty() {
            None
        } else {
            Some(total_trophies as f64 / brawlers.len() as f64)
        },
        highest_trophy_brawler: highest_trophy_brawler(brawlers),
    }
}

/// Detail table rows, most trophies first (ties by name).
pub fn brawler_rows(brawlers: &[BrawlerRecord]) -> Vec<BrawlerRow> {
    let mut sorted: Vec<&BrawlerRecord> = brawlers.iter().collect();
    sorted.sort_by(|a, b| b.trophies.cmp(&a.trophies).then_with(|| a.name.cmp(&b.name)));

    sorted
        .into_iter()
        .map(|b| BrawlerRow {
            name: b.name.clone(),
            power: b.power,
            rank: b.rank,
            trophies: b.trophies,
            highest_trophies: b.highest_trophies,
            gears: accessory_names(&b.gears),
            star_powers: accessory_names(&b.star_powers),
            gadgets: accessory_names(&b.gadgets),
        })
        .collect()
}

fn accessory_names(set: &BTreeSet<Accessory>) -> String {
    if set.is_empty() {
        return "-".to_string();
    }
    set.iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn victory_breakdown(player: &PlayerProfile) -> VictoryBreakdown {
    VictoryBreakdown {
        trio: player.trio_victories,
        solo: player.solo_victories,
        duo: player.duo_victories,
    }
}
