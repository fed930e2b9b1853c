//! Derived statistics models.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::club::ClubRole;

/// Outcome of a battle from the viewing player's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BattleOutcome {
    Victory,
    Defeat,
    Draw,
    /// No result and no placement (e.g. friendly or bot battles).
    Unknown,
}

impl std::fmt::Display for BattleOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BattleOutcome::Victory => write!(f, "Victory"),
            BattleOutcome::Defeat => write!(f, "Defeat"),
            BattleOutcome::Draw => write!(f, "Draw"),
            BattleOutcome::Unknown => write!(f, "No Result"),
        }
    }
}

/// Victory / defeat / draw tallies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub victories: u32,
    pub defeats: u32,
    pub draws: u32,
    pub unknown: u32,
}

impl OutcomeCounts {
    pub fn record(&mut self, outcome: BattleOutcome) {
        match outcome {
            BattleOutcome::Victory => self.victories += 1,
            BattleOutcome::Defeat => self.defeats += 1,
            BattleOutcome::Draw => self.draws += 1,
            BattleOutcome::Unknown => self.unknown += 1,
        }
    }

    /// Battles with a known outcome.
    pub fn decided(&self) -> u32 {
        self.victories + self.defeats + self.draws
    }

    pub fn total(&self) -> u32 {
        self.decided() + self.unknown
    }

    /// Victories as a percentage (0–100) of decided battles.
    ///
    /// `None` means there is no data to compute a rate from.
    pub fn win_rate(&self) -> Option<f64> {
        match self.decided() {
            0 => None,
            decided => Some(self.victories as f64 / decided as f64 * 100.0),
        }
    }
}

/// Battle-log summary for one player.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BattleStats {
    pub overall: OutcomeCounts,
    pub by_mode: BTreeMap<String, OutcomeCounts>,
    /// Percentage of decided battles won; `None` when there are none.
    pub win_rate: Option<f64>,
    pub star_player_count: u32,
    pub net_trophy_change: i32,
}

/// One formatted battle-log row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleRow {
    pub time: String,
    pub brawler: String,
    pub power: i32,
    pub trophies: i32,
    pub mode: String,
    pub map: String,
    pub battle_type: String,
    pub result: BattleOutcome,
    pub duration_secs: Option<u32>,
    pub trophy_change: Option<i32>,
    pub rank: Option<u32>,
    pub star_player: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighestTrophyBrawler {
    pub name: String,
    pub trophies: u32,
}

/// Aggregates over a player's brawler collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrawlerStats {
    pub total_brawlers: u32,
    /// The power level `high_level_brawlers` was counted against.
    pub power_threshold: u8,
    pub high_level_brawlers: u32,
    pub max_level_brawlers: u32,
    pub total_gears: u32,
    pub total_star_powers: u32,
    pub total_gadgets: u32,
    pub average_trophies: Option<f64>,
    pub highest_trophy_brawler: Option<HighestTrophyBrawler>,
}

impl BrawlerStats {
    pub fn total_accessories(&self) -> u32 {
        self.total_gears + self.total_star_powers + self.total_gadgets
    }
}

/// One row of the brawler detail table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrawlerRow {
    pub name: String,
    pub power: u8,
    pub rank: u32,
    pub trophies: u32,
    pub highest_trophies: u32,
    pub gears: String,
    pub star_powers: String,
    pub gadgets: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrophyRange {
    pub min: u32,
    pub max: u32,
}

/// Aggregates over a club's member list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClubStats {
    pub member_count: u32,
    pub trophy_range: Option<TrophyRange>,
    /// Mean member trophies, rounded half up.
    pub mean_trophies: Option<u32>,
    pub role_histogram: BTreeMap<ClubRole, u32>,
}

/// A histogram bucket covering `lower..=upper` trophies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrophyBucket {
    pub lower: u32,
    pub upper: u32,
    pub count: u32,
}

/// Lifetime victory counters from the player profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VictoryBreakdown {
    pub trio: u32,
    pub solo: u32,
    pub duo: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_counts_win_rate() {
        let mut counts = OutcomeCounts::default();
        assert_eq!(counts.win_rate(), None);

        counts.record(BattleOutcome::Victory);
        counts.record(BattleOutcome::Victory);
        counts.record(BattleOutcome::Victory);
        counts.record(BattleOutcome::Defeat);
        counts.record(BattleOutcome::Unknown);

        assert_eq!(counts.decided(), 4);
        assert_eq!(counts.total(), 5);
        assert_eq!(counts.win_rate(), Some(75.0));
    }

    #[test]
    fn test_only_unknown_outcomes_is_no_data() {
        let mut counts = OutcomeCounts::default();
        counts.record(BattleOutcome::Unknown);
        assert_eq!(counts.win_rate(), None);
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(BattleOutcome::Victory.to_string(), "Victory");
        assert_eq!(BattleOutcome::Unknown.to_string(), "No Result");
    }

    #[test]
    fn test_role_histogram_serializes_with_role_keys() {
        let mut stats = ClubStats::default();
        stats.role_histogram.insert(ClubRole::VicePresident, 2);

        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"vicePresident\":2"));
    }
}
