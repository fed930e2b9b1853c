//! Render-ready view models.

use serde::{Deserialize, Serialize};

use super::Section;
use crate::models::{
    BattleRow, BattleStats, BrawlerInfo, BrawlerRow, BrawlerStats, ClubMember, ClubRole,
    ClubStats, ClubType, RankingEntry, TrophyBucket, VictoryBreakdown,
};

/// Header facts for one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerOverview {
    pub tag: String,
    pub name: String,
    pub name_color: Option<String>,
    pub trophies: u32,
    pub highest_trophies: u32,
    pub exp_level: u32,
    pub victories: VictoryBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClubSummary {
    pub tag: String,
    pub name: String,
    pub description: Option<String>,
    pub club_type: ClubType,
    pub required_trophies: u32,
    pub trophies: u32,
    pub member_count: u32,
    /// The viewing player's role, when they appear in the member list.
    pub player_role: Option<ClubRole>,
}

/// Recent battles for one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleReport {
    pub stats: BattleStats,
    pub rows: Vec<BattleRow>,
    /// Cumulative trophy change, oldest battle first.
    pub trophy_trend: Vec<i32>,
}

/// Everything shown for one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerPanel {
    pub overview: PlayerOverview,
    /// `None` when the player is not in a club.
    pub club: Option<Section<ClubSummary>>,
    pub brawler_stats: BrawlerStats,
    pub brawlers: Vec<BrawlerRow>,
    pub battles: Section<BattleReport>,
}

/// Side-by-side numbers for the comparison charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadToHeadEntry {
    pub name: String,
    pub tag: String,
    pub trophies: u32,
    pub highest_trophies: u32,
    pub victories: VictoryBreakdown,
    pub trophy_trend: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonView {
    pub first: Section<PlayerPanel>,
    pub second: Section<PlayerPanel>,
    /// Present only when both players loaded.
    pub head_to_head: Option<[HeadToHeadEntry; 2]>,
    /// `None` when no summary was requested.
    pub summary: Option<Section<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClubOverview {
    pub summary: ClubSummary,
    pub stats: ClubStats,
    pub members: Vec<ClubMember>,
    pub trophy_distribution: Vec<TrophyBucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrawlerOverview {
    pub brawler: BrawlerInfo,
    pub rankings: Section<Vec<RankingEntry>>,
}
