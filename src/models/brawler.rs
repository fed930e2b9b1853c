//! Brawler catalogue and global rankings.

use serde::{Deserialize, Serialize};

use super::player::{Accessory, ClubRef};

/// A brawler from `GET /brawlers` or `GET /brawlers/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrawlerInfo {
    pub id: u64,
    pub name: String,

    #[serde(default)]
    pub star_powers: Vec<Accessory>,

    #[serde(default)]
    pub gadgets: Vec<Accessory>,
}

/// One row of `GET /rankings/global/brawlers/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub tag: String,
    pub name: String,
    pub trophies: u32,
    #[serde(default)]
    pub rank: u32,
    #[serde(default)]
    pub club: Option<ClubRef>,
}

impl RankingEntry {
    pub fn club_name(&self) -> Option<&str> {
        self.club.as_ref().and_then(|c| c.name.as_deref())
    }
}
