//! Player profiles and the brawlers they own.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Highest brawler power level.
pub const MAX_POWER_LEVEL: u8 = 11;

/// A player snapshot as returned by `GET /players/{tag}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    pub tag: String,
    pub name: String,

    #[serde(default)]
    pub name_color: Option<String>,

    pub trophies: u32,
    pub highest_trophies: u32,

    #[serde(default)]
    pub exp_level: u32,

    #[serde(default)]
    pub exp_points: u32,

    #[serde(default, rename = "3vs3Victories")]
    pub trio_victories: u32,

    #[serde(default)]
    pub solo_victories: u32,

    #[serde(default)]
    pub duo_victories: u32,

    /// The API sends `{}` for club-less players, hence the optional fields.
    #[serde(default)]
    pub club: Option<ClubRef>,

    #[serde(default)]
    pub brawlers: Vec<BrawlerRecord>,
}

impl PlayerProfile {
    /// Tag of the player's club, if they are in one.
    pub fn club_tag(&self) -> Option<&str> {
        self.club
            .as_ref()
            .and_then(|c| c.tag.as_deref())
            .filter(|t| !t.is_empty())
    }

    pub fn total_victories(&self) -> u32 {
        self.trio_victories + self.solo_victories + self.duo_victories
    }
}

/// Short club reference embedded in player and ranking payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClubRef {
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// A gear, star power or gadget equipped on a brawler.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Accessory {
    pub id: u64,
    pub name: String,
}

/// One brawler in a player's collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrawlerRecord {
    #[serde(default)]
    pub id: u64,
    pub name: String,
    pub power: u8,
    #[serde(default)]
    pub rank: u32,
    pub trophies: u32,
    #[serde(default)]
    pub highest_trophies: u32,

    #[serde(default)]
    pub gears: BTreeSet<Accessory>,

    #[serde(default)]
    pub star_powers: BTreeSet<Accessory>,

    #[serde(default)]
    pub gadgets: BTreeSet<Accessory>,
}

impl BrawlerRecord {
    /// Number of equipped gears, star powers and gadgets.
    pub fn accessory_count(&self) -> usize {
        self.gears.len() + self.star_powers.len() + self.gadgets.len()
    }

    pub fn is_max_power(&self) -> bool {
        self.power >= MAX_POWER_LEVEL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYER_JSON: &str = r##"{
        "tag": "#2YJQ8LRCG",
        "name": "Spoony",
        "nameColor": "0xffffffff",
        "icon": {"id": 28000000},
        "trophies": 31250,
        "highestTrophies": 32010,
        "expLevel": 212,
        "expPoints": 240000,
        "3vs3Victories": 9100,
        "soloVictories": 820,
        "duoVictories": 1430,
        "club": {"tag": "#2UU9ULJUR", "name": "Spike"},
        "brawlers": [
            {
                "id": 16000000,
                "name": "SHELLY",
                "power": 11,
                "rank": 30,
                "trophies": 1000,
                "highestTrophies": 1020,
                "gears": [{"id": 62000000, "name": "SPEED", "level": 3}],
                "starPowers": [{"id": 23000076, "name": "SHELL SHOCK"}],
                "gadgets": [{"id": 23000255, "name": "FAST FORWARD"}]
            },
            {
                "id": 16000001,
                "name": "COLT",
                "power": 7,
                "rank": 20,
                "trophies": 500,
                "highestTrophies": 540
            }
        ]
    }"##;

    #[test]
    fn test_player_deserialization() {
        let player: PlayerProfile = serde_json::from_str(PLAYER_JSON).unwrap();

        assert_eq!(player.name, "Spoony");
        assert_eq!(player.trio_victories, 9100);
        assert_eq!(player.total_victories(), 9100 + 820 + 1430);
        assert_eq!(player.club_tag(), Some("#2UU9ULJUR"));
        assert_eq!(player.brawlers.len(), 2);
        assert_eq!(player.brawlers[0].accessory_count(), 3);
        assert!(player.brawlers[0].is_max_power());
        assert_eq!(player.brawlers[1].accessory_count(), 0);
    }

    #[test]
    fn test_player_without_club() {
        let json = r##"{"tag": "#ABC", "name": "Solo", "trophies": 1, "highestTrophies": 2, "club": {}}"##;
        let player: PlayerProfile = serde_json::from_str(json).unwrap();

        assert!(player.club.is_some());
        assert_eq!(player.club_tag(), None);
        assert!(player.brawlers.is_empty());
    }

    #[test]
    fn test_accessories_are_deduplicated() {
        let json = r#"{
            "name": "BULL", "power": 9, "trophies": 300,
            "gadgets": [{"id": 1, "name": "A"}, {"id": 1, "name": "A"}]
        }"#;
        let brawler: BrawlerRecord = serde_json::from_str(json).unwrap();
        assert_eq!(brawler.gadgets.len(), 1);
    }
}
