//! Battle log entries (`GET /players/{tag}/battlelog`).

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::tag::tags_equal;

/// Wire format of `battleTime`, e.g. `20240105T181512.000Z`.
const BATTLE_TIME_FORMAT: &str = "%Y%m%dT%H%M%S%.fZ";

/// A single historical battle. Entries are never modified after fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleLogEntry {
    pub battle_time: String,

    #[serde(default)]
    pub event: BattleEvent,

    pub battle: BattleDetail,
}

/// The event (mode + map rotation slot) the battle was played in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BattleEvent {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub map: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleDetail {
    #[serde(default)]
    pub mode: Option<String>,

    #[serde(default, rename = "type")]
    pub battle_type: Option<String>,

    /// `victory`, `defeat` or `draw` for team modes.
    #[serde(default)]
    pub result: Option<String>,

    #[serde(default)]
    pub duration: Option<u32>,

    /// Final placement in showdown modes.
    #[serde(default)]
    pub rank: Option<u32>,

    #[serde(default)]
    pub trophy_change: Option<i32>,

    #[serde(default)]
    pub star_player: Option<BattlePlayer>,

    #[serde(default)]
    pub teams: Vec<Vec<BattlePlayer>>,

    /// Free-for-all participants (solo showdown, duels).
    #[serde(default)]
    pub players: Vec<BattlePlayer>,
}

/// A participant in a battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattlePlayer {
    pub tag: String,
    pub name: String,

    #[serde(default)]
    pub brawler: Option<BattleBrawler>,

    /// Duels: one brawler per round.
    #[serde(default)]
    pub brawlers: Vec<BattleBrawler>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleBrawler {
    #[serde(default)]
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub power: i32,
    #[serde(default)]
    pub trophies: i32,
    #[serde(default)]
    pub trophy_change: Option<i32>,
}

impl BattleLogEntry {
    /// Parsed battle time; `None` if the API sent something unexpected.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        NaiveDateTime::parse_from_str(&self.battle_time, BATTLE_TIME_FORMAT)
            .ok()
            .map(|t| t.and_utc())
    }

    /// Game mode, preferring the battle's own field over the event's.
    pub fn mode(&self) -> &str {
        self.battle
            .mode
            .as_deref()
            .or(self.event.mode.as_deref())
            .unwrap_or("unknown")
    }

    /// All participants in listing order: team members first, then
    /// free-for-all players.
    pub fn participants(&self) -> impl Iterator<Item = &BattlePlayer> {
        self.battle
            .teams
            .iter()
            .flatten()
            .chain(self.battle.players.iter())
    }

    pub fn find_participant(&self, player_tag: &str) -> Option<&BattlePlayer> {
        self.participants().find(|p| tags_equal(&p.tag, player_tag))
    }

    pub fn star_player_tag(&self) -> Option<&str> {
        self.battle.star_player.as_ref().map(|p| p.tag.as_str())
    }

    pub fn is_star_player(&self, player_tag: &str) -> bool {
        self.star_player_tag()
            .is_some_and(|tag| tags_equal(tag, player_tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    const ENTRY_JSON: &str = r##"{
        "battleTime": "20240105T181512.000Z",
        "event": {"id": 15000007, "mode": "gemGrab", "map": "Hard Rock Mine"},
        "battle": {
            "mode": "gemGrab",
            "type": "ranked",
            "result": "victory",
            "duration": 120,
            "trophyChange": 8,
            "starPlayer": {"tag": "#AAA", "name": "A", "brawler": {"id": 1, "name": "SHELLY", "power": 11, "trophies": 700}},
            "teams": [
                [{"tag": "#AAA", "name": "A", "brawler": {"id": 1, "name": "SHELLY", "power": 11, "trophies": 700}}],
                [{"tag": "#BBB", "name": "B", "brawler": {"id": 2, "name": "COLT", "power": 9, "trophies": 650}}]
            ]
        }
    }"##;

    #[test]
    fn test_entry_deserialization() {
        let entry: BattleLogEntry = serde_json::from_str(ENTRY_JSON).unwrap();

        assert_eq!(entry.mode(), "gemGrab");
        assert_eq!(entry.battle.battle_type.as_deref(), Some("ranked"));
        assert_eq!(entry.battle.trophy_change, Some(8));
        assert_eq!(entry.participants().count(), 2);
        assert_eq!(entry.event.map.as_deref(), Some("Hard Rock Mine"));
    }

    #[test]
    fn test_timestamp_parsing() {
        let entry: BattleLogEntry = serde_json::from_str(ENTRY_JSON).unwrap();
        let ts = entry.timestamp().unwrap();

        assert_eq!(ts.year(), 2024);
        assert_eq!(ts.month(), 1);
        assert_eq!(ts.day(), 5);
        assert_eq!(ts.hour(), 18);
        assert_eq!(ts.minute(), 15);
    }

    #[test]
    fn test_bad_timestamp_is_none() {
        let mut entry: BattleLogEntry = serde_json::from_str(ENTRY_JSON).unwrap();
        entry.battle_time = "yesterday".to_string();
        assert!(entry.timestamp().is_none());
    }

    #[test]
    fn test_star_player_and_participant_lookup() {
        let entry: BattleLogEntry = serde_json::from_str(ENTRY_JSON).unwrap();

        assert!(entry.is_star_player("#aaa"));
        assert!(!entry.is_star_player("#BBB"));
        assert_eq!(entry.find_participant("BBB").unwrap().name, "B");
        assert!(entry.find_participant("#CCC").is_none());
    }

    #[test]
    fn test_mode_falls_back_to_event() {
        let json = r#"{"battleTime": "20240105T181512.000Z", "event": {"mode": "knockout"}, "battle": {}}"#;
        let entry: BattleLogEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.mode(), "knockout");

        let json = r#"{"battleTime": "20240105T181512.000Z", "battle": {}}"#;
        let entry: BattleLogEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.mode(), "unknown");
    }
}
