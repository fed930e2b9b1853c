//! Clubs and club membership.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A club snapshot as returned by `GET /clubs/{tag}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClubProfile {
    pub tag: String,
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default, rename = "type")]
    pub club_type: ClubType,

    #[serde(default)]
    pub badge_id: Option<u64>,

    #[serde(default)]
    pub required_trophies: u32,

    #[serde(default)]
    pub trophies: u32,

    #[serde(default)]
    pub members: Vec<ClubMember>,
}

impl ClubProfile {
    /// Member tag → role. Tags are unique; if the payload repeats a tag the
    /// first occurrence wins.
    pub fn member_roles(&self) -> BTreeMap<&str, ClubRole> {
        let mut roles = BTreeMap::new();
        for member in &self.members {
            roles.entry(member.tag.as_str()).or_insert(member.role);
        }
        roles
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClubType {
    Open,
    InviteOnly,
    Closed,
    #[default]
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for ClubType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClubType::Open => write!(f, "open"),
            ClubType::InviteOnly => write!(f, "invite only"),
            ClubType::Closed => write!(f, "closed"),
            ClubType::Unknown => write!(f, "unknown"),
        }
    }
}

/// A club member (`GET /clubs/{tag}/members` items, or `members` in the club).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClubMember {
    pub tag: String,
    pub name: String,
    #[serde(default)]
    pub role: ClubRole,
    #[serde(default)]
    pub trophies: u32,
}

/// Club rank, ordered from lowest to highest.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum ClubRole {
    #[default]
    Member,
    Senior,
    VicePresident,
    President,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for ClubRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClubRole::Member => write!(f, "Member"),
            ClubRole::Senior => write!(f, "Senior"),
            ClubRole::VicePresident => write!(f, "Vice President"),
            ClubRole::President => write!(f, "President"),
            ClubRole::Unknown => write!(f, "Unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLUB_JSON: &str = r##"{
        "tag": "#2UU9ULJUR",
        "name": "Spike",
        "description": "chill club",
        "type": "inviteOnly",
        "badgeId": 8000000,
        "requiredTrophies": 25000,
        "trophies": 900000,
        "members": [
            {"tag": "#AAA", "name": "A", "nameColor": "0xff", "role": "president", "trophies": 40000},
            {"tag": "#BBB", "name": "B", "role": "vicePresident", "trophies": 30000},
            {"tag": "#CCC", "name": "C", "role": "member", "trophies": 26000},
            {"tag": "#AAA", "name": "A again", "role": "member", "trophies": 1}
        ]
    }"##;

    #[test]
    fn test_club_deserialization() {
        let club: ClubProfile = serde_json::from_str(CLUB_JSON).unwrap();

        assert_eq!(club.name, "Spike");
        assert_eq!(club.club_type, ClubType::InviteOnly);
        assert_eq!(club.required_trophies, 25000);
        assert_eq!(club.members.len(), 4);
        assert_eq!(club.members[1].role, ClubRole::VicePresident);
    }

    #[test]
    fn test_member_roles_unique_first_wins() {
        let club: ClubProfile = serde_json::from_str(CLUB_JSON).unwrap();
        let roles = club.member_roles();

        assert_eq!(roles.len(), 3);
        assert_eq!(roles["#AAA"], ClubRole::President);
    }

    #[test]
    fn test_unknown_role_and_type() {
        let member: ClubMember =
            serde_json::from_str(r##"{"tag": "#X", "name": "X", "role": "notAMember"}"##).unwrap();
        assert_eq!(member.role, ClubRole::Unknown);

        let club: ClubProfile =
            serde_json::from_str(r##"{"tag": "#X", "name": "X", "type": "secret"}"##).unwrap();
        assert_eq!(club.club_type, ClubType::Unknown);
    }

    #[test]
    fn test_role_display() {
        assert_eq!(ClubRole::VicePresident.to_string(), "Vice President");
        assert_eq!(ClubType::InviteOnly.to_string(), "invite only");
    }
}
