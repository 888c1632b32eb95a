//! Match records and per-player participation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of item slots on a participant (six inventory slots plus trinket).
pub const ITEM_SLOTS: usize = 7;

/// One player's line in one match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchParticipation {
    pub match_id: String,

    /// Player the line belongs to
    pub puuid: String,

    #[serde(default)]
    pub summoner_id: String,

    /// In-game name at the time of the match
    #[serde(default)]
    pub player_name: String,

    pub champion_id: u32,
    pub champion_name: String,

    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub win: bool,

    /// Match length as reported by the API
    pub game_duration: u64,

    #[serde(default)]
    pub items: [u32; ITEM_SLOTS],

    /// Damage dealt to champions
    #[serde(default)]
    pub total_damage_dealt: u64,

    #[serde(default)]
    pub gold_earned: u64,

    /// Lane minions plus neutral monsters
    #[serde(default)]
    pub cs_total: u64,
}

/// A match with every participant's line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Match id, prefixed with the platform (e.g. `NA1_4821339456`)
    pub match_id: String,

    /// Creation time, epoch milliseconds
    pub game_creation: i64,

    pub game_duration: u64,

    #[serde(default)]
    pub game_mode: String,

    #[serde(default)]
    pub game_type: String,

    #[serde(default)]
    pub queue_id: u32,

    pub participants: Vec<MatchParticipation>,
}

impl MatchRecord {
    /// Find the participation belonging to `puuid`. An empty id matches nobody.
    pub fn participation_for(&self, puuid: &str) -> Option<&MatchParticipation> {
        if puuid.is_empty() {
            return None;
        }
        self.participants.iter().find(|p| p.puuid == puuid)
    }

    /// Creation time as a UTC timestamp. Out-of-range values map to the epoch.
    pub fn created_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.game_creation).unwrap_or_default()
    }

    /// Lower-cased platform prefix of the match id (`NA1_123` → `na1`).
    pub fn platform_prefix(&self) -> Option<String> {
        self.match_id
            .split_once('_')
            .map(|(prefix, _)| prefix.to_ascii_lowercase())
            .filter(|prefix| !prefix.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn record(match_id: &str, game_creation: i64) -> MatchRecord {
        MatchRecord {
            match_id: match_id.to_string(),
            game_creation,
            game_duration: 1800,
            game_mode: "CLASSIC".to_string(),
            game_type: "MATCHED_GAME".to_string(),
            queue_id: 420,
            participants: vec![],
        }
    }

    #[test]
    fn test_platform_prefix() {
        assert_eq!(
            record("NA1_4821339456", 0).platform_prefix(),
            Some("na1".to_string())
        );
        assert_eq!(record("4821339456", 0).platform_prefix(), None);
        assert_eq!(record("_123", 0).platform_prefix(), None);
    }

    #[test]
    fn test_created_at() {
        // 2024-03-15T12:00:00Z
        let created = record("EUW1_1", 1_710_504_000_000).created_at();
        assert_eq!(created.year(), 2024);
        assert_eq!(created.month(), 3);
        assert_eq!(created.day(), 15);
    }

    #[test]
    fn test_participation_missing_optional_fields() {
        let json = r#"{
            "match_id": "NA1_1",
            "puuid": "p1",
            "champion_id": 1,
            "champion_name": "Annie",
            "kills": 1,
            "deaths": 2,
            "assists": 3,
            "win": true,
            "game_duration": 1500
        }"#;
        let p: MatchParticipation = serde_json::from_str(json).unwrap();
        assert_eq!(p.items, [0; ITEM_SLOTS]);
        assert_eq!(p.cs_total, 0);
        assert!(p.summoner_id.is_empty());
    }
}
