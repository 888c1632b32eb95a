//! Wire types for account-v1, summoner-v4 and match-v5.
//!
//! Only the fields we use are declared. Optional fields default so that
//! payload drift on the Riot side does not break decoding.

use std::collections::HashSet;

use serde::Deserialize;
use tracing::debug;

use crate::models::{
    resolve_champion_name, MatchParticipation, MatchRecord, PlatformRegion, PlayerIdentity, RiotId,
    ITEM_SLOTS,
};

/// account-v1 `by-riot-id` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDto {
    pub puuid: String,

    pub game_name: Option<String>,

    pub tag_line: Option<String>,
}

/// summoner-v4 `by-puuid` response.
///
/// Riot has renamed and dropped several of these fields over time, so every
/// one is optional and accepts its older spellings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummonerDto {
    pub puuid: Option<String>,

    #[serde(alias = "summonerId")]
    pub id: Option<String>,

    #[serde(rename = "accountId", alias = "account_id")]
    pub account_id: Option<String>,

    #[serde(alias = "displayName")]
    pub name: Option<String>,

    #[serde(rename = "profileIconId", alias = "profile_icon_id")]
    pub profile_icon_id: Option<u32>,

    #[serde(rename = "revisionDate", alias = "revision_date")]
    pub revision_date: Option<i64>,

    #[serde(rename = "summonerLevel", alias = "summoner_level")]
    pub summoner_level: Option<u32>,
}

impl SummonerDto {
    /// Merge with the account lookup into a [`PlayerIdentity`].
    ///
    /// Missing fields fall back to the account puuid, the game name, icon 0,
    /// level 1 and `now_ms` for the revision date.
    pub fn into_identity(
        self,
        account: &AccountDto,
        riot_id: RiotId,
        region: PlatformRegion,
        now_ms: i64,
    ) -> PlayerIdentity {
        PlayerIdentity {
            puuid: self
                .puuid
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| account.puuid.clone()),
            name: self
                .name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| riot_id.game_name.clone()),
            summoner_id: self.id.unwrap_or_default(),
            account_id: self.account_id.unwrap_or_default(),
            profile_icon_id: self.profile_icon_id.unwrap_or(0),
            summoner_level: self.summoner_level.unwrap_or(1),
            revision_date: self.revision_date.unwrap_or(now_ms),
            riot_id,
            region,
        }
    }
}

/// match-v5 match response.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchDto {
    #[serde(default)]
    pub metadata: MetadataDto,

    pub info: InfoDto,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataDto {
    #[serde(default)]
    pub match_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoDto {
    pub game_creation: i64,

    pub game_duration: u64,

    #[serde(default)]
    pub game_mode: String,

    #[serde(default)]
    pub game_type: String,

    #[serde(default)]
    pub queue_id: u32,

    #[serde(default)]
    pub participants: Vec<ParticipantDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDto {
    #[serde(default)]
    pub puuid: String,

    #[serde(default)]
    pub summoner_id: String,

    #[serde(default)]
    pub summoner_name: String,

    /// Replaces `summonerName` in newer payloads; both may be present.
    #[serde(default)]
    pub riot_id_game_name: String,

    pub champion_id: u32,

    pub champion_name: Option<String>,

    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub win: bool,

    #[serde(default)]
    pub item0: u32,
    #[serde(default)]
    pub item1: u32,
    #[serde(default)]
    pub item2: u32,
    #[serde(default)]
    pub item3: u32,
    #[serde(default)]
    pub item4: u32,
    #[serde(default)]
    pub item5: u32,
    #[serde(default)]
    pub item6: u32,

    #[serde(default)]
    pub total_damage_dealt_to_champions: u64,

    #[serde(default)]
    pub gold_earned: u64,

    #[serde(default)]
    pub total_minions_killed: u64,

    #[serde(default)]
    pub neutral_minions_killed: u64,
}

impl ParticipantDto {
    fn items(&self) -> [u32; ITEM_SLOTS] {
        [
            self.item0, self.item1, self.item2, self.item3, self.item4, self.item5, self.item6,
        ]
    }

    fn into_participation(self, match_id: &str, game_duration: u64) -> MatchParticipation {
        let items = self.items();
        let player_name = if self.riot_id_game_name.is_empty() {
            self.summoner_name
        } else {
            self.riot_id_game_name
        };
        MatchParticipation {
            match_id: match_id.to_string(),
            champion_name: resolve_champion_name(self.champion_id, self.champion_name.as_deref()),
            puuid: self.puuid,
            summoner_id: self.summoner_id,
            player_name,
            champion_id: self.champion_id,
            kills: self.kills,
            deaths: self.deaths,
            assists: self.assists,
            win: self.win,
            game_duration,
            items,
            total_damage_dealt: self.total_damage_dealt_to_champions,
            gold_earned: self.gold_earned,
            cs_total: self.total_minions_killed + self.neutral_minions_killed,
        }
    }
}

impl MatchDto {
    /// Convert to a [`MatchRecord`].
    ///
    /// `requested_id` is used when the payload omits `metadata.matchId`.
    /// Participants are de-duplicated by puuid, keeping the first entry.
    pub fn into_record(self, requested_id: &str) -> MatchRecord {
        let match_id = if self.metadata.match_id.is_empty() {
            requested_id.to_string()
        } else {
            self.metadata.match_id
        };
        let info = self.info;

        let mut seen = HashSet::new();
        let participants = info
            .participants
            .into_iter()
            .filter(|p| {
                if p.puuid.is_empty() || seen.insert(p.puuid.clone()) {
                    true
                } else {
                    debug!("{}: dropping duplicate participant {}", match_id, p.puuid);
                    false
                }
            })
            .map(|p| p.into_participation(&match_id, info.game_duration))
            .collect();

        MatchRecord {
            match_id,
            game_creation: info.game_creation,
            game_duration: info.game_duration,
            game_mode: info.game_mode,
            game_type: info.game_type,
            queue_id: info.queue_id,
            participants,
        }
    }
}
