//! Player identity models.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::PlatformRegion;

/// Returned when a `name#tag` identifier is malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRiotId(pub String);

impl fmt::Display for InvalidRiotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid Riot ID '{}', expected 'GameName#TagLine'",
            self.0
        )
    }
}

impl std::error::Error for InvalidRiotId {}

/// A Riot ID: game name plus tag line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiotId {
    pub game_name: String,
    pub tag_line: String,
}

impl RiotId {
    pub fn new(game_name: impl Into<String>, tag_line: impl Into<String>) -> Self {
        Self {
            game_name: game_name.into(),
            tag_line: tag_line.into().to_uppercase(),
        }
    }

    /// Parse `name` or `name#tag`.
    ///
    /// A bare name gets the region's default tag. The tag is always
    /// upper-cased.
    pub fn parse(identifier: &str, region: PlatformRegion) -> Result<Self, InvalidRiotId> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(InvalidRiotId(identifier.to_string()));
        }

        if !identifier.contains('#') {
            return Ok(Self::new(identifier, region.default_tag()));
        }

        let mut parts = identifier.split('#');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(name), Some(tag), None) if !name.is_empty() && !tag.is_empty() => {
                Ok(Self::new(name, tag))
            }
            _ => Err(InvalidRiotId(identifier.to_string())),
        }
    }
}

impl fmt::Display for RiotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.game_name, self.tag_line)
    }
}

/// Region-scoped player identity, as returned by summoner-v4.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerIdentity {
    /// Globally unique player id
    pub puuid: String,

    /// Display name
    pub name: String,

    /// Encrypted summoner id (platform scoped)
    pub summoner_id: String,

    /// Encrypted account id
    pub account_id: String,

    pub profile_icon_id: u32,

    pub summoner_level: u32,

    /// Last profile modification, epoch milliseconds
    pub revision_date: i64,

    /// Riot ID the identity was resolved from
    pub riot_id: RiotId,

    /// Platform the identity belongs to
    pub region: PlatformRegion,
}
