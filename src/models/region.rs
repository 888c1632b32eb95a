//! Platform and routing regions.
//!
//! Riot partitions its API into per-shard "platform" hosts (summoner lookups)
//! and continental "routing" hosts (accounts and match-v5).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A platform (shard) region code such as `na1` or `euw1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformRegion {
    Na1,
    Euw1,
    Eun1,
    Kr,
    Br1,
    La1,
    La2,
    Oc1,
    Ru,
    Tr1,
    Jp1,
    Sg2,
    Tw2,
    Vn2,
}

/// A continental routing region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingRegion {
    Americas,
    Europe,
    Asia,
}

/// Returned when a region code is not one of the supported platforms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRegion(pub String);

impl fmt::Display for UnknownRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported region '{}'", self.0)
    }
}

impl std::error::Error for UnknownRegion {}

impl PlatformRegion {
    /// Every supported platform, in the order Riot lists them.
    pub const ALL: [PlatformRegion; 14] = [
        PlatformRegion::Na1,
        PlatformRegion::Euw1,
        PlatformRegion::Eun1,
        PlatformRegion::Kr,
        PlatformRegion::Br1,
        PlatformRegion::La1,
        PlatformRegion::La2,
        PlatformRegion::Oc1,
        PlatformRegion::Ru,
        PlatformRegion::Tr1,
        PlatformRegion::Jp1,
        PlatformRegion::Sg2,
        PlatformRegion::Tw2,
        PlatformRegion::Vn2,
    ];

    /// Lower-case code used in host names.
    pub fn code(&self) -> &'static str {
        match self {
            PlatformRegion::Na1 => "na1",
            PlatformRegion::Euw1 => "euw1",
            PlatformRegion::Eun1 => "eun1",
            PlatformRegion::Kr => "kr",
            PlatformRegion::Br1 => "br1",
            PlatformRegion::La1 => "la1",
            PlatformRegion::La2 => "la2",
            PlatformRegion::Oc1 => "oc1",
            PlatformRegion::Ru => "ru",
            PlatformRegion::Tr1 => "tr1",
            PlatformRegion::Jp1 => "jp1",
            PlatformRegion::Sg2 => "sg2",
            PlatformRegion::Tw2 => "tw2",
            PlatformRegion::Vn2 => "vn2",
        }
    }

    /// Continental routing region that owns this platform.
    pub fn routing(&self) -> RoutingRegion {
        match self {
            PlatformRegion::Na1
            | PlatformRegion::Br1
            | PlatformRegion::La1
            | PlatformRegion::La2 => RoutingRegion::Americas,
            PlatformRegion::Euw1
            | PlatformRegion::Eun1
            | PlatformRegion::Tr1
            | PlatformRegion::Ru => RoutingRegion::Europe,
            PlatformRegion::Kr
            | PlatformRegion::Jp1
            | PlatformRegion::Oc1
            | PlatformRegion::Sg2
            | PlatformRegion::Tw2
            | PlatformRegion::Vn2 => RoutingRegion::Asia,
        }
    }

    /// Tag line assumed when a player is looked up by bare game name.
    pub fn default_tag(&self) -> &'static str {
        match self {
            PlatformRegion::Kr => "KR1",
            PlatformRegion::Na1 => "NA1",
            PlatformRegion::Euw1 => "EUW",
            PlatformRegion::Eun1 => "EUNE",
            PlatformRegion::Sg2 => "SG2",
            PlatformRegion::Tw2 => "TW2",
            PlatformRegion::Vn2 => "VN2",
            _ => "NA1",
        }
    }

    /// Human-readable region name.
    pub fn display_name(&self) -> &'static str {
        match self {
            PlatformRegion::Na1 => "North America",
            PlatformRegion::Euw1 => "Europe West",
            PlatformRegion::Eun1 => "Europe Nordic & East",
            PlatformRegion::Kr => "Korea",
            PlatformRegion::Br1 => "Brazil",
            PlatformRegion::La1 => "Latin America North",
            PlatformRegion::La2 => "Latin America South",
            PlatformRegion::Oc1 => "Oceania",
            PlatformRegion::Ru => "Russia",
            PlatformRegion::Tr1 => "Turkey",
            PlatformRegion::Jp1 => "Japan",
            PlatformRegion::Sg2 => "Singapore",
            PlatformRegion::Tw2 => "Taiwan",
            PlatformRegion::Vn2 => "Vietnam",
        }
    }
}

impl RoutingRegion {
    pub fn code(&self) -> &'static str {
        match self {
            RoutingRegion::Americas => "americas",
            RoutingRegion::Europe => "europe",
            RoutingRegion::Asia => "asia",
        }
    }
}

impl FromStr for PlatformRegion {
    type Err = UnknownRegion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_lowercase();
        PlatformRegion::ALL
            .into_iter()
            .find(|r| r.code() == code)
            .ok_or_else(|| UnknownRegion(s.to_string()))
    }
}

impl fmt::Display for PlatformRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl fmt::Display for RoutingRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
