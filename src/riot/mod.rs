//! Riot Games API client.
//!
//! Resolves Riot IDs to player identities and pulls match history through
//! account-v1, summoner-v4 and match-v5. All Riot URL layout lives here so
//! endpoint changes stay in one place; pacing, retries and circuit breaking
//! are handled by [`Fetcher`].

mod types;

pub use types::*;

use std::fmt;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;

use crate::fetch::{
    CredentialProvider, Endpoint, FetchError, Fetcher, FetcherConfig, RequestContext,
};
use crate::models::{
    InvalidRiotId, MatchRecord, PlatformRegion, PlayerIdentity, RiotId, TimeWindow,
};

/// Production host layout; `{host}` is a platform or routing code.
pub const DEFAULT_HOST_TEMPLATE: &str = "https://{host}.api.riotgames.com";

/// Largest `count` match-v5 accepts on the ids endpoint.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Default ceiling on match ids collected per listing.
pub const DEFAULT_MAX_MATCH_IDS: usize = 1000;

/// Errors surfaced by [`RiotClient`].
#[derive(Debug, Error)]
pub enum RiotError {
    #[error("Unsupported region: {0}")]
    RegionUnsupported(String),

    #[error(transparent)]
    InvalidRiotId(#[from] InvalidRiotId),

    #[error("Invalid time window: start {start} is after end {end}")]
    InvalidTimeWindow { start: i64, end: i64 },

    #[error("Player {riot_id} not found in {region}")]
    PlayerNotFound {
        riot_id: String,
        region: PlatformRegion,
    },

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Flat classification of a [`RiotError`], for logging and exit handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    RegionUnsupported,
    InvalidRiotId,
    InvalidTimeWindow,
    InvalidUrl,
    PlayerNotFound,
    Forbidden,
    NotFound,
    RateLimited,
    CircuitOpen,
    Upstream,
    Connection,
    Decode,
    Credential,
    ClientBuild,
}

impl ErrorKind {
    /// Caller mistakes, rejected before any network I/O.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ErrorKind::RegionUnsupported | ErrorKind::InvalidRiotId | ErrorKind::InvalidTimeWindow
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::RegionUnsupported => "region_unsupported",
            ErrorKind::InvalidRiotId => "invalid_riot_id",
            ErrorKind::InvalidTimeWindow => "invalid_time_window",
            ErrorKind::InvalidUrl => "invalid_url",
            ErrorKind::PlayerNotFound => "player_not_found",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not_found",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::CircuitOpen => "circuit_open",
            ErrorKind::Upstream => "upstream",
            ErrorKind::Connection => "connection",
            ErrorKind::Decode => "decode",
            ErrorKind::Credential => "credential",
            ErrorKind::ClientBuild => "client_build",
        };
        f.write_str(name)
    }
}

impl RiotError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RiotError::RegionUnsupported(_) => ErrorKind::RegionUnsupported,
            RiotError::InvalidRiotId(_) => ErrorKind::InvalidRiotId,
            RiotError::InvalidTimeWindow { .. } => ErrorKind::InvalidTimeWindow,
            RiotError::PlayerNotFound { .. } => ErrorKind::PlayerNotFound,
            RiotError::InvalidUrl(_) => ErrorKind::InvalidUrl,
            RiotError::Fetch(err) => match err {
                FetchError::ClientBuild(_) => ErrorKind::ClientBuild,
                FetchError::Credential(_) => ErrorKind::Credential,
                FetchError::Forbidden { .. } => ErrorKind::Forbidden,
                FetchError::NotFound { .. } => ErrorKind::NotFound,
                FetchError::RateLimited { .. } => ErrorKind::RateLimited,
                FetchError::CircuitOpen { .. } => ErrorKind::CircuitOpen,
                FetchError::Upstream { .. } => ErrorKind::Upstream,
                FetchError::Connection { .. } => ErrorKind::Connection,
                FetchError::Decode { .. } => ErrorKind::Decode,
            },
        }
    }
}

/// Client-level knobs that are not about individual requests.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base URL template with a `{host}` placeholder
    pub host_template: String,

    /// Page size used by [`RiotClient::fetch_match_history`]
    pub page_size: u32,

    /// Stop collecting match ids past this many
    pub max_match_ids: usize,

    /// Fetch details for at most this many matches (`None` = all)
    pub max_match_details: Option<usize>,

    /// Detail requests in flight at once
    pub detail_concurrency: usize,

    /// Pause between starting consecutive detail fetches
    pub detail_fetch_delay: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            host_template: DEFAULT_HOST_TEMPLATE.to_string(),
            page_size: MAX_PAGE_SIZE,
            max_match_ids: DEFAULT_MAX_MATCH_IDS,
            max_match_details: None,
            detail_concurrency: 1,
            detail_fetch_delay: Duration::from_millis(100),
        }
    }
}

/// A match whose detail could not be fetched.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedMatch {
    pub match_id: String,
    pub reason: String,
}

/// Result of [`RiotClient::fetch_match_history`].
#[derive(Debug, Clone, Serialize)]
pub struct MatchHistory {
    /// Ids returned by the listing, before the detail cap
    pub match_ids_found: usize,

    pub matches: Vec<MatchRecord>,

    pub skipped: Vec<SkippedMatch>,
}

/// Riot API client.
pub struct RiotClient {
    fetcher: Fetcher,
    options: ClientOptions,
}

impl RiotClient {
    pub fn new(
        fetcher_config: FetcherConfig,
        credentials: CredentialProvider,
        options: ClientOptions,
    ) -> Result<Self, RiotError> {
        let fetcher = Fetcher::new(fetcher_config, credentials)?;
        Ok(Self::with_fetcher(fetcher, options))
    }

    pub fn with_fetcher(fetcher: Fetcher, options: ClientOptions) -> Self {
        Self { fetcher, options }
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Parse a platform region code, rejecting unknown ones.
    pub fn parse_region(code: &str) -> Result<PlatformRegion, RiotError> {
        code.parse()
            .map_err(|_| RiotError::RegionUnsupported(code.trim().to_string()))
    }

    /// Build `{template with host}/{segments...}`, percent-encoding each
    /// segment.
    fn endpoint_url(&self, host: &str, segments: &[&str]) -> Result<Url, RiotError> {
        let base = self.options.host_template.replace("{host}", host);
        let mut url =
            Url::parse(&base).map_err(|e| RiotError::InvalidUrl(format!("{}: {}", base, e)))?;

        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| RiotError::InvalidUrl(base.clone()))?;
            path.pop_if_empty().extend(segments);
        }

        Ok(url)
    }

    /// Resolve `name#tag` (or a bare name) in `region` to a player identity.
    ///
    /// Two calls: account-v1 on the routing host for the puuid, then
    /// summoner-v4 on the platform host.
    pub async fn resolve_player(
        &self,
        identifier: &str,
        region: &str,
    ) -> Result<PlayerIdentity, RiotError> {
        let region = Self::parse_region(region)?;
        let riot_id = RiotId::parse(identifier, region)?;

        let account_url = self.endpoint_url(
            region.routing().code(),
            &[
                "riot",
                "account",
                "v1",
                "accounts",
                "by-riot-id",
                &riot_id.game_name,
                &riot_id.tag_line,
            ],
        )?;
        let account: AccountDto = self
            .fetcher
            .get_json(RequestContext::new(Endpoint::Account, region), &account_url)
            .await
            .map_err(|e| player_not_found(e, &riot_id, region))?;

        debug!("Resolved {} to puuid {}", riot_id, account.puuid);

        // Prefer Riot's canonical spelling of the name.
        let riot_id = match (&account.game_name, &account.tag_line) {
            (Some(name), Some(tag)) if !name.is_empty() && !tag.is_empty() => {
                RiotId::new(name.clone(), tag.clone())
            }
            _ => riot_id,
        };

        let summoner_url = self.endpoint_url(
            region.code(),
            &["lol", "summoner", "v4", "summoners", "by-puuid", &account.puuid],
        )?;
        let summoner: SummonerDto = self
            .fetcher
            .get_json(
                RequestContext::new(Endpoint::Summoner, region),
                &summoner_url,
            )
            .await
            .map_err(|e| player_not_found(e, &riot_id, region))?;

        let identity =
            summoner.into_identity(&account, riot_id, region, Utc::now().timestamp_millis());
        info!(
            "Resolved {} in {} (level {})",
            identity.riot_id, region, identity.summoner_level
        );
        Ok(identity)
    }

    /// List match ids for `puuid` inside `window`, newest first.
    ///
    /// Pages until a short page comes back. Stops at the configured ceiling,
    /// truncating with a warning.
    pub async fn list_match_ids(
        &self,
        puuid: &str,
        region: PlatformRegion,
        window: TimeWindow,
        page_size: u32,
    ) -> Result<Vec<String>, RiotError> {
        if !window.is_valid() {
            return Err(RiotError::InvalidTimeWindow {
                start: window.start,
                end: window.end,
            });
        }

        let count = page_size.clamp(1, MAX_PAGE_SIZE);
        let ceiling = self.options.max_match_ids;
        let context = RequestContext::new(Endpoint::MatchIds, region);

        let mut ids: Vec<String> = Vec::new();
        let mut start = 0usize;

        loop {
            let mut url = self.endpoint_url(
                region.routing().code(),
                &["lol", "match", "v5", "matches", "by-puuid", puuid, "ids"],
            )?;
            url.query_pairs_mut()
                .append_pair("start", &start.to_string())
                .append_pair("count", &count.to_string())
                .append_pair("startTime", &window.start.to_string())
                .append_pair("endTime", &window.end.to_string());

            let page: Vec<String> = self.fetcher.get_json(context, &url).await?;
            let received = page.len();
            ids.extend(page);

            debug!(
                "Match ids page at {}: {} ids ({} total)",
                start,
                received,
                ids.len()
            );

            if ids.len() >= ceiling {
                if ids.len() > ceiling || received as u32 == count {
                    warn!(
                        "Match id ceiling of {} reached for {}, ignoring older matches",
                        ceiling, puuid
                    );
                }
                ids.truncate(ceiling);
                break;
            }

            if (received as u32) < count {
                break;
            }
            start += received;
        }

        Ok(ids)
    }

    /// Fetch one match.
    pub async fn get_match_detail(
        &self,
        match_id: &str,
        region: PlatformRegion,
    ) -> Result<MatchRecord, RiotError> {
        let url = self.endpoint_url(
            region.routing().code(),
            &["lol", "match", "v5", "matches", match_id],
        )?;
        let dto: MatchDto = self
            .fetcher
            .get_json(RequestContext::new(Endpoint::MatchDetail, region), &url)
            .await?;
        Ok(dto.into_record(match_id))
    }

    /// List ids in `window` and fetch their details.
    ///
    /// Matches that fail individually are recorded in
    /// [`MatchHistory::skipped`]. An open circuit aborts the whole fetch.
    pub async fn fetch_match_history(
        &self,
        identity: &PlayerIdentity,
        window: TimeWindow,
    ) -> Result<MatchHistory, RiotError> {
        let region = identity.region;
        let ids = self
            .list_match_ids(&identity.puuid, region, window, self.options.page_size)
            .await?;
        let match_ids_found = ids.len();

        let selected: Vec<String> = match self.options.max_match_details {
            Some(cap) if cap < ids.len() => {
                info!(
                    "Fetching details for {} of {} matches (detail cap)",
                    cap, match_ids_found
                );
                ids.into_iter().take(cap).collect()
            }
            _ => ids,
        };

        let delay = self.options.detail_fetch_delay;
        let mut details = std::pin::pin!(stream::iter(selected.into_iter().enumerate())
            .map(|(index, match_id)| async move {
                if index > 0 && !delay.is_zero() {
                    sleep(delay).await;
                }
                let result = self.get_match_detail(&match_id, region).await;
                (match_id, result)
            })
            .buffered(self.options.detail_concurrency.max(1)));

        let mut matches = Vec::new();
        let mut skipped = Vec::new();

        while let Some((match_id, result)) = details.next().await {
            match result {
                Ok(record) => matches.push(record),
                Err(RiotError::Fetch(err @ FetchError::CircuitOpen { .. })) => {
                    warn!("Aborting match history fetch: {}", err);
                    return Err(err.into());
                }
                Err(e) => {
                    warn!("Skipping match {}: {}", match_id, e);
                    skipped.push(SkippedMatch {
                        match_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Fetched {} matches for {} ({} skipped)",
            matches.len(),
            identity.riot_id,
            skipped.len()
        );

        Ok(MatchHistory {
            match_ids_found,
            matches,
            skipped,
        })
    }
}

fn player_not_found(err: FetchError, riot_id: &RiotId, region: PlatformRegion) -> RiotError {
    match err {
        FetchError::NotFound { .. } => RiotError::PlayerNotFound {
            riot_id: riot_id.to_string(),
            region,
        },
        other => other.into(),
    }
}
