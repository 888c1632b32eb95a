//! Resilient HTTP fetching for the Riot API.
//!
//! Every request goes through [`Fetcher::get_json`], which applies:
//! - fixed-interval pacing ([`RateLimiter`])
//! - `Retry-After` handling for 429s
//! - one credential refresh on 403
//! - exponential backoff with jitter for other failures
//! - a failure-counting [`CircuitBreaker`]

mod circuit;
mod credentials;
mod limiter;

pub use circuit::CircuitBreaker;
pub use credentials::{
    CredentialProvider, CredentialSource, EnvSecretStore, FileSecretStore, SecretError,
    SecretStore,
};
pub use limiter::RateLimiter;

use std::fmt;
use std::time::Duration;

use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

use crate::models::PlatformRegion;

/// Header carrying the API key.
pub const RIOT_TOKEN_HEADER: &str = "X-Riot-Token";

/// Longest response body excerpt kept in error messages.
const ERROR_BODY_PREVIEW: usize = 300;

/// Which API a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Account,
    Summoner,
    MatchIds,
    MatchDetail,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Endpoint::Account => "account-v1",
            Endpoint::Summoner => "summoner-v4",
            Endpoint::MatchIds => "match-v5 ids",
            Endpoint::MatchDetail => "match-v5 detail",
        };
        f.write_str(name)
    }
}

/// Identifies a request in errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    pub endpoint: Endpoint,
    pub region: PlatformRegion,
}

impl RequestContext {
    pub fn new(endpoint: Endpoint, region: PlatformRegion) -> Self {
        Self { endpoint, region }
    }
}

impl fmt::Display for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.endpoint, self.region)
    }
}

/// Errors that can occur during fetching.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[from] reqwest::Error),

    #[error("API key unavailable: {0}")]
    Credential(#[from] SecretError),

    #[error("{context}: forbidden after {attempts} attempt(s), check the API key")]
    Forbidden {
        context: RequestContext,
        attempts: u32,
    },

    #[error("{context}: not found")]
    NotFound { context: RequestContext },

    #[error("{context}: rate limited after {attempts} attempt(s), retry after {retry_after_secs}s")]
    RateLimited {
        context: RequestContext,
        attempts: u32,
        retry_after_secs: u64,
    },

    #[error("{context}: circuit breaker open, retry in {retry_in_secs}s")]
    CircuitOpen {
        context: RequestContext,
        retry_in_secs: u64,
    },

    #[error("{context}: HTTP {status} after {attempts} attempt(s): {message}")]
    Upstream {
        context: RequestContext,
        status: u16,
        attempts: u32,
        message: String,
    },

    #[error("{context}: connection failed after {attempts} attempt(s): {message}")]
    Connection {
        context: RequestContext,
        attempts: u32,
        message: String,
    },

    #[error("{context}: could not decode response: {message}")]
    Decode {
        context: RequestContext,
        message: String,
    },
}

/// Configuration for the resilient fetcher.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Per-request timeout
    pub timeout: Duration,

    /// User agent string
    pub user_agent: String,

    /// Minimum gap between dispatches
    pub min_request_interval: Duration,

    /// Attempts per call, including the first
    pub max_attempts: u32,

    /// Backoff unit: attempt `n` waits `base * 2^n` plus up to `base` jitter
    pub backoff_base: Duration,

    /// Counted failures before the circuit opens
    pub failure_threshold: u32,

    /// How long the circuit stays open
    pub circuit_cooldown: Duration,

    /// Wait used when a 429 carries no usable `Retry-After`
    pub default_retry_after: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: format!("riot-recap/{}", env!("CARGO_PKG_VERSION")),
            min_request_interval: Duration::from_millis(1200),
            max_attempts: 3,
            backoff_base: Duration::from_secs(1),
            failure_threshold: 5,
            circuit_cooldown: Duration::from_secs(60),
            default_retry_after: Duration::from_secs(60),
        }
    }
}

/// Why a single attempt did not succeed, for failures worth retrying.
#[derive(Debug)]
enum TransientFailure {
    Status { status: u16, message: String },
    Transport(String),
}

impl TransientFailure {
    fn into_error(self, context: RequestContext, attempts: u32) -> FetchError {
        match self {
            TransientFailure::Status { status, message } => FetchError::Upstream {
                context,
                status,
                attempts,
                message,
            },
            TransientFailure::Transport(message) => FetchError::Connection {
                context,
                attempts,
                message,
            },
        }
    }
}

impl fmt::Display for TransientFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransientFailure::Status { status, .. } => write!(f, "HTTP {}", status),
            TransientFailure::Transport(message) => write!(f, "{}", message),
        }
    }
}

/// Result of one request attempt; drives the retry loop.
#[derive(Debug)]
enum AttemptOutcome {
    Success(String),
    RateLimited { retry_after: Duration },
    CredentialRejected,
    NotFound,
    Transient(TransientFailure),
    Fatal(FetchError),
}

/// HTTP fetcher with pacing, retries and circuit breaking.
pub struct Fetcher {
    client: Client,
    config: FetcherConfig,
    credentials: CredentialProvider,
    limiter: RateLimiter,
    breaker: CircuitBreaker,
}

impl Fetcher {
    /// Create a new fetcher with the given configuration.
    pub fn new(config: FetcherConfig, credentials: CredentialProvider) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("riot-recap")),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            limiter: RateLimiter::new(config.min_request_interval),
            breaker: CircuitBreaker::new(config.failure_threshold, config.circuit_cooldown),
            credentials,
            config,
        })
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// GET `url` and decode the JSON body into `T`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        context: RequestContext,
        url: &Url,
    ) -> Result<T, FetchError> {
        let max_attempts = self.config.max_attempts.max(1);
        // The post-refresh retry does not count against `max_attempts`.
        let mut attempt = 0;
        let mut refreshed = false;

        loop {
            let attempts = attempt + 1 + u32::from(refreshed);
            let is_last = attempt + 1 >= max_attempts;

            if let Some(remaining) = self.breaker.remaining_open().await {
                return Err(FetchError::CircuitOpen {
                    context,
                    retry_in_secs: remaining.as_secs_f64().ceil() as u64,
                });
            }

            match self.attempt(url).await {
                AttemptOutcome::Success(body) => {
                    self.breaker.record_success().await;
                    return serde_json::from_str(&body).map_err(|e| FetchError::Decode {
                        context,
                        message: e.to_string(),
                    });
                }
                AttemptOutcome::RateLimited { retry_after } => {
                    if is_last {
                        return Err(FetchError::RateLimited {
                            context,
                            attempts,
                            retry_after_secs: retry_after.as_secs(),
                        });
                    }
                    warn!(
                        "{}: rate limited (attempt {}/{}), waiting {}s",
                        context,
                        attempt + 1,
                        max_attempts,
                        retry_after.as_secs()
                    );
                    sleep(retry_after).await;
                }
                AttemptOutcome::CredentialRejected => {
                    if !refreshed && self.credentials.is_refreshable() {
                        warn!("{}: 403 received, refreshing API key", context);
                        self.credentials.refresh().await?;
                        refreshed = true;
                        continue;
                    }
                    return Err(FetchError::Forbidden { context, attempts });
                }
                AttemptOutcome::NotFound => {
                    return Err(FetchError::NotFound { context });
                }
                AttemptOutcome::Transient(failure) => {
                    let opened = self.breaker.record_failure().await;
                    if opened || is_last {
                        return Err(failure.into_error(context, attempts));
                    }

                    let delay = self.backoff_delay(attempt);
                    warn!(
                        "{}: request failed (attempt {}/{}): {}, retrying in {}ms",
                        context,
                        attempt + 1,
                        max_attempts,
                        failure,
                        delay.as_millis()
                    );
                    sleep(delay).await;
                }
                AttemptOutcome::Fatal(err) => return Err(err),
            }

            attempt += 1;
        }
    }

    /// Issue one request and classify the response.
    async fn attempt(&self, url: &Url) -> AttemptOutcome {
        let api_key = match self.credentials.current().await {
            Ok(key) => key,
            Err(e) => return AttemptOutcome::Fatal(FetchError::Credential(e)),
        };

        self.limiter.wait_turn().await;
        debug!("GET {}", url);

        let response = match self
            .client
            .get(url.as_str())
            .header(RIOT_TOKEN_HEADER, api_key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return AttemptOutcome::Transient(TransientFailure::Transport(e.to_string())),
        };

        let status = response.status();
        if status.is_success() {
            return match response.text().await {
                Ok(body) => AttemptOutcome::Success(body),
                Err(e) => AttemptOutcome::Transient(TransientFailure::Transport(e.to_string())),
            };
        }

        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.trim().parse::<u64>().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(self.config.default_retry_after);
                AttemptOutcome::RateLimited { retry_after }
            }
            StatusCode::FORBIDDEN => AttemptOutcome::CredentialRejected,
            StatusCode::NOT_FOUND => AttemptOutcome::NotFound,
            _ => {
                let body = response.text().await.unwrap_or_default();
                let message = if body.is_empty() {
                    status.canonical_reason().unwrap_or("Unknown").to_string()
                } else {
                    body.chars().take(ERROR_BODY_PREVIEW).collect()
                };
                AttemptOutcome::Transient(TransientFailure::Status {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    /// `base * 2^attempt` plus uniform jitter in `[0, base)`.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = self.config.backoff_base;
        let exponential = base.saturating_mul(2u32.saturating_pow(attempt));
        let jitter = base.mul_f64(rand::thread_rng().gen_range(0.0..1.0));
        exponential + jitter
    }
}
