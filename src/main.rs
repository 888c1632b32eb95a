use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use riot_recap::calculate::build_report;
use riot_recap::config::AppConfig;
use riot_recap::fetch::CredentialProvider;
use riot_recap::models::{MatchRecord, PlayerIdentity, StatisticsReport, TimeWindow};
use riot_recap::parse_duration;
use riot_recap::riot::{ErrorKind, MatchHistory, RiotClient, RiotError};
use riot_recap::storage::{self, JsonlFile, MatchArchive, StorageConfig};

/// Config file picked up from the working directory when `--config` is not given.
const DEFAULT_CONFIG_PATH: &str = "./riot-recap.toml";

#[derive(Parser)]
#[command(name = "riot-recap")]
#[command(about = "League of Legends match history and statistics from the Riot API")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Riot API key (otherwise read from the configured key source)
    #[arg(long)]
    api_key: Option<String>,

    /// Abort the command after this long (e.g., "90s", "5m")
    #[arg(long)]
    timeout: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a Riot ID to a player identity
    Resolve {
        /// Riot ID ("Name#TAG", or a bare name for the region's default tag)
        riot_id: String,

        /// Platform region (e.g., na1, euw1, kr)
        #[arg(long)]
        region: Option<String>,
    },

    /// Fetch recent match history into the local archive
    History {
        riot_id: String,

        #[arg(long)]
        region: Option<String>,

        #[command(flatten)]
        fetch: FetchArgs,
    },

    /// Fetch match history and compute a statistics report
    Report {
        riot_id: String,

        #[arg(long)]
        region: Option<String>,

        #[command(flatten)]
        fetch: FetchArgs,

        /// Also write the report to this path
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Compute a statistics report from a JSONL match file, without network access
    Analyze {
        /// JSONL file with one match record per line
        #[arg(long)]
        input: PathBuf,

        /// Player id (puuid) to report on
        #[arg(long)]
        player: String,

        /// Write the report here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct FetchArgs {
    /// Months of history to cover (30-day months)
    #[arg(long)]
    months: Option<u32>,

    /// Fetch details for at most this many matches
    #[arg(long)]
    max_details: Option<usize>,

    /// Match detail requests in flight at once
    #[arg(long)]
    concurrency: Option<usize>,
}

impl FetchArgs {
    fn apply(&self, config: &mut AppConfig) -> Result<()> {
        if let Some(months) = self.months {
            config.history.months_back = months;
        }
        if let Some(max) = self.max_details {
            config.history.max_match_details = Some(max);
        }
        if let Some(concurrency) = self.concurrency {
            config.history.detail_concurrency = concurrency;
        }
        config.validate()?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }

    // Initialize tracing
    let log_level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));
    let fmt_layer = if cli.json_logs {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();

    info!("Starting riot-recap v{}", env!("CARGO_PKG_VERSION"));

    let limit = match cli.timeout.as_deref() {
        Some(raw) => {
            Some(parse_duration(raw).ok_or_else(|| anyhow!("Invalid --timeout value: {}", raw))?)
        }
        None => None,
    };

    let command = run(cli.command, config, cli.api_key);
    match limit {
        Some(limit) => tokio::time::timeout(limit, command)
            .await
            .map_err(|_| anyhow!("Timed out after {}s", limit.as_secs_f64()))?,
        None => command.await,
    }
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_PATH);
            if default_path.exists() {
                AppConfig::from_file(default_path)
                    .with_context(|| format!("Failed to load config from {}", DEFAULT_CONFIG_PATH))
            } else {
                Ok(AppConfig::default())
            }
        }
    }
}

async fn run(command: Commands, mut config: AppConfig, api_key: Option<String>) -> Result<()> {
    let storage = StorageConfig::new(config.data_dir.clone());

    match command {
        Commands::Resolve { riot_id, region } => {
            let client = build_client(&config, api_key)?;
            let region = region.unwrap_or_else(|| config.riot.region.clone());
            let identity = resolve(&client, &storage, &riot_id, &region).await?;

            println!("{}", serde_json::to_string_pretty(&identity)?);
        }

        Commands::History {
            riot_id,
            region,
            fetch,
        } => {
            fetch.apply(&mut config)?;
            let client = build_client(&config, api_key)?;
            let region = region.unwrap_or_else(|| config.riot.region.clone());

            let identity = resolve(&client, &storage, &riot_id, &region).await?;
            let window = TimeWindow::last_months(config.history.months_back, Utc::now());
            let (history, added) = fetch_and_archive(&client, &storage, &identity, window).await?;

            println!("Player:     {}", identity.riot_id);
            println!("Region:     {}", identity.region.display_name());
            println!("Match ids:  {}", history.match_ids_found);
            println!("Fetched:    {}", history.matches.len());
            println!("Skipped:    {}", history.skipped.len());
            println!("Archived:   {} new", added);
        }

        Commands::Report {
            riot_id,
            region,
            fetch,
            output,
        } => {
            fetch.apply(&mut config)?;
            let client = build_client(&config, api_key)?;
            let region = region.unwrap_or_else(|| config.riot.region.clone());

            let identity = resolve(&client, &storage, &riot_id, &region).await?;
            let window = TimeWindow::last_months(config.history.months_back, Utc::now());
            fetch_and_archive(&client, &storage, &identity, window).await?;

            let matches = MatchArchive::open(&storage, identity.region, &identity.puuid)
                .load_window(window)?;
            let report = build_report(&matches, &identity.puuid)?;

            storage::write_json(
                &storage.report_path(identity.region, &identity.puuid),
                &report,
            )?;
            if let Some(path) = output {
                storage::write_json(&path, &report)?;
                info!("Report written to {:?}", path);
            }

            print_summary(&report);
        }

        Commands::Analyze {
            input,
            player,
            output,
        } => {
            if !input.exists() {
                return Err(anyhow!("Input file not found: {}", input.display()));
            }
            let matches: Vec<MatchRecord> = JsonlFile::new(input).read_all()?;
            info!("Loaded {} matches", matches.len());

            let report = build_report(&matches, &player)?;
            match output {
                Some(path) => {
                    storage::write_json(&path, &report)?;
                    info!("Report written to {:?}", path);
                }
                None => println!("{}", serde_json::to_string_pretty(&report)?),
            }
        }
    }

    Ok(())
}

fn build_client(config: &AppConfig, api_key: Option<String>) -> Result<RiotClient> {
    let credentials = match api_key {
        Some(key) => CredentialProvider::fixed(key),
        None => CredentialProvider::new(config.riot.credential_source(), config.riot.credential_ttl()),
    };

    let client = RiotClient::new(
        config.riot.fetcher_config(),
        credentials,
        config.client_options(),
    )?;
    Ok(client)
}

async fn resolve(
    client: &RiotClient,
    storage: &StorageConfig,
    riot_id: &str,
    region: &str,
) -> Result<PlayerIdentity> {
    let identity = client
        .resolve_player(riot_id, region)
        .await
        .map_err(riot_failure)?;

    storage::write_json(
        &storage.player_path(identity.region, &identity.puuid),
        &identity,
    )?;
    Ok(identity)
}

async fn fetch_and_archive(
    client: &RiotClient,
    storage: &StorageConfig,
    identity: &PlayerIdentity,
    window: TimeWindow,
) -> Result<(MatchHistory, usize)> {
    let history = client
        .fetch_match_history(identity, window)
        .await
        .map_err(riot_failure)?;

    let archive = MatchArchive::open(storage, identity.region, &identity.puuid);
    let added = archive.merge(&history.matches)?;
    Ok((history, added))
}

/// Log a client error with its kind before handing it to anyhow.
fn riot_failure(err: RiotError) -> anyhow::Error {
    let kind = err.kind();
    if kind.is_input_error() {
        warn!("Rejected input ({}): {}", kind, err);
    } else {
        error!("Riot API call failed ({}): {}", kind, err);
    }
    if matches!(kind, ErrorKind::RateLimited | ErrorKind::CircuitOpen) {
        warn!("Try again in a few minutes, or raise min_request_interval_ms");
    }
    err.into()
}

fn print_summary(report: &StatisticsReport) {
    println!();
    println!("=== {} ({}) ===", report.player_name, report.region);
    println!(
        "Games: {}  Wins: {}  Losses: {}  Win rate: {:.2}%",
        report.total_games, report.total_wins, report.total_losses, report.win_rate
    );
    println!(
        "K/D/A: {}/{}/{}  KDA: {:.2}",
        report.total_kills, report.total_deaths, report.total_assists, report.avg_kda
    );
    println!(
        "Trend: {:+.3} KDA/month  Consistency: {:.1}",
        report.improvement_trend, report.consistency_score
    );

    if let Some(champion) = &report.most_played_champion {
        println!("Most played:   {} ({} games)", champion.champion_name, champion.games_played);
    }
    if let Some(champion) = &report.highest_winrate_champion {
        println!("Best win rate: {} ({:.2}%)", champion.champion_name, champion.win_rate);
    }
    if let Some(champion) = &report.best_kda_champion {
        println!("Best KDA:      {} ({:.2})", champion.champion_name, champion.avg_kda);
    }

    if !report.champion_stats.is_empty() {
        println!();
        println!(
            "{:<16} {:>6} {:>8} {:>7}",
            "Champion", "Games", "Win %", "KDA"
        );
        for champion in report.champion_stats.iter().take(10) {
            println!(
                "{:<16} {:>6} {:>8.2} {:>7.2}",
                champion.champion_name, champion.games_played, champion.win_rate, champion.avg_kda
            );
        }
    }

    if !report.monthly_trends.is_empty() {
        println!();
        for month in &report.monthly_trends {
            println!(
                "{} {:<10} {:>4} games  {:>6.2}%  KDA {:.2}",
                month.year, month.month, month.games, month.win_rate, month.avg_kda
            );
        }
    }
}
