//! Per-player statistics report.
//!
//! Reduces a list of [`MatchRecord`]s into a [`StatisticsReport`] for one
//! player. Pure: no I/O, and the same input always yields the same report.

use std::collections::{BTreeMap, HashMap};

use chrono::Datelike;
use thiserror::Error;
use tracing::{debug, warn};

use super::{calculate_consistency_score, calculate_improvement_trend};
use crate::models::{
    ChampionStatistic, MatchRecord, MonthlyTrendPoint, StatTotals, StatisticsReport,
};

/// Errors that can occur while aggregating.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AggregateError {
    #[error("No matches found for player {player_id}")]
    NoMatchesForPlayer { player_id: String },
}

/// Per-champion accumulator, kept in first-encounter order.
struct ChampionGroup {
    champion_id: u32,
    champion_name: String,
    totals: StatTotals,
}

/// Build the full statistics report for `player_id` (a PUUID).
///
/// Matches the player did not take part in are skipped. Fails when no match
/// features the player.
pub fn build_report(
    matches: &[MatchRecord],
    player_id: &str,
) -> Result<StatisticsReport, AggregateError> {
    let mut overall = StatTotals::default();
    let mut champions: Vec<ChampionGroup> = Vec::new();
    let mut champion_index: HashMap<u32, usize> = HashMap::new();
    let mut months: BTreeMap<(i32, u32), StatTotals> = BTreeMap::new();
    let mut player_name = String::new();
    let mut region = String::new();

    for record in matches {
        let Some(participation) = record.participation_for(player_id) else {
            warn!(
                "Player {} not found in match {}, skipping",
                player_id, record.match_id
            );
            continue;
        };

        if overall.games == 0 {
            player_name = participation.player_name.clone();
            region = record.platform_prefix().unwrap_or_default();
        }

        overall.record(participation);

        let slot = *champion_index
            .entry(participation.champion_id)
            .or_insert_with(|| {
                champions.push(ChampionGroup {
                    champion_id: participation.champion_id,
                    champion_name: participation.champion_name.clone(),
                    totals: StatTotals::default(),
                });
                champions.len() - 1
            });
        champions[slot].totals.record(participation);

        let created = record.created_at();
        months
            .entry((created.year(), created.month()))
            .or_default()
            .record(participation);
    }

    if overall.games == 0 {
        return Err(AggregateError::NoMatchesForPlayer {
            player_id: player_id.to_string(),
        });
    }

    if player_name.is_empty() {
        player_name = format!("Player_{}", player_id);
    }

    let mut champion_stats: Vec<ChampionStatistic> = champions
        .into_iter()
        .map(|g| ChampionStatistic::new(g.champion_id, g.champion_name, &g.totals))
        .collect();
    // Stable sort keeps first-encounter order among equal game counts.
    champion_stats.sort_by(|a, b| b.games_played.cmp(&a.games_played));

    // BTreeMap iteration is already (year, month) ascending.
    let monthly_trends: Vec<MonthlyTrendPoint> = months
        .iter()
        .map(|(&(year, month), totals)| MonthlyTrendPoint::new(year, month, totals))
        .collect();

    let monthly_kda: Vec<f64> = monthly_trends.iter().map(|m| m.avg_kda).collect();
    let improvement_trend = calculate_improvement_trend(&monthly_kda);
    let consistency_score = calculate_consistency_score(&monthly_kda);

    let most_played_champion = first_max_by(&champion_stats, |c| f64::from(c.games_played));
    let highest_winrate_champion = first_max_by(&champion_stats, |c| c.win_rate);
    let best_kda_champion = first_max_by(&champion_stats, |c| c.avg_kda);

    debug!(
        "Aggregated {} of {} matches for {} ({} champions, {} months)",
        overall.games,
        matches.len(),
        player_id,
        champion_stats.len(),
        monthly_trends.len()
    );

    Ok(StatisticsReport {
        player_id: player_id.to_string(),
        player_name,
        region,
        total_games: overall.games,
        total_wins: overall.wins,
        total_losses: overall.losses(),
        win_rate: overall.win_rate(),
        total_kills: overall.kills,
        total_deaths: overall.deaths,
        total_assists: overall.assists,
        avg_kda: overall.kda(),
        champion_stats,
        monthly_trends,
        most_played_champion,
        highest_winrate_champion,
        best_kda_champion,
        improvement_trend,
        consistency_score,
    })
}

/// First element with the greatest key. `Iterator::max_by` returns the last
/// maximum, which would break ties the wrong way.
fn first_max_by<F>(stats: &[ChampionStatistic], key: F) -> Option<ChampionStatistic>
where
    F: Fn(&ChampionStatistic) -> f64,
{
    stats
        .iter()
        .fold(None::<&ChampionStatistic>, |best, candidate| match best {
            Some(current) if key(candidate) <= key(current) => Some(current),
            _ => Some(candidate),
        })
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchParticipation;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    const PLAYER: &str = "puuid-target";

    fn ms(year: i32, month: u32, day: u32) -> i64 {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0)
            .unwrap()
            .timestamp_millis()
    }

    fn line(
        match_id: &str,
        puuid: &str,
        champion_id: u32,
        (kills, deaths, assists): (u32, u32, u32),
        win: bool,
    ) -> MatchParticipation {
        MatchParticipation {
            match_id: match_id.to_string(),
            puuid: puuid.to_string(),
            summoner_id: format!("summ-{}", puuid),
            player_name: if puuid == PLAYER {
                "Target".to_string()
            } else {
                "Other".to_string()
            },
            champion_id,
            champion_name: format!("Champ{}", champion_id),
            kills,
            deaths,
            assists,
            win,
            game_duration: 1800,
            items: [0; 7],
            total_damage_dealt: 20_000,
            gold_earned: 11_000,
            cs_total: 180,
        }
    }

    fn game(
        match_id: &str,
        created: i64,
        champion_id: u32,
        kda: (u32, u32, u32),
        win: bool,
    ) -> MatchRecord {
        MatchRecord {
            match_id: match_id.to_string(),
            game_creation: created,
            game_duration: 1800,
            game_mode: "CLASSIC".to_string(),
            game_type: "MATCHED_GAME".to_string(),
            queue_id: 420,
            participants: vec![
                line(match_id, "someone-else", 99, (1, 1, 1), !win),
                line(match_id, PLAYER, champion_id, kda, win),
            ],
        }
    }

    #[test]
    fn test_two_match_example() {
        let matches = vec![
            game("NA1_1", ms(2024, 5, 1), 1, (8, 3, 12), true),
            game("NA1_2", ms(2024, 5, 2), 1, (5, 7, 8), false),
        ];

        let report = build_report(&matches, PLAYER).unwrap();

        assert_eq!(report.total_games, 2);
        assert_eq!(report.total_wins, 1);
        assert_eq!(report.total_losses, 1);
        assert_eq!(report.win_rate, 50.0);
        assert_eq!(report.avg_kda, 3.3);
        assert_eq!(report.player_name, "Target");
        assert_eq!(report.region, "na1");
    }

    #[test]
    fn test_single_month_has_flat_trend() {
        let matches = vec![
            game("NA1_1", ms(2024, 5, 1), 1, (8, 3, 12), true),
            game("NA1_2", ms(2024, 5, 20), 2, (5, 7, 8), false),
        ];

        let report = build_report(&matches, PLAYER).unwrap();

        assert_eq!(report.monthly_trends.len(), 1);
        assert_eq!(report.improvement_trend, 0.0);
        assert_eq!(report.consistency_score, 100.0);
    }

    #[test]
    fn test_matches_without_player_are_skipped() {
        let mut stranger = game("NA1_3", ms(2024, 5, 3), 1, (10, 0, 10), true);
        stranger.participants.retain(|p| p.puuid != PLAYER);

        let matches = vec![
            game("NA1_1", ms(2024, 5, 1), 1, (8, 3, 12), true),
            stranger,
            game("NA1_2", ms(2024, 5, 2), 1, (5, 7, 8), false),
        ];

        let report = build_report(&matches, PLAYER).unwrap();
        assert_eq!(report.total_games, 2);
        assert_eq!(report.total_kills, 13);
    }

    #[test]
    fn test_no_matches_for_player() {
        assert_eq!(
            build_report(&[], PLAYER),
            Err(AggregateError::NoMatchesForPlayer {
                player_id: PLAYER.to_string()
            })
        );

        let matches = vec![game("NA1_1", ms(2024, 5, 1), 1, (1, 1, 1), true)];
        assert!(matches!(
            build_report(&matches, "nobody"),
            Err(AggregateError::NoMatchesForPlayer { .. })
        ));
    }

    #[test]
    fn test_empty_player_id_matches_nobody() {
        let mut anonymous = game("NA1_1", ms(2024, 5, 1), 1, (1, 1, 1), true);
        anonymous.participants[0].puuid.clear();

        assert_eq!(
            build_report(&[anonymous], ""),
            Err(AggregateError::NoMatchesForPlayer {
                player_id: String::new()
            })
        );
    }

    #[test]
    fn test_champions_sorted_by_games_desc() {
        let matches = vec![
            game("NA1_1", ms(2024, 1, 1), 10, (1, 1, 1), true),
            game("NA1_2", ms(2024, 1, 2), 20, (1, 1, 1), true),
            game("NA1_3", ms(2024, 1, 3), 20, (1, 1, 1), false),
            game("NA1_4", ms(2024, 1, 4), 30, (1, 1, 1), true),
            game("NA1_5", ms(2024, 1, 5), 20, (1, 1, 1), true),
            game("NA1_6", ms(2024, 1, 6), 30, (1, 1, 1), false),
        ];

        let report = build_report(&matches, PLAYER).unwrap();
        let order: Vec<(u32, u32)> = report
            .champion_stats
            .iter()
            .map(|c| (c.champion_id, c.games_played))
            .collect();

        assert_eq!(order, vec![(20, 3), (30, 2), (10, 1)]);
        assert_eq!(report.most_played_champion.unwrap().champion_id, 20);
    }

    #[test]
    fn test_months_sorted_chronologically() {
        // Deliberately out of order and spanning a year boundary; alphabetical
        // month ordering would put April before January.
        let matches = vec![
            game("NA1_1", ms(2024, 4, 1), 1, (3, 1, 0), true),
            game("NA1_2", ms(2023, 12, 1), 1, (1, 1, 0), true),
            game("NA1_3", ms(2024, 1, 1), 1, (2, 1, 0), true),
        ];

        let report = build_report(&matches, PLAYER).unwrap();
        let order: Vec<(i32, &str)> = report
            .monthly_trends
            .iter()
            .map(|m| (m.year, m.month.as_str()))
            .collect();

        assert_eq!(
            order,
            vec![(2023, "December"), (2024, "January"), (2024, "April")]
        );
        // KDA 1, 2, 3 per month
        assert_eq!(report.improvement_trend, 1.0);
        // variance 2/3 → 100 - 13.33
        assert_eq!(report.consistency_score, 86.7);
    }

    #[test]
    fn test_top_champion_ties_pick_first_in_sorted_order() {
        let matches = vec![
            game("NA1_1", ms(2024, 1, 1), 10, (2, 1, 0), true),
            game("NA1_2", ms(2024, 1, 2), 20, (2, 1, 0), true),
            game("NA1_3", ms(2024, 1, 3), 20, (2, 1, 0), true),
        ];

        let report = build_report(&matches, PLAYER).unwrap();

        // Both have 100% win rate and KDA 2.0; champion 20 sorts first.
        assert_eq!(report.highest_winrate_champion.unwrap().champion_id, 20);
        assert_eq!(report.best_kda_champion.unwrap().champion_id, 20);
    }

    #[test]
    fn test_best_kda_and_win_rate_can_differ_from_most_played() {
        let matches = vec![
            game("NA1_1", ms(2024, 1, 1), 10, (1, 5, 1), false),
            game("NA1_2", ms(2024, 1, 2), 10, (1, 5, 1), true),
            game("NA1_3", ms(2024, 1, 3), 20, (10, 1, 5), true),
        ];

        let report = build_report(&matches, PLAYER).unwrap();

        assert_eq!(report.most_played_champion.unwrap().champion_id, 10);
        assert_eq!(report.highest_winrate_champion.unwrap().champion_id, 20);
        assert_eq!(report.best_kda_champion.unwrap().champion_id, 20);
    }

    #[test]
    fn test_report_is_deterministic() {
        let matches = vec![
            game("EUW1_1", ms(2024, 2, 1), 10, (4, 2, 6), true),
            game("EUW1_2", ms(2024, 3, 1), 20, (1, 4, 2), false),
            game("EUW1_3", ms(2024, 3, 9), 30, (7, 0, 3), true),
            game("EUW1_4", ms(2024, 6, 1), 20, (2, 2, 2), true),
        ];

        let first = serde_json::to_string(&build_report(&matches, PLAYER).unwrap()).unwrap();
        let second = serde_json::to_string(&build_report(&matches, PLAYER).unwrap()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_player_name_falls_back() {
        let mut record = game("KR_1", ms(2024, 1, 1), 1, (1, 1, 1), true);
        for p in &mut record.participants {
            p.player_name.clear();
        }

        let report = build_report(&[record], PLAYER).unwrap();
        assert_eq!(report.player_name, format!("Player_{}", PLAYER));
        assert_eq!(report.region, "kr");
    }

    #[test]
    fn test_champion_aggregates_economy_fields() {
        let matches = vec![
            game("NA1_1", ms(2024, 1, 1), 10, (1, 1, 1), true),
            game("NA1_2", ms(2024, 1, 2), 10, (1, 1, 1), false),
        ];

        let report = build_report(&matches, PLAYER).unwrap();
        let champ = &report.champion_stats[0];

        assert_eq!(champ.total_damage, 40_000);
        assert_eq!(champ.total_gold, 22_000);
        assert_eq!(champ.total_cs, 360);
        assert_eq!(report.monthly_trends[0].total_cs, 360);
    }
}
