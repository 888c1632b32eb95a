//! Derived statistics models.

use serde::{Deserialize, Serialize};

use super::MatchParticipation;
use crate::calculate::{calculate_kda, calculate_win_rate};

/// Running counters for a group of participations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatTotals {
    pub games: u32,
    pub wins: u32,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub damage: u64,
    pub gold: u64,
    pub cs: u64,
}

impl StatTotals {
    /// Fold one participation into the totals.
    pub fn record(&mut self, p: &MatchParticipation) {
        self.games += 1;
        if p.win {
            self.wins += 1;
        }
        self.kills += p.kills;
        self.deaths += p.deaths;
        self.assists += p.assists;
        self.damage += p.total_damage_dealt;
        self.gold += p.gold_earned;
        self.cs += p.cs_total;
    }

    pub fn losses(&self) -> u32 {
        self.games - self.wins
    }

    pub fn win_rate(&self) -> f64 {
        calculate_win_rate(self.wins, self.games)
    }

    pub fn kda(&self) -> f64 {
        calculate_kda(self.kills, self.deaths, self.assists)
    }
}

/// Per-champion statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChampionStatistic {
    pub champion_id: u32,
    pub champion_name: String,
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,

    /// Percentage, 0 to 100
    pub win_rate: f64,

    pub total_kills: u32,
    pub total_deaths: u32,
    pub total_assists: u32,
    pub avg_kda: f64,
    pub total_damage: u64,
    pub total_gold: u64,
    pub total_cs: u64,
}

impl ChampionStatistic {
    /// Create a ChampionStatistic with derived rates.
    pub fn new(champion_id: u32, champion_name: String, totals: &StatTotals) -> Self {
        Self {
            champion_id,
            champion_name,
            games_played: totals.games,
            wins: totals.wins,
            losses: totals.losses(),
            win_rate: totals.win_rate(),
            total_kills: totals.kills,
            total_deaths: totals.deaths,
            total_assists: totals.assists,
            avg_kda: totals.kda(),
            total_damage: totals.damage,
            total_gold: totals.gold,
            total_cs: totals.cs,
        }
    }
}

/// Statistics for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTrendPoint {
    /// English month name ("January")
    pub month: String,

    /// 1 to 12
    pub month_number: u32,

    pub year: i32,
    pub games: u32,
    pub wins: u32,
    pub losses: u32,
    pub win_rate: f64,
    pub total_kills: u32,
    pub total_deaths: u32,
    pub total_assists: u32,
    pub avg_kda: f64,
    pub total_damage: u64,
    pub total_gold: u64,
    pub total_cs: u64,
}

impl MonthlyTrendPoint {
    pub fn new(year: i32, month_number: u32, totals: &StatTotals) -> Self {
        Self {
            month: month_name(month_number).to_string(),
            month_number,
            year,
            games: totals.games,
            wins: totals.wins,
            losses: totals.losses(),
            win_rate: totals.win_rate(),
            total_kills: totals.kills,
            total_deaths: totals.deaths,
            total_assists: totals.assists,
            avg_kda: totals.kda(),
            total_damage: totals.damage,
            total_gold: totals.gold,
            total_cs: totals.cs,
        }
    }
}

/// English name for a 1-based month number.
pub fn month_name(month_number: u32) -> &'static str {
    u8::try_from(month_number)
        .ok()
        .and_then(|m| chrono::Month::try_from(m).ok())
        .map(|m| m.name())
        .unwrap_or("Unknown")
}

/// Full statistics report for one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsReport {
    /// PUUID the report was built for
    pub player_id: String,
    pub player_name: String,

    /// Platform code taken from the match ids, empty when unknown
    pub region: String,

    pub total_games: u32,
    pub total_wins: u32,
    pub total_losses: u32,
    pub win_rate: f64,
    pub total_kills: u32,
    pub total_deaths: u32,
    pub total_assists: u32,
    pub avg_kda: f64,

    /// Sorted by games played, descending
    pub champion_stats: Vec<ChampionStatistic>,

    /// Sorted chronologically
    pub monthly_trends: Vec<MonthlyTrendPoint>,

    pub most_played_champion: Option<ChampionStatistic>,
    pub highest_winrate_champion: Option<ChampionStatistic>,
    pub best_kda_champion: Option<ChampionStatistic>,

    /// Slope of monthly KDA; positive means improving
    pub improvement_trend: f64,

    /// 0 to 100, higher is steadier
    pub consistency_score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participation(kills: u32, deaths: u32, assists: u32, win: bool) -> MatchParticipation {
        MatchParticipation {
            match_id: "NA1_1".to_string(),
            puuid: "p".to_string(),
            summoner_id: String::new(),
            player_name: String::new(),
            champion_id: 1,
            champion_name: "Annie".to_string(),
            kills,
            deaths,
            assists,
            win,
            game_duration: 1800,
            items: [0; 7],
            total_damage_dealt: 10_000,
            gold_earned: 9_000,
            cs_total: 150,
        }
    }

    #[test]
    fn test_totals_record() {
        let mut totals = StatTotals::default();
        totals.record(&participation(8, 3, 12, true));
        totals.record(&participation(5, 7, 8, false));

        assert_eq!(totals.games, 2);
        assert_eq!(totals.wins, 1);
        assert_eq!(totals.losses(), 1);
        assert_eq!(totals.kills, 13);
        assert_eq!(totals.damage, 20_000);
        assert_eq!(totals.win_rate(), 50.0);
        assert_eq!(totals.kda(), 3.3);
    }

    #[test]
    fn test_champion_statistic_new() {
        let mut totals = StatTotals::default();
        totals.record(&participation(2, 0, 3, true));
        let stat = ChampionStatistic::new(1, "Annie".to_string(), &totals);

        assert_eq!(stat.games_played, 1);
        assert_eq!(stat.losses, 0);
        assert_eq!(stat.win_rate, 100.0);
        assert_eq!(stat.avg_kda, 5.0);
        assert_eq!(stat.total_cs, 150);
    }

    #[test]
    fn test_month_name() {
        assert_eq!(month_name(1), "January");
        assert_eq!(month_name(12), "December");
        assert_eq!(month_name(0), "Unknown");
        assert_eq!(month_name(13), "Unknown");
    }

    #[test]
    fn test_monthly_point() {
        let totals = StatTotals::default();
        let point = MonthlyTrendPoint::new(2024, 3, &totals);
        assert_eq!(point.month, "March");
        assert_eq!(point.win_rate, 0.0);
        assert_eq!(point.avg_kda, 0.0);
    }
}
