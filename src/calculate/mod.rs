//! Statistics calculation engine.
//!
//! Computes derived metrics from match participation data:
//! - KDA and win rate with zero-safe rules
//! - Improvement trend (least-squares slope of monthly KDA)
//! - Consistency score (penalized monthly KDA variance)
//! - The full per-player report (see [`build_report`])

mod report;

pub use report::*;

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Calculate KDA: `(kills + assists) / deaths`, rounded to 2 places.
///
/// With zero deaths the ratio is just `kills + assists`.
pub fn calculate_kda(kills: u32, deaths: u32, assists: u32) -> f64 {
    let takedowns = f64::from(kills) + f64::from(assists);
    if deaths == 0 {
        return takedowns;
    }
    round_to(takedowns / f64::from(deaths), 2)
}

/// Calculate win rate as a percentage, rounded to 2 places.
pub fn calculate_win_rate(wins: u32, games: u32) -> f64 {
    if games == 0 {
        0.0
    } else {
        round_to(100.0 * f64::from(wins) / f64::from(games), 2)
    }
}

/// Ordinary least-squares slope of `values` against their index.
///
/// Needs at least two points; rounded to 3 places.
pub fn calculate_improvement_trend(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }

    let n = values.len() as f64;
    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_x2) = (0.0, 0.0, 0.0, 0.0);
    for (i, y) in values.iter().enumerate() {
        let x = i as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_x2 += x * x;
    }

    let denominator = n * sum_x2 - sum_x * sum_x;
    if denominator == 0.0 {
        return 0.0;
    }

    round_to((n * sum_xy - sum_x * sum_y) / denominator, 3)
}

/// Consistency score: `100 - 20 * variance`, clamped to 0..=100.
///
/// Uses population variance; fewer than two points scores 100.
pub fn calculate_consistency_score(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 100.0;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    if variance == 0.0 {
        return 100.0;
    }

    round_to((100.0 - variance * 20.0).clamp(0.0, 100.0), 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_kda() {
        assert_eq!(calculate_kda(8, 3, 12), 6.67);
        assert_eq!(calculate_kda(13, 10, 20), 3.3);
        assert_eq!(calculate_kda(1, 3, 0), 0.33);
    }

    #[test]
    fn test_calculate_kda_zero_deaths() {
        assert_eq!(calculate_kda(5, 0, 7), 12.0);
        assert_eq!(calculate_kda(0, 0, 0), 0.0);
        assert!(calculate_kda(10, 0, 10).is_finite());
    }

    #[test]
    fn test_calculate_kda_matches_rounded_ratio() {
        for kills in 0..12u32 {
            for deaths in 1..9u32 {
                for assists in (0..15u32).step_by(3) {
                    let expected =
                        round_to(f64::from(kills + assists) / f64::from(deaths), 2);
                    assert_eq!(calculate_kda(kills, deaths, assists), expected);
                }
            }
        }
    }

    #[test]
    fn test_calculate_win_rate() {
        assert_eq!(calculate_win_rate(1, 2), 50.0);
        assert_eq!(calculate_win_rate(2, 3), 66.67);
        assert_eq!(calculate_win_rate(0, 5), 0.0);
        assert_eq!(calculate_win_rate(0, 0), 0.0);
        assert_eq!(calculate_win_rate(7, 7), 100.0);
    }

    #[test]
    fn test_improvement_trend() {
        assert_eq!(calculate_improvement_trend(&[]), 0.0);
        assert_eq!(calculate_improvement_trend(&[4.2]), 0.0);
        assert_eq!(calculate_improvement_trend(&[1.0, 2.0, 3.0]), 1.0);
        assert_eq!(calculate_improvement_trend(&[3.0, 2.0]), -1.0);
        assert_eq!(calculate_improvement_trend(&[2.0, 2.0, 2.0]), 0.0);
    }

    #[test]
    fn test_improvement_trend_rounding() {
        // slope of [1, 1.5, 1.8] = 0.4
        assert_eq!(calculate_improvement_trend(&[1.0, 1.5, 1.8]), 0.4);
        // slope of [0, 1, 0, 1] = 0.2
        assert_eq!(calculate_improvement_trend(&[0.0, 1.0, 0.0, 1.0]), 0.2);
    }

    #[test]
    fn test_consistency_score() {
        assert_eq!(calculate_consistency_score(&[]), 100.0);
        assert_eq!(calculate_consistency_score(&[3.0]), 100.0);
        assert_eq!(calculate_consistency_score(&[2.5, 2.5]), 100.0);
        // mean 3, variance 1
        assert_eq!(calculate_consistency_score(&[2.0, 4.0]), 80.0);
        // variance 25 clamps to zero
        assert_eq!(calculate_consistency_score(&[0.0, 10.0]), 0.0);
    }

    #[test]
    fn test_consistency_score_rounds_to_one_place() {
        // mean 2, variance 0.02/3 ≈ 0.00667 → 99.866… → 99.9
        assert_eq!(calculate_consistency_score(&[1.9, 2.0, 2.1]), 99.9);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(3.14159, 2), 3.14);
        assert_eq!(round_to(2.0, 3), 2.0);
        assert_eq!(round_to(-0.1234, 3), -0.123);
    }
}
