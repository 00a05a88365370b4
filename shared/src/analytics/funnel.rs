use serde::{Deserialize, Serialize};

use crate::analytics::format::{format_percent, rate_to_percent_1dp, round_to, StatCard};
use crate::analytics::series::{build_series, ChartKind, ChartSeries, Field};
use crate::models::metrics::{ConversionPoint, FunnelData, FunnelSummary};

pub const HUB_VISITS: &str = "Hub Visits";
pub const GAME_STARTS: &str = "Game Starts";
pub const GAME_COMPLETIONS: &str = "Game Completions";

/// One stage of the conversion funnel, with percentages precomputed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunnelStep {
    pub name: String,
    pub users: u64,
    /// Share of the first stage, in percent
    pub conversion_from_start: f64,
    /// Share of the previous stage, in percent (100 for the first)
    pub conversion_from_previous: f64,
}

impl FunnelStep {
    /// Percentage of the previous stage lost at this step
    pub fn drop_off_from_previous(&self) -> f64 {
        (100.0 - self.conversion_from_previous).max(0.0)
    }
}

/// Derived funnel view
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunnelView {
    pub steps: [FunnelStep; 3],
    /// Backend overall conversion rate, in percent
    pub overall_conversion_pct: f64,
    /// Share of hub visitors that did not complete, in percent
    pub drop_off_pct: f64,
    pub visit_to_play_pct: f64,
    pub play_to_completion_pct: f64,
}

/// Computes the funnel steps and headline percentages.
///
/// Total over its input: a zero first stage yields 0 for every percentage.
pub fn derive_funnel(summary: &FunnelSummary) -> FunnelView {
    let counts = [
        (HUB_VISITS, summary.hub_visits),
        (GAME_STARTS, summary.game_starts),
        (GAME_COMPLETIONS, summary.game_completions),
    ];
    let total_users = counts[0].1;

    let steps = std::array::from_fn(|i| {
        let (name, users) = counts[i];
        let conversion_from_start = percent_of(users, total_users, 0.0);
        let conversion_from_previous = if i == 0 {
            100.0
        } else {
            percent_of(users, counts[i - 1].1, 100.0)
        };
        FunnelStep {
            name: name.to_string(),
            users,
            conversion_from_start,
            conversion_from_previous,
        }
    });

    let converted_users = summary.game_completions;
    let drop_off_pct = if total_users > 0 {
        (total_users.saturating_sub(converted_users) as f64 / total_users as f64) * 100.0
    } else {
        0.0
    };

    FunnelView {
        steps,
        overall_conversion_pct: finite_or_zero(summary.overall_conversion_rate * 100.0),
        drop_off_pct,
        visit_to_play_pct: finite_or_zero(summary.visit_to_play_rate * 100.0),
        play_to_completion_pct: finite_or_zero(summary.play_to_completion_rate * 100.0),
    }
}

fn percent_of(part: u64, whole: u64, when_empty: f64) -> f64 {
    if whole > 0 {
        part as f64 / whole as f64 * 100.0
    } else {
        when_empty
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

impl FunnelView {
    pub fn total_users(&self) -> u64 {
        self.steps[0].users
    }

    pub fn converted_users(&self) -> u64 {
        self.steps[2].users
    }

    /// Any first-stage activity at all
    pub fn has_activity(&self) -> bool {
        self.total_users() > 0
    }

    /// Bar chart of users per stage
    pub fn to_chart(&self) -> ChartSeries {
        ChartSeries::categorical(
            ChartKind::Bar,
            self.steps.iter().map(|s| s.name.clone()).collect(),
            "Users",
            self.steps.iter().map(|s| s.users as f64).collect(),
        )
    }

    /// Doughnut of the three backend conversion rates, in percent
    pub fn conversion_rates_chart(&self) -> ChartSeries {
        ChartSeries::categorical(
            ChartKind::Doughnut,
            vec![
                "Visit to Play".to_string(),
                "Play to Completion".to_string(),
                "Overall".to_string(),
            ],
            "Conversion Rate (%)",
            vec![
                round_to(self.visit_to_play_pct, 1),
                round_to(self.play_to_completion_pct, 1),
                round_to(self.overall_conversion_pct, 1),
            ],
        )
    }

    /// Headline cards: total visitors, completions, conversion, drop-off
    pub fn stat_cards(&self) -> Vec<StatCard> {
        vec![
            StatCard::number("Total Users", self.total_users() as f64),
            StatCard::number("Converted Users", self.converted_users() as f64),
            StatCard::number("Conversion Rate", round_to(self.overall_conversion_pct, 1)).with_suffix("%"),
            StatCard::number("Drop-off Rate", round_to(self.drop_off_pct, 1)).with_suffix("%"),
        ]
    }

    /// One summary line, used by the empty state
    pub fn activity_line(&self) -> String {
        format!(
            "Hub visits: {} • Game starts: {} • Completions: {}",
            self.steps[0].users, self.steps[1].users, self.steps[2].users
        )
    }

    pub fn step_rate_labels(&self) -> Vec<String> {
        self.steps
            .iter()
            .map(|s| format!("{} ({})", s.name, format_percent(s.conversion_from_start, 1)))
            .collect()
    }
}

/// Funnel view plus the daily conversion trend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversionView {
    pub funnel: FunnelView,
    pub trend: Option<ChartSeries>,
}

impl ConversionView {
    /// Neither stage counts nor a trend to show
    pub fn is_empty(&self) -> bool {
        !self.funnel.has_activity() && self.trend.is_none()
    }
}

/// Full conversion view for a normalized payload
pub fn derive_conversion_view(data: &FunnelData) -> ConversionView {
    let trend = if data.timeseries.is_empty() {
        None
    } else {
        Some(build_series(
            ChartKind::Line,
            &data.timeseries,
            &[Field::new("Conversion Rate (%)", |p: &ConversionPoint| {
                rate_to_percent_1dp(p.rate)
            })],
        ))
    };
    ConversionView {
        funnel: derive_funnel(&data.summary),
        trend,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn summary(visits: u64, starts: u64, completions: u64) -> FunnelSummary {
        FunnelSummary {
            hub_visits: visits,
            game_starts: starts,
            game_completions: completions,
            ..FunnelSummary::default()
        }
    }

    #[test]
    fn test_reference_funnel() {
        let view = derive_funnel(&FunnelSummary {
            hub_visits: 100,
            game_starts: 80,
            game_completions: 50,
            visit_to_play_rate: 0.8,
            play_to_completion_rate: 0.625,
            overall_conversion_rate: 0.5,
        });

        let names: Vec<&str> = view.steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Hub Visits", "Game Starts", "Game Completions"]);
        let users: Vec<u64> = view.steps.iter().map(|s| s.users).collect();
        assert_eq!(users, vec![100, 80, 50]);
        let from_start: Vec<f64> = view.steps.iter().map(|s| s.conversion_from_start).collect();
        assert_eq!(from_start, vec![100.0, 80.0, 50.0]);
        let from_previous: Vec<f64> = view.steps.iter().map(|s| s.conversion_from_previous).collect();
        assert_eq!(from_previous, vec![100.0, 80.0, 62.5]);

        assert_eq!(view.drop_off_pct, 50.0);
        assert_eq!(view.overall_conversion_pct, 50.0);
        assert_eq!(view.play_to_completion_pct, 62.5);
    }

    #[test]
    fn test_zero_total_is_all_zero() {
        let view = derive_funnel(&summary(0, 0, 0));
        for step in &view.steps {
            assert_eq!(step.conversion_from_start, 0.0);
            assert!(!step.conversion_from_start.is_nan());
        }
        assert_eq!(view.drop_off_pct, 0.0);
        assert_eq!(view.overall_conversion_pct, 0.0);
        assert!(!view.has_activity());
    }

    #[test]
    fn test_previous_stage_zero_defaults_to_hundred() {
        let view = derive_funnel(&summary(10, 0, 0));
        assert_eq!(view.steps[1].conversion_from_previous, 0.0);
        assert_eq!(view.steps[2].conversion_from_previous, 100.0);
        assert_eq!(view.drop_off_pct, 100.0);
    }

    #[test]
    fn test_inverted_funnel_drop_off_clamped() {
        let view = derive_funnel(&summary(10, 20, 30));
        assert_eq!(view.drop_off_pct, 0.0);
        assert_eq!(view.steps[2].conversion_from_start, 300.0);
        assert_eq!(view.steps[1].drop_off_from_previous(), 0.0);
    }

    #[test]
    fn test_charts() {
        let view = derive_funnel(&summary(100, 80, 50));
        let chart = view.to_chart();
        assert_eq!(chart.kind, ChartKind::Bar);
        assert_eq!(chart.datasets[0].values, vec![100.0, 80.0, 50.0]);
        assert!(chart.is_well_formed());
        assert!(view.conversion_rates_chart().is_well_formed());
        assert_eq!(view.activity_line(), "Hub visits: 100 • Game starts: 80 • Completions: 50");
    }

    #[test]
    fn test_conversion_view_empty_only_without_trend() {
        let empty = derive_conversion_view(&FunnelData::default());
        assert!(empty.is_empty());

        let with_trend = derive_conversion_view(&FunnelData {
            summary: FunnelSummary::default(),
            timeseries: vec![ConversionPoint {
                date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                rate: 0.25,
            }],
        });
        assert!(!with_trend.is_empty());
        let trend = with_trend.trend.unwrap();
        assert_eq!(trend.labels, vec!["May 1"]);
        assert_eq!(trend.datasets[0].values, vec![25.0]);
    }
}
