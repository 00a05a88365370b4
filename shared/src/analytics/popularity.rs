use serde::{Deserialize, Serialize};

use crate::analytics::format::{format_percent, round_to, StatCard};
use crate::analytics::series::{ChartKind, ChartSeries};
use crate::dto::metrics::{to_count, RawRankingEntry};
use crate::models::metrics::{GameRanking, PopularityData};

pub const UNKNOWN_GAME: &str = "Unknown Game";
pub const NO_GAMES_LABEL: &str = "No Games Available";
/// Games shown in the ranking bar chart
pub const BAR_CHART_LIMIT: usize = 10;
/// Games shown in the distribution doughnut
pub const DOUGHNUT_LIMIT: usize = 5;

/// Maps ranking entries of either endpoint generation onto `GameRanking`.
///
/// Order is preserved. Upstream is assumed to sort by plays, descending.
pub fn normalize_rankings(entries: &[RawRankingEntry]) -> Vec<GameRanking> {
    entries
        .iter()
        .map(|entry| GameRanking {
            name: entry
                .name
                .clone()
                .or_else(|| entry.game_name.clone())
                .unwrap_or_else(|| UNKNOWN_GAME.to_string()),
            plays: to_count(entry.plays.or(entry.play_count)),
        })
        .collect()
}

/// Ranking table row with the bar width relative to the leader
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankingRow {
    pub rank: usize,
    pub name: String,
    pub plays: u64,
    /// Plays relative to the top game, 0 - 100
    pub relative_width_pct: f64,
}

/// Derived popularity view
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PopularityView {
    pub rankings: Vec<GameRanking>,
    pub total_games: u64,
    pub total_plays: u64,
    pub average_plays: u64,
    pub top_game: Option<GameRanking>,
    pub top_game_share_pct: f64,
}

/// Builds the popularity view.
///
/// Backend totals win for the total cards. The average always covers the
/// ranked games actually returned.
pub fn derive_popularity_view(data: &PopularityData) -> PopularityView {
    let rankings = data.rankings.clone();
    let listed_plays: u64 = rankings.iter().map(|r| r.plays).sum();
    let total_games = data.total_games.unwrap_or(rankings.len() as u64);
    let total_plays = data.total_plays.unwrap_or(listed_plays);

    let average_plays = if rankings.is_empty() {
        0
    } else {
        (listed_plays as f64 / rankings.len() as f64).round() as u64
    };

    let top_game = rankings.first().cloned();
    let top_game_share_pct = match &top_game {
        Some(top) if total_plays > 0 => top.plays as f64 / total_plays as f64 * 100.0,
        _ => 0.0,
    };

    PopularityView {
        rankings,
        total_games,
        total_plays,
        average_plays,
        top_game,
        top_game_share_pct,
    }
}

impl PopularityView {
    pub fn is_empty(&self) -> bool {
        self.rankings.is_empty()
    }

    /// Bar chart "Play Count" over the first `limit` games
    pub fn to_chart(&self, limit: usize) -> ChartSeries {
        self.top_n_chart(ChartKind::Bar, limit, "Play Count")
    }

    /// Share of plays among the first five games
    pub fn distribution_chart(&self) -> ChartSeries {
        self.top_n_chart(ChartKind::Doughnut, DOUGHNUT_LIMIT, "Plays")
    }

    fn top_n_chart(&self, kind: ChartKind, limit: usize, label: &str) -> ChartSeries {
        if self.rankings.is_empty() || limit == 0 {
            return ChartSeries::categorical(kind, vec![NO_GAMES_LABEL.to_string()], label, vec![0.0]);
        }
        let top = self.rankings.iter().take(limit);
        ChartSeries::categorical(
            kind,
            top.clone().map(|r| r.name.clone()).collect(),
            label,
            top.map(|r| r.plays as f64).collect(),
        )
    }

    /// Table rows with bar widths scaled to the leader's plays
    pub fn ranking_rows(&self) -> Vec<RankingRow> {
        let top_plays = self.rankings.first().map(|r| r.plays).unwrap_or(0);
        self.rankings
            .iter()
            .enumerate()
            .map(|(i, r)| RankingRow {
                rank: i + 1,
                name: r.name.clone(),
                plays: r.plays,
                relative_width_pct: if top_plays > 0 {
                    r.plays as f64 / top_plays as f64 * 100.0
                } else {
                    0.0
                },
            })
            .collect()
    }

    pub fn stat_cards(&self) -> Vec<StatCard> {
        let top_name = self
            .top_game
            .as_ref()
            .map(|g| g.name.clone())
            .unwrap_or_else(|| "N/A".to_string());
        vec![
            StatCard::number("Total Games", self.total_games as f64),
            StatCard::number("Total Plays", self.total_plays as f64),
            StatCard::number("Average Plays", self.average_plays as f64),
            StatCard::text("Top Game", top_name),
            StatCard::text("Top Game Share", format_percent(round_to(self.top_game_share_pct, 1), 1)),
        ]
    }
}
