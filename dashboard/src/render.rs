//! Terminal rendering of the derived views.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use shared::analytics::format::{format_percent, format_thousands, round_to};
use shared::{
    AnimatedValue, ChangeDirection, ChartSeries, Clock, FrameStatus, FunnelView, RankingRow, Rounding, StatCard,
    SystemClock,
};

use crate::view::{Emptiness, ViewState};

const BAR_WIDTH: usize = 40;
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// ANSI styling; `Plain` emits no escape codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
    Plain,
}

impl Theme {
    pub fn from_dark_mode(dark_mode: bool) -> Self {
        if dark_mode {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        match self {
            Theme::Plain => text.to_string(),
            _ => format!("\x1b[{}m{}\x1b[0m", code, text),
        }
    }

    fn heading(&self, text: &str) -> String {
        match self {
            Theme::Dark => self.paint("1;97", text),
            _ => self.paint("1;34", text),
        }
    }

    fn muted(&self, text: &str) -> String {
        match self {
            Theme::Dark => self.paint("37", text),
            _ => self.paint("90", text),
        }
    }

    fn change(&self, direction: ChangeDirection, text: &str) -> String {
        match direction {
            ChangeDirection::Positive => self.paint("32", text),
            ChangeDirection::Negative => self.paint("31", text),
            ChangeDirection::Neutral => self.muted(text),
        }
    }
}

pub fn render_heading(title: &str, theme: Theme) -> String {
    format!("{}\n{}\n", theme.heading(title), "=".repeat(title.chars().count()))
}

fn render_card(card: &StatCard, value: &str, theme: Theme) -> String {
    let mut line = format!("  {:<24} {}", card.label, value);
    if let Some(change) = &card.change {
        line.push_str("  ");
        line.push_str(&theme.change(card.change_direction, change));
    }
    line
}

pub fn render_cards(cards: &[StatCard], theme: Theme) -> String {
    cards
        .iter()
        .map(|card| render_card(card, &card.display(), theme) + "\n")
        .collect()
}

/// Horizontal bars per dataset, scaled to the largest value in the chart
pub fn render_chart(chart: &ChartSeries, theme: Theme) -> String {
    if chart.is_placeholder() {
        return format!("  {}\n", theme.muted("No chart data"));
    }

    let max = chart
        .datasets
        .iter()
        .flat_map(|d| d.values.iter().copied())
        .fold(0.0_f64, f64::max);
    let label_width = chart.labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);

    let mut out = String::new();
    for dataset in &chart.datasets {
        out.push_str(&format!("  {}\n", theme.muted(&dataset.label)));
        for (label, value) in chart.labels.iter().zip(&dataset.values) {
            let width = if max > 0.0 {
                ((value / max) * BAR_WIDTH as f64).round() as usize
            } else {
                0
            };
            out.push_str(&format!(
                "  {:<label_width$} {} {}\n",
                label,
                "█".repeat(width),
                format_value(*value),
                label_width = label_width
            ));
        }
    }
    out
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format_thousands(value as i64)
    } else {
        format!("{:.1}", value)
    }
}

/// Stage rows with each stage's loss against the one before it
pub fn render_funnel(funnel: &FunnelView, theme: Theme) -> String {
    let mut out = String::new();
    for (i, (step, rate)) in funnel.steps.iter().zip(funnel.step_rate_labels()).enumerate() {
        out.push_str(&format!(
            "  {:<18} {:>10}  {}",
            step.name,
            format_thousands(step.users as i64),
            theme.muted(&rate)
        ));
        if i > 0 {
            let drop_off = format_percent(round_to(step.drop_off_from_previous(), 1), 1);
            out.push_str(&format!("  {}", theme.change(ChangeDirection::Negative, &format!("-{} drop-off", drop_off))));
        }
        out.push('\n');
    }
    out.push_str(&format!("  {}\n", theme.muted(&funnel.activity_line())));
    out
}

pub fn render_rankings(rows: &[RankingRow], theme: Theme) -> String {
    rows.iter()
        .map(|row| {
            let width = ((row.relative_width_pct / 100.0) * BAR_WIDTH as f64).round() as usize;
            format!(
                "  {:>2}. {:<28} {:>8} {}\n",
                row.rank,
                row.name,
                format_thousands(row.plays as i64),
                theme.muted(&"▇".repeat(width))
            )
        })
        .collect()
}

/// Loading, error, empty or data rendering of one panel
pub fn render_state<T, F>(title: &str, state: &ViewState<T>, empty_text: &str, theme: Theme, body: F) -> String
where
    T: Emptiness,
    F: FnOnce(&T) -> String,
{
    let mut out = render_heading(title, theme);
    match state {
        ViewState::Loading => out.push_str(&format!("  {}\n", theme.muted("Loading..."))),
        ViewState::Failed(message) => out.push_str(&format!("  {}\n", theme.paint("31", message))),
        ViewState::Ready(view) if view.is_empty() => out.push_str(&format!("  {}\n", theme.muted(empty_text))),
        ViewState::Ready(view) => out.push_str(&body(view)),
    }
    out
}

fn rounding_for(value: f64) -> Rounding {
    if value.fract() == 0.0 {
        Rounding::Floor
    } else {
        Rounding::Decimals(1)
    }
}

fn format_frame(card: &StatCard, value: f64) -> String {
    format!("{}{}", format_value(value), card.suffix)
}

/// Counts every numeric card up from zero, redrawing in place, then prints
/// the final values. A zero duration prints the final values directly.
pub async fn animate_cards<W: Write>(cards: &[StatCard], duration: Duration, theme: Theme, out: &mut W) -> std::io::Result<()> {
    if duration.is_zero() || cards.iter().all(|c| c.numeric_value().is_none()) {
        out.write_all(render_cards(cards, theme).as_bytes())?;
        return out.flush();
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
    let mut counters: Vec<Option<AnimatedValue>> = cards
        .iter()
        .map(|card| {
            card.numeric_value().map(|target| {
                let mut counter = AnimatedValue::new(duration, rounding_for(target), Arc::clone(&clock));
                counter.set_target(target);
                counter
            })
        })
        .collect();

    let mut interval = tokio::time::interval(FRAME_INTERVAL);
    let mut drawn = false;
    loop {
        interval.tick().await;
        let mut running = false;
        for counter in counters.iter_mut().flatten() {
            if counter.frame() == FrameStatus::Running {
                running = true;
            }
        }
        if !running {
            break;
        }

        if drawn {
            // Move back over the previous frame
            write!(out, "\x1b[{}A", cards.len())?;
        }
        for (card, counter) in cards.iter().zip(&counters) {
            let value = match counter {
                Some(counter) => format_frame(card, counter.display()),
                None => card.display(),
            };
            writeln!(out, "\r\x1b[2K{}", render_card(card, &value, theme))?;
        }
        out.flush()?;
        drawn = true;
    }

    if drawn {
        write!(out, "\x1b[{}A", cards.len())?;
        for card in cards {
            writeln!(out, "\r\x1b[2K{}", render_card(card, &card.display(), theme))?;
        }
    } else {
        out.write_all(render_cards(cards, theme).as_bytes())?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use shared::{
        derive_funnel, derive_popularity_view, ChartKind, FunnelSummary, GameRanking, PopularityData, PopularityView,
    };

    #[test]
    fn test_render_cards_plain() {
        let cards = vec![
            StatCard::number("Total Visits", 1234.0).with_change(12.0, "from yesterday"),
            StatCard::number("Accuracy", 62.5).with_suffix("%"),
        ];
        assert_eq!(
            render_cards(&cards, Theme::Plain),
            format!("  {:<24} 1,234  +12% from yesterday\n  {:<24} 62.5%\n", "Total Visits", "Accuracy")
        );
    }

    #[test]
    fn test_render_chart_scales_bars() {
        let chart = ChartSeries::categorical(
            ChartKind::Bar,
            vec!["a".to_string(), "b".to_string()],
            "Plays",
            vec![10.0, 5.0],
        );
        let text = render_chart(&chart, Theme::Plain);
        assert!(text.contains(&format!("a {} 10", "█".repeat(40))));
        assert!(text.contains(&format!("b {} 5", "█".repeat(20))));
    }

    #[test]
    fn test_render_placeholder_chart() {
        let text = render_chart(&ChartSeries::placeholder(ChartKind::Line), Theme::Plain);
        assert_eq!(text, "  No chart data\n");
    }

    #[test]
    fn test_render_state_variants() {
        let empty = ViewState::Ready(derive_popularity_view(&PopularityData::default()));
        let text = render_state("Popular Games", &empty, "No games played yet", Theme::Plain, |_| String::new());
        assert!(text.ends_with("  No games played yet\n"));

        let failed: ViewState<PopularityView> = ViewState::Failed("Failed to load popular games data".to_string());
        let text = render_state("Popular Games", &failed, "", Theme::Plain, |_| String::new());
        assert!(text.contains("Failed to load popular games data"));

        let loading: ViewState<PopularityView> = ViewState::Loading;
        assert!(render_state("Popular Games", &loading, "", Theme::Plain, |_| String::new()).contains("Loading..."));

        let data = PopularityData {
            rankings: vec![GameRanking {
                name: "Quiz".to_string(),
                plays: 3,
            }],
            total_games: None,
            total_plays: None,
        };
        let ready = ViewState::Ready(derive_popularity_view(&data));
        let text = render_state("Popular Games", &ready, "", Theme::Plain, |v| {
            render_rankings(&v.ranking_rows(), Theme::Plain)
        });
        assert!(text.contains("Quiz"));
    }

    #[test]
    fn test_render_popularity_charts() {
        let data = PopularityData {
            rankings: vec![
                GameRanking {
                    name: "Quiz".to_string(),
                    plays: 30,
                },
                GameRanking {
                    name: "Memory".to_string(),
                    plays: 15,
                },
            ],
            total_games: None,
            total_plays: None,
        };
        let view = derive_popularity_view(&data);
        let bar = render_chart(&view.to_chart(10), Theme::Plain);
        assert!(bar.starts_with("  Play Count\n"));
        assert!(bar.contains(&format!("Memory {} 15", "█".repeat(20))));

        let empty = derive_popularity_view(&PopularityData::default());
        assert!(render_chart(&empty.to_chart(10), Theme::Plain).contains("No Games Available  0"));
    }

    #[test]
    fn test_render_funnel_shows_step_drop_off() {
        let funnel = derive_funnel(&FunnelSummary {
            hub_visits: 200,
            game_starts: 150,
            game_completions: 60,
            ..FunnelSummary::default()
        });
        let text = render_funnel(&funnel, Theme::Plain);
        let lines: Vec<&str> = text.lines().collect();

        assert!(!lines[0].contains("drop-off"));
        assert!(lines[1].ends_with("-25.0% drop-off"));
        assert!(lines[2].ends_with("-60.0% drop-off"));
    }

    #[test]
    fn test_themes_differ() {
        assert_eq!(Theme::from_dark_mode(true), Theme::Dark);
        assert_ne!(Theme::Dark.heading("x"), Theme::Light.heading("x"));
        assert_eq!(Theme::Plain.heading("x"), "x");
    }

    #[tokio::test]
    async fn test_animate_cards_ends_on_final_values() {
        let cards = vec![StatCard::number("Plays", 42.0), StatCard::text("Top Game", "Quiz")];
        let mut out = Vec::new();
        animate_cards(&cards, Duration::from_millis(50), Theme::Plain, &mut out)
            .await
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.trim_end().ends_with("Quiz"));
        assert!(text.contains("42"));
    }

    #[tokio::test]
    async fn test_zero_duration_prints_directly() {
        let cards = vec![StatCard::number("Plays", 42.0)];
        let mut out = Vec::new();
        animate_cards(&cards, Duration::ZERO, Theme::Plain, &mut out).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), render_cards(&cards, Theme::Plain));
    }
}
