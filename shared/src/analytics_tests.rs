use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::analytics::series::ChartKind;
use crate::analytics::tween::{CounterAnimation, FrameStatus, ManualClock, Rounding};
use crate::dto::metrics::RawRankingEntry;
use crate::models::metrics::*;
use crate::{derive_engagement_view, derive_funnel, derive_popularity_view, normalize_rankings};

fn funnel_summary() -> impl Strategy<Value = FunnelSummary> {
    (0u64..1_000_000, 0.0f64..=1.0, 0.0f64..=1.0).prop_map(|(visits, start_share, completion_share)| {
        let starts = (visits as f64 * start_share).floor() as u64;
        let completions = (starts as f64 * completion_share).floor() as u64;
        FunnelSummary {
            hub_visits: visits,
            game_starts: starts,
            game_completions: completions,
            visit_to_play_rate: start_share,
            play_to_completion_rate: completion_share,
            overall_conversion_rate: start_share * completion_share,
        }
    })
}

fn raw_entry() -> impl Strategy<Value = RawRankingEntry> {
    (
        proptest::option::of("[A-Za-z ]{1,12}"),
        proptest::option::of("[A-Za-z ]{1,12}"),
        proptest::option::of(0u32..100_000),
        proptest::option::of(0u32..100_000),
    )
        .prop_map(|(name, game_name, plays, play_count)| RawRankingEntry {
            name,
            game_name,
            plays: plays.map(f64::from),
            play_count: play_count.map(f64::from),
        })
}

proptest! {
    #[test]
    fn prop_funnel_percentages_stay_in_bounds(summary in funnel_summary()) {
        let view = derive_funnel(&summary);
        for step in &view.steps {
            prop_assert!(step.conversion_from_start >= 0.0 && step.conversion_from_start <= 100.0);
            prop_assert!(step.conversion_from_previous >= 0.0 && step.conversion_from_previous <= 100.0);
        }
        prop_assert!(view.drop_off_pct >= 0.0 && view.drop_off_pct <= 100.0);
    }

    #[test]
    fn prop_ranking_normalization_is_idempotent(entries in proptest::collection::vec(raw_entry(), 0..20)) {
        let once = normalize_rankings(&entries);
        let raw_again: Vec<RawRankingEntry> = once.iter().map(RawRankingEntry::from).collect();
        prop_assert_eq!(normalize_rankings(&raw_again), once);
    }

    #[test]
    fn prop_counter_converges_exactly(
        target in 0u32..10_000_000,
        duration_ms in 1u64..5_000,
        overshoot_ms in 0u64..1_000,
        steps in 1u64..20,
    ) {
        let clock = Arc::new(ManualClock::new());
        let shown = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&shown);
        let mut animation = CounterAnimation::start(
            f64::from(target),
            Duration::from_millis(duration_ms),
            Rounding::Floor,
            clock.clone(),
            move |v| sink.lock().unwrap().push(v),
        );

        let total = duration_ms + overshoot_ms;
        let mut status = animation.frame();
        for i in 1..=steps {
            clock.set(Duration::from_millis(total * i / steps));
            status = animation.frame();
        }

        prop_assert_eq!(status, FrameStatus::Finished);
        let shown = shown.lock().unwrap();
        prop_assert_eq!(shown.last().copied(), Some(f64::from(target)));
        prop_assert!(shown.iter().all(|v| *v <= f64::from(target)));
    }
}

#[test]
fn test_counter_zero_target_has_no_intermediate_frames() {
    let clock = Arc::new(ManualClock::new());
    let shown = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&shown);
    let mut animation = CounterAnimation::start(
        0.0,
        Duration::from_millis(1500),
        Rounding::Decimals(1),
        clock.clone(),
        move |v| sink.lock().unwrap().push(v),
    );
    for _ in 0..5 {
        clock.advance(Duration::from_millis(100));
        animation.frame();
    }
    assert_eq!(*shown.lock().unwrap(), vec![0.0]);
}

#[test]
fn test_engagement_view_is_well_formed_for_every_shape() {
    let point = EngagementPoint {
        date: chrono::NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        sessions: 9,
        completion_rate: 0.5,
    };
    let item = BreakdownItem {
        category: "completed".to_string(),
        value: 9,
        percentage: 100.0,
    };

    for (timeseries, breakdown) in [
        (vec![point], vec![item.clone()]),
        (vec![point], vec![]),
        (vec![], vec![item.clone()]),
        (vec![], vec![]),
    ] {
        let data = EngagementData {
            summary: EngagementSummary::default(),
            source: ChartSource::select(timeseries.clone(), breakdown.clone()),
            breakdown: breakdown.clone(),
        };
        let view = derive_engagement_view(&data);
        assert!(!view.chart.labels.is_empty());
        assert!(!view.chart.datasets.is_empty());
        assert!(view.chart.is_well_formed());
        let expected_kind = if !timeseries.is_empty() || breakdown.is_empty() {
            ChartKind::Line
        } else {
            ChartKind::Bar
        };
        assert_eq!(view.chart.kind, expected_kind);
    }
}

#[test]
fn test_reference_funnel_scenario() {
    let view = derive_funnel(&FunnelSummary {
        hub_visits: 100,
        game_starts: 80,
        game_completions: 50,
        visit_to_play_rate: 0.8,
        play_to_completion_rate: 0.625,
        overall_conversion_rate: 0.5,
    });

    let steps: Vec<(&str, u64, f64)> = view
        .steps
        .iter()
        .map(|s| (s.name.as_str(), s.users, s.conversion_from_start))
        .collect();
    assert_eq!(
        steps,
        vec![
            ("Hub Visits", 100, 100.0),
            ("Game Starts", 80, 80.0),
            ("Game Completions", 50, 50.0),
        ]
    );
    assert_eq!(view.drop_off_pct, 50.0);
}

#[test]
fn test_reference_popularity_scenario() {
    let rankings = normalize_rankings(&[
        RawRankingEntry {
            game_name: Some("A".to_string()),
            play_count: Some(30.0),
            ..RawRankingEntry::default()
        },
        RawRankingEntry {
            name: Some("B".to_string()),
            plays: Some(10.0),
            ..RawRankingEntry::default()
        },
    ]);
    assert_eq!(
        rankings,
        vec![
            GameRanking { name: "A".to_string(), plays: 30 },
            GameRanking { name: "B".to_string(), plays: 10 },
        ]
    );

    let view = derive_popularity_view(&PopularityData {
        rankings,
        total_games: None,
        total_plays: None,
    });
    assert_eq!(view.average_plays, 20);
    assert_eq!(view.top_game.map(|g| g.name), Some("A".to_string()));
}
