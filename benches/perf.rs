use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use puck_metrics::aggregate::{GameContext, MetricsEngine};
use puck_metrics::on_ice::OnIceIndex;
use puck_metrics::pbp::parse_play_by_play_json;
use puck_metrics::season::{GameInput, analyze_game, analyze_games, season_summary};
use puck_metrics::sequences::{EventFilter, analyze_sequences};
use puck_metrics::synthetic::{HOME_TEAM, synthetic_game};

fn bench_pbp_parse(c: &mut Criterion) {
    c.bench_function("pbp_parse", |b| {
        b.iter(|| {
            let log = parse_play_by_play_json(black_box(GAME_PBP_JSON)).unwrap();
            black_box(log.events.len());
        })
    });
}

fn bench_team_aggregate(c: &mut Criterion) {
    let game = synthetic_game(11);
    let engine = MetricsEngine::default();
    let on_ice = OnIceIndex::new(&game.shifts);
    c.bench_function("team_aggregate", |b| {
        b.iter(|| {
            let ctx = GameContext::new(Some(HOME_TEAM), &on_ice);
            let report = engine.aggregate(black_box(&game.log.events), EventFilter::team(HOME_TEAM), ctx);
            black_box(report.total_shots());
        })
    });
}

fn bench_sequences(c: &mut Criterion) {
    let game = synthetic_game(12);
    let engine = MetricsEngine::default();
    c.bench_function("sequence_analyzers", |b| {
        b.iter(|| {
            let seq = analyze_sequences(
                black_box(&game.log.events),
                EventFilter::team(HOME_TEAM),
                &engine.config().windows,
            );
            black_box(seq.pressure.offensive_zone_events);
        })
    });
}

fn bench_box_scores(c: &mut Criterion) {
    let game = synthetic_game(13);
    let engine = MetricsEngine::default();
    c.bench_function("box_scores", |b| {
        b.iter(|| {
            let rows = engine
                .box_scores(black_box(&game.log), HOME_TEAM, &game.shifts)
                .unwrap();
            black_box(rows.len());
        })
    });
}

fn bench_game_analysis(c: &mut Criterion) {
    let game = synthetic_game(14);
    let engine = MetricsEngine::default();
    c.bench_function("game_analysis", |b| {
        b.iter(|| {
            let analysis = analyze_game(&engine, black_box(&game)).unwrap();
            black_box(analysis.win_probability.home_probability);
        })
    });
}

fn bench_season(c: &mut Criterion) {
    let games: Vec<GameInput> = (0..32).map(synthetic_game).collect();
    let engine = MetricsEngine::default();
    let mut group = c.benchmark_group("season");
    group.sample_size(10);
    group.bench_function("season_32_games", |b| {
        b.iter(|| {
            let analyses = analyze_games(&engine, black_box(&games))
                .into_iter()
                .filter_map(Result::ok)
                .collect::<Vec<_>>();
            let summary = season_summary(&engine, &analyses);
            black_box(summary.len());
        })
    });
    group.finish();
}

criterion_group!(
    perf,
    bench_pbp_parse,
    bench_team_aggregate,
    bench_sequences,
    bench_box_scores,
    bench_game_analysis,
    bench_season
);
criterion_main!(perf);

static GAME_PBP_JSON: &str = include_str!("../tests/fixtures/game_pbp.json");
