use std::collections::BTreeMap;
use std::env;

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::aggregate::{MetricsEngine, PlayerBoxScore};
use crate::error::Result;
use crate::model::{EventType, GameLog, ShiftInterval, TeamId, TeamInfo};
use crate::report::MetricsReport;
use crate::win_prob::{TeamGameSummary, WinProbability, compute_win_prob};

pub const PARALLELISM_ENV: &str = "PUCK_METRICS_PARALLELISM";

#[derive(Debug, Clone, Default)]
pub struct GameInput {
    pub log: GameLog,
    pub shifts: Vec<ShiftInterval>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameAnalysis {
    pub game_id: u64,
    pub game_date: Option<NaiveDate>,
    pub home: TeamInfo,
    pub away: TeamInfo,
    /// Goals outside the shootout.
    pub home_goals: u32,
    pub away_goals: u32,
    pub home_shootout_goals: u32,
    pub away_shootout_goals: u32,
    pub home_report: MetricsReport,
    pub away_report: MetricsReport,
    pub home_players: Vec<PlayerBoxScore>,
    pub away_players: Vec<PlayerBoxScore>,
    pub win_probability: WinProbability,
}

impl GameAnalysis {
    pub fn winner(&self) -> Option<TeamId> {
        let home = (self.home_goals, self.home_shootout_goals);
        let away = (self.away_goals, self.away_shootout_goals);
        match home.cmp(&away) {
            std::cmp::Ordering::Greater => Some(self.home.id),
            std::cmp::Ordering::Less => Some(self.away.id),
            std::cmp::Ordering::Equal => None,
        }
    }
}

pub fn analyze_game(engine: &MetricsEngine, input: &GameInput) -> Result<GameAnalysis> {
    let log = &input.log;
    let home_report = engine.team_report(log, log.home.id, &input.shifts)?;
    let away_report = engine.team_report(log, log.away.id, &input.shifts)?;
    let home_players = engine.box_scores(log, log.home.id, &input.shifts)?;
    let away_players = engine.box_scores(log, log.away.id, &input.shifts)?;

    let weights = &engine.config().game_score;
    let win_probability = compute_win_prob(
        &TeamGameSummary::from_report(&away_report, weights),
        &TeamGameSummary::from_report(&home_report, weights),
        &engine.config().win_prob,
    );

    let shootout_goals = |team: TeamId| {
        log.events
            .iter()
            .filter(|e| e.is_shootout() && e.event_type == EventType::Goal && e.is_team(team))
            .count() as u32
    };

    Ok(GameAnalysis {
        game_id: log.game_id,
        game_date: log.game_date,
        home: log.home.clone(),
        away: log.away.clone(),
        home_goals: home_report.shots.goals,
        away_goals: away_report.shots.goals,
        home_shootout_goals: shootout_goals(log.home.id),
        away_shootout_goals: shootout_goals(log.away.id),
        home_report,
        away_report,
        home_players,
        away_players,
        win_probability,
    })
}

/// Analyze independent games on a bounded worker pool. Output order matches input order.
pub fn analyze_games(engine: &MetricsEngine, games: &[GameInput]) -> Vec<Result<GameAnalysis>> {
    let pool = build_analysis_pool();
    with_analysis_pool(&pool, || {
        games
            .par_iter()
            .map(|game| analyze_game(engine, game))
            .collect()
    })
}

fn analysis_parallelism() -> usize {
    env::var(PARALLELISM_ENV)
        .ok()
        .and_then(|val| val.parse::<usize>().ok())
        .unwrap_or(4)
        .clamp(1, 32)
}

fn build_analysis_pool() -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(analysis_parallelism())
        .build()
        .ok()
}

fn with_analysis_pool<T>(pool: &Option<rayon::ThreadPool>, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    match pool.as_ref() {
        Some(pool) => pool.install(action),
        None => action(),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitTotals {
    pub games: u32,
    pub wins: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub xg_for: f64,
    pub xg_against: f64,
    corsi_pct_sum: f64,
    game_score_sum: f64,
}

impl SplitTotals {
    fn add(&mut self, own: &MetricsReport, other: &MetricsReport, won: bool, game_score: f64) {
        self.games += 1;
        self.wins += u32::from(won);
        self.goals_for += own.shots.goals;
        self.goals_against += other.shots.goals;
        self.xg_for += own.shots.expected_goals;
        self.xg_against += other.shots.expected_goals;
        self.corsi_pct_sum += own.corsi_pct();
        self.game_score_sum += game_score;
    }

    pub fn avg_corsi_pct(&self) -> f64 {
        if self.games == 0 {
            50.0
        } else {
            self.corsi_pct_sum / self.games as f64
        }
    }

    pub fn avg_game_score(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.game_score_sum / self.games as f64
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamSeasonSummary {
    pub team_id: TeamId,
    pub abbrev: String,
    pub games: u32,
    pub wins: u32,
    pub losses: u32,
    /// Wins minus the post-game win probability, summed over games.
    pub wins_above_expected: f64,
    /// Wins where the estimator gave this team under 50%.
    pub upset_wins: u32,
    pub home: SplitTotals,
    pub away: SplitTotals,
}

pub fn season_summary(engine: &MetricsEngine, analyses: &[GameAnalysis]) -> Vec<TeamSeasonSummary> {
    let weights = &engine.config().game_score;
    let mut teams: BTreeMap<TeamId, TeamSeasonSummary> = BTreeMap::new();

    for game in analyses {
        let winner = game.winner();
        let sides = [
            (&game.home, &game.home_report, &game.away_report, game.win_probability.home_probability, true),
            (&game.away, &game.away_report, &game.home_report, game.win_probability.away_probability, false),
        ];
        for (info, own, other, prob, is_home) in sides {
            let entry = teams.entry(info.id).or_insert_with(|| TeamSeasonSummary {
                team_id: info.id,
                abbrev: info.abbrev.clone(),
                ..TeamSeasonSummary::default()
            });
            let won = winner == Some(info.id);
            entry.games += 1;
            if won {
                entry.wins += 1;
                if prob < 50.0 {
                    entry.upset_wins += 1;
                }
            } else if winner.is_some() {
                entry.losses += 1;
            }
            entry.wins_above_expected += f64::from(u8::from(won)) - prob / 100.0;

            let split = if is_home { &mut entry.home } else { &mut entry.away };
            split.add(own, other, won, own.game_score(weights));
        }
    }
    teams.into_values().collect()
}
