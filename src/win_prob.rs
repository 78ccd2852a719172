use serde::{Deserialize, Serialize};

use crate::config::{FeatureWeight, GameScoreWeights, WinProbConfig};
use crate::report::{MetricsReport, round_to};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelQuality {
    /// All eight differentials were available.
    Full,
    /// Only both Game Scores were usable.
    GameScoreOnly,
    Even,
}

/// One team's inputs to the estimator. `None` marks a value that could not be produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamGameSummary {
    pub game_score: Option<f64>,
    pub power_play_pct: Option<f64>,
    pub corsi_pct: Option<f64>,
    pub hits: Option<f64>,
    pub high_danger_chances: Option<f64>,
    pub expected_goals: Option<f64>,
    pub penalty_minutes: Option<f64>,
    pub shots_on_goal: Option<f64>,
}

impl TeamGameSummary {
    pub fn from_report(report: &MetricsReport, weights: &GameScoreWeights) -> Self {
        Self {
            game_score: Some(report.game_score(weights)),
            power_play_pct: Some(report.power_play_pct()),
            corsi_pct: Some(report.corsi_pct()),
            hits: Some(report.defense.hits as f64),
            high_danger_chances: Some(report.shots.high_danger_shots as f64),
            expected_goals: Some(report.shots.expected_goals),
            penalty_minutes: Some(report.special_teams.penalty_minutes as f64),
            shots_on_goal: Some(report.shots.shots_on_goal as f64),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureContribution {
    pub feature: String,
    /// Away minus home.
    pub diff: f64,
    pub term: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinProbability {
    pub away_probability: f64,
    pub home_probability: f64,
    pub quality: ModelQuality,
    pub contributions: Vec<FeatureContribution>,
}

impl WinProbability {
    fn from_away(away: f64, quality: ModelQuality, contributions: Vec<FeatureContribution>) -> Self {
        let away = round_to(clamp(away, 0.0, 100.0), 1);
        Self {
            away_probability: away,
            home_probability: round_to(100.0 - away, 1),
            quality,
            contributions,
        }
    }

    pub fn even() -> Self {
        Self::from_away(50.0, ModelQuality::Even, Vec::new())
    }
}

pub fn compute_win_prob(away: &TeamGameSummary, home: &TeamGameSummary, cfg: &WinProbConfig) -> WinProbability {
    let features: [(&str, Option<f64>, Option<f64>, FeatureWeight); 8] = [
        ("game_score", away.game_score, home.game_score, cfg.game_score),
        ("power_play_pct", away.power_play_pct, home.power_play_pct, cfg.power_play_pct),
        ("corsi_pct", away.corsi_pct, home.corsi_pct, cfg.corsi_pct),
        ("hits", away.hits, home.hits, cfg.hits),
        ("high_danger_chances", away.high_danger_chances, home.high_danger_chances, cfg.high_danger),
        ("expected_goals", away.expected_goals, home.expected_goals, cfg.expected_goals),
        ("penalty_minutes", away.penalty_minutes, home.penalty_minutes, cfg.penalty_minutes),
        ("shots_on_goal", away.shots_on_goal, home.shots_on_goal, cfg.shots_on_goal),
    ];

    let mut contributions = Vec::with_capacity(features.len());
    let mut score = 0.0;
    let mut complete = true;
    for (name, a, h, weight) in features {
        let (Some(a), Some(h)) = (finite(a), finite(h)) else {
            complete = false;
            break;
        };
        let diff = a - h;
        let term = weight.term(diff);
        score += term;
        contributions.push(FeatureContribution {
            feature: name.to_string(),
            diff,
            term,
        });
    }

    if complete && score.is_finite() {
        return WinProbability::from_away(sigmoid(score) * 100.0, ModelQuality::Full, contributions);
    }

    if let (Some(a), Some(h)) = (finite(away.game_score), finite(home.game_score)) {
        if a >= 0.0 && h >= 0.0 && a + h > 0.0 {
            tracing::warn!(away_gs = a, home_gs = h, "win probability fell back to game score ratio");
            return WinProbability::from_away(a / (a + h) * 100.0, ModelQuality::GameScoreOnly, Vec::new());
        }
    }

    tracing::warn!("win probability inputs unusable, reporting an even game");
    WinProbability::even()
}

fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

fn clamp(v: f64, lo: f64, hi: f64) -> f64 {
    v.max(lo).min(hi)
}
