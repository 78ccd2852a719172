use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::error::{MetricsError, Result};
use crate::model::ShotType;

pub const CONFIG_ENV: &str = "PUCK_METRICS_CONFIG";

static SHARED: OnceCell<AnalyticsConfig> = OnceCell::new();

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub xg: XgConfig,
    pub windows: WindowConfig,
    pub game_score: GameScoreWeights,
    pub win_prob: WinProbConfig,
    /// Shot attempts at or above this xG count as high-danger chances.
    pub high_danger_xg: f64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            xg: XgConfig::default(),
            windows: WindowConfig::default(),
            game_score: GameScoreWeights::default(),
            win_prob: WinProbConfig::default(),
            high_danger_xg: 0.15,
        }
    }
}

impl AnalyticsConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| MetricsError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| MetricsError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Config from the file named by `PUCK_METRICS_CONFIG`, or defaults when unset.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Self::load(PathBuf::from(path)),
            _ => Ok(Self::default()),
        }
    }
}

/// Process-wide config, resolved from the environment on first use.
pub fn shared() -> Result<&'static AnalyticsConfig> {
    SHARED.get_or_try_init(AnalyticsConfig::from_env)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct XgConfig {
    pub goal_x: f64,
    pub goal_y: f64,
    pub post_half_width: f64,
    /// `(max distance, base xG)`, checked in order with `<=`.
    pub distance_buckets: Vec<(f64, f64)>,
    pub distance_beyond: f64,
    /// `(min angle in degrees, multiplier)`, checked in order with `>`.
    pub angle_buckets: Vec<(f64, f64)>,
    pub angle_default: f64,
    pub zone: ZoneMultipliers,
    pub shot_types: BTreeMap<ShotType, f64>,
    pub shot_type_default: f64,
    pub events: EventMultipliers,
    pub cap: f64,
}

impl Default for XgConfig {
    fn default() -> Self {
        let shot_types = [
            (ShotType::TipIn, 1.3),
            (ShotType::Deflection, 1.3),
            (ShotType::Backhand, 1.3),
            (ShotType::Wrist, 1.0),
            (ShotType::Snap, 1.0),
            (ShotType::Slap, 0.9),
            (ShotType::WrapAround, 1.1),
            (ShotType::OneTimer, 1.2),
        ]
        .into_iter()
        .collect();
        Self {
            goal_x: 89.0,
            goal_y: 0.0,
            post_half_width: 3.0,
            distance_buckets: vec![(10.0, 0.25), (20.0, 0.15), (35.0, 0.08), (50.0, 0.04)],
            distance_beyond: 0.02,
            angle_buckets: vec![(45.0, 0.3), (30.0, 0.5), (15.0, 0.8)],
            angle_default: 1.0,
            zone: ZoneMultipliers::default(),
            shot_types,
            shot_type_default: 1.0,
            events: EventMultipliers::default(),
            cap: 0.95,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneMultipliers {
    pub high_danger: f64,
    pub high_danger_min_x: f64,
    pub high_danger_max_abs_y: f64,
    pub medium_danger: f64,
    pub medium_danger_min_x: f64,
    pub medium_danger_max_abs_y: f64,
    pub offensive: f64,
    pub neutral: f64,
    pub defensive: f64,
    pub unknown: f64,
}

impl Default for ZoneMultipliers {
    fn default() -> Self {
        Self {
            high_danger: 1.5,
            high_danger_min_x: 75.0,
            high_danger_max_abs_y: 15.0,
            medium_danger: 1.2,
            medium_danger_min_x: 60.0,
            medium_danger_max_abs_y: 25.0,
            offensive: 0.8,
            neutral: 0.3,
            defensive: 0.1,
            unknown: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventMultipliers {
    pub on_goal: f64,
    pub missed: f64,
    pub blocked: f64,
}

impl Default for EventMultipliers {
    fn default() -> Self {
        Self {
            on_goal: 1.0,
            missed: 0.7,
            blocked: 0.5,
        }
    }
}

/// Every event-count and seconds budget used by the sequence analyzers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub pressure_gap_secs: u32,
    pub pressure_min_run: u32,
    pub pre_shot_events: usize,
    pub pre_shot_secs: u32,
    pub retrieval_events: usize,
    pub retrieval_secs: u32,
    pub entry_lookahead: usize,
    pub exit_lookahead: usize,
    pub rush_events: usize,
    pub rush_secs: u32,
    pub pass_lookahead: usize,
    pub pass_lateral_min: f64,
    pub pass_control_events: usize,
    pub turnover_to_shot_secs: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            pressure_gap_secs: 5,
            pressure_min_run: 3,
            pre_shot_events: 20,
            pre_shot_secs: 4,
            retrieval_events: 25,
            retrieval_secs: 5,
            entry_lookahead: 5,
            exit_lookahead: 3,
            rush_events: 10,
            rush_secs: 5,
            pass_lookahead: 5,
            pass_lateral_min: 15.0,
            pass_control_events: 2,
            turnover_to_shot_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameScoreWeights {
    pub goals: f64,
    pub primary_assists: f64,
    pub secondary_assists: f64,
    pub shots: f64,
    pub blocks: f64,
    pub penalties_drawn: f64,
    pub penalties_taken: f64,
    pub faceoff_wins: f64,
    pub faceoff_losses: f64,
    pub goals_for: f64,
    pub goals_against: f64,
}

impl Default for GameScoreWeights {
    fn default() -> Self {
        Self {
            goals: 0.75,
            primary_assists: 0.7,
            secondary_assists: 0.55,
            shots: 0.075,
            blocks: 0.05,
            penalties_drawn: 0.15,
            penalties_taken: -0.15,
            faceoff_wins: 0.01,
            faceoff_losses: -0.01,
            goals_for: 0.15,
            goals_against: -0.15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureWeight {
    pub weight: f64,
    pub scale: f64,
}

impl FeatureWeight {
    pub const fn new(weight: f64, scale: f64) -> Self {
        Self { weight, scale }
    }

    pub fn term(&self, diff: f64) -> f64 {
        diff * self.scale * self.weight
    }
}

/// Post-game weights, derived from correlations of away-minus-home differentials with away wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WinProbConfig {
    pub game_score: FeatureWeight,
    pub power_play_pct: FeatureWeight,
    pub corsi_pct: FeatureWeight,
    pub hits: FeatureWeight,
    pub high_danger: FeatureWeight,
    pub expected_goals: FeatureWeight,
    pub penalty_minutes: FeatureWeight,
    pub shots_on_goal: FeatureWeight,
}

impl Default for WinProbConfig {
    fn default() -> Self {
        Self {
            game_score: FeatureWeight::new(0.6504, 0.1),
            power_play_pct: FeatureWeight::new(0.3933, 0.01),
            corsi_pct: FeatureWeight::new(-0.3598, 0.01),
            hits: FeatureWeight::new(-0.2434, 0.01),
            high_danger: FeatureWeight::new(0.0747, 0.05),
            expected_goals: FeatureWeight::new(-0.0545, 0.2),
            penalty_minutes: FeatureWeight::new(0.0173, 0.01),
            shots_on_goal: FeatureWeight::new(-0.0158, 0.02),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: AnalyticsConfig =
            serde_json::from_str(r#"{"windows":{"rush_secs":8},"high_danger_xg":0.2}"#).unwrap();
        assert_eq!(cfg.windows.rush_secs, 8);
        assert_eq!(cfg.windows.rush_events, 10);
        assert_eq!(cfg.high_danger_xg, 0.2);
        assert_eq!(cfg.xg.cap, 0.95);
    }

    #[test]
    fn shot_type_table_round_trips_through_json() {
        let cfg = AnalyticsConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: AnalyticsConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.xg.shot_types.get(&ShotType::Slap), Some(&0.9));
        assert_eq!(back.xg.shot_types.len(), 8);
    }

    #[test]
    fn load_reports_missing_file() {
        let err = AnalyticsConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, MetricsError::ConfigRead { .. }));
    }

    #[test]
    fn load_reports_bad_json() {
        let path = std::env::temp_dir().join(format!("puck_metrics_cfg_{}.json", std::process::id()));
        fs::write(&path, "{not json").unwrap();
        let err = AnalyticsConfig::load(&path).unwrap_err();
        let _ = fs::remove_file(&path);
        assert!(matches!(err, MetricsError::ConfigParse { .. }));
    }
}
