use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::GameScoreWeights;
use crate::model::{PlayerId, ShotType, TeamId, Zone};
use crate::sequences::{SequenceMetrics, ratio_pct};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShotCounts {
    /// Goals included.
    pub shots_on_goal: u32,
    pub missed_shots: u32,
    pub blocked_shots: u32,
    pub goals: u32,
    pub high_danger_shots: u32,
    pub expected_goals: f64,
    pub by_type: BTreeMap<ShotType, u32>,
    pub by_zone: BTreeMap<Zone, u32>,
}

impl ShotCounts {
    pub fn total_shots(&self) -> u32 {
        self.shots_on_goal + self.missed_shots + self.blocked_shots
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DefensiveCounts {
    pub blocks: u32,
    pub hits: u32,
    pub takeaways: u32,
    pub giveaways: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Possession {
    pub corsi_for: u32,
    pub corsi_against: u32,
    pub xg_for: f64,
    pub xg_against: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecialTeams {
    pub power_play_goals: u32,
    pub power_play_opportunities: u32,
    pub penalties_taken: u32,
    pub penalties_drawn: u32,
    pub penalty_minutes: u32,
    pub faceoff_wins: u32,
    pub faceoff_losses: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodLine {
    pub period: u8,
    pub shots_on_goal: u32,
    pub corsi_for: u32,
    pub corsi_against: u32,
    pub goals: u32,
    pub expected_goals: f64,
    pub hits: u32,
    pub penalty_minutes: u32,
    pub faceoff_wins: u32,
    pub faceoff_losses: u32,
}

impl PeriodLine {
    pub fn new(period: u8) -> Self {
        Self {
            period,
            ..Self::default()
        }
    }

    pub fn corsi_pct(&self) -> f64 {
        ratio_pct(self.corsi_for as f64, (self.corsi_for + self.corsi_against) as f64, 50.0)
    }

    pub fn faceoff_pct(&self) -> f64 {
        ratio_pct(self.faceoff_wins as f64, (self.faceoff_wins + self.faceoff_losses) as f64, 50.0)
    }
}

/// Counting stats behind Game Score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GameScoreInputs {
    pub goals: u32,
    pub primary_assists: u32,
    pub secondary_assists: u32,
    pub shots: u32,
    pub blocks: u32,
    pub penalties_drawn: u32,
    pub penalties_taken: u32,
    pub faceoff_wins: u32,
    pub faceoff_losses: u32,
    pub goals_for: u32,
    pub goals_against: u32,
}

impl GameScoreInputs {
    pub fn game_score(&self, w: &GameScoreWeights) -> f64 {
        self.goals as f64 * w.goals
            + self.primary_assists as f64 * w.primary_assists
            + self.secondary_assists as f64 * w.secondary_assists
            + self.shots as f64 * w.shots
            + self.blocks as f64 * w.blocks
            + self.penalties_drawn as f64 * w.penalties_drawn
            + self.penalties_taken as f64 * w.penalties_taken
            + self.faceoff_wins as f64 * w.faceoff_wins
            + self.faceoff_losses as f64 * w.faceoff_losses
            + self.goals_for as f64 * w.goals_for
            + self.goals_against as f64 * w.goals_against
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub team_id: TeamId,
    pub player_id: Option<PlayerId>,
    pub shots: ShotCounts,
    pub defense: DefensiveCounts,
    pub possession: Possession,
    pub special_teams: SpecialTeams,
    pub sequences: SequenceMetrics,
    pub periods: Vec<PeriodLine>,
    pub game_score_inputs: GameScoreInputs,
}

impl MetricsReport {
    pub fn new(team_id: TeamId, player_id: Option<PlayerId>) -> Self {
        Self {
            team_id,
            player_id,
            ..Self::default()
        }
    }

    pub fn total_shots(&self) -> u32 {
        self.shots.total_shots()
    }

    pub fn shooting_pct(&self) -> f64 {
        ratio_pct(self.shots.goals as f64, self.shots.shots_on_goal as f64, 0.0)
    }

    pub fn high_danger_share(&self) -> f64 {
        ratio_pct(self.shots.high_danger_shots as f64, self.total_shots() as f64, 0.0)
    }

    pub fn corsi_pct(&self) -> f64 {
        let p = &self.possession;
        ratio_pct(p.corsi_for as f64, (p.corsi_for + p.corsi_against) as f64, 50.0)
    }

    pub fn xg_pct(&self) -> f64 {
        let p = &self.possession;
        ratio_pct(p.xg_for, p.xg_for + p.xg_against, 50.0)
    }

    pub fn power_play_pct(&self) -> f64 {
        let st = &self.special_teams;
        ratio_pct(st.power_play_goals as f64, st.power_play_opportunities as f64, 0.0)
    }

    pub fn faceoff_pct(&self) -> f64 {
        let st = &self.special_teams;
        ratio_pct(st.faceoff_wins as f64, (st.faceoff_wins + st.faceoff_losses) as f64, 50.0)
    }

    pub fn game_score(&self, weights: &GameScoreWeights) -> f64 {
        self.game_score_inputs.game_score(weights)
    }

    /// Nested `category -> metric -> value` view with a fixed key set, for presentation layers.
    pub fn categories(&self, weights: &GameScoreWeights) -> BTreeMap<&'static str, BTreeMap<String, MetricValue>> {
        let mut out = BTreeMap::new();
        let s = &self.shots;

        let mut shots = Metrics::default();
        shots.count("shots_on_goal", s.shots_on_goal);
        shots.count("missed_shots", s.missed_shots);
        shots.count("blocked_shots", s.blocked_shots);
        shots.count("total_shots", self.total_shots());
        shots.count("goals", s.goals);
        shots.count("high_danger_shots", s.high_danger_shots);
        shots.number("expected_goals", s.expected_goals);
        shots.percent("shooting_pct", self.shooting_pct());
        shots.percent("high_danger_share", self.high_danger_share());
        out.insert("shot_quality", shots.0);

        let mut types = Metrics::default();
        for t in ShotType::ALL {
            types.count(shot_type_label(t), s.by_type.get(&t).copied().unwrap_or(0));
        }
        out.insert("shot_types", types.0);

        let mut zones = Metrics::default();
        for z in Zone::ALL {
            zones.count(zone_label(z), s.by_zone.get(&z).copied().unwrap_or(0));
        }
        out.insert("shot_zones", zones.0);

        let d = &self.defense;
        let mut defense = Metrics::default();
        defense.count("blocks", d.blocks);
        defense.count("hits", d.hits);
        defense.count("takeaways", d.takeaways);
        defense.count("giveaways", d.giveaways);
        out.insert("defense", defense.0);

        let p = &self.possession;
        let mut possession = Metrics::default();
        possession.count("corsi_for", p.corsi_for);
        possession.count("corsi_against", p.corsi_against);
        possession.percent("corsi_pct", self.corsi_pct());
        possession.number("xg_for", p.xg_for);
        possession.number("xg_against", p.xg_against);
        possession.percent("xg_pct", self.xg_pct());
        out.insert("possession", possession.0);

        let st = &self.special_teams;
        let mut special = Metrics::default();
        special.count("power_play_goals", st.power_play_goals);
        special.count("power_play_opportunities", st.power_play_opportunities);
        special.percent("power_play_pct", self.power_play_pct());
        special.count("penalties_taken", st.penalties_taken);
        special.count("penalties_drawn", st.penalties_drawn);
        special.count("penalty_minutes", st.penalty_minutes);
        special.count("faceoff_wins", st.faceoff_wins);
        special.count("faceoff_losses", st.faceoff_losses);
        special.percent("faceoff_pct", self.faceoff_pct());
        out.insert("special_teams", special.0);

        let seq = &self.sequences;
        let mut pressure = Metrics::default();
        pressure.count("offensive_zone_events", seq.pressure.offensive_zone_events);
        pressure.count("sustained_pressure_events", seq.pressure.sustained_pressure_events);
        pressure.count("pressure_sequences", seq.pressure.pressure_sequences);
        out.insert("pressure", pressure.0);

        let pre = &seq.pre_shot;
        let mut movement = Metrics::default();
        movement.count("royal_road_attempts", pre.royal_road.attempts);
        movement.count("royal_road_goals", pre.royal_road.goals);
        movement.count("zone_retrieval_attempts", pre.zone_retrieval.attempts);
        movement.count("zone_retrieval_goals", pre.zone_retrieval.goals);
        movement.count("lateral_attempts", pre.lateral.attempts);
        movement.count("lateral_goals", pre.lateral.goals);
        movement.number("lateral_avg_delta_y", pre.lateral.average_delta());
        movement.count("longitudinal_attempts", pre.longitudinal.attempts);
        movement.count("longitudinal_goals", pre.longitudinal.goals);
        movement.number("longitudinal_avg_delta_x", pre.longitudinal.average_delta());
        out.insert("pre_shot_movement", movement.0);

        let tr = &seq.transitions;
        let mut transitions = Metrics::default();
        transitions.count("zone_entries", tr.zone_entries);
        transitions.count("entries_to_shots", tr.entries_to_shots);
        transitions.percent("entry_to_shot_pct", tr.entry_to_shot_pct());
        transitions.count("zone_exits", tr.zone_exits);
        transitions.count("exits_to_entries", tr.exits_to_entries);
        transitions.percent("exit_to_entry_pct", tr.exit_to_entry_pct());
        out.insert("transitions", transitions.0);

        let rc = &seq.rush_cycle;
        let mut rush = Metrics::default();
        rush.count("rush_attempts", rc.rush_attempts);
        rush.count("rush_on_goal", rc.rush_on_goal);
        rush.count("rush_goals", rc.rush_goals);
        rush.count("cycle_attempts", rc.cycle_attempts);
        rush.count("cycle_on_goal", rc.cycle_on_goal);
        rush.count("cycle_goals", rc.cycle_goals);
        out.insert("rush_cycle", rush.0);

        let ci = &seq.cross_ice;
        let mut passes = Metrics::default();
        passes.count("attempts", ci.attempts);
        passes.count("successful", ci.successful);
        passes.count("unsuccessful", ci.unsuccessful);
        passes.percent("success_pct", ci.success_pct());
        out.insert("cross_ice_passes", passes.0);

        let zm = &seq.zones;
        let mut zone_play = Metrics::default();
        zone_play.count("oz_originating_shots", zm.oz_originating_shots);
        zone_play.count("nz_originating_shots", zm.nz_originating_shots);
        zone_play.count("dz_originating_shots", zm.dz_originating_shots);
        zone_play.count("nz_turnovers", zm.nz_turnovers);
        zone_play.count("nz_turnovers_to_shots_against", zm.nz_turnovers_to_shots_against);
        out.insert("zone_play", zone_play.0);

        let mut summary = Metrics::default();
        summary.number("game_score", self.game_score(weights));
        summary.text(
            "scope",
            match self.player_id {
                Some(p) => format!("player {p}"),
                None => format!("team {}", self.team_id),
            },
        );
        out.insert("summary", summary.0);

        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Count(u32),
    Number(f64),
    Percent(f64),
    Text(String),
}

#[derive(Default)]
struct Metrics(BTreeMap<String, MetricValue>);

impl Metrics {
    fn count(&mut self, key: &str, v: u32) {
        self.0.insert(key.to_string(), MetricValue::Count(v));
    }

    fn number(&mut self, key: &str, v: f64) {
        self.0.insert(key.to_string(), MetricValue::Number(round_to(v, 2)));
    }

    fn percent(&mut self, key: &str, v: f64) {
        self.0.insert(key.to_string(), MetricValue::Percent(round_to(v, 1)));
    }

    fn text(&mut self, key: &str, v: String) {
        self.0.insert(key.to_string(), MetricValue::Text(v));
    }
}

pub fn shot_type_label(t: ShotType) -> &'static str {
    match t {
        ShotType::Wrist => "wrist",
        ShotType::Snap => "snap",
        ShotType::Slap => "slap",
        ShotType::Backhand => "backhand",
        ShotType::TipIn => "tip-in",
        ShotType::Deflection => "deflection",
        ShotType::WrapAround => "wrap-around",
        ShotType::OneTimer => "one-timer",
        ShotType::Other => "other",
        ShotType::Unknown => "unknown",
    }
}

pub fn zone_label(z: Zone) -> &'static str {
    match z {
        Zone::Offensive => "offensive",
        Zone::Neutral => "neutral",
        Zone::Defensive => "defensive",
        Zone::Unknown => "unknown",
    }
}

pub(crate) fn round_to(v: f64, decimals: i32) -> f64 {
    if !v.is_finite() {
        return 0.0;
    }
    let f = 10f64.powi(decimals);
    (v * f).round() / f
}
