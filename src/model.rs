use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type TeamId = u32;
pub type PlayerId = u32;

pub const PERIOD_SECONDS: u32 = 1200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    ShotOnGoal,
    MissedShot,
    BlockedShot,
    Goal,
    Hit,
    Takeaway,
    Giveaway,
    Faceoff,
    Penalty,
    Stoppage,
    PeriodStart,
    PeriodEnd,
    DelayedPenalty,
    Other,
}

impl EventType {
    pub fn from_key(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "shot-on-goal" => Self::ShotOnGoal,
            "missed-shot" => Self::MissedShot,
            "blocked-shot" => Self::BlockedShot,
            "goal" => Self::Goal,
            "hit" => Self::Hit,
            "takeaway" => Self::Takeaway,
            "giveaway" => Self::Giveaway,
            "faceoff" => Self::Faceoff,
            "penalty" => Self::Penalty,
            "stoppage" => Self::Stoppage,
            "period-start" => Self::PeriodStart,
            "period-end" => Self::PeriodEnd,
            "delayed-penalty" => Self::DelayedPenalty,
            _ => Self::Other,
        }
    }

    pub fn is_shot_attempt(self) -> bool {
        matches!(
            self,
            Self::ShotOnGoal | Self::MissedShot | Self::BlockedShot | Self::Goal
        )
    }

    pub fn is_on_goal(self) -> bool {
        matches!(self, Self::ShotOnGoal | Self::Goal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    Offensive,
    Neutral,
    Defensive,
    Unknown,
}

impl Zone {
    pub const ALL: [Zone; 4] = [Zone::Offensive, Zone::Neutral, Zone::Defensive, Zone::Unknown];

    pub fn from_code(raw: &str) -> Self {
        match raw.trim() {
            "O" | "o" => Self::Offensive,
            "N" | "n" => Self::Neutral,
            "D" | "d" => Self::Defensive,
            _ => Self::Unknown,
        }
    }

    pub fn from_x(x: f64) -> Self {
        if x > 25.0 {
            Self::Offensive
        } else if x < -25.0 {
            Self::Defensive
        } else {
            Self::Neutral
        }
    }

    pub fn mirrored(self) -> Self {
        match self {
            Self::Offensive => Self::Defensive,
            Self::Defensive => Self::Offensive,
            other => other,
        }
    }

    pub fn is_neutral_or_defensive(self) -> bool {
        matches!(self, Self::Neutral | Self::Defensive)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShotType {
    Wrist,
    Snap,
    Slap,
    Backhand,
    TipIn,
    Deflection,
    WrapAround,
    OneTimer,
    Other,
    Unknown,
}

impl ShotType {
    pub const ALL: [ShotType; 10] = [
        ShotType::Wrist,
        ShotType::Snap,
        ShotType::Slap,
        ShotType::Backhand,
        ShotType::TipIn,
        ShotType::Deflection,
        ShotType::WrapAround,
        ShotType::OneTimer,
        ShotType::Other,
        ShotType::Unknown,
    ];

    pub fn from_raw(raw: &str) -> Self {
        let s = raw.trim().to_ascii_lowercase();
        match s.as_str() {
            "" | "unknown" => Self::Unknown,
            "wrist" | "wrist-shot" => Self::Wrist,
            "snap" | "snap-shot" => Self::Snap,
            "slap" | "slapshot" | "slap-shot" => Self::Slap,
            "backhand" => Self::Backhand,
            "tip-in" | "tip" => Self::TipIn,
            "deflection" | "deflected" => Self::Deflection,
            "wrap-around" | "wrap" => Self::WrapAround,
            "one-timer" | "onetime" => Self::OneTimer,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeriodType {
    #[serde(rename = "REG")]
    Regulation,
    #[serde(rename = "OT")]
    Overtime,
    #[serde(rename = "SO")]
    Shootout,
}

impl PeriodType {
    pub fn from_raw(raw: &str, period: u8) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "OT" => Self::Overtime,
            "SO" => Self::Shootout,
            "REG" => Self::Regulation,
            _ if period > 3 => Self::Overtime,
            _ => Self::Regulation,
        }
    }
}

/// Skaters per side, decoded from the 4-digit situation code
/// `[away goalie][away skaters][home skaters][home goalie]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrengthState {
    pub away_skaters: u8,
    pub home_skaters: u8,
}

impl Default for StrengthState {
    fn default() -> Self {
        Self {
            away_skaters: 5,
            home_skaters: 5,
        }
    }
}

impl StrengthState {
    pub fn from_situation_code(raw: &str) -> Self {
        let digits: Vec<u8> = raw
            .trim()
            .chars()
            .map(|c| c.to_digit(10).map(|d| d as u8))
            .collect::<Option<Vec<_>>>()
            .unwrap_or_default();
        if digits.len() != 4 {
            return Self::default();
        }
        Self {
            away_skaters: digits[1],
            home_skaters: digits[2],
        }
    }

    /// Skater advantage for one side: positive means that side is on the power play.
    pub fn advantage(&self, is_home: bool) -> i8 {
        let (own, other) = if is_home {
            (self.home_skaters, self.away_skaters)
        } else {
            (self.away_skaters, self.home_skaters)
        };
        own as i8 - other as i8
    }
}

impl fmt::Display for StrengthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.away_skaters, self.home_skaters)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerRole {
    Scoring,
    Assist1,
    Assist2,
    Shooting,
    Blocking,
    Hitting,
    Hittee,
    Winning,
    Losing,
    CommittedBy,
    DrawnBy,
    Goalie,
    Player,
}

impl PlayerRole {
    pub const ALL: [PlayerRole; 13] = [
        PlayerRole::Scoring,
        PlayerRole::Assist1,
        PlayerRole::Assist2,
        PlayerRole::Shooting,
        PlayerRole::Blocking,
        PlayerRole::Hitting,
        PlayerRole::Hittee,
        PlayerRole::Winning,
        PlayerRole::Losing,
        PlayerRole::CommittedBy,
        PlayerRole::DrawnBy,
        PlayerRole::Goalie,
        PlayerRole::Player,
    ];

    pub fn details_key(self) -> &'static str {
        match self {
            Self::Scoring => "scoringPlayerId",
            Self::Assist1 => "assist1PlayerId",
            Self::Assist2 => "assist2PlayerId",
            Self::Shooting => "shootingPlayerId",
            Self::Blocking => "blockingPlayerId",
            Self::Hitting => "hittingPlayerId",
            Self::Hittee => "hitteePlayerId",
            Self::Winning => "winningPlayerId",
            Self::Losing => "losingPlayerId",
            Self::CommittedBy => "committedByPlayerId",
            Self::DrawnBy => "drawnByPlayerId",
            Self::Goalie => "goalieInNetId",
            Self::Player => "playerId",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRefs {
    pub scoring: Option<PlayerId>,
    pub assist1: Option<PlayerId>,
    pub assist2: Option<PlayerId>,
    pub shooting: Option<PlayerId>,
    pub blocking: Option<PlayerId>,
    pub hitting: Option<PlayerId>,
    pub hittee: Option<PlayerId>,
    pub winning: Option<PlayerId>,
    pub losing: Option<PlayerId>,
    pub committed_by: Option<PlayerId>,
    pub drawn_by: Option<PlayerId>,
    pub goalie: Option<PlayerId>,
    pub player: Option<PlayerId>,
}

impl PlayerRefs {
    pub fn get(&self, role: PlayerRole) -> Option<PlayerId> {
        match role {
            PlayerRole::Scoring => self.scoring,
            PlayerRole::Assist1 => self.assist1,
            PlayerRole::Assist2 => self.assist2,
            PlayerRole::Shooting => self.shooting,
            PlayerRole::Blocking => self.blocking,
            PlayerRole::Hitting => self.hitting,
            PlayerRole::Hittee => self.hittee,
            PlayerRole::Winning => self.winning,
            PlayerRole::Losing => self.losing,
            PlayerRole::CommittedBy => self.committed_by,
            PlayerRole::DrawnBy => self.drawn_by,
            PlayerRole::Goalie => self.goalie,
            PlayerRole::Player => self.player,
        }
    }

    pub fn set(&mut self, role: PlayerRole, id: Option<PlayerId>) {
        let slot = match role {
            PlayerRole::Scoring => &mut self.scoring,
            PlayerRole::Assist1 => &mut self.assist1,
            PlayerRole::Assist2 => &mut self.assist2,
            PlayerRole::Shooting => &mut self.shooting,
            PlayerRole::Blocking => &mut self.blocking,
            PlayerRole::Hitting => &mut self.hitting,
            PlayerRole::Hittee => &mut self.hittee,
            PlayerRole::Winning => &mut self.winning,
            PlayerRole::Losing => &mut self.losing,
            PlayerRole::CommittedBy => &mut self.committed_by,
            PlayerRole::DrawnBy => &mut self.drawn_by,
            PlayerRole::Goalie => &mut self.goalie,
            PlayerRole::Player => &mut self.player,
        };
        *slot = id;
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlayerRole, PlayerId)> + '_ {
        PlayerRole::ALL
            .into_iter()
            .filter_map(|role| self.get(role).map(|id| (role, id)))
    }

    pub fn involves(&self, player_id: PlayerId) -> bool {
        self.iter().any(|(_, id)| id == player_id)
    }

    /// The player credited with a shot attempt (scorer on goals, shooter otherwise).
    pub fn shooter(&self) -> Option<PlayerId> {
        self.scoring.or(self.shooting)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: u64,
    pub sort_order: u32,
    pub event_type: EventType,
    pub team_id: Option<TeamId>,
    pub period: u8,
    pub period_type: PeriodType,
    pub time_in_period: u32,
    pub x: f64,
    pub y: f64,
    pub has_coordinates: bool,
    pub zone: Zone,
    pub shot_type: ShotType,
    pub situation: StrengthState,
    pub penalty_minutes: u32,
    pub players: PlayerRefs,
}

impl Event {
    pub fn new(event_type: EventType, team_id: Option<TeamId>, period: u8, time_in_period: u32) -> Self {
        Self {
            event_id: 0,
            sort_order: 0,
            event_type,
            team_id,
            period,
            period_type: PeriodType::from_raw("", period),
            time_in_period,
            x: 0.0,
            y: 0.0,
            has_coordinates: false,
            zone: Zone::Unknown,
            shot_type: ShotType::Unknown,
            situation: StrengthState::default(),
            penalty_minutes: 0,
            players: PlayerRefs::default(),
        }
    }

    pub fn game_seconds(&self) -> u32 {
        u32::from(self.period.saturating_sub(1))
            .saturating_mul(PERIOD_SECONDS)
            .saturating_add(self.time_in_period)
    }

    pub fn is_team(&self, team_id: TeamId) -> bool {
        self.team_id == Some(team_id)
    }

    pub fn is_opponent_of(&self, team_id: TeamId) -> bool {
        matches!(self.team_id, Some(t) if t != team_id)
    }

    pub fn is_shootout(&self) -> bool {
        self.period_type == PeriodType::Shootout
    }

    /// Zone code when present, otherwise a guess from the x coordinate.
    pub fn zone_or_inferred(&self) -> Zone {
        match self.zone {
            Zone::Unknown if self.has_coordinates => Zone::from_x(self.x),
            zone => zone,
        }
    }

    pub fn zone_for(&self, team_id: TeamId) -> Zone {
        if self.is_opponent_of(team_id) {
            self.zone.mirrored()
        } else {
            self.zone
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub player_id: PlayerId,
    pub first_name: String,
    pub last_name: String,
    pub sweater_number: Option<u32>,
    pub position_code: String,
    pub team_id: TeamId,
}

impl RosterEntry {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    pub fn is_goalie(&self) -> bool {
        self.position_code.eq_ignore_ascii_case("G")
    }
}

#[derive(Debug, Clone, Default)]
pub struct Roster {
    by_id: HashMap<PlayerId, RosterEntry>,
}

impl Roster {
    pub fn from_entries(entries: impl IntoIterator<Item = RosterEntry>) -> Self {
        Self {
            by_id: entries.into_iter().map(|e| (e.player_id, e)).collect(),
        }
    }

    pub fn get(&self, player_id: PlayerId) -> Option<&RosterEntry> {
        self.by_id.get(&player_id)
    }

    pub fn team_of(&self, player_id: PlayerId) -> Option<TeamId> {
        self.by_id.get(&player_id).map(|e| e.team_id)
    }

    pub fn players_for_team(&self, team_id: TeamId) -> Vec<&RosterEntry> {
        let mut out: Vec<&RosterEntry> = self
            .by_id
            .values()
            .filter(|e| e.team_id == team_id)
            .collect();
        out.sort_by_key(|e| e.player_id);
        out
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftInterval {
    pub period: u8,
    pub start_seconds: u32,
    pub end_seconds: u32,
    pub player_id: PlayerId,
    pub team_id: TeamId,
}

impl ShiftInterval {
    pub fn contains(&self, period: u8, time_in_period: u32) -> bool {
        self.period == period && self.start_seconds <= time_in_period && time_in_period <= self.end_seconds
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamInfo {
    pub id: TeamId,
    pub abbrev: String,
}

#[derive(Debug, Clone, Default)]
pub struct GameLog {
    pub game_id: u64,
    pub game_date: Option<NaiveDate>,
    pub home: TeamInfo,
    pub away: TeamInfo,
    pub events: Vec<Event>,
    pub roster: Roster,
}

impl GameLog {
    pub fn is_participant(&self, team_id: TeamId) -> bool {
        (self.home.id != 0 && self.home.id == team_id) || (self.away.id != 0 && self.away.id == team_id)
    }

    pub fn is_home(&self, team_id: TeamId) -> bool {
        self.home.id == team_id
    }

    pub fn opponent_of(&self, team_id: TeamId) -> Option<TeamId> {
        if self.home.id == team_id && self.away.id != 0 {
            Some(self.away.id)
        } else if self.away.id == team_id && self.home.id != 0 {
            Some(self.home.id)
        } else {
            None
        }
    }

    /// Index of the first event that breaks (period, time) ordering, if any.
    pub fn first_out_of_order(&self) -> Option<usize> {
        self.events
            .windows(2)
            .position(|w| (w[1].period, w[1].time_in_period) < (w[0].period, w[0].time_in_period))
            .map(|i| i + 1)
    }
}
