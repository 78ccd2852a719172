use serde::{Deserialize, Serialize};

use crate::config::WindowConfig;
use crate::model::{Event, EventType, PlayerId, TeamId, Zone};
use crate::window::Window;

/// Team, optionally narrowed to one player. An event passes when the team owns it and,
/// with a player set, that player is named in any of its role references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFilter {
    pub team_id: TeamId,
    pub player_id: Option<PlayerId>,
}

impl EventFilter {
    pub fn team(team_id: TeamId) -> Self {
        Self {
            team_id,
            player_id: None,
        }
    }

    pub fn player(team_id: TeamId, player_id: PlayerId) -> Self {
        Self {
            team_id,
            player_id: Some(player_id),
        }
    }

    pub fn matches(&self, event: &Event) -> bool {
        event.is_team(self.team_id) && self.involves(event)
    }

    /// Player half of the filter only; always true for team filters.
    pub fn involves(&self, event: &Event) -> bool {
        self.player_id.is_none_or(|p| event.players.involves(p))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AttemptGoal {
    pub attempts: u32,
    pub goals: u32,
}

impl AttemptGoal {
    fn record(&mut self, is_goal: bool) {
        self.attempts += 1;
        if is_goal {
            self.goals += 1;
        }
    }

    pub fn conversion_pct(&self) -> f64 {
        ratio_pct(self.goals as f64, self.attempts as f64, 0.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MovementStat {
    pub attempts: u32,
    pub goals: u32,
    pub total_delta: f64,
}

impl MovementStat {
    fn record(&mut self, delta: f64, is_goal: bool) {
        self.attempts += 1;
        self.total_delta += delta;
        if is_goal {
            self.goals += 1;
        }
    }

    pub fn average_delta(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.total_delta / self.attempts as f64
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PressureMetrics {
    pub offensive_zone_events: u32,
    pub sustained_pressure_events: u32,
    pub pressure_sequences: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PreShotMovement {
    pub royal_road: AttemptGoal,
    pub zone_retrieval: AttemptGoal,
    pub lateral: MovementStat,
    pub longitudinal: MovementStat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionMetrics {
    pub zone_entries: u32,
    pub entries_to_shots: u32,
    pub zone_exits: u32,
    pub exits_to_entries: u32,
}

impl TransitionMetrics {
    pub fn entry_to_shot_pct(&self) -> f64 {
        ratio_pct(self.entries_to_shots as f64, self.zone_entries as f64, 0.0)
    }

    pub fn exit_to_entry_pct(&self) -> f64 {
        ratio_pct(self.exits_to_entries as f64, self.zone_exits as f64, 0.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RushCycleMetrics {
    pub rush_attempts: u32,
    pub rush_on_goal: u32,
    pub rush_goals: u32,
    pub cycle_attempts: u32,
    pub cycle_on_goal: u32,
    pub cycle_goals: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CrossIcePasses {
    pub attempts: u32,
    pub successful: u32,
    pub unsuccessful: u32,
}

impl CrossIcePasses {
    pub fn success_pct(&self) -> f64 {
        ratio_pct(self.successful as f64, self.attempts as f64, 0.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneMetrics {
    pub oz_originating_shots: u32,
    pub nz_originating_shots: u32,
    pub dz_originating_shots: u32,
    pub nz_turnovers: u32,
    pub nz_turnovers_to_shots_against: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SequenceMetrics {
    pub pressure: PressureMetrics,
    pub pre_shot: PreShotMovement,
    pub transitions: TransitionMetrics,
    pub rush_cycle: RushCycleMetrics,
    pub cross_ice: CrossIcePasses,
    pub zones: ZoneMetrics,
}

pub fn analyze_sequences(events: &[Event], filter: EventFilter, cfg: &WindowConfig) -> SequenceMetrics {
    SequenceMetrics {
        pressure: pressure(events, filter, cfg),
        pre_shot: pre_shot_movement(events, filter, cfg),
        transitions: transitions(events, filter, cfg),
        rush_cycle: rush_cycle(events, filter, cfg),
        cross_ice: cross_ice_passes(events, filter, cfg),
        zones: zone_metrics(events, filter, cfg),
    }
}

/// Offensive-zone runs. The run is tracked over all of the team's events so a player
/// filter only decides who gets credit, not whether the run continues.
pub fn pressure(events: &[Event], filter: EventFilter, cfg: &WindowConfig) -> PressureMetrics {
    let mut out = PressureMetrics::default();
    let mut run = 0u32;
    let mut last: Option<(u8, u32)> = None;

    for event in events {
        if last.is_some_and(|(period, _)| period != event.period) {
            run = 0;
            last = None;
        }

        if event.is_team(filter.team_id) {
            match event.zone {
                Zone::Offensive => {
                    let t = event.game_seconds();
                    let continues = last.is_some_and(|(_, prev)| t.saturating_sub(prev) <= cfg.pressure_gap_secs);
                    run = if continues { run + 1 } else { 1 };
                    last = Some((event.period, t));

                    if filter.involves(event) {
                        out.offensive_zone_events += 1;
                        if run >= cfg.pressure_min_run {
                            out.sustained_pressure_events += 1;
                        }
                        if run == cfg.pressure_min_run {
                            out.pressure_sequences += 1;
                        }
                    }
                }
                Zone::Neutral | Zone::Defensive => {
                    run = 0;
                    last = None;
                }
                Zone::Unknown => {}
            }
        } else if event.team_id.is_some() {
            // Any opponent action breaks the run, wherever it happens.
            run = 0;
            last = None;
        }
    }
    out
}

/// What preceded one shot, gathered from the bounded look-backs.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShotContext {
    pub lateral: f64,
    pub longitudinal: f64,
    pub royal_road: bool,
    pub zone_retrieval: bool,
    pub rush: bool,
}

pub fn shot_context(events: &[Event], idx: usize, cfg: &WindowConfig) -> ShotContext {
    let mut ctx = ShotContext::default();
    let Some(shot) = events.get(idx) else {
        return ctx;
    };
    let Some(team) = shot.team_id else {
        return ctx;
    };

    if shot.has_coordinates {
        let movement = Window::backward(cfg.pre_shot_events)
            .within_secs(cfg.pre_shot_secs)
            .same_team(team);
        for (_, prev) in movement.scan(events, idx) {
            if !prev.has_coordinates {
                continue;
            }
            ctx.lateral = ctx.lateral.max((shot.y - prev.y).abs());
            ctx.longitudinal = ctx.longitudinal.max((shot.x - prev.x).abs());
            if prev.y * shot.y < 0.0 {
                ctx.royal_road = true;
            }
        }
    }

    ctx.zone_retrieval = Window::backward(cfg.retrieval_events)
        .within_secs(cfg.retrieval_secs)
        .same_team(team)
        .scan(events, idx)
        .any(|(_, prev)| {
            prev.zone == Zone::Offensive
                && matches!(prev.event_type, EventType::Hit | EventType::Takeaway)
        });

    if shot.zone_or_inferred() == Zone::Offensive {
        ctx.rush = Window::backward(cfg.rush_events)
            .within_secs(cfg.rush_secs)
            .same_team(team)
            .scan(events, idx)
            .any(|(_, prev)| prev.zone_or_inferred().is_neutral_or_defensive() && is_rush_trigger(prev.event_type));
    }
    ctx
}

fn is_rush_trigger(event_type: EventType) -> bool {
    matches!(
        event_type,
        EventType::Faceoff
            | EventType::Takeaway
            | EventType::Giveaway
            | EventType::BlockedShot
            | EventType::Hit
    )
}

pub fn pre_shot_movement(events: &[Event], filter: EventFilter, cfg: &WindowConfig) -> PreShotMovement {
    let mut out = PreShotMovement::default();
    for (idx, shot) in events.iter().enumerate() {
        if !shot.event_type.is_shot_attempt() || !filter.matches(shot) || !shot.has_coordinates {
            continue;
        }
        let is_goal = shot.event_type == EventType::Goal;
        let ctx = shot_context(events, idx, cfg);
        if ctx.royal_road {
            out.royal_road.record(is_goal);
        }
        if ctx.lateral > 0.0 {
            out.lateral.record(ctx.lateral, is_goal);
        }
        if ctx.longitudinal > 0.0 {
            out.longitudinal.record(ctx.longitudinal, is_goal);
        }
        if ctx.zone_retrieval {
            out.zone_retrieval.record(is_goal);
        }
    }
    out
}

pub fn transitions(events: &[Event], filter: EventFilter, cfg: &WindowConfig) -> TransitionMetrics {
    let mut out = TransitionMetrics::default();
    let team = filter.team_id;

    for (idx, event) in events.iter().enumerate() {
        if !event.is_team(team) || idx == 0 {
            continue;
        }
        let prev = &events[idx - 1];
        if prev.period != event.period || !prev.is_team(team) {
            continue;
        }

        if event.zone == Zone::Offensive && prev.zone.is_neutral_or_defensive() {
            // The entry event itself counts toward the lookahead.
            let converted = Window::forward(cfg.entry_lookahead.saturating_sub(1))
                .including_anchor()
                .same_team(team)
                .scan(events, idx)
                .find(|(_, next)| next.event_type.is_shot_attempt())
                .map(|(_, next)| next);
            if filter.involves(event) || converted.is_some_and(|shot| filter.involves(shot)) {
                out.zone_entries += 1;
                if converted.is_some_and(|shot| filter.involves(event) || filter.involves(shot)) {
                    out.entries_to_shots += 1;
                }
            }
        } else if event.zone == Zone::Neutral && prev.zone == Zone::Defensive {
            let entered = Window::forward(cfg.exit_lookahead)
                .same_team(team)
                .scan(events, idx)
                .find(|(_, next)| next.zone == Zone::Offensive && is_entry_evidence(next.event_type))
                .map(|(_, next)| next);
            if filter.involves(event) || entered.is_some_and(|next| filter.involves(next)) {
                out.zone_exits += 1;
                if entered.is_some() {
                    out.exits_to_entries += 1;
                }
            }
        }
    }
    out
}

fn is_entry_evidence(event_type: EventType) -> bool {
    event_type.is_shot_attempt()
        || matches!(
            event_type,
            EventType::Hit | EventType::Takeaway | EventType::Giveaway
        )
}

pub fn rush_cycle(events: &[Event], filter: EventFilter, cfg: &WindowConfig) -> RushCycleMetrics {
    let mut out = RushCycleMetrics::default();
    for (idx, shot) in events.iter().enumerate() {
        if !shot.event_type.is_shot_attempt() || !filter.matches(shot) {
            continue;
        }
        if shot.zone_or_inferred() != Zone::Offensive {
            continue;
        }
        let on_goal = shot.event_type.is_on_goal();
        let is_goal = shot.event_type == EventType::Goal;
        if shot_context(events, idx, cfg).rush {
            out.rush_attempts += 1;
            out.rush_on_goal += u32::from(on_goal);
            out.rush_goals += u32::from(is_goal);
        } else {
            out.cycle_attempts += 1;
            out.cycle_on_goal += u32::from(on_goal);
            out.cycle_goals += u32::from(is_goal);
        }
    }
    out
}

pub fn cross_ice_passes(events: &[Event], filter: EventFilter, cfg: &WindowConfig) -> CrossIcePasses {
    let mut out = CrossIcePasses::default();
    let team = filter.team_id;

    for (idx, giveaway) in events.iter().enumerate() {
        if giveaway.event_type != EventType::Giveaway || !filter.matches(giveaway) || !giveaway.has_coordinates {
            continue;
        }
        let is_candidate = Window::forward(cfg.pass_lookahead)
            .same_team(team)
            .scan(events, idx)
            .any(|(_, next)| next.has_coordinates && (next.y - giveaway.y).abs() > cfg.pass_lateral_min);
        if !is_candidate {
            continue;
        }

        out.attempts += 1;
        let mut following = Window::forward(cfg.pass_control_events).scan(events, idx).peekable();
        let kept = following.peek().is_some() && following.all(|(_, next)| next.is_team(team));
        if kept {
            out.successful += 1;
        } else {
            out.unsuccessful += 1;
        }
    }
    out
}

pub fn zone_metrics(events: &[Event], filter: EventFilter, cfg: &WindowConfig) -> ZoneMetrics {
    let mut out = ZoneMetrics::default();
    let team = filter.team_id;

    for (idx, event) in events.iter().enumerate() {
        if filter.matches(event) {
            match event.event_type {
                EventType::Giveaway if event.zone_or_inferred() == Zone::Neutral => out.nz_turnovers += 1,
                t if t.is_on_goal() => match event.zone_or_inferred() {
                    Zone::Offensive => out.oz_originating_shots += 1,
                    Zone::Neutral => out.nz_originating_shots += 1,
                    Zone::Defensive => out.dz_originating_shots += 1,
                    Zone::Unknown => {}
                },
                _ => {}
            }
        } else if event.is_opponent_of(team) && event.event_type.is_on_goal() {
            let after_turnover = Window::backward(idx)
                .within_secs(cfg.turnover_to_shot_secs)
                .same_team(team)
                .scan(events, idx)
                .any(|(_, prev)| {
                    prev.event_type == EventType::Giveaway
                        && prev.zone_or_inferred() == Zone::Neutral
                        && filter.involves(prev)
                });
            if after_turnover {
                out.nz_turnovers_to_shots_against += 1;
            }
        }
    }
    out
}

pub(crate) fn ratio_pct(num: f64, den: f64, default: f64) -> f64 {
    if den > 0.0 && num.is_finite() && den.is_finite() {
        num / den * 100.0
    } else {
        default
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ShotType;

    const A: TeamId = 1;
    const B: TeamId = 2;

    fn ev(kind: EventType, team: TeamId, t: u32, zone: Zone, x: f64, y: f64) -> Event {
        let mut e = Event::new(kind, Some(team), 1, t);
        e.zone = zone;
        e.x = x;
        e.y = y;
        e.has_coordinates = true;
        e.shot_type = ShotType::Wrist;
        e
    }

    fn cfg() -> WindowConfig {
        WindowConfig::default()
    }

    #[test]
    fn three_quick_oz_events_open_one_sequence() {
        let events = vec![
            ev(EventType::Hit, A, 10, Zone::Offensive, 70.0, 10.0),
            ev(EventType::ShotOnGoal, A, 12, Zone::Offensive, 60.0, 5.0),
            ev(EventType::Takeaway, A, 15, Zone::Offensive, 80.0, -20.0),
            ev(EventType::MissedShot, A, 18, Zone::Offensive, 70.0, 0.0),
        ];
        let p = pressure(&events, EventFilter::team(A), &cfg());
        assert_eq!(p.offensive_zone_events, 4);
        assert_eq!(p.sustained_pressure_events, 2);
        assert_eq!(p.pressure_sequences, 1);
    }

    #[test]
    fn opponent_clearing_the_zone_resets_pressure() {
        let events = vec![
            ev(EventType::Hit, A, 10, Zone::Offensive, 70.0, 10.0),
            ev(EventType::ShotOnGoal, A, 12, Zone::Offensive, 60.0, 5.0),
            ev(EventType::Giveaway, B, 13, Zone::Neutral, 0.0, 0.0),
            ev(EventType::Takeaway, A, 14, Zone::Offensive, 80.0, -20.0),
        ];
        let p = pressure(&events, EventFilter::team(A), &cfg());
        assert_eq!(p.sustained_pressure_events, 0);
    }

    #[test]
    fn opponent_in_own_end_resets_pressure() {
        let events = vec![
            ev(EventType::Hit, A, 10, Zone::Offensive, 70.0, 10.0),
            ev(EventType::Hit, A, 11, Zone::Offensive, 72.0, 4.0),
            ev(EventType::Giveaway, B, 11, Zone::Defensive, -70.0, 0.0),
            ev(EventType::Hit, A, 12, Zone::Offensive, 75.0, -6.0),
        ];
        let p = pressure(&events, EventFilter::team(A), &cfg());
        assert_eq!(p.offensive_zone_events, 3);
        assert_eq!(p.sustained_pressure_events, 0);
        assert_eq!(p.pressure_sequences, 0);
    }

    #[test]
    fn stoppage_without_owner_keeps_pressure_alive() {
        let mut stoppage = Event::new(EventType::Stoppage, None, 1, 11);
        stoppage.zone = Zone::Neutral;
        let events = vec![
            ev(EventType::Hit, A, 10, Zone::Offensive, 70.0, 10.0),
            stoppage,
            ev(EventType::ShotOnGoal, A, 12, Zone::Offensive, 60.0, 5.0),
            ev(EventType::Takeaway, A, 14, Zone::Offensive, 80.0, -20.0),
        ];
        let p = pressure(&events, EventFilter::team(A), &cfg());
        assert_eq!(p.sustained_pressure_events, 1);
    }

    #[test]
    fn pre_shot_tracks_movement_and_royal_road() {
        let events = vec![
            ev(EventType::Takeaway, A, 100, Zone::Offensive, 60.0, -12.0),
            ev(EventType::ShotOnGoal, A, 102, Zone::Offensive, 75.0, 8.0),
        ];
        let m = pre_shot_movement(&events, EventFilter::team(A), &cfg());
        assert_eq!(m.royal_road.attempts, 1);
        assert_eq!(m.zone_retrieval.attempts, 1);
        assert_eq!(m.lateral.attempts, 1);
        assert!((m.lateral.average_delta() - 20.0).abs() < 1e-9);
        assert!((m.longitudinal.average_delta() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn pre_shot_window_ignores_stale_events() {
        let events = vec![
            ev(EventType::Takeaway, A, 100, Zone::Offensive, 60.0, -12.0),
            ev(EventType::ShotOnGoal, A, 110, Zone::Offensive, 75.0, 8.0),
        ];
        let m = pre_shot_movement(&events, EventFilter::team(A), &cfg());
        assert_eq!(m, PreShotMovement::default());
    }

    #[test]
    fn entry_followed_by_shot_converts() {
        let events = vec![
            ev(EventType::Takeaway, A, 50, Zone::Neutral, 10.0, 0.0),
            ev(EventType::Hit, A, 52, Zone::Offensive, 40.0, 20.0),
            ev(EventType::ShotOnGoal, A, 54, Zone::Offensive, 70.0, 0.0),
        ];
        let t = transitions(&events, EventFilter::team(A), &cfg());
        assert_eq!(t.zone_entries, 1);
        assert_eq!(t.entries_to_shots, 1);
        assert_eq!(t.entry_to_shot_pct(), 100.0);
    }

    #[test]
    fn exit_followed_by_oz_event_counts() {
        let events = vec![
            ev(EventType::BlockedShot, A, 50, Zone::Defensive, -70.0, 0.0),
            ev(EventType::Takeaway, A, 52, Zone::Neutral, 0.0, 5.0),
            ev(EventType::Hit, A, 55, Zone::Offensive, 60.0, 20.0),
        ];
        let t = transitions(&events, EventFilter::team(A), &cfg());
        assert_eq!(t.zone_exits, 1);
        assert_eq!(t.exits_to_entries, 1);
        // the hit after the neutral-zone takeaway is also an entry
        assert_eq!(t.zone_entries, 1);
    }

    #[test]
    fn shot_without_transition_event_is_cycle() {
        let events = vec![
            ev(EventType::Hit, A, 30, Zone::Offensive, 70.0, 20.0),
            ev(EventType::Goal, A, 32, Zone::Offensive, 80.0, 0.0),
        ];
        let r = rush_cycle(&events, EventFilter::team(A), &cfg());
        assert_eq!(r.cycle_attempts, 1);
        assert_eq!(r.cycle_goals, 1);
        assert_eq!(r.rush_attempts, 0);
    }

    #[test]
    fn giveaway_to_opponent_is_unsuccessful_pass() {
        let events = vec![
            ev(EventType::Giveaway, A, 5, Zone::Neutral, 0.0, -10.0),
            ev(EventType::Takeaway, B, 6, Zone::Neutral, 2.0, 0.0),
            ev(EventType::Hit, A, 7, Zone::Neutral, 5.0, 10.0),
        ];
        let c = cross_ice_passes(&events, EventFilter::team(A), &cfg());
        assert_eq!(c.attempts, 1);
        assert_eq!(c.unsuccessful, 1);
    }

    #[test]
    fn short_lateral_giveaway_is_not_a_pass() {
        let events = vec![
            ev(EventType::Giveaway, A, 5, Zone::Neutral, 0.0, -10.0),
            ev(EventType::Hit, A, 6, Zone::Neutral, 5.0, 0.0),
        ];
        assert_eq!(cross_ice_passes(&events, EventFilter::team(A), &cfg()).attempts, 0);
    }

    #[test]
    fn neutral_zone_turnover_leads_to_shot_against() {
        let events = vec![
            ev(EventType::Giveaway, A, 200, Zone::Neutral, 5.0, 0.0),
            ev(EventType::ShotOnGoal, B, 203, Zone::Offensive, 70.0, 0.0),
            ev(EventType::ShotOnGoal, B, 215, Zone::Offensive, 70.0, 0.0),
        ];
        let z = zone_metrics(&events, EventFilter::team(A), &cfg());
        assert_eq!(z.nz_turnovers, 1);
        assert_eq!(z.nz_turnovers_to_shots_against, 1);
    }

    #[test]
    fn shot_origin_falls_back_to_x() {
        let mut shot = ev(EventType::ShotOnGoal, A, 10, Zone::Unknown, -40.0, 0.0);
        shot.shot_type = ShotType::Slap;
        let z = zone_metrics(&[shot], EventFilter::team(A), &cfg());
        assert_eq!(z.dz_originating_shots, 1);
    }

    #[test]
    fn player_filter_requires_involvement() {
        let mut hit = ev(EventType::Hit, A, 10, Zone::Offensive, 70.0, 10.0);
        hit.players.hitting = Some(7);
        let filter = EventFilter::player(A, 7);
        assert!(filter.matches(&hit));
        assert!(!EventFilter::player(A, 8).matches(&hit));
        assert!(!EventFilter::player(B, 7).matches(&hit));
    }
}
