use puck_metrics::aggregate::{GameContext, MetricsEngine};
use puck_metrics::config::AnalyticsConfig;
use puck_metrics::error::MetricsError;
use puck_metrics::model::{Event, EventType, GameLog, PlayerRefs, ShotType, TeamInfo, Zone};
use puck_metrics::on_ice::OnIceIndex;
use puck_metrics::report::MetricsReport;
use puck_metrics::sequences::EventFilter;

const HOME: u32 = 10;
const AWAY: u32 = 20;

fn event(kind: EventType, team: u32, t: u32, zone: Zone, x: f64, y: f64) -> Event {
    let mut e = Event::new(kind, Some(team), 1, t);
    e.zone = zone;
    e.x = x;
    e.y = y;
    e.has_coordinates = true;
    e
}

fn team_report(engine: &MetricsEngine, events: &[Event], team: u32) -> MetricsReport {
    let on_ice = OnIceIndex::default();
    engine.aggregate(events, EventFilter::team(team), GameContext::new(Some(HOME), &on_ice))
}

fn game(events: Vec<Event>) -> GameLog {
    GameLog {
        game_id: 42,
        home: TeamInfo {
            id: HOME,
            abbrev: "HOM".to_string(),
        },
        away: TeamInfo {
            id: AWAY,
            abbrev: "AWY".to_string(),
        },
        events,
        ..GameLog::default()
    }
}

#[test]
fn single_slot_goal() {
    let mut goal = event(EventType::Goal, HOME, 100, Zone::Offensive, 85.0, 0.0);
    goal.shot_type = ShotType::Wrist;
    goal.players = PlayerRefs {
        scoring: Some(1001),
        ..PlayerRefs::default()
    };

    let engine = MetricsEngine::default();
    let xg = engine.shot_model().event_xg(&goal);
    assert!((xg - 0.1125).abs() < 1e-9, "xg = {xg}");

    let r = team_report(&engine, &[goal], HOME);
    assert_eq!(r.shots.goals, 1);
    assert_eq!(r.shots.shots_on_goal, 1);
    assert_eq!(r.shots.high_danger_shots, 1);
    assert!((r.shots.expected_goals - 0.1125).abs() < 1e-9);
}

#[test]
fn team_without_events_gets_zeros() {
    let engine = MetricsEngine::default();
    let events = vec![event(EventType::ShotOnGoal, AWAY, 10, Zone::Offensive, 70.0, 0.0)];
    let r = team_report(&engine, &events, 99);

    assert_eq!(r.total_shots(), 0);
    assert_eq!(r.shots.goals, 0);
    assert_eq!(r.shooting_pct(), 0.0);
    assert_eq!(r.high_danger_share(), 0.0);
    assert_eq!(r.power_play_pct(), 0.0);
    assert_eq!(r.faceoff_pct(), 50.0);
    assert_eq!(r.sequences.cross_ice.success_pct(), 0.0);
    assert_eq!(r.sequences.transitions.entry_to_shot_pct(), 0.0);

    let empty = team_report(&engine, &[], HOME);
    assert_eq!(empty.total_shots(), 0);
    assert_eq!(empty.corsi_pct(), 50.0);
    assert!(empty.periods.is_empty());
}

#[test]
fn participant_without_events_still_reports() {
    let engine = MetricsEngine::default();
    let log = game(vec![event(EventType::Hit, AWAY, 5, Zone::Neutral, 0.0, 0.0)]);
    let r = engine.team_report(&log, HOME, &[]).expect("home played in the game");
    assert_eq!(r.total_shots(), 0);
    assert_eq!(r.shooting_pct(), 0.0);
}

#[test]
fn unknown_team_is_an_error() {
    let engine = MetricsEngine::default();
    let log = game(vec![event(EventType::Hit, AWAY, 5, Zone::Neutral, 0.0, 0.0)]);
    let err = engine.team_report(&log, 77, &[]).unwrap_err();
    assert!(matches!(err, MetricsError::NoDataForTeam { team_id: 77 }));
    assert!(engine.box_scores(&log, 77, &[]).is_err());
}

#[test]
fn lateral_giveaway_kept_by_same_team_is_a_cross_ice_pass() {
    let engine = MetricsEngine::default();
    let events = vec![
        event(EventType::Giveaway, HOME, 50, Zone::Neutral, 0.0, -10.0),
        event(EventType::Hit, HOME, 52, Zone::Neutral, 5.0, 10.0),
        event(EventType::Takeaway, HOME, 53, Zone::Neutral, 12.0, 14.0),
    ];
    let passes = team_report(&engine, &events, HOME).sequences.cross_ice;
    assert_eq!(passes.attempts, 1);
    assert_eq!(passes.successful, 1);
    assert_eq!(passes.unsuccessful, 0);
    assert_eq!(passes.success_pct(), 100.0);
}

#[test]
fn giveaway_followed_by_one_lateral_event_is_a_cross_ice_pass() {
    let engine = MetricsEngine::default();
    let events = vec![
        event(EventType::Giveaway, HOME, 50, Zone::Neutral, 0.0, -10.0),
        event(EventType::Hit, HOME, 52, Zone::Neutral, 5.0, 10.0),
    ];
    let passes = team_report(&engine, &events, HOME).sequences.cross_ice;
    assert_eq!(passes.attempts, 1);
    assert_eq!(passes.successful, 1);
    assert_eq!(passes.unsuccessful, 0);
}

#[test]
fn opposing_play_in_its_own_end_breaks_pressure() {
    let engine = MetricsEngine::default();
    let events = vec![
        event(EventType::Hit, HOME, 10, Zone::Offensive, 70.0, 10.0),
        event(EventType::Hit, HOME, 11, Zone::Offensive, 72.0, 4.0),
        event(EventType::Giveaway, AWAY, 11, Zone::Defensive, -70.0, 0.0),
        event(EventType::Hit, HOME, 12, Zone::Offensive, 75.0, -6.0),
    ];
    let pressure = team_report(&engine, &events, HOME).sequences.pressure;
    assert_eq!(pressure.offensive_zone_events, 3);
    assert_eq!(pressure.sustained_pressure_events, 0);

    let unbroken: Vec<Event> = events.iter().filter(|e| e.is_team(HOME)).cloned().collect();
    let pressure = team_report(&engine, &unbroken, HOME).sequences.pressure;
    assert_eq!(pressure.sustained_pressure_events, 1);
    assert_eq!(pressure.pressure_sequences, 1);
}

#[test]
fn lateral_giveaway_lost_to_opponent_is_unsuccessful() {
    let engine = MetricsEngine::default();
    let events = vec![
        event(EventType::Giveaway, HOME, 50, Zone::Neutral, 0.0, -10.0),
        event(EventType::Takeaway, AWAY, 51, Zone::Neutral, 3.0, -8.0),
        event(EventType::Hit, HOME, 53, Zone::Neutral, 5.0, 10.0),
    ];
    let passes = team_report(&engine, &events, HOME).sequences.cross_ice;
    assert_eq!(passes.attempts, 1);
    assert_eq!(passes.unsuccessful, 1);
}

#[test]
fn neutral_zone_takeaway_sets_up_a_rush() {
    let engine = MetricsEngine::default();
    let events = vec![
        event(EventType::Takeaway, HOME, 100, Zone::Neutral, 10.0, 5.0),
        event(EventType::ShotOnGoal, HOME, 103, Zone::Offensive, 70.0, 8.0),
    ];
    let rc = team_report(&engine, &events, HOME).sequences.rush_cycle;
    assert_eq!(rc.rush_attempts, 1);
    assert_eq!(rc.rush_on_goal, 1);
    assert_eq!(rc.cycle_attempts, 0);
}

#[test]
fn stale_takeaway_leaves_a_cycle_shot() {
    let engine = MetricsEngine::default();
    let events = vec![
        event(EventType::Takeaway, HOME, 100, Zone::Neutral, 10.0, 5.0),
        event(EventType::ShotOnGoal, HOME, 110, Zone::Offensive, 70.0, 8.0),
    ];
    let rc = team_report(&engine, &events, HOME).sequences.rush_cycle;
    assert_eq!(rc.rush_attempts, 0);
    assert_eq!(rc.cycle_attempts, 1);
}

#[test]
fn injected_tables_change_shot_values() {
    let mut cfg = AnalyticsConfig::default();
    cfg.xg.cap = 0.05;
    let capped = MetricsEngine::new(cfg);
    let mut shot = event(EventType::Goal, HOME, 100, Zone::Offensive, 85.0, 0.0);
    shot.shot_type = ShotType::Wrist;
    assert!((capped.shot_model().event_xg(&shot) - 0.05).abs() < 1e-12);
    assert!(MetricsEngine::default().shot_model().event_xg(&shot) > 0.05);
}

#[test]
fn aggregation_is_deterministic() {
    let engine = MetricsEngine::default();
    let events = vec![
        event(EventType::Faceoff, HOME, 0, Zone::Neutral, 0.0, 0.0),
        event(EventType::Takeaway, HOME, 4, Zone::Neutral, 10.0, 5.0),
        event(EventType::ShotOnGoal, HOME, 6, Zone::Offensive, 70.0, -8.0),
        event(EventType::MissedShot, HOME, 8, Zone::Offensive, 65.0, 12.0),
        event(EventType::Giveaway, AWAY, 20, Zone::Neutral, 0.0, 20.0),
        event(EventType::Goal, AWAY, 22, Zone::Offensive, 80.0, 0.0),
    ];
    let a = team_report(&engine, &events, HOME);
    let b = team_report(&engine, &events, HOME);
    assert_eq!(a, b);
}
