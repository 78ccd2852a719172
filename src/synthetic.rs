use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::model::{
    Event, EventType, GameLog, PERIOD_SECONDS, PeriodType, PlayerId, PlayerRefs, Roster, RosterEntry,
    ShiftInterval, ShotType, StrengthState, TeamId, TeamInfo, Zone,
};
use crate::season::GameInput;

pub const HOME_TEAM: TeamId = 10;
pub const AWAY_TEAM: TeamId = 20;

const SKATERS_PER_TEAM: u32 = 18;
const SHIFT_SECONDS: u32 = 45;
const POWER_PLAY_SECONDS: u32 = 120;

pub fn synthetic_game(seed: u64) -> GameInput {
    let mut rng = StdRng::seed_from_u64(seed);
    let home = TeamInfo {
        id: HOME_TEAM,
        abbrev: "HOM".to_string(),
    };
    let away = TeamInfo {
        id: AWAY_TEAM,
        abbrev: "AWY".to_string(),
    };

    let roster = Roster::from_entries(
        [HOME_TEAM, AWAY_TEAM]
            .into_iter()
            .flat_map(|team| (0..=SKATERS_PER_TEAM).map(move |k| roster_entry(team, k))),
    );

    let mut events = Vec::new();
    let mut shifts = Vec::new();
    let mut sort_order = 0u32;
    for period in 1..=3u8 {
        let mut t = 0u32;
        let mut pp: Option<(TeamId, u32)> = None;
        while t < PERIOD_SECONDS {
            let team = if rng.gen_bool(0.5) { HOME_TEAM } else { AWAY_TEAM };
            let on_ice_line = (t / SHIFT_SECONDS) % 3;
            if pp.is_some_and(|(_, until)| t > until) {
                pp = None;
            }
            let situation = match pp {
                Some((HOME_TEAM, _)) => StrengthState::from_situation_code("1451"),
                Some(_) => StrengthState::from_situation_code("1541"),
                None => StrengthState::default(),
            };

            let mut event = random_event(&mut rng, team, period, t, on_ice_line);
            event.situation = situation;
            sort_order += 1;
            event.sort_order = sort_order;
            event.event_id = u64::from(sort_order);
            if event.event_type == EventType::Penalty && pp.is_none() {
                let beneficiary = if team == HOME_TEAM { AWAY_TEAM } else { HOME_TEAM };
                pp = Some((beneficiary, t + POWER_PLAY_SECONDS));
            }
            events.push(event);
            t += rng.gen_range(2..=9);
        }

        for team in [HOME_TEAM, AWAY_TEAM] {
            shifts.extend(period_shifts(team, period));
        }
    }

    GameInput {
        log: GameLog {
            game_id: 2_000_000 + seed,
            game_date: NaiveDate::from_ymd_opt(2024, 10, 8),
            home,
            away,
            events,
            roster,
        },
        shifts,
    }
}

fn roster_entry(team: TeamId, k: u32) -> RosterEntry {
    RosterEntry {
        player_id: player_id(team, k),
        first_name: format!("Player{k}"),
        last_name: format!("T{team}"),
        sweater_number: Some(k + 1),
        position_code: match k {
            0 => "G",
            k if k % 3 == 0 => "C",
            k if k % 3 == 1 => "L",
            _ => "D",
        }
        .to_string(),
        team_id: team,
    }
}

/// Goalie is slot 0; skaters 1..=18 form three lines of six.
fn player_id(team: TeamId, k: u32) -> PlayerId {
    team * 1000 + k
}

fn line_player(rng: &mut StdRng, team: TeamId, line: u32) -> PlayerId {
    player_id(team, 1 + line * 6 + rng.gen_range(0..6))
}

fn other(team: TeamId) -> TeamId {
    if team == HOME_TEAM { AWAY_TEAM } else { HOME_TEAM }
}

fn random_event(rng: &mut StdRng, team: TeamId, period: u8, t: u32, line: u32) -> Event {
    let roll: f64 = rng.gen_range(0.0..1.0);
    let event_type = match roll {
        r if r < 0.14 => EventType::ShotOnGoal,
        r if r < 0.22 => EventType::MissedShot,
        r if r < 0.29 => EventType::BlockedShot,
        r if r < 0.30 => EventType::Goal,
        r if r < 0.46 => EventType::Hit,
        r if r < 0.54 => EventType::Takeaway,
        r if r < 0.64 => EventType::Giveaway,
        r if r < 0.82 => EventType::Faceoff,
        r if r < 0.85 => EventType::Penalty,
        _ => EventType::Stoppage,
    };

    let zone = if event_type.is_shot_attempt() {
        if rng.gen_bool(0.92) { Zone::Offensive } else { Zone::Neutral }
    } else {
        match rng.gen_range(0..3) {
            0 => Zone::Offensive,
            1 => Zone::Neutral,
            _ => Zone::Defensive,
        }
    };
    let x = match zone {
        Zone::Offensive if event_type.is_shot_attempt() => rng.gen_range(40.0..88.0),
        Zone::Offensive => rng.gen_range(26.0..99.0),
        Zone::Neutral => rng.gen_range(-25.0..25.0),
        _ => rng.gen_range(-99.0..-26.0),
    };
    let y: f64 = rng.gen_range(-40.0..40.0);

    let mut players = PlayerRefs::default();
    let actor = line_player(rng, team, line);
    let opponent = line_player(rng, other(team), line);
    match event_type {
        EventType::Goal => {
            players.scoring = Some(actor);
            players.assist1 = Some(line_player(rng, team, line)).filter(|a| *a != actor);
            players.goalie = Some(player_id(other(team), 0));
        }
        EventType::ShotOnGoal | EventType::MissedShot => {
            players.shooting = Some(actor);
            players.goalie = Some(player_id(other(team), 0));
        }
        EventType::BlockedShot => {
            players.blocking = Some(actor);
            players.shooting = Some(opponent);
        }
        EventType::Hit => {
            players.hitting = Some(actor);
            players.hittee = Some(opponent);
        }
        EventType::Takeaway | EventType::Giveaway => players.player = Some(actor),
        EventType::Faceoff => {
            players.winning = Some(actor);
            players.losing = Some(opponent);
        }
        EventType::Penalty => {
            players.committed_by = Some(actor);
            players.drawn_by = Some(opponent);
        }
        _ => {}
    }

    let shot_type = if event_type.is_shot_attempt() {
        ShotType::ALL[rng.gen_range(0..8)]
    } else {
        ShotType::Unknown
    };

    Event {
        event_id: 0,
        sort_order: 0,
        event_type,
        team_id: (event_type != EventType::Stoppage).then_some(team),
        period,
        period_type: PeriodType::Regulation,
        time_in_period: t,
        x,
        y,
        has_coordinates: event_type != EventType::Stoppage,
        zone: if event_type == EventType::Stoppage { Zone::Unknown } else { zone },
        shot_type,
        situation: StrengthState::default(),
        penalty_minutes: if event_type == EventType::Penalty { 2 } else { 0 },
        players,
    }
}

/// Lines rotate every shift; the goalie plays the whole period.
fn period_shifts(team: TeamId, period: u8) -> Vec<ShiftInterval> {
    let mut out = vec![ShiftInterval {
        period,
        start_seconds: 0,
        end_seconds: PERIOD_SECONDS,
        player_id: player_id(team, 0),
        team_id: team,
    }];
    let mut start = 0;
    while start < PERIOD_SECONDS {
        let end = (start + SHIFT_SECONDS - 1).min(PERIOD_SECONDS);
        let line = (start / SHIFT_SECONDS) % 3;
        for slot in 0..6 {
            out.push(ShiftInterval {
                period,
                start_seconds: start,
                end_seconds: end,
                player_id: player_id(team, 1 + line * 6 + slot),
                team_id: team,
            });
        }
        start += SHIFT_SECONDS;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_game() {
        let a = synthetic_game(7);
        let b = synthetic_game(7);
        assert_eq!(a.log.events, b.log.events);
        assert_eq!(a.shifts, b.shifts);
    }

    #[test]
    fn events_are_in_clock_order() {
        let g = synthetic_game(3);
        assert!(g.log.events.len() > 300);
        assert_eq!(g.log.first_out_of_order(), None);
        assert_eq!(g.log.roster.players_for_team(HOME_TEAM).len(), 19);
    }
}
