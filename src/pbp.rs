use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde_json::Value;

use crate::model::{
    Event, EventType, GameLog, PeriodType, PlayerId, PlayerRefs, PlayerRole, Roster, RosterEntry,
    ShiftInterval, ShotType, StrengthState, TeamId, TeamInfo, Zone,
};

/// Parse an NHL gamecenter play-by-play payload (`plays`, `rosterSpots`, `homeTeam`, `awayTeam`).
///
/// Individual plays never fail: missing or malformed fields fall back to defaults. Only a
/// payload that is not JSON at all is an error; an empty or `null` payload is an empty game.
pub fn parse_play_by_play_json(raw: &str) -> Result<GameLog> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(GameLog::default());
    }

    let root: Value = serde_json::from_str(trimmed).context("invalid play-by-play json")?;
    let game_id = root.get("id").and_then(|v| v.as_u64()).unwrap_or(0);
    let game_date = pick_string(&root, &["gameDate", "date"])
        .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok());
    let home = parse_team(root.get("homeTeam"));
    let away = parse_team(root.get("awayTeam"));

    let events = parse_plays(root.get("plays"));
    let roster = parse_roster(root.get("rosterSpots"));

    let log = GameLog {
        game_id,
        game_date,
        home,
        away,
        events,
        roster,
    };
    if let Some(idx) = log.first_out_of_order() {
        tracing::warn!(game_id, index = idx, "play-by-play events are not in clock order");
    }
    Ok(log)
}

/// Parse shift-chart records, either `{"data": [...]}` or a bare array.
/// Entries without a player, team or readable clock are skipped.
pub fn parse_shifts_json(raw: &str) -> Result<Vec<ShiftInterval>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }

    let root: Value = serde_json::from_str(trimmed).context("invalid shift chart json")?;
    let list = match &root {
        Value::Array(items) => items.as_slice(),
        other => other
            .get("data")
            .and_then(|v| v.as_array())
            .map(|v| v.as_slice())
            .unwrap_or(&[]),
    };

    let mut out = Vec::with_capacity(list.len());
    let mut skipped = 0usize;
    for entry in list {
        match parse_shift(entry) {
            Some(shift) => out.push(shift),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::debug!(skipped, kept = out.len(), "dropped malformed shift records");
    }
    Ok(out)
}

/// `"MM:SS"` to seconds; anything unreadable is 0.
pub fn clock_to_seconds(raw: &str) -> u32 {
    try_clock_to_seconds(raw).unwrap_or(0)
}

fn try_clock_to_seconds(raw: &str) -> Option<u32> {
    let (m, s) = raw.trim().split_once(':')?;
    let minutes = m.trim().parse::<u32>().ok()?;
    let seconds = s.trim().parse::<u32>().ok()?;
    if seconds >= 60 {
        return None;
    }
    minutes.checked_mul(60)?.checked_add(seconds)
}

fn parse_team(value: Option<&Value>) -> TeamInfo {
    let Some(value) = value else {
        return TeamInfo::default();
    };
    TeamInfo {
        id: pick_u32(value, &["id", "teamId"]).unwrap_or(0),
        abbrev: pick_string(value, &["abbrev", "triCode"]).unwrap_or_default(),
    }
}

fn parse_plays(value: Option<&Value>) -> Vec<Event> {
    let Some(list) = value.and_then(|v| v.as_array()) else {
        return Vec::new();
    };
    list.iter().map(parse_play).collect()
}

fn parse_play(play: &Value) -> Event {
    let empty = Value::Null;
    let details = play.get("details").unwrap_or(&empty);
    let period_desc = play.get("periodDescriptor").unwrap_or(&empty);

    let type_key = pick_string(play, &["typeDescKey"]).unwrap_or_default();
    let event_type = EventType::from_key(&type_key);

    let period = pick_u32(period_desc, &["number"])
        .or_else(|| pick_u32(play, &["period"]))
        .filter(|p| *p > 0)
        .map(|p| p.min(u8::MAX as u32) as u8)
        .unwrap_or(1);
    let period_type = PeriodType::from_raw(
        &pick_string(period_desc, &["periodType"]).unwrap_or_default(),
        period,
    );

    let clock = pick_string(play, &["timeInPeriod"]).unwrap_or_default();
    let time_in_period = match try_clock_to_seconds(&clock) {
        Some(secs) => secs,
        None => {
            tracing::debug!(clock = %clock, "unreadable play clock, using 0");
            0
        }
    };

    let x = details.get("xCoord").and_then(|v| v.as_f64());
    let y = details.get("yCoord").and_then(|v| v.as_f64());

    let mut players = PlayerRefs::default();
    for role in PlayerRole::ALL {
        players.set(role, pick_u32(details, &[role.details_key()]));
    }

    Event {
        event_id: play.get("eventId").and_then(|v| v.as_u64()).unwrap_or(0),
        sort_order: pick_u32(play, &["sortOrder"]).unwrap_or(0),
        event_type,
        team_id: pick_u32(details, &["eventOwnerTeamId"]),
        period,
        period_type,
        time_in_period,
        x: x.unwrap_or(0.0),
        y: y.unwrap_or(0.0),
        has_coordinates: x.is_some() && y.is_some(),
        zone: Zone::from_code(&pick_string(details, &["zoneCode"]).unwrap_or_default()),
        shot_type: ShotType::from_raw(&pick_string(details, &["shotType"]).unwrap_or_default()),
        situation: StrengthState::from_situation_code(
            &pick_string(play, &["situationCode"]).unwrap_or_default(),
        ),
        penalty_minutes: pick_u32(details, &["duration"]).unwrap_or(0),
        players,
    }
}

fn parse_roster(value: Option<&Value>) -> Roster {
    let Some(list) = value.and_then(|v| v.as_array()) else {
        return Roster::default();
    };
    Roster::from_entries(list.iter().filter_map(parse_roster_spot))
}

fn parse_roster_spot(value: &Value) -> Option<RosterEntry> {
    let player_id: PlayerId = pick_u32(value, &["playerId", "id"])?;
    let team_id: TeamId = pick_u32(value, &["teamId"])?;
    Some(RosterEntry {
        player_id,
        first_name: localized_name(value.get("firstName")),
        last_name: localized_name(value.get("lastName")),
        sweater_number: pick_u32(value, &["sweaterNumber"]),
        position_code: pick_string(value, &["positionCode"]).unwrap_or_default(),
        team_id,
    })
}

fn parse_shift(entry: &Value) -> Option<ShiftInterval> {
    let player_id = pick_u32(entry, &["playerId"])?;
    let team_id = pick_u32(entry, &["teamId"])?;
    let period = pick_u32(entry, &["period"]).filter(|p| *p > 0)?;
    let start = try_clock_to_seconds(&pick_string(entry, &["startTime"])?)?;
    let end = try_clock_to_seconds(&pick_string(entry, &["endTime"])?)?;
    if end < start {
        return None;
    }
    Some(ShiftInterval {
        period: period.min(u8::MAX as u32) as u8,
        start_seconds: start,
        end_seconds: end,
        player_id,
        team_id,
    })
}

/// NHL names come as `{"default": "Auston"}`; plain strings are accepted too.
fn localized_name(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(v @ Value::Object(_)) => pick_string(v, &["default"]).unwrap_or_default(),
        _ => String::new(),
    }
}

fn pick_string(value: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        match value.get(*key) {
            Some(Value::String(s)) => return Some(s.trim().to_string()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

fn pick_u32(value: &Value, keys: &[&str]) -> Option<u32> {
    for key in keys {
        if let Some(v) = value.get(*key) {
            if let Some(num) = v.as_u64() {
                return u32::try_from(num).ok();
            }
            if let Some(s) = v.as_str() {
                if let Ok(num) = s.trim().parse::<u32>() {
                    return Some(num);
                }
            }
        }
    }
    None
}
