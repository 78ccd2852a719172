use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use serde_json::json;

use puck_metrics::aggregate::MetricsEngine;
use puck_metrics::config::{self, AnalyticsConfig};
use puck_metrics::logging::init_logging;
use puck_metrics::pbp::{parse_play_by_play_json, parse_shifts_json};
use puck_metrics::season::{GameInput, analyze_game};

const USAGE: &str =
    "usage: puck_metrics <play-by-play.json> [--shifts FILE] [--config FILE] [--player ID] [--team ID] [--pretty]";

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    init_logging();

    let pbp_path = std::env::args()
        .nth(1)
        .filter(|a| !a.starts_with("--"))
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!(USAGE))?;

    let config = match parse_path_arg("--config") {
        Some(path) => AnalyticsConfig::load(&path)?,
        None => config::shared()?.clone(),
    };
    let engine = MetricsEngine::new(config);

    let raw = fs::read_to_string(&pbp_path).with_context(|| format!("read {}", pbp_path.display()))?;
    let log = parse_play_by_play_json(&raw)?;
    let shifts = match parse_path_arg("--shifts") {
        Some(path) => {
            let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
            parse_shifts_json(&raw)?
        }
        None => Vec::new(),
    };
    tracing::info!(
        game_id = log.game_id,
        events = log.events.len(),
        roster = log.roster.len(),
        shifts = shifts.len(),
        "loaded game"
    );

    let input = GameInput { log, shifts };
    let analysis = analyze_game(&engine, &input)?;
    let weights = &engine.config().game_score;

    let mut out = json!({
        "game_id": analysis.game_id,
        "game_date": analysis.game_date,
        "home": analysis.home,
        "away": analysis.away,
        "final": {
            "home_goals": analysis.home_goals,
            "away_goals": analysis.away_goals,
            "home_shootout_goals": analysis.home_shootout_goals,
            "away_shootout_goals": analysis.away_shootout_goals,
            "winner": analysis.winner(),
        },
        "win_probability": analysis.win_probability,
        "home_metrics": analysis.home_report.categories(weights),
        "away_metrics": analysis.away_report.categories(weights),
        "home_periods": analysis.home_report.periods,
        "away_periods": analysis.away_report.periods,
        "home_players": analysis.home_players,
        "away_players": analysis.away_players,
    });

    if let Some(player_id) = parse_u32_arg("--player") {
        let team_id = parse_u32_arg("--team")
            .or_else(|| input.log.roster.team_of(player_id))
            .with_context(|| format!("player {player_id} is not on the roster; pass --team"))?;
        let report = engine.player_report(&input.log, team_id, player_id, &input.shifts)?;
        out["player"] = json!({
            "player_id": player_id,
            "team_id": team_id,
            "name": input.log.roster.get(player_id).map(|p| p.full_name()),
            "metrics": report.categories(weights),
        });
    }

    let rendered = if has_flag("--pretty") {
        serde_json::to_string_pretty(&out)?
    } else {
        serde_json::to_string(&out)?
    };
    println!("{rendered}");
    Ok(())
}

fn has_flag(name: &str) -> bool {
    std::env::args().skip(1).any(|arg| arg == name)
}

fn parse_arg(name: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(v) = arg.strip_prefix(&format!("{name}="))
            && !v.trim().is_empty()
        {
            return Some(v.trim().to_string());
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}

fn parse_path_arg(name: &str) -> Option<PathBuf> {
    parse_arg(name).map(PathBuf::from)
}

fn parse_u32_arg(name: &str) -> Option<u32> {
    parse_arg(name).and_then(|v| v.parse::<u32>().ok())
}
