use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use puck_metrics::aggregate::MetricsEngine;
use puck_metrics::config::{self, AnalyticsConfig};
use puck_metrics::logging::init_logging;
use puck_metrics::model::TeamId;
use puck_metrics::pbp::{parse_play_by_play_json, parse_shifts_json};
use puck_metrics::season::{GameAnalysis, GameInput, analyze_games, season_summary};

/// Reads every `*.json` play-by-play file in a directory. A sibling `<name>.shifts.json`
/// is picked up as that game's shift chart.
fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    init_logging();

    let dir = std::env::args()
        .nth(1)
        .filter(|a| !a.starts_with("--"))
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("usage: season_report <games-dir> [--config FILE] [--team ID] [--json]"))?;

    let config = match parse_arg("--config") {
        Some(path) => AnalyticsConfig::load(PathBuf::from(path))?,
        None => config::shared()?.clone(),
    };
    let engine = MetricsEngine::new(config);

    let games = load_games(&dir)?;
    if games.is_empty() {
        return Err(anyhow!("no play-by-play files found in {}", dir.display()));
    }
    tracing::info!(games = games.len(), dir = %dir.display(), "analyzing season");

    let mut analyses: Vec<GameAnalysis> = Vec::with_capacity(games.len());
    for (input, result) in games.iter().zip(analyze_games(&engine, &games)) {
        match result {
            Ok(analysis) => analyses.push(analysis),
            Err(err) => tracing::warn!(game_id = input.log.game_id, error = %err, "skipping game"),
        }
    }
    analyses.sort_by_key(|a| (a.game_date, a.game_id));

    let team_filter: Option<TeamId> = parse_arg("--team").and_then(|v| v.parse().ok());
    let mut summary = season_summary(&engine, &analyses);
    if let Some(team) = team_filter {
        summary.retain(|s| s.team_id == team);
    }

    if has_flag("--json") {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!(
        "{:<6} {:>3} {:>3} {:>3} {:>6} {:>4} {:>7} {:>7} {:>7} {:>7}",
        "team", "gp", "w", "l", "wae", "ups", "h_cf%", "a_cf%", "h_gs", "a_gs"
    );
    for s in &summary {
        println!(
            "{:<6} {:>3} {:>3} {:>3} {:>6.2} {:>4} {:>7.1} {:>7.1} {:>7.2} {:>7.2}",
            if s.abbrev.is_empty() { s.team_id.to_string() } else { s.abbrev.clone() },
            s.games,
            s.wins,
            s.losses,
            s.wins_above_expected,
            s.upset_wins,
            s.home.avg_corsi_pct(),
            s.away.avg_corsi_pct(),
            s.home.avg_game_score(),
            s.away.avg_game_score(),
        );
    }
    Ok(())
}

fn load_games(dir: &Path) -> Result<Vec<GameInput>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("read dir {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .filter(|p| !is_shift_file(p))
        .collect();
    paths.sort();

    let mut out = Vec::with_capacity(paths.len());
    for path in paths {
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "unreadable game file");
                continue;
            }
        };
        let log = match parse_play_by_play_json(&raw) {
            Ok(log) => log,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "unparseable game file");
                continue;
            }
        };
        let shifts = fs::read_to_string(path.with_extension("shifts.json"))
            .ok()
            .and_then(|raw| parse_shifts_json(&raw).ok())
            .unwrap_or_default();
        out.push(GameInput { log, shifts });
    }
    Ok(out)
}

fn is_shift_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(".shifts.json"))
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
