use serde::{Deserialize, Serialize};

use crate::config::AnalyticsConfig;
use crate::error::{MetricsError, Result};
use crate::model::{Event, EventType, GameLog, PlayerId, ShiftInterval, TeamId};
use crate::on_ice::OnIceIndex;
use crate::report::{MetricsReport, PeriodLine, round_to};
use crate::sequences::{EventFilter, analyze_sequences};
use crate::xg::ShotQualityModel;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerBoxScore {
    pub player_id: PlayerId,
    pub team_id: TeamId,
    pub name: String,
    pub sweater_number: Option<u32>,
    pub position_code: String,
    pub goals: u32,
    pub primary_assists: u32,
    pub secondary_assists: u32,
    pub shots: u32,
    pub hits: u32,
    pub blocks: u32,
    pub giveaways: u32,
    pub takeaways: u32,
    pub faceoff_wins: u32,
    pub faceoff_losses: u32,
    pub penalties_taken: u32,
    pub penalties_drawn: u32,
    pub penalty_minutes: u32,
    pub on_ice_goals_for: u32,
    pub on_ice_goals_against: u32,
    pub game_score: f64,
}

/// Per-call view of the game the aggregation runs against.
#[derive(Debug, Clone, Copy)]
pub struct GameContext<'a> {
    pub home_team_id: Option<TeamId>,
    pub on_ice: &'a OnIceIndex,
}

impl<'a> GameContext<'a> {
    pub fn new(home_team_id: Option<TeamId>, on_ice: &'a OnIceIndex) -> Self {
        Self {
            home_team_id,
            on_ice,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MetricsEngine {
    config: AnalyticsConfig,
    xg: ShotQualityModel,
}

impl MetricsEngine {
    pub fn new(config: AnalyticsConfig) -> Self {
        let xg = ShotQualityModel::new(config.xg.clone());
        Self { config, xg }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn shot_model(&self) -> &ShotQualityModel {
        &self.xg
    }

    /// Team report for one game. Fails only when the team neither played in the game nor
    /// owns any event in it.
    pub fn team_report(&self, game: &GameLog, team_id: TeamId, shifts: &[ShiftInterval]) -> Result<MetricsReport> {
        self.ensure_team(game, team_id)?;
        let on_ice = OnIceIndex::new(shifts);
        let ctx = GameContext::new(home_id(game), &on_ice);
        Ok(self.aggregate(&game.events, EventFilter::team(team_id), ctx))
    }

    pub fn player_report(
        &self,
        game: &GameLog,
        team_id: TeamId,
        player_id: PlayerId,
        shifts: &[ShiftInterval],
    ) -> Result<MetricsReport> {
        self.ensure_team(game, team_id)?;
        let on_ice = OnIceIndex::new(shifts);
        let ctx = GameContext::new(home_id(game), &on_ice);
        Ok(self.aggregate(&game.events, EventFilter::player(team_id, player_id), ctx))
    }

    /// Box scores for every roster player of `team_id`, best Game Score first.
    pub fn box_scores(&self, game: &GameLog, team_id: TeamId, shifts: &[ShiftInterval]) -> Result<Vec<PlayerBoxScore>> {
        self.ensure_team(game, team_id)?;
        let on_ice = OnIceIndex::new(shifts);
        let ctx = GameContext::new(home_id(game), &on_ice);
        let events = regulation_events(&game.events);

        let mut out: Vec<PlayerBoxScore> = game
            .roster
            .players_for_team(team_id)
            .into_iter()
            .map(|entry| {
                let filter = EventFilter::player(team_id, entry.player_id);
                let report = self.count_events(events, filter, ctx);
                let gs = &report.game_score_inputs;
                PlayerBoxScore {
                    player_id: entry.player_id,
                    team_id,
                    name: entry.full_name(),
                    sweater_number: entry.sweater_number,
                    position_code: entry.position_code.clone(),
                    goals: gs.goals,
                    primary_assists: gs.primary_assists,
                    secondary_assists: gs.secondary_assists,
                    shots: gs.shots,
                    hits: report.defense.hits,
                    blocks: report.defense.blocks,
                    giveaways: report.defense.giveaways,
                    takeaways: report.defense.takeaways,
                    faceoff_wins: gs.faceoff_wins,
                    faceoff_losses: gs.faceoff_losses,
                    penalties_taken: gs.penalties_taken,
                    penalties_drawn: gs.penalties_drawn,
                    penalty_minutes: report.special_teams.penalty_minutes,
                    on_ice_goals_for: gs.goals_for,
                    on_ice_goals_against: gs.goals_against,
                    game_score: round_to(gs.game_score(&self.config.game_score), 2),
                }
            })
            .collect();
        out.sort_by(|a, b| {
            b.game_score
                .total_cmp(&a.game_score)
                .then(a.player_id.cmp(&b.player_id))
        });
        Ok(out)
    }

    /// Full report for one filter. Never fails: a team with no events gets zeros.
    pub fn aggregate(&self, events: &[Event], filter: EventFilter, ctx: GameContext<'_>) -> MetricsReport {
        let events = regulation_events(events);
        let mut report = self.count_events(events, filter, ctx);
        report.sequences = analyze_sequences(events, filter, &self.config.windows);
        tracing::debug!(
            team_id = filter.team_id,
            player_id = ?filter.player_id,
            shots = report.total_shots(),
            goals = report.shots.goals,
            xg = report.shots.expected_goals,
            "aggregated metrics"
        );
        report
    }

    fn ensure_team(&self, game: &GameLog, team_id: TeamId) -> Result<()> {
        if game.is_participant(team_id) || game.events.iter().any(|e| e.is_team(team_id)) {
            Ok(())
        } else {
            Err(MetricsError::NoDataForTeam { team_id })
        }
    }

    /// Everything except the sequence analyzers: one pass over the events.
    fn count_events(&self, events: &[Event], filter: EventFilter, ctx: GameContext<'_>) -> MetricsReport {
        let mut report = MetricsReport::new(filter.team_id, filter.player_id);
        let team = filter.team_id;
        let player = filter.player_id;
        let is_home = ctx.home_team_id.map(|h| h == team);

        for event in events {
            let owned = event.is_team(team);
            let opposing = event.is_opponent_of(team);
            let by = |id: Option<PlayerId>| match player {
                None => owned,
                Some(p) => owned && id == Some(p),
            };
            let period = period_line(&mut report.periods, event.period);

            match event.event_type {
                t if t.is_shot_attempt() => {
                    let xg = self.xg.event_xg(event);
                    if by(event.players.shooter()) {
                        let shots = &mut report.shots;
                        match t {
                            EventType::ShotOnGoal => shots.shots_on_goal += 1,
                            EventType::Goal => {
                                shots.shots_on_goal += 1;
                                shots.goals += 1;
                            }
                            EventType::MissedShot => shots.missed_shots += 1,
                            _ => shots.blocked_shots += 1,
                        }
                        shots.expected_goals += xg;
                        if xg >= self.config.high_danger_xg || t == EventType::Goal {
                            shots.high_danger_shots += 1;
                        }
                        *shots.by_type.entry(event.shot_type).or_default() += 1;
                        *shots.by_zone.entry(event.zone).or_default() += 1;

                        period.expected_goals += xg;
                        if t.is_on_goal() {
                            period.shots_on_goal += 1;
                            report.game_score_inputs.shots += 1;
                        }
                        if t == EventType::Goal {
                            period.goals += 1;
                            report.game_score_inputs.goals += 1;
                            if let Some(home) = is_home {
                                if event.situation.advantage(home) > 0 {
                                    report.special_teams.power_play_goals += 1;
                                }
                            }
                        }
                    }
                    if t == EventType::Goal && owned {
                        if player.is_some() && event.players.assist1 == player {
                            report.game_score_inputs.primary_assists += 1;
                        }
                        if player.is_some() && event.players.assist2 == player {
                            report.game_score_inputs.secondary_assists += 1;
                        }
                        if player.is_none() {
                            report.game_score_inputs.primary_assists += u32::from(event.players.assist1.is_some());
                            report.game_score_inputs.secondary_assists += u32::from(event.players.assist2.is_some());
                        }
                    }
                    if t == EventType::BlockedShot && by(event.players.blocking) {
                        report.defense.blocks += 1;
                        report.game_score_inputs.blocks += 1;
                    }
                    if player.is_none() {
                        if owned {
                            report.possession.corsi_for += 1;
                            report.possession.xg_for += xg;
                            period.corsi_for += 1;
                            if t == EventType::Goal {
                                report.game_score_inputs.goals_for += 1;
                            }
                        } else if opposing {
                            report.possession.corsi_against += 1;
                            report.possession.xg_against += xg;
                            period.corsi_against += 1;
                            if t == EventType::Goal {
                                report.game_score_inputs.goals_against += 1;
                            }
                        }
                    } else if let Some(p) = player {
                        if (owned || opposing) && ctx.on_ice.is_on_ice(p, event.period, event.time_in_period) {
                            if owned {
                                period.corsi_for += 1;
                            } else {
                                period.corsi_against += 1;
                            }
                        }
                    }
                }
                EventType::Hit => {
                    if by(event.players.hitting) {
                        report.defense.hits += 1;
                        period.hits += 1;
                    }
                }
                EventType::Takeaway => {
                    if by(event.players.player) {
                        report.defense.takeaways += 1;
                    }
                }
                EventType::Giveaway => {
                    if by(event.players.player) {
                        report.defense.giveaways += 1;
                    }
                }
                EventType::Faceoff => {
                    let (win, loss) = match player {
                        None => (owned, opposing),
                        Some(p) => (
                            event.players.winning == Some(p),
                            event.players.losing == Some(p),
                        ),
                    };
                    if win {
                        report.special_teams.faceoff_wins += 1;
                        report.game_score_inputs.faceoff_wins += 1;
                        period.faceoff_wins += 1;
                    }
                    if loss {
                        report.special_teams.faceoff_losses += 1;
                        report.game_score_inputs.faceoff_losses += 1;
                        period.faceoff_losses += 1;
                    }
                }
                EventType::Penalty => {
                    let (taken, drawn) = match player {
                        None => (owned, opposing),
                        Some(p) => (
                            event.players.committed_by == Some(p),
                            event.players.drawn_by == Some(p),
                        ),
                    };
                    if taken {
                        report.special_teams.penalties_taken += 1;
                        report.special_teams.penalty_minutes += event.penalty_minutes;
                        report.game_score_inputs.penalties_taken += 1;
                        period.penalty_minutes += event.penalty_minutes;
                    }
                    if drawn {
                        report.special_teams.penalties_drawn += 1;
                        report.game_score_inputs.penalties_drawn += 1;
                    }
                    if player.is_none() && opposing {
                        report.special_teams.power_play_opportunities += 1;
                    }
                }
                _ => {}
            }
        }

        if let Some(p) = player {
            let on_ice = ctx.on_ice.player_stats(events, p, team, &self.xg);
            report.possession.corsi_for = on_ice.corsi_for;
            report.possession.corsi_against = on_ice.corsi_against;
            report.possession.xg_for = on_ice.xg_for;
            report.possession.xg_against = on_ice.xg_against;
            report.game_score_inputs.goals_for = on_ice.goals_for;
            report.game_score_inputs.goals_against = on_ice.goals_against;
        }
        report
    }
}

fn home_id(game: &GameLog) -> Option<TeamId> {
    (game.home.id != 0).then_some(game.home.id)
}

/// Shootout attempts are not part of play; events are ordered so they sit at the end.
fn regulation_events(events: &[Event]) -> &[Event] {
    let end = events
        .iter()
        .position(|e| e.is_shootout())
        .unwrap_or(events.len());
    &events[..end]
}

fn period_line(periods: &mut Vec<PeriodLine>, period: u8) -> &mut PeriodLine {
    let period = period.max(1);
    while periods.len() < period as usize {
        let next = periods.len() as u8 + 1;
        periods.push(PeriodLine::new(next));
    }
    &mut periods[period as usize - 1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{StrengthState, Zone};

    const HOME: TeamId = 10;
    const AWAY: TeamId = 20;

    fn ev(kind: EventType, team: TeamId, period: u8, t: u32) -> Event {
        let mut e = Event::new(kind, Some(team), period, t);
        e.zone = Zone::Offensive;
        e.x = 70.0;
        e.y = 5.0;
        e.has_coordinates = true;
        e
    }

    fn run(events: &[Event], filter: EventFilter) -> MetricsReport {
        let on_ice = OnIceIndex::default();
        MetricsEngine::default().aggregate(events, filter, GameContext::new(Some(HOME), &on_ice))
    }

    #[test]
    fn shot_counts_conserve_total() {
        let events = vec![
            ev(EventType::ShotOnGoal, HOME, 1, 10),
            ev(EventType::MissedShot, HOME, 1, 20),
            ev(EventType::BlockedShot, HOME, 1, 30),
            ev(EventType::Goal, HOME, 2, 40),
            ev(EventType::ShotOnGoal, AWAY, 2, 50),
        ];
        let r = run(&events, EventFilter::team(HOME));
        assert_eq!(r.total_shots(), 4);
        assert_eq!(r.shots.shots_on_goal, 2);
        assert_eq!(r.possession.corsi_for, 4);
        assert_eq!(r.possession.corsi_against, 1);
        assert_eq!(r.periods.len(), 2);
        assert_eq!(r.periods[1].goals, 1);
        assert_eq!(r.periods[1].corsi_against, 1);
        assert_eq!(r.game_score_inputs.goals_against, 0);
    }

    #[test]
    fn power_play_goal_needs_skater_advantage() {
        let mut pp_goal = ev(EventType::Goal, HOME, 1, 100);
        pp_goal.situation = StrengthState::from_situation_code("1451");
        let mut even_goal = ev(EventType::Goal, HOME, 1, 300);
        even_goal.situation = StrengthState::from_situation_code("1551");
        let penalty = {
            let mut p = Event::new(EventType::Penalty, Some(AWAY), 1, 90);
            p.penalty_minutes = 2;
            p
        };
        let r = run(&[penalty, pp_goal, even_goal], EventFilter::team(HOME));
        assert_eq!(r.special_teams.power_play_goals, 1);
        assert_eq!(r.special_teams.power_play_opportunities, 1);
        assert_eq!(r.special_teams.penalties_drawn, 1);
        assert_eq!(r.power_play_pct(), 100.0);
    }

    #[test]
    fn faceoffs_split_by_owner() {
        let events = vec![
            Event::new(EventType::Faceoff, Some(HOME), 1, 0),
            Event::new(EventType::Faceoff, Some(AWAY), 1, 60),
            Event::new(EventType::Faceoff, Some(HOME), 1, 120),
        ];
        let r = run(&events, EventFilter::team(HOME));
        assert_eq!(r.special_teams.faceoff_wins, 2);
        assert_eq!(r.special_teams.faceoff_losses, 1);
        assert!((r.faceoff_pct() - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn player_credit_follows_roles() {
        let mut goal = ev(EventType::Goal, HOME, 1, 100);
        goal.players.scoring = Some(1);
        goal.players.assist1 = Some(2);
        goal.players.assist2 = Some(3);
        let scorer = run(std::slice::from_ref(&goal), EventFilter::player(HOME, 1));
        let helper = run(std::slice::from_ref(&goal), EventFilter::player(HOME, 2));
        assert_eq!(scorer.shots.goals, 1);
        assert_eq!(helper.shots.goals, 0);
        assert_eq!(helper.game_score_inputs.primary_assists, 1);
        assert_eq!(helper.game_score_inputs.secondary_assists, 0);
    }

    #[test]
    fn shootout_attempts_are_ignored() {
        let mut so = ev(EventType::Goal, HOME, 5, 0);
        so.period_type = crate::model::PeriodType::Shootout;
        let r = run(&[ev(EventType::Goal, HOME, 3, 1000), so], EventFilter::team(HOME));
        assert_eq!(r.shots.goals, 1);
    }
}
