use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{Event, EventType, PlayerId, ShiftInterval, TeamId};
use crate::xg::ShotQualityModel;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OnIceStats {
    pub corsi_for: u32,
    pub corsi_against: u32,
    pub xg_for: f64,
    pub xg_against: f64,
    pub goals_for: u32,
    pub goals_against: u32,
}

/// Shift intervals grouped by period for on-ice lookups.
#[derive(Debug, Clone, Default)]
pub struct OnIceIndex {
    by_period: HashMap<u8, Vec<ShiftInterval>>,
}

impl OnIceIndex {
    pub fn new(shifts: &[ShiftInterval]) -> Self {
        let mut by_period: HashMap<u8, Vec<ShiftInterval>> = HashMap::new();
        for shift in shifts {
            by_period.entry(shift.period).or_default().push(*shift);
        }
        Self { by_period }
    }

    pub fn is_empty(&self) -> bool {
        self.by_period.is_empty()
    }

    pub fn on_ice(&self, period: u8, time_in_period: u32) -> impl Iterator<Item = &ShiftInterval> + '_ {
        self.by_period
            .get(&period)
            .into_iter()
            .flatten()
            .filter(move |s| s.contains(period, time_in_period))
    }

    pub fn is_on_ice(&self, player_id: PlayerId, period: u8, time_in_period: u32) -> bool {
        self.on_ice(period, time_in_period)
            .any(|s| s.player_id == player_id)
    }

    /// Shot attempts and goals while `player_id` was on the ice, split by who took them.
    /// A player whose shifts overlap at an event is still counted once.
    pub fn player_stats(
        &self,
        events: &[Event],
        player_id: PlayerId,
        team_id: TeamId,
        model: &ShotQualityModel,
    ) -> OnIceStats {
        let mut out = OnIceStats::default();
        if self.is_empty() {
            return out;
        }
        for event in events {
            if !event.event_type.is_shot_attempt() || event.is_shootout() {
                continue;
            }
            let Some(shooting_team) = event.team_id else {
                continue;
            };
            if !self.is_on_ice(player_id, event.period, event.time_in_period) {
                continue;
            }
            let xg = model.event_xg(event);
            let is_goal = event.event_type == EventType::Goal;
            if shooting_team == team_id {
                out.corsi_for += 1;
                out.xg_for += xg;
                out.goals_for += u32::from(is_goal);
            } else {
                out.corsi_against += 1;
                out.xg_against += xg;
                out.goals_against += u32::from(is_goal);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Zone;

    fn shift(player_id: PlayerId, team_id: TeamId, start: u32, end: u32) -> ShiftInterval {
        ShiftInterval {
            period: 1,
            start_seconds: start,
            end_seconds: end,
            player_id,
            team_id,
        }
    }

    fn shot(kind: EventType, team: TeamId, t: u32) -> Event {
        let mut e = Event::new(kind, Some(team), 1, t);
        e.zone = Zone::Offensive;
        e.x = 80.0;
        e.has_coordinates = true;
        e
    }

    #[test]
    fn containment_is_inclusive() {
        let idx = OnIceIndex::new(&[shift(5, 1, 10, 40)]);
        assert!(idx.is_on_ice(5, 1, 10));
        assert!(idx.is_on_ice(5, 1, 40));
        assert!(!idx.is_on_ice(5, 1, 41));
        assert!(!idx.is_on_ice(5, 2, 20));
    }

    #[test]
    fn attempts_split_for_and_against() {
        let idx = OnIceIndex::new(&[shift(5, 1, 0, 60)]);
        let events = vec![
            shot(EventType::Goal, 1, 5),
            shot(EventType::MissedShot, 2, 20),
            shot(EventType::ShotOnGoal, 2, 90),
        ];
        let s = idx.player_stats(&events, 5, 1, &ShotQualityModel::default());
        assert_eq!(s.corsi_for, 1);
        assert_eq!(s.corsi_against, 1);
        assert_eq!(s.goals_for, 1);
        assert_eq!(s.goals_against, 0);
        assert!(s.xg_for > 0.0 && s.xg_against > 0.0);
    }

    #[test]
    fn no_shifts_means_zero() {
        let events = vec![shot(EventType::Goal, 1, 5)];
        let s = OnIceIndex::default().player_stats(&events, 5, 1, &ShotQualityModel::default());
        assert_eq!(s, OnIceStats::default());
    }
}
