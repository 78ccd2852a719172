use crate::model::{Event, TeamId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Backward,
    Forward,
}

/// Other-team events skipped by `same_team` still use up `max_events`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub direction: Direction,
    pub max_events: usize,
    pub max_secs: Option<u32>,
    pub team: Option<TeamId>,
    pub include_anchor: bool,
}

impl Window {
    pub fn backward(max_events: usize) -> Self {
        Self {
            direction: Direction::Backward,
            max_events,
            max_secs: None,
            team: None,
            include_anchor: false,
        }
    }

    pub fn forward(max_events: usize) -> Self {
        Self {
            direction: Direction::Forward,
            ..Self::backward(max_events)
        }
    }

    pub fn within_secs(mut self, secs: u32) -> Self {
        self.max_secs = Some(secs);
        self
    }

    pub fn same_team(mut self, team: TeamId) -> Self {
        self.team = Some(team);
        self
    }

    pub fn including_anchor(mut self) -> Self {
        self.include_anchor = true;
        self
    }

    pub fn scan<'a>(&self, events: &'a [Event], anchor: usize) -> Scan<'a> {
        Scan {
            events,
            anchor,
            window: *self,
            step: if self.include_anchor { 0 } else { 1 },
            done: anchor >= events.len(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Scan<'a> {
    events: &'a [Event],
    anchor: usize,
    window: Window,
    step: usize,
    done: bool,
}

impl<'a> Scan<'a> {
    fn cursor(&self) -> Option<usize> {
        match self.window.direction {
            Direction::Backward => self.anchor.checked_sub(self.step),
            Direction::Forward => Some(self.anchor + self.step).filter(|i| *i < self.events.len()),
        }
    }
}

impl<'a> Iterator for Scan<'a> {
    type Item = (usize, &'a Event);

    fn next(&mut self) -> Option<Self::Item> {
        let events = self.events;
        let anchor = events.get(self.anchor)?;
        while !self.done {
            if self.step > self.window.max_events {
                self.done = true;
                break;
            }
            let Some(idx) = self.cursor() else {
                self.done = true;
                break;
            };
            self.step += 1;

            let event = &events[idx];
            if event.period != anchor.period {
                self.done = true;
                break;
            }
            if let Some(max_secs) = self.window.max_secs {
                if event.game_seconds().abs_diff(anchor.game_seconds()) > max_secs {
                    self.done = true;
                    break;
                }
            }
            if let Some(team) = self.window.team {
                if !event.is_team(team) {
                    continue;
                }
            }
            return Some((idx, event));
        }
        None
    }
}
