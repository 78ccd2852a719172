use crate::config::XgConfig;
use crate::model::{Event, EventType, ShotType, Zone};

/// Heuristic expected-goals model. Holds only its tables, so evaluation is pure.
#[derive(Debug, Clone, Default)]
pub struct ShotQualityModel {
    cfg: XgConfig,
}

impl ShotQualityModel {
    pub fn new(cfg: XgConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &XgConfig {
        &self.cfg
    }

    pub fn expected_goal(
        &self,
        x: f64,
        y: f64,
        zone: Zone,
        shot_type: ShotType,
        event_type: EventType,
    ) -> f64 {
        let base = self.distance_base(self.distance(x, y));
        let angle = self.angle_multiplier(self.shot_angle(x, y));
        let zone = self.zone_multiplier(zone, x, y);
        let shot = self.shot_type_multiplier(shot_type);
        let event = self.event_multiplier(event_type);

        let xg = base * angle * zone * shot * event;
        if !xg.is_finite() {
            return 0.0;
        }
        xg.clamp(0.0, self.cfg.cap.max(0.0))
    }

    /// xG for a shot-class event; 0 for everything else.
    pub fn event_xg(&self, event: &Event) -> f64 {
        if !event.event_type.is_shot_attempt() {
            return 0.0;
        }
        self.expected_goal(event.x, event.y, event.zone, event.shot_type, event.event_type)
    }

    pub fn distance(&self, x: f64, y: f64) -> f64 {
        (self.cfg.goal_x - x).hypot(self.cfg.goal_y - y)
    }

    /// Angle in degrees subtended by the goal mouth from (x, y).
    pub fn shot_angle(&self, x: f64, y: f64) -> f64 {
        if self.distance(x, y) == 0.0 {
            return 0.0;
        }
        let half = self.cfg.post_half_width;
        let dx = self.cfg.goal_x - x;
        let left = dx.hypot(y - (self.cfg.goal_y + half));
        let right = dx.hypot(y - (self.cfg.goal_y - half));
        if left <= 0.0 || right <= 0.0 {
            // Standing on a post.
            return 45.0;
        }
        let width = 2.0 * half;
        let cos = ((left * left + right * right - width * width) / (2.0 * left * right)).clamp(-1.0, 1.0);
        cos.acos().to_degrees()
    }

    fn distance_base(&self, distance: f64) -> f64 {
        self.cfg
            .distance_buckets
            .iter()
            .find(|(max, _)| distance <= *max)
            .map(|(_, base)| *base)
            .unwrap_or(self.cfg.distance_beyond)
    }

    fn angle_multiplier(&self, angle: f64) -> f64 {
        self.cfg
            .angle_buckets
            .iter()
            .find(|(min, _)| angle > *min)
            .map(|(_, mult)| *mult)
            .unwrap_or(self.cfg.angle_default)
    }

    fn zone_multiplier(&self, zone: Zone, x: f64, y: f64) -> f64 {
        let z = &self.cfg.zone;
        match zone {
            Zone::Offensive if x > z.high_danger_min_x && y.abs() < z.high_danger_max_abs_y => {
                z.high_danger
            }
            Zone::Offensive if x > z.medium_danger_min_x && y.abs() < z.medium_danger_max_abs_y => {
                z.medium_danger
            }
            Zone::Offensive => z.offensive,
            Zone::Neutral => z.neutral,
            Zone::Defensive => z.defensive,
            Zone::Unknown => z.unknown,
        }
    }

    fn shot_type_multiplier(&self, shot_type: ShotType) -> f64 {
        self.cfg
            .shot_types
            .get(&shot_type)
            .copied()
            .unwrap_or(self.cfg.shot_type_default)
    }

    fn event_multiplier(&self, event_type: EventType) -> f64 {
        let e = &self.cfg.events;
        match event_type {
            EventType::MissedShot => e.missed,
            EventType::BlockedShot => e.blocked,
            _ => e.on_goal,
        }
    }
}
