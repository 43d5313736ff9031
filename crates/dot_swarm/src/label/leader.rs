//! Leader line geometry between a cluster and its label.
use std::fmt::Write as _;

use glam::Vec2;

/// Half-width of the arc hugging the cluster, in degrees.
pub const ARC_HALF_SPAN_DEG: f32 = 30.0;

/// Length of the tick poking out of the cluster toward the label.
pub const TICK_LENGTH: f32 = 10.0;

/// Circular arc, angles in radians measured clockwise from +x in screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcSegment {
    pub center: Vec2,
    pub radius: f32,
    pub start_angle: f32,
    pub end_angle: f32,
}

impl ArcSegment {
    pub fn start(&self) -> Vec2 {
        self.center + Vec2::from_angle(self.start_angle) * self.radius
    }

    pub fn end(&self) -> Vec2 {
        self.center + Vec2::from_angle(self.end_angle) * self.radius
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub from: Vec2,
    pub to: Vec2,
}

/// Arc hugging the cluster edge facing the label, a short tick out of the
/// cluster, and the leader segment from the tick to the label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeaderPath {
    pub arc: ArcSegment,
    pub tick: LineSegment,
    pub leader: LineSegment,
}

impl LeaderPath {
    /// Builds the path for a cluster at `center` with `radius` whose label sits at `label`.
    pub fn new(center: Vec2, radius: f32, label: Vec2) -> Self {
        let d = label - center;
        let angle = d.y.atan2(d.x);
        let half = ARC_HALF_SPAN_DEG.to_radians();
        let dir = Vec2::from_angle(angle);
        let outer = center + dir * (radius + TICK_LENGTH);
        Self {
            arc: ArcSegment {
                center,
                radius,
                start_angle: angle - half,
                end_angle: angle + half,
            },
            tick: LineSegment {
                from: outer,
                to: center + dir * radius,
            },
            leader: LineSegment {
                from: label,
                to: outer,
            },
        }
    }

    /// SVG path data (`d` attribute).
    pub fn to_svg_path(&self) -> String {
        let mut d = String::new();
        let s = self.arc.start();
        let e = self.arc.end();
        let r = self.arc.radius;
        let _ = write!(d, "M{},{}A{r},{r},0,0,1,{},{}", s.x, s.y, e.x, e.y);
        let _ = write!(
            d,
            "M{},{}L{},{}",
            self.tick.from.x, self.tick.from.y, self.tick.to.x, self.tick.to.y
        );
        let _ = write!(
            d,
            "M{},{}L{},{}",
            self.leader.from.x, self.leader.from.y, self.leader.to.x, self.leader.to.y
        );
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn arc_faces_the_label() {
        let path = LeaderPath::new(Vec2::ZERO, 10.0, Vec2::new(50.0, 0.0));
        assert!(path.arc.start_angle < 0.0 && path.arc.end_angle > 0.0);
        let mid = (path.arc.start_angle + path.arc.end_angle) * 0.5;
        assert!(mid.abs() < 1e-6);
        assert!(approx(path.tick.from, Vec2::new(20.0, 0.0)));
        assert!(approx(path.tick.to, Vec2::new(10.0, 0.0)));
        assert!(approx(path.leader.from, Vec2::new(50.0, 0.0)));
        assert!(approx(path.leader.to, path.tick.from));
    }

    #[test]
    fn arc_endpoints_lie_on_cluster_edge() {
        let center = Vec2::new(100.0, 80.0);
        let path = LeaderPath::new(center, 25.0, Vec2::new(40.0, 10.0));
        assert!((path.arc.start().distance(center) - 25.0).abs() < 1e-3);
        assert!((path.arc.end().distance(center) - 25.0).abs() < 1e-3);
    }

    #[test]
    fn svg_path_has_arc_and_two_segments() {
        let d = LeaderPath::new(Vec2::ZERO, 10.0, Vec2::new(0.0, 40.0)).to_svg_path();
        assert_eq!(d.matches('M').count(), 3);
        assert_eq!(d.matches('A').count(), 1);
        assert_eq!(d.matches('L').count(), 2);
    }
}
