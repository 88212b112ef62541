//! Cubic-Bézier mouse path generation, adapted from a general N-point
//! Bernstein-polynomial curve generator down to the fixed 4-control-point
//! (`P0`, `P1`, `P2`, `P3`) case a human-like mouse move needs.

use rand::Rng;

pub const JITTER_MIN: f64 = 20.0;
pub const JITTER_MAX: f64 = 100.0;
pub const SPEED_MIN: f64 = 400.0;
pub const SPEED_MAX: f64 = 1400.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPoint {
    pub x: f64,
    pub y: f64,
    /// Time since the previous point, in milliseconds.
    pub delay_ms: f64,
}

pub struct BezierMouse;

impl BezierMouse {
    /// Evaluate a cubic Bézier curve defined by four control points at
    /// parameter `t` in `[0, 1]`.
    fn cubic_at(p0: (f64, f64), p1: (f64, f64), p2: (f64, f64), p3: (f64, f64), t: f64) -> (f64, f64) {
        let mt = 1.0 - t;
        let a = mt * mt * mt;
        let b = 3.0 * mt * mt * t;
        let c = 3.0 * mt * t * t;
        let d = t * t * t;
        (
            a * p0.0 + b * p1.0 + c * p2.0 + d * p3.0,
            a * p0.1 + b * p1.1 + c * p2.1 + d * p3.1,
        )
    }

    /// Control points for a cubic Bézier from `(x0,y0)` to `(x1,y1)`: `P1`
    /// near 30% along the line with perpendicular jitter, `P2` near 70%
    /// with opposite jitter, magnitude proportional to distance and clamped
    /// to `[JITTER_MIN, JITTER_MAX]`.
    pub fn control_points(
        start: (f64, f64),
        end: (f64, f64),
        rng: &mut impl Rng,
    ) -> [(f64, f64); 4] {
        let (x0, y0) = start;
        let (x1, y1) = end;
        let dx = x1 - x0;
        let dy = y1 - y0;
        let dist = (dx * dx + dy * dy).sqrt();
        let jitter = (dist * 0.15).clamp(JITTER_MIN, JITTER_MAX);

        // Unit perpendicular to the start->end line.
        let (nx, ny) = if dist > 0.0 {
            (-dy / dist, dx / dist)
        } else {
            (0.0, 0.0)
        };

        let j1 = rng.random_range(-jitter..=jitter);
        let j2 = -rng.random_range(-jitter..=jitter);

        let p1 = (x0 + dx * 0.3 + nx * j1, y0 + dy * 0.3 + ny * j1);
        let p2 = (x0 + dx * 0.7 + nx * j2, y0 + dy * 0.7 + ny * j2);

        [start, p1, p2, end]
    }

    /// Generate a human-approximating mouse path from `start` to `end`.
    ///
    /// `overshoot` aims 5-15% past the target then adds a short correction
    /// segment back, matching real pointer behavior under momentum.
    pub fn generate_path(
        start: (f64, f64),
        end: (f64, f64),
        overshoot: bool,
        rng: &mut impl Rng,
    ) -> Vec<PathPoint> {
        let dist = ((end.0 - start.0).powi(2) + (end.1 - start.1).powi(2)).sqrt();
        let steps = ((dist / 10.0).round() as usize).clamp(10, 100);

        let mut points = Vec::with_capacity(steps + 1);
        points.extend(Self::sample_segment(start, end, steps, rng));

        if overshoot && dist > 0.0 {
            let factor = 1.0 + rng.random_range(0.05..=0.15);
            let overshoot_end = (
                start.0 + (end.0 - start.0) * factor,
                start.1 + (end.1 - start.1) * factor,
            );
            points.clear();
            let main_steps = (steps * 2 / 3).max(6);
            points.extend(Self::sample_segment(start, overshoot_end, main_steps, rng));
            let correction_steps = (steps - main_steps).max(4);
            let last = points.last().map(|p| (p.x, p.y)).unwrap_or(overshoot_end);
            points.extend(Self::sample_segment(last, end, correction_steps, rng));
        }

        points
    }

    fn sample_segment(
        start: (f64, f64),
        end: (f64, f64),
        steps: usize,
        rng: &mut impl Rng,
    ) -> Vec<PathPoint> {
        let [p0, p1, p2, p3] = Self::control_points(start, end, rng);
        let dist = ((end.0 - start.0).powi(2) + (end.1 - start.1).powi(2)).sqrt();
        let speed = rng.random_range(SPEED_MIN..=SPEED_MAX);
        let total_ms = if speed > 0.0 { dist / speed * 1000.0 } else { 0.0 };

        let mut out = Vec::with_capacity(steps + 1);
        let mut prev_eased = 0.0f64;
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            let eased = 0.5 - 0.5 * (std::f64::consts::PI * t).cos();
            let (mut x, mut y) = Self::cubic_at(p0, p1, p2, p3, t);

            if i != 0 && i != steps {
                x += rng.random_range(-JITTER_MAX..=JITTER_MAX);
                y += rng.random_range(-JITTER_MAX..=JITTER_MAX);
            }

            let delay_ms = (eased - prev_eased) * total_ms * rng.random_range(0.8..=1.2);
            prev_eased = eased;
            out.push(PathPoint { x, y, delay_ms });
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_starts_and_ends_at_requested_points() {
        let mut rng = rand::rng();
        let path = BezierMouse::generate_path((0.0, 0.0), (300.0, 150.0), false, &mut rng);
        let first = path.first().unwrap();
        let last = path.last().unwrap();
        assert!((first.x - 0.0).abs() < 1e-6);
        assert!((first.y - 0.0).abs() < 1e-6);
        assert!((last.x - 300.0).abs() < 1e-6);
        assert!((last.y - 150.0).abs() < 1e-6);
    }

    #[test]
    fn path_length_is_clamped_between_10_and_100() {
        let mut rng = rand::rng();
        let short = BezierMouse::generate_path((0.0, 0.0), (5.0, 5.0), false, &mut rng);
        assert!(short.len() - 1 >= 10);

        let long = BezierMouse::generate_path((0.0, 0.0), (5000.0, 5000.0), false, &mut rng);
        assert!(long.len() - 1 <= 100);
    }
}
