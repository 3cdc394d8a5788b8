/// Quintic Hermite segment between two keyframes.  Matches position, velocity, and acceleration
/// at both ends; with zero boundary accelerations this is the minimum-jerk profile.
#[derive(Clone, Debug)]
pub struct QuinticHermiteSegment {
    coefficients: [f64; 6],
    duration: f64
}
impl QuinticHermiteSegment {
    pub fn new(p0: f64, v0: f64, a0: f64, p1: f64, v1: f64, a1: f64, duration: f64) -> Self {
        assert!(duration > 0.0, "segment duration must be positive");

        let t = duration;
        let t2 = t * t;
        let t3 = t2 * t;
        let t4 = t3 * t;
        let t5 = t4 * t;

        let c0 = p0;
        let c1 = v0;
        let c2 = 0.5 * a0;
        let c3 = (20.0 * p1 - 20.0 * p0 - (8.0 * v1 + 12.0 * v0) * t - (3.0 * a0 - a1) * t2) / (2.0 * t3);
        let c4 = (30.0 * p0 - 30.0 * p1 + (14.0 * v1 + 16.0 * v0) * t + (3.0 * a0 - 2.0 * a1) * t2) / (2.0 * t4);
        let c5 = (12.0 * p1 - 12.0 * p0 - (6.0 * v1 + 6.0 * v0) * t - (a0 - a1) * t2) / (2.0 * t5);

        Self {
            coefficients: [c0, c1, c2, c3, c4, c5],
            duration
        }
    }
    pub fn position(&self, t: f64) -> f64 {
        let c = &self.coefficients;
        return c[0] + t * (c[1] + t * (c[2] + t * (c[3] + t * (c[4] + t * c[5]))));
    }
    pub fn velocity(&self, t: f64) -> f64 {
        let c = &self.coefficients;
        return c[1] + t * (2.0 * c[2] + t * (3.0 * c[3] + t * (4.0 * c[4] + t * 5.0 * c[5])));
    }
    pub fn acceleration(&self, t: f64) -> f64 {
        let c = &self.coefficients;
        return 2.0 * c[2] + t * (6.0 * c[3] + t * (12.0 * c[4] + t * 20.0 * c[5]));
    }
    pub fn duration(&self) -> f64 {
        self.duration
    }
}

pub struct SimpleInterpolationUtils;
impl SimpleInterpolationUtils {
    /// `s` is the normalized position in the segment, 0.0 at `start` and 1.0 at `end`.
    pub fn linear_interpolation_scalar(start: f64, end: f64, s: f64) -> f64 {
        return start + (end - start) * s;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn quintic_matches_boundary_conditions() {
        let segment = QuinticHermiteSegment::new(0.5, -0.2, 0.1, 1.5, 0.3, -0.4, 0.8);

        assert_relative_eq!(segment.position(0.0), 0.5, epsilon = 1e-12);
        assert_relative_eq!(segment.velocity(0.0), -0.2, epsilon = 1e-12);
        assert_relative_eq!(segment.acceleration(0.0), 0.1, epsilon = 1e-12);
        assert_relative_eq!(segment.position(0.8), 1.5, epsilon = 1e-10);
        assert_relative_eq!(segment.velocity(0.8), 0.3, epsilon = 1e-10);
        assert_relative_eq!(segment.acceleration(0.8), -0.4, epsilon = 1e-9);
    }

    #[test]
    fn rest_to_rest_segment_is_symmetric_at_midpoint() {
        let segment = QuinticHermiteSegment::new(0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 1.0);

        assert_relative_eq!(segment.position(0.5), 1.0, epsilon = 1e-12);
        assert_relative_eq!(segment.velocity(0.5), 3.75, epsilon = 1e-12);
        assert_relative_eq!(segment.acceleration(0.5), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn linear_interpolation_hits_endpoints() {
        assert_eq!(SimpleInterpolationUtils::linear_interpolation_scalar(1.0, 3.0, 0.0), 1.0);
        assert_eq!(SimpleInterpolationUtils::linear_interpolation_scalar(1.0, 3.0, 1.0), 3.0);
        assert_eq!(SimpleInterpolationUtils::linear_interpolation_scalar(1.0, 3.0, 0.25), 1.5);
    }
}
