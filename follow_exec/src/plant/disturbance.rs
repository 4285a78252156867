//! Transient yaw disturbance

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// State machine of the yaw disturbance.
///
/// The disturbance is idle until triggered, it then biases the yaw rate by `sign * magnitude`
/// for a fixed number of steps before going idle again.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Disturbance {
    remaining_steps: u32,
    magnitude: f64,
    sign: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Disturbance {
    /// True if no disturbance is in progress.
    pub fn is_idle(&self) -> bool {
        self.remaining_steps == 0
    }

    /// Number of steps the current disturbance still has to run.
    pub fn remaining_steps(&self) -> u32 {
        self.remaining_steps
    }

    /// Start a disturbance lasting `num_steps` steps, pushing positively if `positive` is set.
    pub fn trigger(&mut self, magnitude: f64, num_steps: u32, positive: bool) {
        self.remaining_steps = num_steps;
        self.magnitude = magnitude;
        self.sign = if positive { 1.0 } else { -1.0 };
    }

    /// Consume one step of the disturbance, returning the yaw rate bias to apply during it.
    ///
    /// An idle disturbance always gives zero.
    pub fn step(&mut self) -> f64 {
        if self.is_idle() {
            return 0.0;
        }

        let bias = self.sign * self.magnitude;

        self.remaining_steps -= 1;
        if self.remaining_steps == 0 {
            self.magnitude = 0.0;
        }

        bias
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Number of steps a disturbance of `duration_s` seconds lasts, at least one.
pub fn num_steps(duration_s: f64, dt: f64) -> u32 {
    let steps = (duration_s / dt).round();

    if steps >= 1.0 {
        steps.min(u32::MAX as f64) as u32
    } else {
        1
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_num_steps() {
        assert_eq!(num_steps(0.1, 0.02), 5);
        assert_eq!(num_steps(0.0, 0.02), 1);
        assert_eq!(num_steps(0.005, 0.02), 1);
        assert_eq!(num_steps(0.05, 0.02), 3);
        assert_eq!(num_steps(f64::NAN, 0.02), 1);
    }

    #[test]
    fn test_lifecycle() {
        for &(duration_s, dt) in [(0.1, 0.02), (0.0, 0.02), (1.0, 0.1), (0.07, 0.02)].iter() {
            let n = num_steps(duration_s, dt);
            let mut d = Disturbance::default();

            assert!(d.is_idle());
            assert_eq!(d.step(), 0.0);

            d.trigger(0.2, n, false);

            for i in 0..n {
                assert!(!d.is_idle());
                assert_eq!(d.step(), -0.2, "step {} of {}", i, n);
            }

            assert!(d.is_idle());
            assert_eq!(d.step(), 0.0);
            assert_eq!(d, Disturbance { remaining_steps: 0, magnitude: 0.0, sign: -1.0 });
        }
    }
}
