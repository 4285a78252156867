//! Implementations for the plant simulator state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace, warn};
use rand::{rngs::StdRng, Rng};
use rand_distr::{Distribution, Normal};
use serde::Serialize;

// Internal
use super::{num_steps, Disturbance, Params, PlantError};
use crate::participant::{publish_or_warn, Participant};
use comms_if::{
    bus::{ChanId, SimBus},
    clock::effective_step_s,
};
use util::{archive::Archiver, module::State};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Plant simulator state
///
/// Generic over the random generator so that runs can be made reproducible.
pub struct Plant<R: Rng = StdRng> {
    pub(crate) params: Params,

    /// Integration step
    ///
    /// Units: seconds
    dt: f64,

    pub(crate) pose: RobotState,

    last_v: f64,
    last_omega: f64,

    disturbance: Disturbance,

    /// Length of a disturbance in steps
    dist_steps: u32,

    noise: Normal<f64>,
    rng: R,

    pub(crate) report: StatusReport,
    arch_report: Option<Archiver>,
}

/// Input data to the plant, the command read from the bus.
///
/// A `None` means the command wasn't available this step.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct InputData {
    pub v: Option<f64>,
    pub omega: Option<f64>,
}

/// Pose and clock of the vehicle.
#[derive(Clone, Copy, Default, Serialize, Debug, PartialEq)]
pub struct RobotState {
    pub x: f64,
    pub y: f64,

    /// Heading, unwrapped
    ///
    /// Units: radians
    pub theta: f64,

    /// Elapsed plant time
    ///
    /// Units: seconds
    pub t: f64,
}

/// Status report for plant processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    /// Speed after noise was added
    pub v_noisy: f64,

    /// Yaw rate after noise and disturbance were added
    pub omega_noisy: f64,

    /// Yaw rate bias applied by the disturbance this step
    pub dist_bias: f64,

    /// True if a disturbance started this step
    pub dist_triggered: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<R: Rng> Plant<R> {
    /// Archive a status report every cycle.
    pub fn archive_reports(&mut self, archiver: Archiver) {
        self.arch_report = Some(archiver);
    }

    /// The current pose of the vehicle.
    pub fn pose(&self) -> &RobotState {
        &self.pose
    }

    /// The status report of the latest cycle.
    pub fn report(&self) -> &StatusReport {
        &self.report
    }

    pub fn disturbance(&self) -> &Disturbance {
        &self.disturbance
    }

    /// Start a disturbance if none is running and the dice say so.
    ///
    /// Returns true if one was started.
    fn maybe_trigger_disturbance(&mut self) -> bool {
        if !self.disturbance.is_idle() || self.params.disturbance <= 0.0 {
            return false;
        }

        if self.rng.gen::<f64>() >= self.params.dist_prob {
            return false;
        }

        let positive = self.rng.gen::<bool>();
        self.disturbance
            .trigger(self.params.disturbance, self.dist_steps, positive);

        debug!(
            "Disturbance of {}{} rad/s triggered for {} steps at t = {:.2} s",
            if positive { "+" } else { "-" },
            self.params.disturbance,
            self.dist_steps,
            self.pose.t
        );

        true
    }
}

impl<R: Rng> State for Plant<R> {
    type InitData = (Params, f64, R);
    type InitError = PlantError;

    type InputData = InputData;
    type OutputData = RobotState;
    type StatusReport = StatusReport;
    type ProcError = std::convert::Infallible;

    /// Initialise the plant.
    ///
    /// Expected init data is the parameters, the step size of the run in seconds and the random
    /// generator to draw noise and disturbances from.
    fn init(init_data: Self::InitData) -> Result<Self, Self::InitError> {
        let (params, step_s, rng) = init_data;

        if !(params.noise_std.is_finite() && params.noise_std >= 0.0) {
            return Err(PlantError::InvalidNoiseStd(params.noise_std));
        }
        if !(0.0..=1.0).contains(&params.dist_prob) {
            return Err(PlantError::InvalidDistProb(params.dist_prob));
        }

        let noise = Normal::new(0.0, params.noise_std).map_err(PlantError::NoiseDistError)?;

        let dt = effective_step_s(step_s);

        Ok(Self {
            pose: RobotState {
                x: params.init_x,
                y: params.init_y,
                theta: params.init_theta,
                t: 0.0,
            },
            dist_steps: num_steps(params.dist_duration_s, dt),
            params,
            dt,
            last_v: 0.0,
            last_omega: 0.0,
            disturbance: Disturbance::default(),
            noise,
            rng,
            report: StatusReport::default(),
            arch_report: None,
        })
    }

    /// Integrate the pose over one step.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        // Hold the last command on a miss
        let v = input_data.v.unwrap_or(self.last_v);
        let omega = input_data.omega.unwrap_or(self.last_omega);
        self.last_v = v;
        self.last_omega = omega;

        let v_noisy = v + self.noise.sample(&mut self.rng);
        let mut omega_noisy = omega + self.noise.sample(&mut self.rng);

        let dist_triggered = self.maybe_trigger_disturbance();
        let dist_bias = self.disturbance.step();
        omega_noisy += dist_bias;

        let dt = self.dt;
        let p = &mut self.pose;
        p.x += v_noisy * p.theta.cos() * dt;
        p.y += v_noisy * p.theta.sin() * dt;
        p.theta += omega_noisy * dt;
        p.t += dt;

        self.report = StatusReport {
            v_noisy,
            omega_noisy,
            dist_bias,
            dist_triggered,
        };

        trace!(
            "Plant: x = {:.4}, y = {:.4}, theta = {:.4}, t = {:.2}",
            p.x,
            p.y,
            p.theta,
            p.t
        );

        Ok((*p, self.report))
    }
}

impl<R: Rng> Participant for Plant<R> {
    fn cycle(&mut self, bus: &mut dyn SimBus) {
        let input = InputData {
            v: bus.receive(ChanId::V),
            omega: bus.receive(ChanId::OMEGA),
        };

        let (pose, report) = match self.proc(&input) {
            Ok(r) => r,
            Err(e) => match e {},
        };

        publish_or_warn(bus, ChanId::X, pose.x);
        publish_or_warn(bus, ChanId::Y, pose.y);
        publish_or_warn(bus, ChanId::THETA, pose.theta);
        publish_or_warn(bus, ChanId::T, pose.t);

        if let Some(ref mut arch) = self.arch_report {
            if let Err(e) = arch.serialise(report) {
                warn!("Could not archive the plant status report: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use comms_if::bus::mem::MemBus;
    use rand::SeedableRng;

    fn quiet_params() -> Params {
        Params {
            noise_std: 0.0,
            disturbance: 0.0,
            dist_prob: 0.0,
            ..Default::default()
        }
    }

    fn plant(params: Params) -> Plant {
        Plant::init((params, 0.02, StdRng::seed_from_u64(1))).unwrap()
    }

    #[test]
    fn test_invalid_params() {
        let rng = StdRng::seed_from_u64(0);
        let res = Plant::init((
            Params {
                noise_std: -1.0,
                ..Default::default()
            },
            0.02,
            rng,
        ));
        assert!(matches!(res, Err(PlantError::InvalidNoiseStd(_))));

        let rng = StdRng::seed_from_u64(0);
        let res = Plant::init((
            Params {
                dist_prob: 1.5,
                ..Default::default()
            },
            0.02,
            rng,
        ));
        assert!(matches!(res, Err(PlantError::InvalidDistProb(_))));
    }

    #[test]
    fn test_euler_step() {
        let mut p = plant(Params {
            init_x: 1.0,
            init_theta: std::f64::consts::FRAC_PI_2,
            ..quiet_params()
        });

        let (pose, report) = p
            .proc(&InputData {
                v: Some(2.0),
                omega: Some(0.5),
            })
            .unwrap();

        assert_relative_eq!(pose.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(pose.y, 0.04, epsilon = 1e-12);
        assert_relative_eq!(pose.theta, std::f64::consts::FRAC_PI_2 + 0.01, epsilon = 1e-12);
        assert_relative_eq!(pose.t, 0.02, epsilon = 1e-12);
        assert_eq!(report.dist_bias, 0.0);
        assert!(!report.dist_triggered);
    }

    #[test]
    fn test_holds_last_command() {
        let mut p = plant(quiet_params());

        // Nothing received yet, the vehicle stays put
        let (pose, _) = p.proc(&InputData::default()).unwrap();
        assert_eq!(pose.x, 0.0);

        p.proc(&InputData {
            v: Some(1.0),
            omega: Some(0.0),
        })
        .unwrap();

        // Command lost, the previous one is held
        let (pose, report) = p.proc(&InputData::default()).unwrap();
        assert_eq!(report.v_noisy, 1.0);
        assert_relative_eq!(pose.x, 0.04, epsilon = 1e-12);
    }

    #[test]
    fn test_heading_not_wrapped() {
        let mut p = plant(quiet_params());
        let input = InputData {
            v: Some(0.0),
            omega: Some(10.0),
        };

        for _ in 0..100 {
            p.proc(&input).unwrap();
        }

        assert_relative_eq!(p.pose().theta, 20.0, epsilon = 1e-9);
    }

    #[test]
    fn test_noise_is_reproducible() {
        let params = Params {
            noise_std: 0.1,
            seed: Some(99),
            ..Default::default()
        };
        let input = InputData {
            v: Some(1.0),
            omega: Some(0.1),
        };

        let mut a = Plant::init((params.clone(), 0.02, params.rng())).unwrap();
        let mut b = Plant::init((params.clone(), 0.02, params.rng())).unwrap();

        let mut noisy = false;
        for _ in 0..50 {
            let (pa, ra) = a.proc(&input).unwrap();
            let (pb, _) = b.proc(&input).unwrap();
            assert_eq!(pa, pb);
            noisy |= ra.v_noisy != 1.0;
        }
        assert!(noisy);
    }

    #[test]
    fn test_disturbance_every_step() {
        let mut p = plant(Params {
            noise_std: 0.0,
            disturbance: 0.2,
            dist_prob: 1.0,
            dist_duration_s: 0.1,
            ..Default::default()
        });
        let input = InputData {
            v: Some(1.0),
            omega: Some(0.0),
        };

        let mut biases = Vec::new();
        let mut triggers = Vec::new();
        for _ in 0..11 {
            let (_, report) = p.proc(&input).unwrap();
            biases.push(report.dist_bias);
            triggers.push(report.dist_triggered);
        }

        // Active from the first step for exactly 5 steps, then immediately re-triggered since the
        // probability is one
        assert_eq!(
            triggers,
            vec![true, false, false, false, false, true, false, false, false, false, true]
        );
        for b in biases.iter() {
            assert_relative_eq!(b.abs(), 0.2);
        }
        for window in biases[0..5].windows(2) {
            assert_eq!(window[0], window[1]);
        }
    }

    #[test]
    fn test_no_disturbance_without_magnitude() {
        let mut p = plant(Params {
            disturbance: 0.0,
            dist_prob: 1.0,
            ..quiet_params()
        });

        let (_, report) = p.proc(&InputData::default()).unwrap();

        assert!(!report.dist_triggered);
        assert!(p.disturbance().is_idle());
    }

    #[test]
    fn test_cycle_publishes_pose() {
        let mut bus = MemBus::from_secs(0.02, 1.0);
        let mut p = plant(quiet_params());

        bus.publish(ChanId::V, 1.0).unwrap();
        bus.publish(ChanId::OMEGA, 0.0).unwrap();

        p.cycle(&mut bus);

        assert_relative_eq!(bus.receive(ChanId::X).unwrap(), 0.02, epsilon = 1e-12);
        assert_eq!(bus.receive(ChanId::Y), Some(0.0));
        assert_eq!(bus.receive(ChanId::THETA), Some(0.0));
        assert_relative_eq!(bus.receive(ChanId::T).unwrap(), 0.02, epsilon = 1e-12);
    }
}
