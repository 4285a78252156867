//! Implementations for the controller state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{trace, warn};
use serde::Serialize;

// Internal
use super::{CtrlError, Params, MIN_SPEED_FRACTION, SLOPE_FEEDFORWARD_GAIN};
use crate::participant::{publish_or_warn, Participant};
use comms_if::{
    bus::{ChanId, SimBus},
    clock::effective_step_s,
};
use util::{archive::Archiver, maths, module::State};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Controller module state
pub struct Ctrl {
    pub(crate) params: Params,

    /// Differentiation step
    ///
    /// Units: seconds
    dt: f64,

    /// Lateral error of the previous cycle
    prev_lat_err: f64,

    pub(crate) report: StatusReport,
    arch_report: Option<Archiver>,
}

/// Input data to the controller, the vehicle pose.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct InputData {
    pub x: f64,
    pub y: f64,

    /// Units: radians
    pub theta: f64,
}

/// Command issued by the controller.
#[derive(Clone, Copy, Default, Serialize, Debug, PartialEq)]
pub struct OutputData {
    /// Speed demand
    ///
    /// Units: meters/second
    pub v: f64,

    /// Yaw rate demand
    ///
    /// Units: radians/second
    pub omega: f64,
}

/// Status report for controller processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    /// Lateral error, positive when the path is above the vehicle
    pub lat_err: f64,

    /// Heading error wrapped into (-pi, pi]
    pub head_err: f64,

    /// Rate of change of the lateral error
    pub d_lat: f64,

    /// Slope of the path at the vehicle's x
    pub slope: f64,

    /// Path y at the vehicle's x
    pub y_ref: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Ctrl {
    /// Archive a status report every cycle.
    pub fn archive_reports(&mut self, archiver: Archiver) {
        self.arch_report = Some(archiver);
    }

    /// The status report of the latest cycle.
    pub fn report(&self) -> &StatusReport {
        &self.report
    }
}

impl State for Ctrl {
    type InitData = (Params, f64);
    type InitError = CtrlError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = std::convert::Infallible;

    /// Initialise the controller.
    ///
    /// Expected init data is the parameters and the step size of the run in seconds.
    fn init(init_data: Self::InitData) -> Result<Self, Self::InitError> {
        let (params, step_s) = init_data;

        params.validate()?;

        Ok(Self {
            params,
            dt: effective_step_s(step_s),
            prev_lat_err: 0.0,
            report: StatusReport::default(),
            arch_report: None,
        })
    }

    /// Compute the command for the given pose.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let p = &self.params;

        let (y_ref, slope) = p.path_type.eval(input_data.x);
        let desired_head = slope.atan2(1.0);

        let lat_err = y_ref - input_data.y;
        let head_err = maths::wrap_to_pi(desired_head - input_data.theta);

        let d_lat = (lat_err - self.prev_lat_err) / self.dt;
        self.prev_lat_err = lat_err;

        let omega = p.k_p_lat * lat_err
            + p.k_d_lat * d_lat
            + p.k_p_head * head_err
            + SLOPE_FEEDFORWARD_GAIN * slope;
        let v = p.v_nom * (1.0 - head_err.abs()).max(MIN_SPEED_FRACTION);

        self.report = StatusReport {
            lat_err,
            head_err,
            d_lat,
            slope,
            y_ref,
        };

        trace!(
            "Ctrl: lat_err = {:.4}, head_err = {:.4}, v = {:.4}, omega = {:.4}",
            lat_err,
            head_err,
            v,
            omega
        );

        Ok((OutputData { v, omega }, self.report))
    }
}

impl Participant for Ctrl {
    fn cycle(&mut self, bus: &mut dyn SimBus) {
        let input = InputData {
            x: bus.receive_or(ChanId::X, 0.0),
            y: bus.receive_or(ChanId::Y, 0.0),
            theta: bus.receive_or(ChanId::THETA, 0.0),
        };

        let (output, report) = match self.proc(&input) {
            Ok(r) => r,
            Err(e) => match e {},
        };

        publish_or_warn(bus, ChanId::V, output.v);
        publish_or_warn(bus, ChanId::OMEGA, output.omega);

        if let Some(ref mut arch) = self.arch_report {
            if let Err(e) = arch.serialise(report) {
                warn!("Could not archive the controller status report: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::path::PathType;
    use approx::assert_relative_eq;
    use comms_if::bus::mem::MemBus;

    fn ctrl(params: Params) -> Ctrl {
        Ctrl::init((params, 0.02)).unwrap()
    }

    #[test]
    fn test_on_straight_path() {
        let mut c = ctrl(Params {
            path_type: PathType::Straight,
            ..Default::default()
        });

        let (out, report) = c.proc(&InputData::default()).unwrap();

        assert_eq!(out, OutputData { v: 1.0, omega: 0.0 });
        assert_eq!(report.lat_err, 0.0);
        assert_eq!(report.head_err, 0.0);
    }

    #[test]
    fn test_law() {
        let mut c = ctrl(Params {
            path_type: PathType::Straight,
            ..Default::default()
        });

        // Vehicle 0.2 below the path, heading 0.1 rad to the left
        let (out, report) = c
            .proc(&InputData {
                x: 3.0,
                y: -0.2,
                theta: 0.1,
            })
            .unwrap();

        assert_relative_eq!(report.lat_err, 0.2, epsilon = 1e-12);
        assert_relative_eq!(report.head_err, -0.1, epsilon = 1e-12);
        assert_relative_eq!(report.d_lat, 10.0, epsilon = 1e-12);
        assert_relative_eq!(out.omega, 1.5 * 0.2 + 0.1 * 10.0 - 2.5 * 0.1, epsilon = 1e-12);
        assert_relative_eq!(out.v, 0.9, epsilon = 1e-12);

        // Same pose again, the derivative term vanishes
        let (out, report) = c
            .proc(&InputData {
                x: 3.0,
                y: -0.2,
                theta: 0.1,
            })
            .unwrap();

        assert_eq!(report.d_lat, 0.0);
        assert_relative_eq!(out.omega, 1.5 * 0.2 - 2.5 * 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_feedforward_and_speed_floor() {
        let mut c = ctrl(Params {
            path_type: PathType::Sine,
            k_p_lat: 0.0,
            k_p_head: 0.0,
            k_d_lat: 0.0,
            v_nom: 2.0,
        });

        // At x = 0 the sine path has slope 1, so it wants a 45 degree heading
        let (out, report) = c
            .proc(&InputData {
                x: 0.0,
                y: 0.0,
                theta: -2.0,
            })
            .unwrap();

        assert_relative_eq!(report.slope, 1.0, epsilon = 1e-12);
        assert_relative_eq!(out.omega, 0.5, epsilon = 1e-12);
        assert_relative_eq!(out.v, 2.0 * MIN_SPEED_FRACTION, epsilon = 1e-12);
    }

    #[test]
    fn test_heading_error_wraps() {
        let mut c = ctrl(Params {
            path_type: PathType::Straight,
            ..Default::default()
        });

        // Ten full turns on top of a small offset
        let theta = 20.0 * std::f64::consts::PI + 0.05;
        let (_, report) = c
            .proc(&InputData {
                x: 0.0,
                y: 0.0,
                theta,
            })
            .unwrap();

        assert_relative_eq!(report.head_err, -0.05, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_step_falls_back() {
        let mut c = Ctrl::init((
            Params {
                path_type: PathType::Straight,
                ..Default::default()
            },
            0.0,
        ))
        .unwrap();

        let (_, report) = c
            .proc(&InputData {
                x: 0.0,
                y: -0.02,
                theta: 0.0,
            })
            .unwrap();

        assert_relative_eq!(report.d_lat, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_cycle_defaults_missing_pose() {
        let mut bus = MemBus::from_secs(0.02, 1.0);
        let mut c = ctrl(Params {
            path_type: PathType::Straight,
            ..Default::default()
        });

        // Nothing published yet, the pose defaults to the origin
        c.cycle(&mut bus);

        assert_eq!(bus.receive(ChanId::V), Some(1.0));
        assert_eq!(bus.receive(ChanId::OMEGA), Some(0.0));

        // A short frame is a miss too
        bus.inject_frame(ChanId::Y, &[0u8; 3]);
        c.cycle(&mut bus);
        assert_eq!(c.report().lat_err, 0.0);
    }
}
