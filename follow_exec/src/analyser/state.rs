//! Implementations for the analyser state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, trace, warn};
use serde::Serialize;

// Internal
use super::{kpi, AnalyserError, KpiRecord, Params};
use crate::participant::Participant;
use crate::path::{PathType, RefCurve, NUM_REF_SAMPLES};
use comms_if::bus::{ChanId, SimBus};
use util::module::State;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Analyser module state
pub struct Analyser {
    pub(crate) params: Params,

    ref_curve: RefCurve,

    /// Recorded `(x, y)` samples, in step order
    trajectory: Vec<(f64, f64)>,

    pub(crate) report: StatusReport,
}

/// Input data to the analyser, the position read from the bus.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct InputData {
    pub x: Option<f64>,
    pub y: Option<f64>,
}

/// Status report for analyser processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    /// True if a sample was recorded this step
    pub sampled: bool,

    /// Number of samples recorded so far
    pub num_samples: usize,
}

/// Everything needed to redraw a run, saved at the end of it.
#[derive(Clone, Serialize, Debug)]
pub struct TrajectoryExport {
    pub path_type: PathType,
    pub trajectory: Vec<(f64, f64)>,
    pub ref_curve: RefCurve,
    pub kpis: Option<KpiRecord>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Analyser {
    /// The recorded trajectory.
    pub fn trajectory(&self) -> &[(f64, f64)] {
        &self.trajectory
    }

    pub fn ref_curve(&self) -> &RefCurve {
        &self.ref_curve
    }

    pub fn report(&self) -> &StatusReport {
        &self.report
    }

    /// Reduce the recorded trajectory into a KPI record.
    ///
    /// Returns `None`, with a warning, if nothing was recorded. Calling this repeatedly gives the
    /// same record.
    pub fn finalise(&self) -> Option<KpiRecord> {
        if self.trajectory.is_empty() {
            warn!("No trajectory samples were recorded, no KPIs computed");
            return None;
        }

        let errors = kpi::tracking_errors(&self.trajectory, &self.ref_curve)?;
        let kpis = kpi::reduce(&errors)?;

        let p = &self.params;
        let record = KpiRecord {
            k_p: p.k_p,
            k_i: p.k_i,
            k_d: p.k_d,
            noise: p.noise,
            disturbance: p.disturbance,
            overshoot: kpis.overshoot,
            settling_time: kpis.settling_time,
            steady_state_error: kpis.steady_state_error,
        };

        info!(
            "KPIs over {} samples: overshoot = {:.4}, settling time = {}, steady state error = {:.4}",
            errors.len(),
            record.overshoot,
            record.settling_time,
            record.steady_state_error
        );

        Some(record)
    }

    /// Bundle the trajectory, reference and the KPIs returned by [`Analyser::finalise`] for
    /// saving.
    pub fn export(&self, kpis: Option<KpiRecord>) -> TrajectoryExport {
        TrajectoryExport {
            path_type: self.params.path_type,
            trajectory: self.trajectory.clone(),
            ref_curve: self.ref_curve.clone(),
            kpis,
        }
    }
}

impl State for Analyser {
    type InitData = Params;
    type InitError = AnalyserError;

    type InputData = InputData;
    type OutputData = Option<(f64, f64)>;
    type StatusReport = StatusReport;
    type ProcError = std::convert::Infallible;

    /// Initialise the analyser, sampling the reference curve.
    fn init(init_data: Self::InitData) -> Result<Self, Self::InitError> {
        let params = init_data;

        if !(params.path_length.is_finite() && params.path_length > 0.0) {
            return Err(AnalyserError::InvalidPathLength(params.path_length));
        }

        Ok(Self {
            ref_curve: RefCurve::sample(params.path_type, params.path_length, NUM_REF_SAMPLES),
            params,
            trajectory: Vec::new(),
            report: StatusReport::default(),
        })
    }

    /// Record the position if both coordinates are available.
    ///
    /// Outputs the sample taken, if any.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let sample = match (input_data.x, input_data.y) {
            (Some(x), Some(y)) => Some((x, y)),
            _ => None,
        };

        match sample {
            Some(s) => self.trajectory.push(s),
            None => trace!("Analyser: no position available, step skipped"),
        }

        self.report = StatusReport {
            sampled: sample.is_some(),
            num_samples: self.trajectory.len(),
        };

        Ok((sample, self.report))
    }
}

impl Participant for Analyser {
    fn cycle(&mut self, bus: &mut dyn SimBus) {
        let input = InputData {
            x: bus.receive(ChanId::X),
            y: bus.receive(ChanId::Y),
        };

        match self.proc(&input) {
            Ok(_) => (),
            Err(e) => match e {},
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::bus::mem::MemBus;

    fn analyser(path_type: PathType) -> Analyser {
        Analyser::init(Params {
            path_type,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_invalid_length() {
        assert!(Analyser::init(Params {
            path_length: 0.0,
            ..Default::default()
        })
        .is_err());
    }

    #[test]
    fn test_skips_missing_samples() {
        let mut bus = MemBus::from_secs(0.02, 1.0);
        let mut a = analyser(PathType::Straight);

        // Nothing on the bus
        a.cycle(&mut bus);
        assert!(!a.report().sampled);

        // Only x
        bus.publish(ChanId::X, 1.0).unwrap();
        a.cycle(&mut bus);
        assert!(!a.report().sampled);

        // y is malformed
        bus.inject_frame(ChanId::Y, &[1, 2, 3, 4]);
        a.cycle(&mut bus);
        assert!(!a.report().sampled);

        bus.publish(ChanId::Y, 0.25).unwrap();
        a.cycle(&mut bus);
        assert!(a.report().sampled);
        assert_eq!(a.report().num_samples, 1);
        assert_eq!(a.trajectory(), &[(1.0, 0.25)]);
    }

    #[test]
    fn test_empty_finalise() {
        let a = analyser(PathType::Curved);

        assert_eq!(a.finalise(), None);
        assert!(a.export(None).kpis.is_none());
    }

    #[test]
    fn test_finalise() {
        let mut a = analyser(PathType::Straight);

        for i in 0..20 {
            let y = if i < 5 { -0.5 } else { 0.1 };
            a.proc(&InputData {
                x: Some(i as f64 * 0.1),
                y: Some(y),
            })
            .unwrap();
        }

        let record = a.finalise().unwrap();

        assert_eq!(record.k_p, 1.5);
        assert_eq!(record.k_i, 0.0);
        assert_eq!(record.overshoot, 0.5);
        assert_eq!(record.settling_time, 5);
        assert_eq!(record.steady_state_error, 0.1);

        // Same trajectory, same record
        assert_eq!(a.finalise(), Some(record));
    }

    #[test]
    fn test_export_keeps_given_kpis() {
        let mut a = analyser(PathType::Sine);
        for i in 0..10 {
            a.proc(&InputData {
                x: Some(i as f64 * 0.1),
                y: Some(0.0),
            })
            .unwrap();
        }

        let record = a.finalise();
        assert!(record.is_some());

        let export = a.export(record);
        assert_eq!(export.kpis, record);
        assert_eq!(export.path_type, PathType::Sine);
        assert_eq!(export.trajectory.len(), 10);

        // The record is never recomputed
        assert_eq!(a.export(None).kpis, None);
    }
}
