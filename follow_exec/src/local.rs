//! # Single process runner
//!
//! Runs the plant, controller and analyser over one in-memory bus, cycling them in that order
//! within each step before advancing the shared clock. This gives the same dataflow as a
//! distributed run with a fixed, reproducible scheduling order.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::info;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    analyser::{self, Analyser, KpiRecord},
    ctrl::{self, Ctrl},
    participant::{self, Lockstep, Participant},
    plant::{self, Plant},
};
use comms_if::{
    bus::{mem::MemBus, BusError},
    clock::SimClock,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Timing of a single process run.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Params {
    /// Units: seconds
    pub step_s: f64,

    /// Units: seconds
    pub total_s: f64,
}

/// Outcome of a single process run.
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    pub num_cycles: u64,
    pub kpis: Option<KpiRecord>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            step_s: 0.02,
            total_s: 10.0,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Label the analyser's record with the controller and plant parameters actually used, and make
/// it score against the path the controller tracks.
pub fn align_analyser_params(
    analyser_params: &mut analyser::Params,
    ctrl_params: &ctrl::Params,
    plant_params: &plant::Params,
) {
    analyser_params.path_type = ctrl_params.path_type;
    analyser_params.k_p = ctrl_params.k_p_lat;
    analyser_params.k_d = ctrl_params.k_d_lat;
    analyser_params.noise = plant_params.noise_std;
    analyser_params.disturbance = plant_params.disturbance;
}

/// Run all three participants to the end of `bus`'s duration.
pub fn run<R: Rng>(
    bus: &mut MemBus,
    plant: &mut Plant<R>,
    ctrl: &mut Ctrl,
    analyser: &mut Analyser,
) -> Result<RunSummary, BusError> {
    let mut clock = SimClock::new(&*bus);

    info!(
        "Running {:.2} s in steps of {:.3} s",
        clock.total_s(),
        clock.step_s()
    );

    let num_cycles = {
        let participants: Vec<&mut dyn Participant> = vec![plant, ctrl, &mut *analyser];
        participant::run(bus, &mut clock, &mut Lockstep::new(participants))?
    };

    info!("Run complete after {} cycles", num_cycles);

    Ok(RunSummary {
        num_cycles,
        kpis: analyser.finalise(),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::path::PathType;
    use comms_if::bus::{ChanId, SimBus};
    use rand::{rngs::StdRng, SeedableRng};
    use util::module::State;

    /// Records the lateral error and yaw rate command seen on the bus each step.
    struct Recorder {
        path_type: PathType,
        lat_errs: Vec<f64>,
        omegas: Vec<f64>,
    }

    impl Recorder {
        fn new(path_type: PathType) -> Self {
            Self {
                path_type,
                lat_errs: Vec::new(),
                omegas: Vec::new(),
            }
        }
    }

    impl Participant for Recorder {
        fn cycle(&mut self, bus: &mut dyn SimBus) {
            let x = bus.receive_or(ChanId::X, 0.0);
            let y = bus.receive_or(ChanId::Y, 0.0);

            self.lat_errs.push(self.path_type.y(x) - y);
            self.omegas.push(bus.receive_or(ChanId::OMEGA, f64::NAN));
        }
    }

    fn quiet_plant() -> Plant {
        Plant::init((
            plant::Params {
                noise_std: 0.0,
                disturbance: 0.0,
                dist_prob: 0.0,
                ..Default::default()
            },
            0.02,
            StdRng::seed_from_u64(0),
        ))
        .unwrap()
    }

    fn run_recorded(ctrl_params: ctrl::Params, plant: &mut Plant, num_steps: u32) -> Recorder {
        let path_type = ctrl_params.path_type;
        let mut bus = MemBus::from_secs(0.02, 0.02 * num_steps as f64);
        let mut clock = SimClock::new(&bus);

        let mut ctrl = Ctrl::init((ctrl_params, clock.step_s())).unwrap();
        let mut recorder = Recorder::new(path_type);

        {
            let participants: Vec<&mut dyn Participant> = vec![plant, &mut ctrl, &mut recorder];
            let mut group = Lockstep::new(participants);
            let num_cycles = participant::run(&mut bus, &mut clock, &mut group).unwrap();
            assert_eq!(num_cycles, num_steps as u64);
        }

        recorder
    }

    #[test]
    fn test_straight_zero_gains() {
        let params = ctrl::Params {
            path_type: PathType::Straight,
            k_p_lat: 0.0,
            k_p_head: 0.0,
            k_d_lat: 0.0,
            v_nom: 1.0,
        };

        let recorder = run_recorded(params, &mut quiet_plant(), 250);

        assert!(recorder.lat_errs.iter().all(|e| *e == 0.0));
        assert!(recorder.omegas.iter().all(|w| *w == 0.0));
    }

    #[test]
    fn test_sine_tracking() {
        let params = ctrl::Params {
            path_type: PathType::Sine,
            k_p_lat: 1.5,
            k_d_lat: 0.1,
            k_p_head: 2.5,
            v_nom: 1.0,
        };

        let recorder = run_recorded(params, &mut quiet_plant(), 500);

        let errs = &recorder.lat_errs;
        let max_abs = |errs: &[f64]| errs.iter().fold(0.0f64, |acc, e| acc.max(e.abs()));

        // The vehicle starts on the path, so the error must first grow before the law can pull it
        // back in
        let excursion = errs
            .iter()
            .position(|e| e.abs() >= 0.1)
            .expect("lateral error never left the 0.1 band");
        let recovery = errs[excursion..]
            .iter()
            .position(|e| e.abs() < 0.1)
            .map(|i| excursion + i)
            .expect("lateral error never returned to the 0.1 band");
        assert!(recovery < 100, "recovered at step {}", recovery);

        assert!(max_abs(&errs[..100]) < 0.2, "lateral error reached {}", max_abs(&errs[..100]));
        assert!(max_abs(&errs[100..]) < 0.5, "lateral error reached {}", max_abs(&errs[100..]));
    }

    #[test]
    fn test_first_step_disturbance() {
        let mut plant = Plant::init((
            plant::Params {
                noise_std: 0.0,
                disturbance: 0.2,
                dist_prob: 1.0,
                dist_duration_s: 0.1,
                ..Default::default()
            },
            0.02,
            StdRng::seed_from_u64(3),
        ))
        .unwrap();
        let mut bus = MemBus::from_secs(0.02, 0.2);

        let mut remaining = Vec::new();
        for _ in 0..5 {
            plant.cycle(&mut bus);
            assert!(plant.report().dist_bias.abs() > 0.0);
            remaining.push(plant.disturbance().remaining_steps());
        }

        assert_eq!(remaining, vec![4, 3, 2, 1, 0]);
    }

    #[test]
    fn test_full_run() {
        let ctrl_params = ctrl::Params::default();
        let plant_params = plant::Params {
            seed: Some(11),
            ..Default::default()
        };
        let mut analyser_params = analyser::Params::default();
        align_analyser_params(&mut analyser_params, &ctrl_params, &plant_params);

        let mut bus = MemBus::from_secs(0.02, 10.0);
        let mut plant = Plant::init((plant_params.clone(), 0.02, plant_params.rng())).unwrap();
        let mut ctrl = Ctrl::init((ctrl_params, 0.02)).unwrap();
        let mut analyser = Analyser::init(analyser_params).unwrap();

        let summary = run(&mut bus, &mut plant, &mut ctrl, &mut analyser).unwrap();

        assert_eq!(summary.num_cycles, 500);
        assert_eq!(analyser.trajectory().len(), 500);

        let kpis = summary.kpis.unwrap();
        assert_eq!(kpis.k_p, 1.5);
        assert_eq!(kpis.noise, 0.02);
        assert!(kpis.settling_time <= 500);
        assert!(kpis.overshoot.is_finite());
    }
}
