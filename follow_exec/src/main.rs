//! # Path Following Executable
//!
//! Runs the plant, controller and analyser together in a single process over an in-memory bus,
//! then appends the run's KPIs to the results file and saves the trajectory to the session.
//!
//! Use `bus_exec` together with `plant_exec`, `ctrl_exec` and `analyser_exec` for a distributed
//! run of the same loop.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Result};
use log::{info, warn};
use structopt::StructOpt;

// Internal
use comms_if::bus::mem::MemBus;
use follow_lib::{
    analyser::{self, Analyser},
    ctrl::{self, Ctrl},
    local,
    path::PathType,
    plant::{self, Plant},
};
use util::{
    archive::Archiver,
    host,
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// CLI
// ------------------------------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "follow_exec", about = "Single process path following run")]
struct Opt {
    /// Run parameter file, relative to the params directory
    #[structopt(long, default_value = "follow_exec.toml")]
    params: String,

    #[structopt(long, default_value = "info")]
    log_level: LevelFilter,

    /// Reference path: straight, sine or curved
    #[structopt(long)]
    path_type: Option<PathType>,

    #[structopt(long)]
    kp_lat: Option<f64>,

    #[structopt(long)]
    kp_head: Option<f64>,

    #[structopt(long)]
    kd_lat: Option<f64>,

    /// Nominal forward speed in metres per second
    #[structopt(long)]
    v_nom: Option<f64>,

    /// Integral gain, recorded alongside the KPIs only
    #[structopt(long)]
    ki: Option<f64>,

    #[structopt(long)]
    noise: Option<f64>,

    #[structopt(long)]
    disturbance: Option<f64>,

    /// Per step probability of a disturbance
    #[structopt(long)]
    dist_prob: Option<f64>,

    /// Disturbance duration in seconds
    #[structopt(long)]
    dist_duration: Option<f64>,

    #[structopt(long)]
    seed: Option<u64>,

    /// Length of the sampled reference curve in metres
    #[structopt(long)]
    path_length: Option<f64>,

    /// Step size in seconds
    #[structopt(long)]
    step: Option<f64>,

    /// Run duration in seconds
    #[structopt(long)]
    duration: Option<f64>,
}

impl Opt {
    /// Override the loaded parameters with those given on the command line.
    fn apply(
        &self,
        run_params: &mut local::Params,
        ctrl_params: &mut ctrl::Params,
        plant_params: &mut plant::Params,
        analyser_params: &mut analyser::Params,
    ) {
        if let Some(p) = self.path_type {
            ctrl_params.path_type = p;
        }
        if let Some(k) = self.kp_lat {
            ctrl_params.k_p_lat = k;
        }
        if let Some(k) = self.kp_head {
            ctrl_params.k_p_head = k;
        }
        if let Some(k) = self.kd_lat {
            ctrl_params.k_d_lat = k;
        }
        if let Some(v) = self.v_nom {
            ctrl_params.v_nom = v;
        }
        if let Some(k) = self.ki {
            analyser_params.k_i = k;
        }
        if let Some(l) = self.path_length {
            analyser_params.path_length = l;
        }
        if let Some(n) = self.noise {
            plant_params.noise_std = n;
        }
        if let Some(d) = self.disturbance {
            plant_params.disturbance = d;
        }
        if let Some(p) = self.dist_prob {
            plant_params.dist_prob = p;
        }
        if let Some(d) = self.dist_duration {
            plant_params.dist_duration_s = d;
        }
        if self.seed.is_some() {
            plant_params.seed = self.seed;
        }
        if let Some(s) = self.step {
            run_params.step_s = s;
        }
        if let Some(d) = self.duration {
            run_params.total_s = d;
        }
    }
}

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    let session =
        Session::new("follow_exec", "sessions").wrap_err("Failed to create the session")?;

    logger_init(opt.log_level, &session).wrap_err("Failed to initialise logging")?;

    info!("Path Following Executable\n");
    info!("Running on: {}", host::get_description());
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let mut run_params: local::Params =
        util::params::load(&opt.params).wrap_err("Failed to load run parameters")?;
    let mut ctrl_params: ctrl::Params =
        util::params::load("ctrl.toml").wrap_err("Failed to load controller parameters")?;
    let mut plant_params: plant::Params =
        util::params::load("plant.toml").wrap_err("Failed to load plant parameters")?;
    let mut analyser_params: analyser::Params =
        util::params::load("analyser.toml").wrap_err("Failed to load analyser parameters")?;

    opt.apply(
        &mut run_params,
        &mut ctrl_params,
        &mut plant_params,
        &mut analyser_params,
    );

    local::align_analyser_params(&mut analyser_params, &ctrl_params, &plant_params);

    info!("Run parameters: {:?}", run_params);
    info!("Controller parameters: {:?}", ctrl_params);
    info!("Plant parameters: {:?}", plant_params);
    info!("Analyser parameters: {:?}", analyser_params);

    let results_path = follow_lib::results_path(&analyser_params.results_file)
        .wrap_err("Failed to resolve the results file")?;

    // ---- MODULE INITIALISATION ----

    let mut bus = MemBus::from_secs(run_params.step_s, run_params.total_s);
    let step_s = comms_if::clock::SimClock::new(&bus).step_s();

    let rng = plant_params.rng();
    let mut plant: Plant = Plant::init((plant_params, step_s, rng))
        .wrap_err("Failed to initialise the plant")?;
    let mut ctrl =
        Ctrl::init((ctrl_params, step_s)).wrap_err("Failed to initialise the controller")?;
    let mut analyser =
        Analyser::init(analyser_params).wrap_err("Failed to initialise the analyser")?;

    // ---- RUN ----

    let summary = local::run(&mut bus, &mut plant, &mut ctrl, &mut analyser)
        .wrap_err("The run was interrupted")?;

    // ---- FINALISATION ----

    match summary.kpis {
        Some(record) => {
            let mut archiver = Archiver::append_to(&results_path)
                .wrap_err("Failed to open the results file")?;
            archiver
                .serialise(record)
                .wrap_err("Failed to write the KPI record")?;

            info!("KPI record appended to {:?}", results_path);
        }
        None => warn!("No data, nothing appended to {:?}", results_path),
    }

    session.save("trajectory.json", analyser.export(summary.kpis));

    session.exit();

    Ok(())
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
