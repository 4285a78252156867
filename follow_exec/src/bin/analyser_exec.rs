//! # Analyser Executable
//!
//! Joins a distributed run as the analyser: records the vehicle trajectory from the bus and, once
//! the run is over, appends its KPIs to the results file and saves the trajectory to the session.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Result};
use log::{info, warn};
use structopt::StructOpt;

// Internal
use comms_if::{bus::client::BusClient, clock::SimClock, net::NetParams};
use follow_lib::{
    analyser::{self, Analyser},
    participant,
    path::PathType,
    ANALYSER_COMPONENT_ID,
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
#[structopt(name = "analyser_exec", about = "Trajectory analyser participant")]
struct Opt {
    /// Analyser parameter file, relative to the params directory
    #[structopt(long, default_value = "analyser.toml")]
    params: String,

    /// Network parameter file, relative to the params directory
    #[structopt(long, default_value = "net.toml")]
    net_params: String,

    #[structopt(long, default_value = "info")]
    log_level: LevelFilter,

    #[structopt(long, default_value = "2")]
    component_id: u32,

    /// Reference path: straight, sine or curved
    #[structopt(long)]
    path_type: Option<PathType>,

    /// Length along x over which the reference is sampled
    #[structopt(long)]
    path_length: Option<f64>,

    #[structopt(long)]
    kp: Option<f64>,

    #[structopt(long)]
    ki: Option<f64>,

    #[structopt(long)]
    kd: Option<f64>,

    #[structopt(long)]
    noise: Option<f64>,

    #[structopt(long)]
    disturbance: Option<f64>,

    /// File the KPI record is appended to
    #[structopt(long)]
    results_file: Option<String>,
}

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    let session =
        Session::new("analyser_exec", "sessions").wrap_err("Failed to create the session")?;

    logger_init(opt.log_level, &session).wrap_err("Failed to initialise logging")?;

    info!("Analyser Executable\n");
    info!("Running on: {}", host::get_description());
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let mut params: analyser::Params =
        util::params::load(&opt.params).wrap_err("Failed to load analyser parameters")?;
    let net_params: NetParams =
        util::params::load(&opt.net_params).wrap_err("Failed to load network parameters")?;

    if let Some(p) = opt.path_type {
        params.path_type = p;
    }
    if let Some(l) = opt.path_length {
        params.path_length = l;
    }
    if let Some(k) = opt.kp {
        params.k_p = k;
    }
    if let Some(k) = opt.ki {
        params.k_i = k;
    }
    if let Some(k) = opt.kd {
        params.k_d = k;
    }
    if let Some(n) = opt.noise {
        params.noise = n;
    }
    if let Some(d) = opt.disturbance {
        params.disturbance = d;
    }
    if let Some(f) = opt.results_file {
        params.results_file = f;
    }

    info!("Parameters loaded: {:?}", params);

    let results_path = follow_lib::results_path(&params.results_file)
        .wrap_err("Failed to resolve the results file")?;

    // ---- BUS INITIALISATION ----

    if opt.component_id != ANALYSER_COMPONENT_ID {
        info!("Joining with non-standard component id {}", opt.component_id);
    }

    let ctx = comms_if::net::zmq::Context::new();

    info!("Connecting to the coordinator at {}", net_params.connect_endpoint());
    let mut bus = BusClient::connect(&ctx, &net_params, opt.component_id)
        .wrap_err("Failed to join the run")?;

    let mut clock = SimClock::new(&bus);
    info!(
        "Joined the run as component {}: step {:.3} s, duration {:.2} s",
        bus.component_id(),
        clock.step_s(),
        clock.total_s()
    );

    // ---- MODULE INITIALISATION ----

    let mut analyser = Analyser::init(params).wrap_err("Failed to initialise the analyser")?;

    // ---- MAIN LOOP ----

    let num_cycles = participant::run(&mut bus, &mut clock, &mut analyser)
        .wrap_err("The run was interrupted")?;

    info!(
        "Run complete after {} cycles, {} samples recorded",
        num_cycles,
        analyser.trajectory().len()
    );

    drop(bus);

    // ---- FINALISATION ----

    let kpis = analyser.finalise();

    match kpis {
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

    session.save("trajectory.json", analyser.export(kpis));

    session.exit();

    Ok(())
}
