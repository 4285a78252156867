//! # Plant Simulator Executable
//!
//! Joins a distributed run as the plant: integrates the vehicle kinematics from the latest
//! command on the bus and publishes the resulting pose every step.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Result};
use log::info;
use structopt::StructOpt;

// Internal
use comms_if::{bus::client::BusClient, clock::SimClock, net::NetParams};
use follow_lib::{
    participant,
    plant::{self, Plant},
    PLANT_COMPONENT_ID,
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
#[structopt(name = "plant_exec", about = "Vehicle plant simulator participant")]
struct Opt {
    /// Plant parameter file, relative to the params directory
    #[structopt(long, default_value = "plant.toml")]
    params: String,

    /// Network parameter file, relative to the params directory
    #[structopt(long, default_value = "net.toml")]
    net_params: String,

    #[structopt(long, default_value = "info")]
    log_level: LevelFilter,

    #[structopt(long, default_value = "0")]
    component_id: u32,

    /// Standard deviation of the command noise
    #[structopt(long)]
    noise: Option<f64>,

    /// Magnitude of the yaw rate disturbance
    #[structopt(long)]
    disturbance: Option<f64>,

    /// Per step probability of a disturbance
    #[structopt(long)]
    dist_prob: Option<f64>,

    /// Disturbance duration in seconds
    #[structopt(long)]
    dist_duration: Option<f64>,

    /// Initial x position in metres
    #[structopt(long, allow_hyphen_values = true)]
    init_x: Option<f64>,

    /// Initial y position in metres
    #[structopt(long, allow_hyphen_values = true)]
    init_y: Option<f64>,

    /// Initial heading in radians
    #[structopt(long, allow_hyphen_values = true)]
    init_theta: Option<f64>,

    /// Seed for a reproducible run
    #[structopt(long)]
    seed: Option<u64>,

    /// Archive a status report every step
    #[structopt(long)]
    archive: bool,
}

impl Opt {
    /// Override the loaded parameters with those given on the command line.
    fn apply(&self, params: &mut plant::Params) {
        if let Some(n) = self.noise {
            params.noise_std = n;
        }
        if let Some(d) = self.disturbance {
            params.disturbance = d;
        }
        if let Some(p) = self.dist_prob {
            params.dist_prob = p;
        }
        if let Some(d) = self.dist_duration {
            params.dist_duration_s = d;
        }
        if let Some(x) = self.init_x {
            params.init_x = x;
        }
        if let Some(y) = self.init_y {
            params.init_y = y;
        }
        if let Some(t) = self.init_theta {
            params.init_theta = t;
        }
        if self.seed.is_some() {
            params.seed = self.seed;
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
        Session::new("plant_exec", "sessions").wrap_err("Failed to create the session")?;

    logger_init(opt.log_level, &session).wrap_err("Failed to initialise logging")?;

    info!("Plant Simulator Executable\n");
    info!("Running on: {}", host::get_description());
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let mut params: plant::Params =
        util::params::load(&opt.params).wrap_err("Failed to load plant parameters")?;
    let net_params: NetParams =
        util::params::load(&opt.net_params).wrap_err("Failed to load network parameters")?;

    opt.apply(&mut params);

    info!("Parameters loaded: {:?}", params);

    // ---- BUS INITIALISATION ----

    if opt.component_id != PLANT_COMPONENT_ID {
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

    let rng = params.rng();
    let mut plant: Plant = Plant::init((params, clock.step_s(), rng))
        .wrap_err("Failed to initialise the plant")?;

    if opt.archive {
        plant.archive_reports(
            Archiver::from_path(&session, "plant/status_report.csv")
                .wrap_err("Failed to create the status report archive")?,
        );
    }

    // ---- MAIN LOOP ----

    let num_cycles =
        participant::run(&mut bus, &mut clock, &mut plant).wrap_err("The run was interrupted")?;

    info!(
        "Run complete after {} cycles, final pose {:?}",
        num_cycles,
        plant.pose()
    );

    session.save("final_pose.json", *plant.pose());

    drop(bus);
    session.exit();

    Ok(())
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
