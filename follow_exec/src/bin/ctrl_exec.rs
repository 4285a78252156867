//! # Controller Executable
//!
//! Joins a distributed run as the controller: reads the vehicle pose from the bus every step and
//! publishes speed and yaw rate demands which track the reference path.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Result};
use log::info;
use structopt::StructOpt;

// Internal
use comms_if::{bus::client::BusClient, clock::SimClock, net::NetParams};
use follow_lib::{ctrl::{self, Ctrl}, participant, path::PathType, CTRL_COMPONENT_ID};
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
#[structopt(name = "ctrl_exec", about = "Path tracking controller participant")]
struct Opt {
    /// Controller parameter file, relative to the params directory
    #[structopt(long, default_value = "ctrl.toml")]
    params: String,

    /// Network parameter file, relative to the params directory
    #[structopt(long, default_value = "net.toml")]
    net_params: String,

    #[structopt(long, default_value = "info")]
    log_level: LevelFilter,

    #[structopt(long, default_value = "1")]
    component_id: u32,

    /// Reference path: straight, sine or curved
    #[structopt(long)]
    path_type: Option<PathType>,

    #[structopt(long)]
    kp_lat: Option<f64>,

    #[structopt(long)]
    kp_head: Option<f64>,

    #[structopt(long)]
    kd_lat: Option<f64>,

    #[structopt(long)]
    v_nom: Option<f64>,

    /// Archive a status report every step
    #[structopt(long)]
    archive: bool,
}

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    let session = Session::new("ctrl_exec", "sessions").wrap_err("Failed to create the session")?;

    logger_init(opt.log_level, &session).wrap_err("Failed to initialise logging")?;

    info!("Controller Executable\n");
    info!("Running on: {}", host::get_description());
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let mut params: ctrl::Params =
        util::params::load(&opt.params).wrap_err("Failed to load controller parameters")?;
    let net_params: NetParams =
        util::params::load(&opt.net_params).wrap_err("Failed to load network parameters")?;

    if let Some(p) = opt.path_type {
        params.path_type = p;
    }
    if let Some(k) = opt.kp_lat {
        params.k_p_lat = k;
    }
    if let Some(k) = opt.kp_head {
        params.k_p_head = k;
    }
    if let Some(k) = opt.kd_lat {
        params.k_d_lat = k;
    }
    if let Some(v) = opt.v_nom {
        params.v_nom = v;
    }

    info!("Parameters loaded: {:?}", params);

    // ---- BUS INITIALISATION ----

    if opt.component_id != CTRL_COMPONENT_ID {
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

    let mut ctrl =
        Ctrl::init((params, clock.step_s())).wrap_err("Failed to initialise the controller")?;

    if opt.archive {
        ctrl.archive_reports(
            Archiver::from_path(&session, "ctrl/status_report.csv")
                .wrap_err("Failed to create the status report archive")?,
        );
    }

    // ---- MAIN LOOP ----

    let num_cycles =
        participant::run(&mut bus, &mut clock, &mut ctrl).wrap_err("The run was interrupted")?;

    info!("Run complete after {} cycles", num_cycles);

    drop(bus);
    session.exit();

    Ok(())
}
