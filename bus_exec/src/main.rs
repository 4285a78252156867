//! # Bus Coordinator Executable
//!
//! Owns the channels and the clock of a distributed run. Participants (`plant_exec`,
//! `ctrl_exec` and `analyser_exec`) join over zmq, then publish, receive and advance through the
//! coordinator until the run's duration is reached. The executable exits once every participant
//! has left.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Coordinator networking abstraction.
mod bus_server;

/// Barrier and channel state of the coordinator.
mod coordinator;

/// Parameters for the coordinator executable.
mod params;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Result};
use log::info;
use structopt::StructOpt;

// Internal
use bus_server::BusServer;
use comms_if::net::{zmq, NetParams};
use coordinator::Coordinator;
use params::BusExecParams;
use util::{
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// CLI
// ------------------------------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "bus_exec", about = "Lock-step bus coordinator")]
struct Opt {
    /// Coordinator parameter file, relative to the params directory
    #[structopt(long, default_value = "bus_exec.toml")]
    params: String,

    /// Network parameter file, relative to the params directory
    #[structopt(long, default_value = "net.toml")]
    net_params: String,

    #[structopt(long, default_value = "info")]
    log_level: LevelFilter,

    /// Step size in seconds
    #[structopt(long)]
    step: Option<f64>,

    /// Run duration in seconds
    #[structopt(long)]
    duration: Option<f64>,

    /// Number of participants to wait for
    #[structopt(long)]
    num_participants: Option<usize>,
}

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    let session = Session::new("bus_exec", "sessions").wrap_err("Failed to create the session")?;

    logger_init(opt.log_level, &session).wrap_err("Failed to initialise logging")?;

    info!("Bus Coordinator Executable\n");
    info!("Running on: {}", host::get_description());
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let mut params: BusExecParams =
        util::params::load(&opt.params).wrap_err("Failed to load coordinator parameters")?;
    let net_params: NetParams =
        util::params::load(&opt.net_params).wrap_err("Failed to load network parameters")?;

    if let Some(s) = opt.step {
        params.step_s = s;
    }
    if let Some(d) = opt.duration {
        params.total_s = d;
    }
    if let Some(n) = opt.num_participants {
        params.num_participants = n;
    }

    info!("Parameters loaded: {:?}", params);

    // ---- SERVER INITIALISATION ----

    let ctx = zmq::Context::new();
    let mut server =
        BusServer::new(&ctx, &net_params).wrap_err("Failed to initialise the server")?;

    info!("Listening on {}", net_params.bind_endpoint());

    let mut coordinator = Coordinator::new(&params);

    // ---- MAIN LOOP ----

    info!(
        "Waiting for {} participants to join",
        params.num_participants
    );

    while !coordinator.is_finished() {
        server
            .serve(&mut coordinator)
            .wrap_err("Failed to serve a request")?;
    }

    info!("Run complete at {} ns", coordinator.now_ns());

    drop(server);
    session.exit();

    Ok(())
}
