//! # Bus Client
//!
//! The BusClient connects a participant to the bus coordinator over zmq and implements [`SimBus`]
//! on top of the coordinator's request/response protocol (see [`super::msg`]).
//!
//! Publish and receive requests are bounded by the receive timeout in [`NetParams`]. Connect and
//! advance requests wait for the coordinator however long it takes.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, trace, warn};

use super::{
    msg::{frame_from_b64, frame_to_b64, BusRequest, BusResponse},
    BusError, ChanId, SimBus,
};
use crate::net::{zmq, MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A participant's connection to the bus coordinator.
pub struct BusClient {
    /// Request-response socket to the coordinator
    reqrep: MonitoredSocket,

    component_id: u32,

    step_ns: u64,

    total_ns: u64,

    /// Simulated time as of the last reply from the coordinator
    now_ns: u64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum BusClientError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not send a request to the coordinator: {0}")]
    SendError(zmq::Error),

    #[error("Could not recieve a response from the coordinator: {0}")]
    RecvError(zmq::Error),

    #[error("Could not serialize the request: {0}")]
    SerializationError(serde_json::Error),

    #[error("Could not deserialize the response from the coordinator: {0}")]
    DeserializeError(serde_json::Error),

    #[error("The coordinator responed with a message which was not valid UTF-8")]
    NonUtf8Response,

    #[error("Unexpected response from the coordinator: {0:?}")]
    UnexpectedResponse(BusResponse),

    #[error("The coordinator returned an error: {0}")]
    CoordinatorError(String),
}

/// How long to wait for a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wait {
    /// Give up after the socket's receive timeout
    Timeout,

    /// Keep waiting until the coordinator responds
    Forever,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl BusClient {
    /// Connect to the coordinator and join the run.
    ///
    /// Blocks until the coordinator has released the start barrier, i.e. until every expected
    /// participant has joined.
    pub fn connect(
        ctx: &zmq::Context,
        params: &NetParams,
        component_id: u32,
    ) -> Result<Self, BusClientError> {
        let reqrep_opts = SocketOptions {
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 1,
            recv_timeout: params.recv_timeout_ms,
            send_timeout: params.recv_timeout_ms,
            req_correlate: true,
            req_relaxed: true,
            ..Default::default()
        };

        let reqrep = MonitoredSocket::new(
            ctx,
            zmq::REQ,
            reqrep_opts,
            &params.connect_endpoint(),
        )
        .map_err(BusClientError::SocketError)?;

        let mut client = Self {
            reqrep,
            component_id,
            step_ns: 0,
            total_ns: 0,
            now_ns: 0,
        };

        match client.request(&BusRequest::Connect { component_id }, Wait::Forever)? {
            BusResponse::Timing {
                step_ns,
                total_ns,
                now_ns,
            } => {
                client.step_ns = step_ns;
                client.total_ns = total_ns;
                client.now_ns = now_ns;
            }
            BusResponse::Error(e) => return Err(BusClientError::CoordinatorError(e)),
            r => return Err(BusClientError::UnexpectedResponse(r)),
        }

        Ok(client)
    }

    /// The id this client joined the run with.
    pub fn component_id(&self) -> u32 {
        self.component_id
    }

    /// Send a request and wait for the response.
    fn request(&self, req: &BusRequest, wait: Wait) -> Result<BusResponse, BusClientError> {
        let req_str = serde_json::to_string(req).map_err(BusClientError::SerializationError)?;

        self.reqrep
            .send(req_str.as_str(), 0)
            .map_err(BusClientError::SendError)?;

        loop {
            match self.reqrep.recv_string(0) {
                Ok(Ok(s)) => {
                    return serde_json::from_str(&s).map_err(BusClientError::DeserializeError)
                }
                Ok(Err(_)) => return Err(BusClientError::NonUtf8Response),
                Err(zmq::Error::EAGAIN) if wait == Wait::Forever => {
                    trace!(
                        "Still waiting for the coordinator to respond to {:?} (connected: {})",
                        req,
                        self.reqrep.connected()
                    );
                    continue;
                }
                Err(e) => return Err(BusClientError::RecvError(e)),
            }
        }
    }
}

impl SimBus for BusClient {
    fn publish(&mut self, id: ChanId, value: f64) -> Result<(), BusError> {
        let req = BusRequest::Publish {
            id: id.0,
            frame: frame_to_b64(value),
        };

        match self.request(&req, Wait::Timeout)? {
            BusResponse::Ack => Ok(()),
            BusResponse::Error(e) => Err(BusError::Rejected(e)),
            r => Err(BusError::UnexpectedResponse(format!("{:?}", r))),
        }
    }

    fn receive(&mut self, id: ChanId) -> Option<f64> {
        match self.request(&BusRequest::Receive { id: id.0 }, Wait::Timeout) {
            Ok(BusResponse::Frame(Some(b64))) => {
                let value = frame_from_b64(&b64);
                if value.is_none() {
                    debug!("Malformed frame on channel {}", id);
                }
                value
            }
            Ok(BusResponse::Frame(None)) => None,
            Ok(r) => {
                debug!("Unexpected response to receive on channel {}: {:?}", id, r);
                None
            }
            Err(e) => {
                debug!("Could not receive channel {}: {}", id, e);
                None
            }
        }
    }

    fn step_ns(&self) -> u64 {
        self.step_ns
    }

    fn total_ns(&self) -> u64 {
        self.total_ns
    }

    fn current_time_ns(&self) -> u64 {
        self.now_ns
    }

    fn advance_by(&mut self, delta_ns: i64) -> Result<(), BusError> {
        // Drift can leave us at or past the target already
        if delta_ns <= 0 {
            return Ok(());
        }

        let req = BusRequest::Advance {
            component_id: self.component_id,
            delta_ns,
        };

        match self.request(&req, Wait::Forever)? {
            BusResponse::Time { now_ns } => {
                self.now_ns = now_ns;
                Ok(())
            }
            BusResponse::Error(e) => Err(BusError::Rejected(e)),
            r => Err(BusError::UnexpectedResponse(format!("{:?}", r))),
        }
    }
}

impl Drop for BusClient {
    fn drop(&mut self) {
        let req = BusRequest::Disconnect {
            component_id: self.component_id,
        };

        if let Err(e) = self.request(&req, Wait::Timeout) {
            warn!("Could not disconnect from the coordinator: {}", e);
        }
    }
}

impl From<BusClientError> for BusError {
    fn from(e: BusClientError) -> Self {
        BusError::Transport(e.to_string())
    }
}
