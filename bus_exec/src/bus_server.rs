//! # Bus Server Module
//!
//! This module abstracts over the networking side of the coordinator. Participants connect REQ
//! sockets to the server's ROUTER socket, which lets the server hold back replies (and so block
//! participants) while a barrier is pending.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    bus::msg::{BusRequest, BusResponse},
    net::{zmq, MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions},
};
use log::{trace, warn};

use crate::coordinator::{Coordinator, PeerId};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An abstraction over the networking part of the coordinator.
pub struct BusServer {
    /// ROUTER socket which accepts requests from every participant
    router: MonitoredSocket,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur in the [`BusServer`]
#[derive(thiserror::Error, Debug)]
pub enum BusServerError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not receive a request: {0}")]
    RecvError(zmq::Error),

    #[error("Could not send a response to a participant: {0}")]
    SendError(zmq::Error),

    #[error("Could not serialize the response: {0}")]
    SerializationError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl BusServer {
    /// Create a new instance of the bus server.
    ///
    /// This function will not wait for any participant before returning.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, BusServerError> {
        Self::bind(ctx, &params.bind_endpoint())
    }

    /// Create a new bus server bound to an explicit zmq endpoint.
    pub fn bind(ctx: &zmq::Context, endpoint: &str) -> Result<Self, BusServerError> {
        let router_options = SocketOptions {
            bind: true,
            block_on_first_connect: false,
            recv_timeout: 200,
            send_timeout: 1000,
            linger: 1,
            ..Default::default()
        };

        let router = MonitoredSocket::new(
            ctx,
            zmq::ROUTER,
            router_options,
            endpoint,
        )?;

        Ok(Self { router })
    }

    /// Serve at most one request, forwarding it to the coordinator and sending every response it
    /// releases.
    ///
    /// Returns `false` if no request arrived before the receive timeout.
    pub fn serve(&mut self, coordinator: &mut Coordinator) -> Result<bool, BusServerError> {
        let parts = match self.router.recv_multipart(0) {
            Ok(p) => p,
            Err(zmq::Error::EAGAIN) => return Ok(false),
            Err(e) => return Err(BusServerError::RecvError(e)),
        };

        let (peer, payload) = match split_envelope(parts) {
            Some(p) => p,
            None => {
                warn!("Dropping a message without a routing envelope");
                return Ok(true);
            }
        };

        let request: BusRequest = match serde_json::from_slice(&payload) {
            Ok(r) => r,
            Err(e) => {
                warn!("Could not deserialize request: {}", e);
                self.send_response(&peer, &BusResponse::Error(format!("Invalid request: {}", e)))?;
                return Ok(true);
            }
        };

        trace!("Request from {:?}: {:?}", peer, request);

        for (peer, response) in coordinator.handle(peer, request) {
            self.send_response(&peer, &response)?;
        }

        Ok(true)
    }

    /// Send a response to the given peer.
    fn send_response(&mut self, peer: &PeerId, response: &BusResponse) -> Result<(), BusServerError> {
        let resp_str =
            serde_json::to_string(response).map_err(BusServerError::SerializationError)?;

        self.router
            .send_multipart(reply_frames(peer, resp_str.into_bytes()), 0)
            .map_err(BusServerError::SendError)
    }
}

impl From<MonitoredSocketError> for BusServerError {
    fn from(e: MonitoredSocketError) -> Self {
        BusServerError::SocketError(e)
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Split a message received on the ROUTER socket into its routing envelope and its payload.
///
/// A correlating REQ peer's message is `[identity, request id, empty delimiter, payload]`, a plain
/// one omits the request id. Everything before the payload is the envelope.
fn split_envelope(mut parts: Vec<Vec<u8>>) -> Option<(PeerId, Vec<u8>)> {
    if parts.len() < 2 {
        return None;
    }

    let payload = parts.pop()?;
    Some((parts, payload))
}

/// Build the frames of a reply addressed to `peer`.
fn reply_frames(peer: &PeerId, payload: Vec<u8>) -> Vec<Vec<u8>> {
    peer.iter().cloned().chain(std::iter::once(payload)).collect()
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::params::BusExecParams;
    use comms_if::{
        bus::{client::BusClient, ChanId, SimBus},
        clock::SimClock,
        net::Domain,
    };

    fn coordinator(num_participants: usize, total_s: f64) -> Coordinator {
        Coordinator::new(&BusExecParams {
            step_s: 0.02,
            total_s,
            num_participants,
        })
    }

    /// Serve until a request has been handled, giving up after a few receive timeouts.
    fn serve_one(server: &mut BusServer, coordinator: &mut Coordinator) {
        for _ in 0..25 {
            if server.serve(coordinator).unwrap() {
                return;
            }
        }
        panic!("No request arrived");
    }

    fn send(req: &zmq::Socket, request: &BusRequest) {
        req.send(serde_json::to_string(request).unwrap().as_bytes(), 0)
            .unwrap();
    }

    fn recv(req: &zmq::Socket) -> BusResponse {
        serde_json::from_slice(&req.recv_bytes(0).unwrap()).unwrap()
    }

    #[test]
    fn test_envelope() {
        let parts = vec![vec![0, 1, 2], vec![0, 0, 0, 7], Vec::new(), b"{}".to_vec()];

        let (peer, payload) = split_envelope(parts.clone()).unwrap();
        assert_eq!(peer, vec![vec![0, 1, 2], vec![0, 0, 0, 7], Vec::new()]);
        assert_eq!(payload, b"{}".to_vec());

        assert_eq!(reply_frames(&peer, b"{}".to_vec()), parts);

        assert!(split_envelope(vec![b"{}".to_vec()]).is_none());
        assert!(split_envelope(Vec::new()).is_none());
    }

    /// A correlating REQ socket only accepts replies which echo its request id.
    #[test]
    fn test_correlated_req() {
        let ctx = zmq::Context::new();
        let endpoint = "inproc://bus_server_correlated_req";

        let mut server = BusServer::bind(&ctx, endpoint).unwrap();
        let mut coordinator = coordinator(1, 0.06);

        let req = ctx.socket(zmq::REQ).unwrap();
        req.set_req_correlate(true).unwrap();
        req.set_req_relaxed(true).unwrap();
        req.set_rcvtimeo(2000).unwrap();
        req.set_linger(0).unwrap();
        req.connect(endpoint).unwrap();

        send(&req, &BusRequest::Connect { component_id: 0 });
        serve_one(&mut server, &mut coordinator);
        assert_eq!(
            recv(&req),
            BusResponse::Timing {
                step_ns: 20_000_000,
                total_ns: 60_000_000,
                now_ns: 0
            }
        );

        // The second request carries a new request id
        send(&req, &BusRequest::Receive { id: 12 });
        serve_one(&mut server, &mut coordinator);
        assert_eq!(recv(&req), BusResponse::Frame(None));
    }

    /// A full run of one participant through the client.
    #[test]
    fn test_client_round_trip() {
        let ctx = zmq::Context::new();
        let params = NetParams {
            server_url: format!("bus_server_round_trip_{}", std::process::id()),
            domain: Domain::Unix,
            port: 1,
            recv_timeout_ms: 1000,
        };

        let mut server = BusServer::new(&ctx, &params).unwrap();
        let mut coordinator = coordinator(1, 0.04);

        let server_thread = std::thread::spawn(move || {
            for _ in 0..250 {
                if coordinator.is_finished() {
                    break;
                }
                server.serve(&mut coordinator).unwrap();
            }
            coordinator
        });

        let mut client = BusClient::connect(&ctx, &params, 0).unwrap();
        assert_eq!(client.step_ns(), 20_000_000);
        assert_eq!(client.total_ns(), 40_000_000);

        client.publish(ChanId::X, 1.5).unwrap();
        assert_eq!(client.receive(ChanId::X), Some(1.5));
        assert_eq!(client.receive(ChanId::Y), None);

        let mut clock = SimClock::new(&client);
        while clock.is_running(&client) {
            clock.advance(&mut client).unwrap();
        }
        assert_eq!(client.current_time_ns(), 40_000_000);

        drop(client);

        let coordinator = server_thread.join().unwrap();
        assert!(coordinator.is_finished());
        assert_eq!(coordinator.now_ns(), 40_000_000);
    }
}
