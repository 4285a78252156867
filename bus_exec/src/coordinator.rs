//! # Coordinator
//!
//! Transport independent state of the bus coordinator: the channel slots, the run's clock and the
//! two barriers which keep participants in lock-step.
//!
//! - The start barrier holds every `Connect` until the expected number of participants joined.
//! - The step barrier holds every `Advance` until all connected participants are waiting on one.
//!   Time then moves to the earliest requested target and the participants which reached their
//!   target are released.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::collections::HashMap;

use comms_if::{
    bus::msg::{BusRequest, BusResponse},
    clock::secs_to_ns,
};
use log::{debug, info, warn};

use crate::params::BusExecParams;

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// Routing envelope of a peer, used to address responses.
///
/// These are every frame of a request before its payload: the transport identity, the request id
/// added by correlating REQ sockets and the empty delimiter. Responses must carry the envelope back
/// unchanged.
pub type PeerId = Vec<Vec<u8>>;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug)]
pub struct Coordinator {
    step_ns: u64,
    total_ns: u64,
    now_ns: u64,

    num_participants: usize,

    /// Set once the start barrier has been released
    started: bool,

    /// Latest raw frame of each channel
    slots: HashMap<u32, Vec<u8>>,

    /// Envelope each connected component joined with
    connected: HashMap<u32, PeerId>,

    /// Peers waiting on the start barrier
    pending_connect: Vec<PeerId>,

    /// Peer and target time of each component waiting on the step barrier
    pending_advance: HashMap<u32, (PeerId, u64)>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Coordinator {
    pub fn new(params: &BusExecParams) -> Self {
        Self {
            step_ns: secs_to_ns(params.step_s),
            total_ns: secs_to_ns(params.total_s),
            now_ns: 0,
            num_participants: params.num_participants,
            started: false,
            slots: HashMap::new(),
            connected: HashMap::new(),
            pending_connect: Vec::new(),
            pending_advance: HashMap::new(),
        }
    }

    /// Current simulated time.
    pub fn now_ns(&self) -> u64 {
        self.now_ns
    }

    /// True once the run has started, reached its end and every participant has left.
    pub fn is_finished(&self) -> bool {
        self.started && self.now_ns >= self.total_ns && self.connected.is_empty()
    }

    /// Handle a request from `peer`, returning the responses to send.
    ///
    /// A request may release responses to other peers, and a held request produces no response
    /// for now.
    pub fn handle(&mut self, peer: PeerId, request: BusRequest) -> Vec<(PeerId, BusResponse)> {
        match request {
            BusRequest::Connect { component_id } => self.connect(peer, component_id),
            BusRequest::Publish { id, frame } => match base64::decode(&frame) {
                Ok(bytes) => {
                    self.slots.insert(id, bytes);
                    vec![(peer, BusResponse::Ack)]
                }
                Err(e) => {
                    warn!("Invalid frame published on channel {}: {}", id, e);
                    vec![(peer, BusResponse::Error(format!("Invalid frame: {}", e)))]
                }
            },
            BusRequest::Receive { id } => {
                let frame = self.slots.get(&id).map(base64::encode);
                vec![(peer, BusResponse::Frame(frame))]
            }
            BusRequest::Advance {
                component_id,
                delta_ns,
            } => self.advance(peer, component_id, delta_ns),
            BusRequest::Disconnect { component_id } => {
                if self.connected.remove(&component_id).is_some() {
                    info!("Component {} left at {} ns", component_id, self.now_ns);
                }
                self.pending_advance.remove(&component_id);

                let mut responses = vec![(peer, BusResponse::Ack)];
                responses.extend(self.try_release());
                responses
            }
        }
    }

    fn timing(&self) -> BusResponse {
        BusResponse::Timing {
            step_ns: self.step_ns,
            total_ns: self.total_ns,
            now_ns: self.now_ns,
        }
    }

    fn connect(&mut self, peer: PeerId, component_id: u32) -> Vec<(PeerId, BusResponse)> {
        if self.connected.insert(component_id, peer.clone()).is_some() {
            warn!("Component {} joined again, replacing its peer", component_id);
        }
        info!(
            "Component {} joined ({}/{})",
            component_id,
            self.connected.len(),
            self.num_participants
        );

        if self.started {
            return vec![(peer, self.timing())];
        }

        self.pending_connect.push(peer);

        if self.connected.len() < self.num_participants {
            return Vec::new();
        }

        info!("All participants joined, starting the run");
        self.started = true;

        let timing = self.timing();
        self.pending_connect
            .drain(..)
            .map(|p| (p, timing.clone()))
            .collect()
    }

    fn advance(
        &mut self,
        peer: PeerId,
        component_id: u32,
        delta_ns: i64,
    ) -> Vec<(PeerId, BusResponse)> {
        if !self.connected.contains_key(&component_id) {
            return vec![(
                peer,
                BusResponse::Error(format!("Component {} has not joined", component_id)),
            )];
        }

        if delta_ns <= 0 {
            return vec![(peer, BusResponse::Time { now_ns: self.now_ns })];
        }

        let target_ns = self.now_ns.saturating_add(delta_ns as u64);
        self.pending_advance.insert(component_id, (peer, target_ns));

        self.try_release()
    }

    /// Release the step barrier if every connected participant is waiting on it.
    fn try_release(&mut self) -> Vec<(PeerId, BusResponse)> {
        if !self.started || self.pending_advance.is_empty() {
            return Vec::new();
        }

        let all_waiting = self
            .connected
            .keys()
            .all(|id| self.pending_advance.contains_key(id));
        if !all_waiting {
            return Vec::new();
        }

        if let Some(min_target) = self.pending_advance.values().map(|(_, t)| *t).min() {
            self.now_ns = self.now_ns.max(min_target);
        }

        debug!("Time advanced to {} ns", self.now_ns);

        let now_ns = self.now_ns;
        let released: Vec<u32> = self
            .pending_advance
            .iter()
            .filter(|(_, (_, target))| *target <= now_ns)
            .map(|(id, _)| *id)
            .collect();

        released
            .into_iter()
            .filter_map(|id| self.pending_advance.remove(&id))
            .map(|(peer, _)| (peer, BusResponse::Time { now_ns }))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::bus::msg::{frame_from_b64, frame_to_b64};

    fn coordinator(num_participants: usize) -> Coordinator {
        Coordinator::new(&BusExecParams {
            step_s: 0.02,
            total_s: 0.06,
            num_participants,
        })
    }

    fn peer(id: u8) -> PeerId {
        vec![vec![id], Vec::new()]
    }

    fn advance(c: &mut Coordinator, id: u8, delta_ns: i64) -> Vec<(PeerId, BusResponse)> {
        c.handle(
            peer(id),
            BusRequest::Advance {
                component_id: id as u32,
                delta_ns,
            },
        )
    }

    fn join_all(c: &mut Coordinator, n: u8) {
        for id in 0..n {
            c.handle(peer(id), BusRequest::Connect { component_id: id as u32 });
        }
    }

    #[test]
    fn test_start_barrier() {
        let mut c = coordinator(2);

        assert!(c
            .handle(peer(0), BusRequest::Connect { component_id: 0 })
            .is_empty());

        let mut released = c.handle(peer(1), BusRequest::Connect { component_id: 1 });
        released.sort_by(|a, b| a.0.cmp(&b.0));

        let timing = BusResponse::Timing {
            step_ns: 20_000_000,
            total_ns: 60_000_000,
            now_ns: 0,
        };
        assert_eq!(released, vec![(peer(0), timing.clone()), (peer(1), timing)]);

        // A late joiner is answered straight away
        let late = c.handle(peer(5), BusRequest::Connect { component_id: 5 });
        assert_eq!(late.len(), 1);
    }

    #[test]
    fn test_channels() {
        let mut c = coordinator(1);

        assert_eq!(
            c.handle(peer(0), BusRequest::Receive { id: 16 }),
            vec![(peer(0), BusResponse::Frame(None))]
        );

        let published = c.handle(
            peer(0),
            BusRequest::Publish {
                id: 16,
                frame: frame_to_b64(1.25),
            },
        );
        assert_eq!(published, vec![(peer(0), BusResponse::Ack)]);

        // An invalid frame is rejected and leaves the slot alone
        let rejected = c.handle(
            peer(0),
            BusRequest::Publish {
                id: 16,
                frame: String::from("%%%"),
            },
        );
        assert!(matches!(rejected[0].1, BusResponse::Error(_)));

        match &c.handle(peer(0), BusRequest::Receive { id: 16 })[0].1 {
            BusResponse::Frame(Some(f)) => assert_eq!(frame_from_b64(f), Some(1.25)),
            r => panic!("Unexpected response {:?}", r),
        }
    }

    #[test]
    fn test_step_barrier() {
        let mut c = coordinator(2);
        join_all(&mut c, 2);

        // The first participant waits for the second
        assert!(advance(&mut c, 0, 20_000_000).is_empty());
        assert_eq!(c.now_ns(), 0);

        let mut released = advance(&mut c, 1, 20_000_000);
        released.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(
            released,
            vec![
                (peer(0), BusResponse::Time { now_ns: 20_000_000 }),
                (peer(1), BusResponse::Time { now_ns: 20_000_000 }),
            ]
        );
    }

    #[test]
    fn test_uneven_targets() {
        let mut c = coordinator(2);
        join_all(&mut c, 2);

        // Participant 1 asks for two steps at once, only participant 0 is released at first
        assert!(advance(&mut c, 1, 40_000_000).is_empty());
        let released = advance(&mut c, 0, 20_000_000);
        assert_eq!(released, vec![(peer(0), BusResponse::Time { now_ns: 20_000_000 })]);

        let released = advance(&mut c, 0, 20_000_000);
        assert_eq!(released.len(), 2);
        assert_eq!(c.now_ns(), 40_000_000);
    }

    #[test]
    fn test_non_positive_advance() {
        let mut c = coordinator(2);
        join_all(&mut c, 2);

        assert_eq!(
            advance(&mut c, 0, 0),
            vec![(peer(0), BusResponse::Time { now_ns: 0 })]
        );
        assert_eq!(
            advance(&mut c, 0, -5),
            vec![(peer(0), BusResponse::Time { now_ns: 0 })]
        );

        // Unknown components are refused
        assert!(matches!(advance(&mut c, 7, 10)[0].1, BusResponse::Error(_)));
    }

    #[test]
    fn test_disconnect_releases_barrier() {
        let mut c = coordinator(2);
        join_all(&mut c, 2);

        assert!(advance(&mut c, 0, 20_000_000).is_empty());

        let responses = c.handle(peer(1), BusRequest::Disconnect { component_id: 1 });
        assert_eq!(
            responses,
            vec![
                (peer(1), BusResponse::Ack),
                (peer(0), BusResponse::Time { now_ns: 20_000_000 }),
            ]
        );
    }

    #[test]
    fn test_finishes() {
        let mut c = coordinator(1);
        assert!(!c.is_finished());

        join_all(&mut c, 1);
        for _ in 0..3 {
            assert_eq!(advance(&mut c, 0, 20_000_000).len(), 1);
        }
        assert!(!c.is_finished());

        c.handle(peer(0), BusRequest::Disconnect { component_id: 0 });
        assert!(c.is_finished());
    }
}
