use std::fmt;

use serde::{Deserialize, Serialize};

use crate::mobility::{Point, Position, Route, VehicleDynamics};
use crate::node::{NodeId, NodeRole};
use crate::time::TimeS;

/// Per-node message sequence number. Duplicate suppression for disseminated
/// messages keys on `(sender, msg_id)`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MsgId(u64);

impl fmt::Display for MsgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for MsgId {
    fn from(f: u64) -> Self {
        Self(f)
    }
}

/// Hands out message IDs in send order. Each transmitting worker owns one.
#[derive(Debug, Default)]
pub struct MsgCounter(u64);

impl MsgCounter {
    pub fn next(&mut self) -> MsgId {
        self.0 += 1;
        MsgId(self.0)
    }
}

/// Link-layer liveness beacon, sent outside the geonetworking path.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Beacon {
    pub node: NodeId,
    pub position: Position,
}

/// What a node announces about itself in a cooperative awareness message.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct VehicleReport {
    pub position: Position,
    pub dynamics: VehicleDynamics,
    pub route: Route,
}

/// One row of fleet knowledge on the wire. RSUs redistribute their whole
/// table as a sequence of these; the expiry hint carries the originating
/// RSU's freshness judgement so the receiver does not have to guess.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FleetReport {
    pub obu_id: NodeId,
    pub position: Position,
    pub originating_rsu: NodeId,
    pub route: Route,
    pub expiry_hint: Option<TimeS>,
}

/// CA payload differs by role: an OBU reports itself, an RSU redistributes
/// the fleet knowledge it has accumulated. An RSU announces no position of
/// its own.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum CaPayload {
    Vehicle(VehicleReport),
    FleetSnapshot(Vec<FleetReport>),
}

/// Cooperative awareness message. Periodic, single-hop.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CaMessage {
    pub node: NodeId,
    pub role: NodeRole,
    pub msg_id: MsgId,
    pub payload: CaPayload,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

/// A passenger's transport request, resolved by an RSU's dispatch engine.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct BusRequest {
    pub src: Point,
    pub dest: Point,
    pub max_arrival: TimeS,
    pub request_id: u64,
}

/// The event carried by a DEN message.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum DenEvent {
    /// OBU/user to RSU: find me a bus.
    BusRequest(BusRequest),
    /// RSU to OBU: the chosen bus adopts the spliced route.
    RouteAssignment {
        bus_id: NodeId,
        route: Route,
        estimated_arrival: TimeS,
    },
    /// OBU to RSU: whether the assignment was accepted.
    RequestOutcome { dest_rsu: NodeId, status: Outcome },
}

/// Decentralized environmental notification. Event-driven, disseminated
/// within a region of interest.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DenMessage {
    pub node: NodeId,
    pub role: NodeRole,
    pub msg_id: MsgId,
    pub position: Position,
    pub event: DenEvent,
}

/// Geographic scope within which a disseminated message stays relevant.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Roi {
    pub center: Point,
    pub radius: f64,
}

impl Roi {
    pub fn contains(&self, point: &Point) -> bool {
        self.center.distance(point) <= self.radius
    }
}

/// Network-layer wrapper. CA messages take the single-hop path, DEN
/// messages the dissemination path with a hop budget and a region of
/// interest.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum GeoPacket {
    Single(CaMessage),
    Dissemination {
        den: DenMessage,
        hops_left: u8,
        roi: Roi,
    },
}

/// Link-layer unit. Beacons and data travel the same multicast medium but
/// feed different sub-streams on reception.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Frame {
    Beacon(Beacon),
    Data(GeoPacket),
}

/// Egress handed from the facilities services to the network layer.
#[derive(Clone, Debug)]
pub enum ServiceMessage {
    Ca(CaMessage),
    Den(DenMessage),
}

/// Ingress handed from the facilities services up to the application layer.
#[derive(Clone, Debug)]
pub enum Indication {
    Ca(CaMessage),
    Den(DenMessage),
}
