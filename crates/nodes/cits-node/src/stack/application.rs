use std::thread;

use log::{debug, info};
use serde::Deserialize;
use typed_builder::TypedBuilder;

use cits_core::cell::{StateReader, StateWriter};
use cits_core::message::{
    BusRequest, CaMessage, CaPayload, DenEvent, DenMessage, FleetReport, Indication, Outcome,
};
use cits_core::mobility::{Position, Route};
use cits_core::node::{NodeInfo, NodeRole};
use cits_core::pipeline::{Inbox, Outbox};
use cits_core::time::TimeS;
use cits_models::dispatch::Dispatcher;
use cits_models::fleet::{self, SharedFleet};

use crate::stack::vehicle::MotorCommand;

/// Distances at which the cooperative braking logic reacts to a neighbor
/// vehicle announced over CA.
#[derive(Deserialize, Debug, Clone, Copy)]
pub struct SafetySettings {
    #[serde(default = "default_warning_distance")]
    pub warning_distance: f64,
    #[serde(default = "default_emergency_distance")]
    pub emergency_distance: f64,
}

fn default_warning_distance() -> f64 {
    50.0
}

fn default_emergency_distance() -> f64 {
    20.0
}

impl Default for SafetySettings {
    fn default() -> Self {
        Self {
            warning_distance: default_warning_distance(),
            emergency_distance: default_emergency_distance(),
        }
    }
}

/// Application transmit worker. After warm-up it arms the CA service with
/// the generation interval, fires the scripted passenger request if one is
/// configured, then relays business-emitted events to the DEN service.
#[derive(TypedBuilder)]
pub struct ApplicationTx {
    node: NodeInfo,
    warmup: TimeS,
    ca_interval: TimeS,
    scripted_request: Option<BusRequest>,
    ca_trigger: Outbox<TimeS>,
    den_events: Outbox<DenEvent>,
    business_events: Inbox<DenEvent>,
}

impl ApplicationTx {
    pub fn run(self) {
        thread::sleep(self.warmup.to_duration());
        if self.ca_trigger.send(self.ca_interval).is_err() {
            return;
        }
        if let Some(request) = self.scripted_request {
            info!(
                "Node {} issuing bus request {}: {} -> {} within {}s",
                self.node, request.request_id, request.src, request.dest, request.max_arrival
            );
            if self.den_events.send(DenEvent::BusRequest(request)).is_err() {
                return;
            }
        }
        for event in self.business_events.iter() {
            if self.den_events.send(event).is_err() {
                return;
            }
        }
    }
}

/// Application receive worker. Hands everything coming up from the
/// facilities layer to the business worker; addressing decisions are made
/// there.
#[derive(TypedBuilder)]
pub struct ApplicationRx {
    indications: Inbox<Indication>,
    business_out: Outbox<Indication>,
}

impl ApplicationRx {
    pub fn run(self) {
        for indication in self.indications.iter() {
            if self.business_out.send(indication).is_err() {
                return;
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum RsuState {
    #[default]
    Idle,
    AwaitingRequest,
    Matching,
    Dispatched,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum ObuState {
    #[default]
    Idle,
    RouteAssigned,
    Acknowledging,
}

/// Business logic of the node, one worker per stack.
///
/// An RSU folds CA ingress into the fleet table and answers bus requests
/// through the dispatch engine. An OBU brakes cooperatively on close
/// neighbors, adopts routes assigned to it and acknowledges them. Messages
/// not addressed to this node, echoes of its own broadcasts, and DEN
/// messages from its own role are discarded without side effects.
#[derive(TypedBuilder)]
pub struct Business {
    node: NodeInfo,
    dispatcher: Dispatcher,
    fleet: SharedFleet,
    safety: SafetySettings,
    position: StateReader<Position>,
    route: StateWriter<Route>,
    indications: Inbox<Indication>,
    events_out: Outbox<DenEvent>,
    motor_out: Outbox<MotorCommand>,
    #[builder(default)]
    rsu_state: RsuState,
    #[builder(default)]
    obu_state: ObuState,
}

impl Business {
    pub fn run(mut self) {
        if self.node.role == NodeRole::Obu {
            for command in [
                MotorCommand::EnterVehicle,
                MotorCommand::PowerOn,
                MotorCommand::MoveForward,
            ] {
                if self.motor_out.send(command).is_err() {
                    return;
                }
            }
        }

        loop {
            if self.node.role == NodeRole::Rsu && self.rsu_state == RsuState::Idle {
                self.enter_rsu_state(RsuState::AwaitingRequest);
            }
            let indication = match self.indications.recv() {
                Ok(indication) => indication,
                Err(_) => return,
            };
            let origin = match &indication {
                Indication::Ca(ca) => ca.node,
                Indication::Den(den) => den.node,
            };
            if origin == self.node.id {
                // Echo of our own broadcast off the shared medium.
                continue;
            }
            match indication {
                Indication::Ca(ca) => self.handle_ca(ca),
                Indication::Den(den) => self.handle_den(den),
            }
        }
    }

    fn handle_ca(&mut self, ca: CaMessage) {
        match self.node.role {
            NodeRole::Rsu => {
                let now = TimeS::now();
                let mut table = fleet::lock(&self.fleet);
                match ca.payload {
                    CaPayload::Vehicle(report) => {
                        table.ingest(
                            FleetReport {
                                obu_id: ca.node,
                                position: report.position,
                                originating_rsu: self.node.id,
                                route: report.route,
                                expiry_hint: None,
                            },
                            now,
                        );
                    }
                    CaPayload::FleetSnapshot(rows) => {
                        for row in rows {
                            table.ingest(row, now);
                        }
                    }
                }
            }
            NodeRole::Obu => {
                // Cooperative braking on close neighbor vehicles.
                if let CaPayload::Vehicle(report) = ca.payload {
                    let own = self.position.snapshot().point;
                    let distance = own.distance(&report.position.point);
                    if distance < self.safety.emergency_distance {
                        info!(
                            "Node {} at emergency distance {:.1} of node {}, stopping",
                            self.node, distance, ca.node
                        );
                        let _ = self.motor_out.send(MotorCommand::Stop);
                    } else if distance < self.safety.warning_distance {
                        debug!(
                            "Node {} at warning distance {:.1} of node {}, slowing down",
                            self.node, distance, ca.node
                        );
                        let _ = self.motor_out.send(MotorCommand::MoveSlower);
                    }
                }
            }
        }
    }

    fn handle_den(&mut self, den: DenMessage) {
        if den.role == self.node.role {
            debug!(
                "Node {} ignoring DEN {} from own role {}",
                self.node, den.msg_id, den.role
            );
            return;
        }
        match self.node.role {
            NodeRole::Rsu => self.handle_den_at_rsu(den),
            NodeRole::Obu => self.handle_den_at_obu(den),
        }
    }

    fn handle_den_at_rsu(&mut self, den: DenMessage) {
        match den.event {
            DenEvent::BusRequest(request) => {
                self.enter_rsu_state(RsuState::Matching);
                let snapshot = fleet::lock(&self.fleet).snapshot();
                match self.dispatcher.choose_bus(&snapshot, &request) {
                    Some(assignment) => {
                        info!(
                            "Request {}: dispatching bus {}, estimated arrival {}s",
                            request.request_id, assignment.bus_id, assignment.estimated_arrival
                        );
                        let event = DenEvent::RouteAssignment {
                            bus_id: assignment.bus_id,
                            route: assignment.route,
                            estimated_arrival: assignment.estimated_arrival,
                        };
                        if self.events_out.send(event).is_err() {
                            return;
                        }
                        self.enter_rsu_state(RsuState::Dispatched);
                    }
                    None => {
                        // Infeasible requests are never answered; the
                        // requester times out on its own terms.
                        info!("Request {}: no available bus", request.request_id);
                        self.enter_rsu_state(RsuState::AwaitingRequest);
                    }
                }
            }
            DenEvent::RequestOutcome { dest_rsu, status } => {
                if dest_rsu != self.node.id {
                    return;
                }
                match status {
                    Outcome::Success => info!("Bus accepted the assignment"),
                    Outcome::Failure => info!("Bus rejected the assignment"),
                }
                self.enter_rsu_state(RsuState::Idle);
            }
            DenEvent::RouteAssignment { .. } => {}
        }
    }

    fn handle_den_at_obu(&mut self, den: DenMessage) {
        if let DenEvent::RouteAssignment {
            bus_id,
            route,
            estimated_arrival,
        } = den.event
        {
            if bus_id != self.node.id {
                debug!(
                    "Node {} ignoring assignment addressed to bus {}",
                    self.node, bus_id
                );
                return;
            }
            self.enter_obu_state(ObuState::RouteAssigned);
            info!(
                "Node {} adopting assigned route, estimated arrival {}s",
                self.node, estimated_arrival
            );
            self.route.store(route);
            self.enter_obu_state(ObuState::Acknowledging);
            let ack = DenEvent::RequestOutcome {
                dest_rsu: den.node,
                status: Outcome::Success,
            };
            let _ = self.events_out.send(ack);
            self.enter_obu_state(ObuState::Idle);
        }
    }

    fn enter_rsu_state(&mut self, state: RsuState) {
        debug!("Node {}: {:?} -> {:?}", self.node, self.rsu_state, state);
        self.rsu_state = state;
    }

    fn enter_obu_state(&mut self, state: ObuState) {
        debug!("Node {}: {:?} -> {:?}", self.node, self.obu_state, state);
        self.obu_state = state;
    }
}

/// Continuously evicts expired fleet entries, independent of ingestion.
#[derive(TypedBuilder)]
pub struct FleetPrune {
    fleet: SharedFleet,
    interval: TimeS,
}

impl FleetPrune {
    pub fn run(self) {
        loop {
            thread::sleep(self.interval.to_duration());
            let removed = fleet::lock(&self.fleet).prune(TimeS::now());
            if removed > 0 {
                debug!("Pruned {} expired fleet entries", removed);
            }
        }
    }
}
