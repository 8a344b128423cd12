use std::thread;

use log::debug;
use typed_builder::TypedBuilder;

use cits_core::cell::StateReader;
use cits_core::message::{
    CaMessage, CaPayload, DenEvent, DenMessage, Indication, MsgCounter, ServiceMessage,
    VehicleReport,
};
use cits_core::mobility::{Position, Route, VehicleDynamics};
use cits_core::node::{NodeInfo, NodeRole};
use cits_core::pipeline::{Inbox, Outbox};
use cits_core::time::TimeS;
use cits_models::fleet::{self, SharedFleet};

/// Cooperative awareness service, transmit side. Armed once by the
/// application with the generation interval, then beacons periodically: an
/// OBU announces its own state, an RSU redistributes its fleet table.
#[derive(TypedBuilder)]
pub struct CaServiceTx {
    node: NodeInfo,
    position: StateReader<Position>,
    dynamics: StateReader<VehicleDynamics>,
    route: StateReader<Route>,
    fleet: SharedFleet,
    trigger: Inbox<TimeS>,
    egress: Outbox<ServiceMessage>,
}

impl CaServiceTx {
    pub fn run(self) {
        let mut interval = match self.trigger.recv() {
            Ok(interval) => interval,
            Err(_) => return,
        };
        debug!("CA generation armed with interval {}s", interval);
        let mut counter = MsgCounter::default();
        loop {
            let payload = match self.node.role {
                NodeRole::Obu => CaPayload::Vehicle(VehicleReport {
                    position: self.position.snapshot(),
                    dynamics: self.dynamics.snapshot(),
                    route: self.route.snapshot(),
                }),
                NodeRole::Rsu => CaPayload::FleetSnapshot(fleet::lock(&self.fleet).snapshot()),
            };
            let ca = CaMessage {
                node: self.node.id,
                role: self.node.role,
                msg_id: counter.next(),
                payload,
            };
            if self.egress.send(ServiceMessage::Ca(ca)).is_err() {
                return;
            }
            thread::sleep(interval.to_duration());
            if let Ok(update) = self.trigger.try_recv() {
                debug!("CA generation interval changed to {}s", update);
                interval = update;
            }
        }
    }
}

/// Cooperative awareness service, receive side.
#[derive(TypedBuilder)]
pub struct CaServiceRx {
    ingress: Inbox<CaMessage>,
    indications: Outbox<Indication>,
}

impl CaServiceRx {
    pub fn run(self) {
        for ca in self.ingress.iter() {
            debug!("CA {} received from node {}", ca.msg_id, ca.node);
            if self.indications.send(Indication::Ca(ca)).is_err() {
                return;
            }
        }
    }
}

/// Event notification service, transmit side. Stamps application events
/// with a message id and the current position fix.
#[derive(TypedBuilder)]
pub struct DenServiceTx {
    node: NodeInfo,
    position: StateReader<Position>,
    events: Inbox<DenEvent>,
    egress: Outbox<ServiceMessage>,
}

impl DenServiceTx {
    pub fn run(self) {
        let mut counter = MsgCounter::default();
        for event in self.events.iter() {
            let den = DenMessage {
                node: self.node.id,
                role: self.node.role,
                msg_id: counter.next(),
                position: self.position.snapshot(),
                event,
            };
            if self.egress.send(ServiceMessage::Den(den)).is_err() {
                return;
            }
        }
    }
}

/// Event notification service, receive side.
#[derive(TypedBuilder)]
pub struct DenServiceRx {
    ingress: Inbox<DenMessage>,
    indications: Outbox<Indication>,
}

impl DenServiceRx {
    pub fn run(self) {
        for den in self.ingress.iter() {
            debug!("DEN {} received from node {}", den.msg_id, den.node);
            if self.indications.send(Indication::Den(den)).is_err() {
                return;
            }
        }
    }
}
