use std::thread;

use hashbrown::HashMap;
use log::debug;
use typed_builder::TypedBuilder;

use cits_core::cell::StateReader;
use cits_core::message::{Beacon, CaMessage, DenMessage, Frame, GeoPacket, Roi, ServiceMessage};
use cits_core::mobility::Position;
use cits_core::node::NodeId;
use cits_core::pipeline::{Inbox, Outbox};
use cits_core::time::TimeS;
use cits_models::geonet::DenControl;

/// Egress side of the network layer. CA messages take the single-hop path;
/// DEN messages are wrapped for dissemination with a hop budget and a
/// region of interest centered on the sender's position.
#[derive(TypedBuilder)]
pub struct GeonetTx {
    egress: Inbox<ServiceMessage>,
    link_out: Outbox<Frame>,
    hop_limit: u8,
    roi_radius: f64,
}

impl GeonetTx {
    pub fn run(self) {
        for message in self.egress.iter() {
            let frame = match message {
                ServiceMessage::Ca(ca) => Frame::Data(GeoPacket::Single(ca)),
                ServiceMessage::Den(den) => {
                    let roi = Roi {
                        center: den.position.point,
                        radius: self.roi_radius,
                    };
                    Frame::Data(GeoPacket::Dissemination {
                        hops_left: self.hop_limit,
                        roi,
                        den,
                    })
                }
            };
            if self.link_out.send(frame).is_err() {
                return;
            }
        }
    }
}

/// Ingress side of the network layer. Demultiplexes by message class into
/// the CA and DEN facilities inboxes. Disseminated messages pass duplicate
/// suppression and the region-of-interest check, and surviving ones are
/// re-broadcast with a decremented hop count.
#[derive(TypedBuilder)]
pub struct GeonetRx {
    control: DenControl,
    position: StateReader<Position>,
    ingress: Inbox<GeoPacket>,
    ca_out: Outbox<CaMessage>,
    den_out: Outbox<DenMessage>,
    link_out: Outbox<Frame>,
}

impl GeonetRx {
    pub fn run(mut self) {
        for packet in self.ingress.iter() {
            match packet {
                GeoPacket::Single(ca) => {
                    if self.ca_out.send(ca).is_err() {
                        return;
                    }
                }
                GeoPacket::Dissemination {
                    den,
                    hops_left,
                    roi,
                } => {
                    let own_point = self.position.snapshot().point;
                    let decision =
                        self.control
                            .on_dissemination(&den, hops_left, &roi, &own_point);
                    if let Some(forward) = decision.forward {
                        let _ = self.link_out.send(Frame::Data(forward));
                    }
                    if decision.deliver && self.den_out.send(den).is_err() {
                        return;
                    }
                }
            }
        }
    }
}

/// Periodic link-layer beacon carrying the node's last position fix.
#[derive(TypedBuilder)]
pub struct BeaconTx {
    node: NodeId,
    interval: TimeS,
    position: StateReader<Position>,
    link_out: Outbox<Frame>,
}

impl BeaconTx {
    pub fn run(self) {
        loop {
            let beacon = Beacon {
                node: self.node,
                position: self.position.snapshot(),
            };
            if self.link_out.send(Frame::Beacon(beacon)).is_err() {
                return;
            }
            thread::sleep(self.interval.to_duration());
        }
    }
}

/// Consumes the beacon sub-stream and keeps a last-seen stamp per neighbor.
/// A neighbor that stays silent past the liveness window is swept out and
/// logged as lost, so the map never accumulates departed nodes.
#[derive(TypedBuilder)]
pub struct BeaconRx {
    node: NodeId,
    ingress: Inbox<Beacon>,
    #[builder(default = TimeS::new(5))]
    liveness_window: TimeS,
    #[builder(default)]
    neighbors: HashMap<NodeId, TimeS>,
}

impl BeaconRx {
    pub fn run(mut self) {
        while let Ok(beacon) = self.ingress.recv() {
            let now = TimeS::now();
            if self.observe(&beacon, now) {
                debug!(
                    "Neighbor {} appeared at {}",
                    beacon.node, beacon.position.point
                );
            }
            for lost in self.sweep(now) {
                debug!("Neighbor {} fell silent", lost);
            }
        }
    }

    /// Records the sighting; true for a neighbor not currently tracked.
    fn observe(&mut self, beacon: &Beacon, now: TimeS) -> bool {
        if beacon.node == self.node {
            return false;
        }
        self.neighbors.insert(beacon.node, now).is_none()
    }

    /// Drops neighbors whose last beacon predates the liveness window.
    fn sweep(&mut self, now: TimeS) -> Vec<NodeId> {
        let lost: Vec<NodeId> = self
            .neighbors
            .iter()
            .filter(|(_, seen)| **seen + self.liveness_window <= now)
            .map(|(id, _)| *id)
            .collect();
        for id in &lost {
            self.neighbors.remove(id);
        }
        lost
    }
}

#[cfg(test)]
mod tests {
    use cits_core::mobility::Point;
    use cits_core::pipeline::mailbox;

    use super::*;

    fn receiver() -> BeaconRx {
        let (_outbox, inbox) = mailbox();
        BeaconRx::builder()
            .node(NodeId::from(1))
            .ingress(inbox)
            .build()
    }

    fn beacon(node: u32) -> Beacon {
        Beacon {
            node: NodeId::from(node),
            position: Position::new(Point::new(0, 0), TimeS::new(0)),
        }
    }

    #[test]
    fn first_beacon_is_a_new_sighting() {
        let mut rx = receiver();
        assert!(rx.observe(&beacon(2), TimeS::new(10)));
        assert!(!rx.observe(&beacon(2), TimeS::new(11)));
    }

    #[test]
    fn own_beacon_is_not_tracked() {
        let mut rx = receiver();
        assert!(!rx.observe(&beacon(1), TimeS::new(10)));
        assert!(rx.neighbors.is_empty());
    }

    #[test]
    fn silent_neighbor_is_swept_after_the_window() {
        let mut rx = receiver();
        rx.observe(&beacon(2), TimeS::new(10));
        rx.observe(&beacon(3), TimeS::new(13));
        assert!(rx.sweep(TimeS::new(14)).is_empty());
        assert_eq!(rx.sweep(TimeS::new(15)), vec![NodeId::from(2)]);
        assert!(rx.neighbors.contains_key(&NodeId::from(3)));
    }

    #[test]
    fn refreshed_neighbor_survives_the_sweep() {
        let mut rx = receiver();
        rx.observe(&beacon(2), TimeS::new(10));
        rx.observe(&beacon(2), TimeS::new(14));
        assert!(rx.sweep(TimeS::new(16)).is_empty());
    }
}
