use std::collections::VecDeque;

use hashbrown::HashSet;
use log::debug;
use serde::Deserialize;

use cits_core::message::{DenMessage, GeoPacket, MsgId, Roi};
use cits_core::mobility::Point;
use cits_core::node::NodeId;

const DEDUP_CAPACITY: usize = 1024;

/// Dissemination parameters for DEN messages. A hop limit of 1 degenerates
/// to single-hop delivery.
#[derive(Deserialize, Debug, Clone)]
pub struct DenSettings {
    #[serde(default = "default_hop_limit")]
    pub hop_limit: u8,
    #[serde(default = "default_roi_radius")]
    pub roi_radius: f64,
}

fn default_hop_limit() -> u8 {
    3
}

fn default_roi_radius() -> f64 {
    100.0
}

impl Default for DenSettings {
    fn default() -> Self {
        Self {
            hop_limit: default_hop_limit(),
            roi_radius: default_roi_radius(),
        }
    }
}

/// What the network layer does with a received dissemination packet.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DenDecision {
    /// Deliver the message to the local facilities layer.
    pub deliver: bool,
    /// Re-broadcast this packet for the next hop.
    pub forward: Option<GeoPacket>,
}

impl DenDecision {
    fn drop() -> Self {
        Self::default()
    }
}

/// Multi-hop control for DEN dissemination: duplicate suppression keyed on
/// `(sender, msg_id)`, region-of-interest containment, hop-count decrement.
/// The dedup memory is bounded; the oldest key is evicted first.
///
/// The hop budget and region of interest travel inside each packet, stamped
/// at origin from [DenSettings]; the receiving side needs no settings of
/// its own.
#[derive(Debug, Default)]
pub struct DenControl {
    seen: HashSet<(NodeId, MsgId)>,
    arrival_order: VecDeque<(NodeId, MsgId)>,
}

impl DenControl {
    pub fn new() -> Self {
        Self {
            seen: HashSet::with_capacity(DEDUP_CAPACITY),
            arrival_order: VecDeque::with_capacity(DEDUP_CAPACITY),
        }
    }

    /// Decides delivery and forwarding for one received dissemination.
    pub fn on_dissemination(
        &mut self,
        den: &DenMessage,
        hops_left: u8,
        roi: &Roi,
        own_position: &Point,
    ) -> DenDecision {
        let key = (den.node, den.msg_id);
        if self.seen.contains(&key) {
            debug!("Dropping duplicate DEN {} from node {}", den.msg_id, den.node);
            return DenDecision::drop();
        }
        if !roi.contains(own_position) {
            debug!(
                "Dropping DEN {} from node {}: outside region of interest",
                den.msg_id, den.node
            );
            return DenDecision::drop();
        }
        self.remember(key);

        let remaining = hops_left.saturating_sub(1);
        let forward = (remaining > 0).then(|| GeoPacket::Dissemination {
            den: den.clone(),
            hops_left: remaining,
            roi: *roi,
        });
        DenDecision {
            deliver: true,
            forward,
        }
    }

    fn remember(&mut self, key: (NodeId, MsgId)) {
        if self.seen.len() >= DEDUP_CAPACITY {
            if let Some(oldest) = self.arrival_order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        self.seen.insert(key);
        self.arrival_order.push_back(key);
    }
}

#[cfg(test)]
mod tests {
    use cits_core::message::{BusRequest, DenEvent};
    use cits_core::mobility::Position;
    use cits_core::node::NodeRole;
    use cits_core::time::TimeS;

    use super::*;

    fn den(node: u32, msg_id: u64) -> DenMessage {
        DenMessage {
            node: NodeId::from(node),
            role: NodeRole::Obu,
            msg_id: MsgId::from(msg_id),
            position: Position::default(),
            event: DenEvent::BusRequest(BusRequest {
                src: Point::new(0, 0),
                dest: Point::new(1, 0),
                max_arrival: TimeS::new(600),
                request_id: 1,
            }),
        }
    }

    fn roi() -> Roi {
        Roi {
            center: Point::new(0, 0),
            radius: 50.0,
        }
    }

    #[test]
    fn first_sighting_is_delivered_and_forwarded() {
        let mut control = DenControl::new();
        let decision = control.on_dissemination(&den(5, 1), 3, &roi(), &Point::new(1, 1));
        assert!(decision.deliver);
        match decision.forward {
            Some(GeoPacket::Dissemination { hops_left, .. }) => assert_eq!(hops_left, 2),
            other => panic!("expected a forwarded dissemination, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_is_dropped() {
        let mut control = DenControl::new();
        let message = den(5, 1);
        let position = Point::new(1, 1);
        assert!(control.on_dissemination(&message, 3, &roi(), &position).deliver);
        assert_eq!(
            control.on_dissemination(&message, 3, &roi(), &position),
            DenDecision::drop()
        );
    }

    #[test]
    fn last_hop_is_delivered_but_not_forwarded() {
        let mut control = DenControl::new();
        let decision = control.on_dissemination(&den(5, 1), 1, &roi(), &Point::new(1, 1));
        assert!(decision.deliver);
        assert!(decision.forward.is_none());
    }

    #[test]
    fn outside_roi_is_dropped() {
        let mut control = DenControl::new();
        let decision = control.on_dissemination(&den(5, 1), 3, &roi(), &Point::new(200, 200));
        assert_eq!(decision, DenDecision::drop());
    }

    #[test]
    fn distinct_msg_ids_from_one_sender_pass() {
        let mut control = DenControl::new();
        let position = Point::new(1, 1);
        assert!(control.on_dissemination(&den(5, 1), 2, &roi(), &position).deliver);
        assert!(control.on_dissemination(&den(5, 2), 2, &roi(), &position).deliver);
    }
}
