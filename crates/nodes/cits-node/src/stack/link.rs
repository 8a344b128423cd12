use std::sync::Arc;

use log::error;
use typed_builder::TypedBuilder;

use cits_core::message::{Beacon, Frame, GeoPacket};
use cits_core::pipeline::{Inbox, Outbox};
use cits_core::transport::Transport;

/// Inbound half of the link layer. Demultiplexes the medium into the beacon
/// sub-stream and the data sub-stream for the network layer.
#[derive(TypedBuilder)]
pub struct LinkRx {
    transport: Arc<dyn Transport>,
    beacon_out: Outbox<Beacon>,
    data_out: Outbox<GeoPacket>,
}

impl LinkRx {
    pub fn run(self) {
        loop {
            let frame = match self.transport.recv() {
                Ok(frame) => frame,
                Err(e) => {
                    error!("Transport receive failed, link is down: {}", e);
                    return;
                }
            };
            let delivered = match frame {
                Frame::Beacon(beacon) => self.beacon_out.send(beacon).is_ok(),
                Frame::Data(packet) => self.data_out.send(packet).is_ok(),
            };
            if !delivered {
                return;
            }
        }
    }
}

/// Outbound half of the link layer. Drains egress frames onto the medium.
#[derive(TypedBuilder)]
pub struct LinkTx {
    transport: Arc<dyn Transport>,
    frames: Inbox<Frame>,
}

impl LinkTx {
    pub fn run(self) {
        for frame in self.frames.iter() {
            if let Err(e) = self.transport.send(&frame) {
                error!("Transport send failed: {}", e);
            }
        }
    }
}
