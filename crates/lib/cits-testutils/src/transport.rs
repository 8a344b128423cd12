use std::io;
use std::sync::{Arc, Mutex};

use cits_core::message::Frame;
use cits_core::pipeline::{mailbox, Inbox, Outbox};
use cits_core::transport::Transport;

/// In-memory stand-in for the multicast medium. Every frame sent by any
/// endpoint is delivered to every endpoint, the sender included, matching
/// multicast loopback on the real substrate.
#[derive(Clone, Default)]
pub struct LoopbackHub {
    members: Arc<Mutex<Vec<Outbox<Frame>>>>,
}

impl LoopbackHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches one node to the medium.
    pub fn endpoint(&self) -> HubEndpoint {
        let (outbox, inbox) = mailbox();
        self.lock_members().push(outbox);
        HubEndpoint {
            members: Arc::clone(&self.members),
            inbox: Mutex::new(inbox),
        }
    }

    fn lock_members(&self) -> std::sync::MutexGuard<'_, Vec<Outbox<Frame>>> {
        match self.members.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

pub struct HubEndpoint {
    members: Arc<Mutex<Vec<Outbox<Frame>>>>,
    inbox: Mutex<Inbox<Frame>>,
}

impl Transport for HubEndpoint {
    fn send(&self, frame: &Frame) -> io::Result<()> {
        let members = match self.members.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        for member in members.iter() {
            // A detached endpoint just stops hearing the medium.
            let _ = member.send(frame.clone());
        }
        Ok(())
    }

    fn recv(&self) -> io::Result<Frame> {
        let inbox = match self.inbox.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        inbox
            .recv()
            .map_err(|_| io::Error::new(io::ErrorKind::UnexpectedEof, "medium closed"))
    }
}
