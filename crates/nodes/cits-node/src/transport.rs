use std::io;
use std::net::{Ipv4Addr, SocketAddrV4, UdpSocket};

use log::debug;

use cits_core::message::Frame;
use cits_core::transport::Transport;

use crate::node::config::TransportSettings;

const MAX_DATAGRAM: usize = 64 * 1024;

/// The shared medium: a UDP multicast group every node in the emulation
/// joins. Frames are JSON datagrams; multicast loopback is left on so the
/// medium behaves like a broadcast channel, echoes included.
pub struct UdpMulticastTransport {
    socket: UdpSocket,
    group: SocketAddrV4,
}

impl UdpMulticastTransport {
    pub fn open(settings: &TransportSettings) -> io::Result<Self> {
        let group_addr: Ipv4Addr = settings
            .group
            .parse()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, settings.port))?;
        socket.join_multicast_v4(&group_addr, &Ipv4Addr::UNSPECIFIED)?;
        socket.set_multicast_loop_v4(true)?;
        debug!("Joined multicast group {}:{}", group_addr, settings.port);
        Ok(Self {
            socket,
            group: SocketAddrV4::new(group_addr, settings.port),
        })
    }
}

impl Transport for UdpMulticastTransport {
    fn send(&self, frame: &Frame) -> io::Result<()> {
        let bytes = serde_json::to_vec(frame)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.socket.send_to(&bytes, self.group)?;
        Ok(())
    }

    fn recv(&self) -> io::Result<Frame> {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        loop {
            let (len, peer) = self.socket.recv_from(&mut buf)?;
            match serde_json::from_slice(&buf[..len]) {
                Ok(frame) => return Ok(frame),
                Err(e) => {
                    // Foreign traffic on the group is dropped, not fatal.
                    debug!("Discarding undecodable datagram from {}: {}", peer, e);
                }
            }
        }
    }
}
