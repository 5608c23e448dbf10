//! The multicast/unicast socket pair a Collector cycle owns for its entire
//! lifetime. Built with `socket2` for the options `std::net::UdpSocket`
//! can't express portably (address reuse before bind, multicast group
//! join), then handed to `tokio` for async readiness.
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use log::warn;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;

use crate::error::MdnsError;

pub const MDNS_ADDR: Ipv4Addr = Ipv4Addr::new(224, 0, 0, 251);
pub const MDNS_PORT: u16 = 5353;

/// Two UDP endpoints, created together at the start of one Collector cycle
/// and dropped together at every exit path (no explicit `close()` — `Drop`
/// on the underlying sockets is the only way out, so nothing can leak a
/// file descriptor on an early-return path).
pub struct SocketPair {
    pub multicast: UdpSocket,
    pub unicast: UdpSocket,
}

impl SocketPair {
    pub async fn bind() -> Result<Self, MdnsError> {
        let multicast = bind_multicast().map_err(|e| {
            warn!("multicast socket bind failed: {}", e);
            MdnsError::Socket(e)
        })?;
        let unicast = bind_unicast().map_err(|e| {
            warn!("unicast socket bind failed: {}", e);
            MdnsError::Socket(e)
        })?;
        Ok(SocketPair { multicast, unicast })
    }

    pub async fn send_query(&self, bytes: &[u8]) -> Result<(), MdnsError> {
        let dest = SocketAddr::V4(SocketAddrV4::new(MDNS_ADDR, MDNS_PORT));
        self.unicast
            .send_to(bytes, dest)
            .await
            .map_err(MdnsError::Send)?;
        Ok(())
    }
}

fn bind_multicast() -> std::io::Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nonblocking(true)?;

    let bind_addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, MDNS_PORT));
    socket.bind(&bind_addr.into())?;
    socket.join_multicast_v4(&MDNS_ADDR, &Ipv4Addr::UNSPECIFIED)?;

    UdpSocket::from_std(socket.into())
}

fn bind_unicast() -> std::io::Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_nonblocking(true)?;
    let bind_addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0));
    socket.bind(&bind_addr.into())?;
    UdpSocket::from_std(socket.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unicast_socket_gets_an_ephemeral_port() {
        let pair = SocketPair::bind().await.expect("bind should succeed");
        let local = pair.unicast.local_addr().unwrap();
        assert_ne!(local.port(), 0);
    }
}
