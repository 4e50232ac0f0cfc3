use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

use crate::domain::TransportError;
use crate::ports::{Destination, Transport};

// ============================================================================
// NoOpTransport - Stub for wiring without a network
// ============================================================================

/// Transport that accepts every payload and sends nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpTransport;

impl NoOpTransport {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for NoOpTransport {
    async fn send(&self, _destination: &Destination, _payload: &[u8], _relayed: bool) -> Result<(), TransportError> {
        Ok(())
    }
}

// ============================================================================
// UdpTransport - Datagram delivery with optional bundle forwarder
// ============================================================================

/// Wrap `payload` for the bundle forwarder.
///
/// # Wire Format
///
/// - Byte 0: address length (4 or 16)
/// - Next 4/16 bytes: final destination IP
/// - Next 2 bytes: final destination port, big-endian
/// - Remaining: payload
pub fn forward_envelope(target: SocketAddr, payload: &[u8]) -> Vec<u8> {
    let ip_bytes: Vec<u8> = match target.ip() {
        IpAddr::V4(v4) => v4.octets().to_vec(),
        IpAddr::V6(v6) => v6.octets().to_vec(),
    };
    let mut out = Vec::with_capacity(1 + ip_bytes.len() + 2 + payload.len());
    // 4 or 16
    out.push(ip_bytes.len() as u8);
    out.extend_from_slice(&ip_bytes);
    out.extend_from_slice(&target.port().to_be_bytes());
    out.extend_from_slice(payload);
    out
}

/// Parse a forwarder envelope back into `(target, payload)`.
pub fn parse_forward_envelope(bytes: &[u8]) -> Option<(SocketAddr, &[u8])> {
    let len = usize::from(*bytes.first()?);
    let ip: IpAddr = match len {
        4 => <[u8; 4]>::try_from(bytes.get(1..5)?).ok()?.into(),
        16 => <[u8; 16]>::try_from(bytes.get(1..17)?).ok()?.into(),
        _ => return None,
    };
    let port_at = 1 + len;
    let port = u16::from_be_bytes([*bytes.get(port_at)?, *bytes.get(port_at + 1)?]);
    Some((SocketAddr::new(ip, port), bytes.get(port_at + 2..)?))
}

/// UDP transport.
///
/// Sends directly to the destination, or through the bundle forwarder when
/// one is configured and either `forward_all` is set or the request was
/// relayed by the forwarder in the first place.
///
/// Holds one socket per address family so IPv4 and IPv6 requesters can both
/// be answered. The family of `bind_addr` is required; the other is bound on
/// the unspecified address when the host supports it.
pub struct UdpTransport {
    v4: Option<UdpSocket>,
    v6: Option<UdpSocket>,
    local: SocketAddr,
    forwarder: Option<SocketAddr>,
    forward_all: bool,
}

impl UdpTransport {
    /// Bind the sending sockets.
    ///
    /// # Errors
    ///
    /// Returns error if binding `bind_addr` fails.
    pub async fn bind(
        bind_addr: &str,
        forwarder: Option<SocketAddr>,
        forward_all: bool,
    ) -> std::io::Result<Self> {
        let primary = UdpSocket::bind(bind_addr).await?;
        let local = primary.local_addr()?;
        let other: SocketAddr = if local.is_ipv4() {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        };
        let companion = match UdpSocket::bind(other).await {
            Ok(socket) => Some(socket),
            Err(e) => {
                warn!(addr = %other, error = %e, "Second address family unavailable");
                None
            }
        };
        let (v4, v6) = if local.is_ipv4() {
            (Some(primary), companion)
        } else {
            (companion, Some(primary))
        };

        info!(
            local = %local,
            dual_stack = v4.is_some() && v6.is_some(),
            forwarder = ?forwarder,
            forward_all,
            "UDP transport ready"
        );
        Ok(Self {
            v4,
            v6,
            local,
            forwarder,
            forward_all,
        })
    }

    /// Address of the socket bound from `bind_addr`.
    pub fn local_addr(&self) -> SocketAddr {
        self.local
    }

    fn socket_for(&self, addr: &SocketAddr) -> Option<&UdpSocket> {
        match addr {
            SocketAddr::V4(_) => self.v4.as_ref(),
            SocketAddr::V6(_) => self.v6.as_ref(),
        }
    }

    /// Resolve `destination`, preferring an address this transport can reach.
    async fn resolve(&self, destination: &Destination) -> Result<SocketAddr, TransportError> {
        let resolve_error = || TransportError::Resolve {
            host: destination.host.clone(),
            port: destination.port,
        };
        let addrs: Vec<SocketAddr> = tokio::net::lookup_host((destination.host.as_str(), destination.port))
            .await
            .map_err(|_| resolve_error())?
            .collect();
        addrs
            .iter()
            .find(|addr| self.socket_for(addr).is_some())
            .or_else(|| addrs.first())
            .copied()
            .ok_or_else(resolve_error)
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn send(
        &self,
        destination: &Destination,
        payload: &[u8],
        relayed: bool,
    ) -> Result<(), TransportError> {
        let target = self.resolve(destination).await?;

        let (to, datagram) = match self.forwarder {
            Some(forwarder) if self.forward_all || relayed => {
                (forwarder, forward_envelope(target, payload))
            }
            _ => (target, payload.to_vec()),
        };

        let socket = self
            .socket_for(&to)
            .ok_or_else(|| TransportError::Io(format!("no socket for the address family of {to}")))?;
        let sent = socket
            .send_to(&datagram, to)
            .await
            .map_err(|e| TransportError::Io(e.to_string()))?;
        debug!(to = %to, target = %target, bytes = sent, relayed, "Datagram sent");
        Ok(())
    }
}
