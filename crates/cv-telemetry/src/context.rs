//! Per-request correlation.
//!
//! Every inbound datagram gets a fresh `RequestContext`. Its span carries a
//! UUID v4 `correlation_id` so all events emitted while handling one request
//! can be grouped, including events from the store and transport adapters.
//!
//! ## Example
//!
//! ```rust,ignore
//! let ctx = RequestContext::new(peer);
//! async move { service.handle(&raw).await }
//!     .instrument(ctx.span())
//!     .await;
//! ```

use std::fmt;
use std::net::SocketAddr;

use uuid::Uuid;

/// Correlation data for one inbound request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    correlation_id: Uuid,
    peer: Option<SocketAddr>,
}

impl RequestContext {
    /// Fresh context for a request received from `peer`.
    pub fn new(peer: Option<SocketAddr>) -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            peer,
        }
    }

    /// Correlation identifier.
    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    /// Sender of the request, if known.
    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Span to instrument request handling with.
    pub fn span(&self) -> tracing::Span {
        match self.peer {
            Some(peer) => tracing::info_span!(
                "discovery_request",
                correlation_id = %self.correlation_id,
                peer = %peer,
            ),
            None => tracing::info_span!(
                "discovery_request",
                correlation_id = %self.correlation_id,
            ),
        }
    }
}

impl fmt::Display for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.correlation_id)
    }
}
