//! Live feed client.
//!
//! Keeps one push-channel connection to the tweet monitor, recovers from
//! drops with exponential backoff and fans decoded tweets out to the
//! registered [`FeedHandler`]s.
//!
//! ```text
//! idle ──connect──▶ connecting ──open──▶ connected
//!  ▲                    ▲                   │ close
//!  │                    │ backoff timer     ▼
//!  └──normal close / budget spent ── disconnected
//! ```

mod client;
mod handler;
mod policy;
mod transport;

pub use client::LiveFeedClient;
pub use handler::{Callbacks, FeedHandler, SubscriptionId};
pub use policy::ReconnectPolicy;
pub use transport::{CLOSE_NO_STATUS, Connection, Connector, Inbound, WsConnection, WsConnector};

use std::fmt;

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedState {
    /// Nothing attempted, manually disconnected, or retries exhausted.
    #[default]
    Idle,
    /// A connection attempt is in flight.
    Connecting,
    /// Open and subscribed.
    Connected,
    /// Closed; a reconnect may be scheduled.
    Disconnected,
}

impl fmt::Display for FeedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
        };
        f.write_str(label)
    }
}

/// Snapshot published by the driver on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeedStatus {
    pub state: FeedState,
    /// Automatic retries since the last successful open.
    pub reconnect_attempts: u32,
}

impl FeedStatus {
    pub fn is_connected(&self) -> bool {
        self.state == FeedState::Connected
    }

    pub fn is_connecting(&self) -> bool {
        self.state == FeedState::Connecting
    }
}
