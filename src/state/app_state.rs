//! Application-level state.

use crate::feed::FeedState;

/// Global application state.
#[derive(Debug, Default)]
pub struct AppState {
    /// Last reported feed connection state.
    pub feed_state: FeedState,
    /// Number of disconnects seen since start.
    pub disconnects: u64,
    /// Current error message.
    pub error: Option<String>,
    /// Whether the app should quit.
    pub should_quit: bool,
}

impl AppState {
    /// Create a new application state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the feed is open.
    pub fn connected(&self) -> bool {
        self.feed_state == FeedState::Connected
    }

    /// Whether a connection attempt is in flight.
    pub fn connecting(&self) -> bool {
        self.feed_state == FeedState::Connecting
    }
}
