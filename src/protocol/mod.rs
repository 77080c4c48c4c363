//! Wire protocol of the tweet monitor push channel.
//!
//! The client sends a single handshake frame after the socket opens:
//!
//! ```json
//! { "event": "subscribe_tweets" }
//! ```
//!
//! The server pushes JSON objects shaped `{ event, tweetData?, source }`.
//! Only `new_tweet` frames carrying `tweetData` are delivered to consumers.

mod tweet;

pub use tweet::{Engagement, TweetData};

use serde::{Deserialize, Serialize};

/// Event kind of a pushed tweet.
pub const NEW_TWEET: &str = "new_tweet";

/// Event kind of informational server notices.
pub const STATUS: &str = "status";

/// Event kind of the subscription handshake.
pub const SUBSCRIBE_TWEETS: &str = "subscribe_tweets";

/// Close code for a normal, intentional closure.
pub const CLOSE_NORMAL: u16 = 1000;

/// Close code reported when the connection dropped without a close frame.
pub const CLOSE_ABNORMAL: u16 = 1006;

/// Close reason sent by an explicit disconnect.
pub const MANUAL_DISCONNECT: &str = "Manual disconnect";

/// Close reason sent when the client itself is torn down.
pub const CLIENT_SHUTDOWN: &str = "Client shutting down";

/// Frames sent from the client to the monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientMessage {
    SubscribeTweets,
}

impl ClientMessage {
    /// Serialize to a text frame.
    pub fn to_frame(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Frames pushed by the monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerMessage {
    pub event: String,
    #[serde(rename = "tweetData", default, skip_serializing_if = "Option::is_none")]
    pub tweet_data: Option<TweetData>,
    #[serde(default)]
    pub source: String,
    /// Human-readable text carried by `status` notices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ServerMessage {
    /// Build a `new_tweet` frame.
    pub fn new_tweet(tweet: TweetData, source: impl Into<String>) -> Self {
        Self {
            event: NEW_TWEET.to_string(),
            tweet_data: Some(tweet),
            source: source.into(),
            message: None,
        }
    }

    /// Build a `status` notice.
    pub fn status(message: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            event: STATUS.to_string(),
            tweet_data: None,
            source: source.into(),
            message: Some(message.into()),
        }
    }

    /// Parse a text frame.
    pub fn parse(frame: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(frame)?)
    }

    /// Serialize to a text frame.
    pub fn to_frame(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Consume the frame, yielding the tweet if this is a deliverable `new_tweet`.
    pub fn into_tweet(self) -> Option<TweetData> {
        if self.event == NEW_TWEET {
            self.tweet_data
        } else {
            None
        }
    }
}

/// How a connection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseInfo {
    pub code: u16,
    pub reason: String,
}

impl CloseInfo {
    /// A closure with an explicit code and reason.
    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    /// A dropped connection with no close frame.
    pub fn abnormal(reason: impl Into<String>) -> Self {
        Self::new(CLOSE_ABNORMAL, reason)
    }

    /// Whether the closure was intentional and must not be retried.
    pub fn is_normal(&self) -> bool {
        self.code == CLOSE_NORMAL
    }
}
