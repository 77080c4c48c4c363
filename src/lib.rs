//! # Kolwatch - Live KOL Tweet Feed
//!
//! A reconnecting WebSocket client for a tweet monitor that pushes tweets
//! from key opinion leaders, plus a development server that speaks the same
//! protocol.
//!
//! ## Architecture
//!
//! - **Feed**: Connection lifecycle, backoff and callback fan-out
//! - **Protocol**: Wire frames and the tweet payload
//! - **State**: Centralized state management
//! - **App**: Headless application wiring the feed into the store
//! - **Simulator**: Generated tweet stream for local development
//! - **Config**: Configuration management

pub mod app;
pub mod config;
pub mod error;
pub mod feed;
pub mod protocol;
pub mod simulator;
pub mod state;

pub use app::App;
pub use config::Config;
pub use error::{Error, Result};
pub use feed::{Callbacks, FeedHandler, FeedState, FeedStatus, LiveFeedClient, SubscriptionId};
pub use protocol::TweetData;
