//! Local stand-in for the tweet monitor.
//!
//! [`TweetGenerator`] produces random tweets in the monitor's payload format
//! and [`SimulatorServer`] pushes them over WebSocket to subscribed clients,
//! so the feed client can be exercised without the production endpoint.

mod generator;
mod server;

pub use generator::{
    MAX_TEXT_LEN, Substitutions, TweetGenerator, TweetKind, compact_count, extract_link,
    fill_template, truncate_text,
};
pub use server::SimulatorServer;
