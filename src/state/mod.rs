//! State management for kolwatch.
//!
//! Feed callbacks are turned into [`Action`]s and applied by a single owner
//! through [`Store::reduce`], Redux/Elm style.

mod app_state;
mod tweet_state;

pub use app_state::AppState;
pub use tweet_state::TweetState;

use crate::config::StoreConfig;
use crate::error::Result;
use crate::feed::{FeedHandler, FeedState};
use crate::protocol::TweetData;
use tokio::sync::mpsc;
use tracing::debug;

/// Actions that can be dispatched to modify state.
#[derive(Debug, Clone)]
pub enum Action {
    // Feed events
    TweetReceived(TweetData),
    FeedConnected,
    FeedDisconnected,
    FeedStateChanged(FeedState),

    // Tweet list
    ClearTweets,

    // Error handling
    SetError(String),
    ClearError,

    // Quit
    Quit,
}

/// The global state store.
#[derive(Debug)]
pub struct Store {
    /// Application state.
    pub app: AppState,
    /// Tweet feed.
    pub tweets: TweetState,
    /// Action sender for dispatching actions.
    action_tx: mpsc::UnboundedSender<Action>,
}

impl Store {
    /// Create a new store with the given action sender.
    pub fn new(config: &StoreConfig, action_tx: mpsc::UnboundedSender<Action>) -> Self {
        Self {
            app: AppState::new(),
            tweets: TweetState::new(config.max_tweets),
            action_tx,
        }
    }

    /// Dispatch an action to the store.
    pub fn dispatch(&self, action: Action) -> Result<()> {
        self.action_tx
            .send(action)
            .map_err(|e| crate::Error::channel(e.to_string()))
    }

    /// A feed handler that dispatches into this store.
    pub fn handler(&self) -> StoreHandler {
        StoreHandler::new(self.action_tx.clone())
    }

    /// Apply an action to update state.
    pub fn reduce(&mut self, action: Action) {
        match action {
            Action::TweetReceived(tweet) => {
                if !self.tweets.push(tweet) {
                    debug!("Duplicate tweet ignored");
                }
            }
            Action::FeedConnected => {
                self.app.feed_state = FeedState::Connected;
                self.app.error = None;
            }
            Action::FeedDisconnected => {
                self.app.disconnects += 1;
                if self.app.feed_state == FeedState::Connected {
                    self.app.feed_state = FeedState::Disconnected;
                }
            }
            Action::FeedStateChanged(state) => self.app.feed_state = state,

            Action::ClearTweets => self.tweets.clear(),

            Action::SetError(error) => self.app.error = Some(error),
            Action::ClearError => self.app.error = None,

            Action::Quit => self.app.should_quit = true,
        }
    }
}

/// Forwards feed callbacks to a store as actions.
#[derive(Debug, Clone)]
pub struct StoreHandler {
    action_tx: mpsc::UnboundedSender<Action>,
}

impl StoreHandler {
    pub fn new(action_tx: mpsc::UnboundedSender<Action>) -> Self {
        Self { action_tx }
    }

    fn forward(&self, action: Action) {
        if self.action_tx.send(action).is_err() {
            debug!("Store is gone; feed event dropped");
        }
    }
}

impl FeedHandler for StoreHandler {
    fn on_tweet(&self, tweet: TweetData) {
        self.forward(Action::TweetReceived(tweet));
    }

    fn on_connect(&self) {
        self.forward(Action::FeedConnected);
    }

    fn on_disconnect(&self) {
        self.forward(Action::FeedDisconnected);
    }
}
