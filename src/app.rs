//! Main application module.
//!
//! This module contains the headless `App` that wires the live feed client
//! into the store and logs the incoming feed.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::feed::{Connector, FeedState, LiveFeedClient};
use crate::protocol::TweetData;
use crate::state::{Action, Store};

use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// The main application.
pub struct App {
    /// Application store.
    store: Store,
    /// Action receiver.
    action_rx: mpsc::UnboundedReceiver<Action>,
    /// Live feed client.
    client: LiveFeedClient,
    /// Configuration.
    config: Config,
}

impl App {
    /// Create a new application over WebSocket. Must be called inside a tokio runtime.
    pub fn new(config: Config) -> Self {
        let client = LiveFeedClient::new(&config.feed);
        Self::with_client(config, client)
    }

    /// Create a new application over a custom transport.
    pub fn with_connector(config: Config, connector: Arc<dyn Connector>) -> Self {
        let client = LiveFeedClient::with_connector(&config.feed, connector);
        Self::with_client(config, client)
    }

    fn with_client(config: Config, client: LiveFeedClient) -> Self {
        // Create action channel
        let (action_tx, action_rx) = mpsc::unbounded_channel();

        // Create store and route feed callbacks into it
        let store = Store::new(&config.store, action_tx);
        client.subscribe(Arc::new(store.handler()));

        Self {
            store,
            action_rx,
            client,
            config,
        }
    }

    /// Application store.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Run until ctrl-c.
    pub async fn run(&mut self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Cannot listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run the application event loop until `shutdown` resolves.
    pub async fn run_until(&mut self, shutdown: impl Future<Output = ()>) -> Result<()> {
        tokio::pin!(shutdown);
        let mut status = self.client.watch_status();

        info!(url = %self.client.url(), "Starting feed");
        self.client.connect();

        loop {
            tokio::select! {
                // Handle actions from the channel
                Some(action) = self.action_rx.recv() => {
                    self.handle_action(action);
                }

                // Mirror feed status changes
                changed = status.changed() => {
                    if changed.is_err() {
                        return Err(Error::channel("feed driver stopped"));
                    }
                    let current = *status.borrow_and_update();
                    self.store.reduce(Action::FeedStateChanged(current.state));

                    let max = self.config.feed.max_reconnect_attempts;
                    if current.state == FeedState::Idle && max > 0 && current.reconnect_attempts >= max {
                        self.store.reduce(Action::SetError(format!(
                            "feed unreachable after {max} reconnect attempts"
                        )));
                    }
                }

                () = &mut shutdown => {
                    self.store.reduce(Action::Quit);
                }
            }

            // Check if we should quit
            if self.store.app.should_quit {
                break;
            }
        }

        self.client.disconnect();
        info!(
            received = self.store.tweets.received,
            disconnects = self.store.app.disconnects,
            "Feed stopped"
        );
        Ok(())
    }

    /// Handle an action.
    fn handle_action(&mut self, action: Action) {
        match action {
            Action::TweetReceived(tweet) => self.on_tweet(tweet),
            Action::FeedConnected => {
                info!("Feed live");
                self.store.reduce(Action::FeedConnected);
            }
            Action::FeedDisconnected => {
                if self.store.app.connected() {
                    warn!("Feed connection lost");
                }
                self.store.reduce(Action::FeedDisconnected);
            }
            other => self.store.reduce(other),
        }
    }

    fn on_tweet(&mut self, tweet: TweetData) {
        let summary = tweet.summary();
        let tweet_id = tweet.tweet_id.clone();
        let received = self.store.tweets.received;

        self.store.reduce(Action::TweetReceived(tweet));
        if self.store.tweets.received > received {
            info!(%tweet_id, "{summary}");
        }
    }
}
