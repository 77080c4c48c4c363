//! Reconnecting live feed client.
//!
//! [`LiveFeedClient`] is a cheap handle: every operation is a command sent to
//! a driver task that exclusively owns the connection, the in-flight attempt,
//! the reconnect timer and the subscriber list.

use super::handler::{FeedHandler, Subscribers, SubscriptionId};
use super::policy::ReconnectPolicy;
use super::transport::{Connection, Connector, Inbound, WsConnector};
use super::{FeedState, FeedStatus};
use crate::config::FeedConfig;
use crate::error::{Error, Result};
use crate::protocol::{
    CLIENT_SHUTDOWN, CLOSE_NORMAL, ClientMessage, CloseInfo, MANUAL_DISCONNECT, ServerMessage,
};
use std::future::pending;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Sleep;
use tracing::{debug, error, info, warn};

type Attempt = JoinHandle<Result<Box<dyn Connection>>>;

/// Commands sent from the handle to the driver task.
enum Command {
    Connect,
    Disconnect,
    Subscribe(SubscriptionId, Arc<dyn FeedHandler>),
    Replace(SubscriptionId, Arc<dyn FeedHandler>),
    Unsubscribe(SubscriptionId),
    Shutdown,
}

/// Handle to a reconnecting push-channel client.
///
/// Operations return immediately; outcomes are reported through the
/// subscribed [`FeedHandler`]s and the status watch. Nothing is ever
/// returned as an error: transport failures become state transitions.
///
/// Dropping the handle closes the connection and stops the driver.
///
/// # Example
///
/// ```ignore
/// let client = LiveFeedClient::new(&config.feed);
/// client.subscribe(Arc::new(Callbacks::new().with_tweet(|t| println!("{}", t.text))));
/// client.connect();
/// ```
pub struct LiveFeedClient {
    url: String,
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<FeedStatus>,
    driver: JoinHandle<()>,
}

impl LiveFeedClient {
    /// Create a WebSocket client. Must be called inside a tokio runtime.
    pub fn new(config: &FeedConfig) -> Self {
        Self::with_connector(config, Arc::new(WsConnector))
    }

    /// Create a client over a custom transport.
    pub fn with_connector(config: &FeedConfig, connector: Arc<dyn Connector>) -> Self {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(FeedStatus::default());

        let driver = Driver {
            url: config.url.clone(),
            connector,
            connect_timeout: config.connect_timeout(),
            policy: ReconnectPolicy::from(config),
            subscribers: Subscribers::default(),
            status: status_tx,
            connection: None,
            attempt: None,
            reconnect: None,
            attempts: 0,
            state: FeedState::Idle,
        };

        Self {
            url: config.url.clone(),
            commands,
            status,
            driver: tokio::spawn(driver.run(command_rx)),
        }
    }

    /// Endpoint this client connects to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Open the connection unless it is already open.
    ///
    /// Cancels any scheduled reconnect and restarts the retry budget.
    pub fn connect(&self) {
        self.send(Command::Connect);
    }

    /// Close the connection with a normal closure; no reconnect follows.
    pub fn disconnect(&self) {
        self.send(Command::Disconnect);
    }

    /// Register a handler; it sees every event from now on.
    pub fn subscribe(&self, handler: Arc<dyn FeedHandler>) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.send(Command::Subscribe(id, handler));
        id
    }

    /// Swap the handler behind `id` without touching the connection.
    pub fn replace(&self, id: SubscriptionId, handler: Arc<dyn FeedHandler>) {
        self.send(Command::Replace(id, handler));
    }

    /// Remove a handler.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.send(Command::Unsubscribe(id));
    }

    /// Current status snapshot.
    pub fn status(&self) -> FeedStatus {
        *self.status.borrow()
    }

    pub fn state(&self) -> FeedState {
        self.status().state
    }

    pub fn is_connected(&self) -> bool {
        self.status().is_connected()
    }

    pub fn is_connecting(&self) -> bool {
        self.status().is_connecting()
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.status().reconnect_attempts
    }

    /// Receiver notified on every status change.
    pub fn watch_status(&self) -> watch::Receiver<FeedStatus> {
        self.status.clone()
    }

    /// Close the connection and wait for the driver to stop.
    pub async fn shutdown(self) {
        self.send(Command::Shutdown);
        if let Err(e) = self.driver.await {
            warn!(error = %e, "Feed driver ended abnormally");
        }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            warn!("Feed driver has stopped; command dropped");
        }
    }
}

/// Owns all connection state; runs until shutdown or handle drop.
struct Driver {
    url: String,
    connector: Arc<dyn Connector>,
    connect_timeout: Option<Duration>,
    policy: ReconnectPolicy,
    subscribers: Subscribers,
    status: watch::Sender<FeedStatus>,
    connection: Option<Box<dyn Connection>>,
    attempt: Option<Attempt>,
    reconnect: Option<Pin<Box<Sleep>>>,
    /// Automatic retries since the last successful open.
    attempts: u32,
    state: FeedState,
}

impl Driver {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        loop {
            // Commands first: handler changes issued before a frame arrives
            // must apply to that frame.
            tokio::select! {
                biased;

                command = commands.recv() => {
                    let keep_running = match command {
                        Some(command) => self.handle_command(command).await,
                        None => {
                            self.close(CLIENT_SHUTDOWN).await;
                            false
                        }
                    };
                    if !keep_running {
                        break;
                    }
                }
                joined = next_attempt(&mut self.attempt) => {
                    self.attempt = None;
                    self.on_attempt_finished(joined).await;
                }
                inbound = next_inbound(&mut self.connection) => match inbound {
                    Inbound::Text(frame) => self.on_frame(&frame),
                    Inbound::Closed(close) => self.on_closed(close),
                },
                () = reconnect_due(&mut self.reconnect) => {
                    self.reconnect = None;
                    self.attempts += 1;
                    self.begin_attempt();
                }
            }
        }
        debug!(url = %self.url, "Feed driver stopped");
    }

    /// Returns false once the driver should stop.
    async fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Connect => self.connect(),
            Command::Disconnect => self.close(MANUAL_DISCONNECT).await,
            Command::Subscribe(id, handler) => {
                self.subscribers.insert(id, handler);
                debug!(%id, total = self.subscribers.len(), "Feed handler subscribed");
            }
            Command::Replace(id, handler) => {
                if !self.subscribers.replace(id, handler) {
                    warn!(%id, "Replace for unknown subscription ignored");
                }
            }
            Command::Unsubscribe(id) => {
                if !self.subscribers.remove(id) {
                    debug!(%id, "Unsubscribe for unknown subscription ignored");
                }
            }
            Command::Shutdown => {
                self.close(CLIENT_SHUTDOWN).await;
                return false;
            }
        }
        true
    }

    fn connect(&mut self) {
        self.reconnect = None;

        if self.connection.is_some() {
            debug!("Feed already connected; connect ignored");
            return;
        }

        self.attempts = 0;
        self.begin_attempt();
    }

    fn begin_attempt(&mut self) {
        if let Some(stale) = self.attempt.take() {
            debug!("Abandoning in-flight connection attempt");
            stale.abort();
        }

        info!(url = %self.url, attempt = self.attempts, "Connecting to feed");
        self.set_state(FeedState::Connecting);

        let connector = Arc::clone(&self.connector);
        let url = self.url.clone();
        let limit = self.connect_timeout;
        self.attempt = Some(tokio::spawn(async move {
            match limit {
                Some(limit) => match tokio::time::timeout(limit, connector.connect(&url)).await {
                    Ok(result) => result,
                    Err(_) => Err(Error::network(format!(
                        "connection attempt timed out after {limit:?}"
                    ))),
                },
                None => connector.connect(&url).await,
            }
        }));
    }

    async fn on_attempt_finished(
        &mut self,
        joined: std::result::Result<Result<Box<dyn Connection>>, JoinError>,
    ) {
        match joined {
            Ok(Ok(connection)) => self.on_open(connection).await,
            Ok(Err(e)) => {
                if e.is_recoverable() {
                    warn!(url = %self.url, error = %e, "Feed connection attempt failed");
                } else {
                    error!(url = %self.url, error = %e, "Feed connection attempt failed");
                }
                self.on_closed(CloseInfo::abnormal(e.to_string()));
            }
            Err(e) => {
                error!(error = %e, "Feed connection task failed");
                self.on_closed(CloseInfo::abnormal(e.to_string()));
            }
        }
    }

    async fn on_open(&mut self, mut connection: Box<dyn Connection>) {
        let sent = match ClientMessage::SubscribeTweets.to_frame() {
            Ok(frame) => connection.send_text(frame).await,
            Err(e) => Err(e),
        };
        if let Err(e) = sent {
            warn!(error = %e, "Failed to send subscription handshake");
            self.on_closed(CloseInfo::abnormal(e.to_string()));
            return;
        }

        info!(url = %self.url, "Feed connected");
        self.attempts = 0;
        self.connection = Some(connection);
        self.set_state(FeedState::Connected);
        self.subscribers.connected();
    }

    fn on_frame(&self, frame: &str) {
        let message = match ServerMessage::parse(frame) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, frame, "Discarding malformed feed frame");
                return;
            }
        };

        debug!(event = %message.event, source = %message.source, "Feed frame received");
        if let Some(tweet) = message.into_tweet() {
            self.subscribers.tweet(tweet);
        }
    }

    fn on_closed(&mut self, close: CloseInfo) {
        self.connection = None;
        info!(code = close.code, reason = %close.reason, "Feed disconnected");
        self.set_state(FeedState::Disconnected);

        if close.is_normal() {
            self.set_state(FeedState::Idle);
        } else if let Some(delay) = self.policy.delay_for(self.attempts) {
            info!(
                "Reconnecting in {:?} (attempt {}/{})",
                delay,
                self.attempts + 1,
                self.policy.max_attempts
            );
            self.reconnect = Some(Box::pin(tokio::time::sleep(delay)));
        } else {
            error!(
                attempts = self.attempts,
                "Max reconnection attempts reached. Giving up."
            );
            self.set_state(FeedState::Idle);
        }

        self.subscribers.disconnected();
    }

    /// Cancel timers and attempts, then close any open connection normally.
    async fn close(&mut self, reason: &str) {
        self.reconnect = None;
        let abandoned = self.attempt.take().map(|attempt| attempt.abort()).is_some();
        let close = CloseInfo::new(CLOSE_NORMAL, reason);

        match self.connection.take() {
            Some(mut connection) => {
                if let Err(e) = connection.close(close.clone()).await {
                    debug!(error = %e, "Close handshake failed");
                }
                self.on_closed(close);
            }
            None if abandoned => self.on_closed(close),
            None => self.set_state(FeedState::Idle),
        }
    }

    fn set_state(&mut self, state: FeedState) {
        if self.state != state {
            debug!(from = %self.state, to = %state, "Feed state changed");
        }
        self.state = state;
        self.status.send_replace(FeedStatus {
            state,
            reconnect_attempts: self.attempts,
        });
    }
}

async fn next_attempt(
    attempt: &mut Option<Attempt>,
) -> std::result::Result<Result<Box<dyn Connection>>, JoinError> {
    match attempt {
        Some(handle) => handle.await,
        None => pending().await,
    }
}

async fn next_inbound(connection: &mut Option<Box<dyn Connection>>) -> Inbound {
    match connection {
        Some(connection) => connection.recv().await,
        None => pending().await,
    }
}

async fn reconnect_due(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::TweetData;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::{Instant, sleep};

    #[derive(Debug, PartialEq)]
    enum Seen {
        Tweet(String),
        Connected,
        Disconnected,
    }

    struct Recorder(mpsc::UnboundedSender<Seen>);

    impl FeedHandler for Recorder {
        fn on_tweet(&self, tweet: TweetData) {
            let _ = self.0.send(Seen::Tweet(tweet.tweet_id));
        }

        fn on_connect(&self) {
            let _ = self.0.send(Seen::Connected);
        }

        fn on_disconnect(&self) {
            let _ = self.0.send(Seen::Disconnected);
        }
    }

    fn recorder() -> (Arc<Recorder>, mpsc::UnboundedReceiver<Seen>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Recorder(tx)), rx)
    }

    #[derive(Debug, PartialEq)]
    enum Sent {
        Text(String),
        Close(CloseInfo),
    }

    /// Server side of a scripted connection.
    struct Peer {
        to_client: mpsc::UnboundedSender<Inbound>,
        from_client: mpsc::UnboundedReceiver<Sent>,
    }

    impl Peer {
        fn push(&self, frame: impl Into<String>) {
            self.to_client.send(Inbound::Text(frame.into())).unwrap();
        }

        fn drop_with(&self, code: u16, reason: &str) {
            self.to_client
                .send(Inbound::Closed(CloseInfo::new(code, reason)))
                .unwrap();
        }
    }

    struct ScriptedConnection {
        inbound: mpsc::UnboundedReceiver<Inbound>,
        outbound: mpsc::UnboundedSender<Sent>,
    }

    #[async_trait]
    impl Connection for ScriptedConnection {
        async fn send_text(&mut self, text: String) -> Result<()> {
            self.outbound
                .send(Sent::Text(text))
                .map_err(|e| Error::channel(e.to_string()))
        }

        async fn recv(&mut self) -> Inbound {
            self.inbound
                .recv()
                .await
                .unwrap_or_else(|| Inbound::Closed(CloseInfo::abnormal("peer dropped")))
        }

        async fn close(&mut self, close: CloseInfo) -> Result<()> {
            self.outbound
                .send(Sent::Close(close))
                .map_err(|e| Error::channel(e.to_string()))
        }
    }

    /// Hands out queued connections; refuses when the queue is empty.
    #[derive(Default)]
    struct ScriptedConnector {
        queued: Mutex<VecDeque<ScriptedConnection>>,
        calls: Mutex<Vec<Instant>>,
    }

    impl ScriptedConnector {
        fn accept_next(&self) -> Peer {
            let (to_client, inbound) = mpsc::unbounded_channel();
            let (outbound, from_client) = mpsc::unbounded_channel();
            self.queued
                .lock()
                .unwrap()
                .push_back(ScriptedConnection { inbound, outbound });
            Peer {
                to_client,
                from_client,
            }
        }

        fn calls(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Connector for ScriptedConnector {
        async fn connect(&self, _url: &str) -> Result<Box<dyn Connection>> {
            self.calls.lock().unwrap().push(Instant::now());
            let next = self.queued.lock().unwrap().pop_front();
            match next {
                Some(connection) => Ok(Box::new(connection)),
                None => Err(Error::network("connection refused")),
            }
        }
    }

    /// Never completes a connection.
    #[derive(Default)]
    struct HangingConnector {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Connector for HangingConnector {
        async fn connect(&self, _url: &str) -> Result<Box<dyn Connection>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            pending().await
        }
    }

    fn test_config() -> FeedConfig {
        FeedConfig {
            url: "ws://monitor.test/tw".to_string(),
            base_reconnect_delay_ms: 1000,
            max_reconnect_attempts: 5,
            connect_timeout_secs: 0,
        }
    }

    fn setup() -> (
        LiveFeedClient,
        Arc<ScriptedConnector>,
        mpsc::UnboundedReceiver<Seen>,
    ) {
        let connector = Arc::new(ScriptedConnector::default());
        let client = LiveFeedClient::with_connector(&test_config(), connector.clone());
        let (handler, seen) = recorder();
        client.subscribe(handler);
        (client, connector, seen)
    }

    fn tweet_frame(id: &str) -> String {
        let tweet = TweetData {
            tweet_id: id.to_string(),
            username: "kol".to_string(),
            ..Default::default()
        };
        ServerMessage::new_tweet(tweet, "monitor").to_frame().unwrap()
    }

    fn handshake() -> Sent {
        Sent::Text(r#"{"event":"subscribe_tweets"}"#.to_string())
    }

    /// Let the driver drain everything that is runnable.
    async fn settle() {
        sleep(Duration::from_millis(10)).await;
    }

    async fn connected(
        client: &LiveFeedClient,
        connector: &ScriptedConnector,
        seen: &mut mpsc::UnboundedReceiver<Seen>,
    ) -> Peer {
        let mut peer = connector.accept_next();
        client.connect();
        assert_eq!(seen.recv().await, Some(Seen::Connected));
        assert_eq!(peer.from_client.recv().await, Some(handshake()));
        peer
    }

    #[tokio::test(start_paused = true)]
    async fn test_starts_idle() {
        let (client, connector, _seen) = setup();
        settle().await;
        assert_eq!(client.state(), FeedState::Idle);
        assert!(!client.is_connected());
        assert!(!client.is_connecting());
        assert!(connector.calls().is_empty());
        assert_eq!(client.url(), "ws://monitor.test/tw");
    }

    #[tokio::test(start_paused = true)]
    async fn test_tweet_delivered_exactly_once() {
        let (client, connector, mut seen) = setup();
        let peer = connected(&client, &connector, &mut seen).await;
        assert!(client.is_connected());

        peer.push(tweet_frame("1"));
        assert_eq!(seen.recv().await, Some(Seen::Tweet("1".to_string())));

        settle().await;
        assert!(seen.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_and_unknown_frames_are_skipped() {
        let (client, connector, mut seen) = setup();
        let peer = connected(&client, &connector, &mut seen).await;

        peer.push("not json at all");
        peer.push(r#"{"event":"ping"}"#);
        peer.push(r#"{"event":"new_tweet","tweetData":"oops"}"#);
        peer.push(r#"{"event":"new_tweet","source":"monitor"}"#);
        peer.push(tweet_frame("2"));

        assert_eq!(seen.recv().await, Some(Seen::Tweet("2".to_string())));
        assert!(client.is_connected());
        assert_eq!(connector.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_while_connected_is_noop() {
        let (client, connector, mut seen) = setup();
        let mut peer = connected(&client, &connector, &mut seen).await;

        client.connect();
        settle().await;

        assert!(peer.from_client.try_recv().is_err());
        assert!(seen.try_recv().is_err());
        assert_eq!(connector.calls().len(), 1);
        assert!(client.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_normal_close_is_not_retried() {
        let (client, connector, mut seen) = setup();
        let peer = connected(&client, &connector, &mut seen).await;

        peer.drop_with(1000, "Manual disconnect");
        assert_eq!(seen.recv().await, Some(Seen::Disconnected));

        sleep(Duration::from_secs(60)).await;
        assert!(seen.try_recv().is_err());
        assert_eq!(connector.calls().len(), 1);
        assert_eq!(client.state(), FeedState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abnormal_close_reconnects_after_base_delay() {
        let (client, connector, mut seen) = setup();
        let peer = connected(&client, &connector, &mut seen).await;
        let mut second = connector.accept_next();

        peer.drop_with(1006, "");
        assert_eq!(seen.recv().await, Some(Seen::Disconnected));
        let dropped_at = Instant::now();
        assert_eq!(client.state(), FeedState::Disconnected);
        assert_eq!(client.reconnect_attempts(), 0);

        assert_eq!(seen.recv().await, Some(Seen::Connected));
        assert_eq!(second.from_client.recv().await, Some(handshake()));

        let calls = connector.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1] - dropped_at, Duration::from_secs(1));
        assert_eq!(client.reconnect_attempts(), 0);
        assert!(client.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_doubles_until_budget_spent() {
        let (client, connector, mut seen) = setup();

        client.connect();
        sleep(Duration::from_secs(120)).await;

        let calls = connector.calls();
        assert_eq!(calls.len(), 6);
        let gaps: Vec<Duration> = calls.windows(2).map(|w| w[1] - w[0]).collect();
        assert_eq!(gaps, [1, 2, 4, 8, 16].map(Duration::from_secs));
        assert_eq!(client.state(), FeedState::Idle);
        assert_eq!(client.reconnect_attempts(), 5);

        let mut disconnects = 0;
        while let Ok(event) = seen.try_recv() {
            assert_eq!(event, Seen::Disconnected);
            disconnects += 1;
        }
        assert_eq!(disconnects, 6);

        sleep(Duration::from_secs(600)).await;
        assert_eq!(connector.calls().len(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_connect_after_giving_up_restarts_budget() {
        let (client, connector, _seen) = setup();

        client.connect();
        sleep(Duration::from_secs(120)).await;
        assert_eq!(connector.calls().len(), 6);

        client.connect();
        sleep(Duration::from_millis(1500)).await;
        assert_eq!(connector.calls().len(), 8);
        assert_eq!(client.reconnect_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_cancels_pending_reconnect() {
        let (client, connector, mut seen) = setup();
        let peer = connected(&client, &connector, &mut seen).await;

        peer.drop_with(1006, "");
        assert_eq!(seen.recv().await, Some(Seen::Disconnected));

        client.disconnect();
        sleep(Duration::from_secs(60)).await;

        assert_eq!(connector.calls().len(), 1);
        assert_eq!(client.state(), FeedState::Idle);
        assert!(seen.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_disconnect_closes_normally() {
        let (client, connector, mut seen) = setup();
        let mut peer = connected(&client, &connector, &mut seen).await;

        client.disconnect();
        assert_eq!(seen.recv().await, Some(Seen::Disconnected));
        assert_eq!(
            peer.from_client.recv().await,
            Some(Sent::Close(CloseInfo::new(1000, "Manual disconnect")))
        );

        sleep(Duration::from_secs(60)).await;
        assert_eq!(connector.calls().len(), 1);
        assert_eq!(client.state(), FeedState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_abandons_inflight_attempt() {
        let connector = Arc::new(HangingConnector::default());
        let client = LiveFeedClient::with_connector(&test_config(), connector.clone());
        let (handler, mut seen) = recorder();
        client.subscribe(handler);

        client.connect();
        settle().await;
        assert!(client.is_connecting());

        client.disconnect();
        assert_eq!(seen.recv().await, Some(Seen::Disconnected));
        assert_eq!(client.state(), FeedState::Idle);

        sleep(Duration::from_secs(600)).await;
        assert_eq!(connector.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_timeout_counts_as_failure() {
        let connector = Arc::new(HangingConnector::default());
        let config = FeedConfig {
            connect_timeout_secs: 10,
            max_reconnect_attempts: 1,
            ..test_config()
        };
        let client = LiveFeedClient::with_connector(&config, connector.clone());

        client.connect();
        sleep(Duration::from_secs(300)).await;

        // initial attempt + one retry, both timing out
        assert_eq!(connector.calls.load(Ordering::SeqCst), 2);
        assert_eq!(client.state(), FeedState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replace_swaps_callbacks_without_reconnecting() {
        let connector = Arc::new(ScriptedConnector::default());
        let client = LiveFeedClient::with_connector(&test_config(), connector.clone());
        let (first, mut first_seen) = recorder();
        let id = client.subscribe(first);

        let peer = connected(&client, &connector, &mut first_seen).await;

        let (second, mut second_seen) = recorder();
        client.replace(id, second);
        peer.push(tweet_frame("3"));

        assert_eq!(second_seen.recv().await, Some(Seen::Tweet("3".to_string())));
        assert!(first_seen.try_recv().is_err());
        assert_eq!(connector.calls().len(), 1);
        assert!(client.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsubscribed_handler_sees_nothing() {
        let (client, connector, mut seen) = setup();
        let (extra, mut extra_seen) = recorder();
        let id = client.subscribe(extra);
        let peer = connected(&client, &connector, &mut seen).await;
        assert_eq!(extra_seen.recv().await, Some(Seen::Connected));

        client.unsubscribe(id);
        peer.push(tweet_frame("4"));

        assert_eq!(seen.recv().await, Some(Seen::Tweet("4".to_string())));
        assert!(extra_seen.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_commands_apply_before_pending_frames() {
        for round in 0..200 {
            let connector = Arc::new(ScriptedConnector::default());
            let client = LiveFeedClient::with_connector(&test_config(), connector.clone());
            let (first, mut first_seen) = recorder();
            let id = client.subscribe(first);
            let (watcher, mut watcher_seen) = recorder();
            client.subscribe(watcher);

            let peer = connected(&client, &connector, &mut first_seen).await;
            assert_eq!(watcher_seen.recv().await, Some(Seen::Connected));

            let (second, mut second_seen) = recorder();
            client.replace(id, second);
            peer.push(tweet_frame(&round.to_string()));

            assert_eq!(
                second_seen.recv().await,
                Some(Seen::Tweet(round.to_string()))
            );
            assert!(
                first_seen.try_recv().is_err(),
                "replaced handler saw a tweet in round {round}"
            );

            client.unsubscribe(id);
            peer.push(tweet_frame("after"));

            assert_eq!(
                watcher_seen.recv().await,
                Some(Seen::Tweet(round.to_string()))
            );
            assert_eq!(
                watcher_seen.recv().await,
                Some(Seen::Tweet("after".to_string()))
            );
            assert!(
                second_seen.try_recv().is_err(),
                "unsubscribed handler saw a tweet in round {round}"
            );

            client.shutdown().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnects_after_every_drop_of_an_open_connection() {
        let (client, connector, mut seen) = setup();
        let mut peer = connected(&client, &connector, &mut seen).await;

        for _ in 0..5 {
            let mut next = connector.accept_next();
            peer.drop_with(1006, "");
            assert_eq!(seen.recv().await, Some(Seen::Disconnected));
            let dropped_at = Instant::now();

            assert_eq!(seen.recv().await, Some(Seen::Connected));
            assert_eq!(next.from_client.recv().await, Some(handshake()));
            // A successful open resets the backoff, so every gap is the base delay.
            assert_eq!(
                *connector.calls().last().unwrap() - dropped_at,
                Duration::from_secs(1)
            );
            assert_eq!(client.reconnect_attempts(), 0);
            peer = next;
        }

        assert_eq!(connector.calls().len(), 6);
        assert!(client.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_watch_follows_transitions() {
        let (client, connector, mut seen) = setup();
        let mut status = client.watch_status();

        let peer = connected(&client, &connector, &mut seen).await;
        assert!(status.borrow_and_update().is_connected());

        peer.drop_with(4000, "server restart");
        tokio_test::assert_ok!(
            status
                .wait_for(|s| s.state == FeedState::Disconnected)
                .await
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_closes_connection() {
        let (client, connector, mut seen) = setup();
        let mut peer = connected(&client, &connector, &mut seen).await;

        client.shutdown().await;

        assert_eq!(
            peer.from_client.recv().await,
            Some(Sent::Close(CloseInfo::new(1000, "Client shutting down")))
        );
        assert_eq!(seen.recv().await, Some(Seen::Disconnected));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_closes_connection() {
        let (client, connector, mut seen) = setup();
        let mut peer = connected(&client, &connector, &mut seen).await;

        drop(client);

        assert_eq!(
            peer.from_client.recv().await,
            Some(Sent::Close(CloseInfo::new(1000, "Client shutting down")))
        );
    }
}
