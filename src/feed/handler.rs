//! Feed subscribers.

use crate::protocol::TweetData;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Consumer of live feed events.
///
/// Callbacks run on the client's driver task and must not block.
#[cfg_attr(test, mockall::automock)]
pub trait FeedHandler: Send + Sync {
    /// A `new_tweet` frame arrived.
    fn on_tweet(&self, _tweet: TweetData) {}

    /// The connection opened and the subscription handshake was sent.
    fn on_connect(&self) {}

    /// The connection closed, for whatever reason.
    fn on_disconnect(&self) {}
}

type TweetFn = Box<dyn Fn(TweetData) + Send + Sync>;
type NotifyFn = Box<dyn Fn() + Send + Sync>;

/// A [`FeedHandler`] assembled from optional closures.
#[derive(Default)]
pub struct Callbacks {
    on_tweet: Option<TweetFn>,
    on_connect: Option<NotifyFn>,
    on_disconnect: Option<NotifyFn>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tweet(mut self, f: impl Fn(TweetData) + Send + Sync + 'static) -> Self {
        self.on_tweet = Some(Box::new(f));
        self
    }

    pub fn with_connect(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_connect = Some(Box::new(f));
        self
    }

    pub fn with_disconnect(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_disconnect = Some(Box::new(f));
        self
    }
}

impl FeedHandler for Callbacks {
    fn on_tweet(&self, tweet: TweetData) {
        if let Some(f) = &self.on_tweet {
            f(tweet);
        }
    }

    fn on_connect(&self) {
        if let Some(f) = &self.on_connect {
            f();
        }
    }

    fn on_disconnect(&self) {
        if let Some(f) = &self.on_disconnect {
            f();
        }
    }
}

/// Identifies a registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Ordered handler list owned by the driver task.
#[derive(Default)]
pub(crate) struct Subscribers {
    entries: Vec<(SubscriptionId, Arc<dyn FeedHandler>)>,
}

impl Subscribers {
    pub fn insert(&mut self, id: SubscriptionId, handler: Arc<dyn FeedHandler>) {
        self.entries.push((id, handler));
    }

    pub fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    /// Swap the handler behind `id` in place, keeping its position.
    pub fn replace(&mut self, id: SubscriptionId, handler: Arc<dyn FeedHandler>) -> bool {
        match self.entries.iter_mut().find(|(entry, _)| *entry == id) {
            Some(slot) => {
                slot.1 = handler;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn tweet(&self, tweet: TweetData) {
        if let Some(((_, last), rest)) = self.entries.split_last() {
            for (_, handler) in rest {
                handler.on_tweet(tweet.clone());
            }
            last.on_tweet(tweet);
        }
    }

    pub fn connected(&self) {
        for (_, handler) in &self.entries {
            handler.on_connect();
        }
    }

    pub fn disconnected(&self) {
        for (_, handler) in &self.entries {
            handler.on_disconnect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn tweet(id: &str) -> TweetData {
        TweetData {
            tweet_id: id.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_fan_out_to_every_handler() {
        let mut subscribers = Subscribers::default();
        for _ in 0..2 {
            let mut mock = MockFeedHandler::new();
            mock.expect_on_tweet()
                .with(eq(tweet("1")))
                .times(1)
                .return_const(());
            mock.expect_on_connect().times(1).return_const(());
            mock.expect_on_disconnect().never();
            subscribers.insert(SubscriptionId::new(), Arc::new(mock));
        }

        subscribers.connected();
        subscribers.tweet(tweet("1"));
    }

    #[test]
    fn test_replace_keeps_slot() {
        let mut subscribers = Subscribers::default();
        let id = SubscriptionId::new();

        let mut stale = MockFeedHandler::new();
        stale.expect_on_tweet().never();
        subscribers.insert(id, Arc::new(stale));

        let mut fresh = MockFeedHandler::new();
        fresh.expect_on_tweet().times(1).return_const(());
        assert!(subscribers.replace(id, Arc::new(fresh)));
        assert_eq!(subscribers.len(), 1);

        subscribers.tweet(tweet("2"));
    }

    #[test]
    fn test_remove_and_unknown_ids() {
        let mut subscribers = Subscribers::default();
        let id = SubscriptionId::new();
        subscribers.insert(id, Arc::new(Callbacks::new()));

        assert!(!subscribers.replace(SubscriptionId::new(), Arc::new(Callbacks::new())));
        assert!(!subscribers.remove(SubscriptionId::new()));
        assert!(subscribers.remove(id));
        assert_eq!(subscribers.len(), 0);

        // No handlers: nothing to call.
        subscribers.tweet(tweet("3"));
    }

    #[test]
    fn test_callbacks_builder() {
        let tweets = Arc::new(AtomicUsize::new(0));
        let disconnects = Arc::new(AtomicUsize::new(0));

        let counter = tweets.clone();
        let drops = disconnects.clone();
        let callbacks = Callbacks::new()
            .with_tweet(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .with_disconnect(move || {
                drops.fetch_add(1, Ordering::SeqCst);
            });

        let handler: &dyn FeedHandler = &callbacks;
        handler.on_tweet(tweet("4"));
        handler.on_connect();
        handler.on_disconnect();

        assert_eq!(tweets.load(Ordering::SeqCst), 1);
        assert_eq!(disconnects.load(Ordering::SeqCst), 1);
    }
}
