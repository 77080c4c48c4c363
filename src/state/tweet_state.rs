//! Tweet feed state.

use crate::protocol::TweetData;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;

/// Newest-first list of received tweets, capped at `max_tweets`.
#[derive(Debug, Clone)]
pub struct TweetState {
    /// Tweets, newest first.
    tweets: VecDeque<TweetData>,
    /// Capacity of the list.
    max_tweets: usize,
    /// Total tweets accepted since start.
    pub received: u64,
    /// Last time a tweet was accepted.
    pub last_updated: Option<DateTime<Utc>>,
}

impl Default for TweetState {
    fn default() -> Self {
        Self::new(50)
    }
}

impl TweetState {
    /// Create an empty feed holding at most `max_tweets`.
    pub fn new(max_tweets: usize) -> Self {
        Self {
            tweets: VecDeque::with_capacity(max_tweets),
            max_tweets,
            received: 0,
            last_updated: None,
        }
    }

    /// Insert at the front; returns false for a tweet already listed.
    pub fn push(&mut self, tweet: TweetData) -> bool {
        if self.max_tweets == 0 || self.contains(&tweet.tweet_id) {
            return false;
        }

        self.tweets.push_front(tweet);
        self.tweets.truncate(self.max_tweets);
        self.received += 1;
        self.last_updated = Some(Utc::now());
        true
    }

    /// Whether a tweet with this id is listed. Empty ids never match.
    pub fn contains(&self, tweet_id: &str) -> bool {
        !tweet_id.is_empty() && self.tweets.iter().any(|t| t.tweet_id == tweet_id)
    }

    pub fn latest(&self) -> Option<&TweetData> {
        self.tweets.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TweetData> {
        self.tweets.iter()
    }

    /// Tweets by one author, newest first.
    pub fn by_author<'a>(&'a self, username: &'a str) -> impl Iterator<Item = &'a TweetData> {
        self.tweets
            .iter()
            .filter(move |t| t.username.eq_ignore_ascii_case(username))
    }

    pub fn len(&self) -> usize {
        self.tweets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tweets.is_empty()
    }

    pub fn clear(&mut self) {
        self.tweets.clear();
    }
}
