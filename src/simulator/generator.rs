//! Random tweet generator.

use crate::protocol::{Engagement, TweetData};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::time::Duration;

/// Longest text kept before truncation.
pub const MAX_TEXT_LEN: usize = 140;

/// Kind of generated tweet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TweetKind {
    Tweet,
    Reply,
    Quote,
}

impl TweetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tweet => "tweet",
            Self::Reply => "reply",
            Self::Quote => "quote",
        }
    }
}

struct SampleUser {
    user_id: &'static str,
    username: &'static str,
    display_name: &'static str,
    bio: &'static str,
    created_at: &'static str,
    followers: u64,
    following: u64,
    tweet_count: u64,
    favorites: u64,
    verified: &'static str,
    affiliated_with: Option<&'static str>,
}

const USERS: &[SampleUser] = &[
    SampleUser {
        user_id: "1402871192",
        username: "degen_oracle",
        display_name: "Degen Oracle",
        bio: "Calling tops since 2017. Not financial advice.",
        created_at: "Sat Apr 06 11:02:41 +0000 2013",
        followers: 412_300,
        following: 921,
        tweet_count: 58_114,
        favorites: 102_553,
        verified: "blue",
        affiliated_with: None,
    },
    SampleUser {
        user_id: "982310455",
        username: "solana_scout",
        display_name: "Sol Scout",
        bio: "Memecoin archaeology. Early or wrong.",
        created_at: "Mon Nov 26 08:17:09 +0000 2012",
        followers: 88_020,
        following: 1_410,
        tweet_count: 23_871,
        favorites: 41_002,
        verified: "false",
        affiliated_with: None,
    },
    SampleUser {
        user_id: "1620002319",
        username: "chartwizard",
        display_name: "Chart Wizard",
        bio: "Lines on charts. Occasionally right.",
        created_at: "Wed Jan 25 19:44:30 +0000 2023",
        followers: 1_204_775,
        following: 312,
        tweet_count: 9_402,
        favorites: 7_118,
        verified: "business",
        affiliated_with: Some("Wizard Capital"),
    },
];

const TWEET_TEMPLATES: &[&str] = &[
    "Loading up on {feature} before everyone else notices. Thread: {url}",
    "{feature} just broke out. If you faded it, that's on you. {url}",
    "Reminder: {feature} unlocks on {date}. Position accordingly.",
    "Everyone sleeping on {feature} will be buying it back higher.",
    "Rotating out of {feature} into {newFeature}. Charts: {url}",
    "Spaces on {feature} tonight, {date}. Bring questions: {url}",
    "Took profits on {feature}. Still holding a moonbag, obviously.",
    "New ATH incoming for {feature}? Volume says yes. {url}",
    "Unpopular opinion: {feature} is the cleanest setup this cycle.",
    "Just aped {feature}. Stop loss is for people who plan to sell.",
];

const REPLY_TEMPLATES: &[&str] = &[
    "Agreed on {feature}, been accumulating for weeks.",
    "Not sure about {feature} here, liquidity is thin. {url}",
    "This aged well. {feature} did exactly what I said.",
    "Careful with {feature}, the unlock on {date} is real.",
    "Same read on {feature}. Next stop {newFeature}.",
];

const QUOTE_TEMPLATES: &[&str] = &[
    "This is the {feature} call everyone will pretend they saw. {url}",
    "Screenshot this. {feature} is about to move.",
    "Exactly why I rotated into {feature}.",
    "Bookmarking this {feature} thread for the bear market.",
    "If you only read one take on {feature} today, make it this one. {url}",
];

const FEATURES: &[&str] = &[
    "$SOL",
    "$BONK",
    "$WIF",
    "$JUP",
    "pump.fun launches",
    "the perp DEX meta",
    "restaking",
    "AI agent tokens",
    "$ETH",
    "cat coins",
    "the memecoin supercycle",
    "$POPCAT",
];

const URLS: &[&str] = &[
    "https://dexscreener.com/solana",
    "https://birdeye.so/token",
    "https://x.com/i/spaces/1",
    "https://pump.fun/board",
    "https://tradingview.com/chart",
];

const IMAGE_URLS: &[&str] = &[
    "https://picsum.photos/800/450",
    "https://picsum.photos/600/800",
    "https://picsum.photos/700/700",
    "https://picsum.photos/900/500",
    "https://picsum.photos/500/900",
];

const DATES: &[&str] = &[
    "January 15",
    "February 28",
    "March 10",
    "April 22",
    "May 30",
    "June 15",
    "July 8",
    "August 17",
    "September 5",
    "October 12",
    "November 20",
    "December 3",
];

/// Values substituted into a template.
#[derive(Debug, Clone, Copy)]
pub struct Substitutions<'a> {
    pub feature: &'a str,
    pub url: &'a str,
    pub date: &'a str,
    pub new_feature: &'a str,
}

/// Replace the first occurrence of each placeholder.
pub fn fill_template(template: &str, subs: &Substitutions<'_>) -> String {
    template
        .replacen("{feature}", subs.feature, 1)
        .replacen("{url}", subs.url, 1)
        .replacen("{date}", subs.date, 1)
        .replacen("{newFeature}", subs.new_feature, 1)
}

/// Cut text longer than [`MAX_TEXT_LEN`] characters to 137 plus `...`.
pub fn truncate_text(text: &str) -> String {
    if text.chars().count() > MAX_TEXT_LEN {
        let mut short: String = text.chars().take(MAX_TEXT_LEN - 3).collect();
        short.push_str("...");
        short
    } else {
        text.to_string()
    }
}

/// First `http` link in the text, up to the next space.
pub fn extract_link(text: &str) -> Option<&str> {
    let start = text.find("http")?;
    let rest = &text[start..];
    Some(rest.split(' ').next().unwrap_or(rest))
}

/// Format a view count the way the monitor does ("950", "12.4K", "3.1M").
pub fn compact_count(n: u64) -> String {
    match n {
        0..=999 => n.to_string(),
        1_000..=999_999 => format!("{:.1}K", n as f64 / 1_000.0),
        _ => format!("{:.1}M", n as f64 / 1_000_000.0),
    }
}

/// Produces plausible KOL tweets, remembering recent ones as reply and quote targets.
pub struct TweetGenerator {
    rng: StdRng,
    recent: VecDeque<TweetData>,
    recent_window: usize,
}

impl TweetGenerator {
    /// Create a generator seeded from the OS.
    pub fn new(recent_window: usize) -> Self {
        Self::with_rng(StdRng::from_entropy(), recent_window)
    }

    /// Create a deterministic generator.
    pub fn with_seed(seed: u64, recent_window: usize) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), recent_window)
    }

    fn with_rng(rng: StdRng, recent_window: usize) -> Self {
        Self {
            rng,
            recent: VecDeque::with_capacity(recent_window),
            recent_window,
        }
    }

    /// Tweets currently eligible as reply/quote targets, newest first.
    pub fn recent(&self) -> impl Iterator<Item = &TweetData> {
        self.recent.iter()
    }

    /// Batch sent right after subscription: 80% tweets, 10% replies, 10% quotes.
    pub fn initial_batch(&mut self, count: usize) -> Vec<TweetData> {
        (0..count)
            .map(|_| {
                let kind = self.pick_kind(0.8, 0.9);
                self.generate(kind)
            })
            .collect()
    }

    /// Next live tweet: 70% tweets, 15% replies, 15% quotes.
    pub fn next_live(&mut self) -> TweetData {
        let kind = self.pick_kind(0.7, 0.85);
        self.generate(kind)
    }

    /// Random delay between live tweets.
    pub fn live_interval(&mut self, min_ms: u64, max_ms: u64) -> Duration {
        let (low, high) = if min_ms <= max_ms {
            (min_ms, max_ms)
        } else {
            (max_ms, min_ms)
        };
        Duration::from_millis(self.rng.gen_range(low..=high))
    }

    fn pick_kind(&mut self, tweet_below: f64, reply_below: f64) -> TweetKind {
        let roll: f64 = self.rng.r#gen();
        if roll < tweet_below {
            TweetKind::Tweet
        } else if roll < reply_below {
            TweetKind::Reply
        } else {
            TweetKind::Quote
        }
    }

    /// Generate one tweet. Replies and quotes fall back to plain tweets
    /// while no recent tweet exists.
    pub fn generate(&mut self, kind: TweetKind) -> TweetData {
        let target = match kind {
            TweetKind::Tweet => None,
            TweetKind::Reply | TweetKind::Quote => {
                let index = self.rng.gen_range(0..self.recent.len().max(1));
                self.recent.get(index).cloned()
            }
        };
        let kind = if target.is_some() {
            kind
        } else {
            TweetKind::Tweet
        };

        let templates = match kind {
            TweetKind::Tweet => TWEET_TEMPLATES,
            TweetKind::Reply => REPLY_TEMPLATES,
            TweetKind::Quote => QUOTE_TEMPLATES,
        };
        let template = self.choose(templates);
        let subs = Substitutions {
            feature: self.choose(FEATURES),
            url: self.choose(URLS),
            date: self.choose(DATES),
            new_feature: self.choose(FEATURES),
        };
        let mut text = fill_template(template, &subs);
        if let (TweetKind::Reply, Some(target)) = (kind, &target) {
            let mention = format!("@{}", target.username);
            if !text.contains(&mention) {
                text = format!("{mention} {text}");
            }
        }

        let image_chance = if kind == TweetKind::Quote { 0.5 } else { 0.3 };
        let media_url = self.rng.gen_bool(image_chance).then(|| {
            let image = self.choose(IMAGE_URLS);
            format!("{image}?seed={}", self.rng.gen_range(0..1000))
        });

        let user = &USERS[self.rng.gen_range(0..USERS.len())];
        let now = Utc::now();
        let views = self.rng.gen_range(100..2_000_000);

        let tweet = TweetData {
            tweet_id: self.rng.gen_range(1..10_000_000_000_000_000u64).to_string(),
            username: user.username.to_string(),
            display_name: user.display_name.to_string(),
            profile_image: format!("https://unavatar.io/x/{}", user.username),
            created_at: now.to_rfc2822(),
            views: compact_count(views),
            engagement: Engagement {
                favorites: self.rng.gen_range(0..5000),
                retweets: self.rng.gen_range(0..1000),
                replies: self.rng.gen_range(0..200),
                quote_tweets: self.rng.gen_range(0..100),
            },
            source: "kolwatch simulator".to_string(),
            user_id: user.user_id.to_string(),
            bio: user.bio.to_string(),
            user_created_at: user.created_at.to_string(),
            followers: user.followers,
            following: user.following,
            tweet_count: user.tweet_count,
            favorites: user.favorites,
            verified: user.verified.to_string(),
            affiliated_with: user.affiliated_with.map(str::to_string),
            links: extract_link(&text).map(str::to_string).into_iter().collect(),
            media_url,
            category: "kol".to_string(),
            priority: if user.followers > 1_000_000 { "high" } else { "normal" }.to_string(),
            quoted_tweet: match (kind, &target) {
                (TweetKind::Quote, Some(target)) => serde_json::to_value(target).ok(),
                _ => None,
            },
            kind: kind.as_str().to_string(),
            timestamp: now.timestamp_millis(),
            delay_seconds: self.rng.gen_range(0.0..3.0),
            text: truncate_text(&text),
        };

        self.remember(&tweet);
        tweet
    }

    fn remember(&mut self, tweet: &TweetData) {
        if self.recent_window == 0 {
            return;
        }
        // Quotes embed their target; keep the window from nesting deeper.
        let mut entry = tweet.clone();
        entry.quoted_tweet = None;
        self.recent.push_front(entry);
        self.recent.truncate(self.recent_window);
    }

    fn choose(&mut self, items: &'static [&'static str]) -> &'static str {
        items.choose(&mut self.rng).copied().unwrap_or_default()
    }
}
