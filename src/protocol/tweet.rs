//! Tweet payload carried by `new_tweet` frames.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Engagement counters for a tweet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Engagement {
    #[serde(deserialize_with = "lenient::count")]
    pub favorites: u64,
    #[serde(deserialize_with = "lenient::count")]
    pub retweets: u64,
    #[serde(deserialize_with = "lenient::count")]
    pub replies: u64,
    #[serde(deserialize_with = "lenient::count")]
    pub quote_tweets: u64,
}

impl Engagement {
    /// Sum of all interaction counters.
    pub fn total(&self) -> u64 {
        self.favorites + self.retweets + self.replies + self.quote_tweets
    }
}

/// A tweet as pushed by the monitor.
///
/// Every field defaults when absent or `null`, and scalar fields accept
/// either a string or a number, so a present payload is always delivered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TweetData {
    #[serde(deserialize_with = "lenient::text")]
    pub tweet_id: String,
    #[serde(deserialize_with = "lenient::text")]
    pub username: String,
    #[serde(deserialize_with = "lenient::text")]
    pub display_name: String,
    #[serde(deserialize_with = "lenient::text")]
    pub profile_image: String,
    #[serde(deserialize_with = "lenient::text")]
    pub created_at: String,
    #[serde(deserialize_with = "lenient::text")]
    pub text: String,
    /// View count as formatted by the monitor (e.g. "12.4K").
    #[serde(deserialize_with = "lenient::text")]
    pub views: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub engagement: Engagement,
    #[serde(deserialize_with = "lenient::text")]
    pub source: String,
    #[serde(deserialize_with = "lenient::text")]
    pub user_id: String,
    #[serde(deserialize_with = "lenient::text")]
    pub bio: String,
    #[serde(deserialize_with = "lenient::text")]
    pub user_created_at: String,
    #[serde(deserialize_with = "lenient::count")]
    pub followers: u64,
    #[serde(deserialize_with = "lenient::count")]
    pub following: u64,
    #[serde(deserialize_with = "lenient::count")]
    pub tweet_count: u64,
    #[serde(deserialize_with = "lenient::count")]
    pub favorites: u64,
    /// Verification kind as a string ("blue", "business", "false", ...).
    #[serde(deserialize_with = "lenient::text")]
    pub verified: String,
    #[serde(deserialize_with = "lenient::optional_text")]
    pub affiliated_with: Option<String>,
    #[serde(deserialize_with = "lenient::text_list")]
    pub links: Vec<String>,
    #[serde(deserialize_with = "lenient::optional_text")]
    pub media_url: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub category: String,
    #[serde(deserialize_with = "lenient::text")]
    pub priority: String,
    pub quoted_tweet: Option<serde_json::Value>,
    /// Tweet kind: "tweet", "reply", "quote", ...
    #[serde(rename = "type", deserialize_with = "lenient::text")]
    pub kind: String,
    /// Epoch milliseconds at which the monitor observed the tweet.
    #[serde(deserialize_with = "lenient::millis")]
    pub timestamp: i64,
    #[serde(deserialize_with = "lenient::seconds")]
    pub delay_seconds: f64,
}

impl TweetData {
    /// Observation time as a UTC datetime.
    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }

    /// Whether the tweet carries a media attachment.
    pub fn has_media(&self) -> bool {
        self.media_url.as_deref().is_some_and(|url| !url.is_empty())
    }

    /// Whether this tweet quotes another one.
    pub fn is_quote(&self) -> bool {
        self.quoted_tweet.as_ref().is_some_and(|q| !q.is_null())
    }

    /// One-line summary used by the headless feed.
    pub fn summary(&self) -> String {
        let text: String = self.text.chars().take(80).collect();
        let ellipsis = if self.text.chars().count() > 80 { "…" } else { "" };
        format!(
            "@{} [{}] {}{}",
            self.username,
            self.engagement.total(),
            text.replace('\n', " "),
            ellipsis
        )
    }
}

/// Field deserializers that map `null` and mismatched scalars to sensible values.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }

    fn to_text(value: Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            other => Some(other.to_string()),
        }
    }

    fn to_f64(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(to_text(Value::deserialize(deserializer)?).unwrap_or_default())
    }

    pub fn optional_text<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(to_text(Value::deserialize(deserializer)?))
    }

    pub fn text_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => items.into_iter().filter_map(to_text).collect(),
            Value::String(s) => vec![s],
            _ => Vec::new(),
        })
    }

    pub fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match &value {
            Value::Number(n) => n.as_u64(),
            _ => None,
        }
        .or_else(|| to_f64(&value).map(|f| f.max(0.0) as u64))
        .unwrap_or_default())
    }

    pub fn millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match &value {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
        .or_else(|| to_f64(&value).map(|f| f as i64))
        .unwrap_or_default())
    }

    pub fn seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(to_f64(&Value::deserialize(deserializer)?).unwrap_or_default())
    }
}
