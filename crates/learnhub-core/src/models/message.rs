use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct Message {
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// A message to a course's instructor.
#[derive(Debug, Clone, Serialize)]
pub struct NewMessage {
    /// Username of the recipient
    pub receiver: String,
    pub content: String,
}
