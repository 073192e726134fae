//! Timing and defaults for node-view synchronization

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tabula_document::DEFAULT_TITLE;

/// Debounce window for widget-to-document commits
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(150);

/// Quiet period after pushing data into a widget before its events count
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(50);

/// Serialized with millisecond fields:
///
/// ```json
/// { "debounceMs": 150, "settleDelayMs": 50, "maxWaitMs": 1000, "placeholderTitle": "Spreadsheet" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncConfig {
    #[serde(rename = "debounceMs", with = "millis")]
    pub debounce: Duration,

    #[serde(rename = "settleDelayMs", with = "millis")]
    pub settle_delay: Duration,

    /// Upper bound on how long a continuously re-armed debounce may defer a commit
    #[serde(
        rename = "maxWaitMs",
        with = "optional_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_wait: Option<Duration>,

    /// Title used when a node has none or the title field is cleared
    pub placeholder_title: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            settle_delay: DEFAULT_SETTLE_DELAY,
            max_wait: None,
            placeholder_title: DEFAULT_TITLE.to_string(),
        }
    }
}

impl SyncConfig {
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    /// `title`, or the placeholder when it is empty
    pub fn title_or_placeholder(&self, title: &str) -> String {
        if title.is_empty() {
            self.placeholder_title.clone()
        } else {
            title.to_string()
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

mod optional_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_some(&(duration.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}
