//! Target (calendar store) event values.
//!
//! Provider crates convert their wire types into these, and the engine only
//! ever compares and writes `TargetEvent`s.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetEvent {
    /// Store-assigned id; None for events that have not been inserted yet
    pub id: Option<String>,
    pub summary: String,
    pub description: String,
    pub start: TargetTime,
    pub end: TargetTime,
    /// Recurrence entries, e.g. `RRULE:FREQ=DAILY;UNTIL=20240630`
    pub recurrence: Vec<String>,
    /// Private extended properties; None when the store returned no container
    pub private_properties: Option<HashMap<String, String>>,
}

/// One boundary of a target event. Exactly one of `date`/`date_time` is set
/// on well-formed events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetTime {
    pub date: Option<String>,
    pub date_time: Option<String>,
    pub time_zone: Option<String>,
}

impl TargetTime {
    pub fn date(date: impl Into<String>) -> Self {
        TargetTime {
            date: Some(date.into()),
            ..Default::default()
        }
    }

    pub fn date_time(date_time: impl Into<String>, time_zone: Option<String>) -> Self {
        TargetTime {
            date: None,
            date_time: Some(date_time.into()),
            time_zone,
        }
    }
}

impl TargetEvent {
    pub fn is_recurring(&self) -> bool {
        !self.recurrence.is_empty()
    }

    /// Id for log lines; new events have none yet.
    pub fn display_id(&self) -> &str {
        self.id.as_deref().unwrap_or("(new)")
    }
}
