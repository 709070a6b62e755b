//! Source (Garoon) event records.
//!
//! These are the plain values the Garoon client decodes its XML into. They keep
//! the wire strings as-is; turning them into typed spans and rules is the job of
//! [`crate::span`] and [`crate::recurrence`].

use serde::{Deserialize, Serialize};

/// Title prefix that marks an event as excluded from syncing.
pub const EXCLUSION_PREFIX: &str = "*";

/// A schedule event as returned by the source service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceEvent {
    pub id: String,
    /// "normal", "repeat", "temporary", ...
    pub event_type: String,
    /// The "menu" label shown in brackets before the title
    pub plan: String,
    /// The title
    pub detail: String,
    pub description: String,
    /// Primary zone name (empty when the service omits it)
    pub timezone: String,
    /// Zone applied to the end boundary, when it differs from `timezone`
    pub end_timezone: Option<String>,
    pub start_only: bool,
    /// RFC 3339 UTC datetime pairs
    pub datetimes: Vec<SourceSpan>,
    /// YYYY-MM-DD pairs, end inclusive
    pub dates: Vec<SourceSpan>,
    pub members: Vec<Member>,
    pub repeat: Option<RepeatCondition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: String,
    /// Empty or absent means "same as start"
    pub end: Option<String>,
}

impl SourceSpan {
    pub fn new(start: &str, end: Option<&str>) -> Self {
        SourceSpan {
            start: start.to_string(),
            end: end.map(str::to_string),
        }
    }

    /// End boundary, falling back to start when the source left it empty.
    pub fn end_or_start(&self) -> &str {
        match self.end.as_deref() {
            Some(end) if !end.is_empty() => end,
            _ => &self.start,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub name: String,
}

/// The `repeat_info/condition` element of a repeating event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepeatCondition {
    /// day, weekday, week, 1stweek..4thweek, lastweek, month
    pub kind: String,
    /// Day of month (monthly-by-date); informational only
    pub day: Option<String>,
    /// Day-of-week ordinal, 0 = Sunday
    pub week: Option<String>,
    pub start_date: String,
    pub end_date: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl SourceEvent {
    pub fn is_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m.id == user_id)
    }

    pub fn is_excluded(&self) -> bool {
        self.detail.starts_with(EXCLUSION_PREFIX)
    }

    /// Whether the acting user should see this event on the target calendar.
    pub fn is_included_for(&self, user_id: &str) -> bool {
        self.is_member(user_id) && !self.is_excluded()
    }
}
