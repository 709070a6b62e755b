//! The two remote stores the engine talks to.
//!
//! Provider crates implement these; the engine never sees transports.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::date_range::DateRange;
use crate::error::SyncResult;
use crate::source::SourceEvent;
use crate::target::TargetEvent;

/// The authoritative schedule (Garoon).
#[async_trait]
pub trait SourceStore: Send + Sync {
    /// Id of the user whose credentials the store uses.
    async fn login_user_id(&self) -> SyncResult<String>;

    /// All events overlapping `range`, repeating events included.
    async fn events(&self, range: &DateRange) -> SyncResult<Vec<SourceEvent>>;

    /// A single event, or None when it no longer exists.
    async fn event_by_id(&self, id: &str) -> SyncResult<Option<SourceEvent>>;
}

/// The calendar being kept in sync (Google Calendar).
#[async_trait]
pub trait TargetStore: Send + Sync {
    /// Calendar ids visible to the authorized user, in listing order.
    async fn calendars(&self) -> SyncResult<Vec<String>>;

    async fn list_events(&self, calendar_id: &str, query: &EventQuery)
    -> SyncResult<Vec<TargetEvent>>;

    async fn insert_event(&self, calendar_id: &str, event: &TargetEvent) -> SyncResult<TargetEvent>;

    async fn update_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        event: &TargetEvent,
    ) -> SyncResult<TargetEvent>;

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> SyncResult<()>;
}

/// Filters for a target listing. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventQuery {
    /// `key=value`, matched against private extended properties
    pub private_property: Option<String>,
    pub time_min: Option<DateTime<Utc>>,
    pub time_max: Option<DateTime<Utc>>,
}

impl EventQuery {
    pub fn by_marker(filter: String) -> Self {
        EventQuery {
            private_property: Some(filter),
            ..Default::default()
        }
    }

    pub fn in_range(range: &DateRange) -> Self {
        EventQuery {
            private_property: None,
            time_min: Some(range.from),
            time_max: Some(range.to),
        }
    }
}
