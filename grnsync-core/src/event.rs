//! Store-agnostic event model.
//!
//! A `CanonicalEvent` is built once from a Garoon record and is the only thing
//! the diff engine and the driver look at. It renders itself as the candidate
//! target event that would be written for it.

use std::collections::BTreeSet;

use chrono_tz::Tz;

use crate::correlation;
use crate::error::SyncResult;
use crate::recurrence::{self, RecurrenceRule};
use crate::source::{EXCLUSION_PREFIX, SourceEvent};
use crate::span::{self, TimeSpan};
use crate::target::TargetEvent;

#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalEvent {
    pub id: String,
    /// Garoon's "plan" label
    pub menu: String,
    /// Garoon's "detail"
    pub title: String,
    pub description: String,
    /// The span written to the target. For recurring events this is the
    /// series' first occurrence.
    pub span: TimeSpan,
    pub recurrence: Option<RecurrenceRule>,
    pub members: BTreeSet<String>,
    pub excluded: bool,
}

impl CanonicalEvent {
    /// Translate a source record.
    ///
    /// Fails with a translation error (`MalformedSpan` or
    /// `UnsupportedRecurrence`) when the event must not be written.
    pub fn from_source(event: &SourceEvent, default_zone: Tz) -> SyncResult<Self> {
        let (span, recurrence) = match &event.repeat {
            Some(condition) => {
                let (start_zone, end_zone) = span::event_zones(event, default_zone)?;
                let rule = recurrence::translate(condition, start_zone, end_zone)?;
                (rule.series.clone(), Some(rule))
            }
            None => (span::normalize_source_span(event, default_zone)?, None),
        };

        Ok(CanonicalEvent {
            id: event.id.clone(),
            menu: event.plan.clone(),
            title: event.detail.clone(),
            description: event.description.clone(),
            span,
            recurrence,
            members: event.members.iter().map(|m| m.id.clone()).collect(),
            excluded: event.detail.starts_with(EXCLUSION_PREFIX),
        })
    }

    /// `<menu>: title`, `<menu>`, or just `title`.
    pub fn summary(&self) -> String {
        format_summary(&self.menu, &self.title)
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    pub fn recurrence_entries(&self) -> Vec<String> {
        self.recurrence
            .as_ref()
            .map(RecurrenceRule::to_entries)
            .unwrap_or_default()
    }

    /// The candidate target event, marker included.
    ///
    /// Recurring events carry zone names on both boundaries; one-off events
    /// carry none.
    pub fn to_target(&self) -> TargetEvent {
        let (start, end) = self.span.to_target_times(self.is_recurring());
        TargetEvent {
            id: None,
            summary: self.summary(),
            description: self.description.clone(),
            start,
            end,
            recurrence: self.recurrence_entries(),
            private_properties: Some(correlation::marker_properties(&self.id)),
        }
    }

    /// Overwrite every mutable field of `existing` with this event's values.
    /// The target id and the marker are left as they are.
    pub fn apply_to(&self, existing: &TargetEvent) -> TargetEvent {
        let candidate = self.to_target();
        TargetEvent {
            id: existing.id.clone(),
            summary: candidate.summary,
            description: candidate.description,
            start: candidate.start,
            end: candidate.end,
            recurrence: candidate.recurrence,
            private_properties: existing.private_properties.clone(),
        }
    }
}

pub fn format_summary(menu: &str, title: &str) -> String {
    match (menu.is_empty(), title.is_empty()) {
        (true, _) => title.to_string(),
        (false, true) => format!("<{}>", menu),
        (false, false) => format!("<{}>: {}", menu, title),
    }
}
