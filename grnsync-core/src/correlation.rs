//! The marker that joins a target event to its Garoon source.
//!
//! The marker lives in the target event's private extended properties and is
//! the only state that survives between runs.

use std::collections::HashMap;

use crate::error::SyncResult;
use crate::store::{EventQuery, TargetStore};
use crate::target::TargetEvent;

pub const CORRELATION_KEY: &str = "garoon_event_id";

/// Source id stored on a target event, if the engine owns it.
pub fn marker_value(event: &TargetEvent) -> Option<&str> {
    event
        .private_properties
        .as_ref()?
        .get(CORRELATION_KEY)
        .map(String::as_str)
}

/// Listing filter matching events created for `source_id`.
pub fn marker_filter(source_id: &str) -> String {
    format!("{}={}", CORRELATION_KEY, source_id)
}

pub fn marker_properties(source_id: &str) -> HashMap<String, String> {
    HashMap::from([(CORRELATION_KEY.to_string(), source_id.to_string())])
}

/// Find the target event previously created for `source_id`.
pub async fn find_by_marker<T>(
    store: &T,
    calendar_id: &str,
    source_id: &str,
) -> SyncResult<Option<TargetEvent>>
where
    T: TargetStore + ?Sized,
{
    let query = EventQuery::by_marker(marker_filter(source_id));
    let mut matches = store.list_events(calendar_id, &query).await?;

    if matches.len() > 1 {
        tracing::warn!(
            source_id,
            count = matches.len(),
            "Several target events carry the same marker, using the first"
        );
    }

    if matches.is_empty() {
        Ok(None)
    } else {
        Ok(Some(matches.swap_remove(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_absent_without_container() {
        let event = TargetEvent::default();
        assert_eq!(marker_value(&event), None);
    }

    #[test]
    fn marker_absent_when_key_missing() {
        let event = TargetEvent {
            private_properties: Some(HashMap::from([("other".to_string(), "1".to_string())])),
            ..Default::default()
        };
        assert_eq!(marker_value(&event), None);
    }

    #[test]
    fn marker_round_trips_through_properties() {
        let event = TargetEvent {
            private_properties: Some(marker_properties("1234")),
            ..Default::default()
        };
        assert_eq!(marker_value(&event), Some("1234"));
        assert_eq!(marker_filter("1234"), "garoon_event_id=1234");
    }
}
