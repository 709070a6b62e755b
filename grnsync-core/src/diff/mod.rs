//! Equality between a translated source event and a previously synced target.

mod mismatch;

pub use mismatch::Mismatch;

use crate::correlation;
use crate::event::CanonicalEvent;
use crate::span;
use crate::target::TargetEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Equal,
    Changed(Mismatch),
}

impl Verdict {
    pub fn is_equal(&self) -> bool {
        matches!(self, Verdict::Equal)
    }
}

/// Compare field by field, stopping at the first difference.
///
/// Order: marker, summary, description, recurrence presence, recurrence
/// entries, span start, span end. Any difference means the whole mutable
/// field set gets rewritten.
pub fn compare(event: &CanonicalEvent, target: &TargetEvent) -> Verdict {
    match mismatch(event, target) {
        Some(m) => Verdict::Changed(m),
        None => Verdict::Equal,
    }
}

fn mismatch(event: &CanonicalEvent, target: &TargetEvent) -> Option<Mismatch> {
    let marker = correlation::marker_value(target);
    if marker != Some(event.id.as_str()) {
        return Some(Mismatch::Marker {
            expected: event.id.clone(),
            found: marker.map(str::to_string),
        });
    }

    let summary = event.summary();
    if summary != target.summary {
        return Some(Mismatch::Summary {
            expected: summary,
            found: target.summary.clone(),
        });
    }

    if event.description != target.description {
        return Some(Mismatch::Description);
    }

    if event.is_recurring() != target.is_recurring() {
        return Some(Mismatch::RecurrencePresence {
            expected: event.is_recurring(),
        });
    }

    if event.is_recurring() {
        let entries = event.recurrence_entries();
        if entries != target.recurrence {
            return Some(Mismatch::Recurrence {
                expected: entries,
                found: target.recurrence.clone(),
            });
        }
    }

    let (start, end) = span::span_of(target);

    let expected_start = event.span.start_string();
    if expected_start != start {
        return Some(Mismatch::Start {
            expected: expected_start,
            found: start,
        });
    }

    let expected_end = event.span.end_string();
    if expected_end != end {
        return Some(Mismatch::End {
            expected: expected_end,
            found: end,
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{RepeatCondition, SourceEvent, SourceSpan};
    use chrono_tz::Tz;

    fn canonical() -> CanonicalEvent {
        let source = SourceEvent {
            id: "42".into(),
            plan: "Meeting".into(),
            detail: "Planning".into(),
            description: "notes".into(),
            timezone: "Asia/Tokyo".into(),
            datetimes: vec![SourceSpan::new(
                "2024-03-01T01:00:00Z",
                Some("2024-03-01T02:00:00Z"),
            )],
            ..Default::default()
        };
        CanonicalEvent::from_source(&source, Tz::UTC).unwrap()
    }

    fn recurring() -> CanonicalEvent {
        let source = SourceEvent {
            id: "43".into(),
            detail: "Weekly sync".into(),
            timezone: "Asia/Tokyo".into(),
            repeat: Some(RepeatCondition {
                kind: "week".into(),
                week: Some("1".into()),
                start_date: "2024-01-01".into(),
                end_date: "2024-03-31".into(),
                start_time: Some("10:00:00".into()),
                end_time: Some("10:30:00".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        CanonicalEvent::from_source(&source, Tz::UTC).unwrap()
    }

    #[test]
    fn equality_is_reflexive() {
        for event in [canonical(), recurring()] {
            assert_eq!(compare(&event, &event.to_target()), Verdict::Equal);
        }
    }

    #[test]
    fn marker_is_checked_first() {
        let event = canonical();
        let mut target = event.to_target();
        target.private_properties = None;
        target.summary = "different".into();

        let verdict = compare(&event, &target);
        assert!(matches!(verdict, Verdict::Changed(Mismatch::Marker { found: None, .. })));
    }

    #[test]
    fn each_field_is_named() {
        let event = canonical();

        let mut target = event.to_target();
        target.summary = "Planning".into();
        assert_eq!(field(&event, &target), "summary");

        let mut target = event.to_target();
        target.description = "other".into();
        assert_eq!(field(&event, &target), "description");

        let mut target = event.to_target();
        target.recurrence = vec!["RRULE:FREQ=DAILY;UNTIL=20240301".into()];
        assert_eq!(field(&event, &target), "recurrence presence");

        let mut target = event.to_target();
        target.start.date_time = Some("2024-03-01T01:00:00Z".into());
        assert_eq!(field(&event, &target), "start");

        let mut target = event.to_target();
        target.end.date_time = Some("2024-03-01T12:00:00+09:00".into());
        assert_eq!(field(&event, &target), "end");
    }

    #[test]
    fn recurrence_entries_compared_in_order() {
        let event = recurring();
        let mut target = event.to_target();
        target.recurrence = vec!["RRULE:FREQ=WEEKLY;UNTIL=20240331;BYDAY=TU".into()];
        assert_eq!(field(&event, &target), "recurrence");

        let mut target = event.to_target();
        target.recurrence.push("EXDATE:20240108".into());
        assert_eq!(field(&event, &target), "recurrence");
    }

    #[test]
    fn same_instant_in_other_representation_is_a_change() {
        let event = canonical();
        let mut target = event.to_target();
        target.start.date_time = Some("2024-03-01T01:00:00+00:00".into());
        assert!(!compare(&event, &target).is_equal());
    }

    fn field(event: &CanonicalEvent, target: &TargetEvent) -> &'static str {
        match compare(event, target) {
            Verdict::Changed(m) => m.field(),
            Verdict::Equal => "equal",
        }
    }
}
