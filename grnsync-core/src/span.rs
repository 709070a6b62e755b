//! Time span normalization.
//!
//! The source reports datetimes as UTC instants plus a zone name, and dates as
//! inclusive `YYYY-MM-DD` ranges. The target wants wall-clock RFC 3339 strings in
//! the event's zone, and exclusive end dates.

use chrono::{DateTime, Days, FixedOffset, NaiveDate, SecondsFormat};
use chrono_tz::Tz;

use crate::error::{SyncError, SyncResult};
use crate::source::SourceEvent;
use crate::target::{TargetEvent, TargetTime};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A canonical, comparable event span.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeSpan {
    /// Zone-qualified instants. `start_zone` applies to start, `end_zone` to end.
    Instants {
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
        start_zone: Tz,
        end_zone: Tz,
    },
    /// All-day span. `end` is exclusive unless `start == end`.
    Dates { start: NaiveDate, end: NaiveDate },
}

impl TimeSpan {
    /// Build a date span from a source-style inclusive end.
    ///
    /// A zero-length span (start == end) is kept as-is; otherwise the end moves
    /// one day forward to become exclusive.
    pub fn from_inclusive_dates(start: NaiveDate, inclusive_end: NaiveDate) -> SyncResult<Self> {
        if start == inclusive_end {
            return Ok(TimeSpan::Dates {
                start,
                end: inclusive_end,
            });
        }

        let end = inclusive_end.checked_add_days(Days::new(1)).ok_or_else(|| {
            SyncError::MalformedSpan(format!("date {} is out of range", inclusive_end))
        })?;

        Ok(TimeSpan::Dates { start, end })
    }

    pub fn is_date_only(&self) -> bool {
        matches!(self, TimeSpan::Dates { .. })
    }

    pub fn start_string(&self) -> String {
        match self {
            TimeSpan::Instants { start, .. } => format_instant(start),
            TimeSpan::Dates { start, .. } => start.format(DATE_FORMAT).to_string(),
        }
    }

    pub fn end_string(&self) -> String {
        match self {
            TimeSpan::Instants { end, .. } => format_instant(end),
            TimeSpan::Dates { end, .. } => end.format(DATE_FORMAT).to_string(),
        }
    }

    /// Target boundaries for this span. Zone names are attached only when
    /// `with_zones` is set (the target requires them on recurring events).
    pub fn to_target_times(&self, with_zones: bool) -> (TargetTime, TargetTime) {
        match self {
            TimeSpan::Instants {
                start_zone,
                end_zone,
                ..
            } => {
                let zone = |tz: &Tz| with_zones.then(|| tz.name().to_string());
                (
                    TargetTime::date_time(self.start_string(), zone(start_zone)),
                    TargetTime::date_time(self.end_string(), zone(end_zone)),
                )
            }
            TimeSpan::Dates { .. } => (
                TargetTime::date(self.start_string()),
                TargetTime::date(self.end_string()),
            ),
        }
    }
}

/// RFC 3339 with whole seconds; UTC is written as `Z`.
pub fn format_instant(dt: &DateTime<FixedOffset>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Resolve an IANA zone name. An empty name falls back to `default`.
pub fn resolve_zone(name: &str, default: Tz) -> SyncResult<Tz> {
    if name.trim().is_empty() {
        return Ok(default);
    }

    name.trim()
        .parse::<Tz>()
        .map_err(|_| SyncError::MalformedSpan(format!("unknown timezone '{}'", name)))
}

/// Zones for an event's start and end boundaries.
pub fn event_zones(event: &SourceEvent, default: Tz) -> SyncResult<(Tz, Tz)> {
    let start_zone = resolve_zone(&event.timezone, default)?;
    let end_zone = match event.end_timezone.as_deref() {
        Some(name) if !name.trim().is_empty() => resolve_zone(name, default)?,
        _ => start_zone,
    };
    Ok((start_zone, end_zone))
}

/// Re-express an RFC 3339 instant in the wall-clock time of `zone`.
pub fn instant_in_zone(raw: &str, zone: Tz) -> SyncResult<DateTime<FixedOffset>> {
    let instant = DateTime::parse_from_rfc3339(raw.trim())
        .map_err(|e| SyncError::MalformedSpan(format!("invalid datetime '{}': {}", raw, e)))?;

    Ok(instant.with_timezone(&zone).fixed_offset())
}

pub fn parse_date(raw: &str) -> SyncResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| {
        SyncError::MalformedSpan(format!("invalid date '{}', expected YYYY-MM-DD", raw))
    })
}

/// Normalize the span of a source event.
///
/// Datetime entries win over date entries; only the first entry of either kind
/// is considered.
pub fn normalize_source_span(event: &SourceEvent, default_zone: Tz) -> SyncResult<TimeSpan> {
    if let Some(first) = event.datetimes.first() {
        let (start_zone, end_zone) = event_zones(event, default_zone)?;
        let raw_end = if event.start_only {
            first.start.as_str()
        } else {
            first.end_or_start()
        };

        return Ok(TimeSpan::Instants {
            start: instant_in_zone(&first.start, start_zone)?,
            end: instant_in_zone(raw_end, end_zone)?,
            start_zone,
            end_zone,
        });
    }

    if let Some(first) = event.dates.first() {
        let raw_end = if event.start_only {
            first.start.as_str()
        } else {
            first.end_or_start()
        };
        return TimeSpan::from_inclusive_dates(parse_date(&first.start)?, parse_date(raw_end)?);
    }

    Err(SyncError::MalformedSpan(format!(
        "event {} has neither datetime nor date entries",
        event.id
    )))
}

/// Span strings of a target event, read from whichever field is populated.
pub fn span_of(event: &TargetEvent) -> (String, String) {
    match event.start.date_time.as_deref() {
        Some(start) if !start.is_empty() => (
            start.to_string(),
            event.end.date_time.clone().unwrap_or_default(),
        ),
        _ => (
            event.start.date.clone().unwrap_or_default(),
            event.end.date.clone().unwrap_or_default(),
        ),
    }
}
