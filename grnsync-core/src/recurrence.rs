//! Translation of Garoon repeat conditions into RFC 5545 rules.
//!
//! Garoon names its repeat patterns ("day", "weekday", "2ndweek", ...) and keeps
//! the day of week as an ordinal. The target store wants `RRULE:` entries plus a
//! first-occurrence span.

use std::fmt;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Weekday};
use chrono_tz::Tz;

use crate::error::{SyncError, SyncResult};
use crate::source::RepeatCondition;
use crate::span::{TimeSpan, parse_date};

/// Rule entry prefix used by the target's `recurrence` list.
pub const RRULE_PREFIX: &str = "RRULE:";

/// Day-of-week tokens indexed by Garoon's ordinal (0 = Sunday).
const BYDAY_TOKENS: [&str; 7] = ["SU", "MO", "TU", "WE", "TH", "FR", "SA"];

/// Which week of the month a monthly-by-weekday rule fires in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthWeek {
    First,
    Second,
    Third,
    Fourth,
    Last,
}

impl MonthWeek {
    fn token(self) -> &'static str {
        match self {
            MonthWeek::First => "1",
            MonthWeek::Second => "2",
            MonthWeek::Third => "3",
            MonthWeek::Fourth => "4",
            MonthWeek::Last => "-1",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurrenceKind {
    Daily,
    Weekdays,
    NthWeekday { week: MonthWeek, weekday: Weekday },
    Weekly { weekday: Weekday },
    MonthlyByDate,
}

impl RecurrenceKind {
    /// Parse Garoon's condition `type` together with its `week` attribute.
    pub fn from_condition(kind: &str, week: Option<&str>) -> SyncResult<Self> {
        let nth = |week_of_month| -> SyncResult<Self> {
            Ok(RecurrenceKind::NthWeekday {
                week: week_of_month,
                weekday: weekday_from_ordinal(week)?,
            })
        };

        match kind {
            "day" => Ok(RecurrenceKind::Daily),
            "weekday" => Ok(RecurrenceKind::Weekdays),
            "1stweek" => nth(MonthWeek::First),
            "2ndweek" => nth(MonthWeek::Second),
            "3rdweek" => nth(MonthWeek::Third),
            "4thweek" => nth(MonthWeek::Fourth),
            "lastweek" => nth(MonthWeek::Last),
            "week" => Ok(RecurrenceKind::Weekly {
                weekday: weekday_from_ordinal(week)?,
            }),
            "month" => Ok(RecurrenceKind::MonthlyByDate),
            other => Err(SyncError::UnsupportedRecurrence(format!(
                "unknown repeat type '{}'",
                other
            ))),
        }
    }
}

/// A translated repeat condition.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurrenceRule {
    pub kind: RecurrenceKind,
    /// Last day of the series, inclusive
    pub until: NaiveDate,
    /// First occurrence
    pub series: TimeSpan,
}

impl RecurrenceRule {
    /// The rule without the `RRULE:` prefix.
    pub fn rule_body(&self) -> String {
        let until = self.until.format("%Y%m%d");
        match self.kind {
            RecurrenceKind::Daily => format!("FREQ=DAILY;UNTIL={}", until),
            RecurrenceKind::Weekdays => {
                format!("FREQ=WEEKLY;UNTIL={};BYDAY=MO,TU,WE,TH,FR", until)
            }
            RecurrenceKind::NthWeekday { week, weekday } => format!(
                "FREQ=MONTHLY;UNTIL={};BYDAY={}{}",
                until,
                week.token(),
                byday_token(weekday)
            ),
            RecurrenceKind::Weekly { weekday } => {
                format!("FREQ=WEEKLY;UNTIL={};BYDAY={}", until, byday_token(weekday))
            }
            RecurrenceKind::MonthlyByDate => format!("FREQ=MONTHLY;UNTIL={}", until),
        }
    }

    /// Entries for the target's `recurrence` field.
    pub fn to_entries(&self) -> Vec<String> {
        vec![format!("{}{}", RRULE_PREFIX, self.rule_body())]
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rule_body())
    }
}

/// Translate a repeat condition. `start_zone` and `end_zone` are the event's
/// resolved zones for the first occurrence's boundaries.
pub fn translate(
    condition: &RepeatCondition,
    start_zone: Tz,
    end_zone: Tz,
) -> SyncResult<RecurrenceRule> {
    let kind = RecurrenceKind::from_condition(condition.kind.trim(), condition.week.as_deref())?;

    let until = NaiveDate::parse_from_str(condition.end_date.trim(), "%Y-%m-%d").map_err(|_| {
        SyncError::UnsupportedRecurrence(format!(
            "invalid series end date '{}'",
            condition.end_date
        ))
    })?;

    let series = series_span(condition, start_zone, end_zone)?;

    Ok(RecurrenceRule {
        kind,
        until,
        series,
    })
}

fn weekday_from_ordinal(week: Option<&str>) -> SyncResult<Weekday> {
    let raw = week.map(str::trim).unwrap_or_default();
    let ordinal: usize = raw.parse().map_err(|_| {
        SyncError::UnsupportedRecurrence(format!("invalid day of week '{}'", raw))
    })?;

    match ordinal {
        0 => Ok(Weekday::Sun),
        1 => Ok(Weekday::Mon),
        2 => Ok(Weekday::Tue),
        3 => Ok(Weekday::Wed),
        4 => Ok(Weekday::Thu),
        5 => Ok(Weekday::Fri),
        6 => Ok(Weekday::Sat),
        _ => Err(SyncError::UnsupportedRecurrence(format!(
            "day of week {} is out of range 0-6",
            ordinal
        ))),
    }
}

fn byday_token(weekday: Weekday) -> &'static str {
    BYDAY_TOKENS[weekday.num_days_from_sunday() as usize]
}

/// First occurrence of the series: the start date with the condition's start
/// and end times. Never the whole multi-day series window.
fn series_span(condition: &RepeatCondition, start_zone: Tz, end_zone: Tz) -> SyncResult<TimeSpan> {
    let date = parse_date(&condition.start_date)?;

    let Some(start_time) = non_empty(condition.start_time.as_deref()) else {
        return Ok(TimeSpan::Dates {
            start: date,
            end: date,
        });
    };

    let start_time = parse_time(start_time)?;
    let end_time = match non_empty(condition.end_time.as_deref()) {
        Some(raw) => parse_time(raw)?,
        None => start_time,
    };

    Ok(TimeSpan::Instants {
        start: offset_shifted(date, start_time, start_zone),
        end: offset_shifted(date, end_time, end_zone),
        start_zone,
        end_zone,
    })
}

/// Series boundaries are read as UTC, re-expressed in `zone`, and then moved
/// back by that zone's UTC offset. The result shows the condition's wall-clock
/// time in `zone`, which is the encoding previously synced series carry.
///
/// This differs from [`crate::span::instant_in_zone`] on purpose. Changing it
/// would rewrite every existing recurring event on the next run.
fn offset_shifted(date: NaiveDate, time: NaiveTime, zone: Tz) -> DateTime<FixedOffset> {
    let in_zone = date.and_time(time).and_utc().with_timezone(&zone).fixed_offset();
    let offset = i64::from(in_zone.offset().local_minus_utc());
    in_zone - Duration::seconds(offset)
}

fn parse_time(raw: &str) -> SyncResult<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| SyncError::MalformedSpan(format!("invalid time of day '{}'", raw)))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
