//! The sync window.

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{SyncError, SyncResult};

/// Half-open instant range used for the source listing and the deletion pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        DateRange { from, to }
    }

    /// From `now` to midnight of the last day of `now`'s month (in `zone`),
    /// moved `months_ahead` months forward.
    pub fn sync_window(now: DateTime<Utc>, months_ahead: u32, zone: Tz) -> SyncResult<Self> {
        let today = now.with_timezone(&zone).date_naive();
        let end_date = last_day_of_month(today)
            .and_then(|d| d.checked_add_months(Months::new(months_ahead)))
            .ok_or_else(|| {
                SyncError::Config(format!("sync window of {} months is out of range", months_ahead))
            })?;

        let to = zone
            .from_local_datetime(&end_date.and_time(NaiveTime::MIN))
            .earliest()
            .ok_or_else(|| SyncError::Config(format!("no local midnight on {}", end_date)))?
            .with_timezone(&Utc);

        Ok(DateRange { from: now, to })
    }

    pub fn from_rfc3339(&self) -> String {
        self.from.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    pub fn to_rfc3339(&self) -> String {
        self.to.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

fn last_day_of_month(date: NaiveDate) -> Option<NaiveDate> {
    let first = date.with_day(1)?;
    first.checked_add_months(Months::new(1))?.pred_opt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn last_day_handles_short_months() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        assert_eq!(last_day_of_month(d(2024, 2, 3)), Some(d(2024, 2, 29)));
        assert_eq!(last_day_of_month(d(2023, 2, 28)), Some(d(2023, 2, 28)));
        assert_eq!(last_day_of_month(d(2024, 12, 15)), Some(d(2024, 12, 31)));
    }

    #[test]
    fn window_ends_two_months_after_month_end() {
        let now = utc("2024-03-10T03:00:00Z");
        let range = DateRange::sync_window(now, 2, Tz::UTC).unwrap();
        assert_eq!(range.from, now);
        assert_eq!(range.to_rfc3339(), "2024-05-31T00:00:00Z");
    }

    #[test]
    fn window_end_is_local_midnight() {
        // 2024-01-31 20:00 UTC is already February in Tokyo
        let now = utc("2024-01-31T20:00:00Z");
        let range = DateRange::sync_window(now, 1, Tz::Asia__Tokyo).unwrap();
        assert_eq!(range.to_rfc3339(), "2024-03-28T15:00:00Z");
    }
}
