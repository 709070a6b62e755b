//! Per-run settings, built once at startup and handed to the driver.

use chrono_tz::Tz;

use crate::date_range::DateRange;

pub const DEFAULT_CONCURRENCY: usize = 8;

#[derive(Debug, Clone)]
pub struct SyncContext {
    /// Garoon user whose membership decides inclusion
    pub user_id: String,
    pub calendar_id: String,
    pub window: DateRange,
    /// Zone for source events that carry none
    pub default_zone: Tz,
    /// Upper bound on in-flight per-event tasks in a pass
    pub concurrency: usize,
    /// Decide everything, write nothing
    pub dry_run: bool,
}

impl SyncContext {
    pub fn new(user_id: String, calendar_id: String, window: DateRange, default_zone: Tz) -> Self {
        SyncContext {
            user_id,
            calendar_id,
            window,
            default_zone,
            concurrency: DEFAULT_CONCURRENCY,
            dry_run: false,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}
