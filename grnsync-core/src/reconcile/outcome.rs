use std::fmt;

use crate::diff::Mismatch;
use crate::error::SyncError;

/// Terminal state of one source event in the first pass.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    Created,
    Updated(Mismatch),
    Unchanged,
    Skipped(SkipReason),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NotMember,
    Excluded,
    Untranslatable(SyncError),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotMember => write!(f, "not a member"),
            SkipReason::Excluded => write!(f, "excluded by title"),
            SkipReason::Untranslatable(err) => write!(f, "{}", err),
        }
    }
}

/// Terminal state of one target event in the deletion pass.
#[derive(Debug, Clone, PartialEq)]
pub enum DeletionOutcome {
    Deleted(DeleteReason),
    Kept,
    /// No marker; the event was not created by grnsync
    Ignored,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteReason {
    SourceGone,
    NoLongerMember,
    Excluded,
}

impl fmt::Display for DeleteReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteReason::SourceGone => write!(f, "source event no longer exists"),
            DeleteReason::NoLongerMember => write!(f, "no longer a member"),
            DeleteReason::Excluded => write!(f, "excluded by title"),
        }
    }
}

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
    pub deleted: usize,
    pub kept: usize,
    pub ignored: usize,
    pub delete_failed: usize,
    /// The target listing for the deletion pass failed
    pub deletion_pass_skipped: bool,
}

impl RunReport {
    pub fn record(&mut self, outcome: &SyncOutcome) {
        match outcome {
            SyncOutcome::Created => self.created += 1,
            SyncOutcome::Updated(_) => self.updated += 1,
            SyncOutcome::Unchanged => self.unchanged += 1,
            SyncOutcome::Skipped(_) => self.skipped += 1,
            SyncOutcome::Failed(_) => self.failed += 1,
        }
    }

    pub fn record_deletion(&mut self, outcome: &DeletionOutcome) {
        match outcome {
            DeletionOutcome::Deleted(_) => self.deleted += 1,
            DeletionOutcome::Kept => self.kept += 1,
            DeletionOutcome::Ignored => self.ignored += 1,
            DeletionOutcome::Failed(_) => self.delete_failed += 1,
        }
    }

    pub fn has_changes(&self) -> bool {
        self.created > 0 || self.updated > 0 || self.deleted > 0
    }

    pub fn failures(&self) -> usize {
        self.failed + self.delete_failed
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} unchanged, {} skipped, {} deleted, {} failed",
            self.created,
            self.updated,
            self.unchanged,
            self.skipped,
            self.deleted,
            self.failures()
        )?;
        if self.deletion_pass_skipped {
            write!(f, " (deletion check skipped)")?;
        }
        Ok(())
    }
}
