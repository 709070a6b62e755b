//! The reconciliation driver.
//!
//! A run has two passes with a barrier in between:
//! 1. every Garoon event in the window is created, updated or left alone;
//! 2. every engine-owned target event in the window is checked against its
//!    source and deleted when the source no longer wants it on the calendar.
//!
//! Per-event work runs concurrently up to `SyncContext::concurrency`. A failure
//! in one event is logged and recorded; it never stops the others.

mod outcome;

pub use outcome::{DeleteReason, DeletionOutcome, RunReport, SkipReason, SyncOutcome};

use futures_util::stream::{self, StreamExt};
use tracing::Instrument;

use crate::context::SyncContext;
use crate::correlation;
use crate::diff::{self, Verdict};
use crate::error::{SyncError, SyncResult};
use crate::event::CanonicalEvent;
use crate::source::SourceEvent;
use crate::store::{EventQuery, SourceStore, TargetStore};
use crate::target::TargetEvent;

pub struct Reconciler<'a, S: ?Sized, T: ?Sized> {
    source: &'a S,
    target: &'a T,
    ctx: &'a SyncContext,
}

impl<'a, S, T> Reconciler<'a, S, T>
where
    S: SourceStore + ?Sized,
    T: TargetStore + ?Sized,
{
    pub fn new(source: &'a S, target: &'a T, ctx: &'a SyncContext) -> Self {
        Reconciler {
            source,
            target,
            ctx,
        }
    }

    /// Run both passes.
    ///
    /// Only a failed source listing is an error; everything else ends up in the
    /// report.
    pub async fn run(&self) -> SyncResult<RunReport> {
        let span = tracing::info_span!(
            "sync",
            calendar = %self.ctx.calendar_id,
            user = %self.ctx.user_id,
            dry_run = self.ctx.dry_run,
        );

        self.run_passes().instrument(span).await
    }

    async fn run_passes(&self) -> SyncResult<RunReport> {
        let mut report = RunReport::default();
        self.sync_pass(&mut report).await?;
        self.deletion_pass(&mut report).await;
        tracing::info!(%report, "Sync finished");
        Ok(report)
    }

    async fn sync_pass(&self, report: &mut RunReport) -> SyncResult<()> {
        let events = self.source.events(&self.ctx.window).await?;
        tracing::info!(
            count = events.len(),
            from = %self.ctx.window.from_rfc3339(),
            to = %self.ctx.window.to_rfc3339(),
            "Fetched Garoon events"
        );

        let outcomes: Vec<SyncOutcome> = stream::iter(events.iter())
            .map(|event| self.sync_event(event))
            .buffer_unordered(self.ctx.concurrency.max(1))
            .collect()
            .await;

        for outcome in &outcomes {
            report.record(outcome);
        }
        Ok(())
    }

    async fn deletion_pass(&self, report: &mut RunReport) {
        let query = EventQuery::in_range(&self.ctx.window);
        let events = match self.target.list_events(&self.ctx.calendar_id, &query).await {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to list target events, skipping deletion check");
                report.deletion_pass_skipped = true;
                return;
            }
        };
        tracing::info!(count = events.len(), "Checking target events for deletion");

        let outcomes: Vec<DeletionOutcome> = stream::iter(events.iter())
            .map(|event| self.check_deletion(event))
            .buffer_unordered(self.ctx.concurrency.max(1))
            .collect()
            .await;

        for outcome in &outcomes {
            report.record_deletion(outcome);
        }
    }

    /// Decide and apply the first-pass action for one source event.
    pub async fn sync_event(&self, event: &SourceEvent) -> SyncOutcome {
        let skip = |reason: SkipReason| {
            tracing::info!(source_id = %event.id, reason = %reason, "Skipping {}", event.detail);
            SyncOutcome::Skipped(reason)
        };

        if !event.is_member(&self.ctx.user_id) {
            return skip(SkipReason::NotMember);
        }
        if event.is_excluded() {
            return skip(SkipReason::Excluded);
        }

        let canonical = match CanonicalEvent::from_source(event, self.ctx.default_zone) {
            Ok(canonical) => canonical,
            Err(e) if e.is_translation() => return skip(SkipReason::Untranslatable(e)),
            Err(e) => return SyncOutcome::Failed(e.to_string()),
        };

        match self.write_event(&canonical).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(source_id = %canonical.id, error = %e, "Failed to sync event");
                SyncOutcome::Failed(e.to_string())
            }
        }
    }

    async fn write_event(&self, canonical: &CanonicalEvent) -> SyncResult<SyncOutcome> {
        let calendar_id = self.ctx.calendar_id.as_str();
        let summary = canonical.summary();
        let existing = correlation::find_by_marker(self.target, calendar_id, &canonical.id).await?;

        let Some(existing) = existing else {
            if !self.ctx.dry_run {
                self.target
                    .insert_event(calendar_id, &canonical.to_target())
                    .await?;
            }
            tracing::info!(
                source_id = %canonical.id,
                start = %canonical.span.start_string(),
                dry_run = self.ctx.dry_run,
                "+ {}",
                summary
            );
            return Ok(SyncOutcome::Created);
        };

        match diff::compare(canonical, &existing) {
            Verdict::Equal => {
                tracing::debug!(source_id = %canonical.id, "Unchanged");
                Ok(SyncOutcome::Unchanged)
            }
            Verdict::Changed(mismatch) => {
                let target_id = existing.id.as_deref().ok_or_else(|| {
                    SyncError::remote("target", "listed event carries no id")
                })?;
                if !self.ctx.dry_run {
                    self.target
                        .update_event(calendar_id, target_id, &canonical.apply_to(&existing))
                        .await?;
                }
                tracing::info!(
                    source_id = %canonical.id,
                    target_id,
                    reason = %mismatch,
                    dry_run = self.ctx.dry_run,
                    "~ {}",
                    summary
                );
                Ok(SyncOutcome::Updated(mismatch))
            }
        }
    }

    /// Decide and apply the deletion-pass action for one target event.
    pub async fn check_deletion(&self, event: &TargetEvent) -> DeletionOutcome {
        let Some(source_id) = correlation::marker_value(event) else {
            return DeletionOutcome::Ignored;
        };

        match self.delete_if_orphaned(source_id, event).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(
                    source_id,
                    target_id = event.display_id(),
                    error = %e,
                    "Failed deletion check"
                );
                DeletionOutcome::Failed(e.to_string())
            }
        }
    }

    async fn delete_if_orphaned(
        &self,
        source_id: &str,
        event: &TargetEvent,
    ) -> SyncResult<DeletionOutcome> {
        let reason = match self.source.event_by_id(source_id).await? {
            None => DeleteReason::SourceGone,
            Some(source) if !source.is_member(&self.ctx.user_id) => DeleteReason::NoLongerMember,
            Some(source) if source.is_excluded() => DeleteReason::Excluded,
            Some(_) => return Ok(DeletionOutcome::Kept),
        };

        let target_id = event
            .id
            .as_deref()
            .ok_or_else(|| SyncError::remote("target", "listed event carries no id"))?;

        if !self.ctx.dry_run {
            self.target
                .delete_event(&self.ctx.calendar_id, target_id)
                .await?;
        }
        tracing::info!(
            source_id,
            target_id,
            reason = %reason,
            dry_run = self.ctx.dry_run,
            "- {}",
            event.summary
        );
        Ok(DeletionOutcome::Deleted(reason))
    }
}
