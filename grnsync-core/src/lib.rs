//! Event translation and reconciliation engine for grnsync.
//!
//! This crate knows nothing about HTTP, XML or OAuth. Provider crates decode
//! their wire formats into [`SourceEvent`] and [`TargetEvent`] and implement
//! [`SourceStore`] / [`TargetStore`]; the [`Reconciler`] does the rest.

pub mod context;
pub mod correlation;
pub mod date_range;
pub mod diff;
pub mod error;
pub mod event;
pub mod reconcile;
pub mod recurrence;
pub mod source;
pub mod span;
pub mod store;
pub mod target;

pub use context::SyncContext;
pub use date_range::DateRange;
pub use error::{SyncError, SyncResult};
pub use event::CanonicalEvent;
pub use reconcile::{Reconciler, RunReport};
pub use source::SourceEvent;
pub use store::{EventQuery, SourceStore, TargetStore};
pub use target::{TargetEvent, TargetTime};
