//! Append-only puzzle history and the tools that read it back.

mod backfill;
mod log;

pub use backfill::{
    BackfillFailure, BackfillReport, MtimeUpdate, apply_mtime, backfill_status_mtimes,
    effective_status, latest_status_changes, parse_legacy_comment,
};
pub use log::{AuditEntry, AuditLog};
