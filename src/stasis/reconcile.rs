//! Startup sweep that prunes stasis records whose actor is gone.
//!
//! A pass snapshots the token list once and is then drained a bounded batch
//! per host tick, so the worst-case cost of any single tick is `batch_size`
//! record checks regardless of table size.

use crate::core::{Result, StasisError, StasisRecord, TokenId};
use crate::host::StasisHost;
use crate::storage::RecordStore;
use chrono::{DateTime, Utc};
use log::{debug, info};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tracing::{Level, event, info_span};

/// Why a record was judged stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
    WorldUnavailable,
    ActorGone,
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaleReason::WorldUnavailable => write!(f, "world unavailable"),
            StaleReason::ActorGone => write!(f, "actor gone"),
        }
    }
}

/// Check one record against the host, force-loading its chunk if needed.
///
/// Returns `None` when the record still points at a live actor.
pub fn validate_record<H: StasisHost + ?Sized>(
    record: &StasisRecord,
    host: &mut H,
) -> Option<StaleReason> {
    if !host.world_exists(&record.world) {
        return Some(StaleReason::WorldUnavailable);
    }
    if !host.is_chunk_loaded(&record.world, record.chunk) {
        host.load_chunk(&record.world, record.chunk);
    }
    if !host.actor_exists(record.actor) {
        return Some(StaleReason::ActorGone);
    }
    None
}

/// What started a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileTrigger {
    Startup,
    OnDemand,
}

/// Summary of a finished pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Records validated against the host
    pub checked: usize,
    /// Records deleted as stale
    pub removed: usize,
    /// Tokens already gone from the table when their turn came
    pub skipped: usize,
    /// Ticks the pass spanned
    pub batches: usize,
    pub trigger: ReconcileTrigger,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileProgress {
    Running { remaining: usize },
    Finished(ReconcileReport),
}

/// A resumable reconciliation pass over a fixed snapshot of tokens.
#[derive(Debug)]
pub struct ReconcilePass {
    pending: std::vec::IntoIter<TokenId>,
    batch_size: usize,
    checked: usize,
    removed: usize,
    skipped: usize,
    batches: usize,
    trigger: ReconcileTrigger,
    started_at: DateTime<Utc>,
    done: Option<oneshot::Sender<Result<ReconcileReport>>>,
}

impl ReconcilePass {
    /// Start an on-demand pass over `ids`. A batch size of zero is treated as one.
    pub fn start(ids: Vec<TokenId>, batch_size: usize) -> (Self, ReconcileHandle) {
        Self::start_with(ids, batch_size, ReconcileTrigger::OnDemand)
    }

    pub fn start_with(
        ids: Vec<TokenId>,
        batch_size: usize,
        trigger: ReconcileTrigger,
    ) -> (Self, ReconcileHandle) {
        let (tx, rx) = oneshot::channel();
        let pass = Self {
            pending: ids.into_iter(),
            batch_size: batch_size.max(1),
            checked: 0,
            removed: 0,
            skipped: 0,
            batches: 0,
            trigger,
            started_at: Utc::now(),
            done: Some(tx),
        };
        (pass, ReconcileHandle { rx })
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn is_finished(&self) -> bool {
        self.done.is_none()
    }

    /// Process one batch. Returns `Finished` exactly once, on the call that
    /// exhausts the snapshot; further calls keep returning the final report.
    pub fn step<S, H>(&mut self, store: &mut S, host: &mut H) -> ReconcileProgress
    where
        S: RecordStore + ?Sized,
        H: StasisHost + ?Sized,
    {
        if self.is_finished() {
            return ReconcileProgress::Finished(self.report());
        }

        let span = info_span!("stasis_reconcile_batch", batch = self.batches + 1);
        let _enter = span.enter();

        self.batches += 1;
        for token in self.pending.by_ref().take(self.batch_size) {
            let Some(record) = store.get(&token).cloned() else {
                self.skipped += 1;
                continue;
            };
            self.checked += 1;
            if let Some(reason) = validate_record(&record, host) {
                debug!("Removing stale stasis entry {} ({})", token, reason);
                store.delete(&token);
                self.removed += 1;
            }
        }

        if self.pending.len() > 0 {
            return ReconcileProgress::Running {
                remaining: self.pending.len(),
            };
        }

        let report = self.report();
        event!(
            Level::INFO,
            checked = report.checked,
            removed = report.removed,
            batches = report.batches,
            "stasis reconcile pass complete"
        );
        if report.removed > 0 {
            info!(
                "Cleaned {} stale stasis entr{}{}.",
                report.removed,
                if report.removed == 1 { "y" } else { "ies" },
                match report.trigger {
                    ReconcileTrigger::Startup => " on startup",
                    ReconcileTrigger::OnDemand => "",
                }
            );
        } else {
            debug!("Stasis reconcile found no stale entries ({} checked)", report.checked);
        }
        if let Some(done) = self.done.take() {
            let _ = done.send(Ok(report.clone()));
        }
        ReconcileProgress::Finished(report)
    }

    /// Stop the pass early, resolving its handle with `Interrupted`.
    pub fn abort(mut self, reason: &str) {
        if let Some(done) = self.done.take() {
            let _ = done.send(Err(StasisError::Interrupted(reason.to_string())));
        }
    }

    fn report(&self) -> ReconcileReport {
        ReconcileReport {
            checked: self.checked,
            removed: self.removed,
            skipped: self.skipped,
            batches: self.batches,
            trigger: self.trigger,
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }
}

/// Completion handle for a reconcile pass.
///
/// Poll it from the tick loop with `try_report`, or `.await` it.
#[derive(Debug)]
pub struct ReconcileHandle {
    rx: oneshot::Receiver<Result<ReconcileReport>>,
}

impl ReconcileHandle {
    /// The outcome once the pass has finished, `None` while it is running.
    /// The outcome is handed out once.
    pub fn try_report(&mut self) -> Option<Result<ReconcileReport>> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(dropped())),
        }
    }
}

impl Future for ReconcileHandle {
    type Output = Result<ReconcileReport>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|outcome| outcome.unwrap_or_else(|_| Err(dropped())))
    }
}

fn dropped() -> StasisError {
    StasisError::Interrupted("reconcile pass dropped before completion".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ActorKind, ChunkPos, Location};
    use crate::host::sim::SimHost;
    use crate::storage::MemoryRecordStore;
    use uuid::Uuid;

    fn park_record(host: &mut SimHost, at: Location) -> StasisRecord {
        let actor = host.spawn(ActorKind::Pig, at.clone());
        StasisRecord::new(Uuid::new_v4(), at.world.clone(), actor, at.chunk(), ActorKind::Pig)
    }

    #[test]
    fn test_validate_loads_chunk_before_resolving() {
        let mut host = SimHost::new();
        host.add_world("world", 64);
        let at = Location::new("world", 100.0, 70.0, 100.0);
        let record = park_record(&mut host, at.clone());
        host.unload_chunk("world", at.chunk());

        assert_eq!(validate_record(&record, &mut host), None);
        assert_eq!(host.chunk_loads(), 1);
    }

    #[test]
    fn test_validate_flags_missing_world_and_actor() {
        let mut host = SimHost::new();
        host.add_world("world", 64);
        let record = park_record(&mut host, Location::new("world", 0.0, 70.0, 0.0));

        let orphan = StasisRecord { actor: Uuid::new_v4(), ..record.clone() };
        assert_eq!(validate_record(&orphan, &mut host), Some(StaleReason::ActorGone));

        let elsewhere = StasisRecord {
            world: "the_end".to_string(),
            chunk: ChunkPos::new(0, 0),
            ..record
        };
        assert_eq!(
            validate_record(&elsewhere, &mut host),
            Some(StaleReason::WorldUnavailable)
        );
    }

    #[test]
    fn test_step_respects_batch_size() {
        let mut host = SimHost::new();
        host.add_world("world", 64);
        let records: Vec<_> = (0..5)
            .map(|i| park_record(&mut host, Location::new("world", i as f64 * 20.0, 70.0, 0.0)))
            .collect();
        let mut store = MemoryRecordStore::with_records(records);

        let (mut pass, mut handle) = ReconcilePass::start(store.list_ids(), 2);
        assert_eq!(
            pass.step(&mut store, &mut host),
            ReconcileProgress::Running { remaining: 3 }
        );
        assert!(handle.try_report().is_none());
        assert_eq!(
            pass.step(&mut store, &mut host),
            ReconcileProgress::Running { remaining: 1 }
        );
        let ReconcileProgress::Finished(report) = pass.step(&mut store, &mut host) else {
            panic!("pass should finish on the third batch");
        };
        assert_eq!(report.checked, 5);
        assert_eq!(report.removed, 0);
        assert_eq!(report.batches, 3);
        assert_eq!(report.trigger, ReconcileTrigger::OnDemand);
        assert!(pass.is_finished());
        assert_eq!(handle.try_report().unwrap().unwrap().checked, 5);
    }

    #[test]
    fn test_empty_pass_finishes_on_first_step() {
        let mut host = SimHost::new();
        let mut store = MemoryRecordStore::new();
        let (mut pass, mut handle) = ReconcilePass::start(Vec::new(), 0);
        assert_eq!(pass.batch_size(), 1);
        assert!(matches!(
            pass.step(&mut store, &mut host),
            ReconcileProgress::Finished(ReconcileReport { checked: 0, removed: 0, .. })
        ));
        assert!(handle.try_report().unwrap().is_ok());
    }

    #[test]
    fn test_abort_and_drop_resolve_handle_as_interrupted() {
        let (pass, mut handle) = ReconcilePass::start(vec![Uuid::new_v4()], 1);
        pass.abort("superseded");
        assert!(matches!(
            handle.try_report(),
            Some(Err(StasisError::Interrupted(_)))
        ));

        let (pass, mut handle) = ReconcilePass::start(vec![Uuid::new_v4()], 1);
        drop(pass);
        assert!(matches!(
            handle.try_report(),
            Some(Err(StasisError::Interrupted(_)))
        ));
    }
}
