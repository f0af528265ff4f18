//! The stasis service: park/release lifecycle, queries, and the startup
//! reconciler, all driven from the host's tick loop.
//!
//! Every operation takes `&mut self`, so park, release, remove and reconcile
//! batches never interleave. The host passes itself in on each call; the
//! service owns only the record store and its own deferred work.

pub mod capacity;
pub mod lifecycle;
pub mod query;
pub mod reconcile;

pub use capacity::{Admission, CapacityGuard};
pub use query::StasisStats;
pub use reconcile::{
    ReconcileHandle, ReconcilePass, ReconcileProgress, ReconcileReport, ReconcileTrigger,
    StaleReason, validate_record,
};

use crate::config::StasisConfig;
use crate::core::{ActorId, Result};
use crate::host::StasisHost;
use crate::scheduler::TickScheduler;
use crate::storage::{LoadReport, RecordStore};
use log::{debug, error, info};

/// Work deferred to a later tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredTask {
    /// Restore a released actor's live flags.
    Thaw(ActorId),
}

/// What a single `tick` did.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TickReport {
    pub thawed: usize,
    pub reconcile: Option<ReconcileProgress>,
    pub saved: bool,
}

pub struct StasisService<S: RecordStore> {
    store: S,
    config: StasisConfig,
    guard: CapacityGuard,
    scheduler: TickScheduler<DeferredTask>,
    reconcile: Option<ReconcilePass>,
    save_retry_at: Option<u64>,
}

impl<S: RecordStore> StasisService<S> {
    /// Wrap an already loaded store.
    pub fn new(store: S, config: StasisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            guard: CapacityGuard::from_config(&config.capacity),
            store,
            config,
            scheduler: TickScheduler::new(),
            reconcile: None,
            save_retry_at: None,
        })
    }

    /// Load `store` from stable storage and wrap it.
    pub fn open(mut store: S, config: StasisConfig) -> Result<(Self, LoadReport)> {
        config.validate()?;
        let report = store.load()?;
        Ok((Self::new(store, config)?, report))
    }

    pub fn config(&self) -> &StasisConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn capacity(&self) -> CapacityGuard {
        self.guard
    }

    /// Change the cap at runtime. Existing records are never evicted.
    pub fn set_capacity(&mut self, enabled: bool, limit: usize) {
        self.guard = CapacityGuard::new(enabled, limit);
        self.config.capacity.enabled = enabled;
        self.config.capacity.max_total = limit;
        info!("Stasis cap updated: enabled={}, max-total={}", enabled, limit);
    }

    /// Current host tick as counted by this service.
    pub fn now(&self) -> u64 {
        self.scheduler.now()
    }

    // ========================================================================
    // Reconciliation
    // ========================================================================

    /// Begin a reconciliation pass over every current record. Batches run on
    /// subsequent `tick` calls. A pass already in progress is replaced and its
    /// handle resolves to `Interrupted`.
    pub fn reconcile_async(&mut self, batch_size: usize) -> ReconcileHandle {
        self.begin_reconcile(batch_size, ReconcileTrigger::OnDemand)
    }

    /// `reconcile_async` with the configured batch size, reported as the
    /// startup pass.
    pub fn reconcile_on_startup(&mut self) -> ReconcileHandle {
        self.begin_reconcile(self.config.reconcile.batch_size, ReconcileTrigger::Startup)
    }

    fn begin_reconcile(&mut self, batch_size: usize, trigger: ReconcileTrigger) -> ReconcileHandle {
        if let Some(previous) = self.reconcile.take() {
            previous.abort("superseded by a new reconcile pass");
        }
        let (pass, handle) = ReconcilePass::start_with(self.store.list_ids(), batch_size, trigger);
        info!(
            "Scheduled stasis reconcile of {} entries in batches of {}",
            pass.remaining(),
            pass.batch_size()
        );
        self.reconcile = Some(pass);
        handle
    }

    pub fn is_reconciling(&self) -> bool {
        self.reconcile.is_some()
    }

    // ========================================================================
    // Tick Loop
    // ========================================================================

    /// Advance one host tick: run due thaws, one reconcile batch, and a pending
    /// save retry, in that order.
    pub fn tick<H: StasisHost + ?Sized>(&mut self, host: &mut H) -> TickReport {
        let mut report = TickReport::default();

        for task in self.scheduler.advance() {
            match task {
                DeferredTask::Thaw(actor) => {
                    if let Some(token) = self.store.find_by_actor(&actor) {
                        debug!("Skipping thaw of {}: parked again under {}", actor, token);
                        continue;
                    }
                    host.thaw(actor);
                    host.reset_motion(actor);
                    report.thawed += 1;
                }
            }
        }

        if let Some(pass) = self.reconcile.as_mut() {
            let progress = pass.step(&mut self.store, host);
            if let ReconcileProgress::Finished(summary) = &progress {
                self.reconcile = None;
                if summary.removed > 0 {
                    report.saved = self.persist("reconcile");
                }
            }
            report.reconcile = Some(progress);
        }

        if let Some(due) = self.save_retry_at {
            if !self.store.is_dirty() {
                self.save_retry_at = None;
            } else if self.scheduler.now() >= due {
                report.saved = self.persist("retry");
            }
        }

        report
    }

    /// Save immediately, returning the failure instead of scheduling a retry.
    pub fn flush(&mut self) -> Result<()> {
        self.store.save()?;
        self.save_retry_at = None;
        Ok(())
    }

    /// Save the table. Failures are logged and retried later; the in-memory
    /// table stays authoritative either way.
    fn persist(&mut self, after: &str) -> bool {
        match self.store.save() {
            Ok(()) => {
                self.save_retry_at = None;
                true
            }
            Err(err) => {
                let retry_at = self
                    .scheduler
                    .now()
                    .saturating_add(self.config.persistence.save_retry_ticks);
                error!(
                    "Failed to save stasis table after {} (retrying at tick {}): {}",
                    after, retry_at, err
                );
                self.save_retry_at = Some(retry_at);
                false
            }
        }
    }
}
