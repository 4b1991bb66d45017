use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::sleep;

use crate::core::config::AutoVacuumOptions;
use crate::index::store::IndexStore;

/// Coalesces vacuum requests: at most one pass runs at a time, and at most
/// one follow-up request is queued behind it. A request arriving while a
/// pass is in flight folds its conditions into whichever request is already
/// queued, taking the looser (minimum) threshold of the two so neither
/// caller's intent is lost.
pub struct VacuumScheduler<ID> {
    store: Arc<parking_lot::RwLock<IndexStore<ID>>>,
    state: Mutex<SchedulerState>,
    done_tx: watch::Sender<u64>,
}

struct SchedulerState {
    running: bool,
    enqueued: Option<AutoVacuumOptions>,
    generation: u64,
}

impl<ID: Eq + Hash + Clone + Send + Sync + 'static> VacuumScheduler<ID> {
    pub fn new(store: Arc<parking_lot::RwLock<IndexStore<ID>>>) -> Self {
        let (done_tx, _) = watch::channel(0);
        VacuumScheduler {
            store,
            state: Mutex::new(SchedulerState {
                running: false,
                enqueued: None,
                generation: 0,
            }),
            done_tx,
        }
    }

    /// Requests a vacuum pass under `conditions`. If no pass is running, one
    /// starts immediately (unconditionally — the condition check only gates
    /// whether a *follow-up* pass, queued behind an in-flight one, actually
    /// runs once its turn comes). If a pass is already running, folds
    /// `conditions` into the pending follow-up, keeping whichever of the two
    /// thresholds is looser.
    pub fn request(self: &Arc<Self>, conditions: AutoVacuumOptions) {
        let mut state = self.state.lock();
        if state.running {
            state.enqueued = Some(match state.enqueued.take() {
                Some(existing) => fold_conditions(existing, conditions),
                None => conditions,
            });
            return;
        }
        state.running = true;
        drop(state);

        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            scheduler.run_pass(conditions).await;
        });
    }

    /// Awaits the completion of whichever vacuum pass is current (or the
    /// next one, if none is running) by driving a pass directly when idle.
    pub async fn run_and_wait(self: &Arc<Self>, conditions: AutoVacuumOptions) {
        let mut state = self.state.lock();
        if state.running {
            state.enqueued = Some(match state.enqueued.take() {
                Some(existing) => fold_conditions(existing, conditions),
                None => conditions,
            });
            let target_generation = state.generation + 1;
            drop(state);
            let mut rx = self.done_tx.subscribe();
            while *rx.borrow() < target_generation {
                if rx.changed().await.is_err() {
                    break;
                }
            }
            return;
        }
        state.running = true;
        drop(state);
        self.run_pass(conditions).await;
    }

    async fn run_pass(self: Arc<Self>, conditions: AutoVacuumOptions) {
        loop {
            let terms = self.store.read().term_keys();
            for chunk in terms.chunks(conditions.batch_size.max(1)) {
                {
                    let mut store = self.store.write();
                    for term in chunk {
                        store.vacuum_term(term);
                    }
                }
                if conditions.batch_wait.as_nanos() > 0 {
                    sleep(conditions.batch_wait).await;
                }
            }
            {
                let mut store = self.store.write();
                store.finish_vacuum();
            }

            let mut state = self.state.lock();
            state.generation += 1;
            self.done_tx.send_replace(state.generation);

            match state.enqueued.take() {
                Some(next) if self.should_run(&next) => {
                    drop(state);
                    continue;
                }
                _ => {
                    state.running = false;
                    break;
                }
            }
        }
    }

    /// A queued pass is skipped when either threshold fails to hold against
    /// the post-pass counters (§4.6): both must be met for it to proceed.
    fn should_run(&self, conditions: &AutoVacuumOptions) -> bool {
        let store = self.store.read();
        store.dirt_count() >= conditions.min_dirt_count && store.dirt_factor() >= conditions.min_dirt_factor
    }
}

/// When two pending requests fold together, the combined pass must satisfy
/// whichever caller asked for the most eager trigger, so the merged
/// threshold is the minimum of the two.
fn fold_conditions(a: AutoVacuumOptions, b: AutoVacuumOptions) -> AutoVacuumOptions {
    AutoVacuumOptions {
        min_dirt_count: a.min_dirt_count.min(b.min_dirt_count),
        min_dirt_factor: a.min_dirt_factor.min(b.min_dirt_factor),
        batch_size: a.batch_size.min(b.batch_size),
        batch_wait: a.batch_wait.min(b.batch_wait),
    }
}
