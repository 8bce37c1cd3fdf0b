use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Weak,
    },
    time::Duration,
};

use parking_lot::Mutex;
use tokio::{runtime::Handle, task::JoinHandle, time::Instant};

use crate::models::{cell::Cell, garden::CellMatrix, vegetable::VegetableId, Coordinate};

struct PendingRipening {
    seq: u64,
    target: VegetableId,
    fire_at: Instant,
    /// Claimed exactly once, either by the firing task or by a cancellation.
    settled: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl PendingRipening {
    fn is_active(&self) -> bool {
        !self.settled.load(Ordering::Acquire)
    }
}

type PendingMap = Arc<Mutex<HashMap<Coordinate, PendingRipening>>>;

/// Everything a spawned ripening task needs. It never owns the cell: the grid
/// is reached through a weak handle and a coordinate.
struct RipeningTask {
    at: Coordinate,
    seq: u64,
    target: VegetableId,
    fire_at: Instant,
    settled: Arc<AtomicBool>,
    cells: Weak<CellMatrix>,
    pending: PendingMap,
}

/// Arms one-shot "fertilizer ripens the vegetable" tasks on a tokio runtime.
///
/// At most one task is active per cell. Fertilizing again while a task is
/// pending does not arm another one, and harvesting the targeted vegetable
/// cancels it. Both the firing task and [`RipenessScheduler::cancel`] run with
/// the cell locked and settle the task through an atomic swap, so exactly one
/// of them takes effect.
pub struct RipenessScheduler {
    delay: Duration,
    runtime: Handle,
    next_seq: u64,
    pending: PendingMap,
}

impl RipenessScheduler {
    pub fn new(delay: Duration, runtime: Handle) -> Self {
        Self {
            delay,
            runtime,
            next_seq: 0,
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Arms a task for the current vegetable of `cell`, which the caller holds
    /// locked. Returns `false` when the cell has no vegetable or already has a
    /// pending task.
    pub fn arm(&mut self, cells: Weak<CellMatrix>, cell: &Cell) -> bool {
        let at = cell.coordinate();
        let Some(target) = cell.current_vegetable().map(|v| v.id()) else {
            log::debug!("Fertilizer at {at} has nothing to ripen");
            return false;
        };

        let mut pending = self.pending.lock();
        if pending.get(&at).is_some_and(PendingRipening::is_active) {
            log::debug!("Ripening already pending at {at}, fertilizer only refreshed");
            return false;
        }

        self.next_seq += 1;
        let seq = self.next_seq;
        let fire_at = Instant::now() + self.delay;
        let settled = Arc::new(AtomicBool::new(false));
        let task = RipeningTask {
            at,
            seq,
            target,
            fire_at,
            settled: Arc::clone(&settled),
            cells,
            pending: Arc::clone(&self.pending),
        };
        let handle = self.runtime.spawn(run_ripening(task));
        pending.insert(
            at,
            PendingRipening {
                seq,
                target,
                fire_at,
                settled,
                handle,
            },
        );
        log::debug!("Armed ripening #{seq} at {at} in {:?}", self.delay);
        true
    }

    /// Cancels the pending task at `at` if it targets `target`. The caller
    /// holds the cell locked. Returns whether a task was cancelled.
    pub fn cancel(&self, at: Coordinate, target: VegetableId) -> bool {
        let mut pending = self.pending.lock();
        let Some(entry) = pending.get(&at) else {
            return false;
        };
        if entry.target != target || entry.settled.swap(true, Ordering::AcqRel) {
            return false;
        }
        entry.handle.abort();
        let seq = entry.seq;
        pending.remove(&at);
        log::debug!("Cancelled ripening #{seq} at {at}: vegetable harvested");
        true
    }

    pub fn is_pending(&self, at: Coordinate) -> bool {
        self.pending.lock().get(&at).is_some_and(PendingRipening::is_active)
    }

    pub fn fire_time(&self, at: Coordinate) -> Option<Instant> {
        self.pending
            .lock()
            .get(&at)
            .filter(|p| p.is_active())
            .map(|p| p.fire_at)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().values().filter(|p| p.is_active()).count()
    }
}

impl Drop for RipenessScheduler {
    fn drop(&mut self) {
        for (_, entry) in self.pending.lock().drain() {
            entry.settled.store(true, Ordering::Release);
            entry.handle.abort();
        }
    }
}

async fn run_ripening(task: RipeningTask) {
    tokio::time::sleep_until(task.fire_at).await;

    let Some(cells) = task.cells.upgrade() else {
        log::error!("Ripening #{} fired for {} but the grid is gone", task.seq, task.at);
        release(&task);
        return;
    };
    let Some(cell) = cells.get(task.at.row).and_then(|row| row.get(task.at.col)) else {
        log::error!("Ripening #{} fired for untracked cell {}", task.seq, task.at);
        release(&task);
        return;
    };

    {
        let mut cell = cell.lock();
        if task.settled.swap(true, Ordering::AcqRel) {
            return;
        }
        let ripened = cell.finish_ripening(task.target);
        log::info!("Ripening #{} completed at {} (ripened: {ripened})", task.seq, task.at);
    }
    release(&task);
}

fn release(task: &RipeningTask) {
    task.settled.store(true, Ordering::Release);
    let mut pending = task.pending.lock();
    if pending.get(&task.at).is_some_and(|p| p.seq == task.seq) {
        pending.remove(&task.at);
    }
}
