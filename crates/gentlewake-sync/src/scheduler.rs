//! Sync scheduler - turns triggers into settled synchronization cycles
//!
//! The [`SyncScheduler`] sits between the trigger sources (the
//! [`AlarmFileWatcher`](super::watcher::AlarmFileWatcher), the reachability
//! monitor, the periodic timer) and the
//! [`ScheduleSynchronizer`](super::engine::ScheduleSynchronizer). Triggers
//! are fed through a [`TriggerQueue`] so a burst of them results in a
//! single synchronization once things have settled.
//!
//! ## Flow
//!
//! ```text
//! AlarmFileWatcher ──┐
//! watch_reachability ┼─→ mpsc::Receiver ──→ SyncScheduler ──→ ScheduleSynchronizer
//! periodic timer ────┘                          │
//!                                          TriggerQueue
//! ```
//!
//! [`SyncTrigger::Manual`] bypasses the settle window entirely, useful for
//! "sync now" requests.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use gentlewake_core::ports::{IMessageSink, IReachabilityProbe};

use crate::engine::{ScheduleSynchronizer, SyncReport};

/// How often the scheduler checks the trigger queue for a settled burst
const QUEUE_POLL_INTERVAL: Duration = Duration::from_millis(250);

// ============================================================================
// SyncTrigger
// ============================================================================

/// Reason a synchronization was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncTrigger {
    /// The next-alarm source changed
    AlarmChanged,
    /// The bridge became reachable again
    NetworkAvailable,
    /// The periodic timer fired
    Periodic,
    /// Explicit user request; not debounced
    Manual,
}

// ============================================================================
// TriggerQueue
// ============================================================================

/// Coalesces bursts of triggers into one pending synchronization
///
/// Every push resets the settle window. Once no trigger has arrived for
/// the settle delay, [`poll`](TriggerQueue::poll) hands out everything that
/// accumulated and the queue starts over.
#[derive(Debug)]
pub struct TriggerQueue {
    pending: Vec<SyncTrigger>,
    last_push: Option<Instant>,
    settle_delay: Duration,
}

impl TriggerQueue {
    /// Creates a new `TriggerQueue` with the given settle delay
    pub fn new(settle_delay: Duration) -> Self {
        Self {
            pending: Vec::new(),
            last_push: None,
            settle_delay,
        }
    }

    /// Records a trigger and restarts the settle window
    pub fn push(&mut self, trigger: SyncTrigger) {
        debug!(trigger = ?trigger, "Enqueuing sync trigger");
        if !self.pending.contains(&trigger) {
            self.pending.push(trigger);
        }
        self.last_push = Some(Instant::now());
    }

    /// Returns the accumulated triggers once the settle window has passed
    ///
    /// Returns an empty vector while the window is still open.
    pub fn poll(&mut self) -> Vec<SyncTrigger> {
        match self.last_push {
            Some(at) if at.elapsed() >= self.settle_delay => {
                self.last_push = None;
                std::mem::take(&mut self.pending)
            }
            _ => Vec::new(),
        }
    }

    /// Returns the number of distinct pending triggers
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Returns true if nothing is pending
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

// ============================================================================
// SyncScheduler
// ============================================================================

/// Runs synchronizations in response to triggers
pub struct SyncScheduler {
    /// Receiver for triggers from watchers and monitors
    trigger_rx: mpsc::Receiver<SyncTrigger>,
    /// Debounced queue that coalesces bursts of triggers
    queue: TriggerQueue,
    synchronizer: Arc<ScheduleSynchronizer>,
    sink: Arc<dyn IMessageSink>,
    /// Checked before every cycle when set
    probe: Option<Arc<dyn IReachabilityProbe>>,
    /// Interval of the periodic trigger
    periodic_interval: Duration,
}

impl SyncScheduler {
    /// Creates a new `SyncScheduler`
    ///
    /// # Arguments
    /// * `trigger_rx` - Channel receiver for sync triggers
    /// * `synchronizer` - Engine that performs each cycle
    /// * `sink` - Receives the status messages of every cycle
    /// * `settle_delay` - How long triggers must be quiet before a cycle starts
    /// * `periodic_interval` - How often a periodic trigger is raised
    pub fn new(
        trigger_rx: mpsc::Receiver<SyncTrigger>,
        synchronizer: Arc<ScheduleSynchronizer>,
        sink: Arc<dyn IMessageSink>,
        settle_delay: Duration,
        periodic_interval: Duration,
    ) -> Self {
        info!(
            settle_ms = settle_delay.as_millis() as u64,
            periodic_secs = periodic_interval.as_secs(),
            "Creating sync scheduler"
        );

        Self {
            trigger_rx,
            queue: TriggerQueue::new(settle_delay),
            synchronizer,
            sink,
            probe: None,
            periodic_interval,
        }
    }

    /// Skips cycles while the probe reports the bridge unreachable
    pub fn with_probe(mut self, probe: Arc<dyn IReachabilityProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Main event loop for the sync scheduler
    ///
    /// Runs until `cancel` fires or the trigger channel is closed, performing
    /// these operations via `tokio::select!`:
    ///
    /// 1. **Receive triggers**: pushes them into the queue, or runs a cycle
    ///    at once for [`SyncTrigger::Manual`]
    /// 2. **Poll queue**: runs one cycle when a burst has settled
    /// 3. **Periodic timer**: raises [`SyncTrigger::Periodic`]; the first
    ///    tick fires immediately, giving a startup sync
    pub async fn run(&mut self, cancel: CancellationToken) {
        info!("Sync scheduler starting");

        let mut poll_timer = tokio::time::interval(QUEUE_POLL_INTERVAL);
        let mut periodic_timer = tokio::time::interval(self.periodic_interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Cancellation requested, scheduler shutting down");
                    break;
                }

                trigger = self.trigger_rx.recv() => {
                    match trigger {
                        Some(SyncTrigger::Manual) => {
                            info!("Manual sync requested (bypassing settle delay)");
                            self.run_cycle(&[SyncTrigger::Manual]).await;
                        }
                        Some(trigger) => {
                            debug!(trigger = ?trigger, "Scheduler received trigger");
                            self.queue.push(trigger);
                        }
                        None => {
                            info!("Trigger channel closed, scheduler shutting down");
                            break;
                        }
                    }
                }

                _ = poll_timer.tick() => {
                    let settled = self.queue.poll();
                    if !settled.is_empty() {
                        self.run_cycle(&settled).await;
                    }
                }

                _ = periodic_timer.tick() => {
                    self.queue.push(SyncTrigger::Periodic);
                }
            }
        }

        info!("Sync scheduler stopped");
    }

    /// Runs one synchronization for the given triggers
    ///
    /// Reloads the bridge cache first. Returns `None` if the bridge is
    /// unreachable or the cycle failed; failures are logged, never propagated.
    pub async fn run_cycle(&self, triggers: &[SyncTrigger]) -> Option<SyncReport> {
        info!(triggers = ?triggers, "Starting sync cycle");

        if let Some(probe) = &self.probe {
            if !probe.is_reachable().await {
                warn!("Hue bridge not reachable, skipping sync");
                return None;
            }
        }

        if let Err(e) = self.synchronizer.refresh_bridge().await {
            error!(error = %format!("{e:#}"), "Sync cycle skipped");
            return None;
        }

        match self.synchronizer.synchronize(self.sink.as_ref()).await {
            Ok(report) => Some(report),
            Err(e) => {
                error!(error = %format!("{e:#}"), "Sync cycle failed");
                None
            }
        }
    }
}

// ============================================================================
// Reachability monitor
// ============================================================================

/// Raises [`SyncTrigger::NetworkAvailable`] whenever the bridge comes back
///
/// Probes every `interval`. The first successful probe counts as a
/// transition, so a bridge that is reachable at startup raises one trigger.
/// Returns when `cancel` fires or the trigger channel is closed.
pub async fn watch_reachability(
    probe: Arc<dyn IReachabilityProbe>,
    trigger_tx: mpsc::Sender<SyncTrigger>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut was_reachable = false;
    let mut timer = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = timer.tick() => {
                let reachable = probe.is_reachable().await;
                if reachable && !was_reachable {
                    info!("Hue bridge reachable");
                    if trigger_tx.send(SyncTrigger::NetworkAvailable).await.is_err() {
                        debug!("Trigger channel closed, stopping reachability monitor");
                        break;
                    }
                } else if !reachable && was_reachable {
                    warn!("Hue bridge no longer reachable");
                }
                was_reachable = reachable;
            }
        }
    }
}

// ============================================================================
// Unit tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::testing::{Call, FakeBridge, MemoryStore, SettableAlarm};
    use gentlewake_core::ports::NullSink;

    struct SwitchProbe(AtomicBool);

    #[async_trait::async_trait]
    impl IReachabilityProbe for SwitchProbe {
        async fn is_reachable(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn synchronizer() -> (Arc<FakeBridge>, Arc<ScheduleSynchronizer>) {
        let bridge = Arc::new(FakeBridge::with_lights(&["1"]));
        bridge.add_group("1", "GentleWake");
        let sync = ScheduleSynchronizer::new(
            bridge.clone(),
            Arc::new(MemoryStore::default()),
            Arc::new(SettableAlarm::new(Some("Mon 07:00"))),
        );
        (bridge, Arc::new(sync))
    }

    fn scheduler(
        rx: mpsc::Receiver<SyncTrigger>,
        sync: Arc<ScheduleSynchronizer>,
        settle: Duration,
        periodic: Duration,
    ) -> SyncScheduler {
        SyncScheduler::new(rx, sync, Arc::new(NullSink), settle, periodic)
    }

    fn creates(bridge: &FakeBridge) -> usize {
        bridge
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::CreateSchedule(_)))
            .count()
    }

    // ------------------------------------------------------------------
    // TriggerQueue
    // ------------------------------------------------------------------

    #[test]
    fn test_queue_holds_until_settled() {
        let mut queue = TriggerQueue::new(Duration::from_secs(60));
        queue.push(SyncTrigger::AlarmChanged);
        assert!(queue.poll().is_empty());
        assert_eq!(queue.pending_count(), 1);
    }

    #[test]
    fn test_queue_coalesces_duplicates() {
        let mut queue = TriggerQueue::new(Duration::ZERO);
        queue.push(SyncTrigger::AlarmChanged);
        queue.push(SyncTrigger::AlarmChanged);
        queue.push(SyncTrigger::NetworkAvailable);
        assert_eq!(queue.pending_count(), 2);

        let settled = queue.poll();
        assert_eq!(
            settled,
            vec![SyncTrigger::AlarmChanged, SyncTrigger::NetworkAvailable]
        );
        assert!(queue.is_empty());
        assert!(queue.poll().is_empty());
    }

    #[test]
    fn test_push_resets_settle_window() {
        let mut queue = TriggerQueue::new(Duration::from_millis(50));
        queue.push(SyncTrigger::AlarmChanged);
        std::thread::sleep(Duration::from_millis(30));
        queue.push(SyncTrigger::Periodic);
        std::thread::sleep(Duration::from_millis(30));
        // 60ms since the first push but only 30ms since the last
        assert!(queue.poll().is_empty());
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(queue.poll().len(), 2);
    }

    // ------------------------------------------------------------------
    // SyncScheduler
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_run_cycle_syncs() {
        let (bridge, sync) = synchronizer();
        let (_tx, rx) = mpsc::channel(4);
        let scheduler = scheduler(rx, sync, Duration::ZERO, Duration::from_secs(3600));

        let report = scheduler.run_cycle(&[SyncTrigger::Manual]).await.unwrap();
        assert!(report.is_success());
        assert_eq!(creates(&bridge), 3);
    }

    #[tokio::test]
    async fn test_run_cycle_skips_when_unreachable() {
        let (bridge, sync) = synchronizer();
        let (_tx, rx) = mpsc::channel(4);
        let scheduler = scheduler(rx, sync, Duration::ZERO, Duration::from_secs(3600))
            .with_probe(Arc::new(SwitchProbe(AtomicBool::new(false))));

        assert!(scheduler.run_cycle(&[SyncTrigger::Periodic]).await.is_none());
        assert!(bridge.calls().is_empty());
    }

    #[tokio::test]
    async fn test_run_exits_on_channel_close() {
        let (_bridge, sync) = synchronizer();
        let (tx, rx) = mpsc::channel(4);
        let mut scheduler = scheduler(rx, sync, Duration::from_secs(60), Duration::from_secs(3600));

        drop(tx);

        tokio::time::timeout(Duration::from_secs(2), scheduler.run(CancellationToken::new()))
            .await
            .expect("Scheduler should exit when channel closes");
    }

    #[tokio::test]
    async fn test_run_exits_on_cancel() {
        let (_bridge, sync) = synchronizer();
        let (_tx, rx) = mpsc::channel(4);
        let mut scheduler = scheduler(rx, sync, Duration::from_secs(60), Duration::from_secs(3600));

        let cancel = CancellationToken::new();
        cancel.cancel();

        tokio::time::timeout(Duration::from_secs(2), scheduler.run(cancel))
            .await
            .expect("Scheduler should exit when cancelled");
    }

    #[tokio::test]
    async fn test_burst_of_triggers_runs_once() {
        let (bridge, sync) = synchronizer();
        let (tx, rx) = mpsc::channel(16);
        // Long periodic interval: only its immediate first tick fires
        let mut scheduler = scheduler(rx, sync, Duration::from_millis(100), Duration::from_secs(3600));

        for _ in 0..5 {
            tx.send(SyncTrigger::AlarmChanged).await.unwrap();
        }

        let cancel = CancellationToken::new();
        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1000)).await;
            stopper.cancel();
        });
        scheduler.run(cancel).await;

        // One cycle creates, nothing more ran
        assert_eq!(creates(&bridge), 3);
        let updates = bridge
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::UpdateSchedule(_)))
            .count();
        assert_eq!(updates, 0);
    }

    #[tokio::test]
    async fn test_manual_trigger_bypasses_settle() {
        let (bridge, sync) = synchronizer();
        let (tx, rx) = mpsc::channel(4);
        // Settle delay far beyond the test duration
        let mut scheduler = scheduler(rx, sync, Duration::from_secs(600), Duration::from_secs(3600));

        tx.send(SyncTrigger::Manual).await.unwrap();

        let cancel = CancellationToken::new();
        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            stopper.cancel();
        });
        scheduler.run(cancel).await;

        assert_eq!(creates(&bridge), 3);
    }

    // ------------------------------------------------------------------
    // watch_reachability
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_reachability_raises_trigger_once() {
        let probe = Arc::new(SwitchProbe(AtomicBool::new(true)));
        let (tx, mut rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();

        let monitor = tokio::spawn(watch_reachability(
            probe,
            tx,
            Duration::from_millis(20),
            cancel.clone(),
        ));

        let first = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap();
        assert_eq!(first, Some(SyncTrigger::NetworkAvailable));

        // Stays reachable: no further triggers
        let second = tokio::time::timeout(Duration::from_millis(150), rx.recv()).await;
        assert!(second.is_err());

        cancel.cancel();
        monitor.await.unwrap();
    }
}
