use crate::api::FetchCall;
use crate::pages::Page;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

const MAX_TRACKED_CYCLES: u64 = 32;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct CycleToken(u64);

impl CycleToken {
    pub fn generation(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct Outstanding {
    remaining: usize,
    delivered: bool,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FetchController {
    generation: u64,
    outstanding: HashMap<u64, Outstanding>,
    applied: HashMap<FetchCall, u64>,
    loading: bool,
}

impl Default for FetchController {
    fn default() -> Self {
        Self {
            generation: 0,
            outstanding: HashMap::new(),
            applied: HashMap::new(),
            loading: true,
        }
    }
}

impl FetchController {
    pub fn begin(&mut self, calls: usize) -> CycleToken {
        self.generation = self.generation.wrapping_add(1);
        let oldest_kept = self.generation.saturating_sub(MAX_TRACKED_CYCLES);
        self.outstanding.retain(|generation, _| *generation > oldest_kept);
        if calls > 0 {
            self.outstanding.insert(
                self.generation,
                Outstanding {
                    remaining: calls,
                    delivered: false,
                },
            );
            self.loading = true;
        } else {
            self.loading = false;
        }
        CycleToken(self.generation)
    }

    // Shown unless the call already shows data from a newer cycle.
    pub fn settle(&mut self, token: CycleToken, call: FetchCall, succeeded: bool) -> bool {
        let fresh = succeeded
            && self
                .applied
                .get(&call)
                .is_none_or(|applied| token.0 > *applied);
        if fresh {
            self.applied.insert(call, token.0);
        } else if succeeded {
            debug!(stale = token.0, ?call, "discarding response older than shown data");
        }

        if let Some(cycle) = self.outstanding.get_mut(&token.0) {
            cycle.remaining = cycle.remaining.saturating_sub(1);
            cycle.delivered |= fresh;
            if cycle.remaining == 0 {
                let delivered = cycle.delivered;
                self.outstanding.remove(&token.0);
                // a superseded cycle that put data on screen ends the spinner too
                if token.0 == self.generation || delivered {
                    self.loading = false;
                }
            }
        }
        fresh
    }

    pub fn loading(&self) -> bool {
        self.loading
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct PollTick {
    pub page: Page,
    pub epoch: u64,
}

// Dropping the guard aborts the timer task.
pub struct PollGuard {
    page: Page,
    epoch: u64,
    handle: JoinHandle<()>,
}

impl PollGuard {
    pub fn start(
        page: Page,
        epoch: u64,
        period: Duration,
        tx: UnboundedSender<PollTick>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if tx.send(PollTick { page, epoch }).is_err() {
                    break;
                }
            }
        });

        debug!(page = page.title(), epoch, ?period, "poll timer started");
        Self {
            page,
            epoch,
            handle,
        }
    }
}

impl Drop for PollGuard {
    fn drop(&mut self) {
        self.handle.abort();
        debug!(page = self.page.title(), epoch = self.epoch, "poll timer stopped");
    }
}

pub struct Poller {
    period: Duration,
    tx: UnboundedSender<PollTick>,
    guard: Option<PollGuard>,
}

impl Poller {
    pub fn new(period: Duration, tx: UnboundedSender<PollTick>) -> Self {
        Self {
            period,
            tx,
            guard: None,
        }
    }

    pub fn sync(&mut self, page: Page, epoch: u64) {
        if !page.polls() {
            self.guard = None;
            return;
        }

        let current = self
            .guard
            .as_ref()
            .is_some_and(|guard| guard.page == page && guard.epoch == epoch);
        if !current {
            self.guard = Some(PollGuard::start(page, epoch, self.period, self.tx.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FetchController, PollGuard, Poller};
    use crate::api::FetchCall;
    use crate::pages::Page;
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[test]
    fn older_result_never_replaces_newer_data() {
        let mut fetch = FetchController::default();
        assert!(fetch.loading());

        let first = fetch.begin(1);
        let second = fetch.begin(1);

        assert!(fetch.settle(second, FetchCall::Pods, true));
        assert!(!fetch.loading());

        assert!(!fetch.settle(first, FetchCall::Pods, true));
        assert!(!fetch.loading());
    }

    #[test]
    fn superseded_cycle_still_delivers_when_nothing_newer_arrived() {
        let mut fetch = FetchController::default();
        let slow = fetch.begin(1);
        let newer = fetch.begin(1);

        assert!(fetch.settle(slow, FetchCall::NodeMetrics, true));
        assert!(!fetch.loading());

        assert!(fetch.settle(newer, FetchCall::NodeMetrics, true));
        assert!(!fetch.loading());
    }

    #[test]
    fn loading_clears_only_after_every_call_settles() {
        let mut fetch = FetchController::default();
        let token = fetch.begin(2);
        assert!(fetch.settle(token, FetchCall::Pods, true));
        assert!(fetch.loading());
        assert!(fetch.settle(token, FetchCall::Namespaces, true));
        assert!(!fetch.loading());
    }

    #[test]
    fn failed_call_settles_without_delivering() {
        let mut fetch = FetchController::default();
        let token = fetch.begin(1);
        assert!(!fetch.settle(token, FetchCall::Pods, false));
        assert!(!fetch.loading());

        let next = fetch.begin(1);
        assert!(fetch.settle(next, FetchCall::Pods, true));
    }

    #[test]
    fn failed_newest_cycle_keeps_older_delivery() {
        let mut fetch = FetchController::default();
        let old = fetch.begin(2);
        assert!(fetch.settle(old, FetchCall::Workloads, true));
        let new = fetch.begin(2);

        // the rest of the old cycle lands, but the newest cycle is still out
        assert!(fetch.settle(old, FetchCall::Namespaces, true));
        assert!(!fetch.loading());

        assert!(!fetch.settle(new, FetchCall::Workloads, false));
        assert!(fetch.settle(new, FetchCall::Namespaces, true));
        assert!(!fetch.loading());
    }

    #[test]
    fn empty_cycle_is_not_loading() {
        let mut fetch = FetchController::default();
        let token = fetch.begin(0);
        assert_eq!(token.generation(), 1);
        assert!(!fetch.loading());
    }

    #[tokio::test(start_paused = true)]
    async fn poll_guard_ticks_until_dropped() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let guard = PollGuard::start(Page::NodeMetrics, 7, Duration::from_secs(30), tx);

        let tick = tokio::time::timeout(Duration::from_secs(31), rx.recv())
            .await
            .expect("tick within period")
            .expect("channel open");
        assert_eq!(tick.page, Page::NodeMetrics);
        assert_eq!(tick.epoch, 7);

        drop(guard);
        let result = tokio::time::timeout(Duration::from_secs(120), rx.recv()).await;
        assert!(!matches!(result, Ok(Some(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn poll_guard_does_not_tick_immediately() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _guard = PollGuard::start(Page::NodeMetrics, 1, Duration::from_secs(30), tx);

        let early = tokio::time::timeout(Duration::from_secs(29), rx.recv()).await;
        assert!(early.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn switching_away_from_polled_page_stops_ticks() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut poller = Poller::new(Duration::from_secs(30), tx);

        poller.sync(Page::NodeMetrics, 1);
        let tick = tokio::time::timeout(Duration::from_secs(31), rx.recv())
            .await
            .expect("tick within period")
            .expect("channel open");
        assert_eq!(tick.epoch, 1);

        poller.sync(Page::Pods, 2);
        let result = tokio::time::timeout(Duration::from_secs(120), rx.recv()).await;
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn same_activation_keeps_timer_and_new_activation_replaces_it() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut poller = Poller::new(Duration::from_secs(30), tx);

        poller.sync(Page::NodeMetrics, 1);
        tokio::time::advance(Duration::from_secs(20)).await;
        poller.sync(Page::NodeMetrics, 1);
        let tick = tokio::time::timeout(Duration::from_secs(11), rx.recv())
            .await
            .expect("original schedule kept")
            .expect("channel open");
        assert_eq!(tick.epoch, 1);

        poller.sync(Page::NodeMetrics, 3);
        let tick = tokio::time::timeout(Duration::from_secs(31), rx.recv())
            .await
            .expect("tick from new activation")
            .expect("channel open");
        assert_eq!(tick.epoch, 3);
    }
}
