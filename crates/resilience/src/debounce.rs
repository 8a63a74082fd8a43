// crates/resilience/src/debounce.rs
//! Call coalescing with a single-shot delayed task

use crate::error::{ResilienceError, ResilienceResult};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Coalesces bursts of triggers into one delayed task
///
/// At most one task exists at a time. While it is sleeping or running, further
/// calls to [`Debouncer::schedule`] are no-ops.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    slot: Mutex<Slot>,
    // Ticket of the live task, `None` when idle
    live: Arc<watch::Sender<Option<u64>>>,
}

#[derive(Debug, Default)]
struct Slot {
    handle: Option<JoinHandle<()>>,
    tickets: u64,
}

/// Marks its task settled when dropped, whether it finished or was aborted
struct Settle {
    live: Arc<watch::Sender<Option<u64>>>,
    ticket: u64,
}

impl Drop for Settle {
    fn drop(&mut self) {
        self.live.send_if_modified(|live| {
            if *live == Some(self.ticket) {
                *live = None;
                true
            } else {
                false
            }
        });
    }
}

impl Debouncer {
    /// Creates a new debouncer
    pub fn new(delay: Duration) -> Self {
        let (live, _) = watch::channel(None);
        Self {
            delay,
            slot: Mutex::new(Slot::default()),
            live: Arc::new(live),
        }
    }

    /// Gets the debounce delay
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedules `task` to run after the delay
    ///
    /// Returns `Ok(false)` without scheduling anything if a task is already
    /// sleeping or running.
    pub fn schedule<F>(&self, task: F) -> ResilienceResult<bool>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = Handle::try_current().map_err(|_| ResilienceError::NoRuntime)?;
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);

        if self.is_pending() {
            log::trace!("Debounced task already pending, coalescing");
            return Ok(false);
        }

        slot.tickets += 1;
        let settle = Settle {
            live: self.live.clone(),
            ticket: slot.tickets,
        };
        self.live.send_replace(Some(slot.tickets));

        let delay = self.delay;
        slot.handle = Some(handle.spawn(async move {
            let _settle = settle;
            tokio::time::sleep(delay).await;
            task.await;
        }));
        Ok(true)
    }

    /// Aborts the scheduled task, if any
    ///
    /// Returns true if a live task was aborted.
    pub fn cancel(&self) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = slot.handle.take() {
            handle.abort();
        }
        self.live.send_replace(None).is_some()
    }

    /// Returns true while a scheduled task is sleeping or running
    pub fn is_pending(&self) -> bool {
        self.live.borrow().is_some()
    }

    /// Waits until no task is sleeping or running
    pub async fn idle(&self) {
        let mut live = self.live.subscribe();
        // The sender lives as long as `self`, so this only ends once idle.
        let _ = live.wait_for(Option::is_none).await;
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_task(counter: &Arc<AtomicUsize>) -> impl Future<Output = ()> + Send + 'static {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_runs_once() {
        let debouncer = Debouncer::new(Duration::from_millis(20));
        let counter = Arc::new(AtomicUsize::new(0));

        assert!(debouncer.schedule(counting_task(&counter)).unwrap());
        for _ in 0..5 {
            assert!(!debouncer.schedule(counting_task(&counter)).unwrap());
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_waits_for_delay() {
        let debouncer = Debouncer::new(Duration::from_millis(20));
        let counter = Arc::new(AtomicUsize::new(0));

        debouncer.schedule(counting_task(&counter)).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert!(debouncer.is_pending());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedules_again_after_completion() {
        let debouncer = Debouncer::new(Duration::from_millis(20));
        let counter = Arc::new(AtomicUsize::new(0));

        debouncer.schedule(counting_task(&counter)).unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(debouncer.schedule(counting_task(&counter)).unwrap());
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_run() {
        let debouncer = Debouncer::new(Duration::from_millis(20));
        let counter = Arc::new(AtomicUsize::new(0));

        debouncer.schedule(counting_task(&counter)).unwrap();
        assert!(debouncer.cancel());
        assert!(!debouncer.cancel());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_waits_for_task() {
        let debouncer = Debouncer::new(Duration::from_millis(20));
        let counter = Arc::new(AtomicUsize::new(0));

        debouncer.schedule(counting_task(&counter)).unwrap();
        debouncer.idle().await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(!debouncer.is_pending());

        // Returns at once when nothing is scheduled
        debouncer.idle().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_ends_on_cancel() {
        let debouncer = Arc::new(Debouncer::new(Duration::from_secs(60)));
        debouncer.schedule(async {}).unwrap();

        let waiter = {
            let debouncer = debouncer.clone();
            tokio::spawn(async move { debouncer.idle().await })
        };
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        debouncer.cancel();
        waiter.await.unwrap();
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_aborted_task_does_not_clear_successor() {
        let debouncer = Debouncer::new(Duration::from_millis(20));
        debouncer.schedule(async {}).unwrap();
        debouncer.cancel();

        assert!(debouncer.schedule(async {}).unwrap());
        // Let the runtime drop the aborted task
        tokio::task::yield_now().await;
        assert!(debouncer.is_pending());
    }

    #[test]
    fn test_schedule_without_runtime() {
        let debouncer = Debouncer::new(Duration::from_millis(20));
        let result = debouncer.schedule(async {});
        assert!(matches!(result, Err(ResilienceError::NoRuntime)));
    }
}
