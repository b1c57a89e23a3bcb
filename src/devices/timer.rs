use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use priority_queue::PriorityQueue;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

type Action = Box<dyn FnOnce() + Send>;

/// Deadline scheduler shared by a device's timers (countdowns, siren and
/// backlight expiry, menu idle, heartbeat sweeps).
///
/// One worker task sleeps until the earliest deadline and runs the action.
/// Cancellation is idempotent, and an action whose deadline has passed but
/// which has not yet run is still suppressed by `TimerHandle::cancel`.
/// Dropping the scheduler aborts the worker, so nothing outlives the device
/// that scheduled it.
pub struct Scheduler {
    shared: Arc<Shared>,
    worker: JoinHandle<()>,
}

struct Shared {
    state: Mutex<State>,
    notify: Notify,
}

#[derive(Default)]
struct State {
    next_id: u64,
    deadlines: PriorityQueue<u64, Reverse<Instant>>,
    actions: HashMap<u64, Action>,
}

/// Cancellation handle for one scheduled action.
pub struct TimerHandle {
    id: u64,
    shared: Weak<Shared>,
}

impl TimerHandle {
    pub fn cancel(&self) {
        if let Some(shared) = self.shared.upgrade() {
            let mut state = shared.state.lock().unwrap();
            state.deadlines.remove(&self.id);
            state.actions.remove(&self.id);
            drop(state);
            shared.notify.notify_one();
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Scheduler::new()
    }
}

impl Scheduler {
    pub fn new() -> Scheduler {
        let shared = Arc::new(Shared {
            state: Mutex::new(State::default()),
            notify: Notify::new(),
        });
        let worker = tokio::spawn(run_worker(shared.clone()));
        Scheduler { shared, worker }
    }

    pub fn schedule<F>(&self, delay: Duration, action: F) -> TimerHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let id = {
            let mut state = self.shared.state.lock().unwrap();
            let id = state.next_id;
            state.next_id += 1;
            state.deadlines.push(id, Reverse(Instant::now() + delay));
            state.actions.insert(id, Box::new(action));
            id
        };
        self.shared.notify.notify_one();
        TimerHandle {
            id,
            shared: Arc::downgrade(&self.shared),
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

async fn run_worker(shared: Arc<Shared>) {
    loop {
        let next = {
            let state = shared.state.lock().unwrap();
            state
                .deadlines
                .peek()
                .map(|(id, Reverse(at))| (*id, *at))
        };
        match next {
            None => shared.notify.notified().await,
            Some((id, at)) => {
                tokio::select! {
                    _ = sleep_until(at) => {
                        // Re-check under the lock: the head may have been
                        // cancelled or superseded while we slept.
                        let action = {
                            let mut state = shared.state.lock().unwrap();
                            let due = matches!(
                                state.deadlines.peek(),
                                Some((head, Reverse(t))) if *head == id && *t <= Instant::now()
                            );
                            if due {
                                state.deadlines.pop();
                                state.actions.remove(&id)
                            } else {
                                None
                            }
                        };
                        if let Some(action) = action {
                            action();
                        }
                    }
                    _ = shared.notify.notified() => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::time::advance;

    async fn settle() {
        // Let the worker observe queue changes before the clock moves.
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_actions_fire_in_deadline_order() {
        let scheduler = Scheduler::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for (name, delay) in [("b", 200u64), ("a", 100), ("c", 300)] {
            let order = order.clone();
            scheduler.schedule(Duration::from_millis(delay), move || {
                order.lock().unwrap().push(name);
            });
        }
        settle().await;
        advance(Duration::from_millis(350)).await;
        settle().await;
        assert_eq!(*order.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_is_idempotent_and_wins_before_run() {
        let scheduler = Scheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let handle = {
            let fired = fired.clone();
            scheduler.schedule(Duration::from_secs(1), move || {
                fired.fetch_add(1, Ordering::SeqCst);
            })
        };
        settle().await;
        handle.cancel();
        handle.cancel();
        advance(Duration::from_secs(2)).await;
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_one_of_many() {
        let scheduler = Scheduler::new();
        let fired = Arc::new(Mutex::new(Vec::new()));

        let keep = {
            let fired = fired.clone();
            scheduler.schedule(Duration::from_millis(100), move || {
                fired.lock().unwrap().push("keep");
            })
        };
        let cancel = {
            let fired = fired.clone();
            scheduler.schedule(Duration::from_millis(50), move || {
                fired.lock().unwrap().push("cancel");
            })
        };
        let _ = keep;
        settle().await;
        cancel.cancel();
        advance(Duration::from_millis(200)).await;
        settle().await;
        assert_eq!(*fired.lock().unwrap(), vec!["keep"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_aborts_worker() {
        let fired = Arc::new(AtomicUsize::new(0));
        {
            let scheduler = Scheduler::new();
            let fired = fired.clone();
            scheduler.schedule(Duration::from_millis(10), move || {
                fired.fetch_add(1, Ordering::SeqCst);
            });
            settle().await;
        }
        advance(Duration::from_secs(1)).await;
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
