// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 the bosh-client developers

//! One-shot deferred task execution.
//!
//! A single background thread owns at most one pending deadline at a
//! time; rescheduling replaces the previous deadline and cancelling
//! clears it. The task runs with no locks held.

use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use tracing::trace;

struct TimerState {
    deadline: Option<Instant>,
    shutdown: bool,
}

struct TimerInner {
    state: Mutex<TimerState>,
    cond: Condvar,
}

/// A cancellable one-shot timer backed by a dedicated thread.
pub(crate) struct OneShotTimer {
    inner: Arc<TimerInner>,
}

impl OneShotTimer {
    /// Create a timer with no thread attached; [`start`](Self::start)
    /// brings it to life.
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(TimerInner {
                state: Mutex::new(TimerState {
                    deadline: None,
                    shutdown: false,
                }),
                cond: Condvar::new(),
            }),
        }
    }

    /// Spawn the timer thread. `task` runs each time a scheduled deadline
    /// expires without being cancelled or replaced.
    pub(crate) fn start(
        &self,
        name: &str,
        task: Box<dyn Fn() + Send + Sync>,
    ) -> std::io::Result<()> {
        let thread_inner = Arc::clone(&self.inner);
        thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || run(&thread_inner, task.as_ref()))?;
        Ok(())
    }

    /// Arm (or re-arm) the timer to fire after `delay`.
    pub(crate) fn schedule(&self, delay: Duration) {
        trace!(?delay, "scheduling deferred task");
        let mut state = self.inner.state.lock();
        state.deadline = Some(Instant::now() + delay);
        self.inner.cond.notify_all();
    }

    /// Disarm the timer if it has not fired yet.
    pub(crate) fn cancel(&self) {
        let mut state = self.inner.state.lock();
        state.deadline = None;
        self.inner.cond.notify_all();
    }

    /// True while a deadline is armed and has not fired.
    pub(crate) fn is_scheduled(&self) -> bool {
        self.inner.state.lock().deadline.is_some()
    }

    /// Stop the timer thread. Pending deadlines are discarded.
    pub(crate) fn shutdown(&self) {
        let mut state = self.inner.state.lock();
        state.shutdown = true;
        state.deadline = None;
        self.inner.cond.notify_all();
    }
}

fn run(inner: &TimerInner, task: &(dyn Fn() + Send + Sync)) {
    let mut state = inner.state.lock();
    loop {
        if state.shutdown {
            return;
        }
        match state.deadline {
            None => inner.cond.wait(&mut state),
            Some(deadline) => {
                let now = Instant::now();
                if now < deadline {
                    inner.cond.wait_for(&mut state, deadline - now);
                    continue;
                }
                state.deadline = None;
                drop(state);
                task();
                state = inner.state.lock();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_timer() -> (OneShotTimer, Arc<AtomicUsize>) {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let timer = OneShotTimer::new();
        timer
            .start(
                "test-timer",
                Box::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();
        (timer, fired)
    }

    #[test]
    fn test_fires_after_delay() {
        let (timer, fired) = counting_timer();
        timer.schedule(Duration::from_millis(30));
        assert!(timer.is_scheduled());
        thread::sleep(Duration::from_millis(120));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!timer.is_scheduled());
        timer.shutdown();
    }

    #[test]
    fn test_cancel_prevents_firing() {
        let (timer, fired) = counting_timer();
        timer.schedule(Duration::from_millis(50));
        timer.cancel();
        thread::sleep(Duration::from_millis(120));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        timer.shutdown();
    }

    #[test]
    fn test_reschedule_replaces_deadline() {
        let (timer, fired) = counting_timer();
        timer.schedule(Duration::from_millis(500));
        timer.schedule(Duration::from_millis(20));
        thread::sleep(Duration::from_millis(150));
        assert_eq!(fired.load(Ordering::SeqCst), 1, "short deadline should win");
        thread::sleep(Duration::from_millis(450));
        assert_eq!(fired.load(Ordering::SeqCst), 1, "long deadline was replaced");
        timer.shutdown();
    }

    #[test]
    fn test_shutdown_stops_thread() {
        let (timer, fired) = counting_timer();
        timer.schedule(Duration::from_millis(20));
        timer.shutdown();
        thread::sleep(Duration::from_millis(100));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
