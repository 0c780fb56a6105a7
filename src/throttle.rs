//! Trailing-edge throttle for change notifications.
//!
//! Continuous drag input can update a layout parameter hundreds of times a
//! second; downstream observers only need a bounded stream. The throttle
//! emits immediately when the previous emission is older than the interval
//! and otherwise parks the value as the single pending notification, fired
//! at the end of the interval unless a newer submission replaces it first.
//!
//! This is a cancel-and-replace primitive, not a scheduler: one worker
//! thread, at most one pending value, newest wins.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Default notification interval: at most ~30 events per second.
pub const NOTIFY_INTERVAL: Duration = Duration::from_millis(33);

/// What to do with a submitted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Deliver immediately.
    Emit,
    /// Park as the pending value and deliver at the deadline unless
    /// superseded.
    Defer(Instant),
}

/// Pure throttle bookkeeping, separated from the worker thread so the
/// emit/defer policy is testable with explicit instants.
#[derive(Debug)]
pub struct ThrottleState {
    interval: Duration,
    last_emit: Option<Instant>,
}

impl ThrottleState {
    /// Create a state machine with the given minimum emission interval.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_emit: None,
        }
    }

    /// Decide whether a submission at `now` emits or defers.
    ///
    /// An [`Decision::Emit`] records `now` as the last emission.
    pub fn submit(&mut self, now: Instant) -> Decision {
        match self.last_emit {
            Some(prev) if now < prev + self.interval => Decision::Defer(prev + self.interval),
            _ => {
                self.last_emit = Some(now);
                Decision::Emit
            }
        }
    }

    /// Record that a deferred value was delivered at `at`.
    pub fn mark_emitted(&mut self, at: Instant) {
        self.last_emit = Some(at);
    }
}

enum Message<T> {
    Submit(T),
    Shutdown,
}

/// A throttled channel to a delivery callback.
///
/// Values submitted faster than the interval collapse to the newest one.
/// Dropping the throttle flushes the pending value (if any) before the
/// worker exits, so the final state of a drag is never lost.
pub struct Throttle<T: Send + 'static> {
    sender: Sender<Message<T>>,
    worker: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Throttle<T> {
    /// Spawn the worker thread delivering throttled values to `deliver`.
    #[must_use]
    pub fn new<F>(interval: Duration, deliver: F) -> Self
    where
        F: Fn(T) + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel::<Message<T>>();
        let worker = std::thread::spawn(move || {
            let mut state = ThrottleState::new(interval);
            let mut pending: Option<(T, Instant)> = None;
            loop {
                let deadline = pending.as_ref().map(|(_, deadline)| *deadline);
                let message = if let Some(deadline) = deadline {
                    let now = Instant::now();
                    if now >= deadline {
                        if let Some((value, _)) = pending.take() {
                            deliver(value);
                            state.mark_emitted(now);
                        }
                        continue;
                    }
                    match receiver.recv_timeout(deadline - now) {
                        Ok(message) => message,
                        Err(RecvTimeoutError::Timeout) => continue,
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                } else {
                    match receiver.recv() {
                        Ok(message) => message,
                        Err(_) => break,
                    }
                };

                match message {
                    Message::Submit(value) => match state.submit(Instant::now()) {
                        Decision::Emit => {
                            pending = None;
                            deliver(value);
                        }
                        Decision::Defer(deadline) => pending = Some((value, deadline)),
                    },
                    Message::Shutdown => {
                        if let Some((value, _)) = pending.take() {
                            deliver(value);
                        }
                        break;
                    }
                }
            }
        });
        Self {
            sender,
            worker: Some(worker),
        }
    }

    /// Create a throttle with the default ~30 Hz interval.
    #[must_use]
    pub fn with_default_interval<F>(deliver: F) -> Self
    where
        F: Fn(T) + Send + 'static,
    {
        Self::new(NOTIFY_INTERVAL, deliver)
    }

    /// Submit a value. Returns immediately; delivery happens on the worker.
    pub fn submit(&self, value: T) {
        let _ = self.sender.send(Message::Submit(value));
    }
}

impl<T: Send + 'static> Drop for Throttle<T> {
    fn drop(&mut self) {
        let _ = self.sender.send(Message::Shutdown);
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn first_submission_emits_immediately() {
        let mut state = ThrottleState::new(Duration::from_millis(33));
        assert_eq!(state.submit(Instant::now()), Decision::Emit);
    }

    #[test]
    fn rapid_submissions_defer_to_the_interval_edge() {
        let interval = Duration::from_millis(33);
        let mut state = ThrottleState::new(interval);
        let start = Instant::now();
        assert_eq!(state.submit(start), Decision::Emit);

        let soon = start + Duration::from_millis(5);
        match state.submit(soon) {
            Decision::Defer(deadline) => assert_eq!(deadline, start + interval),
            Decision::Emit => panic!("second submission inside the window must defer"),
        }
    }

    #[test]
    fn stale_window_emits_again() {
        let interval = Duration::from_millis(33);
        let mut state = ThrottleState::new(interval);
        let start = Instant::now();
        assert_eq!(state.submit(start), Decision::Emit);
        assert_eq!(state.submit(start + interval), Decision::Emit);
    }

    #[test]
    fn deferred_emission_opens_a_new_window() {
        let interval = Duration::from_millis(33);
        let mut state = ThrottleState::new(interval);
        let start = Instant::now();
        assert_eq!(state.submit(start), Decision::Emit);
        let Decision::Defer(deadline) = state.submit(start + Duration::from_millis(10)) else {
            panic!("expected defer");
        };
        state.mark_emitted(deadline);
        // Right after the deferred fire we are inside a fresh window.
        match state.submit(deadline + Duration::from_millis(1)) {
            Decision::Defer(_) => {}
            Decision::Emit => panic!("submission just after a deferred fire must defer"),
        }
    }

    #[test]
    fn newest_value_wins_and_drop_flushes() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let sink = Arc::clone(&seen);
            let throttle = Throttle::new(Duration::from_millis(50), move |v: u32| {
                sink.lock().unwrap().push(v);
            });
            for v in 0..10 {
                throttle.submit(v);
            }
            // Dropping flushes the pending (latest) value.
        }
        let seen = seen.lock().unwrap();
        assert!(!seen.is_empty());
        assert_eq!(*seen.last().unwrap(), 9, "latest submission must win");
        assert!(
            seen.len() < 10,
            "10 rapid submissions must collapse, saw {}",
            seen.len()
        );
    }
}
