//! Timer-backed futures.
//!
//! The loop has no reactor of its own, so every [Timer] parks a helper thread
//! until it expires and then wakes the waiting task. Combined with
//! [`Future::first_completed_of`](crate::Future::first_completed_of) this is
//! how a caller puts a deadline on a future.
//!
//! # Example
//! ```
//! use promise_future::{event_loop, timer::Timer, Future};
//! use std::time::{Duration, Instant};
//!
//! let now = Instant::now();
//! let late = Future::from_async(async {
//!     Timer::sleep(Duration::from_millis(20)).await;
//!     Ok("late")
//! });
//! assert_eq!(event_loop::block_on(late).unwrap(), "late");
//! assert!(now.elapsed() >= Duration::from_millis(20));
//! ```
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};
use std::{future::Future, pin::Pin, thread};

/// Asynchronous timer.
///
/// A future that completes once its deadline has passed. Obtained via
/// [Timer::sleep].
#[derive(Debug)]
pub struct Timer {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug)]
struct Inner {
    fired: bool,
    waker: Option<Waker>,
}

impl Timer {
    /// Suspend the awaiting task for at least `d`.
    #[must_use]
    pub fn sleep(d: Duration) -> Self {
        let deadline = Instant::now() + d;
        let inner = Arc::new(Mutex::new(Inner {
            fired: false,
            waker: None,
        }));
        let shared = inner.clone();
        thread::spawn(move || {
            thread::sleep(deadline.saturating_duration_since(Instant::now()));
            let mut timer = shared.lock().unwrap_or_else(PoisonError::into_inner);
            timer.fired = true;
            if let Some(waker) = timer.waker.take() {
                waker.wake()
            }
        });
        Timer { inner }
    }
}

impl Future for Timer {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut timer = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if timer.fired {
            Poll::Ready(())
        } else {
            timer.waker = Some(cx.waker().clone());
            Poll::Pending
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::Timer;
    use crate::event_loop;

    #[test]
    fn test_sleep() {
        let now = Instant::now();
        event_loop::block_on(Timer::sleep(Duration::from_millis(30)));
        assert!(now.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_timers_expire_in_deadline_order() {
        let order = std::rc::Rc::new(std::cell::RefCell::new(vec![]));
        for (ms, tag) in [(40, "slow"), (10, "fast")] {
            let order = order.clone();
            event_loop::spawn(async move {
                Timer::sleep(Duration::from_millis(ms)).await;
                order.borrow_mut().push(tag);
            });
        }
        event_loop::run();
        assert_eq!(*order.borrow(), ["fast", "slow"]);
    }
}
