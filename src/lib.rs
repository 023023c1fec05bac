//! # `promise_future`: composable futures over a resolve-once promise
//!
//! A [`Future`] wraps exactly one promise (see [`poly`]) and offers a
//! Scala-style vocabulary on top of it: mapping, filtering, recovering,
//! folding, sequencing and racing. Every combinator allocates a new promise
//! and settles it from the receiver's outcome, so the receiver itself is never
//! touched.
//!
//! Continuations run on the per-thread [`event_loop`]. Nothing ever runs on
//! the caller's stack: attaching an observer to an already settled future
//! still defers the observer to a later turn of the loop.
//!
//! ## Example
//!
//! ```
//! use promise_future::{event_loop, Future, Reason};
//!
//! let doubled = Future::successful(21)
//!     .map(|v| Ok(v * 2))
//!     .filter(|v| Ok(*v > 40));
//! assert_eq!(event_loop::block_on(doubled).unwrap(), 42);
//!
//! let recovered = Future::<u32>::failed("boom")
//!     .recover(|reason| Ok(reason.to_string().len() as u32));
//! assert_eq!(event_loop::block_on(recovered).unwrap(), 4);
//! ```
pub mod aggregate;
pub mod event_loop;
pub mod future;
pub mod interop;
pub mod poly;
pub mod reason;
pub mod timer;

pub use future::Future;
pub use interop::NodeCallback;
pub use reason::Reason;

/// A single-resolution promise: the producing half settles it once, the
/// waiting half observes the outcome.
///
/// Settling consumes the producer, so a promise cannot be settled twice.
pub trait Promise {
    type Output;
    type Waiter;

    /// Creates the producing half and the half to wait on.
    fn new() -> (Self, Self::Waiter)
    where
        Self: Sized;

    fn resolve(self, value: Self::Output);

    fn reject(self, reason: Reason);

    /// Settles with either a value or a reason.
    fn settle(self, outcome: Result<Self::Output, Reason>)
    where
        Self: Sized,
    {
        match outcome {
            Ok(value) => self.resolve(value),
            Err(reason) => self.reject(reason),
        }
    }
}
