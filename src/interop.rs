//! Bridges to node-style completion callbacks, `(reason, value)` with the
//! reason absent on success.
use crate::poly::Producer;
use crate::{Future, Promise, Reason};

/// The completion callback [`Future::denodify`] hands to the wrapped
/// function. Calling it settles the future; dropping it uncalled fails the
/// future with [`Reason::ProducerDropped`].
#[derive(Debug)]
pub struct NodeCallback<T> {
    producer: Producer<T>,
}

impl<T> NodeCallback<T> {
    /// A reason means failure, otherwise the value is the result. With
    /// neither there is nothing to resolve with, so the future fails with
    /// [`Reason::MissingValue`]; see [`NodeCallback::call_or_default`].
    pub fn call(self, reason: Option<Reason>, value: Option<T>) {
        match (reason, value) {
            (Some(reason), _) => self.producer.reject(reason),
            (None, Some(value)) => self.producer.resolve(value),
            (None, None) => self.producer.reject(Reason::MissingValue),
        }
    }

    pub fn settle(self, outcome: Result<T, Reason>) {
        self.producer.settle(outcome)
    }

    /// The callback as a plain closure, for APIs that take one.
    pub fn into_fn(self) -> impl FnOnce(Option<Reason>, Option<T>) {
        move |reason, value| self.call(reason, value)
    }
}

impl<T: Default> NodeCallback<T> {
    /// Like [`NodeCallback::call`], but a call without reason and value
    /// succeeds with `T::default()`. Suits operations that report only
    /// completion, such as `NodeCallback<()>`.
    pub fn call_or_default(self, reason: Option<Reason>, value: Option<T>) {
        match reason {
            Some(reason) => self.producer.reject(reason),
            None => self.producer.resolve(value.unwrap_or_default()),
        }
    }
}

impl<T: Clone + 'static> Future<T> {
    /// Calls `f` right away with a fresh [`NodeCallback`]. The future settles
    /// per the callback's invocation. If `f` returns an `Err` before the
    /// callback settled anything, the future fails with that reason and a
    /// later call of the callback is ignored.
    ///
    /// Arguments and receiver of the wrapped function are captured by `f`.
    ///
    /// ```
    /// use promise_future::{event_loop, Future, NodeCallback};
    /// fn add(lhs: i32, rhs: i32, done: NodeCallback<i32>) {
    ///     done.call(None, Some(lhs + rhs));
    /// }
    /// let sum = Future::denodify(|done| {
    ///     add(1, 2, done);
    ///     Ok(())
    /// });
    /// assert_eq!(event_loop::block_on(sum).unwrap(), 3);
    /// ```
    pub fn denodify<F>(f: F) -> Self
    where
        F: FnOnce(NodeCallback<T>) -> Result<(), Reason>,
    {
        let (producer, promise) = Producer::new();
        match f(NodeCallback { producer }) {
            Ok(()) => Future::from(promise),
            Err(reason) => match promise.peek() {
                // dropped by `f` on its way out: report what `f` failed with
                None | Some(Err(Reason::ProducerDropped)) => Future::failed(reason),
                Some(_) => Future::from(promise),
            },
        }
    }

    /// Reports the outcome to a node-style callback: exactly one of reason
    /// and value is present.
    pub fn nodify<F>(&self, callback: F)
    where
        F: FnOnce(Option<Reason>, Option<T>) + 'static,
    {
        self.on_complete(move |outcome| match outcome {
            Ok(value) => callback(None, Some(value)),
            Err(reason) => callback(Some(reason), None),
        });
    }
}
