//! The [`Future`] handle and its instance combinators.
//!
//! A `Future` owns exactly one [`Consumer`] of a [`poly`](crate::poly)
//! promise. Combinators never settle that promise; each one allocates a new
//! promise, settles it on a later turn of the [`event_loop`] and hands back a
//! `Future` around it.
use std::fmt::{self, Debug};
use std::future::IntoFuture;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{self as futures_future, LocalBoxFuture};
use futures::FutureExt;

use crate::poly::{Consumer, Producer};
use crate::{event_loop, Promise, Reason};

/// Tail of the `and_then` effect queue of one lineage: settles once the last
/// attached effect has run.
type Effects = Arc<Mutex<Option<Consumer<()>>>>;

/// A value or a [`Reason`] that becomes available at most once.
///
/// Cloning is cheap and yields the same future: both handles wait on one
/// promise.
pub struct Future<T> {
    promise: Consumer<T>,
    effects: Effects,
}

fn lock(effects: &Effects) -> MutexGuard<'_, Option<Consumer<()>>> {
    effects.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The outcome of `promise`, reported only after the effects queued ahead of
/// the observer have run.
async fn settled<T: Clone>(
    promise: Consumer<T>,
    effects: Option<Consumer<()>>,
) -> Result<T, Reason> {
    let outcome = promise.await;
    if let Some(effects) = effects {
        // Effects always settle, even when the effect itself failed.
        let _ = effects.await;
    }
    outcome
}

impl<T> Clone for Future<T> {
    fn clone(&self) -> Self {
        Future {
            promise: self.promise.clone(),
            effects: self.effects.clone(),
        }
    }
}

impl<T> Debug for Future<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Future")
            .field("completed", &self.promise.is_settled())
            .finish()
    }
}

impl<T: Clone + 'static> From<Consumer<T>> for Future<T> {
    fn from(promise: Consumer<T>) -> Self {
        Future {
            promise,
            effects: Arc::new(Mutex::new(None)),
        }
    }
}

impl<T: Clone + 'static> Future<T> {
    /// An already succeeded future.
    pub fn successful(value: T) -> Self {
        Future::from(Consumer::settled(Ok(value)))
    }

    /// An already failed future.
    pub fn failed(reason: impl Into<Reason>) -> Self {
        Future::from(Consumer::settled(Err(reason.into())))
    }

    /// `failed` for an `Err`, `successful` for an `Ok`.
    pub fn from_try(outcome: Result<T, Reason>) -> Self {
        Future::from(Consumer::settled(outcome))
    }

    /// Runs `f` on the next turn of the loop and settles with its result.
    ///
    /// ```
    /// use promise_future::{event_loop, Future};
    /// let future = Future::apply(|| Ok(10));
    /// assert!(!future.is_completed());
    /// assert_eq!(event_loop::block_on(future).unwrap(), 10);
    /// ```
    pub fn apply<F>(f: F) -> Self
    where
        F: FnOnce() -> Result<T, Reason> + 'static,
    {
        Future::from_async(async move { f() })
    }

    /// Settles a new future with the output of `work`, which is driven by
    /// the loop.
    pub fn from_async<F>(work: F) -> Self
    where
        F: std::future::Future<Output = Result<T, Reason>> + 'static,
    {
        let (producer, promise) = Producer::new();
        event_loop::spawn(async move { producer.settle(work.await) });
        Future::from(promise)
    }

    /// The outcome, if the underlying promise has settled.
    pub fn value(&self) -> Option<Result<T, Reason>> {
        self.promise.peek()
    }

    pub fn is_completed(&self) -> bool {
        self.promise.is_settled()
    }

    /// Whether both handles wait on the very same promise.
    pub fn same_promise(&self, other: &Future<T>) -> bool {
        self.promise.same_promise(&other.promise)
    }

    /// The outcome as seen by a continuation attached right now.
    pub(crate) fn outcome(
        &self,
    ) -> impl std::future::Future<Output = Result<T, Reason>> + 'static {
        settled(self.promise.clone(), lock(&self.effects).clone())
    }

    pub fn on_complete<F>(&self, callback: F) -> Self
    where
        F: FnOnce(Result<T, Reason>) + 'static,
    {
        let outcome = self.outcome();
        event_loop::spawn(async move { callback(outcome.await) });
        self.clone()
    }

    pub fn on_success<F>(&self, callback: F) -> Self
    where
        F: FnOnce(T) + 'static,
    {
        self.on_complete(move |outcome| {
            if let Ok(value) = outcome {
                callback(value)
            }
        })
    }

    pub fn on_failure<F>(&self, callback: F) -> Self
    where
        F: FnOnce(Reason) + 'static,
    {
        self.on_complete(move |outcome| {
            if let Err(reason) = outcome {
                callback(reason)
            }
        })
    }

    /// Consumes the value for its side effect only.
    pub fn foreach<F>(&self, f: F)
    where
        F: FnOnce(T) + 'static,
    {
        self.on_success(f);
    }

    /// Applies `f` to the value. A failure passes through untouched and `f`
    /// is never called.
    pub fn map<U, F>(&self, f: F) -> Future<U>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> Result<U, Reason> + 'static,
    {
        let outcome = self.outcome();
        Future::from_async(async move { f(outcome.await?) })
    }

    /// Like [`map`](Self::map), but the new future settles exactly as the
    /// future returned by `f` does.
    pub fn flat_map<U, F>(&self, f: F) -> Future<U>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> Result<Future<U>, Reason> + 'static,
    {
        let outcome = self.outcome();
        Future::from_async(async move { f(outcome.await?)?.await })
    }

    /// Keeps the value when `predicate` holds, otherwise fails with
    /// [`Reason::NoSuchElement`].
    pub fn filter<P>(&self, predicate: P) -> Future<T>
    where
        P: FnOnce(&T) -> Result<bool, Reason> + 'static,
    {
        let outcome = self.outcome();
        Future::from_async(async move {
            let value = outcome.await?;
            if predicate(&value)? {
                Ok(value)
            } else {
                Err(Reason::NoSuchElement)
            }
        })
    }

    pub fn with_filter<P>(&self, predicate: P) -> Future<T>
    where
        P: FnOnce(&T) -> Result<bool, Reason> + 'static,
    {
        self.filter(predicate)
    }

    /// Maps through a partial function. `Ok(None)` means the function is not
    /// defined at the value and fails with [`Reason::NotDefinedAt`].
    pub fn collect<S, F>(&self, pf: F) -> Future<S>
    where
        T: Debug,
        S: Clone + 'static,
        F: FnOnce(&T) -> Result<Option<S>, Reason> + 'static,
    {
        let outcome = self.outcome();
        Future::from_async(async move {
            let value = outcome.await?;
            match pf(&value)? {
                Some(collected) => Ok(collected),
                None => Err(Reason::NotDefinedAt(format!("{value:?}"))),
            }
        })
    }

    /// Turns a failure into a value. A success passes through and `f` is never
    /// called.
    pub fn recover<F>(&self, f: F) -> Future<T>
    where
        F: FnOnce(Reason) -> Result<T, Reason> + 'static,
    {
        let outcome = self.outcome();
        Future::from_async(async move { outcome.await.or_else(f) })
    }

    pub fn recover_with<F>(&self, f: F) -> Future<T>
    where
        F: FnOnce(Reason) -> Result<Future<T>, Reason> + 'static,
    {
        let outcome = self.outcome();
        Future::from_async(async move {
            match outcome.await {
                Ok(value) => Ok(value),
                Err(reason) => f(reason)?.await,
            }
        })
    }

    /// Exactly one of the callbacks runs, depending on the outcome.
    pub fn transform<U, S, F>(&self, on_success: S, on_failure: F) -> Future<U>
    where
        U: Clone + 'static,
        S: FnOnce(T) -> Result<U, Reason> + 'static,
        F: FnOnce(Reason) -> Reason + 'static,
    {
        let outcome = self.outcome();
        Future::from_async(async move {
            match outcome.await {
                Ok(value) => on_success(value),
                Err(reason) => Err(on_failure(reason)),
            }
        })
    }

    /// Pairs both values, receiver first. Fails as soon as either side does.
    pub fn zip<U>(&self, other: &Future<U>) -> Future<(T, U)>
    where
        U: Clone + 'static,
    {
        let (left, right) = (self.outcome(), other.outcome());
        Future::from_async(futures_future::try_join(left, right))
    }

    /// The receiver's value if it succeeds; otherwise whatever `other`
    /// settles with. `other` is not awaited at all when the receiver wins.
    pub fn fallback_to(&self, other: &Future<T>) -> Future<T> {
        if let (Some(Ok(value)), None) = (self.value(), lock(&self.effects).as_ref()) {
            return Future::successful(value);
        }
        let outcome = self.outcome();
        let fallback = other.outcome();
        Future::from_async(async move {
            match outcome.await {
                Ok(value) => Ok(value),
                Err(_) => fallback.await,
            }
        })
    }

    /// Queues a side effect on this lineage and returns the same future.
    ///
    /// Effects run in the order they were attached, after the outcome is
    /// known. Anything attached to the lineage afterwards observes the
    /// outcome only once the effect ran. An `Err` from the effect is dropped;
    /// it never changes the outcome.
    ///
    /// ```
    /// use promise_future::{event_loop, Future};
    /// use std::{cell::RefCell, rc::Rc};
    /// let log = Rc::new(RefCell::new(vec![]));
    /// let (a, b) = (log.clone(), log.clone());
    /// let future = Future::successful(100)
    ///     .and_then(move |_| { a.borrow_mut().push(1); Err("ignored".into()) })
    ///     .and_then(move |_| { b.borrow_mut().push(2); Ok(()) });
    /// assert_eq!(event_loop::block_on(future).unwrap(), 100);
    /// assert_eq!(*log.borrow(), [1, 2]);
    /// ```
    pub fn and_then<F>(&self, effect: F) -> Self
    where
        F: FnOnce(&Result<T, Reason>) -> Result<(), Reason> + 'static,
    {
        let (done, tail) = Producer::<()>::new();
        let previous = lock(&self.effects).replace(tail);
        let outcome = settled(self.promise.clone(), previous);
        event_loop::spawn(async move {
            if let Err(reason) = effect(&outcome.await) {
                log::debug!("and_then effect failed, outcome kept: {reason}");
            }
            done.resolve(());
        });
        self.clone()
    }
}

impl<T: Clone + 'static> IntoFuture for Future<T> {
    type Output = Result<T, Reason>;
    type IntoFuture = LocalBoxFuture<'static, Result<T, Reason>>;

    fn into_future(self) -> Self::IntoFuture {
        self.outcome().boxed_local()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::Future;
    use crate::event_loop;
    use crate::poly::Producer;
    use crate::{Promise, Reason};

    #[test]
    fn test_constructors_settle_immediately() {
        assert_eq!(Future::successful(1).value().unwrap().unwrap(), 1);
        assert!(Future::<u8>::failed("x").value().unwrap().is_err());
        assert!(Future::from_try(Ok::<_, Reason>(2)).is_completed());
        assert!(Future::<u8>::from_try(Err("e".into())).value().unwrap().is_err());
    }

    #[test]
    fn test_combinators_never_run_on_the_callers_stack() {
        let calls = Rc::new(RefCell::new(0));
        let seen = calls.clone();
        let mapped = Future::successful(1).map(move |v| {
            *seen.borrow_mut() += 1;
            Ok(v)
        });
        assert_eq!(*calls.borrow(), 0);
        assert!(!mapped.is_completed());
        event_loop::run();
        assert_eq!(*calls.borrow(), 1);
        assert_eq!(mapped.value().unwrap().unwrap(), 1);
    }

    #[test]
    fn test_and_then_aliases_the_receiver() {
        let future = Future::successful(5);
        let alias = future.and_then(|_| Ok(()));
        assert!(alias.same_promise(&future));
        assert!(!future.map(Ok).same_promise(&future));
    }

    #[test]
    fn test_effects_run_before_later_observers() {
        let (producer, promise) = Producer::<u32>::new();
        let future = Future::from(promise);
        let trail = Rc::new(RefCell::new(vec![]));

        let early = trail.clone();
        future.on_success(move |_| early.borrow_mut().push("early observer"));
        let effect = trail.clone();
        future.and_then(move |_| {
            effect.borrow_mut().push("effect");
            Ok(())
        });
        let late = trail.clone();
        future.on_success(move |_| late.borrow_mut().push("late observer"));

        event_loop::run_until_stalled();
        assert!(trail.borrow().is_empty());
        producer.resolve(1);
        event_loop::run();
        let trail = trail.borrow();
        let effect_at = trail.iter().position(|t| *t == "effect").unwrap();
        let late_at = trail.iter().position(|t| *t == "late observer").unwrap();
        assert!(effect_at < late_at);
        assert_eq!(trail.len(), 3);
    }
}
