//! Operations over collections of futures.
//!
//! Joins report the first reason to settle, in completion order. Folds only
//! ever see the complete, input-ordered set of values.
use futures::future::{self as futures_future, FutureExt};
use futures::stream::{FuturesUnordered, StreamExt};

use crate::{Future, Reason};

impl<T: Clone + 'static> Future<Vec<T>> {
    /// Collects every value in input order, or fails with the first reason to
    /// settle.
    ///
    /// ```
    /// use promise_future::{event_loop, Future};
    /// let all = Future::sequence([Future::successful(1), Future::successful(2)]);
    /// assert_eq!(event_loop::block_on(all).unwrap(), [1, 2]);
    /// ```
    pub fn sequence<I>(futures: I) -> Self
    where
        I: IntoIterator<Item = Future<T>>,
    {
        let outcomes: Vec<_> = futures.into_iter().map(|future| future.outcome()).collect();
        Future::from_async(futures_future::try_join_all(outcomes))
    }

    /// Maps every argument to a future up front, then joins them like
    /// [`sequence`](Self::sequence).
    ///
    /// `f` is applied eagerly and in order. The first `Err` it returns is
    /// handed straight back to the caller and `f` is not applied to any later
    /// argument. Futures that merely fail do not stop the mapping.
    pub fn traverse<A, I, F>(args: I, f: F) -> Result<Self, Reason>
    where
        I: IntoIterator<Item = A>,
        F: FnMut(A) -> Result<Future<T>, Reason>,
    {
        let futures = args.into_iter().map(f).collect::<Result<Vec<_>, _>>()?;
        Ok(Future::sequence(futures))
    }
}

impl<T: Clone + 'static> Future<Option<T>> {
    /// The first value, in completion order, that satisfies `predicate`, or
    /// `None` when nothing does.
    ///
    /// Failed futures and predicate errors count as misses; `find` itself
    /// never fails.
    pub fn find<I, P>(futures: I, mut predicate: P) -> Self
    where
        I: IntoIterator<Item = Future<T>>,
        P: FnMut(&T) -> Result<bool, Reason> + 'static,
    {
        let mut pending: FuturesUnordered<_> =
            futures.into_iter().map(|future| future.outcome()).collect();
        Future::from_async(async move {
            while let Some(outcome) = pending.next().await {
                let value = match outcome {
                    Ok(value) => value,
                    Err(reason) => {
                        log::trace!("find skips failed future: {reason}");
                        continue;
                    }
                };
                match predicate(&value) {
                    Ok(true) => return Ok(Some(value)),
                    Ok(false) => {}
                    Err(reason) => {
                        log::trace!("find predicate failed, treated as miss: {reason}")
                    }
                }
            }
            Ok(None)
        })
    }
}

impl<T: Clone + 'static> Future<T> {
    /// Settles exactly as whichever input settles first.
    ///
    /// An empty input fails with [`Reason::EmptyCollection`] right away. A
    /// plain race over nothing would never settle; failing makes the mistake
    /// visible instead of leaving every observer waiting forever.
    pub fn first_completed_of<I>(futures: I) -> Self
    where
        I: IntoIterator<Item = Future<T>>,
    {
        let outcomes: Vec<_> = futures
            .into_iter()
            .map(|future| future.outcome().boxed_local())
            .collect();
        if outcomes.is_empty() {
            return Future::failed(Reason::EmptyCollection("first_completed_of"));
        }
        Future::from_async(async move { futures_future::select_all(outcomes).await.0 })
    }

    /// Once every input succeeded, folds the values left to right starting
    /// from `base`. An empty input yields `base` without calling `op`.
    pub fn fold<V, I, F>(futures: I, base: T, mut op: F) -> Self
    where
        V: Clone + 'static,
        I: IntoIterator<Item = Future<V>>,
        F: FnMut(T, V) -> Result<T, Reason> + 'static,
    {
        let futures: Vec<_> = futures.into_iter().collect();
        if futures.is_empty() {
            return Future::successful(base);
        }
        Future::sequence(futures)
            .map(move |values| values.into_iter().try_fold(base, |acc, value| op(acc, value)))
    }

    /// [`fold`](Self::fold) seeded with the first value.
    ///
    /// An empty input fails right away with [`Reason::EmptyCollection`].
    pub fn reduce<I, F>(futures: I, mut op: F) -> Self
    where
        I: IntoIterator<Item = Future<T>>,
        F: FnMut(T, T) -> Result<T, Reason> + 'static,
    {
        let futures: Vec<_> = futures.into_iter().collect();
        if futures.is_empty() {
            return Future::failed(Reason::EmptyCollection("reduce"));
        }
        Future::sequence(futures).map(move |values| {
            let mut values = values.into_iter();
            let first = values.next().ok_or(Reason::EmptyCollection("reduce"))?;
            values.try_fold(first, |acc, value| op(acc, value))
        })
    }
}
