use std::fmt::Debug;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::{future::Future, pin::Pin, task::{Context, Poll, Waker}};

use crate::{Promise, Reason};

/// This `poly::Producer` promise can have many consumers. The consumers may be
/// cloned, and every one of them observes the same outcome.
///
/// # Examples
///
/// ```
/// use promise_future::{Promise, poly::Producer};
/// use futures::executor::block_on;
/// use std::thread;
/// let (promise, consumer) = Producer::<String>::new();
/// let consumer2 = consumer.clone();
/// let task1 = thread::spawn(move || block_on(async {
///     println!("Received on task 1 {:?}",  consumer.await);
/// }));
/// let task2 = thread::spawn(move || block_on(async {
///     println!("Received on task 2 {:?}",  consumer2.await);
/// }));
/// promise.resolve("Hi".into());
/// task1.join().expect("The task1 thread has panicked.");
/// task2.join().expect("The task2 thread has panicked.");
/// ```
#[derive(Debug)]
pub struct Producer<T> {
    promise: Arc<Mutex<Inner<T>>>,
}

pub struct Consumer<T> {
    promise: Arc<Mutex<Inner<T>>>,
}

#[derive(Debug)]
struct Inner<T> {
    value: Option<Arc<Result<T, Reason>>>,
    waker: Vec<Waker>, // Every pending consumer keeps its own waker.
}

fn lock<T>(promise: &Mutex<Inner<T>>) -> MutexGuard<'_, Inner<T>> {
    promise.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T> Producer<T> {
    fn complete(&self, outcome: Result<T, Reason>) {
        let mut promise = lock(&self.promise);
        promise.value = Some(Arc::new(outcome));
        for waker in promise.waker.drain(..) {
            waker.wake()
        }
    }
}

impl<T> Promise for Producer<T> {
    type Output = T;
    type Waiter = Consumer<T>;

    ///promise.resolve
    ///
    /// # Examples
    ///
    /// ```
    /// use promise_future::{Promise, poly::Producer};
    /// use futures::executor::block_on;
    /// use std::thread;
    /// let (op, op_a) = Producer::<String>::new();
    /// let task1 = thread::spawn(move || block_on(async {
    ///     assert_eq!(op_a.await.unwrap(), "🍓");
    /// }));
    /// op.resolve(String::from("🍓"));
    /// task1.join().expect("The task1 thread has panicked");
    /// ```
    fn resolve(self, value: T) {
        self.complete(Ok(value))
    }

    ///promise.reject
    fn reject(self, reason: Reason) {
        self.complete(Err(reason))
    }

    fn new() -> (Self, Self::Waiter) {
        let producer = Self {
            promise: Arc::new(Mutex::new(Inner {
                value: None,
                waker: vec![],
            })),
        };
        let consumer = Consumer { promise: producer.promise.clone() };
        (producer, consumer)
    }
}

impl<T> Drop for Producer<T> {
    /// If this is an unsettled producer, settle with an error and wake.
    fn drop(&mut self) {
        let mut promise = lock(&self.promise);
        if promise.value.is_none() {
            log::debug!("promise producer dropped before settling");
            promise.value = Some(Arc::new(Err(Reason::ProducerDropped)));
            for waker in promise.waker.drain(..) {
                waker.wake()
            }
        }
    }
}

impl<T> Consumer<T> {
    /// A consumer that is settled from the start.
    pub fn settled(outcome: Result<T, Reason>) -> Self {
        Consumer {
            promise: Arc::new(Mutex::new(Inner {
                value: Some(Arc::new(outcome)),
                waker: vec![],
            })),
        }
    }

    pub fn is_settled(&self) -> bool {
        lock(&self.promise).value.is_some()
    }

    /// Whether both consumers wait on the same promise.
    pub fn same_promise(&self, other: &Consumer<T>) -> bool {
        Arc::ptr_eq(&self.promise, &other.promise)
    }
}

impl<T: Clone> Consumer<T> {
    /// The outcome, if the promise has settled already.
    pub fn peek(&self) -> Option<Result<T, Reason>> {
        lock(&self.promise).value.as_deref().cloned()
    }
}

impl<T> Clone for Consumer<T> {
    fn clone(&self) -> Self {
        Consumer { promise: self.promise.clone() }
    }
}

impl<T> Debug for Consumer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Consumer")
            .field("settled", &self.is_settled())
            .finish()
    }
}

impl<T: Clone> Future for Consumer<T> {
    type Output = Result<T, Reason>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut promise = lock(&self.promise);
        match promise.value {
            Some(ref value) => Poll::Ready((**value).clone()),
            None => {
                if !promise.waker.iter().any(|w| w.will_wake(cx.waker())) {
                    promise.waker.push(cx.waker().clone());
                }
                Poll::Pending
            }
        }
    }
}

#[cfg(test)]
mod tests {
use futures::executor::block_on;
use std::thread;
use super::{Consumer, Producer};
use crate::{Promise, Reason};

#[test]
fn test_promise_resolve() {
    let (op, op_a) = Producer::<String>::new();
    let task1 = thread::spawn(move || {
        block_on(async {
            assert_eq!(op_a.await.unwrap(), "🍓");
        })
    });
    let task2 = thread::spawn(move || {
        block_on(async {
            op.resolve(String::from("🍓"));
        })
    });
    task1.join().expect("The task1 thread has panicked");
    task2.join().expect("The task2 thread has panicked");
}

#[test]
fn test_two_consumers_resolve() {
    let (op, op_a) = Producer::<String>::new();
    let op_b = op_a.clone();
    let task1 = thread::spawn(move || {
        block_on(async {
            assert_eq!(op_a.await.unwrap(), "🍓");
        })
    });
    let task2 = thread::spawn(move || {
        block_on(async {
            assert_eq!(op_b.await.unwrap(), "🍓");
        })
    });
    let task3 = thread::spawn(move || {
        block_on(async {
            op.resolve(String::from("🍓"));
        })
    });
    task1.join().expect("The task1 thread has panicked");
    task2.join().expect("The task2 thread has panicked");
    task3.join().expect("The task3 thread has panicked");
}

#[test]
fn test_promise_reject() {
    let (a, b) = Producer::<String>::new();
    let task1 = thread::spawn(|| {
        block_on(async {
            let err = b.await.unwrap_err();
            assert_eq!(err.to_string(), "reject!!");
        })
    });
    let task2 = thread::spawn(|| {
        block_on(async {
            a.reject(Reason::from("reject!!"));
        })
    });
    task1.join().expect("The task1 thread has panicked");
    task2.join().expect("The task2 thread has panicked");
}

#[test]
fn test_promise_unsettled_producer_dropped() {
    let (op, op_a) = Producer::<String>::new();
    let task1 = thread::spawn(move || block_on(op_a));
    let task2 = thread::spawn(move || {
        // Move the producer into this thread but never resolve it.
        std::mem::drop(op);
    });
    task2.join().expect("The task2 thread has panicked");
    let outcome = task1.join().expect("The task1 thread has panicked");
    assert!(matches!(outcome, Err(Reason::ProducerDropped)));
}

#[test]
fn test_peek() {
    let (op, op_a) = Producer::<u32>::new();
    assert_eq!(op_a.peek().map(|r| r.ok()), None);
    assert!(!op_a.is_settled());
    op.resolve(7);
    assert!(op_a.is_settled());
    assert_eq!(op_a.peek().and_then(|r| r.ok()), Some(7));
    // Settled consumers can be awaited many times.
    assert_eq!(block_on(op_a.clone()).unwrap(), 7);
    assert_eq!(block_on(op_a).unwrap(), 7);
}

#[test]
fn test_settled_consumer() {
    let done = Consumer::settled(Ok::<_, Reason>("hi"));
    assert!(done.is_settled());
    assert!(!done.same_promise(&Consumer::settled(Ok("hi"))));
    assert!(done.same_promise(&done.clone()));
    assert_eq!(block_on(done).unwrap(), "hi");
}
}
