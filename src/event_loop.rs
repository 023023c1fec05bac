//! The host scheduling loop.
//!
//! Every OS thread owns its own loop, which means that:
//!
//! 1. A task is executed on the thread that spawned it.
//! 2. Spawning never runs anything. A thread has to call one of [block_on],
//!    [run] or [run_until_stalled] before any queued continuation executes.
//!
//! Because a loop only ever runs one task at a time, tasks and the callbacks
//! they carry do not need to be `Send`.
//!
//! # Example
//!
//! ```
//! use promise_future::event_loop;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! let cell = Rc::new(RefCell::new(0));
//! {
//!     let cell = cell.clone();
//!     event_loop::spawn(async move { *cell.borrow_mut() += 10 });
//! }
//! // Queued, not executed.
//! assert_eq!(*cell.borrow(), 0);
//! event_loop::run();
//! assert_eq!(*cell.borrow(), 10);
//! ```
use std::cell::RefCell;
use std::future::{Future, IntoFuture};

use futures::executor::{LocalPool, LocalSpawner};
use futures::task::LocalSpawnExt;

struct EventLoop {
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
}

thread_local! {
    static LOOP: EventLoop = {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        EventLoop { pool: RefCell::new(pool), spawner }
    };
}

/// Queue `task` on this thread's loop. It runs on a later turn, never on the
/// caller's stack.
pub fn spawn<F>(task: F)
where
    F: Future<Output = ()> + 'static,
{
    match LOOP.try_with(|event_loop| event_loop.spawner.spawn_local(task)) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => log::warn!("event loop refused a task: {err}"),
        Err(_) => log::warn!("event loop torn down, task dropped"),
    }
}

fn with_pool<R>(f: impl FnOnce(&mut LocalPool) -> R) -> R {
    LOOP.with(|event_loop| {
        let mut pool = event_loop
            .pool
            .try_borrow_mut()
            .expect("the event loop is already running on this thread");
        f(&mut pool)
    })
}

/// Drive the loop until every queued task has finished. Parks the thread
/// while tasks wait on timers or on other threads.
///
/// # Panics
///
/// Panics when called from a task already running on this thread's loop.
pub fn run() {
    with_pool(|pool| pool.run())
}

/// Drive the loop until no task can make progress without an outside
/// wake-up.
///
/// # Panics
///
/// Panics when called from a task already running on this thread's loop.
pub fn run_until_stalled() {
    with_pool(|pool| pool.run_until_stalled())
}

/// Drive the loop until `f` resolves and return its output. Other tasks keep
/// running alongside `f` but may still be pending on return.
///
/// # Panics
///
/// Panics when called from a task already running on this thread's loop.
pub fn block_on<F: IntoFuture>(f: F) -> F::Output {
    let f = f.into_future();
    with_pool(|pool| pool.run_until(f))
}
