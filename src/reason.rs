//! The failure side of a [`Future`](crate::Future).
//!
//! A reason is deliberately loose: it is either one of the failures the
//! combinators synthesize themselves, a structured error object, or an
//! arbitrary payload handed over by the caller.
use std::any::Any;
use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum Reason {
    /// A `filter` predicate rejected the value.
    #[error("no such element: predicate is not satisfied")]
    NoSuchElement,
    /// A `collect` partial function is undefined at the given input.
    #[error("partial function is not defined at: {0}")]
    NotDefinedAt(String),
    #[error("{0} attempted on empty collection")]
    EmptyCollection(&'static str),
    /// The producing half went away without settling the promise.
    #[error("producer dropped before settling the promise")]
    ProducerDropped,
    /// A node-style callback was invoked with neither reason nor value.
    #[error("completion callback invoked without a value")]
    MissingValue,
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Error(Arc<dyn StdError + Send + Sync>),
    #[error("opaque failure payload")]
    Payload(Arc<dyn Any + Send + Sync>),
}

impl Reason {
    pub fn msg(message: impl Into<String>) -> Self {
        Reason::Message(message.into())
    }

    /// Wraps a structured error object.
    pub fn error<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Reason::Error(Arc::new(err))
    }

    /// Wraps an arbitrary value as the failure payload.
    pub fn payload<P>(payload: P) -> Self
    where
        P: Any + Send + Sync,
    {
        Reason::Payload(Arc::new(payload))
    }

    /// Returns the wrapped error if it is of type `E`.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        match self {
            Reason::Error(err) => err.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Returns the payload if it is of type `P`.
    pub fn payload_ref<P: Any>(&self) -> Option<&P> {
        match self {
            Reason::Payload(payload) => payload.downcast_ref::<P>(),
            _ => None,
        }
    }

    /// Whether both reasons carry the very same shared error or payload
    /// object. Synthesized and message reasons are never identical.
    pub fn is_same(&self, other: &Reason) -> bool {
        match (self, other) {
            (Reason::Error(a), Reason::Error(b)) => Arc::ptr_eq(a, b),
            (Reason::Payload(a), Reason::Payload(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for Reason {
    fn from(message: &str) -> Self {
        Reason::Message(message.to_owned())
    }
}

impl From<String> for Reason {
    fn from(message: String) -> Self {
        Reason::Message(message)
    }
}

impl From<Box<dyn StdError + Send + Sync>> for Reason {
    fn from(err: Box<dyn StdError + Send + Sync>) -> Self {
        Reason::Error(Arc::from(err))
    }
}

impl From<std::io::Error> for Reason {
    fn from(err: std::io::Error) -> Self {
        Reason::error(err)
    }
}
