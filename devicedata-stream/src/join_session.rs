// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Detector and join-session abstractions driven by the [`self_join`](crate::self_join) operator.
//!
//! A [`Detector`] looks at each record that reaches an idle slot and decides
//! whether it starts a new [`JoinSession`]. The session then receives every
//! following record until it returns its terminal output, or until the input
//! ends and [`JoinSession::completed`] flushes whatever it holds.
//!
//! # Writing a join kind
//!
//! ```
//! use devicedata_core::Result;
//! use devicedata_stream::join_session::{Detector, JoinSession};
//!
//! /// Joins a "start" marker with the next "end" marker, buffering everything between.
//! struct Span {
//!     start: i32,
//!     buffered: Vec<i32>,
//! }
//!
//! impl JoinSession<i32> for Span {
//!     fn handle(&mut self, item: i32) -> Result<Option<Vec<i32>>> {
//!         if item < 0 {
//!             let mut out = vec![self.start * 100 - item];
//!             out.append(&mut self.buffered);
//!             return Ok(Some(out));
//!         }
//!         if item != self.start {
//!             self.buffered.push(item);
//!         }
//!         Ok(None)
//!     }
//!
//!     fn completed(self: Box<Self>) -> Vec<i32> {
//!         let mut out = vec![self.start];
//!         out.extend(self.buffered);
//!         out
//!     }
//! }
//!
//! struct SpanDetector;
//!
//! impl Detector<i32> for SpanDetector {
//!     type Session = Span;
//!
//!     fn detect(&self, item: &i32) -> Option<Span> {
//!         (*item >= 100).then(|| Span { start: *item, buffered: Vec::new() })
//!     }
//! }
//! ```

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;
use core::marker::PhantomData;
use devicedata_core::Result;

/// Stateful accumulator reconciling a split record into its joined form.
///
/// A session is created by a [`Detector`], receives every record that reaches
/// its slot while it is active, and is discarded as soon as it returns its
/// terminal output.
pub trait JoinSession<T> {
    /// Consumes one record.
    ///
    /// Returns `Ok(None)` while the session is still accumulating, or the final
    /// ordered output once the join is complete. Every record handed to the
    /// session must appear in that output, either verbatim or merged into a
    /// joined record.
    ///
    /// # Errors
    ///
    /// A returned error is fatal: the operator discards the session and
    /// propagates the error without flushing.
    fn handle(&mut self, item: T) -> Result<Option<Vec<T>>>;

    /// Releases everything held by a session that never completed.
    ///
    /// Called at most once, when the input ends while the session is active.
    /// Partial join state should be tagged so downstream consumers can tell it
    /// apart from joined or pass-through records.
    fn completed(self: Box<Self>) -> Vec<T>;

    /// Short name used in log messages.
    fn name(&self) -> &'static str {
        "join"
    }
}

/// Decides whether a record starts a new join session.
pub trait Detector<T> {
    /// The session started by this detector.
    type Session: JoinSession<T> + Send + 'static;

    /// Returns a fresh session if `item` opens a join, `None` otherwise.
    fn detect(&self, item: &T) -> Option<Self::Session>;
}

/// A [`Detector`] backed by a closure.
///
/// Created with [`detector_fn`].
pub struct FnDetector<F, S> {
    detect: F,
    _session: PhantomData<fn() -> S>,
}

/// Wraps a closure returning `Option<Session>` as a [`Detector`].
pub fn detector_fn<T, S, F>(detect: F) -> FnDetector<F, S>
where
    F: Fn(&T) -> Option<S>,
    S: JoinSession<T> + Send + 'static,
{
    FnDetector {
        detect,
        _session: PhantomData,
    }
}

impl<T, S, F> Detector<T> for FnDetector<F, S>
where
    F: Fn(&T) -> Option<S>,
    S: JoinSession<T> + Send + 'static,
{
    type Session = S;

    fn detect(&self, item: &T) -> Option<S> {
        (self.detect)(item)
    }
}

impl<F, S> fmt::Debug for FnDetector<F, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnDetector").finish_non_exhaustive()
    }
}

/// A type-erased session, as stored in an active slot.
pub type BoxedSession<T> = Box<dyn JoinSession<T> + Send>;

/// Object-safe view of a [`Detector`], allowing heterogeneous detectors in one list.
pub trait DynDetector<T>: Send {
    fn detect_boxed(&self, item: &T) -> Option<BoxedSession<T>>;
}

impl<T, D> DynDetector<T> for D
where
    T: 'static,
    D: Detector<T> + Send,
{
    fn detect_boxed(&self, item: &T) -> Option<BoxedSession<T>> {
        self.detect(item)
            .map(|session| Box::new(session) as BoxedSession<T>)
    }
}

/// A type-erased detector, as registered with
/// [`self_join_all`](crate::self_join::SelfJoinExt::self_join_all).
pub type BoxedDetector<T> = Box<dyn DynDetector<T>>;

/// Boxes a detector for registration in an ordered detector list.
pub fn boxed_detector<T, D>(detector: D) -> BoxedDetector<T>
where
    T: 'static,
    D: Detector<T> + Send + 'static,
{
    Box::new(detector)
}
