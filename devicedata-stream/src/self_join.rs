// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Self-join operator that reconciles split records within a single stream.
//!
//! This module provides the [`self_join`](SelfJoinExt::self_join) operator: a
//! single-pass, order-preserving detect → accumulate → flush transform.
//!
//! # Overview
//!
//! Each registered [`Detector`] owns one slot. While a slot is idle, its detector
//! inspects every record reaching it; a match starts a
//! [`JoinSession`](crate::join_session::JoinSession) that then
//! receives every following record. The session buffers whatever it doesn't
//! claim and, once the join is complete, returns the joined record followed by
//! the buffered records in their original order. Records that no session claims
//! while all slots are idle are emitted immediately.
//!
//! When the source ends, incomplete sessions are flushed with
//! [`JoinSession::completed`](crate::join_session::JoinSession::completed), so no
//! record is ever dropped.
//!
//! # Basic Usage
//!
//! ```
//! use devicedata_core::{Record, StreamItem};
//! use devicedata_stream::bolus::DualBolusDetector;
//! use devicedata_stream::prelude::*;
//! use futures::StreamExt;
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let record = |value: serde_json::Value| Record::try_from(value).unwrap();
//! let (tx, rx) = futures::channel::mpsc::unbounded();
//! let mut joined = rx.map(StreamItem::Value).self_join(DualBolusDetector);
//!
//! tx.unbounded_send(record(json!({"type": "basal"}))).unwrap();
//! tx.unbounded_send(record(json!({
//!     "type": "bolus", "subType": "dual/normal", "joinKey": "k1", "deviceId": "d1", "value": 2
//! }))).unwrap();
//! tx.unbounded_send(record(json!({"type": "basal", "rate": 0.5}))).unwrap();
//! tx.unbounded_send(record(json!({
//!     "type": "bolus", "subType": "dual/square", "joinKey": "k1", "deviceId": "d1",
//!     "value": 1, "duration": 1800
//! }))).unwrap();
//! drop(tx);
//!
//! assert_eq!(joined.next().await.unwrap().unwrap().record_type(), Some("basal"));
//!
//! let bolus = joined.next().await.unwrap().unwrap();
//! assert_eq!(bolus.get_f64("value"), Some(3.0));
//! assert_eq!(bolus.get_f64("duration"), Some(1800.0));
//!
//! // The basal seen while waiting for the square half follows the joined bolus
//! assert_eq!(joined.next().await.unwrap().unwrap().get_f64("rate"), Some(0.5));
//! assert!(joined.next().await.is_none());
//! # }
//! ```
//!
//! # Multiple Detectors
//!
//! [`self_join_all`](SelfJoinExt::self_join_all) registers a first detector
//! followed by an ordered list of further ones. Slots are chained: whatever slot *k* releases is offered to slot
//! *k + 1*, so the first detector wins when several could match a record.
//!
//! # Error Handling
//!
//! - Errors from upstream are passed through unchanged and do not touch active sessions.
//! - An error raised by a session (such as a join key mismatch) is emitted after
//!   the output produced before it, and then the stream ends. The failed session
//!   is never flushed.

mod implementation;
mod iter;

pub use implementation::SelfJoin;
pub use iter::SelfJoinIter;

use crate::join_session::{BoxedDetector, Detector};
use core::fmt;
use core::pin::Pin;
use core::task::{Context, Poll};
use devicedata_core::{DeviceDataError, StreamItem};
use futures::Stream;
use pin_project::pin_project;

/// Extension trait providing the [`self_join`](Self::self_join) operator.
///
/// This trait is implemented for all streams of [`StreamItem<T>`].
pub trait SelfJoinExt<T>: Stream<Item = StreamItem<T>> + Sized
where
    T: Send + 'static,
{
    /// Joins split records using a single detector.
    ///
    /// See the [module-level documentation](crate::self_join) for details.
    fn self_join<D>(self, detector: D) -> SelfJoinStream<Self, T>
    where
        D: Detector<T> + Send + 'static;

    /// Joins split records using `first`, then each of `rest` in order.
    fn self_join_all(
        self,
        first: BoxedDetector<T>,
        rest: Vec<BoxedDetector<T>>,
    ) -> SelfJoinStream<Self, T>;
}

impl<S, T> SelfJoinExt<T> for S
where
    S: Stream<Item = StreamItem<T>>,
    T: Send + 'static,
{
    fn self_join<D>(self, detector: D) -> SelfJoinStream<Self, T>
    where
        D: Detector<T> + Send + 'static,
    {
        SelfJoinStream::new(self, SelfJoin::with_detector(detector))
    }

    fn self_join_all(
        self,
        first: BoxedDetector<T>,
        rest: Vec<BoxedDetector<T>>,
    ) -> SelfJoinStream<Self, T> {
        SelfJoinStream::new(self, SelfJoin::new(first, rest))
    }
}

/// Stream returned by [`SelfJoinExt::self_join`].
#[pin_project]
pub struct SelfJoinStream<S, T> {
    #[pin]
    stream: S,
    engine: SelfJoin<T>,
    pending_error: Option<DeviceDataError>,
    is_done: bool,
}

impl<S, T> SelfJoinStream<S, T>
where
    S: Stream<Item = StreamItem<T>>,
    T: 'static,
{
    fn new(stream: S, engine: SelfJoin<T>) -> Self {
        Self {
            stream,
            engine,
            pending_error: None,
            is_done: false,
        }
    }
}

impl<S, T> Stream for SelfJoinStream<S, T>
where
    S: Stream<Item = StreamItem<T>>,
    T: 'static,
{
    type Item = StreamItem<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            // Output already produced goes first, then a pending failure
            if let Some(item) = this.engine.pop() {
                return Poll::Ready(Some(StreamItem::Value(item)));
            }
            if let Some(e) = this.pending_error.take() {
                return Poll::Ready(Some(StreamItem::Error(e)));
            }
            if *this.is_done {
                return Poll::Ready(None);
            }

            let outcome = match this.stream.as_mut().poll_next(cx) {
                Poll::Ready(Some(StreamItem::Value(item))) => this.engine.push(item),
                Poll::Ready(Some(StreamItem::Error(e))) => {
                    return Poll::Ready(Some(StreamItem::Error(e)));
                }
                Poll::Ready(None) => {
                    *this.is_done = true;
                    this.engine.finish()
                }
                Poll::Pending => return Poll::Pending,
            };

            if let Err(e) = outcome {
                *this.is_done = true;
                *this.pending_error = Some(e);
            }
        }
    }
}

impl<S, T> fmt::Debug for SelfJoinStream<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelfJoinStream")
            .field("engine", &self.engine)
            .field("is_done", &self.is_done)
            .finish_non_exhaustive()
    }
}
