// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Test utilities and record fixtures for the devicedata workspace.
//!
//! Operators consume their input stream, so tests drive them through a channel:
//! the sender stays in the test and the receiving side is handed to the operator.
//!
//! ```rust
//! use devicedata_test_utils::records::basal;
//! use devicedata_test_utils::{test_channel, unwrap_stream, unwrap_value};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let (tx, mut stream) = test_channel();
//! tx.unbounded_send(basal(1)).unwrap();
//!
//! let record = unwrap_value(Some(unwrap_stream(&mut stream, 500).await));
//! assert_eq!(record, basal(1));
//! # }
//! ```
//!
//! # Module Organization
//!
//! - `helpers` - Assertion and collection helpers with timeouts
//! - `records` - Record fixtures for basal and bolus scenarios

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
pub mod helpers;
pub mod records;

use devicedata_core::StreamItem;
use futures::channel::mpsc;
use futures::{Stream, StreamExt};

pub use helpers::{
    assert_no_element_emitted, assert_stream_ended, collect_values, unwrap_stream, unwrap_value,
};

/// Creates a test channel that automatically wraps values in `StreamItem::Value`.
pub fn test_channel<T: Send + 'static>() -> (
    mpsc::UnboundedSender<T>,
    impl Stream<Item = StreamItem<T>> + Send + Unpin,
) {
    let (tx, rx) = mpsc::unbounded();
    let stream = rx.map(StreamItem::Value);
    (tx, stream)
}

/// Creates a test channel that accepts `StreamItem<T>` for testing error propagation.
///
/// ```rust
/// use devicedata_core::{DeviceDataError, StreamItem};
/// use devicedata_test_utils::test_channel_with_errors;
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() {
/// let (tx, mut stream) = test_channel_with_errors();
///
/// tx.unbounded_send(StreamItem::Value(42)).unwrap();
/// tx.unbounded_send(StreamItem::Error(DeviceDataError::stream_error("test error"))).unwrap();
///
/// assert!(stream.next().await.unwrap().is_value());
/// assert!(stream.next().await.unwrap().is_error());
/// # }
/// ```
pub fn test_channel_with_errors<T: Send + 'static>() -> (
    mpsc::UnboundedSender<StreamItem<T>>,
    impl Stream<Item = StreamItem<T>> + Send + Unpin,
) {
    mpsc::unbounded()
}
