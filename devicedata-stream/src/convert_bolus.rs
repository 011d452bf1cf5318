// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! The complete bolus conversion step.
//!
//! Raw records → [`self_join`](crate::self_join) with [`DualBolusDetector`] →
//! [`rename_vendor_fields`] → [`derive_display_values`].
//!
//! A join key mismatch aborts the conversion: the stream emits the error and
//! ends, and [`convert_bolus_batch`] returns it.

use crate::bolus::DualBolusDetector;
use crate::normalize::{derive_display_values, rename_vendor_fields, NormalizeBolusExt};
use crate::options::ConvertBolusOptions;
use crate::self_join::{SelfJoin, SelfJoinExt};
use devicedata_core::{Record, Result, StreamItem};
use futures::Stream;

/// Extension trait providing the [`convert_bolus`](Self::convert_bolus) operator.
pub trait ConvertBolusExt: Stream<Item = StreamItem<Record>> + Send + Sized {
    /// Joins dual-wave boluses and normalizes every bolus for display.
    ///
    /// # Examples
    ///
    /// ```
    /// use devicedata_core::{Record, StreamItem};
    /// use devicedata_stream::prelude::*;
    /// use devicedata_stream::options::ConvertBolusOptions;
    /// use futures::{stream, StreamExt};
    /// use serde_json::json;
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let records = vec![
    ///     json!({"type": "bolus", "subType": "dual/normal", "joinKey": "k1", "value": 2}),
    ///     json!({"type": "bolus", "subType": "dual/square", "joinKey": "k2", "value": 1}),
    /// ];
    /// let source = stream::iter(records)
    ///     .map(|value| StreamItem::from(Record::try_from(value)));
    ///
    /// let output: Vec<_> = source
    ///     .convert_bolus(ConvertBolusOptions::default())
    ///     .collect()
    ///     .await;
    ///
    /// assert_eq!(output.len(), 1);
    /// assert!(output[0].is_error());
    /// # }
    /// ```
    fn convert_bolus(
        self,
        options: ConvertBolusOptions,
    ) -> impl Stream<Item = StreamItem<Record>> + Send;
}

impl<S> ConvertBolusExt for S
where
    S: Stream<Item = StreamItem<Record>> + Send + Sized,
{
    fn convert_bolus(
        self,
        options: ConvertBolusOptions,
    ) -> impl Stream<Item = StreamItem<Record>> + Send {
        self.self_join(DualBolusDetector)
            .rename_vendor_fields(options.clone())
            .derive_display_values(options)
    }
}

/// Runs the bolus conversion over an in-memory batch.
///
/// # Errors
///
/// Returns [`DeviceDataError::JoinKeyMismatch`](devicedata_core::DeviceDataError::JoinKeyMismatch)
/// if a dual-wave bolus pairs halves with different join keys. No partial
/// output is returned in that case.
pub fn convert_bolus_batch<I>(records: I, options: &ConvertBolusOptions) -> Result<Vec<Record>>
where
    I: IntoIterator<Item = Record>,
{
    SelfJoin::with_detector(DualBolusDetector)
        .join_iter(records)
        .map(|joined| {
            joined.map(|record| derive_display_values(rename_vendor_fields(record, options), options))
        })
        .collect()
}
