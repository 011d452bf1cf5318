// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Per-record bolus normalization applied after the self-join.
//!
//! Both passes are pure and leave records that don't match their trigger
//! untouched, so they can run over the whole output stream:
//!
//! - [`rename_vendor_fields`]: `square` boluses from a vendor source carry
//!   `immediate`/`extended` amounts; they become `initialDelivery`/`extendedDelivery`.
//! - [`derive_display_values`]: computes `value` (and `recommended`,
//!   `initialDelivery`, `extendedDelivery`, `extended`) from the delivered amounts.
//!
//! Derivation is idempotent, and reproduces the `value` of a joined dual bolus.
//!
//! ```
//! use devicedata_core::Record;
//! use devicedata_stream::normalize::{derive_display_values, rename_vendor_fields};
//! use devicedata_stream::options::ConvertBolusOptions;
//! use serde_json::json;
//!
//! let options = ConvertBolusOptions::default();
//! let square = Record::try_from(json!({
//!     "type": "bolus", "subType": "square", "source": "diasend",
//!     "immediate": 2, "extended": 1, "time": "2014-01-01T00:00:00Z"
//! })).unwrap();
//!
//! let record = derive_display_values(rename_vendor_fields(square, &options), &options);
//!
//! assert_eq!(record.get_f64("initialDelivery"), Some(2.0));
//! assert_eq!(record.get_f64("extendedDelivery"), Some(1.0));
//! assert_eq!(record.get_f64("value"), Some(3.0));
//! assert!(!record.contains("immediate"));
//! ```

use crate::bolus::sub_types::{NORMAL, SQUARE};
use crate::bolus::BOLUS;
use crate::options::ConvertBolusOptions;
use devicedata_core::fields::{
    EXTENDED, EXTENDED_DELIVERY, IMMEDIATE, INITIAL_DELIVERY, RECOMMENDED, TYPE, VALUE,
};
use devicedata_core::{Record, StreamItem};
use futures::{Stream, StreamExt};
use serde_json::Value;

/// Renames a vendor `square` bolus's `immediate`/`extended` amounts to
/// `initialDelivery`/`extendedDelivery` and flags it as extended.
pub fn rename_vendor_fields(mut record: Record, options: &ConvertBolusOptions) -> Record {
    let is_vendor_square = record.is(BOLUS, SQUARE)
        && record
            .source()
            .is_some_and(|source| options.is_square_vendor(source));
    if !is_vendor_square {
        return record;
    }

    let immediate = record.remove(IMMEDIATE);
    // A boolean `extended` is the flag of an already renamed record, not an amount
    let extended = record.remove(EXTENDED).filter(|v| !v.is_boolean());

    record.copy_field(INITIAL_DELIVERY, immediate.as_ref());
    record.copy_field(EXTENDED_DELIVERY, extended.as_ref());
    record.insert(EXTENDED, true);
    record.insert(TYPE, BOLUS);
    record
}

/// Computes the displayed dose fields of a timestamped bolus.
///
/// - `normal` boluses: `value` and `recommended` take the `normal` amount.
/// - every other bolus: `value` is the immediate plus the extended amount,
///   `initialDelivery`/`extendedDelivery` hold the two amounts and `extended` is set.
///
/// The immediate amount is read from `normal`, falling back to
/// `initialDelivery`; the extended amount from a numeric `extended`, falling
/// back to `extendedDelivery`. A missing amount removes the fields derived from it.
pub fn derive_display_values(mut record: Record, options: &ConvertBolusOptions) -> Record {
    if record.record_type() != Some(BOLUS) || !record.contains(&options.timestamp_field) {
        return record;
    }

    if record.sub_type() == Some(NORMAL) {
        let normal = record.get(NORMAL).cloned();
        record.assign(VALUE, normal.clone());
        record.assign(RECOMMENDED, normal);
        return record;
    }

    let immediate = amount(&record, NORMAL, INITIAL_DELIVERY);
    let extended = amount(&record, EXTENDED, EXTENDED_DELIVERY);

    match (
        immediate.as_ref().and_then(Value::as_f64),
        extended.as_ref().and_then(Value::as_f64),
    ) {
        (Some(i), Some(e)) => {
            record.insert_number(VALUE, i + e);
        }
        _ => {
            record.remove(VALUE);
        }
    }
    record.assign(INITIAL_DELIVERY, immediate);
    record.assign(EXTENDED_DELIVERY, extended);
    record.insert(EXTENDED, true);
    record
}

fn amount(record: &Record, field: &str, fallback: &str) -> Option<Value> {
    record
        .get(field)
        .filter(|v| v.is_number())
        .or_else(|| record.get(fallback).filter(|v| v.is_number()))
        .cloned()
}

/// Extension trait providing the normalization passes as stream operators.
///
/// Errors are passed through unchanged.
pub trait NormalizeBolusExt: Stream<Item = StreamItem<Record>> + Send + Sized {
    /// Applies [`rename_vendor_fields`] to every record.
    fn rename_vendor_fields(
        self,
        options: ConvertBolusOptions,
    ) -> impl Stream<Item = StreamItem<Record>> + Send;

    /// Applies [`derive_display_values`] to every record.
    fn derive_display_values(
        self,
        options: ConvertBolusOptions,
    ) -> impl Stream<Item = StreamItem<Record>> + Send;
}

impl<S> NormalizeBolusExt for S
where
    S: Stream<Item = StreamItem<Record>> + Send + Sized,
{
    fn rename_vendor_fields(
        self,
        options: ConvertBolusOptions,
    ) -> impl Stream<Item = StreamItem<Record>> + Send {
        self.map(move |item| item.map(|record| rename_vendor_fields(record, &options)))
    }

    fn derive_display_values(
        self,
        options: ConvertBolusOptions,
    ) -> impl Stream<Item = StreamItem<Record>> + Send {
        self.map(move |item| item.map(|record| derive_display_values(record, &options)))
    }
}
