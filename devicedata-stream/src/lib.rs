// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Order-preserving stream operators for device telemetry.
//!
//! Device uploads sometimes split one physical event into several records. This
//! crate reconciles them in a single pass over the record stream, without
//! reordering anything else.
//!
//! # Architecture
//!
//! - **[`self_join`]**: a generic detect → accumulate → flush operator driven by
//!   pluggable [`Detector`]s and [`JoinSession`]s
//! - **[`bolus`]**: the dual-wave bolus join kind
//! - **[`normalize`]**: per-record field adjustments applied after the join
//! - **[`convert_bolus`]**: the three stages composed into one conversion step
//!
//! All operators are extension traits over `Stream<Item = StreamItem<T>>`, so
//! they compose with each other and with `futures::StreamExt`. The self-join
//! engine is also usable synchronously through [`SelfJoin`](self_join::SelfJoin).
//!
//! # Ordering Guarantees
//!
//! - Records not involved in a join keep their relative order.
//! - A joined record is emitted where its completing half appeared, followed by
//!   the records buffered while the join was pending.
//! - At end of input, incomplete joins release their halves tagged `_unmatched`,
//!   followed by their buffered records.
//!
//! # Error Handling
//!
//! Errors travel in-band as [`StreamItem::Error`](devicedata_core::StreamItem::Error).
//! Upstream errors pass through every operator. A join that cannot be reconciled
//! safely (mismatched join keys) emits
//! [`DeviceDataError::JoinKeyMismatch`](devicedata_core::DeviceDataError::JoinKeyMismatch)
//! and ends the stream.
//!
//! # Logging
//!
//! With the `tracing` feature, join failures and end-of-stream flushes are
//! reported through `tracing`; otherwise they go to stderr.
//!
//! [`Detector`]: join_session::Detector
//! [`JoinSession`]: join_session::JoinSession

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]

extern crate alloc;

#[macro_use]
mod logging;
pub mod bolus;
pub mod convert_bolus;
pub mod join_session;
pub mod normalize;
pub mod options;
pub mod prelude;
pub mod self_join;

pub use bolus::{DualBolusDetector, DualBolusSession, DualBolusState};
pub use convert_bolus::{convert_bolus_batch, ConvertBolusExt};
pub use join_session::{
    boxed_detector, detector_fn, BoxedDetector, Detector, DynDetector, FnDetector, JoinSession,
};
pub use normalize::{derive_display_values, rename_vendor_fields, NormalizeBolusExt};
pub use options::ConvertBolusOptions;
pub use self_join::{SelfJoin, SelfJoinExt, SelfJoinIter, SelfJoinStream};
