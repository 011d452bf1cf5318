// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! # devicedata
//!
//! Order-preserving reconciliation of split device-telemetry records.
//!
//! ## Overview
//!
//! Insulin pumps report a dual-wave bolus as two records, an immediate
//! `dual/normal` half and an extended `dual/square` half, with unrelated
//! records possibly in between. This crate joins such halves into one record
//! in a single pass while every other record keeps its position. Bolus fields
//! are then normalized for display.
//!
//! ## Quick Start
//!
//! ```rust
//! use devicedata::prelude::*;
//! use devicedata::{Record, StreamItem};
//! use futures::{stream, StreamExt};
//!
//! # #[tokio::main]
//! # async fn main() -> devicedata::Result<()> {
//! let records = devicedata::records_from_json_str(r#"[
//!     {"type": "basal", "rate": 0.8},
//!     {"type": "bolus", "subType": "dual/normal", "joinKey": "k1", "deviceId": "d1", "value": 2},
//!     {"type": "basal", "rate": 0.9},
//!     {"type": "bolus", "subType": "dual/square", "joinKey": "k1", "deviceId": "d1", "value": 1}
//! ]"#)?;
//!
//! let converted: Vec<StreamItem<Record>> = stream::iter(records)
//!     .map(StreamItem::Value)
//!     .convert_bolus(ConvertBolusOptions::default())
//!     .collect()
//!     .await;
//!
//! assert_eq!(converted.len(), 3);
//! # Ok(())
//! # }
//! ```
//!
//! For in-memory batches, [`convert_bolus_batch`] runs the same conversion
//! without a runtime, and [`convert_bolus_json`] works on JSON text.

// Re-export core types
pub use devicedata_core::{
    display_field, fields, records_from_json_str, DeviceDataError, Record, Result, ResultExt,
    StreamItem,
};

// Re-export operators and join kinds
pub use devicedata_stream::{
    bolus, convert_bolus_batch, join_session, normalize, options, self_join, ConvertBolusExt,
    ConvertBolusOptions, DualBolusDetector, NormalizeBolusExt, SelfJoin, SelfJoinExt,
};

/// Converts a JSON array of records and serializes the result back to JSON.
///
/// # Errors
///
/// Returns [`DeviceDataError::InvalidRecord`] if the input is not a JSON array
/// of objects, or [`DeviceDataError::JoinKeyMismatch`] if a dual-wave bolus
/// cannot be reconciled.
pub fn convert_bolus_json(json: &str, options: &ConvertBolusOptions) -> Result<String> {
    let records = records_from_json_str(json)?;
    let converted = convert_bolus_batch(records, options)?;
    Ok(serde_json::to_string(&converted)?)
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use devicedata_stream::prelude::*;
}
