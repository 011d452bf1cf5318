// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Core types shared by the device-data stream operators.
//!
//! - [`Record`]: an open-ended telemetry entry (JSON object)
//! - [`StreamItem`]: a value or an in-band error flowing through a stream
//! - [`DeviceDataError`]: the root error type

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
pub mod error;
pub mod record;
pub mod stream_item;

pub use self::error::{DeviceDataError, Result, ResultExt};
pub use self::record::{display_field, fields, records_from_json_str, Record};
pub use self::stream_item::StreamItem;
