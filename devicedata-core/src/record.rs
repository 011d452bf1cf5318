// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Open-ended device telemetry records.
//!
//! A [`Record`] is a mapping of field names to JSON values. Operators only read
//! the handful of fields named in [`fields`]; everything else is carried along
//! untouched.
//!
//! ```
//! use devicedata_core::Record;
//! use serde_json::json;
//!
//! let record = Record::try_from(json!({
//!     "type": "bolus",
//!     "subType": "dual/normal",
//!     "joinKey": "k1",
//!     "value": 2
//! }))
//! .unwrap();
//!
//! assert_eq!(record.record_type(), Some("bolus"));
//! assert_eq!(record.sub_type(), Some("dual/normal"));
//! assert_eq!(record.get_f64("value"), Some(2.0));
//! ```

use crate::error::{DeviceDataError, Result};
use core::fmt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field names read or written by the join pipeline.
pub mod fields {
    pub const TYPE: &str = "type";
    pub const SUB_TYPE: &str = "subType";
    pub const ID: &str = "id";
    pub const DEVICE_ID: &str = "deviceId";
    pub const DEVICE_TIME: &str = "deviceTime";
    pub const JOIN_KEY: &str = "joinKey";
    pub const SOURCE: &str = "source";
    pub const VALUE: &str = "value";
    pub const NORMAL: &str = "normal";
    pub const EXTENDED: &str = "extended";
    pub const IMMEDIATE: &str = "immediate";
    pub const DURATION: &str = "duration";
    pub const RECOMMENDED: &str = "recommended";
    pub const INITIAL_DELIVERY: &str = "initialDelivery";
    pub const EXTENDED_DELIVERY: &str = "extendedDelivery";
    /// Set on halves released by an end-of-stream flush.
    pub const UNMATCHED: &str = "_unmatched";
}

/// One structured telemetry entry from a device data stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Parses a single record from a JSON object string.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceDataError::InvalidRecord`] if the input is not valid JSON
    /// or is not a JSON object.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::try_from(value)
    }

    /// Returns the raw value of `field`, including explicit `null`s.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    pub fn get_f64(&self, field: &str) -> Option<f64> {
        self.0.get(field).and_then(Value::as_f64)
    }

    /// Returns `true` if `field` is present and not `null`.
    pub fn contains(&self, field: &str) -> bool {
        self.0.get(field).is_some_and(|v| !v.is_null())
    }

    /// JavaScript-style truthiness of `field`.
    ///
    /// Absent fields, `null`, `false`, `0` and `""` are falsy.
    pub fn is_truthy(&self, field: &str) -> bool {
        match self.0.get(field) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(_)) | Some(Value::Object(_)) => true,
        }
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    /// Stores a computed amount, keeping whole numbers as JSON integers.
    pub fn insert_number(&mut self, field: impl Into<String>, number: f64) -> Option<Value> {
        self.insert(field, number_value(number))
    }

    /// Copies `from`'s value into `field` when present. Absent sources leave `field` untouched.
    pub fn copy_field(&mut self, field: &str, from: Option<&Value>) {
        if let Some(value) = from {
            self.insert(field, value.clone());
        }
    }

    /// Sets `field` to `value`, or removes it when `value` is absent or `null`.
    pub fn assign(&mut self, field: &str, value: Option<Value>) {
        match value.filter(|v| !v.is_null()) {
            Some(value) => {
                self.insert(field, value);
            }
            None => {
                self.remove(field);
            }
        }
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn record_type(&self) -> Option<&str> {
        self.get_str(fields::TYPE)
    }

    pub fn sub_type(&self) -> Option<&str> {
        self.get_str(fields::SUB_TYPE)
    }

    pub fn source(&self) -> Option<&str> {
        self.get_str(fields::SOURCE)
    }

    /// The originating device, `null` treated as absent.
    pub fn device_id(&self) -> Option<&Value> {
        self.get(fields::DEVICE_ID).filter(|v| !v.is_null())
    }

    pub fn join_key(&self) -> Option<&Value> {
        self.get(fields::JOIN_KEY)
    }

    /// Returns `true` if both `type` and `subType` match.
    pub fn is(&self, record_type: &str, sub_type: &str) -> bool {
        self.record_type() == Some(record_type) && self.sub_type() == Some(sub_type)
    }

    /// Returns `true` if this record was released by an end-of-stream flush.
    pub fn is_unmatched(&self) -> bool {
        self.is_truthy(fields::UNMATCHED)
    }

    /// Tags the record as an orphaned half of a join that never completed.
    #[must_use]
    pub fn mark_unmatched(self) -> Self {
        self.with(fields::UNMATCHED, true)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

/// Parses a JSON array of records.
///
/// # Errors
///
/// Returns [`DeviceDataError::InvalidRecord`] if the input is not a JSON array
/// of objects.
pub fn records_from_json_str(json: &str) -> Result<Vec<Record>> {
    Ok(serde_json::from_str(json)?)
}

/// Renders a field value for diagnostics: strings without quotes, absent as `undefined`.
pub fn display_field(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn number_value(number: f64) -> Value {
    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;
    if number.fract() == 0.0 && number.abs() <= MAX_SAFE_INTEGER {
        Value::from(number as i64)
    } else {
        Value::from(number)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Record {
    type Error = DeviceDataError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(DeviceDataError::invalid_record(format!(
                "expected a JSON object, found `{other}`"
            ))),
        }
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record.0)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(&self.0).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
