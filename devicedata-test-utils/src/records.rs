// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Record fixtures.
//!
//! Every fixture carries a `seq` field so tests can tell otherwise identical
//! records apart when checking order.

use devicedata_core::Record;
use serde_json::{json, Value};

/// Builds a record from a JSON object literal.
///
/// # Panics
///
/// Panics if `value` is not a JSON object.
pub fn record(value: Value) -> Record {
    match Record::try_from(value) {
        Ok(record) => record,
        Err(e) => panic!("fixture is not a record: {e}"),
    }
}

pub fn basal(seq: u64) -> Record {
    record(json!({
        "type": "basal",
        "deliveryType": "scheduled",
        "deviceId": "pump-1",
        "rate": 0.85,
        "seq": seq
    }))
}

pub fn normal_bolus(seq: u64, amount: f64) -> Record {
    record(json!({
        "type": "bolus",
        "subType": "normal",
        "deviceId": "pump-1",
        "normal": amount,
        "time": "2014-03-06T09:00:00.000Z",
        "seq": seq
    }))
}

pub fn dual_normal(join_key: &str, device_id: &str, value: f64) -> Record {
    record(json!({
        "type": "bolus",
        "subType": "dual/normal",
        "id": format!("{join_key}-normal"),
        "joinKey": join_key,
        "deviceId": device_id,
        "deviceTime": "2014-03-06T09:00:00",
        "source": "carelink",
        "value": value
    }))
}

pub fn dual_square(join_key: &str, device_id: &str, value: f64) -> Record {
    record(json!({
        "type": "bolus",
        "subType": "dual/square",
        "id": format!("{join_key}-square"),
        "joinKey": join_key,
        "deviceId": device_id,
        "deviceTime": "2014-03-06T09:00:05",
        "source": "carelink",
        "value": value,
        "duration": 3_600_000
    }))
}

/// A vendor `square` bolus still carrying its `immediate`/`extended` amounts.
pub fn diasend_square(immediate: f64, extended: f64) -> Record {
    record(json!({
        "type": "bolus",
        "subType": "square",
        "source": "diasend",
        "deviceId": "pump-2",
        "immediate": immediate,
        "extended": extended,
        "duration": 1_800_000,
        "time": "2014-03-06T12:00:00.000Z"
    }))
}
