// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Dual-wave bolus reconciliation.
//!
//! Pumps report a dual-wave bolus as two records: a `dual/normal` half with the
//! immediate portion and a `dual/square` half with the extended portion. The
//! [`DualBolusDetector`] opens a [`DualBolusSession`] on the normal half; the
//! session waits for the matching square half from the same device and
//! replaces both with one joined bolus.

use crate::join_session::{Detector, JoinSession};
use alloc::boxed::Box;
use alloc::vec::Vec;
use devicedata_core::fields::{
    DEVICE_ID, DEVICE_TIME, DURATION, EXTENDED, EXTENDED_DELIVERY, ID, INITIAL_DELIVERY,
    JOIN_KEY, SOURCE, TYPE, VALUE,
};
use devicedata_core::{display_field, DeviceDataError, Record, Result};
use serde_json::Value;

pub const BOLUS: &str = "bolus";

/// Bolus `subType` values.
pub mod sub_types {
    pub const NORMAL: &str = "normal";
    pub const SQUARE: &str = "square";
    pub const DUAL_NORMAL: &str = "dual/normal";
    pub const DUAL_SQUARE: &str = "dual/square";
}

use sub_types::{DUAL_NORMAL, DUAL_SQUARE};

/// Starts a [`DualBolusSession`] on every `dual/normal` bolus that was not
/// released by an earlier flush.
#[derive(Debug, Clone, Copy, Default)]
pub struct DualBolusDetector;

impl Detector<Record> for DualBolusDetector {
    type Session = DualBolusSession;

    fn detect(&self, record: &Record) -> Option<DualBolusSession> {
        // Flushed halves must not reopen a join when a stream is replayed
        (record.is(BOLUS, DUAL_NORMAL) && !record.is_unmatched()).then(DualBolusSession::new)
    }
}

/// Progress of a [`DualBolusSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DualBolusState {
    /// No half stored yet.
    Empty,
    /// The normal half is stored.
    AwaitingSquare,
    /// The square half is stored.
    AwaitingNormal,
    /// Both halves are stored.
    BothPresent,
}

enum Half {
    Normal,
    Square,
}

/// Accumulates the two halves of one dual-wave bolus.
///
/// Records that are not a half from the locked device are buffered and
/// re-emitted, in order, right after the joined bolus.
#[derive(Debug, Default)]
pub struct DualBolusSession {
    normal: Option<Record>,
    square: Option<Record>,
    device_id: Option<Value>,
    buffered: Vec<Record>,
}

impl DualBolusSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DualBolusState {
        match (&self.normal, &self.square) {
            (None, None) => DualBolusState::Empty,
            (Some(_), None) => DualBolusState::AwaitingSquare,
            (None, Some(_)) => DualBolusState::AwaitingNormal,
            (Some(_), Some(_)) => DualBolusState::BothPresent,
        }
    }

    /// The device the session is locked to, once a half has been stored.
    pub fn device_id(&self) -> Option<&Value> {
        self.device_id.as_ref()
    }

    /// Records waiting to be re-emitted after the join.
    pub fn buffered(&self) -> &[Record] {
        &self.buffered
    }

    fn half_of(&self, record: &Record) -> Option<Half> {
        if record.record_type() != Some(BOLUS) {
            return None;
        }
        if let Some(locked) = &self.device_id {
            if record.device_id() != Some(locked) {
                return None;
            }
        }
        match record.sub_type() {
            Some(DUAL_NORMAL) => Some(Half::Normal),
            Some(DUAL_SQUARE) => Some(Half::Square),
            _ => None,
        }
    }

    fn store(&mut self, half: Half, record: Record) {
        self.device_id = record.device_id().cloned();
        let slot = match half {
            Half::Normal => &mut self.normal,
            Half::Square => &mut self.square,
        };
        if let Some(previous) = slot.replace(record) {
            warn!(
                "dual bolus: {} half at ts[{}] replaced before its join completed",
                previous.sub_type().unwrap_or_default(),
                display_field(previous.get(DEVICE_TIME))
            );
        }
    }
}

impl JoinSession<Record> for DualBolusSession {
    fn handle(&mut self, record: Record) -> Result<Option<Vec<Record>>> {
        let Some(half) = self.half_of(&record) else {
            self.buffered.push(record);
            return Ok(None);
        };
        self.store(half, record);

        let (Some(normal), Some(square)) = (&self.normal, &self.square) else {
            return Ok(None);
        };

        if !same_join_key(normal.join_key(), square.join_key()) {
            return Err(DeviceDataError::join_key_mismatch(
                display_field(normal.join_key()),
                display_field(square.join_key()),
                display_field(normal.get(DEVICE_TIME)),
            ));
        }

        let mut output = Vec::with_capacity(1 + self.buffered.len());
        output.push(join_halves(normal, square));
        output.append(&mut self.buffered);
        Ok(Some(output))
    }

    fn completed(self: Box<Self>) -> Vec<Record> {
        let session = *self;
        session
            .normal
            .into_iter()
            .chain(session.square)
            .map(Record::mark_unmatched)
            .chain(session.buffered)
            .collect()
    }

    fn name(&self) -> &'static str {
        "dual bolus"
    }
}

/// Numeric keys compare by value, so `1` and `1.0` match.
fn same_join_key(normal: Option<&Value>, square: Option<&Value>) -> bool {
    match (normal, square) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => a.as_f64() == b.as_f64(),
        _ => normal == square,
    }
}

/// Builds the single bolus replacing a matched normal/square pair.
///
/// Identity and timing come from the normal half, `duration` from the square
/// half. Amounts missing on either half leave the derived fields absent.
pub fn join_halves(normal: &Record, square: &Record) -> Record {
    let mut joined = Record::new()
        .with(TYPE, BOLUS)
        .with(EXTENDED, true);

    joined.copy_field(ID, normal.get(ID));
    joined.copy_field(JOIN_KEY, normal.join_key());
    joined.copy_field(DEVICE_ID, normal.get(DEVICE_ID));
    joined.copy_field(DEVICE_TIME, normal.get(DEVICE_TIME));
    joined.copy_field(SOURCE, normal.get(SOURCE));
    joined.copy_field(DURATION, square.get(DURATION));
    joined.copy_field(INITIAL_DELIVERY, normal.get(VALUE));
    joined.copy_field(EXTENDED_DELIVERY, square.get(VALUE));

    if let (Some(immediate), Some(extended)) = (normal.get_f64(VALUE), square.get_f64(VALUE)) {
        joined.insert_number(VALUE, immediate + extended);
    }

    joined
}
