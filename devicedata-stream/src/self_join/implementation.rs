// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::join_session::{boxed_detector, BoxedDetector, BoxedSession, Detector};
use alloc::collections::VecDeque;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;
use devicedata_core::Result;

/// One registered detector plus its (at most one) active session.
struct Slot<T> {
    detector: BoxedDetector<T>,
    session: Option<BoxedSession<T>>,
}

impl<T: 'static> Slot<T> {
    /// Offers `item` to this slot and returns whatever the slot releases downstream.
    fn offer(&mut self, item: T) -> Result<Vec<T>> {
        if self.session.is_none() {
            match self.detector.detect_boxed(&item) {
                Some(session) => self.session = Some(session),
                None => return Ok(vec![item]),
            }
        }

        let Some(session) = self.session.as_mut() else {
            return Ok(vec![item]);
        };

        match session.handle(item) {
            Ok(None) => Ok(Vec::new()),
            Ok(Some(output)) => {
                self.session = None;
                Ok(output)
            }
            Err(e) => {
                error!("self_join: {} session failed: {}", session.name(), e);
                self.session = None;
                Err(e)
            }
        }
    }

    fn flush(&mut self) -> Vec<T> {
        match self.session.take() {
            Some(session) => {
                warn!(
                    "self_join: input ended with an incomplete {} session, flushing it",
                    session.name()
                );
                session.completed()
            }
            None => Vec::new(),
        }
    }
}

/// Synchronous self-join engine.
///
/// Holds one slot per registered detector. A record enters the first slot;
/// whatever a slot releases (an unclaimed record, a session's terminal output,
/// or an end-of-stream flush) enters the next slot in order, and whatever the
/// last slot releases is appended to the FIFO output buffer.
///
/// The first detector therefore wins when several could match the same record,
/// and records buffered by an active session are only seen by later slots once
/// that session releases them.
///
/// # Examples
///
/// ```
/// use devicedata_core::Record;
/// use devicedata_stream::bolus::DualBolusDetector;
/// use devicedata_stream::self_join::SelfJoin;
/// use serde_json::json;
///
/// let mut engine = SelfJoin::with_detector(DualBolusDetector);
///
/// let normal = Record::try_from(json!({
///     "type": "bolus", "subType": "dual/normal", "joinKey": "k1", "deviceId": "d1", "value": 2
/// })).unwrap();
/// let square = Record::try_from(json!({
///     "type": "bolus", "subType": "dual/square", "joinKey": "k1", "deviceId": "d1", "value": 1
/// })).unwrap();
///
/// engine.push(normal).unwrap();
/// assert_eq!(engine.active_sessions(), 1);
///
/// engine.push(square).unwrap();
/// let joined: Vec<Record> = engine.drain().collect();
/// assert_eq!(joined.len(), 1);
/// assert_eq!(joined[0].get_f64("value"), Some(3.0));
/// ```
pub struct SelfJoin<T> {
    slots: Vec<Slot<T>>,
    output: VecDeque<T>,
}

impl<T: 'static> SelfJoin<T> {
    /// Creates an engine with `first` followed by the `rest` of the detectors.
    pub fn new(first: BoxedDetector<T>, rest: Vec<BoxedDetector<T>>) -> Self {
        Self {
            slots: core::iter::once(first)
                .chain(rest)
                .map(|detector| Slot {
                    detector,
                    session: None,
                })
                .collect(),
            output: VecDeque::new(),
        }
    }

    /// Creates an engine with a single detector.
    pub fn with_detector<D>(detector: D) -> Self
    where
        D: Detector<T> + Send + 'static,
    {
        Self::new(boxed_detector(detector), Vec::new())
    }

    /// Drives one input record through the slots.
    ///
    /// # Errors
    ///
    /// Propagates the first error raised by a session. The failing session is
    /// discarded; output produced before the failure stays in the buffer.
    pub fn push(&mut self, item: T) -> Result<()> {
        self.route(0, item)
    }

    /// Flushes every active session, in slot order.
    ///
    /// Records released by a flush still pass through the later slots, so they
    /// may start or complete sessions there before those slots are flushed.
    ///
    /// # Errors
    ///
    /// Propagates an error raised by a later slot's session while it handles
    /// flushed records.
    pub fn finish(&mut self) -> Result<()> {
        for index in 0..self.slots.len() {
            let flushed = self.slots[index].flush();
            for item in flushed {
                self.route(index + 1, item)?;
            }
        }
        Ok(())
    }

    /// Discards all active sessions and pending output.
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.session = None;
        }
        self.output.clear();
    }

    /// Removes the next output record, if any.
    pub fn pop(&mut self) -> Option<T> {
        self.output.pop_front()
    }

    /// Drains the output buffer in FIFO order.
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.output.drain(..)
    }

    /// Number of output records waiting to be drained.
    pub fn pending(&self) -> usize {
        self.output.len()
    }

    /// Number of slots with an active session.
    pub fn active_sessions(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.session.is_some())
            .count()
    }

    /// Returns `true` if no session is active.
    pub fn is_idle(&self) -> bool {
        self.active_sessions() == 0
    }

    /// Runs the engine over a synchronous iterator.
    pub fn join_iter<I>(self, iter: I) -> super::iter::SelfJoinIter<I::IntoIter, T>
    where
        I: IntoIterator<Item = T>,
    {
        super::iter::SelfJoinIter::new(iter.into_iter(), self)
    }

    fn route(&mut self, index: usize, item: T) -> Result<()> {
        let Some(slot) = self.slots.get_mut(index) else {
            self.output.push_back(item);
            return Ok(());
        };

        for released in slot.offer(item)? {
            self.route(index + 1, released)?;
        }
        Ok(())
    }
}

impl<T> fmt::Debug for SelfJoin<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelfJoin")
            .field("slots", &self.slots.len())
            .field(
                "active_sessions",
                &self.slots.iter().filter(|s| s.session.is_some()).count(),
            )
            .field("pending", &self.output.len())
            .finish()
    }
}
