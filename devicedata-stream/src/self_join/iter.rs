// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use super::implementation::SelfJoin;
use core::fmt;
use devicedata_core::{DeviceDataError, Result};

/// Iterator adapter driving a [`SelfJoin`] engine over a synchronous input.
///
/// Yields `Ok` records in output order. A session error is yielded after the
/// output produced before it, and ends the iteration.
pub struct SelfJoinIter<I, T> {
    input: I,
    engine: SelfJoin<T>,
    pending_error: Option<DeviceDataError>,
    is_done: bool,
}

impl<I, T> SelfJoinIter<I, T>
where
    I: Iterator<Item = T>,
    T: 'static,
{
    pub(crate) fn new(input: I, engine: SelfJoin<T>) -> Self {
        Self {
            input,
            engine,
            pending_error: None,
            is_done: false,
        }
    }
}

impl<I, T> Iterator for SelfJoinIter<I, T>
where
    I: Iterator<Item = T>,
    T: 'static,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.engine.pop() {
                return Some(Ok(item));
            }
            if let Some(e) = self.pending_error.take() {
                return Some(Err(e));
            }
            if self.is_done {
                return None;
            }

            let outcome = match self.input.next() {
                Some(item) => self.engine.push(item),
                None => {
                    self.is_done = true;
                    self.engine.finish()
                }
            };

            if let Err(e) = outcome {
                self.is_done = true;
                self.pending_error = Some(e);
            }
        }
    }
}

impl<I, T> fmt::Debug for SelfJoinIter<I, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelfJoinIter")
            .field("engine", &self.engine)
            .field("is_done", &self.is_done)
            .finish_non_exhaustive()
    }
}
