use tracing::debug;

use crate::{Error, Result, Slot, take_from};

/// A view of the free slots of a [`ScratchPool`][crate::ScratchPool] whose buffers are
/// released by dropping them, with the nesting checked by the borrow checker.
///
/// Requesting a buffer from a scope returns the buffer together with a nested scope over the
/// slots that are still free. Both borrow the parent scope, so the parent cannot hand out
/// another buffer until the nested scope and the buffer are gone. That makes out-of-order
/// release impossible instead of merely detectable, and there is no release call to forget.
///
/// Slot selection is the same as for [`ScratchPool::alloc()`][crate::ScratchPool::alloc].
///
/// # Example
///
/// ```rust
/// use scratch_pool::{Scope, ScratchPool};
///
/// fn checksum(data: &[u8], mut scope: Scope<'_>) -> u8 {
///     let (copy, nested) = scope.alloc(data.len());
///     copy.copy_from_slice(data);
///     copy.reverse();
///
///     let sum = copy.iter().fold(0_u8, |acc, &b| acc.wrapping_add(b));
///
///     if copy.len() > 1 {
///         sum.wrapping_add(checksum(&data[1..], nested))
///     } else {
///         sum
///     }
/// }
///
/// let mut pool = ScratchPool::new(3);
///
/// assert_eq!(checksum(&[1, 2, 3], pool.scope()), 6 + 5 + 3);
/// ```
#[derive(Debug)]
pub struct Scope<'p> {
    free: &'p mut [Slot],

    /// Capacity of the whole pool, for error reporting.
    capacity: usize,
}

impl<'p> Scope<'p> {
    pub(crate) fn new(free: &'p mut [Slot], capacity: usize) -> Self {
        Self { free, capacity }
    }

    /// The number of buffers that can still be requested through this scope and the scopes
    /// nested in it.
    #[must_use]
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Checks out a buffer of exactly `len` bytes, together with a scope over the remaining
    /// free slots.
    ///
    /// The buffer is returned to the pool when both the buffer and the nested scope are no
    /// longer in use. Its contents are whatever the previous user of the slot left there.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityExhausted`] if no slot is left in this scope.
    pub fn try_alloc(&mut self, len: usize) -> Result<(&mut [u8], Scope<'_>)> {
        let capacity = self.capacity;

        if take_from(self.free, len).is_none() {
            debug!(capacity, len, "scratch pool scope exhausted");
            return Err(Error::CapacityExhausted { capacity });
        }

        let (taken, rest) = self
            .free
            .split_last_mut()
            .expect("a slot was taken so the free region was not empty");

        Ok((taken.lend(len), Scope::new(rest, capacity)))
    }

    /// Checks out a buffer of exactly `len` bytes, together with a scope over the remaining
    /// free slots.
    ///
    /// See [`try_alloc()`][Self::try_alloc] for details.
    ///
    /// # Panics
    ///
    /// Panics if no slot is left in this scope.
    pub fn alloc(&mut self, len: usize) -> (&mut [u8], Scope<'_>) {
        match self.try_alloc(len) {
            Ok(taken) => taken,
            Err(error) => panic!("{error}"),
        }
    }

    /// Checks out a buffer of exactly `len` bytes, all set to zero, together with a scope over
    /// the remaining free slots.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityExhausted`] if no slot is left in this scope.
    pub fn try_calloc(&mut self, len: usize) -> Result<(&mut [u8], Scope<'_>)> {
        let (buffer, nested) = self.try_alloc(len)?;
        buffer.fill(0);
        Ok((buffer, nested))
    }

    /// Checks out a buffer of exactly `len` bytes, all set to zero, together with a scope over
    /// the remaining free slots.
    ///
    /// # Panics
    ///
    /// Panics if no slot is left in this scope.
    pub fn calloc(&mut self, len: usize) -> (&mut [u8], Scope<'_>) {
        match self.try_calloc(len) {
            Ok(taken) => taken,
            Err(error) => panic!("{error}"),
        }
    }
}
