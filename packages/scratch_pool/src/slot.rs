use std::fmt;

use tracing::trace;

/// One reusable backing buffer of a scratch pool.
///
/// The storage is exactly as large as the biggest request the slot has ever had to be regrown
/// for. It only ever grows: a request smaller than the storage is served by lending out a
/// prefix of it, leaving the rest untouched.
pub(crate) struct Slot {
    storage: Box<[u8]>,

    /// Length of the view most recently lent out from this slot.
    lent_len: usize,
}

impl Slot {
    /// Creates an empty slot. No memory is allocated until the slot is first regrown.
    pub(crate) fn new() -> Self {
        Self {
            storage: Box::default(),
            lent_len: 0,
        }
    }

    /// Number of bytes of backing storage held by the slot.
    pub(crate) fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Replaces the storage with a fresh allocation of exactly `len` bytes.
    ///
    /// The new storage exists before the old one is released, so the two never share an address.
    fn regrow(&mut self, len: usize) {
        trace!(from = self.capacity(), to = len, "regrowing scratch slot");

        self.storage = vec![0; len].into_boxed_slice();
    }

    /// Lends out the first `len` bytes of the storage.
    ///
    /// # Panics
    ///
    /// Panics if `len` exceeds the capacity of the slot.
    pub(crate) fn lend(&mut self, len: usize) -> &mut [u8] {
        self.lent_len = len;
        self.lent_mut()
    }

    /// Returns the view most recently lent out by [`lend()`][Self::lend].
    pub(crate) fn lent_mut(&mut self) -> &mut [u8] {
        self.storage
            .get_mut(..self.lent_len)
            .expect("a slot is never lent out beyond its capacity")
    }
}

impl fmt::Debug for Slot {
    #[cfg_attr(test, mutants::skip)] // No API contract to test.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Contents are scratch data owned by whoever borrowed them, so we never print them.
        f.debug_struct("Slot")
            .field("capacity", &self.capacity())
            .field("lent_len", &self.lent_len)
            .finish()
    }
}

/// Picks the slot of the free region that will serve a request for `len` bytes, moves it to
/// the end of the region and returns it.
///
/// The pick is the smallest slot with at least `len` bytes of capacity. If there is no such
/// slot, the largest slot is regrown to exactly `len` bytes instead. On ties, the slot found
/// first wins in both cases.
///
/// Returns `None` if the free region is empty.
pub(crate) fn take_from(free: &mut [Slot], len: usize) -> Option<&mut Slot> {
    let last_index = free.len().checked_sub(1)?;

    let mut best_fit: Option<(usize, usize)> = None;
    let mut largest: Option<(usize, usize)> = None;

    for (index, slot) in free.iter().enumerate() {
        let capacity = slot.capacity();

        if largest.is_none_or(|(_, largest_capacity)| capacity > largest_capacity) {
            largest = Some((index, capacity));
        }

        if capacity >= len
            && best_fit.is_none_or(|(_, best_capacity)| capacity < best_capacity)
        {
            best_fit = Some((index, capacity));
        }
    }

    let chosen_index = match best_fit {
        Some((index, _)) => index,
        None => {
            let (index, _) = largest.expect("free region was checked to be non-empty");

            free.get_mut(index)
                .expect("index came from enumerating the free region")
                .regrow(len);

            index
        }
    };

    free.swap(chosen_index, last_index);
    free.last_mut()
}
