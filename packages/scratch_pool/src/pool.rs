use std::any::type_name;
use std::{fmt, thread};

use tracing::debug;

use crate::{DropPolicy, Error, Result, Scope, ScratchPoolBuilder, Slot, take_from};

/// A fixed-capacity pool of reusable byte buffers for code whose nesting depth is bounded.
///
/// Each level of a nested call chain borrows one buffer with [`alloc()`][1] and returns it with
/// [`free()`][2] before the call returns. Buffers must be released in exactly the reverse order
/// they were requested in, like balanced parentheses. Instead of allocating a new buffer per
/// call, the pool keeps one slot per level and reuses it, so the number of heap allocations is
/// bounded by the pool capacity rather than by the number of calls.
///
/// # Slot selection
///
/// A request for `n` bytes is served by the smallest free slot that already holds at least `n`
/// bytes. If no free slot is big enough, the largest free slot is reallocated to exactly `n`
/// bytes. Over many requests of varying size, each slot converges on the high-water mark of
/// the level that tends to use it.
///
/// # Misuse
///
/// Requesting a buffer while all slots are checked out means the pool was created with a
/// capacity smaller than the nesting depth of the code using it. Releasing with nothing
/// checked out means a release without a matching request. The `try_` methods report these
/// as an [`Error`]; the plain methods panic.
///
/// The pool only counts releases; it cannot tell which buffer the caller thinks it is releasing.
/// Use [`scope()`][3] to have the borrow checker enforce the nesting instead.
///
/// # Example
///
/// ```rust
/// use scratch_pool::ScratchPool;
///
/// let mut pool = ScratchPool::new(2);
///
/// let outer = pool.alloc(1024);
/// outer.fill(1);
///
/// let inner = pool.calloc(16);
/// assert!(inner.iter().all(|&b| b == 0));
/// pool.free();
///
/// // The outer buffer is once again the most recent one.
/// assert!(pool.last_mut().unwrap().iter().all(|&b| b == 1));
/// pool.free();
///
/// assert_eq!(pool.stats(), 1024 + 16);
/// ```
///
/// [1]: Self::alloc
/// [2]: Self::free
/// [3]: Self::scope
pub struct ScratchPool {
    /// The first `available` slots form the free region. The rest are checked out, with the
    /// most recently allocated one at index `available`.
    slots: Box<[Slot]>,

    available: usize,

    drop_policy: DropPolicy,
}

impl ScratchPool {
    pub(crate) fn new_inner(capacity: usize, drop_policy: DropPolicy) -> Self {
        Self {
            slots: (0..capacity).map(|_| Slot::new()).collect(),
            available: capacity,
            drop_policy,
        }
    }

    /// Creates a pool that can hand out up to `capacity` buffers at the same time.
    ///
    /// No buffer memory is allocated until it is first requested.
    ///
    /// # Example
    ///
    /// ```rust
    /// use scratch_pool::ScratchPool;
    ///
    /// let pool = ScratchPool::new(3);
    ///
    /// assert_eq!(pool.capacity(), 3);
    /// assert_eq!(pool.stats(), 0);
    /// ```
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self::builder().capacity(capacity).build()
    }

    /// Starts building a new [`ScratchPool`].
    ///
    /// Use this when you want to customize the pool configuration beyond the defaults.
    ///
    /// # Example
    ///
    /// ```rust
    /// use scratch_pool::{DropPolicy, ScratchPool};
    ///
    /// let pool = ScratchPool::builder()
    ///     .capacity(4)
    ///     .drop_policy(DropPolicy::MustNotDropOutstanding)
    ///     .build();
    ///
    /// assert_eq!(pool.capacity(), 4);
    /// ```
    pub fn builder() -> ScratchPoolBuilder {
        ScratchPoolBuilder::new()
    }

    /// The number of buffers the pool can hand out at the same time.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// The number of buffers that can still be requested before the pool is exhausted.
    #[must_use]
    pub fn available(&self) -> usize {
        self.available
    }

    /// The number of buffers currently checked out, i.e. the current nesting depth.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.capacity()
            .checked_sub(self.available)
            .expect("available slots never exceed the capacity")
    }

    /// Checks out a buffer of exactly `len` bytes.
    ///
    /// The contents of the buffer are whatever the previous user of the slot left there. Use
    /// [`try_calloc()`][Self::try_calloc] if you need zeroed memory.
    ///
    /// The buffer stays checked out until the matching [`try_free()`][Self::try_free]. Only
    /// the most recently checked out buffer can be reached again, via
    /// [`last_mut()`][Self::last_mut].
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityExhausted`] if all slots are already checked out.
    ///
    /// # Example
    ///
    /// ```rust
    /// use scratch_pool::{Error, ScratchPool};
    ///
    /// let mut pool = ScratchPool::new(1);
    ///
    /// assert_eq!(pool.try_alloc(10)?.len(), 10);
    ///
    /// assert_eq!(
    ///     pool.try_alloc(10),
    ///     Err(Error::CapacityExhausted { capacity: 1 })
    /// );
    /// # Ok::<(), scratch_pool::Error>(())
    /// ```
    pub fn try_alloc(&mut self, len: usize) -> Result<&mut [u8]> {
        let capacity = self.capacity();

        let free = self
            .slots
            .get_mut(..self.available)
            .expect("available slots never exceed the capacity");

        let Some(slot) = take_from(free, len) else {
            debug!(capacity, len, "scratch pool exhausted");
            return Err(Error::CapacityExhausted { capacity });
        };

        // The chosen slot is now the last one of the free region, which moving the boundary
        // turns into the first checked out slot.
        self.available = self
            .available
            .checked_sub(1)
            .expect("a slot was taken so the free region was not empty");

        Ok(slot.lend(len))
    }

    /// Checks out a buffer of exactly `len` bytes.
    ///
    /// See [`try_alloc()`][Self::try_alloc] for details.
    ///
    /// # Panics
    ///
    /// Panics if all slots are already checked out.
    ///
    /// # Example
    ///
    /// ```rust
    /// use scratch_pool::ScratchPool;
    ///
    /// let mut pool = ScratchPool::new(1);
    ///
    /// let buffer = pool.alloc(3);
    /// buffer.copy_from_slice(b"abc");
    /// pool.free();
    /// ```
    pub fn alloc(&mut self, len: usize) -> &mut [u8] {
        match self.try_alloc(len) {
            Ok(buffer) => buffer,
            Err(error) => panic!("{error}"),
        }
    }

    /// Checks out a buffer of exactly `len` bytes, all set to zero.
    ///
    /// Only the `len` bytes handed out are zeroed, not the whole backing slot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityExhausted`] if all slots are already checked out.
    pub fn try_calloc(&mut self, len: usize) -> Result<&mut [u8]> {
        let buffer = self.try_alloc(len)?;
        buffer.fill(0);
        Ok(buffer)
    }

    /// Checks out a buffer of exactly `len` bytes, all set to zero.
    ///
    /// See [`try_calloc()`][Self::try_calloc] for details.
    ///
    /// # Panics
    ///
    /// Panics if all slots are already checked out.
    pub fn calloc(&mut self, len: usize) -> &mut [u8] {
        match self.try_calloc(len) {
            Ok(buffer) => buffer,
            Err(error) => panic!("{error}"),
        }
    }

    /// Returns the most recently checked out buffer to the pool.
    ///
    /// The caller is responsible for having finished with that buffer. The pool only verifies
    /// that some buffer is checked out, not that the caller releases the one it means to.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnbalancedFree`] if no buffer is checked out.
    ///
    /// # Example
    ///
    /// ```rust
    /// use scratch_pool::{Error, ScratchPool};
    ///
    /// let mut pool = ScratchPool::new(1);
    ///
    /// pool.alloc(10);
    /// pool.try_free()?;
    ///
    /// assert_eq!(
    ///     pool.try_free(),
    ///     Err(Error::UnbalancedFree { capacity: 1 })
    /// );
    /// # Ok::<(), scratch_pool::Error>(())
    /// ```
    pub fn try_free(&mut self) -> Result<()> {
        let capacity = self.capacity();

        if self.available == capacity {
            debug!(capacity, "scratch pool freed with nothing checked out");
            return Err(Error::UnbalancedFree { capacity });
        }

        self.available = self
            .available
            .checked_add(1)
            .expect("guarded by the capacity check above");

        Ok(())
    }

    /// Returns the most recently checked out buffer to the pool.
    ///
    /// See [`try_free()`][Self::try_free] for details.
    ///
    /// # Panics
    ///
    /// Panics if no buffer is checked out.
    pub fn free(&mut self) {
        if let Err(error) = self.try_free() {
            panic!("{error}");
        }
    }

    /// Accesses the most recently checked out buffer again, with the length it was requested
    /// with.
    ///
    /// Under correct nesting, this is the caller's own buffer once all its callees have freed
    /// theirs.
    ///
    /// Returns `None` if no buffer is checked out.
    ///
    /// # Example
    ///
    /// ```rust
    /// use scratch_pool::ScratchPool;
    ///
    /// let mut pool = ScratchPool::new(2);
    ///
    /// pool.alloc(4).copy_from_slice(b"mine");
    ///
    /// pool.alloc(100);
    /// pool.free();
    ///
    /// assert_eq!(pool.last_mut().unwrap(), b"mine");
    /// ```
    #[must_use]
    pub fn last_mut(&mut self) -> Option<&mut [u8]> {
        self.slots.get_mut(self.available).map(Slot::lent_mut)
    }

    /// The total number of bytes of backing storage held by the pool, whether checked out or
    /// not.
    ///
    /// This does not account for the small fixed overhead of the pool itself.
    #[must_use]
    pub fn stats(&self) -> usize {
        self.slots.iter().map(Slot::capacity).sum()
    }

    /// Opens a [`Scope`] over the slots that are currently free.
    ///
    /// Buffers obtained through the scope are released when they and the nested scope that came
    /// with them are dropped, so their nesting is checked at compile time. The pool is borrowed
    /// for as long as the scope exists.
    ///
    /// # Example
    ///
    /// ```rust
    /// use scratch_pool::ScratchPool;
    ///
    /// let mut pool = ScratchPool::new(2);
    /// let mut scope = pool.scope();
    ///
    /// let (outer, mut nested) = scope.alloc(8);
    /// let (inner, _) = nested.alloc(8);
    ///
    /// // Both buffers are usable at the same time.
    /// outer.fill(1);
    /// inner.fill(2);
    /// ```
    pub fn scope(&mut self) -> Scope<'_> {
        let capacity = self.capacity();

        let free = self
            .slots
            .get_mut(..self.available)
            .expect("available slots never exceed the capacity");

        Scope::new(free, capacity)
    }
}

impl fmt::Debug for ScratchPool {
    #[cfg_attr(test, mutants::skip)] // No API contract to test.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("capacity", &self.capacity())
            .field("available", &self.available)
            .field("outstanding", &self.outstanding())
            .field("bytes", &self.stats())
            .field("drop_policy", &self.drop_policy)
            .finish()
    }
}

impl Drop for ScratchPool {
    fn drop(&mut self) {
        // If we are already panicking, we do not want to panic again because that will
        // simply obscure whatever the original panic was, leading to debug difficulties.
        if !thread::panicking() && matches!(self.drop_policy, DropPolicy::MustNotDropOutstanding)
        {
            let outstanding = self.outstanding();

            assert!(
                outstanding == 0,
                "dropped a ScratchPool with {outstanding} buffers still checked out - this is forbidden by DropPolicy::MustNotDropOutstanding"
            );
        }
    }
}
