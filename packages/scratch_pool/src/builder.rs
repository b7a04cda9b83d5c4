use std::cell::Cell;
use std::marker::PhantomData;

use crate::{DropPolicy, ScratchPool};

/// Builder for creating an instance of [`ScratchPool`].
///
/// The capacity is mandatory, whereas other settings are optional. If you only need to set the
/// capacity, [`ScratchPool::new()`] is shorter.
///
/// # Examples
///
/// ```
/// use scratch_pool::{DropPolicy, ScratchPool};
///
/// let pool = ScratchPool::builder()
///     .capacity(3)
///     .drop_policy(DropPolicy::MustNotDropOutstanding)
///     .build();
/// ```
///
/// # Thread safety
///
/// The builder is thread-mobile ([`Send`]) but not thread-safe ([`Sync`]).
#[derive(Debug)]
#[must_use]
pub struct ScratchPoolBuilder {
    capacity: Option<usize>,
    drop_policy: DropPolicy,

    _not_sync: PhantomData<Cell<()>>,
}

impl ScratchPoolBuilder {
    pub(crate) fn new() -> Self {
        Self {
            capacity: None,
            drop_policy: DropPolicy::default(),
            _not_sync: PhantomData,
        }
    }

    /// Sets the number of buffers the pool can hand out at the same time.
    ///
    /// This should match the maximum nesting depth of the code using the pool. Zero is allowed
    /// and yields a pool that rejects every request.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Sets the [drop policy][DropPolicy] for the pool. This governs how to treat buffers that
    /// are still checked out when the pool is dropped.
    pub fn drop_policy(mut self, policy: DropPolicy) -> Self {
        self.drop_policy = policy;
        self
    }

    /// Builds the pool with the specified configuration.
    ///
    /// # Panics
    ///
    /// Panics if no capacity has been set using [`capacity()`](Self::capacity).
    #[must_use]
    pub fn build(self) -> ScratchPool {
        let capacity = self
            .capacity
            .expect("capacity must be set using .capacity() before calling .build()");

        ScratchPool::new_inner(capacity, self.drop_policy)
    }
}
