/// Determines what happens when a [`ScratchPool`][crate::ScratchPool] is dropped while some of
/// its buffers are still checked out.
///
/// By default, the pool may be dropped at any time.
///
/// # Examples
///
/// ```
/// use scratch_pool::{DropPolicy, ScratchPool};
///
/// // The drop policy is set at pool creation time.
/// let pool = ScratchPool::builder()
///     .capacity(2)
///     .drop_policy(DropPolicy::MustNotDropOutstanding)
///     .build();
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum DropPolicy {
    /// The pool may be dropped even if buffers are still checked out. This is the default.
    #[default]
    MayDropOutstanding,

    /// The pool will panic if any buffer is still checked out when it is dropped.
    ///
    /// Releasing only checks that *something* is checked out, so a forgotten release is not
    /// detected until teardown. This policy turns such a leak into a panic at that point.
    MustNotDropOutstanding,
}
