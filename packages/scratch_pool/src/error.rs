use thiserror::Error;

/// Errors that signal misuse of a [`ScratchPool`][crate::ScratchPool].
///
/// Both variants are programmer errors: the pool was either sized too small for the nesting
/// depth of the code using it, or the code released more buffers than it borrowed. Neither is
/// transient, so retrying the same operation will fail the same way.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// A buffer was requested while every slot in the pool was already checked out.
    ///
    /// This means the nesting depth of the calling code exceeds the capacity the pool was
    /// created with.
    #[error("all {capacity} buffers of the scratch pool are already checked out")]
    CapacityExhausted {
        /// The fixed number of slots in the pool.
        capacity: usize,
    },

    /// A buffer was released while no buffer was checked out.
    ///
    /// This means a release happened without a matching earlier request.
    #[error("no buffer of the scratch pool (capacity {capacity}) is checked out, nothing to free")]
    UnbalancedFree {
        /// The fixed number of slots in the pool.
        capacity: usize,
    },
}

/// A specialized `Result` type for scratch pool operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;
