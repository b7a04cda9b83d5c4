//! A fixed-capacity pool of reusable scratch byte buffers for bounded-depth nested calls.
//!
//! When a chain of nested calls (A calls B calls C) each needs a temporary buffer whose size is
//! only known at call time, allocating a fresh buffer per call makes the allocation count grow
//! with the call count. A [`ScratchPool`] created with one slot per nesting level serves every
//! such request from its slots instead, so after warm-up the chain allocates nothing.
//!
//! # Usage pattern
//!
//! The pool is meant to be a field of the object whose methods need scratch space. Each method
//! borrows one buffer and releases it before returning, in exactly the reverse order of
//! borrowing. Pairing the release with a [`scopeguard`](https://docs.rs/scopeguard) keeps the
//! nesting intact even if the method panics.
//!
//! ```rust
//! use scratch_pool::ScratchPool;
//!
//! // `bar()` calls `qux()` but not the other way around.
//! const MAX_DEPTH: usize = 2;
//!
//! struct Foo {
//!     buffers: ScratchPool,
//!     result: Vec<u8>,
//! }
//!
//! impl Foo {
//!     fn new() -> Self {
//!         Self {
//!             buffers: ScratchPool::new(MAX_DEPTH),
//!             result: Vec::new(),
//!         }
//!     }
//!
//!     fn bar(&mut self, n: usize) {
//!         let buf = self.buffers.calloc(n);
//!         let sum = buf.iter().fold(0_u8, |acc, &b| acc.wrapping_add(b));
//!         self.result.push(sum);
//!
//!         self.qux(n);
//!         self.buffers.free();
//!     }
//!
//!     fn qux(&mut self, n: usize) {
//!         let buf = self.buffers.calloc(n);
//!         let sum = buf.iter().fold(0_u8, |acc, &b| acc.wrapping_add(b));
//!         self.result.push(sum);
//!
//!         self.buffers.free();
//!     }
//! }
//!
//! let mut foo = Foo::new();
//! for _ in 0..1000 {
//!     foo.bar(4096);
//! }
//!
//! // Two buffers were ever allocated, not two thousand.
//! assert_eq!(foo.buffers.stats(), 2 * 4096);
//! ```
//!
//! # Capacity is a hard limit
//!
//! Requesting more buffers than the pool capacity is an error rather than a reason to grow:
//! the point of the pool is to keep static memory use bounded, and runaway recursion through
//! code that uses the pool must not quietly defeat that. Size the pool to the real maximum
//! nesting depth and avoid using it from recursion that is not bounded to a small depth.
//!
//! Keeping buffers cached also means they are not returned to the allocator while the pool
//! lives, so the pool is a poor fit for very large buffers. Profile first.
//!
//! # Compile-time nesting
//!
//! [`ScratchPool::scope()`] offers a second interface where the borrow checker enforces the
//! nesting and releases happen on drop. See [`Scope`].
//!
//! # Thread safety
//!
//! The pool is owned by one call stack at a time. It can be moved between threads but all
//! mutation requires exclusive access, so sharing it needs external synchronization.

mod builder;
mod drop_policy;
mod error;
mod pool;
mod scope;
mod slot;

pub use builder::*;
pub use drop_policy::*;
pub use error::*;
pub use pool::*;
pub use scope::*;
pub(crate) use slot::*;
