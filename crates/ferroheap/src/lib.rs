//! Ferroheap: a hybrid storage allocator over a simulated arena.
//!
//! The engine serves a classical free-store interface (allocate,
//! release, resize, zero-initialized allocation, consistency check) from
//! one contiguous, monotonically growing arena. Two allocators cooperate
//! behind a size dispatcher:
//!
//! - **Slab pool** for requests up to 578 bytes: seven segregated size
//!   classes, each a list of 4 KiB chunks packing fixed-width slots
//!   tracked by a 256-bit occupancy vector. Allocation inside a chunk is
//!   a bit scan; release is a bit clear.
//! - **Boundary-tag heap** for everything larger: header/footer size
//!   tags, an explicit doubly-linked free list searched first-fit,
//!   splitting on placement and neighbor coalescing on release.
//!
//! Ownership of a pointer is recovered from the structures themselves,
//! so `release` and `resize` need nothing but the pointer.
//!
//! # Example
//!
//! ```
//! use ferroheap::Heap;
//!
//! let mut heap = Heap::with_capacity(1024 * 1024).unwrap();
//!
//! let small = heap.allocate(24).unwrap();
//! let big = heap.allocate(4000).unwrap();
//!
//! // SAFETY: both pointers came from this heap and are live.
//! unsafe {
//!     heap.release(small.as_ptr());
//!     heap.release(big.as_ptr());
//! }
//!
//! assert_eq!(heap.check(false), 0);
//! ```
//!
//! # What the engine does not do
//!
//! No thread safety (a heap is a single-mutator value), no reclamation
//! back to the operating system, no detection of double release or
//! foreign pointers, and no alignment guarantees past 16 bytes.

pub mod error;
pub mod heap;

pub use error::{Error, Result};
pub use heap::{Heap, HeapStats};

// Re-export the arena collaborator so consumers can construct and inspect
// arenas without naming the crate.
pub use ferrox_arena::{Arena, ArenaError, ArenaFactory};
