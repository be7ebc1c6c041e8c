//! Error types for the Ferroheap engine.
//!
//! The engine has exactly one recoverable failure mode: the arena refused
//! an extension. Everything else a caller can do wrong (foreign pointers,
//! double release, use after release) is a precondition violation the
//! engine does not detect; those are covered by the `# Safety` contracts
//! on the public API rather than by error values.

use std::fmt;

use ferrox_arena::ArenaError;

/// Errors that can occur inside the allocation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The arena could not grow to satisfy an allocation.
    OutOfMemory {
        /// The extension the arena refused, in bytes.
        requested: usize,
        /// The bytes the arena still had available.
        available: usize,
    },

    /// A `calloc` element count and size multiply past `usize::MAX`.
    SizeOverflow {
        /// The element count.
        num: usize,
        /// The element size.
        size: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::OutOfMemory {
                requested,
                available,
            } => {
                write!(
                    f,
                    "out of memory: requested {requested} bytes from the arena, {available} available"
                )
            }
            Error::SizeOverflow { num, size } => {
                write!(f, "allocation size overflow: {num} * {size} bytes")
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<ArenaError> for Error {
    fn from(err: ArenaError) -> Self {
        match err {
            ArenaError::OutOfMemory {
                requested,
                available,
            } => Error::OutOfMemory {
                requested,
                available,
            },
            // A reservation failure can only happen while constructing the
            // arena, before the engine exists; map it to exhaustion.
            ArenaError::ReservationFailed { capacity } => Error::OutOfMemory {
                requested: capacity,
                available: 0,
            },
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
