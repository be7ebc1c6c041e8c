//! Factory for creating arenas.
//!
//! `ArenaFactory` is a cheap way to create [`Arena`] instances with a
//! configured capacity. There is no pooling and no reuse: every call to
//! [`ArenaFactory::create_arena`] reserves a fresh region, and dropping the
//! arena returns it. The engine's lifecycle assumes each initialization
//! pairs with a fresh arena, so test fixtures lean on this.
//!
//! # Example
//!
//! ```
//! use ferrox_arena::ArenaFactory;
//!
//! let factory = ArenaFactory::new(64 * 1024);
//!
//! let mut arena = factory.create_arena().unwrap();
//! let chunk = arena.extend(4096).unwrap();
//! assert_eq!(chunk.as_ptr(), arena.lo());
//! ```

use crate::arena::{Arena, Result};

/// Creates independent arenas with a fixed capacity.
#[derive(Debug, Clone, Copy)]
pub struct ArenaFactory {
    /// Capacity of arenas created by this factory, in bytes.
    capacity: usize,
}

impl ArenaFactory {
    /// Creates a factory whose arenas reserve `capacity` bytes (rounded up
    /// to a page multiple at creation time).
    #[must_use]
    pub const fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Reserves a fresh arena.
    pub fn create_arena(&self) -> Result<Arena> {
        Arena::new(self.capacity)
    }
}
