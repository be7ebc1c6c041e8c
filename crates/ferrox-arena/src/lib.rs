//! Ferroheap's arena collaborator.
//!
//! This crate provides the memory substrate the allocation engine carves
//! chunks out of:
//!
//! - [`Arena`]: a single contiguous, page-aligned reservation with a
//!   monotonically advancing break pointer (a simulated `sbrk`)
//! - [`ArenaFactory`]: mints independent arenas with a configured capacity,
//!   mainly so tests can pair every engine instance with a fresh arena
//!
//! # Design Goals
//!
//! 1. **Determinism**: one reservation up front, no reallocation, stable
//!    addresses for the arena's whole lifetime
//! 2. **Alignment**: the base is page-aligned, so consumers that extend in
//!    page multiples get page-aligned chunk starts for free
//! 3. **Honest failure**: exhaustion is an error value, never a panic

pub mod arena;
pub mod factory;

pub use arena::{Arena, ArenaError, DEFAULT_CAPACITY, PAGE_SIZE, Result};
pub use factory::ArenaFactory;
