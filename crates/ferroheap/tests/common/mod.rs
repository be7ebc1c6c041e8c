// Common test utilities for integration tests
//
// This module provides shared fixtures and byte-pattern helpers used
// across the allocator test suites.

#![allow(dead_code)]

use ferroheap::Heap;

/// Arena capacity for ordinary fixtures; large enough that no scenario
/// here exhausts it by accident.
pub const TEST_CAPACITY: usize = 4 * 1024 * 1024;

/// Builds an engine over a fresh arena.
pub fn fresh_heap() -> Heap {
    Heap::with_capacity(TEST_CAPACITY).expect("failed to reserve test arena")
}

/// Builds an engine over a deliberately tiny arena, for exhaustion tests.
pub fn tiny_heap(capacity: usize) -> Heap {
    Heap::with_capacity(capacity).expect("failed to reserve test arena")
}

/// Fills `len` bytes with a position-dependent pattern derived from
/// `seed`, so overlapping allocations corrupt each other detectably.
///
/// # Safety
///
/// `ptr` must be valid for `len` writes.
pub unsafe fn write_pattern(ptr: *mut u8, len: usize, seed: u8) {
    for i in 0..len {
        // SAFETY: in-bounds per the caller contract.
        unsafe { ptr.add(i).write(seed.wrapping_add(i as u8)) };
    }
}

/// Asserts the pattern written by [`write_pattern`] is intact.
///
/// # Safety
///
/// `ptr` must be valid for `len` reads of initialized bytes.
pub unsafe fn assert_pattern(ptr: *const u8, len: usize, seed: u8) {
    for i in 0..len {
        // SAFETY: in-bounds per the caller contract.
        let got = unsafe { ptr.add(i).read() };
        assert_eq!(
            got,
            seed.wrapping_add(i as u8),
            "pattern mismatch at byte {i}"
        );
    }
}

/// Minimal xorshift generator; the stress suite needs repeatability, not
/// statistical quality.
pub struct XorShift {
    state: u64,
}

impl XorShift {
    pub fn new(seed: u64) -> Self {
        XorShift {
            state: seed.max(1),
        }
    }

    pub fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Uniform-ish value in `[lo, hi]`.
    pub fn range(&mut self, lo: usize, hi: usize) -> usize {
        lo + (self.next() as usize) % (hi - lo + 1)
    }
}
