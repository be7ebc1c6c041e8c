//! Resize semantics through the public interface: in-place growth and
//! shrink for large blocks, slot reuse and migration for slab-owned
//! pointers, and the C-style null/zero edge cases.

mod common;

use common::{assert_pattern, fresh_heap, write_pattern};

// ============================================================================
// Large Blocks
// ============================================================================

#[test]
fn test_grow_absorbs_the_free_neighbor_in_place() {
    let mut heap = fresh_heap();

    let a = heap.allocate(1000).unwrap().as_ptr();
    let b = heap.allocate(1000).unwrap().as_ptr();
    // SAFETY: a's payload holds 1000 bytes.
    unsafe { write_pattern(a, 1000, 0x11) };

    // Free the neighbor, then grow into it; the pointer must not move
    // and no new chunk may be seeded.
    // SAFETY: b is live; a stays live through the resize.
    unsafe {
        heap.release(b);
        let grown = heap.resize(a, 1800).unwrap();
        assert_eq!(grown.as_ptr(), a);
        assert_pattern(a, 1000, 0x11);
    }
    assert_eq!(heap.stats().large_chunks, 1);
    assert_eq!(heap.check(false), 0);
}

#[test]
fn test_grow_copies_when_the_neighbor_is_too_small() {
    let mut heap = fresh_heap();

    let a = heap.allocate(1000).unwrap().as_ptr();
    let b = heap.allocate(1000).unwrap().as_ptr();
    let c = heap.allocate(1000).unwrap().as_ptr();
    // SAFETY: a's payload holds 1000 bytes.
    unsafe { write_pattern(a, 1000, 0x22) };

    // b's block alone cannot host the grown request, so the engine must
    // move the allocation and release the old block.
    // SAFETY: pointers are live; each released at most once.
    unsafe {
        heap.release(b);
        let moved = heap.resize(a, 2500).unwrap().as_ptr();
        assert_ne!(moved, a);
        assert_pattern(moved, 1000, 0x22);
        heap.release(moved);
        heap.release(c);
    }
    assert_eq!(heap.check(false), 0);
}

#[test]
fn test_shrink_returns_the_same_pointer() {
    let mut heap = fresh_heap();

    let a = heap.allocate(3000).unwrap().as_ptr();
    // SAFETY: a's payload holds 3000 bytes.
    unsafe { write_pattern(a, 3000, 0x33) };

    // SAFETY: a stays live through the resize.
    unsafe {
        let same = heap.resize(a, 700).unwrap();
        assert_eq!(same.as_ptr(), a);
        assert_pattern(a, 700, 0x33);
    }
    assert_eq!(heap.check(false), 0);
}

// ============================================================================
// Slab-Owned Pointers
// ============================================================================

#[test]
fn test_resize_within_the_slot_is_identity() {
    let mut heap = fresh_heap();

    let p = heap.allocate(40).unwrap().as_ptr();
    // SAFETY: the 48-byte slot holds the pattern.
    unsafe { write_pattern(p, 40, 0x44) };

    // Growing to the slot bound and shrinking far below it both keep
    // the slot.
    // SAFETY: p stays live throughout.
    unsafe {
        assert_eq!(heap.resize(p, 48).unwrap().as_ptr(), p);
        assert_eq!(heap.resize(p, 8).unwrap().as_ptr(), p);
        assert_pattern(p, 40, 0x44);
    }
}

#[test]
fn test_resize_across_classes_moves_and_frees_the_slot() {
    let mut heap = fresh_heap();

    let p = heap.allocate(16).unwrap().as_ptr();
    // SAFETY: the slot holds 16 bytes.
    unsafe { write_pattern(p, 16, 0x55) };

    // SAFETY: p is live until the resize migrates it.
    let q = unsafe { heap.resize(p, 100).unwrap().as_ptr() };
    assert_ne!(q, p);
    // SAFETY: the new slot carries the old contents.
    unsafe { assert_pattern(q, 16, 0x55) };

    // The old slot was released: the class-16 chunk is empty again and
    // the next request reuses slot 0.
    assert_eq!(heap.allocate(16).unwrap().as_ptr(), p);
}

#[test]
fn test_slab_to_large_migration() {
    let mut heap = fresh_heap();

    let p = heap.allocate(64).unwrap().as_ptr();
    // SAFETY: the slot holds 64 bytes.
    unsafe { write_pattern(p, 64, 0x66) };

    // SAFETY: p is live until the resize migrates it.
    let q = unsafe { heap.resize(p, 2000).unwrap().as_ptr() };
    assert_ne!(q, p);
    // SAFETY: the large block carries the old slot's contents.
    unsafe { assert_pattern(q, 64, 0x66) };

    assert_eq!(heap.stats().large_chunks, 1);
    assert_eq!(heap.stats().live_slots, 0);
    assert_eq!(heap.check(false), 0);
}

// ============================================================================
// Edge Cases
// ============================================================================

#[test]
fn test_null_resize_allocates() {
    let mut heap = fresh_heap();

    // SAFETY: null is the allocate path.
    let p = unsafe { heap.resize(std::ptr::null_mut(), 256) };
    assert!(p.is_some());
}

#[test]
fn test_zero_resize_releases() {
    let mut heap = fresh_heap();

    let p = heap.allocate(2000).unwrap().as_ptr();
    // SAFETY: p is live; the zero resize releases it.
    let r = unsafe { heap.resize(p, 0) };
    assert!(r.is_none());

    // The block went back to the free list and coalesced.
    assert_eq!(heap.stats().free_blocks, 1);
    assert_eq!(heap.check(false), 0);
}
