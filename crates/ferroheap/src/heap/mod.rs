//! The hybrid allocation engine.
//!
//! A [`Heap`] owns one arena and serves every request from it through two
//! cooperating allocators:
//!
//! - requests of 1..=578 bytes go to a segregated slab pool: seven size
//!   classes, each backed by a list of 4 KiB chunks with a 256-bit
//!   occupancy vector
//! - anything larger goes to a boundary-tag heap with an explicit
//!   first-fit free list, block splitting and neighbor coalescing
//!
//! Release and resize take an opaque pointer; the engine resolves the
//! owner by scanning the slab chunk lists first and falling back to the
//! large heap. No out-of-band allocation table exists; the slab headers
//! and boundary tags are the entire truth.
//!
//! # Lifecycle
//!
//! The heap owns its arena, so independent heaps (one per test, say) do
//! not interfere. [`Heap::init`] resets every allocator head without
//! touching the arena; storage already carved out is abandoned in place,
//! which matches the arena's no-reclamation model.
//!
//! # Concurrency
//!
//! None. The engine assumes a single logical mutator and every operation
//! completes before returning; `Heap` is deliberately not `Send`.

use std::ptr::NonNull;

use ferrox_arena::Arena;
use ferrox_log::warn;

use crate::error::{Error, Result};

mod check;
pub(crate) mod classes;
pub(crate) mod freelist;
pub(crate) mod large;
pub(crate) mod slab;
pub(crate) mod tags;

use classes::{CLASSES, NUM_CLASSES, class_index};
use large::LargeHeap;
use slab::{SlabHeader, SlabList};

/// Chunk granularity for both allocators: slab chunks are exactly this
/// big, large chunks a multiple of it.
pub(crate) const CHUNK_SIZE: usize = 4096;

/// A hybrid small/large storage allocator over a monotonic arena.
///
/// Every byte handed out lives inside the owned [`Arena`]; the engine
/// adds structure, never storage. See the module docs for the split
/// between the two internal allocators.
pub struct Heap {
    arena: Arena,
    slabs: [SlabList; NUM_CLASSES],
    large: LargeHeap,
}

impl Heap {
    /// Builds an engine over an existing arena.
    #[must_use]
    pub fn new(arena: Arena) -> Self {
        Heap {
            arena,
            slabs: CLASSES.map(SlabList::new),
            large: LargeHeap::new(),
        }
    }

    /// Reserves a fresh arena of at least `capacity` bytes and builds an
    /// engine over it.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Ok(Self::new(Arena::new(capacity)?))
    }

    /// Resets every allocator head: all seven class lists, the free list
    /// and the chunk chain. The arena is not touched; pair a fresh init
    /// with a fresh arena.
    pub fn init(&mut self) {
        for list in &mut self.slabs {
            list.clear();
        }
        self.large.clear();
    }

    /// Allocates `size` bytes, or `None` when `size` is zero or the arena
    /// is exhausted.
    ///
    /// Pointers from the large allocator and from the 16/32/48/64/128
    /// classes are 16-byte aligned. The 269 and 578 classes pack slots
    /// densely instead and promise no alignment.
    pub fn allocate(&mut self, size: usize) -> Option<NonNull<u8>> {
        if size == 0 {
            return None;
        }
        match self.dispatch(size) {
            Ok(p) => Some(p),
            Err(err) => {
                warn!("allocation of {size} bytes failed: {err}");
                None
            }
        }
    }

    /// Routes a nonzero request to the slab pool or the large heap.
    fn dispatch(&mut self, size: usize) -> Result<NonNull<u8>> {
        match class_index(size) {
            Some(index) => self.slabs[index].allocate(&mut self.arena),
            None => self.large.allocate(&mut self.arena, size),
        }
    }

    /// Returns an allocation to the engine. Null is a no-op.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a pointer previously returned by this heap's
    /// [`allocate`](Heap::allocate), [`calloc`](Heap::calloc) or
    /// [`resize`](Heap::resize) and not released since. Double release
    /// and foreign pointers are not detected.
    pub unsafe fn release(&mut self, ptr: *mut u8) {
        if ptr.is_null() {
            return;
        }
        for list in &self.slabs {
            if let Some(chunk) = list.find(ptr) {
                // SAFETY: the chunk owns ptr; liveness is the caller's
                // contract.
                unsafe { (*chunk).release(ptr) };
                return;
            }
        }
        // Not in any slab chunk: it must be a large block.
        // SAFETY: per the caller contract.
        unsafe { self.large.release(ptr) };
    }

    /// Resizes an allocation to `size` bytes, following the C `realloc`
    /// contract: a null `ptr` allocates, `size == 0` releases and
    /// returns `None`, and on failure the original allocation is left
    /// untouched and `None` is returned.
    ///
    /// Slab-owned pointers are returned unchanged while `size` still
    /// fits the slot; otherwise the contents move to a new allocation
    /// and the old one is released. Large blocks resize in place when
    /// the neighboring tags allow it.
    ///
    /// # Safety
    ///
    /// Same contract as [`release`](Heap::release) for non-null `ptr`.
    pub unsafe fn resize(
        &mut self,
        ptr: *mut u8,
        size: usize,
    ) -> Option<NonNull<u8>> {
        if ptr.is_null() {
            return self.allocate(size);
        }
        if size == 0 {
            // SAFETY: per the caller contract.
            unsafe { self.release(ptr) };
            return None;
        }

        if let Some(chunk) = self.find_slab(ptr) {
            // SAFETY: find_slab returned the chunk owning ptr.
            let slot_size = unsafe { (*chunk).slot_size() };
            if size <= slot_size {
                // SAFETY: slab payloads are interior chunk pointers.
                return Some(unsafe { NonNull::new_unchecked(ptr) });
            }
            let new = self.allocate(size)?;
            // SAFETY: the new allocation holds at least `size` bytes,
            // more than the old slot; the regions are distinct live
            // allocations.
            unsafe {
                std::ptr::copy_nonoverlapping(ptr, new.as_ptr(), slot_size);
                (*chunk).release(ptr);
            }
            return Some(new);
        }

        // SAFETY: per the caller contract, ptr is a live large block.
        match unsafe { self.large.resize(&mut self.arena, ptr, size) } {
            Ok(p) => Some(p),
            Err(err) => {
                warn!("resize to {size} bytes failed: {err}");
                None
            }
        }
    }

    /// Allocates `num * size` bytes and zeroes them. Overflowing products
    /// and exhaustion both return `None`.
    pub fn calloc(&mut self, num: usize, size: usize) -> Option<NonNull<u8>> {
        let total = match num.checked_mul(size) {
            Some(total) => total,
            None => {
                warn!("{}", Error::SizeOverflow { num, size });
                return None;
            }
        };
        let p = self.allocate(total)?;
        // SAFETY: the allocation is at least `total` bytes.
        unsafe { std::ptr::write_bytes(p.as_ptr(), 0, total) };
        Some(p)
    }

    /// Walks both allocators read-only and returns the number of
    /// consistency violations found, reporting each through the log.
    /// `verbose` additionally narrates every chunk and block.
    pub fn check(&self, verbose: bool) -> usize {
        check::run(self, verbose)
    }

    /// Point-in-time counters over both allocators.
    #[must_use]
    pub fn stats(&self) -> HeapStats {
        let mut slab_chunks = 0;
        let mut live_slots = 0;
        for list in &self.slabs {
            for chunk in list.iter() {
                // SAFETY: list chunks are valid headers; read-only.
                let header = unsafe { &*chunk };
                slab_chunks += 1;
                live_slots += header.live_slots();
            }
        }

        let large_chunks = self.large.chunks().count();
        let mut free_blocks = 0;
        let mut free_bytes = 0;
        let mut bp = self.large.free_list().head();
        while !bp.is_null() {
            // SAFETY: listed blocks carry valid tags; read-only.
            unsafe {
                free_blocks += 1;
                free_bytes += tags::Block::from_payload(bp).size();
                bp = freelist::FreeList::next_of(bp);
            }
        }

        HeapStats {
            heap_bytes: self.arena.heapsize(),
            slab_chunks,
            live_slots,
            large_chunks,
            free_blocks,
            free_bytes,
        }
    }

    /// The arena this heap allocates from.
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// The slab chunk owning `ptr`, if any.
    fn find_slab(&self, ptr: *const u8) -> Option<*mut SlabHeader> {
        self.slabs.iter().find_map(|list| list.find(ptr))
    }
}

/// Counters captured by [`Heap::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapStats {
    /// Arena bytes carved into chunks so far.
    pub heap_bytes: usize,
    /// Slab chunks across all classes.
    pub slab_chunks: usize,
    /// Live slots across all slab chunks.
    pub live_slots: usize,
    /// Chunks owned by the large allocator.
    pub large_chunks: usize,
    /// Blocks on the large free list.
    pub free_blocks: usize,
    /// Bytes held by the large free list.
    pub free_bytes: usize,
}
