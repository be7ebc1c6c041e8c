//! Read-only consistency checker.
//!
//! Walks both allocator structures, reports every violation through the
//! log macros and returns the violation count. The checker never mutates
//! heap state, so it is safe to run at any point between operations; the
//! engine's own tests lean on "check returns zero" as the catch-all
//! postcondition.
//!
//! Checked per slab chunk: class bounds match the owning list, occupancy
//! bits past the chunk capacity are clear, the chunk lies in the arena.
//! Checked per large chunk: prologue and epilogue sentinels, block
//! alignment, free-block minimum size, header/footer agreement, the
//! predecessor-allocation bit of every block, and the absence of adjacent
//! free blocks. Checked globally: the free list is cycle-free, reciprocal
//! in its links, and contains exactly the physically free blocks.

use fxhash::FxHashSet;

use ferrox_log::{error, info};

use super::freelist::FreeList;
use super::large::FIRST_BLOCK_OFFSET;
use super::tags::{ALIGN, Block, DWORD, MIN_BLOCK};
use super::{CHUNK_SIZE, Heap};

/// Walks the whole heap and returns the number of violations found.
pub(crate) fn run(heap: &Heap, verbose: bool) -> usize {
    let mut errors = 0;
    check_slabs(heap, verbose, &mut errors);
    check_large(heap, verbose, &mut errors);

    if verbose {
        info!("consistency check finished: {errors} error(s)");
    }
    errors
}

fn check_slabs(heap: &Heap, verbose: bool, errors: &mut usize) {
    for list in &heap.slabs {
        let class = list.class();
        for chunk in list.iter() {
            // SAFETY: list chunks are valid headers for the arena's
            // lifetime; the checker only reads.
            let header = unsafe { &*chunk };
            let base = header.base();

            if !heap.arena.contains(base) {
                *errors += 1;
                error!("slab chunk {base:p} lies outside the arena");
                continue;
            }
            if header.slot_size() != class.slot_size() {
                *errors += 1;
                error!(
                    "slab chunk {base:p}: slot size {} in a list of {}-byte slots",
                    header.slot_size(),
                    class.slot_size()
                );
            }
            if header.min_slot_size() != class.min as usize {
                *errors += 1;
                error!(
                    "slab chunk {base:p}: class lower bound {} recorded, {} expected",
                    header.min_slot_size(),
                    class.min
                );
            }

            let capacity = header.capacity();
            for index in capacity..256 {
                if header.is_marked(index) {
                    *errors += 1;
                    error!(
                        "slab chunk {base:p}: occupancy bit {index} set past capacity {capacity}"
                    );
                }
            }

            if verbose {
                info!(
                    "slab chunk {base:p}: class {}..={}, {}/{} slots live",
                    header.min_slot_size(),
                    header.slot_size(),
                    header.live_slots(),
                    capacity
                );
            }
        }
    }
}

fn check_large(heap: &Heap, verbose: bool, errors: &mut usize) {
    let mut physical_free: FxHashSet<usize> = FxHashSet::default();

    for (chunk, chunk_size) in heap.large.chunks() {
        if verbose {
            info!("large chunk {chunk:p}: {chunk_size} bytes");
        }
        if !heap.arena.contains(chunk) {
            *errors += 1;
            error!("large chunk {chunk:p} lies outside the arena");
            continue;
        }
        if chunk_size % CHUNK_SIZE != 0 || chunk_size < CHUNK_SIZE {
            *errors += 1;
            error!("large chunk {chunk:p}: size {chunk_size} is not a page multiple");
            continue;
        }

        walk_chunk(chunk, chunk_size, verbose, errors, &mut physical_free);
    }

    check_free_list(heap, errors, &physical_free);
}

/// Walks one chunk's block sequence, prologue to epilogue.
fn walk_chunk(
    chunk: *mut u8,
    chunk_size: usize,
    verbose: bool,
    errors: &mut usize,
    physical_free: &mut FxHashSet<usize>,
) {
    // SAFETY: the chunk was seeded by the large allocator and is only
    // read here; the walk is bounds-checked against the chunk end before
    // every step.
    unsafe {
        let prologue = Block::from_payload(chunk.add(FIRST_BLOCK_OFFSET - DWORD));
        if prologue.size() != DWORD || !prologue.is_alloc() {
            *errors += 1;
            error!("large chunk {chunk:p}: corrupt prologue");
            return;
        }

        let end = chunk.add(chunk_size);
        let mut bp = chunk.add(FIRST_BLOCK_OFFSET);
        let mut prev_was_alloc = true;

        loop {
            let block = Block::from_payload(bp);
            let size = block.size();
            let alloc = block.is_alloc();

            if block.is_epilogue() {
                if bp != end {
                    *errors += 1;
                    error!(
                        "large chunk {chunk:p}: epilogue at {bp:p} instead of {end:p}"
                    );
                }
                if !alloc {
                    *errors += 1;
                    error!("large chunk {chunk:p}: epilogue not marked allocated");
                }
                if block.prev_alloc() != prev_was_alloc {
                    *errors += 1;
                    error!("large chunk {chunk:p}: epilogue predecessor bit is stale");
                }
                if verbose {
                    info!("  epilogue at {bp:p}");
                }
                break;
            }

            if verbose {
                info!(
                    "  block {bp:p}: {size} bytes, {}",
                    if alloc { "allocated" } else { "free" }
                );
            }

            if bp as usize % ALIGN != 0 {
                *errors += 1;
                error!("block {bp:p}: payload is not {ALIGN}-byte aligned");
            }
            if size % ALIGN != 0 || size < MIN_BLOCK {
                *errors += 1;
                error!("block {bp:p}: bad size {size}");
                // The size no longer navigates; abandon this chunk.
                break;
            }
            if bp.add(size) > end {
                *errors += 1;
                error!("block {bp:p}: size {size} runs past the chunk end");
                break;
            }
            if block.prev_alloc() != prev_was_alloc {
                *errors += 1;
                error!("block {bp:p}: predecessor bit disagrees with the previous block");
            }

            if !alloc {
                let expected =
                    size as u32 | (block.prev_alloc() as u32) << 1;
                if block.footer() != expected {
                    *errors += 1;
                    error!("free block {bp:p}: header and footer disagree");
                }
                if !prev_was_alloc {
                    *errors += 1;
                    error!("free block {bp:p}: adjacent to a free predecessor");
                }
                physical_free.insert(bp as usize);
            }

            prev_was_alloc = alloc;
            bp = bp.add(size);
        }
    }
}

/// Validates free-list shape and its agreement with the physical walk.
fn check_free_list(
    heap: &Heap,
    errors: &mut usize,
    physical_free: &FxHashSet<usize>,
) {
    let mut listed: FxHashSet<usize> = FxHashSet::default();
    let mut bp = heap.large.free_list().head();
    let mut prev = std::ptr::null_mut::<u8>();

    while !bp.is_null() {
        if !listed.insert(bp as usize) {
            *errors += 1;
            error!("free list: cycle detected at {bp:p}");
            break;
        }
        // SAFETY: listed blocks were produced by the allocator; the
        // link words are only read.
        unsafe {
            let block = Block::from_payload(bp);
            if block.is_alloc() {
                *errors += 1;
                error!("free list: {bp:p} is marked allocated");
            }
            if FreeList::prev_of(bp) != prev {
                *errors += 1;
                error!("free list: previous link of {bp:p} is not reciprocal");
            }
            prev = bp;
            bp = FreeList::next_of(bp);
        }
    }

    for &addr in physical_free {
        if !listed.contains(&addr) {
            *errors += 1;
            error!("free block {addr:#x} is missing from the free list");
        }
    }
    for &addr in &listed {
        if !physical_free.contains(&addr) {
            *errors += 1;
            error!("free list entry {addr:#x} is not a free block of any chunk");
        }
    }
}
