//! Boundary-tag allocator for large requests.
//!
//! Requests past the last size class land here. Storage comes from the
//! arena in page-multiple chunks; inside a chunk, blocks are laid out
//! back to back and navigated purely through their size tags. Each chunk
//! is framed by an always-allocated 8-byte prologue and a zero-size
//! allocated epilogue word, so coalescing can never run off either end.
//!
//! Chunk layout, offsets from the chunk base (which is page-aligned, so
//! the first payload at +32 is 16-byte aligned):
//!
//! ```text
//! +0   previous chunk pointer        (diagnostics chain)
//! +8   chunk size in bytes           (u32)
//! +12  padding
//! +20  prologue header               (size 8, allocated)
//! +24  prologue footer
//! +28  first block header
//! +32  first block payload
//! ...
//! end-4  epilogue header             (size 0, allocated)
//! ```
//!
//! Placement is first fit over the explicit free list, splitting when the
//! remainder can stand alone as a block; release writes free tags, fixes
//! the successor's predecessor bit and merges with whichever neighbors
//! are free.

use std::ptr::NonNull;

use ferrox_arena::Arena;
use ferrox_log::debug;

use super::freelist::FreeList;
use super::tags::{Block, DWORD, MIN_BLOCK, block_size};
use crate::error::Result;

/// Offset of the chunk-size word.
const SIZE_OFFSET: usize = 8;

/// Offset of the prologue block's payload pointer.
const PROLOGUE_OFFSET: usize = 24;

/// Offset of the first real block's payload.
pub(crate) const FIRST_BLOCK_OFFSET: usize = 32;

/// The large-block heap: an explicit free list over boundary-tagged
/// chunks, plus a chain of chunk bases for diagnostics.
#[derive(Debug)]
pub(crate) struct LargeHeap {
    free: FreeList,
    /// Most recently seeded chunk; chunks link backwards through their
    /// first word.
    chunk_head: *mut u8,
}

impl LargeHeap {
    pub(crate) const fn new() -> Self {
        LargeHeap {
            free: FreeList::new(),
            chunk_head: std::ptr::null_mut(),
        }
    }

    /// Forgets all chunks and free blocks. Storage stays in the arena.
    pub(crate) fn clear(&mut self) {
        self.free.clear();
        self.chunk_head = std::ptr::null_mut();
    }

    pub(crate) fn free_list(&self) -> &FreeList {
        &self.free
    }

    /// Iterates chunk bases and sizes, newest first.
    pub(crate) fn chunks(&self) -> LargeChunkIter {
        LargeChunkIter {
            chunk: self.chunk_head,
        }
    }

    /// Serves a request of `n` payload bytes.
    pub(crate) fn allocate(
        &mut self,
        arena: &mut Arena,
        n: usize,
    ) -> Result<NonNull<u8>> {
        let need = block_size(n);
        // SAFETY: every listed block carries valid tags.
        let bp = match unsafe { self.free.first_fit(need) } {
            Some(bp) => bp,
            None => self.seed(arena, need)?,
        };
        // SAFETY: bp is a free listed block of at least `need` bytes.
        unsafe { self.place(bp, need) };
        // SAFETY: payload pointers are interior to an arena chunk.
        Ok(unsafe { NonNull::new_unchecked(bp) })
    }

    /// Obtains a fresh chunk big enough for a `need`-byte block and
    /// returns its single free block.
    fn seed(&mut self, arena: &mut Arena, need: usize) -> Result<*mut u8> {
        // Next page multiple strictly above the block size; an exact
        // multiple costs one extra page.
        let chunk_size = ((need >> 12) + 1) << 12;
        let chunk = arena.extend(chunk_size)?.as_ptr();

        // SAFETY: the arena granted chunk_size page-aligned bytes; all
        // offsets below stay inside them (the epilogue payload pointer is
        // one past the end, which is valid to form, and its header word
        // is the chunk's last).
        let bp = unsafe {
            chunk.cast::<*mut u8>().write(self.chunk_head);
            chunk
                .add(SIZE_OFFSET)
                .cast::<u32>()
                .write(chunk_size as u32);

            let prologue = Block::from_payload(chunk.add(PROLOGUE_OFFSET));
            prologue.write_header(DWORD, true, true);
            prologue.write_footer(DWORD, true, true);

            // One free block fills everything between the sentinels.
            let bp = chunk.add(FIRST_BLOCK_OFFSET);
            let size = chunk_size - FIRST_BLOCK_OFFSET;
            let block = Block::from_payload(bp);
            block.write_header(size, true, false);
            block.write_footer(size, true, false);

            let epilogue = Block::from_payload(chunk.add(chunk_size));
            epilogue.write_header(0, false, true);

            self.free.push(bp);
            bp
        };

        self.chunk_head = chunk;
        debug!("seeded a {chunk_size}-byte chunk for a {need}-byte block");
        Ok(bp)
    }

    /// Converts the free block at `bp` into an allocated block of `need`
    /// bytes, splitting off the tail when it can stand alone.
    ///
    /// # Safety
    ///
    /// `bp` must be a listed free block with `size >= need`.
    unsafe fn place(&mut self, bp: *mut u8, need: usize) {
        // SAFETY: guaranteed by caller.
        unsafe {
            let block = Block::from_payload(bp);
            let total = block.size();
            let prev_alloc = block.prev_alloc();
            self.free.unlink(bp);

            if total - need >= MIN_BLOCK {
                block.write_header(need, prev_alloc, true);
                let rest = Block::from_payload(bp.add(need));
                rest.write_header(total - need, true, false);
                rest.write_footer(total - need, true, false);
                self.free.push(rest.payload());
                // The successor was already preceded by a free block and
                // still is; its predecessor bit needs no update.
            } else {
                block.write_header(total, prev_alloc, true);
                block.next().set_prev_alloc(true);
            }
        }
    }

    /// Frees an allocated block and merges it with free neighbors.
    ///
    /// # Safety
    ///
    /// `bp` must be a live allocated block of this heap.
    pub(crate) unsafe fn release(&mut self, bp: *mut u8) {
        // SAFETY: guaranteed by caller.
        unsafe {
            let block = Block::from_payload(bp);
            let size = block.size();
            let prev_alloc = block.prev_alloc();

            block.write_header(size, prev_alloc, false);
            block.write_footer(size, prev_alloc, false);
            block.next().set_prev_alloc(false);

            self.free.push(bp);
            self.coalesce(bp);
        }
    }

    /// Merges the free block at `bp` with free physical neighbors and
    /// returns the payload of the merged block.
    ///
    /// # Safety
    ///
    /// `bp` must be a listed free block whose successor's predecessor bit
    /// is already clear.
    unsafe fn coalesce(&mut self, bp: *mut u8) -> *mut u8 {
        // SAFETY: guaranteed by caller; sentinels bound both directions,
        // and a clear prev_alloc bit guarantees the predecessor footer is
        // present for Block::prev.
        unsafe {
            let block = Block::from_payload(bp);
            let prev_free = !block.prev_alloc();
            let next = block.next();
            let next_free = !next.is_alloc();

            match (prev_free, next_free) {
                (false, false) => bp,
                (false, true) => {
                    self.free.unlink(next.payload());
                    let size = block.size() + next.size();
                    block.write_header(size, true, false);
                    block.write_footer(size, true, false);
                    bp
                }
                (true, false) => {
                    self.free.unlink(bp);
                    let prev = block.prev();
                    let size = prev.size() + block.size();
                    let keep = prev.prev_alloc();
                    prev.write_header(size, keep, false);
                    prev.write_footer(size, keep, false);
                    prev.payload()
                }
                (true, true) => {
                    self.free.unlink(bp);
                    self.free.unlink(next.payload());
                    let prev = block.prev();
                    let size = prev.size() + block.size() + next.size();
                    let keep = prev.prev_alloc();
                    prev.write_header(size, keep, false);
                    prev.write_footer(size, keep, false);
                    prev.payload()
                }
            }
        }
    }

    /// Resizes an allocated block to `n` payload bytes, in place when the
    /// tags allow it.
    ///
    /// # Safety
    ///
    /// `bp` must be a live allocated block of this heap and `n` nonzero.
    pub(crate) unsafe fn resize(
        &mut self,
        arena: &mut Arena,
        bp: *mut u8,
        n: usize,
    ) -> Result<NonNull<u8>> {
        // SAFETY: guaranteed by caller.
        unsafe {
            let block = Block::from_payload(bp);
            let old = block.size();
            let need = block_size(n);

            if need == old {
                return Ok(NonNull::new_unchecked(bp));
            }

            if need < old {
                if old - need >= MIN_BLOCK {
                    block.write_header(need, block.prev_alloc(), true);
                    // Carve the tail as a transient allocated block and
                    // push it through the normal release path, which
                    // fixes the successor and coalesces.
                    let rest = Block::from_payload(bp.add(need));
                    rest.write_header(old - need, true, true);
                    self.release(rest.payload());
                }
                return Ok(NonNull::new_unchecked(bp));
            }

            let next = block.next();
            if !next.is_alloc() && old + next.size() >= need {
                let total = old + next.size();
                self.free.unlink(next.payload());
                if total - need >= MIN_BLOCK {
                    block.write_header(need, block.prev_alloc(), true);
                    let rest = Block::from_payload(bp.add(need));
                    rest.write_header(total - need, true, false);
                    rest.write_footer(total - need, true, false);
                    self.free.push(rest.payload());
                } else {
                    block.write_header(total, block.prev_alloc(), true);
                    block.next().set_prev_alloc(true);
                }
                return Ok(NonNull::new_unchecked(bp));
            }

            // Move: take the new block first so a refused extension
            // leaves the original untouched, then copy the old payload.
            let new = self.allocate(arena, n)?;
            std::ptr::copy_nonoverlapping(bp, new.as_ptr(), old - DWORD);
            self.release(bp);
            Ok(new)
        }
    }
}

/// Iterator over (chunk base, chunk size), newest chunk first.
pub(crate) struct LargeChunkIter {
    chunk: *mut u8,
}

impl Iterator for LargeChunkIter {
    type Item = (*mut u8, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.chunk.is_null() {
            return None;
        }
        let current = self.chunk;
        // SAFETY: chunk bases in the chain were written by seed().
        unsafe {
            let size = current.add(SIZE_OFFSET).cast::<u32>().read() as usize;
            self.chunk = current.cast::<*mut u8>().read();
            Some((current, size))
        }
    }
}
