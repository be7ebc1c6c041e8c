//! Explicit free list for the large-block heap.
//!
//! Free blocks double as list nodes: the first payload word holds the next
//! free block's payload pointer and the second holds the previous one's.
//! The links exist only while a block is free; allocation hands those same
//! bytes to the caller. The list is null-terminated in both directions and
//! is a secondary index over the boundary tags, never the layout authority.

use super::tags::{Block, DWORD};

/// Head of the doubly-linked free list, LIFO on insertion.
#[derive(Debug)]
pub(crate) struct FreeList {
    head: *mut u8,
}

impl FreeList {
    pub(crate) const fn new() -> Self {
        FreeList {
            head: std::ptr::null_mut(),
        }
    }

    /// Drops every link. Used by engine re-initialization only; the blocks
    /// themselves are not touched.
    pub(crate) fn clear(&mut self) {
        self.head = std::ptr::null_mut();
    }

    pub(crate) fn head(&self) -> *mut u8 {
        self.head
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.head.is_null()
    }

    /// Reads the successor link of a free block.
    ///
    /// # Safety
    ///
    /// `bp` must be the payload pointer of a live free block.
    pub(crate) unsafe fn next_of(bp: *mut u8) -> *mut u8 {
        // SAFETY: free payloads are 16-aligned and at least 16 bytes.
        unsafe { bp.cast::<*mut u8>().read() }
    }

    /// Reads the predecessor link of a free block.
    ///
    /// # Safety
    ///
    /// `bp` must be the payload pointer of a live free block.
    pub(crate) unsafe fn prev_of(bp: *mut u8) -> *mut u8 {
        // SAFETY: see next_of; the prev word sits 8 bytes in.
        unsafe { bp.add(DWORD).cast::<*mut u8>().read() }
    }

    /// # Safety
    ///
    /// `bp` must be the payload pointer of a live free block.
    unsafe fn set_next(bp: *mut u8, next: *mut u8) {
        // SAFETY: guaranteed by caller.
        unsafe { bp.cast::<*mut u8>().write(next) }
    }

    /// # Safety
    ///
    /// `bp` must be the payload pointer of a live free block.
    unsafe fn set_prev(bp: *mut u8, prev: *mut u8) {
        // SAFETY: guaranteed by caller.
        unsafe { bp.add(DWORD).cast::<*mut u8>().write(prev) }
    }

    /// Links a free block in at the head.
    ///
    /// # Safety
    ///
    /// `bp` must be a free block's payload pointer, not already linked.
    pub(crate) unsafe fn push(&mut self, bp: *mut u8) {
        // SAFETY: guaranteed by caller.
        unsafe {
            Self::set_next(bp, self.head);
            Self::set_prev(bp, std::ptr::null_mut());
            if !self.head.is_null() {
                Self::set_prev(self.head, bp);
            }
        }
        self.head = bp;
    }

    /// Unlinks a block from wherever it sits in the list.
    ///
    /// # Safety
    ///
    /// `bp` must currently be linked into this list.
    pub(crate) unsafe fn unlink(&mut self, bp: *mut u8) {
        // SAFETY: guaranteed by caller.
        unsafe {
            let next = Self::next_of(bp);
            let prev = Self::prev_of(bp);

            if prev.is_null() {
                self.head = next;
            } else {
                Self::set_next(prev, next);
            }
            if !next.is_null() {
                Self::set_prev(next, prev);
            }
        }
    }

    /// First-fit search: the first block in list order whose size covers
    /// `need`.
    ///
    /// # Safety
    ///
    /// Every linked block must carry valid boundary tags.
    pub(crate) unsafe fn first_fit(&self, need: usize) -> Option<*mut u8> {
        let mut bp = self.head;
        while !bp.is_null() {
            // SAFETY: list membership implies valid tags per the caller
            // contract.
            unsafe {
                let block = Block::from_payload(bp);
                if !block.is_alloc() && block.size() >= need {
                    return Some(bp);
                }
                bp = Self::next_of(bp);
            }
        }
        None
    }
}
