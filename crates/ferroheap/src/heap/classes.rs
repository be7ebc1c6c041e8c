//! Small-request size classes.
//!
//! Requests of 1..=578 bytes are served by the slab pool; each class is a
//! contiguous byte range `[min, max]` whose slots are all `max` bytes wide.
//! Anything larger falls through to the boundary-tag heap.

use super::slab::SLOT_AREA;

/// Number of small size classes.
pub(crate) const NUM_CLASSES: usize = 7;

/// Largest request the slab pool serves; above this the boundary-tag heap
/// takes over.
pub(crate) const LARGE_THRESHOLD: usize = 578;

/// One small size class: the inclusive request range it covers. The upper
/// bound doubles as the slot width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SizeClass {
    /// Smallest request routed to this class.
    pub min: u32,
    /// Largest request routed to this class; also the slot size.
    pub max: u32,
}

impl SizeClass {
    /// Slot width in bytes.
    pub(crate) const fn slot_size(self) -> usize {
        self.max as usize
    }

    /// Number of slots a slab chunk of this class holds.
    pub(crate) const fn capacity(self) -> usize {
        SLOT_AREA / self.max as usize
    }
}

/// The class table, ascending. Each lower bound is one past the previous
/// upper bound. Slot sizes 16/32/48/64/128 keep slots 16-byte aligned;
/// 269 and 578 trade alignment for packing density.
pub(crate) const CLASSES: [SizeClass; NUM_CLASSES] = [
    SizeClass { min: 1, max: 16 },
    SizeClass { min: 17, max: 32 },
    SizeClass { min: 33, max: 48 },
    SizeClass { min: 49, max: 64 },
    SizeClass { min: 65, max: 128 },
    SizeClass { min: 129, max: 269 },
    SizeClass { min: 270, max: 578 },
];

/// Routes a nonzero request size to its class, or `None` for the
/// boundary-tag heap.
pub(crate) fn class_index(size: usize) -> Option<usize> {
    debug_assert!(size > 0);
    CLASSES.iter().position(|class| size <= class.max as usize)
}
