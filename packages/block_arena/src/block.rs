use std::alloc::{Layout, alloc, dealloc};
use std::num::NonZero;
use std::ptr::NonNull;

/// Alignment of every block's base address.
///
/// Matches the strictest fundamental alignment, so the first allocation placed
/// in a block is suitably aligned for any primitive type. Allocations after
/// the first are packed end to end and inherit no alignment guarantee.
pub(crate) const BLOCK_ALIGN: usize = 16;

/// One contiguous region of raw memory, exclusively owned by the arena that
/// created it.
///
/// The region is requested from the system allocator on construction and
/// released back to it on drop. The arena never resizes a block; when a block
/// is spent, a new one is created instead.
#[derive(Debug)]
pub(crate) struct Block {
    /// Base address of the region. Valid for `layout.size()` bytes.
    start: NonNull<u8>,

    /// The exact layout used to obtain the region, required to release it.
    layout: Layout,
}

impl Block {
    /// Requests a new region of `capacity` bytes from the system allocator.
    ///
    /// # Panics
    ///
    /// Panics if the system cannot supply the memory. No other state is
    /// affected by the failed request.
    pub(crate) fn new(capacity: NonZero<usize>) -> Self {
        let layout = Layout::from_size_align(capacity.get(), BLOCK_ALIGN)
            .expect("block capacity is always far below the Layout size limit");

        // SAFETY: The layout has a non-zero size because capacity is NonZero.
        let ptr = unsafe { alloc(layout) };

        let start = NonNull::new(ptr).expect(
            "we do not intend to handle allocation failure as a real possibility - OOM results in panic",
        );

        Self { start, layout }
    }

    /// Base address of the region.
    #[must_use]
    pub(crate) fn start(&self) -> NonNull<u8> {
        self.start
    }

    /// Number of usable bytes in the region.
    #[cfg(test)]
    #[must_use]
    pub(crate) fn capacity(&self) -> usize {
        self.layout.size()
    }
}

impl Drop for Block {
    fn drop(&mut self) {
        // SAFETY: `start` was returned by `alloc` with exactly this layout and
        // ownership is exclusive, so it is released here exactly once.
        unsafe {
            dealloc(self.start.as_ptr(), self.layout);
        }
    }
}

#[cfg(test)]
mod tests {
    use new_zealand::nz;

    use super::*;

    #[test]
    fn block_start_is_aligned() {
        let block = Block::new(nz!(64));
        assert_eq!(block.start().addr().get() % BLOCK_ALIGN, 0);
    }

    #[test]
    fn block_reports_requested_capacity() {
        let block = Block::new(nz!(4096));
        assert_eq!(block.capacity(), 4096);
    }

    #[test]
    fn block_memory_is_writable_end_to_end() {
        let block = Block::new(nz!(256));

        // SAFETY: The block owns 256 writable bytes starting at start().
        unsafe {
            block.start().as_ptr().write_bytes(0x5A, 256);
        }

        // SAFETY: All 256 bytes were initialized above.
        let contents = unsafe { std::slice::from_raw_parts(block.start().as_ptr(), 256) };
        assert!(contents.iter().all(|byte| *byte == 0x5A));
    }
}
