use std::cell::{Cell, RefCell};
use std::cmp;
use std::num::NonZero;
use std::ptr::{self, NonNull};

use new_zealand::nz;

use crate::{Block, BlockArenaBuilder, RawAllocator};

/// Default capacity of a freshly created block, in bytes.
///
/// A request larger than this grows the arena by a multiple of it instead.
/// The value can be overridden via [`BlockArena::builder()`].
pub(crate) const DEFAULT_BLOCK_SIZE: NonZero<usize> = nz!(4096);

/// A bump allocator over a growable list of memory blocks.
///
/// `BlockArena` serves each request by advancing a cursor within its current
/// block, creating a new, larger block when the current one cannot satisfy the
/// request. Individual allocations are never freed except for a single-step
/// rollback of the most recent one; all memory is released at once via
/// [`deallocate_all()`][RawAllocator::deallocate_all] or by dropping the arena.
///
/// This makes allocation O(1) with no per-allocation bookkeeping, which suits
/// the intended access pattern: a handful of large, append-only regions that
/// live for the duration of one operation and are discarded as a unit. It is
/// not suited to workloads with many interleaved frees in arbitrary order.
///
/// # Key characteristics
///
/// - **Packed allocations**: within a block, consecutive allocations are laid
///   out end to end, spaced exactly by each request's size. Only the first
///   allocation in a block carries the 16-byte block alignment; callers that
///   need stricter placement must size their requests accordingly.
/// - **Growth policy**: an overflowing request of `size` bytes creates a block
///   of `max(block_size, (size / block_size + 1) * block_size)` bytes. The
///   rounding adds one full increment even when `size` is an exact multiple of
///   the block size, so requesting exactly one block's worth reserves two.
/// - **Single-step rollback**: passing the most recently returned pointer to
///   [`deallocate()`][RawAllocator::deallocate] restores its space; any other
///   pointer is a defined no-op.
/// - **Earlier blocks are spent**: the cursor only ever points into the most
///   recently created block. Free space left at the tail of earlier blocks is
///   never revisited.
///
/// # Example
///
/// ```
/// use std::num::NonZero;
///
/// use block_arena::{BlockArena, RawAllocator};
///
/// let arena = BlockArena::new();
///
/// let first = arena.allocate(NonZero::new(100).unwrap());
/// let second = arena.allocate(NonZero::new(50).unwrap());
///
/// // Packed layout: the second allocation starts exactly 100 bytes after
/// // the first.
/// assert_eq!(second.addr().get() - first.addr().get(), 100);
///
/// // Release everything at once.
/// arena.deallocate_all();
/// assert_eq!(arena.block_count(), 0);
/// ```
///
/// # Thread safety
///
/// The arena is thread-mobile ([`Send`]) and can be moved between threads, but
/// it is not thread-safe ([`Sync`]): all state lives in [`Cell`]/[`RefCell`]
/// and concurrent use requires external synchronization.
#[derive(Debug)]
pub struct BlockArena {
    /// Capacity unit for new blocks. Fixed at construction.
    block_size: NonZero<usize>,

    /// Every block this arena has created, in creation order. The list only
    /// grows, except for the full clear performed by `deallocate_all()`.
    blocks: RefCell<Vec<Block>>,

    /// Next allocation address within the current (= most recently created)
    /// block. Null while the block list is empty.
    cursor: Cell<*mut u8>,

    /// Free bytes remaining between the cursor and the end of the current
    /// block. Zero while the block list is empty.
    remaining: Cell<usize>,

    /// The pointer most recently returned by `allocate()`, supporting the
    /// single-step rollback in `deallocate()`. Null until the first
    /// allocation and after a bulk release.
    last_allocation: Cell<*mut u8>,
}

// SAFETY: The arena exclusively owns every block its interior pointers refer
// to, so moving the whole arena to another thread moves the pointed-to memory
// ownership along with it. The Cell-based state prevents Sync, which is the
// boundary that actually needs guarding.
unsafe impl Send for BlockArena {}

impl BlockArena {
    /// Creates an arena with the default block size of 4096 bytes.
    #[must_use]
    pub fn new() -> Self {
        Self::new_inner(DEFAULT_BLOCK_SIZE)
    }

    /// Creates a builder for configuring and constructing a [`BlockArena`].
    ///
    /// # Example
    ///
    /// ```
    /// use std::num::NonZero;
    ///
    /// use block_arena::BlockArena;
    ///
    /// let arena = BlockArena::builder()
    ///     .block_size(NonZero::new(64 * 1024).unwrap())
    ///     .build();
    /// ```
    #[must_use]
    pub fn builder() -> BlockArenaBuilder {
        BlockArenaBuilder::new()
    }

    pub(crate) fn new_inner(block_size: NonZero<usize>) -> Self {
        Self {
            block_size,
            blocks: RefCell::new(Vec::new()),
            cursor: Cell::new(ptr::null_mut()),
            remaining: Cell::new(0),
            last_allocation: Cell::new(ptr::null_mut()),
        }
    }

    /// The capacity unit used when creating new blocks.
    #[must_use]
    pub fn block_size(&self) -> NonZero<usize> {
        self.block_size
    }

    /// Number of blocks currently owned by the arena.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.borrow().len()
    }

    /// Free bytes remaining in the current block.
    ///
    /// Zero when no block exists yet; the next allocation then necessarily
    /// creates one. Free space in earlier blocks is spent and not counted.
    #[must_use]
    pub fn remaining_in_current_block(&self) -> usize {
        self.remaining.get()
    }

    /// Capacity for the block that must be created to satisfy a request of
    /// `size` bytes.
    #[cfg_attr(test, mutants::skip)] // Can be mutated to unbounded block sizes and memory exhaustion.
    #[expect(
        clippy::integer_division,
        reason = "the growth policy intentionally rounds down before adding one full increment"
    )]
    fn next_block_capacity(&self, size: usize) -> NonZero<usize> {
        let block_size = self.block_size.get();

        // One full increment is added even when `size` is an exact multiple of
        // the block size: requesting exactly one block's worth reserves two.
        // Preserved deliberately; callers must not rely on tighter rounding.
        let capacity = (size / block_size)
            .wrapping_add(1)
            .checked_mul(block_size)
            .expect("new block capacity exceeds the address space");

        let capacity =
            NonZero::new(capacity).expect("capacity is at least one full non-zero block increment");

        cmp::max(self.block_size, capacity)
    }

    /// Slow path of [`allocate()`][RawAllocator::allocate]: creates a new
    /// block sized for the request and serves the request from its start.
    #[cold]
    fn grow(&self, size: NonZero<usize>) -> NonNull<u8> {
        let capacity = self.next_block_capacity(size.get());

        // The block is allocated before any arena state is touched: if the
        // system refuses the request, the resulting panic leaves the block
        // list, cursor and marker exactly as they were.
        let block = Block::new(capacity);
        let start = block.start();

        self.blocks.borrow_mut().push(block);

        // SAFETY: capacity > size by construction of next_block_capacity, so
        // start + size stays inside the new block.
        self.cursor.set(unsafe { start.as_ptr().add(size.get()) });

        // Cannot underflow: capacity > size by construction.
        self.remaining.set(capacity.get().wrapping_sub(size.get()));
        self.last_allocation.set(start.as_ptr());

        start
    }
}

impl RawAllocator for BlockArena {
    fn allocate(&self, size: NonZero<usize>) -> NonNull<u8> {
        if self.remaining.get() < size.get() {
            return self.grow(size);
        }

        let start = self.cursor.get();
        self.last_allocation.set(start);

        // SAFETY: remaining >= size, so the advanced cursor stays within the
        // current block (at most one past its end).
        self.cursor.set(unsafe { start.add(size.get()) });

        // Cannot underflow: guarded by the remaining >= size check above.
        self.remaining.set(self.remaining.get().wrapping_sub(size.get()));

        // SAFETY: remaining >= size > 0 proves a current block exists, and the
        // cursor always points into the current block, so start is non-null.
        unsafe { NonNull::new_unchecked(start) }
    }

    fn deallocate(&self, ptr: NonNull<u8>) {
        // Only the most recent allocation can be rolled back. Anything else,
        // including pointers into earlier blocks, is a defined no-op.
        if ptr.as_ptr() != self.last_allocation.get() {
            return;
        }

        // The marker and the cursor lie in the same block with the marker at
        // or below the cursor, so this cannot underflow. A repeated rollback
        // of the same pointer reclaims zero bytes and is harmless.
        let reclaimed = self.cursor.get().addr().wrapping_sub(ptr.as_ptr().addr());

        // Cannot overflow: both values are bounded by one block's capacity.
        self.remaining.set(self.remaining.get().wrapping_add(reclaimed));
        self.cursor.set(ptr.as_ptr());
    }

    fn deallocate_all(&self) {
        // Dropping each Block returns its memory to the system.
        self.blocks.borrow_mut().clear();

        self.remaining.set(0);
        self.cursor.set(ptr::null_mut());
        self.last_allocation.set(ptr::null_mut());
    }
}

impl Default for BlockArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use new_zealand::nz;
    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    assert_impl_all!(BlockArena: Send, std::fmt::Debug, Default);
    assert_not_impl_any!(BlockArena: Sync);

    #[test]
    fn fresh_arena_has_no_blocks() {
        let arena = BlockArena::new();

        assert_eq!(arena.block_count(), 0);
        assert_eq!(arena.remaining_in_current_block(), 0);
        assert_eq!(arena.block_size(), DEFAULT_BLOCK_SIZE);
    }

    #[test]
    fn first_allocation_creates_one_block() {
        let arena = BlockArena::builder().block_size(nz!(4096)).build();

        let ptr = arena.allocate(nz!(100));

        assert_eq!(arena.block_count(), 1);
        assert_eq!(arena.remaining_in_current_block(), 3996);
        assert_eq!(ptr.addr().get() % 16, 0);
    }

    #[test]
    fn in_block_allocations_are_packed() {
        let arena = BlockArena::builder().block_size(nz!(4096)).build();

        let p1 = arena.allocate(nz!(16));
        let p2 = arena.allocate(nz!(24));
        let p3 = arena.allocate(nz!(8));

        assert_eq!(arena.block_count(), 1);
        assert_eq!(p2.addr().get() - p1.addr().get(), 16);
        assert_eq!(p3.addr().get() - p2.addr().get(), 24);
    }

    #[test]
    fn allocations_are_writable_and_do_not_overlap() {
        let arena = BlockArena::builder().block_size(nz!(4096)).build();

        let p1 = arena.allocate(nz!(64));
        let p2 = arena.allocate(nz!(64));

        // SAFETY: p1 is valid for 64 bytes until deallocate_all().
        unsafe {
            p1.as_ptr().write_bytes(0x11, 64);
        }

        // SAFETY: p2 is valid for 64 bytes until deallocate_all().
        unsafe {
            p2.as_ptr().write_bytes(0x22, 64);
        }

        // SAFETY: Both regions were fully initialized above and stay live.
        let first = unsafe { std::slice::from_raw_parts(p1.as_ptr(), 64) };

        // SAFETY: As above.
        let second = unsafe { std::slice::from_raw_parts(p2.as_ptr(), 64) };

        assert!(first.iter().all(|byte| *byte == 0x11));
        assert!(second.iter().all(|byte| *byte == 0x22));
    }

    #[test]
    fn overflowing_request_grows_by_block_increments() {
        // The concrete scenario from the allocator's contract: 4096-byte
        // blocks, a 100-byte allocation, then a 5000-byte allocation that no
        // longer fits, then a 50-byte allocation within the grown block.
        let arena = BlockArena::builder().block_size(nz!(4096)).build();

        let _p1 = arena.allocate(nz!(100));
        assert_eq!(arena.remaining_in_current_block(), 3996);

        let p2 = arena.allocate(nz!(5000));
        assert_eq!(arena.block_count(), 2);

        // max(4096, (5000 / 4096 + 1) * 4096) = 8192.
        assert_eq!(arena.remaining_in_current_block(), 8192 - 5000);

        let p3 = arena.allocate(nz!(50));
        assert_eq!(arena.block_count(), 2);
        assert_eq!(p3.addr().get() - p2.addr().get(), 5000);
        assert_eq!(arena.remaining_in_current_block(), 8192 - 5050);
    }

    #[test]
    fn exact_multiple_request_reserves_one_extra_increment() {
        let arena = BlockArena::builder().block_size(nz!(4096)).build();

        // (4096 / 4096 + 1) * 4096 = 8192: one full block's worth of slack
        // is reserved even though the request is an exact multiple.
        let _ptr = arena.allocate(nz!(4096));

        assert_eq!(arena.block_count(), 1);
        assert_eq!(arena.remaining_in_current_block(), 4096);
    }

    #[test]
    fn small_block_size_still_grows_to_fit() {
        let arena = BlockArena::builder().block_size(nz!(8)).build();

        let ptr = arena.allocate(nz!(100));

        // (100 / 8 + 1) * 8 = 104.
        assert_eq!(arena.remaining_in_current_block(), 4);

        // SAFETY: The pointer is valid for all 100 requested bytes.
        unsafe {
            ptr.as_ptr().write_bytes(0xFF, 100);
        }
    }

    #[test]
    fn lifo_rollback_reuses_the_same_address() {
        let arena = BlockArena::builder().block_size(nz!(4096)).build();

        let p1 = arena.allocate(nz!(64));
        let remaining_after_alloc = arena.remaining_in_current_block();

        arena.deallocate(p1);
        assert_eq!(
            arena.remaining_in_current_block(),
            remaining_after_alloc + 64
        );

        let p2 = arena.allocate(nz!(64));
        assert_eq!(p2, p1);
        assert_eq!(arena.remaining_in_current_block(), remaining_after_alloc);
    }

    #[test]
    fn non_lifo_deallocate_is_a_no_op() {
        let arena = BlockArena::builder().block_size(nz!(4096)).build();

        let p1 = arena.allocate(nz!(32));
        let p2 = arena.allocate(nz!(32));
        let remaining = arena.remaining_in_current_block();

        // p1 is no longer the most recent allocation; its space stays spent.
        arena.deallocate(p1);
        assert_eq!(arena.remaining_in_current_block(), remaining);

        let p3 = arena.allocate(nz!(32));
        assert_eq!(p3.addr().get() - p2.addr().get(), 32);
    }

    #[test]
    fn repeated_rollback_of_same_pointer_is_harmless() {
        let arena = BlockArena::builder().block_size(nz!(4096)).build();

        let ptr = arena.allocate(nz!(128));
        arena.deallocate(ptr);
        let remaining = arena.remaining_in_current_block();

        // Second rollback finds the cursor already at the marker and
        // reclaims nothing.
        arena.deallocate(ptr);
        assert_eq!(arena.remaining_in_current_block(), remaining);
    }

    #[test]
    fn deallocate_of_foreign_pointer_is_a_no_op() {
        let arena = BlockArena::builder().block_size(nz!(4096)).build();
        let _inside = arena.allocate(nz!(16));
        let remaining = arena.remaining_in_current_block();

        let mut outside = 0_u8;
        arena.deallocate(NonNull::from(&mut outside));

        assert_eq!(arena.remaining_in_current_block(), remaining);
    }

    #[test]
    fn deallocate_of_earlier_block_pointer_is_a_no_op() {
        let arena = BlockArena::builder().block_size(nz!(64)).build();

        let p1 = arena.allocate(nz!(16));

        // Overflow into a second block; p1 now belongs to a spent block.
        let _p2 = arena.allocate(nz!(128));
        assert_eq!(arena.block_count(), 2);
        let remaining = arena.remaining_in_current_block();

        arena.deallocate(p1);
        assert_eq!(arena.remaining_in_current_block(), remaining);
    }

    #[test]
    fn deallocate_all_resets_to_fresh_state() {
        let arena = BlockArena::builder().block_size(nz!(4096)).build();

        let _p1 = arena.allocate(nz!(100));
        let _p2 = arena.allocate(nz!(5000));
        assert_eq!(arena.block_count(), 2);

        arena.deallocate_all();
        assert_eq!(arena.block_count(), 0);
        assert_eq!(arena.remaining_in_current_block(), 0);

        // The next allocation necessarily creates a new block.
        let _p3 = arena.allocate(nz!(8));
        assert_eq!(arena.block_count(), 1);
        assert_eq!(arena.remaining_in_current_block(), 4088);
    }

    #[test]
    fn rollback_is_unavailable_after_bulk_release() {
        let arena = BlockArena::builder().block_size(nz!(4096)).build();

        let stale = arena.allocate(nz!(64));
        arena.deallocate_all();

        // The marker was cleared; the stale pointer no longer matches it.
        arena.deallocate(stale);
        assert_eq!(arena.remaining_in_current_block(), 0);
        assert_eq!(arena.block_count(), 0);
    }

    #[test]
    fn arena_can_be_moved_between_threads() {
        let arena = BlockArena::new();
        let ptr = arena.allocate(nz!(32));

        // SAFETY: The pointer is valid for 32 bytes until deallocate_all().
        unsafe {
            ptr.as_ptr().write_bytes(0x77, 32);
        }

        let handle = std::thread::spawn(move || {
            let again = arena.allocate(nz!(32));
            arena.deallocate(again);
            arena.block_count()
        });

        assert_eq!(handle.join().expect("thread completed successfully"), 1);
    }

    #[test]
    fn block_capacity_matches_growth_formula() {
        let arena = BlockArena::builder().block_size(nz!(4096)).build();

        let _ptr = arena.allocate(nz!(5000));

        let blocks = arena.blocks.borrow();
        assert_eq!(blocks.len(), 1);
        assert_eq!(
            blocks.first().expect("one block was just created").capacity(),
            8192
        );
    }
}
