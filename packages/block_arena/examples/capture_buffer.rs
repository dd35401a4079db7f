//! Example demonstrating the access pattern the arena is designed for: one
//! large append-only buffer per capture operation, released as a unit.
//!
//! The buffer type here plays the role of an external collaborator - it only
//! ever talks to the arena through the `RawAllocator` trait.

use std::num::NonZero;
use std::ptr::NonNull;

use block_arena::{BlockArena, RawAllocator};
use new_zealand::nz;

/// Accumulates captured bytes in a single pre-reserved region.
struct CaptureBuffer<'a> {
    allocator: &'a dyn RawAllocator,
    region: NonNull<u8>,
    capacity: usize,
    len: usize,
}

impl<'a> CaptureBuffer<'a> {
    fn new(allocator: &'a dyn RawAllocator, capacity: NonZero<usize>) -> Self {
        Self {
            allocator,
            region: allocator.allocate(capacity),
            capacity: capacity.get(),
            len: 0,
        }
    }

    fn append(&mut self, chunk: &[u8]) {
        assert!(
            self.len + chunk.len() <= self.capacity,
            "capture buffer overflow: {} + {} exceeds capacity {}",
            self.len,
            chunk.len(),
            self.capacity
        );

        // SAFETY: The bounds assertion above keeps the copy within the
        // region, which stays valid for the lifetime of the buffer.
        unsafe {
            self.region
                .as_ptr()
                .add(self.len)
                .copy_from_nonoverlapping(chunk.as_ptr(), chunk.len());
        }

        self.len += chunk.len();
    }

    fn as_slice(&self) -> &[u8] {
        // SAFETY: The first `len` bytes of the region have been initialized
        // by append() and the region outlives the returned borrow.
        unsafe { std::slice::from_raw_parts(self.region.as_ptr(), self.len) }
    }
}

impl Drop for CaptureBuffer<'_> {
    fn drop(&mut self) {
        // Best effort: reclaims the region when this buffer was the most
        // recent allocation, a no-op otherwise.
        self.allocator.deallocate(self.region);
    }
}

fn main() {
    println!("=== Capture buffer backed by a BlockArena ===");

    let arena = BlockArena::builder().block_size(nz!(4096)).build();

    {
        let mut buffer = CaptureBuffer::new(&arena, nz!(5 * 1024 * 1024));

        // Simulate the capture driver handing over frames chunk by chunk.
        let frame = [0x42_u8; 8192];
        for _ in 0..16 {
            buffer.append(&frame);
        }

        println!("captured bytes: {}", buffer.as_slice().len());
        println!("arena blocks:   {}", arena.block_count());
    } // Buffer dropped: the most recent allocation rolls back.

    // The next operation reuses the reclaimed space instead of growing.
    let mut buffer = CaptureBuffer::new(&arena, nz!(5 * 1024 * 1024));
    buffer.append(&[1, 2, 3]);
    println!("second capture: {:?}", buffer.as_slice());
    println!("arena blocks:   {}", arena.block_count());

    drop(buffer);
    arena.deallocate_all();
    println!("after release:  {} blocks", arena.block_count());
}
