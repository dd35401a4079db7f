//! Example demonstrating `TypedAllocator` as the storage provider for a
//! minimal container, the way generic container machinery consumes it.

use std::num::NonZero;
use std::ptr::NonNull;

use block_arena::{BlockArena, RawAllocator, TypedAllocator};
use new_zealand::nz;

/// A fixed-capacity sequence that obtains its storage from a typed handle.
struct FixedVec<'a, T> {
    allocator: TypedAllocator<'a, T>,
    storage: NonNull<T>,
    capacity: usize,
    len: usize,
}

impl<'a, T> FixedVec<'a, T> {
    fn new(allocator: TypedAllocator<'a, T>, capacity: NonZero<usize>) -> Self {
        Self {
            allocator,
            storage: allocator.allocate(capacity),
            capacity: capacity.get(),
            len: 0,
        }
    }

    fn push(&mut self, value: T) {
        assert!(self.len < self.capacity, "FixedVec is at capacity");

        // SAFETY: len < capacity keeps the slot within the allocated storage.
        let slot = unsafe { self.storage.add(self.len) };

        // SAFETY: The slot is uninitialized (or already destroyed) and is
        // written exactly once per occupancy.
        unsafe {
            self.allocator.construct(slot, value);
        }

        self.len += 1;
    }

    fn get(&self, index: usize) -> &T {
        assert!(index < self.len, "index {index} out of bounds");

        // SAFETY: Every slot below len was initialized by push().
        unsafe { self.storage.add(index).as_ref() }
    }
}

impl<T> Drop for FixedVec<'_, T> {
    fn drop(&mut self) {
        for index in 0..self.len {
            // SAFETY: index < len stays within the allocated storage.
            let slot = unsafe { self.storage.add(index) };

            // SAFETY: Slots below len hold live elements, each destroyed
            // exactly once here.
            unsafe {
                self.allocator.destroy(slot);
            }
        }

        self.allocator.deallocate(self.storage, self.capacity);
    }
}

fn main() {
    println!("=== Containers backed by a BlockArena ===");

    let arena = BlockArena::new();
    let strings: TypedAllocator<'_, String> = TypedAllocator::new(&arena);

    let mut names = FixedVec::new(strings, nz!(4));
    names.push("arena".to_string());
    names.push("backed".to_string());
    names.push("storage".to_string());

    for index in 0..3 {
        println!("names[{index}] = {}", names.get(index));
    }

    // Rebinding produces a handle for another element type over the same
    // arena; equality confirms the shared backing store.
    let numbers: TypedAllocator<'_, u64> = strings.rebind();
    assert_eq!(numbers, strings);

    let mut squares = FixedVec::new(numbers, nz!(8));
    for value in 0..8_u64 {
        squares.push(value * value);
    }
    println!("squares[7] = {}", squares.get(7));

    // A different arena yields an unequal handle: its storage must not be
    // released through ours.
    let other_arena = BlockArena::new();
    let foreign: TypedAllocator<'_, u64> = TypedAllocator::new(&other_arena);
    assert_ne!(foreign, numbers);

    drop(squares);
    drop(names);
    println!("arena blocks before release: {}", arena.block_count());
    arena.deallocate_all();
    println!("arena blocks after release:  {}", arena.block_count());
}
