//! A growable bump arena allocator with single-step rollback and a typed
//! allocator adapter for container storage.
//!
//! This crate provides [`BlockArena`], a region-based allocator that serves
//! requests by advancing a cursor within pre-reserved memory blocks, growing
//! by appending new, larger blocks on demand. It exists for workloads that
//! allocate a handful of large, append-only buffers (one capture buffer per
//! operation, say), write into them sequentially, and discard everything at
//! once - without paying a general-purpose allocator call per element.
//!
//! [`TypedAllocator`] adapts any [`RawAllocator`] implementation to the
//! contract generic container machinery expects: element-typed allocation,
//! in-place construction and destruction, rebinding to other element types,
//! and identity-based equality.
//!
//! # Key Features
//!
//! - **O(1) bump allocation**: in the common case a request advances a cursor
//!   and nothing else
//! - **Growable block list**: an overflowing request appends a new block sized
//!   at a multiple of the configured block size
//! - **Single-step rollback**: the most recent allocation - and only that one -
//!   can be returned to the arena
//! - **Bulk release**: [`deallocate_all()`][RawAllocator::deallocate_all]
//!   returns every block to the system in one step
//! - **Pluggable backing store**: collaborators consume the [`RawAllocator`]
//!   trait, so instrumented or test-double allocators substitute freely
//! - **Builder configuration**: block size via [`BlockArena::builder()`]
//! - **Thread mobility**: the arena can move between threads but is
//!   single-threaded by design ([`Send`], not [`Sync`])
//!
//! # Basic Usage
//!
//! ```rust
//! use std::num::NonZero;
//!
//! use block_arena::{BlockArena, RawAllocator};
//!
//! let arena = BlockArena::new();
//!
//! // One large region for the whole operation.
//! let buffer = arena.allocate(NonZero::new(64 * 1024).unwrap());
//!
//! // SAFETY: The region is valid for 64 KiB until deallocate_all().
//! unsafe {
//!     buffer.as_ptr().write_bytes(0, 64 * 1024);
//! }
//!
//! // ... append captured bytes into the region ...
//!
//! // The operation is finished; release everything at once.
//! arena.deallocate_all();
//! ```
//!
//! # Typed Container Storage
//!
//! ```rust
//! use std::num::NonZero;
//!
//! use block_arena::{BlockArena, TypedAllocator};
//!
//! let arena = BlockArena::new();
//! let words: TypedAllocator<'_, u64> = TypedAllocator::new(&arena);
//!
//! // Storage for eight elements, uninitialized.
//! let storage = words.allocate(NonZero::new(8).unwrap());
//!
//! for index in 0..8 {
//!     // SAFETY: index stays within the eight allocated element slots.
//!     let slot = unsafe { storage.add(index) };
//!
//!     // SAFETY: Each slot is written exactly once before any read.
//!     unsafe {
//!         words.construct(slot, index as u64);
//!     }
//! }
//!
//! // Handles over the same arena are interchangeable...
//! let rebound: TypedAllocator<'_, u64> = words.rebind::<u8>().rebind();
//! assert_eq!(rebound, words);
//!
//! // ...and equality is allocator identity, so storage allocated through one
//! // handle may be released through the other.
//! rebound.deallocate(storage, 8);
//! ```
//!
//! # Non-goals
//!
//! This is not a general-purpose heap: there is no arbitrary-order freeing, no
//! compaction, no size-class free lists, and no internal synchronization.
//! Workloads with many interleaved small frees belong on a real heap.

mod allocator;
mod arena;
mod block;
mod builder;
mod typed;

pub use allocator::RawAllocator;
pub use arena::BlockArena;
pub use builder::BlockArenaBuilder;
pub use typed::TypedAllocator;

pub(crate) use block::*;
