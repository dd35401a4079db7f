use std::fmt;
use std::num::NonZero;
use std::ptr::NonNull;

/// The capability contract that any backing store for arena-style allocation
/// must provide: raw allocation by byte size, best-effort release of a single
/// pointer, and bulk release of everything allocated so far.
///
/// The trait is object-safe and intended for dynamic dispatch: collaborators
/// such as [`TypedAllocator`][crate::TypedAllocator] hold a `&dyn RawAllocator`
/// so that alternate backing implementations (a call-counting wrapper for
/// tests, a delegating instrumentation layer) can substitute for the concrete
/// arena without changing any collaborator code.
///
/// All methods take `&self`; implementations use interior mutability. This
/// allows one allocator instance to serve multiple collaborators within a
/// single thread, which is the intended usage model. Implementations are not
/// required to be [`Sync`] and the expectation is that they are not.
///
/// # Pointer validity
///
/// A pointer returned by [`allocate()`][Self::allocate] is valid for reads and
/// writes of exactly the requested number of bytes, from the moment it is
/// returned until either [`deallocate_all()`][Self::deallocate_all] is called
/// or the allocator is dropped, whichever comes first. Using a pointer beyond
/// that window is undefined behavior; the allocator performs no runtime
/// detection of such misuse. Discarding stale pointers is the caller's
/// responsibility.
///
/// # Example
///
/// ```
/// use std::num::NonZero;
///
/// use block_arena::{BlockArena, RawAllocator};
///
/// fn scratch(allocator: &dyn RawAllocator) {
///     let ptr = allocator.allocate(NonZero::new(128).unwrap());
///
///     // SAFETY: The pointer is valid for 128 bytes until deallocate_all().
///     unsafe {
///         ptr.as_ptr().write_bytes(0, 128);
///     }
///
///     // Roll back the most recent allocation; its space becomes reusable.
///     allocator.deallocate(ptr);
/// }
///
/// let arena = BlockArena::new();
/// scratch(&arena);
/// arena.deallocate_all();
/// ```
pub trait RawAllocator: fmt::Debug {
    /// Returns memory usable for exactly `size` bytes.
    ///
    /// On success the returned pointer is never dangling or null. If the
    /// system cannot supply backing memory, the implementation panics and the
    /// allocator's observable state is left exactly as it was before the call;
    /// there is no retry and no fallback.
    ///
    /// The zero-size precondition of the contract is unrepresentable here:
    /// callers prove `size > 0` by constructing the [`NonZero`].
    fn allocate(&self, size: NonZero<usize>) -> NonNull<u8>;

    /// Releases a single allocation on a best-effort basis.
    ///
    /// This is not a general free. Implementations may reclaim space only in
    /// constrained circumstances (the arena reclaims only the most recent
    /// allocation) and must treat every other pointer as a silent no-op.
    fn deallocate(&self, ptr: NonNull<u8>);

    /// Releases every byte previously allocated through this instance.
    ///
    /// Every pointer obtained from [`allocate()`][Self::allocate] before this
    /// call becomes invalid. The allocator afterwards behaves as if freshly
    /// constructed.
    fn deallocate_all(&self);
}
