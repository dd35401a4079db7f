use std::fmt;
use std::marker::PhantomData;
use std::num::NonZero;
use std::ptr::{self, NonNull};

use crate::RawAllocator;

/// A typed, copyable handle over a [`RawAllocator`], exposing the operations
/// generic container machinery expects: element-typed allocate and deallocate,
/// in-place construction and destruction, rebinding to another element type,
/// and identity-based equality.
///
/// The handle never owns the allocator it references; the allocator must
/// outlive both the handle and every pointer obtained through it, which the
/// lifetime parameter enforces. There is no unbound state: a handle always
/// refers to exactly one allocator.
///
/// Two handles compare equal if and only if they reference the identical
/// allocator instance, regardless of their element types. Containers use this
/// to decide whether storage obtained from one handle may be released through
/// another.
///
/// # Alignment
///
/// The underlying allocator packs allocations end to end, so only the first
/// allocation in each of its blocks carries the 16-byte block alignment.
/// `TypedAllocator` is therefore best suited to element types with small
/// alignment requirements, or to usage patterns that allocate one large
/// buffer per region.
///
/// # Example
///
/// ```
/// use std::num::NonZero;
///
/// use block_arena::{BlockArena, TypedAllocator};
///
/// let arena = BlockArena::new();
/// let strings: TypedAllocator<'_, String> = TypedAllocator::new(&arena);
///
/// let storage = strings.allocate(NonZero::new(1).unwrap());
///
/// // SAFETY: The storage was just allocated for one String and is
/// // uninitialized.
/// unsafe {
///     strings.construct(storage, "hello".to_string());
/// }
///
/// // SAFETY: The element was initialized by construct() above.
/// assert_eq!(unsafe { storage.as_ref() }, "hello");
///
/// // SAFETY: The element is initialized and not used again afterwards.
/// unsafe {
///     strings.destroy(storage);
/// }
///
/// strings.deallocate(storage, 1);
/// ```
pub struct TypedAllocator<'a, T> {
    allocator: &'a dyn RawAllocator,

    // The handle is typed by its element but stores none; NonNull keeps the
    // element type out of the auto trait surface the same way a raw pointer
    // field would.
    _element: PhantomData<NonNull<T>>,
}

impl<'a, T> TypedAllocator<'a, T> {
    /// Creates a handle bound to the given allocator.
    #[must_use]
    pub fn new(allocator: &'a dyn RawAllocator) -> Self {
        Self {
            allocator,
            _element: PhantomData,
        }
    }

    /// Returns storage for `count` elements of `T`.
    ///
    /// The storage is uninitialized; initialize elements with
    /// [`construct()`][Self::construct] before reading them. It remains valid
    /// until the allocator's bulk release, its destruction, or a successful
    /// rollback via [`deallocate()`][Self::deallocate], whichever comes first.
    ///
    /// # Panics
    ///
    /// Panics if `T` is zero-sized or if the byte size of the request would
    /// exceed the address space.
    #[must_use]
    pub fn allocate(&self, count: NonZero<usize>) -> NonNull<T> {
        let bytes = count
            .get()
            .checked_mul(size_of::<T>())
            .expect("allocation size in bytes exceeds the address space");

        let bytes = NonZero::new(bytes)
            .expect("TypedAllocator cannot allocate storage for zero-sized element types");

        self.allocator.allocate(bytes).cast()
    }

    /// Releases storage previously returned by [`allocate()`][Self::allocate],
    /// on a best-effort basis.
    ///
    /// The underlying allocator does not track per-call sizes; `count` is
    /// accepted only to satisfy the generic contract. Space is actually
    /// reclaimed only when `ptr` is the allocator's most recent allocation.
    pub fn deallocate(&self, ptr: NonNull<T>, count: usize) {
        _ = count;

        self.allocator.deallocate(ptr.cast());
    }

    /// Builds an element in place at already-allocated raw storage, without
    /// allocating.
    ///
    /// # Safety
    ///
    /// The caller must ensure that `ptr` is valid for writes of one `T` (e.g.
    /// obtained from [`allocate()`][Self::allocate] and still live) and that
    /// any previous element at this location has been destroyed or moved out.
    pub unsafe fn construct(&self, ptr: NonNull<T>, value: T) {
        // SAFETY: The caller guarantees ptr is valid for writes of one T.
        unsafe {
            ptr.write(value);
        }
    }

    /// Tears down the element at `ptr` in place, without freeing its storage.
    ///
    /// # Safety
    ///
    /// The caller must ensure that `ptr` points to a live, initialized `T`
    /// and that the element is not used again after this call.
    pub unsafe fn destroy(&self, ptr: NonNull<T>) {
        // SAFETY: The caller guarantees ptr points to a live, initialized T.
        unsafe {
            ptr::drop_in_place(ptr.as_ptr());
        }
    }

    /// Produces a handle for a different element type, bound to the same
    /// underlying allocator.
    ///
    /// # Example
    ///
    /// ```
    /// use block_arena::{BlockArena, TypedAllocator};
    ///
    /// let arena = BlockArena::new();
    /// let bytes: TypedAllocator<'_, u8> = TypedAllocator::new(&arena);
    /// let words: TypedAllocator<'_, u64> = bytes.rebind();
    ///
    /// // Rebinding preserves the allocator identity.
    /// assert_eq!(bytes, words);
    /// ```
    #[must_use]
    pub fn rebind<U>(&self) -> TypedAllocator<'a, U> {
        TypedAllocator {
            allocator: self.allocator,
            _element: PhantomData,
        }
    }
}

impl<T> Clone for TypedAllocator<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TypedAllocator<'_, T> {}

impl<T> fmt::Debug for TypedAllocator<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedAllocator")
            .field("allocator", &self.allocator)
            .finish()
    }
}

impl<T, U> PartialEq<TypedAllocator<'_, U>> for TypedAllocator<'_, T> {
    fn eq(&self, other: &TypedAllocator<'_, U>) -> bool {
        // Identity of the referenced allocator, never structural comparison.
        ptr::addr_eq(self.allocator, other.allocator)
    }
}

impl<T> Eq for TypedAllocator<'_, T> {}
