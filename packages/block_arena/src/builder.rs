use std::cell::Cell;
use std::marker::PhantomData;
use std::num::NonZero;

use crate::BlockArena;
use crate::arena::DEFAULT_BLOCK_SIZE;

/// Builder for creating an instance of [`BlockArena`].
///
/// All settings are optional; [`build()`][Self::build] with no configuration
/// produces an arena equivalent to [`BlockArena::new()`].
///
/// # Examples
///
/// ```
/// use block_arena::BlockArena;
///
/// let arena = BlockArena::builder().build();
/// ```
///
/// With a custom block size:
///
/// ```
/// use std::num::NonZero;
///
/// use block_arena::BlockArena;
///
/// let arena = BlockArena::builder()
///     .block_size(NonZero::new(1024).unwrap())
///     .build();
///
/// assert_eq!(arena.block_size().get(), 1024);
/// ```
///
/// # Thread safety
///
/// The builder is thread-mobile ([`Send`]) and can be safely transferred
/// between threads, allowing arena configuration to happen on a different
/// thread than where the arena is used. It is not thread-safe ([`Sync`]).
#[derive(Debug)]
#[must_use]
pub struct BlockArenaBuilder {
    block_size: NonZero<usize>,

    // Prevents Sync while allowing Send - builders are thread-mobile but not thread-safe
    _not_sync: PhantomData<Cell<()>>,
}

impl BlockArenaBuilder {
    #[inline]
    pub(crate) fn new() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            _not_sync: PhantomData,
        }
    }

    /// Sets the capacity unit, in bytes, for blocks created by the arena.
    ///
    /// Requests larger than one block are served from a block sized at a
    /// multiple of this value. Smaller block sizes waste less memory on slack;
    /// larger ones grow less often.
    ///
    /// # Examples
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
    #[inline]
    pub fn block_size(mut self, block_size: NonZero<usize>) -> Self {
        self.block_size = block_size;
        self
    }

    /// Builds the arena with the specified configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use block_arena::BlockArena;
    ///
    /// let arena = BlockArena::builder().build();
    /// ```
    #[must_use]
    #[inline]
    pub fn build(self) -> BlockArena {
        BlockArena::new_inner(self.block_size)
    }
}
