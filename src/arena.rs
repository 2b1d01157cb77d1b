//! Per-worker bump allocator backing the header fields of one
//! request/response cycle.

use std::mem;

/// Block size of a worker's arena. HTTP field storage is many small,
/// short-lived allocations; 8 KiB covers a full header section.
pub(crate) const BLOCK_SIZE: usize = 8 * 1024;

/// A fixed-block bump allocator scoped to a single request/response pair.
///
/// All allocations are copies of caller-provided bytes. The block itself is
/// never reallocated; when it is exhausted, allocations fall back
/// transparently to individually boxed slices chained in an overflow list.
/// [`reset`](FieldArena::reset) recycles everything for the next cycle.
#[derive(Debug)]
pub(crate) struct FieldArena {
    block: Box<[u8]>,
    used: usize,
    overflow: Vec<Box<[u8]>>,
}

impl FieldArena {
    pub(crate) fn new(block_size: usize) -> Self {
        Self {
            block: vec![0; block_size].into_boxed_slice(),
            used: 0,
            overflow: Vec::new(),
        }
    }

    /// Copies `bytes` into the arena and returns the stored copy.
    ///
    /// The returned reference is only valid until [`reset`](FieldArena::reset)
    /// is called; see the safety notes on `into_static`.
    pub(crate) fn alloc(&mut self, bytes: &[u8]) -> &'static [u8] {
        if self.used + bytes.len() <= self.block.len() {
            let start = self.used;
            self.used += bytes.len();

            let slot = &mut self.block[start..start + bytes.len()];
            slot.copy_from_slice(bytes);

            // SAFETY: `block` is a Box<[u8]> that is never reallocated, and a
            // bump region is never handed out twice before `reset`. See
            // `into_static` for the lifetime invariant.
            unsafe { Self::into_static(slot) }
        } else {
            let boxed: Box<[u8]> = bytes.into();

            // SAFETY: the boxed slice's heap storage does not move when the
            // box is pushed into `overflow`, and the box is only dropped by
            // `reset`. See `into_static` for the lifetime invariant.
            let stored = unsafe { Self::into_static(&boxed[..]) };
            self.overflow.push(boxed);
            stored
        }
    }

    /// Copies `src` into the arena and returns the stored copy as a string.
    pub(crate) fn alloc_str(&mut self, src: &str) -> &'static str {
        let bytes = self.alloc(src.as_bytes());

        // SAFETY: `bytes` is a verbatim copy of a valid `&str`.
        unsafe { std::str::from_utf8_unchecked(bytes) }
    }

    /// Recycles the block and releases the overflow chain.
    ///
    /// The caller must have dropped or cleared every reference previously
    /// returned by `alloc`/`alloc_str`; the worker enforces this by resetting
    /// its request and response before resetting the arena.
    pub(crate) fn reset(&mut self) {
        self.used = 0;
        self.overflow.clear();
    }

    #[cfg(test)]
    pub(crate) fn used(&self) -> usize {
        self.used
    }

    #[cfg(test)]
    pub(crate) fn overflow_len(&self) -> usize {
        self.overflow.len()
    }

    // SAFETY: the returned reference points into storage owned by the arena
    // (the fixed block or a stable overflow box) and stays valid until
    // `reset`. Callers uphold the worker teardown order: request, response
    // and serializer are cleared before the arena is reset, so no reference
    // outlives its storage.
    const unsafe fn into_static<T: ?Sized>(src: &T) -> &'static T {
        unsafe { mem::transmute(src) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bump_allocates_copies() {
        let mut arena = FieldArena::new(64);

        let a = arena.alloc(b"content-type");
        let b = arena.alloc_str("application/json");

        assert_eq!(a, b"content-type");
        assert_eq!(b, "application/json");
        assert_eq!(arena.used(), a.len() + b.len());
        assert_eq!(arena.overflow_len(), 0);
    }

    #[test]
    fn exhaustion_falls_back_to_overflow() {
        let mut arena = FieldArena::new(8);

        let fits = arena.alloc(b"12345678");
        let spilled = arena.alloc(b"overflowing value");

        assert_eq!(fits, b"12345678");
        assert_eq!(spilled, b"overflowing value");
        assert_eq!(arena.overflow_len(), 1);
    }

    #[test]
    fn reset_recycles_block_and_overflow() {
        let mut arena = FieldArena::new(8);

        arena.alloc(b"12345678");
        arena.alloc(b"spill");
        arena.reset();

        assert_eq!(arena.used(), 0);
        assert_eq!(arena.overflow_len(), 0);

        let again = arena.alloc(b"fresh");
        assert_eq!(again, b"fresh");
        assert_eq!(arena.overflow_len(), 0);
    }

    #[test]
    fn empty_allocation() {
        let mut arena = FieldArena::new(8);

        assert_eq!(arena.alloc(b""), b"");
        assert_eq!(arena.used(), 0);
    }
}
