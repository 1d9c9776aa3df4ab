///
/// Per-Batch Arena Allocator
///
/// Bump-pointer allocation for variable-length kernel outputs. Nothing is freed
/// individually: the whole arena is recycled by `reset()` when the owning
/// execution context moves on to the next batch, or released on drop.
///
/// Chunks start at `block_size` bytes and grow as needed. An optional hard
/// capacity turns exhaustion into an allocation failure that kernels report
/// through the execution context instead of aborting.
///

use std::alloc::Layout;
use std::ptr::NonNull;

use bumpalo::Bump;

use crate::config::ArenaConfig;

pub struct Arena {
    bump: Bump,
    capacity: Option<usize>,
}

impl Arena {
    pub fn new(config: &ArenaConfig) -> Self {
        let bump = Bump::with_capacity(config.block_size);
        let capacity = (config.capacity > 0).then_some(config.capacity);
        bump.set_allocation_limit(capacity);
        Self { bump, capacity }
    }

    /// Allocate `size` zeroed bytes. Returns `None` once the capacity is exhausted.
    #[inline]
    #[allow(clippy::mut_from_ref)]
    pub fn allocate(&self, size: usize) -> Option<&mut [u8]> {
        if size == 0 {
            return Some(&mut []);
        }
        let ptr = self.allocate_layout(Layout::from_size_align(size, 1).ok()?)?;
        unsafe {
            std::ptr::write_bytes(ptr.as_ptr(), 0, size);
            Some(std::slice::from_raw_parts_mut(ptr.as_ptr(), size))
        }
    }

    /// Allocate a block with an explicit alignment, for callers outside the kernel library.
    pub fn allocate_layout(&self, layout: Layout) -> Option<NonNull<u8>> {
        self.bump.try_alloc_layout(layout).ok()
    }

    /// Copy `data` into the arena.
    pub fn copy(&self, data: &[u8]) -> Option<&[u8]> {
        let out = self.allocate(data.len())?;
        out.copy_from_slice(data);
        Some(out)
    }

    /// Total bytes held in chunks, including unused tails.
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Recycle every chunk. All previously returned slices become invalid, which
    /// the `&mut self` receiver enforces.
    pub fn reset(&mut self) {
        self.bump.reset();
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new(&ArenaConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_is_zeroed_and_disjoint() {
        let arena = Arena::default();
        let a = arena.allocate(16).unwrap();
        a.fill(0xAA);
        let b = arena.allocate(16).unwrap();
        assert!(b.iter().all(|&x| x == 0));
        assert_eq!(a[0], 0xAA);
    }

    #[test]
    fn test_zero_sized_allocation() {
        let arena = Arena::default();
        assert_eq!(arena.allocate(0).unwrap().len(), 0);
    }

    #[test]
    fn test_copy() {
        let arena = Arena::default();
        assert_eq!(arena.copy(b"hello").unwrap(), b"hello");
    }

    #[test]
    fn test_capacity_exhaustion() {
        let arena = Arena::new(&ArenaConfig { block_size: 256, capacity: 1024 });
        assert!(arena.allocate(64).is_some());
        assert!(arena.allocate(1 << 20).is_none());
        assert_eq!(arena.capacity(), Some(1024));
    }

    #[test]
    fn test_reset_allows_reuse() {
        let mut arena = Arena::new(&ArenaConfig { block_size: 256, capacity: 0 });
        for _ in 0..64 {
            arena.allocate(1024).unwrap();
        }
        let before = arena.allocated_bytes();
        arena.reset();
        arena.allocate(1024).unwrap();
        assert!(arena.allocated_bytes() <= before);
    }
}
