//! Wiring `Heap` into a program's allocation surface, built on top of the core rather
//! than inside it: a process-wide singleton behind the standard library's
//! `#[global_allocator]` hook, exactly like any other `GlobalAlloc` implementation.

use std::alloc::{GlobalAlloc, Layout};
use std::cell::UnsafeCell;
use std::ptr;
use std::ptr::NonNull;

use crate::heap::Heap;
use crate::os::LibcOs;

struct GlobalHeap {
  inner: UnsafeCell<Option<Heap<LibcOs>>>,
}

// Safety: the allocator core is single-threaded by design -- this unlocks only the
// ability to name one process-wide static, not actual concurrent access. A program that
// allocates from more than one thread while using `Rallocator` as `#[global_allocator]`
// is outside this crate's contract, exactly as it would be for the bare core.
unsafe impl Sync for GlobalHeap {}

impl GlobalHeap {
  const fn new() -> Self {
    Self { inner: UnsafeCell::new(None) }
  }

  unsafe fn with<R>(&self, f: impl FnOnce(&mut Heap<LibcOs>) -> R) -> R {
    let slot = unsafe { &mut *self.inner.get() };
    let heap = slot.get_or_insert_with(|| Heap::new(LibcOs));
    f(heap)
  }
}

static GLOBAL_HEAP: GlobalHeap = GlobalHeap::new();

/// A `GlobalAlloc` adapter over a process-wide [`Heap<LibcOs>`].
///
/// `Layout::align()` is ignored beyond the heap's own `ALIGNMENT` tunable (default 8):
/// this allocator hands out a fixed payload alignment, not a per-request one, so it must
/// not be installed as `#[global_allocator]` in a program that over-aligns allocations.
pub struct Rallocator;

unsafe impl GlobalAlloc for Rallocator {
  unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
    unsafe {
      GLOBAL_HEAP.with(|heap| heap.allocate(layout.size()).map_or(ptr::null_mut(), NonNull::as_ptr))
    }
  }

  unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
    unsafe {
      GLOBAL_HEAP.with(|heap| {
        heap.zero_allocate(1, layout.size()).map_or(ptr::null_mut(), NonNull::as_ptr)
      })
    }
  }

  unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
    unsafe {
      GLOBAL_HEAP.with(|heap| heap.free(NonNull::new(ptr)));
    }
  }

  unsafe fn realloc(&self, ptr: *mut u8, _layout: Layout, new_size: usize) -> *mut u8 {
    unsafe {
      GLOBAL_HEAP.with(|heap| {
        heap.resize(NonNull::new(ptr), new_size).map_or(ptr::null_mut(), NonNull::as_ptr)
      })
    }
  }
}
