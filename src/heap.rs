//! The single owner of both arena lists.
//!
//! Two doubly-linked arenas instead of one singly-linked free list, parameterized over
//! the `Os` implementation that backs `segment_break`/`map`/`unmap`/`page_size`.

use std::ptr;
use std::ptr::NonNull;

use crate::align::round_up;
use crate::header::{Header, HEADER_SIZE};
use crate::os::Os;
use crate::tunables::Tunables;

/// Owns both arena list heads, the tunables, and the concrete [`Os`]. Not `Clone` and not
/// `Sync`/`Send` by default (it holds raw pointers): a given pair of arenas has exactly one
/// owner, matching this crate's "no teardown, no sharing, no concurrency" contract.
pub struct Heap<O: Os> {
  pub(crate) os: O,
  pub(crate) tunables: Tunables,
  pub(crate) segment_head: *mut Header,
  pub(crate) mapped_head: *mut Header,
}

impl<O: Os> Heap<O> {
  /// Builds a heap with the default tunables, querying `os.page_size()` to seed
  /// `mmap_threshold_zero`.
  pub fn new(mut os: O) -> Self {
    let tunables = Tunables::with_page_size(os.page_size());
    Self::with_tunables(os, tunables)
  }

  pub fn with_tunables(os: O, tunables: Tunables) -> Self {
    Self {
      os,
      tunables,
      segment_head: ptr::null_mut(),
      mapped_head: ptr::null_mut(),
    }
  }

  pub fn tunables(&self) -> &Tunables {
    &self.tunables
  }

  /// `need`: the header-inclusive, alignment-rounded size of a request for
  /// `requested_payload` bytes.
  pub(crate) fn need_for(&self, requested_payload: usize) -> usize {
    round_up(requested_payload, self.tunables.alignment) + HEADER_SIZE
  }

  /// Allocates `size` payload bytes. `None` iff `size == 0`; any OS primitive
  /// failure along the way is fatal and never returns.
  pub fn allocate(&mut self, size: usize) -> Option<NonNull<u8>> {
    if size == 0 {
      return None;
    }
    let need = self.need_for(size);
    let ptr = if need <= self.tunables.mmap_threshold_alloc {
      self.segment_allocate(need)
    } else {
      self.mapped_allocate(need)
    };
    NonNull::new(ptr)
  }

  /// Allocates `nmemb * elem_size` zeroed payload bytes. `None` on overflow of that
  /// product or if the product is zero.
  pub fn zero_allocate(&mut self, nmemb: usize, elem_size: usize) -> Option<NonNull<u8>> {
    let total = nmemb.checked_mul(elem_size)?;
    if total == 0 {
      return None;
    }
    let need = self.need_for(total);
    if need <= self.tunables.mmap_threshold_zero {
      let ptr = self.segment_allocate(need);
      if !ptr.is_null() {
        unsafe { ptr::write_bytes(ptr, 0, total) };
      }
      NonNull::new(ptr)
    } else {
      // Fresh anonymous mappings are zero by OS contract; no explicit clear needed.
      NonNull::new(self.mapped_allocate(need))
    }
  }

  /// Frees the block at `ptr`. A no-op if `ptr` is `None` or belongs to neither arena.
  pub fn free(&mut self, ptr: Option<NonNull<u8>>) {
    self.free_impl(ptr);
  }

  /// Resizes the block at `ptr` to `size` payload bytes.
  pub fn resize(&mut self, ptr: Option<NonNull<u8>>, size: usize) -> Option<NonNull<u8>> {
    self.resize_impl(ptr, size)
  }
}
