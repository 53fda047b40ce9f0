//! Free and resize.
//!
//! Grounded on `os_free`/`os_realloc`/`verify_size` in the original C source: the same
//! five-strategy resize ordering (already-free, shrink-or-exact, absorb-right,
//! extend-tail, copy-relocate) is reproduced here over `*mut Header` instead of
//! `void *` arithmetic.

use std::ptr;
use std::ptr::NonNull;

use crate::error::fatal;
use crate::header::{Header, Status, HEADER_SIZE};
use crate::heap::Heap;
use crate::list;
use crate::os::Os;

impl<O: Os> Heap<O> {
  pub(crate) fn free_impl(&mut self, ptr: Option<NonNull<u8>>) {
    let Some(ptr) = ptr else { return };
    let payload = ptr.as_ptr();

    if let Some(block) = unsafe { list::find_by_payload(self.segment_head, payload) } {
      unsafe { (*block).status = Status::Free };
      self.coalesce_segment();
      return;
    }

    if let Some(block) = unsafe { list::find_by_payload(self.mapped_head, payload) } {
      self.unlink_mapped(block);
      unsafe {
        let size = (*block).size;
        if let Err(err) = self.os.unmap(block as *mut u8, size) {
          log::warn!("rallocator: {err} (region already unlinked, leaking it)");
        }
      }
      return;
    }

    // Unknown pointer: a well-behaved caller never reaches this; treated as a no-op
    // rather than an error.
  }

  fn unlink_mapped(&mut self, block: *mut Header) {
    unsafe {
      let prev = (*block).prev;
      let next = (*block).next;
      if prev.is_null() {
        self.mapped_head = next;
      } else {
        (*prev).next = next;
      }
      if !next.is_null() {
        (*next).prev = prev;
      }
    }
  }

  pub(crate) fn resize_impl(&mut self, ptr: Option<NonNull<u8>>, size: usize) -> Option<NonNull<u8>> {
    let Some(ptr) = ptr else { return self.allocate(size) };

    if size == 0 {
      self.free(Some(ptr));
      return None;
    }

    let need = self.need_for(size);
    let payload = ptr.as_ptr();

    if let Some(block) = unsafe { list::find_by_payload(self.segment_head, payload) } {
      return self.resize_segment(block, need, size);
    }

    if let Some(block) = unsafe { list::find_by_payload(self.mapped_head, payload) } {
      return self.resize_copy(block, payload, size);
    }

    None
  }

  /// Segment-arena resize: shrink-or-exact, absorb-right, extend-tail, then
  /// copy-relocate, in that order.
  fn resize_segment(&mut self, block: *mut Header, need: usize, requested: usize) -> Option<NonNull<u8>> {
    unsafe {
      if (*block).status == Status::Free {
        return None;
      }

      let old_size = (*block).size;

      if old_size >= need {
        if old_size >= need + self.tunables.min_split_remainder {
          self.split_off_remainder(block, need);
          // The split-off remainder may sit next to an already-FREE right neighbor
          // (e.g. a freed former tail); re-coalesce so I3 holds on return.
          self.coalesce_segment();
        }
        return NonNull::new(Header::payload(block));
      }

      let right = (*block).next;
      if !right.is_null() && (*right).status == Status::Free && old_size + (*right).size >= need {
        self.absorb_right_neighbor(block, right);
        let merged_size = (*block).size;
        if merged_size >= need + self.tunables.min_split_remainder {
          self.split_off_remainder(block, need);
        }
        return NonNull::new(Header::payload(block));
      }

      if (*block).next.is_null() {
        let extra = need - old_size;
        self.os.segment_break(extra as isize).unwrap_or_else(|e| fatal(e));
        (*block).size = need;
        return NonNull::new(Header::payload(block));
      }

      let copyable = (old_size - HEADER_SIZE).min(requested);
      let old_payload = Header::payload(block);
      let new_ptr = self.allocate(requested)?;
      ptr::copy_nonoverlapping(old_payload, new_ptr.as_ptr(), copyable);
      self.free(NonNull::new(old_payload));
      Some(new_ptr)
    }
  }

  /// Merges `right` into `block` (both contiguous segment blocks). Does not split; the
  /// caller decides whether the merged size leaves room for a remainder.
  ///
  /// # Safety
  /// `block` and `right` must be live, adjacent segment descriptors with `right` FREE.
  unsafe fn absorb_right_neighbor(&mut self, block: *mut Header, right: *mut Header) {
    unsafe {
      let merged_size = (*block).size + (*right).size;
      let right_next = (*right).next;
      (*block).size = merged_size;
      (*block).next = right_next;
      if !right_next.is_null() {
        (*right_next).prev = block;
      }
    }
  }

  /// Always copy-relocate: a mapped block cannot coalesce or grow in place, since each
  /// mapped block is its own independent mapping with no adjacent neighbors.
  fn resize_copy(&mut self, block: *mut Header, payload: *mut u8, requested: usize) -> Option<NonNull<u8>> {
    unsafe {
      let old_size = (*block).size;
      let copyable = (old_size - HEADER_SIZE).min(requested);
      let new_ptr = self.allocate(requested)?;
      ptr::copy_nonoverlapping(payload, new_ptr.as_ptr(), copyable);
      self.free(NonNull::new(payload));
      Some(new_ptr)
    }
  }
}
