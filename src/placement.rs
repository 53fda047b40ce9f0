//! Best-fit placement with splitting, coalescing, and last-block expansion.
//!
//! The best-fit scan, the `need + MIN_SPLIT_REMAINDER` split guard, and the
//! last-block-extends-or-appends miss path mirror a classic segment-break allocator,
//! re-expressed over `*mut Header` in raw-pointer `unsafe` style instead of `void *`
//! arithmetic.

use std::ptr;

use crate::error::fatal;
use crate::header::{init_header, Header, Status};
use crate::heap::Heap;
use crate::list;
use crate::os::Os;

impl<O: Os> Heap<O> {
  /// Places a `need`-byte (header-inclusive) block in the segment arena, growing the
  /// segment via the OS primitive if no free block fits.
  pub(crate) fn segment_allocate(&mut self, need: usize) -> *mut u8 {
    if self.segment_head.is_null() {
      return self.segment_prelude(need);
    }

    self.coalesce_segment();

    if let Some(block) = self.best_fit(need) {
      return unsafe { self.place_in_segment_block(block, need) };
    }

    self.extend_segment_tail(need)
  }

  /// First-ever segment allocation: grows the segment by `segment_prelude` in one shot
  /// and carves the request off its front. `need` is always
  /// `<= segment_prelude` here because arena selection already routed anything larger
  /// to the mapped arena, and `mmap_threshold_alloc == segment_prelude` by default.
  fn segment_prelude(&mut self, need: usize) -> *mut u8 {
    debug_assert!(need <= self.tunables.segment_prelude);
    let prelude = self.tunables.segment_prelude;
    let raw = self.os.segment_break(prelude as isize).unwrap_or_else(|e| fatal(e));

    let block = unsafe { init_header(raw, need, Status::InUseSegment) };
    self.segment_head = block;

    let remainder = prelude - need;
    if remainder >= self.tunables.min_split_remainder {
      let remainder_addr = unsafe { raw.add(need) };
      let remainder_block = unsafe { init_header(remainder_addr, remainder, Status::Free) };
      unsafe {
        (*remainder_block).prev = block;
        (*block).next = remainder_block;
      }
    }

    unsafe { Header::payload(block) }
  }

  /// Sweeps the segment list left to right, merging every run of adjacent FREE blocks
  /// into one. Also called directly by `free`, which needs coalescing to run between
  /// calls, not only before a placement search.
  pub(crate) fn coalesce_segment(&mut self) {
    let mut current = self.segment_head;
    unsafe {
      while !current.is_null() {
        let next = (*current).next;
        if (*current).status == Status::Free && !next.is_null() && (*next).status == Status::Free {
          (*current).size += (*next).size;
          let next_next = (*next).next;
          (*current).next = next_next;
          if !next_next.is_null() {
            (*next_next).prev = current;
          }
          continue; // re-check `current` against its new neighbor.
        }
        current = next;
      }
    }
  }

  /// Scans the segment list for the smallest FREE block whose size is `>= need`, ties
  /// broken by address order.
  fn best_fit(&self, need: usize) -> Option<*mut Header> {
    let mut current = self.segment_head;
    let mut best: *mut Header = ptr::null_mut();
    unsafe {
      while !current.is_null() {
        if (*current).status == Status::Free && (*current).size >= need {
          if best.is_null() || (*current).size < (*best).size {
            best = current;
          }
        }
        current = (*current).next;
      }
    }
    if best.is_null() {
      None
    } else {
      Some(best)
    }
  }

  /// Claims `block` for a `need`-byte allocation, splitting off a FREE remainder when
  /// the leftover would be at least `min_split_remainder`.
  ///
  /// # Safety
  /// `block` must be a live FREE segment descriptor with `size >= need`.
  unsafe fn place_in_segment_block(&mut self, block: *mut Header, need: usize) -> *mut u8 {
    unsafe {
      let size = (*block).size;
      if size >= need + self.tunables.min_split_remainder {
        self.split_off_remainder(block, need);
      }
      (*block).status = Status::InUseSegment;
      Header::payload(block)
    }
  }

  /// Splits `block` (size `s`) into an allocated head of `need` bytes and a FREE
  /// remainder of `s - need` bytes, spliced in after `block`. Caller is responsible for
  /// having already checked `s >= need + min_split_remainder` and for setting `block`'s
  /// final status.
  ///
  /// # Safety
  /// `block` must be a live segment descriptor with `size >= need + min_split_remainder`.
  pub(crate) unsafe fn split_off_remainder(&mut self, block: *mut Header, need: usize) {
    unsafe {
      let size = (*block).size;
      let remainder_size = size - need;
      let remainder_addr = (block as *mut u8).add(need);
      let remainder = init_header(remainder_addr, remainder_size, Status::Free);
      (*remainder).prev = block;
      (*remainder).next = (*block).next;
      if !(*remainder).next.is_null() {
        (*(*remainder).next).prev = remainder;
      }
      (*block).next = remainder;
      (*block).size = need;
    }
  }

  /// No free block fit: either extend the FREE tail in place, or append a fresh block
  /// after an IN-USE tail.
  fn extend_segment_tail(&mut self, need: usize) -> *mut u8 {
    let tail = unsafe { list::last(self.segment_head) };
    debug_assert!(!tail.is_null(), "segment list is non-empty once the prelude has run");

    unsafe {
      if (*tail).status == Status::Free {
        let extra = need - (*tail).size;
        self.os.segment_break(extra as isize).unwrap_or_else(|e| fatal(e));
        (*tail).size = need;
        (*tail).status = Status::InUseSegment;
        Header::payload(tail)
      } else {
        let raw = self.os.segment_break(need as isize).unwrap_or_else(|e| fatal(e));
        let block = init_header(raw, need, Status::InUseSegment);
        (*block).prev = tail;
        (*tail).next = block;
        Header::payload(block)
      }
    }
  }

  /// Places a fresh `need`-byte mapping, appending it to the mapped list.
  pub(crate) fn mapped_allocate(&mut self, need: usize) -> *mut u8 {
    let raw = self.os.map(need).unwrap_or_else(|e| fatal(e));
    let block = unsafe { init_header(raw, need, Status::InUseMapped) };

    let tail = unsafe { list::last(self.mapped_head) };
    if tail.is_null() {
      self.mapped_head = block;
    } else {
      unsafe {
        (*block).prev = tail;
        (*tail).next = block;
      }
    }

    unsafe { Header::payload(block) }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::os::fake::FakeOs;

  fn heap() -> Heap<FakeOs> {
    Heap::new(FakeOs::new(4096))
  }

  fn header_of(heap: &Heap<FakeOs>, payload: *mut u8) -> *mut Header {
    unsafe { list::find_by_payload(heap.segment_head, payload).expect("block must exist") }
  }

  #[test]
  fn first_allocation_grows_segment_by_prelude_and_leaves_a_remainder() {
    let mut heap = heap();
    let ptr = heap.allocate(64).unwrap();

    assert_eq!(heap.segment_head, header_of(&heap, ptr.as_ptr()));
    unsafe {
      assert_eq!((*heap.segment_head).status, Status::InUseSegment);
      let need = heap.need_for(64);
      assert_eq!((*heap.segment_head).size, need);

      let remainder = (*heap.segment_head).next;
      assert!(!remainder.is_null());
      assert_eq!((*remainder).status, Status::Free);
      assert_eq!((*remainder).size, heap.tunables.segment_prelude - need);
    }
  }

  #[test]
  fn best_fit_picks_the_tight_block_not_the_loose_one() {
    let mut heap = heap();
    let a = heap.allocate(100).unwrap();
    let b = heap.allocate(200).unwrap();
    let _c = heap.allocate(100).unwrap();

    heap.free(Some(a));
    heap.free(Some(b));

    let hit = heap.allocate(90).unwrap();
    assert_eq!(hit.as_ptr(), a.as_ptr());
  }

  #[test]
  fn coalesce_merges_adjacent_frees_before_the_next_search() {
    let mut heap = heap();
    let a = heap.allocate(100).unwrap();
    let b = heap.allocate(100).unwrap();
    let c = heap.allocate(100).unwrap();

    heap.free(Some(b));
    heap.free(Some(a));

    // a+b coalesced must now fit a request too big for either alone.
    let hit = heap.allocate(180).unwrap();
    assert_eq!(hit.as_ptr(), a.as_ptr());

    // c untouched.
    unsafe {
      let c_header = Header::from_payload(c.as_ptr());
      assert_eq!((*c_header).status, Status::InUseSegment);
    }
  }

  #[test]
  fn allocation_above_threshold_goes_to_mapped_arena() {
    let mut heap = heap();
    let ptr = heap.allocate(200_000).unwrap();
    assert!(!heap.mapped_head.is_null());
    unsafe {
      let block = Header::from_payload(ptr.as_ptr());
      assert_eq!((*block).status, Status::InUseMapped);
    }
  }

  #[test]
  fn zero_allocate_clears_segment_payload() {
    let mut heap = heap();
    let ptr = heap.allocate(64).unwrap();
    unsafe {
      ptr::write_bytes(ptr.as_ptr(), 0xAB, 64);
    }
    heap.free(Some(ptr));

    let zeroed = heap.zero_allocate(8, 8).unwrap();
    let bytes = unsafe { std::slice::from_raw_parts(zeroed.as_ptr(), 64) };
    assert!(bytes.iter().all(|&b| b == 0));
  }

  #[test]
  fn zero_allocate_rejects_overflowing_product() {
    let mut heap = heap();
    assert!(heap.zero_allocate(usize::MAX, 2).is_none());
  }

  #[test]
  fn zero_size_allocate_returns_none() {
    let mut heap = heap();
    assert!(heap.allocate(0).is_none());
  }

  #[test]
  fn extend_segment_tail_grows_a_free_tail_in_place() {
    let mut heap = heap();
    let _a = heap.allocate(64).unwrap();

    let remainder = unsafe { (*heap.segment_head).next };
    assert!(!remainder.is_null());
    assert_eq!(unsafe { (*remainder).status }, Status::Free);
    let remainder_size = unsafe { (*remainder).size };

    // the remainder's own `size` can't satisfy a request for that many payload
    // bytes (it would also need room for a header), forcing the free-tail-extend
    // branch rather than a best-fit hit.
    let request = remainder_size;
    let ptr = heap.allocate(request).unwrap();

    unsafe {
      let tail = list::last(heap.segment_head);
      assert_eq!(tail, remainder, "tail grows in place rather than a new node appended");
      assert_eq!(Header::from_payload(ptr.as_ptr()), tail);
      assert_eq!((*tail).status, Status::InUseSegment);
      assert_eq!((*tail).size, heap.need_for(request));
    }
  }

  #[test]
  fn extend_segment_tail_appends_after_an_in_use_tail() {
    let mut heap = heap();
    let header_size = heap.need_for(0);

    // consume the entire prelude as a single in-use block, leaving no remainder.
    let exact_fill = heap.tunables.segment_prelude - header_size;
    let first = heap.allocate(exact_fill).unwrap();
    unsafe {
      assert_eq!((*heap.segment_head).size, heap.tunables.segment_prelude);
      assert!((*heap.segment_head).next.is_null());
    }

    let second = heap.allocate(64).unwrap();
    unsafe {
      let first_header = Header::from_payload(first.as_ptr());
      let second_header = Header::from_payload(second.as_ptr());
      assert_eq!((*first_header).next, second_header);
      assert_eq!(second_header as usize, first_header as usize + (*first_header).size);
      assert_eq!((*second_header).status, Status::InUseSegment);
    }
  }
}
