//! Read-only traversal over an arena's intrusive list.
//!
//! Splicing is not factored into a shared helper here: every insertion site already
//! needs to touch the new node's own links, the predecessor's `next`, and (for the
//! mapped list) the successor's `prev` all in one place, and a generic splice helper
//! would need the same handful of arguments as doing it inline.

use crate::header::Header;

/// The tail of `head`'s list, or null if the list is empty.
///
/// # Safety
/// `head` must be null or point to the first node of a well-formed, null-terminated
/// singly-or-doubly-linked chain of `Header`s.
pub unsafe fn last(head: *mut Header) -> *mut Header {
  if head.is_null() {
    return head;
  }
  let mut current = head;
  unsafe {
    while !(*current).next.is_null() {
      current = (*current).next;
    }
  }
  current
}

/// The descriptor in `head`'s list whose payload address equals `payload`, if any.
///
/// # Safety
/// `head` must be null or point to the first node of a well-formed chain of `Header`s.
pub unsafe fn find_by_payload(head: *mut Header, payload: *mut u8) -> Option<*mut Header> {
  let mut current = head;
  unsafe {
    while !current.is_null() {
      if Header::payload(current) == payload {
        return Some(current);
      }
      current = (*current).next;
    }
  }
  None
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::header::{init_header, Status};

  #[test]
  fn last_of_empty_list_is_null() {
    unsafe {
      assert!(last(std::ptr::null_mut()).is_null());
    }
  }

  #[test]
  fn last_walks_to_the_tail() {
    let mut a = [0u8; 64];
    let mut b = [0u8; 64];
    unsafe {
      let a_header = init_header(a.as_mut_ptr(), 64, Status::InUseSegment);
      let b_header = init_header(b.as_mut_ptr(), 64, Status::InUseSegment);
      (*a_header).next = b_header;
      (*b_header).prev = a_header;
      assert_eq!(last(a_header), b_header);
    }
  }

  #[test]
  fn find_by_payload_locates_matching_node() {
    let mut a = [0u8; 64];
    let mut b = [0u8; 64];
    unsafe {
      let a_header = init_header(a.as_mut_ptr(), 64, Status::InUseSegment);
      let b_header = init_header(b.as_mut_ptr(), 64, Status::InUseSegment);
      (*a_header).next = b_header;
      (*b_header).prev = a_header;

      let b_payload = Header::payload(b_header);
      assert_eq!(find_by_payload(a_header, b_payload), Some(b_header));

      let foreign = [0u8; 8];
      assert_eq!(find_by_payload(a_header, foreign.as_ptr() as *mut u8), None);
    }
  }
}
