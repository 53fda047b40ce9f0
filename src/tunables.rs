//! Configuration knobs. These are plain fields on a struct rather than compile-time
//! constants, so a host program can override them (e.g. a smaller `segment_prelude` for a
//! memory-constrained test harness) without forking the crate.

use crate::header::HEADER_SIZE;

const DEFAULT_ALIGNMENT: usize = 8;
const DEFAULT_SEGMENT_PRELUDE: usize = 128 * 1024;
const DEFAULT_MMAP_THRESHOLD_ALLOC: usize = 128 * 1024;

#[derive(Debug, Clone, Copy)]
pub struct Tunables {
  /// Payload alignment, in bytes. Must be a power of two.
  pub alignment: usize,
  /// The one-shot initial segment growth, performed on the very first segment-arena
  /// allocation.
  pub segment_prelude: usize,
  /// Arena-selection threshold for `allocate`.
  pub mmap_threshold_alloc: usize,
  /// Arena-selection threshold for `zero_allocate`.
  pub mmap_threshold_zero: usize,
  /// Minimum size of a split-off FREE remainder.
  pub min_split_remainder: usize,
}

impl Tunables {
  /// Builds the default tunable set, given the host's page size (used as
  /// `mmap_threshold_zero`: a freshly mapped page is already zero, so routing zeroing
  /// allocations to mmap at the page-size boundary avoids an explicit clear sooner than
  /// the non-zeroing threshold would).
  pub fn with_page_size(page_size: usize) -> Self {
    Self {
      alignment: DEFAULT_ALIGNMENT,
      segment_prelude: DEFAULT_SEGMENT_PRELUDE,
      mmap_threshold_alloc: DEFAULT_MMAP_THRESHOLD_ALLOC,
      mmap_threshold_zero: page_size,
      min_split_remainder: HEADER_SIZE + DEFAULT_ALIGNMENT,
    }
  }
}
