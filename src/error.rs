//! OS primitive failures and the fatal-abort path.
//!
//! `segment_break`/`map` failures are unrecoverable for the operation in progress: the
//! core cannot continue correctly without the memory it asked for, and threading the
//! failure back through every call site above it would turn every allocation in the
//! host program into a fallible one. So, matching the original C allocator's `DIE()`
//! macro, a failure here logs and aborts the process rather than returning an error.

use std::fmt;

/// A failure reported by one of the four OS primitives the core depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsError {
  SegmentBreak,
  Map,
  Unmap,
}

impl OsError {
  fn primitive_name(self) -> &'static str {
    match self {
      OsError::SegmentBreak => "segment_break",
      OsError::Map => "map",
      OsError::Unmap => "unmap",
    }
  }
}

impl fmt::Display for OsError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} failed (errno: {})", self.primitive_name(), errno::errno())
  }
}

impl std::error::Error for OsError {}

/// Logs `err` and aborts the process. Called wherever a `segment_break` or `map`
/// failure is reached; never called for `unmap` failures, which are non-fatal.
pub(crate) fn fatal(err: OsError) -> ! {
  log::error!("rallocator: fatal OS primitive failure: {err}");
  std::process::abort();
}
