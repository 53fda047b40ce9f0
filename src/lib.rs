//! # rallocator - a best-fit user-space heap allocator
//!
//! This crate replaces the standard allocation interface (allocate, free,
//! zero-initialized allocate, resize) with a user-space implementation built directly
//! on two operating-system primitives: a program-break extension call that grows or
//! shrinks a contiguous data segment, and an anonymous memory-mapping call that reserves
//! independent page-aligned regions.
//!
//! ## Two arenas
//!
//! ```text
//!   ┌─────────────────────────────────────────────────────────────────────┐
//!   │                          SEGMENT ARENA                              │
//!   │   one contiguous region, grown via segment_break, carved into       │
//!   │   best-fit blocks that split and coalesce                          │
//!   │                                                                     │
//!   │   ┌──────────┬──────────┬──────────────────┬──────────┐            │
//!   │   │ in-use   │   FREE   │     in-use        │  FREE    │            │
//!   │   └──────────┴──────────┴──────────────────┴──────────┘            │
//!   └─────────────────────────────────────────────────────────────────────┘
//!
//!   ┌─────────────────────────────────────────────────────────────────────┐
//!   │                          MAPPED ARENA                               │
//!   │   independent regions, each its own `map` call, unmapped whole on   │
//!   │   free -- no FREE status ever persists here                        │
//!   │                                                                     │
//!   │   [ mapping A ]     [ mapping B ]     [ mapping C ]                 │
//!   └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Requests at or below a tunable threshold go to the segment arena; larger requests go
//! straight to a fresh mapping. The zeroing allocator uses a lower threshold (the page
//! size) than the non-zeroing one (128 KiB), since a freshly mapped page is already zero
//! and routing it to `mmap` sooner avoids an explicit clear.
//!
//! ## Block layout
//!
//! Every block -- allocated or free, in either arena -- begins with a fixed-size
//! [`header::Header`] immediately followed by its payload:
//!
//! ```text
//!   ┌────────────────────────┬───────────────────────────────┐
//!   │         Header         │            Payload             │
//!   │ size | status | prev | next        (aligned)            │
//!   └────────────────────────┴───────────────────────────────┘
//!   ▲                        ▲
//!   │                        └── pointer returned to the caller
//!   └── header address == payload address - HEADER_SIZE
//! ```
//!
//! ## Crate structure
//!
//! ```text
//!   rallocator
//!   ├── align      - alignment rounding
//!   ├── error      - OS-primitive-failure reporting and the fatal-abort path
//!   ├── os         - the Os trait + LibcOs (sbrk/mmap/munmap/sysconf)
//!   ├── header     - the intrusive block descriptor
//!   ├── list       - read-only arena-list traversal
//!   ├── tunables   - ALIGNMENT, thresholds, split guard
//!   ├── heap       - Heap<O>, the owning struct + public API
//!   ├── placement  - best-fit search, split, coalesce, growth (private methods on Heap)
//!   ├── lifetime   - free, resize (private methods on Heap)
//!   └── global     - the GlobalAlloc adapter over a process-wide Heap<LibcOs>
//! ```
//!
//! ## Quick start
//!
//! ```
//! use rallocator::{Heap, LibcOs};
//!
//! let mut heap = Heap::new(LibcOs);
//! let ptr = heap.allocate(64).expect("non-zero request always succeeds or aborts");
//! unsafe {
//!     ptr.as_ptr().cast::<u64>().write(42);
//!     assert_eq!(ptr.as_ptr().cast::<u64>().read(), 42);
//! }
//! heap.free(Some(ptr));
//! ```
//!
//! Or install it as the process allocator:
//!
//! ```ignore
//! #[global_allocator]
//! static ALLOCATOR: rallocator::Rallocator = rallocator::Rallocator;
//! ```
//!
//! ## Safety
//!
//! This crate manages memory manually and is single-threaded by design: no internal
//! locking, no atomics, and no support for reentrant allocation from a signal handler.
//! Callers must ensure a `Heap` (or the global singleton behind [`Rallocator`]) is only
//! ever driven from one thread at a time.

pub mod align;
pub mod error;
mod global;
pub mod header;
mod heap;
mod lifetime;
pub mod list;
pub mod os;
mod placement;
pub mod tunables;

pub use error::OsError;
pub use global::Rallocator;
pub use header::{Header, Status};
pub use heap::Heap;
pub use os::{LibcOs, Os};
pub use tunables::Tunables;
