//! Collaborator interfaces consumed by the paging unit.
//!
//! The MMU does not own guest memory or the exception path. It borrows them per call:
//! 1. **`PagingBus`:** Physical reads and writes of paging structures, bus arbitration,
//!    and the termination and prefetch-recheck signals.
//! 2. **`FaultSink`:** Delivery of a `#PF` to the CPU core.
//!
//! Both are plain `&mut` trait objects so a harness can substitute recording mocks.

use crate::common::PageFault;

/// Physical memory and bus arbitration as seen by the page walker.
///
/// Addresses are physical and paging-oblivious. Only `read_u32` and `write_u32`
/// are required; the remaining methods default to what a bus without
/// arbitration or prefetch queue needs.
pub trait PagingBus {
    /// Reads a little-endian doubleword at a physical address.
    fn read_u32(&mut self, paddr: u64) -> u32;

    /// Writes a little-endian doubleword at a physical address.
    fn write_u32(&mut self, paddr: u64, val: u32);

    /// Reads a little-endian quadword as two doubleword reads (low half first).
    fn read_u64(&mut self, paddr: u64) -> u64 {
        let lo = u64::from(self.read_u32(paddr));
        let hi = u64::from(self.read_u32(paddr + 4));
        (hi << 32) | lo
    }

    /// Writes a little-endian quadword as two doubleword writes (low half first).
    ///
    /// The walker never calls this: accessed and dirty bits live in the low
    /// doubleword and are written back with [`PagingBus::write_u32`]. It is
    /// provided for embedders building PAE tables through the same bus.
    fn write_u64(&mut self, paddr: u64, val: u64) {
        self.write_u32(paddr, val as u32);
        self.write_u32(paddr + 4, (val >> 32) as u32);
    }

    /// Signals the end of a locked paging-structure update.
    fn terminate_access(&mut self) {}

    /// Asks the prefetch queue to revalidate bytes fetched through a stale translation.
    fn recheck_prefetch(&mut self) {}

    /// Tries to take the physical bus for a page walk. Must not block.
    ///
    /// Returns `false` when another agent owns the bus; the walk is then
    /// reported as pending and retried after the instruction restarts.
    fn try_acquire_bus(&mut self) -> bool {
        true
    }

    /// Releases the bus taken by a successful [`PagingBus::try_acquire_bus`].
    fn release_bus(&mut self) {}
}

/// Receiver of page faults raised by the walker.
pub trait FaultSink {
    /// Delivers a `#PF`. Called at most once per faulting access.
    fn raise_page_fault(&mut self, fault: PageFault);
}
