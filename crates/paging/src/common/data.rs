//! Memory Access Types.
//!
//! This module defines the classification of memory accesses presented to the
//! paging unit. These types are used for the following:
//! 1. **Permission Validation:** Read and write accesses follow different protection rules.
//! 2. **Fault Generation:** The `W/R` bit of the `#PF` error code.
//! 3. **Probe Control:** Prefetch and fault-suppressing probes issued by the pipeline.

/// Type of memory access operation.
///
/// x86 without NX has no separate execute permission, so instruction fetches
/// are presented as reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessType {
    /// Data read or instruction fetch.
    Read,

    /// Data write, including the write half of a read-modify-write.
    Write,
}

impl AccessType {
    /// Returns `true` for write accesses.
    #[inline(always)]
    pub const fn is_write(self) -> bool {
        matches!(self, Self::Write)
    }
}

/// Flags that change how a translation miss is handled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ProbeFlags {
    /// Speculative prefetch: a full TLB miss aborts before touching the bus.
    pub prefetch: bool,

    /// Walk on a miss, but report failures as [`TranslateError::NoTranslation`]
    /// instead of dispatching a page fault.
    ///
    /// [`TranslateError::NoTranslation`]: super::TranslateError::NoTranslation
    pub suppress_fault: bool,
}

impl ProbeFlags {
    /// An ordinary architectural access.
    pub const NONE: Self = Self {
        prefetch: false,
        suppress_fault: false,
    };

    /// Instruction prefetch: cache-only, never faults.
    pub const PREFETCH: Self = Self {
        prefetch: true,
        suppress_fault: true,
    };

    /// Full walk that never dispatches a fault.
    pub const NO_FAULT: Self = Self {
        prefetch: false,
        suppress_fault: true,
    };
}
