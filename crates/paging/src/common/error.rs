//! Page fault and translation error definitions.
//!
//! This module defines how a translation can fail:
//! 1. **Page Fault:** The guest-visible `#PF` payload (CR2 value and error code).
//! 2. **Pending:** The physical bus was busy; the instruction must be restarted.
//! 3. **No Translation:** A prefetch or fault-suppressing probe could not be satisfied.

use std::fmt;

use thiserror::Error;

/// `#PF` details: the value for CR2 and the pushed error code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PageFault {
    /// Faulting linear address (CR2).
    pub addr: u32,
    /// Error code as defined by the Intel SDM.
    pub error_code: u32,
}

impl PageFault {
    /// P: the fault was a protection violation on a present page.
    pub const EC_P: u32 = 1 << 0;
    /// W/R: the access was a write.
    pub const EC_WR: u32 = 1 << 1;
    /// U/S: the access originated at user level.
    pub const EC_US: u32 = 1 << 2;
    /// RSVD: a reserved bit was set in a paging-structure entry.
    pub const EC_RSVD: u32 = 1 << 3;

    /// Builds a fault payload from its individual error-code bits.
    pub const fn new(addr: u32, present: bool, write: bool, user: bool, rsvd: bool) -> Self {
        let mut error_code = 0;
        if present {
            error_code |= Self::EC_P;
        }
        if write {
            error_code |= Self::EC_WR;
        }
        if user {
            error_code |= Self::EC_US;
        }
        if rsvd {
            error_code |= Self::EC_RSVD;
        }
        Self { addr, error_code }
    }

    /// Returns `true` if the page was present (protection or reserved-bit fault).
    pub const fn is_protection(&self) -> bool {
        self.error_code & Self::EC_P != 0
    }

    /// Returns `true` if the faulting access was a write.
    pub const fn is_write(&self) -> bool {
        self.error_code & Self::EC_WR != 0
    }

    /// Returns `true` if the faulting access was made at user level.
    pub const fn is_user(&self) -> bool {
        self.error_code & Self::EC_US != 0
    }

    /// Returns `true` if a reserved bit was set.
    pub const fn is_reserved_bit(&self) -> bool {
        self.error_code & Self::EC_RSVD != 0
    }
}

impl fmt::Display for PageFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#PF at {:#010x} (error code {:#x}: {}, {}, {}{})",
            self.addr,
            self.error_code,
            if self.is_protection() { "protection" } else { "not present" },
            if self.is_write() { "write" } else { "read" },
            if self.is_user() { "user" } else { "supervisor" },
            if self.is_reserved_bit() { ", reserved bit" } else { "" },
        )
    }
}

impl std::error::Error for PageFault {}

/// Why a call to `Mmu::translate` did not produce a physical address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum TranslateError {
    /// The physical bus could not be acquired for the page walk.
    ///
    /// Nothing was modified; the caller rewinds the instruction and retries.
    #[error("physical bus busy, page walk deferred")]
    Pending,

    /// The walk failed and the fault was delivered to the fault sink.
    #[error(transparent)]
    PageFault(#[from] PageFault),

    /// A prefetch or fault-suppressing probe could not be translated.
    ///
    /// No fault was dispatched and no guest-visible state changed.
    #[error("no translation for {0:#010x}")]
    NoTranslation(u32),
}

impl TranslateError {
    /// Returns the page fault payload, if this error carries one.
    pub const fn page_fault(&self) -> Option<PageFault> {
        match self {
            Self::PageFault(fault) => Some(*fault),
            Self::Pending | Self::NoTranslation(_) => None,
        }
    }
}
