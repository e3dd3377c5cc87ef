//! Linear and Physical Address types.
//!
//! This module defines strong types for the two address spaces the paging unit
//! sits between:
//! 1. **Type Safety:** A 32-bit linear address can never be handed to the bus by accident.
//! 2. **Index Extraction:** Helpers for the directory/table indices of both paging formats.
//! 3. **Width:** Physical addresses are 64-bit because PAE frames reach beyond 4 GiB.

use std::fmt;

/// A 32-bit linear address, as produced by segmentation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LinearAddr(pub u32);

/// A physical address on the emulated bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PhysAddr(pub u64);

impl LinearAddr {
    /// Creates a new linear address from a raw 32-bit value.
    #[inline(always)]
    pub const fn new(addr: u32) -> Self {
        Self(addr)
    }

    /// Returns the raw 32-bit address value.
    #[inline(always)]
    pub const fn val(self) -> u32 {
        self.0
    }

    /// Byte offset within a 4 KiB page.
    #[inline(always)]
    pub const fn page_offset(self) -> u32 {
        self.0 & 0xFFF
    }

    /// Page-directory index for 32-bit paging (bits 31:22).
    #[inline]
    pub const fn directory_index(self) -> u32 {
        (self.0 >> 22) & 0x3FF
    }

    /// Page-table index for 32-bit paging (bits 21:12).
    #[inline]
    pub const fn table_index(self) -> u32 {
        (self.0 >> 12) & 0x3FF
    }

    /// Page-directory-pointer index for PAE paging (bits 31:30).
    #[inline]
    pub const fn pae_pointer_index(self) -> u32 {
        self.0 >> 30
    }

    /// Page-directory index for PAE paging (bits 29:21).
    #[inline]
    pub const fn pae_directory_index(self) -> u32 {
        (self.0 >> 21) & 0x1FF
    }

    /// Page-table index for PAE paging (bits 20:12).
    #[inline]
    pub const fn pae_table_index(self) -> u32 {
        (self.0 >> 12) & 0x1FF
    }
}

impl PhysAddr {
    /// Creates a new physical address from a raw 64-bit value.
    #[inline(always)]
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Returns the raw 64-bit address value.
    #[inline(always)]
    pub const fn val(self) -> u64 {
        self.0
    }
}

impl From<u32> for LinearAddr {
    fn from(addr: u32) -> Self {
        Self(addr)
    }
}

impl fmt::Display for LinearAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

impl fmt::Display for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#011x}", self.0)
    }
}
