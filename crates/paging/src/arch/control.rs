//! Control register definitions.
//!
//! Only the bits the paging unit reacts to are modelled; the rest of each
//! register is carried through untouched.

/// CR0.PG: paging enable.
pub const CR0_PG: u32 = 1 << 31;

/// CR0.WP: supervisor writes honour read-only pages.
pub const CR0_WP: u32 = 1 << 16;

/// CR3 bits holding the page-directory base in 32-bit paging.
pub const CR3_PD_BASE_MASK: u32 = 0xFFFF_F000;

/// CR3 bits holding the page-directory-pointer-table base in PAE paging.
pub const CR3_PDPT_BASE_MASK: u32 = 0xFFFF_FFE0;

/// CR4.PSE: 4 MiB pages in 32-bit paging.
pub const CR4_PSE: u32 = 1 << 4;

/// CR4.PAE: physical address extension.
pub const CR4_PAE: u32 = 1 << 5;

/// CR4.PGE: global pages survive CR3 reloads.
pub const CR4_PGE: u32 = 1 << 7;

/// CR4 bits whose change invalidates every cached translation.
pub const CR4_PAGING_BITS: u32 = CR4_PSE | CR4_PAE | CR4_PGE;

/// CR0 bits whose change invalidates every cached translation.
pub const CR0_PAGING_BITS: u32 = CR0_PG | CR0_WP;

/// Snapshot of the control registers that steer translation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ControlRegisters {
    /// CR0.
    pub cr0: u32,
    /// CR3 (page-directory or PDPT base).
    pub cr3: u32,
    /// CR4.
    pub cr4: u32,
}

impl ControlRegisters {
    /// Returns `true` when CR0.PG is set.
    #[inline]
    pub const fn paging_enabled(&self) -> bool {
        self.cr0 & CR0_PG != 0
    }

    /// Returns `true` when CR0.WP is set.
    #[inline]
    pub const fn write_protect(&self) -> bool {
        self.cr0 & CR0_WP != 0
    }

    /// Returns `true` when CR4.PSE is set.
    #[inline]
    pub const fn pse(&self) -> bool {
        self.cr4 & CR4_PSE != 0
    }

    /// Returns `true` when CR4.PAE is set.
    #[inline]
    pub const fn pae(&self) -> bool {
        self.cr4 & CR4_PAE != 0
    }

    /// Returns `true` when CR4.PGE is set.
    #[inline]
    pub const fn pge(&self) -> bool {
        self.cr4 & CR4_PGE != 0
    }

    /// Physical base of the page directory (32-bit paging).
    #[inline]
    pub const fn page_directory_base(&self) -> u64 {
        (self.cr3 & CR3_PD_BASE_MASK) as u64
    }

    /// Physical base of the page-directory-pointer table (PAE paging).
    #[inline]
    pub const fn pdpt_base(&self) -> u64 {
        (self.cr3 & CR3_PDPT_BASE_MASK) as u64
    }
}
