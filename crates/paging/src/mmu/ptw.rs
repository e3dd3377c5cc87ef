//! Hardware Page Table Walker (PTW) for 32-bit and PAE paging.
//!
//! This module implements the two legacy x86 walk formats:
//! 1. **32-bit paging:** A 4-byte page-directory entry, then either a 4 MiB page
//!    (PS set with CR4.PSE) or a 4-byte page-table entry.
//! 2. **PAE paging:** An 8-byte PDPT entry, an 8-byte directory entry with a
//!    9-bit index, then either a 2 MiB page (PS set, regardless of CR4.PSE) or
//!    an 8-byte page-table entry.
//!
//! The walk only reads. Accessed and dirty bits are written back separately by
//! [`update_access_bits`], once the access has been fully validated, so a fault
//! never leaves a partial side effect behind.

use super::fault::{FaultKind, WalkLevel};
use super::protection::{AccessCheck, verify};
use super::tag::SizeClass;
use crate::arch::{ControlRegisters, Privilege};
use crate::bus::PagingBus;
use crate::common::constants::{FRAME_MASK_2M, FRAME_MASK_4M, PASSTHROUGH_2M, PASSTHROUGH_4K, PASSTHROUGH_4M};
use crate::common::{AccessType, LinearAddr};
use crate::config::CpuFeatures;

/// Present bit (bit 0).
const PTE_PRESENT_BIT: u64 = 1;

/// Read/write bit (bit 1).
const PTE_RW_BIT: u64 = 1 << 1;

/// User/supervisor bit (bit 2).
const PTE_US_BIT: u64 = 1 << 2;

/// Accessed bit (bit 5).
const PTE_ACCESSED_BIT: u64 = 1 << 5;

/// Dirty bit (bit 6).
const PTE_DIRTY_BIT: u64 = 1 << 6;

/// Page-size bit in a directory entry (bit 7).
const PTE_PS_BIT: u64 = 1 << 7;

/// Global bit (bit 8).
const PTE_GLOBAL_BIT: u64 = 1 << 8;

/// Frame bits of a 32-bit paging-structure entry.
const FRAME_MASK_32: u64 = 0xFFFF_F000;

/// Frame bits of a PAE paging-structure entry (36-bit physical addresses).
const FRAME_MASK_PAE: u64 = 0x0000_000F_FFFF_F000;

/// Frame bits of a 2 MiB PAE directory entry.
const FRAME_MASK_PAE_2M: u64 = 0x0000_000F_FFE0_0000;

/// Bits of a 4 MiB directory entry that must be zero without PSE-36.
const RSVD_4M: u64 = 0x003F_E000;

/// Bits of a 4 MiB directory entry that must be zero with PSE-36.
const RSVD_4M_PSE36: u64 = 0x003E_0000;

/// Bits of a 2 MiB PAE directory entry that must be zero.
const RSVD_2M: u64 = 0x001F_E000 | 0xFFFF_FFF0_0000_0000;

/// A strongly-typed wrapper around a raw paging-structure entry.
///
/// 32-bit entries are zero-extended.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PageTableEntry(pub u64);

impl PageTableEntry {
    /// Creates a new entry from a raw value.
    #[inline(always)]
    pub const fn new(val: u64) -> Self {
        Self(val)
    }

    /// Returns the underlying raw value.
    #[inline(always)]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Returns true if the Present (P) bit is set.
    pub const fn is_present(self) -> bool {
        self.0 & PTE_PRESENT_BIT != 0
    }

    /// Returns true if the Read/Write (R/W) bit is set.
    pub const fn is_writable(self) -> bool {
        self.0 & PTE_RW_BIT != 0
    }

    /// Returns true if the User/Supervisor (U/S) bit is set.
    pub const fn is_user(self) -> bool {
        self.0 & PTE_US_BIT != 0
    }

    /// Returns true if the Accessed (A) bit is set.
    pub const fn is_accessed(self) -> bool {
        self.0 & PTE_ACCESSED_BIT != 0
    }

    /// Returns true if the Dirty (D) bit is set.
    pub const fn is_dirty(self) -> bool {
        self.0 & PTE_DIRTY_BIT != 0
    }

    /// Returns true if the Page Size (PS) bit is set.
    pub const fn is_large(self) -> bool {
        self.0 & PTE_PS_BIT != 0
    }

    /// Returns true if the Global (G) bit is set.
    pub const fn is_global(self) -> bool {
        self.0 & PTE_GLOBAL_BIT != 0
    }

    /// Returns a new instance with the Accessed (A) bit set.
    pub const fn with_accessed(self) -> Self {
        Self(self.0 | PTE_ACCESSED_BIT)
    }

    /// Returns a new instance with the Dirty (D) bit set.
    pub const fn with_dirty(self) -> Self {
        Self(self.0 | PTE_DIRTY_BIT)
    }
}

/// Page size produced by a walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PageSize {
    /// 4 KiB page (either format).
    Size4K,
    /// 2 MiB page (PAE).
    Size2M,
    /// 4 MiB page (32-bit paging with PSE).
    Size4M,
}

impl PageSize {
    /// Low linear-address bits copied into the physical address.
    pub const fn passthrough_mask(self) -> u32 {
        match self {
            Self::Size4K => PASSTHROUGH_4K,
            Self::Size2M => PASSTHROUGH_2M,
            Self::Size4M => PASSTHROUGH_4M,
        }
    }

    /// Linear frame bits of a page of this size.
    pub const fn frame_mask(self) -> u32 {
        match self {
            Self::Size4K => !PASSTHROUGH_4K,
            Self::Size2M => FRAME_MASK_2M,
            Self::Size4M => FRAME_MASK_4M,
        }
    }

    /// TLB size class the page is cached in.
    pub const fn size_class(self) -> SizeClass {
        match self {
            Self::Size4K => SizeClass::Small,
            Self::Size2M | Self::Size4M => SizeClass::Large,
        }
    }
}

/// Paging mode in effect, derived from control registers and CPU features.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct WalkMode {
    /// PAE paging (CR4.PAE on a PAE-capable processor).
    pub pae: bool,
    /// 4 MiB pages in 32-bit paging (CR4.PSE on a PSE-capable processor).
    pub pse: bool,
    /// 4 MiB pages carry physical address bits 35:32.
    pub pse36: bool,
    /// Global pages (CR4.PGE on a PGE-capable processor).
    pub pge: bool,
    /// Supervisor writes honour R/W (CR0.WP on a 486 or later).
    pub write_protect: bool,
}

impl WalkMode {
    /// Derives the effective mode.
    ///
    /// Control bits the processor does not implement are ignored.
    pub const fn from_state(regs: &ControlRegisters, features: &CpuFeatures) -> Self {
        let pse = regs.pse() && features.pse;
        Self {
            pae: regs.pae() && features.pae,
            pse,
            pse36: pse && features.pse36,
            pge: regs.pge() && features.pge,
            write_protect: regs.write_protect() && features.write_protect,
        }
    }

    /// Returns `true` if the walker can produce large pages in this mode.
    pub const fn large_pages(&self) -> bool {
        self.pae || self.pse
    }
}

/// One paging-structure entry read during a walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntryRef {
    /// Physical address the entry was read from.
    pub addr: u64,
    /// The entry value.
    pub entry: PageTableEntry,
}

/// Result of a successful walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Walk {
    /// PDPT entry (PAE only).
    pub pdpte: Option<EntryRef>,
    /// Page-directory entry; the leaf for large pages.
    pub pde: EntryRef,
    /// Page-table entry (4 KiB pages only).
    pub pte: Option<EntryRef>,
    /// Size of the mapped page.
    pub size: PageSize,
    /// Physical base of the page.
    pub frame: u64,
    /// The translation may be cached as writable.
    pub writable: bool,
    /// The translation is global.
    pub global: bool,
}

impl Walk {
    /// The entry that maps the page.
    pub fn leaf(&self) -> EntryRef {
        self.pte.unwrap_or(self.pde)
    }

    /// Physical address of `addr` within the mapped page.
    pub const fn translate(&self, addr: LinearAddr) -> u64 {
        self.frame | (addr.val() & self.size.passthrough_mask()) as u64
    }
}

/// Why a walk stopped, with the entries read up to that point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WalkFailure {
    /// Kind of fault.
    pub kind: FaultKind,
    /// Level at which the walk stopped.
    pub level: WalkLevel,
    /// PDPT entry, if read.
    pub pdpte: Option<u64>,
    /// Page-directory entry, if read.
    pub pde: Option<u64>,
    /// Page-table entry, if read.
    pub pte: Option<u64>,
}

/// Entries read so far, used to build a [`WalkFailure`].
#[derive(Clone, Copy, Default)]
struct Trail {
    pdpte: Option<u64>,
    pde: Option<u64>,
    pte: Option<u64>,
}

impl Trail {
    const fn fail(self, kind: FaultKind, level: WalkLevel) -> WalkFailure {
        WalkFailure {
            kind,
            level,
            pdpte: self.pdpte,
            pde: self.pde,
            pte: self.pte,
        }
    }
}

/// Walks the page tables for one access.
///
/// Reads paging structures through `bus` but never writes them.
///
/// # Arguments
///
/// * `bus` - Physical memory holding the paging structures.
/// * `regs` - Control registers (CR3 supplies the root).
/// * `mode` - Effective paging mode.
/// * `addr` - Linear address to translate.
/// * `access` - Read or write.
/// * `privilege` - Privilege of the accessor.
///
/// # Errors
///
/// Returns a [`WalkFailure`] describing the first not-present entry, reserved
/// bit violation, or protection denial encountered.
pub fn walk(
    bus: &mut dyn PagingBus,
    regs: &ControlRegisters,
    mode: &WalkMode,
    addr: LinearAddr,
    access: AccessType,
    privilege: Privilege,
) -> Result<Walk, WalkFailure> {
    let mut trail = Trail::default();

    let (pdpte, pde) = if mode.pae {
        let pdpte_addr = regs.pdpt_base() + u64::from(addr.pae_pointer_index()) * 8;
        let pdpte = PageTableEntry::new(bus.read_u64(pdpte_addr));
        trail.pdpte = Some(pdpte.raw());
        if !pdpte.is_present() {
            return Err(trail.fail(FaultKind::NotPresent, WalkLevel::DirectoryPointer));
        }

        let pde_addr = (pdpte.raw() & FRAME_MASK_PAE) + u64::from(addr.pae_directory_index()) * 8;
        let pde = PageTableEntry::new(bus.read_u64(pde_addr));
        (
            Some(EntryRef {
                addr: pdpte_addr,
                entry: pdpte,
            }),
            EntryRef {
                addr: pde_addr,
                entry: pde,
            },
        )
    } else {
        let pde_addr = regs.page_directory_base() + u64::from(addr.directory_index()) * 4;
        let pde = PageTableEntry::new(u64::from(bus.read_u32(pde_addr)));
        (
            None,
            EntryRef {
                addr: pde_addr,
                entry: pde,
            },
        )
    };

    trail.pde = Some(pde.entry.raw());
    if !pde.entry.is_present() {
        return Err(trail.fail(FaultKind::NotPresent, WalkLevel::Directory));
    }

    let large = pde.entry.is_large() && (mode.pae || mode.pse);
    let (size, frame, pte) = if large {
        let (size, reserved, frame) = if mode.pae {
            (PageSize::Size2M, RSVD_2M, pde.entry.raw() & FRAME_MASK_PAE_2M)
        } else if mode.pse36 {
            let high = ((pde.entry.raw() >> 13) & 0xF) << 32;
            (PageSize::Size4M, RSVD_4M_PSE36, (pde.entry.raw() & u64::from(FRAME_MASK_4M)) | high)
        } else {
            (PageSize::Size4M, RSVD_4M, pde.entry.raw() & u64::from(FRAME_MASK_4M))
        };
        if pde.entry.raw() & reserved != 0 {
            return Err(trail.fail(FaultKind::ReservedBit, WalkLevel::Directory));
        }
        (size, frame, None)
    } else {
        let (pte_addr, pte) = if mode.pae {
            let pte_addr = (pde.entry.raw() & FRAME_MASK_PAE) + u64::from(addr.pae_table_index()) * 8;
            (pte_addr, PageTableEntry::new(bus.read_u64(pte_addr)))
        } else {
            let pte_addr = (pde.entry.raw() & FRAME_MASK_32) + u64::from(addr.table_index()) * 4;
            (pte_addr, PageTableEntry::new(u64::from(bus.read_u32(pte_addr))))
        };
        trail.pte = Some(pte.raw());
        if !pte.is_present() {
            return Err(trail.fail(FaultKind::NotPresent, WalkLevel::Table));
        }
        let frame_mask = if mode.pae { FRAME_MASK_PAE } else { FRAME_MASK_32 };
        (
            PageSize::Size4K,
            pte.raw() & frame_mask,
            Some(EntryRef {
                addr: pte_addr,
                entry: pte,
            }),
        )
    };

    let leaf = pte.map_or(pde.entry, |pte| pte.entry);
    let verdict = verify(&AccessCheck {
        write: access.is_write(),
        user: privilege.is_user(),
        dir_rw: pde.entry.is_writable(),
        dir_us: pde.entry.is_user(),
        table_rw: leaf.is_writable(),
        table_us: leaf.is_user(),
        write_protect: mode.write_protect,
    });
    if !verdict.granted {
        let level = if pte.is_some() { WalkLevel::Table } else { WalkLevel::Directory };
        return Err(trail.fail(FaultKind::Protection, level));
    }

    Ok(Walk {
        pdpte,
        pde,
        pte,
        size,
        frame,
        writable: verdict.writable_for_cache,
        global: mode.pge && leaf.is_global(),
    })
}

/// Sets the accessed bit on every level of `walk`, and the dirty bit on the
/// leaf for writes, writing back only entries that changed.
///
/// Only the low doubleword of an entry holds A and D, so each modified level
/// costs one `write_u32` followed by `terminate_access`. The updated values
/// are stored back into `walk`.
///
/// Returns the leaf's dirty bit after the update.
pub fn update_access_bits(bus: &mut dyn PagingBus, walk: &mut Walk, access: AccessType) -> bool {
    let write = access.is_write();

    match walk.pte.as_mut() {
        Some(pte) => {
            let pde = walk.pde.entry.with_accessed();
            write_back(bus, &mut walk.pde, pde);
            let mut updated = pte.entry.with_accessed();
            if write {
                updated = updated.with_dirty();
            }
            write_back(bus, pte, updated);
        }
        None => {
            let mut updated = walk.pde.entry.with_accessed();
            if write {
                updated = updated.with_dirty();
            }
            write_back(bus, &mut walk.pde, updated);
        }
    }

    walk.leaf().entry.is_dirty()
}

fn write_back(bus: &mut dyn PagingBus, slot: &mut EntryRef, updated: PageTableEntry) {
    if updated == slot.entry {
        return;
    }
    bus.write_u32(slot.addr, updated.raw() as u32);
    bus.terminate_access();
    slot.entry = updated;
}
