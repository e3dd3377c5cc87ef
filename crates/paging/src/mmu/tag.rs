//! TLB tag codec.
//!
//! A tag packs everything a lookup must match into one `u32`:
//!
//! ```text
//!  31                               12 11      8  7   6   5  3   2   1   0
//! +-----------------------------------+---------+---+---+-----+---+---+---+
//! |       linear frame (4 KiB)        |    0    | L | D |  0  | U | W | P |
//! +-----------------------------------+---------+---+---+-----+---+---+---+
//! ```
//!
//! The flag layout reuses the page-table bit positions for P, W, U
//! and D. `L` marks the large-page size class. Stored tags hold the frame bits
//! of the page they map, so a 4 MiB entry keeps bits 21:12 clear and compares
//! only the bits its address mask selects.
//!
//! This module also owns the TLB addressing functions:
//! 1. **Set selection:** Which of the 16 sets an address lands in for a size class.
//! 2. **Reverse index:** Which slot of the address-to-entry table represents it.
//! 3. **`locate`:** The single function that derives both, so they cannot drift.

use std::ops::Range;

use crate::arch::Privilege;
use crate::common::AccessType;
use crate::common::constants::{PAGE_FRAME_MASK, PAGE_SHIFT};

/// Tag bit: the entry holds a translation.
pub const TAG_PRESENT: u32 = 1 << 0;
/// Tag bit: writes were validated for this entry.
pub const TAG_WRITABLE: u32 = 1 << 1;
/// Tag bit: the entry was validated for a user-level accessor.
pub const TAG_USER: u32 = 1 << 2;
/// Tag bit: the page's dirty bit is known to be set in memory.
pub const TAG_DIRTY: u32 = 1 << 6;
/// Tag bit: the entry belongs to the large-page size class.
pub const TAG_LARGE: u32 = 1 << 7;

/// Bits a read probe does not care about.
pub const IGNORE_READ: u32 = TAG_WRITABLE | TAG_DIRTY;

/// Number of reverse-index slots for the 4 KiB class (one per 4 KiB page).
pub const SMALL_SLOTS: usize = 1 << 20;

/// Number of reverse-index slots for the large class (enough for 2 MiB pages).
pub const LARGE_SLOTS: usize = 1 << 11;

/// Total reverse-index slots.
pub const REVERSE_SLOTS: usize = SMALL_SLOTS + LARGE_SLOTS;

/// Sets per size class.
const SETS_PER_CLASS: usize = 8;

/// Page-size class used to partition the TLB.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SizeClass {
    /// 4 KiB pages.
    Small,
    /// 2 MiB (PAE) or 4 MiB (PSE) pages.
    Large,
}

impl SizeClass {
    /// The other size class.
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Small => Self::Large,
            Self::Large => Self::Small,
        }
    }

    /// Shift that turns a linear address into a page number of this class.
    #[inline(always)]
    pub const fn page_shift(self, large_shift: u32) -> u32 {
        match self {
            Self::Small => PAGE_SHIFT,
            Self::Large => large_shift,
        }
    }

    /// Frame bits of a page of this class.
    #[inline(always)]
    pub const fn addr_mask(self, large_shift: u32) -> u32 {
        !((1u32 << self.page_shift(large_shift)) - 1)
    }

    /// First set of this class.
    const fn set_base(self) -> usize {
        match self {
            Self::Small => 0,
            Self::Large => SETS_PER_CLASS,
        }
    }

    /// The sets belonging to this class.
    pub const fn sets(self) -> Range<usize> {
        self.set_base()..self.set_base() + SETS_PER_CLASS
    }
}

/// Packs a tag from a linear address and the attributes it was validated for.
///
/// Only the 4 KiB frame bits of `addr` are kept; callers that store a large
/// entry pass an address already reduced to the large frame.
///
/// # Arguments
///
/// * `addr` - Linear address.
/// * `writable` - Writes are permitted through this translation.
/// * `user` - The translation was validated for a user-level accessor.
/// * `dirty` - The page's dirty bit is set in memory.
/// * `size` - Size class of the translation.
#[inline(always)]
pub const fn generate_tag(addr: u32, writable: bool, user: bool, dirty: bool, size: SizeClass) -> u32 {
    let mut tag = (addr & PAGE_FRAME_MASK) | TAG_PRESENT;
    if writable {
        tag |= TAG_WRITABLE;
    }
    if user {
        tag |= TAG_USER;
    }
    if dirty {
        tag |= TAG_DIRTY;
    }
    if matches!(size, SizeClass::Large) {
        tag |= TAG_LARGE;
    }
    tag
}

/// Packs the tag of a prospective access.
///
/// Identical packing to [`generate_tag`]; kept separate so probe sites read as
/// "what this access needs" rather than "what an entry holds".
#[inline(always)]
pub const fn lwuds_tag(addr: u32, writable: bool, user: bool, dirty: bool, size: SizeClass) -> u32 {
    generate_tag(addr, writable, user, dirty, size)
}

/// Builds the probe tag and ignore mask for an access.
///
/// Reads match entries regardless of their writable and dirty bits. Writes
/// need an entry that is both writable and already dirty, so the first write to
/// a clean page misses and walks to set D. Supervisor probes ignore the user
/// bit: an entry validated for user level is never more permissive than what a
/// supervisor accessor would be granted.
pub const fn probe_tag(addr: u32, access: AccessType, privilege: Privilege, size: SizeClass) -> (u32, u32) {
    let write = access.is_write();
    let user = privilege.is_user();
    let tag = lwuds_tag(addr, write, user, write, size);

    let mut ignore = if write { 0 } else { IGNORE_READ };
    if !user {
        ignore |= TAG_USER;
    }
    (tag, ignore)
}

/// Returns the set an address maps to for a size class.
///
/// Three address bits just above the page offset pick one of eight sets; the
/// large class uses the upper eight.
#[inline(always)]
pub const fn select_set(addr: u32, size: SizeClass, large_shift: u32) -> usize {
    size.set_base() + ((addr >> size.page_shift(large_shift)) as usize & (SETS_PER_CLASS - 1))
}

/// Returns the reverse-index slot representing an address for a size class.
#[inline(always)]
pub const fn lookup_index(size: SizeClass, addr: u32, large_shift: u32) -> usize {
    match size {
        SizeClass::Small => (addr >> PAGE_SHIFT) as usize,
        SizeClass::Large => SMALL_SLOTS + (addr >> large_shift) as usize,
    }
}

/// Where a `(size, address)` pair lives in the TLB.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Slot {
    /// TLB set.
    pub set: usize,
    /// Reverse-index slot.
    pub index: usize,
}

/// Locates the set and reverse-index slot for an address.
///
/// Every insert, lookup, and eviction goes through this function so the set
/// bookkeeping and the reverse index always agree.
#[inline(always)]
pub const fn locate(size: SizeClass, addr: u32, large_shift: u32) -> Slot {
    Slot {
        set: select_set(addr, size, large_shift),
        index: lookup_index(size, addr, large_shift),
    }
}
