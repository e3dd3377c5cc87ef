//! Page geometry and TLB sizing.

/// Number of bits to shift to convert between bytes and 4 KiB pages.
pub const PAGE_SHIFT: u32 = 12;

/// Page size in bytes (4 KiB).
pub const PAGE_SIZE: u32 = 1 << PAGE_SHIFT;

/// Mask for extracting the page offset from an address.
pub const PAGE_OFFSET_MASK: u32 = PAGE_SIZE - 1;

/// Mask for extracting the 4 KiB frame bits from a 32-bit address.
pub const PAGE_FRAME_MASK: u32 = !PAGE_OFFSET_MASK;

/// Linear-address shift that selects a 4 MiB page (32-bit paging, PSE).
pub const LARGE_SHIFT_4M: u32 = 22;

/// Linear-address shift that selects a 2 MiB page (PAE paging).
pub const LARGE_SHIFT_2M: u32 = 21;

/// Low address bits copied verbatim into the physical address for 4 KiB pages.
pub const PASSTHROUGH_4K: u32 = 0x0000_0FFF;

/// Low address bits copied verbatim into the physical address for 2 MiB pages.
pub const PASSTHROUGH_2M: u32 = 0x001F_FFFF;

/// Low address bits copied verbatim into the physical address for 4 MiB pages.
pub const PASSTHROUGH_4M: u32 = 0x003F_FFFF;

/// Frame bits of a 2 MiB page.
pub const FRAME_MASK_2M: u32 = !PASSTHROUGH_2M;

/// Frame bits of a 4 MiB page, also the granularity of opposite-size purges.
pub const FRAME_MASK_4M: u32 = !PASSTHROUGH_4M;

/// Number of independent TLB sets (8 per size class).
pub const TLB_SETS: usize = 16;

/// Associativity of every TLB set.
pub const TLB_WAYS: usize = 4;

/// Total number of TLB entries.
pub const TLB_ENTRIES: usize = TLB_SETS * TLB_WAYS;
