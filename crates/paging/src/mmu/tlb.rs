//! Translation Lookaside Buffer (TLB).
//!
//! A 16-set, 4-way set-associative cache of linear-to-physical translations.
//! Sets 0-7 hold 4 KiB pages and sets 8-15 hold large pages (4 MiB, or 2 MiB
//! under PAE), so a lookup is only ever compared against entries of its own
//! granularity. Replacement is true LRU per set, kept by the list allocator in
//! [`super::lists`].
//!
//! Entries are found through the pool's reverse index rather than by scanning
//! a set; each `(size, address)` pair therefore occupies at most one way.

use super::lists::{EntryId, EntryPool, ListKind};
use super::tag::{SizeClass, TAG_PRESENT, generate_tag, locate};
use crate::common::constants::{
    FRAME_MASK_4M, LARGE_SHIFT_2M, LARGE_SHIFT_4M, PAGE_OFFSET_MASK, TLB_SETS, TLB_WAYS,
};
use crate::stats::TlbStats;

/// A single cached translation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TlbEntry {
    /// Physical base of the page, already shifted into place.
    pub data: u64,
    /// Packed lookup key; zero while the entry is free.
    pub tag: u32,
    /// Frame bits compared on lookup.
    pub addr_mask: u32,
    /// `addr_mask` with the low 12 bits (the tag flags) set.
    pub addr_mask_set: u32,
    /// Low linear-address bits copied verbatim into the physical address.
    pub passthrough_mask: u32,
    /// Survives `flush(true)`.
    pub is_global: bool,
    /// The entry maps a 2 MiB PAE page.
    pub is_2mb: bool,
}

/// A successful TLB lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TlbHit {
    /// Physical base of the page.
    pub data: u64,
    /// Low linear-address bits copied into the result.
    pub passthrough_mask: u32,
    /// Way within the set that matched.
    pub way: usize,
}

impl TlbHit {
    /// Combines the cached frame with the offset bits of `addr`.
    #[inline(always)]
    pub const fn translate(&self, addr: u32) -> u64 {
        self.data | (addr & self.passthrough_mask) as u64
    }
}

/// Everything needed to install one translation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InsertRequest {
    /// Linear address inside the page.
    pub addr: u32,
    /// Writes are permitted through this translation.
    pub writable: bool,
    /// Validated for a user-level accessor.
    pub user: bool,
    /// The page's dirty bit is set in memory.
    pub dirty: bool,
    /// Size class of the page.
    pub size: SizeClass,
    /// Exempt from non-global flushes.
    pub global: bool,
    /// Low linear-address bits copied into the physical address.
    pub passthrough_mask: u32,
    /// The page is a 2 MiB PAE page.
    pub is_2mb: bool,
    /// Physical base of the page.
    pub data: u64,
}

/// Set-associative TLB with per-set LRU replacement.
#[derive(Clone, Debug)]
pub struct Tlb {
    pool: EntryPool,
    pae: bool,
    large_pages: bool,
    large_shift: u32,
    prefetch_stale: bool,
    pub(crate) stats: TlbStats,
}

impl Default for Tlb {
    fn default() -> Self {
        Self::new()
    }
}

impl Tlb {
    /// Creates an empty TLB configured for 32-bit paging without large pages.
    pub fn new() -> Self {
        Self {
            pool: EntryPool::new(),
            pae: false,
            large_pages: false,
            large_shift: LARGE_SHIFT_4M,
            prefetch_stale: false,
            stats: TlbStats::default(),
        }
    }

    /// Drops every entry and reconfigures the large-page geometry.
    ///
    /// # Arguments
    ///
    /// * `pae` - PAE paging is active; large pages are 2 MiB.
    /// * `large_pages` - Large pages can be produced by the walker at all.
    pub fn reinit(&mut self, pae: bool, large_pages: bool) {
        self.pool.reset();
        self.pae = pae;
        self.large_pages = large_pages;
        self.large_shift = if pae { LARGE_SHIFT_2M } else { LARGE_SHIFT_4M };
        self.prefetch_stale = true;
        tracing::debug!(pae, large_pages, "TLB reinitialized");
    }

    /// Returns `true` if the TLB is configured for PAE paging.
    pub const fn pae(&self) -> bool {
        self.pae
    }

    /// Returns `true` if the large-page sets are in use.
    pub const fn large_pages(&self) -> bool {
        self.large_pages
    }

    /// Address shift of a large page: 22 for 4 MiB, 21 for 2 MiB.
    pub const fn large_shift(&self) -> u32 {
        self.large_shift
    }

    /// Looks up a translation.
    ///
    /// The stored tag and `probe` are compared under
    /// `!ignore_mask & entry.addr_mask_set`. A hit becomes the newest entry of
    /// its set.
    ///
    /// # Arguments
    ///
    /// * `addr` - Linear address being translated.
    /// * `probe` - Tag of the access, from [`super::tag::probe_tag`].
    /// * `size` - Size class to search.
    /// * `ignore_mask` - Tag bits the access does not care about.
    #[inline(always)]
    pub fn lookup(&mut self, addr: u32, probe: u32, size: SizeClass, ignore_mask: u32) -> Option<TlbHit> {
        let slot = locate(size, addr, self.large_shift);
        let id = self.pool.find(slot.index)?;
        let entry = *self.pool.entry(id);

        let mask = !ignore_mask & entry.addr_mask_set;
        #[cfg(feature = "always-trace")]
        tracing::trace!(addr, probe, stored = entry.tag, mask, "TLB probe");
        if entry.tag & mask != probe & mask {
            return None;
        }

        self.pool.touch(id);
        Some(TlbHit {
            data: entry.data,
            passthrough_mask: entry.passthrough_mask,
            way: id % TLB_WAYS,
        })
    }

    /// Installs a translation.
    ///
    /// With `way` set, that way of the address's set is overwritten
    /// unconditionally and any other way mapping the same address is freed.
    /// Otherwise an existing entry for the address is reused whatever its
    /// attributes, and failing that the set's LRU way is replaced.
    pub fn insert(&mut self, way: Option<usize>, req: InsertRequest) {
        let slot = locate(req.size, req.addr, self.large_shift);

        let id = match way {
            Some(way) => {
                let id = slot.set * TLB_WAYS + (way % TLB_WAYS);
                if let Some(other) = self.pool.find(slot.index) {
                    if other != id {
                        let _ = self.pool.free(other);
                    }
                }
                self.pool.release_region(id);
                self.pool.touch(id);
                id
            }
            None => match self.pool.find(slot.index) {
                Some(existing) => {
                    self.pool.touch(existing);
                    existing
                }
                None => {
                    if self.pool.free_is_empty(slot.set) {
                        self.stats.evictions += 1;
                    }
                    self.pool.oldest(slot.set)
                }
            },
        };

        let addr_mask = req.size.addr_mask(self.large_shift);
        *self.pool.entry_mut(id) = TlbEntry {
            data: req.data,
            tag: generate_tag(req.addr & addr_mask, req.writable, req.user, req.dirty, req.size),
            addr_mask,
            addr_mask_set: addr_mask | PAGE_OFFSET_MASK,
            passthrough_mask: req.passthrough_mask,
            is_global: req.global,
            is_2mb: req.is_2mb,
        };
        self.pool.register(id, slot.index);
        self.prefetch_stale = true;
    }

    /// Frees entries of the size class opposite to `inserted` that alias the
    /// 4 MiB region containing `addr`.
    ///
    /// The comparison is on the 4 MiB frame and the present bit only; access
    /// attributes are not considered, so no stale alias of either size survives.
    pub fn invalidate_opposite(&mut self, addr: u32, inserted: SizeClass) {
        let region = addr & FRAME_MASK_4M;
        let mut purged = 0usize;
        for set in inserted.opposite().sets() {
            purged += self.retain_in_set(set, |entry| {
                entry.tag & TAG_PRESENT == 0 || entry.tag & FRAME_MASK_4M != region
            });
        }
        if purged > 0 {
            tracing::trace!(addr, purged, "purged opposite-size aliases");
            self.prefetch_stale = true;
        }
    }

    /// Frees every entry whose page contains `addr`, global or not.
    ///
    /// Returns the number of entries freed.
    pub fn invalidate(&mut self, addr: u32) -> usize {
        let mut freed = 0;
        for set in 0..TLB_SETS {
            freed += self.retain_in_set(set, |entry| {
                entry.tag & (entry.addr_mask | TAG_PRESENT) != (addr & entry.addr_mask) | TAG_PRESENT
            });
        }
        self.stats.invalidations += freed as u64;
        if freed > 0 {
            self.prefetch_stale = true;
        }
        freed
    }

    /// Frees every entry, or every non-global entry when `keep_global` is set.
    pub fn flush(&mut self, keep_global: bool) {
        let mut freed = 0usize;
        for set in 0..TLB_SETS {
            freed += self.retain_in_set(set, |entry| keep_global && entry.is_global);
        }
        self.stats.flushes += 1;
        self.prefetch_stale = true;
        tracing::debug!(keep_global, freed, "TLB flushed");
    }

    /// Frees the used entries of `set` for which `keep` returns `false`.
    fn retain_in_set(&mut self, set: usize, keep: impl Fn(&TlbEntry) -> bool) -> usize {
        let mut freed = 0;
        let mut cursor = self.pool.head(set, ListKind::Used);
        while let Some(id) = cursor {
            cursor = self.pool.next(id);
            if !keep(self.pool.entry(id)) && self.pool.free(id) {
                freed += 1;
            }
        }
        freed
    }

    /// Returns and clears the "prefetched bytes may be stale" flag.
    ///
    /// Set by every insert, reinit, flush, and effective invalidation.
    pub const fn take_prefetch_recheck(&mut self) -> bool {
        let stale = self.prefetch_stale;
        self.prefetch_stale = false;
        stale
    }

    /// The entry at `(set, way)`.
    pub fn entry(&self, set: usize, way: usize) -> &TlbEntry {
        self.pool.entry(Self::id(set, way))
    }

    /// Returns `true` if `(set, way)` currently holds a translation.
    pub fn is_valid(&self, set: usize, way: usize) -> bool {
        self.pool.is_allocated(Self::id(set, way))
    }

    /// The entry pool, for inspecting list state.
    pub const fn pool(&self) -> &EntryPool {
        &self.pool
    }

    /// Counters accumulated since creation or the last reset.
    pub const fn stats(&self) -> &TlbStats {
        &self.stats
    }

    const fn id(set: usize, way: usize) -> EntryId {
        (set % TLB_SETS) * TLB_WAYS + (way % TLB_WAYS)
    }
}
