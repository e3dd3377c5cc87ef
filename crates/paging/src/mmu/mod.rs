//! Memory Management Unit (MMU).
//!
//! This module implements the x86 paging unit: linear-to-physical translation
//! for 32-bit and PAE paging, page-level protection, and a 16-set 4-way TLB.
//! It is organized as follows:
//! 1. **`tag` / `lists` / `tlb`:** The TLB, its tag codec, and its LRU allocator.
//! 2. **`ptw` / `protection`:** The page walker and the protection rules it applies.
//! 3. **`fault`:** Page fault construction and dispatch.
//! 4. **`test_regs`:** The TR6/TR7 diagnostic interface to the TLB.
//!
//! [`Mmu`] ties them together and is owned by one virtual CPU.

/// Page fault construction and dispatch.
pub mod fault;

/// Entry pool and per-set free/used list allocator.
pub mod lists;

/// Page-level protection rules.
pub mod protection;

/// Page table walker for 32-bit and PAE paging.
pub mod ptw;

/// TLB tag codec and set addressing.
pub mod tag;

/// TR6/TR7 TLB test registers.
pub mod test_regs;

/// Set-associative Translation Lookaside Buffer.
pub mod tlb;

use self::fault::FaultRecord;
use self::ptw::{PageSize, Walk, WalkMode};
use self::tag::{SizeClass, probe_tag};
use self::test_regs::{TestRegister, TestRegisters};
use self::tlb::{InsertRequest, Tlb, TlbHit};
use crate::arch::control::{CR0_PAGING_BITS, CR4_PAGING_BITS};
use crate::arch::{ControlRegisters, Privilege};
use crate::bus::{FaultSink, PagingBus};
use crate::common::{AccessType, LinearAddr, PhysAddr, ProbeFlags, TranslateError};
use crate::config::{Config, ConfigError, CpuFeatures};
use crate::stats::TlbStats;

/// The paging unit of one virtual CPU.
///
/// Owns the TLB and a copy of the paging-relevant control registers. Physical
/// memory and fault delivery are borrowed per call through [`PagingBus`] and
/// [`FaultSink`].
#[derive(Clone, Debug)]
pub struct Mmu {
    pub(crate) tlb: Tlb,
    regs: ControlRegisters,
    features: CpuFeatures,
    mode: WalkMode,
    trace_walks: bool,
    test_regs: TestRegisters,
    last_fault: Option<FaultRecord>,
}

impl Mmu {
    /// Creates an MMU for the configured processor, with paging disabled.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the configured feature set is impossible.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let features = config.cpu.features()?;
        let mut mmu = Self::with_features(features);
        mmu.trace_walks = config.general.trace_walks;
        Ok(mmu)
    }

    /// Creates an MMU for an explicit feature set, with paging disabled.
    pub fn with_features(features: CpuFeatures) -> Self {
        let mut mmu = Self {
            tlb: Tlb::new(),
            regs: ControlRegisters::default(),
            features,
            mode: WalkMode::default(),
            trace_walks: false,
            test_regs: TestRegisters::default(),
            last_fault: None,
        };
        mmu.reinit();
        mmu
    }

    /// Translates a linear address.
    ///
    /// Probes the large-page sets (when large pages are possible) and then the
    /// 4 KiB sets. On a miss the page tables are walked, the accessed and dirty
    /// bits are updated, and the translation is cached.
    ///
    /// # Arguments
    ///
    /// * `bus` - Physical memory and bus arbitration.
    /// * `faults` - Receives the page fault if the walk fails.
    /// * `linear` - Address to translate.
    /// * `access` - Read or write.
    /// * `privilege` - Privilege of the accessor.
    /// * `probe` - Prefetch and fault-suppression flags.
    ///
    /// # Errors
    ///
    /// * [`TranslateError::NoTranslation`] for a prefetch that misses the TLB,
    ///   or a fault-suppressing probe whose walk fails.
    /// * [`TranslateError::Pending`] if the bus could not be acquired.
    /// * [`TranslateError::PageFault`] after the fault has been dispatched.
    pub fn translate(
        &mut self,
        bus: &mut dyn PagingBus,
        faults: &mut dyn FaultSink,
        linear: LinearAddr,
        access: AccessType,
        privilege: Privilege,
        probe: ProbeFlags,
    ) -> Result<PhysAddr, TranslateError> {
        if !self.regs.paging_enabled() {
            return Ok(PhysAddr::new(u64::from(linear.val())));
        }

        self.tlb.stats.lookups += 1;
        if let Some(hit) = self.probe(linear, access, privilege) {
            self.tlb.stats.hits += 1;
            return Ok(PhysAddr::new(hit.translate(linear.val())));
        }
        self.tlb.stats.misses += 1;

        if probe.prefetch {
            return Err(TranslateError::NoTranslation(linear.val()));
        }
        if !bus.try_acquire_bus() {
            self.tlb.stats.pending += 1;
            tracing::trace!(addr = linear.val(), "bus busy, page walk pending");
            return Err(TranslateError::Pending);
        }

        let result = self.walk_and_fill(bus, faults, linear, access, privilege, probe.suppress_fault);
        bus.release_bus();
        result
    }

    /// Translates without side effects on guest memory, for debuggers.
    ///
    /// A TLB hit refreshes LRU order as a normal lookup would. A miss walks the
    /// page tables as a read but never writes accessed or dirty bits, never
    /// caches the result, and never raises a fault.
    pub fn translate_readonly_debug(
        &mut self,
        bus: &mut dyn PagingBus,
        linear: LinearAddr,
        privilege: Privilege,
    ) -> Option<PhysAddr> {
        if !self.regs.paging_enabled() {
            return Some(PhysAddr::new(u64::from(linear.val())));
        }
        if let Some(hit) = self.probe(linear, AccessType::Read, privilege) {
            return Some(PhysAddr::new(hit.translate(linear.val())));
        }
        ptw::walk(bus, &self.regs, &self.mode, linear, AccessType::Read, privilege)
            .ok()
            .map(|walk| PhysAddr::new(walk.translate(linear)))
    }

    fn probe(&mut self, linear: LinearAddr, access: AccessType, privilege: Privilege) -> Option<TlbHit> {
        let addr = linear.val();
        if self.tlb.large_pages() {
            let (tag, ignore) = probe_tag(addr, access, privilege, SizeClass::Large);
            if let Some(hit) = self.tlb.lookup(addr, tag, SizeClass::Large, ignore) {
                return Some(hit);
            }
        }
        let (tag, ignore) = probe_tag(addr, access, privilege, SizeClass::Small);
        self.tlb.lookup(addr, tag, SizeClass::Small, ignore)
    }

    fn walk_and_fill(
        &mut self,
        bus: &mut dyn PagingBus,
        faults: &mut dyn FaultSink,
        linear: LinearAddr,
        access: AccessType,
        privilege: Privilege,
        suppress_fault: bool,
    ) -> Result<PhysAddr, TranslateError> {
        let mut walk = match ptw::walk(bus, &self.regs, &self.mode, linear, access, privilege) {
            Ok(walk) => walk,
            Err(failure) => {
                self.tlb.stats.faults += 1;
                let record = FaultRecord::new(linear, &failure, access, privilege);
                if !suppress_fault {
                    self.last_fault = Some(record);
                }
                return Err(fault::raise(faults, &record, suppress_fault));
            }
        };

        let dirty = ptw::update_access_bits(bus, &mut walk, access);
        self.log_walk(linear, &walk);

        let size = walk.size.size_class();
        self.tlb.invalidate_opposite(linear.val(), size);
        self.tlb.insert(
            None,
            InsertRequest {
                addr: linear.val(),
                writable: walk.writable,
                user: privilege.is_user(),
                dirty,
                size,
                global: walk.global,
                passthrough_mask: walk.size.passthrough_mask(),
                is_2mb: walk.size == PageSize::Size2M,
                data: walk.frame,
            },
        );
        self.tlb.stats.walks += 1;
        self.signal_prefetch_recheck(bus);

        Ok(PhysAddr::new(walk.translate(linear)))
    }

    fn log_walk(&self, linear: LinearAddr, walk: &Walk) {
        let leaf = walk.leaf().entry.raw();
        if self.trace_walks {
            tracing::debug!(addr = %linear, size = ?walk.size, frame = walk.frame, leaf, writable = walk.writable, global = walk.global, "page walk");
        } else {
            tracing::trace!(addr = %linear, size = ?walk.size, frame = walk.frame, leaf, writable = walk.writable, global = walk.global, "page walk");
        }
    }

    /// Tells the bus to revalidate prefetched bytes if the TLB changed since
    /// the last call.
    pub fn signal_prefetch_recheck(&mut self, bus: &mut dyn PagingBus) {
        if self.tlb.take_prefetch_recheck() {
            bus.recheck_prefetch();
        }
    }

    /// Drops every translation of the page containing `linear` (`INVLPG`).
    ///
    /// Global entries are dropped too.
    pub fn invalidate_address(&mut self, linear: LinearAddr) {
        let freed = self.tlb.invalidate(linear.val());
        tracing::trace!(addr = %linear, freed, "invalidated address");
    }

    /// Drops cached translations, keeping global ones if `preserve_global`.
    pub fn flush(&mut self, preserve_global: bool) {
        self.tlb.flush(preserve_global);
    }

    /// Re-derives the paging mode from the control registers and empties the TLB.
    pub fn reinit(&mut self) {
        self.mode = WalkMode::from_state(&self.regs, &self.features);
        self.tlb.reinit(self.mode.pae, self.mode.large_pages());
        tracing::debug!(
            paging = self.regs.paging_enabled(),
            pae = self.mode.pae,
            pse = self.mode.pse,
            pge = self.mode.pge,
            wp = self.mode.write_protect,
            "paging mode changed"
        );
    }

    /// Writes CR0. A change of PG or WP reinitializes the TLB.
    pub fn write_cr0(&mut self, value: u32) {
        let changed = (self.regs.cr0 ^ value) & CR0_PAGING_BITS;
        self.regs.cr0 = value;
        if changed != 0 {
            self.reinit();
        }
    }

    /// Writes CR3. Flushes the TLB, keeping global pages when PGE is active.
    pub fn write_cr3(&mut self, value: u32) {
        self.regs.cr3 = value;
        self.flush(self.mode.pge);
    }

    /// Writes CR4. A change of PSE, PAE, or PGE reinitializes the TLB.
    pub fn write_cr4(&mut self, value: u32) {
        let changed = (self.regs.cr4 ^ value) & CR4_PAGING_BITS;
        self.regs.cr4 = value;
        if changed != 0 {
            self.reinit();
        }
    }

    /// Loads all three control registers at once and reinitializes the TLB.
    pub fn set_control_registers(&mut self, regs: ControlRegisters) {
        self.regs = regs;
        self.reinit();
    }

    /// Current control registers.
    pub const fn control_registers(&self) -> &ControlRegisters {
        &self.regs
    }

    /// Effective paging mode.
    pub const fn mode(&self) -> &WalkMode {
        &self.mode
    }

    /// Paging features of the emulated processor.
    pub const fn features(&self) -> &CpuFeatures {
        &self.features
    }

    /// Writes a TLB test register; writing TR6 executes its command.
    pub fn handle_test_register_write(&mut self, reg: TestRegister, value: u32) {
        self.test_regs.write(&mut self.tlb, reg, value);
    }

    /// Reads a TLB test register.
    pub const fn read_test_register(&self, reg: TestRegister) -> u32 {
        self.test_regs.read(reg)
    }

    /// The translation cache, for inspection.
    ///
    /// Changes go through [`Mmu::invalidate_address`], [`Mmu::flush`], the
    /// control-register writes, and the test registers.
    pub const fn tlb(&self) -> &Tlb {
        &self.tlb
    }

    /// Translation counters.
    pub const fn stats(&self) -> &TlbStats {
        self.tlb.stats()
    }

    /// Zeroes the translation counters.
    pub fn reset_stats(&mut self) {
        self.tlb.stats = TlbStats::default();
    }

    /// The last page fault dispatched to the fault sink.
    pub const fn last_fault(&self) -> Option<&FaultRecord> {
        self.last_fault.as_ref()
    }
}
