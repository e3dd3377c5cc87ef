use crate::common::mocks::faults::RecordingFaults;
use crate::common::mocks::memory::MockMemory;
use x86_paging::Mmu;
use x86_paging::arch::Privilege;
use x86_paging::arch::control::{CR0_PG, CR0_WP, CR4_PAE, CR4_PGE, CR4_PSE};
use x86_paging::common::{AccessType, LinearAddr, PhysAddr, ProbeFlags, TranslateError};
use x86_paging::config::{CpuFeatures, CpuGeneration};

// Paging-structure entry bits.
pub const P: u64 = 1 << 0;
pub const RW: u64 = 1 << 1;
pub const US: u64 = 1 << 2;
pub const A: u64 = 1 << 5;
pub const D: u64 = 1 << 6;
pub const PS: u64 = 1 << 7;
pub const G: u64 = 1 << 8;

/// Page directory for 32-bit paging (CR3).
pub const PD_BASE: u64 = 0x0000_1000;
/// Page tables for 32-bit paging: one 4 KiB table per directory index.
pub const PT_POOL: u64 = 0x0040_0000;
/// PDPT for PAE paging (CR3).
pub const PDPT_BASE: u64 = 0x0000_3000;
/// PAE page directories: one per PDPT index.
pub const PAE_PD_POOL: u64 = 0x0001_0000;
/// PAE page tables: one per (PDPT index, directory index).
pub const PAE_PT_POOL: u64 = 0x0100_0000;

/// Installs a test subscriber once; respects `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// An MMU wired to mock memory and a fault recorder.
pub struct TestContext {
    pub mmu: Mmu,
    pub mem: MockMemory,
    pub faults: RecordingFaults,
}

impl TestContext {
    /// Creates a context for a processor generation, with paging disabled.
    pub fn new(generation: CpuGeneration) -> Self {
        Self::with_features(generation.default_features())
    }

    pub fn with_features(features: CpuFeatures) -> Self {
        init_tracing();
        Self {
            mmu: Mmu::with_features(features),
            mem: MockMemory::new(),
            faults: RecordingFaults::new(),
        }
    }

    /// 32-bit paging with CR0.WP, and PSE/PGE as requested.
    pub fn enable_paging(&mut self, pse: bool, pge: bool) {
        let mut cr4 = 0;
        if pse {
            cr4 |= CR4_PSE;
        }
        if pge {
            cr4 |= CR4_PGE;
        }
        self.mmu.write_cr4(cr4);
        self.mmu.write_cr3(PD_BASE as u32);
        self.mmu.write_cr0(CR0_PG | CR0_WP);
    }

    /// PAE paging with CR0.WP and PGE as requested.
    pub fn enable_pae(&mut self, pge: bool) {
        let mut cr4 = CR4_PAE;
        if pge {
            cr4 |= CR4_PGE;
        }
        self.mmu.write_cr4(cr4);
        self.mmu.write_cr3(PDPT_BASE as u32);
        self.mmu.write_cr0(CR0_PG | CR0_WP);
    }

    // ── 32-bit paging builders ──────────────────────────────

    pub fn pde_addr(linear: u32) -> u64 {
        PD_BASE + u64::from(linear >> 22) * 4
    }

    pub fn page_table(linear: u32) -> u64 {
        PT_POOL + u64::from(linear >> 22) * 0x1000
    }

    pub fn pte_addr(linear: u32) -> u64 {
        Self::page_table(linear) + u64::from((linear >> 12) & 0x3FF) * 4
    }

    /// Maps a 4 KiB page. `P` is added to both levels.
    pub fn map_4k(&mut self, linear: u32, frame: u32, pde_flags: u64, pte_flags: u64) {
        let pde = Self::page_table(linear) | pde_flags | P;
        self.mem.poke_u32(Self::pde_addr(linear), pde as u32);
        self.mem
            .poke_u32(Self::pte_addr(linear), (u64::from(frame & 0xFFFF_F000) | pte_flags | P) as u32);
    }

    /// Maps a 4 MiB page. `P` and `PS` are added.
    pub fn map_4m(&mut self, linear: u32, frame: u32, flags: u64) {
        let pde = u64::from(frame & 0xFFC0_0000) | flags | PS | P;
        self.mem.poke_u32(Self::pde_addr(linear), pde as u32);
    }

    // ── PAE builders ────────────────────────────────────────

    pub fn pdpte_addr(linear: u32) -> u64 {
        PDPT_BASE + u64::from(linear >> 30) * 8
    }

    pub fn pae_directory(linear: u32) -> u64 {
        PAE_PD_POOL + u64::from(linear >> 30) * 0x1000
    }

    pub fn pae_pde_addr(linear: u32) -> u64 {
        Self::pae_directory(linear) + u64::from((linear >> 21) & 0x1FF) * 8
    }

    pub fn pae_table(linear: u32) -> u64 {
        PAE_PT_POOL + u64::from(linear >> 21) * 0x1000
    }

    pub fn pae_pte_addr(linear: u32) -> u64 {
        Self::pae_table(linear) + u64::from((linear >> 12) & 0x1FF) * 8
    }

    fn install_pdpte(&mut self, linear: u32) {
        self.mem.poke_u64(Self::pdpte_addr(linear), Self::pae_directory(linear) | P);
    }

    /// Maps a 2 MiB PAE page. `P` and `PS` are added.
    pub fn map_pae_2m(&mut self, linear: u32, frame: u64, flags: u64) {
        self.install_pdpte(linear);
        self.mem
            .poke_u64(Self::pae_pde_addr(linear), (frame & 0x0000_000F_FFE0_0000) | flags | PS | P);
    }

    /// Maps a 4 KiB PAE page. `P` is added to both levels.
    pub fn map_pae_4k(&mut self, linear: u32, frame: u64, pde_flags: u64, pte_flags: u64) {
        self.install_pdpte(linear);
        self.mem.poke_u64(Self::pae_pde_addr(linear), Self::pae_table(linear) | pde_flags | P);
        self.mem
            .poke_u64(Self::pae_pte_addr(linear), (frame & 0x0000_000F_FFFF_F000) | pte_flags | P);
    }

    // ── Translation ─────────────────────────────────────────

    pub fn translate(
        &mut self,
        addr: u32,
        access: AccessType,
        privilege: Privilege,
    ) -> Result<PhysAddr, TranslateError> {
        self.probe(addr, access, privilege, ProbeFlags::NONE)
    }

    pub fn probe(
        &mut self,
        addr: u32,
        access: AccessType,
        privilege: Privilege,
        flags: ProbeFlags,
    ) -> Result<PhysAddr, TranslateError> {
        self.mmu.translate(
            &mut self.mem,
            &mut self.faults,
            LinearAddr::new(addr),
            access,
            privilege,
            flags,
        )
    }

    pub fn read(&mut self, addr: u32, privilege: Privilege) -> Result<PhysAddr, TranslateError> {
        self.translate(addr, AccessType::Read, privilege)
    }

    pub fn write(&mut self, addr: u32, privilege: Privilege) -> Result<PhysAddr, TranslateError> {
        self.translate(addr, AccessType::Write, privilege)
    }
}
