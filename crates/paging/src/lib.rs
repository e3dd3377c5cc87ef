//! x86 paging unit library.
//!
//! This crate implements the paging unit of a 32-bit x86 processor for use in machine emulators:
//! 1. **TLB:** A 16-set, 4-way set-associative translation cache with per-set LRU replacement,
//!    separate 4 KiB and large-page sets, and global-page aware flushing.
//! 2. **Page walker:** 32-bit paging (4 KiB and PSE 4 MiB pages, PSE-36) and PAE paging
//!    (4 KiB and 2 MiB pages), with lazy accessed/dirty write-back.
//! 3. **Protection:** The U/S and R/W rules including CR0.WP, and `#PF` error codes.
//! 4. **Diagnostics:** The i486 TR6/TR7 TLB test registers and translation statistics.
//!
//! Guest memory and exception delivery are supplied by the embedding emulator through the
//! traits in [`bus`].

/// x86 architectural state (control registers, privilege).
pub mod arch;
/// Collaborator traits for physical memory and fault delivery.
pub mod bus;
/// Common types and constants (addresses, access types, page faults).
pub mod common;
/// Paging unit configuration (CPU generation and feature overrides).
pub mod config;
/// Memory management unit: TLB, page walker, protection, test registers.
pub mod mmu;
/// Translation statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// The paging unit; one per virtual CPU.
pub use crate::mmu::Mmu;
