//! x86 architectural state consumed by the paging unit.
//!
//! This module contains the pieces of processor state that steer translation:
//! 1. **Control Registers:** CR0, CR3 and CR4 bit definitions and accessors.
//! 2. **Privilege:** The supervisor/user distinction derived from the CPL.

/// CR0/CR3/CR4 definitions and the register snapshot used by the MMU.
pub mod control;

/// Supervisor/user privilege classification.
pub mod mode;

pub use control::ControlRegisters;
pub use mode::Privilege;
