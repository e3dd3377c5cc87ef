//! Common types and constants used throughout the paging unit.
//!
//! This module provides the building blocks shared by every component:
//! 1. **Address Types:** Strong types for linear and physical addresses.
//! 2. **Constants:** Page sizes, frame masks, and TLB geometry.
//! 3. **Memory Access:** Read/write classification and probe flags.
//! 4. **Error Handling:** The `#PF` payload and the tri-state translation error.

/// Address type definitions (linear and physical addresses).
pub mod addr;

/// Page geometry and TLB sizing constants.
pub mod constants;

/// Memory access type definitions.
pub mod data;

/// Page fault and translation error types.
pub mod error;

pub use addr::{LinearAddr, PhysAddr};
pub use constants::{PAGE_FRAME_MASK, PAGE_OFFSET_MASK, PAGE_SHIFT, TLB_SETS, TLB_WAYS};
pub use data::{AccessType, ProbeFlags};
pub use error::{PageFault, TranslateError};
