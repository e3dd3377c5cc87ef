//! Page fault construction and dispatch.
//!
//! A failed walk becomes a [`FaultRecord`]: the `#PF` payload plus the level at
//! which the walk stopped and the raw entries read on the way. The record is
//! either handed to the [`FaultSink`] exactly once, or, for probes that must
//! not fault, turned into [`TranslateError::NoTranslation`] with no dispatch.

use super::ptw::WalkFailure;
use crate::arch::Privilege;
use crate::bus::FaultSink;
use crate::common::{AccessType, LinearAddr, PageFault, TranslateError};

/// What went wrong during a walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// An entry had P clear.
    NotPresent,
    /// The protection check denied the access.
    Protection,
    /// A large-page directory entry had a reserved bit set.
    ReservedBit,
}

/// Paging-structure level at which a walk stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WalkLevel {
    /// PAE page-directory-pointer table.
    DirectoryPointer,
    /// Page directory.
    Directory,
    /// Page table.
    Table,
}

/// A fault and the walk state that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FaultRecord {
    /// Guest-visible payload.
    pub fault: PageFault,
    /// Fault classification.
    pub kind: FaultKind,
    /// Level the walk stopped at.
    pub level: WalkLevel,
    /// PDPT entry, if read.
    pub pdpte: Option<u64>,
    /// Page-directory entry, if read.
    pub pde: Option<u64>,
    /// Page-table entry, if read.
    pub pte: Option<u64>,
}

impl FaultRecord {
    /// Builds the record for a failed walk.
    ///
    /// The error code has P set for protection and reserved-bit faults, W/R
    /// for writes, U/S for user accessors, and RSVD for reserved-bit faults.
    pub const fn new(addr: LinearAddr, failure: &WalkFailure, access: AccessType, privilege: Privilege) -> Self {
        let present = !matches!(failure.kind, FaultKind::NotPresent);
        let rsvd = matches!(failure.kind, FaultKind::ReservedBit);
        Self {
            fault: PageFault::new(addr.val(), present, access.is_write(), privilege.is_user(), rsvd),
            kind: failure.kind,
            level: failure.level,
            pdpte: failure.pdpte,
            pde: failure.pde,
            pte: failure.pte,
        }
    }
}

/// Delivers a fault, or swallows it for fault-suppressing probes.
///
/// Returns the error the translation must report.
pub fn raise(sink: &mut dyn FaultSink, record: &FaultRecord, suppress: bool) -> TranslateError {
    tracing::debug!(
        addr = record.fault.addr,
        error_code = record.fault.error_code,
        kind = ?record.kind,
        level = ?record.level,
        suppress,
        "page walk failed"
    );

    if suppress {
        return TranslateError::NoTranslation(record.fault.addr);
    }
    sink.raise_page_fault(record.fault);
    TranslateError::PageFault(record.fault)
}
