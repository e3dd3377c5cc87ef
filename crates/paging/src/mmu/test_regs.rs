//! i486 TLB test registers (TR6/TR7).
//!
//! Guest diagnostics drive the TLB directly through two registers:
//! 1. **TR6 (command):** Linear frame, the valid bit, complementary pairs for
//!    the dirty, user, and writable attributes, and the command bit
//!    (1 = lookup, 0 = write). Writing TR6 executes the command.
//! 2. **TR7 (data):** Physical frame, the hit flag `PL`, and the way field
//!    `REP`. Writing TR7 only latches the value for the next write command.
//!
//! A lookup probes the 4 KiB sets exactly like a real access and reports the
//! result in TR7. A write installs a 4 KiB entry in the way named by `REP`
//! when `PL` is set, or through normal LRU replacement otherwise.

use super::tag::{SizeClass, TAG_DIRTY, TAG_USER, TAG_WRITABLE, generate_tag};
use super::tlb::{InsertRequest, Tlb};
use crate::common::constants::{PAGE_FRAME_MASK, PASSTHROUGH_4K};

/// TR6 command bit: 1 = lookup, 0 = write.
pub const TR6_C: u32 = 1 << 0;
/// TR6 W#: complement of W.
pub const TR6_W_N: u32 = 1 << 5;
/// TR6 W: writable.
pub const TR6_W: u32 = 1 << 6;
/// TR6 U#: complement of U.
pub const TR6_U_N: u32 = 1 << 7;
/// TR6 U: user.
pub const TR6_U: u32 = 1 << 8;
/// TR6 D#: complement of D.
pub const TR6_D_N: u32 = 1 << 9;
/// TR6 D: dirty.
pub const TR6_D: u32 = 1 << 10;
/// TR6 V: valid.
pub const TR6_V: u32 = 1 << 11;

/// TR7 PL: lookup hit, or "use REP" for writes.
pub const TR7_PL: u32 = 1 << 4;
/// TR7 REP shift.
pub const TR7_REP_SHIFT: u32 = 2;
/// TR7 REP: way number.
pub const TR7_REP_MASK: u32 = 0b11 << TR7_REP_SHIFT;

/// Identifies a test register.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TestRegister {
    /// Test command register.
    Tr6,
    /// Test data register.
    Tr7,
}

/// Decoded state of a complementary TR6 bit pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BitPair {
    /// Bit set, complement clear.
    Set,
    /// Bit clear, complement set.
    Clear,
    /// Both equal: matches either value on lookup.
    DontCare,
}

impl BitPair {
    /// Decodes the pair `(bit, complement)` of `tr6`.
    pub const fn decode(tr6: u32, bit: u32, complement: u32) -> Self {
        match (tr6 & bit != 0, tr6 & complement != 0) {
            (true, false) => Self::Set,
            (false, true) => Self::Clear,
            _ => Self::DontCare,
        }
    }

    const fn is_set(self) -> bool {
        matches!(self, Self::Set)
    }
}

/// Latched TR6 and TR7 values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TestRegisters {
    /// Last value written to TR6.
    pub tr6: u32,
    /// TR7, including lookup results.
    pub tr7: u32,
}

impl TestRegisters {
    /// Reads a test register.
    pub const fn read(&self, reg: TestRegister) -> u32 {
        match reg {
            TestRegister::Tr6 => self.tr6,
            TestRegister::Tr7 => self.tr7,
        }
    }

    /// Writes a test register, executing the command for TR6.
    pub fn write(&mut self, tlb: &mut Tlb, reg: TestRegister, value: u32) {
        match reg {
            TestRegister::Tr7 => self.tr7 = value,
            TestRegister::Tr6 => {
                self.tr6 = value;
                if value & TR6_C != 0 {
                    self.lookup(tlb);
                } else {
                    self.store(tlb);
                }
            }
        }
    }

    fn lookup(&mut self, tlb: &mut Tlb) {
        let addr = self.tr6 & PAGE_FRAME_MASK;
        if self.tr6 & TR6_V == 0 {
            self.tr7 &= !TR7_PL;
            return;
        }

        let dirty = BitPair::decode(self.tr6, TR6_D, TR6_D_N);
        let user = BitPair::decode(self.tr6, TR6_U, TR6_U_N);
        let writable = BitPair::decode(self.tr6, TR6_W, TR6_W_N);

        let mut ignore = 0;
        for (pair, bit) in [(dirty, TAG_DIRTY), (user, TAG_USER), (writable, TAG_WRITABLE)] {
            if pair == BitPair::DontCare {
                ignore |= bit;
            }
        }

        let probe = generate_tag(addr, writable.is_set(), user.is_set(), dirty.is_set(), SizeClass::Small);
        match tlb.lookup(addr, probe, SizeClass::Small, ignore) {
            Some(hit) => {
                self.tr7 = (hit.data as u32 & PAGE_FRAME_MASK) | TR7_PL | ((hit.way as u32) << TR7_REP_SHIFT);
                tracing::debug!(addr, tr7 = self.tr7, "TR6 lookup hit");
            }
            None => {
                self.tr7 &= !TR7_PL;
                tracing::debug!(addr, "TR6 lookup miss");
            }
        }
    }

    fn store(&self, tlb: &mut Tlb) {
        let addr = self.tr6 & PAGE_FRAME_MASK;
        if self.tr6 & TR6_V == 0 {
            let _ = tlb.invalidate(addr);
            tracing::debug!(addr, "TR6 write invalidated entry");
            return;
        }

        let way = if self.tr7 & TR7_PL != 0 {
            Some(((self.tr7 & TR7_REP_MASK) >> TR7_REP_SHIFT) as usize)
        } else {
            None
        };
        tlb.insert(
            way,
            InsertRequest {
                addr,
                writable: BitPair::decode(self.tr6, TR6_W, TR6_W_N).is_set(),
                user: BitPair::decode(self.tr6, TR6_U, TR6_U_N).is_set(),
                dirty: BitPair::decode(self.tr6, TR6_D, TR6_D_N).is_set(),
                size: SizeClass::Small,
                global: false,
                passthrough_mask: PASSTHROUGH_4K,
                is_2mb: false,
                data: u64::from(self.tr7 & PAGE_FRAME_MASK),
            },
        );
        tracing::debug!(addr, tr7 = self.tr7, ?way, "TR6 write installed entry");
    }
}
