//! # TR6/TR7 Test Register Tests
//!
//! Writes and lookups driven through the diagnostic registers, and their
//! interaction with ordinary translations.

use crate::common::harness::TestContext;
use x86_paging::arch::Privilege;
use x86_paging::common::PhysAddr;
use x86_paging::config::CpuGeneration;
use x86_paging::mmu::test_regs::*;

const PAGE: u32 = 0x0040_1000;
const FRAME: u32 = 0x0012_3000;

/// Attribute bits for a writable, supervisor, dirty entry.
const W_S_D: u32 = TR6_W | TR6_U_N | TR6_D;

fn context() -> TestContext {
    TestContext::new(CpuGeneration::I486)
}

fn tr_write(tc: &mut TestContext, tr7: u32, tr6: u32) {
    tc.mmu.handle_test_register_write(TestRegister::Tr7, tr7);
    tc.mmu.handle_test_register_write(TestRegister::Tr6, tr6);
}

fn tr_lookup(tc: &mut TestContext, tr6: u32) -> u32 {
    tc.mmu.handle_test_register_write(TestRegister::Tr6, tr6 | TR6_C);
    tc.mmu.read_test_register(TestRegister::Tr7)
}

#[test]
fn bit_pair_decoding() {
    assert_eq!(BitPair::decode(TR6_D, TR6_D, TR6_D_N), BitPair::Set);
    assert_eq!(BitPair::decode(TR6_D_N, TR6_D, TR6_D_N), BitPair::Clear);
    assert_eq!(BitPair::decode(0, TR6_D, TR6_D_N), BitPair::DontCare);
    assert_eq!(BitPair::decode(TR6_D | TR6_D_N, TR6_D, TR6_D_N), BitPair::DontCare);
}

#[test]
fn tr7_write_only_latches() {
    let mut tc = context();
    tc.mmu.handle_test_register_write(TestRegister::Tr7, FRAME | TR7_PL);
    assert_eq!(tc.mmu.read_test_register(TestRegister::Tr7), FRAME | TR7_PL);
    assert!(tc.mmu.tlb().pool().used_ids(1).is_empty());
}

#[test]
fn write_then_lookup_reports_frame_and_way() {
    let mut tc = context();
    tr_write(&mut tc, FRAME, PAGE | TR6_V | W_S_D);
    assert_eq!(tc.mmu.read_test_register(TestRegister::Tr6), PAGE | TR6_V | W_S_D);

    let tr7 = tr_lookup(&mut tc, PAGE | TR6_V | W_S_D);
    assert_eq!(tr7, FRAME | TR7_PL);
    assert_eq!((tr7 & TR7_REP_MASK) >> TR7_REP_SHIFT, 0);
}

#[test]
fn write_with_pl_uses_rep_way() {
    let mut tc = context();
    tr_write(&mut tc, FRAME | TR7_PL | (2 << TR7_REP_SHIFT), PAGE | TR6_V | W_S_D);
    assert!(tc.mmu.tlb().is_valid(1, 2));
    assert!(!tc.mmu.tlb().is_valid(1, 0));

    let tr7 = tr_lookup(&mut tc, PAGE | TR6_V | W_S_D);
    assert_eq!(tr7 & TR7_PL, TR7_PL);
    assert_eq!((tr7 & TR7_REP_MASK) >> TR7_REP_SHIFT, 2);
}

#[test]
fn lookup_miss_clears_only_pl() {
    let mut tc = context();
    tc.mmu.handle_test_register_write(TestRegister::Tr7, FRAME | TR7_PL);

    let tr7 = tr_lookup(&mut tc, PAGE | TR6_V | W_S_D);
    assert_eq!(tr7, FRAME);
}

#[test]
fn lookup_with_v_clear_misses() {
    let mut tc = context();
    tr_write(&mut tc, FRAME, PAGE | TR6_V | W_S_D);

    let tr7 = tr_lookup(&mut tc, PAGE | W_S_D);
    assert_eq!(tr7 & TR7_PL, 0);
}

#[test]
fn write_with_v_clear_invalidates() {
    let mut tc = context();
    tr_write(&mut tc, FRAME, PAGE | TR6_V | W_S_D);
    tr_write(&mut tc, 0, PAGE | W_S_D);

    assert_eq!(tr_lookup(&mut tc, PAGE | TR6_V | W_S_D) & TR7_PL, 0);
    assert!(!tc.mmu.tlb().is_valid(1, 0));
}

#[test]
fn dont_care_pairs_match_either_value() {
    let mut tc = context();
    tr_write(&mut tc, FRAME, PAGE | TR6_V | W_S_D);

    // W and D both don't-care, U must be clear.
    assert_eq!(tr_lookup(&mut tc, PAGE | TR6_V | TR6_U_N) & TR7_PL, TR7_PL);
    // W demanded clear: mismatch.
    assert_eq!(tr_lookup(&mut tc, PAGE | TR6_V | TR6_W_N | TR6_U_N | TR6_D) & TR7_PL, 0);
    // U demanded set: mismatch.
    assert_eq!(tr_lookup(&mut tc, PAGE | TR6_V | TR6_W | TR6_U | TR6_D) & TR7_PL, 0);
    // Everything don't-care.
    assert_eq!(
        tr_lookup(&mut tc, PAGE | TR6_V | TR6_W | TR6_W_N | TR6_U | TR6_U_N) & TR7_PL,
        TR7_PL
    );
}

#[test]
fn installed_entry_serves_translations() {
    let mut tc = context();
    tc.enable_paging(false, false);
    tr_write(&mut tc, FRAME, PAGE | TR6_V | W_S_D);

    let pa = tc.write(PAGE | 0x10, Privilege::Supervisor).expect("installed by TR6");
    assert_eq!(pa, PhysAddr::new(u64::from(FRAME | 0x10)));
    assert!(tc.mem.reads.is_empty());
}

#[test]
fn walked_entry_is_visible_to_lookup() {
    let mut tc = context();
    tc.enable_paging(false, false);
    tc.map_4k(PAGE, FRAME, 0, 0);
    assert!(tc.read(PAGE, Privilege::Supervisor).is_ok());

    // Read-only, supervisor, clean.
    let tr7 = tr_lookup(&mut tc, PAGE | TR6_V | TR6_W_N | TR6_U_N | TR6_D_N);
    assert_eq!(tr7 & !TR7_REP_MASK, FRAME | TR7_PL);
}
