//! # Statistics Tests
//!
//! Counter bookkeeping across hits, misses, walks, faults and maintenance.

use crate::common::harness::{RW, TestContext, US};
use x86_paging::arch::Privilege;
use x86_paging::config::CpuGeneration;
use x86_paging::stats::TlbStats;

#[test]
fn hit_rate_of_empty_stats_is_zero() {
    assert_eq!(TlbStats::default().hit_rate(), 0.0);
}

#[test]
fn counters_follow_translation_outcomes() {
    let mut tc = TestContext::new(CpuGeneration::Pentium);
    tc.enable_paging(false, false);
    tc.map_4k(0x0040_1000, 0x0080_0000, RW | US, RW | US);

    assert!(tc.read(0x0040_1000, Privilege::User).is_ok());
    assert!(tc.read(0x0040_1004, Privilege::User).is_ok());
    assert!(tc.read(0x0900_0000, Privilege::User).is_err());

    let stats = *tc.mmu.stats();
    assert_eq!(stats.lookups, 3);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 2);
    assert_eq!(stats.walks, 1);
    assert_eq!(stats.faults, 1);
    assert!((stats.hit_rate() - 1.0 / 3.0).abs() < 1e-9);

    tc.mmu.reset_stats();
    assert_eq!(*tc.mmu.stats(), TlbStats::default());
}

#[test]
fn maintenance_counters() {
    let mut tc = TestContext::new(CpuGeneration::Pentium);
    tc.enable_paging(false, false);
    tc.map_4k(0x0040_1000, 0x0080_0000, RW, RW);
    assert!(tc.read(0x0040_1000, Privilege::Supervisor).is_ok());
    tc.mmu.reset_stats();

    tc.mmu.invalidate_address(0x0040_1000.into());
    tc.mmu.flush(false);

    let stats = tc.mmu.stats();
    assert_eq!(stats.invalidations, 1);
    assert_eq!(stats.flushes, 1);
}

#[test]
fn stats_serialize_to_json() {
    let stats = TlbStats {
        lookups: 10,
        hits: 7,
        ..TlbStats::default()
    };
    let json: serde_json::Value = serde_json::from_str(&stats.to_json().unwrap()).unwrap();
    assert_eq!(json["lookups"], 10);
    assert_eq!(json["hits"], 7);
    assert_eq!(json["evictions"], 0);
}
