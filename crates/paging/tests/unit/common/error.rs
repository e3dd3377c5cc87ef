//! # Page Fault and Error Tests
//!
//! Error-code encoding of `PageFault` and the `TranslateError` variants.

use x86_paging::common::{PageFault, TranslateError};

#[test]
fn error_code_bits() {
    let fault = PageFault::new(0x1000, true, true, true, true);
    assert_eq!(fault.error_code, 0b1111);
    assert!(fault.is_protection());
    assert!(fault.is_write());
    assert!(fault.is_user());
    assert!(fault.is_reserved_bit());

    let fault = PageFault::new(0x1000, false, false, false, false);
    assert_eq!(fault.error_code, 0);
    assert!(!fault.is_protection());
}

#[test]
fn error_code_matches_sdm_layout() {
    assert_eq!(PageFault::EC_P, 1);
    assert_eq!(PageFault::EC_WR, 2);
    assert_eq!(PageFault::EC_US, 4);
    assert_eq!(PageFault::EC_RSVD, 8);
}

#[test]
fn page_fault_display() {
    let text = PageFault::new(0xDEAD_B000, true, true, false, false).to_string();
    assert!(text.contains("0xdeadb000"));
    assert!(text.contains("protection"));
    assert!(text.contains("write"));
    assert!(text.contains("supervisor"));
}

#[test]
fn translate_error_from_fault() {
    let fault = PageFault::new(0x4000, false, false, true, false);
    let err = TranslateError::from(fault);
    assert_eq!(err.page_fault(), Some(fault));
    assert_eq!(err.to_string(), fault.to_string());
}

#[test]
fn translate_error_without_fault() {
    assert_eq!(TranslateError::Pending.page_fault(), None);
    assert_eq!(TranslateError::NoTranslation(0x10).page_fault(), None);
    assert!(TranslateError::NoTranslation(0x10).to_string().contains("0x00000010"));
}
