//! # Address Tests
//!
//! Index extraction for both paging formats.

use x86_paging::common::{LinearAddr, PhysAddr};

#[test]
fn split_32bit_indices() {
    let addr = LinearAddr::new(0xC0AB_C123);
    assert_eq!(addr.directory_index(), 0x302);
    assert_eq!(addr.table_index(), 0x2BC);
    assert_eq!(addr.page_offset(), 0x123);
}

#[test]
fn split_pae_indices() {
    let addr = LinearAddr::new(0xC0AB_C123);
    assert_eq!(addr.pae_pointer_index(), 3);
    assert_eq!(addr.pae_directory_index(), 0x005);
    assert_eq!(addr.pae_table_index(), 0x0BC);
    assert_eq!(addr.page_offset(), 0x123);
}

#[test]
fn indices_at_extremes() {
    let top = LinearAddr::new(0xFFFF_FFFF);
    assert_eq!(top.directory_index(), 0x3FF);
    assert_eq!(top.table_index(), 0x3FF);
    assert_eq!(top.pae_pointer_index(), 3);
    assert_eq!(top.pae_directory_index(), 0x1FF);
    assert_eq!(top.pae_table_index(), 0x1FF);

    let zero = LinearAddr::from(0);
    assert_eq!(zero.directory_index(), 0);
    assert_eq!(zero.pae_pointer_index(), 0);
}

#[test]
fn display_formats() {
    assert_eq!(LinearAddr::new(0x1234).to_string(), "0x00001234");
    assert_eq!(PhysAddr::new(0x9_0000_0000).val(), 0x9_0000_0000);
}
