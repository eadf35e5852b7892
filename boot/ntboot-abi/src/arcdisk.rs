//! ARC disk signature records.
//!
//! One record per disk the firmware could boot from, keyed by MBR signature
//! or GPT GUID, so the kernel can match `multi(0)disk(0)rdisk(N)` names to
//! hardware. Win7 widened the record and appended a field nobody has ever
//! documented; it stays zero.

use crate::list::{ListEntry32, ListEntry64};
use core::mem::{offset_of, size_of};

/// `ARC_DISK_INFORMATION` for 32-bit targets: the list head the block points
/// at.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct ArcDiskInformation32 {
    pub disk_signature_list_head: ListEntry32,
}

/// `ARC_DISK_INFORMATION` for 64-bit targets.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct ArcDiskInformation64 {
    pub disk_signature_list_head: ListEntry64,
}

/// `ARC_DISK_SIGNATURE` (NT 5.2 through Vista) for 32-bit targets.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct ArcDiskSignature32 {
    pub list_entry: ListEntry32,
    pub signature: u32,
    pub arc_name: u32,
    pub check_sum: u32,
    pub valid_partition_table: u8,
    pub x_int13: u8,
    pub is_gpt: u8,
    pub reserved: u8,
    pub gpt_signature: [u8; 16],
}

/// `ARC_DISK_SIGNATURE` (NT 5.2 through Vista) for 64-bit targets.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct ArcDiskSignature64 {
    pub list_entry: ListEntry64,
    pub signature: u32,
    pub pad: u32,
    pub arc_name: u64,
    pub check_sum: u32,
    pub valid_partition_table: u8,
    pub x_int13: u8,
    pub is_gpt: u8,
    pub reserved: u8,
    pub gpt_signature: [u8; 16],
}

/// `ARC_DISK_SIGNATURE_WIN7` for 32-bit targets.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct ArcDiskSignatureWin7x32 {
    pub list_entry: ListEntry32,
    pub signature: u32,
    pub arc_name: u32,
    pub check_sum: u32,
    pub valid_partition_table: u8,
    pub x_int13: u8,
    pub is_gpt: u8,
    pub reserved: u8,
    pub gpt_signature: [u8; 16],
    /// Undocumented; zero-filled.
    pub unknown: u32,
}

/// `ARC_DISK_SIGNATURE_WIN7` for 64-bit targets.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct ArcDiskSignatureWin7x64 {
    pub list_entry: ListEntry64,
    pub signature: u32,
    pub pad: u32,
    pub arc_name: u64,
    pub check_sum: u32,
    pub valid_partition_table: u8,
    pub x_int13: u8,
    pub is_gpt: u8,
    pub reserved: u8,
    pub gpt_signature: [u8; 16],
    /// Undocumented; zero-filled.
    pub unknown: u64,
}

const _: () = {
    assert!(size_of::<ArcDiskSignature32>() == 0x28);
    assert!(size_of::<ArcDiskSignature64>() == 0x38);
    assert!(offset_of!(ArcDiskSignature64, arc_name) == 0x18);
    assert!(offset_of!(ArcDiskSignature64, gpt_signature) == 0x28);

    assert!(size_of::<ArcDiskSignatureWin7x32>() == 0x2c);
    assert!(offset_of!(ArcDiskSignatureWin7x32, unknown) == 0x28);
    assert!(size_of::<ArcDiskSignatureWin7x64>() == 0x40);
    assert!(offset_of!(ArcDiskSignatureWin7x64, unknown) == 0x38);
};
