//! Loaded-module and boot-driver list entries.
//!
//! `KLDR_DATA_TABLE_ENTRY` is what the kernel's own loader data is built
//! from; it is *partially* binary-compatible with the user-mode
//! `LDR_DATA_TABLE_ENTRY` but diverges after the flags word, so the tail is
//! kept as the anonymous words the kernel actually has there. The loader
//! fills one entry per image and links them on the load-order list; the
//! kernel takes ownership of the links on entry.

use crate::list::{ListEntry32, ListEntry64, UnicodeString32, UnicodeString64};
use core::mem::{offset_of, size_of};

/// `Flags` bit: image integrity was enforced at load.
pub const LDRP_IMAGE_INTEGRITY_FORCED: u32 = 0x0000_0020;
/// `Flags` bit: entry fully processed by the loader.
pub const LDRP_ENTRY_PROCESSED: u32 = 0x0000_4000;
/// `Flags` bit: brought in as a dependency of a boot driver.
pub const LDRP_DRIVER_DEPENDENT_DLL: u32 = 0x0400_0000;

/// `KLDR_DATA_TABLE_ENTRY` for 32-bit targets.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct KldrDataTableEntry32 {
    pub in_load_order_links: ListEntry32,
    pub exception_table: u32,
    pub exception_table_size: u32,
    pub gp_value: u32,
    pub non_paged_debug_info: u32,
    pub dll_base: u32,
    pub entry_point: u32,
    pub size_of_image: u32,
    pub full_dll_name: UnicodeString32,
    pub base_dll_name: UnicodeString32,
    pub flags: u32,
    pub load_count: u16,
    pub reserved1: u16,
    pub section_pointer: u32,
    pub check_sum: u32,
    pub loaded_imports: u32,
    pub patch_information: u32,
    pub reserved2: [u32; 4],
    pub reserved3: UnicodeString32,
    pub reserved4: UnicodeString32,
    pub reserved5: [u32; 2],
    pub reserved6: [u32; 6],
}

/// `KLDR_DATA_TABLE_ENTRY` for 64-bit targets.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct KldrDataTableEntry64 {
    pub in_load_order_links: ListEntry64,
    pub exception_table: u64,
    pub exception_table_size: u32,
    pub pad1: u32,
    pub gp_value: u64,
    pub non_paged_debug_info: u64,
    pub dll_base: u64,
    pub entry_point: u64,
    pub size_of_image: u32,
    pub pad2: u32,
    pub full_dll_name: UnicodeString64,
    pub base_dll_name: UnicodeString64,
    pub flags: u32,
    pub load_count: u16,
    pub reserved1: u16,
    pub section_pointer: u64,
    pub check_sum: u32,
    pub pad3: u32,
    pub loaded_imports: u64,
    pub patch_information: u64,
    pub reserved2: [u32; 4],
    pub reserved3: UnicodeString64,
    pub reserved4: UnicodeString64,
    pub reserved5: [u64; 2],
    pub reserved6: [u32; 6],
}

/// `BOOT_DRIVER_LIST_ENTRY` for 32-bit targets.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct BootDriverListEntry32 {
    pub link: ListEntry32,
    pub file_path: UnicodeString32,
    pub registry_path: UnicodeString32,
    pub ldr_entry: u32,
    /// NTSTATUS observed by the kernel; nonzero means the loader skipped
    /// this driver.
    pub status: u32,
    pub reserved: u32,
}

/// `BOOT_DRIVER_LIST_ENTRY` for 64-bit targets.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct BootDriverListEntry64 {
    pub link: ListEntry64,
    pub file_path: UnicodeString64,
    pub registry_path: UnicodeString64,
    pub ldr_entry: u64,
    pub status: u32,
    pub reserved: u32,
}

const _: () = {
    assert!(size_of::<KldrDataTableEntry32>() == 0x8c);
    assert!(offset_of!(KldrDataTableEntry32, dll_base) == 0x18);
    assert!(offset_of!(KldrDataTableEntry32, entry_point) == 0x1c);
    assert!(offset_of!(KldrDataTableEntry32, size_of_image) == 0x20);
    assert!(offset_of!(KldrDataTableEntry32, full_dll_name) == 0x24);
    assert!(offset_of!(KldrDataTableEntry32, base_dll_name) == 0x2c);
    assert!(offset_of!(KldrDataTableEntry32, flags) == 0x34);
    assert!(offset_of!(KldrDataTableEntry32, check_sum) == 0x40);

    assert!(size_of::<KldrDataTableEntry64>() == 0xe8);
    assert!(offset_of!(KldrDataTableEntry64, exception_table) == 0x10);
    assert!(offset_of!(KldrDataTableEntry64, dll_base) == 0x30);
    assert!(offset_of!(KldrDataTableEntry64, entry_point) == 0x38);
    assert!(offset_of!(KldrDataTableEntry64, size_of_image) == 0x40);
    assert!(offset_of!(KldrDataTableEntry64, full_dll_name) == 0x48);
    assert!(offset_of!(KldrDataTableEntry64, base_dll_name) == 0x58);
    assert!(offset_of!(KldrDataTableEntry64, flags) == 0x68);
    assert!(offset_of!(KldrDataTableEntry64, section_pointer) == 0x70);
    assert!(offset_of!(KldrDataTableEntry64, check_sum) == 0x78);

    assert!(size_of::<BootDriverListEntry32>() == 0x24);
    assert!(offset_of!(BootDriverListEntry32, ldr_entry) == 0x18);
    assert!(offset_of!(BootDriverListEntry32, status) == 0x1c);

    assert!(size_of::<BootDriverListEntry64>() == 0x40);
    assert!(offset_of!(BootDriverListEntry64, ldr_entry) == 0x30);
    assert!(offset_of!(BootDriverListEntry64, status) == 0x38);
};
