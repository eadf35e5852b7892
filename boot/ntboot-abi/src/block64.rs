//! Loader parameter block layouts for x86-64 kernels.
//!
//! The block is the single pointer the kernel receives; everything else
//! hangs off it. Six generations exist. From Win7 on, the block leads with
//! an `OsMajorVersion`/`OsMinorVersion`/`Size` header the kernel checks
//! against its own compiled-in values; earlier kernels start straight at
//! the list heads and simply trust the loader.

use crate::list::ListEntry64;
use core::mem::{offset_of, size_of};

macro_rules! impl_zeroed {
    ($($ty:ty),+ $(,)?) => {
        $(impl $ty {
            /// All-zero instance; every field admits the zero bit pattern.
            #[must_use]
            pub fn zeroed() -> Self {
                // SAFETY: plain-old-data with no invalid bit patterns.
                unsafe { core::mem::zeroed() }
            }
        })+
    };
}

/// `NLS_DATA_BLOCK`: code-page data pointers.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct NlsDataBlock64 {
    pub ansi_code_page_data: u64,
    pub oem_code_page_data: u64,
    pub unicode_code_page_data: u64,
}

/// `FIRMWARE_INFORMATION_LOADER_BLOCK`, Vista/Win7 shape (EFI arm of the
/// union; this loader never produces the PC/AT arm).
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct FirmwareInformationWin7x64 {
    /// Bit 0: firmware is EFI.
    pub firmware_type: u32,
    pub pad1: u32,
    pub firmware_version: u32,
    pub pad2: u32,
    pub virtual_efi_runtime_services: u64,
    pub set_virtual_address_map_status: u32,
    pub missed_mappings_count: u32,
}

/// `FIRMWARE_INFORMATION_LOADER_BLOCK`, Win8 shape.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct FirmwareInformationWin8x64 {
    pub firmware_type: u32,
    pub pad1: u32,
    pub firmware_version: u32,
    pub pad2: u32,
    pub virtual_efi_runtime_services: u64,
    pub set_virtual_address_map_status: u32,
    pub missed_mappings_count: u32,
    pub firmware_resource_list: ListEntry64,
}

/// `FIRMWARE_INFORMATION_LOADER_BLOCK`, Win8.1+ shape: the raw EFI memory
/// map travels along.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct FirmwareInformationWin81x64 {
    pub firmware_type: u32,
    pub pad1: u32,
    pub firmware_version: u32,
    pub pad2: u32,
    pub virtual_efi_runtime_services: u64,
    pub set_virtual_address_map_status: u32,
    pub missed_mappings_count: u32,
    pub firmware_resource_list: ListEntry64,
    pub efi_memory_map: u64,
    pub efi_memory_map_size: u32,
    pub efi_memory_map_descriptor_size: u32,
}

/// `LOADER_PARAMETER_BLOCK`, NT 5.2.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct BlockWs03 {
    pub load_order_list_head: ListEntry64,
    pub memory_descriptor_list_head: ListEntry64,
    pub boot_driver_list_head: ListEntry64,
    pub kernel_stack: u64,
    pub prcb: u64,
    pub process: u64,
    pub thread: u64,
    pub registry_length: u32,
    pub pad1: u32,
    pub registry_base: u64,
    pub configuration_root: u64,
    pub arc_boot_device_name: u64,
    pub arc_hal_device_name: u64,
    pub nt_boot_path_name: u64,
    pub nt_hal_path_name: u64,
    pub load_options: u64,
    pub nls_data: u64,
    pub arc_disk_information: u64,
    pub oem_font_file: u64,
    pub setup_ldr_block: u64,
    pub extension: u64,
    pub i386_common_data_area: u64,
    pub i386_machine_type: u32,
    pub i386_virtual_bias: u32,
}

const _: () = {
    assert!(size_of::<BlockWs03>() == 0xc8);
    assert!(offset_of!(BlockWs03, kernel_stack) == 0x30);
    assert!(offset_of!(BlockWs03, registry_length) == 0x50);
    assert!(offset_of!(BlockWs03, registry_base) == 0x58);
    assert!(offset_of!(BlockWs03, configuration_root) == 0x60);
    assert!(offset_of!(BlockWs03, nls_data) == 0x90);
    assert!(offset_of!(BlockWs03, extension) == 0xb0);
};

/// `LOADER_PARAMETER_BLOCK`, Vista.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct BlockVista {
    pub load_order_list_head: ListEntry64,
    pub memory_descriptor_list_head: ListEntry64,
    pub boot_driver_list_head: ListEntry64,
    pub kernel_stack: u64,
    pub prcb: u64,
    pub process: u64,
    pub thread: u64,
    pub registry_length: u32,
    pub pad1: u32,
    pub registry_base: u64,
    pub configuration_root: u64,
    pub arc_boot_device_name: u64,
    pub arc_hal_device_name: u64,
    pub nt_boot_path_name: u64,
    pub nt_hal_path_name: u64,
    pub load_options: u64,
    pub nls_data: u64,
    pub arc_disk_information: u64,
    pub oem_font_file: u64,
    pub setup_ldr_block: u64,
    pub extension: u64,
    pub i386_common_data_area: u64,
    pub i386_machine_type: u32,
    pub i386_virtual_bias: u32,
    pub firmware_information: FirmwareInformationWin7x64,
}

const _: () = {
    assert!(size_of::<BlockVista>() == 0xe8);
    assert!(offset_of!(BlockVista, firmware_information) == 0xc8);
};

/// `LOADER_PARAMETER_BLOCK`, Win7. The version header appears and
/// `SetupLdrBlock` is gone.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct BlockWin7 {
    pub os_major_version: u32,
    pub os_minor_version: u32,
    pub size: u32,
    pub reserved: u32,
    pub load_order_list_head: ListEntry64,
    pub memory_descriptor_list_head: ListEntry64,
    pub boot_driver_list_head: ListEntry64,
    pub kernel_stack: u64,
    pub prcb: u64,
    pub process: u64,
    pub thread: u64,
    pub registry_length: u32,
    pub pad1: u32,
    pub registry_base: u64,
    pub configuration_root: u64,
    pub arc_boot_device_name: u64,
    pub arc_hal_device_name: u64,
    pub nt_boot_path_name: u64,
    pub nt_hal_path_name: u64,
    pub load_options: u64,
    pub nls_data: u64,
    pub arc_disk_information: u64,
    pub oem_font_file: u64,
    pub extension: u64,
    pub i386_common_data_area: u64,
    pub i386_machine_type: u32,
    pub i386_virtual_bias: u32,
    pub firmware_information: FirmwareInformationWin7x64,
}

const _: () = {
    assert!(size_of::<BlockWin7>() == 0xf0);
    assert!(offset_of!(BlockWin7, load_order_list_head) == 0x10);
    assert!(offset_of!(BlockWin7, kernel_stack) == 0x40);
    assert!(offset_of!(BlockWin7, registry_base) == 0x68);
    assert!(offset_of!(BlockWin7, extension) == 0xb8);
    assert!(offset_of!(BlockWin7, firmware_information) == 0xd0);
};

/// `LOADER_PARAMETER_BLOCK`, Win8: early-launch and core-driver lists and
/// the kernel stack size.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct BlockWin8 {
    pub os_major_version: u32,
    pub os_minor_version: u32,
    pub size: u32,
    pub reserved: u32,
    pub load_order_list_head: ListEntry64,
    pub memory_descriptor_list_head: ListEntry64,
    pub boot_driver_list_head: ListEntry64,
    pub early_launch_list_head: ListEntry64,
    pub core_driver_list_head: ListEntry64,
    pub kernel_stack: u64,
    pub prcb: u64,
    pub process: u64,
    pub thread: u64,
    pub kernel_stack_size: u32,
    pub registry_length: u32,
    pub registry_base: u64,
    pub configuration_root: u64,
    pub arc_boot_device_name: u64,
    pub arc_hal_device_name: u64,
    pub nt_boot_path_name: u64,
    pub nt_hal_path_name: u64,
    pub load_options: u64,
    pub nls_data: u64,
    pub arc_disk_information: u64,
    pub extension: u64,
    pub i386_common_data_area: u64,
    pub i386_machine_type: u32,
    pub i386_virtual_bias: u32,
    pub firmware_information: FirmwareInformationWin8x64,
}

const _: () = {
    assert!(size_of::<BlockWin8>() == 0x118);
    assert!(offset_of!(BlockWin8, early_launch_list_head) == 0x40);
    assert!(offset_of!(BlockWin8, core_driver_list_head) == 0x50);
    assert!(offset_of!(BlockWin8, kernel_stack) == 0x60);
    assert!(offset_of!(BlockWin8, kernel_stack_size) == 0x80);
    assert!(offset_of!(BlockWin8, registry_base) == 0x88);
    assert!(offset_of!(BlockWin8, configuration_root) == 0x90);
    assert!(offset_of!(BlockWin8, extension) == 0xd0);
    assert!(offset_of!(BlockWin8, firmware_information) == 0xe8);
};

/// `LOADER_PARAMETER_BLOCK`, Win8.1.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct BlockWin81 {
    pub os_major_version: u32,
    pub os_minor_version: u32,
    pub size: u32,
    pub reserved: u32,
    pub load_order_list_head: ListEntry64,
    pub memory_descriptor_list_head: ListEntry64,
    pub boot_driver_list_head: ListEntry64,
    pub early_launch_list_head: ListEntry64,
    pub core_driver_list_head: ListEntry64,
    pub kernel_stack: u64,
    pub prcb: u64,
    pub process: u64,
    pub thread: u64,
    pub kernel_stack_size: u32,
    pub registry_length: u32,
    pub registry_base: u64,
    pub configuration_root: u64,
    pub arc_boot_device_name: u64,
    pub arc_hal_device_name: u64,
    pub nt_boot_path_name: u64,
    pub nt_hal_path_name: u64,
    pub load_options: u64,
    pub nls_data: u64,
    pub arc_disk_information: u64,
    pub extension: u64,
    pub i386_common_data_area: u64,
    pub i386_machine_type: u32,
    pub i386_virtual_bias: u32,
    pub firmware_information: FirmwareInformationWin81x64,
}

const _: () = {
    assert!(size_of::<BlockWin81>() == 0x128);
    assert!(offset_of!(BlockWin81, firmware_information) == 0xe8);
};

/// `LOADER_PARAMETER_BLOCK`, Win10: core-extension and TPM-core lists plus
/// the boot-stat path tail.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct BlockWin10 {
    pub os_major_version: u32,
    pub os_minor_version: u32,
    pub size: u32,
    pub os_loader_security_version: u32,
    pub load_order_list_head: ListEntry64,
    pub memory_descriptor_list_head: ListEntry64,
    pub boot_driver_list_head: ListEntry64,
    pub early_launch_list_head: ListEntry64,
    pub core_driver_list_head: ListEntry64,
    pub core_extensions_driver_list_head: ListEntry64,
    pub tpm_core_driver_list_head: ListEntry64,
    pub kernel_stack: u64,
    pub prcb: u64,
    pub process: u64,
    pub thread: u64,
    pub kernel_stack_size: u32,
    pub registry_length: u32,
    pub registry_base: u64,
    pub configuration_root: u64,
    pub arc_boot_device_name: u64,
    pub arc_hal_device_name: u64,
    pub nt_boot_path_name: u64,
    pub nt_hal_path_name: u64,
    pub load_options: u64,
    pub nls_data: u64,
    pub arc_disk_information: u64,
    pub extension: u64,
    pub i386_common_data_area: u64,
    pub i386_machine_type: u32,
    pub i386_virtual_bias: u32,
    pub firmware_information: FirmwareInformationWin81x64,
    pub os_bootstat_path_name: u64,
    pub arc_os_data_device_name: u64,
    pub arc_windows_sys_part_name: u64,
}

const _: () = {
    assert!(size_of::<BlockWin10>() == 0x160);
    assert!(offset_of!(BlockWin10, load_order_list_head) == 0x10);
    assert!(offset_of!(BlockWin10, memory_descriptor_list_head) == 0x20);
    assert!(offset_of!(BlockWin10, boot_driver_list_head) == 0x30);
    assert!(offset_of!(BlockWin10, early_launch_list_head) == 0x40);
    assert!(offset_of!(BlockWin10, core_driver_list_head) == 0x50);
    assert!(offset_of!(BlockWin10, core_extensions_driver_list_head) == 0x60);
    assert!(offset_of!(BlockWin10, tpm_core_driver_list_head) == 0x70);
    assert!(offset_of!(BlockWin10, kernel_stack) == 0x80);
    assert!(offset_of!(BlockWin10, kernel_stack_size) == 0xa0);
    assert!(offset_of!(BlockWin10, registry_base) == 0xa8);
    assert!(offset_of!(BlockWin10, configuration_root) == 0xb0);
    assert!(offset_of!(BlockWin10, nls_data) == 0xe0);
    assert!(offset_of!(BlockWin10, extension) == 0xf0);
    assert!(offset_of!(BlockWin10, firmware_information) == 0x108);
    assert!(offset_of!(BlockWin10, os_bootstat_path_name) == 0x148);
    assert!(offset_of!(BlockWin10, arc_windows_sys_part_name) == 0x158);
};

impl_zeroed!(BlockWs03, BlockVista, BlockWin7, BlockWin8, BlockWin81, BlockWin10);
