//! Loader parameter block layouts for x86 kernels.
//!
//! Mirrors [`block64`](crate::block64) with 32-bit pointer fields. The
//! `i386_*` arm of the architecture union is the live one here: the kernel
//! reads `virtual_bias` when the loader relocated it away from its linked
//! base.

use crate::list::ListEntry32;
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

/// `NLS_DATA_BLOCK`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct NlsDataBlock32 {
    pub ansi_code_page_data: u32,
    pub oem_code_page_data: u32,
    pub unicode_code_page_data: u32,
}

/// `FIRMWARE_INFORMATION_LOADER_BLOCK`, Vista/Win7 shape.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct FirmwareInformationWin7x32 {
    /// Bit 0: firmware is EFI.
    pub firmware_type: u32,
    pub firmware_version: u32,
    pub virtual_efi_runtime_services: u32,
    pub set_virtual_address_map_status: u32,
    pub missed_mappings_count: u32,
}

/// `FIRMWARE_INFORMATION_LOADER_BLOCK`, Win8 shape.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct FirmwareInformationWin8x32 {
    pub firmware_type: u32,
    pub firmware_version: u32,
    pub virtual_efi_runtime_services: u32,
    pub set_virtual_address_map_status: u32,
    pub missed_mappings_count: u32,
    pub firmware_resource_list: ListEntry32,
}

/// `FIRMWARE_INFORMATION_LOADER_BLOCK`, Win8.1+ shape.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct FirmwareInformationWin81x32 {
    pub firmware_type: u32,
    pub firmware_version: u32,
    pub virtual_efi_runtime_services: u32,
    pub set_virtual_address_map_status: u32,
    pub missed_mappings_count: u32,
    pub firmware_resource_list: ListEntry32,
    pub efi_memory_map: u32,
    pub efi_memory_map_size: u32,
    pub efi_memory_map_descriptor_size: u32,
}

/// `LOADER_PARAMETER_BLOCK`, NT 5.2.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct BlockWs03 {
    pub load_order_list_head: ListEntry32,
    pub memory_descriptor_list_head: ListEntry32,
    pub boot_driver_list_head: ListEntry32,
    pub kernel_stack: u32,
    pub prcb: u32,
    pub process: u32,
    pub thread: u32,
    pub registry_length: u32,
    pub registry_base: u32,
    pub configuration_root: u32,
    pub arc_boot_device_name: u32,
    pub arc_hal_device_name: u32,
    pub nt_boot_path_name: u32,
    pub nt_hal_path_name: u32,
    pub load_options: u32,
    pub nls_data: u32,
    pub arc_disk_information: u32,
    pub oem_font_file: u32,
    pub setup_ldr_block: u32,
    pub extension: u32,
    pub i386_common_data_area: u32,
    pub i386_machine_type: u32,
    pub i386_virtual_bias: u32,
}

const _: () = {
    assert!(size_of::<BlockWs03>() == 0x68);
    assert!(offset_of!(BlockWs03, kernel_stack) == 0x18);
    assert!(offset_of!(BlockWs03, registry_length) == 0x28);
    assert!(offset_of!(BlockWs03, configuration_root) == 0x30);
    assert!(offset_of!(BlockWs03, extension) == 0x58);
};

/// `LOADER_PARAMETER_BLOCK`, Vista.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct BlockVista {
    pub load_order_list_head: ListEntry32,
    pub memory_descriptor_list_head: ListEntry32,
    pub boot_driver_list_head: ListEntry32,
    pub kernel_stack: u32,
    pub prcb: u32,
    pub process: u32,
    pub thread: u32,
    pub registry_length: u32,
    pub registry_base: u32,
    pub configuration_root: u32,
    pub arc_boot_device_name: u32,
    pub arc_hal_device_name: u32,
    pub nt_boot_path_name: u32,
    pub nt_hal_path_name: u32,
    pub load_options: u32,
    pub nls_data: u32,
    pub arc_disk_information: u32,
    pub oem_font_file: u32,
    pub setup_ldr_block: u32,
    pub extension: u32,
    pub i386_common_data_area: u32,
    pub i386_machine_type: u32,
    pub i386_virtual_bias: u32,
    pub firmware_information: FirmwareInformationWin7x32,
}

const _: () = {
    assert!(size_of::<BlockVista>() == 0x7c);
    assert!(offset_of!(BlockVista, firmware_information) == 0x68);
};

/// `LOADER_PARAMETER_BLOCK`, Win7.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct BlockWin7 {
    pub os_major_version: u32,
    pub os_minor_version: u32,
    pub size: u32,
    pub reserved: u32,
    pub load_order_list_head: ListEntry32,
    pub memory_descriptor_list_head: ListEntry32,
    pub boot_driver_list_head: ListEntry32,
    pub kernel_stack: u32,
    pub prcb: u32,
    pub process: u32,
    pub thread: u32,
    pub registry_length: u32,
    pub registry_base: u32,
    pub configuration_root: u32,
    pub arc_boot_device_name: u32,
    pub arc_hal_device_name: u32,
    pub nt_boot_path_name: u32,
    pub nt_hal_path_name: u32,
    pub load_options: u32,
    pub nls_data: u32,
    pub arc_disk_information: u32,
    pub oem_font_file: u32,
    pub extension: u32,
    pub i386_common_data_area: u32,
    pub i386_machine_type: u32,
    pub i386_virtual_bias: u32,
    pub firmware_information: FirmwareInformationWin7x32,
}

const _: () = {
    assert!(size_of::<BlockWin7>() == 0x88);
    assert!(offset_of!(BlockWin7, load_order_list_head) == 0x10);
    assert!(offset_of!(BlockWin7, kernel_stack) == 0x28);
    assert!(offset_of!(BlockWin7, extension) == 0x64);
    assert!(offset_of!(BlockWin7, firmware_information) == 0x74);
};

/// `LOADER_PARAMETER_BLOCK`, Win8.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct BlockWin8 {
    pub os_major_version: u32,
    pub os_minor_version: u32,
    pub size: u32,
    pub reserved: u32,
    pub load_order_list_head: ListEntry32,
    pub memory_descriptor_list_head: ListEntry32,
    pub boot_driver_list_head: ListEntry32,
    pub early_launch_list_head: ListEntry32,
    pub core_driver_list_head: ListEntry32,
    pub kernel_stack: u32,
    pub prcb: u32,
    pub process: u32,
    pub thread: u32,
    pub kernel_stack_size: u32,
    pub registry_length: u32,
    pub registry_base: u32,
    pub configuration_root: u32,
    pub arc_boot_device_name: u32,
    pub arc_hal_device_name: u32,
    pub nt_boot_path_name: u32,
    pub nt_hal_path_name: u32,
    pub load_options: u32,
    pub nls_data: u32,
    pub arc_disk_information: u32,
    pub extension: u32,
    pub i386_common_data_area: u32,
    pub i386_machine_type: u32,
    pub i386_virtual_bias: u32,
    pub firmware_information: FirmwareInformationWin8x32,
}

const _: () = {
    assert!(size_of::<BlockWin8>() == 0xa0);
    assert!(offset_of!(BlockWin8, early_launch_list_head) == 0x28);
    assert!(offset_of!(BlockWin8, core_driver_list_head) == 0x30);
    assert!(offset_of!(BlockWin8, kernel_stack) == 0x38);
    assert!(offset_of!(BlockWin8, kernel_stack_size) == 0x48);
    assert!(offset_of!(BlockWin8, registry_base) == 0x50);
    assert!(offset_of!(BlockWin8, extension) == 0x74);
    assert!(offset_of!(BlockWin8, firmware_information) == 0x84);
};

/// `LOADER_PARAMETER_BLOCK`, Win8.1.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct BlockWin81 {
    pub os_major_version: u32,
    pub os_minor_version: u32,
    pub size: u32,
    pub reserved: u32,
    pub load_order_list_head: ListEntry32,
    pub memory_descriptor_list_head: ListEntry32,
    pub boot_driver_list_head: ListEntry32,
    pub early_launch_list_head: ListEntry32,
    pub core_driver_list_head: ListEntry32,
    pub kernel_stack: u32,
    pub prcb: u32,
    pub process: u32,
    pub thread: u32,
    pub kernel_stack_size: u32,
    pub registry_length: u32,
    pub registry_base: u32,
    pub configuration_root: u32,
    pub arc_boot_device_name: u32,
    pub arc_hal_device_name: u32,
    pub nt_boot_path_name: u32,
    pub nt_hal_path_name: u32,
    pub load_options: u32,
    pub nls_data: u32,
    pub arc_disk_information: u32,
    pub extension: u32,
    pub i386_common_data_area: u32,
    pub i386_machine_type: u32,
    pub i386_virtual_bias: u32,
    pub firmware_information: FirmwareInformationWin81x32,
}

const _: () = {
    assert!(size_of::<BlockWin81>() == 0xac);
    assert!(offset_of!(BlockWin81, firmware_information) == 0x84);
};

/// `LOADER_PARAMETER_BLOCK`, Win10.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct BlockWin10 {
    pub os_major_version: u32,
    pub os_minor_version: u32,
    pub size: u32,
    pub os_loader_security_version: u32,
    pub load_order_list_head: ListEntry32,
    pub memory_descriptor_list_head: ListEntry32,
    pub boot_driver_list_head: ListEntry32,
    pub early_launch_list_head: ListEntry32,
    pub core_driver_list_head: ListEntry32,
    pub core_extensions_driver_list_head: ListEntry32,
    pub tpm_core_driver_list_head: ListEntry32,
    pub kernel_stack: u32,
    pub prcb: u32,
    pub process: u32,
    pub thread: u32,
    pub kernel_stack_size: u32,
    pub registry_length: u32,
    pub registry_base: u32,
    pub configuration_root: u32,
    pub arc_boot_device_name: u32,
    pub arc_hal_device_name: u32,
    pub nt_boot_path_name: u32,
    pub nt_hal_path_name: u32,
    pub load_options: u32,
    pub nls_data: u32,
    pub arc_disk_information: u32,
    pub extension: u32,
    pub i386_common_data_area: u32,
    pub i386_machine_type: u32,
    pub i386_virtual_bias: u32,
    pub firmware_information: FirmwareInformationWin81x32,
    pub os_bootstat_path_name: u32,
    pub arc_os_data_device_name: u32,
    pub arc_windows_sys_part_name: u32,
}

const _: () = {
    assert!(size_of::<BlockWin10>() == 0xc8);
    assert!(offset_of!(BlockWin10, core_extensions_driver_list_head) == 0x38);
    assert!(offset_of!(BlockWin10, tpm_core_driver_list_head) == 0x40);
    assert!(offset_of!(BlockWin10, kernel_stack) == 0x48);
    assert!(offset_of!(BlockWin10, kernel_stack_size) == 0x58);
    assert!(offset_of!(BlockWin10, registry_base) == 0x60);
    assert!(offset_of!(BlockWin10, configuration_root) == 0x64);
    assert!(offset_of!(BlockWin10, nls_data) == 0x7c);
    assert!(offset_of!(BlockWin10, extension) == 0x84);
    assert!(offset_of!(BlockWin10, firmware_information) == 0x94);
    assert!(offset_of!(BlockWin10, os_bootstat_path_name) == 0xbc);
    assert!(offset_of!(BlockWin10, arc_windows_sys_part_name) == 0xc4);
};

impl_zeroed!(BlockWs03, BlockVista, BlockWin7, BlockWin8, BlockWin81, BlockWin10);
