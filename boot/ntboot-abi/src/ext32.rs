//! Loader extension layouts for x86 kernels.
//!
//! Same flattening approach as [`ext64`](crate::ext64); pointer fields are
//! `u32` kernel VAs. The x86 variants carry two fields their 64-bit
//! counterparts lack (`halp_irql_to_tpr`/`halp_vector_to_irql`, HAL interrupt
//! translation tables patched by the kernel) and lack the hypercall/HAL
//! mapping and mini-executive fields introduced for 64-bit hosts.

use crate::list::{Guid, ListEntry32, UnicodeString32};
use crate::shared::{
    EntropyResult7, EntropyResult8, EntropyResult8Kd, EntropyResult10, HypervisorExtension,
    HypervisorExtension1809, LoaderBootFlags, LoaderHiveRecoveryInfo, LoaderPerformanceData1809,
    LoaderPerformanceData1903, LoaderResetReason, OfflineCrashdumpTable10, OfflineCrashdumpTable81,
    ProfileParameterBlock, TpmBootEntropyLdrResult, VsmPerformanceData,
};
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

/// `LOADER_PARAMETER_EXTENSION`, NT 5.2.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct ExtensionWs03 {
    pub size: u32,
    pub profile: ProfileParameterBlock,
    pub major_version: u32,
    pub minor_version: u32,
    pub em_inf_file_image: u32,
    pub em_inf_file_size: u32,
    pub triage_dump_block: u32,
    pub loader_pages_spanned: u32,
    pub headless_loader_block: u32,
    pub smbios_eps_header: u32,
    pub drvdb_image: u32,
    pub drvdb_size: u32,
    pub network_loader_block: u32,
    pub halp_irql_to_tpr: u32,
    pub halp_vector_to_irql: u32,
    pub firmware_descriptor_list_head: ListEntry32,
    pub acpi_table: u32,
    pub acpi_table_size: u32,
}

const _: () = {
    assert!(size_of::<ExtensionWs03>() == 0x58);
    assert!(offset_of!(ExtensionWs03, em_inf_file_image) == 0x1c);
    assert!(offset_of!(ExtensionWs03, loader_pages_spanned) == 0x28);
    assert!(offset_of!(ExtensionWs03, firmware_descriptor_list_head) == 0x48);
    assert!(offset_of!(ExtensionWs03, acpi_table_size) == 0x54);
};

/// `LOADER_PARAMETER_EXTENSION`, Vista RTM/SP1.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct ExtensionVista {
    pub size: u32,
    pub profile: ProfileParameterBlock,
    pub major_version: u32,
    pub minor_version: u32,
    pub em_inf_file_image: u32,
    pub em_inf_file_size: u32,
    pub triage_dump_block: u32,
    pub loader_pages_spanned: u32,
    pub headless_loader_block: u32,
    pub smbios_eps_header: u32,
    pub drvdb_image: u32,
    pub drvdb_size: u32,
    pub network_loader_block: u32,
    pub halp_irql_to_tpr: u32,
    pub halp_vector_to_irql: u32,
    pub firmware_descriptor_list_head: ListEntry32,
    pub acpi_table: u32,
    pub acpi_table_size: u32,
    pub loader_flags: LoaderBootFlags,
    pub loader_performance_data: u32,
    pub boot_application_persistent_data: ListEntry32,
    pub wmd_test_result: u32,
    pub boot_identifier: Guid,
}

const _: () = {
    assert!(size_of::<ExtensionVista>() == 0x7c);
    assert!(offset_of!(ExtensionVista, loader_performance_data) == 0x5c);
    assert!(offset_of!(ExtensionVista, wmd_test_result) == 0x68);
    assert!(offset_of!(ExtensionVista, boot_identifier) == 0x6c);
};

/// `LOADER_PARAMETER_EXTENSION`, Vista SP2.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct ExtensionVistaSp2 {
    pub size: u32,
    pub profile: ProfileParameterBlock,
    pub major_version: u32,
    pub minor_version: u32,
    pub em_inf_file_image: u32,
    pub em_inf_file_size: u32,
    pub triage_dump_block: u32,
    pub loader_pages_spanned: u32,
    pub headless_loader_block: u32,
    pub smbios_eps_header: u32,
    pub drvdb_image: u32,
    pub drvdb_size: u32,
    pub network_loader_block: u32,
    pub halp_irql_to_tpr: u32,
    pub halp_vector_to_irql: u32,
    pub firmware_descriptor_list_head: ListEntry32,
    pub acpi_table: u32,
    pub acpi_table_size: u32,
    pub loader_flags: LoaderBootFlags,
    pub loader_performance_data: u32,
    pub boot_application_persistent_data: ListEntry32,
    pub wmd_test_result: u32,
    pub boot_identifier: Guid,
    pub resume_pages: u32,
    pub dump_header: u32,
}

const _: () = {
    assert!(size_of::<ExtensionVistaSp2>() == 0x84);
    assert!(offset_of!(ExtensionVistaSp2, resume_pages) == 0x7c);
    assert!(offset_of!(ExtensionVistaSp2, dump_header) == 0x80);
};

/// `LOADER_PARAMETER_EXTENSION`, Win7.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct ExtensionWin7 {
    pub size: u32,
    pub profile: ProfileParameterBlock,
    pub em_inf_file_image: u32,
    pub em_inf_file_size: u32,
    pub triage_dump_block: u32,
    pub loader_pages_spanned: u32,
    pub headless_loader_block: u32,
    pub smbios_eps_header: u32,
    pub drvdb_image: u32,
    pub drvdb_size: u32,
    pub network_loader_block: u32,
    pub halp_irql_to_tpr: u32,
    pub halp_vector_to_irql: u32,
    pub firmware_descriptor_list_head: ListEntry32,
    pub acpi_table: u32,
    pub acpi_table_size: u32,
    pub loader_flags: LoaderBootFlags,
    pub loader_performance_data: u32,
    pub boot_application_persistent_data: ListEntry32,
    pub wmd_test_result: u32,
    pub boot_identifier: Guid,
    pub resume_pages: u32,
    pub dump_header: u32,
    pub bg_context: u32,
    pub numa_locality_info: u32,
    pub numa_group_assignment: u32,
    pub attached_hives: ListEntry32,
    pub memory_caching_requirements_count: u32,
    pub memory_caching_requirements: u32,
    pub tpm_boot_entropy_result: TpmBootEntropyLdrResult,
    pub processor_counter_frequency: u64,
}

const _: () = {
    assert!(size_of::<ExtensionWin7>() == 0xe8);
    assert!(offset_of!(ExtensionWin7, em_inf_file_image) == 0x14);
    assert!(offset_of!(ExtensionWin7, loader_performance_data) == 0x54);
    assert!(offset_of!(ExtensionWin7, resume_pages) == 0x74);
    assert!(offset_of!(ExtensionWin7, attached_hives) == 0x88);
    assert!(offset_of!(ExtensionWin7, tpm_boot_entropy_result) == 0x98);
    assert!(offset_of!(ExtensionWin7, processor_counter_frequency) == 0xe0);
};

/// `LOADER_PARAMETER_EXTENSION`, Win8.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct ExtensionWin8 {
    pub size: u32,
    pub profile: ProfileParameterBlock,
    pub em_inf_file_image: u32,
    pub em_inf_file_size: u32,
    pub triage_dump_block: u32,
    pub headless_loader_block: u32,
    pub smbios_eps_header: u32,
    pub drvdb_image: u32,
    pub drvdb_size: u32,
    pub network_loader_block: u32,
    pub halp_irql_to_tpr: u32,
    pub halp_vector_to_irql: u32,
    pub firmware_descriptor_list_head: ListEntry32,
    pub acpi_table: u32,
    pub acpi_table_size: u32,
    pub loader_flags: LoaderBootFlags,
    pub loader_performance_data: u32,
    pub boot_application_persistent_data: ListEntry32,
    pub wmd_test_result: u32,
    pub boot_identifier: Guid,
    pub resume_pages: u32,
    pub dump_header: u32,
    pub bg_context: u32,
    pub numa_locality_info: u32,
    pub numa_group_assignment: u32,
    pub attached_hives: ListEntry32,
    pub memory_caching_requirements_count: u32,
    pub memory_caching_requirements: u32,
    pub pad1: u32,
    pub boot_entropy_result: EntropyResult7,
    pub processor_counter_frequency: u64,
    pub hypervisor_extension: HypervisorExtension,
    pub hardware_configuration_id: Guid,
    pub hal_extension_module_list: ListEntry32,
    pub system_time: i64,
    pub time_stamp_at_system_time_read: u64,
    pub boot_flags: u64,
    pub internal_boot_flags: u64,
    pub wfs_fp_data: u32,
    pub wfs_fp_data_size: u32,
    pub unknown: [u8; 0x30],
    pub acpi_bios_version: UnicodeString32,
    pub smbios_version: UnicodeString32,
    pub efi_version: UnicodeString32,
}

const _: () = {
    assert!(size_of::<ExtensionWin8>() == 0x870);
    assert!(offset_of!(ExtensionWin8, headless_loader_block) == 0x20);
    assert!(offset_of!(ExtensionWin8, boot_entropy_result) == 0x98);
    assert!(offset_of!(ExtensionWin8, processor_counter_frequency) == 0x7a8);
    assert!(offset_of!(ExtensionWin8, hypervisor_extension) == 0x7b0);
    assert!(offset_of!(ExtensionWin8, hardware_configuration_id) == 0x7e8);
    assert!(offset_of!(ExtensionWin8, wfs_fp_data_size) == 0x824);
    assert!(offset_of!(ExtensionWin8, acpi_bios_version) == 0x858);
};

/// `LOADER_PARAMETER_EXTENSION`, Win8.1.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct ExtensionWin81 {
    pub size: u32,
    pub profile: ProfileParameterBlock,
    pub em_inf_file_image: u32,
    pub em_inf_file_size: u32,
    pub triage_dump_block: u32,
    pub headless_loader_block: u32,
    pub smbios_eps_header: u32,
    pub drvdb_image: u32,
    pub drvdb_size: u32,
    pub network_loader_block: u32,
    pub halp_irql_to_tpr: u32,
    pub halp_vector_to_irql: u32,
    pub firmware_descriptor_list_head: ListEntry32,
    pub acpi_table: u32,
    pub acpi_table_size: u32,
    pub loader_flags: LoaderBootFlags,
    pub loader_performance_data: u32,
    pub boot_application_persistent_data: ListEntry32,
    pub wmd_test_result: u32,
    pub boot_identifier: Guid,
    pub resume_pages: u32,
    pub dump_header: u32,
    pub bg_context: u32,
    pub numa_locality_info: u32,
    pub numa_group_assignment: u32,
    pub attached_hives: ListEntry32,
    pub memory_caching_requirements_count: u32,
    pub memory_caching_requirements: u32,
    pub pad1: u32,
    pub boot_entropy_result: EntropyResult8,
    pub processor_counter_frequency: u64,
    pub hypervisor_extension: HypervisorExtension,
    pub hardware_configuration_id: Guid,
    pub hal_extension_module_list: ListEntry32,
    pub system_time: i64,
    pub time_stamp_at_system_time_read: u64,
    pub boot_flags: u64,
    pub internal_boot_flags: u64,
    pub wfs_fp_data: u32,
    pub wfs_fp_data_size: u32,
    pub bugcheck_code: u32,
    pub bugcheck_parameter1: u32,
    pub bugcheck_parameter2: u32,
    pub bugcheck_parameter3: u32,
    pub bugcheck_parameter4: u32,
    pub api_set_schema: u32,
    pub api_set_schema_size: u32,
    pub api_set_schema_extensions: ListEntry32,
    pub acpi_bios_version: UnicodeString32,
    pub smbios_version: UnicodeString32,
    pub efi_version: UnicodeString32,
    pub kd_debug_device: u32,
    pub offline_crashdump_table: OfflineCrashdumpTable81,
    pub pad2: u32,
    pub pad3: [u32; 4],
}

const _: () = {
    assert!(size_of::<ExtensionWin81>() == 0x8f0);
    assert!(offset_of!(ExtensionWin81, boot_entropy_result) == 0x98);
    assert!(offset_of!(ExtensionWin81, processor_counter_frequency) == 0x810);
    assert!(offset_of!(ExtensionWin81, hardware_configuration_id) == 0x850);
    assert!(offset_of!(ExtensionWin81, bugcheck_code) == 0x890);
    assert!(offset_of!(ExtensionWin81, api_set_schema) == 0x8a4);
    assert!(offset_of!(ExtensionWin81, acpi_bios_version) == 0x8b4);
    assert!(offset_of!(ExtensionWin81, kd_debug_device) == 0x8cc);
    assert!(offset_of!(ExtensionWin81, offline_crashdump_table) == 0x8d0);
};

/// `LOADER_PARAMETER_EXTENSION`, Win10 1507/1511.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct ExtensionWin10 {
    pub size: u32,
    pub profile: ProfileParameterBlock,
    pub em_inf_file_image: u32,
    pub em_inf_file_size: u32,
    pub triage_dump_block: u32,
    pub headless_loader_block: u32,
    pub smbios_eps_header: u32,
    pub drvdb_image: u32,
    pub drvdb_size: u32,
    pub network_loader_block: u32,
    pub halp_irql_to_tpr: u32,
    pub halp_vector_to_irql: u32,
    pub firmware_descriptor_list_head: ListEntry32,
    pub acpi_table: u32,
    pub acpi_table_size: u32,
    pub loader_flags: LoaderBootFlags,
    pub loader_performance_data: u32,
    pub boot_application_persistent_data: ListEntry32,
    pub wmd_test_result: u32,
    pub boot_identifier: Guid,
    pub resume_pages: u32,
    pub dump_header: u32,
    pub bg_context: u32,
    pub numa_locality_info: u32,
    pub numa_group_assignment: u32,
    pub attached_hives: ListEntry32,
    pub memory_caching_requirements_count: u32,
    pub memory_caching_requirements: u32,
    pub pad1: u32,
    pub boot_entropy_result: EntropyResult8,
    pub processor_counter_frequency: u64,
    pub hypervisor_extension: HypervisorExtension,
    pub hardware_configuration_id: Guid,
    pub hal_extension_module_list: ListEntry32,
    pub system_time: i64,
    pub time_stamp_at_system_time_read: u64,
    pub boot_flags: u64,
    pub internal_boot_flags: u64,
    pub wfs_fp_data: u32,
    pub wfs_fp_data_size: u32,
    pub bugcheck_code: u32,
    pub bugcheck_parameter1: u32,
    pub bugcheck_parameter2: u32,
    pub bugcheck_parameter3: u32,
    pub bugcheck_parameter4: u32,
    pub api_set_schema: u32,
    pub api_set_schema_size: u32,
    pub api_set_schema_extensions: ListEntry32,
    pub acpi_bios_version: UnicodeString32,
    pub smbios_version: UnicodeString32,
    pub efi_version: UnicodeString32,
    pub kd_debug_device: u32,
    pub offline_crashdump_table: OfflineCrashdumpTable10,
    pub manufacturing_profile: UnicodeString32,
    pub bbt_buffer: u32,
    pub pad2: u32,
    pub xsave_allowed_features: u64,
    pub xsave_flags: u32,
    pub boot_options: u32,
    pub boot_id: u32,
    pub code_integrity_data: u32,
    pub code_integrity_data_size: u32,
    pub system_hive_recovery_info: LoaderHiveRecoveryInfo,
}

const _: () = {
    assert!(size_of::<ExtensionWin10>() == 0x930);
    assert!(offset_of!(ExtensionWin10, kd_debug_device) == 0x8cc);
    assert!(offset_of!(ExtensionWin10, offline_crashdump_table) == 0x8d0);
    assert!(offset_of!(ExtensionWin10, manufacturing_profile) == 0x8f0);
    assert!(offset_of!(ExtensionWin10, xsave_allowed_features) == 0x900);
    assert!(offset_of!(ExtensionWin10, boot_options) == 0x90c);
    assert!(offset_of!(ExtensionWin10, boot_id) == 0x910);
    assert!(offset_of!(ExtensionWin10, code_integrity_data) == 0x914);
    assert!(offset_of!(ExtensionWin10, system_hive_recovery_info) == 0x91c);
};

/// `LOADER_PARAMETER_EXTENSION`, Win10 1607.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct ExtensionWin10Rs1 {
    pub size: u32,
    pub profile: ProfileParameterBlock,
    pub em_inf_file_image: u32,
    pub em_inf_file_size: u32,
    pub triage_dump_block: u32,
    pub headless_loader_block: u32,
    pub smbios_eps_header: u32,
    pub drvdb_image: u32,
    pub drvdb_size: u32,
    pub network_loader_block: u32,
    pub halp_irql_to_tpr: u32,
    pub halp_vector_to_irql: u32,
    pub firmware_descriptor_list_head: ListEntry32,
    pub acpi_table: u32,
    pub acpi_table_size: u32,
    pub loader_flags: LoaderBootFlags,
    pub loader_performance_data: u32,
    pub boot_application_persistent_data: ListEntry32,
    pub wmd_test_result: u32,
    pub boot_identifier: Guid,
    pub resume_pages: u32,
    pub dump_header: u32,
    pub bg_context: u32,
    pub numa_locality_info: u32,
    pub numa_group_assignment: u32,
    pub attached_hives: ListEntry32,
    pub memory_caching_requirements_count: u32,
    pub memory_caching_requirements: u32,
    pub pad1: u32,
    pub boot_entropy_result: EntropyResult8,
    pub processor_counter_frequency: u64,
    pub hypervisor_extension: HypervisorExtension,
    pub hardware_configuration_id: Guid,
    pub hal_extension_module_list: ListEntry32,
    pub system_time: i64,
    pub time_stamp_at_system_time_read: u64,
    pub boot_flags: u64,
    pub internal_boot_flags: u64,
    pub wfs_fp_data: u32,
    pub wfs_fp_data_size: u32,
    pub bugcheck_code: u32,
    pub bugcheck_parameter1: u32,
    pub bugcheck_parameter2: u32,
    pub bugcheck_parameter3: u32,
    pub bugcheck_parameter4: u32,
    pub api_set_schema: u32,
    pub api_set_schema_size: u32,
    pub api_set_schema_extensions: ListEntry32,
    pub acpi_bios_version: UnicodeString32,
    pub smbios_version: UnicodeString32,
    pub efi_version: UnicodeString32,
    pub kd_debug_device: u32,
    pub offline_crashdump_table: OfflineCrashdumpTable10,
    pub manufacturing_profile: UnicodeString32,
    pub bbt_buffer: u32,
    pub pad2: u32,
    pub xsave_allowed_features: u64,
    pub xsave_flags: u32,
    pub boot_options: u32,
    pub ium_enablement: u32,
    pub ium_policy: u32,
    pub ium_status: u32,
    pub boot_id: u32,
    pub code_integrity_data: u32,
    pub code_integrity_data_size: u32,
    pub system_hive_recovery_info: LoaderHiveRecoveryInfo,
    pub soft_restart_count: u32,
    pub soft_restart_time: i64,
    pub major_release: u32,
    pub reserved1: u32,
}

const _: () = {
    assert!(size_of::<ExtensionWin10Rs1>() == 0x950);
    assert!(offset_of!(ExtensionWin10Rs1, ium_enablement) == 0x910);
    assert!(offset_of!(ExtensionWin10Rs1, boot_id) == 0x91c);
    assert!(offset_of!(ExtensionWin10Rs1, system_hive_recovery_info) == 0x928);
    assert!(offset_of!(ExtensionWin10Rs1, soft_restart_count) == 0x93c);
    assert!(offset_of!(ExtensionWin10Rs1, soft_restart_time) == 0x940);
    assert!(offset_of!(ExtensionWin10Rs1, major_release) == 0x948);
};

/// `LOADER_PARAMETER_EXTENSION`, Win10 1703 (also 1709/1803).
#[repr(C)]
#[derive(Copy, Clone)]
pub struct ExtensionWin10Rs2 {
    pub size: u32,
    pub profile: ProfileParameterBlock,
    pub em_inf_file_image: u32,
    pub em_inf_file_size: u32,
    pub triage_dump_block: u32,
    pub headless_loader_block: u32,
    pub smbios_eps_header: u32,
    pub drvdb_image: u32,
    pub drvdb_size: u32,
    pub network_loader_block: u32,
    pub halp_irql_to_tpr: u32,
    pub halp_vector_to_irql: u32,
    pub firmware_descriptor_list_head: ListEntry32,
    pub acpi_table: u32,
    pub acpi_table_size: u32,
    pub loader_flags: LoaderBootFlags,
    pub loader_performance_data: u32,
    pub boot_application_persistent_data: ListEntry32,
    pub wmd_test_result: u32,
    pub boot_identifier: Guid,
    pub resume_pages: u32,
    pub dump_header: u32,
    pub bg_context: u32,
    pub numa_locality_info: u32,
    pub numa_group_assignment: u32,
    pub attached_hives: ListEntry32,
    pub memory_caching_requirements_count: u32,
    pub memory_caching_requirements: u32,
    pub pad1: u32,
    pub boot_entropy_result: EntropyResult8Kd,
    pub processor_counter_frequency: u64,
    pub hypervisor_extension: HypervisorExtension,
    pub hardware_configuration_id: Guid,
    pub hal_extension_module_list: ListEntry32,
    pub system_time: i64,
    pub time_stamp_at_system_time_read: u64,
    pub boot_flags: u64,
    pub internal_boot_flags: u64,
    pub wfs_fp_data: u32,
    pub wfs_fp_data_size: u32,
    pub bugcheck_code: u32,
    pub bugcheck_parameter1: u32,
    pub bugcheck_parameter2: u32,
    pub bugcheck_parameter3: u32,
    pub bugcheck_parameter4: u32,
    pub api_set_schema: u32,
    pub api_set_schema_size: u32,
    pub api_set_schema_extensions: ListEntry32,
    pub acpi_bios_version: UnicodeString32,
    pub smbios_version: UnicodeString32,
    pub efi_version: UnicodeString32,
    pub kd_debug_device: u32,
    pub offline_crashdump_table: OfflineCrashdumpTable10,
    pub manufacturing_profile: UnicodeString32,
    pub bbt_buffer: u32,
    pub pad2: u32,
    pub xsave_allowed_features: u64,
    pub xsave_flags: u32,
    pub boot_options: u32,
    pub ium_enablement: u32,
    pub ium_policy: u32,
    pub ium_status: u32,
    pub boot_id: u32,
    pub code_integrity_data: u32,
    pub code_integrity_data_size: u32,
    pub system_hive_recovery_info: LoaderHiveRecoveryInfo,
    pub soft_restart_count: u32,
    pub soft_restart_time: i64,
    pub major_release: u32,
    pub reserved1: u32,
    pub nt_build_lab: [u8; 0xe0],
    pub nt_build_lab_ex: [u8; 0xe0],
    pub reset_reason: LoaderResetReason,
    pub max_pci_bus_number: u32,
    pub pad3: u32,
}

const _: () = {
    assert!(size_of::<ExtensionWin10Rs2>() == 0xb68);
    assert!(offset_of!(ExtensionWin10Rs2, boot_entropy_result) == 0x98);
    assert!(offset_of!(ExtensionWin10Rs2, processor_counter_frequency) == 0x830);
    assert!(offset_of!(ExtensionWin10Rs2, kd_debug_device) == 0x8ec);
    assert!(offset_of!(ExtensionWin10Rs2, ium_enablement) == 0x930);
    assert!(offset_of!(ExtensionWin10Rs2, soft_restart_time) == 0x960);
    assert!(offset_of!(ExtensionWin10Rs2, major_release) == 0x968);
    assert!(offset_of!(ExtensionWin10Rs2, nt_build_lab) == 0x970);
    assert!(offset_of!(ExtensionWin10Rs2, reset_reason) == 0xb30);
    assert!(offset_of!(ExtensionWin10Rs2, max_pci_bus_number) == 0xb60);
};

/// `LOADER_PARAMETER_EXTENSION`, Win10 1809.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct ExtensionWin10Rs5 {
    pub size: u32,
    pub profile: ProfileParameterBlock,
    pub em_inf_file_image: u32,
    pub em_inf_file_size: u32,
    pub triage_dump_block: u32,
    pub headless_loader_block: u32,
    pub smbios_eps_header: u32,
    pub drvdb_image: u32,
    pub drvdb_size: u32,
    pub network_loader_block: u32,
    pub halp_irql_to_tpr: u32,
    pub halp_vector_to_irql: u32,
    pub firmware_descriptor_list_head: ListEntry32,
    pub acpi_table: u32,
    pub acpi_table_size: u32,
    pub loader_flags: LoaderBootFlags,
    pub loader_performance_data: LoaderPerformanceData1809,
    pub boot_application_persistent_data: ListEntry32,
    pub wmd_test_result: u32,
    pub boot_identifier: Guid,
    pub resume_pages: u32,
    pub dump_header: u32,
    pub bg_context: u32,
    pub numa_locality_info: u32,
    pub numa_group_assignment: u32,
    pub attached_hives: ListEntry32,
    pub memory_caching_requirements_count: u32,
    pub memory_caching_requirements: u32,
    pub boot_entropy_result: EntropyResult10,
    pub processor_counter_frequency: u64,
    pub hypervisor_extension: HypervisorExtension1809,
    pub hardware_configuration_id: Guid,
    pub hal_extension_module_list: ListEntry32,
    pub system_time: i64,
    pub time_stamp_at_system_time_read: u64,
    pub boot_flags: u64,
    pub internal_boot_flags: u64,
    pub wfs_fp_data: u32,
    pub wfs_fp_data_size: u32,
    pub bugcheck_code: u32,
    pub bugcheck_parameter1: u32,
    pub bugcheck_parameter2: u32,
    pub bugcheck_parameter3: u32,
    pub bugcheck_parameter4: u32,
    pub api_set_schema: u32,
    pub api_set_schema_size: u32,
    pub api_set_schema_extensions: ListEntry32,
    pub acpi_bios_version: UnicodeString32,
    pub smbios_version: UnicodeString32,
    pub efi_version: UnicodeString32,
    pub kd_debug_device: u32,
    pub offline_crashdump_table: OfflineCrashdumpTable10,
    pub manufacturing_profile: UnicodeString32,
    pub bbt_buffer: u32,
    pub pad1: u32,
    pub xsave_allowed_features: u64,
    pub xsave_flags: u32,
    pub boot_options: u32,
    pub ium_enablement: u32,
    pub ium_policy: u32,
    pub ium_status: u32,
    pub boot_id: u32,
    pub code_integrity_data: u32,
    pub code_integrity_data_size: u32,
    pub system_hive_recovery_info: LoaderHiveRecoveryInfo,
    pub soft_restart_count: u32,
    pub soft_restart_time: i64,
    pub leap_second_data: u32,
    pub major_release: u32,
    pub reserved1: u32,
    pub nt_build_lab: [u8; 0xe0],
    pub nt_build_lab_ex: [u8; 0xe0],
    pub pad2: u32,
    pub reset_reason: LoaderResetReason,
    pub max_pci_bus_number: u32,
    pub feature_settings: u32,
}

const _: () = {
    assert!(size_of::<ExtensionWin10Rs5>() == 0xc88);
    assert!(offset_of!(ExtensionWin10Rs5, loader_performance_data) == 0x50);
    assert!(offset_of!(ExtensionWin10Rs5, boot_application_persistent_data) == 0x98);
    assert!(offset_of!(ExtensionWin10Rs5, boot_entropy_result) == 0xd8);
    assert!(offset_of!(ExtensionWin10Rs5, processor_counter_frequency) == 0x940);
    assert!(offset_of!(ExtensionWin10Rs5, soft_restart_time) == 0xa78);
    assert!(offset_of!(ExtensionWin10Rs5, leap_second_data) == 0xa80);
    assert!(offset_of!(ExtensionWin10Rs5, nt_build_lab) == 0xa8c);
    assert!(offset_of!(ExtensionWin10Rs5, reset_reason) == 0xc50);
    assert!(offset_of!(ExtensionWin10Rs5, feature_settings) == 0xc84);
};

/// `LOADER_PARAMETER_EXTENSION`, Win10 1903/1909.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct ExtensionWin10V1903 {
    pub size: u32,
    pub profile: ProfileParameterBlock,
    pub em_inf_file_image: u32,
    pub em_inf_file_size: u32,
    pub triage_dump_block: u32,
    pub headless_loader_block: u32,
    pub smbios_eps_header: u32,
    pub drvdb_image: u32,
    pub drvdb_size: u32,
    pub network_loader_block: u32,
    pub halp_irql_to_tpr: u32,
    pub halp_vector_to_irql: u32,
    pub firmware_descriptor_list_head: ListEntry32,
    pub acpi_table: u32,
    pub acpi_table_size: u32,
    pub loader_flags: LoaderBootFlags,
    pub loader_performance_data: LoaderPerformanceData1903,
    pub boot_application_persistent_data: ListEntry32,
    pub wmd_test_result: u32,
    pub boot_identifier: Guid,
    pub resume_pages: u32,
    pub dump_header: u32,
    pub bg_context: u32,
    pub numa_locality_info: u32,
    pub numa_group_assignment: u32,
    pub attached_hives: ListEntry32,
    pub memory_caching_requirements_count: u32,
    pub memory_caching_requirements: u32,
    pub boot_entropy_result: EntropyResult10,
    pub processor_counter_frequency: u64,
    pub hypervisor_extension: HypervisorExtension1809,
    pub hardware_configuration_id: Guid,
    pub hal_extension_module_list: ListEntry32,
    pub system_time: i64,
    pub time_stamp_at_system_time_read: u64,
    pub boot_flags: u64,
    pub internal_boot_flags: u64,
    pub wfs_fp_data: u32,
    pub wfs_fp_data_size: u32,
    pub bugcheck_code: u32,
    pub bugcheck_parameter1: u32,
    pub bugcheck_parameter2: u32,
    pub bugcheck_parameter3: u32,
    pub bugcheck_parameter4: u32,
    pub api_set_schema: u32,
    pub api_set_schema_size: u32,
    pub api_set_schema_extensions: ListEntry32,
    pub acpi_bios_version: UnicodeString32,
    pub smbios_version: UnicodeString32,
    pub efi_version: UnicodeString32,
    pub kd_debug_device: u32,
    pub offline_crashdump_table: OfflineCrashdumpTable10,
    pub manufacturing_profile: UnicodeString32,
    pub bbt_buffer: u32,
    pub pad1: u32,
    pub xsave_allowed_features: u64,
    pub xsave_flags: u32,
    pub boot_options: u32,
    pub ium_enablement: u32,
    pub ium_policy: u32,
    pub ium_status: u32,
    pub boot_id: u32,
    pub code_integrity_data: u32,
    pub code_integrity_data_size: u32,
    pub system_hive_recovery_info: LoaderHiveRecoveryInfo,
    pub soft_restart_count: u32,
    pub soft_restart_time: i64,
    pub leap_second_data: u32,
    pub major_release: u32,
    pub reserved1: u32,
    pub nt_build_lab: [u8; 0xe0],
    pub nt_build_lab_ex: [u8; 0xe0],
    pub pad2: u32,
    pub reset_reason: LoaderResetReason,
    pub max_pci_bus_number: u32,
    pub feature_settings: u32,
    pub hot_patch_reserve_size: u32,
    pub retpoline_reserve_size: u32,
    pub vsm_performance_data: VsmPerformanceData,
}

const _: () = {
    assert!(size_of::<ExtensionWin10V1903>() == 0xce8);
    assert!(offset_of!(ExtensionWin10V1903, boot_entropy_result) == 0xf0);
    assert!(offset_of!(ExtensionWin10V1903, leap_second_data) == 0xa98);
    assert!(offset_of!(ExtensionWin10V1903, nt_build_lab) == 0xaa4);
    assert!(offset_of!(ExtensionWin10V1903, hot_patch_reserve_size) == 0xca0);
    assert!(offset_of!(ExtensionWin10V1903, vsm_performance_data) == 0xca8);
};

/// `LOADER_PARAMETER_EXTENSION`, Win10 2004.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct ExtensionWin10V2004 {
    pub size: u32,
    pub profile: ProfileParameterBlock,
    pub em_inf_file_image: u32,
    pub em_inf_file_size: u32,
    pub triage_dump_block: u32,
    pub headless_loader_block: u32,
    pub smbios_eps_header: u32,
    pub drvdb_image: u32,
    pub drvdb_size: u32,
    pub drvdb_patch_image: u32,
    pub drvdb_patch_size: u32,
    pub network_loader_block: u32,
    pub halp_irql_to_tpr: u32,
    pub halp_vector_to_irql: u32,
    pub firmware_descriptor_list_head: ListEntry32,
    pub acpi_table: u32,
    pub acpi_table_size: u32,
    pub loader_flags: LoaderBootFlags,
    pub loader_performance_data: LoaderPerformanceData1903,
    pub boot_application_persistent_data: ListEntry32,
    pub wmd_test_result: u32,
    pub boot_identifier: Guid,
    pub resume_pages: u32,
    pub dump_header: u32,
    pub bg_context: u32,
    pub numa_locality_info: u32,
    pub numa_group_assignment: u32,
    pub attached_hives: ListEntry32,
    pub memory_caching_requirements_count: u32,
    pub memory_caching_requirements: u32,
    pub boot_entropy_result: EntropyResult10,
    pub processor_counter_frequency: u64,
    pub hypervisor_extension: HypervisorExtension1809,
    pub hardware_configuration_id: Guid,
    pub hal_extension_module_list: ListEntry32,
    pub system_time: i64,
    pub time_stamp_at_system_time_read: u64,
    pub boot_flags: u64,
    pub internal_boot_flags: u64,
    pub wfs_fp_data: u32,
    pub wfs_fp_data_size: u32,
    pub bugcheck_code: u32,
    pub bugcheck_parameter1: u32,
    pub bugcheck_parameter2: u32,
    pub bugcheck_parameter3: u32,
    pub bugcheck_parameter4: u32,
    pub api_set_schema: u32,
    pub api_set_schema_size: u32,
    pub api_set_schema_extensions: ListEntry32,
    pub acpi_bios_version: UnicodeString32,
    pub smbios_version: UnicodeString32,
    pub efi_version: UnicodeString32,
    pub kd_debug_device: u32,
    pub offline_crashdump_table: OfflineCrashdumpTable10,
    pub manufacturing_profile: UnicodeString32,
    pub bbt_buffer: u32,
    pub pad1: u32,
    pub xsave_allowed_features: u64,
    pub xsave_flags: u32,
    pub boot_options: u32,
    pub ium_enablement: u32,
    pub ium_policy: u32,
    pub ium_status: u32,
    pub boot_id: u32,
    pub code_integrity_data: u32,
    pub code_integrity_data_size: u32,
    pub system_hive_recovery_info: LoaderHiveRecoveryInfo,
    pub soft_restart_count: u32,
    pub soft_restart_time: i64,
    pub leap_second_data: u32,
    pub major_release: u32,
    pub reserved1: u32,
    pub nt_build_lab: [u8; 0xe0],
    pub nt_build_lab_ex: [u8; 0xe0],
    pub pad2: u32,
    pub reset_reason: LoaderResetReason,
    pub max_pci_bus_number: u32,
    pub feature_settings: u32,
    pub hot_patch_reserve_size: u32,
    pub retpoline_reserve_size: u32,
    pub vsm_performance_data: VsmPerformanceData,
    pub numa_memory_ranges: u32,
    pub numa_memory_range_count: u32,
    pub iommu_fault_policy: u32,
    pub pad3: u32,
}

const _: () = {
    assert!(size_of::<ExtensionWin10V2004>() == 0xd00);
    assert!(offset_of!(ExtensionWin10V2004, drvdb_patch_image) == 0x30);
    assert!(offset_of!(ExtensionWin10V2004, network_loader_block) == 0x38);
    assert!(offset_of!(ExtensionWin10V2004, boot_entropy_result) == 0xf8);
    assert!(offset_of!(ExtensionWin10V2004, vsm_performance_data) == 0xcb0);
    assert!(offset_of!(ExtensionWin10V2004, numa_memory_ranges) == 0xcf0);
    assert!(offset_of!(ExtensionWin10V2004, iommu_fault_policy) == 0xcf8);
};

impl_zeroed!(
    ExtensionWs03,
    ExtensionVista,
    ExtensionVistaSp2,
    ExtensionWin7,
    ExtensionWin8,
    ExtensionWin81,
    ExtensionWin10,
    ExtensionWin10Rs1,
    ExtensionWin10Rs2,
    ExtensionWin10Rs5,
    ExtensionWin10V1903,
    ExtensionWin10V2004,
);
