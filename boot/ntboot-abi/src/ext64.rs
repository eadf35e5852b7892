//! Loader extension layouts for x86-64 kernels.
//!
//! One flat struct per extension generation. The original headers compose
//! these from shared sub-blocks; here every pointer-bearing field is spelled
//! out directly so each generation's offsets are visible in one place and
//! the population code addresses fields by name across generations.
//!
//! Pointer fields are `u64` kernel VAs. `pad*` fields reproduce the exact
//! alignment holes the NT compilers emitted; they are part of the contract.

use crate::list::{Guid, ListEntry64, UnicodeString64};
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
    pub pad1: u32,
    pub em_inf_file_image: u64,
    pub em_inf_file_size: u64,
    pub triage_dump_block: u64,
    pub loader_pages_spanned: u64,
    pub headless_loader_block: u64,
    pub smbios_eps_header: u64,
    pub drvdb_image: u64,
    pub drvdb_size: u64,
    pub network_loader_block: u64,
    pub firmware_descriptor_list_head: ListEntry64,
    pub acpi_table: u64,
    pub acpi_table_size: u32,
    pub pad2: u32,
}

const _: () = {
    assert!(size_of::<ExtensionWs03>() == 0x88);
    assert!(offset_of!(ExtensionWs03, major_version) == 0x14);
    assert!(offset_of!(ExtensionWs03, em_inf_file_image) == 0x20);
    assert!(offset_of!(ExtensionWs03, loader_pages_spanned) == 0x38);
    assert!(offset_of!(ExtensionWs03, smbios_eps_header) == 0x48);
    assert!(offset_of!(ExtensionWs03, firmware_descriptor_list_head) == 0x68);
    assert!(offset_of!(ExtensionWs03, acpi_table_size) == 0x80);
};

/// `LOADER_PARAMETER_EXTENSION`, Vista RTM/SP1.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct ExtensionVista {
    pub size: u32,
    pub profile: ProfileParameterBlock,
    pub major_version: u32,
    pub minor_version: u32,
    pub pad1: u32,
    pub em_inf_file_image: u64,
    pub em_inf_file_size: u64,
    pub triage_dump_block: u64,
    pub loader_pages_spanned: u64,
    pub headless_loader_block: u64,
    pub smbios_eps_header: u64,
    pub drvdb_image: u64,
    pub drvdb_size: u64,
    pub network_loader_block: u64,
    pub firmware_descriptor_list_head: ListEntry64,
    pub acpi_table: u64,
    pub acpi_table_size: u32,
    pub loader_flags: LoaderBootFlags,
    pub loader_performance_data: u64,
    pub boot_application_persistent_data: ListEntry64,
    pub wmd_test_result: u64,
    pub boot_identifier: Guid,
}

const _: () = {
    assert!(size_of::<ExtensionVista>() == 0xb8);
    assert!(offset_of!(ExtensionVista, acpi_table_size) == 0x80);
    assert!(offset_of!(ExtensionVista, loader_performance_data) == 0x88);
    assert!(offset_of!(ExtensionVista, boot_application_persistent_data) == 0x90);
    assert!(offset_of!(ExtensionVista, boot_identifier) == 0xa8);
};

/// `LOADER_PARAMETER_EXTENSION`, Vista SP2.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct ExtensionVistaSp2 {
    pub size: u32,
    pub profile: ProfileParameterBlock,
    pub major_version: u32,
    pub minor_version: u32,
    pub pad1: u32,
    pub em_inf_file_image: u64,
    pub em_inf_file_size: u64,
    pub triage_dump_block: u64,
    pub loader_pages_spanned: u64,
    pub headless_loader_block: u64,
    pub smbios_eps_header: u64,
    pub drvdb_image: u64,
    pub drvdb_size: u64,
    pub network_loader_block: u64,
    pub firmware_descriptor_list_head: ListEntry64,
    pub acpi_table: u64,
    pub acpi_table_size: u32,
    pub loader_flags: LoaderBootFlags,
    pub loader_performance_data: u64,
    pub boot_application_persistent_data: ListEntry64,
    pub wmd_test_result: u64,
    pub boot_identifier: Guid,
    pub resume_pages: u64,
    pub dump_header: u64,
}

const _: () = {
    assert!(size_of::<ExtensionVistaSp2>() == 0xc8);
    assert!(offset_of!(ExtensionVistaSp2, resume_pages) == 0xb8);
    assert!(offset_of!(ExtensionVistaSp2, dump_header) == 0xc0);
};

/// `LOADER_PARAMETER_EXTENSION`, Win7. The version pair moved into the
/// block header, and the TPM entropy record appears.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct ExtensionWin7 {
    pub size: u32,
    pub profile: ProfileParameterBlock,
    pub pad1: u32,
    pub em_inf_file_image: u64,
    pub em_inf_file_size: u64,
    pub triage_dump_block: u64,
    pub loader_pages_spanned: u64,
    pub headless_loader_block: u64,
    pub smbios_eps_header: u64,
    pub drvdb_image: u64,
    pub drvdb_size: u64,
    pub network_loader_block: u64,
    pub firmware_descriptor_list_head: ListEntry64,
    pub acpi_table: u64,
    pub acpi_table_size: u32,
    pub loader_flags: LoaderBootFlags,
    pub loader_performance_data: u64,
    pub boot_application_persistent_data: ListEntry64,
    pub wmd_test_result: u64,
    pub boot_identifier: Guid,
    pub resume_pages: u64,
    pub dump_header: u64,
    pub bg_context: u64,
    pub numa_locality_info: u64,
    pub numa_group_assignment: u64,
    pub attached_hives: ListEntry64,
    pub memory_caching_requirements_count: u64,
    pub memory_caching_requirements: u64,
    pub tpm_boot_entropy_result: TpmBootEntropyLdrResult,
    pub processor_counter_frequency: u64,
}

const _: () = {
    assert!(size_of::<ExtensionWin7>() == 0x148);
    assert!(offset_of!(ExtensionWin7, em_inf_file_image) == 0x18);
    assert!(offset_of!(ExtensionWin7, loader_performance_data) == 0x80);
    assert!(offset_of!(ExtensionWin7, resume_pages) == 0xb0);
    assert!(offset_of!(ExtensionWin7, bg_context) == 0xc0);
    assert!(offset_of!(ExtensionWin7, attached_hives) == 0xd8);
    assert!(offset_of!(ExtensionWin7, tpm_boot_entropy_result) == 0xf8);
    assert!(offset_of!(ExtensionWin7, processor_counter_frequency) == 0x140);
};

/// `LOADER_PARAMETER_EXTENSION`, Win8. `LoaderPagesSpanned` is gone; the
/// multi-source entropy block, the hypervisor extension and the hardware
/// configuration block appear.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct ExtensionWin8 {
    pub size: u32,
    pub profile: ProfileParameterBlock,
    pub pad1: u32,
    pub em_inf_file_image: u64,
    pub em_inf_file_size: u64,
    pub triage_dump_block: u64,
    pub headless_loader_block: u64,
    pub smbios_eps_header: u64,
    pub drvdb_image: u64,
    pub drvdb_size: u64,
    pub network_loader_block: u64,
    pub firmware_descriptor_list_head: ListEntry64,
    pub acpi_table: u64,
    pub acpi_table_size: u32,
    pub loader_flags: LoaderBootFlags,
    pub loader_performance_data: u64,
    pub boot_application_persistent_data: ListEntry64,
    pub wmd_test_result: u64,
    pub boot_identifier: Guid,
    pub resume_pages: u64,
    pub dump_header: u64,
    pub bg_context: u64,
    pub numa_locality_info: u64,
    pub numa_group_assignment: u64,
    pub attached_hives: ListEntry64,
    pub memory_caching_requirements_count: u64,
    pub memory_caching_requirements: u64,
    pub boot_entropy_result: EntropyResult7,
    pub processor_counter_frequency: u64,
    pub hypervisor_extension: HypervisorExtension,
    pub hardware_configuration_id: Guid,
    pub hal_extension_module_list: ListEntry64,
    pub system_time: i64,
    pub time_stamp_at_system_time_read: u64,
    pub boot_flags: u64,
    pub internal_boot_flags: u64,
    pub wfs_fp_data: u64,
    pub wfs_fp_data_size: u32,
    pub pad2: u32,
    pub unknown: [u8; 0x60],
    pub acpi_bios_version: UnicodeString64,
    pub smbios_version: UnicodeString64,
    pub efi_version: UnicodeString64,
}

const _: () = {
    assert!(size_of::<ExtensionWin8>() == 0x920);
    assert!(offset_of!(ExtensionWin8, headless_loader_block) == 0x30);
    assert!(offset_of!(ExtensionWin8, loader_performance_data) == 0x78);
    assert!(offset_of!(ExtensionWin8, boot_entropy_result) == 0xf0);
    assert!(offset_of!(ExtensionWin8, processor_counter_frequency) == 0x800);
    assert!(offset_of!(ExtensionWin8, hypervisor_extension) == 0x808);
    assert!(offset_of!(ExtensionWin8, hardware_configuration_id) == 0x840);
    assert!(offset_of!(ExtensionWin8, wfs_fp_data_size) == 0x888);
    assert!(offset_of!(ExtensionWin8, acpi_bios_version) == 0x8f0);
};

/// `LOADER_PARAMETER_EXTENSION`, Win8.1: eight entropy sources, bugcheck
/// parameters, the API-set schema and the offline crashdump table.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct ExtensionWin81 {
    pub size: u32,
    pub profile: ProfileParameterBlock,
    pub pad1: u32,
    pub em_inf_file_image: u64,
    pub em_inf_file_size: u64,
    pub triage_dump_block: u64,
    pub headless_loader_block: u64,
    pub smbios_eps_header: u64,
    pub drvdb_image: u64,
    pub drvdb_size: u64,
    pub network_loader_block: u64,
    pub firmware_descriptor_list_head: ListEntry64,
    pub acpi_table: u64,
    pub acpi_table_size: u32,
    pub loader_flags: LoaderBootFlags,
    pub loader_performance_data: u64,
    pub boot_application_persistent_data: ListEntry64,
    pub wmd_test_result: u64,
    pub boot_identifier: Guid,
    pub resume_pages: u64,
    pub dump_header: u64,
    pub bg_context: u64,
    pub numa_locality_info: u64,
    pub numa_group_assignment: u64,
    pub attached_hives: ListEntry64,
    pub memory_caching_requirements_count: u64,
    pub memory_caching_requirements: u64,
    pub boot_entropy_result: EntropyResult8,
    pub processor_counter_frequency: u64,
    pub hypervisor_extension: HypervisorExtension,
    pub hardware_configuration_id: Guid,
    pub hal_extension_module_list: ListEntry64,
    pub system_time: i64,
    pub time_stamp_at_system_time_read: u64,
    pub boot_flags: u64,
    pub internal_boot_flags: u64,
    pub wfs_fp_data: u64,
    pub wfs_fp_data_size: u32,
    pub pad2: u32,
    pub bugcheck_code: u64,
    pub bugcheck_parameter1: u64,
    pub bugcheck_parameter2: u64,
    pub bugcheck_parameter3: u64,
    pub bugcheck_parameter4: u64,
    pub api_set_schema: u64,
    pub api_set_schema_size: u32,
    pub pad3: u32,
    pub api_set_schema_extensions: ListEntry64,
    pub acpi_bios_version: UnicodeString64,
    pub smbios_version: UnicodeString64,
    pub efi_version: UnicodeString64,
    pub kd_debug_device: u64,
    pub offline_crashdump_table: OfflineCrashdumpTable81,
    pub pad4: u32,
    pub pad5: [u32; 4],
}

const _: () = {
    assert!(size_of::<ExtensionWin81>() == 0x998);
    assert!(offset_of!(ExtensionWin81, boot_entropy_result) == 0xf0);
    assert!(offset_of!(ExtensionWin81, processor_counter_frequency) == 0x868);
    assert!(offset_of!(ExtensionWin81, hardware_configuration_id) == 0x8a8);
    assert!(offset_of!(ExtensionWin81, bugcheck_code) == 0x8f8);
    assert!(offset_of!(ExtensionWin81, api_set_schema) == 0x920);
    assert!(offset_of!(ExtensionWin81, api_set_schema_extensions) == 0x930);
    assert!(offset_of!(ExtensionWin81, acpi_bios_version) == 0x940);
    assert!(offset_of!(ExtensionWin81, kd_debug_device) == 0x970);
    assert!(offset_of!(ExtensionWin81, offline_crashdump_table) == 0x978);
};

/// `LOADER_PARAMETER_EXTENSION`, Win10 1507/1511: the code-integrity
/// extension and hive recovery info appear.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct ExtensionWin10 {
    pub size: u32,
    pub profile: ProfileParameterBlock,
    pub pad1: u32,
    pub em_inf_file_image: u64,
    pub em_inf_file_size: u64,
    pub triage_dump_block: u64,
    pub headless_loader_block: u64,
    pub smbios_eps_header: u64,
    pub drvdb_image: u64,
    pub drvdb_size: u64,
    pub network_loader_block: u64,
    pub firmware_descriptor_list_head: ListEntry64,
    pub acpi_table: u64,
    pub acpi_table_size: u32,
    pub loader_flags: LoaderBootFlags,
    pub loader_performance_data: u64,
    pub boot_application_persistent_data: ListEntry64,
    pub wmd_test_result: u64,
    pub boot_identifier: Guid,
    pub resume_pages: u64,
    pub dump_header: u64,
    pub bg_context: u64,
    pub numa_locality_info: u64,
    pub numa_group_assignment: u64,
    pub attached_hives: ListEntry64,
    pub memory_caching_requirements_count: u64,
    pub memory_caching_requirements: u64,
    pub boot_entropy_result: EntropyResult8,
    pub processor_counter_frequency: u64,
    pub hypervisor_extension: HypervisorExtension,
    pub hardware_configuration_id: Guid,
    pub hal_extension_module_list: ListEntry64,
    pub system_time: i64,
    pub time_stamp_at_system_time_read: u64,
    pub boot_flags: u64,
    pub internal_boot_flags: u64,
    pub wfs_fp_data: u64,
    pub wfs_fp_data_size: u32,
    pub pad2: u32,
    pub bugcheck_code: u64,
    pub bugcheck_parameter1: u64,
    pub bugcheck_parameter2: u64,
    pub bugcheck_parameter3: u64,
    pub bugcheck_parameter4: u64,
    pub api_set_schema: u64,
    pub api_set_schema_size: u32,
    pub pad3: u32,
    pub api_set_schema_extensions: ListEntry64,
    pub acpi_bios_version: UnicodeString64,
    pub smbios_version: UnicodeString64,
    pub efi_version: UnicodeString64,
    pub kd_debug_device: u64,
    pub offline_crashdump_table: OfflineCrashdumpTable10,
    pub manufacturing_profile: UnicodeString64,
    pub bbt_buffer: u64,
    pub xsave_allowed_features: u64,
    pub xsave_flags: u32,
    pub pad4: u32,
    pub boot_options: u64,
    pub boot_id: u32,
    pub pad5: u32,
    pub code_integrity_data: u64,
    pub code_integrity_data_size: u32,
    pub system_hive_recovery_info: LoaderHiveRecoveryInfo,
}

const _: () = {
    assert!(size_of::<ExtensionWin10>() == 0x9f0);
    assert!(offset_of!(ExtensionWin10, kd_debug_device) == 0x970);
    assert!(offset_of!(ExtensionWin10, offline_crashdump_table) == 0x978);
    assert!(offset_of!(ExtensionWin10, manufacturing_profile) == 0x998);
    assert!(offset_of!(ExtensionWin10, bbt_buffer) == 0x9a8);
    assert!(offset_of!(ExtensionWin10, xsave_allowed_features) == 0x9b0);
    assert!(offset_of!(ExtensionWin10, boot_options) == 0x9c0);
    assert!(offset_of!(ExtensionWin10, boot_id) == 0x9c8);
    assert!(offset_of!(ExtensionWin10, code_integrity_data) == 0x9d0);
    assert!(offset_of!(ExtensionWin10, system_hive_recovery_info) == 0x9dc);
};

/// `LOADER_PARAMETER_EXTENSION`, Win10 1607: IUM fields, the hypercall
/// page VA and the HAL mapping appear.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct ExtensionWin10Rs1 {
    pub size: u32,
    pub profile: ProfileParameterBlock,
    pub pad1: u32,
    pub em_inf_file_image: u64,
    pub em_inf_file_size: u64,
    pub triage_dump_block: u64,
    pub headless_loader_block: u64,
    pub smbios_eps_header: u64,
    pub drvdb_image: u64,
    pub drvdb_size: u64,
    pub network_loader_block: u64,
    pub firmware_descriptor_list_head: ListEntry64,
    pub acpi_table: u64,
    pub acpi_table_size: u32,
    pub loader_flags: LoaderBootFlags,
    pub loader_performance_data: u64,
    pub boot_application_persistent_data: ListEntry64,
    pub wmd_test_result: u64,
    pub boot_identifier: Guid,
    pub resume_pages: u64,
    pub dump_header: u64,
    pub bg_context: u64,
    pub numa_locality_info: u64,
    pub numa_group_assignment: u64,
    pub attached_hives: ListEntry64,
    pub memory_caching_requirements_count: u64,
    pub memory_caching_requirements: u64,
    pub boot_entropy_result: EntropyResult8,
    pub processor_counter_frequency: u64,
    pub hypervisor_extension: HypervisorExtension,
    pub hardware_configuration_id: Guid,
    pub hal_extension_module_list: ListEntry64,
    pub system_time: i64,
    pub time_stamp_at_system_time_read: u64,
    pub boot_flags: u64,
    pub internal_boot_flags: u64,
    pub wfs_fp_data: u64,
    pub wfs_fp_data_size: u32,
    pub pad2: u32,
    pub bugcheck_code: u64,
    pub bugcheck_parameter1: u64,
    pub bugcheck_parameter2: u64,
    pub bugcheck_parameter3: u64,
    pub bugcheck_parameter4: u64,
    pub api_set_schema: u64,
    pub api_set_schema_size: u32,
    pub pad3: u32,
    pub api_set_schema_extensions: ListEntry64,
    pub acpi_bios_version: UnicodeString64,
    pub smbios_version: UnicodeString64,
    pub efi_version: UnicodeString64,
    pub kd_debug_device: u64,
    pub offline_crashdump_table: OfflineCrashdumpTable10,
    pub manufacturing_profile: UnicodeString64,
    pub bbt_buffer: u64,
    pub xsave_allowed_features: u64,
    pub xsave_flags: u32,
    pub pad4: u32,
    pub boot_options: u64,
    pub ium_enablement: u32,
    pub ium_policy: u32,
    pub ium_status: u32,
    pub boot_id: u32,
    pub code_integrity_data: u64,
    pub code_integrity_data_size: u32,
    pub system_hive_recovery_info: LoaderHiveRecoveryInfo,
    pub soft_restart_count: u32,
    pub pad5: u32,
    pub soft_restart_time: i64,
    pub hypercall_code_va: u64,
    pub hal_virtual_address: u64,
    pub hal_number_of_bytes: u64,
    pub major_release: u32,
    pub reserved1: u32,
}

const _: () = {
    assert!(size_of::<ExtensionWin10Rs1>() == 0xa28);
    assert!(offset_of!(ExtensionWin10Rs1, ium_enablement) == 0x9c8);
    assert!(offset_of!(ExtensionWin10Rs1, boot_id) == 0x9d4);
    assert!(offset_of!(ExtensionWin10Rs1, code_integrity_data) == 0x9d8);
    assert!(offset_of!(ExtensionWin10Rs1, system_hive_recovery_info) == 0x9e4);
    assert!(offset_of!(ExtensionWin10Rs1, soft_restart_count) == 0x9f8);
    assert!(offset_of!(ExtensionWin10Rs1, soft_restart_time) == 0xa00);
    assert!(offset_of!(ExtensionWin10Rs1, hypercall_code_va) == 0xa08);
    assert!(offset_of!(ExtensionWin10Rs1, hal_virtual_address) == 0xa10);
    assert!(offset_of!(ExtensionWin10Rs1, hal_number_of_bytes) == 0xa18);
    assert!(offset_of!(ExtensionWin10Rs1, major_release) == 0xa20);
};

/// `LOADER_PARAMETER_EXTENSION`, Win10 1703 (also consumed by 1709 and
/// 1803): KD entropy tail, build-lab strings, reset reason.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct ExtensionWin10Rs2 {
    pub size: u32,
    pub profile: ProfileParameterBlock,
    pub pad1: u32,
    pub em_inf_file_image: u64,
    pub em_inf_file_size: u64,
    pub triage_dump_block: u64,
    pub headless_loader_block: u64,
    pub smbios_eps_header: u64,
    pub drvdb_image: u64,
    pub drvdb_size: u64,
    pub network_loader_block: u64,
    pub firmware_descriptor_list_head: ListEntry64,
    pub acpi_table: u64,
    pub acpi_table_size: u32,
    pub loader_flags: LoaderBootFlags,
    pub loader_performance_data: u64,
    pub boot_application_persistent_data: ListEntry64,
    pub wmd_test_result: u64,
    pub boot_identifier: Guid,
    pub resume_pages: u64,
    pub dump_header: u64,
    pub bg_context: u64,
    pub numa_locality_info: u64,
    pub numa_group_assignment: u64,
    pub attached_hives: ListEntry64,
    pub memory_caching_requirements_count: u64,
    pub memory_caching_requirements: u64,
    pub boot_entropy_result: EntropyResult8Kd,
    pub processor_counter_frequency: u64,
    pub hypervisor_extension: HypervisorExtension,
    pub hardware_configuration_id: Guid,
    pub hal_extension_module_list: ListEntry64,
    pub system_time: i64,
    pub time_stamp_at_system_time_read: u64,
    pub boot_flags: u64,
    pub internal_boot_flags: u64,
    pub wfs_fp_data: u64,
    pub wfs_fp_data_size: u32,
    pub pad2: u32,
    pub bugcheck_code: u64,
    pub bugcheck_parameter1: u64,
    pub bugcheck_parameter2: u64,
    pub bugcheck_parameter3: u64,
    pub bugcheck_parameter4: u64,
    pub api_set_schema: u64,
    pub api_set_schema_size: u32,
    pub pad3: u32,
    pub api_set_schema_extensions: ListEntry64,
    pub acpi_bios_version: UnicodeString64,
    pub smbios_version: UnicodeString64,
    pub efi_version: UnicodeString64,
    pub kd_debug_device: u64,
    pub offline_crashdump_table: OfflineCrashdumpTable10,
    pub manufacturing_profile: UnicodeString64,
    pub bbt_buffer: u64,
    pub xsave_allowed_features: u64,
    pub xsave_flags: u32,
    pub pad4: u32,
    pub boot_options: u64,
    pub ium_enablement: u32,
    pub ium_policy: u32,
    pub ium_status: u32,
    pub boot_id: u32,
    pub code_integrity_data: u64,
    pub code_integrity_data_size: u32,
    pub system_hive_recovery_info: LoaderHiveRecoveryInfo,
    pub soft_restart_count: u32,
    pub pad5: u32,
    pub soft_restart_time: i64,
    pub hypercall_code_va: u64,
    pub hal_virtual_address: u64,
    pub hal_number_of_bytes: u64,
    pub major_release: u32,
    pub reserved1: u32,
    pub nt_build_lab: [u8; 0xe0],
    pub nt_build_lab_ex: [u8; 0xe0],
    pub reset_reason: LoaderResetReason,
    pub max_pci_bus_number: u32,
    pub pad6: u32,
}

const _: () = {
    assert!(size_of::<ExtensionWin10Rs2>() == 0xc40);
    assert!(offset_of!(ExtensionWin10Rs2, boot_entropy_result) == 0xf0);
    assert!(offset_of!(ExtensionWin10Rs2, processor_counter_frequency) == 0x888);
    assert!(offset_of!(ExtensionWin10Rs2, kd_debug_device) == 0x990);
    assert!(offset_of!(ExtensionWin10Rs2, ium_enablement) == 0x9e8);
    assert!(offset_of!(ExtensionWin10Rs2, major_release) == 0xa40);
    assert!(offset_of!(ExtensionWin10Rs2, nt_build_lab) == 0xa48);
    assert!(offset_of!(ExtensionWin10Rs2, reset_reason) == 0xc08);
    assert!(offset_of!(ExtensionWin10Rs2, max_pci_bus_number) == 0xc38);
};

/// `LOADER_PARAMETER_EXTENSION`, Win10 1809: performance data moves inline,
/// ten entropy sources, the split hypervisor crashdump areas, leap seconds.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct ExtensionWin10Rs5 {
    pub size: u32,
    pub profile: ProfileParameterBlock,
    pub pad1: u32,
    pub em_inf_file_image: u64,
    pub em_inf_file_size: u64,
    pub triage_dump_block: u64,
    pub headless_loader_block: u64,
    pub smbios_eps_header: u64,
    pub drvdb_image: u64,
    pub drvdb_size: u64,
    pub network_loader_block: u64,
    pub firmware_descriptor_list_head: ListEntry64,
    pub acpi_table: u64,
    pub acpi_table_size: u32,
    pub loader_flags: LoaderBootFlags,
    pub loader_performance_data: LoaderPerformanceData1809,
    pub boot_application_persistent_data: ListEntry64,
    pub wmd_test_result: u64,
    pub boot_identifier: Guid,
    pub resume_pages: u64,
    pub dump_header: u64,
    pub bg_context: u64,
    pub numa_locality_info: u64,
    pub numa_group_assignment: u64,
    pub attached_hives: ListEntry64,
    pub memory_caching_requirements_count: u64,
    pub memory_caching_requirements: u64,
    pub boot_entropy_result: EntropyResult10,
    pub processor_counter_frequency: u64,
    pub hypervisor_extension: HypervisorExtension1809,
    pub hardware_configuration_id: Guid,
    pub hal_extension_module_list: ListEntry64,
    pub system_time: i64,
    pub time_stamp_at_system_time_read: u64,
    pub boot_flags: u64,
    pub internal_boot_flags: u64,
    pub wfs_fp_data: u64,
    pub wfs_fp_data_size: u32,
    pub pad2: u32,
    pub bugcheck_code: u64,
    pub bugcheck_parameter1: u64,
    pub bugcheck_parameter2: u64,
    pub bugcheck_parameter3: u64,
    pub bugcheck_parameter4: u64,
    pub api_set_schema: u64,
    pub api_set_schema_size: u32,
    pub pad3: u32,
    pub api_set_schema_extensions: ListEntry64,
    pub acpi_bios_version: UnicodeString64,
    pub smbios_version: UnicodeString64,
    pub efi_version: UnicodeString64,
    pub kd_debug_device: u64,
    pub offline_crashdump_table: OfflineCrashdumpTable10,
    pub manufacturing_profile: UnicodeString64,
    pub bbt_buffer: u64,
    pub xsave_allowed_features: u64,
    pub xsave_flags: u32,
    pub pad4: u32,
    pub boot_options: u64,
    pub ium_enablement: u32,
    pub ium_policy: u32,
    pub ium_status: u32,
    pub boot_id: u32,
    pub code_integrity_data: u64,
    pub code_integrity_data_size: u32,
    pub system_hive_recovery_info: LoaderHiveRecoveryInfo,
    pub soft_restart_count: u32,
    pub pad5: u32,
    pub soft_restart_time: i64,
    pub hypercall_code_va: u64,
    pub hal_virtual_address: u64,
    pub hal_number_of_bytes: u64,
    pub leap_second_data: u64,
    pub major_release: u32,
    pub reserved1: u32,
    pub nt_build_lab: [u8; 0xe0],
    pub nt_build_lab_ex: [u8; 0xe0],
    pub reset_reason: LoaderResetReason,
    pub max_pci_bus_number: u32,
    pub feature_settings: u32,
}

const _: () = {
    assert!(size_of::<ExtensionWin10Rs5>() == 0xd60);
    assert!(offset_of!(ExtensionWin10Rs5, loader_performance_data) == 0x78);
    assert!(offset_of!(ExtensionWin10Rs5, boot_application_persistent_data) == 0xc0);
    assert!(offset_of!(ExtensionWin10Rs5, boot_entropy_result) == 0x130);
    assert!(offset_of!(ExtensionWin10Rs5, processor_counter_frequency) == 0x998);
    assert!(offset_of!(ExtensionWin10Rs5, hypervisor_extension) == 0x9a0);
    assert!(offset_of!(ExtensionWin10Rs5, hardware_configuration_id) == 0x9e0);
    assert!(offset_of!(ExtensionWin10Rs5, bugcheck_code) == 0xa30);
    assert!(offset_of!(ExtensionWin10Rs5, kd_debug_device) == 0xaa8);
    assert!(offset_of!(ExtensionWin10Rs5, ium_enablement) == 0xb00);
    assert!(offset_of!(ExtensionWin10Rs5, soft_restart_time) == 0xb38);
    assert!(offset_of!(ExtensionWin10Rs5, leap_second_data) == 0xb58);
    assert!(offset_of!(ExtensionWin10Rs5, nt_build_lab) == 0xb68);
    assert!(offset_of!(ExtensionWin10Rs5, reset_reason) == 0xd28);
    assert!(offset_of!(ExtensionWin10Rs5, feature_settings) == 0xd5c);
};

/// `LOADER_PARAMETER_EXTENSION`, Win10 1903/1909: twelve performance
/// timestamps, hot-patch and retpoline reserves, the mini executive, VSM
/// marks.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct ExtensionWin10V1903 {
    pub size: u32,
    pub profile: ProfileParameterBlock,
    pub pad1: u32,
    pub em_inf_file_image: u64,
    pub em_inf_file_size: u64,
    pub triage_dump_block: u64,
    pub headless_loader_block: u64,
    pub smbios_eps_header: u64,
    pub drvdb_image: u64,
    pub drvdb_size: u64,
    pub network_loader_block: u64,
    pub firmware_descriptor_list_head: ListEntry64,
    pub acpi_table: u64,
    pub acpi_table_size: u32,
    pub loader_flags: LoaderBootFlags,
    pub loader_performance_data: LoaderPerformanceData1903,
    pub boot_application_persistent_data: ListEntry64,
    pub wmd_test_result: u64,
    pub boot_identifier: Guid,
    pub resume_pages: u64,
    pub dump_header: u64,
    pub bg_context: u64,
    pub numa_locality_info: u64,
    pub numa_group_assignment: u64,
    pub attached_hives: ListEntry64,
    pub memory_caching_requirements_count: u64,
    pub memory_caching_requirements: u64,
    pub boot_entropy_result: EntropyResult10,
    pub processor_counter_frequency: u64,
    pub hypervisor_extension: HypervisorExtension1809,
    pub hardware_configuration_id: Guid,
    pub hal_extension_module_list: ListEntry64,
    pub system_time: i64,
    pub time_stamp_at_system_time_read: u64,
    pub boot_flags: u64,
    pub internal_boot_flags: u64,
    pub wfs_fp_data: u64,
    pub wfs_fp_data_size: u32,
    pub pad2: u32,
    pub bugcheck_code: u64,
    pub bugcheck_parameter1: u64,
    pub bugcheck_parameter2: u64,
    pub bugcheck_parameter3: u64,
    pub bugcheck_parameter4: u64,
    pub api_set_schema: u64,
    pub api_set_schema_size: u32,
    pub pad3: u32,
    pub api_set_schema_extensions: ListEntry64,
    pub acpi_bios_version: UnicodeString64,
    pub smbios_version: UnicodeString64,
    pub efi_version: UnicodeString64,
    pub kd_debug_device: u64,
    pub offline_crashdump_table: OfflineCrashdumpTable10,
    pub manufacturing_profile: UnicodeString64,
    pub bbt_buffer: u64,
    pub xsave_allowed_features: u64,
    pub xsave_flags: u32,
    pub pad4: u32,
    pub boot_options: u64,
    pub ium_enablement: u32,
    pub ium_policy: u32,
    pub ium_status: u32,
    pub boot_id: u32,
    pub code_integrity_data: u64,
    pub code_integrity_data_size: u32,
    pub system_hive_recovery_info: LoaderHiveRecoveryInfo,
    pub soft_restart_count: u32,
    pub pad5: u32,
    pub soft_restart_time: i64,
    pub hypercall_code_va: u64,
    pub hal_virtual_address: u64,
    pub hal_number_of_bytes: u64,
    pub leap_second_data: u64,
    pub major_release: u32,
    pub reserved1: u32,
    pub nt_build_lab: [u8; 0xe0],
    pub nt_build_lab_ex: [u8; 0xe0],
    pub reset_reason: LoaderResetReason,
    pub max_pci_bus_number: u32,
    pub feature_settings: u32,
    pub hot_patch_reserve_size: u32,
    pub retpoline_reserve_size: u32,
    pub mini_executive_code_base: u64,
    pub mini_executive_code_size: u32,
    pub pad6: u32,
    pub vsm_performance_data: VsmPerformanceData,
}

const _: () = {
    assert!(size_of::<ExtensionWin10V1903>() == 0xdd0);
    assert!(offset_of!(ExtensionWin10V1903, boot_application_persistent_data) == 0xd8);
    assert!(offset_of!(ExtensionWin10V1903, boot_entropy_result) == 0x148);
    assert!(offset_of!(ExtensionWin10V1903, leap_second_data) == 0xb70);
    assert!(offset_of!(ExtensionWin10V1903, nt_build_lab) == 0xb80);
    assert!(offset_of!(ExtensionWin10V1903, hot_patch_reserve_size) == 0xd78);
    assert!(offset_of!(ExtensionWin10V1903, mini_executive_code_base) == 0xd80);
    assert!(offset_of!(ExtensionWin10V1903, vsm_performance_data) == 0xd90);
};

/// `LOADER_PARAMETER_EXTENSION`, Win10 2004: the DrvDB patch image, NUMA
/// memory ranges and the IOMMU fault policy appear.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct ExtensionWin10V2004 {
    pub size: u32,
    pub profile: ProfileParameterBlock,
    pub pad1: u32,
    pub em_inf_file_image: u64,
    pub em_inf_file_size: u64,
    pub triage_dump_block: u64,
    pub headless_loader_block: u64,
    pub smbios_eps_header: u64,
    pub drvdb_image: u64,
    pub drvdb_size: u64,
    pub drvdb_patch_image: u64,
    pub drvdb_patch_size: u32,
    pub pad2: u32,
    pub network_loader_block: u64,
    pub firmware_descriptor_list_head: ListEntry64,
    pub acpi_table: u64,
    pub acpi_table_size: u32,
    pub loader_flags: LoaderBootFlags,
    pub loader_performance_data: LoaderPerformanceData1903,
    pub boot_application_persistent_data: ListEntry64,
    pub wmd_test_result: u64,
    pub boot_identifier: Guid,
    pub resume_pages: u64,
    pub dump_header: u64,
    pub bg_context: u64,
    pub numa_locality_info: u64,
    pub numa_group_assignment: u64,
    pub attached_hives: ListEntry64,
    pub memory_caching_requirements_count: u64,
    pub memory_caching_requirements: u64,
    pub boot_entropy_result: EntropyResult10,
    pub processor_counter_frequency: u64,
    pub hypervisor_extension: HypervisorExtension1809,
    pub hardware_configuration_id: Guid,
    pub hal_extension_module_list: ListEntry64,
    pub system_time: i64,
    pub time_stamp_at_system_time_read: u64,
    pub boot_flags: u64,
    pub internal_boot_flags: u64,
    pub wfs_fp_data: u64,
    pub wfs_fp_data_size: u32,
    pub pad3: u32,
    pub bugcheck_code: u64,
    pub bugcheck_parameter1: u64,
    pub bugcheck_parameter2: u64,
    pub bugcheck_parameter3: u64,
    pub bugcheck_parameter4: u64,
    pub api_set_schema: u64,
    pub api_set_schema_size: u32,
    pub pad4: u32,
    pub api_set_schema_extensions: ListEntry64,
    pub acpi_bios_version: UnicodeString64,
    pub smbios_version: UnicodeString64,
    pub efi_version: UnicodeString64,
    pub kd_debug_device: u64,
    pub offline_crashdump_table: OfflineCrashdumpTable10,
    pub manufacturing_profile: UnicodeString64,
    pub bbt_buffer: u64,
    pub xsave_allowed_features: u64,
    pub xsave_flags: u32,
    pub pad5: u32,
    pub boot_options: u64,
    pub ium_enablement: u32,
    pub ium_policy: u32,
    pub ium_status: u32,
    pub boot_id: u32,
    pub code_integrity_data: u64,
    pub code_integrity_data_size: u32,
    pub system_hive_recovery_info: LoaderHiveRecoveryInfo,
    pub soft_restart_count: u32,
    pub pad6: u32,
    pub soft_restart_time: i64,
    pub hypercall_code_va: u64,
    pub hal_virtual_address: u64,
    pub hal_number_of_bytes: u64,
    pub leap_second_data: u64,
    pub major_release: u32,
    pub reserved1: u32,
    pub nt_build_lab: [u8; 0xe0],
    pub nt_build_lab_ex: [u8; 0xe0],
    pub reset_reason: LoaderResetReason,
    pub max_pci_bus_number: u32,
    pub feature_settings: u32,
    pub hot_patch_reserve_size: u32,
    pub retpoline_reserve_size: u32,
    pub mini_executive_code_base: u64,
    pub mini_executive_code_size: u32,
    pub pad7: u32,
    pub vsm_performance_data: VsmPerformanceData,
    pub numa_memory_ranges: u64,
    pub numa_memory_range_count: u32,
    pub iommu_fault_policy: u32,
}

const _: () = {
    assert!(size_of::<ExtensionWin10V2004>() == 0xdf0);
    assert!(offset_of!(ExtensionWin10V2004, drvdb_patch_image) == 0x50);
    assert!(offset_of!(ExtensionWin10V2004, network_loader_block) == 0x60);
    assert!(offset_of!(ExtensionWin10V2004, boot_entropy_result) == 0x158);
    assert!(offset_of!(ExtensionWin10V2004, leap_second_data) == 0xb80);
    assert!(offset_of!(ExtensionWin10V2004, vsm_performance_data) == 0xda0);
    assert!(offset_of!(ExtensionWin10V2004, numa_memory_ranges) == 0xde0);
    assert!(offset_of!(ExtensionWin10V2004, numa_memory_range_count) == 0xde8);
    assert!(offset_of!(ExtensionWin10V2004, iommu_fault_policy) == 0xdec);
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
