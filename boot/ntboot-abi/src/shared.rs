//! Extension sub-blocks whose byte layout is identical on both widths.
//!
//! Anything in here is free of pointer-sized fields (or pads them to a fixed
//! eight bytes), so one definition serves the x86 and x86-64 extension
//! variants alike. Where the original compilers relied on trailing padding
//! before the next sibling field, that padding is folded into the struct
//! here as an explicit `pad` member so the enclosing offsets stay put.

use bitfield_struct::bitfield;
use core::mem::{offset_of, size_of};

/// `PROFILE_PARAMETER_BLOCK` (docking station data; zeroed on PCs).
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct ProfileParameterBlock {
    pub status: u16,
    pub reserved: u16,
    pub docking_state: u16,
    pub capabilities: u16,
    pub dock_id: u32,
    pub serial_number: u32,
}

/// `LOADER_EXTENSION_BLOCK2A` flag word.
#[bitfield(u32)]
pub struct LoaderBootFlags {
    /// Set: the kernel was brought up by winload (or a compatible loader).
    pub boot_via_winload: bool,
    /// Set: the firmware is EFI, not PC/AT BIOS.
    pub boot_via_efi: bool,
    #[bits(30)]
    __: u32,
}

/// `TPM_BOOT_ENTROPY_RESULT_CODE`.
#[repr(u32)]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum TpmEntropyResultCode {
    #[default]
    Uninitialized = 0,
    DisabledByPolicy = 1,
    NoTpmFound = 2,
    TpmError = 3,
    Success = 4,
}

/// `TPM_BOOT_ENTROPY_LDR_RESULT` (Win7 only).
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct TpmBootEntropyLdrResult {
    pub policy: u64,
    pub result_code: u32,
    pub result_status: i32,
    pub time: u64,
    pub entropy_length: u32,
    pub entropy_data: [u8; 40],
    pub pad: u32,
}

/// `BOOT_ENTROPY_SOURCE_ID`.
#[repr(u32)]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum EntropySourceId {
    #[default]
    None = 0,
    Seedfile = 1,
    External = 2,
    Tpm = 3,
    Rdrand = 4,
    Time = 5,
    AcpiOem0 = 6,
    Uefi = 7,
    Cng = 8,
    TcbTpm = 9,
    TcbRdrand = 10,
}

/// `BOOT_ENTROPY_SOURCE_RESULT_CODE`.
#[repr(u32)]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum EntropyResultCode {
    #[default]
    Uninitialized = 0,
    DisabledByPolicy = 1,
    NotPresent = 2,
    Error = 3,
    Success = 4,
}

/// `BOOT_ENTROPY_SOURCE_LDR_RESULT`: one slot per entropy source.
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct EntropySourceResult {
    pub source_id: u32,
    pub pad1: u32,
    pub policy: u64,
    pub result_code: u32,
    pub result_status: i32,
    pub time: u64,
    pub entropy_length: u32,
    pub entropy_data: [u8; 64],
    pub pad2: u32,
}

impl Default for EntropySourceResult {
    fn default() -> Self {
        // SAFETY: all-zero bytes are a valid value for every field.
        unsafe { core::mem::zeroed() }
    }
}

/// Seed material the kernel hands to CNG.
pub const SEED_BYTES_FOR_CNG: usize = 48;
/// RNG pool consumed directly by the kernel.
pub const RNG_BYTES_FOR_NTOSKRNL: usize = 1024;
/// Debugger entropy tail (1703 onwards).
pub const KD_ENTROPY_BYTES: usize = 32;

macro_rules! entropy_result {
    ($(#[$meta:meta])* $name:ident, sources: $n:expr, kd: false) => {
        $(#[$meta])*
        #[repr(C)]
        #[derive(Copy, Clone)]
        pub struct $name {
            pub max_entropy_sources: u32,
            pub pad: u32,
            pub source_results: [EntropySourceResult; $n],
            pub seed_bytes_for_cng: [u8; SEED_BYTES_FOR_CNG],
            pub rng_bytes_for_ntoskrnl: [u8; RNG_BYTES_FOR_NTOSKRNL],
        }
    };
    ($(#[$meta:meta])* $name:ident, sources: $n:expr, kd: true) => {
        $(#[$meta])*
        #[repr(C)]
        #[derive(Copy, Clone)]
        pub struct $name {
            pub max_entropy_sources: u32,
            pub pad: u32,
            pub source_results: [EntropySourceResult; $n],
            pub seed_bytes_for_cng: [u8; SEED_BYTES_FOR_CNG],
            pub rng_bytes_for_ntoskrnl: [u8; RNG_BYTES_FOR_NTOSKRNL],
            pub kd_entropy: [u8; KD_ENTROPY_BYTES],
        }
    };
}

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

entropy_result!(
    /// `BOOT_ENTROPY_LDR_RESULT` as of Win8: seven sources.
    EntropyResult7, sources: 7, kd: false);
entropy_result!(
    /// `BOOT_ENTROPY_LDR_RESULT` as of Win8.1: eight sources.
    EntropyResult8, sources: 8, kd: false);
entropy_result!(
    /// `BOOT_ENTROPY_LDR_RESULT` as of 1703: eight sources plus KD tail.
    EntropyResult8Kd, sources: 8, kd: true);
entropy_result!(
    /// `BOOT_ENTROPY_LDR_RESULT` as of 1809: ten sources plus KD tail.
    EntropyResult10, sources: 10, kd: true);

impl_zeroed!(
    TpmBootEntropyLdrResult,
    EntropyResult7,
    EntropyResult8,
    EntropyResult8Kd,
    EntropyResult10,
);

/// `LOADER_PERFORMANCE_DATA`, out of line until 1703.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct LoaderPerformanceData {
    pub start_time: u64,
    pub end_time: u64,
}

/// `LOADER_PERFORMANCE_DATA` inline form, 1809.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct LoaderPerformanceData1809 {
    pub start_time: u64,
    pub end_time: u64,
    pub preload_end_time: u64,
    pub tcb_loader_start_time: u64,
    pub load_hypervisor_time: u64,
    pub launch_hypervisor_time: u64,
    pub load_vsm_time: u64,
    pub launch_vsm_time: u64,
    pub load_drivers_time: u64,
}

/// `LOADER_PERFORMANCE_DATA` inline form, 1903 onwards.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct LoaderPerformanceData1903 {
    pub start_time: u64,
    pub end_time: u64,
    pub preload_end_time: u64,
    pub tcb_loader_start_time: u64,
    pub load_hypervisor_time: u64,
    pub launch_hypervisor_time: u64,
    pub load_vsm_time: u64,
    pub launch_vsm_time: u64,
    pub execute_transition_start_time: u64,
    pub execute_transition_end_time: u64,
    pub load_drivers_time: u64,
    pub cleanup_vsm_time: u64,
}

/// `VSM_PERFORMANCE_DATA` (1903 onwards).
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct VsmPerformanceData {
    pub launch_vsm_mark: [u64; 8],
}

/// `LOADER_PARAMETER_HYPERVISOR_EXTENSION`, Win8 through 1703.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct HypervisorExtension {
    pub crashdump_area_page_count: u32,
    pub pad: u32,
    pub crashdump_area_spa: u64,
    pub launch_status: u64,
    pub launch_status_arg1: u64,
    pub launch_status_arg2: u64,
    pub launch_status_arg3: u64,
    pub launch_status_arg4: u64,
}

/// `LOADER_PARAMETER_HYPERVISOR_EXTENSION`, 1809 onwards.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct HypervisorExtension1809 {
    pub initial_crashdump_area_page_count: u32,
    pub crashdump_area_page_count: u32,
    pub initial_crashdump_area_spa: u64,
    pub crashdump_area_spa: u64,
    pub launch_status: u64,
    pub launch_status_arg1: u64,
    pub launch_status_arg2: u64,
    pub launch_status_arg3: u64,
    pub launch_status_arg4: u64,
}

/// `LOADER_RESET_REASON` (1703 onwards).
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct LoaderResetReason {
    pub supplied: u8,
    pub pad: [u8; 7],
    pub pch: u8,
    pub embedded_controller: u8,
    pub reserved: [u8; 6],
    pub additional_info: [u32; 8],
}

impl Default for LoaderResetReason {
    fn default() -> Self {
        // SAFETY: all-zero bytes are a valid value for every field.
        unsafe { core::mem::zeroed() }
    }
}

/// `LEAP_SECOND_DATA` (1809 onwards; referenced, never inline).
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct LeapSecondData {
    pub enabled: u32,
    pub count: u32,
    pub data: [u64; 1],
}

/// `LOADER_HIVE_RECOVERY_INFO`: five undocumented words, zero-filled.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct LoaderHiveRecoveryInfo {
    pub unknown: [u32; 5],
}

/// `OFFLINE_CRASHDUMP_CONFIGURATION_TABLE`, Win8.1 form.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct OfflineCrashdumpTable81 {
    pub version: u32,
    pub abnormal_reset_occurred: u32,
    pub offline_memory_dump_capable: u32,
}

/// `OFFLINE_CRASHDUMP_CONFIGURATION_TABLE`, Win10 form (trailing alignment
/// hole folded in).
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct OfflineCrashdumpTable10 {
    pub version: u32,
    pub abnormal_reset_occurred: u32,
    pub offline_memory_dump_capable: u32,
    pub pad1: u32,
    pub reset_data_address: u64,
    pub reset_data_size: u32,
    pub pad2: u32,
}

/// `NUMA_MEMORY_RANGE` (2004). Same layout on both widths.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct NumaMemoryRange {
    pub proximity_id: u32,
    pub pad: u32,
    pub base_page: u64,
    pub end_page: u64,
}

const _: () = {
    assert!(size_of::<ProfileParameterBlock>() == 0x10);
    assert!(size_of::<TpmBootEntropyLdrResult>() == 0x48);
    assert!(size_of::<EntropySourceResult>() == 0x68);
    assert!(offset_of!(EntropySourceResult, policy) == 0x8);
    assert!(offset_of!(EntropySourceResult, entropy_data) == 0x24);

    assert!(size_of::<EntropyResult7>() == 0x710);
    assert!(size_of::<EntropyResult8>() == 0x778);
    assert!(size_of::<EntropyResult8Kd>() == 0x798);
    assert!(size_of::<EntropyResult10>() == 0x868);

    assert!(size_of::<LoaderPerformanceData>() == 0x10);
    assert!(size_of::<LoaderPerformanceData1809>() == 0x48);
    assert!(size_of::<LoaderPerformanceData1903>() == 0x60);
    assert!(size_of::<VsmPerformanceData>() == 0x40);

    assert!(size_of::<HypervisorExtension>() == 0x38);
    assert!(size_of::<HypervisorExtension1809>() == 0x40);
    assert!(size_of::<LoaderResetReason>() == 0x30);
    assert!(size_of::<LoaderHiveRecoveryInfo>() == 0x14);
    assert!(size_of::<OfflineCrashdumpTable81>() == 0xc);
    assert!(size_of::<OfflineCrashdumpTable10>() == 0x20);
    assert!(size_of::<NumaMemoryRange>() == 0x18);
};
