//! Boot configuration inputs.
//!
//! Everything the surrounding shim collects before the hand-off subsystem
//! runs: the parsed boot entry, firmware facts, entropy samples, opaque
//! extension payloads and the boot-start service list from the SYSTEM
//! hive. All of it is plain data; collaborators own the parsing.

use alloc::vec::Vec;
use ntboot_abi::shared::{EntropyResultCode, EntropySourceId};
use ntboot_winver::BlockLayout;

/// Target kernel identity from the boot configuration.
#[derive(Copy, Clone, Debug)]
pub struct KernelVersion {
    pub major: u16,
    pub minor: u16,
    pub build: u32,
}

/// Provides file contents from the boot volume. The shim backs this with
/// its FAT/NTFS reader; tests back it with a map.
pub trait ImageSource {
    /// Reads the file at `path` (relative to the system root), or `None`
    /// if it does not exist or cannot be read.
    fn read(&mut self, path: &str) -> Option<Vec<u8>>;
}

/// One disk the firmware can boot from.
#[derive(Clone, Debug)]
pub struct DiskSignature {
    /// ARC name, e.g. `multi(0)disk(0)rdisk(0)`.
    pub arc_name: alloc::string::String,
    /// MBR disk signature (zero for GPT disks).
    pub mbr_signature: u32,
    /// Checksum over the first sector.
    pub check_sum: u32,
    pub valid_partition_table: bool,
    pub x_int13: bool,
    pub is_gpt: bool,
    /// GPT disk GUID (zero for MBR disks).
    pub gpt_signature: [u8; 16],
}

/// Firmware facts captured before `ExitBootServices`.
#[derive(Clone, Debug, Default)]
pub struct FirmwareInputs {
    /// Firmware revision reported by the system table.
    pub firmware_version: u32,
    /// VA handed to `SetVirtualAddressMap` for the runtime services table.
    pub runtime_services_va: u64,
    /// Preserved EFI memory map (physical base, byte size, stride);
    /// required from Win8.1 on.
    pub efi_memory_map: u64,
    pub efi_memory_map_size: u32,
    pub efi_memory_map_descriptor_size: u32,
}

/// ACPI and SMBIOS discovery results.
#[derive(Copy, Clone, Debug, Default)]
pub struct PlatformTables {
    /// Physical address of the RSDP/XSDT root the kernel should use.
    pub acpi_table: u64,
    pub acpi_table_size: u32,
    /// Physical address of the SMBIOS entry point structure.
    pub smbios_eps: u64,
}

/// One collected entropy sample.
#[derive(Clone, Debug)]
pub struct EntropySample {
    pub source: EntropySourceId,
    pub result: EntropyResultCode,
    pub status: i32,
    /// Collection time in performance-counter ticks.
    pub time: u64,
    pub data: Vec<u8>,
}

/// Loader phase timestamps for the performance block.
#[derive(Copy, Clone, Debug, Default)]
pub struct PerfTimestamps {
    pub start_time: u64,
    pub end_time: u64,
}

/// Opaque payloads relocated into the loader heap and referenced from the
/// extension. Absent payloads leave zeroed fields.
#[derive(Clone, Debug, Default)]
pub struct ExtensionPayloads<'a> {
    /// Driver compatibility database (`drvmain.sdb`).
    pub drvdb: Option<&'a [u8]>,
    /// DrvDB delta patch (2004 onwards).
    pub drvdb_patch: Option<&'a [u8]>,
    /// Errata manager INF image.
    pub em_inf: Option<&'a [u8]>,
    /// API set schema (`apisetschema.dll` section).
    pub api_set_schema: Option<&'a [u8]>,
    /// Serialized boot options blob.
    pub boot_options: Option<&'a [u8]>,
    /// Offline crashdump table contents, when the platform supplies one:
    /// `(abnormal_reset, dump_capable)`.
    pub offline_crashdump: Option<(u32, u32)>,
}

/// One NUMA proximity range (2004 onwards).
#[derive(Copy, Clone, Debug)]
pub struct NumaRange {
    pub proximity_id: u32,
    pub base_page: u64,
    pub end_page: u64,
}

/// One `Services\*` entry from the SYSTEM hive, pre-parsed by the
/// configuration loader.
#[derive(Clone, Debug)]
pub struct ServiceEntry {
    /// Key name, e.g. `disk`.
    pub name: alloc::string::String,
    /// `ImagePath` value, relative to the system root.
    pub image_path: alloc::string::String,
    /// `Group` value.
    pub group: alloc::string::String,
    /// `Start` value.
    pub start: u32,
    /// `Type` value.
    pub service_type: u32,
}

/// The complete input set for one boot.
pub struct BootInputs<'a> {
    pub version: KernelVersion,
    /// Explicit block-layout override from the configuration, if any.
    pub layout_override: Option<BlockLayout>,
    pub arc_boot_device: &'a str,
    pub arc_hal_device: &'a str,
    pub nt_boot_path: &'a str,
    pub nt_hal_path: &'a str,
    pub load_options: &'a str,
    /// Raw SYSTEM hive image; copied into `RegistryData` pages.
    pub registry: Option<&'a [u8]>,
    /// NLS tables: `(ansi, oem, unicode)` code page images.
    pub nls: Option<(&'a [u8], &'a [u8], &'a [u8])>,
    pub disks: &'a [DiskSignature],
    pub firmware: FirmwareInputs,
    pub tables: PlatformTables,
    pub entropy: &'a [EntropySample],
    pub perf: PerfTimestamps,
    pub payloads: ExtensionPayloads<'a>,
    pub numa_ranges: &'a [NumaRange],
    /// GUID identifying this boot session.
    pub boot_identifier: [u8; 16],
    pub processor_counter_frequency: u64,
    pub services: &'a [ServiceEntry],
}

impl BootInputs<'_> {
    /// A minimal input set for `version`; optional data absent.
    #[must_use]
    pub fn minimal(version: KernelVersion) -> Self {
        BootInputs {
            version,
            layout_override: None,
            arc_boot_device: "multi(0)disk(0)rdisk(0)partition(1)",
            arc_hal_device: "multi(0)disk(0)rdisk(0)partition(1)",
            nt_boot_path: "\\Windows\\",
            nt_hal_path: "\\Windows\\",
            load_options: "",
            registry: None,
            nls: None,
            disks: &[],
            firmware: FirmwareInputs::default(),
            tables: PlatformTables::default(),
            entropy: &[],
            perf: PerfTimestamps::default(),
            payloads: ExtensionPayloads::default(),
            numa_ranges: &[],
            boot_identifier: [0; 16],
            processor_counter_frequency: 0,
            services: &[],
        }
    }
}
