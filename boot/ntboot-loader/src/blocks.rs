//! Loader parameter block and extension construction.
//!
//! `StructBuilder::build` allocates the version-selected block and
//! extension variants in the loader heap, wires every intrusive list head
//! to itself, clones the boot strings, relocates the opaque payloads and
//! fills each field the target kernel generation reads. The x86 and x86-64
//! paths are the same code expanded over the two ABI modules; only pointer
//! width and the handful of arch-only fields differ.
//!
//! Nothing written here is a loader-side address: the heap hands out
//! kernel VAs, and the physical backing is reachable only through the
//! mapping plan.

use crate::arcdisks;
use crate::config;
use crate::entropy;
use crate::heap::LoaderHeap;
use crate::inputs::BootInputs;
use crate::space::KernelSpacePlan;
use crate::{LoaderError, PoolAccess};
use core::mem::{offset_of, size_of};
use log::{debug, info};
use ntboot_addresses::{PAGE_SHIFT, pages_spanned};
use ntboot_abi::list::{ListEntry32, ListEntry64};
use ntboot_abi::shared::LoaderBootFlags;
use ntboot_mmap::{MemoryMap, MemoryType};
use ntboot_pe::Machine;
use ntboot_vmem::MapAttributes;
use ntboot_winver::{
    BlockLayout, ExtensionLayout, FirmwareInfoLayout, PerfDataLayout, VersionDescriptor,
    lookup_with_override,
};

/// Intrusive list access generic over pointer width. Kernel VAs are passed
/// as `u64`; the 32-bit implementation truncates, which is exact because
/// x86 kernel VAs fit 32 bits by construction.
pub trait IntrusiveList: Copy {
    fn empty_at(va: u64) -> Self;
    fn flink(&self) -> u64;
    fn blink(&self) -> u64;
    fn set_flink(&mut self, va: u64);
    fn set_blink(&mut self, va: u64);
}

impl IntrusiveList for ListEntry64 {
    fn empty_at(va: u64) -> Self {
        Self::empty_at(va)
    }
    fn flink(&self) -> u64 {
        self.flink
    }
    fn blink(&self) -> u64 {
        self.blink
    }
    fn set_flink(&mut self, va: u64) {
        self.flink = va;
    }
    fn set_blink(&mut self, va: u64) {
        self.blink = va;
    }
}

impl IntrusiveList for ListEntry32 {
    fn empty_at(va: u64) -> Self {
        Self::empty_at(va as u32)
    }
    fn flink(&self) -> u64 {
        u64::from(self.flink)
    }
    fn blink(&self) -> u64 {
        u64::from(self.blink)
    }
    fn set_flink(&mut self, va: u64) {
        self.flink = va as u32;
    }
    fn set_blink(&mut self, va: u64) {
        self.blink = va as u32;
    }
}

/// Appends the entry at `entry_va` (whose list links lead the structure)
/// to the ring headed at `head_va`. Both live in the loader heap.
pub fn list_append<L: IntrusiveList, P: PoolAccess>(
    heap: &LoaderHeap<'_, P>,
    head_va: u64,
    entry_va: u64,
) {
    let tail_va = heap.at_mut::<L>(head_va).blink();
    {
        let entry = heap.at_mut::<L>(entry_va);
        entry.set_flink(head_va);
        entry.set_blink(tail_va);
    }
    heap.at_mut::<L>(tail_va).set_flink(entry_va);
    heap.at_mut::<L>(head_va).set_blink(entry_va);
}

/// Walks a ring, yielding entry VAs (excluding the head).
pub fn list_iter<L: IntrusiveList, P: PoolAccess>(
    heap: &LoaderHeap<'_, P>,
    head_va: u64,
) -> impl Iterator<Item = u64> {
    let mut cursor = heap.at_mut::<L>(head_va).flink();
    core::iter::from_fn(move || {
        if cursor == head_va {
            return None;
        }
        let va = cursor;
        cursor = heap.at_mut::<L>(cursor).flink();
        Some(va)
    })
}

/// The constructed block, with the handles later phases need.
pub struct BuiltBlock {
    pub arch: Machine,
    pub descriptor: &'static VersionDescriptor,
    pub block_va: u64,
    pub extension_va: u64,
    pub load_order_head: u64,
    pub memory_descriptor_head: u64,
    pub boot_driver_head: u64,
    pub early_launch_head: Option<u64>,
    pub core_driver_head: Option<u64>,
    pub core_extensions_head: Option<u64>,
    pub tpm_core_head: Option<u64>,
}

/// Relocated payload VAs shared between the block and extension fill.
struct Staged {
    registry_va: u64,
    registry_len: u32,
    nls_va: u64,
    disks_va: u64,
    config_va: u64,
    arc_boot: u64,
    arc_hal: u64,
    nt_boot: u64,
    nt_hal: u64,
    load_options: u64,
    em_inf_va: u64,
    em_inf_len: u64,
    drvdb_va: u64,
    drvdb_len: u64,
    drvdb_patch_va: u64,
    drvdb_patch_len: u32,
    api_set_va: u64,
    api_set_len: u32,
    boot_options_va: u64,
    numa_va: u64,
    numa_count: u32,
    perf_ptr_va: u64,
}

/// Builds the parameter block for one boot.
pub struct StructBuilder<'a, 'p, P: PoolAccess> {
    pub heap: &'a mut LoaderHeap<'p, P>,
    pub map: &'a mut MemoryMap,
    pub plan: &'a mut KernelSpacePlan,
    pub pool: &'p P,
}

impl<P: PoolAccess> StructBuilder<'_, '_, P> {
    /// Allocates and fills the block and extension for `inputs`.
    ///
    /// # Errors
    /// [`LoaderError`] on unsupported versions, exhausted pool, bad string
    /// encodings or missing firmware information.
    pub fn build(&mut self, arch: Machine, inputs: &BootInputs<'_>) -> Result<BuiltBlock, LoaderError> {
        let descriptor = lookup_with_override(
            inputs.version.major,
            inputs.version.minor,
            inputs.version.build,
            inputs.layout_override,
        )?;
        info!(
            "building {}.{} build {} block ({:?}/{:?})",
            inputs.version.major,
            inputs.version.minor,
            inputs.version.build,
            descriptor.block,
            descriptor.extension,
        );

        if descriptor.firmware_info != FirmwareInfoLayout::None
            && inputs.firmware.runtime_services_va == 0
        {
            return Err(LoaderError::FirmwareInfoMismatch);
        }
        for s in [
            inputs.arc_boot_device,
            inputs.arc_hal_device,
            inputs.nt_boot_path,
            inputs.nt_hal_path,
            inputs.load_options,
        ] {
            if !s.is_ascii() {
                return Err(LoaderError::InvalidStringEncoding);
            }
        }

        let staged = self.stage(arch, descriptor, inputs)?;
        match arch {
            Machine::X64 => self.build_x64(descriptor, inputs, &staged),
            Machine::X86 => self.build_x86(descriptor, inputs, &staged),
        }
    }

    /// Copies blobs into their typed pages and the heap, and builds the
    /// side structures both the block and extension reference.
    fn stage(
        &mut self,
        arch: Machine,
        descriptor: &'static VersionDescriptor,
        inputs: &BootInputs<'_>,
    ) -> Result<Staged, LoaderError> {
        let (registry_va, registry_len) = match inputs.registry {
            Some(blob) => (
                self.copy_to_typed_pages(blob, MemoryType::RegistryData)?,
                u32::try_from(blob.len()).map_err(|_| LoaderError::InvalidStringEncoding)?,
            ),
            None => (0, 0),
        };

        let nls_va = match inputs.nls {
            Some((ansi, oem, unicode)) => {
                let ansi_va = self.copy_to_typed_pages(ansi, MemoryType::NlsData)?;
                let oem_va = self.copy_to_typed_pages(oem, MemoryType::NlsData)?;
                let unicode_va = self.copy_to_typed_pages(unicode, MemoryType::NlsData)?;
                match arch {
                    Machine::X64 => {
                        let va = self.heap.place::<ntboot_abi::block64::NlsDataBlock64>()?;
                        let nls = self.heap.at_mut::<ntboot_abi::block64::NlsDataBlock64>(va);
                        nls.ansi_code_page_data = ansi_va;
                        nls.oem_code_page_data = oem_va;
                        nls.unicode_code_page_data = unicode_va;
                        va
                    }
                    Machine::X86 => {
                        let va = self.heap.place::<ntboot_abi::block32::NlsDataBlock32>()?;
                        let nls = self.heap.at_mut::<ntboot_abi::block32::NlsDataBlock32>(va);
                        nls.ansi_code_page_data = ansi_va as u32;
                        nls.oem_code_page_data = oem_va as u32;
                        nls.unicode_code_page_data = unicode_va as u32;
                        va
                    }
                }
            }
            None => 0,
        };

        let win7_disks = !matches!(descriptor.block, BlockLayout::Ws03 | BlockLayout::Vista);
        let disks_va = match arch {
            Machine::X64 => arcdisks::build_disk_list_x64(self.heap, inputs.disks, win7_disks)?,
            Machine::X86 => arcdisks::build_disk_list_x86(self.heap, inputs.disks, win7_disks)?,
        };

        let config_va = match arch {
            Machine::X64 => config::build_tree_x64(self.heap, 0)?,
            Machine::X86 => config::build_tree_x86(self.heap, 0)?,
        };

        let mut blob = |data: Option<&[u8]>| -> Result<(u64, u64), LoaderError> {
            match data {
                Some(bytes) => Ok((self.heap.bytes(bytes, 8)?, bytes.len() as u64)),
                None => Ok((0, 0)),
            }
        };
        let (em_inf_va, em_inf_len) = blob(inputs.payloads.em_inf)?;
        let (drvdb_va, drvdb_len) = blob(inputs.payloads.drvdb)?;
        let (drvdb_patch_va, drvdb_patch_len) = blob(inputs.payloads.drvdb_patch)?;
        let (api_set_va, api_set_len) = blob(inputs.payloads.api_set_schema)?;
        let (boot_options_va, _) = blob(inputs.payloads.boot_options)?;

        let (numa_va, numa_count) = if descriptor.has_numa_ranges && !inputs.numa_ranges.is_empty()
        {
            use ntboot_abi::shared::NumaMemoryRange;
            let len = inputs.numa_ranges.len() * size_of::<NumaMemoryRange>();
            let va = self.heap.alloc(len, 8)?;
            for (index, range) in inputs.numa_ranges.iter().enumerate() {
                let entry = self
                    .heap
                    .at_mut::<NumaMemoryRange>(va + (index * size_of::<NumaMemoryRange>()) as u64);
                entry.proximity_id = range.proximity_id;
                entry.base_page = range.base_page;
                entry.end_page = range.end_page;
            }
            (va, inputs.numa_ranges.len() as u32)
        } else {
            (0, 0)
        };

        let perf_ptr_va = if descriptor.perf_data == PerfDataLayout::Pointer {
            use ntboot_abi::shared::LoaderPerformanceData;
            let va = self.heap.place::<LoaderPerformanceData>()?;
            let perf = self.heap.at_mut::<LoaderPerformanceData>(va);
            perf.start_time = inputs.perf.start_time;
            perf.end_time = inputs.perf.end_time;
            va
        } else {
            0
        };

        Ok(Staged {
            registry_va,
            registry_len,
            nls_va,
            disks_va,
            config_va,
            arc_boot: self.heap.ansi_str(inputs.arc_boot_device)?,
            arc_hal: self.heap.ansi_str(inputs.arc_hal_device)?,
            nt_boot: self.heap.ansi_str(inputs.nt_boot_path)?,
            nt_hal: self.heap.ansi_str(inputs.nt_hal_path)?,
            load_options: self.heap.ansi_str(inputs.load_options)?,
            em_inf_va,
            em_inf_len,
            drvdb_va,
            drvdb_len,
            drvdb_patch_va,
            drvdb_patch_len: drvdb_patch_len as u32,
            api_set_va,
            api_set_len: api_set_len as u32,
            boot_options_va,
            numa_va,
            numa_count,
            perf_ptr_va,
        })
    }

    /// Copies `blob` into freshly allocated pages of `memory_type` and
    /// plans their kernel mapping; returns the kernel VA.
    fn copy_to_typed_pages(
        &mut self,
        blob: &[u8],
        memory_type: MemoryType,
    ) -> Result<u64, LoaderError> {
        let pages = pages_spanned(blob.len() as u64).max(1);
        let base = self.map.allocate(pages, memory_type, 1)?;
        let phys = base.base();
        self.pool.slice_mut(phys, blob.len()).copy_from_slice(blob);
        // Zero the tail of the last page.
        let total = usize::try_from(pages << PAGE_SHIFT).unwrap_or(usize::MAX);
        self.pool
            .slice_mut(phys + blob.len() as u64, total - blob.len())
            .fill(0);
        Ok(self
            .plan
            .reserve_mapped(phys, pages, MapAttributes::kernel_data()))
    }
}
// The per-generation fill is shared between pointer widths by expanding the
// same code over the `block32`/`ext32` and `block64`/`ext64` modules. The
// helper macros below take the width plumbing (`$list`, `$ptr`) explicitly
// so one definition serves both expansions.

/// Writes a self-referential list head at `base + offsetof(ty, field)` and
/// yields its VA.
macro_rules! self_ref_head {
    ($heap:expr, $list:ty, $ty:ty, $base:expr, $field:ident) => {{
        let head_va = $base + offset_of!($ty, $field) as u64;
        *$heap.at_mut::<$list>(head_va) = <$list as IntrusiveList>::empty_at(head_va);
        head_va
    }};
}

/// Extension fields present in every generation.
macro_rules! fill_ext_base {
    ($heap:expr, $staged:expr, $inputs:expr, $list:ty, $ptr:ty, $ty:ty, $va:expr, $e:expr) => {{
        $e.size = size_of::<$ty>() as u32;
        $e.em_inf_file_image = $staged.em_inf_va as $ptr;
        $e.em_inf_file_size = $staged.em_inf_len as $ptr;
        $e.smbios_eps_header = $inputs.tables.smbios_eps as $ptr;
        $e.drvdb_image = $staged.drvdb_va as $ptr;
        $e.drvdb_size = $staged.drvdb_len as $ptr;
        $e.acpi_table = $inputs.tables.acpi_table as $ptr;
        $e.acpi_table_size = $inputs.tables.acpi_table_size;
        self_ref_head!($heap, $list, $ty, $va, firmware_descriptor_list_head);
    }};
}

/// Vista onwards: flags, boot identity, persistent-data list.
macro_rules! fill_ext_vista {
    ($heap:expr, $inputs:expr, $list:ty, $ty:ty, $va:expr, $e:expr) => {{
        $e.loader_flags = LoaderBootFlags::new()
            .with_boot_via_winload(true)
            .with_boot_via_efi(true);
        $e.boot_identifier = $inputs.boot_identifier;
        self_ref_head!($heap, $list, $ty, $va, boot_application_persistent_data);
    }};
}

/// Vista through 1703: out-of-line performance data.
macro_rules! fill_ext_perf_ptr {
    ($staged:expr, $ptr:ty, $e:expr) => {{
        $e.loader_performance_data = $staged.perf_ptr_va as $ptr;
    }};
}

/// Win7 onwards: the attached-hives list.
macro_rules! fill_ext_win7 {
    ($heap:expr, $list:ty, $ty:ty, $va:expr) => {{
        self_ref_head!($heap, $list, $ty, $va, attached_hives);
    }};
}

/// Win8 onwards: counter frequency and the HAL extension list.
macro_rules! fill_ext_win8 {
    ($heap:expr, $inputs:expr, $list:ty, $ty:ty, $va:expr, $e:expr) => {{
        $e.processor_counter_frequency = $inputs.processor_counter_frequency;
        self_ref_head!($heap, $list, $ty, $va, hal_extension_module_list);
    }};
}

/// Win8.1 onwards: the API set schema and its extension list.
macro_rules! fill_ext_win81 {
    ($heap:expr, $staged:expr, $list:ty, $ptr:ty, $ty:ty, $va:expr, $e:expr) => {{
        $e.api_set_schema = $staged.api_set_va as $ptr;
        $e.api_set_schema_size = $staged.api_set_len;
        self_ref_head!($heap, $list, $ty, $va, api_set_schema_extensions);
    }};
}

/// Win10 onwards: boot options and the offline crashdump table.
macro_rules! fill_ext_win10 {
    ($staged:expr, $inputs:expr, $ptr:ty, $e:expr) => {{
        $e.boot_options = $staged.boot_options_va as $ptr;
        if let Some((abnormal, capable)) = $inputs.payloads.offline_crashdump {
            $e.offline_crashdump_table.version = 1;
            $e.offline_crashdump_table.abnormal_reset_occurred = abnormal;
            $e.offline_crashdump_table.offline_memory_dump_capable = capable;
        }
    }};
}

/// 1607 onwards: the NTDDI release stamp.
macro_rules! fill_ext_rs1 {
    ($descriptor:expr, $e:expr) => {{
        $e.major_release = $descriptor.ntddi;
    }};
}

/// 1809 onwards: inline performance data.
macro_rules! fill_ext_inline_perf {
    ($inputs:expr, $e:expr) => {{
        $e.loader_performance_data.start_time = $inputs.perf.start_time;
        $e.loader_performance_data.end_time = $inputs.perf.end_time;
    }};
}

/// Block fields present in every generation; yields the three list-head VAs.
macro_rules! fill_block_base {
    ($heap:expr, $staged:expr, $ext_va:expr, $list:ty, $ptr:ty, $ty:ty, $va:expr, $b:expr) => {{
        $b.registry_length = $staged.registry_len;
        $b.registry_base = $staged.registry_va as $ptr;
        $b.configuration_root = $staged.config_va as $ptr;
        $b.arc_boot_device_name = $staged.arc_boot as $ptr;
        $b.arc_hal_device_name = $staged.arc_hal as $ptr;
        $b.nt_boot_path_name = $staged.nt_boot as $ptr;
        $b.nt_hal_path_name = $staged.nt_hal as $ptr;
        $b.load_options = $staged.load_options as $ptr;
        $b.nls_data = $staged.nls_va as $ptr;
        $b.arc_disk_information = $staged.disks_va as $ptr;
        $b.extension = $ext_va as $ptr;
        (
            self_ref_head!($heap, $list, $ty, $va, load_order_list_head),
            self_ref_head!($heap, $list, $ty, $va, memory_descriptor_list_head),
            self_ref_head!($heap, $list, $ty, $va, boot_driver_list_head),
        )
    }};
}

/// Win7 onwards: the version header the kernel validates on entry.
macro_rules! fill_block_header {
    ($inputs:expr, $ty:ty, $b:expr) => {{
        $b.os_major_version = u32::from($inputs.version.major);
        $b.os_minor_version = u32::from($inputs.version.minor);
        $b.size = size_of::<$ty>() as u32;
    }};
}

/// Vista onwards: the EFI arm of the firmware information union.
macro_rules! fill_fw_efi {
    ($inputs:expr, $ptr:ty, $b:expr) => {{
        $b.firmware_information.firmware_type = ntboot_abi::FIRMWARE_TYPE_EFI;
        $b.firmware_information.firmware_version = $inputs.firmware.firmware_version;
        $b.firmware_information.virtual_efi_runtime_services =
            $inputs.firmware.runtime_services_va as $ptr;
    }};
}

/// Win8.1 onwards: the preserved EFI memory map fields.
macro_rules! fill_fw_efi_map {
    ($inputs:expr, $ptr:ty, $b:expr) => {{
        $b.firmware_information.efi_memory_map = $inputs.firmware.efi_memory_map as $ptr;
        $b.firmware_information.efi_memory_map_size = $inputs.firmware.efi_memory_map_size;
        $b.firmware_information.efi_memory_map_descriptor_size =
            $inputs.firmware.efi_memory_map_descriptor_size;
    }};
}

/// Win8 onwards: the firmware information's own resource list head, at a
/// nested offset.
macro_rules! fill_fw_resource_head {
    ($heap:expr, $list:ty, $ty:ty, $fw_ty:ty, $va:expr) => {{
        let head_va = $va
            + offset_of!($ty, firmware_information) as u64
            + offset_of!($fw_ty, firmware_resource_list) as u64;
        *$heap.at_mut::<$list>(head_va) = <$list as IntrusiveList>::empty_at(head_va);
    }};
}

/// Expands the block/extension fill for one pointer width.
macro_rules! define_build_arch {
    ($fn_name:ident, $machine:expr, $blocks:ident, $ext:ident, $list:ty, $ptr:ty,
     $fw8:ident, $fw81:ident) => {
        impl<P: PoolAccess> StructBuilder<'_, '_, P> {
            #[allow(
                clippy::too_many_lines,
                clippy::cast_possible_truncation,
                trivial_numeric_casts
            )]
            fn $fn_name(
                &mut self,
                descriptor: &'static VersionDescriptor,
                inputs: &BootInputs<'_>,
                staged: &Staged,
            ) -> Result<BuiltBlock, LoaderError> {
                use ntboot_abi::$blocks as blocks;
                use ntboot_abi::$ext as ext;

                let samples = inputs.entropy;
                let extension_va = match descriptor.extension {
                    ExtensionLayout::Ws03 => {
                        let va = self.heap.place::<ext::ExtensionWs03>()?;
                        let e = self.heap.at_mut::<ext::ExtensionWs03>(va);
                        fill_ext_base!(self.heap, staged, inputs, $list, $ptr,
                            ext::ExtensionWs03, va, e);
                        e.major_version = u32::from(inputs.version.major);
                        e.minor_version = u32::from(inputs.version.minor);
                        va
                    }
                    ExtensionLayout::Vista => {
                        let va = self.heap.place::<ext::ExtensionVista>()?;
                        let e = self.heap.at_mut::<ext::ExtensionVista>(va);
                        fill_ext_base!(self.heap, staged, inputs, $list, $ptr,
                            ext::ExtensionVista, va, e);
                        fill_ext_vista!(self.heap, inputs, $list, ext::ExtensionVista, va, e);
                        fill_ext_perf_ptr!(staged, $ptr, e);
                        e.major_version = u32::from(inputs.version.major);
                        e.minor_version = u32::from(inputs.version.minor);
                        va
                    }
                    ExtensionLayout::VistaSp2 => {
                        let va = self.heap.place::<ext::ExtensionVistaSp2>()?;
                        let e = self.heap.at_mut::<ext::ExtensionVistaSp2>(va);
                        fill_ext_base!(self.heap, staged, inputs, $list, $ptr,
                            ext::ExtensionVistaSp2, va, e);
                        fill_ext_vista!(self.heap, inputs, $list, ext::ExtensionVistaSp2, va, e);
                        fill_ext_perf_ptr!(staged, $ptr, e);
                        e.major_version = u32::from(inputs.version.major);
                        e.minor_version = u32::from(inputs.version.minor);
                        va
                    }
                    ExtensionLayout::Win7 => {
                        let va = self.heap.place::<ext::ExtensionWin7>()?;
                        let e = self.heap.at_mut::<ext::ExtensionWin7>(va);
                        fill_ext_base!(self.heap, staged, inputs, $list, $ptr,
                            ext::ExtensionWin7, va, e);
                        fill_ext_vista!(self.heap, inputs, $list, ext::ExtensionWin7, va, e);
                        fill_ext_perf_ptr!(staged, $ptr, e);
                        fill_ext_win7!(self.heap, $list, ext::ExtensionWin7, va);
                        e.processor_counter_frequency = inputs.processor_counter_frequency;
                        entropy::fill_tpm_result(&mut e.tpm_boot_entropy_result, samples);
                        va
                    }
                    ExtensionLayout::Win8 => {
                        let va = self.heap.place::<ext::ExtensionWin8>()?;
                        let e = self.heap.at_mut::<ext::ExtensionWin8>(va);
                        fill_ext_base!(self.heap, staged, inputs, $list, $ptr,
                            ext::ExtensionWin8, va, e);
                        fill_ext_vista!(self.heap, inputs, $list, ext::ExtensionWin8, va, e);
                        fill_ext_perf_ptr!(staged, $ptr, e);
                        fill_ext_win7!(self.heap, $list, ext::ExtensionWin8, va);
                        fill_ext_win8!(self.heap, inputs, $list, ext::ExtensionWin8, va, e);
                        entropy::fill_result7(&mut e.boot_entropy_result, samples);
                        va
                    }
                    ExtensionLayout::Win81 => {
                        let va = self.heap.place::<ext::ExtensionWin81>()?;
                        let e = self.heap.at_mut::<ext::ExtensionWin81>(va);
                        fill_ext_base!(self.heap, staged, inputs, $list, $ptr,
                            ext::ExtensionWin81, va, e);
                        fill_ext_vista!(self.heap, inputs, $list, ext::ExtensionWin81, va, e);
                        fill_ext_perf_ptr!(staged, $ptr, e);
                        fill_ext_win7!(self.heap, $list, ext::ExtensionWin81, va);
                        fill_ext_win8!(self.heap, inputs, $list, ext::ExtensionWin81, va, e);
                        fill_ext_win81!(self.heap, staged, $list, $ptr, ext::ExtensionWin81, va, e);
                        entropy::fill_result8(&mut e.boot_entropy_result, samples);
                        va
                    }
                    ExtensionLayout::Win10 => {
                        let va = self.heap.place::<ext::ExtensionWin10>()?;
                        let e = self.heap.at_mut::<ext::ExtensionWin10>(va);
                        fill_ext_base!(self.heap, staged, inputs, $list, $ptr,
                            ext::ExtensionWin10, va, e);
                        fill_ext_vista!(self.heap, inputs, $list, ext::ExtensionWin10, va, e);
                        fill_ext_perf_ptr!(staged, $ptr, e);
                        fill_ext_win7!(self.heap, $list, ext::ExtensionWin10, va);
                        fill_ext_win8!(self.heap, inputs, $list, ext::ExtensionWin10, va, e);
                        fill_ext_win81!(self.heap, staged, $list, $ptr, ext::ExtensionWin10, va, e);
                        fill_ext_win10!(staged, inputs, $ptr, e);
                        entropy::fill_result8(&mut e.boot_entropy_result, samples);
                        va
                    }
                    ExtensionLayout::Win10Rs1 => {
                        let va = self.heap.place::<ext::ExtensionWin10Rs1>()?;
                        let e = self.heap.at_mut::<ext::ExtensionWin10Rs1>(va);
                        fill_ext_base!(self.heap, staged, inputs, $list, $ptr,
                            ext::ExtensionWin10Rs1, va, e);
                        fill_ext_vista!(self.heap, inputs, $list, ext::ExtensionWin10Rs1, va, e);
                        fill_ext_perf_ptr!(staged, $ptr, e);
                        fill_ext_win7!(self.heap, $list, ext::ExtensionWin10Rs1, va);
                        fill_ext_win8!(self.heap, inputs, $list, ext::ExtensionWin10Rs1, va, e);
                        fill_ext_win81!(self.heap, staged, $list, $ptr,
                            ext::ExtensionWin10Rs1, va, e);
                        fill_ext_win10!(staged, inputs, $ptr, e);
                        fill_ext_rs1!(descriptor, e);
                        entropy::fill_result8(&mut e.boot_entropy_result, samples);
                        va
                    }
                    ExtensionLayout::Win10Rs2 => {
                        let va = self.heap.place::<ext::ExtensionWin10Rs2>()?;
                        let e = self.heap.at_mut::<ext::ExtensionWin10Rs2>(va);
                        fill_ext_base!(self.heap, staged, inputs, $list, $ptr,
                            ext::ExtensionWin10Rs2, va, e);
                        fill_ext_vista!(self.heap, inputs, $list, ext::ExtensionWin10Rs2, va, e);
                        fill_ext_perf_ptr!(staged, $ptr, e);
                        fill_ext_win7!(self.heap, $list, ext::ExtensionWin10Rs2, va);
                        fill_ext_win8!(self.heap, inputs, $list, ext::ExtensionWin10Rs2, va, e);
                        fill_ext_win81!(self.heap, staged, $list, $ptr,
                            ext::ExtensionWin10Rs2, va, e);
                        fill_ext_win10!(staged, inputs, $ptr, e);
                        fill_ext_rs1!(descriptor, e);
                        entropy::fill_result8_kd(&mut e.boot_entropy_result, samples);
                        va
                    }
                    ExtensionLayout::Win10Rs5 => {
                        let va = self.heap.place::<ext::ExtensionWin10Rs5>()?;
                        let e = self.heap.at_mut::<ext::ExtensionWin10Rs5>(va);
                        fill_ext_base!(self.heap, staged, inputs, $list, $ptr,
                            ext::ExtensionWin10Rs5, va, e);
                        fill_ext_vista!(self.heap, inputs, $list, ext::ExtensionWin10Rs5, va, e);
                        fill_ext_win7!(self.heap, $list, ext::ExtensionWin10Rs5, va);
                        fill_ext_win8!(self.heap, inputs, $list, ext::ExtensionWin10Rs5, va, e);
                        fill_ext_win81!(self.heap, staged, $list, $ptr,
                            ext::ExtensionWin10Rs5, va, e);
                        fill_ext_win10!(staged, inputs, $ptr, e);
                        fill_ext_rs1!(descriptor, e);
                        fill_ext_inline_perf!(inputs, e);
                        entropy::fill_result10(&mut e.boot_entropy_result, samples);
                        va
                    }
                    ExtensionLayout::Win10V1903 => {
                        let va = self.heap.place::<ext::ExtensionWin10V1903>()?;
                        let e = self.heap.at_mut::<ext::ExtensionWin10V1903>(va);
                        fill_ext_base!(self.heap, staged, inputs, $list, $ptr,
                            ext::ExtensionWin10V1903, va, e);
                        fill_ext_vista!(self.heap, inputs, $list, ext::ExtensionWin10V1903, va, e);
                        fill_ext_win7!(self.heap, $list, ext::ExtensionWin10V1903, va);
                        fill_ext_win8!(self.heap, inputs, $list, ext::ExtensionWin10V1903, va, e);
                        fill_ext_win81!(self.heap, staged, $list, $ptr,
                            ext::ExtensionWin10V1903, va, e);
                        fill_ext_win10!(staged, inputs, $ptr, e);
                        fill_ext_rs1!(descriptor, e);
                        fill_ext_inline_perf!(inputs, e);
                        entropy::fill_result10(&mut e.boot_entropy_result, samples);
                        va
                    }
                    ExtensionLayout::Win10V2004 => {
                        let va = self.heap.place::<ext::ExtensionWin10V2004>()?;
                        let e = self.heap.at_mut::<ext::ExtensionWin10V2004>(va);
                        fill_ext_base!(self.heap, staged, inputs, $list, $ptr,
                            ext::ExtensionWin10V2004, va, e);
                        fill_ext_vista!(self.heap, inputs, $list, ext::ExtensionWin10V2004, va, e);
                        fill_ext_win7!(self.heap, $list, ext::ExtensionWin10V2004, va);
                        fill_ext_win8!(self.heap, inputs, $list, ext::ExtensionWin10V2004, va, e);
                        fill_ext_win81!(self.heap, staged, $list, $ptr,
                            ext::ExtensionWin10V2004, va, e);
                        fill_ext_win10!(staged, inputs, $ptr, e);
                        fill_ext_rs1!(descriptor, e);
                        fill_ext_inline_perf!(inputs, e);
                        e.drvdb_patch_image = staged.drvdb_patch_va as $ptr;
                        e.drvdb_patch_size = staged.drvdb_patch_len;
                        e.numa_memory_ranges = staged.numa_va as $ptr;
                        e.numa_memory_range_count = staged.numa_count;
                        // IommuFaultPolicy semantics are undocumented; stays
                        // zero.
                        entropy::fill_result10(&mut e.boot_entropy_result, samples);
                        va
                    }
                };

                let built = match descriptor.block {
                    BlockLayout::Ws03 => {
                        let va = self.heap.place::<blocks::BlockWs03>()?;
                        let b = self.heap.at_mut::<blocks::BlockWs03>(va);
                        let (load, mem, drv) = fill_block_base!(self.heap, staged, extension_va,
                            $list, $ptr, blocks::BlockWs03, va, b);
                        BuiltBlock {
                            arch: $machine,
                            descriptor,
                            block_va: va,
                            extension_va,
                            load_order_head: load,
                            memory_descriptor_head: mem,
                            boot_driver_head: drv,
                            early_launch_head: None,
                            core_driver_head: None,
                            core_extensions_head: None,
                            tpm_core_head: None,
                        }
                    }
                    BlockLayout::Vista => {
                        let va = self.heap.place::<blocks::BlockVista>()?;
                        let b = self.heap.at_mut::<blocks::BlockVista>(va);
                        let (load, mem, drv) = fill_block_base!(self.heap, staged, extension_va,
                            $list, $ptr, blocks::BlockVista, va, b);
                        fill_fw_efi!(inputs, $ptr, b);
                        BuiltBlock {
                            arch: $machine,
                            descriptor,
                            block_va: va,
                            extension_va,
                            load_order_head: load,
                            memory_descriptor_head: mem,
                            boot_driver_head: drv,
                            early_launch_head: None,
                            core_driver_head: None,
                            core_extensions_head: None,
                            tpm_core_head: None,
                        }
                    }
                    BlockLayout::Win7 => {
                        let va = self.heap.place::<blocks::BlockWin7>()?;
                        let b = self.heap.at_mut::<blocks::BlockWin7>(va);
                        fill_block_header!(inputs, blocks::BlockWin7, b);
                        let (load, mem, drv) = fill_block_base!(self.heap, staged, extension_va,
                            $list, $ptr, blocks::BlockWin7, va, b);
                        fill_fw_efi!(inputs, $ptr, b);
                        BuiltBlock {
                            arch: $machine,
                            descriptor,
                            block_va: va,
                            extension_va,
                            load_order_head: load,
                            memory_descriptor_head: mem,
                            boot_driver_head: drv,
                            early_launch_head: None,
                            core_driver_head: None,
                            core_extensions_head: None,
                            tpm_core_head: None,
                        }
                    }
                    BlockLayout::Win8 => {
                        let va = self.heap.place::<blocks::BlockWin8>()?;
                        let b = self.heap.at_mut::<blocks::BlockWin8>(va);
                        fill_block_header!(inputs, blocks::BlockWin8, b);
                        let (load, mem, drv) = fill_block_base!(self.heap, staged, extension_va,
                            $list, $ptr, blocks::BlockWin8, va, b);
                        fill_fw_efi!(inputs, $ptr, b);
                        fill_fw_resource_head!(self.heap, $list, blocks::BlockWin8,
                            blocks::$fw8, va);
                        let early = self_ref_head!(self.heap, $list, blocks::BlockWin8, va,
                            early_launch_list_head);
                        let core = self_ref_head!(self.heap, $list, blocks::BlockWin8, va,
                            core_driver_list_head);
                        BuiltBlock {
                            arch: $machine,
                            descriptor,
                            block_va: va,
                            extension_va,
                            load_order_head: load,
                            memory_descriptor_head: mem,
                            boot_driver_head: drv,
                            early_launch_head: Some(early),
                            core_driver_head: Some(core),
                            core_extensions_head: None,
                            tpm_core_head: None,
                        }
                    }
                    BlockLayout::Win81 => {
                        let va = self.heap.place::<blocks::BlockWin81>()?;
                        let b = self.heap.at_mut::<blocks::BlockWin81>(va);
                        fill_block_header!(inputs, blocks::BlockWin81, b);
                        let (load, mem, drv) = fill_block_base!(self.heap, staged, extension_va,
                            $list, $ptr, blocks::BlockWin81, va, b);
                        fill_fw_efi!(inputs, $ptr, b);
                        fill_fw_efi_map!(inputs, $ptr, b);
                        fill_fw_resource_head!(self.heap, $list, blocks::BlockWin81,
                            blocks::$fw81, va);
                        let early = self_ref_head!(self.heap, $list, blocks::BlockWin81, va,
                            early_launch_list_head);
                        let core = self_ref_head!(self.heap, $list, blocks::BlockWin81, va,
                            core_driver_list_head);
                        BuiltBlock {
                            arch: $machine,
                            descriptor,
                            block_va: va,
                            extension_va,
                            load_order_head: load,
                            memory_descriptor_head: mem,
                            boot_driver_head: drv,
                            early_launch_head: Some(early),
                            core_driver_head: Some(core),
                            core_extensions_head: None,
                            tpm_core_head: None,
                        }
                    }
                    BlockLayout::Win10 => {
                        let va = self.heap.place::<blocks::BlockWin10>()?;
                        let b = self.heap.at_mut::<blocks::BlockWin10>(va);
                        fill_block_header!(inputs, blocks::BlockWin10, b);
                        let (load, mem, drv) = fill_block_base!(self.heap, staged, extension_va,
                            $list, $ptr, blocks::BlockWin10, va, b);
                        fill_fw_efi!(inputs, $ptr, b);
                        fill_fw_efi_map!(inputs, $ptr, b);
                        fill_fw_resource_head!(self.heap, $list, blocks::BlockWin10,
                            blocks::$fw81, va);
                        let early = self_ref_head!(self.heap, $list, blocks::BlockWin10, va,
                            early_launch_list_head);
                        let core = self_ref_head!(self.heap, $list, blocks::BlockWin10, va,
                            core_driver_list_head);
                        let core_ext = self_ref_head!(self.heap, $list, blocks::BlockWin10, va,
                            core_extensions_driver_list_head);
                        let tpm = self_ref_head!(self.heap, $list, blocks::BlockWin10, va,
                            tpm_core_driver_list_head);
                        BuiltBlock {
                            arch: $machine,
                            descriptor,
                            block_va: va,
                            extension_va,
                            load_order_head: load,
                            memory_descriptor_head: mem,
                            boot_driver_head: drv,
                            early_launch_head: Some(early),
                            core_driver_head: Some(core),
                            core_extensions_head: Some(core_ext),
                            tpm_core_head: Some(tpm),
                        }
                    }
                };

                debug!(
                    "block at {:#x}, extension at {:#x}",
                    built.block_va, built.extension_va
                );
                Ok(built)
            }
        }
    };
}

define_build_arch!(
    build_x64,
    Machine::X64,
    block64,
    ext64,
    ListEntry64,
    u64,
    FirmwareInformationWin8x64,
    FirmwareInformationWin81x64
);
define_build_arch!(
    build_x86,
    Machine::X86,
    block32,
    ext32,
    ListEntry32,
    u32,
    FirmwareInformationWin8x32,
    FirmwareInformationWin81x32
);

impl BuiltBlock {
    /// Writes the kernel stack pointer (and stack size on Win8+) into the
    /// block. Called by the hand-off sequencer at step 3.
    pub fn set_kernel_stack<P: PoolAccess>(
        &self,
        heap: &LoaderHeap<'_, P>,
        stack_top_va: u64,
        stack_size: u32,
    ) {
        macro_rules! store {
            ($blocks:ident, $ptr:ty) => {{
                use ntboot_abi::$blocks as blocks;
                match self.descriptor.block {
                    BlockLayout::Ws03 => {
                        heap.at_mut::<blocks::BlockWs03>(self.block_va).kernel_stack =
                            stack_top_va as $ptr;
                    }
                    BlockLayout::Vista => {
                        heap.at_mut::<blocks::BlockVista>(self.block_va).kernel_stack =
                            stack_top_va as $ptr;
                    }
                    BlockLayout::Win7 => {
                        heap.at_mut::<blocks::BlockWin7>(self.block_va).kernel_stack =
                            stack_top_va as $ptr;
                    }
                    BlockLayout::Win8 => {
                        let b = heap.at_mut::<blocks::BlockWin8>(self.block_va);
                        b.kernel_stack = stack_top_va as $ptr;
                        b.kernel_stack_size = stack_size;
                    }
                    BlockLayout::Win81 => {
                        let b = heap.at_mut::<blocks::BlockWin81>(self.block_va);
                        b.kernel_stack = stack_top_va as $ptr;
                        b.kernel_stack_size = stack_size;
                    }
                    BlockLayout::Win10 => {
                        let b = heap.at_mut::<blocks::BlockWin10>(self.block_va);
                        b.kernel_stack = stack_top_va as $ptr;
                        b.kernel_stack_size = stack_size;
                    }
                }
            }};
        }
        match self.arch {
            Machine::X64 => store!(block64, u64),
            Machine::X86 => store!(block32, u32),
        }
    }
}
