//! Kernel, HAL and boot-driver loading.
//!
//! Builds the module world the kernel wakes up in. The load order the
//! kernel observes is deterministic: HAL first, kernel second, then boot
//! drivers in configuration order. The kernel and HAL import each other;
//! the cycle is broken by placing both images before binding either, then
//! patching the two import tables in a second phase - never by a general
//! cycle solver.
//!
//! Boot-driver failure is not boot failure: a driver whose file is missing,
//! whose image is malformed or whose imports cannot be bound keeps its
//! `BOOT_DRIVER_LIST_ENTRY`, with a status code the kernel inspects, and
//! the boot continues without it.

use crate::blocks::{BuiltBlock, list_append};
use crate::heap::LoaderHeap;
use crate::inputs::{ImageSource, ServiceEntry};
use crate::space::KernelSpacePlan;
use crate::{LoaderError, PoolAccess};
use alloc::string::String;
use alloc::vec::Vec;
use log::{info, warn};
use ntboot_abi::list::{ListEntry32, ListEntry64};
use ntboot_abi::module::LDRP_ENTRY_PROCESSED;
use ntboot_abi::{
    SERVICE_BOOT_START, SERVICE_FILE_SYSTEM_DRIVER, SERVICE_KERNEL_DRIVER,
    SERVICE_RECOGNIZER_DRIVER, STATUS_INVALID_IMAGE_FORMAT, STATUS_NO_SUCH_FILE,
    STATUS_PROCEDURE_NOT_FOUND,
};
use ntboot_addresses::PhysicalAddress;
use ntboot_mmap::{MemoryMap, MemoryType};
use ntboot_pe::{ExportTable, ImportRef, Machine, PeError, PeHeaders};
use ntboot_vmem::MapAttributes;

/// Alternate export names the kernel image answers to in import tables.
const KERNEL_ALIASES: &[&str] = &["ntoskrnl.exe", "ntkrnlmp.exe", "ntkrnlpa.exe", "ntkrpamp.exe"];
/// Alternate export names for the HAL.
const HAL_ALIASES: &[&str] = &["hal.dll", "halacpi.dll", "halmacpi.dll", "halaacpi.dll"];

/// One placed image.
pub struct LoadedImage {
    pub name: String,
    /// Kernel-visible canonical path (`\SystemRoot\...`).
    pub full_path: String,
    pub phys: PhysicalAddress,
    pub base_va: u64,
    pub entry_va: u64,
    pub size_of_image: u32,
    pub check_sum: u32,
    pub headers: PeHeaders,
}

/// Outcome of one boot-driver service entry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DriverOutcome {
    pub name: String,
    /// NTSTATUS recorded on the list entry; zero means loaded.
    pub status: u32,
}

/// The loaded module world.
pub struct ModuleWorld {
    pub hal: LoadedImage,
    pub kernel: LoadedImage,
    pub drivers: Vec<LoadedImage>,
    pub outcomes: Vec<DriverOutcome>,
}

/// Loads and links every image of the boot.
pub struct DependencyResolver<'a, 'p, P: PoolAccess> {
    pub heap: &'a mut LoaderHeap<'p, P>,
    pub map: &'a mut MemoryMap,
    pub plan: &'a mut KernelSpacePlan,
    pub pool: &'p P,
}

impl<P: PoolAccess> DependencyResolver<'_, '_, P> {
    /// Loads `ntoskrnl.exe` + `hal.dll`, binds their mutual imports, then
    /// loads every boot-start service, linking all module structures into
    /// `built`'s lists.
    ///
    /// # Errors
    /// [`LoaderError`] for kernel or HAL failures; driver failures are
    /// recorded per entry instead.
    pub fn load_world(
        &mut self,
        built: &BuiltBlock,
        source: &mut dyn ImageSource,
        services: &[ServiceEntry],
    ) -> Result<ModuleWorld, LoaderError> {
        let arch = built.arch;

        // Phase one: place both roots without binding anything.
        let kernel_blob = source
            .read("ntoskrnl.exe")
            .ok_or_else(|| LoaderError::UnreadableFile(String::from("ntoskrnl.exe")))?;
        let hal_blob = source
            .read("hal.dll")
            .ok_or_else(|| LoaderError::UnreadableFile(String::from("hal.dll")))?;

        let kernel = self.place(
            arch,
            "ntoskrnl.exe",
            "\\SystemRoot\\system32\\ntoskrnl.exe",
            &kernel_blob,
            MemoryType::SystemCode,
        )?;
        let hal = self.place(
            arch,
            "hal.dll",
            "\\SystemRoot\\system32\\hal.dll",
            &hal_blob,
            MemoryType::HalCode,
        )?;

        // Phase two: patch the back edges now both bases are known.
        self.bind(&hal, &[&kernel, &hal])?;
        self.bind(&kernel, &[&kernel, &hal])?;
        info!(
            "kernel at {:#x}, HAL at {:#x}",
            kernel.base_va, hal.base_va
        );

        // HAL first, kernel second: the order the kernel walks.
        self.link_module(built, &hal)?;
        self.link_module(built, &kernel)?;

        // Boot drivers, in configuration order.
        let mut drivers: Vec<LoadedImage> = Vec::new();
        let mut outcomes = Vec::new();
        for service in services {
            if service.start != SERVICE_BOOT_START
                || !matches!(
                    service.service_type,
                    SERVICE_KERNEL_DRIVER | SERVICE_FILE_SYSTEM_DRIVER | SERVICE_RECOGNIZER_DRIVER
                )
            {
                continue;
            }

            let status = match self.load_driver(built, source, service, &kernel, &hal, &drivers) {
                Ok(image) => {
                    drivers.push(image);
                    0
                }
                Err(status) => {
                    warn!("skipping boot driver {}: {status:#x}", service.name);
                    status
                }
            };
            self.link_boot_driver(built, service, status, drivers.last().filter(|_| status == 0))?;
            outcomes.push(DriverOutcome {
                name: service.name.clone(),
                status,
            });
        }

        Ok(ModuleWorld {
            hal,
            kernel,
            drivers,
            outcomes,
        })
    }

    /// Allocates pages, places the image and returns its description.
    fn place(
        &mut self,
        arch: Machine,
        name: &str,
        full_path: &str,
        blob: &[u8],
        memory_type: MemoryType,
    ) -> Result<LoadedImage, LoaderError> {
        let headers = ntboot_pe::parse_headers(blob, arch)?;
        let pages = headers.image_pages();
        let base = self.map.allocate(pages, memory_type, 1)?;
        let phys = base.base();
        let base_va = self
            .plan
            .reserve_mapped(phys, pages, MapAttributes::kernel_image());

        let dest = self
            .pool
            .slice_mut(phys, headers.size_of_image as usize);
        ntboot_pe::load(blob, &headers, dest, base_va)?;

        Ok(LoadedImage {
            name: String::from(name),
            full_path: String::from(full_path),
            phys,
            base_va,
            entry_va: base_va + u64::from(headers.entry_point_rva),
            size_of_image: headers.size_of_image,
            check_sum: headers.check_sum,
            headers,
        })
    }

    /// Binds `image`'s import tables against `exporters`.
    fn bind(&mut self, image: &LoadedImage, exporters: &[&LoadedImage]) -> Result<(), PeError> {
        let bytes = self
            .pool
            .slice_mut(image.phys, image.size_of_image as usize);
        ntboot_pe::resolve_imports(bytes, &image.headers, |dll, reference| {
            self.lookup_export(exporters, dll, reference)
        })
        .map(|_| ())
    }

    /// Resolves one `dll!symbol` against the export tables of `exporters`.
    fn lookup_export(
        &self,
        exporters: &[&LoadedImage],
        dll: &str,
        reference: ImportRef<'_>,
    ) -> Option<u64> {
        let exporter = exporters.iter().find(|module| {
            module.name.eq_ignore_ascii_case(dll)
                || (KERNEL_ALIASES
                    .iter()
                    .any(|alias| alias.eq_ignore_ascii_case(dll))
                    && KERNEL_ALIASES[0].eq_ignore_ascii_case(&module.name))
                || (HAL_ALIASES
                    .iter()
                    .any(|alias| alias.eq_ignore_ascii_case(dll))
                    && HAL_ALIASES[0].eq_ignore_ascii_case(&module.name))
        })?;
        let bytes = self
            .pool
            .slice_mut(exporter.phys, exporter.size_of_image as usize);
        let table = ExportTable::parse(bytes, &exporter.headers).ok()?;
        let rva = match reference {
            ImportRef::Name(name) => table.by_name(name).ok()?,
            ImportRef::Ordinal(ordinal) => table.by_ordinal(ordinal).ok()?,
        }?;
        Some(exporter.base_va + u64::from(rva))
    }

    /// Loads one boot driver; returns the image or the status to record.
    fn load_driver(
        &mut self,
        built: &BuiltBlock,
        source: &mut dyn ImageSource,
        service: &ServiceEntry,
        kernel: &LoadedImage,
        hal: &LoadedImage,
        drivers: &[LoadedImage],
    ) -> Result<LoadedImage, u32> {
        let Some(blob) = source.read(&service.image_path) else {
            return Err(STATUS_NO_SUCH_FILE);
        };
        let name = service
            .image_path
            .rsplit('\\')
            .next()
            .unwrap_or(&service.image_path);
        let full_path = alloc::format!("\\SystemRoot\\{}", service.image_path);
        let image = self
            .place(built.arch, name, &full_path, &blob, MemoryType::BootDriver)
            .map_err(|_| STATUS_INVALID_IMAGE_FORMAT)?;

        let mut exporters: Vec<&LoadedImage> = Vec::with_capacity(drivers.len() + 2);
        exporters.push(kernel);
        exporters.push(hal);
        exporters.extend(drivers.iter());

        match self.bind(&image, &exporters) {
            Ok(()) => Ok(image),
            Err(PeError::MissingExport { dll, symbol }) => {
                warn!("{name}: unresolved import {dll}!{symbol}");
                Err(STATUS_PROCEDURE_NOT_FOUND)
            }
            Err(_) => Err(STATUS_INVALID_IMAGE_FORMAT),
        }
    }

    /// Emits a `KLDR_DATA_TABLE_ENTRY` for `image` and appends it to the
    /// load-order list. Returns the entry VA.
    fn link_module(&mut self, built: &BuiltBlock, image: &LoadedImage) -> Result<u64, LoaderError> {
        macro_rules! emit {
            ($entry:ty, $ustr:ty, $list:ty, $ptr:ty) => {{
                let (full_va, full_len) = self.heap.utf16_str(&image.full_path)?;
                let (base_va, base_len) = self.heap.utf16_str(&image.name)?;
                let entry_va = self.heap.place::<$entry>()?;
                let entry = self.heap.at_mut::<$entry>(entry_va);
                entry.dll_base = image.base_va as $ptr;
                entry.entry_point = image.entry_va as $ptr;
                entry.size_of_image = image.size_of_image;
                entry.check_sum = image.check_sum;
                entry.flags = LDRP_ENTRY_PROCESSED;
                entry.load_count = 1;
                entry.full_dll_name = <$ustr>::default();
                entry.full_dll_name.length = full_len;
                entry.full_dll_name.maximum_length = full_len + 2;
                entry.full_dll_name.buffer = full_va as $ptr;
                entry.base_dll_name.length = base_len;
                entry.base_dll_name.maximum_length = base_len + 2;
                entry.base_dll_name.buffer = base_va as $ptr;
                list_append::<$list, P>(self.heap, built.load_order_head, entry_va);
                entry_va
            }};
        }
        let entry_va = match built.arch {
            Machine::X64 => {
                use ntboot_abi::list::UnicodeString64;
                use ntboot_abi::module::KldrDataTableEntry64;
                emit!(KldrDataTableEntry64, UnicodeString64, ListEntry64, u64)
            }
            Machine::X86 => {
                use ntboot_abi::list::UnicodeString32;
                use ntboot_abi::module::KldrDataTableEntry32;
                emit!(KldrDataTableEntry32, UnicodeString32, ListEntry32, u32)
            }
        };
        Ok(entry_va)
    }

    /// Emits a `BOOT_DRIVER_LIST_ENTRY` and links it onto the list its
    /// registry group selects.
    fn link_boot_driver(
        &mut self,
        built: &BuiltBlock,
        service: &ServiceEntry,
        status: u32,
        image: Option<&LoadedImage>,
    ) -> Result<(), LoaderError> {
        let ldr_entry_va = match image {
            Some(image) => self.link_module(built, image)?,
            None => 0,
        };

        // Core-class groups get their own lists on versions that have
        // them; everything else stays on the plain boot-driver list.
        let head = match service.group.as_str() {
            "Core" => built.core_driver_head,
            "Core Platform Extensions" => built.core_extensions_head,
            "TPM Core" => built.tpm_core_head,
            "Early-Launch" => built.early_launch_head,
            _ => None,
        }
        .unwrap_or(built.boot_driver_head);

        macro_rules! emit {
            ($entry:ty, $list:ty, $ptr:ty) => {{
                let (file_va, file_len) = self.heap.utf16_str(&service.image_path)?;
                let registry_path =
                    alloc::format!("System\\CurrentControlSet\\Services\\{}", service.name);
                let (reg_va, reg_len) = self.heap.utf16_str(&registry_path)?;
                let entry_va = self.heap.place::<$entry>()?;
                let entry = self.heap.at_mut::<$entry>(entry_va);
                entry.file_path.length = file_len;
                entry.file_path.maximum_length = file_len + 2;
                entry.file_path.buffer = file_va as $ptr;
                entry.registry_path.length = reg_len;
                entry.registry_path.maximum_length = reg_len + 2;
                entry.registry_path.buffer = reg_va as $ptr;
                entry.ldr_entry = ldr_entry_va as $ptr;
                entry.status = status;
                list_append::<$list, P>(self.heap, head, entry_va);
            }};
        }
        match built.arch {
            Machine::X64 => {
                use ntboot_abi::module::BootDriverListEntry64;
                emit!(BootDriverListEntry64, ListEntry64, u64);
            }
            Machine::X86 => {
                use ntboot_abi::module::BootDriverListEntry32;
                emit!(BootDriverListEntry32, ListEntry32, u32);
            }
        }
        Ok(())
    }
}
