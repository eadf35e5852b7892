//! End-to-end boots against simulated hardware.
//!
//! Each test drives the whole pipeline - version lookup, block and
//! extension construction, kernel/HAL/driver loading, hand-off
//! preparation - over a simulated physical arena and synthetic PE images,
//! then inspects the results the way the kernel would: by reading raw
//! bytes at documented offsets, not through the Rust structs that wrote
//! them.

use crate::blocks::{BuiltBlock, StructBuilder};
use crate::drivers::{DependencyResolver, DriverOutcome};
use crate::heap::LoaderHeap;
use crate::inputs::{
    BootInputs, DiskSignature, EntropySample, FirmwareInputs, ImageSource, KernelVersion,
    NumaRange, ServiceEntry,
};
use crate::sequence::{self, HandoffConfig};
use crate::space::KernelSpacePlan;
use crate::{LoaderError, PoolAccess};
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::mem::size_of;
use ntboot_abi::shared::{EntropyResultCode, EntropySourceId};
use ntboot_abi::{SERVICE_BOOT_START, SERVICE_KERNEL_DRIVER};
use ntboot_addresses::{PhysicalAddress, VirtualAddress};
use ntboot_mmap::{MemoryMap, MemoryRun, MemoryType};
use ntboot_pe::Machine;
use ntboot_pe::load::testimg::{
    ImageBuilder, ImportSym, export_section, import_section, reloc_section,
};
use ntboot_vmem::sim::SimMemory;
use ntboot_vmem::{AddressSpace64, PhysMapper};
use ntboot_winver::BlockLayout;

struct SimPool<'a>(&'a SimMemory);

impl PoolAccess for SimPool<'_> {
    fn slice_mut(&self, at: PhysicalAddress, len: usize) -> &mut [u8] {
        self.0.bytes_mut(at, len)
    }
}

struct ProbeMapper<'a>(&'a SimMemory);

impl PhysMapper for ProbeMapper<'_> {
    unsafe fn phys_to_mut<T>(&self, at: PhysicalAddress) -> &mut T {
        // SAFETY: delegated bounds check; test-only read paths.
        unsafe { &mut *self.0.bytes_mut(at, size_of::<T>()).as_mut_ptr().cast::<T>() }
    }
}

struct MapSource(BTreeMap<String, Vec<u8>>);

impl ImageSource for MapSource {
    fn read(&mut self, path: &str) -> Option<Vec<u8>> {
        self.0.get(path).cloned()
    }
}

const KERNEL_BASE: u64 = 0x1_4000_0000;
const PLAN_BASE: u64 = 0xffff_f800_0000_0000;

fn kernel_image() -> Vec<u8> {
    let edata = export_section(
        0x3000,
        "ntoskrnl.exe",
        1,
        &[("KeBugCheckEx", 0x1000), ("ExAllocatePoolWithTag", 0x1040)],
    );
    let hal_imports = [ImportSym::Name(String::from("HalInitSystem"))];
    let (idata, _) = import_section(Machine::X64, 0x4000, &[("hal.dll", &hal_imports)]);
    let reloc = reloc_section(&[(0x1000, &[(10, 0x80)])]);
    ImageBuilder::new(Machine::X64, KERNEL_BASE)
        .entry(0x1000)
        .section(".text", &[0xcc; 0x100], 0x1000)
        .exports(&edata, 0x3000)
        .imports(&idata, 0x4000)
        .reloc(&reloc, 0x5000)
        .build()
}

fn hal_image() -> Vec<u8> {
    let edata = export_section(0x3000, "hal.dll", 1, &[("HalInitSystem", 0x1000)]);
    let kernel_imports = [ImportSym::Name(String::from("KeBugCheckEx"))];
    let (idata, _) = import_section(Machine::X64, 0x4000, &[("ntoskrnl.exe", &kernel_imports)]);
    let reloc = reloc_section(&[(0x1000, &[(10, 0x80)])]);
    ImageBuilder::new(Machine::X64, KERNEL_BASE)
        .entry(0x1000)
        .section(".text", &[0xcc; 0x100], 0x1000)
        .exports(&edata, 0x3000)
        .imports(&idata, 0x4000)
        .reloc(&reloc, 0x5000)
        .build()
}

fn driver_image(import: &str) -> Vec<u8> {
    let imports = [ImportSym::Name(String::from(import))];
    let (idata, _) = import_section(Machine::X64, 0x4000, &[("ntoskrnl.exe", &imports)]);
    let reloc = reloc_section(&[(0x1000, &[(10, 0x80)])]);
    ImageBuilder::new(Machine::X64, KERNEL_BASE)
        .entry(0x1000)
        .section(".text", &[0xcc; 0x100], 0x1000)
        .imports(&idata, 0x4000)
        .reloc(&reloc, 0x5000)
        .build()
}

/// Per-test input variations.
#[derive(Default)]
struct BootOptions<'a> {
    disks: &'a [DiskSignature],
    entropy: &'a [EntropySample],
    numa: &'a [NumaRange],
    layout_override: Option<BlockLayout>,
}

/// Everything a test wants to poke at after the boot ran, copied out of
/// the simulation.
struct BootResult {
    arena: Vec<u8>,
    heap_base_va: u64,
    heap_base_phys: u64,
    block_va: u64,
    extension_va: u64,
    built: BuiltBlock,
    outcomes: Vec<DriverOutcome>,
    cr3: u64,
    /// Identity translation of a loader-window address after freeze.
    identity_probe: Option<u64>,
    /// Load-order base names, in list order.
    load_order: Vec<String>,
    /// `(registry_path, status)` per boot-driver list entry.
    boot_driver_entries: Vec<(String, u32)>,
}

impl BootResult {
    fn heap_read(&self, va: u64, len: usize) -> &[u8] {
        let at = usize::try_from(self.heap_base_phys + (va - self.heap_base_va)).unwrap();
        &self.arena[at..at + len]
    }

    fn read_u32(&self, va: u64) -> u32 {
        u32::from_le_bytes(self.heap_read(va, 4).try_into().unwrap())
    }

    fn read_u64(&self, va: u64) -> u64 {
        u64::from_le_bytes(self.heap_read(va, 8).try_into().unwrap())
    }

    fn read_unicode(&self, string_va: u64) -> String {
        let length = u16::from_le_bytes(self.heap_read(string_va, 2).try_into().unwrap());
        let buffer = self.read_u64(string_va + 8);
        let bytes = self.heap_read(buffer, usize::from(length));
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes(pair.try_into().unwrap()))
            .collect();
        String::from_utf16(&units).unwrap()
    }
}

fn boot(
    version: KernelVersion,
    options: &BootOptions<'_>,
    services: &[ServiceEntry],
    extra_files: &[(&str, Vec<u8>)],
    run_handoff: bool,
) -> Result<BootResult, LoaderError> {
    let sim = SimMemory::new(0x200_0000);
    let pool = SimPool(&sim);

    // A 4 GiB inventory; only the low slice is physically simulated, which
    // first-fit-upward allocation guarantees is the only part touched.
    let mut map = MemoryMap::new([
        MemoryRun::new(0, 0x100, MemoryType::FirmwarePermanent),
        MemoryRun::new(0x100, 0x10_0000 - 0x100, MemoryType::Free),
    ])?;
    let mut plan = KernelSpacePlan::new(PLAN_BASE);
    let mut heap = LoaderHeap::new(&mut map, &mut plan, &pool, 0x100)?;
    let heap_base_va = heap.base_va();
    let heap_base_phys = heap.phys_of(heap_base_va).as_u64();

    let mut inputs = BootInputs::minimal(version);
    inputs.firmware = FirmwareInputs {
        firmware_version: 0x0002_0040,
        runtime_services_va: 0xffff_f780_c000_0000,
        efi_memory_map: 0x5000,
        efi_memory_map_size: 0x1800,
        efi_memory_map_descriptor_size: 0x30,
    };
    inputs.disks = options.disks;
    inputs.entropy = options.entropy;
    inputs.numa_ranges = options.numa;
    inputs.layout_override = options.layout_override;

    let built = StructBuilder {
        heap: &mut heap,
        map: &mut map,
        plan: &mut plan,
        pool: &pool,
    }
    .build(Machine::X64, &inputs)?;

    let mut files = BTreeMap::new();
    files.insert(String::from("ntoskrnl.exe"), kernel_image());
    files.insert(String::from("hal.dll"), hal_image());
    for (name, blob) in extra_files {
        files.insert(String::from(*name), blob.clone());
    }
    let mut source = MapSource(files);

    let world = DependencyResolver {
        heap: &mut heap,
        map: &mut map,
        plan: &mut plan,
        pool: &pool,
    }
    .load_world(&built, &mut source, services)?;

    let (cr3, identity_probe) = if run_handoff {
        let prepared = sequence::prepare(
            map,
            plan,
            &mut heap,
            &pool,
            &built,
            &world,
            HandoffConfig::x64_default(),
        )?;
        // Property: the loader's own window still walks to itself after
        // the tables are frozen.
        let mapper = ProbeMapper(&sim);
        let space = AddressSpace64::from_root(&mapper, prepared.cr3);
        let probe = space
            .translate(VirtualAddress::new(0x12_3000))
            .ok()
            .map(|pa| pa.as_u64());
        (prepared.cr3.as_u64(), probe)
    } else {
        (0, None)
    };

    // Snapshot before the simulation drops.
    let arena = sim.bytes(PhysicalAddress::zero(), sim.size()).to_vec();

    let mut result = BootResult {
        arena,
        heap_base_va,
        heap_base_phys,
        block_va: built.block_va,
        extension_va: built.extension_va,
        built,
        outcomes: world.outcomes,
        cr3,
        identity_probe,
        load_order: Vec::new(),
        boot_driver_entries: Vec::new(),
    };

    // Walk the rings the way the kernel does, via raw links.
    let mut cursor = result.read_u64(result.built.load_order_head);
    while cursor != result.built.load_order_head {
        // base_dll_name sits at 0x58 in the 64-bit module entry.
        result.load_order.push(result.read_unicode(cursor + 0x58));
        cursor = result.read_u64(cursor);
    }
    let mut cursor = result.read_u64(result.built.boot_driver_head);
    while cursor != result.built.boot_driver_head {
        // registry_path at 0x20, status at 0x38.
        let path = result.read_unicode(cursor + 0x20);
        let status = result.read_u32(cursor + 0x38);
        result.boot_driver_entries.push((path, status));
        cursor = result.read_u64(cursor);
    }

    Ok(result)
}

fn version(build: u32) -> KernelVersion {
    KernelVersion {
        major: 10,
        minor: 0,
        build,
    }
}

/// Build 10586 (1511): WIN10 block and extension shapes, one MBR disk.
#[test]
fn boots_build_10586_with_mbr_disk() {
    let disks = [DiskSignature {
        arc_name: String::from("multi(0)disk(0)rdisk(0)"),
        mbr_signature: 0xdead_beef,
        check_sum: 0x2152_4111,
        valid_partition_table: true,
        x_int13: true,
        is_gpt: false,
        gpt_signature: [0; 16],
    }];
    let options = BootOptions {
        disks: &disks,
        ..BootOptions::default()
    };
    let result = boot(version(10586), &options, &[], &[], true).unwrap();

    use ntboot_winver::ExtensionLayout;
    assert_eq!(result.built.descriptor.block, BlockLayout::Win10);
    assert_eq!(result.built.descriptor.extension, ExtensionLayout::Win10);

    // Extension size field, read back over the wire. The authoritative
    // sizes are 0x9f0 on x86-64 and 0x930 on x86.
    assert_eq!(result.read_u32(result.extension_va), 0x9f0);
    assert_eq!(
        size_of::<ntboot_abi::ext32::ExtensionWin10>(),
        0x930,
        "x86 layout keeps its documented size"
    );

    // Block header: 10.0 and the WIN10 block size.
    assert_eq!(result.read_u32(result.block_va), 10);
    assert_eq!(result.read_u32(result.block_va + 8), 0x160);

    // The disk record hangs off ArcDiskInformation (offset 0xe8 in the
    // WIN10 block), in the Win7 record shape.
    let disk_info = result.read_u64(result.block_va + 0xe8);
    let first = result.read_u64(disk_info);
    assert_eq!(result.read_u32(first + 0x10), 0xdead_beef);

    // Hand-off happened and the identity window survived the freeze.
    assert_ne!(result.cr3, 0);
    assert_eq!(result.identity_probe, Some(0x12_3000));
}

/// Build 17763 (1809): 0xd60 extension, null leap seconds, ten entropy
/// slots.
#[test]
fn boots_build_17763_with_gpt_disk_and_entropy() {
    let disks = [DiskSignature {
        arc_name: String::from("multi(0)disk(0)rdisk(0)"),
        mbr_signature: 0,
        check_sum: 0,
        valid_partition_table: false,
        x_int13: false,
        is_gpt: true,
        gpt_signature: [0xaa; 16],
    }];
    let entropy = [EntropySample {
        source: EntropySourceId::Rdrand,
        result: EntropyResultCode::Success,
        status: 0,
        time: 42,
        data: vec![0x5a; 64],
    }];
    let options = BootOptions {
        disks: &disks,
        entropy: &entropy,
        ..BootOptions::default()
    };
    let result = boot(version(17763), &options, &[], &[], false).unwrap();

    // Size field and struct agree on 0xd60.
    assert_eq!(result.read_u32(result.extension_va), 0xd60);
    assert_eq!(size_of::<ntboot_abi::ext64::ExtensionWin10Rs5>(), 0xd60);

    // LeapSecondData is present at its 1809 offset and null.
    assert_eq!(result.read_u64(result.extension_va + 0xb58), 0);

    // Entropy: ten slots declared at the head of the result block
    // (offset 0x130), first slot carries the RDRAND sample.
    assert_eq!(result.read_u32(result.extension_va + 0x130), 10);
    let first_slot = result.extension_va + 0x130 + 8;
    assert_eq!(result.read_u32(first_slot), EntropySourceId::Rdrand as u32);

    // The GPT signature bytes travel verbatim (record offset 0x28).
    let disk_info = result.read_u64(result.block_va + 0xe8);
    let first = result.read_u64(disk_info);
    assert_eq!(result.heap_read(first + 0x28, 16), &[0xaa; 16][..]);
}

/// Build 14393 (1607): a boot driver with an unresolvable import is
/// skipped with a status the kernel can read, and the boot proceeds.
#[test]
fn boots_build_14393_skipping_broken_driver() {
    let services = [
        ServiceEntry {
            name: String::from("disk"),
            image_path: String::from("system32\\drivers\\disk.sys"),
            group: String::from("SCSI Class"),
            start: SERVICE_BOOT_START,
            service_type: SERVICE_KERNEL_DRIVER,
        },
        ServiceEntry {
            name: String::from("crashdmp"),
            image_path: String::from("system32\\drivers\\crashdmp.sys"),
            group: String::from("Base"),
            start: SERVICE_BOOT_START,
            service_type: SERVICE_KERNEL_DRIVER,
        },
    ];
    let files = [
        ("system32\\drivers\\disk.sys", driver_image("KeBugCheckEx")),
        (
            "system32\\drivers\\crashdmp.sys",
            driver_image("NtUnknownExport"),
        ),
    ];
    let options = BootOptions::default();
    let result = boot(version(14393), &options, &services, &files, true).unwrap();

    assert_eq!(result.read_u32(result.extension_va), 0xa28);

    // Kernel and HAL loaded, HAL first, kernel second; the healthy driver
    // follows.
    assert_eq!(
        result.load_order,
        vec![
            String::from("hal.dll"),
            String::from("ntoskrnl.exe"),
            String::from("disk.sys"),
        ]
    );

    // The broken driver kept its list entry, with a nonzero status.
    assert_eq!(
        result.outcomes,
        vec![
            DriverOutcome {
                name: String::from("disk"),
                status: 0,
            },
            DriverOutcome {
                name: String::from("crashdmp"),
                status: ntboot_abi::STATUS_PROCEDURE_NOT_FOUND,
            },
        ]
    );
    let crashdmp = result
        .boot_driver_entries
        .iter()
        .find(|(path, _)| path.ends_with("crashdmp"))
        .unwrap();
    assert_ne!(crashdmp.1, 0);

    // And the hand-off still prepared.
    assert_ne!(result.cr3, 0);
}

/// A configuration demanding a WS03-era block for a Win7 kernel fails
/// closed before anything is allocated.
#[test]
fn rejects_mismatched_layout_override() {
    let options = BootOptions {
        layout_override: Some(BlockLayout::Ws03),
        ..BootOptions::default()
    };
    let result = boot(
        KernelVersion {
            major: 6,
            minor: 1,
            build: 7601,
        },
        &options,
        &[],
        &[],
        false,
    );
    assert!(matches!(result, Err(LoaderError::UnsupportedVersion(_))));
}

/// Build 19041 (2004): NUMA ranges appear at 0xde0/0xde8 in the extension.
#[test]
fn boots_build_19041_with_numa_ranges() {
    let ranges = [
        NumaRange {
            proximity_id: 0,
            base_page: 0,
            end_page: 0x10_0000,
        },
        NumaRange {
            proximity_id: 1,
            base_page: 0x10_0000,
            end_page: 0x20_0000,
        },
    ];
    let options = BootOptions {
        numa: &ranges,
        ..BootOptions::default()
    };
    let result = boot(version(19041), &options, &[], &[], false).unwrap();

    assert_eq!(result.read_u32(result.extension_va), 0xdf0);

    let ranges_va = result.read_u64(result.extension_va + 0xde0);
    assert_ne!(ranges_va, 0);
    assert_eq!(result.read_u32(result.extension_va + 0xde8), 2);

    // The second range record: proximity 1, pages 0x100000..0x200000.
    assert_eq!(result.read_u32(ranges_va + 0x18), 1);
    assert_eq!(result.read_u64(ranges_va + 0x18 + 8), 0x10_0000);
    assert_eq!(result.read_u64(ranges_va + 0x18 + 16), 0x20_0000);
}

/// The 32-bit path produces a Win7 SP1 block with the x86 shapes: 0x88
/// block, 0xe8 extension, 32-bit self-referential list heads.
#[test]
fn builds_an_x86_win7_block() {
    let sim = SimMemory::new(0x100_0000);
    let pool = SimPool(&sim);
    let mut map = MemoryMap::new([MemoryRun::new(0x100, 0x8000, MemoryType::Free)]).unwrap();
    // x86 kernel VAs must fit 32 bits.
    let mut plan = KernelSpacePlan::new(0x8020_0000);
    let mut heap = LoaderHeap::new(&mut map, &mut plan, &pool, 0x40).unwrap();

    let mut inputs = BootInputs::minimal(KernelVersion {
        major: 6,
        minor: 1,
        build: 7601,
    });
    inputs.firmware.runtime_services_va = 0xffd0_0000;

    let built = StructBuilder {
        heap: &mut heap,
        map: &mut map,
        plan: &mut plan,
        pool: &pool,
    }
    .build(Machine::X86, &inputs)
    .unwrap();

    let read_u32 = |va: u64| {
        u32::from_le_bytes(heap.bytes_mut(va, 4).try_into().unwrap())
    };
    // Block header: 6.1, WIN7 x86 block size.
    assert_eq!(read_u32(built.block_va), 6);
    assert_eq!(read_u32(built.block_va + 4), 1);
    assert_eq!(read_u32(built.block_va + 8), 0x88);
    // Extension size field carries the x86 Win7 size.
    assert_eq!(read_u32(built.extension_va), 0xe8);
    // 32-bit list heads are self-referential.
    assert_eq!(u64::from(read_u32(built.load_order_head)), built.load_order_head);
    assert_eq!(
        u64::from(read_u32(built.load_order_head + 4)),
        built.load_order_head
    );
    // No Win8-era lists on this generation.
    assert!(built.core_driver_head.is_none());
    assert!(built.tpm_core_head.is_none());
}

/// The same boot twice produces byte-identical kernel-visible state:
/// allocation and list order are fully deterministic.
#[test]
fn boots_are_deterministic() {
    let run = || {
        let options = BootOptions::default();
        let result = boot(version(17763), &options, &[], &[], false).unwrap();
        (result.block_va, result.extension_va, result.arena)
    };
    let first = run();
    let second = run();
    assert_eq!(first.0, second.0);
    assert_eq!(first.1, second.1);
    assert_eq!(first.2, second.2);
}
