//! UEFI memory map ingestion.
//!
//! Converts the descriptor array returned by `ExitBootServices` into the
//! loader's typed inventory. UEFI and NT disagree about what matters: UEFI
//! distinguishes who allocated a region, NT distinguishes what the kernel
//! may do with it. The mapping below follows that need:
//!
//! | UEFI | loader type | rationale |
//! |------|-------------|-----------|
//! | conventional | `Free` | general pool |
//! | loader/boot-services code+data | `FirmwareTemporary` | reclaimable once the kernel owns the machine |
//! | ACPI reclaim | `FirmwareTemporary` | tables are consumed before kernel phase 1 |
//! | runtime-services code+data | `FirmwarePermanent` | mapped for EFI runtime calls forever |
//! | ACPI NVS, MMIO, reserved | `FirmwarePermanent` | never RAM to the kernel |
//! | unusable | `Bad` | flagged into the PFN database |

use crate::map::MemoryRun;
use alloc::vec::Vec;
use log::trace;
use ntboot_abi::memory::MemoryType;
use ntboot_addresses::PAGE_SHIFT;
use uefi::boot::MemoryType as EfiMemoryType;
use uefi::mem::memory_map::MemoryDescriptor;

fn classify(ty: EfiMemoryType) -> Option<MemoryType> {
    match ty {
        EfiMemoryType::CONVENTIONAL => Some(MemoryType::Free),
        EfiMemoryType::LOADER_CODE
        | EfiMemoryType::LOADER_DATA
        | EfiMemoryType::BOOT_SERVICES_CODE
        | EfiMemoryType::BOOT_SERVICES_DATA
        | EfiMemoryType::ACPI_RECLAIM => Some(MemoryType::FirmwareTemporary),
        EfiMemoryType::RUNTIME_SERVICES_CODE
        | EfiMemoryType::RUNTIME_SERVICES_DATA
        | EfiMemoryType::ACPI_NON_VOLATILE
        | EfiMemoryType::MMIO
        | EfiMemoryType::MMIO_PORT_SPACE
        | EfiMemoryType::PAL_CODE
        | EfiMemoryType::RESERVED => Some(MemoryType::FirmwarePermanent),
        EfiMemoryType::UNUSABLE => Some(MemoryType::Bad),
        // Anything vendor-specific stays out of the kernel's view.
        _ => None,
    }
}

/// Translates UEFI memory descriptors into an inventory for
/// [`MemoryMap::new`](crate::MemoryMap::new).
pub fn inventory_from_uefi<'a>(
    descriptors: impl IntoIterator<Item = &'a MemoryDescriptor>,
) -> Vec<MemoryRun> {
    let mut runs = Vec::new();
    for desc in descriptors {
        let Some(memory_type) = classify(desc.ty) else {
            trace!("skipping vendor region {:?} at {:#x}", desc.ty, desc.phys_start);
            continue;
        };
        if desc.page_count == 0 {
            continue;
        }
        runs.push(MemoryRun::new(
            desc.phys_start >> PAGE_SHIFT,
            desc.page_count,
            memory_type,
        ));
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryMap;
    use uefi::mem::memory_map::MemoryAttribute;

    fn desc(ty: EfiMemoryType, phys_start: u64, page_count: u64) -> MemoryDescriptor {
        MemoryDescriptor {
            ty,
            phys_start,
            virt_start: 0,
            page_count,
            att: MemoryAttribute::empty(),
        }
    }

    #[test]
    fn classification_matches_kernel_expectations() {
        let descriptors = [
            desc(EfiMemoryType::CONVENTIONAL, 0x10_0000, 0x400),
            desc(EfiMemoryType::BOOT_SERVICES_DATA, 0x50_0000, 0x10),
            desc(EfiMemoryType::RUNTIME_SERVICES_CODE, 0x60_0000, 0x20),
            desc(EfiMemoryType::UNUSABLE, 0x70_0000, 0x1),
        ];
        let runs = inventory_from_uefi(descriptors.iter());
        assert_eq!(runs.len(), 4);
        assert_eq!(runs[0].memory_type, MemoryType::Free);
        assert_eq!(runs[1].memory_type, MemoryType::FirmwareTemporary);
        assert_eq!(runs[2].memory_type, MemoryType::FirmwarePermanent);
        assert_eq!(runs[3].memory_type, MemoryType::Bad);
        assert_eq!(runs[0].base_page.as_u64(), 0x100);

        // And the result forms a valid map.
        assert!(MemoryMap::new(runs).is_ok());
    }
}
