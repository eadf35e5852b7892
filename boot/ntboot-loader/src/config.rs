//! ARC configuration component tree.
//!
//! On UEFI PCs nothing enumerates the legacy way, so the loader fabricates
//! the minimal tree the kernel insists on: a `SystemClass/ArcSystem` root
//! whose first child is an `AdapterClass/MultiFunctionAdapter` node named
//! "PCI" carrying `PCI_REGISTRY_INFO`. The kernel's bus drivers take it
//! from there. Built once, referenced from the block, never touched again.

use crate::heap::LoaderHeap;
use crate::PoolAccess;
use core::mem::size_of;
use ntboot_abi::config::{
    CM_RESOURCE_TYPE_DEVICE_SPECIFIC, CmPartialResourceDescriptor32,
    CmPartialResourceDescriptor64, CmPartialResourceListHeader, ConfigurationClass,
    ConfigurationComponentData32, ConfigurationComponentData64, ConfigurationType,
    PciRegistryInfo,
};
use ntboot_mmap::NoMemory;

/// Identifier string of the root node on PC-compatible hardware.
const ROOT_IDENTIFIER: &str = "AT/AT COMPATIBLE";
/// Identifier string of the synthesized bus node.
const PCI_IDENTIFIER: &str = "PCI";

fn pci_registry_info(max_bus: u8) -> PciRegistryInfo {
    PciRegistryInfo {
        major_revision: 2,
        minor_revision: 1,
        no_buses: max_bus.saturating_add(1),
        hardware_mechanism: 1,
    }
}

macro_rules! build_tree {
    ($fn_name:ident, $node:ty, $descriptor:ty, $ptr:ty) => {
        /// Builds the configuration tree in the loader heap; returns the
        /// root node's kernel VA.
        ///
        /// # Errors
        /// [`NoMemory`] when the heap is exhausted.
        pub fn $fn_name<P: PoolAccess>(
            heap: &mut LoaderHeap<'_, P>,
            max_pci_bus: u8,
        ) -> Result<u64, NoMemory> {
            let root_va = heap.place::<$node>()?;
            let pci_va = heap.place::<$node>()?;

            // Device-specific resource list: header + one descriptor +
            // PCI_REGISTRY_INFO payload.
            let info = pci_registry_info(max_pci_bus);
            let list_len = size_of::<CmPartialResourceListHeader>()
                + size_of::<$descriptor>()
                + size_of::<PciRegistryInfo>();
            let list_va = heap.alloc(list_len, 4)?;
            {
                let header = heap.at_mut::<CmPartialResourceListHeader>(list_va);
                header.count = 1;
            }
            {
                let desc = heap.at_mut::<$descriptor>(
                    list_va + size_of::<CmPartialResourceListHeader>() as u64,
                );
                desc.r#type = CM_RESOURCE_TYPE_DEVICE_SPECIFIC;
                // DeviceSpecificData.DataSize is the first union word.
                desc.data[..4]
                    .copy_from_slice(&(size_of::<PciRegistryInfo>() as u32).to_le_bytes());
            }
            {
                let payload_va = list_va
                    + (size_of::<CmPartialResourceListHeader>() + size_of::<$descriptor>()) as u64;
                *heap.at_mut::<PciRegistryInfo>(payload_va) = info;
            }

            let root_id = heap.ansi_str(ROOT_IDENTIFIER)?;
            let pci_id = heap.ansi_str(PCI_IDENTIFIER)?;

            {
                let root = heap.at_mut::<$node>(root_va);
                root.child = pci_va as $ptr;
                root.component_entry.class = ConfigurationClass::SystemClass as u32;
                root.component_entry.r#type = ConfigurationType::ArcSystem as u32;
                root.component_entry.version = 1;
                root.component_entry.revision = 1;
                root.component_entry.affinity_mask = 0xffff_ffff;
                root.component_entry.identifier_length = ROOT_IDENTIFIER.len() as u32 + 1;
                root.component_entry.identifier = root_id as $ptr;
            }
            {
                let pci = heap.at_mut::<$node>(pci_va);
                pci.parent = root_va as $ptr;
                pci.component_entry.class = ConfigurationClass::AdapterClass as u32;
                pci.component_entry.r#type = ConfigurationType::MultiFunctionAdapter as u32;
                pci.component_entry.version = 1;
                pci.component_entry.revision = 1;
                pci.component_entry.affinity_mask = 0xffff_ffff;
                pci.component_entry.identifier_length = PCI_IDENTIFIER.len() as u32 + 1;
                pci.component_entry.identifier = pci_id as $ptr;
                pci.component_entry.configuration_data_length = list_len as u32;
                pci.configuration_data = list_va as $ptr;
            }

            Ok(root_va)
        }
    };
}

build_tree!(build_tree_x64, ConfigurationComponentData64, CmPartialResourceDescriptor64, u64);
build_tree!(build_tree_x86, ConfigurationComponentData32, CmPartialResourceDescriptor32, u32);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::KernelSpacePlan;
    use ntboot_mmap::{MemoryMap, MemoryRun, MemoryType};
    use ntboot_vmem::sim::SimMemory;

    struct SimPool<'a>(&'a SimMemory);

    impl PoolAccess for SimPool<'_> {
        fn slice_mut(&self, at: ntboot_addresses::PhysicalAddress, len: usize) -> &mut [u8] {
            self.0.bytes_mut(at, len)
        }
    }

    #[test]
    fn tree_has_a_pci_child_with_registry_info() {
        let sim = SimMemory::new(0x100_000);
        let pool = SimPool(&sim);
        let mut map = MemoryMap::new([MemoryRun::new(0, 0x100, MemoryType::Free)]).unwrap();
        let mut plan = KernelSpacePlan::new(0xffff_f800_2000_0000);
        let mut heap = LoaderHeap::new(&mut map, &mut plan, &pool, 0x10).unwrap();

        let root_va = build_tree_x64(&mut heap, 0).unwrap();
        let root = heap.at_mut::<ConfigurationComponentData64>(root_va);
        assert_eq!(root.component_entry.class, ConfigurationClass::SystemClass as u32);
        assert_eq!(root.parent, 0);
        let pci_va = root.child;
        assert_ne!(pci_va, 0);

        let pci = heap.at_mut::<ConfigurationComponentData64>(pci_va);
        assert_eq!(pci.parent, root_va);
        assert_eq!(pci.sibling, 0);
        assert_eq!(
            pci.component_entry.r#type,
            ConfigurationType::MultiFunctionAdapter as u32
        );
        // The payload sits behind the list header and one descriptor.
        let payload_va = pci.configuration_data + 8 + 20;
        let info = heap.at_mut::<PciRegistryInfo>(payload_va);
        assert_eq!(info.no_buses, 1);
        assert_eq!(info.hardware_mechanism, 1);

        // The identifier is the NUL-terminated "PCI".
        let id = heap.bytes_mut(pci.component_entry.identifier, 4);
        assert_eq!(id, b"PCI\0");
    }
}
