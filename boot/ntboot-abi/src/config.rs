//! ARC configuration component tree.
//!
//! NT inherited its hardware description from the ARC firmware world: a tree
//! of `{class, type}` nodes hanging off a `SystemClass/ArcSystem` root. On
//! PC firmware the loader synthesizes the tree itself; the kernel walks it
//! through the `parent`/`child`/`sibling` raw pointers, so those are kernel
//! VAs like everything else in the block.

use core::mem::{offset_of, size_of};

/// `CONFIGURATION_CLASS`.
#[repr(u32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConfigurationClass {
    SystemClass = 0,
    ProcessorClass = 1,
    CacheClass = 2,
    AdapterClass = 3,
    ControllerClass = 4,
    PeripheralClass = 5,
    MemoryClass = 6,
}

/// `CONFIGURATION_TYPE` (the subset the loader emits).
#[repr(u32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConfigurationType {
    ArcSystem = 0,
    CentralProcessor = 1,
    MultiFunctionAdapter = 12,
    DiskController = 13,
    DiskPeripheral = 24,
    SystemMemory = 36,
}

/// `IDENTIFIER_FLAG` bits.
pub const IDENTIFIER_FLAG_FAILED: u32 = 0x01;
pub const IDENTIFIER_FLAG_READ_ONLY: u32 = 0x02;
pub const IDENTIFIER_FLAG_REMOVABLE: u32 = 0x04;

/// `CONFIGURATION_COMPONENT` for 32-bit targets.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct ConfigurationComponent32 {
    pub class: u32,
    pub r#type: u32,
    pub flags: u32,
    pub version: u16,
    pub revision: u16,
    pub key: u32,
    pub affinity_mask: u32,
    pub configuration_data_length: u32,
    pub identifier_length: u32,
    pub identifier: u32,
}

/// `CONFIGURATION_COMPONENT` for 64-bit targets.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct ConfigurationComponent64 {
    pub class: u32,
    pub r#type: u32,
    pub flags: u32,
    pub version: u16,
    pub revision: u16,
    pub key: u32,
    pub affinity_mask: u32,
    pub configuration_data_length: u32,
    pub identifier_length: u32,
    pub identifier: u64,
}

/// `CONFIGURATION_COMPONENT_DATA` for 32-bit targets.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct ConfigurationComponentData32 {
    pub parent: u32,
    pub child: u32,
    pub sibling: u32,
    pub component_entry: ConfigurationComponent32,
    pub configuration_data: u32,
}

/// `CONFIGURATION_COMPONENT_DATA` for 64-bit targets.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct ConfigurationComponentData64 {
    pub parent: u64,
    pub child: u64,
    pub sibling: u64,
    pub component_entry: ConfigurationComponent64,
    pub configuration_data: u64,
}

/// `PCI_REGISTRY_INFO`, the configuration data of the synthesized PCI bus
/// node.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct PciRegistryInfo {
    pub major_revision: u8,
    pub minor_revision: u8,
    pub no_buses: u8,
    pub hardware_mechanism: u8,
}

/// `CmResourceTypeDeviceSpecific`.
pub const CM_RESOURCE_TYPE_DEVICE_SPECIFIC: u8 = 5;

/// `CM_PARTIAL_RESOURCE_LIST` header; `count` descriptors follow inline.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct CmPartialResourceListHeader {
    pub version: u16,
    pub revision: u16,
    pub count: u32,
}

/// `CM_PARTIAL_RESOURCE_DESCRIPTOR` for 32-bit targets (the union is kept
/// as raw bytes; for device-specific data the first word is `DataSize`).
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct CmPartialResourceDescriptor32 {
    pub r#type: u8,
    pub share_disposition: u8,
    pub flags: u16,
    pub data: [u8; 12],
}

/// `CM_PARTIAL_RESOURCE_DESCRIPTOR` for 64-bit targets.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct CmPartialResourceDescriptor64 {
    pub r#type: u8,
    pub share_disposition: u8,
    pub flags: u16,
    pub data: [u8; 16],
}

const _: () = {
    assert!(size_of::<ConfigurationComponent32>() == 0x24);
    assert!(size_of::<ConfigurationComponent64>() == 0x28);
    assert!(offset_of!(ConfigurationComponent64, identifier) == 0x20);

    assert!(size_of::<ConfigurationComponentData32>() == 0x34);
    assert!(offset_of!(ConfigurationComponentData32, component_entry) == 0xc);
    assert!(offset_of!(ConfigurationComponentData32, configuration_data) == 0x30);

    assert!(size_of::<ConfigurationComponentData64>() == 0x48);
    assert!(offset_of!(ConfigurationComponentData64, component_entry) == 0x18);
    assert!(offset_of!(ConfigurationComponentData64, configuration_data) == 0x40);

    assert!(size_of::<PciRegistryInfo>() == 4);
    assert!(size_of::<CmPartialResourceListHeader>() == 8);
    assert!(size_of::<CmPartialResourceDescriptor32>() == 16);
    assert!(size_of::<CmPartialResourceDescriptor64>() == 20);
};
