//! Memory classification and allocation descriptors.
//!
//! Each physical page the kernel inherits is described by exactly one
//! `MEMORY_ALLOCATION_DESCRIPTOR` on the block's memory descriptor list.
//! The discriminants are ABI: the kernel switches on the raw `u32` when it
//! builds the PFN database, decides what to reclaim, and what to leave
//! alone.

use crate::list::{ListEntry32, ListEntry64};
use core::mem::{offset_of, size_of};

/// `TYPE_OF_MEMORY`. Discriminants must stay in declaration order; they are
/// the wire values.
#[repr(u32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum MemoryType {
    ExceptionBlock = 0,
    SystemBlock = 1,
    Free = 2,
    Bad = 3,
    LoadedProgram = 4,
    FirmwareTemporary = 5,
    FirmwarePermanent = 6,
    OsloaderHeap = 7,
    OsloaderStack = 8,
    SystemCode = 9,
    HalCode = 10,
    BootDriver = 11,
    ConsoleInDriver = 12,
    ConsoleOutDriver = 13,
    StartupDpcStack = 14,
    StartupKernelStack = 15,
    StartupPanicStack = 16,
    StartupPcrPage = 17,
    StartupPdrPage = 18,
    RegistryData = 19,
    MemoryData = 20,
    NlsData = 21,
    SpecialMemory = 22,
    BbtMemory = 23,
    Reserve = 24,
    XipRom = 25,
    HalCachedMemory = 26,
    LargePageFiller = 27,
    ErrorLogMemory = 28,
}

impl MemoryType {
    /// Whether pages of this type may be carved up by the loader's
    /// allocator.
    #[inline]
    #[must_use]
    pub const fn is_allocatable(self) -> bool {
        matches!(self, Self::Free)
    }
}

/// `MEMORY_ALLOCATION_DESCRIPTOR` for 32-bit targets.
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct MemoryDescriptor32 {
    pub list_entry: ListEntry32,
    pub memory_type: u32,
    pub base_page: u32,
    pub page_count: u32,
}

/// `MEMORY_ALLOCATION_DESCRIPTOR` for 64-bit targets.
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct MemoryDescriptor64 {
    pub list_entry: ListEntry64,
    pub memory_type: u32,
    pub pad: u32,
    pub base_page: u64,
    pub page_count: u64,
}

const _: () = {
    assert!(size_of::<MemoryDescriptor32>() == 0x14);
    assert!(offset_of!(MemoryDescriptor32, memory_type) == 0x8);
    assert!(offset_of!(MemoryDescriptor32, base_page) == 0xc);
    assert!(offset_of!(MemoryDescriptor32, page_count) == 0x10);

    assert!(size_of::<MemoryDescriptor64>() == 0x28);
    assert!(offset_of!(MemoryDescriptor64, memory_type) == 0x10);
    assert!(offset_of!(MemoryDescriptor64, base_page) == 0x18);
    assert!(offset_of!(MemoryDescriptor64, page_count) == 0x20);

    // Spot-check the wire values against the NT enumeration.
    assert!(MemoryType::Free as u32 == 2);
    assert!(MemoryType::OsloaderHeap as u32 == 7);
    assert!(MemoryType::SystemCode as u32 == 9);
    assert!(MemoryType::HalCode as u32 == 10);
    assert!(MemoryType::BootDriver as u32 == 11);
    assert!(MemoryType::StartupKernelStack as u32 == 15);
    assert!(MemoryType::RegistryData as u32 == 19);
    assert!(MemoryType::MemoryData as u32 == 20);
    assert!(MemoryType::NlsData as u32 == 21);
};
