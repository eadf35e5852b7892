//! Raw page-table entries.

use crate::MapAttributes;
use bitfield_struct::bitfield;
use ntboot_addresses::PhysicalAddress;

/// One 64-bit table entry: PML4E/PDPTE/PDE/PTE on x86-64 and all PAE
/// levels on x86 share this shape (PAE PDPTEs tolerate only a subset of
/// the bits; the builders never set the others there).
#[bitfield(u64)]
pub struct PageEntry64 {
    /// P: entry is valid.
    pub present: bool,
    /// RW: writes allowed through this entry.
    pub writable: bool,
    /// US: user-mode access allowed.
    pub user: bool,
    /// PWT: write-through caching.
    pub write_through: bool,
    /// PCD: caching disabled.
    pub cache_disabled: bool,
    /// A: set by hardware on access.
    pub accessed: bool,
    /// D: set by hardware on write (leaf only).
    pub dirty: bool,
    /// PS: large-page leaf (PDE/PDPTE only).
    pub large_page: bool,
    /// G: survives CR3 reloads (leaf only).
    pub global: bool,
    #[bits(3)]
    __: u8,
    /// Physical frame bits 51:12.
    #[bits(40)]
    frame: u64,
    #[bits(11)]
    __: u16,
    /// NX: instruction fetch disallowed (requires EFER.NXE).
    pub no_execute: bool,
}

impl PageEntry64 {
    #[must_use]
    pub const fn address(&self) -> PhysicalAddress {
        PhysicalAddress::new(self.frame() << 12)
    }

    #[must_use]
    pub const fn with_address(self, at: PhysicalAddress) -> Self {
        self.with_frame(at.as_u64() >> 12)
    }

    /// Non-leaf entry pointing at the next table level. Permissive RW; the
    /// effective rights are decided at the leaves.
    #[must_use]
    pub const fn table(at: PhysicalAddress) -> Self {
        Self::new().with_present(true).with_writable(true).with_address(at)
    }

    /// Leaf entry for `at` with `attrs`.
    #[must_use]
    pub const fn leaf(at: PhysicalAddress, attrs: MapAttributes, large: bool) -> Self {
        Self::new()
            .with_present(true)
            .with_writable(attrs.writable)
            .with_user(attrs.user)
            .with_write_through(attrs.write_through)
            .with_cache_disabled(attrs.cache_disabled)
            .with_no_execute(attrs.no_execute)
            .with_global(attrs.global)
            .with_large_page(large)
            .with_address(at)
    }
}

/// One 32-bit entry for non-PAE x86 (PDE and PTE).
#[bitfield(u32)]
pub struct PageEntry32 {
    pub present: bool,
    pub writable: bool,
    pub user: bool,
    pub write_through: bool,
    pub cache_disabled: bool,
    pub accessed: bool,
    pub dirty: bool,
    /// PS: 4 MiB leaf in a PDE (requires CR4.PSE).
    pub large_page: bool,
    pub global: bool,
    #[bits(3)]
    __: u8,
    /// Physical frame bits 31:12.
    #[bits(20)]
    frame: u32,
}

impl PageEntry32 {
    #[must_use]
    pub const fn address(&self) -> PhysicalAddress {
        PhysicalAddress::new((self.frame() as u64) << 12)
    }

    #[must_use]
    pub const fn with_address(self, at: PhysicalAddress) -> Self {
        self.with_frame((at.as_u64() >> 12) as u32)
    }

    #[must_use]
    pub const fn table(at: PhysicalAddress) -> Self {
        Self::new().with_present(true).with_writable(true).with_address(at)
    }

    #[must_use]
    pub const fn leaf(at: PhysicalAddress, attrs: MapAttributes, large: bool) -> Self {
        Self::new()
            .with_present(true)
            .with_writable(attrs.writable)
            .with_user(attrs.user)
            .with_write_through(attrs.write_through)
            .with_cache_disabled(attrs.cache_disabled)
            .with_global(attrs.global)
            .with_large_page(large)
            .with_address(at)
    }
}

/// A 4 KiB table of 512 64-bit entries.
#[repr(C, align(4096))]
pub struct Table64 {
    pub entries: [PageEntry64; 512],
}

/// A 4 KiB table of 1024 32-bit entries (non-PAE directory or table).
#[repr(C, align(4096))]
pub struct Table32 {
    pub entries: [PageEntry32; 1024],
}

const _: () = {
    assert!(core::mem::size_of::<Table64>() == 4096);
    assert!(core::mem::size_of::<Table32>() == 4096);
};
