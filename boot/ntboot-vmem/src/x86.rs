//! 2-level and PAE 3-level address spaces for x86 kernels.
//!
//! Non-PAE uses 32-bit entries, a 1024-entry directory and optional 4 MiB
//! PSE leaves. PAE switches to 64-bit entries under a 4-slot page directory
//! pointer table; its large page is 2 MiB. The self-map convention differs
//! from x86-64: instead of one recursive slot, the directory pages
//! themselves are visible as page tables at `0xc0000000`, which is what the
//! x86 kernel's `MiGetPdeAddress` arithmetic expects.

use crate::entry::{PageEntry32, PageEntry64, Table32, Table64};
use crate::{FrameAlloc, MapAttributes, MapError, PhysMapper, Unmapped};
use ntboot_abi::x86::SELFMAP;
use ntboot_addresses::{PageSize, PhysicalAddress, Size2M, Size4K, VirtualAddress};

/// Translation scheme for an x86 kernel, chosen by the boot configuration
/// and CPU capability.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PagingMode32 {
    /// Classic 2-level, 4 GiB physical.
    TwoLevel,
    /// PAE 3-level, 36+ bit physical, NX available.
    Pae,
}

const PSE_PAGE_SIZE: u64 = 0x40_0000;

/// An x86 page-table tree under construction.
pub struct AddressSpace32<'a, M: PhysMapper> {
    mapper: &'a M,
    mode: PagingMode32,
    root: PhysicalAddress,
    /// The four PAE page directories (unused in two-level mode).
    pae_dirs: [PhysicalAddress; 4],
}

impl<'a, M: PhysMapper> AddressSpace32<'a, M> {
    /// Allocates the root structures for `mode`.
    ///
    /// # Errors
    /// [`MapError::OutOfFrames`] when the frame allocator is exhausted.
    pub fn new(
        mapper: &'a M,
        alloc: &mut impl FrameAlloc,
        mode: PagingMode32,
    ) -> Result<Self, MapError> {
        let root = alloc.alloc_table().ok_or(MapError::OutOfFrames)?;
        let mut pae_dirs = [PhysicalAddress::zero(); 4];
        if mode == PagingMode32::Pae {
            // SAFETY: `root` is a fresh zeroed frame from the allocator.
            let pdpt = unsafe { mapper.phys_to_mut::<Table64>(root) };
            for (index, dir) in pae_dirs.iter_mut().enumerate() {
                let frame = alloc.alloc_table().ok_or(MapError::OutOfFrames)?;
                *dir = frame;
                // PDPTEs in the legacy PAE format carry the present bit and
                // the address; RW/US are reserved there.
                pdpt.entries[index] = PageEntry64::new().with_present(true).with_address(frame);
            }
        }
        Ok(Self {
            mapper,
            mode,
            root,
            pae_dirs,
        })
    }

    #[must_use]
    pub const fn mode(&self) -> PagingMode32 {
        self.mode
    }

    /// Physical address of the root structure (page directory, or PDPT
    /// under PAE).
    #[must_use]
    pub const fn root(&self) -> PhysicalAddress {
        self.root
    }

    /// The four PAE page directories (all zero in two-level mode).
    #[must_use]
    pub const fn pae_directories(&self) -> [PhysicalAddress; 4] {
        self.pae_dirs
    }

    fn table32(&self, at: PhysicalAddress) -> &mut Table32 {
        // SAFETY: only frames this builder allocated or linked are passed.
        unsafe { self.mapper.phys_to_mut::<Table32>(at) }
    }

    fn table64(&self, at: PhysicalAddress) -> &mut Table64 {
        // SAFETY: as above.
        unsafe { self.mapper.phys_to_mut::<Table64>(at) }
    }

    /// Maps one 4 KiB page.
    ///
    /// # Errors
    /// [`MapError`] on misalignment, double mapping or frame exhaustion.
    pub fn map_4k(
        &self,
        alloc: &mut impl FrameAlloc,
        va: VirtualAddress,
        pa: PhysicalAddress,
        attrs: MapAttributes,
    ) -> Result<(), MapError> {
        if !va.is_aligned::<Size4K>() || !pa.is_aligned::<Size4K>() {
            return Err(MapError::Misaligned(va));
        }
        match self.mode {
            PagingMode32::TwoLevel => {
                let pd = self.table32(self.root);
                let pde = &mut pd.entries[va.pde_index_32()];
                let pt_at = if pde.present() {
                    if pde.large_page() {
                        return Err(MapError::AlreadyMapped(va));
                    }
                    pde.address()
                } else {
                    let frame = alloc.alloc_table().ok_or(MapError::OutOfFrames)?;
                    *pde = PageEntry32::table(frame);
                    frame
                };
                let pt = self.table32(pt_at);
                let pte = &mut pt.entries[va.pte_index_32()];
                if pte.present() {
                    return Err(MapError::AlreadyMapped(va));
                }
                *pte = PageEntry32::leaf(pa, attrs, false);
            }
            PagingMode32::Pae => {
                let pd = self.table64(self.pae_dirs[va.pdpte_index_pae()]);
                let pde = &mut pd.entries[va.pde_index_pae()];
                let pt_at = if pde.present() {
                    if pde.large_page() {
                        return Err(MapError::AlreadyMapped(va));
                    }
                    pde.address()
                } else {
                    let frame = alloc.alloc_table().ok_or(MapError::OutOfFrames)?;
                    *pde = PageEntry64::table(frame);
                    frame
                };
                let pt = self.table64(pt_at);
                let pte = &mut pt.entries[va.pte_index_pae()];
                if pte.present() {
                    return Err(MapError::AlreadyMapped(va));
                }
                *pte = PageEntry64::leaf(pa, attrs, false);
            }
        }
        Ok(())
    }

    /// Maps one large page: 4 MiB in two-level mode (PSE), 2 MiB under PAE.
    ///
    /// # Errors
    /// [`MapError`] on misalignment or double mapping.
    pub fn map_large(
        &self,
        va: VirtualAddress,
        pa: PhysicalAddress,
        attrs: MapAttributes,
    ) -> Result<(), MapError> {
        match self.mode {
            PagingMode32::TwoLevel => {
                if va.as_u64() % PSE_PAGE_SIZE != 0 || pa.as_u64() % PSE_PAGE_SIZE != 0 {
                    return Err(MapError::Misaligned(va));
                }
                let pd = self.table32(self.root);
                let pde = &mut pd.entries[va.pde_index_32()];
                if pde.present() {
                    return Err(MapError::AlreadyMapped(va));
                }
                *pde = PageEntry32::leaf(pa, attrs, true);
            }
            PagingMode32::Pae => {
                if !va.is_aligned::<Size2M>() || !pa.is_aligned::<Size2M>() {
                    return Err(MapError::Misaligned(va));
                }
                let pd = self.table64(self.pae_dirs[va.pdpte_index_pae()]);
                let pde = &mut pd.entries[va.pde_index_pae()];
                if pde.present() {
                    return Err(MapError::AlreadyMapped(va));
                }
                *pde = PageEntry64::leaf(pa, attrs, true);
            }
        }
        Ok(())
    }

    /// Maps `pages` 4 KiB pages starting at `va -> pa`.
    ///
    /// # Errors
    /// [`MapError`] as for [`Self::map_4k`].
    pub fn map_range(
        &self,
        alloc: &mut impl FrameAlloc,
        mut va: VirtualAddress,
        mut pa: PhysicalAddress,
        mut pages: u64,
        attrs: MapAttributes,
    ) -> Result<(), MapError> {
        while pages > 0 {
            self.map_4k(alloc, va, pa, attrs)?;
            va += Size4K::SIZE;
            pa += Size4K::SIZE;
            pages -= 1;
        }
        Ok(())
    }

    /// Simulated hardware walk.
    ///
    /// # Errors
    /// [`Unmapped`] when any level lacks a present entry.
    pub fn translate(&self, va: VirtualAddress) -> Result<PhysicalAddress, Unmapped> {
        match self.mode {
            PagingMode32::TwoLevel => {
                let pde = self.table32(self.root).entries[va.pde_index_32()];
                if !pde.present() {
                    return Err(Unmapped(va));
                }
                if pde.large_page() {
                    return Ok(PhysicalAddress::new(
                        pde.address().as_u64() + (va.as_u64() & (PSE_PAGE_SIZE - 1)),
                    ));
                }
                let pte = self.table32(pde.address()).entries[va.pte_index_32()];
                if !pte.present() {
                    return Err(Unmapped(va));
                }
                Ok(PhysicalAddress::new(
                    pte.address().as_u64() + va.offset::<Size4K>(),
                ))
            }
            PagingMode32::Pae => {
                let pde =
                    self.table64(self.pae_dirs[va.pdpte_index_pae()]).entries[va.pde_index_pae()];
                if !pde.present() {
                    return Err(Unmapped(va));
                }
                if pde.large_page() {
                    return Ok(PhysicalAddress::new(
                        pde.address().as_u64() + va.offset::<Size2M>(),
                    ));
                }
                let pte = self.table64(pde.address()).entries[va.pte_index_pae()];
                if !pte.present() {
                    return Err(Unmapped(va));
                }
                Ok(PhysicalAddress::new(
                    pte.address().as_u64() + va.offset::<Size4K>(),
                ))
            }
        }
    }

    /// Installs the kernel-side self-map at `0xc0000000`.
    ///
    /// Two-level: the directory doubles as the page table for the window
    /// (one recursive entry). PAE: each of the four directories appears as
    /// a page table covering its 2 MiB slice of the window.
    pub fn install_self_map(&self) {
        let index = VirtualAddress::new(u64::from(SELFMAP));
        match self.mode {
            PagingMode32::TwoLevel => {
                let root = self.root;
                let pd = self.table32(root);
                pd.entries[index.pde_index_32()] = PageEntry32::table(root);
            }
            PagingMode32::Pae => {
                let window_dir = self.table64(self.pae_dirs[index.pdpte_index_pae()]);
                for (slot, dir) in self.pae_dirs.iter().enumerate() {
                    window_dir.entries[index.pde_index_pae() + slot] = PageEntry64::table(*dir);
                }
            }
        }
    }

    /// Ends construction; the returned address is what goes into CR3 (with
    /// CR4.PAE already set for PAE mode).
    #[must_use]
    pub fn freeze(self) -> PhysicalAddress {
        self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimMemory;

    #[test]
    fn two_level_maps_and_translates() {
        let sim = SimMemory::new(0x80_0000);
        let mut alloc = sim.frame_alloc();
        let space = AddressSpace32::new(&sim, &mut alloc, PagingMode32::TwoLevel).unwrap();

        let va = VirtualAddress::new(0x8010_0000);
        let pa = PhysicalAddress::new(0x40_0000);
        space
            .map_4k(&mut alloc, va, pa, MapAttributes::kernel_code())
            .unwrap();
        assert_eq!(space.translate(va + 0x42).unwrap().as_u64(), 0x40_0042);
        assert!(space.translate(VirtualAddress::new(0x8020_0000)).is_err());
    }

    #[test]
    fn two_level_large_pages_are_4m() {
        let sim = SimMemory::new(0x80_0000);
        let mut alloc = sim.frame_alloc();
        let space = AddressSpace32::new(&sim, &mut alloc, PagingMode32::TwoLevel).unwrap();

        space
            .map_large(
                VirtualAddress::new(0x8000_0000),
                PhysicalAddress::new(0x40_0000),
                MapAttributes::kernel_code(),
            )
            .unwrap();
        assert_eq!(
            space
                .translate(VirtualAddress::new(0x8012_3456))
                .unwrap()
                .as_u64(),
            0x52_3456
        );
        // 2 MiB alignment is not enough for PSE.
        assert_eq!(
            space.map_large(
                VirtualAddress::new(0x8020_0000),
                PhysicalAddress::new(0x20_0000),
                MapAttributes::kernel_code(),
            ),
            Err(MapError::Misaligned(VirtualAddress::new(0x8020_0000)))
        );
    }

    #[test]
    fn pae_maps_and_translates() {
        let sim = SimMemory::new(0x80_0000);
        let mut alloc = sim.frame_alloc();
        let space = AddressSpace32::new(&sim, &mut alloc, PagingMode32::Pae).unwrap();

        let va = VirtualAddress::new(0xffdf_f000); // the PCR page
        let pa = PhysicalAddress::new(0x66_6000);
        space
            .map_4k(&mut alloc, va, pa, MapAttributes::kernel_data())
            .unwrap();
        assert_eq!(space.translate(va).unwrap(), pa);

        space
            .map_large(
                VirtualAddress::new(0x8000_0000),
                PhysicalAddress::new(0x20_0000),
                MapAttributes::kernel_code(),
            )
            .unwrap();
        assert_eq!(
            space
                .translate(VirtualAddress::new(0x8001_2345))
                .unwrap()
                .as_u64(),
            0x21_2345
        );
    }

    #[test]
    fn two_level_self_map_is_recursive() {
        let sim = SimMemory::new(0x80_0000);
        let mut alloc = sim.frame_alloc();
        let space = AddressSpace32::new(&sim, &mut alloc, PagingMode32::TwoLevel).unwrap();
        space.install_self_map();

        // Through the window, the directory is its own page table: the VA
        // of slot 0x300 inside the window resolves to the directory frame.
        let window_va = VirtualAddress::new(u64::from(SELFMAP) + 0x300 * 0x1000);
        assert_eq!(space.translate(window_va).unwrap(), space.root());
    }

    #[test]
    fn pae_self_map_exposes_all_four_directories() {
        let sim = SimMemory::new(0x80_0000);
        let mut alloc = sim.frame_alloc();
        let space = AddressSpace32::new(&sim, &mut alloc, PagingMode32::Pae).unwrap();
        space.install_self_map();

        // The directory pages themselves surface in the second window
        // slice (directory 3 appearing as a page table maps them): page i
        // of 0xc0600000 is directory i.
        let dirs = space.pae_directories();
        for (index, dir) in dirs.iter().enumerate() {
            let window_va =
                VirtualAddress::new(u64::from(SELFMAP) + 3 * 0x20_0000 + index as u64 * 0x1000);
            assert_eq!(space.translate(window_va).unwrap(), *dir);
        }

        // And a mapped page's PT becomes visible in the first window
        // slice: VA 0xc0000000 + j*0x1000 is the j-th page table of
        // directory 0.
        space
            .map_4k(
                &mut alloc,
                VirtualAddress::new(0x0010_0000),
                PhysicalAddress::new(0x0010_0000),
                MapAttributes::loader_transition(),
            )
            .unwrap();
        let pt_phys = space.translate(VirtualAddress::new(u64::from(SELFMAP))).unwrap();
        let pte_bytes = sim.bytes(pt_phys, 0x1000);
        let raw = u64::from_le_bytes(pte_bytes[0x100 * 8..0x100 * 8 + 8].try_into().unwrap());
        assert_eq!(raw & 1, 1, "PTE for the identity page should be present");
    }
}
