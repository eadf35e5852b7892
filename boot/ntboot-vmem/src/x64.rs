//! 4-level address space for x86-64 kernels.

use crate::entry::{PageEntry64, Table64};
use crate::{FrameAlloc, MapAttributes, MapError, PhysMapper, Unmapped};
use log::trace;
use ntboot_addresses::{PageSize, PhysicalAddress, Size1G, Size2M, Size4K, VirtualAddress};

/// PML4 slot of the recursive mapping (`SELFMAP >> 39`).
pub const SELF_MAP_INDEX: usize = ((ntboot_abi::x64::SELFMAP >> 39) & 0x1ff) as usize;

/// A 4-level page-table tree under construction.
///
/// Borrows the [`PhysMapper`] for its whole lifetime; every table access
/// goes through it, so the same code builds real tables in the loader and
/// simulated ones in tests.
pub struct AddressSpace64<'a, M: PhysMapper> {
    mapper: &'a M,
    root: PhysicalAddress,
}

impl<'a, M: PhysMapper> AddressSpace64<'a, M> {
    /// Allocates an empty PML4.
    ///
    /// # Errors
    /// [`MapError::OutOfFrames`] when the frame allocator is exhausted.
    pub fn new(mapper: &'a M, alloc: &mut impl FrameAlloc) -> Result<Self, MapError> {
        let root = alloc.alloc_table().ok_or(MapError::OutOfFrames)?;
        Ok(Self { mapper, root })
    }

    /// Wraps an existing root table.
    pub const fn from_root(mapper: &'a M, root: PhysicalAddress) -> Self {
        Self { mapper, root }
    }

    /// Physical address of the PML4.
    #[must_use]
    pub const fn root(&self) -> PhysicalAddress {
        self.root
    }

    fn table(&self, at: PhysicalAddress) -> &mut Table64 {
        // SAFETY: `at` only ever comes from the frame allocator or a
        // present non-leaf entry this builder wrote, so it is a live,
        // exclusive page-table frame.
        unsafe { self.mapper.phys_to_mut::<Table64>(at) }
    }

    /// Returns the table the entry points at, allocating it if the entry
    /// is empty.
    fn descend(
        &self,
        table: &mut Table64,
        index: usize,
        alloc: &mut impl FrameAlloc,
        va: VirtualAddress,
    ) -> Result<PhysicalAddress, MapError> {
        let entry = table.entries[index];
        if entry.present() {
            if entry.large_page() {
                return Err(MapError::AlreadyMapped(va));
            }
            return Ok(entry.address());
        }
        let frame = alloc.alloc_table().ok_or(MapError::OutOfFrames)?;
        table.entries[index] = PageEntry64::table(frame);
        Ok(frame)
    }

    /// Maps one page of size `S` at `va -> pa`.
    ///
    /// # Errors
    /// [`MapError`] on misalignment, double mapping or frame exhaustion.
    pub fn map_one<S: PageSize>(
        &self,
        alloc: &mut impl FrameAlloc,
        va: VirtualAddress,
        pa: PhysicalAddress,
        attrs: MapAttributes,
    ) -> Result<(), MapError> {
        if !va.is_aligned::<S>() || !pa.is_aligned::<S>() {
            return Err(MapError::Misaligned(va));
        }

        let pml4 = self.table(self.root);
        let pdpt_at = self.descend(pml4, va.pml4_index(), alloc, va)?;
        let pdpt = self.table(pdpt_at);

        let (table_at, index, large) = match S::SHIFT {
            30 => {
                let slot = &mut pdpt.entries[va.pdpt_index()];
                if slot.present() {
                    return Err(MapError::AlreadyMapped(va));
                }
                *slot = PageEntry64::leaf(pa, attrs, true);
                trace!("map 1G {va} -> {pa}");
                return Ok(());
            }
            21 => {
                let pd_at = self.descend(pdpt, va.pdpt_index(), alloc, va)?;
                (pd_at, va.pd_index(), true)
            }
            _ => {
                let pd_at = self.descend(pdpt, va.pdpt_index(), alloc, va)?;
                let pd = self.table(pd_at);
                let pt_at = self.descend(pd, va.pd_index(), alloc, va)?;
                (pt_at, va.pt_index(), false)
            }
        };

        let table = self.table(table_at);
        let slot = &mut table.entries[index];
        if slot.present() {
            return Err(MapError::AlreadyMapped(va));
        }
        *slot = PageEntry64::leaf(pa, attrs, large);
        Ok(())
    }

    /// Maps `pages` 4 KiB pages starting at `va -> pa`, upgrading to 2 MiB
    /// leaves where both sides are aligned and enough pages remain.
    ///
    /// # Errors
    /// [`MapError`] as for [`Self::map_one`].
    pub fn map_range(
        &self,
        alloc: &mut impl FrameAlloc,
        mut va: VirtualAddress,
        mut pa: PhysicalAddress,
        mut pages: u64,
        attrs: MapAttributes,
    ) -> Result<(), MapError> {
        const PAGES_PER_2M: u64 = Size2M::SIZE / Size4K::SIZE;
        while pages > 0 {
            if pages >= PAGES_PER_2M && va.is_aligned::<Size2M>() && pa.is_aligned::<Size2M>() {
                self.map_one::<Size2M>(alloc, va, pa, attrs)?;
                va += Size2M::SIZE;
                pa += Size2M::SIZE;
                pages -= PAGES_PER_2M;
            } else {
                self.map_one::<Size4K>(alloc, va, pa, attrs)?;
                va += Size4K::SIZE;
                pa += Size4K::SIZE;
                pages -= 1;
            }
        }
        Ok(())
    }

    /// Simulated hardware walk.
    ///
    /// # Errors
    /// [`Unmapped`] when any level lacks a present entry.
    pub fn translate(&self, va: VirtualAddress) -> Result<PhysicalAddress, Unmapped> {
        let pml4e = self.table(self.root).entries[va.pml4_index()];
        if !pml4e.present() {
            return Err(Unmapped(va));
        }
        let pdpte = self.table(pml4e.address()).entries[va.pdpt_index()];
        if !pdpte.present() {
            return Err(Unmapped(va));
        }
        if pdpte.large_page() {
            return Ok(PhysicalAddress::new(
                pdpte.address().as_u64() + va.offset::<Size1G>(),
            ));
        }
        let pde = self.table(pdpte.address()).entries[va.pd_index()];
        if !pde.present() {
            return Err(Unmapped(va));
        }
        if pde.large_page() {
            return Ok(PhysicalAddress::new(
                pde.address().as_u64() + va.offset::<Size2M>(),
            ));
        }
        let pte = self.table(pde.address()).entries[va.pt_index()];
        if !pte.present() {
            return Err(Unmapped(va));
        }
        Ok(PhysicalAddress::new(
            pte.address().as_u64() + va.offset::<Size4K>(),
        ))
    }

    /// Installs the recursive PML4 entry. The slot value is a plain
    /// physical address - the cycle exists only in the MMU's eyes.
    pub fn install_self_map(&self) {
        let root = self.root;
        let pml4 = self.table(root);
        pml4.entries[SELF_MAP_INDEX] = PageEntry64::table(root);
    }

    /// Ends construction; the returned address is what goes into CR3.
    #[must_use]
    pub fn freeze(self) -> PhysicalAddress {
        self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimMemory;
    use ntboot_abi::x64::SELFMAP_PML4;

    #[test]
    fn maps_and_translates_4k() {
        let sim = SimMemory::new(0x40_0000);
        let mut alloc = sim.frame_alloc();
        let space = AddressSpace64::new(&sim, &mut alloc).unwrap();

        let va = VirtualAddress::new(0xffff_f800_0000_0000);
        let pa = PhysicalAddress::new(0x20_0000);
        space
            .map_one::<Size4K>(&mut alloc, va, pa, MapAttributes::kernel_data())
            .unwrap();

        assert_eq!(space.translate(va).unwrap(), pa);
        assert_eq!(space.translate(va + 0x123).unwrap().as_u64(), 0x20_0123);
        assert!(space.translate(va + 0x1000).is_err());
    }

    #[test]
    fn map_range_uses_large_pages_where_aligned() {
        let sim = SimMemory::new(0x100_0000);
        let mut alloc = sim.frame_alloc();
        let space = AddressSpace64::new(&sim, &mut alloc).unwrap();

        // 4 MiB aligned on both sides: two 2 MiB leaves, no PT frames.
        let frames_before = alloc.frames_used();
        space
            .map_range(
                &mut alloc,
                VirtualAddress::new(0xffff_f800_0040_0000),
                PhysicalAddress::new(0x40_0000),
                0x400,
                MapAttributes::kernel_code(),
            )
            .unwrap();
        // One PDPT + one PD, nothing else.
        assert_eq!(alloc.frames_used() - frames_before, 2);
        assert_eq!(
            space
                .translate(VirtualAddress::new(0xffff_f800_0061_0000))
                .unwrap()
                .as_u64(),
            0x61_0000
        );
    }

    #[test]
    fn double_mapping_is_rejected() {
        let sim = SimMemory::new(0x40_0000);
        let mut alloc = sim.frame_alloc();
        let space = AddressSpace64::new(&sim, &mut alloc).unwrap();
        let va = VirtualAddress::new(0x10_0000);
        let pa = PhysicalAddress::new(0x10_0000);
        space
            .map_one::<Size4K>(&mut alloc, va, pa, MapAttributes::loader_transition())
            .unwrap();
        assert_eq!(
            space.map_one::<Size4K>(&mut alloc, va, pa, MapAttributes::loader_transition()),
            Err(MapError::AlreadyMapped(va))
        );
    }

    /// Identity-map preservation: after building the kernel mappings, the
    /// loader's own (identity-mapped) addresses still walk to themselves.
    #[test]
    fn identity_window_survives_kernel_mappings() {
        let sim = SimMemory::new(0x100_0000);
        let mut alloc = sim.frame_alloc();
        let space = AddressSpace64::new(&sim, &mut alloc).unwrap();

        space
            .map_range(
                &mut alloc,
                VirtualAddress::new(0),
                PhysicalAddress::new(0),
                0x200,
                MapAttributes::loader_transition(),
            )
            .unwrap();
        space
            .map_range(
                &mut alloc,
                VirtualAddress::new(0xffff_f800_0000_0000),
                PhysicalAddress::new(0x80_0000),
                0x100,
                MapAttributes::kernel_code(),
            )
            .unwrap();

        let switch_code = VirtualAddress::new(0x12_3450);
        assert_eq!(space.translate(switch_code).unwrap().as_u64(), 0x12_3450);
    }

    /// Self-map correctness: reading the PML4 through the recursive window
    /// yields the PML4 frame itself.
    #[test]
    fn self_map_points_back_at_the_pml4() {
        let sim = SimMemory::new(0x40_0000);
        let mut alloc = sim.frame_alloc();
        let space = AddressSpace64::new(&sim, &mut alloc).unwrap();
        space.install_self_map();

        let root = space.root();
        // The canonical self-map VA of the PML4 must translate to the PML4
        // frame.
        assert_eq!(
            space.translate(VirtualAddress::new(SELFMAP_PML4)).unwrap(),
            root
        );
    }
}
