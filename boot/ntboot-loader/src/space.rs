//! Kernel virtual address planning.
//!
//! Every loader-built structure the kernel will touch needs two addresses:
//! where it physically lives and where the kernel will see it. The plan
//! hands out kernel VAs from a bump cursor and records every `va -> phys`
//! range; the hand-off sequencer replays the record into the page tables.
//! Keeping the record explicit is what guarantees the invariant that no
//! loader-heap physical address ever leaks into the parameter block.

use alloc::vec::Vec;
use log::trace;
use ntboot_addresses::{PAGE_SHIFT, PhysicalAddress, VirtualAddress};
use ntboot_vmem::{AddressSpace64, FrameAlloc, MapAttributes, MapError, PhysMapper};

/// One recorded kernel-side mapping.
#[derive(Copy, Clone, Debug)]
pub struct PlannedMapping {
    pub va: u64,
    pub phys: PhysicalAddress,
    pub pages: u64,
    pub attrs: MapAttributes,
}

/// Bump allocator over a kernel VA region plus the mapping record.
pub struct KernelSpacePlan {
    next_va: u64,
    mappings: Vec<PlannedMapping>,
}

impl KernelSpacePlan {
    /// Plans allocations upward from `base_va` (e.g. the region above the
    /// loaded images on x86-64).
    #[must_use]
    pub const fn new(base_va: u64) -> Self {
        Self {
            next_va: base_va,
            mappings: Vec::new(),
        }
    }

    /// Reserves `pages` pages of kernel VA without backing them yet.
    pub fn reserve(&mut self, pages: u64) -> u64 {
        let va = self.next_va;
        self.next_va += pages << PAGE_SHIFT;
        va
    }

    /// Records that `va` is backed by `phys` for `pages` pages.
    pub fn record(&mut self, va: u64, phys: PhysicalAddress, pages: u64, attrs: MapAttributes) {
        trace!("plan {va:#x} -> {phys} ({pages} pages)");
        self.mappings.push(PlannedMapping {
            va,
            phys,
            pages,
            attrs,
        });
    }

    /// Reserves a VA range for `phys` and records the mapping in one step.
    pub fn reserve_mapped(
        &mut self,
        phys: PhysicalAddress,
        pages: u64,
        attrs: MapAttributes,
    ) -> u64 {
        let va = self.reserve(pages);
        self.record(va, phys, pages, attrs);
        va
    }

    #[must_use]
    pub fn mappings(&self) -> &[PlannedMapping] {
        &self.mappings
    }

    /// Replays the record into a 4-level address space.
    ///
    /// # Errors
    /// [`MapError`] from the underlying mapper.
    pub fn apply_x64<M: PhysMapper>(
        &self,
        space: &AddressSpace64<'_, M>,
        alloc: &mut impl FrameAlloc,
    ) -> Result<(), MapError> {
        for mapping in &self.mappings {
            space.map_range(
                alloc,
                VirtualAddress::new(mapping.va),
                mapping.phys,
                mapping.pages,
                mapping.attrs,
            )?;
        }
        Ok(())
    }

    /// Replays the record into an x86 address space.
    ///
    /// # Errors
    /// [`MapError`] from the underlying mapper.
    pub fn apply_x86<M: PhysMapper>(
        &self,
        space: &ntboot_vmem::AddressSpace32<'_, M>,
        alloc: &mut impl FrameAlloc,
    ) -> Result<(), MapError> {
        for mapping in &self.mappings {
            space.map_range(
                alloc,
                VirtualAddress::new(mapping.va),
                mapping.phys,
                mapping.pages,
                mapping.attrs,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reservations_are_page_multiples_and_monotonic() {
        let mut plan = KernelSpacePlan::new(0xffff_f800_1000_0000);
        let a = plan.reserve(1);
        let b = plan.reserve(3);
        let c = plan.reserve(1);
        assert_eq!(a, 0xffff_f800_1000_0000);
        assert_eq!(b, a + 0x1000);
        assert_eq!(c, b + 0x3000);
    }
}
