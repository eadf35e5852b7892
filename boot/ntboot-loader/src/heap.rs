//! The loader heap.
//!
//! A single contiguous run of `LoaderOsloaderHeap` pages out of which every
//! kernel-visible structure is carved: the parameter block, the extension,
//! module entries, strings, descriptor tables. The run is mapped linearly
//! into kernel space, so `va = heap_base_va + (phys - heap_base_phys)` and
//! structures can be linked to each other by VA while still being written
//! through the loader's physical view.

use crate::space::KernelSpacePlan;
use crate::PoolAccess;
use core::mem::{align_of, size_of};
use log::debug;
use ntboot_addresses::{PAGE_SHIFT, PhysicalAddress};
use ntboot_mmap::{MemoryMap, MemoryType, NoMemory};
use ntboot_vmem::MapAttributes;

/// Pool-backed bump allocator addressed by kernel VA.
pub struct LoaderHeap<'a, P: PoolAccess> {
    pool: &'a P,
    phys: PhysicalAddress,
    va: u64,
    len: usize,
    cursor: usize,
}

impl<'a, P: PoolAccess> LoaderHeap<'a, P> {
    /// Carves `pages` pages of heap out of `map` and plans their kernel
    /// mapping (writable data, NX).
    ///
    /// # Errors
    /// [`NoMemory`] when the pool cannot supply the run.
    pub fn new(
        map: &mut MemoryMap,
        plan: &mut KernelSpacePlan,
        pool: &'a P,
        pages: u64,
    ) -> Result<Self, NoMemory> {
        let base = map.allocate(pages, MemoryType::OsloaderHeap, 1)?;
        let phys = base.base();
        let va = plan.reserve_mapped(phys, pages, MapAttributes::kernel_data());
        debug!("loader heap: {pages} pages at {phys}, kernel VA {va:#x}");
        Ok(Self {
            pool,
            phys,
            va,
            len: usize::try_from(pages << PAGE_SHIFT).unwrap_or(usize::MAX),
            cursor: 0,
        })
    }

    /// Kernel VA of the heap base.
    #[must_use]
    pub const fn base_va(&self) -> u64 {
        self.va
    }

    /// Translates a heap VA back to its physical address.
    #[must_use]
    pub fn phys_of(&self, va: u64) -> PhysicalAddress {
        debug_assert!(va >= self.va && va < self.va + self.len as u64);
        self.phys + (va - self.va)
    }

    /// Allocates `len` zeroed bytes with `align`, returning the kernel VA.
    ///
    /// # Errors
    /// [`NoMemory`] when the heap run is exhausted.
    pub fn alloc(&mut self, len: usize, align: usize) -> Result<u64, NoMemory> {
        debug_assert!(align.is_power_of_two());
        let at = (self.cursor + align - 1) & !(align - 1);
        let end = at.checked_add(len).ok_or(NoMemory { pages: 0 })?;
        if end > self.len {
            return Err(NoMemory {
                pages: (len as u64) >> PAGE_SHIFT,
            });
        }
        self.cursor = end;
        let va = self.va + at as u64;
        self.bytes_mut(va, len).fill(0);
        Ok(va)
    }

    /// Mutable byte view of heap memory by kernel VA.
    #[must_use]
    pub fn bytes_mut(&self, va: u64, len: usize) -> &mut [u8] {
        self.pool.slice_mut(self.phys_of(va), len)
    }

    /// Allocates a zeroed `T` and returns its kernel VA.
    ///
    /// `T` must be one of the plain-old-data ABI structures (all-zero is a
    /// valid value).
    ///
    /// # Errors
    /// [`NoMemory`] when the heap run is exhausted.
    pub fn place<T>(&mut self) -> Result<u64, NoMemory> {
        self.alloc(size_of::<T>(), align_of::<T>())
    }

    /// Typed mutable view of a structure previously placed at `va`.
    #[must_use]
    pub fn at_mut<T>(&self, va: u64) -> &mut T {
        let bytes = self.bytes_mut(va, size_of::<T>());
        // SAFETY: the heap only hands out VAs it allocated with the right
        // size and alignment; T is plain old data.
        unsafe { &mut *bytes.as_mut_ptr().cast::<T>() }
    }

    /// Copies `data` into the heap; returns its kernel VA.
    ///
    /// # Errors
    /// [`NoMemory`] when the heap run is exhausted.
    pub fn bytes(&mut self, data: &[u8], align: usize) -> Result<u64, NoMemory> {
        let va = self.alloc(data.len(), align)?;
        self.bytes_mut(va, data.len()).copy_from_slice(data);
        Ok(va)
    }

    /// Copies `s` as a NUL-terminated 8-bit string; returns its kernel VA.
    ///
    /// # Errors
    /// [`NoMemory`] when the heap run is exhausted.
    pub fn ansi_str(&mut self, s: &str) -> Result<u64, NoMemory> {
        let va = self.alloc(s.len() + 1, 1)?;
        let bytes = self.bytes_mut(va, s.len() + 1);
        bytes[..s.len()].copy_from_slice(s.as_bytes());
        bytes[s.len()] = 0;
        Ok(va)
    }

    /// Copies `s` as NUL-terminated UTF-16; returns the kernel VA and the
    /// string's byte length (excluding the terminator), ready for a
    /// `UNICODE_STRING`.
    ///
    /// # Errors
    /// [`NoMemory`] when the heap run is exhausted.
    pub fn utf16_str(&mut self, s: &str) -> Result<(u64, u16), NoMemory> {
        let units: alloc::vec::Vec<u16> = s.encode_utf16().collect();
        let byte_len = units.len() * 2;
        let va = self.alloc(byte_len + 2, 2)?;
        let bytes = self.bytes_mut(va, byte_len + 2);
        for (index, unit) in units.iter().enumerate() {
            bytes[index * 2..index * 2 + 2].copy_from_slice(&unit.to_le_bytes());
        }
        bytes[byte_len..].copy_from_slice(&0u16.to_le_bytes());
        Ok((va, u16::try_from(byte_len).unwrap_or(u16::MAX)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PoolAccess;
    use ntboot_mmap::MemoryRun;
    use ntboot_vmem::sim::SimMemory;

    struct SimPool<'a>(&'a SimMemory);

    impl PoolAccess for SimPool<'_> {
        fn slice_mut(&self, at: PhysicalAddress, len: usize) -> &mut [u8] {
            self.0.bytes_mut(at, len)
        }
    }

    fn heap_fixture() -> (MemoryMap, KernelSpacePlan) {
        let map = MemoryMap::new([MemoryRun::new(0, 0x100, MemoryType::Free)]).unwrap();
        let plan = KernelSpacePlan::new(0xffff_f800_2000_0000);
        (map, plan)
    }

    #[test]
    fn va_phys_translation_is_linear() {
        let sim = SimMemory::new(0x100_000);
        let pool = SimPool(&sim);
        let (mut map, mut plan) = heap_fixture();
        let mut heap = LoaderHeap::new(&mut map, &mut plan, &pool, 0x10).unwrap();

        let va = heap.alloc(0x30, 8).unwrap();
        assert_eq!(va, heap.base_va());
        assert_eq!(heap.phys_of(va + 0x10).as_u64(), 0x10);
        // The planned mapping covers the heap.
        assert_eq!(plan.mappings().len(), 1);
        assert_eq!(plan.mappings()[0].va, heap.base_va());
    }

    #[test]
    fn strings_are_terminated() {
        let sim = SimMemory::new(0x100_000);
        let pool = SimPool(&sim);
        let (mut map, mut plan) = heap_fixture();
        let mut heap = LoaderHeap::new(&mut map, &mut plan, &pool, 0x10).unwrap();

        let ansi = heap.ansi_str("multi(0)disk(0)").unwrap();
        let bytes = heap.bytes_mut(ansi, 16);
        assert_eq!(&bytes[..15], b"multi(0)disk(0)");
        assert_eq!(bytes[15], 0);

        let (utf16, len) = heap.utf16_str("hal.dll").unwrap();
        assert_eq!(len, 14);
        let bytes = heap.bytes_mut(utf16, 16);
        assert_eq!(bytes[0], b'h');
        assert_eq!(bytes[1], 0);
        assert_eq!(&bytes[14..16], &[0, 0]);
    }

    #[test]
    fn exhaustion_reports_no_memory() {
        let sim = SimMemory::new(0x100_000);
        let pool = SimPool(&sim);
        let (mut map, mut plan) = heap_fixture();
        let mut heap = LoaderHeap::new(&mut map, &mut plan, &pool, 1).unwrap();
        assert!(heap.alloc(0x800, 8).is_ok());
        assert!(heap.alloc(0x900, 8).is_err());
    }
}
