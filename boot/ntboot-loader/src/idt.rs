//! Interrupt descriptor table construction.
//!
//! All 256 gates point at the kernel's early trap stub; the kernel
//! repoints them at its real handlers during phase 0 initialization. Until
//! then any vector that fires lands somewhere that can at least spin
//! recognizably instead of triple-faulting through a junk IDT.

use crate::gdt::TableImage;
use crate::heap::LoaderHeap;
use crate::PoolAccess;
use ntboot_abi::{NUM_IDT, x64, x86};
use ntboot_mmap::NoMemory;

/// Present 64-bit interrupt gate, DPL 0.
const GATE_TYPE_64: u8 = 0x8e;
/// Present 32-bit interrupt gate, DPL 0.
const GATE_TYPE_32: u8 = 0x8e;

/// Builds the long-mode IDT with every gate at `stub_va`.
///
/// # Errors
/// [`NoMemory`] when the heap is exhausted.
pub fn build_idt_x64<P: PoolAccess>(
    heap: &mut LoaderHeap<'_, P>,
    stub_va: u64,
) -> Result<TableImage, NoMemory> {
    let va = heap.alloc(NUM_IDT * 16, 16)?;
    let bytes = heap.bytes_mut(va, NUM_IDT * 16);

    let mut gate = [0u8; 16];
    gate[0..2].copy_from_slice(&(stub_va as u16).to_le_bytes());
    gate[2..4].copy_from_slice(&x64::selector::KGDT_R0_CODE.to_le_bytes());
    gate[4] = 0; // IST
    gate[5] = GATE_TYPE_64;
    gate[6..8].copy_from_slice(&((stub_va >> 16) as u16).to_le_bytes());
    gate[8..12].copy_from_slice(&((stub_va >> 32) as u32).to_le_bytes());

    for vector in 0..NUM_IDT {
        bytes[vector * 16..vector * 16 + 16].copy_from_slice(&gate);
    }

    Ok(TableImage {
        va,
        limit: (NUM_IDT * 16 - 1) as u16,
    })
}

/// Builds the x86 IDT with every gate at `stub_va`.
///
/// # Errors
/// [`NoMemory`] when the heap is exhausted.
pub fn build_idt_x86<P: PoolAccess>(
    heap: &mut LoaderHeap<'_, P>,
    stub_va: u32,
) -> Result<TableImage, NoMemory> {
    let va = heap.alloc(NUM_IDT * 8, 16)?;
    let bytes = heap.bytes_mut(va, NUM_IDT * 8);

    let mut gate = [0u8; 8];
    gate[0..2].copy_from_slice(&(stub_va as u16).to_le_bytes());
    gate[2..4].copy_from_slice(&x86::selector::KGDT_R0_CODE.to_le_bytes());
    gate[5] = GATE_TYPE_32;
    gate[6..8].copy_from_slice(&((stub_va >> 16) as u16).to_le_bytes());

    for vector in 0..NUM_IDT {
        bytes[vector * 8..vector * 8 + 8].copy_from_slice(&gate);
    }

    Ok(TableImage {
        va,
        limit: (NUM_IDT * 8 - 1) as u16,
    })
}

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
    fn every_gate_carries_the_stub_and_selector() {
        let sim = SimMemory::new(0x100_000);
        let pool = SimPool(&sim);
        let mut map = MemoryMap::new([MemoryRun::new(0, 0x100, MemoryType::Free)]).unwrap();
        let mut plan = KernelSpacePlan::new(0xffff_f800_2000_0000);
        let mut heap = LoaderHeap::new(&mut map, &mut plan, &pool, 0x10).unwrap();

        let stub = 0xffff_f800_0123_4560_u64;
        let idt = build_idt_x64(&mut heap, stub).unwrap();
        assert_eq!(idt.limit, 0xfff);

        let bytes = heap.bytes_mut(idt.va, NUM_IDT * 16);
        for vector in [0usize, 0x2e, 0xff] {
            let gate = &bytes[vector * 16..vector * 16 + 16];
            let low = u16::from_le_bytes(gate[0..2].try_into().unwrap());
            let selector = u16::from_le_bytes(gate[2..4].try_into().unwrap());
            let mid = u16::from_le_bytes(gate[6..8].try_into().unwrap());
            let high = u32::from_le_bytes(gate[8..12].try_into().unwrap());
            let offset =
                u64::from(low) | (u64::from(mid) << 16) | (u64::from(high) << 32);
            assert_eq!(offset, stub);
            assert_eq!(selector, x64::selector::KGDT_R0_CODE);
            assert_eq!(gate[5], 0x8e);
        }
    }
}
