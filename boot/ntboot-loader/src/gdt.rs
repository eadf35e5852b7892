//! Global descriptor table construction.
//!
//! The kernel inherits a GDT whose selector numbers its trap handlers,
//! context switch and SYSCALL/SYSENTER paths hard-code, so the layout is
//! not a choice: the table below reproduces the NT assignments for each
//! architecture. 128 entries are allocated; slots not named stay null and
//! the kernel repopulates what it cares about during phase 0.

use crate::heap::LoaderHeap;
use crate::PoolAccess;
use ntboot_abi::{NUM_GDT, x64, x86};
use ntboot_mmap::NoMemory;

/// A built descriptor table: base VA and the `lgdt`/`lidt` limit.
#[derive(Copy, Clone, Debug)]
pub struct TableImage {
    pub va: u64,
    pub limit: u16,
}

/// Encodes a classic 8-byte segment descriptor.
const fn descriptor(base: u32, limit: u32, access: u8, flags: u8) -> u64 {
    let base = base as u64;
    let limit = limit as u64;
    (limit & 0xffff)
        | ((base & 0xff_ffff) << 16)
        | ((access as u64) << 40)
        | (((limit >> 16) & 0xf) << 48)
        | (((flags as u64) & 0xf) << 52)
        | (((base >> 24) & 0xff) << 56)
}

/// Access bytes: present | DPL | S/code/data type.
const ACCESS_R0_CODE: u8 = 0x9a;
const ACCESS_R0_DATA: u8 = 0x92;
const ACCESS_R3_CODE: u8 = 0xfa;
const ACCESS_R3_DATA: u8 = 0xf2;
const ACCESS_TSS32: u8 = 0x89;
const ACCESS_TSS64: u8 = 0x89;
const ACCESS_LDT: u8 = 0x82;

/// Flag nibbles.
const FLAG_FLAT32: u8 = 0xc; // 4 KiB granularity, 32-bit
const FLAG_LONG: u8 = 0x2; // L bit
const FLAG_BYTE: u8 = 0x0;

/// Builds the long-mode GDT. `tss_va`/`tss_limit` describe the 64-bit TSS
/// (which needs a 16-byte descriptor spanning two slots).
///
/// # Errors
/// [`NoMemory`] when the heap is exhausted.
pub fn build_gdt_x64<P: PoolAccess>(
    heap: &mut LoaderHeap<'_, P>,
    tss_va: u64,
    tss_limit: u32,
) -> Result<TableImage, NoMemory> {
    let va = heap.alloc(NUM_GDT * 8, 16)?;
    let bytes = heap.bytes_mut(va, NUM_GDT * 8);
    let mut set = |selector: u16, value: u64| {
        let at = selector as usize;
        bytes[at..at + 8].copy_from_slice(&value.to_le_bytes());
    };

    use x64::selector::{
        KGDT_R0_CODE, KGDT_R0_DATA, KGDT_R3_CMCODE, KGDT_R3_CMTEB, KGDT_R3_CODE, KGDT_R3_DATA,
        KGDT_TSS,
    };
    set(KGDT_R0_CODE, descriptor(0, 0, ACCESS_R0_CODE, FLAG_LONG));
    set(KGDT_R0_DATA, descriptor(0, 0xf_ffff, ACCESS_R0_DATA, FLAG_FLAT32));
    set(KGDT_R3_CMCODE, descriptor(0, 0xf_ffff, ACCESS_R3_CODE, FLAG_FLAT32));
    set(KGDT_R3_DATA, descriptor(0, 0xf_ffff, ACCESS_R3_DATA, FLAG_FLAT32));
    set(KGDT_R3_CODE, descriptor(0, 0, ACCESS_R3_CODE, FLAG_LONG));
    set(KGDT_R3_CMTEB, descriptor(0, 0xfff, ACCESS_R3_DATA, FLAG_BYTE));
    // KGDT_R0_LDT stays null until the kernel builds its LDT support.

    // 16-byte TSS descriptor: low half is a classic descriptor with type
    // 0x9, high half carries base bits 63:32.
    let low = descriptor(tss_va as u32, tss_limit, ACCESS_TSS64, FLAG_BYTE);
    let high = tss_va >> 32;
    set(KGDT_TSS, low);
    set(KGDT_TSS + 8, high);

    Ok(TableImage {
        va,
        limit: (NUM_GDT * 8 - 1) as u16,
    })
}

/// Builds the x86 GDT, including the PCR segment (`fs` base) and the task
/// gates for double-fault, NMI and machine-check.
///
/// # Errors
/// [`NoMemory`] when the heap is exhausted.
pub fn build_gdt_x86<P: PoolAccess>(
    heap: &mut LoaderHeap<'_, P>,
    tss_va: u32,
    tss_limit: u32,
    fault_tss_vas: [u32; 3],
) -> Result<TableImage, NoMemory> {
    let va = heap.alloc(NUM_GDT * 8, 16)?;
    let bytes = heap.bytes_mut(va, NUM_GDT * 8);
    let mut set = |selector: u16, value: u64| {
        let at = selector as usize;
        bytes[at..at + 8].copy_from_slice(&value.to_le_bytes());
    };

    use x86::selector::{
        KGDT_DF_TSS, KGDT_LDT, KGDT_MC_TSS, KGDT_NMI_TSS, KGDT_R0_CODE, KGDT_R0_DATA, KGDT_R0_PCR,
        KGDT_R3_CODE, KGDT_R3_DATA, KGDT_R3_TEB, KGDT_TSS, KGDT_VDM_TILE,
    };
    set(KGDT_R0_CODE, descriptor(0, 0xf_ffff, ACCESS_R0_CODE, FLAG_FLAT32));
    set(KGDT_R0_DATA, descriptor(0, 0xf_ffff, ACCESS_R0_DATA, FLAG_FLAT32));
    set(KGDT_R3_CODE, descriptor(0, 0xf_ffff, ACCESS_R3_CODE, FLAG_FLAT32));
    set(KGDT_R3_DATA, descriptor(0, 0xf_ffff, ACCESS_R3_DATA, FLAG_FLAT32));
    set(KGDT_TSS, descriptor(tss_va, tss_limit, ACCESS_TSS32, FLAG_BYTE));
    // The PCR segment: fs-relative addressing of the per-processor block.
    set(
        KGDT_R0_PCR,
        descriptor(x86::KIP0PCRADDRESS, 1, ACCESS_R0_DATA, FLAG_FLAT32),
    );
    set(KGDT_R3_TEB, descriptor(0, 0xfff, ACCESS_R3_DATA, FLAG_BYTE));
    set(KGDT_VDM_TILE, descriptor(0x0400, 0xffff, ACCESS_R3_DATA, FLAG_BYTE));
    set(KGDT_LDT, descriptor(0, 0, ACCESS_LDT, FLAG_BYTE));
    set(KGDT_DF_TSS, descriptor(fault_tss_vas[0], 0x67, ACCESS_TSS32, FLAG_BYTE));
    set(KGDT_NMI_TSS, descriptor(fault_tss_vas[1], 0x67, ACCESS_TSS32, FLAG_BYTE));
    set(KGDT_MC_TSS, descriptor(fault_tss_vas[2], 0x67, ACCESS_TSS32, FLAG_BYTE));

    Ok(TableImage {
        va,
        limit: (NUM_GDT * 8 - 1) as u16,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_encoding_round_trips() {
        // Flat ring-0 data segment, the classic 0x00cf92000000ffff.
        assert_eq!(
            descriptor(0, 0xf_ffff, ACCESS_R0_DATA, FLAG_FLAT32),
            0x00cf_9200_0000_ffff
        );
        // Long-mode ring-0 code: only L and access matter.
        assert_eq!(descriptor(0, 0, ACCESS_R0_CODE, FLAG_LONG), 0x0020_9a00_0000_0000);
        // Base scattering across the three fields.
        let d = descriptor(0x1234_5678, 0x67, ACCESS_TSS32, FLAG_BYTE);
        assert_eq!(d & 0xffff, 0x67);
        assert_eq!((d >> 16) & 0xff_ffff, 0x34_5678);
        assert_eq!((d >> 56) & 0xff, 0x12);
    }
}
