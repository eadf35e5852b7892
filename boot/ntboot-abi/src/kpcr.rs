//! Processor control region headers.
//!
//! The kernel expects its PCR pages pre-allocated at the architecture's
//! fixed VA and mostly rebuilds the contents itself; the loader zeroes the
//! pages and seeds the handful of header fields the early kernel reads
//! before `KiInitializeKernel` runs (self pointer, descriptor table linear
//! addresses, version numbers). Only that header is modeled; the PRCB tail
//! is an opaque run of pages.

use core::mem::{offset_of, size_of};

/// `KPCR` header, x86.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct Kpcr32 {
    pub nt_tib: [u8; 0x1c],
    pub self_pcr: u32,
    pub prcb: u32,
    pub irql: u32,
    pub irr: u32,
    pub irr_active: u32,
    pub idr: u32,
    pub kd_version_block: u32,
    pub idt: u32,
    pub gdt: u32,
    pub tss: u32,
    pub major_version: u16,
    pub minor_version: u16,
    pub set_member: u32,
    pub stall_scale_factor: u32,
    pub spare_unused: u8,
    pub number: u8,
    pub spare0: u8,
    pub second_level_cache_associativity: u8,
    pub vdm_alert: u32,
    pub kernel_reserved: [u32; 14],
    pub second_level_cache_size: u32,
    pub hal_reserved: [u32; 16],
    pub interrupt_mode: u32,
    pub spare1: u32,
    pub kernel_reserved2: [u32; 17],
    pub prcb_data: u8,
}

/// `KPCR` header, x86-64.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct Kpcr64 {
    pub nt_tib: [u8; 0x38],
    pub idt_base: u64,
    pub unused: [u64; 2],
    pub irql: u8,
    pub second_level_cache_associativity: u8,
    pub obsolete_number: u8,
    pub fill0: u8,
    pub unused0: [u32; 3],
    pub major_version: u16,
    pub minor_version: u16,
    pub stall_scale_factor: u32,
    pub unused1: [u64; 3],
    pub kernel_reserved: [u32; 15],
    pub second_level_cache_size: u32,
    pub hal_reserved: [u32; 16],
    pub unused2: u32,
    pub pad1: u32,
    pub kd_version_block: u64,
    pub unused3: u64,
    pub pcr_align1: [u32; 24],
    pub pad2: u64,
    pub prcb_data: u8,
}

impl Kpcr32 {
    /// All-zero instance; every field admits the zero bit pattern.
    #[must_use]
    pub fn zeroed() -> Self {
        // SAFETY: plain-old-data with no invalid bit patterns.
        unsafe { core::mem::zeroed() }
    }
}

impl Kpcr64 {
    /// All-zero instance; every field admits the zero bit pattern.
    #[must_use]
    pub fn zeroed() -> Self {
        // SAFETY: plain-old-data with no invalid bit patterns.
        unsafe { core::mem::zeroed() }
    }
}

const _: () = {
    assert!(offset_of!(Kpcr32, self_pcr) == 0x1c);
    assert!(offset_of!(Kpcr32, prcb) == 0x20);
    assert!(offset_of!(Kpcr32, idt) == 0x38);
    assert!(offset_of!(Kpcr32, gdt) == 0x3c);
    assert!(offset_of!(Kpcr32, tss) == 0x40);
    assert!(offset_of!(Kpcr32, major_version) == 0x44);
    assert!(offset_of!(Kpcr32, prcb_data) == 0x120);
    assert!(size_of::<Kpcr32>() == 0x124);

    assert!(offset_of!(Kpcr64, idt_base) == 0x38);
    assert!(offset_of!(Kpcr64, irql) == 0x50);
    assert!(offset_of!(Kpcr64, major_version) == 0x60);
    assert!(offset_of!(Kpcr64, kd_version_block) == 0x108);
    assert!(offset_of!(Kpcr64, prcb_data) == 0x180);
    assert!(size_of::<Kpcr64>() == 0x188);
};
