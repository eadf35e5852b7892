use bitfield_struct::bitfield;

/// CR4: the hand-off sets PAE before enabling paging on PAE x86 and on
/// x86-64, and PGE so the kernel's global mappings survive CR3 reloads.
#[bitfield(u64)]
pub struct Cr4 {
    /// VME: virtual-8086 extensions.
    pub v8086_extensions: bool,
    /// PVI: protected-mode virtual interrupts.
    pub virtual_interrupts: bool,
    /// TSD: restrict RDTSC to ring 0.
    pub timestamp_disable: bool,
    /// DE: debugging extensions.
    pub debugging_extensions: bool,
    /// PSE: 4 MiB pages in non-PAE mode.
    pub page_size_extensions: bool,
    /// PAE: physical address extension (3-level x86 / prerequisite for
    /// long mode).
    pub physical_address_extension: bool,
    /// MCE: machine check enable.
    pub machine_check: bool,
    /// PGE: global page enable.
    pub global_pages: bool,
    /// PCE: performance counter enable.
    pub performance_counter: bool,
    /// OSFXSR: SSE context instructions enabled.
    pub os_fxsave: bool,
    /// OSXMMEXCPT: unmasked SSE exceptions.
    pub os_xmm_exceptions: bool,
    #[bits(53)]
    __: u64,
}

#[cfg(all(feature = "asm", any(target_arch = "x86", target_arch = "x86_64")))]
mod asm {
    use super::Cr4;
    use crate::{LoadRegister, StoreRegister};

    impl LoadRegister for Cr4 {
        unsafe fn load() -> Self {
            let bits: u64;
            #[cfg(target_arch = "x86_64")]
            unsafe {
                core::arch::asm!("mov {}, cr4", out(reg) bits, options(nomem, nostack, preserves_flags));
            }
            #[cfg(target_arch = "x86")]
            unsafe {
                let low: u32;
                core::arch::asm!("mov {}, cr4", out(reg) low, options(nomem, nostack, preserves_flags));
                bits = u64::from(low);
            }
            Self::from_bits(bits)
        }
    }

    impl StoreRegister for Cr4 {
        unsafe fn store(self) {
            let bits = self.into_bits();
            #[cfg(target_arch = "x86_64")]
            unsafe {
                core::arch::asm!("mov cr4, {}", in(reg) bits, options(nostack, preserves_flags));
            }
            #[cfg(target_arch = "x86")]
            unsafe {
                core::arch::asm!("mov cr4, {}", in(reg) bits as u32, options(nostack, preserves_flags));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Cr4;

    #[test]
    fn pae_and_global_bits() {
        let cr4 = Cr4::new()
            .with_physical_address_extension(true)
            .with_global_pages(true);
        assert_eq!(cr4.into_bits(), (1 << 5) | (1 << 7));
    }
}
