use bitfield_struct::bitfield;

/// CR0: the bits the hand-off cares about are PG (bit 31) and WP (bit 16);
/// reserved bits are modeled so a read-modify-write round-trips cleanly.
#[bitfield(u64)]
pub struct Cr0 {
    /// PE: protected mode enable.
    pub protection_enable: bool,
    /// MP: monitor coprocessor.
    pub monitor_coprocessor: bool,
    /// EM: x87 emulation.
    pub emulation: bool,
    /// TS: task switched.
    pub task_switched: bool,
    /// ET: extension type (reads as 1 on anything modern).
    pub extension_type: bool,
    /// NE: native x87 error reporting.
    pub numeric_error: bool,
    #[bits(10)]
    __: u16,
    /// WP: supervisor write protection. NT requires this set on entry.
    pub write_protect: bool,
    __: bool,
    /// AM: alignment mask.
    pub alignment_mask: bool,
    #[bits(10)]
    __: u16,
    /// NW: not write-through.
    pub not_write_through: bool,
    /// CD: cache disable.
    pub cache_disable: bool,
    /// PG: paging enable. The point of no return.
    pub paging: bool,
    #[bits(32)]
    __: u32,
}

#[cfg(all(feature = "asm", any(target_arch = "x86", target_arch = "x86_64")))]
mod asm {
    use super::Cr0;
    use crate::{LoadRegister, StoreRegister};

    impl LoadRegister for Cr0 {
        unsafe fn load() -> Self {
            let bits: u64;
            #[cfg(target_arch = "x86_64")]
            unsafe {
                core::arch::asm!("mov {}, cr0", out(reg) bits, options(nomem, nostack, preserves_flags));
            }
            #[cfg(target_arch = "x86")]
            unsafe {
                let low: u32;
                core::arch::asm!("mov {}, cr0", out(reg) low, options(nomem, nostack, preserves_flags));
                bits = u64::from(low);
            }
            Self::from_bits(bits)
        }
    }

    impl StoreRegister for Cr0 {
        unsafe fn store(self) {
            let bits = self.into_bits();
            #[cfg(target_arch = "x86_64")]
            unsafe {
                core::arch::asm!("mov cr0, {}", in(reg) bits, options(nostack, preserves_flags));
            }
            #[cfg(target_arch = "x86")]
            unsafe {
                core::arch::asm!("mov cr0, {}", in(reg) bits as u32, options(nostack, preserves_flags));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Cr0;

    #[test]
    fn paging_and_write_protect_bits() {
        let cr0 = Cr0::new().with_paging(true).with_write_protect(true);
        assert_eq!(cr0.into_bits(), (1 << 31) | (1 << 16));
    }
}
