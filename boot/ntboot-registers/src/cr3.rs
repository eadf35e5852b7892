use bitfield_struct::bitfield;
use ntboot_addresses::PhysicalAddress;

/// CR3: physical base of the root translation table (PML4, PAE PDPT, or
/// plain page directory depending on mode), plus the PWT/PCD cache bits.
#[bitfield(u64)]
pub struct Cr3 {
    #[bits(3)]
    __: u8,
    /// PWT: write-through accesses to the root table.
    pub write_through: bool,
    /// PCD: uncached accesses to the root table.
    pub cache_disable: bool,
    #[bits(7)]
    __: u8,
    /// Bits 12..51: root table physical base >> 12.
    #[bits(40)]
    root_base_4k: u64,
    #[bits(12)]
    __: u16,
}

impl Cr3 {
    /// Builds a CR3 value from a 4 KiB-aligned root table base.
    #[must_use]
    pub fn from_root(root: PhysicalAddress) -> Self {
        debug_assert_eq!(root.as_u64() & 0xfff, 0, "root table must be 4K-aligned");
        Self::new().with_root_base_4k(root.as_u64() >> 12)
    }

    /// Physical base of the root table.
    #[must_use]
    pub fn root(&self) -> PhysicalAddress {
        PhysicalAddress::new(self.root_base_4k() << 12)
    }
}

#[cfg(all(feature = "asm", any(target_arch = "x86", target_arch = "x86_64")))]
mod asm {
    use super::Cr3;
    use crate::{LoadRegister, StoreRegister};

    impl LoadRegister for Cr3 {
        unsafe fn load() -> Self {
            let bits: u64;
            #[cfg(target_arch = "x86_64")]
            unsafe {
                core::arch::asm!("mov {}, cr3", out(reg) bits, options(nomem, nostack, preserves_flags));
            }
            #[cfg(target_arch = "x86")]
            unsafe {
                let low: u32;
                core::arch::asm!("mov {}, cr3", out(reg) low, options(nomem, nostack, preserves_flags));
                bits = u64::from(low);
            }
            Self::from_bits(bits)
        }
    }

    impl StoreRegister for Cr3 {
        unsafe fn store(self) {
            let bits = self.into_bits();
            #[cfg(target_arch = "x86_64")]
            unsafe {
                core::arch::asm!("mov cr3, {}", in(reg) bits, options(nostack, preserves_flags));
            }
            #[cfg(target_arch = "x86")]
            unsafe {
                core::arch::asm!("mov cr3, {}", in(reg) bits as u32, options(nostack, preserves_flags));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Cr3;
    use ntboot_addresses::PhysicalAddress;

    #[test]
    fn root_round_trips() {
        let cr3 = Cr3::from_root(PhysicalAddress::new(0x1ab_f000));
        assert_eq!(cr3.root().as_u64(), 0x1ab_f000);
        assert_eq!(cr3.into_bits(), 0x1ab_f000);
    }
}
