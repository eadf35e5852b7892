//! # Typed Control Registers
//!
//! Bitfield models of the control and extended-feature registers the
//! hand-off sequence touches, with load/store intrinsics behind the `asm`
//! feature. The loader flips exactly four switches on the way into the
//! kernel: CR3 (root table), CR4.PAE/PGE, EFER.LME/NXE, and CR0.PG/WP.
//! Everything else is left as the firmware set it.
//!
//! The register *values* can be constructed and inspected on any host;
//! only `load`/`store` require a privileged x86 execution environment.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

pub mod cr0;
pub mod cr3;
pub mod cr4;
pub mod efer;

pub use cr0::Cr0;
pub use cr3::Cr3;
pub use cr4::Cr4;
pub use efer::Efer;

/// Read a privileged register.
pub trait LoadRegister: Sized {
    /// # Safety
    /// Requires ring 0 on a target where the register exists.
    unsafe fn load() -> Self;
}

/// Write a privileged register.
pub trait StoreRegister {
    /// # Safety
    /// Requires ring 0; the caller is responsible for the architectural
    /// consequences (TLB flushes, paging-mode changes, faults on invalid
    /// combinations).
    unsafe fn store(self);
}
