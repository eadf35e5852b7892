//! # Checkpoint Bytes on the POST Diagnostic Port
//!
//! Past the page-table switch there is no console, no firmware and no way
//! to report an error. What remains is I/O port 0x80, latched by chipset
//! POST readers and by QEMU's `-debugcon`. Each hand-off step writes its
//! checkpoint byte before executing, so a wedged boot leaves the last
//! completed step visible on the reader.
//!
//! With the `enabled` feature off (or on a non-x86 host, e.g. under test)
//! every call is a no-op.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]
#![cfg_attr(not(feature = "enabled"), allow(unused_variables))]

/// The ISA POST code port.
pub const POST_PORT: u16 = 0x80;

/// Latch a checkpoint byte on the POST port.
#[inline]
pub fn checkpoint(code: u8) {
    #[cfg(all(feature = "enabled", any(target_arch = "x86", target_arch = "x86_64")))]
    // SAFETY: port 0x80 is write-only scratch on every PC-compatible
    // chipset; the write has no architectural side effects.
    unsafe {
        core::arch::asm!(
            "out dx, al",
            in("dx") POST_PORT,
            in("al") code,
            options(nomem, preserves_flags),
        );
    }
}

/// Latch a checkpoint and halt forever. For failures past the point where
/// control can still be returned to the firmware.
#[inline]
pub fn fail_fast(code: u8) -> ! {
    checkpoint(code);
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    loop {
        // SAFETY: interrupts are disabled at every call site; hlt simply
        // parks the processor.
        unsafe {
            core::arch::asm!("hlt", options(nomem, nostack, preserves_flags));
        }
    }
    #[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
    loop {
        core::hint::spin_loop();
    }
}
