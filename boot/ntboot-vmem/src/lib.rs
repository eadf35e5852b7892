//! # Kernel Address Space Construction
//!
//! Builds the page tables the kernel runs on from the moment CR3 is loaded:
//! a 4-level tree on x86-64, a 2-level or PAE 3-level tree on x86, each with
//! the kernel-side **self-map** installed so the kernel can edit its own
//! tables through ordinary loads and stores.
//!
//! Construction is pure data manipulation through two small traits:
//!
//! * [`FrameAlloc`] hands out zeroed 4 KiB frames (the loader backs this
//!   with `LoaderMemoryData`-typed pool pages);
//! * [`PhysMapper`] turns a physical address into a usable pointer (the
//!   loader's identity map in real boots, a simulated arena under test).
//!
//! Nothing here touches CR3; [`AddressSpace64::freeze`] and friends only
//! *return* the root physical address. The hand-off sequencer owns the
//! moment it gets written, because the instruction after that write must
//! still fetch - which is why identity mappings for the loader's own code
//! are part of every space built here.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

#[cfg(any(test, feature = "fixtures"))]
extern crate alloc;

pub mod entry;
#[cfg(any(test, feature = "fixtures"))]
pub mod sim;
pub mod x64;
pub mod x86;

pub use entry::PageEntry64;
pub use x64::AddressSpace64;
pub use x86::{AddressSpace32, PagingMode32};

use ntboot_addresses::{PhysicalAddress, VirtualAddress};
use thiserror::Error;

/// Allocator for page-table frames. Frames must be 4 KiB aligned and
/// zeroed.
pub trait FrameAlloc {
    fn alloc_table(&mut self) -> Option<PhysicalAddress>;
}

/// Turns physical addresses into usable pointers in the *loader's* current
/// address space.
pub trait PhysMapper {
    /// # Safety
    /// `at` must be backed by readable/writable memory for a `T`, mapped
    /// for the duration of the borrow, and not aliased as a different type.
    unsafe fn phys_to_mut<T>(&self, at: PhysicalAddress) -> &mut T;
}

/// Attributes of one mapping, mirroring the architectural leaf bits.
#[derive(Copy, Clone, Debug)]
pub struct MapAttributes {
    pub writable: bool,
    pub user: bool,
    pub write_through: bool,
    pub cache_disabled: bool,
    pub no_execute: bool,
    pub global: bool,
}

impl MapAttributes {
    /// Kernel read/write data: writable, global, NX.
    #[must_use]
    pub const fn kernel_data() -> Self {
        Self {
            writable: true,
            user: false,
            write_through: false,
            cache_disabled: false,
            no_execute: true,
            global: true,
        }
    }

    /// Kernel code: read-execute, global.
    #[must_use]
    pub const fn kernel_code() -> Self {
        Self {
            writable: false,
            user: false,
            write_through: false,
            cache_disabled: false,
            no_execute: false,
            global: true,
        }
    }

    /// Loaded PE image pages: writable and executable. The kernel applies
    /// per-section protection itself once it owns the tables.
    #[must_use]
    pub const fn kernel_image() -> Self {
        Self {
            writable: true,
            user: false,
            write_through: false,
            cache_disabled: false,
            no_execute: false,
            global: true,
        }
    }

    /// Identity-mapped loader region: writable and executable, not global
    /// (it disappears with the first kernel CR3 reload).
    #[must_use]
    pub const fn loader_transition() -> Self {
        Self {
            writable: true,
            user: false,
            write_through: false,
            cache_disabled: false,
            no_execute: false,
            global: false,
        }
    }
}

/// Mapping failures.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum MapError {
    #[error("out of page-table frames")]
    OutOfFrames,
    #[error("address {0} not aligned to the requested page size")]
    Misaligned(VirtualAddress),
    #[error("{0} is already mapped")]
    AlreadyMapped(VirtualAddress),
}

/// Translation failures.
#[derive(Debug, Error, Eq, PartialEq)]
#[error("{0} is not mapped")]
pub struct Unmapped(pub VirtualAddress);
