//! # Physical Memory Map
//!
//! The loader's single source of truth for physical memory: a sorted,
//! non-overlapping chain of typed page runs covering the whole inventory
//! the firmware reported. Every allocation the loader ever makes - kernel
//! image pages, page tables, the loader heap, the kernel stack - is carved
//! out of this map, and at hand-off the map itself becomes the kernel's
//! memory descriptor list, from which the PFN database is built.
//!
//! Determinism is part of the contract: allocation is first-fit upward and
//! descriptor order is strictly ascending, so the same inventory and the
//! same allocation sequence always produce the same physical layout and
//! therefore the same kernel-observable addresses.
//!
//! ```text
//! inventory ──► MemoryMap ──allocate/reclassify──► MemoryMap ──finalize──► descriptor list
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

extern crate alloc;

mod map;
#[cfg(feature = "uefi")]
mod uefi_inventory;

pub use map::{FinalizedMemoryMap, MemoryMap, MemoryMapError, MemoryRun, NoMemory};
#[cfg(feature = "uefi")]
pub use uefi_inventory::inventory_from_uefi;

pub use ntboot_abi::memory::MemoryType;
