//! # Kernel Hand-Off Orchestration
//!
//! The top of the stack: everything between "the shim handed us a parsed
//! boot configuration and a memory inventory" and "execution is inside
//! `ntoskrnl.exe` and never coming back".
//!
//! ```text
//!  boot config ─┐
//!  inventory ───┤                                  ┌─► GDT/IDT/PCR
//!               ▼                                  │
//!        ┌─ DependencyResolver ─► module lists ─┐  │
//!        │       (drivers)                      ▼  │
//!  files ┘                              StructBuilder ─► parameter block
//!                                            (blocks)        │
//!  MemoryMap ──► LoaderHeap/KernelSpacePlan ─► page tables ───┤
//!                   (heap/space)     (ntboot-vmem)            ▼
//!                                                    HandoffSequencer
//!                                                      (sequence)
//! ```
//!
//! The module split follows the phases:
//!
//! | Module | Phase |
//! |--------|-------|
//! | [`inputs`] | collaborator-provided boot configuration |
//! | [`heap`] / [`space`] | loader pool and kernel VA planning |
//! | [`config`] | ARC configuration component tree |
//! | [`arcdisks`] | ARC disk signature list |
//! | [`entropy`] | boot entropy assembly |
//! | [`blocks`] | parameter block + extension construction |
//! | [`drivers`] | kernel/HAL/boot-driver loading and linking |
//! | [`gdt`] / [`idt`] | descriptor table construction |
//! | [`sequence`] | the seven hand-off steps |
//!
//! Everything before the page-table switch reports failure as
//! [`LoaderError`] and unwinds to the shim for diagnostics; afterwards the
//! only escape hatch is a checkpoint byte on the POST port.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

extern crate alloc;

pub mod arcdisks;
pub mod blocks;
pub mod config;
pub mod drivers;
pub mod entropy;
pub mod gdt;
pub mod heap;
pub mod idt;
pub mod inputs;
pub mod sequence;
pub mod space;

#[cfg(test)]
mod scenarios;

use ntboot_mmap::{MemoryMapError, NoMemory};
use ntboot_pe::PeError;
use ntboot_vmem::MapError;
use ntboot_winver::UnsupportedVersion;
use thiserror::Error;

/// Umbrella error for every failure before the point of no return.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The target kernel build has no known loader contract.
    #[error(transparent)]
    UnsupportedVersion(#[from] UnsupportedVersion),
    /// A required image failed to parse, relocate or link.
    #[error(transparent)]
    Image(#[from] PeError),
    /// The physical pool is exhausted.
    #[error(transparent)]
    NoMemory(#[from] NoMemory),
    /// The physical inventory is malformed.
    #[error(transparent)]
    MemoryMap(#[from] MemoryMapError),
    /// Page-table construction failed.
    #[error(transparent)]
    Map(#[from] MapError),
    /// A required file could not be read from the boot volume.
    #[error("unreadable boot file {0}")]
    UnreadableFile(alloc::string::String),
    /// A string input cannot be represented in the target encoding.
    #[error("invalid string encoding")]
    InvalidStringEncoding,
    /// EFI firmware information is required for this version but missing.
    #[error("firmware information mismatch")]
    FirmwareInfoMismatch,
    /// A firmware service returned an error before hand-off.
    #[error("firmware failure: {0}")]
    FirmwareFailure(&'static str),
}

/// Access to pool (physical) memory from loader code.
///
/// In a real boot this is the identity map; under test it is a simulated
/// arena. Interior mutability by design: the loader hands out many disjoint
/// views while building.
pub trait PoolAccess {
    /// Mutable view of `len` bytes at physical `at`.
    ///
    /// Callers must keep their views disjoint; the trait does not police
    /// aliasing.
    #[allow(clippy::mut_from_ref)]
    fn slice_mut(&self, at: ntboot_addresses::PhysicalAddress, len: usize) -> &mut [u8];
}
