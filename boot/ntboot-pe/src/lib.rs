//! # PE Image Loading
//!
//! Parses and places the PE32/PE32+ images the kernel world is made of:
//! `ntoskrnl.exe`, `hal.dll` and the boot-start drivers. The crate is pure
//! byte manipulation - the caller allocates the destination pages and hands
//! in a mutable slice, which keeps every code path exercisable on a hosted
//! test run.
//!
//! The pipeline per image:
//!
//! 1. [`parse_headers`] - validate signatures, machine and size caps,
//!    collect section and data-directory info.
//! 2. [`load`] - copy headers and sections into the destination, zeroing
//!    section tails, and apply base relocations when the chosen base
//!    differs from the linked `ImageBase`.
//! 3. [`exports::ExportTable`] / [`imports`] - bind the import address
//!    tables against previously loaded images.
//!
//! Anything malformed fails with [`PeError::BadImage`] naming the check
//! that tripped; an image is never partially trusted.

#![cfg_attr(not(any(test, doctest)), no_std)]

extern crate alloc;

pub mod exports;
pub mod headers;
pub mod imports;
pub mod load;

pub use exports::ExportTable;
pub use headers::{Machine, PeHeaders, SectionHeader, parse_headers};
pub use imports::{ImportRef, resolve_imports};
pub use load::load;

use alloc::string::String;
use thiserror::Error;

/// Largest `SizeOfImage` the loader will place. Nothing legitimate in the
/// boot path comes anywhere close.
pub const MAX_IMAGE_SIZE: u32 = 0x1000_0000;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum PeError {
    /// Header or section validation failed; the image is not loadable.
    #[error("bad PE image: {0}")]
    BadImage(&'static str),
    /// An unsupported relocation kind was encountered.
    #[error("unsupported relocation type {0:#x}")]
    BadRelocation(u16),
    /// An import could not be bound against any loaded exporter.
    #[error("unresolved import {dll}!{symbol}")]
    MissingExport { dll: String, symbol: String },
}
