/// Base page granularity of every supported target.
pub const PAGE_SIZE: u64 = 4096;

/// log2 of [`PAGE_SIZE`].
pub const PAGE_SHIFT: u32 = 12;

/// Marker trait for the page granularities the paging hardware understands.
///
/// Implemented by [`Size4K`], [`Size2M`] and [`Size1G`]. The `SHIFT`/`SIZE`
/// constants drive alignment checks and index math in the page-table
/// builders; the marker types keep 2 MiB bookkeeping from leaking into 4 KiB
/// code paths at compile time.
pub trait PageSize: Copy + Eq {
    /// Page size in bytes.
    const SIZE: u64;
    /// log2 of `SIZE`.
    const SHIFT: u32;
}

/// 4 KiB page (leaf PTE on every level scheme).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Size4K;

/// 2 MiB page (PDE leaf with PS set; 4 MiB on non-PAE x86, see `ntboot-vmem`).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Size2M;

/// 1 GiB page (PDPTE leaf with PS set; x86-64 only).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Size1G;

impl PageSize for Size4K {
    const SIZE: u64 = 1 << 12;
    const SHIFT: u32 = 12;
}

impl PageSize for Size2M {
    const SIZE: u64 = 1 << 21;
    const SHIFT: u32 = 21;
}

impl PageSize for Size1G {
    const SIZE: u64 = 1 << 30;
    const SHIFT: u32 = 30;
}
