use alloc::vec::Vec;
use core::fmt;
use log::{debug, trace};
use ntboot_abi::memory::MemoryType;
use ntboot_addresses::PageNumber;
use thiserror::Error;

/// One typed run of physical pages.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MemoryRun {
    pub base_page: PageNumber,
    pub page_count: u64,
    pub memory_type: MemoryType,
}

impl MemoryRun {
    #[must_use]
    pub const fn new(base_page: u64, page_count: u64, memory_type: MemoryType) -> Self {
        Self {
            base_page: PageNumber::new(base_page),
            page_count,
            memory_type,
        }
    }

    /// One past the last page of the run.
    #[must_use]
    pub fn end_page(&self) -> PageNumber {
        self.base_page + self.page_count
    }
}

impl fmt::Display for MemoryRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{} {:?}",
            self.base_page,
            self.end_page(),
            self.memory_type
        )
    }
}

/// Physical allocation failed: no free run satisfies the request.
#[derive(Debug, Error, Eq, PartialEq)]
#[error("out of physical memory ({pages} pages requested)")]
pub struct NoMemory {
    pub pages: u64,
}

/// Structural errors: a malformed inventory or an operation against pages
/// the map does not cover.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum MemoryMapError {
    #[error("inventory runs overlap at page {0}")]
    Overlap(PageNumber),
    #[error("zero-length run at page {0}")]
    EmptyRun(PageNumber),
    #[error("pages {0}..{1} are not covered by a single type of run")]
    NotCovered(PageNumber, PageNumber),
}

/// The mutable physical memory map.
///
/// Internally a vector ordered by `base_page`; runs never overlap. Free
/// space is explicit (`MemoryType::Free` runs), so coverage of the original
/// inventory is invariant under allocation.
#[derive(Debug)]
pub struct MemoryMap {
    runs: Vec<MemoryRun>,
}

impl MemoryMap {
    /// Builds a map from a firmware-reported inventory. Runs may arrive in
    /// any order; they must not overlap. Adjacent same-type runs are merged
    /// immediately so the starting state is canonical.
    ///
    /// # Errors
    /// [`MemoryMapError`] on overlapping or empty runs.
    pub fn new(inventory: impl IntoIterator<Item = MemoryRun>) -> Result<Self, MemoryMapError> {
        let mut runs: Vec<MemoryRun> = inventory.into_iter().collect();
        runs.sort_by_key(|r| r.base_page);

        for run in &runs {
            if run.page_count == 0 {
                return Err(MemoryMapError::EmptyRun(run.base_page));
            }
        }
        for pair in runs.windows(2) {
            if pair[0].end_page() > pair[1].base_page {
                return Err(MemoryMapError::Overlap(pair[1].base_page));
            }
        }

        let mut map = Self { runs };
        map.coalesce();
        debug!("memory map: {} runs after ingest", map.runs.len());
        Ok(map)
    }

    /// The current descriptor chain, ascending by base page.
    #[must_use]
    pub fn runs(&self) -> &[MemoryRun] {
        &self.runs
    }

    /// Total pages of a given type.
    #[must_use]
    pub fn pages_of_type(&self, memory_type: MemoryType) -> u64 {
        self.runs
            .iter()
            .filter(|r| r.memory_type == memory_type)
            .map(|r| r.page_count)
            .sum()
    }

    /// Allocates `pages` pages of `memory_type`, first-fit upward, with the
    /// base aligned to `align_pages` (a power of two; 1 for no constraint).
    ///
    /// # Errors
    /// [`NoMemory`] when no free run fits.
    pub fn allocate(
        &mut self,
        pages: u64,
        memory_type: MemoryType,
        align_pages: u64,
    ) -> Result<PageNumber, NoMemory> {
        self.allocate_bounded(pages, memory_type, align_pages, PageNumber::new(u64::MAX))
    }

    /// [`Self::allocate`] constrained so the run ends at or below
    /// `limit_page`. Used for regions that must stay reachable from
    /// real-mode or identity-mapped code.
    ///
    /// # Errors
    /// [`NoMemory`] when no free run fits below the limit.
    pub fn reserve_below(
        &mut self,
        pages: u64,
        limit_page: PageNumber,
        memory_type: MemoryType,
    ) -> Result<PageNumber, NoMemory> {
        self.allocate_bounded(pages, memory_type, 1, limit_page)
    }

    fn allocate_bounded(
        &mut self,
        pages: u64,
        memory_type: MemoryType,
        align_pages: u64,
        limit_page: PageNumber,
    ) -> Result<PageNumber, NoMemory> {
        assert!(pages > 0, "zero-page allocation");
        assert!(align_pages.is_power_of_two(), "alignment must be a power of two");

        // First fit, ascending. The kernel sees descriptor order, so the
        // scan must stay deterministic.
        for index in 0..self.runs.len() {
            let run = self.runs[index];
            if !run.memory_type.is_allocatable() {
                continue;
            }
            let base = run.base_page.align_up(align_pages);
            let skipped = base - run.base_page;
            if skipped >= run.page_count || run.page_count - skipped < pages {
                continue;
            }
            if (base + pages).as_u64() > limit_page.as_u64() {
                continue;
            }

            trace!("alloc {pages} pages of {memory_type:?} at {base}");
            self.split_and_retype(index, base, pages, memory_type);
            return Ok(base);
        }

        Err(NoMemory { pages })
    }

    /// Overwrites the type of `base..base+pages`. The range must currently
    /// be covered by exactly one run (of any type); the surrounding parts
    /// keep their old type.
    ///
    /// # Errors
    /// [`MemoryMapError::NotCovered`] when the range is not inside a single
    /// run.
    pub fn reclassify(
        &mut self,
        base: PageNumber,
        pages: u64,
        memory_type: MemoryType,
    ) -> Result<(), MemoryMapError> {
        let end = base + pages;
        let index = self
            .runs
            .iter()
            .position(|r| r.base_page <= base && end.as_u64() <= r.end_page().as_u64())
            .ok_or(MemoryMapError::NotCovered(base, end))?;
        self.split_and_retype(index, base, pages, memory_type);
        Ok(())
    }

    /// Replaces `runs[index]` with up to three runs: an untouched head, the
    /// retyped middle, an untouched tail.
    fn split_and_retype(
        &mut self,
        index: usize,
        base: PageNumber,
        pages: u64,
        memory_type: MemoryType,
    ) {
        let run = self.runs[index];
        let head = base - run.base_page;
        let tail = run.end_page() - (base + pages);

        let mut replacement = Vec::with_capacity(3);
        if head > 0 {
            replacement.push(MemoryRun {
                base_page: run.base_page,
                page_count: head,
                memory_type: run.memory_type,
            });
        }
        replacement.push(MemoryRun {
            base_page: base,
            page_count: pages,
            memory_type,
        });
        if tail > 0 {
            replacement.push(MemoryRun {
                base_page: base + pages,
                page_count: tail,
                memory_type: run.memory_type,
            });
        }
        self.runs.splice(index..=index, replacement);
    }

    fn coalesce(&mut self) {
        self.runs.dedup_by(|next, prev| {
            if prev.memory_type == next.memory_type && prev.end_page() == next.base_page {
                prev.page_count += next.page_count;
                true
            } else {
                false
            }
        });
    }

    /// Coalesces adjacent same-type runs and freezes the map. The result is
    /// what gets written out as the kernel's memory descriptor list.
    #[must_use]
    pub fn finalize(mut self) -> FinalizedMemoryMap {
        self.coalesce();
        debug!("memory map finalized: {} descriptors", self.runs.len());
        FinalizedMemoryMap { runs: self.runs }
    }
}

/// An immutable, coalesced memory map.
pub struct FinalizedMemoryMap {
    runs: Vec<MemoryRun>,
}

impl FinalizedMemoryMap {
    #[must_use]
    pub fn runs(&self) -> &[MemoryRun] {
        &self.runs
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple_map(pages: u64) -> MemoryMap {
        MemoryMap::new([MemoryRun::new(0x100, pages, MemoryType::Free)]).unwrap()
    }

    #[test]
    fn rejects_overlapping_inventory() {
        let err = MemoryMap::new([
            MemoryRun::new(0, 0x20, MemoryType::Free),
            MemoryRun::new(0x10, 0x20, MemoryType::Free),
        ])
        .unwrap_err();
        assert_eq!(err, MemoryMapError::Overlap(PageNumber::new(0x10)));
    }

    #[test]
    fn first_fit_is_upward() {
        let mut map = MemoryMap::new([
            MemoryRun::new(0x100, 0x10, MemoryType::Free),
            MemoryRun::new(0x200, 0x100, MemoryType::Free),
        ])
        .unwrap();

        // Too big for the low run, lands in the high one.
        let base = map.allocate(0x20, MemoryType::SystemCode, 1).unwrap();
        assert_eq!(base, PageNumber::new(0x200));
        // Small enough for the low run.
        let base = map.allocate(0x8, MemoryType::BootDriver, 1).unwrap();
        assert_eq!(base, PageNumber::new(0x100));
    }

    #[test]
    fn allocation_splits_free_runs() {
        let mut map = simple_map(0x100);
        let base = map.allocate(0x10, MemoryType::OsloaderHeap, 1).unwrap();
        assert_eq!(base, PageNumber::new(0x100));
        assert_eq!(
            map.runs(),
            &[
                MemoryRun::new(0x100, 0x10, MemoryType::OsloaderHeap),
                MemoryRun::new(0x110, 0xf0, MemoryType::Free),
            ]
        );
    }

    #[test]
    fn alignment_leaves_a_free_head() {
        let mut map = MemoryMap::new([MemoryRun::new(0x101, 0x40, MemoryType::Free)]).unwrap();
        let base = map.allocate(0x10, MemoryType::StartupKernelStack, 0x10).unwrap();
        assert_eq!(base, PageNumber::new(0x110));
        assert_eq!(map.runs()[0], MemoryRun::new(0x101, 0xf, MemoryType::Free));
    }

    #[test]
    fn reserve_below_respects_the_limit() {
        let mut map = MemoryMap::new([
            MemoryRun::new(0x90, 0x10, MemoryType::Free),
            MemoryRun::new(0x1000, 0x100, MemoryType::Free),
        ])
        .unwrap();
        let base = map
            .reserve_below(0x10, PageNumber::new(0x100), MemoryType::FirmwareTemporary)
            .unwrap();
        assert_eq!(base, PageNumber::new(0x90));
        // Nothing below the limit is left.
        assert!(
            map.reserve_below(0x10, PageNumber::new(0x100), MemoryType::FirmwareTemporary)
                .is_err()
        );
    }

    #[test]
    fn reclassify_splits_partial_runs() {
        let mut map = simple_map(0x100);
        map.reclassify(PageNumber::new(0x140), 0x20, MemoryType::Bad)
            .unwrap();
        assert_eq!(
            map.runs(),
            &[
                MemoryRun::new(0x100, 0x40, MemoryType::Free),
                MemoryRun::new(0x140, 0x20, MemoryType::Bad),
                MemoryRun::new(0x160, 0xa0, MemoryType::Free),
            ]
        );
    }

    #[test]
    fn reclassify_outside_coverage_fails() {
        let mut map = simple_map(0x10);
        assert!(
            map.reclassify(PageNumber::new(0x108), 0x10, MemoryType::Bad)
                .is_err()
        );
    }

    #[test]
    fn finalize_coalesces_adjacent_same_type() {
        let mut map = simple_map(0x100);
        let a = map.allocate(0x10, MemoryType::BootDriver, 1).unwrap();
        let b = map.allocate(0x10, MemoryType::BootDriver, 1).unwrap();
        assert_eq!(b, a + 0x10);
        let done = map.finalize();
        assert_eq!(
            done.runs(),
            &[
                MemoryRun::new(0x100, 0x20, MemoryType::BootDriver),
                MemoryRun::new(0x120, 0xe0, MemoryType::Free),
            ]
        );
    }

    /// Coverage invariant over randomized inventories and allocations: the
    /// union of runs never changes, stays sorted and never overlaps.
    #[test]
    fn randomized_inventories_stay_covered() {
        // xorshift64*; fixed seed keeps failures reproducible.
        let mut state = 0x9e37_79b9_7f4a_7c15_u64;
        let mut next = move || {
            state ^= state >> 12;
            state ^= state << 25;
            state ^= state >> 27;
            state = state.wrapping_mul(0x2545_f491_4f6c_dd1d);
            state
        };

        for _ in 0..64 {
            // Random disjoint inventory of up to 8 runs.
            let mut base = 0u64;
            let mut inventory = Vec::new();
            let mut total = 0u64;
            for _ in 0..(next() % 8 + 1) {
                base += next() % 0x100 + 1;
                let count = next() % 0x200 + 1;
                let memory_type = if next() % 8 == 0 {
                    MemoryType::FirmwarePermanent
                } else {
                    MemoryType::Free
                };
                inventory.push(MemoryRun::new(base, count, memory_type));
                total += count;
                base += count;
            }
            let mut map = MemoryMap::new(inventory).unwrap();

            // Random allocations until exhaustion or 32 attempts.
            for _ in 0..32 {
                let pages = next() % 0x40 + 1;
                let memory_type = match next() % 3 {
                    0 => MemoryType::SystemCode,
                    1 => MemoryType::BootDriver,
                    _ => MemoryType::OsloaderHeap,
                };
                let align = 1 << (next() % 3);
                let _ = map.allocate(pages, memory_type, align);
            }

            let done = map.finalize();
            let runs = done.runs();
            let covered: u64 = runs.iter().map(|r| r.page_count).sum();
            assert_eq!(covered, total, "pages appeared or vanished");
            for pair in runs.windows(2) {
                assert!(pair[0].end_page() <= pair[1].base_page, "overlap or disorder");
                // Coalescing happened: no two adjacent runs share a type.
                assert!(
                    pair[0].end_page() < pair[1].base_page
                        || pair[0].memory_type != pair[1].memory_type,
                    "uncoalesced neighbors"
                );
            }
        }
    }
}
