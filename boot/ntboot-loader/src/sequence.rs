//! The hand-off sequence.
//!
//! Seven steps stand between a fully built loader world and the kernel:
//!
//! 1. descriptor tables (GDT + TSS),
//! 2. the early IDT,
//! 3. the startup kernel stack,
//! 4. page-table freeze and CR3,
//! 5. paging-mode bits (CR4.PAE / EFER.LME+NXE),
//! 6. CR0.PG | CR0.WP,
//! 7. the jump, parameter block pointer in the entry register/slot.
//!
//! [`prepare`] performs steps 1–3 and constructs everything step 4 will
//! switch to; any failure there unwinds as [`LoaderError`] while the
//! firmware console still exists. [`transfer`] performs 4–7 and cannot
//! fail observably - each step latches a checkpoint byte on the POST port
//! first, so a hang is attributable from the outside.
//!
//! Firmware handles must be closed and boot services exited before
//! [`transfer`]; interrupts stay off from the first instruction of step 4
//! until the kernel re-enables them.

use crate::blocks::{BuiltBlock, list_append};
use crate::drivers::ModuleWorld;
use crate::gdt::{TableImage, build_gdt_x64, build_gdt_x86};
use crate::heap::LoaderHeap;
use crate::idt::{build_idt_x64, build_idt_x86};
use crate::space::KernelSpacePlan;
use crate::{LoaderError, PoolAccess};
use core::mem::size_of;
use log::info;
use ntboot_abi::kpcr::{Kpcr32, Kpcr64};
use ntboot_abi::list::{ListEntry32, ListEntry64};
use ntboot_abi::memory::{MemoryDescriptor32, MemoryDescriptor64};
use ntboot_abi::x86::KIP0PCRADDRESS;
use ntboot_addresses::{PAGE_SHIFT, PAGE_SIZE, PhysicalAddress, VirtualAddress};
use ntboot_mmap::{FinalizedMemoryMap, MemoryMap, MemoryType};
use ntboot_pe::Machine;
use ntboot_vmem::{
    AddressSpace32, AddressSpace64, FrameAlloc, MapAttributes, PagingMode32, PhysMapper,
};

/// POST-port checkpoints for the unrecoverable stretch.
pub mod checkpoint {
    /// About to load CR3 (step 4).
    pub const PAGE_TABLES: u8 = 0xb4;
    /// About to set the paging-mode bits (step 5).
    pub const MODE_BITS: u8 = 0xb5;
    /// About to set CR0.PG|WP (step 6).
    pub const PAGING_ON: u8 = 0xb6;
    /// About to jump to the kernel (step 7).
    pub const KERNEL_JUMP: u8 = 0xb7;
}

/// Paging scheme for the hand-off.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PagingChoice {
    FourLevel,
    X86(PagingMode32),
}

/// Tunables with defaults that match what NT kernels expect.
#[derive(Copy, Clone, Debug)]
pub struct HandoffConfig {
    /// Low identity-mapped pages covering the loader's own code and stack
    /// across the CR3 write.
    pub identity_pages: u64,
    /// Startup kernel stack size in pages.
    pub kernel_stack_pages: u64,
    /// Frames reserved for page-table construction.
    pub page_table_frames: u64,
    pub paging: PagingChoice,
}

impl HandoffConfig {
    #[must_use]
    pub const fn x64_default() -> Self {
        Self {
            identity_pages: 0x200,
            kernel_stack_pages: 8,
            page_table_frames: 0x200,
            paging: PagingChoice::FourLevel,
        }
    }

    #[must_use]
    pub const fn x86_default(mode: PagingMode32) -> Self {
        Self {
            identity_pages: 0x200,
            kernel_stack_pages: 4,
            page_table_frames: 0x100,
            paging: PagingChoice::X86(mode),
        }
    }
}

/// Everything step 4 onward needs, fully constructed and immutable.
pub struct PreparedHandoff {
    pub arch: Machine,
    pub paging: PagingChoice,
    /// Physical root table address for CR3.
    pub cr3: PhysicalAddress,
    pub kernel_entry: u64,
    pub block_va: u64,
    pub stack_top: u64,
    pub gdt: TableImage,
    pub idt: TableImage,
    pub pcr_va: u64,
}

/// [`PhysMapper`] over a [`PoolAccess`].
struct PoolMapper<'p, P: PoolAccess>(&'p P);

impl<P: PoolAccess> PhysMapper for PoolMapper<'_, P> {
    unsafe fn phys_to_mut<T>(&self, at: PhysicalAddress) -> &mut T {
        let bytes = self.0.slice_mut(at, size_of::<T>());
        // SAFETY: caller contract of `PhysMapper` plus `PoolAccess` bounds
        // checking.
        unsafe { &mut *bytes.as_mut_ptr().cast::<T>() }
    }
}

/// Frame allocator over a pre-carved run of `LoaderMemoryData` pages, so
/// table construction cannot disturb the already-finalized memory map.
pub struct PoolFrameAlloc<'p, P: PoolAccess> {
    pool: &'p P,
    next: PhysicalAddress,
    end: PhysicalAddress,
}

impl<'p, P: PoolAccess> PoolFrameAlloc<'p, P> {
    /// Carves `frames` pages out of `map` for page tables.
    ///
    /// # Errors
    /// [`LoaderError::NoMemory`] when the pool cannot supply the run.
    pub fn new(map: &mut MemoryMap, pool: &'p P, frames: u64) -> Result<Self, LoaderError> {
        let base = map.allocate(frames, MemoryType::MemoryData, 1)?;
        let next = base.base();
        Ok(Self {
            pool,
            next,
            end: next + (frames << PAGE_SHIFT),
        })
    }
}

impl<P: PoolAccess> FrameAlloc for PoolFrameAlloc<'_, P> {
    fn alloc_table(&mut self) -> Option<PhysicalAddress> {
        if self.next.as_u64() >= self.end.as_u64() {
            return None;
        }
        let at = self.next;
        self.pool.slice_mut(at, PAGE_SIZE as usize).fill(0);
        self.next += PAGE_SIZE;
        Some(at)
    }
}

/// Writes the finalized memory map into the heap as the kernel's
/// descriptor chain.
fn emit_memory_descriptors<P: PoolAccess>(
    heap: &mut LoaderHeap<'_, P>,
    built: &BuiltBlock,
    finalized: &FinalizedMemoryMap,
) -> Result<(), LoaderError> {
    macro_rules! emit {
        ($descriptor:ty, $list:ty, $base:ty) => {
            for run in finalized.runs() {
                let va = heap.place::<$descriptor>()?;
                let descriptor = heap.at_mut::<$descriptor>(va);
                descriptor.memory_type = run.memory_type as u32;
                descriptor.base_page = run.base_page.as_u64() as $base;
                descriptor.page_count = run.page_count as $base;
                list_append::<$list, P>(heap, built.memory_descriptor_head, va);
            }
        };
    }
    match built.arch {
        Machine::X64 => emit!(MemoryDescriptor64, ListEntry64, u64),
        Machine::X86 => emit!(MemoryDescriptor32, ListEntry32, u32),
    }
    Ok(())
}

/// Steps 1–3 plus page-table construction. Consumes the memory map (its
/// finalized form becomes kernel property) and returns the switch package.
///
/// # Errors
/// [`LoaderError`]; at this point the firmware console still works and the
/// shim can report.
#[allow(clippy::too_many_lines)]
pub fn prepare<P: PoolAccess>(
    mut map: MemoryMap,
    mut plan: KernelSpacePlan,
    heap: &mut LoaderHeap<'_, P>,
    pool: &P,
    built: &BuiltBlock,
    world: &ModuleWorld,
    config: HandoffConfig,
) -> Result<PreparedHandoff, LoaderError> {
    let arch = built.arch;
    let mapper = PoolMapper(pool);

    // Step 1: GDT and TSS.
    info!("handoff 1/7: descriptor tables");
    let (gdt, tss_va) = match arch {
        Machine::X64 => {
            let tss_va = heap.alloc(0x68, 16)?;
            (build_gdt_x64(heap, tss_va, 0x67)?, tss_va)
        }
        Machine::X86 => {
            let tss_va = heap.alloc(0x68, 16)?;
            let mut fault_tss = [0u32; 3];
            for slot in &mut fault_tss {
                *slot = heap.alloc(0x68, 16)? as u32;
            }
            (build_gdt_x86(heap, tss_va as u32, 0x67, fault_tss)?, tss_va)
        }
    };

    // Step 2: the early IDT, every gate at the kernel's entry stub.
    info!("handoff 2/7: interrupt table");
    let idt = match arch {
        Machine::X64 => build_idt_x64(heap, world.kernel.entry_va)?,
        Machine::X86 => build_idt_x86(heap, world.kernel.entry_va as u32)?,
    };

    // The PCR: zeroed pages at the architectural location, seeded with the
    // descriptor-table addresses the early kernel reads.
    let pcr_pages = match arch {
        Machine::X64 => ntboot_abi::x64::PCR_PAGES,
        Machine::X86 => ntboot_abi::x86::PCR_PAGES,
    };
    let pcr_base = map.allocate(pcr_pages, MemoryType::StartupPcrPage, 1)?;
    let pcr_phys = pcr_base.base();
    let pcr_va = match arch {
        Machine::X64 => plan.reserve_mapped(pcr_phys, pcr_pages, MapAttributes::kernel_data()),
        Machine::X86 => {
            let va = u64::from(KIP0PCRADDRESS);
            plan.record(va, pcr_phys, pcr_pages, MapAttributes::kernel_data());
            va
        }
    };
    pool.slice_mut(pcr_phys, (pcr_pages << PAGE_SHIFT) as usize).fill(0);
    match arch {
        Machine::X64 => {
            // SAFETY: freshly zeroed PCR pages, exclusively ours.
            let pcr = unsafe { mapper.phys_to_mut::<Kpcr64>(pcr_phys) };
            pcr.idt_base = idt.va;
            pcr.major_version = 1;
            pcr.minor_version = 1;
        }
        Machine::X86 => {
            // SAFETY: as above.
            let pcr = unsafe { mapper.phys_to_mut::<Kpcr32>(pcr_phys) };
            pcr.self_pcr = pcr_va as u32;
            pcr.prcb = pcr_va as u32 + core::mem::offset_of!(Kpcr32, prcb_data) as u32;
            pcr.idt = idt.va as u32;
            pcr.gdt = gdt.va as u32;
            pcr.tss = tss_va as u32;
            pcr.major_version = 1;
            pcr.minor_version = 1;
        }
    }

    // Step 3: the startup kernel stack, top recorded in the block.
    info!("handoff 3/7: kernel stack");
    let stack_base = map.allocate(config.kernel_stack_pages, MemoryType::StartupKernelStack, 1)?;
    let stack_phys = stack_base.base();
    let stack_va = plan.reserve_mapped(
        stack_phys,
        config.kernel_stack_pages,
        MapAttributes::kernel_data(),
    );
    let stack_top = stack_va + (config.kernel_stack_pages << PAGE_SHIFT);
    built.set_kernel_stack(heap, stack_top, (config.kernel_stack_pages << PAGE_SHIFT) as u32);

    // Page-table frames come out of the map *before* it freezes.
    let mut frames = PoolFrameAlloc::new(&mut map, pool, config.page_table_frames)?;

    // The map's final shape is now decided; emit it for the kernel.
    let finalized = map.finalize();
    emit_memory_descriptors(heap, built, &finalized)?;
    info!(
        "memory map sealed: {} descriptors for the kernel",
        finalized.len()
    );

    // Build the address space: planned mappings, the loader's identity
    // window, the self-map.
    let cr3 = match config.paging {
        PagingChoice::FourLevel => {
            let space = AddressSpace64::new(&mapper, &mut frames)?;
            plan.apply_x64(&space, &mut frames)?;
            space.map_range(
                &mut frames,
                VirtualAddress::zero(),
                PhysicalAddress::zero(),
                config.identity_pages,
                MapAttributes::loader_transition(),
            )?;
            space.install_self_map();
            space.freeze()
        }
        PagingChoice::X86(mode) => {
            let space = AddressSpace32::new(&mapper, &mut frames, mode)?;
            plan.apply_x86(&space, &mut frames)?;
            space.map_range(
                &mut frames,
                VirtualAddress::zero(),
                PhysicalAddress::zero(),
                config.identity_pages,
                MapAttributes::loader_transition(),
            )?;
            space.install_self_map();
            space.freeze()
        }
    };

    info!("prepared: cr3 {cr3}, entry {:#x}", world.kernel.entry_va);
    Ok(PreparedHandoff {
        arch,
        paging: config.paging,
        cr3,
        kernel_entry: world.kernel.entry_va,
        block_va: built.block_va,
        stack_top,
        gdt,
        idt,
        pcr_va,
    })
}

/// Steps 4–7. No return, no error path: past the CR3 write the only
/// diagnostics are the checkpoint bytes.
///
/// # Safety
/// Boot services must be exited, interrupts must be off, and the loader's
/// executing code and stack must be covered by the identity window built
/// in [`prepare`].
#[cfg(target_arch = "x86_64")]
pub unsafe fn transfer(prepared: &PreparedHandoff) -> ! {
    use ntboot_debugport::checkpoint as post;
    use ntboot_registers::{Cr0, Cr4, Efer, LoadRegister, StoreRegister};

    #[repr(C, packed)]
    #[allow(dead_code)] // read through the lgdt/lidt pointer only
    struct PseudoDescriptor {
        limit: u16,
        base: u64,
    }

    let gdtr = PseudoDescriptor {
        limit: prepared.gdt.limit,
        base: prepared.gdt.va,
    };
    let idtr = PseudoDescriptor {
        limit: prepared.idt.limit,
        base: prepared.idt.va,
    };

    unsafe {
        core::arch::asm!("cli", options(nomem, nostack, preserves_flags));

        // Step 5 first on this path: we are already in long mode, so the
        // mode bits must be right before the new tables go live.
        post(checkpoint::MODE_BITS);
        Cr4::load()
            .with_physical_address_extension(true)
            .with_global_pages(true)
            .store();
        Efer::load().with_no_execute_enable(true).store();

        core::arch::asm!(
            "lgdt [{gdtr}]",
            "lidt [{idtr}]",
            gdtr = in(reg) &raw const gdtr,
            idtr = in(reg) &raw const idtr,
            options(nostack, preserves_flags),
        );

        // Step 4: the new world becomes real.
        post(checkpoint::PAGE_TABLES);
        ntboot_registers::Cr3::from_root(prepared.cr3).store();

        // Step 6: WP on (PG already is, in long mode).
        post(checkpoint::PAGING_ON);
        Cr0::load().with_write_protect(true).with_paging(true).store();

        // Step 7: stack, block pointer in rcx, jump. A dummy return
        // address keeps the kernel's stack 16-byte aligned as if called.
        post(checkpoint::KERNEL_JUMP);
        core::arch::asm!(
            "mov rsp, {stack}",
            "and rsp, -16",
            "push 0",
            "jmp {entry}",
            stack = in(reg) prepared.stack_top,
            entry = in(reg) prepared.kernel_entry,
            in("rcx") prepared.block_va,
            options(noreturn),
        )
    }
}

/// Steps 4–7 for an x86 kernel.
///
/// # Safety
/// As for the x86-64 variant; additionally CR4.PAE must match the paging
/// mode the tables were built for.
#[cfg(target_arch = "x86")]
pub unsafe fn transfer(prepared: &PreparedHandoff) -> ! {
    use ntboot_debugport::checkpoint as post;
    use ntboot_registers::{Cr0, Cr4, LoadRegister, StoreRegister};

    #[repr(C, packed)]
    #[allow(dead_code)] // read through the lgdt/lidt pointer only
    struct PseudoDescriptor {
        limit: u16,
        base: u32,
    }

    let gdtr = PseudoDescriptor {
        limit: prepared.gdt.limit,
        base: prepared.gdt.va as u32,
    };
    let idtr = PseudoDescriptor {
        limit: prepared.idt.limit,
        base: prepared.idt.va as u32,
    };

    unsafe {
        core::arch::asm!("cli", options(nomem, nostack, preserves_flags));
        core::arch::asm!(
            "lgdt [{gdtr}]",
            "lidt [{idtr}]",
            gdtr = in(reg) &raw const gdtr,
            idtr = in(reg) &raw const idtr,
            options(nostack, preserves_flags),
        );

        // Step 5: PAE if the tables need it, global pages always.
        post(checkpoint::MODE_BITS);
        let pae = matches!(prepared.paging, PagingChoice::X86(PagingMode32::Pae));
        Cr4::load()
            .with_physical_address_extension(pae)
            .with_global_pages(true)
            .store();

        // Step 4: root table live.
        post(checkpoint::PAGE_TABLES);
        ntboot_registers::Cr3::from_root(prepared.cr3).store();

        // Step 6: paging and write protection on together.
        post(checkpoint::PAGING_ON);
        Cr0::load().with_paging(true).with_write_protect(true).store();

        // Step 7: stdcall - the block pointer goes in the argument slot
        // under a dummy return address.
        post(checkpoint::KERNEL_JUMP);
        core::arch::asm!(
            "mov esp, {stack}",
            "and esp, -16",
            "push {block}",
            "push 0",
            "jmp {entry}",
            stack = in(reg) prepared.stack_top as u32,
            block = in(reg) prepared.block_va as u32,
            entry = in(reg) prepared.kernel_entry as u32,
            options(noreturn),
        )
    }
}
