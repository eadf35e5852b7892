//! ARC disk signature list construction.

use crate::heap::LoaderHeap;
use crate::inputs::DiskSignature;
use crate::PoolAccess;
use core::mem::offset_of;
use ntboot_abi::arcdisk::{
    ArcDiskInformation32, ArcDiskInformation64, ArcDiskSignature32, ArcDiskSignature64,
    ArcDiskSignatureWin7x32, ArcDiskSignatureWin7x64,
};
use ntboot_abi::list::{ListEntry32, ListEntry64};
use ntboot_mmap::NoMemory;

macro_rules! build_disk_list {
    ($fn_name:ident, $info:ty, $sig:ty, $sig7:ty, $list:ty, $ptr:ty) => {
        /// Emits the `ARC_DISK_INFORMATION` list head and one signature
        /// record per disk (the padded Win7 record when `win7_format`).
        /// Returns the information block's kernel VA.
        ///
        /// # Errors
        /// [`NoMemory`] when the heap is exhausted.
        pub fn $fn_name<P: PoolAccess>(
            heap: &mut LoaderHeap<'_, P>,
            disks: &[DiskSignature],
            win7_format: bool,
        ) -> Result<u64, NoMemory> {
            let info_va = heap.place::<$info>()?;
            let head_va = info_va + offset_of!($info, disk_signature_list_head) as u64;
            *heap.at_mut::<$list>(head_va) = <$list>::empty_at(head_va as $ptr);

            for disk in disks {
                let arc_name = heap.ansi_str(&disk.arc_name)?;
                let entry_va = if win7_format {
                    let va = heap.place::<$sig7>()?;
                    let record = heap.at_mut::<$sig7>(va);
                    record.signature = disk.mbr_signature;
                    record.arc_name = arc_name as $ptr;
                    record.check_sum = disk.check_sum;
                    record.valid_partition_table = u8::from(disk.valid_partition_table);
                    record.x_int13 = u8::from(disk.x_int13);
                    record.is_gpt = u8::from(disk.is_gpt);
                    record.gpt_signature = disk.gpt_signature;
                    va
                } else {
                    let va = heap.place::<$sig>()?;
                    let record = heap.at_mut::<$sig>(va);
                    record.signature = disk.mbr_signature;
                    record.arc_name = arc_name as $ptr;
                    record.check_sum = disk.check_sum;
                    record.valid_partition_table = u8::from(disk.valid_partition_table);
                    record.x_int13 = u8::from(disk.x_int13);
                    record.is_gpt = u8::from(disk.is_gpt);
                    record.gpt_signature = disk.gpt_signature;
                    va
                };
                // The list entry leads both record layouts.
                crate::blocks::list_append::<$list, P>(heap, head_va, entry_va);
            }

            Ok(info_va)
        }
    };
}

build_disk_list!(
    build_disk_list_x64,
    ArcDiskInformation64,
    ArcDiskSignature64,
    ArcDiskSignatureWin7x64,
    ListEntry64,
    u64
);
build_disk_list!(
    build_disk_list_x86,
    ArcDiskInformation32,
    ArcDiskSignature32,
    ArcDiskSignatureWin7x32,
    ListEntry32,
    u32
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::KernelSpacePlan;
    use alloc::string::String;
    use ntboot_mmap::{MemoryMap, MemoryRun, MemoryType};
    use ntboot_vmem::sim::SimMemory;

    struct SimPool<'a>(&'a SimMemory);

    impl PoolAccess for SimPool<'_> {
        fn slice_mut(&self, at: ntboot_addresses::PhysicalAddress, len: usize) -> &mut [u8] {
            self.0.bytes_mut(at, len)
        }
    }

    fn disk(signature: u32) -> DiskSignature {
        DiskSignature {
            arc_name: String::from("multi(0)disk(0)rdisk(0)"),
            mbr_signature: signature,
            check_sum: signature.wrapping_neg(),
            valid_partition_table: true,
            x_int13: false,
            is_gpt: false,
            gpt_signature: [0; 16],
        }
    }

    #[test]
    fn records_link_onto_the_head() {
        let sim = SimMemory::new(0x100_000);
        let pool = SimPool(&sim);
        let mut map = MemoryMap::new([MemoryRun::new(0, 0x100, MemoryType::Free)]).unwrap();
        let mut plan = KernelSpacePlan::new(0xffff_f800_2000_0000);
        let mut heap = LoaderHeap::new(&mut map, &mut plan, &pool, 0x10).unwrap();

        let disks = [disk(0xdead_beef), disk(0x1234_5678)];
        let info_va = build_disk_list_x64(&mut heap, &disks, true).unwrap();

        let head = *heap.at_mut::<ListEntry64>(info_va);
        assert_ne!(head.flink, info_va, "head must point at the first record");
        let first = heap.at_mut::<ArcDiskSignatureWin7x64>(head.flink);
        assert_eq!(first.signature, 0xdead_beef);
        assert_eq!(first.unknown, 0, "undocumented field stays zero");
        let second_va = first.list_entry.flink;
        let second = heap.at_mut::<ArcDiskSignatureWin7x64>(second_va);
        assert_eq!(second.signature, 0x1234_5678);
        // Closed ring: second points back to the head.
        assert_eq!(second.list_entry.flink, info_va);
        assert_eq!(head.blink, second_va);
    }
}
