//! Section placement and base relocation.

use crate::headers::{DIRECTORY_BASERELOC, PeHeaders};
use crate::PeError;
use log::{debug, trace};

const IMAGE_REL_BASED_ABSOLUTE: u16 = 0;
const IMAGE_REL_BASED_HIGH: u16 = 1;
const IMAGE_REL_BASED_LOW: u16 = 2;
const IMAGE_REL_BASED_HIGHLOW: u16 = 3;
const IMAGE_REL_BASED_HIGHADJ: u16 = 4;
const IMAGE_REL_BASED_DIR64: u16 = 10;

/// Outcome counters from a [`load`]; the relocation count is observable
/// behavior (an image placed at its linked base must report zero).
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct LoadSummary {
    pub sections_copied: usize,
    pub relocations_applied: usize,
}

/// Places `blob` into `dest` as a loaded image based at `base_va`.
///
/// `dest` must span `headers.size_of_image` bytes of the destination pages
/// (the caller owns the allocation). Headers and each section's raw data
/// are copied; the remainder of every section up to its `VirtualSize` and
/// all gaps are zeroed. When `base_va` differs from the linked
/// `ImageBase`, the base relocation directory is applied.
///
/// # Errors
/// [`PeError::BadImage`] on malformed section or relocation data,
/// [`PeError::BadRelocation`] on an unsupported relocation kind.
pub fn load(
    blob: &[u8],
    headers: &PeHeaders,
    dest: &mut [u8],
    base_va: u64,
) -> Result<LoadSummary, PeError> {
    if dest.len() < headers.size_of_image as usize {
        return Err(PeError::BadImage("destination smaller than SizeOfImage"));
    }
    dest[..headers.size_of_image as usize].fill(0);

    // Headers travel verbatim; the kernel reads them (checksum, debug
    // directory) out of the mapped image.
    let header_len = headers.size_of_headers as usize;
    if header_len > blob.len() {
        return Err(PeError::BadImage("SizeOfHeaders past end of file"));
    }
    dest[..header_len].copy_from_slice(&blob[..header_len]);

    let mut summary = LoadSummary::default();
    for section in &headers.sections {
        let va = section.virtual_address as usize;
        let virtual_size = section.virtual_size as usize;
        let raw_len = (section.size_of_raw_data as usize).min(virtual_size);
        let raw_off = section.pointer_to_raw_data as usize;

        let va_end = va
            .checked_add(virtual_size)
            .ok_or(PeError::BadImage("section span overflow"))?;
        if va_end > headers.size_of_image as usize {
            return Err(PeError::BadImage("section past SizeOfImage"));
        }
        let raw_end = raw_off
            .checked_add(raw_len)
            .ok_or(PeError::BadImage("section raw span overflow"))?;
        if raw_end > blob.len() {
            return Err(PeError::BadImage("section raw data past end of file"));
        }

        dest[va..va + raw_len].copy_from_slice(&blob[raw_off..raw_end]);
        // The tail past the raw data is already zero from the initial fill.
        summary.sections_copied += 1;
        trace!(
            "section {:?} rva {va:#x} raw {raw_len:#x} virt {virtual_size:#x}",
            core::str::from_utf8(&section.name).unwrap_or("?")
        );
    }

    if base_va != headers.image_base {
        summary.relocations_applied = relocate(headers, dest, base_va)?;
        debug!(
            "rebased image {:#x} -> {base_va:#x}, {} fixups",
            headers.image_base, summary.relocations_applied
        );
    }

    Ok(summary)
}

fn read_u16_at(image: &[u8], offset: usize) -> Result<u16, PeError> {
    let bytes = image
        .get(offset..offset + 2)
        .ok_or(PeError::BadImage("relocation target out of bounds"))?;
    Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn write_u16_at(image: &mut [u8], offset: usize, value: u16) -> Result<(), PeError> {
    image
        .get_mut(offset..offset + 2)
        .ok_or(PeError::BadImage("relocation target out of bounds"))?
        .copy_from_slice(&value.to_le_bytes());
    Ok(())
}

fn apply_delta32(image: &mut [u8], offset: usize, delta: u64) -> Result<(), PeError> {
    let bytes = image
        .get_mut(offset..offset + 4)
        .ok_or(PeError::BadImage("relocation target out of bounds"))?;
    let value = u32::from_le_bytes((&*bytes).try_into().unwrap()).wrapping_add(delta as u32);
    bytes.copy_from_slice(&value.to_le_bytes());
    Ok(())
}

fn apply_delta64(image: &mut [u8], offset: usize, delta: u64) -> Result<(), PeError> {
    let bytes = image
        .get_mut(offset..offset + 8)
        .ok_or(PeError::BadImage("relocation target out of bounds"))?;
    let value = u64::from_le_bytes((&*bytes).try_into().unwrap()).wrapping_add(delta);
    bytes.copy_from_slice(&value.to_le_bytes());
    Ok(())
}

/// Walks the `.reloc` directory of the already-placed image and applies
/// the delta `base_va - ImageBase`. Returns the number of fixups written.
fn relocate(headers: &PeHeaders, image: &mut [u8], base_va: u64) -> Result<usize, PeError> {
    let Some(dir) = headers.directory(DIRECTORY_BASERELOC) else {
        // Kernel-mode images are always relocatable; a stripped directory
        // with a moved base cannot be loaded correctly.
        return Err(PeError::BadImage("image moved but has no relocations"));
    };

    let delta = base_va.wrapping_sub(headers.image_base);
    let mut applied = 0usize;
    let mut offset = dir.rva as usize;
    let end = offset + dir.size as usize;
    if end > image.len() {
        return Err(PeError::BadImage("relocation directory out of bounds"));
    }

    while offset + 8 <= end {
        let page_rva = u32::from_le_bytes(image[offset..offset + 4].try_into().unwrap()) as usize;
        let block_size = u32::from_le_bytes(image[offset + 4..offset + 8].try_into().unwrap()) as usize;
        if block_size < 8 || offset + block_size > end {
            return Err(PeError::BadImage("malformed relocation block"));
        }

        let mut entry = offset + 8;
        let block_end = offset + block_size;
        while entry + 2 <= block_end {
            let raw = u16::from_le_bytes(image[entry..entry + 2].try_into().unwrap());
            entry += 2;
            let kind = raw >> 12;
            let target = page_rva + usize::from(raw & 0xfff);

            match kind {
                IMAGE_REL_BASED_ABSOLUTE => {} // block padding
                IMAGE_REL_BASED_HIGHLOW => {
                    apply_delta32(image, target, delta)?;
                    applied += 1;
                }
                IMAGE_REL_BASED_DIR64 => {
                    apply_delta64(image, target, delta)?;
                    applied += 1;
                }
                IMAGE_REL_BASED_HIGH => {
                    let old = read_u16_at(image, target)?;
                    write_u16_at(image, target, old.wrapping_add((delta >> 16) as u16))?;
                    applied += 1;
                }
                IMAGE_REL_BASED_LOW => {
                    let old = read_u16_at(image, target)?;
                    write_u16_at(image, target, old.wrapping_add(delta as u16))?;
                    applied += 1;
                }
                IMAGE_REL_BASED_HIGHADJ => {
                    // The adjustment parameter is carried in the next entry
                    // of the block.
                    if entry + 2 > block_end {
                        return Err(PeError::BadImage("HIGHADJ without parameter"));
                    }
                    let param = u16::from_le_bytes(image[entry..entry + 2].try_into().unwrap());
                    entry += 2;
                    let high = read_u16_at(image, target)?;
                    let value = (u32::from(high) << 16)
                        .wrapping_add(u32::from(param))
                        .wrapping_add(delta as u32)
                        .wrapping_add(0x8000);
                    write_u16_at(image, target, (value >> 16) as u16)?;
                    applied += 1;
                }
                other => return Err(PeError::BadRelocation(other)),
            }
        }
        offset = block_end;
    }

    Ok(applied)
}

#[cfg(any(test, feature = "fixtures"))]
pub mod testimg;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers::{Machine, parse_headers};
    use crate::load::testimg::{ImageBuilder, reloc_section};
    use alloc::vec;

    #[test]
    fn loading_at_preferred_base_writes_no_fixups() {
        let image = ImageBuilder::new(Machine::X64, 0x1_4000_0000)
            .section(".text", &vec![0x90u8; 0x20], 0x1000)
            .build();
        let headers = parse_headers(&image, Machine::X64).unwrap();
        let mut dest = vec![0u8; headers.size_of_image as usize];
        let summary = load(&image, &headers, &mut dest, 0x1_4000_0000).unwrap();
        assert_eq!(summary.relocations_applied, 0);
        assert_eq!(&dest[0x1000..0x1020], &[0x90u8; 0x20][..]);
    }

    #[test]
    fn section_tail_beyond_raw_data_is_zeroed() {
        let image = ImageBuilder::new(Machine::X64, 0x1_4000_0000)
            .section_with_virtual_size(".bss", &[0xffu8; 4], 0x1000, 0x100)
            .build();
        let headers = parse_headers(&image, Machine::X64).unwrap();
        let mut dest = vec![0xaau8; headers.size_of_image as usize];
        load(&image, &headers, &mut dest, 0x1_4000_0000).unwrap();
        assert_eq!(&dest[0x1000..0x1004], &[0xff; 4]);
        assert!(dest[0x1004..0x1100].iter().all(|&b| b == 0));
    }

    #[test]
    fn dir64_relocation_applies_the_delta() {
        // A .data section holding a pointer to itself, with a matching
        // DIR64 fixup.
        let pointer = 0x1_4000_2000u64;
        let reloc = reloc_section(&[(0x1000, &[(IMAGE_REL_BASED_DIR64, 0x0)])]);
        let image = ImageBuilder::new(Machine::X64, 0x1_4000_0000)
            .section(".data", &pointer.to_le_bytes(), 0x1000)
            .reloc(&reloc, 0x2000)
            .build();
        let headers = parse_headers(&image, Machine::X64).unwrap();
        let mut dest = vec![0u8; headers.size_of_image as usize];

        let summary = load(&image, &headers, &mut dest, 0x1_8000_0000).unwrap();
        assert_eq!(summary.relocations_applied, 1);
        let patched = u64::from_le_bytes(dest[0x1000..0x1008].try_into().unwrap());
        assert_eq!(patched, pointer + 0x4000_0000);
    }

    #[test]
    fn highlow_relocation_is_32_bit() {
        let pointer = 0x40_2000u32;
        let reloc = reloc_section(&[(0x1000, &[(IMAGE_REL_BASED_HIGHLOW, 0x0)])]);
        let image = ImageBuilder::new(Machine::X86, 0x40_0000)
            .section(".data", &pointer.to_le_bytes(), 0x1000)
            .reloc(&reloc, 0x2000)
            .build();
        let headers = parse_headers(&image, Machine::X86).unwrap();
        let mut dest = vec![0u8; headers.size_of_image as usize];

        load(&image, &headers, &mut dest, 0x80_0000).unwrap();
        let patched = u32::from_le_bytes(dest[0x1000..0x1004].try_into().unwrap());
        assert_eq!(patched, pointer + 0x40_0000);
    }

    #[test]
    fn unknown_relocation_kind_is_rejected() {
        let reloc = reloc_section(&[(0x1000, &[(9, 0x0)])]);
        let image = ImageBuilder::new(Machine::X64, 0x1_4000_0000)
            .section(".data", &[0u8; 8], 0x1000)
            .reloc(&reloc, 0x2000)
            .build();
        let headers = parse_headers(&image, Machine::X64).unwrap();
        let mut dest = vec![0u8; headers.size_of_image as usize];
        assert_eq!(
            load(&image, &headers, &mut dest, 0x1_8000_0000),
            Err(PeError::BadRelocation(9))
        );
    }

    #[test]
    fn moved_image_without_relocations_is_rejected() {
        let image = ImageBuilder::new(Machine::X64, 0x1_4000_0000)
            .section(".text", &[0xc3], 0x1000)
            .build();
        let headers = parse_headers(&image, Machine::X64).unwrap();
        let mut dest = vec![0u8; headers.size_of_image as usize];
        assert!(load(&image, &headers, &mut dest, 0x1_8000_0000).is_err());
    }
}
