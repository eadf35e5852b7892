//! Export directory lookup over a loaded image.

use crate::headers::{DIRECTORY_EXPORT, PeHeaders};
use crate::PeError;

fn read_u32(image: &[u8], offset: usize) -> Result<u32, PeError> {
    let bytes = image
        .get(offset..offset + 4)
        .ok_or(PeError::BadImage("export directory out of bounds"))?;
    Ok(u32::from_le_bytes(bytes.try_into().unwrap()))
}

fn read_u16(image: &[u8], offset: usize) -> Result<u16, PeError> {
    let bytes = image
        .get(offset..offset + 2)
        .ok_or(PeError::BadImage("export directory out of bounds"))?;
    Ok(u16::from_le_bytes(bytes.try_into().unwrap()))
}

fn read_cstr(image: &[u8], offset: usize) -> Result<&str, PeError> {
    let tail = image
        .get(offset..)
        .ok_or(PeError::BadImage("string out of bounds"))?;
    let len = tail
        .iter()
        .position(|&b| b == 0)
        .ok_or(PeError::BadImage("unterminated string"))?;
    core::str::from_utf8(&tail[..len]).map_err(|_| PeError::BadImage("non-ASCII export name"))
}

/// Parsed view of an image's export directory. Borrows the loaded image;
/// lookups return function RVAs, which the caller turns into VAs with the
/// image's load base.
pub struct ExportTable<'a> {
    image: &'a [u8],
    ordinal_base: u32,
    functions_rva: u32,
    function_count: u32,
    names_rva: u32,
    name_ordinals_rva: u32,
    name_count: u32,
}

impl<'a> ExportTable<'a> {
    /// Parses the export directory of a *loaded* (RVA-addressed) image.
    /// An image without exports yields an empty table.
    ///
    /// # Errors
    /// [`PeError::BadImage`] if the directory is present but malformed.
    pub fn parse(image: &'a [u8], headers: &PeHeaders) -> Result<Self, PeError> {
        let Some(dir) = headers.directory(DIRECTORY_EXPORT) else {
            return Ok(Self {
                image,
                ordinal_base: 0,
                functions_rva: 0,
                function_count: 0,
                names_rva: 0,
                name_ordinals_rva: 0,
                name_count: 0,
            });
        };
        let at = dir.rva as usize;
        Ok(Self {
            image,
            ordinal_base: read_u32(image, at + 0x10)?,
            function_count: read_u32(image, at + 0x14)?,
            name_count: read_u32(image, at + 0x18)?,
            functions_rva: read_u32(image, at + 0x1c)?,
            names_rva: read_u32(image, at + 0x20)?,
            name_ordinals_rva: read_u32(image, at + 0x24)?,
        })
    }

    /// Function RVA exported under `name`, if any.
    ///
    /// # Errors
    /// [`PeError::BadImage`] on truncated tables.
    pub fn by_name(&self, name: &str) -> Result<Option<u32>, PeError> {
        for index in 0..self.name_count as usize {
            let name_rva = read_u32(self.image, self.names_rva as usize + index * 4)?;
            if read_cstr(self.image, name_rva as usize)? != name {
                continue;
            }
            let ordinal_index =
                read_u16(self.image, self.name_ordinals_rva as usize + index * 2)?;
            return self.function_at(u32::from(ordinal_index)).map(Some);
        }
        Ok(None)
    }

    /// Function RVA exported under `ordinal` (biased, as imports carry it).
    ///
    /// # Errors
    /// [`PeError::BadImage`] on truncated tables.
    pub fn by_ordinal(&self, ordinal: u16) -> Result<Option<u32>, PeError> {
        let Some(index) = u32::from(ordinal).checked_sub(self.ordinal_base) else {
            return Ok(None);
        };
        if index >= self.function_count {
            return Ok(None);
        }
        self.function_at(index).map(Some)
    }

    fn function_at(&self, index: u32) -> Result<u32, PeError> {
        if index >= self.function_count {
            return Err(PeError::BadImage("export ordinal out of range"));
        }
        read_u32(self.image, self.functions_rva as usize + index as usize * 4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers::{Machine, parse_headers};
    use crate::load::testimg::{ImageBuilder, export_section};
    use crate::load;
    use alloc::vec;

    fn exporter() -> (alloc::vec::Vec<u8>, PeHeaders) {
        let edata = export_section(
            0x2000,
            "fakekrnl.exe",
            1,
            &[("KeBugCheckEx", 0x1010), ("MmGetPhysicalAddress", 0x1020)],
        );
        let blob = ImageBuilder::new(Machine::X64, 0x1_4000_0000)
            .section(".text", &[0xcc; 0x40], 0x1000)
            .exports(&edata, 0x2000)
            .build();
        let headers = parse_headers(&blob, Machine::X64).unwrap();
        let mut image = vec![0u8; headers.size_of_image as usize];
        load::load(&blob, &headers, &mut image, 0x1_4000_0000).unwrap();
        (image, headers)
    }

    #[test]
    fn lookup_by_name_and_ordinal() {
        let (image, headers) = exporter();
        let table = ExportTable::parse(&image, &headers).unwrap();
        assert_eq!(table.by_name("KeBugCheckEx").unwrap(), Some(0x1010));
        assert_eq!(table.by_name("MmGetPhysicalAddress").unwrap(), Some(0x1020));
        assert_eq!(table.by_name("NtUnknownExport").unwrap(), None);
        // Ordinals are biased by the directory's base (1 here).
        assert_eq!(table.by_ordinal(2).unwrap(), Some(0x1020));
        assert_eq!(table.by_ordinal(7).unwrap(), None);
    }

    #[test]
    fn image_without_exports_is_an_empty_table() {
        let blob = ImageBuilder::new(Machine::X64, 0x1_4000_0000)
            .section(".text", &[0xc3], 0x1000)
            .build();
        let headers = parse_headers(&blob, Machine::X64).unwrap();
        let mut image = vec![0u8; headers.size_of_image as usize];
        load::load(&blob, &headers, &mut image, 0x1_4000_0000).unwrap();
        let table = ExportTable::parse(&image, &headers).unwrap();
        assert_eq!(table.by_name("anything").unwrap(), None);
    }
}
