//! Import address table binding.

use crate::headers::{DIRECTORY_IMPORT, Machine, PeHeaders};
use crate::PeError;
use alloc::string::ToString;

/// Identity of one imported symbol, as the import name table spells it.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ImportRef<'a> {
    Name(&'a str),
    Ordinal(u16),
}

fn read_u32(image: &[u8], offset: usize) -> Result<u32, PeError> {
    let bytes = image
        .get(offset..offset + 4)
        .ok_or(PeError::BadImage("import directory out of bounds"))?;
    Ok(u32::from_le_bytes(bytes.try_into().unwrap()))
}

fn read_cstr(image: &[u8], offset: usize) -> Result<&str, PeError> {
    let tail = image
        .get(offset..)
        .ok_or(PeError::BadImage("string out of bounds"))?;
    let len = tail
        .iter()
        .position(|&b| b == 0)
        .ok_or(PeError::BadImage("unterminated string"))?;
    core::str::from_utf8(&tail[..len]).map_err(|_| PeError::BadImage("non-ASCII import name"))
}

fn read_thunk(image: &[u8], offset: usize, machine: Machine) -> Result<u64, PeError> {
    match machine {
        Machine::X86 => read_u32(image, offset).map(u64::from),
        Machine::X64 => {
            let bytes = image
                .get(offset..offset + 8)
                .ok_or(PeError::BadImage("import thunk out of bounds"))?;
            Ok(u64::from_le_bytes(bytes.try_into().unwrap()))
        }
    }
}

fn write_thunk(image: &mut [u8], offset: usize, machine: Machine, value: u64) -> Result<(), PeError> {
    match machine {
        Machine::X86 => image
            .get_mut(offset..offset + 4)
            .ok_or(PeError::BadImage("import thunk out of bounds"))?
            .copy_from_slice(&(value as u32).to_le_bytes()),
        Machine::X64 => image
            .get_mut(offset..offset + 8)
            .ok_or(PeError::BadImage("import thunk out of bounds"))?
            .copy_from_slice(&value.to_le_bytes()),
    }
    Ok(())
}

const fn ordinal_flag(machine: Machine) -> u64 {
    match machine {
        Machine::X86 => 1 << 31,
        Machine::X64 => 1 << 63,
    }
}

/// Binds every IAT slot of a loaded image.
///
/// `resolve` is called with the exporting DLL's name (as the import
/// descriptor spells it) and the symbol reference, and returns the bound
/// VA. Returning `None` aborts with [`PeError::MissingExport`] naming the
/// symbol: the caller decides whether that is fatal (kernel, HAL) or a
/// per-driver skip.
///
/// Returns the number of slots written.
///
/// # Errors
/// [`PeError::MissingExport`] on an unresolvable symbol,
/// [`PeError::BadImage`] on malformed import data.
pub fn resolve_imports<F>(
    image: &mut [u8],
    headers: &PeHeaders,
    mut resolve: F,
) -> Result<usize, PeError>
where
    F: FnMut(&str, ImportRef<'_>) -> Option<u64>,
{
    let Some(dir) = headers.directory(DIRECTORY_IMPORT) else {
        return Ok(0);
    };
    let machine = headers.machine;
    let ptr = machine.pointer_size();
    let mut bound = 0usize;

    for index in 0.. {
        let descriptor = dir.rva as usize + index * 20;
        let int_rva = read_u32(image, descriptor)?;
        let name_rva = read_u32(image, descriptor + 12)?;
        let iat_rva = read_u32(image, descriptor + 16)?;
        if int_rva == 0 && name_rva == 0 && iat_rva == 0 {
            break;
        }

        let dll = read_cstr(image, name_rva as usize)?.to_string();
        // Unbound images keep a copy of the name table in the IAT; prefer
        // the import name table when present.
        let lookup_rva = if int_rva != 0 { int_rva } else { iat_rva };

        for slot in 0.. {
            let thunk = read_thunk(image, lookup_rva as usize + slot * ptr, machine)?;
            if thunk == 0 {
                break;
            }

            let reference = if thunk & ordinal_flag(machine) != 0 {
                ImportRef::Ordinal(thunk as u16)
            } else {
                // Hint/name entry: u16 hint then the symbol string.
                ImportRef::Name(read_cstr(image, thunk as usize + 2)?)
            };

            let Some(va) = resolve(&dll, reference) else {
                let symbol = match reference {
                    ImportRef::Name(name) => name.to_string(),
                    ImportRef::Ordinal(ordinal) => alloc::format!("#{ordinal}"),
                };
                return Err(PeError::MissingExport { dll, symbol });
            };
            write_thunk(image, iat_rva as usize + slot * ptr, machine, va)?;
            bound += 1;
        }
    }

    Ok(bound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers::parse_headers;
    use crate::load::testimg::{ImageBuilder, ImportSym, import_section};
    use crate::load;
    use alloc::string::String;
    use alloc::vec;

    fn importer(machine: Machine) -> (alloc::vec::Vec<u8>, PeHeaders, u32) {
        let symbols = [
            ImportSym::Name(String::from("KeBugCheckEx")),
            ImportSym::Ordinal(2),
        ];
        let (idata, iat_rvas) =
            import_section(machine, 0x2000, &[("fakekrnl.exe", &symbols)]);
        let base = match machine {
            Machine::X86 => 0x40_0000,
            Machine::X64 => 0x1_4000_0000,
        };
        let blob = ImageBuilder::new(machine, base)
            .section(".text", &[0xcc; 0x10], 0x1000)
            .imports(&idata, 0x2000)
            .build();
        let headers = parse_headers(&blob, machine).unwrap();
        let mut image = vec![0u8; headers.size_of_image as usize];
        load::load(&blob, &headers, &mut image, base).unwrap();
        (image, headers, iat_rvas[0])
    }

    #[test]
    fn binds_by_name_and_ordinal() {
        let (mut image, headers, iat_rva) = importer(Machine::X64);
        let bound = resolve_imports(&mut image, &headers, |dll, sym| {
            assert_eq!(dll, "fakekrnl.exe");
            match sym {
                ImportRef::Name("KeBugCheckEx") => Some(0xffff_f800_0000_1010),
                ImportRef::Ordinal(2) => Some(0xffff_f800_0000_1020),
                _ => None,
            }
        })
        .unwrap();
        assert_eq!(bound, 2);

        let slot0 =
            u64::from_le_bytes(image[iat_rva as usize..iat_rva as usize + 8].try_into().unwrap());
        let slot1 = u64::from_le_bytes(
            image[iat_rva as usize + 8..iat_rva as usize + 16].try_into().unwrap(),
        );
        assert_eq!(slot0, 0xffff_f800_0000_1010);
        assert_eq!(slot1, 0xffff_f800_0000_1020);
    }

    #[test]
    fn x86_slots_are_32_bit() {
        let (mut image, headers, iat_rva) = importer(Machine::X86);
        resolve_imports(&mut image, &headers, |_, _| Some(0x8010_2030)).unwrap();
        let slot0 =
            u32::from_le_bytes(image[iat_rva as usize..iat_rva as usize + 4].try_into().unwrap());
        assert_eq!(slot0, 0x8010_2030);
    }

    #[test]
    fn unresolved_import_names_the_symbol() {
        let (mut image, headers, _) = importer(Machine::X64);
        let err = resolve_imports(&mut image, &headers, |_, sym| match sym {
            ImportRef::Name(_) => None,
            ImportRef::Ordinal(o) => Some(u64::from(o)),
        })
        .unwrap_err();
        assert_eq!(
            err,
            PeError::MissingExport {
                dll: String::from("fakekrnl.exe"),
                symbol: String::from("KeBugCheckEx"),
            }
        );
    }

    #[test]
    fn image_without_imports_binds_nothing() {
        let blob = ImageBuilder::new(Machine::X64, 0x1_4000_0000)
            .section(".text", &[0xc3], 0x1000)
            .build();
        let headers = parse_headers(&blob, Machine::X64).unwrap();
        let mut image = vec![0u8; headers.size_of_image as usize];
        load::load(&blob, &headers, &mut image, 0x1_4000_0000).unwrap();
        assert_eq!(resolve_imports(&mut image, &headers, |_, _| None).unwrap(), 0);
    }
}
