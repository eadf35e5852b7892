//! # NT Version Descriptors
//!
//! Maps a target kernel's `(major, minor, build)` triple to the binary
//! contract that build expects: which loader-parameter-block layout, which
//! extension layout, which entropy/performance/hypervisor sub-block shapes,
//! and which optional module lists exist.
//!
//! Windows never documented these layouts; they were recovered build by
//! build, so the table works in **transition builds**: a layout stays in
//! force from the build that introduced it until the next known transition.
//! Build 16299 (1709) and 17134 (1803), for example, keep the 15063 (1703)
//! extension because nothing observable changed in between.
//!
//! Lookups fail closed: anything outside NT 5.2 through NT 10 (19041) is
//! [`UnsupportedVersion`], as is a boot-configuration override that names a
//! different block layout than the one the version table selects.

#![cfg_attr(not(any(test, doctest)), no_std)]

use thiserror::Error;

/// Loader parameter block layout generations.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BlockLayout {
    /// NT 5.2: no version prefix; the block starts at the list heads.
    Ws03,
    /// NT 6.0: adds the firmware information tail.
    Vista,
    /// NT 6.1: `OsMajorVersion`/`OsMinorVersion`/`Size` prefix appears.
    Win7,
    /// NT 6.2: early-launch and core-driver lists, `KernelStackSize`.
    Win8,
    /// NT 6.3: firmware information grows the EFI memory-map fields.
    Win81,
    /// NT 10.0: core-extension and TPM-core lists, boot-stat paths.
    Win10,
}

/// Loader extension layout generations.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ExtensionLayout {
    Ws03,
    Vista,
    VistaSp2,
    Win7,
    Win8,
    Win81,
    Win10,
    Win10Rs1,
    Win10Rs2,
    Win10Rs5,
    Win10V1903,
    Win10V2004,
}

/// Shape of the boot entropy result block inside the extension.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EntropyLayout {
    /// Pre-Win7: no entropy block at all.
    None,
    /// Win7: single TPM result record.
    TpmResult,
    /// Win8: 7 source slots.
    Sources7,
    /// Win8.1 through 1607: 8 source slots.
    Sources8,
    /// 1703: 8 source slots plus the KD entropy tail.
    Sources8Kd,
    /// 1809 onwards: 10 source slots plus the KD entropy tail.
    Sources10,
}

/// Shape of the loader performance data.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PerfDataLayout {
    /// Pre-Win7: absent.
    None,
    /// Vista through 1703: out-of-line `{start, end}` pair.
    Pointer,
    /// 1809: inline, nine timestamps.
    Inline1809,
    /// 1903 onwards: inline, twelve timestamps.
    Inline1903,
}

/// Shape of the hypervisor crashdump sub-block.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum HypervisorLayout {
    None,
    /// Win8 through 1703.
    Classic,
    /// 1809 onwards: split initial/current crashdump areas.
    V1809,
}

/// Shape of the firmware information union in the block.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FirmwareInfoLayout {
    /// WS03 predates the firmware information tail.
    None,
    /// Vista/Win7: version, runtime-services VA, mapping status.
    Win7,
    /// Win8: adds the firmware resource list.
    Win8,
    /// Win8.1 onwards: adds the preserved EFI memory map.
    Win81,
}

/// Everything the loader must know about one kernel build's ABI.
#[derive(Clone, Debug)]
pub struct VersionDescriptor {
    pub major: u16,
    pub minor: u16,
    /// First build this descriptor applies to (0 where the version pair
    /// alone decides).
    pub build: u32,
    pub block: BlockLayout,
    pub extension: ExtensionLayout,
    pub entropy: EntropyLayout,
    pub perf_data: PerfDataLayout,
    pub hypervisor: HypervisorLayout,
    pub firmware_info: FirmwareInfoLayout,
    /// Number of entropy source slots (0, 7, 8 or 10).
    pub entropy_sources: u32,
    /// Early-launch and core-driver list heads exist (Win8+).
    pub has_core_driver_list: bool,
    /// Core-extensions and TPM-core list heads exist (Win10+).
    pub has_tpm_core_list: bool,
    /// `HypercallCodeVa`/`HalVirtualAddress` fields exist (1607+, x86-64).
    pub has_hypercall_va: bool,
    /// `NumaMemoryRanges` fields exist (2004).
    pub has_numa_ranges: bool,
    /// `MiniExecutive` fields exist (1903+, x86-64).
    pub has_mini_executive: bool,
    /// NTDDI constant written to `MajorRelease` (1607+), else 0.
    pub ntddi: u32,
}

/// Known NT 10 transition builds.
pub const WIN10_BUILD_1507: u32 = 10240;
pub const WIN10_BUILD_1511: u32 = 10586;
pub const WIN10_BUILD_1607: u32 = 14393;
pub const WIN10_BUILD_1703: u32 = 15063;
pub const WIN10_BUILD_1709: u32 = 16299;
pub const WIN10_BUILD_1803: u32 = 17134;
pub const WIN10_BUILD_1809: u32 = 17763;
pub const WIN10_BUILD_1903: u32 = 18362;
pub const WIN10_BUILD_1909: u32 = 18363;
pub const WIN10_BUILD_2004: u32 = 19041;

pub const NTDDI_WIN10_RS1: u32 = 0x0a00_0002;
pub const NTDDI_WIN10_RS2: u32 = 0x0a00_0003;
pub const NTDDI_WIN10_RS3: u32 = 0x0a00_0004;
pub const NTDDI_WIN10_RS4: u32 = 0x0a00_0005;
pub const NTDDI_WIN10_RS5: u32 = 0x0a00_0006;
pub const NTDDI_WIN10_19H1: u32 = 0x0a00_0007;
pub const NTDDI_WIN10_20H1: u32 = 0x0a00_0008;

/// The requested kernel version has no known loader contract.
#[derive(Debug, Error, Eq, PartialEq)]
#[error("unsupported kernel version {major}.{minor} build {build}")]
pub struct UnsupportedVersion {
    pub major: u16,
    pub minor: u16,
    pub build: u32,
}

macro_rules! descriptor {
    ($major:expr, $minor:expr, $build:expr, $block:ident, $ext:ident,
     entropy: $entropy:ident / $sources:expr, perf: $perf:ident,
     hv: $hv:ident, fw: $fw:ident, ntddi: $ntddi:expr,
     core: $core:expr, tpm: $tpm:expr, hypercall: $hc:expr,
     numa: $numa:expr, miniexec: $me:expr) => {
        VersionDescriptor {
            major: $major,
            minor: $minor,
            build: $build,
            block: BlockLayout::$block,
            extension: ExtensionLayout::$ext,
            entropy: EntropyLayout::$entropy,
            perf_data: PerfDataLayout::$perf,
            hypervisor: HypervisorLayout::$hv,
            firmware_info: FirmwareInfoLayout::$fw,
            entropy_sources: $sources,
            has_core_driver_list: $core,
            has_tpm_core_list: $tpm,
            has_hypercall_va: $hc,
            has_numa_ranges: $numa,
            has_mini_executive: $me,
            ntddi: $ntddi,
        }
    };
}

/// Descriptor table, ordered oldest to newest. Within NT 10 the `build`
/// field is the transition point; earlier rows cover everything up to the
/// next row's build.
static DESCRIPTORS: &[VersionDescriptor] = &[
    descriptor!(5, 2, 0, Ws03, Ws03, entropy: None / 0, perf: None,
        hv: None, fw: None, ntddi: 0,
        core: false, tpm: false, hypercall: false, numa: false, miniexec: false),
    descriptor!(6, 0, 0, Vista, Vista, entropy: None / 0, perf: Pointer,
        hv: None, fw: Win7, ntddi: 0,
        core: false, tpm: false, hypercall: false, numa: false, miniexec: false),
    descriptor!(6, 0, 6002, Vista, VistaSp2, entropy: None / 0, perf: Pointer,
        hv: None, fw: Win7, ntddi: 0,
        core: false, tpm: false, hypercall: false, numa: false, miniexec: false),
    descriptor!(6, 1, 0, Win7, Win7, entropy: TpmResult / 0, perf: Pointer,
        hv: None, fw: Win7, ntddi: 0,
        core: false, tpm: false, hypercall: false, numa: false, miniexec: false),
    descriptor!(6, 2, 0, Win8, Win8, entropy: Sources7 / 7, perf: Pointer,
        hv: Classic, fw: Win8, ntddi: 0,
        core: true, tpm: false, hypercall: false, numa: false, miniexec: false),
    descriptor!(6, 3, 0, Win81, Win81, entropy: Sources8 / 8, perf: Pointer,
        hv: Classic, fw: Win81, ntddi: 0,
        core: true, tpm: false, hypercall: false, numa: false, miniexec: false),
    descriptor!(10, 0, WIN10_BUILD_1507, Win10, Win10, entropy: Sources8 / 8, perf: Pointer,
        hv: Classic, fw: Win81, ntddi: 0,
        core: true, tpm: true, hypercall: false, numa: false, miniexec: false),
    descriptor!(10, 0, WIN10_BUILD_1607, Win10, Win10Rs1, entropy: Sources8 / 8, perf: Pointer,
        hv: Classic, fw: Win81, ntddi: NTDDI_WIN10_RS1,
        core: true, tpm: true, hypercall: true, numa: false, miniexec: false),
    descriptor!(10, 0, WIN10_BUILD_1703, Win10, Win10Rs2, entropy: Sources8Kd / 8, perf: Pointer,
        hv: Classic, fw: Win81, ntddi: NTDDI_WIN10_RS2,
        core: true, tpm: true, hypercall: true, numa: false, miniexec: false),
    descriptor!(10, 0, WIN10_BUILD_1809, Win10, Win10Rs5, entropy: Sources10 / 10, perf: Inline1809,
        hv: V1809, fw: Win81, ntddi: NTDDI_WIN10_RS5,
        core: true, tpm: true, hypercall: true, numa: false, miniexec: false),
    descriptor!(10, 0, WIN10_BUILD_1903, Win10, Win10V1903, entropy: Sources10 / 10, perf: Inline1903,
        hv: V1809, fw: Win81, ntddi: NTDDI_WIN10_19H1,
        core: true, tpm: true, hypercall: true, numa: false, miniexec: true),
    descriptor!(10, 0, WIN10_BUILD_2004, Win10, Win10V2004, entropy: Sources10 / 10, perf: Inline1903,
        hv: V1809, fw: Win81, ntddi: NTDDI_WIN10_20H1,
        core: true, tpm: true, hypercall: true, numa: true, miniexec: true),
];

/// Resolves the descriptor for a kernel build.
///
/// # Errors
/// [`UnsupportedVersion`] if the version pair is unknown, or if an NT 10
/// build predates the first supported release.
pub fn lookup(
    major: u16,
    minor: u16,
    build: u32,
) -> Result<&'static VersionDescriptor, UnsupportedVersion> {
    let mut found: Option<&'static VersionDescriptor> = None;
    for d in DESCRIPTORS {
        if d.major == major && d.minor == minor && build >= d.build {
            found = Some(d);
        }
    }
    found.ok_or(UnsupportedVersion {
        major,
        minor,
        build,
    })
}

/// [`lookup`] plus validation of a boot-configuration block-layout override.
///
/// A configuration that names a block layout other than the one this build
/// actually consumes would hand the kernel a block it cannot parse, so the
/// mismatch is rejected up front, before anything is allocated.
///
/// # Errors
/// [`UnsupportedVersion`] on unknown versions or layout mismatch.
pub fn lookup_with_override(
    major: u16,
    minor: u16,
    build: u32,
    requested: Option<BlockLayout>,
) -> Result<&'static VersionDescriptor, UnsupportedVersion> {
    let descriptor = lookup(major, minor, build)?;
    match requested {
        Some(layout) if layout != descriptor.block => Err(UnsupportedVersion {
            major,
            minor,
            build,
        }),
        _ => Ok(descriptor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ws03_has_no_version_prefix() {
        let d = lookup(5, 2, 3790).unwrap();
        assert_eq!(d.block, BlockLayout::Ws03);
        assert_eq!(d.extension, ExtensionLayout::Ws03);
        assert_eq!(d.entropy, EntropyLayout::None);
    }

    #[test]
    fn vista_sp2_switches_extension_only() {
        let rtm = lookup(6, 0, 6000).unwrap();
        let sp2 = lookup(6, 0, 6002).unwrap();
        assert_eq!(rtm.extension, ExtensionLayout::Vista);
        assert_eq!(sp2.extension, ExtensionLayout::VistaSp2);
        assert_eq!(rtm.block, sp2.block);
    }

    #[test]
    fn win10_transition_builds_are_exact() {
        assert_eq!(lookup(10, 0, 10586).unwrap().extension, ExtensionLayout::Win10);
        assert_eq!(lookup(10, 0, 14392).unwrap().extension, ExtensionLayout::Win10);
        assert_eq!(lookup(10, 0, 14393).unwrap().extension, ExtensionLayout::Win10Rs1);
        assert_eq!(lookup(10, 0, 15063).unwrap().extension, ExtensionLayout::Win10Rs2);
        assert_eq!(lookup(10, 0, 17763).unwrap().extension, ExtensionLayout::Win10Rs5);
        assert_eq!(lookup(10, 0, 18362).unwrap().extension, ExtensionLayout::Win10V1903);
        assert_eq!(lookup(10, 0, 19041).unwrap().extension, ExtensionLayout::Win10V2004);
    }

    #[test]
    fn untabled_builds_inherit_the_previous_layout() {
        // 1709 and 1803 never changed the extension shape.
        assert_eq!(lookup(10, 0, 16299).unwrap().extension, ExtensionLayout::Win10Rs2);
        assert_eq!(lookup(10, 0, 17134).unwrap().extension, ExtensionLayout::Win10Rs2);
        // 1909 is a 1903 refresh.
        assert_eq!(lookup(10, 0, 18363).unwrap().extension, ExtensionLayout::Win10V1903);
    }

    #[test]
    fn entropy_source_counts_follow_the_table() {
        assert_eq!(lookup(6, 2, 9200).unwrap().entropy_sources, 7);
        assert_eq!(lookup(6, 3, 9600).unwrap().entropy_sources, 8);
        assert_eq!(lookup(10, 0, 17763).unwrap().entropy_sources, 10);
    }

    #[test]
    fn unknown_versions_fail_closed() {
        assert!(lookup(5, 1, 2600).is_err());
        assert!(lookup(11, 0, 22000).is_err());
        assert!(lookup(10, 0, 9000).is_err());
    }

    #[test]
    fn layout_override_mismatch_is_rejected() {
        // A WS03-era block requested for a Win7 SP1 kernel.
        let err = lookup_with_override(6, 1, 7601, Some(BlockLayout::Ws03)).unwrap_err();
        assert_eq!(err.build, 7601);
        // The matching override passes through.
        assert!(lookup_with_override(6, 1, 7601, Some(BlockLayout::Win7)).is_ok());
    }
}
