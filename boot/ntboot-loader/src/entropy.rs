//! Boot entropy assembly.
//!
//! The kernel's RNG is seeded entirely from what the loader gathered:
//! per-source result records plus three derived pools (CNG seed, the
//! kernel's startup pool, and from 1703 the debugger transport's). The
//! collectors live in the shim; this module only lays the samples out in
//! the version-selected result block.
//!
//! The derived pools are filled by folding all sample bytes through a
//! xorshift-based mixer. That is deliberately *not* a CSPRNG - the kernel
//! re-mixes everything through its own DRBG; the loader's job is to carry
//! entropy, not to stretch it.

use crate::inputs::EntropySample;
use ntboot_abi::shared::{
    EntropyResult7, EntropyResult8, EntropyResult8Kd, EntropyResult10, TpmBootEntropyLdrResult,
};

/// Cheap byte mixer used to spread the collected samples over the derived
/// pools.
struct Mixer {
    state: u64,
}

impl Mixer {
    fn new(samples: &[EntropySample]) -> Self {
        let mut state = 0x6a09_e667_f3bc_c908_u64; // nothing-up-my-sleeve
        for sample in samples {
            for chunk in sample.data.chunks(8) {
                let mut word = [0u8; 8];
                word[..chunk.len()].copy_from_slice(chunk);
                state ^= u64::from_le_bytes(word);
                state = state.wrapping_mul(0x2545_f491_4f6c_dd1d).rotate_left(23);
            }
            state ^= sample.time;
        }
        Self { state }
    }

    fn fill(&mut self, out: &mut [u8]) {
        for chunk in out.chunks_mut(8) {
            self.state ^= self.state << 13;
            self.state ^= self.state >> 7;
            self.state ^= self.state << 17;
            let bytes = self.state.to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

macro_rules! fill_sources {
    ($result:expr, $samples:expr, $count:expr) => {{
        let result = &mut *$result;
        let samples = $samples;
        result.max_entropy_sources = $count;
        for (slot, sample) in result.source_results.iter_mut().zip(samples.iter()) {
            slot.source_id = sample.source as u32;
            slot.result_code = sample.result as u32;
            slot.result_status = sample.status;
            slot.time = sample.time;
            let len = sample.data.len().min(slot.entropy_data.len());
            slot.entropy_length = len as u32;
            slot.entropy_data[..len].copy_from_slice(&sample.data[..len]);
        }
        let mut mixer = Mixer::new(samples);
        mixer.fill(&mut result.seed_bytes_for_cng);
        mixer.fill(&mut result.rng_bytes_for_ntoskrnl);
        mixer
    }};
}

/// Fills the Win8 seven-source block.
pub fn fill_result7(result: &mut EntropyResult7, samples: &[EntropySample]) {
    let _ = fill_sources!(result, samples, 7);
}

/// Fills the Win8.1/1607 eight-source block.
pub fn fill_result8(result: &mut EntropyResult8, samples: &[EntropySample]) {
    let _ = fill_sources!(result, samples, 8);
}

/// Fills the 1703 eight-source block with the KD tail.
pub fn fill_result8_kd(result: &mut EntropyResult8Kd, samples: &[EntropySample]) {
    let mut mixer = fill_sources!(result, samples, 8);
    mixer.fill(&mut result.kd_entropy);
}

/// Fills the 1809+ ten-source block with the KD tail.
pub fn fill_result10(result: &mut EntropyResult10, samples: &[EntropySample]) {
    let mut mixer = fill_sources!(result, samples, 10);
    mixer.fill(&mut result.kd_entropy);
}

/// Fills the Win7 single-record TPM result from the TPM sample, if one was
/// collected.
pub fn fill_tpm_result(result: &mut TpmBootEntropyLdrResult, samples: &[EntropySample]) {
    use ntboot_abi::shared::EntropySourceId;
    let Some(sample) = samples.iter().find(|s| s.source == EntropySourceId::Tpm) else {
        return;
    };
    result.result_code = sample.result as u32;
    result.result_status = sample.status;
    result.time = sample.time;
    let len = sample.data.len().min(result.entropy_data.len());
    result.entropy_length = len as u32;
    result.entropy_data[..len].copy_from_slice(&sample.data[..len]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use ntboot_abi::shared::{EntropyResultCode, EntropySourceId};

    fn sample(source: EntropySourceId, byte: u8) -> EntropySample {
        EntropySample {
            source,
            result: EntropyResultCode::Success,
            status: 0,
            time: 0x1234,
            data: vec![byte; 32],
        }
    }

    #[test]
    fn sources_land_in_their_slots() {
        let samples = [
            sample(EntropySourceId::Tpm, 0x11),
            sample(EntropySourceId::Rdrand, 0x22),
            sample(EntropySourceId::Time, 0x33),
        ];
        let mut result = EntropyResult10::zeroed();
        fill_result10(&mut result, &samples);
        assert_eq!(result.max_entropy_sources, 10);
        assert_eq!(result.source_results[0].source_id, EntropySourceId::Tpm as u32);
        assert_eq!(result.source_results[1].entropy_data[0], 0x22);
        assert_eq!(result.source_results[2].entropy_length, 32);
        // Untouched slots stay zeroed.
        assert_eq!(result.source_results[4].source_id, 0);
        // Derived pools are filled.
        assert!(result.seed_bytes_for_cng.iter().any(|&b| b != 0));
        assert!(result.rng_bytes_for_ntoskrnl.iter().any(|&b| b != 0));
        assert!(result.kd_entropy.iter().any(|&b| b != 0));
    }

    #[test]
    fn tpm_record_requires_a_tpm_sample() {
        let mut result = TpmBootEntropyLdrResult::zeroed();
        fill_tpm_result(&mut result, &[sample(EntropySourceId::Rdrand, 1)]);
        assert_eq!(result.entropy_length, 0);
        fill_tpm_result(&mut result, &[sample(EntropySourceId::Tpm, 7)]);
        assert_eq!(result.entropy_length, 32);
        assert_eq!(result.result_code, EntropyResultCode::Success as u32);
    }
}
