// crates/framecut-core/src/profile.rs
//
// Amplitude profiler: reduces a decoded track to a fixed number of
// normalised buckets for waveform display.
//
// Channel 0 only — stereo content is not averaged. The track is split into
// exactly `buckets` contiguous blocks of floor(frames / buckets) samples;
// tail samples that don't fill a block are dropped. Each block becomes its
// mean absolute amplitude, then the whole sequence is scaled so the loudest
// block is 1.0.

use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::media_types::{AmplitudeProfile, AudioSampleBuffer, ProfileOutcome};
use crate::source::AudioSource;

/// Compute the profile of `buffer`. Zero frames → empty profile.
pub fn compute_profile(buffer: &AudioSampleBuffer, buckets: usize) -> AmplitudeProfile {
    let samples = buffer.channel(0);
    if samples.is_empty() || buckets == 0 {
        return AmplitudeProfile::default();
    }

    let block = samples.len() / buckets;
    let mut values: Vec<f32> = if block == 0 {
        // Fewer samples than buckets: one sample per bucket, rest silent.
        (0..buckets)
            .map(|i| samples.get(i).map(|s| s.abs()).unwrap_or(0.0))
            .collect()
    } else {
        samples[..block * buckets]
            .par_chunks_exact(block)
            .map(|chunk| {
                let sum: f64 = chunk.iter().map(|s| s.abs() as f64).sum();
                (sum / block as f64) as f32
            })
            .collect()
    };

    normalize(&mut values);
    AmplitudeProfile { values }
}

/// Scale by the reciprocal of the global max. All-zero input stays all-zero.
fn normalize(values: &mut [f32]) {
    let max = values.iter().copied().fold(0.0f32, f32::max);
    if max <= 0.0 || !max.is_finite() {
        values.iter_mut().for_each(|v| *v = 0.0);
        return;
    }
    let multiplier = 1.0 / max as f64;
    for v in values.iter_mut() {
        *v = ((*v as f64 * multiplier) as f32).clamp(0.0, 1.0);
    }
}

/// Profile an audio source, honouring the large-file policy.
///
/// Sources above `config.large_file_threshold` are skipped unless `force`
/// is set; the check runs before decoding so an oversized file is never
/// loaded into memory by accident. Decode failures degrade to
/// `ProfileOutcome::Failed` with a warning.
pub fn profile_source(source: &dyn AudioSource, config: &EngineConfig, force: bool) -> ProfileOutcome {
    let file_size = source.byte_len();
    if !force && file_size > config.large_file_threshold {
        info!(
            "[profile] skipped: {file_size} bytes exceeds {} byte threshold",
            config.large_file_threshold
        );
        return ProfileOutcome::Skipped { file_size, threshold: config.large_file_threshold };
    }

    match source.decode() {
        Ok(buffer) => {
            let profile = compute_profile(&buffer, config.profile_buckets);
            info!(
                "[profile] {} buckets from {} frames @ {} Hz",
                profile.len(), buffer.frame_count(), buffer.sample_rate()
            );
            ProfileOutcome::Ready(profile)
        }
        Err(e) => {
            warn!("[profile] audio analysis warning: {e}");
            ProfileOutcome::Failed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FrameCutError, Result};

    fn mono(samples: Vec<f32>) -> AudioSampleBuffer {
        AudioSampleBuffer::new(1_000, vec![samples]).unwrap()
    }

    fn max(p: &AmplitudeProfile) -> f32 {
        p.values.iter().copied().fold(0.0, f32::max)
    }

    #[test]
    fn exact_length_and_unit_max() {
        let samples: Vec<f32> = (0..10_007).map(|i| ((i as f32) * 0.01).sin() * 0.3).collect();
        let p = compute_profile(&mono(samples), 200);
        assert_eq!(p.len(), 200);
        assert!((max(&p) - 1.0).abs() < 1e-6);
        assert!(p.values.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn silence_is_all_zero_not_nan() {
        let p = compute_profile(&mono(vec![0.0; 4_000]), 200);
        assert_eq!(p.len(), 200);
        assert!(p.values.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn block_means_use_absolute_values() {
        // Two blocks: [-0.5, 0.5] and [0.25, -0.25].
        let p = compute_profile(&mono(vec![-0.5, 0.5, 0.25, -0.25]), 2);
        assert_eq!(p.values, vec![1.0, 0.5]);
    }

    #[test]
    fn tail_remainder_is_dropped() {
        // block = 1; the loud fourth sample is past 3 buckets and ignored.
        let p = compute_profile(&mono(vec![0.1, 0.2, 0.4, 1.0]), 3);
        assert_eq!(p.len(), 3);
        assert!((p.values[2] - 1.0).abs() < 1e-6);
        assert!((p.values[0] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn only_channel_zero_is_read() {
        let buf = AudioSampleBuffer::new(1_000, vec![vec![0.0; 8], vec![1.0; 8]]).unwrap();
        let p = compute_profile(&buf, 4);
        assert!(p.values.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn short_input_still_has_n_buckets() {
        let p = compute_profile(&mono(vec![0.5, 0.25]), 5);
        assert_eq!(p.values, vec![1.0, 0.5, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn empty_input_is_empty_profile() {
        let p = compute_profile(&mono(vec![]), 200);
        assert!(p.is_empty());
    }

    struct FakeSource { size: u64, fail: bool }

    impl AudioSource for FakeSource {
        fn byte_len(&self) -> u64 { self.size }
        fn decode(&self) -> Result<AudioSampleBuffer> {
            if self.fail {
                return Err(FrameCutError::DecodeFailure("corrupt payload".into()));
            }
            Ok(mono(vec![0.5; 1_000]))
        }
    }

    #[test]
    fn oversized_source_is_skipped_unless_forced() {
        let cfg = EngineConfig { large_file_threshold: 100, ..EngineConfig::default() };
        let src = FakeSource { size: 101, fail: false };
        assert_eq!(
            profile_source(&src, &cfg, false),
            ProfileOutcome::Skipped { file_size: 101, threshold: 100 }
        );
        assert!(profile_source(&src, &cfg, true).profile().is_some());
    }

    #[test]
    fn decode_failure_degrades() {
        let src = FakeSource { size: 1, fail: true };
        match profile_source(&src, &EngineConfig::default(), false) {
            ProfileOutcome::Failed(msg) => assert!(msg.contains("corrupt payload")),
            other => panic!("expected Failed, got {other:?}"),
        }
    }
}
