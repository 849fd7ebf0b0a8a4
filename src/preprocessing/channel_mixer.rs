//! Channel mixing (interleaved multi-channel to mono)

use crate::error::AnalysisError;

/// Downmix interleaved samples to mono by averaging channels
///
/// # Arguments
///
/// * `interleaved` - Samples in frame order `[c0, c1, ..., c0, c1, ...]`
/// * `channels` - Number of interleaved channels
///
/// # Errors
///
/// Returns `AnalysisError::InvalidInput` if `channels` is 0.
pub fn downmix_to_mono(interleaved: &[f32], channels: usize) -> Result<Vec<f32>, AnalysisError> {
    match channels {
        0 => Err(AnalysisError::InvalidInput("Channel count must be > 0".to_string())),
        1 => Ok(interleaved.to_vec()),
        n => {
            if interleaved.len() % n != 0 {
                log::warn!(
                    "Dropping {} trailing samples of an incomplete {}-channel frame",
                    interleaved.len() % n,
                    n
                );
            }
            let scale = 1.0 / n as f32;
            Ok(interleaved
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() * scale)
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stereo_average() {
        let mono = downmix_to_mono(&[1.0, 0.0, 0.5, 0.5, -1.0, 1.0], 2).unwrap();
        assert_eq!(mono, vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_mono_passthrough() {
        assert_eq!(downmix_to_mono(&[0.1, 0.2], 1).unwrap(), vec![0.1, 0.2]);
    }

    #[test]
    fn test_incomplete_frame_dropped() {
        assert_eq!(downmix_to_mono(&[1.0, 1.0, 1.0], 2).unwrap(), vec![1.0]);
    }

    #[test]
    fn test_zero_channels() {
        assert!(downmix_to_mono(&[0.0], 0).is_err());
    }
}
