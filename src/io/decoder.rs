//! Audio decoding using Symphonia
//!
//! Decodes a container/codec (WAV, FLAC, MP3, Ogg Vorbis, ...) into a mono
//! `f32` waveform. Multi-channel audio is averaged to mono.

use crate::error::AnalysisError;
use crate::preprocessing::channel_mixer::downmix_to_mono;
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decoded mono waveform
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    /// Mono samples in [-1.0, 1.0]
    pub samples: Vec<f32>,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Channel count of the source before downmixing
    pub channels: usize,
}

impl DecodedAudio {
    /// Duration in seconds
    pub fn duration_seconds(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// File extension of a display name or path, used as a format hint
pub fn extension_hint(name: &str) -> Option<&str> {
    std::path::Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
}

/// Decode an in-memory encoded file
///
/// # Arguments
///
/// * `bytes` - Encoded audio (any container Symphonia can probe)
/// * `extension` - Optional file extension hint ("wav", "mp3", ...)
///
/// # Errors
///
/// Returns `AnalysisError::DecodingError` for unsupported or malformed input,
/// or when the stream decodes to zero samples.
pub fn decode_bytes(bytes: &[u8], extension: Option<&str>) -> Result<DecodedAudio, AnalysisError> {
    if bytes.is_empty() {
        return Err(AnalysisError::DecodingError("Empty input".to_string()));
    }
    log::debug!("Decoding {} bytes (hint: {:?})", bytes.len(), extension);
    decode_source(Box::new(Cursor::new(bytes.to_vec())), extension)
}

/// Decode an audio file from disk
///
/// # Errors
///
/// Returns `AnalysisError::DecodingError` if the file cannot be opened or
/// decoded.
pub fn decode_audio(path: &str) -> Result<DecodedAudio, AnalysisError> {
    log::debug!("Decoding audio file: {}", path);
    let file = std::fs::File::open(path)
        .map_err(|e| AnalysisError::DecodingError(format!("{}: {}", path, e)))?;
    decode_source(Box::new(file), extension_hint(path))
}

fn decode_source(
    source: Box<dyn MediaSource>,
    extension: Option<&str>,
) -> Result<DecodedAudio, AnalysisError> {
    let mss = MediaSourceStream::new(source, Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AnalysisError::DecodingError("No supported audio tracks found".to_string()))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| AnalysisError::DecodingError("Unknown sample rate".to_string()))?;
    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut interleaved: Vec<f32> = Vec::new();
    let mut channels = track.codec_params.channels.map_or(0, |c| c.count());
    let mut skipped_packets = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                channels = spec.channels.count();
                let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buf.copy_interleaved_ref(decoded);
                interleaved.extend_from_slice(buf.samples());
            }
            Err(SymphoniaError::DecodeError(msg)) => {
                // Corrupted packet: skip it and keep going
                skipped_packets += 1;
                log::warn!("Skipping undecodable packet: {}", msg);
            }
            Err(e) => return Err(e.into()),
        }
    }

    if interleaved.is_empty() || channels == 0 {
        return Err(AnalysisError::DecodingError(
            "Stream contains no audio samples".to_string(),
        ));
    }

    let samples = downmix_to_mono(&interleaved, channels)?;
    log::debug!(
        "Decoded {} frames at {} Hz ({} channels, {} packets skipped)",
        samples.len(),
        sample_rate,
        channels,
        skipped_packets
    );

    Ok(DecodedAudio {
        samples,
        sample_rate,
        channels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes(samples: &[i16], channels: u16, sample_rate: u32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_decode_mono_wav() {
        let samples: Vec<i16> = (0..8000).map(|i| ((i % 100) as i16 - 50) * 300).collect();
        let decoded = decode_bytes(&wav_bytes(&samples, 1, 8000), Some("wav")).unwrap();
        assert_eq!(decoded.sample_rate, 8000);
        assert_eq!(decoded.channels, 1);
        assert_eq!(decoded.samples.len(), 8000);
        assert!((decoded.duration_seconds() - 1.0).abs() < 1e-6);
        assert!(decoded.samples.iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn test_decode_stereo_downmix() {
        // Left = +half scale, right = -half scale: mono is silent
        let samples: Vec<i16> = (0..4000).flat_map(|_| [16384i16, -16384i16]).collect();
        let decoded = decode_bytes(&wav_bytes(&samples, 2, 16000), None).unwrap();
        assert_eq!(decoded.channels, 2);
        assert_eq!(decoded.samples.len(), 4000);
        assert!(decoded.samples.iter().all(|s| s.abs() < 1e-4));
    }

    #[test]
    fn test_garbage_is_decoding_error() {
        let garbage = vec![0x42u8; 1024];
        assert!(matches!(
            decode_bytes(&garbage, Some("wav")),
            Err(AnalysisError::DecodingError(_))
        ));
        assert!(matches!(decode_bytes(&[], None), Err(AnalysisError::DecodingError(_))));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            decode_audio("/nonexistent/file.wav"),
            Err(AnalysisError::DecodingError(_))
        ));
    }

    #[test]
    fn test_extension_hint() {
        assert_eq!(extension_hint("track.mp3"), Some("mp3"));
        assert_eq!(extension_hint("dir/take.final.flac"), Some("flac"));
        assert_eq!(extension_hint("noext"), None);
    }
}
