//! Audio file export for Cantor
//!
//! Encodes a rendered buffer as MP3 (LAME, constant bitrate) or 16-bit WAV.
//! The encoded bytes are written to a temporary file next to the destination
//! and renamed into place, so a failed export never leaves a partial file.

use std::io::{Cursor, Write};
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use log::debug;
use mp3lame_encoder::{Bitrate, Builder, DualPcm, FlushNoGap, MonoPcm, Quality};

use crate::config::RenderConfig;
use crate::engine::buffer::AudioBuffer;
use crate::error::{CantorError, Result};

/// Container and codec settings for an export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Constant-bitrate MP3
    Mp3 { bitrate_kbps: u32 },
    /// 16-bit integer PCM WAV
    Wav,
}

impl ExportFormat {
    /// Pick the format from the output file extension
    pub fn from_path(path: &Path, config: &RenderConfig) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("mp3") => Ok(ExportFormat::Mp3 {
                bitrate_kbps: config.export_bitrate_kbps,
            }),
            Some("wav") => Ok(ExportFormat::Wav),
            other => Err(CantorError::UnsupportedFormat {
                format: format!(
                    "output extension {:?} (expected .mp3 or .wav)",
                    other.unwrap_or("")
                ),
            }),
        }
    }
}

/// Encode `buffer` and write it atomically to `path`
pub fn export_audio(buffer: &AudioBuffer, path: &Path, format: ExportFormat) -> Result<()> {
    let bytes = match format {
        ExportFormat::Mp3 { bitrate_kbps } => encode_mp3(buffer, bitrate_kbps)?,
        ExportFormat::Wav => encode_wav(buffer)?,
    };
    debug!(
        "Encoded {} bytes as {:?} for {}",
        bytes.len(),
        format,
        path.display()
    );
    write_atomic(path, &bytes)
}

/// Encode a mono or stereo buffer as MP3
pub fn encode_mp3(buffer: &AudioBuffer, bitrate_kbps: u32) -> Result<Vec<u8>> {
    let channels = buffer.channels();
    if channels == 0 || channels > 2 {
        return Err(CantorError::UnsupportedFormat {
            format: format!("{}-channel audio (only mono/stereo supported)", channels),
        });
    }

    let mut builder = Builder::new().ok_or_else(|| CantorError::Encoding {
        reason: "failed to allocate LAME encoder".to_string(),
    })?;
    builder.set_num_channels(channels as u8).map_err(lame_error)?;
    builder.set_sample_rate(buffer.sample_rate).map_err(lame_error)?;
    builder.set_brate(bitrate(bitrate_kbps)?).map_err(lame_error)?;
    builder.set_quality(Quality::Best).map_err(lame_error)?;
    let mut encoder = builder.build().map_err(lame_error)?;

    let pcm: Vec<Vec<i16>> = buffer.samples.iter().map(|ch| to_pcm16(ch)).collect();

    let mut output = Vec::new();
    output.reserve(mp3lame_encoder::max_required_buffer_size(buffer.len()));

    let result = if channels == 1 {
        encoder.encode_to_vec(MonoPcm(&pcm[0]), &mut output)
    } else {
        encoder.encode_to_vec(
            DualPcm {
                left: &pcm[0],
                right: &pcm[1],
            },
            &mut output,
        )
    };
    result.map_err(lame_error)?;
    // LAME needs up to 7200 bytes for the final frames
    output.reserve(7200);
    encoder
        .flush_to_vec::<FlushNoGap>(&mut output)
        .map_err(lame_error)?;

    Ok(output)
}

/// Encode a buffer as 16-bit PCM WAV
pub fn encode_wav(buffer: &AudioBuffer) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels: buffer.channels() as u16,
        sample_rate: buffer.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec).map_err(wav_error)?;
        for sample in buffer.to_interleaved() {
            writer.write_sample(to_i16(sample)).map_err(wav_error)?;
        }
        writer.finalize().map_err(wav_error)?;
    }

    Ok(cursor.into_inner())
}

/// Write `bytes` to a sibling temporary file, then rename it onto `path`
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| CantorError::Io(e.error))?;
    Ok(())
}

fn bitrate(kbps: u32) -> Result<Bitrate> {
    let bitrate = match kbps {
        8 => Bitrate::Kbps8,
        16 => Bitrate::Kbps16,
        24 => Bitrate::Kbps24,
        32 => Bitrate::Kbps32,
        40 => Bitrate::Kbps40,
        48 => Bitrate::Kbps48,
        64 => Bitrate::Kbps64,
        80 => Bitrate::Kbps80,
        96 => Bitrate::Kbps96,
        112 => Bitrate::Kbps112,
        128 => Bitrate::Kbps128,
        160 => Bitrate::Kbps160,
        192 => Bitrate::Kbps192,
        224 => Bitrate::Kbps224,
        256 => Bitrate::Kbps256,
        320 => Bitrate::Kbps320,
        other => {
            return Err(CantorError::InvalidConfig {
                reason: format!("unsupported MP3 bitrate {} kbps", other),
            })
        }
    };
    Ok(bitrate)
}

#[inline]
fn to_i16(sample: f32) -> i16 {
    (sample * 32767.0).clamp(-32768.0, 32767.0) as i16
}

fn to_pcm16(samples: &[f32]) -> Vec<i16> {
    samples.iter().map(|&s| to_i16(s)).collect()
}

fn lame_error<E: std::fmt::Debug>(e: E) -> CantorError {
    CantorError::Encoding {
        reason: format!("LAME: {:?}", e),
    }
}

fn wav_error(e: hound::Error) -> CantorError {
    CantorError::Encoding {
        reason: format!("WAV: {}", e),
    }
}

// ============================================================================
// Tests
// ============================================================================
