//! Audio decoding
//!
//! Uses symphonia for format-agnostic decoding (OGG/Vorbis, MP3, FLAC, WAV,
//! AAC, ...). Channels are kept interleaved; merge rendering decides the final
//! layout.

use crate::audio::{AudioBuffer, AudioError, AudioResult};
use std::path::Path;
use symphonia::core::audio::{AudioBuffer as SymphoniaBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::conv::FromSample;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;

/// Decode an audio file to interleaved f32 PCM
///
/// **Algorithm:**
/// 1. Open file and probe format (extension used as a hint only)
/// 2. Pick the first track with a real codec
/// 3. Decode every packet of that track, skipping corrupt packets
/// 4. Interleave channels into one f32 vector
///
/// # Errors
/// * File I/O errors
/// * Unsupported container or codec
/// * Missing sample rate / channel information
pub fn decode_audio_file(file_path: &Path) -> AudioResult<AudioBuffer> {
    tracing::debug!(path = %file_path.display(), "Decoding audio file");

    let file = std::fs::File::open(file_path).map_err(|e| {
        AudioError::Decode(format!("Failed to open audio file {}: {}", file_path.display(), e))
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = file_path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(&extension.to_ascii_lowercase());
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| AudioError::Decode(format!("Failed to probe {}: {}", file_path.display(), e)))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::Decode("No audio track found in file".to_string()))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| AudioError::Decode("Sample rate unknown".to_string()))?;
    let mut channels = track.codec_params.channels.map(|c| c.count() as u16);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| {
            AudioError::Decode(format!("Failed to create decoder for {}: {}", file_path.display(), e))
        })?;

    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => {
                return Err(AudioError::Decode(format!("Error reading packet: {}", e)));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                tracing::warn!(path = %file_path.display(), "Skipping corrupt packet: {}", e);
                continue;
            }
            Err(e) => {
                return Err(AudioError::Decode(format!(
                    "Failed to decode packet in {}: {}",
                    file_path.display(),
                    e
                )));
            }
        };

        // Some codecs only report the layout on the first decoded buffer
        if channels.is_none() {
            channels = Some(decoded.spec().channels.count() as u16);
        }

        append_interleaved(&decoded, &mut samples);
    }

    let channels =
        channels.ok_or_else(|| AudioError::Decode("Channel layout unknown".to_string()))?;
    let buffer = AudioBuffer::new(samples, sample_rate, channels);

    tracing::debug!(
        path = %file_path.display(),
        sample_rate,
        channels,
        duration_ms = buffer.duration_ms(),
        "Audio decoding complete"
    );

    Ok(buffer)
}

/// Append one decoded buffer, interleaved, as f32
fn append_interleaved(decoded: &AudioBufferRef, out: &mut Vec<f32>) {
    match decoded {
        AudioBufferRef::U8(buf) => interleave_into(buf, out),
        AudioBufferRef::U16(buf) => interleave_into(buf, out),
        AudioBufferRef::U24(buf) => interleave_into(buf, out),
        AudioBufferRef::U32(buf) => interleave_into(buf, out),
        AudioBufferRef::S8(buf) => interleave_into(buf, out),
        AudioBufferRef::S16(buf) => interleave_into(buf, out),
        AudioBufferRef::S24(buf) => interleave_into(buf, out),
        AudioBufferRef::S32(buf) => interleave_into(buf, out),
        AudioBufferRef::F32(buf) => interleave_into(buf, out),
        AudioBufferRef::F64(buf) => interleave_into(buf, out),
    }
}

fn interleave_into<S>(buf: &SymphoniaBuffer<S>, out: &mut Vec<f32>)
where
    S: Sample,
    f32: FromSample<S>,
{
    let num_channels = buf.spec().channels.count();
    let num_frames = buf.frames();
    out.reserve(num_frames * num_channels);

    for frame_idx in 0..num_frames {
        for ch in 0..num_channels {
            out.push(f32::from_sample(buf.chan(ch)[frame_idx]));
        }
    }
}
