use std::fs::File;
use std::path::Path;

use symphonia::core::audio::{AudioBuffer, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_FLAC};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::audio::AudioDecoder;
use crate::error::DecodeError;
use crate::models::{AudioFormat, DecodeOrigin, DecodedAudio};

/// Stream parameters reported once by the decode engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamInfo {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub total_frames: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Continue,
    Abort,
}

/// Receiver for the three decode-engine callbacks
pub trait FrameCallbacks {
    fn on_metadata(&mut self, info: &StreamInfo);

    /// One decoded block, as one slice of native-width samples per channel
    fn on_frame(&mut self, channels: &[&[i32]]) -> FrameStatus;

    /// Terminal stream error
    fn on_error(&mut self, message: String);
}

/// Interleaves decoded blocks into a packed little-endian PCM buffer
#[derive(Debug, Default)]
pub struct PcmFrameCollector {
    info: Option<StreamInfo>,
    data: Vec<u8>,
    frames: u64,
    error: Option<String>,
}

impl PcmFrameCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Depth samples are packed at: 24-bit stays 24, everything else becomes 16
    fn packed_bits(info: &StreamInfo) -> u16 {
        if info.bits_per_sample == 24 {
            24
        } else {
            16
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Consume the collector. Only a stream pumped to completion yields audio.
    pub fn finish(self) -> Result<DecodedAudio, DecodeError> {
        if let Some(message) = self.error {
            return Err(DecodeError::StreamDecodeFailure(message));
        }

        let info = self.info.ok_or_else(|| {
            DecodeError::StreamDecodeFailure("stream carried no format metadata".to_string())
        })?;

        if let Some(total) = info.total_frames {
            if self.frames < total {
                return Err(DecodeError::StreamDecodeFailure(format!(
                    "premature end of stream after {} of {} frames",
                    self.frames, total
                )));
            }
        }

        if self.frames == 0 {
            return Err(DecodeError::StreamDecodeFailure(
                "stream contained no audio frames".to_string(),
            ));
        }

        let format = AudioFormat::new(info.sample_rate, info.channels, Self::packed_bits(&info));
        Ok(DecodedAudio::new(format, self.data, DecodeOrigin::Streamed))
    }
}

impl FrameCallbacks for PcmFrameCollector {
    fn on_metadata(&mut self, info: &StreamInfo) {
        if self.info.is_none() {
            if let Some(total) = info.total_frames {
                let bytes_per_frame =
                    info.channels as u64 * (Self::packed_bits(info) as u64 / 8);
                self.data.reserve((total * bytes_per_frame).min(1 << 26) as usize);
            }
            self.info = Some(*info);
        }
    }

    fn on_frame(&mut self, channels: &[&[i32]]) -> FrameStatus {
        let info = match self.info {
            Some(info) => info,
            None => {
                self.on_error("audio frame arrived before stream metadata".to_string());
                return FrameStatus::Abort;
            }
        };

        if channels.len() != info.channels as usize {
            self.on_error(format!(
                "frame has {} channels, stream declared {}",
                channels.len(),
                info.channels
            ));
            return FrameStatus::Abort;
        }

        let block_len = channels.first().map_or(0, |ch| ch.len());
        let packed = Self::packed_bits(&info);

        for i in 0..block_len {
            for channel in channels {
                let sample = channel[i];
                match packed {
                    24 => self.data.extend_from_slice(&sample.to_le_bytes()[..3]),
                    _ => self.data.extend_from_slice(&(sample as i16).to_le_bytes()),
                }
            }
        }

        self.frames += block_len as u64;
        FrameStatus::Continue
    }

    fn on_error(&mut self, message: String) {
        log::warn!("FLAC stream error: {}", message);
        if self.error.is_none() {
            self.error = Some(message);
        }
    }
}

/// Pump a FLAC file through symphonia, reporting to `callbacks`.
///
/// Setup failures are returned directly; anything after the first packet goes
/// through `on_error`.
pub fn pump_stream<C: FrameCallbacks>(path: &Path, callbacks: &mut C) -> Result<(), DecodeError> {
    let file = File::open(path)?;
    let media_source = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    hint.with_extension("flac");

    let probed = symphonia::default::get_probe()
        .format(&hint, media_source, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| DecodeError::StreamDecodeFailure(format!("not a FLAC stream: {}", e)))?;

    let mut format_reader = probed.format;

    let track = format_reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec == CODEC_TYPE_FLAC)
        .ok_or_else(|| DecodeError::StreamDecodeFailure("no FLAC track found".to_string()))?;

    let track_id = track.id;
    let params = track.codec_params.clone();

    let mut decoder = symphonia::default::get_codecs()
        .make(&params, &DecoderOptions::default())
        .map_err(|e| DecodeError::StreamDecodeFailure(format!("failed to create decoder: {}", e)))?;

    let bits = params.bits_per_sample.unwrap_or(16).clamp(1, 32) as u16;
    let mut info = match (params.sample_rate, params.channels) {
        (Some(sample_rate), Some(channels)) => Some(StreamInfo {
            sample_rate,
            channels: channels.count() as u16,
            bits_per_sample: bits,
            total_frames: params.n_frames,
        }),
        _ => None,
    };

    if let Some(info) = &info {
        callbacks.on_metadata(info);
    }

    loop {
        let packet = match format_reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(err) => {
                callbacks.on_error(format!("failed to read packet: {}", err));
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(err) => {
                callbacks.on_error(format!("failed to decode packet: {}", err));
                break;
            }
        };

        if info.is_none() {
            let spec = *decoded.spec();
            let stream_info = StreamInfo {
                sample_rate: spec.rate,
                channels: spec.channels.count() as u16,
                bits_per_sample: bits,
                total_frames: params.n_frames,
            };
            callbacks.on_metadata(&stream_info);
            info = Some(stream_info);
        }

        // Symphonia scales integer output to the full i32 range
        let mut block = AudioBuffer::<i32>::new(decoded.capacity() as u64, *decoded.spec());
        decoded.convert(&mut block);
        let shift = 32 - bits as u32;
        if shift > 0 {
            block.transform(|sample| sample >> shift);
        }

        let planes = block.planes();
        if callbacks.on_frame(planes.planes()) == FrameStatus::Abort {
            break;
        }
    }

    Ok(())
}

/// Frame-callback decoder for FLAC files
#[derive(Debug, Default, Clone, Copy)]
pub struct FlacDecoder;

impl FlacDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl AudioDecoder for FlacDecoder {
    fn name(&self) -> &'static str {
        "flac"
    }

    fn decode(&self, path: &Path) -> Result<DecodedAudio, DecodeError> {
        let mut collector = PcmFrameCollector::new();
        pump_stream(path, &mut collector)?;

        log::debug!("FLAC stream delivered {} frames", collector.frames());
        collector.finish()
    }
}
