use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::audio::AudioDecoder;
use crate::error::DecodeError;
use crate::models::{AudioFormat, DecodeOrigin, DecodedAudio};

const FORMAT_PCM: u16 = 1;
const FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// Size of the header written by [`write_wav`]
pub const WAV_HEADER_LEN: usize = 44;

/// Direct parser for uncompressed RIFF/WAVE files
#[derive(Debug, Default, Clone, Copy)]
pub struct WavDecoder;

impl WavDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Parse a RIFF/WAVE stream into its format and raw sample bytes.
    ///
    /// Sub-chunks may appear in any order; unknown ones are skipped by their
    /// declared size. Exactly the declared `data` length is read.
    pub fn parse<R: Read + Seek>(reader: &mut R) -> Result<(AudioFormat, Vec<u8>), DecodeError> {
        let mut riff = [0u8; 12];
        read_header_bytes(reader, &mut riff, "file too short for a RIFF header")?;

        if &riff[0..4] != b"RIFF" || &riff[8..12] != b"WAVE" {
            return Err(DecodeError::MalformedHeader(
                "missing RIFF/WAVE magic".to_string(),
            ));
        }

        let mut format: Option<AudioFormat> = None;

        while let Some((id, size)) = read_chunk_header(reader)? {
            match &id {
                b"fmt " => {
                    format = Some(parse_fmt_chunk(reader, size)?);
                }
                b"data" => {
                    let format = format.ok_or_else(|| {
                        DecodeError::MalformedHeader("data chunk precedes fmt chunk".to_string())
                    })?;

                    let mut data = Vec::with_capacity((size as usize).min(1 << 24));
                    reader.by_ref().take(size as u64).read_to_end(&mut data)?;
                    if data.len() < size as usize {
                        return Err(DecodeError::MalformedHeader(format!(
                            "data chunk truncated: declared {} bytes, found {}",
                            size,
                            data.len()
                        )));
                    }

                    let aligned = format.align_down(data.len());
                    if aligned != data.len() {
                        log::debug!(
                            "Dropping {} trailing bytes that do not form a whole frame",
                            data.len() - aligned
                        );
                        data.truncate(aligned);
                    }

                    return Ok((format, data));
                }
                _ => {
                    log::trace!(
                        "Skipping WAV chunk '{}' ({} bytes)",
                        String::from_utf8_lossy(&id),
                        size
                    );
                    skip_chunk(reader, size as u64)?;
                }
            }
        }

        Err(DecodeError::MissingDataChunk)
    }
}

impl AudioDecoder for WavDecoder {
    fn name(&self) -> &'static str {
        "wav"
    }

    fn decode(&self, path: &Path) -> Result<DecodedAudio, DecodeError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let (format, data) = Self::parse(&mut reader)?;

        Ok(DecodedAudio::new(format, data, DecodeOrigin::Parsed))
    }
}

fn read_header_bytes<R: Read>(reader: &mut R, buf: &mut [u8], what: &str) -> Result<(), DecodeError> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => DecodeError::MalformedHeader(what.to_string()),
        _ => DecodeError::Io(e),
    })
}

/// Next chunk id and size, or `None` at end of file
fn read_chunk_header<R: Read>(reader: &mut R) -> Result<Option<([u8; 4], u32)>, DecodeError> {
    let mut header = [0u8; 8];
    let mut filled = 0;
    while filled < header.len() {
        match reader.read(&mut header[filled..]) {
            Ok(0) => return Ok(None),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(DecodeError::Io(e)),
        }
    }

    let id = [header[0], header[1], header[2], header[3]];
    let size = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    Ok(Some((id, size)))
}

fn skip_chunk<R: Seek>(reader: &mut R, size: u64) -> Result<(), DecodeError> {
    // RIFF chunks are word aligned
    let padded = size + (size & 1);
    reader.seek(SeekFrom::Current(padded as i64))?;
    Ok(())
}

fn parse_fmt_chunk<R: Read + Seek>(reader: &mut R, size: u32) -> Result<AudioFormat, DecodeError> {
    if size < 16 {
        return Err(DecodeError::MalformedHeader(format!(
            "fmt chunk is {} bytes, expected at least 16",
            size
        )));
    }

    let mut fmt = [0u8; 16];
    read_header_bytes(reader, &mut fmt, "fmt chunk truncated")?;
    let mut consumed = 16u64;

    let tag = u16::from_le_bytes([fmt[0], fmt[1]]);
    let channels = u16::from_le_bytes([fmt[2], fmt[3]]);
    let sample_rate = u32::from_le_bytes([fmt[4], fmt[5], fmt[6], fmt[7]]);
    let bit_depth = u16::from_le_bytes([fmt[14], fmt[15]]);

    match tag {
        FORMAT_PCM => {}
        FORMAT_EXTENSIBLE if size >= 40 => {
            // cbSize, valid bits, channel mask, then the sub-format GUID
            let mut ext = [0u8; 24];
            read_header_bytes(reader, &mut ext, "extensible fmt chunk truncated")?;
            consumed += 24;

            let sub_format = u16::from_le_bytes([ext[8], ext[9]]);
            if sub_format != FORMAT_PCM {
                return Err(DecodeError::UnsupportedEncoding(format!(
                    "extensible sub-format {:#06x} is not PCM",
                    sub_format
                )));
            }
        }
        other => {
            return Err(DecodeError::UnsupportedEncoding(format!(
                "format tag {:#06x} is not PCM",
                other
            )));
        }
    }

    if channels == 0 || sample_rate == 0 {
        return Err(DecodeError::MalformedHeader(format!(
            "invalid fmt values: {} channels at {} Hz",
            channels, sample_rate
        )));
    }

    if !matches!(bit_depth, 8 | 16 | 24 | 32) {
        return Err(DecodeError::UnsupportedEncoding(format!(
            "{}-bit samples",
            bit_depth
        )));
    }

    let remaining = size as u64 - consumed + (size as u64 & 1);
    if remaining > 0 {
        reader.seek(SeekFrom::Current(remaining as i64))?;
    }

    AudioFormat::checked(sample_rate, channels, bit_depth).ok_or_else(|| {
        DecodeError::MalformedHeader(format!(
            "{} channels of {}-bit samples overflow the block alignment",
            channels, bit_depth
        ))
    })
}

/// Write `data` as a canonical 44-byte-header PCM WAV
pub fn write_wav<W: Write>(writer: &mut W, format: &AudioFormat, data: &[u8]) -> io::Result<()> {
    let data_len = u32::try_from(data.len())
        .ok()
        .filter(|len| *len <= u32::MAX - 36)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "PCM data too large for WAV"))?;

    let byte_rate = u32::try_from(format.avg_bytes_per_sec()).map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidInput, "byte rate too large for WAV header")
    })?;

    writer.write_all(b"RIFF")?;
    writer.write_all(&(36 + data_len).to_le_bytes())?;
    writer.write_all(b"WAVE")?;

    writer.write_all(b"fmt ")?;
    writer.write_all(&16u32.to_le_bytes())?;
    writer.write_all(&FORMAT_PCM.to_le_bytes())?;
    writer.write_all(&format.channels.to_le_bytes())?;
    writer.write_all(&format.sample_rate.to_le_bytes())?;
    writer.write_all(&byte_rate.to_le_bytes())?;
    writer.write_all(&format.block_align.to_le_bytes())?;
    writer.write_all(&format.bit_depth.to_le_bytes())?;

    writer.write_all(b"data")?;
    writer.write_all(&data_len.to_le_bytes())?;
    writer.write_all(data)?;

    Ok(())
}

/// Save PCM bytes to a WAV file at `path`
pub fn save_wav<P: AsRef<Path>>(path: P, format: &AudioFormat, data: &[u8]) -> io::Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write_wav(&mut writer, format, data)?;
    writer.flush()
}
