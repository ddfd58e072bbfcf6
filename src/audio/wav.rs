//! Minimal RIFF/WAVE container writer for mono 16-bit PCM.
//!
//! The classification backend parses standard uncompressed WAV files, so the
//! header layout here is load-bearing: every field, offset and endianness
//! must match the canonical 44-byte header exactly.  The file is synthesized
//! byte by byte — no container or codec crate is involved on the write path.
//!
//! Layout (all integers little-endian):
//!
//! ```text
//! offset  size  field
//!      0     4  "RIFF"
//!      4     4  36 + data_size
//!      8     4  "WAVE"
//!     12     4  "fmt "
//!     16     4  16                (fmt chunk size)
//!     20     2  1                 (PCM tag)
//!     22     2  1                 (channels, fixed mono)
//!     24     4  sample rate
//!     28     4  sample rate * 2   (byte rate)
//!     32     2  2                 (block align)
//!     34     2  16                (bits per sample)
//!     36     4  "data"
//!     40     4  data_size = sample count * 2
//!     44     …  samples, i16 LE
//! ```

/// Size of the fixed header in bytes.
pub const HEADER_LEN: usize = 44;

const CHANNELS: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;

/// Serialize `samples` into a complete mono 16-bit PCM WAV byte buffer.
///
/// A zero-length sample slice is valid and yields a 44-byte buffer with a
/// `data` chunk size of 0.
///
/// # Example
///
/// ```rust
/// use voicescreen::audio::{write_wav, HEADER_LEN};
///
/// let wav = write_wav(&[0, 1, -1], 44_100);
/// assert_eq!(wav.len(), HEADER_LEN + 6);
/// assert_eq!(&wav[0..4], b"RIFF");
/// ```
pub fn write_wav(samples: &[i16], sample_rate: u32) -> Vec<u8> {
    let data_size = (samples.len() * 2) as u32;
    let byte_rate = sample_rate * u32::from(CHANNELS) * u32::from(BITS_PER_SAMPLE) / 8;
    let block_align = CHANNELS * BITS_PER_SAMPLE / 8;

    let mut buf = Vec::with_capacity(HEADER_LEN + samples.len() * 2);

    // RIFF chunk
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(36 + data_size).to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    // fmt sub-chunk
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes()); // linear PCM
    buf.extend_from_slice(&CHANNELS.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    // data sub-chunk
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for &s in samples {
        buf.extend_from_slice(&s.to_le_bytes());
    }

    buf
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn u16_at(buf: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes([buf[offset], buf[offset + 1]])
    }

    fn u32_at(buf: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([
            buf[offset],
            buf[offset + 1],
            buf[offset + 2],
            buf[offset + 3],
        ])
    }

    // ---- Header layout ------------------------------------------------------

    #[test]
    fn header_fields_at_documented_offsets() {
        let samples = [100_i16, -100, 0, 32_767];
        let wav = write_wav(&samples, 44_100);

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(u32_at(&wav, 4), 36 + 8); // data_size = 4 * 2
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(u32_at(&wav, 16), 16);
        assert_eq!(u16_at(&wav, 20), 1); // PCM
        assert_eq!(u16_at(&wav, 22), 1); // mono
        assert_eq!(u32_at(&wav, 24), 44_100);
        assert_eq!(u32_at(&wav, 28), 44_100 * 2); // byte rate
        assert_eq!(u16_at(&wav, 32), 2); // block align
        assert_eq!(u16_at(&wav, 34), 16); // bits per sample
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(u32_at(&wav, 40), 8);
    }

    #[test]
    fn data_section_is_little_endian_samples_in_order() {
        let samples = [1_i16, -1, 0x1234, i16::MIN];
        let wav = write_wav(&samples, 8_000);

        let mut expected = Vec::new();
        for s in samples {
            expected.extend_from_slice(&s.to_le_bytes());
        }
        assert_eq!(&wav[HEADER_LEN..], &expected[..]);
    }

    #[test]
    fn caller_supplied_sample_rate_is_used_verbatim() {
        for rate in [8_000_u32, 16_000, 22_050, 44_100, 48_000] {
            let wav = write_wav(&[0], rate);
            assert_eq!(u32_at(&wav, 24), rate);
            assert_eq!(u32_at(&wav, 28), rate * 2);
        }
    }

    // ---- Empty session ------------------------------------------------------

    #[test]
    fn zero_samples_yields_valid_44_byte_header() {
        let wav = write_wav(&[], 44_100);
        assert_eq!(wav.len(), HEADER_LEN);
        assert_eq!(u32_at(&wav, 4), 36);
        assert_eq!(u32_at(&wav, 40), 0);
    }

    // ---- Known-good buffer sizes -------------------------------------------

    #[test]
    fn reference_buffer_sizes() {
        // 7 samples → 14 data bytes → 58 total
        let samples = [32_767_i16, -32_768, 16_383, -16_384, 0, 8_191, -32_768];
        let wav = write_wav(&samples, 44_100);

        assert_eq!(wav.len(), 58);
        assert_eq!(u32_at(&wav, 4), 50);
        assert_eq!(u32_at(&wav, 40), 14);
    }

    // ---- Independent parser (hound) -----------------------------------------

    /// A second, independently-written WAV parser must agree with our
    /// hand-rolled header and recover the exact sample sequence.
    #[test]
    fn hound_round_trip() {
        let samples = [0_i16, 42, -42, i16::MAX, i16::MIN, 7];
        let wav = write_wav(&samples, 44_100);

        let mut reader =
            hound::WavReader::new(std::io::Cursor::new(wav)).expect("hound rejects header");
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 44_100);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, hound::SampleFormat::Int);

        let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn hound_accepts_empty_file() {
        let wav = write_wav(&[], 22_050);
        let mut reader =
            hound::WavReader::new(std::io::Cursor::new(wav)).expect("hound rejects header");
        assert_eq!(reader.spec().sample_rate, 22_050);
        assert_eq!(reader.samples::<i16>().count(), 0);
    }
}
