//! Float → 16-bit PCM quantization with saturation.
//!
//! [`quantize`] converts a flattened `f32` signal into the signed 16-bit
//! samples stored in the container.  The scaling is deliberately asymmetric:
//! negative samples scale by 32768, non-negative samples by 32767, so the
//! full `[-1.0, 1.0]` float range maps onto `[-32768, 32767]` without
//! overflow at positive full scale.  Scaled values are truncated, not
//! rounded.  Both choices are load-bearing: earlier recordings and their
//! stored analysis results were produced with exactly this mapping.

/// Scale factor applied to negative samples.
const NEG_SCALE: f32 = 32_768.0;
/// Scale factor applied to non-negative samples.
const POS_SCALE: f32 = 32_767.0;

/// Quantize a float signal into signed 16-bit PCM samples.
///
/// Each sample is clamped to `[-1.0, 1.0]`, then scaled and truncated:
///
/// * `s <  0.0` → `(s * 32768.0) as i16`
/// * `s >= 0.0` → `(s * 32767.0) as i16`
///
/// The function is pure and deterministic — the same input sequence always
/// produces the same output sequence, which is what makes the golden-file
/// and round-trip tests possible.
///
/// # Example
///
/// ```rust
/// use voicescreen::audio::quantize;
///
/// assert_eq!(quantize(&[1.0, -1.0, 0.0]), vec![32767, -32768, 0]);
/// ```
pub fn quantize(signal: &[f32]) -> Vec<i16> {
    signal
        .iter()
        .map(|&s| {
            let s = s.clamp(-1.0, 1.0);
            if s < 0.0 {
                (s * NEG_SCALE) as i16
            } else {
                (s * POS_SCALE) as i16
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
