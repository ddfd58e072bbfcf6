//! Live visual readout data — amplitude bars and frequency magnitudes.
//!
//! The egui widget renders a bar chart while recording.  Both snapshots are
//! computed per delivered chunk on the accumulator thread, independently of
//! the recording pipeline: the readout is purely cosmetic and its failure
//! never affects the encoded output.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// FFT window size for the spectrum readout.
const FFT_SIZE: usize = 1024;

// ---------------------------------------------------------------------------
// WaveformData
// ---------------------------------------------------------------------------

/// Amplitude snapshot for the UI waveform bar chart.
///
/// Each element of `bars` is an RMS amplitude value in `[0.0, 1.0]`
/// representing an equal-width slice of the input audio.
#[derive(Debug, Clone)]
pub struct WaveformData {
    /// RMS amplitude per bar, clamped to `[0.0, 1.0]`.
    pub bars: Vec<f32>,
}

impl WaveformData {
    /// Compute `num_bars` RMS amplitude values from `audio`.
    ///
    /// The audio is divided into `num_bars` equal-sized slices; the RMS of
    /// each slice becomes one bar value.  If `audio` is shorter than
    /// `num_bars` the remaining bars are padded with `0.0`.
    pub fn compute(audio: &[f32], num_bars: usize) -> Self {
        if num_bars == 0 {
            return Self { bars: Vec::new() };
        }

        if audio.is_empty() {
            return Self {
                bars: vec![0.0; num_bars],
            };
        }

        let slice_len = (audio.len() / num_bars).max(1);

        let mut bars: Vec<f32> = audio
            .chunks(slice_len)
            .take(num_bars)
            .map(|slice| {
                let mean_sq: f32 =
                    slice.iter().map(|s| s * s).sum::<f32>() / slice.len() as f32;
                mean_sq.sqrt().min(1.0)
            })
            .collect();

        bars.resize(num_bars, 0.0);

        Self { bars }
    }

    /// Peak bar value across the waveform.
    pub fn peak(&self) -> f32 {
        self.bars.iter().cloned().fold(0.0_f32, f32::max)
    }
}

// ---------------------------------------------------------------------------
// SpectrumData
// ---------------------------------------------------------------------------

/// Frequency-magnitude snapshot for the live readout.
///
/// A Hann window and forward FFT are applied to the most recent
/// [`FFT_SIZE`] samples of the chunk; positive-frequency magnitudes are
/// folded into `num_bins` display bins and clamped to `[0.0, 1.0]`.
#[derive(Debug, Clone)]
pub struct SpectrumData {
    /// Normalized magnitude per display bin, in `[0.0, 1.0]`.
    pub bins: Vec<f32>,
}

impl SpectrumData {
    /// Compute `num_bins` magnitude values from the tail of `audio`.
    ///
    /// Shorter inputs are zero-padded to the FFT size; `num_bins == 0`
    /// returns an empty snapshot.
    pub fn compute(audio: &[f32], num_bins: usize) -> Self {
        if num_bins == 0 {
            return Self { bins: Vec::new() };
        }

        // Most recent FFT_SIZE samples, zero-padded on the right if short.
        let start = audio.len().saturating_sub(FFT_SIZE);
        let window = &audio[start..];

        let mut input: Vec<Complex<f32>> = (0..FFT_SIZE)
            .map(|i| {
                let s = window.get(i).copied().unwrap_or(0.0);
                Complex::new(s * hann(i, FFT_SIZE), 0.0)
            })
            .collect();

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);
        fft.process(&mut input);

        // Positive frequencies only, scaled so a full-scale tone lands
        // around 0.5 before clamping.
        let magnitudes: Vec<f32> = input[..FFT_SIZE / 2]
            .iter()
            .map(|c| c.norm() * 2.0 / FFT_SIZE as f32)
            .collect();

        // Fold the half-spectrum into num_bins display bins by averaging.
        let per_bin = (magnitudes.len() / num_bins).max(1);
        let mut bins: Vec<f32> = magnitudes
            .chunks(per_bin)
            .take(num_bins)
            .map(|bin| {
                let mean = bin.iter().sum::<f32>() / bin.len() as f32;
                mean.min(1.0)
            })
            .collect();
        bins.resize(num_bins, 0.0);

        Self { bins }
    }
}

/// Hann window coefficient for index `i` of an `n`-point window.
fn hann(i: usize, n: usize) -> f32 {
    0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (n - 1) as f32).cos())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
