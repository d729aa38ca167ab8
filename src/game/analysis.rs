/// Spectrum analysis over per-frame FFT bins reported by the audio boundary
/// (one byte per bin, 0..=255). Everything here is cosmetic input for
/// renderers and the advanced chart pass; judgment timing never reads it.

const BEAT_THRESHOLD: f32 = 0.8;
const LOW_BAND_FRACTION: f32 = 0.1;

/// Normalized energy per register, each in [0, 1].
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct BandLevels {
    pub low: f32,
    pub mid: f32,
    pub high: f32,
}

pub struct BeatDetector {
    beat_threshold: f32,
}

impl BeatDetector {
    pub fn new() -> Self {
        Self {
            beat_threshold: BEAT_THRESHOLD,
        }
    }

    /// A beat registers when the average energy of the low tenth of the
    /// spectrum crosses the threshold. Empty input never beats.
    pub fn detect_beat(&self, spectrum: &[u8]) -> bool {
        if spectrum.is_empty() {
            return false;
        }

        let low_end = ((spectrum.len() as f32 * LOW_BAND_FRACTION) as usize).max(1);
        let sum: u32 = spectrum[..low_end.min(spectrum.len())]
            .iter()
            .map(|&bin| bin as u32)
            .sum();
        let average = sum as f32 / low_end as f32 / 255.0;
        average > self.beat_threshold
    }

    /// Whole-spectrum average loudness in [0, 1].
    pub fn volume_level(&self, spectrum: &[u8]) -> f32 {
        if spectrum.is_empty() {
            return 0.0;
        }
        let sum: u32 = spectrum.iter().map(|&bin| bin as u32).sum();
        sum as f32 / spectrum.len() as f32 / 255.0
    }

    /// Splits the spectrum into thirds and averages each.
    pub fn frequency_bands(&self, spectrum: &[u8]) -> BandLevels {
        let third = spectrum.len() / 3;
        if third == 0 {
            return BandLevels::default();
        }

        let average = |bins: &[u8]| {
            let sum: u32 = bins.iter().map(|&bin| bin as u32).sum();
            sum as f32 / third as f32 / 255.0
        };

        BandLevels {
            low: average(&spectrum[..third]),
            mid: average(&spectrum[third..third * 2]),
            high: average(&spectrum[third * 2..]),
        }
    }
}

impl Default for BeatDetector {
    fn default() -> Self {
        Self::new()
    }
}
