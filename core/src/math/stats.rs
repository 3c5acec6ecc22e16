use crate::prelude::Sample;

pub struct StatsHelper;

impl StatsHelper {
    /// Total energy `Σ|s|²` of a block.
    pub fn energy(samples: &[Sample]) -> f32 {
        samples.iter().map(|s| s.norm_sqr()).sum()
    }

    pub fn rms(samples: &[Sample]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        (Self::energy(samples) / samples.len() as f32).sqrt()
    }

    /// Divides every sample by the block energy (not its square root).
    ///
    /// A block with zero energy is left untouched.
    pub fn normalize_energy(samples: &mut [Sample]) {
        let energy = Self::energy(samples);
        if energy > 0.0 {
            for sample in samples.iter_mut() {
                *sample /= energy;
            }
        }
    }
}
