use crate::prelude::{Sample, SynthError, SynthResult};
use crate::waveform::Waveform;

fn sample_count(sample_rate: f64, pulsewidth: f64) -> SynthResult<usize> {
    if !(sample_rate.is_finite() && sample_rate > 0.0) {
        return Err(SynthError::InvalidParameter(format!(
            "sample rate must be positive, got {}",
            sample_rate
        )));
    }
    if !(pulsewidth.is_finite() && pulsewidth > 0.0) {
        return Err(SynthError::InvalidParameter(format!(
            "pulsewidth must be positive, got {}",
            pulsewidth
        )));
    }
    let count = (sample_rate * pulsewidth).round();
    if count < 1.0 {
        return Err(SynthError::InvalidParameter(format!(
            "pulsewidth {} s at {} Hz yields no samples",
            pulsewidth, sample_rate
        )));
    }
    Ok(count as usize)
}

/// Linear frequency-modulated (chirp) pulse.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearFm {
    bandwidth: f64,
    pulsewidth: f64,
    sample_rate: f64,
    len: usize,
}

impl LinearFm {
    pub fn new(bandwidth: f64, pulsewidth: f64, sample_rate: f64) -> SynthResult<Self> {
        if !(bandwidth.is_finite() && bandwidth > 0.0) {
            return Err(SynthError::InvalidParameter(format!(
                "sweep bandwidth must be positive, got {}",
                bandwidth
            )));
        }
        let len = sample_count(sample_rate, pulsewidth)?;
        Ok(Self {
            bandwidth,
            pulsewidth,
            sample_rate,
            len,
        })
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    pub fn pulsewidth(&self) -> f64 {
        self.pulsewidth
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Waveform for LinearFm {
    /// `s[k] = exp(iφ(t))` with `φ(t) = -B/2·t + B/(2·pw)·t²` and `t = k/fs`.
    fn sample(&self) -> Vec<Sample> {
        let ts = 1.0 / self.sample_rate;
        let sweep = self.bandwidth / (2.0 * self.pulsewidth);
        (0..self.len)
            .map(|k| {
                let t = k as f64 * ts;
                let phase = -self.bandwidth / 2.0 * t + sweep * t * t;
                Sample::new(phase.cos() as f32, phase.sin() as f32)
            })
            .collect()
    }
}

/// Rectangular pulse of constant unit amplitude.
#[derive(Debug, Clone, PartialEq)]
pub struct Square {
    pulsewidth: f64,
    sample_rate: f64,
    len: usize,
}

impl Square {
    pub fn new(pulsewidth: f64, sample_rate: f64) -> SynthResult<Self> {
        let len = sample_count(sample_rate, pulsewidth)?;
        Ok(Self {
            pulsewidth,
            sample_rate,
            len,
        })
    }

    pub fn pulsewidth(&self) -> f64 {
        self.pulsewidth
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Nominal occupied bandwidth, `1/pulsewidth`.
    pub fn bandwidth(&self) -> f64 {
        1.0 / self.pulsewidth
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Waveform for Square {
    fn sample(&self) -> Vec<Sample> {
        vec![Sample::new(1.0, 0.0); self.len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lfm_sample_count_matches_rounded_product() {
        for &(bandwidth, pulsewidth, sample_rate) in &[
            (1.0e6, 100e-6, 1.0e6),
            (5.0e6, 10e-6, 20.0e6),
            (80.0e6, 3.3e-6, 20.0e6),
            (1.0e6, 1.0e-6, 1.0e6),
        ] {
            let lfm = LinearFm::new(bandwidth, pulsewidth, sample_rate).unwrap();
            let samples = lfm.sample();
            assert_eq!(samples.len(), (sample_rate * pulsewidth).round() as usize);
            assert!(samples.iter().all(|s| (s.norm() - 1.0).abs() < 1e-5));
        }
    }

    #[test]
    fn lfm_starts_at_zero_phase_and_follows_quadratic_law() {
        let lfm = LinearFm::new(1.0e6, 100e-6, 1.0e6).unwrap();
        let samples = lfm.sample();
        assert_eq!(samples[0], Sample::new(1.0, 0.0));

        let t = 10.0e-6;
        let phase: f64 = -0.5e6 * t + 1.0e6 / (2.0 * 100e-6) * t * t;
        assert!((samples[10].re - phase.cos() as f32).abs() < 1e-5);
        assert!((samples[10].im - phase.sin() as f32).abs() < 1e-5);
    }

    #[test]
    fn lfm_rejects_degenerate_parameters() {
        assert!(LinearFm::new(0.0, 1e-6, 1e6).is_err());
        assert!(LinearFm::new(1e6, -1e-6, 1e6).is_err());
        assert!(LinearFm::new(1e6, 1e-6, f64::NAN).is_err());
        assert!(LinearFm::new(1e6, 1e-7, 1e6).is_err());
    }

    #[test]
    fn square_is_all_ones() {
        let square = Square::new(10e-6, 1.0e6).unwrap();
        let samples = square.sample();
        assert_eq!(samples.len(), 10);
        assert!(samples.iter().all(|s| *s == Sample::new(1.0, 0.0)));
        assert!((square.bandwidth() - 1.0e5).abs() < 1e-6);
    }
}
