//! Frequency-selective fading channel with additive Gaussian noise.
//!
//! Each entry of the power delay profile gets its own sum-of-sinusoids flat
//! fader (Rayleigh, or Rician when a line-of-sight component is enabled).
//! The faded path gains are sinc-interpolated onto an `n_taps` FIR filter at
//! their fractional delays, the input is filtered with these time-varying
//! taps, optionally rotated by a random-walk carrier offset, and complex
//! white Gaussian noise is added.

use crate::math::filters::sinc;
use crate::prelude::{ProcessingStage, Sample, StageInput, StageOutput, SynthError, SynthResult};
use crate::telemetry::log::LogManager;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::f64::consts::PI;

/// Random-walk carrier frequency offset, in Hz.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarrierDrift {
    pub std_dev_hz: f64,
    pub max_dev_hz: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub sample_rate: f64,
    /// Maximum Doppler frequency in Hz.
    pub doppler_freq: f64,
    pub line_of_sight: bool,
    /// Ratio of line-of-sight to scattered power (linear).
    pub k_factor: f64,
    pub sinusoids: usize,
    /// Path delays in fractional samples.
    pub delays: Vec<f64>,
    /// Path magnitudes, one per delay.
    pub mags: Vec<f64>,
    /// Length of the FIR the delay profile is interpolated over.
    pub n_taps: usize,
    pub noise_voltage: f64,
    pub seed: u64,
    pub carrier_drift: Option<CarrierDrift>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            sample_rate: 20e6,
            doppler_freq: 1.0,
            line_of_sight: true,
            k_factor: 4.0,
            sinusoids: 8,
            delays: vec![0.0, 0.9, 1.7],
            mags: vec![1.0, 0.8, 0.3],
            n_taps: 8,
            noise_voltage: 0.0,
            seed: 0x1337,
            carrier_drift: Some(CarrierDrift {
                std_dev_hz: 0.01,
                max_dev_hz: 500.0,
            }),
        }
    }
}

impl ChannelConfig {
    /// Noise voltage for an SNR in dB, `10^(-snr/20)`.
    pub fn noise_voltage_for_snr(snr_db: f64) -> f64 {
        10f64.powf(-snr_db / 20.0)
    }

    /// Sets the noise amplitude from a noise power in dB, `10^(p/20)`.
    pub fn with_noise_power_db(mut self, noise_power_db: f64) -> Self {
        self.noise_voltage = 10f64.powf(noise_power_db / 20.0);
        self
    }

    pub fn validate(&self) -> SynthResult<()> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(SynthError::InvalidParameter(format!(
                "channel sample rate must be positive, got {}",
                self.sample_rate
            )));
        }
        if self.delays.len() != self.mags.len() {
            return Err(SynthError::InvalidParameter(format!(
                "{} delays but {} magnitudes",
                self.delays.len(),
                self.mags.len()
            )));
        }
        if self.delays.is_empty() {
            return Err(SynthError::InvalidParameter(
                "power delay profile has no paths".into(),
            ));
        }
        if self.n_taps == 0 {
            return Err(SynthError::InvalidParameter("n_taps must be non-zero".into()));
        }
        if self.sinusoids == 0 {
            return Err(SynthError::InvalidParameter(
                "fader needs at least one sinusoid".into(),
            ));
        }
        if !(self.noise_voltage >= 0.0 && self.k_factor >= 0.0) {
            return Err(SynthError::InvalidParameter(
                "noise voltage and K-factor must be non-negative".into(),
            ));
        }
        if let Some(drift) = self.carrier_drift {
            let bounded = |hz: f64| hz.is_finite() && hz >= 0.0;
            if !(bounded(drift.std_dev_hz) && bounded(drift.max_dev_hz)) {
                return Err(SynthError::InvalidParameter(format!(
                    "carrier drift std {} Hz / max {} Hz must be finite and non-negative",
                    drift.std_dev_hz, drift.max_dev_hz
                )));
            }
        }
        Ok(())
    }
}

/// Sum-of-sinusoids flat fader with unit average power.
#[derive(Debug, Clone)]
struct FlatFader {
    /// Doppler frequency normalized by the sample rate.
    doppler: f64,
    k_factor: f64,
    line_of_sight: bool,
    arrivals: Vec<(f64, f64, f64)>,
    los_angle: f64,
    los_phase: f64,
    time: u64,
}

impl FlatFader {
    fn new(config: &ChannelConfig, rng: &mut StdRng) -> Self {
        let n = config.sinusoids as f64;
        let theta = rng.gen_range(-PI..PI);
        let arrivals = (0..config.sinusoids)
            .map(|i| {
                let alpha = (2.0 * PI * (i as f64 + 1.0) - PI + theta) / (4.0 * n);
                (alpha, rng.gen_range(-PI..PI), rng.gen_range(-PI..PI))
            })
            .collect();

        Self {
            doppler: config.doppler_freq / config.sample_rate,
            k_factor: config.k_factor,
            line_of_sight: config.line_of_sight,
            arrivals,
            los_angle: rng.gen_range(-PI..PI),
            los_phase: rng.gen_range(-PI..PI),
            time: 0,
        }
    }

    fn next_gain(&mut self) -> Sample {
        let wd = 2.0 * PI * self.doppler * self.time as f64;
        let scale = (1.0 / self.arrivals.len() as f64).sqrt();
        let (mut re, mut im) = (0.0, 0.0);
        for &(alpha, phi_i, phi_q) in &self.arrivals {
            re += (wd * alpha.cos() + phi_i).cos();
            im += (wd * alpha.sin() + phi_q).sin();
        }
        re *= scale;
        im *= scale;

        if self.line_of_sight {
            let los = wd * self.los_angle.cos() + self.los_phase;
            let k = self.k_factor;
            let norm = (k + 1.0).sqrt();
            re = (re + k.sqrt() * los.cos()) / norm;
            im = (im + k.sqrt() * los.sin()) / norm;
        }
        self.time += 1;
        Sample::new(re as f32, im as f32)
    }
}

/// Multipath fading + noise stage.
pub struct Channel {
    config: ChannelConfig,
    faders: Vec<FlatFader>,
    history: VecDeque<Sample>,
    rng: StdRng,
    noise: Option<Normal<f64>>,
    drift_step: Option<Normal<f64>>,
    offset_hz: f64,
    phase: f64,
    logger: LogManager,
}

impl Channel {
    pub fn new(config: ChannelConfig) -> SynthResult<Self> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let faders = config
            .delays
            .iter()
            .map(|_| FlatFader::new(&config, &mut rng))
            .collect();
        let noise = if config.noise_voltage > 0.0 {
            let std_dev = config.noise_voltage / 2f64.sqrt();
            Some(Normal::new(0.0, std_dev).map_err(|e| {
                SynthError::InvalidParameter(format!("noise voltage {}: {}", config.noise_voltage, e))
            })?)
        } else {
            None
        };
        let drift_step = match config.carrier_drift {
            Some(drift) if drift.std_dev_hz > 0.0 => Some(
                Normal::new(0.0, drift.std_dev_hz)
                    .map_err(|e| SynthError::InvalidParameter(format!("carrier drift: {}", e)))?,
            ),
            _ => None,
        };

        Ok(Self {
            history: VecDeque::from(vec![Sample::new(0.0, 0.0); config.n_taps]),
            faders,
            rng,
            noise,
            drift_step,
            offset_hz: 0.0,
            phase: 0.0,
            logger: LogManager::new("channel"),
            config,
        })
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Time-varying FIR taps for the current sample.
    fn next_taps(&mut self) -> Vec<Sample> {
        let mut taps = vec![Sample::new(0.0, 0.0); self.config.n_taps];
        for (path, fader) in self.faders.iter_mut().enumerate() {
            let gain = fader.next_gain() * self.config.mags[path] as f32;
            let delay = self.config.delays[path];
            for (k, tap) in taps.iter_mut().enumerate() {
                *tap += gain * sinc(k as f64 - delay) as f32;
            }
        }
        taps
    }

    fn rotation(&mut self) -> Sample {
        let Some(step) = self.drift_step else {
            return Sample::new(1.0, 0.0);
        };
        let max_dev = self
            .config
            .carrier_drift
            .map(|drift| drift.max_dev_hz)
            .unwrap_or(0.0);
        self.offset_hz = (self.offset_hz + step.sample(&mut self.rng)).clamp(-max_dev, max_dev);
        self.phase = (self.phase + 2.0 * PI * self.offset_hz / self.config.sample_rate) % (2.0 * PI);
        Sample::new(self.phase.cos() as f32, self.phase.sin() as f32)
    }

    /// Passes a block through the channel; state carries over between blocks.
    pub fn apply(&mut self, input: &[Sample]) -> Vec<Sample> {
        let mut output = Vec::with_capacity(input.len());
        for &sample in input {
            self.history.pop_back();
            self.history.push_front(sample);
            let taps = self.next_taps();
            let mut value = taps
                .iter()
                .zip(self.history.iter())
                .fold(Sample::new(0.0, 0.0), |acc, (&tap, &x)| acc + tap * x);
            value *= self.rotation();
            if let Some(noise) = self.noise {
                value += Sample::new(
                    noise.sample(&mut self.rng) as f32,
                    noise.sample(&mut self.rng) as f32,
                );
            }
            output.push(value);
        }
        output
    }
}

impl ProcessingStage for Channel {
    fn name(&self) -> &str {
        "channel"
    }

    fn execute(&mut self, input: StageInput) -> SynthResult<StageOutput> {
        let samples = self.apply(&input.samples);
        let note = format!(
            "faded {} samples over {} paths, noise voltage {:.4}",
            samples.len(),
            self.faders.len(),
            self.config.noise_voltage
        );
        self.logger.detail(&note);
        Ok(StageOutput {
            samples,
            notes: vec![note],
        })
    }

    /// Clears the filter history; fader clocks keep running.
    fn cleanup(&mut self) {
        self.history.iter_mut().for_each(|s| *s = Sample::new(0.0, 0.0));
    }
}
