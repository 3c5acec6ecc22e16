use anyhow::Context;
use rfsigcore::processing::{CarrierDrift, ChannelConfig, DEFAULT_BURST_LEN};
use rfsigcore::waveform::CommsOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// One waveform class of the dataset.
///
/// Radar parameters left unset are drawn per vector from the configured
/// ranges.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WaveformClass {
    LinearFm {
        #[serde(default)]
        bandwidth: Option<f64>,
        #[serde(default)]
        pulsewidth: Option<f64>,
    },
    Square {
        #[serde(default)]
        pulsewidth: Option<f64>,
    },
    Bpsk,
    Qpsk,
    Psk { order: u32 },
    Qam { order: u32 },
}

impl WaveformClass {
    /// Radar class whose parameters are re-drawn for every vector.
    pub fn is_randomized(&self) -> bool {
        match self {
            WaveformClass::LinearFm {
                bandwidth,
                pulsewidth,
            } => bandwidth.is_none() || pulsewidth.is_none(),
            WaveformClass::Square { pulsewidth } => pulsewidth.is_none(),
            _ => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarRanges {
    pub bandwidth: Range<f64>,
    pub pulsewidth: Range<f64>,
}

impl Default for RadarRanges {
    fn default() -> Self {
        Self {
            bandwidth: 1e6..100e6,
            pulsewidth: 1e-6..100e-6,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommsSection {
    #[serde(flatten)]
    pub options: CommsOptions,
    /// Samples a modulated transmitter emits per run.
    pub burst_len: usize,
}

impl Default for CommsSection {
    fn default() -> Self {
        Self {
            options: CommsOptions::default(),
            burst_len: DEFAULT_BURST_LEN,
        }
    }
}

/// Radar transmitter behaviour.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransmitSection {
    pub repeat: bool,
    pub head: Option<usize>,
}

impl Default for TransmitSection {
    fn default() -> Self {
        Self {
            repeat: true,
            head: Some(DEFAULT_BURST_LEN),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelSection {
    pub enabled: bool,
    pub doppler_freq: f64,
    pub line_of_sight: bool,
    pub k_factor: f64,
    pub sinusoids: usize,
    pub delays: Vec<f64>,
    pub mags: Vec<f64>,
    pub n_taps: usize,
    pub seed: u64,
    pub carrier_drift: Option<CarrierDrift>,
}

impl Default for ChannelSection {
    fn default() -> Self {
        let channel = ChannelConfig::default();
        Self {
            enabled: true,
            doppler_freq: channel.doppler_freq,
            line_of_sight: channel.line_of_sight,
            k_factor: channel.k_factor,
            sinusoids: channel.sinusoids,
            delays: channel.delays,
            mags: channel.mags,
            n_taps: channel.n_taps,
            seed: channel.seed,
            carrier_drift: channel.carrier_drift,
        }
    }
}

impl ChannelSection {
    /// Channel parameters for one SNR point; `offset` perturbs the seed so
    /// each (snr, class) pair gets its own realization.
    pub fn to_channel_config(&self, sample_rate: f64, snr_db: f64, offset: u64) -> ChannelConfig {
        ChannelConfig {
            sample_rate,
            doppler_freq: self.doppler_freq,
            line_of_sight: self.line_of_sight,
            k_factor: self.k_factor,
            sinusoids: self.sinusoids,
            delays: self.delays.clone(),
            mags: self.mags.clone(),
            n_taps: self.n_taps,
            noise_voltage: ChannelConfig::noise_voltage_for_snr(snr_db),
            seed: self.seed.wrapping_add(offset),
            carrier_drift: self.carrier_drift,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub dir: PathBuf,
    pub name: String,
    pub author: Option<String>,
    pub description: Option<String>,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            name: "dataset".to_string(),
            author: None,
            description: Some("Synthetic RF dataset for machine learning".to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    pub vectors_per_class: usize,
    pub samples_per_vector: usize,
    pub snrs: Vec<f64>,
    pub sample_rate: f64,
    pub seed: u64,
    pub waveforms: Vec<WaveformClass>,
    pub radar: RadarRanges,
    pub comms: CommsSection,
    pub transmit: TransmitSection,
    pub channel: ChannelSection,
    pub output: OutputSection,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            vectors_per_class: 1,
            samples_per_vector: 128,
            snrs: (-10..10).map(|step| f64::from(step * 2)).collect(),
            sample_rate: 20e6,
            seed: 0,
            waveforms: vec![WaveformClass::LinearFm {
                bandwidth: None,
                pulsewidth: None,
            }],
            radar: RadarRanges::default(),
            comms: CommsSection::default(),
            transmit: TransmitSection::default(),
            channel: ChannelSection::default(),
            output: OutputSection::default(),
        }
    }
}

impl SynthesisConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading synthesis config {}", path_ref.display()))?;
        let config: SynthesisConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing synthesis config {}", path_ref.display()))?;
        Ok(config)
    }

    /// Rejects configurations that cannot produce a dataset.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.vectors_per_class > 0, "vectors_per_class must be non-zero");
        anyhow::ensure!(self.samples_per_vector > 0, "samples_per_vector must be non-zero");
        anyhow::ensure!(!self.snrs.is_empty(), "at least one SNR is required");
        anyhow::ensure!(!self.waveforms.is_empty(), "at least one waveform class is required");
        anyhow::ensure!(
            self.sample_rate.is_finite() && self.sample_rate > 0.0,
            "sample_rate must be positive, got {}",
            self.sample_rate
        );
        for (name, range) in [
            ("bandwidth", &self.radar.bandwidth),
            ("pulsewidth", &self.radar.pulsewidth),
        ] {
            anyhow::ensure!(
                range.start > 0.0 && range.start < range.end && range.end.is_finite(),
                "radar {} range {:?} must be positive, finite and non-empty",
                name,
                range
            );
        }
        if self.channel.enabled {
            self.channel
                .to_channel_config(self.sample_rate, 0.0, 0)
                .validate()
                .context("validating channel section")?;
        }
        Ok(())
    }
}
