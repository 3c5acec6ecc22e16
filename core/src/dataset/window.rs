use crate::math::stats::StatsHelper;
use crate::metadata::{EmitterDetail, SignalDetail};
use crate::prelude::{Sample, SynthError, SynthResult};
use crate::telemetry::log::LogManager;
use chrono::{DateTime, Utc};
use rand::Rng;

/// Picks a random start in `[0, len - n)` and copies `n` contiguous samples.
///
/// When the run produced exactly `n` samples the window starts at 0.
pub fn extract_window<R: Rng + ?Sized>(
    generated: &[Sample],
    samples_per_vector: usize,
    rng: &mut R,
) -> SynthResult<(usize, Vec<Sample>)> {
    if samples_per_vector == 0 {
        return Err(SynthError::InvalidParameter(
            "window length must be non-zero".into(),
        ));
    }
    if generated.len() < samples_per_vector {
        return Err(SynthError::InsufficientSamples {
            needed: samples_per_vector,
            produced: generated.len(),
        });
    }
    let span = generated.len() - samples_per_vector;
    let offset = if span == 0 { 0 } else { rng.gen_range(0..span) };
    Ok((
        offset,
        generated[offset..offset + samples_per_vector].to_vec(),
    ))
}

/// One labeled, energy-normalized snippet destined for the dataset buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleWindow {
    samples: Vec<Sample>,
    source_offset: usize,
    label: String,
    timestamp: DateTime<Utc>,
    detail: SignalDetail,
    emitter: Option<EmitterDetail>,
}

impl SampleWindow {
    /// Normalizes `samples` by their energy and stamps the current UTC time.
    ///
    /// A silent window cannot be normalized and is kept as is.
    pub fn new(
        mut samples: Vec<Sample>,
        source_offset: usize,
        label: impl Into<String>,
        detail: SignalDetail,
    ) -> Self {
        let label = label.into();
        if StatsHelper::energy(&samples) > 0.0 {
            StatsHelper::normalize_energy(&mut samples);
        } else {
            LogManager::new("dataset").warn(&format!(
                "{} window at offset {} has zero energy, left unnormalized",
                label, source_offset
            ));
        }
        Self {
            samples,
            source_offset,
            label,
            timestamp: Utc::now(),
            detail,
            emitter: None,
        }
    }

    pub fn with_emitter(mut self, emitter: EmitterDetail) -> Self {
        self.emitter = (!emitter.is_empty()).then_some(emitter);
        self
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Offset of the window inside the run it was cut from.
    pub fn source_offset(&self) -> usize {
        self.source_offset
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn detail(&self) -> &SignalDetail {
        &self.detail
    }

    pub fn emitter(&self) -> Option<&EmitterDetail> {
        self.emitter.as_ref()
    }
}
