use crate::dataset::sigmf::{SigMfAnnotation, SigMfCapture, SigMfGlobal, SigMfMeta};
use crate::dataset::window::SampleWindow;
use crate::prelude::{Sample, SynthError, SynthResult};
use chrono::SecondsFormat;
use ndarray::{s, Array1, ArrayView1};

/// Pre-sized sample store with a write cursor and one annotation per window.
#[derive(Debug, Clone)]
pub struct DatasetBuffer {
    samples: Array1<Sample>,
    cursor: usize,
    annotations: Vec<SigMfAnnotation>,
}

impl DatasetBuffer {
    /// `snrs × classes × vectors × samples_per_vector`, or an error on overflow.
    pub fn capacity_for(
        snrs: usize,
        classes: usize,
        vectors_per_class: usize,
        samples_per_vector: usize,
    ) -> SynthResult<usize> {
        [classes, vectors_per_class, samples_per_vector]
            .iter()
            .try_fold(snrs, |acc, &factor| acc.checked_mul(factor))
            .ok_or_else(|| {
                SynthError::BufferExhaustion(format!(
                    "{} x {} x {} x {} samples overflows the address space",
                    snrs, classes, vectors_per_class, samples_per_vector
                ))
            })
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Array1::from_elem(capacity, Sample::new(0.0, 0.0)),
            cursor: 0,
            annotations: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn annotations(&self) -> &[SigMfAnnotation] {
        &self.annotations
    }

    /// Samples written so far.
    pub fn samples(&self) -> ArrayView1<'_, Sample> {
        self.samples.slice(s![..self.cursor])
    }

    /// Copies a window in at the cursor and records its annotation.
    ///
    /// The annotation starts at the cursor, not at the window's offset in
    /// the run it was cut from. Returns that start.
    pub fn append(&mut self, window: &SampleWindow) -> SynthResult<usize> {
        let start = self.cursor;
        let end = start
            .checked_add(window.len())
            .filter(|&end| end <= self.capacity())
            .ok_or_else(|| {
                SynthError::BufferExhaustion(format!(
                    "window of {} samples at {} does not fit in {}",
                    window.len(),
                    start,
                    self.capacity()
                ))
            })?;

        self.samples
            .slice_mut(s![start..end])
            .iter_mut()
            .zip(window.samples())
            .for_each(|(slot, &sample)| *slot = sample);

        self.annotations.push(SigMfAnnotation {
            sample_start: start as u64,
            sample_count: window.len() as u64,
            label: window.label().to_string(),
            datetime: window
                .timestamp()
                .to_rfc3339_opts(SecondsFormat::Micros, true),
            detail: window.detail().clone(),
            emitter: window.emitter().cloned(),
        });
        self.cursor = end;
        Ok(start)
    }

    pub fn to_metadata(&self, global: SigMfGlobal) -> SigMfMeta {
        SigMfMeta {
            global,
            captures: vec![SigMfCapture { sample_start: 0 }],
            annotations: self.annotations.clone(),
        }
    }
}
