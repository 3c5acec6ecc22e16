//! Core waveform catalog, signal metadata and dataset assembly for synthetic
//! RF datasets.
//!
//! Waveform descriptors carry SigMF `signal` extension metadata, transmitters
//! and channels turn them into complex baseband samples, and the dataset
//! module windows, normalizes and persists those samples as a SigMF pair.

pub mod dataset;
pub mod math;
pub mod metadata;
pub mod prelude;
pub mod processing;
pub mod telemetry;
pub mod waveform;

pub use prelude::{ProcessingStage, Sample, StageInput, StageOutput, SynthError, SynthResult};
