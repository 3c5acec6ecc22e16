use num_complex::Complex32;

/// Complex baseband sample, stored on disk as `cf32_le`.
pub type Sample = Complex32;

/// Input block handed to a processing stage.
#[derive(Debug, Clone, Default)]
pub struct StageInput {
    pub samples: Vec<Sample>,
}

/// Output produced by each stage.
#[derive(Debug, Clone, Default)]
pub struct StageOutput {
    pub samples: Vec<Sample>,
    pub notes: Vec<String>,
}

/// Common error type for waveform construction, generation and dataset assembly.
#[derive(thiserror::Error, Debug)]
pub enum SynthError {
    #[error("unsupported {family} order {order}")]
    UnsupportedOrder { family: &'static str, order: u32 },
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("insufficient samples: window needs {needed}, generator produced {produced}")]
    InsufficientSamples { needed: usize, produced: usize },
    #[error("buffer exhaustion: {0}")]
    BufferExhaustion(String),
    #[error("dataset validation failed: {0}")]
    Validation(String),
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("metadata serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type SynthResult<T> = Result<T, SynthError>;

/// Trait describing a sample-processing block placed between a source and the sink.
pub trait ProcessingStage {
    fn name(&self) -> &str;
    fn execute(&mut self, input: StageInput) -> SynthResult<StageOutput>;
    fn cleanup(&mut self);
}
