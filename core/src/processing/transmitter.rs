use crate::prelude::{Sample, SynthError, SynthResult};
use crate::processing::modulator::GenericModulator;
use crate::telemetry::log::LogManager;
use crate::waveform::WaveformDescriptor;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// Default number of samples a modulated transmitter emits per run.
pub const DEFAULT_BURST_LEN: usize = 8192;

/// Byte block size pulled from the bit source per modulator call.
const SOURCE_CHUNK_BYTES: usize = 256;

/// Sample-stream handle driven by the flowgraph.
pub trait SampleSource {
    fn label(&self) -> &str;
    /// Produces the next block; an exhausted source returns an empty block.
    fn generate(&mut self) -> Vec<Sample>;
    /// Rewinds the head counter so the next run starts from sample 0.
    fn reset(&mut self);
    /// Swaps the underlying sample buffer without rebuilding the source.
    fn set_data(&mut self, data: Vec<Sample>) -> SynthResult<()>;
}

/// Transmitter for precomputed samples (radar pulses).
#[derive(Debug, Clone)]
pub struct VectorSource {
    label: String,
    data: Vec<Sample>,
    repeat: bool,
    head: Option<usize>,
    offset: usize,
    emitted: usize,
}

impl VectorSource {
    /// `head` caps the samples emitted between resets. A repeating source
    /// needs one, otherwise the stream would never end.
    pub fn new(
        label: impl Into<String>,
        data: Vec<Sample>,
        repeat: bool,
        head: Option<usize>,
    ) -> SynthResult<Self> {
        if repeat && head.is_none() {
            return Err(SynthError::InvalidParameter(
                "a repeating source requires a head limit".into(),
            ));
        }
        Ok(Self {
            label: label.into(),
            data,
            repeat,
            head,
            offset: 0,
            emitted: 0,
        })
    }

    /// Transmitter for a radar descriptor's closed-form samples.
    pub fn from_descriptor(
        descriptor: &WaveformDescriptor,
        repeat: bool,
        head: Option<usize>,
    ) -> SynthResult<Self> {
        Self::new(descriptor.label(), descriptor.sample()?, repeat, head)
    }

    pub fn data(&self) -> &[Sample] {
        &self.data
    }
}

impl SampleSource for VectorSource {
    fn label(&self) -> &str {
        &self.label
    }

    fn generate(&mut self) -> Vec<Sample> {
        if self.data.is_empty() {
            return Vec::new();
        }
        let budget = match self.head {
            Some(head) => head.saturating_sub(self.emitted),
            None => usize::MAX,
        };

        let mut block = Vec::new();
        while block.len() < budget {
            if self.offset == self.data.len() {
                if !self.repeat {
                    break;
                }
                self.offset = 0;
            }
            let take = (self.data.len() - self.offset).min(budget - block.len());
            block.extend_from_slice(&self.data[self.offset..self.offset + take]);
            self.offset += take;
        }
        self.emitted += block.len();
        block
    }

    fn reset(&mut self) {
        self.offset = 0;
        self.emitted = 0;
    }

    fn set_data(&mut self, data: Vec<Sample>) -> SynthResult<()> {
        self.data = data;
        self.reset();
        Ok(())
    }
}

/// Where a modulated transmitter takes its payload bytes from.
#[derive(Debug, Clone)]
pub enum BitSource {
    /// Uniformly random bytes from a seeded generator.
    Random { seed: u64 },
    /// Caller-supplied bytes, cycled.
    Bytes(Vec<u8>),
}

/// Transmitter for digital modulations: bit source → modulator → head.
pub struct ModulatedSource {
    label: String,
    modulator: GenericModulator,
    bits: BitSource,
    rng: StdRng,
    byte_offset: usize,
    head: usize,
    emitted: usize,
    pending: Vec<Sample>,
    logger: LogManager,
}

impl ModulatedSource {
    pub fn new(descriptor: &WaveformDescriptor, bits: BitSource, head: usize) -> SynthResult<Self> {
        let params = descriptor.modulation().ok_or_else(|| {
            SynthError::InvalidParameter(format!(
                "{} is not a digital modulation",
                descriptor.label()
            ))
        })?;
        if head == 0 {
            return Err(SynthError::InvalidParameter("head limit must be non-zero".into()));
        }
        if let BitSource::Bytes(bytes) = &bits {
            if bytes.is_empty() {
                return Err(SynthError::InvalidParameter("bit source is empty".into()));
            }
        }
        let seed = match bits {
            BitSource::Random { seed } => seed,
            BitSource::Bytes(_) => 0,
        };

        Ok(Self {
            label: descriptor.label().to_string(),
            modulator: GenericModulator::new(params),
            bits,
            rng: StdRng::seed_from_u64(seed),
            byte_offset: 0,
            head,
            emitted: 0,
            pending: Vec::new(),
            logger: LogManager::new("transmitter"),
        })
    }

    fn next_bytes(&mut self) -> Vec<u8> {
        match &self.bits {
            BitSource::Random { .. } => {
                let mut chunk = vec![0u8; SOURCE_CHUNK_BYTES];
                self.rng.fill_bytes(&mut chunk);
                chunk
            }
            BitSource::Bytes(bytes) => {
                let chunk: Vec<u8> = bytes
                    .iter()
                    .cycle()
                    .skip(self.byte_offset)
                    .take(SOURCE_CHUNK_BYTES)
                    .copied()
                    .collect();
                self.byte_offset = (self.byte_offset + SOURCE_CHUNK_BYTES) % bytes.len();
                chunk
            }
        }
    }
}

impl SampleSource for ModulatedSource {
    fn label(&self) -> &str {
        &self.label
    }

    fn generate(&mut self) -> Vec<Sample> {
        let budget = self.head.saturating_sub(self.emitted);
        while self.pending.len() < budget {
            let bytes = self.next_bytes();
            let modulated = self.modulator.modulate(&bytes);
            self.pending.extend(modulated);
        }
        let block: Vec<Sample> = self.pending.drain(..budget).collect();
        self.emitted += block.len();
        self.logger
            .detail(&format!("{} emitted {} samples", self.label, block.len()));
        block
    }

    /// Rewinds the head only; the payload keeps streaming, so every run
    /// carries fresh symbols.
    fn reset(&mut self) {
        self.emitted = 0;
    }

    fn set_data(&mut self, _data: Vec<Sample>) -> SynthResult<()> {
        Err(SynthError::InvalidParameter(format!(
            "{} is modulated from bits and cannot take raw samples",
            self.label
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waveform::CommsOptions;

    fn ones(len: usize) -> Vec<Sample> {
        vec![Sample::new(1.0, 0.0); len]
    }

    #[test]
    fn one_shot_source_emits_data_once_per_reset() {
        let mut source = VectorSource::new("Square", ones(10), false, None).unwrap();
        assert_eq!(source.generate().len(), 10);
        assert!(source.generate().is_empty());
        source.reset();
        assert_eq!(source.generate().len(), 10);
    }

    #[test]
    fn repeating_source_honours_head() {
        let data: Vec<Sample> = (0..3).map(|i| Sample::new(i as f32, 0.0)).collect();
        let mut source = VectorSource::new("ramp", data, true, Some(7)).unwrap();
        let block = source.generate();
        assert_eq!(block.len(), 7);
        assert_eq!(block[3], Sample::new(0.0, 0.0));
        assert_eq!(block[6], Sample::new(0.0, 0.0));
        assert!(source.generate().is_empty());
    }

    #[test]
    fn repeat_without_head_is_rejected() {
        assert!(VectorSource::new("LFM", ones(4), true, None).is_err());
    }

    #[test]
    fn set_data_swaps_buffer_and_rewinds() {
        let mut source = VectorSource::new("LFM", ones(4), false, None).unwrap();
        source.generate();
        source.set_data(ones(6)).unwrap();
        assert_eq!(source.generate().len(), 6);
    }

    #[test]
    fn radar_descriptor_builds_vector_source() {
        let square = WaveformDescriptor::square(10e-6, 1.0e6).unwrap();
        let mut source = VectorSource::from_descriptor(&square, false, None).unwrap();
        assert_eq!(source.label(), "Square");
        assert_eq!(source.generate(), ones(10));

        let bpsk = WaveformDescriptor::bpsk(CommsOptions::default()).unwrap();
        assert!(VectorSource::from_descriptor(&bpsk, false, None).is_err());
    }

    #[test]
    fn modulated_source_emits_head_samples_per_run() {
        let qpsk = WaveformDescriptor::qpsk(CommsOptions::default()).unwrap();
        let mut source = ModulatedSource::new(&qpsk, BitSource::Random { seed: 0 }, 1000).unwrap();
        assert_eq!(source.generate().len(), 1000);
        assert!(source.generate().is_empty());
        source.reset();
        assert_eq!(source.generate().len(), 1000);
        assert!(source.set_data(ones(4)).is_err());
    }

    #[test]
    fn modulated_source_is_deterministic_for_a_seed() {
        let bpsk = WaveformDescriptor::bpsk(CommsOptions::default()).unwrap();
        let mut a = ModulatedSource::new(&bpsk, BitSource::Random { seed: 9 }, 512).unwrap();
        let mut b = ModulatedSource::new(&bpsk, BitSource::Random { seed: 9 }, 512).unwrap();
        assert_eq!(a.generate(), b.generate());
    }

    #[test]
    fn modulated_source_rejects_radar_descriptors() {
        let lfm = WaveformDescriptor::linear_fm(1.0e6, 10e-6, 1.0e6).unwrap();
        assert!(ModulatedSource::new(&lfm, BitSource::Bytes(vec![0x55]), 64).is_err());
    }
}
