use crate::generator::profile::{build_descriptor, build_transmitter, RadarDraws};
use crate::workflow::config::{SynthesisConfig, WaveformClass};
use anyhow::Context;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rfsigcore::dataset::{
    extract_window, DatasetBuffer, DatasetWriter, SampleWindow, SigMfGlobal, SigMfMeta,
};
use rfsigcore::metadata::DetailField;
use rfsigcore::processing::{Channel, ChannelConfig, Flowgraph};
use rfsigcore::telemetry::{LogManager, MetricsRecorder, MetricsSnapshot};
use rfsigcore::waveform::WaveformDescriptor;
use std::path::PathBuf;

pub struct SynthesisResult {
    pub buffer: DatasetBuffer,
    pub meta: SigMfMeta,
    pub metrics: MetricsSnapshot,
}

/// One (snr, class) cell of the sweep, shared by all its vectors.
struct Cell<'a> {
    snr: f64,
    class: &'a WaveformClass,
    descriptor: WaveformDescriptor,
    graph: Flowgraph,
}

pub struct Runner {
    config: SynthesisConfig,
    logger: LogManager,
    metrics: MetricsRecorder,
}

impl Runner {
    pub fn new(config: SynthesisConfig) -> Self {
        Self {
            config,
            logger: LogManager::new("runner"),
            metrics: MetricsRecorder::new(),
        }
    }

    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    /// Sweeps SNR → class → vector and fills the dataset buffer.
    ///
    /// The first failing vector aborts the sweep; its SNR, waveform and
    /// vector index are attached to the error.
    pub fn execute(&self) -> anyhow::Result<SynthesisResult> {
        let config = &self.config;
        config.validate().context("validating synthesis config")?;

        let mut rng = StdRng::seed_from_u64(config.seed);
        let draws = RadarDraws::draw(&mut rng, &config.radar, config.vectors_per_class);
        let capacity = DatasetBuffer::capacity_for(
            config.snrs.len(),
            config.waveforms.len(),
            config.vectors_per_class,
            config.samples_per_vector,
        )?;
        let mut buffer = DatasetBuffer::with_capacity(capacity);
        self.logger.record(&format!(
            "synthesizing {} snrs x {} classes x {} vectors x {} samples",
            config.snrs.len(),
            config.waveforms.len(),
            config.vectors_per_class,
            config.samples_per_vector
        ));

        for (snr_index, &snr) in config.snrs.iter().enumerate() {
            for (class_index, class) in config.waveforms.iter().enumerate() {
                let cell_index = (snr_index * config.waveforms.len() + class_index) as u64;
                let mut cell = self
                    .build_cell(snr, class, &draws, cell_index)
                    .with_context(|| format!("preparing snr {} dB, waveform {:?}", snr, class))?;

                for vector in 0..config.vectors_per_class {
                    let outcome =
                        self.synthesize_vector(&mut cell, &draws, vector, &mut rng, &mut buffer);
                    if let Err(err) = outcome {
                        self.metrics.record_error();
                        return Err(err.context(format!(
                            "snr {} dB, waveform {}, vector {}",
                            snr,
                            cell.descriptor.label(),
                            vector
                        )));
                    }
                }
                self.logger.detail(&format!(
                    "{} at {} dB done, cursor {}",
                    cell.descriptor.label(),
                    snr,
                    buffer.cursor()
                ));
            }
        }

        let meta = buffer.to_metadata(self.global());
        meta.validate(buffer.cursor() as u64)
            .context("validating dataset metadata")?;
        let metrics = self.metrics.snapshot();
        self.logger.record(&format!(
            "synthesized {} windows ({} samples) over {} runs",
            metrics.windows, metrics.samples, metrics.runs
        ));
        Ok(SynthesisResult {
            buffer,
            meta,
            metrics,
        })
    }

    fn build_cell<'a>(
        &self,
        snr: f64,
        class: &'a WaveformClass,
        draws: &RadarDraws,
        cell_index: u64,
    ) -> anyhow::Result<Cell<'a>> {
        let config = &self.config;
        let descriptor = build_descriptor(class, config, draws)?;
        let source = build_transmitter(&descriptor, config, config.seed.wrapping_add(cell_index))?;
        let mut graph = Flowgraph::new(source);
        if config.channel.enabled {
            let channel_config = config
                .channel
                .to_channel_config(config.sample_rate, snr, cell_index);
            let channel = Channel::new(channel_config).context("building channel")?;
            graph = graph.with_stage(Box::new(channel));
        }
        Ok(Cell {
            snr,
            class,
            descriptor,
            graph,
        })
    }

    fn synthesize_vector(
        &self,
        cell: &mut Cell<'_>,
        draws: &RadarDraws,
        vector: usize,
        rng: &mut StdRng,
        buffer: &mut DatasetBuffer,
    ) -> anyhow::Result<()> {
        let config = &self.config;
        match draws.parameters(cell.class, vector) {
            Some((bandwidth, pulsewidth)) if cell.class.is_randomized() => {
                cell.descriptor.set_radar_parameters(bandwidth, pulsewidth)?;
                cell.graph.source_mut().set_data(cell.descriptor.sample()?)?;
            }
            _ => cell.graph.source_mut().reset(),
        }

        cell.graph.clear_sink();
        cell.graph.run()?;
        self.metrics.record_run();

        let (offset, samples) = extract_window(cell.graph.sink(), config.samples_per_vector, rng)?;
        let mut detail = cell.descriptor.detail().clone();
        detail.set(DetailField::Snr(format!("{}", cell.snr)));
        if config.channel.enabled {
            detail.set(DetailField::NoiseVoltage(ChannelConfig::noise_voltage_for_snr(
                cell.snr,
            )));
        }
        let window = SampleWindow::new(samples, offset, cell.descriptor.label(), detail);
        buffer.append(&window)?;
        self.metrics.record_window(window.len());
        Ok(())
    }

    fn global(&self) -> SigMfGlobal {
        let output = &self.config.output;
        let mut global = SigMfGlobal::new(self.config.sample_rate);
        global.author = output.author.clone();
        global.description = output.description.clone();
        global
    }

    /// Persists a synthesized dataset; returns the data and metadata paths.
    pub fn write(&self, result: &SynthesisResult) -> anyhow::Result<(PathBuf, PathBuf)> {
        let output = &self.config.output;
        let writer = DatasetWriter::new(&output.dir, &output.name);
        writer
            .write(&result.meta, result.buffer.samples().iter())
            .with_context(|| format!("writing dataset {}", writer.data_path().display()))?;
        Ok((
            writer.data_path().to_path_buf(),
            writer.meta_path().to_path_buf(),
        ))
    }
}
