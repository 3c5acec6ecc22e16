use crate::prelude::{ProcessingStage, Sample, StageInput, SynthResult};
use crate::processing::transmitter::SampleSource;
use crate::telemetry::log::LogManager;

/// Source → stages → vector sink.
///
/// A run pulls blocks from the source until it is exhausted, pushes each
/// block through the stages in order and appends the result to the sink.
pub struct Flowgraph {
    source: Box<dyn SampleSource>,
    stages: Vec<Box<dyn ProcessingStage>>,
    sink: Vec<Sample>,
    logger: LogManager,
}

impl Flowgraph {
    pub fn new(source: Box<dyn SampleSource>) -> Self {
        Self {
            source,
            stages: Vec::new(),
            sink: Vec::new(),
            logger: LogManager::new("flowgraph"),
        }
    }

    pub fn with_stage(mut self, stage: Box<dyn ProcessingStage>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn source_mut(&mut self) -> &mut dyn SampleSource {
        self.source.as_mut()
    }

    pub fn sink(&self) -> &[Sample] {
        &self.sink
    }

    pub fn clear_sink(&mut self) {
        self.sink.clear();
    }

    /// Runs to source exhaustion, returning the number of samples sunk.
    ///
    /// Stages are cleaned up whether or not the run succeeds.
    pub fn run(&mut self) -> SynthResult<usize> {
        let result = self.pump();
        for stage in self.stages.iter_mut() {
            stage.cleanup();
        }
        match &result {
            Ok(sunk) => self.logger.detail(&format!(
                "{} run sank {} samples",
                self.source.label(),
                sunk
            )),
            Err(err) => self
                .logger
                .warn(&format!("{} run aborted: {}", self.source.label(), err)),
        }
        result
    }

    fn pump(&mut self) -> SynthResult<usize> {
        let mut sunk = 0;
        loop {
            let block = self.source.generate();
            if block.is_empty() {
                break;
            }
            let mut samples = block;
            for stage in self.stages.iter_mut() {
                let output = stage.execute(StageInput { samples })?;
                for note in &output.notes {
                    self.logger.detail(&format!("{}: {}", stage.name(), note));
                }
                samples = output.samples;
            }
            sunk += samples.len();
            self.sink.extend(samples);
        }
        Ok(sunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::{StageOutput, SynthError};
    use crate::processing::transmitter::VectorSource;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Gain(f32);

    impl ProcessingStage for Gain {
        fn name(&self) -> &str {
            "gain"
        }

        fn execute(&mut self, input: StageInput) -> SynthResult<StageOutput> {
            Ok(StageOutput {
                samples: input.samples.iter().map(|&s| s * self.0).collect(),
                notes: Vec::new(),
            })
        }

        fn cleanup(&mut self) {}
    }

    /// Fails every block and counts its cleanups.
    #[derive(Default)]
    struct Broken {
        cleanups: Rc<Cell<usize>>,
    }

    impl ProcessingStage for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn execute(&mut self, _input: StageInput) -> SynthResult<StageOutput> {
            Err(SynthError::InvalidParameter("broken stage".into()))
        }

        fn cleanup(&mut self) {
            self.cleanups.set(self.cleanups.get() + 1);
        }
    }

    fn ramp(len: usize) -> Vec<Sample> {
        (0..len).map(|i| Sample::new(i as f32, 0.0)).collect()
    }

    #[test]
    fn run_pushes_source_through_stages_into_sink() {
        let source = VectorSource::new("ramp", ramp(5), false, None).unwrap();
        let mut graph = Flowgraph::new(Box::new(source)).with_stage(Box::new(Gain(2.0)));
        assert_eq!(graph.run().unwrap(), 5);
        assert_eq!(graph.sink()[4], Sample::new(8.0, 0.0));
    }

    #[test]
    fn sink_accumulates_until_cleared() {
        let source = VectorSource::new("ramp", ramp(3), false, None).unwrap();
        let mut graph = Flowgraph::new(Box::new(source));
        graph.run().unwrap();
        graph.source_mut().reset();
        graph.run().unwrap();
        assert_eq!(graph.sink().len(), 6);

        graph.clear_sink();
        graph.source_mut().set_data(ramp(4)).unwrap();
        graph.run().unwrap();
        assert_eq!(graph.sink(), ramp(4).as_slice());
    }

    #[test]
    fn exhausted_source_sinks_nothing() {
        let source = VectorSource::new("ramp", ramp(3), false, None).unwrap();
        let mut graph = Flowgraph::new(Box::new(source));
        graph.run().unwrap();
        graph.clear_sink();
        assert_eq!(graph.run().unwrap(), 0);
        assert!(graph.sink().is_empty());
    }

    #[test]
    fn stage_errors_abort_the_run() {
        let source = VectorSource::new("ramp", ramp(3), false, None).unwrap();
        let mut graph = Flowgraph::new(Box::new(source)).with_stage(Box::new(Broken::default()));
        assert!(graph.run().is_err());
        assert!(graph.sink().is_empty());
    }

    #[test]
    fn failed_runs_still_clean_up_stages() {
        let cleanups = Rc::new(Cell::new(0));
        let broken = Broken {
            cleanups: Rc::clone(&cleanups),
        };
        let source = VectorSource::new("ramp", ramp(3), false, None).unwrap();
        let mut graph = Flowgraph::new(Box::new(source)).with_stage(Box::new(broken));
        assert!(graph.run().is_err());
        assert_eq!(cleanups.get(), 1);
    }
}
