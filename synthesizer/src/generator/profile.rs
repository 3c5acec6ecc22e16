use crate::workflow::config::{RadarRanges, SynthesisConfig, WaveformClass};
use anyhow::Context;
use rand::Rng;
use rfsigcore::processing::{BitSource, ModulatedSource, SampleSource, VectorSource};
use rfsigcore::waveform::WaveformDescriptor;

/// Radar parameters drawn once per run, one pair per vector index.
#[derive(Debug, Clone, PartialEq)]
pub struct RadarDraws {
    bandwidths: Vec<f64>,
    pulsewidths: Vec<f64>,
}

impl RadarDraws {
    /// Uniform draws from the configured ranges; all bandwidths first, then
    /// all pulsewidths.
    pub fn draw<R: Rng + ?Sized>(rng: &mut R, ranges: &RadarRanges, vectors: usize) -> Self {
        let bandwidths = (0..vectors)
            .map(|_| rng.gen_range(ranges.bandwidth.clone()))
            .collect();
        let pulsewidths = (0..vectors)
            .map(|_| rng.gen_range(ranges.pulsewidth.clone()))
            .collect();
        Self {
            bandwidths,
            pulsewidths,
        }
    }

    /// `(bandwidth, pulsewidth)` for a class at a vector index, with fixed
    /// class parameters taking precedence over draws. `None` for comms.
    pub fn parameters(&self, class: &WaveformClass, vector: usize) -> Option<(f64, f64)> {
        let bandwidth = self.bandwidths.get(vector).copied()?;
        let pulsewidth = self.pulsewidths.get(vector).copied()?;
        match class {
            WaveformClass::LinearFm {
                bandwidth: fixed_bw,
                pulsewidth: fixed_pw,
            } => Some((
                fixed_bw.unwrap_or(bandwidth),
                fixed_pw.unwrap_or(pulsewidth),
            )),
            WaveformClass::Square { pulsewidth: fixed_pw } => {
                Some((bandwidth, fixed_pw.unwrap_or(pulsewidth)))
            }
            _ => None,
        }
    }
}

/// Builds the descriptor of a class; radar classes start from vector 0's
/// parameters.
pub fn build_descriptor(
    class: &WaveformClass,
    config: &SynthesisConfig,
    draws: &RadarDraws,
) -> anyhow::Result<WaveformDescriptor> {
    let options = config.comms.options;
    let descriptor = match class {
        WaveformClass::LinearFm { .. } | WaveformClass::Square { .. } => {
            let (bandwidth, pulsewidth) = draws
                .parameters(class, 0)
                .context("no radar parameters were drawn")?;
            if matches!(class, WaveformClass::LinearFm { .. }) {
                WaveformDescriptor::linear_fm(bandwidth, pulsewidth, config.sample_rate)
            } else {
                WaveformDescriptor::square(pulsewidth, config.sample_rate)
            }
        }
        WaveformClass::Bpsk => WaveformDescriptor::bpsk(options),
        WaveformClass::Qpsk => WaveformDescriptor::qpsk(options),
        WaveformClass::Psk { order } => WaveformDescriptor::psk(*order, options),
        WaveformClass::Qam { order } => WaveformDescriptor::qam(*order, options),
    };
    descriptor.with_context(|| format!("building waveform class {:?}", class))
}

/// Radar descriptors feed a vector source; digital ones a modulated source
/// with its own payload seed.
pub fn build_transmitter(
    descriptor: &WaveformDescriptor,
    config: &SynthesisConfig,
    payload_seed: u64,
) -> anyhow::Result<Box<dyn SampleSource>> {
    let source: Box<dyn SampleSource> = if descriptor.is_radar() {
        Box::new(
            VectorSource::from_descriptor(
                descriptor,
                config.transmit.repeat,
                config.transmit.head,
            )
            .with_context(|| format!("building {} transmitter", descriptor.label()))?,
        )
    } else {
        Box::new(
            ModulatedSource::new(
                descriptor,
                BitSource::Random { seed: payload_seed },
                config.comms.burst_len,
            )
            .with_context(|| format!("building {} transmitter", descriptor.label()))?,
        )
    };
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn draws_stay_inside_ranges_and_repeat_for_a_seed() {
        let ranges = RadarRanges::default();
        let a = RadarDraws::draw(&mut StdRng::seed_from_u64(0), &ranges, 16);
        let b = RadarDraws::draw(&mut StdRng::seed_from_u64(0), &ranges, 16);
        assert_eq!(a, b);
        let lfm = WaveformClass::LinearFm {
            bandwidth: None,
            pulsewidth: None,
        };
        for vector in 0..16 {
            let (bw, pw) = a.parameters(&lfm, vector).unwrap();
            assert!(ranges.bandwidth.contains(&bw));
            assert!(ranges.pulsewidth.contains(&pw));
        }
    }

    #[test]
    fn fixed_parameters_override_draws() {
        let draws = RadarDraws::draw(&mut StdRng::seed_from_u64(1), &RadarRanges::default(), 2);
        let square = WaveformClass::Square {
            pulsewidth: Some(5e-6),
        };
        assert_eq!(draws.parameters(&square, 1).map(|p| p.1), Some(5e-6));
        assert_eq!(draws.parameters(&WaveformClass::Bpsk, 0), None);
    }

    #[test]
    fn descriptors_and_transmitters_follow_class() {
        let config = SynthesisConfig::default();
        let draws = RadarDraws::draw(&mut StdRng::seed_from_u64(0), &config.radar, 1);

        let lfm = build_descriptor(&config.waveforms[0], &config, &draws).unwrap();
        assert_eq!(lfm.label(), "LFM");
        let mut tx = build_transmitter(&lfm, &config, 0).unwrap();
        assert_eq!(tx.generate().len(), 8192);

        let qam = build_descriptor(&WaveformClass::Qam { order: 16 }, &config, &draws).unwrap();
        let mut tx = build_transmitter(&qam, &config, 7).unwrap();
        assert_eq!(tx.label(), "16QAM");
        assert_eq!(tx.generate().len(), config.comms.burst_len);
    }

    #[test]
    fn unsupported_order_is_reported_with_class() {
        let config = SynthesisConfig::default();
        let draws = RadarDraws::draw(&mut StdRng::seed_from_u64(0), &config.radar, 1);
        let err = build_descriptor(&WaveformClass::Psk { order: 7 }, &config, &draws).unwrap_err();
        assert!(format!("{:#}", err).contains("unsupported psk order 7"));
    }
}
