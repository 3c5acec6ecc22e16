use crate::math::filters::root_raised_cosine;
use crate::prelude::Sample;
use crate::waveform::{Constellation, ModulationParams};
use std::collections::VecDeque;

/// Span of the root-raised-cosine shaping filter, in symbols.
pub const RRC_SPAN_SYMBOLS: usize = 11;

/// Constellation modulator: bytes → symbols → (differential) → points → RRC.
///
/// Bits are consumed MSB first. Leftover bits and the filter delay line carry
/// over between calls so consecutive blocks form one continuous stream.
#[derive(Debug, Clone)]
pub struct GenericModulator {
    constellation: Constellation,
    differential: bool,
    samples_per_symbol: usize,
    taps: Vec<f32>,
    delay_line: VecDeque<Sample>,
    pending_bits: VecDeque<u8>,
    previous_position: usize,
}

impl GenericModulator {
    pub fn new(params: &ModulationParams) -> Self {
        let taps: Vec<f32> = root_raised_cosine(
            params.samples_per_symbol(),
            params.excess_bandwidth(),
            RRC_SPAN_SYMBOLS,
        )
        .into_iter()
        .map(|tap| tap as f32)
        .collect();
        let delay_line = VecDeque::from(vec![Sample::new(0.0, 0.0); taps.len()]);

        Self {
            constellation: params.constellation(),
            differential: params.differential(),
            samples_per_symbol: params.samples_per_symbol(),
            taps,
            delay_line,
            pending_bits: VecDeque::new(),
            previous_position: 0,
        }
    }

    pub fn samples_per_symbol(&self) -> usize {
        self.samples_per_symbol
    }

    pub fn bits_per_symbol(&self) -> usize {
        self.constellation.bits_per_symbol()
    }

    /// Modulates a block of packed bytes.
    pub fn modulate(&mut self, bytes: &[u8]) -> Vec<Sample> {
        for &byte in bytes {
            for shift in (0..8).rev() {
                self.pending_bits.push_back((byte >> shift) & 1);
            }
        }

        let bits_per_symbol = self.bits_per_symbol();
        let symbols = self.pending_bits.len() / bits_per_symbol;
        let mut output = Vec::with_capacity(symbols * self.samples_per_symbol);
        for _ in 0..symbols {
            let value = self
                .pending_bits
                .drain(..bits_per_symbol)
                .fold(0usize, |acc, bit| (acc << 1) | bit as usize);
            let point = self.next_point(value);
            self.shape(point, &mut output);
        }
        output
    }

    fn next_point(&mut self, value: usize) -> Sample {
        let mut position = self.constellation.precode(value);
        if self.differential {
            position = (self.previous_position + position) % self.constellation.order();
            self.previous_position = position;
        }
        self.constellation.point(position)
    }

    fn shape(&mut self, point: Sample, output: &mut Vec<Sample>) {
        for phase in 0..self.samples_per_symbol {
            let input = if phase == 0 { point } else { Sample::new(0.0, 0.0) };
            self.delay_line.pop_back();
            self.delay_line.push_front(input);
            let filtered = self
                .taps
                .iter()
                .zip(self.delay_line.iter())
                .fold(Sample::new(0.0, 0.0), |acc, (&tap, &sample)| acc + sample * tap);
            output.push(filtered);
        }
    }

    /// Clears filter history, leftover bits and the differential reference.
    pub fn reset(&mut self) {
        self.delay_line.iter_mut().for_each(|s| *s = Sample::new(0.0, 0.0));
        self.pending_bits.clear();
        self.previous_position = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waveform::{CommsOptions, ModulationFamily};

    fn params(family: ModulationFamily, order: u32, differential: bool) -> ModulationParams {
        let options = CommsOptions {
            differential,
            samples_per_symbol: 4,
            excess_bandwidth: 0.35,
        };
        ModulationParams::new(family, order, options).unwrap()
    }

    #[test]
    fn output_length_is_symbols_times_sps() {
        let mut bpsk = GenericModulator::new(&params(ModulationFamily::Psk, 2, false));
        assert_eq!(bpsk.modulate(&[0xA5, 0x0F]).len(), 16 * 4);

        let mut qam = GenericModulator::new(&params(ModulationFamily::Qam, 16, false));
        assert_eq!(qam.modulate(&[0xA5, 0x0F, 0x33]).len(), 6 * 4);
    }

    #[test]
    fn leftover_bits_carry_into_next_block() {
        let mut psk8 = GenericModulator::new(&params(ModulationFamily::Psk, 8, false));
        // 8 bits → 2 symbols with 2 bits left over, 16 bits → 5 symbols with 1 left
        assert_eq!(psk8.modulate(&[0xFF]).len(), 2 * 4);
        assert_eq!(psk8.modulate(&[0xFF]).len(), 3 * 4);
    }

    #[test]
    fn steady_state_recovers_constellation_amplitude() {
        let mut bpsk = GenericModulator::new(&params(ModulationFamily::Psk, 2, false));
        // all-ones bits keep emitting the same point, so the filter settles at its DC gain
        let output = bpsk.modulate(&[0xFF; 16]);
        let settled = output[output.len() - 1];
        let expected = Constellation::psk(2).map(1);
        assert!((settled - expected).norm() < 2e-2);
    }

    #[test]
    fn differential_encoding_accumulates_positions() {
        let mut plain = GenericModulator::new(&params(ModulationFamily::Psk, 2, false));
        let mut diff = GenericModulator::new(&params(ModulationFamily::Psk, 2, true));
        let bpsk = Constellation::psk(2);

        // value 1 twice: plain stays on point 1, differential toggles 1 → 0
        assert_eq!(plain.next_point(1), bpsk.point(1));
        assert_eq!(plain.next_point(1), bpsk.point(1));
        assert_eq!(diff.next_point(1), bpsk.point(1));
        assert_eq!(diff.next_point(1), bpsk.point(0));
    }

    #[test]
    fn reset_restarts_the_stream() {
        let mut modulator = GenericModulator::new(&params(ModulationFamily::Psk, 4, true));
        let first = modulator.modulate(&[0x1B, 0xE4]);
        modulator.reset();
        let second = modulator.modulate(&[0x1B, 0xE4]);
        assert_eq!(first, second);
    }
}
