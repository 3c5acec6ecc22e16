//! Constellation maps consumed by the generic modulator.
//!
//! Points are stored in positional order (around the circle for PSK, row
//! major for QAM). Symbol values are Gray pre-coded onto positions so
//! neighbouring points differ by a single bit.

use crate::prelude::Sample;
use std::f64::consts::PI;

fn inverse_gray(code: usize) -> usize {
    let mut value = code;
    let mut shift = code >> 1;
    while shift != 0 {
        value ^= shift;
        shift >>= 1;
    }
    value
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constellation {
    points: Vec<Sample>,
    bits_per_symbol: usize,
    /// Bits per I/Q axis for square QAM, `None` for PSK.
    axis_bits: Option<usize>,
}

impl Constellation {
    /// `order`-ary PSK on the unit circle; QPSK is rotated by π/4.
    pub fn psk(order: usize) -> Self {
        let offset = if order == 4 { PI / 4.0 } else { 0.0 };
        let points = (0..order)
            .map(|position| {
                let angle = offset + 2.0 * PI * position as f64 / order as f64;
                Sample::new(angle.cos() as f32, angle.sin() as f32)
            })
            .collect();
        Self {
            points,
            bits_per_symbol: order.trailing_zeros() as usize,
            axis_bits: None,
        }
    }

    /// Square QAM with Gray coding per axis, scaled to unit average energy.
    pub fn square_qam(order: usize) -> Self {
        let side = (order as f64).sqrt().round() as usize;
        let axis_bits = side.trailing_zeros() as usize;
        let levels: Vec<f64> = (0..side).map(|i| 2.0 * i as f64 - (side as f64 - 1.0)).collect();
        let scale = (2.0 * (order as f64 - 1.0) / 3.0).sqrt();

        let mut points = Vec::with_capacity(order);
        for i in &levels {
            for q in &levels {
                points.push(Sample::new((i / scale) as f32, (q / scale) as f32));
            }
        }
        Self {
            points,
            bits_per_symbol: 2 * axis_bits,
            axis_bits: Some(axis_bits),
        }
    }

    pub fn order(&self) -> usize {
        self.points.len()
    }

    pub fn bits_per_symbol(&self) -> usize {
        self.bits_per_symbol
    }

    pub fn points(&self) -> &[Sample] {
        &self.points
    }

    /// Gray pre-coding: position of the point carrying `value`.
    pub fn precode(&self, value: usize) -> usize {
        let value = value % self.points.len();
        match self.axis_bits {
            None => inverse_gray(value),
            Some(bits) => {
                let mask = (1 << bits) - 1;
                (inverse_gray(value >> bits) << bits) | inverse_gray(value & mask)
            }
        }
    }

    /// Point at a constellation position.
    pub fn point(&self, position: usize) -> Sample {
        self.points[position % self.points.len()]
    }

    /// Maps a symbol value onto its point.
    pub fn map(&self, value: usize) -> Sample {
        self.point(self.precode(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn average_energy(constellation: &Constellation) -> f32 {
        constellation.points().iter().map(|p| p.norm_sqr()).sum::<f32>()
            / constellation.order() as f32
    }

    #[test]
    fn psk_points_lie_on_unit_circle() {
        for order in [2, 4, 8, 16, 32, 64] {
            let constellation = Constellation::psk(order);
            assert_eq!(constellation.order(), order);
            assert_eq!(1 << constellation.bits_per_symbol(), order);
            assert!(constellation
                .points()
                .iter()
                .all(|p| (p.norm() - 1.0).abs() < 1e-6));
        }
    }

    #[test]
    fn bpsk_is_antipodal() {
        let bpsk = Constellation::psk(2);
        assert!((bpsk.map(0) + bpsk.map(1)).norm() < 1e-6);
    }

    #[test]
    fn gray_neighbours_differ_by_one_bit() {
        let psk8 = Constellation::psk(8);
        // walking around the circle, adjacent symbols differ by one bit
        let mut by_angle: Vec<(f32, usize)> = (0..8)
            .map(|s| (psk8.map(s).arg().rem_euclid(std::f32::consts::TAU), s))
            .collect();
        by_angle.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        for pair in by_angle.windows(2) {
            assert_eq!((pair[0].1 ^ pair[1].1).count_ones(), 1);
        }
    }

    #[test]
    fn qam16_neighbours_on_an_axis_differ_by_one_bit() {
        let qam = Constellation::square_qam(16);
        for value in 0..16 {
            for other in 0..16 {
                let a = qam.map(value);
                let b = qam.map(other);
                let spacing = 2.0 / 10.0_f32.sqrt();
                if ((a - b).norm() - spacing).abs() < 1e-4 {
                    assert_eq!((value ^ other).count_ones(), 1);
                }
            }
        }
    }

    #[test]
    fn qam16_has_unit_average_energy() {
        let qam = Constellation::square_qam(16);
        assert_eq!(qam.bits_per_symbol(), 4);
        assert!((average_energy(&qam) - 1.0).abs() < 1e-5);
    }
}
