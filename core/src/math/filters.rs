use std::f64::consts::PI;

/// Normalized sinc, `sin(πx)/(πx)`.
pub fn sinc(x: f64) -> f64 {
    if x.abs() < 1e-12 {
        1.0
    } else {
        (PI * x).sin() / (PI * x)
    }
}

/// Root-raised-cosine interpolation taps spanning `span_symbols` symbols.
///
/// Taps are scaled so they sum to `samples_per_symbol`, which keeps a
/// zero-stuffed symbol stream at unit constellation amplitude.
pub fn root_raised_cosine(samples_per_symbol: usize, rolloff: f64, span_symbols: usize) -> Vec<f64> {
    let sps = samples_per_symbol.max(1) as f64;
    let num_taps = span_symbols * samples_per_symbol.max(1) + 1;
    let mid = (num_taps - 1) as f64 / 2.0;
    let alpha = rolloff;

    let mut taps: Vec<f64> = (0..num_taps)
        .map(|i| {
            let t = (i as f64 - mid) / sps;
            if t.abs() < 1e-12 {
                1.0 - alpha + 4.0 * alpha / PI
            } else if alpha > 1e-12 && (t.abs() - 1.0 / (4.0 * alpha)).abs() < 1e-9 {
                (alpha / 2.0_f64.sqrt())
                    * ((1.0 + 2.0 / PI) * (PI / (4.0 * alpha)).sin()
                        + (1.0 - 2.0 / PI) * (PI / (4.0 * alpha)).cos())
            } else {
                let pit = PI * t;
                let num = (pit * (1.0 - alpha)).sin() + 4.0 * alpha * t * (pit * (1.0 + alpha)).cos();
                let den = pit * (1.0 - (4.0 * alpha * t).powi(2));
                num / den
            }
        })
        .collect();

    let sum: f64 = taps.iter().sum();
    if sum.abs() > 0.0 {
        for tap in &mut taps {
            *tap *= sps / sum;
        }
    }
    taps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sinc_is_one_at_origin_and_zero_at_integers() {
        assert_eq!(sinc(0.0), 1.0);
        assert!(sinc(1.0).abs() < 1e-12);
        assert!(sinc(-3.0).abs() < 1e-12);
    }

    #[test]
    fn rrc_taps_are_symmetric_and_scaled() {
        let taps = root_raised_cosine(4, 0.35, 11);
        assert_eq!(taps.len(), 45);
        for i in 0..taps.len() / 2 {
            assert!((taps[i] - taps[taps.len() - 1 - i]).abs() < 1e-9);
        }
        let sum: f64 = taps.iter().sum();
        assert!((sum - 4.0).abs() < 1e-9);
        let peak = taps.iter().cloned().fold(f64::MIN, f64::max);
        assert_eq!(peak, taps[22]);
    }
}
