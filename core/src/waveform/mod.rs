//! Waveform catalog: radar pulses with closed-form samples and digital
//! modulations described by constellation parameters.

pub mod comms;
pub mod constellation;
pub mod radar;

pub use comms::{CommsOptions, ModulationFamily, ModulationParams, PSK_ORDERS, QAM_ORDERS};
pub use constellation::Constellation;
pub use radar::{LinearFm, Square};

use crate::metadata::{DetailField, SignalDetail, SignalType};
use crate::prelude::{Sample, SynthError, SynthResult};

/// Capability shared by waveforms that can be sampled directly.
pub trait Waveform {
    fn sample(&self) -> Vec<Sample>;
}

/// Closed set of waveform variants.
#[derive(Debug, Clone, PartialEq)]
pub enum WaveformKind {
    LinearFm(LinearFm),
    Square(Square),
    Psk(ModulationParams),
    Qam(ModulationParams),
}

/// A waveform variant together with its label and signal metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformDescriptor {
    label: String,
    detail: SignalDetail,
    kind: WaveformKind,
}

impl WaveformDescriptor {
    pub fn linear_fm(bandwidth: f64, pulsewidth: f64, sample_rate: f64) -> SynthResult<Self> {
        let lfm = LinearFm::new(bandwidth, pulsewidth, sample_rate)?;
        let mut detail = SignalDetail::new();
        detail
            .set(DetailField::Type(SignalType::Analog))
            .set(DetailField::Class("fm".into()))
            .set(DetailField::Bandwidth(bandwidth));
        Ok(Self {
            label: "LFM".to_string(),
            detail,
            kind: WaveformKind::LinearFm(lfm),
        })
    }

    pub fn square(pulsewidth: f64, sample_rate: f64) -> SynthResult<Self> {
        let square = Square::new(pulsewidth, sample_rate)?;
        let mut detail = SignalDetail::new();
        detail
            .set(DetailField::Type(SignalType::Digital))
            .set(DetailField::Class("ask".into()))
            .set(DetailField::Bandwidth(square.bandwidth()));
        Ok(Self {
            label: "Square".to_string(),
            detail,
            kind: WaveformKind::Square(square),
        })
    }

    pub fn psk(order: u32, options: CommsOptions) -> SynthResult<Self> {
        let params = ModulationParams::new(ModulationFamily::Psk, order, options)?;
        Ok(Self::digital(params, WaveformKind::Psk(params)))
    }

    pub fn bpsk(options: CommsOptions) -> SynthResult<Self> {
        Self::psk(2, options)
    }

    pub fn qpsk(options: CommsOptions) -> SynthResult<Self> {
        Self::psk(4, options)
    }

    pub fn qam(order: u32, options: CommsOptions) -> SynthResult<Self> {
        let params = ModulationParams::new(ModulationFamily::Qam, order, options)?;
        Ok(Self::digital(params, WaveformKind::Qam(params)))
    }

    fn digital(params: ModulationParams, kind: WaveformKind) -> Self {
        let mut detail = SignalDetail::new();
        detail
            .set(DetailField::Type(SignalType::Digital))
            .set(DetailField::Class(params.family().name().into()))
            .set(DetailField::Order(params.order()));
        Self {
            label: params.label(),
            detail,
            kind,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn detail(&self) -> &SignalDetail {
        &self.detail
    }

    pub fn kind(&self) -> &WaveformKind {
        &self.kind
    }

    pub fn is_radar(&self) -> bool {
        matches!(self.kind, WaveformKind::LinearFm(_) | WaveformKind::Square(_))
    }

    pub fn modulation(&self) -> Option<&ModulationParams> {
        match &self.kind {
            WaveformKind::Psk(params) | WaveformKind::Qam(params) => Some(params),
            _ => None,
        }
    }

    /// Closed-form samples for radar variants.
    ///
    /// Digital variants are produced by the modulator backend instead.
    pub fn sample(&self) -> SynthResult<Vec<Sample>> {
        match &self.kind {
            WaveformKind::LinearFm(lfm) => Ok(lfm.sample()),
            WaveformKind::Square(square) => Ok(square.sample()),
            WaveformKind::Psk(_) | WaveformKind::Qam(_) => Err(SynthError::InvalidParameter(
                format!("{} samples come from the modulator backend", self.label),
            )),
        }
    }

    /// Re-parameterizes a radar pulse in place and refreshes its bandwidth metadata.
    ///
    /// The square pulse derives its bandwidth from the pulsewidth and ignores
    /// `bandwidth`. On error the descriptor is left unchanged.
    pub fn set_radar_parameters(&mut self, bandwidth: f64, pulsewidth: f64) -> SynthResult<()> {
        match &mut self.kind {
            WaveformKind::LinearFm(lfm) => {
                *lfm = LinearFm::new(bandwidth, pulsewidth, lfm.sample_rate())?;
                self.detail.set(DetailField::Bandwidth(bandwidth));
            }
            WaveformKind::Square(square) => {
                *square = Square::new(pulsewidth, square.sample_rate())?;
                self.detail.set(DetailField::Bandwidth(square.bandwidth()));
            }
            WaveformKind::Psk(_) | WaveformKind::Qam(_) => {
                return Err(SynthError::InvalidParameter(format!(
                    "{} has no radar parameters",
                    self.label
                )));
            }
        }
        Ok(())
    }
}
