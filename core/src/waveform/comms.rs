use crate::prelude::{SynthError, SynthResult};
use crate::waveform::constellation::Constellation;
use serde::{Deserialize, Serialize};

/// PSK orders accepted by the catalog.
pub const PSK_ORDERS: &[u32] = &[2, 4, 8, 16, 32, 64];
/// QAM orders accepted by the catalog.
pub const QAM_ORDERS: &[u32] = &[16];

/// Shaping options shared by all digital modulations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommsOptions {
    pub differential: bool,
    pub samples_per_symbol: usize,
    /// Root-raised-cosine roll-off beyond the Nyquist bandwidth.
    pub excess_bandwidth: f64,
}

impl Default for CommsOptions {
    fn default() -> Self {
        Self {
            differential: false,
            samples_per_symbol: 2,
            excess_bandwidth: 0.35,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModulationFamily {
    Psk,
    Qam,
}

impl ModulationFamily {
    pub fn name(self) -> &'static str {
        match self {
            ModulationFamily::Psk => "psk",
            ModulationFamily::Qam => "qam",
        }
    }

    pub fn supported_orders(self) -> &'static [u32] {
        match self {
            ModulationFamily::Psk => PSK_ORDERS,
            ModulationFamily::Qam => QAM_ORDERS,
        }
    }
}

/// Validated parameters for the external/generic modulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModulationParams {
    family: ModulationFamily,
    order: u32,
    options: CommsOptions,
}

impl ModulationParams {
    pub fn new(family: ModulationFamily, order: u32, options: CommsOptions) -> SynthResult<Self> {
        if !family.supported_orders().contains(&order) {
            return Err(SynthError::UnsupportedOrder {
                family: family.name(),
                order,
            });
        }
        if options.samples_per_symbol < 2 {
            return Err(SynthError::InvalidParameter(format!(
                "samples per symbol must be at least 2, got {}",
                options.samples_per_symbol
            )));
        }
        if !(options.excess_bandwidth > 0.0 && options.excess_bandwidth <= 1.0) {
            return Err(SynthError::InvalidParameter(format!(
                "excess bandwidth must be in (0, 1], got {}",
                options.excess_bandwidth
            )));
        }
        Ok(Self {
            family,
            order,
            options,
        })
    }

    pub fn family(&self) -> ModulationFamily {
        self.family
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    pub fn differential(&self) -> bool {
        self.options.differential
    }

    pub fn samples_per_symbol(&self) -> usize {
        self.options.samples_per_symbol
    }

    pub fn excess_bandwidth(&self) -> f64 {
        self.options.excess_bandwidth
    }

    pub fn constellation(&self) -> Constellation {
        match self.family {
            ModulationFamily::Psk => Constellation::psk(self.order as usize),
            ModulationFamily::Qam => Constellation::square_qam(self.order as usize),
        }
    }

    pub fn label(&self) -> String {
        match (self.family, self.order) {
            (ModulationFamily::Psk, 2) => "BPSK".to_string(),
            (ModulationFamily::Psk, 4) => "QPSK".to_string(),
            (ModulationFamily::Psk, order) => format!("{}PSK", order),
            (ModulationFamily::Qam, order) => format!("{}QAM", order),
        }
    }
}
