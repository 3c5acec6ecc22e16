pub mod channel;
pub mod flowgraph;
pub mod modulator;
pub mod transmitter;

pub use channel::{CarrierDrift, Channel, ChannelConfig};
pub use flowgraph::Flowgraph;
pub use modulator::GenericModulator;
pub use transmitter::{BitSource, ModulatedSource, SampleSource, VectorSource, DEFAULT_BURST_LEN};
