pub mod detail;
pub mod emitter;

pub use detail::{DetailField, SignalDetail, SignalType, DETAIL_KEY};
pub use emitter::{EmitterDetail, GeoPoint};
