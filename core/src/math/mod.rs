pub mod filters;
pub mod stats;

pub use filters::{root_raised_cosine, sinc};
pub use stats::StatsHelper;
