mod config;
mod constants;
mod data;
mod error;
mod metrics;
mod order;
mod stats;

pub use config::*;
pub use constants::*;
pub use data::*;
pub use error::*;
pub use metrics::*;
pub use order::*;
pub use stats::*;
