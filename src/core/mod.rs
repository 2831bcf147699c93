pub mod config;
pub mod dump;
pub mod error;

pub use config::DumpConfig;
pub use dump::HeaderDumper;
pub use error::{DumpError, DumpResult};
