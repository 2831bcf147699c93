pub mod core;
pub mod error;
pub mod network;
pub mod setup_logger;

pub use error::{DecodeError, EncodeError};
pub use network::packet::{FlagFilter, IPv6Address, IPv6Header, TCPFlags, TCPHeader, TCPOptions};
