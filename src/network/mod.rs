pub mod packet;

pub use packet::{IPv6Address, IPv6Header, TCPFlags, TCPHeader, TCPOptions};
