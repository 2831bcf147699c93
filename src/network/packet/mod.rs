pub mod address;
pub mod byte_order;
pub mod ipv6;
pub mod protocol;
pub mod tcp;
pub mod tcp_flags;

pub use address::IPv6Address;
pub use ipv6::IPv6Header;
pub use tcp::{TCPHeader, TCPOptions};
pub use tcp_flags::{FlagFilter, TCPFlags};
