use crate::error::AddressParseError;
use crate::network::packet::byte_order::{read_be16, read_be32, read_be64, write_be16, write_be32, write_be64};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::net::Ipv6Addr;
use std::str::FromStr;

pub const IPV6_ADDRESS_LEN: usize = 16;

// 128ビットのIPv6アドレス。
//
// 実体は16バイトの配列ひとつで、8/16/32/64ビット単位のビューは
// 必要な時にワイヤーバイトオーダーで組み立てる。どのビューも同じ16バイトを指す。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct IPv6Address([u8; IPV6_ADDRESS_LEN]);

impl IPv6Address {
    pub const UNSPECIFIED: Self = Self([0; IPV6_ADDRESS_LEN]);

    pub const fn new(octets: [u8; IPV6_ADDRESS_LEN]) -> Self {
        Self(octets)
    }

    pub fn read(bytes: &[u8], offset: usize) -> Self {
        let mut octets = [0u8; IPV6_ADDRESS_LEN];
        octets.copy_from_slice(&bytes[offset..offset + IPV6_ADDRESS_LEN]);
        Self(octets)
    }

    pub fn write(&self, bytes: &mut [u8], offset: usize) {
        bytes[offset..offset + IPV6_ADDRESS_LEN].copy_from_slice(&self.0);
    }

    pub fn from_segments(segments: [u16; 8]) -> Self {
        let mut octets = [0u8; IPV6_ADDRESS_LEN];
        for (i, segment) in segments.iter().enumerate() {
            write_be16(&mut octets, i * 2, *segment);
        }
        Self(octets)
    }

    pub fn from_words(words: [u32; 4]) -> Self {
        let mut octets = [0u8; IPV6_ADDRESS_LEN];
        for (i, word) in words.iter().enumerate() {
            write_be32(&mut octets, i * 4, *word);
        }
        Self(octets)
    }

    pub fn from_quads(quads: [u64; 2]) -> Self {
        let mut octets = [0u8; IPV6_ADDRESS_LEN];
        write_be64(&mut octets, 0, quads[0]);
        write_be64(&mut octets, 8, quads[1]);
        Self(octets)
    }

    // 8ビットビュー
    pub fn octets(&self) -> [u8; IPV6_ADDRESS_LEN] {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8; IPV6_ADDRESS_LEN] {
        &self.0
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8; IPV6_ADDRESS_LEN] {
        &mut self.0
    }

    // 16ビットビュー
    pub fn segments(&self) -> [u16; 8] {
        let mut segments = [0u16; 8];
        for (i, segment) in segments.iter_mut().enumerate() {
            *segment = read_be16(&self.0, i * 2);
        }
        segments
    }

    // indexは0..8の範囲。範囲外はパニックする
    pub fn set_segment(&mut self, index: usize, value: u16) {
        write_be16(&mut self.0, index * 2, value);
    }

    // 32ビットビュー
    pub fn words(&self) -> [u32; 4] {
        let mut words = [0u32; 4];
        for (i, word) in words.iter_mut().enumerate() {
            *word = read_be32(&self.0, i * 4);
        }
        words
    }

    // indexは0..4の範囲。範囲外はパニックする
    pub fn set_word(&mut self, index: usize, value: u32) {
        write_be32(&mut self.0, index * 4, value);
    }

    // 64ビットビュー
    pub fn quads(&self) -> [u64; 2] {
        [read_be64(&self.0, 0), read_be64(&self.0, 8)]
    }

    // indexは0..2の範囲。範囲外はパニックする
    pub fn set_quad(&mut self, index: usize, value: u64) {
        write_be64(&mut self.0, index * 8, value);
    }

    pub fn is_unspecified(&self) -> bool {
        self.0 == [0; IPV6_ADDRESS_LEN]
    }
}

impl From<[u8; IPV6_ADDRESS_LEN]> for IPv6Address {
    fn from(octets: [u8; IPV6_ADDRESS_LEN]) -> Self {
        Self(octets)
    }
}

impl From<Ipv6Addr> for IPv6Address {
    fn from(addr: Ipv6Addr) -> Self {
        Self(addr.octets())
    }
}

impl From<IPv6Address> for Ipv6Addr {
    fn from(addr: IPv6Address) -> Self {
        Ipv6Addr::from(addr.0)
    }
}

impl fmt::Display for IPv6Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Ipv6Addr::from(self.0).fmt(f)
    }
}

impl FromStr for IPv6Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<Ipv6Addr>()
            .map(Self::from)
            .map_err(|_| AddressParseError(s.to_string()))
    }
}

// JSON出力ではテキスト表記を使う
impl Serialize for IPv6Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for IPv6Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn documentation_address() -> IPv6Address {
        IPv6Address::new([
            0x20, 0x01, 0x0d, 0xb8, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01,
        ])
    }

    #[test]
    fn test_views_share_the_same_bytes() {
        let addr = documentation_address();

        assert_eq!(addr.segments(), [0x2001, 0x0db8, 0, 0, 0, 0, 0, 1]);
        assert_eq!(addr.words(), [0x2001_0db8, 0, 0, 1]);
        assert_eq!(addr.quads(), [0x2001_0db8_0000_0000, 1]);

        assert_eq!(IPv6Address::from_segments(addr.segments()), addr);
        assert_eq!(IPv6Address::from_words(addr.words()), addr);
        assert_eq!(IPv6Address::from_quads(addr.quads()), addr);
    }

    #[test]
    fn test_setters_update_every_view() {
        let mut addr = IPv6Address::UNSPECIFIED;
        assert!(addr.is_unspecified());

        addr.set_segment(7, 0xBEEF);
        assert_eq!(addr.octets()[14..], [0xBE, 0xEF]);
        assert_eq!(addr.words()[3], 0x0000_BEEF);

        addr.set_word(0, 0xFE80_0000);
        assert_eq!(addr.segments()[0], 0xFE80);

        addr.set_quad(1, u64::MAX);
        assert_eq!(addr.segments()[4..], [0xFFFF; 4]);

        addr.as_bytes_mut()[1] = 0x81;
        assert_eq!(addr.quads()[0] >> 48, 0xFE81);
    }

    #[test]
    fn test_std_conversion_and_text() {
        let addr = documentation_address();
        let std_addr: Ipv6Addr = addr.into();

        assert_eq!(std_addr.segments(), addr.segments());
        assert_eq!(IPv6Address::from(std_addr), addr);
        assert_eq!(addr.to_string(), "2001:db8::1");
        assert_eq!("2001:db8::1".parse::<IPv6Address>(), Ok(addr));
    }

    #[test]
    fn test_parse_invalid_text() {
        let err = "192.0.2.1".parse::<IPv6Address>().unwrap_err();
        assert_eq!(err, AddressParseError("192.0.2.1".to_string()));
    }

    #[test]
    fn test_read_and_write_at_offset() {
        let mut buffer = [0u8; 20];
        documentation_address().write(&mut buffer, 3);

        assert_eq!(buffer[3], 0x20);
        assert_eq!(buffer[18], 0x01);
        assert_eq!(IPv6Address::read(&buffer, 3), documentation_address());
    }

    #[test]
    fn test_serde_uses_text_form() {
        let addr = documentation_address();
        let json = serde_json::to_string(&addr).unwrap();

        assert_eq!(json, "\"2001:db8::1\"");
        assert_eq!(serde_json::from_str::<IPv6Address>(&json).unwrap(), addr);
        assert!(serde_json::from_str::<IPv6Address>("\"not-an-address\"").is_err());
    }

    #[test]
    fn test_setters_accept_last_index() {
        let mut addr = IPv6Address::UNSPECIFIED;
        addr.set_segment(7, 0x0001);
        addr.set_word(3, 0x0000_0002);
        addr.set_quad(1, 0x0000_0000_0000_0003);
        assert_eq!(addr.octets()[15], 0x03);
    }

    #[test]
    #[should_panic]
    fn test_set_segment_out_of_range_panics() {
        let mut addr = IPv6Address::UNSPECIFIED;
        addr.set_segment(8, 0xFFFF);
    }

    #[test]
    #[should_panic]
    fn test_set_word_out_of_range_panics() {
        let mut addr = IPv6Address::UNSPECIFIED;
        addr.set_word(4, 0xFFFF_FFFF);
    }

    #[test]
    #[should_panic]
    fn test_set_quad_out_of_range_panics() {
        let mut addr = IPv6Address::UNSPECIFIED;
        addr.set_quad(2, u64::MAX);
    }
}
