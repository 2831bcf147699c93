// next_header / プロトコル番号
// 拡張ヘッダーの連鎖は辿らない。値に名前を付けるだけ。

pub const HOP_BY_HOP: u8 = 0;
pub const ICMP: u8 = 1;
pub const TCP: u8 = 6;
pub const UDP: u8 = 17;
pub const ROUTING: u8 = 43;
pub const FRAGMENT: u8 = 44;
pub const ICMPV6: u8 = 58;
pub const NO_NEXT_HEADER: u8 = 59;
pub const DESTINATION_OPTIONS: u8 = 60;

pub fn protocol_name(number: u8) -> Option<&'static str> {
    match number {
        HOP_BY_HOP => Some("hop-by-hop"),
        ICMP => Some("icmp"),
        TCP => Some("tcp"),
        UDP => Some("udp"),
        ROUTING => Some("routing"),
        FRAGMENT => Some("fragment"),
        ICMPV6 => Some("icmpv6"),
        NO_NEXT_HEADER => Some("none"),
        DESTINATION_OPTIONS => Some("dst-opts"),
        _ => None,
    }
}

pub fn is_extension_header(number: u8) -> bool {
    matches!(number, HOP_BY_HOP | ROUTING | FRAGMENT | DESTINATION_OPTIONS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_names() {
        assert_eq!(protocol_name(TCP), Some("tcp"));
        assert_eq!(protocol_name(ICMPV6), Some("icmpv6"));
        assert_eq!(protocol_name(200), None);
    }

    #[test]
    fn test_extension_headers() {
        assert!(is_extension_header(FRAGMENT));
        assert!(is_extension_header(HOP_BY_HOP));
        assert!(!is_extension_header(TCP));
        assert!(!is_extension_header(NO_NEXT_HEADER));
    }
}
