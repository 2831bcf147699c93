use crate::error::{DecodeError, DecodeResult, EncodeError, EncodeResult};
use crate::network::packet::address::IPv6Address;
use crate::network::packet::byte_order::{pack_bits, read_be16, unpack_bits, write_be16};
use crate::network::packet::protocol;
use bytes::BufMut;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const IPV6_HEADER_LEN: usize = 40;
pub const IPV6_VERSION: u8 = 6;
pub const DEFAULT_HOP_LIMIT: u8 = 64;

const FLOW_LABEL_MASK: u32 = 0x000F_FFFF;

// 0                   1                   2                   3
// 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |Version| Traffic Class |           Flow Label                  |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |         Payload Length        |  Next Header  |   Hop Limit   |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                                                               |
// +                         Source Address                        +
// |                           (128 bit)                           |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                                                               |
// +                      Destination Address                      +
// |                           (128 bit)                           |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IPv6Header {
    pub version: u8,
    pub traffic_class: u8,
    pub flow_label: u32,
    pub payload_length: u16,
    pub next_header: u8,
    pub hop_limit: u8,
    pub source_address: IPv6Address,
    pub destination_address: IPv6Address,
}

impl IPv6Header {
    pub fn new(
        source_address: IPv6Address,
        destination_address: IPv6Address,
        next_header: u8,
        payload_length: u16,
    ) -> Self {
        Self {
            version: IPV6_VERSION,
            traffic_class: 0,
            flow_label: 0,
            payload_length,
            next_header,
            hop_limit: DEFAULT_HOP_LIMIT,
            source_address,
            destination_address,
        }
    }

    // `offset` から40バイトを読み取る。
    //
    // バージョンが6以外でもエラーにはしない。判断は呼び出し側に任せる。
    pub fn decode(bytes: &[u8], offset: usize) -> DecodeResult<Self> {
        let available = bytes.len().saturating_sub(offset);
        if available < IPV6_HEADER_LEN {
            debug!("IPv6ヘッダーのデコードに失敗しました: 残り{}バイト", available);
            return Err(DecodeError::TruncatedBuffer {
                needed: IPV6_HEADER_LEN,
                available,
            });
        }

        let data = &bytes[offset..offset + IPV6_HEADER_LEN];

        Ok(Self {
            version: unpack_bits(data, 0, 4) as u8,
            traffic_class: unpack_bits(data, 4, 8) as u8,
            flow_label: unpack_bits(data, 12, 20),
            payload_length: read_be16(data, 4),
            next_header: data[6],
            hop_limit: data[7],
            source_address: IPv6Address::read(data, 8),
            destination_address: IPv6Address::read(data, 24),
        })
    }

    // ヘッダーと後続のデータを分割する
    pub fn parse(data: &[u8]) -> DecodeResult<(Self, &[u8])> {
        let header = Self::decode(data, 0)?;
        Ok((header, &data[IPV6_HEADER_LEN..]))
    }

    // `offset` から40バイトを書き込む。
    //
    // 各フィールドはビット幅に切り詰められる(flow_labelは20ビット、versionは4ビット)。
    pub fn encode(&self, bytes: &mut [u8], offset: usize) -> EncodeResult<()> {
        let available = bytes.len().saturating_sub(offset);
        if available < IPV6_HEADER_LEN {
            debug!("IPv6ヘッダーのエンコードに失敗しました: 残り{}バイト", available);
            return Err(EncodeError::BufferTooSmall {
                needed: IPV6_HEADER_LEN,
                available,
            });
        }

        self.write_fields(&mut bytes[offset..offset + IPV6_HEADER_LEN]);
        Ok(())
    }

    pub fn to_bytes(&self) -> [u8; IPV6_HEADER_LEN] {
        let mut data = [0u8; IPV6_HEADER_LEN];
        self.write_fields(&mut data);
        data
    }

    // 送信用バッファの末尾に追加する
    pub fn put<B: BufMut>(&self, buf: &mut B) {
        buf.put_slice(&self.to_bytes());
    }

    fn write_fields(&self, data: &mut [u8]) {
        // バージョン、トラフィッククラス、フローラベルは先頭4バイトを共有する
        pack_bits(data, 0, 4, self.version as u32);
        pack_bits(data, 4, 8, self.traffic_class as u32);
        pack_bits(data, 12, 20, self.flow_label & FLOW_LABEL_MASK);

        // ペイロード長、次ヘッダー、ホップリミット
        write_be16(data, 4, self.payload_length);
        data[6] = self.next_header;
        data[7] = self.hop_limit;

        self.source_address.write(data, 8);
        self.destination_address.write(data, 24);
    }

    pub fn is_version_6(&self) -> bool {
        self.version == IPV6_VERSION
    }

    // 先頭バイトに対する簡易チェック (priority_version & 0x60)
    pub fn passes_sanity_check(&self) -> bool {
        let first_byte = ((self.version & 0x0F) << 4) | (self.traffic_class >> 4);
        first_byte & 0x60 != 0
    }

    pub fn carries_tcp(&self) -> bool {
        self.next_header == protocol::TCP
    }

    pub fn total_length(&self) -> usize {
        IPV6_HEADER_LEN + self.payload_length as usize
    }
}

impl fmt::Display for IPv6Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ipv6 ver {} tc 0x{:02x} flow {} iplen {} nexthdr {}",
            self.version, self.traffic_class, self.flow_label, self.payload_length, self.next_header
        )?;
        if let Some(name) = protocol::protocol_name(self.next_header) {
            write!(f, " ({})", name)?;
        }
        write!(
            f,
            " hop {} src {} dst {}",
            self.hop_limit, self.source_address, self.destination_address
        )
    }
}
