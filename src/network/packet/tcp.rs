use crate::error::{DecodeError, DecodeResult, EncodeError, EncodeResult};
use crate::network::packet::byte_order::{pack_bits, read_be16, read_be32, unpack_bits, write_be16, write_be32};
use crate::network::packet::tcp_flags::TCPFlags;
use bytes::BufMut;
use log::debug;
use serde::{Serialize, Serializer};
use std::fmt;

pub const TCP_HEADER_MIN_LEN: usize = 20;
pub const TCP_HEADER_MAX_LEN: usize = 60;
pub const TCP_MAX_OPTIONS_LEN: usize = TCP_HEADER_MAX_LEN - TCP_HEADER_MIN_LEN;
pub const TCP_MIN_DATA_OFFSET: u8 = 5;
pub const TCP_MAX_DATA_OFFSET: u8 = 15;

// 12バイト目のビット位置
const DATA_OFFSET_BIT: usize = 96;
const RESERVED_BIT: usize = 100;

// オプション領域の生バイト列。中身(kind/length/data)は解釈しない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TCPOptions<'a>(&'a [u8]);

impl<'a> TCPOptions<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    // 32ビットワード単位のビュー。端数のバイトは含まない
    pub fn words(self) -> impl Iterator<Item = u32> + 'a {
        self.0.chunks_exact(4).map(|word| read_be32(word, 0))
    }
}

impl<'a> From<&'a [u8]> for TCPOptions<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self(bytes)
    }
}

impl Serialize for TCPOptions<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

// 0                   1                   2                   3
// 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |          Source Port          |       Destination Port        |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                        Sequence Number                        |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                    Acknowledgment Number                      |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |  Data |       |C|E|U|A|P|R|S|F|                               |
// | Offset| Rsrvd |W|C|R|C|S|S|Y|I|            Window             |
// |       |       |R|E|G|K|H|T|N|N|                               |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |           Checksum            |         Urgent Pointer        |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                    Options                    |    Padding    |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//
// data_offsetはフィールドとして持たず、オプション長から求める。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TCPHeader<'a> {
    pub source_port: u16,
    pub dest_port: u16,
    pub sequence_number: u32,
    pub ack_number: u32,
    pub reserved: u8,
    pub flags: TCPFlags,
    pub window: u16,
    pub checksum: u16,
    pub urgent_pointer: u16,
    pub options: TCPOptions<'a>,
}

impl<'a> TCPHeader<'a> {
    pub fn new(source_port: u16, dest_port: u16) -> Self {
        Self {
            source_port,
            dest_port,
            sequence_number: 0,
            ack_number: 0,
            reserved: 0,
            flags: TCPFlags::default(),
            window: 0,
            checksum: 0,
            urgent_pointer: 0,
            options: TCPOptions::default(),
        }
    }

    pub fn with_options(self, options: &'a [u8]) -> TCPHeader<'a> {
        TCPHeader {
            options: TCPOptions::new(options),
            ..self
        }
    }

    pub fn header_len(&self) -> usize {
        TCP_HEADER_MIN_LEN + self.options.len()
    }

    // 32ビットワード数。オプション長が不正な場合は切り捨てた値になる
    pub fn data_offset(&self) -> u8 {
        (self.header_len() / 4).min(u8::MAX as usize) as u8
    }

    // `offset` からTCPヘッダーを読み取る。オプションは `bytes` を借用する。
    pub fn decode(bytes: &'a [u8], offset: usize) -> DecodeResult<Self> {
        let available = bytes.len().saturating_sub(offset);
        if available < TCP_HEADER_MIN_LEN {
            debug!("TCPヘッダーのデコードに失敗しました: 残り{}バイト", available);
            return Err(DecodeError::TruncatedBuffer {
                needed: TCP_HEADER_MIN_LEN,
                available,
            });
        }

        let data = &bytes[offset..];

        // データオフセットを先に読んでヘッダー全体の長さを決める
        let data_offset = unpack_bits(data, DATA_OFFSET_BIT, 4) as u8;
        if data_offset < TCP_MIN_DATA_OFFSET {
            debug!("TCPヘッダーのデータオフセットが不正です: {}", data_offset);
            return Err(DecodeError::InvalidDataOffset(data_offset));
        }

        let header_len = data_offset as usize * 4;
        if available < header_len {
            debug!("TCPオプションが途中で切れています: {}バイト中{}バイト", header_len, available);
            return Err(DecodeError::TruncatedBuffer {
                needed: header_len,
                available,
            });
        }

        Ok(Self {
            source_port: read_be16(data, 0),
            dest_port: read_be16(data, 2),
            sequence_number: read_be32(data, 4),
            ack_number: read_be32(data, 8),
            reserved: unpack_bits(data, RESERVED_BIT, 4) as u8,
            flags: TCPFlags::from_byte(data[13]),
            window: read_be16(data, 14),
            checksum: read_be16(data, 16),
            urgent_pointer: read_be16(data, 18),
            options: TCPOptions::new(&data[TCP_HEADER_MIN_LEN..header_len]),
        })
    }

    // ヘッダーとペイロードを分割する
    pub fn parse(data: &'a [u8]) -> DecodeResult<(Self, &'a [u8])> {
        let header = Self::decode(data, 0)?;
        let header_len = header.header_len();
        Ok((header, &data[header_len..]))
    }

    // オプション長を検査し、ヘッダー全体の長さを返す
    fn checked_header_len(&self) -> EncodeResult<usize> {
        let options_len = self.options.len();
        let data_offset = (TCP_HEADER_MIN_LEN + options_len) / 4;
        if options_len % 4 != 0 || data_offset > TCP_MAX_DATA_OFFSET as usize {
            debug!("TCPオプション長が不正です: {}バイト", options_len);
            return Err(EncodeError::InvalidOptionsLength(options_len));
        }
        Ok(TCP_HEADER_MIN_LEN + options_len)
    }

    // `offset` からヘッダーとオプションを書き込む。
    //
    // 検査はすべて書き込み前に行うので、失敗時にバッファは変更されない。
    // オプションはそのままコピーし、パディングは追加しない。
    pub fn encode(&self, bytes: &mut [u8], offset: usize) -> EncodeResult<()> {
        let header_len = self.checked_header_len()?;

        let available = bytes.len().saturating_sub(offset);
        if available < header_len {
            debug!("TCPヘッダーのエンコードに失敗しました: 残り{}バイト", available);
            return Err(EncodeError::BufferTooSmall {
                needed: header_len,
                available,
            });
        }

        self.write_fields(&mut bytes[offset..offset + header_len]);
        Ok(())
    }

    pub fn to_vec(&self) -> EncodeResult<Vec<u8>> {
        let mut data = vec![0u8; self.checked_header_len()?];
        self.write_fields(&mut data);
        Ok(data)
    }

    // 送信用バッファの末尾に追加する
    pub fn put<B: BufMut>(&self, buf: &mut B) -> EncodeResult<()> {
        let data = self.to_vec()?;
        buf.put_slice(&data);
        Ok(())
    }

    fn write_fields(&self, data: &mut [u8]) {
        // 送信元ポートと宛先ポート
        write_be16(data, 0, self.source_port);
        write_be16(data, 2, self.dest_port);

        // シーケンス番号と確認応答番号
        write_be32(data, 4, self.sequence_number);
        write_be32(data, 8, self.ack_number);

        // データオフセットと予約ビットは12バイト目を共有する。予約ビットは常に0で書く
        pack_bits(data, DATA_OFFSET_BIT, 4, self.data_offset() as u32);
        pack_bits(data, RESERVED_BIT, 4, 0);
        data[13] = self.flags.to_byte();

        // ウィンドウサイズ、チェックサム、緊急ポインタ
        write_be16(data, 14, self.window);
        write_be16(data, 16, self.checksum);
        write_be16(data, 18, self.urgent_pointer);

        data[TCP_HEADER_MIN_LEN..].copy_from_slice(self.options.as_bytes());
    }
}

impl fmt::Display for TCPHeader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tcp sport {} dport {} seq {} ack {} doff {} win {} flags {}",
            self.source_port,
            self.dest_port,
            self.sequence_number,
            self.ack_number,
            self.data_offset(),
            self.window,
            self.flags
        )?;
        if !self.options.is_empty() {
            write!(f, " opts {}", hex::encode(self.options.as_bytes()))?;
        }
        Ok(())
    }
}
