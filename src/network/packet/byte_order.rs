// ネットワークバイトオーダー(ビッグエンディアン)の読み書きと、
// バイト境界をまたぐビットフィールドのパック/アンパック。
//
// ビット番号はRFCの図と同じくMSBファーストで数える。
// 例えばIPv6の先頭4バイトは以下のようになる。
//
//  0                   1                   2                   3
//  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |Version| Traffic Class |           Flow Label                  |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//
// オフセットが範囲外の場合はパニックする。呼び出し側で事前に長さを検査すること。

pub fn read_be16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([bytes[offset], bytes[offset + 1]])
}

pub fn read_be32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

pub fn read_be64(bytes: &[u8], offset: usize) -> u64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(&bytes[offset..offset + 8]);
    u64::from_be_bytes(word)
}

pub fn write_be16(bytes: &mut [u8], offset: usize, value: u16) {
    bytes[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
}

pub fn write_be32(bytes: &mut [u8], offset: usize, value: u32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
}

pub fn write_be64(bytes: &mut [u8], offset: usize, value: u64) {
    bytes[offset..offset + 8].copy_from_slice(&value.to_be_bytes());
}

// ビット範囲を覆うバイト列の位置情報
struct BitWindow {
    first: usize,
    span: usize,
    shift: u32,
    mask: u64,
}

impl BitWindow {
    fn new(bit_offset: usize, bit_width: u32) -> Self {
        debug_assert!((1..=32).contains(&bit_width), "ビット幅は1から32まで: {}", bit_width);

        let first = bit_offset / 8;
        let lead = (bit_offset % 8) as u32;
        let span = ((lead + bit_width + 7) / 8) as usize;
        let shift = span as u32 * 8 - lead - bit_width;

        Self {
            first,
            span,
            shift,
            mask: ((1u64 << bit_width) - 1) << shift,
        }
    }

    fn load(&self, bytes: &[u8]) -> u64 {
        bytes[self.first..self.first + self.span]
            .iter()
            .fold(0u64, |acc, b| (acc << 8) | *b as u64)
    }

    fn store(&self, bytes: &mut [u8], window: u64) {
        let span = self.span;
        for (i, b) in bytes[self.first..self.first + span].iter_mut().enumerate() {
            *b = (window >> ((span - 1 - i) * 8)) as u8;
        }
    }
}

// `bit_offset` から始まる `bit_width` ビットを符号なし整数として取り出す。
pub fn unpack_bits(bytes: &[u8], bit_offset: usize, bit_width: u32) -> u32 {
    let window = BitWindow::new(bit_offset, bit_width);
    ((window.load(bytes) & window.mask) >> window.shift) as u32
}

// `value` を `bit_width` ビットに切り詰めて書き込む。範囲外のビットは変更しない。
pub fn pack_bits(bytes: &mut [u8], bit_offset: usize, bit_width: u32, value: u32) {
    let window = BitWindow::new(bit_offset, bit_width);
    let current = window.load(bytes);
    let updated = (current & !window.mask) | (((value as u64) << window.shift) & window.mask);
    window.store(bytes, updated);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_big_endian() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09];

        assert_eq!(read_be16(&data, 0), 0x0102);
        assert_eq!(read_be16(&data, 1), 0x0203);
        assert_eq!(read_be32(&data, 1), 0x0203_0405);
        assert_eq!(read_be64(&data, 1), 0x0203_0405_0607_0809);
    }

    #[test]
    fn test_write_big_endian() {
        let mut data = [0u8; 11];
        write_be16(&mut data, 1, 0xABCD);
        write_be32(&mut data, 3, 0xDEAD_BEEF);

        assert_eq!(&data[..7], &[0x00, 0xAB, 0xCD, 0xDE, 0xAD, 0xBE, 0xEF]);

        let mut data = [0u8; 9];
        write_be64(&mut data, 1, 0x1122_3344_5566_7788);
        assert_eq!(data, [0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88]);
    }

    #[test]
    #[should_panic]
    fn test_read_out_of_range_panics() {
        let data = [0u8; 3];
        read_be32(&data, 0);
    }

    #[test]
    fn test_unpack_nibbles() {
        let data = [0x6A, 0xBC];

        assert_eq!(unpack_bits(&data, 0, 4), 0x6);
        assert_eq!(unpack_bits(&data, 4, 4), 0xA);
        assert_eq!(unpack_bits(&data, 12, 4), 0xC);
    }

    #[test]
    fn test_unpack_straddles_byte_boundary() {
        let data = [0x6A, 0xBC, 0xDE, 0xF0];

        // 先頭バイトの下位4ビット + 次バイトの上位4ビット
        assert_eq!(unpack_bits(&data, 4, 8), 0xAB);
        // 3バイトにまたがる20ビット
        assert_eq!(unpack_bits(&data, 12, 20), 0xC_DEF0);
        assert_eq!(unpack_bits(&data, 0, 32), 0x6ABC_DEF0);
    }

    #[test]
    fn test_unpack_unaligned_32_bits() {
        let data = [0x0F, 0xFF, 0xFF, 0xFF, 0xF0];
        assert_eq!(unpack_bits(&data, 4, 32), 0xFFFF_FFFF);
    }

    #[test]
    fn test_pack_leaves_neighbouring_bits() {
        let mut data = [0xFF, 0xFF, 0xFF, 0xFF];
        pack_bits(&mut data, 4, 8, 0x00);
        assert_eq!(data, [0xF0, 0x0F, 0xFF, 0xFF]);

        let mut data = [0x00; 4];
        pack_bits(&mut data, 12, 20, 0xF_FFFF);
        assert_eq!(data, [0x00, 0x0F, 0xFF, 0xFF]);
    }

    #[test]
    fn test_pack_truncates_to_width() {
        let mut data = [0x00, 0x00];
        pack_bits(&mut data, 0, 4, 0x1F);
        assert_eq!(data, [0xF0, 0x00]);
    }

    #[test]
    fn test_pack_then_unpack() {
        let mut data = [0u8; 4];
        pack_bits(&mut data, 0, 4, 6);
        pack_bits(&mut data, 4, 8, 0x2E);
        pack_bits(&mut data, 12, 20, 0x1_2345);

        assert_eq!(data, [0x62, 0xE1, 0x23, 0x45]);
        assert_eq!(unpack_bits(&data, 0, 4), 6);
        assert_eq!(unpack_bits(&data, 4, 8), 0x2E);
        assert_eq!(unpack_bits(&data, 12, 20), 0x1_2345);
    }
}
