use crate::error::FlagParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// TCPフラグの定義 (13バイト目)
pub const TCP_FIN: u8 = 0x01;
pub const TCP_SYN: u8 = 0x02;
pub const TCP_RST: u8 = 0x04;
pub const TCP_PSH: u8 = 0x08;
pub const TCP_ACK: u8 = 0x10;
pub const TCP_URG: u8 = 0x20;
pub const TCP_ECE: u8 = 0x40;
pub const TCP_CWR: u8 = 0x80;

// 接続の開始・終了に関わる制御フラグ
pub const TCP_CONTROL_MASK: u8 = TCP_SYN | TCP_ACK | TCP_RST | TCP_FIN;

// 表示順とニーモニック
const MNEMONICS: [(char, u8); 5] = [
    ('S', TCP_SYN),
    ('A', TCP_ACK),
    ('P', TCP_PSH),
    ('F', TCP_FIN),
    ('R', TCP_RST),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TCPFlags {
    pub cwr: bool,
    pub ece: bool,
    pub urg: bool,
    pub ack: bool,
    pub psh: bool,
    pub rst: bool,
    pub syn: bool,
    pub fin: bool,
}

impl TCPFlags {
    pub fn from_byte(byte: u8) -> Self {
        Self {
            cwr: byte & TCP_CWR != 0,
            ece: byte & TCP_ECE != 0,
            urg: byte & TCP_URG != 0,
            ack: byte & TCP_ACK != 0,
            psh: byte & TCP_PSH != 0,
            rst: byte & TCP_RST != 0,
            syn: byte & TCP_SYN != 0,
            fin: byte & TCP_FIN != 0,
        }
    }

    pub fn to_byte(&self) -> u8 {
        ((self.cwr as u8) << 7)
            | ((self.ece as u8) << 6)
            | ((self.urg as u8) << 5)
            | ((self.ack as u8) << 4)
            | ((self.psh as u8) << 3)
            | ((self.rst as u8) << 2)
            | ((self.syn as u8) << 1)
            | (self.fin as u8)
    }

    pub fn control_bits(&self) -> u8 {
        self.to_byte() & TCP_CONTROL_MASK
    }

    pub fn is_empty(&self) -> bool {
        self.to_byte() == 0
    }

    // "SA" のようなニーモニック列から制御フラグを組み立てる。
    //
    // 使えるのは S/A/R/F のみ。Pは既知だが制御フラグではないので拒否する。
    pub fn from_mnemonic(mnemonic: &str) -> Result<Self, FlagParseError> {
        if mnemonic.is_empty() {
            return Err(FlagParseError::Empty);
        }

        let mut mask = 0u8;
        for chr in mnemonic.chars() {
            let bit = MNEMONICS
                .iter()
                .find(|(c, _)| *c == chr)
                .map(|(_, bit)| *bit)
                .ok_or(FlagParseError::UnknownMnemonic(chr))?;

            if bit & TCP_CONTROL_MASK == 0 {
                return Err(FlagParseError::NotControlFlag(chr));
            }
            mask |= bit;
        }

        Ok(Self::from_byte(mask))
    }
}

impl From<u8> for TCPFlags {
    fn from(byte: u8) -> Self {
        Self::from_byte(byte)
    }
}

impl From<TCPFlags> for u8 {
    fn from(flags: TCPFlags) -> Self {
        flags.to_byte()
    }
}

// SYN+ACK -> "SA---"
impl fmt::Display for TCPFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let byte = self.to_byte();
        for (chr, bit) in MNEMONICS {
            let shown = if byte & bit != 0 { chr } else { '-' };
            write!(f, "{}", shown)?;
        }
        Ok(())
    }
}

// 制御フラグの一致フィルタ。"F|FA|R" のように `|` で候補を並べる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagFilter {
    alternatives: Vec<u8>,
}

impl FlagFilter {
    pub fn matches(&self, flags: &TCPFlags) -> bool {
        let control = flags.control_bits();
        self.alternatives.iter().any(|wanted| *wanted == control)
    }
}

impl FromStr for FlagFilter {
    type Err = FlagParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let alternatives = s
            .split('|')
            .map(|alt| TCPFlags::from_mnemonic(alt.trim()).map(|flags| flags.control_bits()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { alternatives })
    }
}
