use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("バッファが不足しています: {needed}バイト必要ですが{available}バイトしかありません")]
    TruncatedBuffer { needed: usize, available: usize },

    #[error("無効なデータオフセットです: {0} (最小値は5)")]
    InvalidDataOffset(u8),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("書き込み先のバッファが小さすぎます: {needed}バイト必要ですが{available}バイトしかありません")]
    BufferTooSmall { needed: usize, available: usize },

    #[error("無効なオプション長です: {0}バイト (4の倍数かつ40バイト以下)")]
    InvalidOptionsLength(usize),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlagParseError {
    #[error("TCPフラグのフィルタが空です")]
    Empty,

    #[error("不明なTCPフラグのニーモニックです: '{0}'")]
    UnknownMnemonic(char),

    #[error("制御フラグ以外はフィルタに使用できません: '{0}'")]
    NotControlFlag(char),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("無効なIPv6アドレスです: '{0}'")]
pub struct AddressParseError(pub String);

pub type DecodeResult<T> = Result<T, DecodeError>;
pub type EncodeResult<T> = Result<T, EncodeError>;
