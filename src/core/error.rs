use crate::error::DecodeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DumpError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ロガーのセットアップに失敗しました: {0}")]
    Logger(String),

    #[error("16進文字列の解析に失敗しました: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("ヘッダーのデコードに失敗しました: {0}")]
    Decode(#[from] DecodeError),

    #[error("JSONの出力に失敗しました: {0}")]
    Json(#[from] serde_json::Error),

    #[error("入出力エラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type DumpResult<T> = Result<T, DumpError>;
