use crate::core::config::LogConfig;
use crate::core::{DumpError, DumpResult};
use env_logger::{Builder, Target};
use log::info;
use std::fs::File;
use std::io::Write;

pub fn setup_logger(config: &LogConfig) -> DumpResult<()> {
    let mut builder = Builder::new();

    builder
        // ログレベルの設定
        .filter_level(config.level_filter())
        // タイムスタンプ付きのフォーマット
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        });

    // 標準出力はダンプ結果に使うので、ログはファイルか標準エラーに出す
    match &config.file {
        Some(path) => {
            let file = File::create(path).map_err(|e| DumpError::Logger(format!("{}: {}", path, e)))?;
            builder.target(Target::Pipe(Box::new(file)));
        }
        None => {
            builder.target(Target::Stderr);
        }
    }

    builder
        .try_init()
        .map_err(|e| DumpError::Logger(e.to_string()))?;

    info!("ロガーを初期化しました: レベル={}", config.level_filter());
    Ok(())
}
