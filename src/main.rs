use log::{error, info};
use rdb_header_codec::core::{DumpConfig, DumpResult, HeaderDumper};
use rdb_header_codec::setup_logger::setup_logger;
use std::io::{self, Cursor};

// 引数があれば各引数を1パケットの16進文字列として扱い、なければ標準入力を1行ずつ読む
fn main() -> DumpResult<()> {
    let config = DumpConfig::from_env()?;
    setup_logger(&config.log)?;

    info!(
        "ヘッダーダンプを開始します: 形式={:?} オフセット={}",
        config.output.format, config.output.offset
    );

    let dumper = HeaderDumper::new(config.output);
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut stdout = io::stdout().lock();

    let stats = if args.is_empty() {
        dumper.run(io::stdin().lock(), &mut stdout)?
    } else {
        dumper.run(Cursor::new(args.join("\n")), &mut stdout)?
    };

    if stats.failed > 0 {
        error!("{}件のパケットをデコードできませんでした", stats.failed);
    }

    Ok(())
}
