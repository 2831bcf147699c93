use crate::core::DumpError;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpConfig {
    pub log: LogConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    // IPv6ヘッダーの開始位置 (イーサネットフレームなら14)
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Pretty,
    Json,
}

impl FromStr for OutputFormat {
    type Err = DumpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(OutputFormat::Pretty),
            "json" => Ok(OutputFormat::Json),
            other => Err(DumpError::Config(format!("無効な出力形式: {}", other))),
        }
    }
}

impl LogConfig {
    pub fn level_filter(&self) -> LevelFilter {
        LevelFilter::from_str(&self.level).unwrap_or(LevelFilter::Info)
    }
}

impl DumpConfig {
    pub fn from_env() -> Result<Self, DumpError> {
        dotenv::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, DumpError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let level = lookup("DUMP_LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        LevelFilter::from_str(&level)
            .map_err(|e| DumpError::Config(format!("無効なログレベル: {} ({})", level, e)))?;

        Ok(DumpConfig {
            log: LogConfig {
                level,
                file: lookup("DUMP_LOG_FILE").filter(|path| !path.is_empty()),
            },
            output: OutputConfig {
                format: lookup("DUMP_FORMAT")
                    .unwrap_or_else(|| "pretty".to_string())
                    .parse()?,
                offset: lookup("DUMP_OFFSET")
                    .unwrap_or_else(|| "0".to_string())
                    .parse()
                    .map_err(|e| DumpError::Config(format!("無効なオフセット: {}", e)))?,
            },
        })
    }

    #[cfg(test)]
    pub fn for_testing() -> Self {
        Self {
            log: LogConfig {
                level: "debug".to_string(),
                file: None,
            },
            output: OutputConfig {
                format: OutputFormat::Pretty,
                offset: 0,
            },
        }
    }
}
