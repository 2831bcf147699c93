use crate::core::config::{OutputConfig, OutputFormat};
use crate::core::error::DumpResult;
use crate::network::packet::ipv6::IPV6_HEADER_LEN;
use crate::network::packet::{IPv6Header, TCPHeader};
use log::{debug, info, warn};
use serde::Serialize;
use std::io::{BufRead, Write};

#[derive(Debug, Clone, Serialize)]
pub struct TcpDump<'a> {
    pub data_offset: u8,
    #[serde(flatten)]
    pub header: TCPHeader<'a>,
}

// 1パケット分のデコード結果
#[derive(Debug, Clone, Serialize)]
pub struct HeaderDump<'a> {
    pub ipv6: IPv6Header,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tcp: Option<TcpDump<'a>>,
    pub payload_length: usize,
}

impl HeaderDump<'_> {
    pub fn render(&self, format: OutputFormat) -> DumpResult<String> {
        match format {
            OutputFormat::Json => Ok(serde_json::to_string(self)?),
            OutputFormat::Pretty => {
                let mut text = self.ipv6.to_string();
                if let Some(tcp) = &self.tcp {
                    text.push('\n');
                    text.push_str(&tcp.header.to_string());
                }
                Ok(text)
            }
        }
    }
}

// `offset` からIPv6ヘッダーを読み、next_headerがTCPなら続けてTCPヘッダーを読む。
pub fn dump_packet(data: &[u8], offset: usize) -> DumpResult<HeaderDump<'_>> {
    let ipv6 = IPv6Header::decode(data, offset)?;
    let mut next = offset + IPV6_HEADER_LEN;

    let tcp = if ipv6.carries_tcp() {
        let header = TCPHeader::decode(data, next)?;
        next += header.header_len();
        Some(TcpDump {
            data_offset: header.data_offset(),
            header,
        })
    } else {
        None
    };

    Ok(HeaderDump {
        ipv6,
        tcp,
        payload_length: data.len() - next,
    })
}

// 空行と#から始まる行は読み飛ばす。空白と':'は区切りとして無視する
pub fn parse_hex_line(line: &str) -> DumpResult<Option<Vec<u8>>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let digits: String = line
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();
    Ok(Some(hex::decode(digits)?))
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DumpStats {
    pub decoded: usize,
    pub failed: usize,
}

pub struct HeaderDumper {
    config: OutputConfig,
}

impl HeaderDumper {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    pub fn dump_line(&self, line: &str) -> DumpResult<Option<String>> {
        let data = match parse_hex_line(line)? {
            Some(data) => data,
            None => return Ok(None),
        };

        let dump = dump_packet(&data, self.config.offset)?;
        Ok(Some(dump.render(self.config.format)?))
    }

    pub fn run<R: BufRead, W: Write>(&self, input: R, output: &mut W) -> DumpResult<DumpStats> {
        let mut stats = DumpStats::default();

        for (index, line) in input.lines().enumerate() {
            let line = line?;
            match self.dump_line(&line) {
                Ok(Some(text)) => {
                    writeln!(output, "{}", text)?;
                    stats.decoded += 1;
                }
                Ok(None) => debug!("{}行目を読み飛ばしました", index + 1),
                Err(e) => {
                    warn!("{}行目の処理に失敗しました: {}", index + 1, e);
                    stats.failed += 1;
                }
            }
        }

        info!("{}件デコードしました ({}件失敗)", stats.decoded, stats.failed);
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DumpConfig;
    use crate::core::error::DumpError;
    use crate::error::DecodeError;

    const IPV6_TCP: &str = concat!(
        "6000000000180640",
        "20010db8000000000000000000000001",
        "20010db8000000000000000000000002",
        "c35001bb000003e800000000500272101a2b0000",
        "deadbeef",
    );

    const IPV6_UDP: &str = concat!(
        "6000000000081140",
        "fe800000000000000000000000000001",
        "ff020000000000000000000000000001",
        "0035003500080000",
    );

    #[test]
    fn test_dump_ipv6_and_tcp() {
        let data = hex::decode(IPV6_TCP).unwrap();
        let dump = dump_packet(&data, 0).unwrap();

        assert_eq!(dump.ipv6.payload_length, 24);
        let tcp = dump.tcp.as_ref().unwrap();
        assert_eq!(tcp.data_offset, 5);
        assert_eq!(tcp.header.dest_port, 443);
        assert_eq!(dump.payload_length, 4);
    }

    #[test]
    fn test_dump_non_tcp_stops_after_ipv6() {
        let data = hex::decode(IPV6_UDP).unwrap();
        let dump = dump_packet(&data, 0).unwrap();

        assert!(dump.tcp.is_none());
        assert_eq!(dump.payload_length, 8);
    }

    #[test]
    fn test_dump_with_link_layer_offset() {
        let mut data = hex::decode("ffffffffffff02000000000186dd").unwrap();
        data.extend_from_slice(&hex::decode(IPV6_TCP).unwrap());

        let dump = dump_packet(&data, 14).unwrap();
        assert_eq!(dump.tcp.unwrap().header.source_port, 50000);
    }

    #[test]
    fn test_dump_truncated_tcp() {
        let data = hex::decode(IPV6_TCP).unwrap();

        let err = dump_packet(&data[..50], 0).unwrap_err();
        assert!(matches!(
            err,
            DumpError::Decode(DecodeError::TruncatedBuffer { needed: 20, available: 10 })
        ));
    }

    #[test]
    fn test_render_pretty() {
        let data = hex::decode(IPV6_TCP).unwrap();
        let text = dump_packet(&data, 0).unwrap().render(OutputFormat::Pretty).unwrap();

        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("ipv6 ver 6 tc 0x00 flow 0 iplen 24 nexthdr 6 (tcp)"));
        assert!(lines[1].starts_with("tcp sport 50000 dport 443"));
        assert!(lines[1].ends_with("flags S----"));
    }

    #[test]
    fn test_render_json() {
        let data = hex::decode(IPV6_TCP).unwrap();
        let text = dump_packet(&data, 0).unwrap().render(OutputFormat::Json).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(json["ipv6"]["next_header"], 6);
        assert_eq!(json["ipv6"]["source_address"], "2001:db8::1");
        assert_eq!(json["tcp"]["data_offset"], 5);
        assert_eq!(json["tcp"]["sequence_number"], 1000);
        assert_eq!(json["tcp"]["options"], "");
        assert_eq!(json["payload_length"], 4);

        let data = hex::decode(IPV6_UDP).unwrap();
        let text = dump_packet(&data, 0).unwrap().render(OutputFormat::Json).unwrap();
        assert!(!text.contains("\"tcp\""));
    }

    #[test]
    fn test_parse_hex_line() {
        assert_eq!(parse_hex_line("  ").unwrap(), None);
        assert_eq!(parse_hex_line("# comment").unwrap(), None);
        assert_eq!(parse_hex_line("60 00:0a ff").unwrap(), Some(vec![0x60, 0x00, 0x0a, 0xff]));
        assert!(matches!(parse_hex_line("6g"), Err(DumpError::Hex(_))));
    }

    #[test]
    fn test_run_continues_after_errors() {
        let input = format!("# captured\n{}\nzz\n{}\n\n{}\n", IPV6_TCP, &IPV6_TCP[..60], IPV6_UDP);
        let dumper = HeaderDumper::new(DumpConfig::for_testing().output);

        let mut output = Vec::new();
        let stats = dumper.run(input.as_bytes(), &mut output).unwrap();

        assert_eq!(stats, DumpStats { decoded: 2, failed: 2 });
        let text = String::from_utf8(output).unwrap();
        assert_eq!(text.lines().filter(|l| l.starts_with("ipv6")).count(), 2);
        assert_eq!(text.lines().filter(|l| l.starts_with("tcp")).count(), 1);
    }
}
