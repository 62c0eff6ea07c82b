//! Capture field extraction via the external decoding tool.
//!
//! Invokes `tshark` as a subprocess, requesting a fixed field set as a
//! quoted, comma-delimited table, and parses the output into typed
//! [`CaptureRow`]s. Sentinel coercion happens once here: a cell that is
//! empty, `"nan"`, or `"n/d"` (case-insensitive) becomes `None` and is
//! never re-checked downstream.
//!
//! The raw table is also written to a temporary CSV file whose path is
//! reported on the result; cleanup of that file is not guaranteed.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::ExtractorConfig;

/// Fields requested from the decoding tool, in output column order.
pub const CAPTURE_FIELDS: [&str; 23] = [
    "frame.number",
    "frame.time",
    "frame.len",
    "ip.src",
    "ip.dst",
    "ip.proto",
    "tcp.srcport",
    "tcp.dstport",
    "tcp.flags",
    "udp.srcport",
    "udp.dstport",
    "http.host",
    "http.request.uri",
    "http.user_agent",
    "http.request.full_uri",
    "http.response.code",
    "http.response.phrase",
    "tls.handshake.extensions_server_name",
    "dns.qry.name",
    "dns.resp.name",
    "data.data",
    "_ws.col.Info",
    "_ws.col.Protocol",
];

/// One decoded packet. Every field is optional; `None` means the decoder
/// reported no value for that column.
#[derive(Debug, Clone, Default)]
pub struct CaptureRow {
    /// Zero-based position in the extracted table.
    pub index: usize,
    pub frame_number: Option<String>,
    pub frame_time: Option<String>,
    pub frame_len: Option<String>,
    pub ip_src: Option<String>,
    pub ip_dst: Option<String>,
    pub ip_proto: Option<String>,
    pub tcp_srcport: Option<String>,
    pub tcp_dstport: Option<String>,
    pub tcp_flags: Option<String>,
    pub udp_srcport: Option<String>,
    pub udp_dstport: Option<String>,
    pub http_host: Option<String>,
    pub http_request_uri: Option<String>,
    pub http_user_agent: Option<String>,
    pub http_request_full_uri: Option<String>,
    pub http_response_code: Option<String>,
    pub http_response_phrase: Option<String>,
    pub tls_server_name: Option<String>,
    pub dns_qry_name: Option<String>,
    pub dns_resp_name: Option<String>,
    pub data_data: Option<String>,
    pub col_info: Option<String>,
    pub col_protocol: Option<String>,
}

impl CaptureRow {
    /// Field values paired with their tshark column names, in table
    /// column order.
    pub fn fields(&self) -> [(&'static str, Option<&str>); 23] {
        [
            ("frame.number", self.frame_number.as_deref()),
            ("frame.time", self.frame_time.as_deref()),
            ("frame.len", self.frame_len.as_deref()),
            ("ip.src", self.ip_src.as_deref()),
            ("ip.dst", self.ip_dst.as_deref()),
            ("ip.proto", self.ip_proto.as_deref()),
            ("tcp.srcport", self.tcp_srcport.as_deref()),
            ("tcp.dstport", self.tcp_dstport.as_deref()),
            ("tcp.flags", self.tcp_flags.as_deref()),
            ("udp.srcport", self.udp_srcport.as_deref()),
            ("udp.dstport", self.udp_dstport.as_deref()),
            ("http.host", self.http_host.as_deref()),
            ("http.request.uri", self.http_request_uri.as_deref()),
            ("http.user_agent", self.http_user_agent.as_deref()),
            ("http.request.full_uri", self.http_request_full_uri.as_deref()),
            ("http.response.code", self.http_response_code.as_deref()),
            ("http.response.phrase", self.http_response_phrase.as_deref()),
            (
                "tls.handshake.extensions_server_name",
                self.tls_server_name.as_deref(),
            ),
            ("dns.qry.name", self.dns_qry_name.as_deref()),
            ("dns.resp.name", self.dns_resp_name.as_deref()),
            ("data.data", self.data_data.as_deref()),
            ("_ws.col.Info", self.col_info.as_deref()),
            ("_ws.col.Protocol", self.col_protocol.as_deref()),
        ]
    }
}

/// Result of a successful extraction.
#[derive(Debug)]
pub struct ExtractedCapture {
    /// Intermediate CSV written as a side effect. Not cleaned up.
    pub csv_path: PathBuf,
    /// At most `max_rows` rows, in file order.
    pub rows: Vec<CaptureRow>,
}

/// Extraction failure. Non-fatal to the caller: each variant carries a
/// message suitable for direct display.
#[derive(Debug)]
pub enum ExtractError {
    /// The decoding executable is not installed or not on PATH.
    ToolMissing(String),
    /// The tool ran but exited non-zero.
    ToolFailed(String),
    /// Anything else: I/O, CSV parse failure, malformed output.
    Processing(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::ToolMissing(tool) => {
                write!(f, "'{}' is not installed or not on PATH", tool)
            }
            ExtractError::ToolFailed(e) => write!(f, "capture decoding tool failed: {}", e),
            ExtractError::Processing(e) => write!(f, "capture processing failed: {}", e),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Run the decoding tool over `path` and parse its tabular output.
pub fn extract(config: &ExtractorConfig, path: &Path) -> Result<ExtractedCapture, ExtractError> {
    let mut cmd = Command::new(&config.tool);
    cmd.arg("-r").arg(path).args(["-T", "fields"]);
    for field in CAPTURE_FIELDS {
        cmd.args(["-e", field]);
    }
    cmd.args(["-E", "header=y", "-E", "separator=,", "-E", "quote=d"]);

    let output = cmd.output().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ExtractError::ToolMissing(config.tool.clone())
        } else {
            ExtractError::Processing(format!("failed to run '{}': {}", config.tool, e))
        }
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ExtractError::ToolFailed(stderr.trim().to_string()));
    }

    let csv_path = write_intermediate_csv(&output.stdout)?;
    let rows = parse_table(&output.stdout, config.max_rows)?;

    Ok(ExtractedCapture { csv_path, rows })
}

fn write_intermediate_csv(bytes: &[u8]) -> Result<PathBuf, ExtractError> {
    let mut file = tempfile::Builder::new()
        .prefix("pcapchat-")
        .suffix(".csv")
        .tempfile()
        .map_err(|e| ExtractError::Processing(format!("failed to create temp CSV: {}", e)))?;
    file.write_all(bytes)
        .map_err(|e| ExtractError::Processing(format!("failed to write temp CSV: {}", e)))?;
    // Persisted deliberately so the raw table can be inspected after a run.
    let (_, path) = file
        .keep()
        .map_err(|e| ExtractError::Processing(format!("failed to keep temp CSV: {}", e)))?;
    Ok(path)
}

fn parse_table(bytes: &[u8], max_rows: usize) -> Result<Vec<CaptureRow>, ExtractError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| ExtractError::Processing(format!("invalid table header: {}", e)))?
        .clone();

    let columns: HashMap<&str, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, name)| (name, i))
        .collect();

    let mut rows = Vec::new();

    for (index, record) in reader.records().enumerate() {
        if rows.len() >= max_rows {
            break;
        }
        let record =
            record.map_err(|e| ExtractError::Processing(format!("invalid table row: {}", e)))?;

        let cell = |name: &str| -> Option<String> {
            columns
                .get(name)
                .and_then(|&i| record.get(i))
                .and_then(coerce)
        };

        rows.push(CaptureRow {
            index,
            frame_number: cell("frame.number"),
            frame_time: cell("frame.time"),
            frame_len: cell("frame.len"),
            ip_src: cell("ip.src"),
            ip_dst: cell("ip.dst"),
            ip_proto: cell("ip.proto"),
            tcp_srcport: cell("tcp.srcport"),
            tcp_dstport: cell("tcp.dstport"),
            tcp_flags: cell("tcp.flags"),
            udp_srcport: cell("udp.srcport"),
            udp_dstport: cell("udp.dstport"),
            http_host: cell("http.host"),
            http_request_uri: cell("http.request.uri"),
            http_user_agent: cell("http.user_agent"),
            http_request_full_uri: cell("http.request.full_uri"),
            http_response_code: cell("http.response.code"),
            http_response_phrase: cell("http.response.phrase"),
            tls_server_name: cell("tls.handshake.extensions_server_name"),
            dns_qry_name: cell("dns.qry.name"),
            dns_resp_name: cell("dns.resp.name"),
            data_data: cell("data.data"),
            col_info: cell("_ws.col.Info"),
            col_protocol: cell("_ws.col.Protocol"),
        });
    }

    Ok(rows)
}

/// Coerce a raw cell to an optional value. Empty and null-like sentinel
/// strings map to `None`.
fn coerce(value: &str) -> Option<String> {
    let v = value.trim();
    if v.is_empty() || v.eq_ignore_ascii_case("nan") || v.eq_ignore_ascii_case("n/d") {
        None
    } else {
        Some(v.to_string())
    }
}
