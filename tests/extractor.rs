//! Extraction tests against a stand-in decoding tool.
//!
//! A shell script plays the part of tshark so the subprocess plumbing,
//! CSV parsing, and error classification run without the real tool.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use pcapchat::capture::{self, ExtractError};
use pcapchat::config::ExtractorConfig;

fn write_tool(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-tshark");
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

fn config_for(tool: &Path, max_rows: usize) -> ExtractorConfig {
    ExtractorConfig {
        tool: tool.to_string_lossy().into_owned(),
        max_rows,
    }
}

#[test]
fn extracts_rows_from_tool_output() {
    let dir = tempfile::tempdir().unwrap();
    let tool = write_tool(
        dir.path(),
        r#"cat <<'EOF'
frame.number,ip.src,ip.dst,dns.qry.name,_ws.col.Protocol
"1","192.168.0.2","8.8.8.8","example.com","DNS"
"2","192.168.0.2","93.184.216.34","","HTTP"
EOF"#,
    );

    let extracted = capture::extract(&config_for(&tool, 300), Path::new("any.pcap")).unwrap();
    assert_eq!(extracted.rows.len(), 2);
    assert_eq!(extracted.rows[0].dns_qry_name.as_deref(), Some("example.com"));
    assert_eq!(extracted.rows[1].dns_qry_name, None);
    assert_eq!(extracted.rows[1].col_protocol.as_deref(), Some("HTTP"));

    // The raw table is persisted for later inspection.
    assert!(extracted.csv_path.exists());
    let raw = fs::read_to_string(&extracted.csv_path).unwrap();
    assert!(raw.starts_with("frame.number,"));
    fs::remove_file(extracted.csv_path).ok();
}

#[test]
fn caps_rows_at_the_configured_maximum() {
    let dir = tempfile::tempdir().unwrap();
    let tool = write_tool(
        dir.path(),
        r#"echo "frame.number,ip.src"
i=1
while [ $i -le 10 ]; do
  echo "\"$i\",\"10.0.0.$i\""
  i=$((i + 1))
done"#,
    );

    let extracted = capture::extract(&config_for(&tool, 3), Path::new("any.pcap")).unwrap();
    assert_eq!(extracted.rows.len(), 3);
    assert_eq!(extracted.rows[2].frame_number.as_deref(), Some("3"));
    fs::remove_file(extracted.csv_path).ok();
}

#[test]
fn nonzero_exit_is_a_tool_failure_with_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let tool = write_tool(
        dir.path(),
        r#"echo "any.pcap: No such file or directory" >&2
exit 2"#,
    );

    let err = capture::extract(&config_for(&tool, 300), Path::new("any.pcap")).unwrap_err();
    match err {
        ExtractError::ToolFailed(msg) => assert!(msg.contains("No such file")),
        other => panic!("expected ToolFailed, got {:?}", other),
    }
}

#[test]
fn missing_tool_is_classified_separately() {
    let config = ExtractorConfig {
        tool: "/nonexistent/bin/fake-tshark".to_string(),
        max_rows: 300,
    };
    let err = capture::extract(&config, Path::new("any.pcap")).unwrap_err();
    assert!(matches!(err, ExtractError::ToolMissing(_)));
}
