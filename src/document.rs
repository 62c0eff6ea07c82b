//! Row-to-document rendering.
//!
//! Each [`CaptureRow`] becomes one self-describing text block: every
//! populated field on its own `name: value` line, in table column order,
//! with the decoded payload appended as a labeled line when non-empty.

use crate::capture::CaptureRow;
use crate::payload::decode_hex_payload;

/// One capture row rendered as embeddable text. Immutable after creation;
/// `row_index` is a back-reference to the originating table row.
#[derive(Debug, Clone)]
pub struct Document {
    pub row_index: usize,
    pub text: String,
}

/// Render a row into a [`Document`].
pub fn format_row(row: &CaptureRow) -> Document {
    let mut lines: Vec<String> = row
        .fields()
        .iter()
        .filter_map(|(name, value)| value.map(|v| format!("{}: {}", name, v)))
        .collect();

    if let Some(hex) = row.data_data.as_deref() {
        let decoded = decode_hex_payload(hex);
        if !decoded.is_empty() {
            lines.push(format!("ascii_payload: {}", decoded));
        }
    }

    Document {
        row_index: row.index,
        text: lines.join("\n"),
    }
}

/// Render every row, preserving table order.
pub fn format_rows(rows: &[CaptureRow]) -> Vec<Document> {
    rows.iter().map(format_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_empty_row_yields_empty_body() {
        let row = CaptureRow::default();
        let doc = format_row(&row);
        assert_eq!(doc.text, "");
    }

    #[test]
    fn single_field_yields_single_line() {
        let row = CaptureRow {
            index: 7,
            ip_src: Some("192.168.1.10".to_string()),
            ..Default::default()
        };
        let doc = format_row(&row);
        assert_eq!(doc.text, "ip.src: 192.168.1.10");
        assert_eq!(doc.row_index, 7);
    }

    #[test]
    fn fields_render_in_column_order() {
        let row = CaptureRow {
            frame_number: Some("1".to_string()),
            ip_src: Some("10.0.0.1".to_string()),
            col_protocol: Some("HTTP".to_string()),
            ..Default::default()
        };
        let doc = format_row(&row);
        assert_eq!(
            doc.text,
            "frame.number: 1\nip.src: 10.0.0.1\n_ws.col.Protocol: HTTP"
        );
    }

    #[test]
    fn decoded_payload_is_appended() {
        let row = CaptureRow {
            data_data: Some("48656c6c6f".to_string()),
            ..Default::default()
        };
        let doc = format_row(&row);
        assert_eq!(doc.text, "data.data: 48656c6c6f\nascii_payload: Hello");
    }

    #[test]
    fn undecodable_payload_adds_no_extra_line() {
        let row = CaptureRow {
            data_data: Some("zz".to_string()),
            ..Default::default()
        };
        let doc = format_row(&row);
        assert_eq!(doc.text, "data.data: zz");
    }
}
