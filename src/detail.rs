//! Byte-level description of a parsed image
//!
//! Every byte range of the image maps to one row of offset, value and
//! description, in image order. Spreadsheet or table output is built on top.

use core::fmt::{self, Display};

use serde::Serialize;

use crate::registry::Hint;

#[derive(Serialize, Clone, Copy, Debug, Eq, PartialEq)]
pub enum Offset {
    Single(usize),
    /// Inclusive range
    Range(usize, usize),
}

impl Offset {
    pub fn start(&self) -> usize {
        match self {
            Self::Single(o) => *o,
            Self::Range(s, _) => *s,
        }
    }
}

impl Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(o) => write!(f, "0x{o:04x}"),
            Self::Range(s, e) => write!(f, "0x{s:04x}-0x{e:04x}"),
        }
    }
}

#[derive(Serialize, Clone, Debug, Eq, PartialEq)]
pub struct DetailRow {
    pub offset: Offset,
    pub value: String,
    pub description: String,
}

impl DetailRow {
    /// A row covering `len` bytes starting at `start`.
    pub fn span(start: usize, len: usize, value: String, description: impl Into<String>) -> Self {
        let offset = if len > 1 {
            Offset::Range(start, start + len - 1)
        } else {
            Offset::Single(start)
        };
        Self {
            offset,
            value,
            description: description.into(),
        }
    }

    /// A row showing the bytes as hex.
    pub fn bytes(start: usize, bytes: &[u8], description: impl Into<String>) -> Self {
        Self::span(start, bytes.len(), hex(bytes), description)
    }
}

impl Display for DetailRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = self.offset.to_string();
        let v = &self.value;
        let d = &self.description;
        write!(f, "{o:13}  {d:32}  {v}")
    }
}

pub fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<String>>()
        .join(" ")
}

/// Value label for a field: the raw bytes with the decoded text, or a
/// placeholder if the field is not to be shown.
pub fn field_value(hint: Hint, bytes: &[u8], text: &str) -> String {
    match hint {
        Hint::Reveal => format!("{} (\"{text}\")", hex(bytes)),
        Hint::Mask => format!("<hidden, {} bytes>", bytes.len()),
    }
}

/// Like `field_value`, for bytes without a text form.
pub fn raw_value(hint: Hint, bytes: &[u8]) -> String {
    match hint {
        Hint::Reveal => hex(bytes),
        Hint::Mask => format!("<hidden, {} bytes>", bytes.len()),
    }
}

#[test]
fn offsets() {
    assert_eq!(Offset::Single(8).to_string(), "0x0008");
    assert_eq!(Offset::Range(8, 12).to_string(), "0x0008-0x000c");
    let r = DetailRow::bytes(0x10, &[0x00, 0x00, 0x00], "Padding");
    assert_eq!(r.offset, Offset::Range(0x10, 0x12));
    assert_eq!(r.value, "00 00 00");
    let r = DetailRow::bytes(0x10, &[0xc1], "End of fields");
    assert_eq!(r.offset, Offset::Single(0x10));
}

#[test]
fn value_labels() {
    let b = [0xc4, b'A', b'c', b'm', b'e'];
    assert_eq!(
        field_value(Hint::Reveal, &b, "Acme"),
        "c4 41 63 6d 65 (\"Acme\")"
    );
    assert_eq!(field_value(Hint::Mask, &b, "Acme"), "<hidden, 5 bytes>");
    assert_eq!(raw_value(Hint::Reveal, &b[..2]), "c4 41");
    assert_eq!(raw_value(Hint::Mask, &b), "<hidden, 5 bytes>");
}
