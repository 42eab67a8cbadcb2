//! Chassis, board and product info areas
//!
//! Each area starts with a format version byte and its length in multiples of
//! 8 bytes, followed by a fixed header depending on the kind of area:
//!
//! | Area    | Fixed header                                     |
//! | ------- | ------------------------------------------------ |
//! | Chassis | chassis type                                     |
//! | Board   | language code, manufacturing date (3 bytes, LE)  |
//! | Product | language code                                    |
//!
//! Then come the fields as type/length bytes with their values, terminated by
//! `0xc1`, zero padding, and a checksum as the very last byte.
//! Fields have no names in the binary; they are named by their position.
//! After the fixed fields of an area, any number of custom data fields follow.

use std::collections::BTreeMap;

use bitfield_struct::bitfield;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::Display as StrDisplay;
use thiserror::Error;

use crate::Warning;
use crate::checksum;
use crate::date::MfgDate;
use crate::detail::{self, DetailRow};
use crate::header::{BLOCK_SIZE, FORMAT_VERSION};
use crate::registry::{self, Hint};

pub const END_OF_FIELDS: u8 = 0xc1;
pub const EMPTY_FIELD: u8 = 0x00;
pub const MAX_FIELD_LEN: usize = 63;
/// Type code for 8-bit ASCII + Latin 1
pub const TYPE_ASCII: u8 = 0b11;

pub const DEFAULT_CHASSIS_TYPE: u8 = 0x17;
/// English
pub const DEFAULT_LANGUAGE: u8 = 0x19;

/// The length byte holds at most 255 blocks.
pub const MAX_AREA_SIZE: usize = 255 * BLOCK_SIZE;

#[derive(
    StrDisplay, Serialize, Deserialize, Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash,
)]
pub enum AreaKind {
    Chassis,
    Board,
    Product,
}

/// Order of the areas in a built image
pub const AREA_KINDS: [AreaKind; 3] = [AreaKind::Chassis, AreaKind::Board, AreaKind::Product];

const CHASSIS_FIELDS: &[&str] = &["Chassis Part Number", "Chassis Serial Number"];
const BOARD_FIELDS: &[&str] = &[
    "Board Mfg",
    "Board Product",
    "Board Serial",
    "Board Part Number",
    "Board FRU ID",
];
const PRODUCT_FIELDS: &[&str] = &[
    "Product Manufacturer",
    "Product Name",
    "Product Part Number",
    "Product Version",
    "Product Serial",
    "Product Asset Tag",
    "Product FRU ID",
];

impl AreaKind {
    /// Names of the fields every area of this kind starts with
    pub fn fixed_fields(self) -> &'static [&'static str] {
        match self {
            Self::Chassis => CHASSIS_FIELDS,
            Self::Board => BOARD_FIELDS,
            Self::Product => PRODUCT_FIELDS,
        }
    }

    /// Size of the fixed header after version and length
    pub fn header_len(self) -> usize {
        match self {
            Self::Chassis => 1,
            Self::Board => 4,
            Self::Product => 1,
        }
    }

    fn custom_prefix(self) -> String {
        format!("{self} Custom Data ")
    }

    /// Name of the field at a given position, counting from 0.
    pub fn field_name(self, index: usize) -> String {
        let fixed = self.fixed_fields();
        match fixed.get(index) {
            Some(n) => n.to_string(),
            None => format!("{}{}", self.custom_prefix(), index - fixed.len() + 1),
        }
    }

    /// Position of a named field, the reverse of `field_name`.
    pub fn field_index(self, name: &str) -> Option<usize> {
        let fixed = self.fixed_fields();
        if let Some(i) = fixed.iter().position(|n| *n == name) {
            return Some(i);
        }
        let n = name.strip_prefix(&self.custom_prefix())?;
        // Reject "01", "+1" and the like so that names stay canonical.
        if n.starts_with(|c: char| !('1'..='9').contains(&c)) {
            return None;
        }
        match n.parse::<usize>() {
            Ok(n) => Some(fixed.len() + n - 1),
            Err(_) => None,
        }
    }
}

#[bitfield(u8)]
pub struct TypeLength {
    #[bits(6)]
    pub len: u8,
    #[bits(2)]
    pub kind: u8,
}

#[derive(Debug, Error)]
pub enum AreaError {
    #[error("area of {size} bytes is too short, need at least {min}")]
    TooShort { size: usize, min: usize },
    #[error("area length is zero")]
    ZeroLength,
    #[error("area of {len} bytes exceeds the {available} bytes left in the image")]
    PastEnd { len: usize, available: usize },
    #[error("field '{field}' @ {offset:#06x} with {len} bytes runs into the checksum")]
    FieldOverrun {
        field: String,
        offset: usize,
        len: usize,
    },
    #[error("field '{field}' must have a length of at least 2 bytes")]
    SingleByteField { field: String },
    #[error("area of {0} bytes exceeds the maximum of 2040 bytes")]
    TooLarge(usize),
    #[error("'{0}' is not a field of the {1} area")]
    UnknownField(String, AreaKind),
}

#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub enum FieldValue {
    Text(String),
    /// Bytes that are not (or must not be treated as) ASCII
    Bytes(Vec<u8>),
}

impl FieldValue {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(s) => s.as_bytes(),
            Self::Bytes(b) => b,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    fn to_json(&self) -> Value {
        match self {
            Self::Text(s) => Value::from(s.as_str()),
            Self::Bytes(b) => Value::from(b.clone()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub enum AreaHeader {
    Chassis {
        chassis_type: u8,
    },
    Board {
        language: u8,
        mfg_date: Option<MfgDate>,
    },
    Product {
        language: u8,
    },
}

#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct Area {
    pub header: AreaHeader,
    /// Field values by position; absent fields have no entry.
    fields: BTreeMap<usize, FieldValue>,
}

#[derive(Clone, Debug)]
pub struct ParsedArea {
    pub area: Area,
    pub warnings: Vec<Warning>,
    pub details: Vec<DetailRow>,
}

impl Area {
    pub fn new(kind: AreaKind) -> Self {
        let header = match kind {
            AreaKind::Chassis => AreaHeader::Chassis {
                chassis_type: DEFAULT_CHASSIS_TYPE,
            },
            AreaKind::Board => AreaHeader::Board {
                language: DEFAULT_LANGUAGE,
                mfg_date: None,
            },
            AreaKind::Product => AreaHeader::Product {
                language: DEFAULT_LANGUAGE,
            },
        };
        Self {
            header,
            fields: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> AreaKind {
        match self.header {
            AreaHeader::Chassis { .. } => AreaKind::Chassis,
            AreaHeader::Board { .. } => AreaKind::Board,
            AreaHeader::Product { .. } => AreaKind::Product,
        }
    }

    /// Empty fields read as absent.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        let i = self.kind().field_index(name)?;
        self.fields.get(&i).filter(|v| !v.is_empty())
    }

    /// Set a field by its canonical name. An empty value is kept and written
    /// out as an empty field.
    pub fn set(&mut self, name: &str, value: FieldValue) -> Result<(), AreaError> {
        let kind = self.kind();
        let Some(i) = kind.field_index(name) else {
            return Err(AreaError::UnknownField(name.to_string(), kind));
        };
        self.fields.insert(i, value);
        Ok(())
    }

    pub fn mfg_date(&self) -> Option<&MfgDate> {
        match &self.header {
            AreaHeader::Board { mfg_date, .. } => mfg_date.as_ref(),
            _ => None,
        }
    }

    /// Only board areas carry a date; returns false for other areas.
    pub fn set_mfg_date(&mut self, date: MfgDate) -> bool {
        match &mut self.header {
            AreaHeader::Board { mfg_date, .. } => {
                *mfg_date = Some(date);
                true
            }
            _ => false,
        }
    }

    /// Number of field positions written on build: all fixed fields plus
    /// custom data up to the highest one set.
    pub fn slot_count(&self) -> usize {
        let fixed = self.kind().fixed_fields().len();
        match self.fields.last_key_value() {
            Some((i, _)) => fixed.max(i + 1),
            None => fixed,
        }
    }

    /// Fields that are set and not empty, with their canonical names, in
    /// area order.
    pub fn fields(&self) -> impl Iterator<Item = (String, &FieldValue)> {
        let kind = self.kind();
        self.fields
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(move |(i, v)| (kind.field_name(*i), v))
    }

    /// Parse an area from the start of `data`, which may extend beyond the
    /// area. `base` is the offset of the area in the image, for detail rows.
    pub fn parse(data: &[u8], kind: AreaKind, base: usize) -> Result<ParsedArea, AreaError> {
        let fixed_end = 2 + kind.header_len();
        if data.len() < 2 {
            return Err(AreaError::TooShort {
                size: data.len(),
                min: fixed_end + 1,
            });
        }
        let len = data[1] as usize * BLOCK_SIZE;
        if len == 0 {
            return Err(AreaError::ZeroLength);
        }
        if len > data.len() {
            return Err(AreaError::PastEnd {
                len,
                available: data.len(),
            });
        }
        if len < fixed_end + 1 {
            return Err(AreaError::TooShort {
                size: len,
                min: fixed_end + 1,
            });
        }
        let data = &data[..len];
        let checksum_pos = len - 1;

        let mut warnings = Vec::new();
        let mut details = Vec::new();

        let version = data[0];
        details.push(DetailRow::bytes(base, &data[..1], format!("{kind} area format version")));
        if version != FORMAT_VERSION {
            Warning::AreaVersion {
                area: kind,
                version,
            }
            .raise(&mut warnings);
        }
        let blocks = data[1];
        details.push(DetailRow::bytes(
            base + 1,
            &data[1..2],
            format!("{kind} area length ({blocks} * 8 bytes)"),
        ));

        let header = match kind {
            AreaKind::Chassis => {
                details.push(DetailRow::bytes(base + 2, &data[2..3], "Chassis type"));
                AreaHeader::Chassis {
                    chassis_type: data[2],
                }
            }
            AreaKind::Board => {
                details.push(DetailRow::bytes(base + 2, &data[2..3], "Language code"));
                let d = MfgDate::from_bytes([data[3], data[4], data[5]]);
                let (hint, description) = match registry::find_field(kind, "Board Mfg Date") {
                    Some(e) => (e.hint, e.description()),
                    None => (Hint::Reveal, "Board Mfg Date"),
                };
                let value = detail::field_value(hint, &data[3..6], &d.formatted);
                details.push(DetailRow::span(base + 3, 3, value, description));
                AreaHeader::Board {
                    language: data[2],
                    mfg_date: Some(d),
                }
            }
            AreaKind::Product => {
                details.push(DetailRow::bytes(base + 2, &data[2..3], "Language code"));
                AreaHeader::Product { language: data[2] }
            }
        };

        let fixed_count = kind.fixed_fields().len();
        let mut fields = BTreeMap::new();
        let mut offset = fixed_end;
        let mut index = 0;
        let mut end_marker = None;
        while offset < checksum_pos {
            let tl = data[offset];
            if tl == END_OF_FIELDS {
                end_marker = Some(offset);
                break;
            }
            let field_len = TypeLength::from_bits(tl).len() as usize;
            let name = kind.field_name(index);
            let start = offset + 1;
            let end = start + field_len;
            if end > checksum_pos {
                return Err(AreaError::FieldOverrun {
                    field: name,
                    offset: base + offset,
                    len: field_len,
                });
            }
            let raw = &data[start..end];
            let tlv = &data[offset..end];
            let entry = registry::find_field(kind, &name);
            let description = entry.map_or(name.as_str(), |e| e.description());
            let hint = entry.map_or(Hint::Reveal, |e| e.hint);

            match core::str::from_utf8(raw) {
                Ok(s) if s.is_ascii() => {
                    let s = s.trim_end_matches('\0');
                    debug!("{kind} field {index} '{name}': '{s}'");
                    if s.is_empty() {
                        details.push(DetailRow::bytes(
                            base + offset,
                            tlv,
                            format!("{description} (empty)"),
                        ));
                        // Fixed fields are always written; empty custom data
                        // slots are kept so that the slot count survives.
                        if index >= fixed_count {
                            fields.insert(index, FieldValue::Text(String::new()));
                        }
                    } else {
                        let value = detail::field_value(hint, tlv, s);
                        details.push(DetailRow::span(base + offset, tlv.len(), value, description));
                        fields.insert(index, FieldValue::Text(s.to_string()));
                    }
                }
                _ => {
                    Warning::NonAscii {
                        area: kind,
                        field: name.clone(),
                    }
                    .raise(&mut warnings);
                    let value = detail::raw_value(hint, tlv);
                    details.push(DetailRow::span(base + offset, tlv.len(), value, description));
                    fields.insert(index, FieldValue::Bytes(raw.to_vec()));
                }
            }
            index += 1;
            offset = end;
        }

        match end_marker {
            Some(e) => {
                details.push(DetailRow::bytes(base + e, &data[e..e + 1], "End of fields"));
                let padding = &data[e + 1..checksum_pos];
                if !padding.is_empty() {
                    details.push(DetailRow::bytes(base + e + 1, padding, "Padding"));
                }
            }
            None => Warning::MissingEndMarker { area: kind }.raise(&mut warnings),
        }

        let stored = data[checksum_pos];
        let calculated = checksum::checksum(&data[..checksum_pos]);
        details.push(DetailRow::bytes(
            base + checksum_pos,
            &data[checksum_pos..],
            format!("{kind} area checksum"),
        ));
        if calculated != stored {
            Warning::AreaChecksum {
                area: kind,
                calculated,
                stored,
            }
            .raise(&mut warnings);
        }

        Ok(ParsedArea {
            area: Self { header, fields },
            warnings,
            details,
        })
    }

    pub fn build(&self) -> Result<Vec<u8>, AreaError> {
        let kind = self.kind();
        // Length is patched in at the end.
        let mut data = vec![FORMAT_VERSION, 0];
        match &self.header {
            AreaHeader::Chassis { chassis_type } => {
                // 0 is not a valid chassis type, treat as unset.
                let t = match chassis_type {
                    0 => DEFAULT_CHASSIS_TYPE,
                    t => *t,
                };
                data.push(t);
            }
            AreaHeader::Board { language, mfg_date } => {
                data.push(*language);
                let d = mfg_date.clone().unwrap_or_default();
                data.extend_from_slice(&d.to_bytes());
            }
            AreaHeader::Product { language } => data.push(*language),
        }

        for index in 0..self.slot_count() {
            match self.fields.get(&index).filter(|v| !v.is_empty()) {
                Some(v) => {
                    let mut b = v.as_bytes();
                    if b.len() == 1 {
                        let field = kind.field_name(index);
                        return Err(AreaError::SingleByteField { field });
                    }
                    if b.len() > MAX_FIELD_LEN {
                        let field = kind.field_name(index);
                        warn!("Field '{field}' is too long and will be truncated to {MAX_FIELD_LEN} bytes.");
                        b = &b[..MAX_FIELD_LEN];
                    }
                    let tl = TypeLength::new()
                        .with_len(b.len() as u8)
                        .with_kind(TYPE_ASCII);
                    data.push(tl.into_bits());
                    data.extend_from_slice(b);
                }
                None => data.push(EMPTY_FIELD),
            }
        }
        data.push(END_OF_FIELDS);

        // Reserve the last byte of the final block for the checksum.
        let size = (data.len() + 1).next_multiple_of(BLOCK_SIZE);
        let Ok(blocks) = u8::try_from(size / BLOCK_SIZE) else {
            return Err(AreaError::TooLarge(size));
        };
        data.resize(size - 1, 0);
        data[1] = blocks;
        data.push(checksum::checksum(&data));
        Ok(data)
    }

    /// Presentation of the area as JSON object; the manufacturing date shows
    /// as its formatted string and absent fields as empty strings.
    pub fn to_json(&self) -> Map<String, Value> {
        let mut m = Map::new();
        match &self.header {
            AreaHeader::Chassis { chassis_type } => {
                m.insert("Chassis Type".into(), Value::from(*chassis_type));
            }
            AreaHeader::Board { language, mfg_date } => {
                m.insert("Language".into(), Value::from(*language));
                if let Some(d) = mfg_date {
                    m.insert("Board Mfg Date".into(), Value::from(d.formatted.as_str()));
                }
            }
            AreaHeader::Product { language } => {
                m.insert("Language".into(), Value::from(*language));
            }
        }
        let kind = self.kind();
        for index in 0..self.slot_count() {
            let v = match self.fields.get(&index) {
                Some(v) => v.to_json(),
                None => Value::from(""),
            };
            m.insert(kind.field_name(index), v);
        }
        m
    }
}

#[cfg(test)]
fn sum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |a, b| a.wrapping_add(*b))
}

#[cfg(test)]
fn acme_board() -> Area {
    let mut a = Area::new(AreaKind::Board);
    a.set_mfg_date(MfgDate::from_minutes(0));
    a.set("Board Mfg", "Acme".into()).unwrap();
    a.set("Board Product", "Widget".into()).unwrap();
    a.set("Board Part Number", "PN1".into()).unwrap();
    a.set("Board FRU ID", "1.0".into()).unwrap();
    a
}

#[test]
fn field_names() {
    assert_eq!(AreaKind::Board.field_name(0), "Board Mfg");
    assert_eq!(AreaKind::Board.field_name(4), "Board FRU ID");
    assert_eq!(AreaKind::Board.field_name(5), "Board Custom Data 1");
    assert_eq!(AreaKind::Chassis.field_name(11), "Chassis Custom Data 10");
    assert_eq!(AreaKind::Product.field_index("Product Custom Data 2"), Some(8));
    assert_eq!(AreaKind::Product.field_index("Product Serial"), Some(4));
    assert_eq!(AreaKind::Product.field_index("Product Custom Data 0"), None);
    assert_eq!(AreaKind::Product.field_index("Product Custom Data 01"), None);
    assert_eq!(AreaKind::Product.field_index("Board Custom Data 1"), None);
}

#[test]
fn type_length_byte() {
    let tl = TypeLength::from_bits(0xc4);
    assert_eq!(tl.len(), 4);
    assert_eq!(tl.kind(), TYPE_ASCII);
    let tl = TypeLength::new().with_len(63).with_kind(TYPE_ASCII);
    assert_eq!(tl.into_bits(), 0xff);
}

#[test]
fn build_board_scenario() {
    let data = acme_board().build().unwrap();
    let mut expected = vec![0x01, 0x00, 0x19, 0x00, 0x00, 0x00];
    expected.push(0xc4);
    expected.extend_from_slice(b"Acme");
    expected.push(0xc6);
    expected.extend_from_slice(b"Widget");
    expected.push(0x00);
    expected.push(0xc3);
    expected.extend_from_slice(b"PN1");
    expected.push(0xc3);
    expected.extend_from_slice(b"1.0");
    expected.push(END_OF_FIELDS);
    // 28 bytes so far, padded to 31, plus checksum
    assert_eq!(data.len(), 32);
    assert_eq!(data[1], 4);
    assert_eq!(&data[6..28], &expected[6..]);
    assert_eq!(&data[28..31], &[0, 0, 0]);
    assert_eq!(sum(&data), 0);

    let parsed = Area::parse(&data, AreaKind::Board, 0).unwrap();
    assert!(parsed.warnings.is_empty());
    let a = parsed.area;
    assert_eq!(a, acme_board());
    assert_eq!(a.fields().count(), 4);
    assert!(a.get("Board Serial").is_none());
    assert_eq!(a.get("Board Mfg"), Some(&FieldValue::from("Acme")));
    assert_eq!(a.mfg_date().unwrap().formatted, "1996-01-01 00:00:00");
}

#[test]
fn custom_data_gaps_are_kept() {
    let mut a = Area::new(AreaKind::Board);
    a.set("Board Custom Data 3", "XYZ".into()).unwrap();
    assert_eq!(a.slot_count(), 8);
    let data = a.build().unwrap();
    // 5 fixed + 2 empty custom fields, then the value
    assert_eq!(&data[6..13], &[EMPTY_FIELD; 7]);
    assert_eq!(&data[13..17], &[0xc3, b'X', b'Y', b'Z']);
    assert_eq!(data[17], END_OF_FIELDS);

    let parsed = Area::parse(&data, AreaKind::Board, 0).unwrap().area;
    let fields: Vec<(String, &FieldValue)> = parsed.fields().collect();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].0, "Board Custom Data 3");
    assert_eq!(fields[0].1, &FieldValue::from("XYZ"));
    assert!(parsed.get("Board Custom Data 1").is_none());
    assert!(parsed.get("Board Custom Data 2").is_none());
}

#[test]
fn built_areas_are_aligned_and_closed() {
    for kind in AREA_KINDS {
        let mut a = Area::new(kind);
        for n in 0..12 {
            let name = kind.field_name(n);
            let v = "x".repeat(n + 2);
            a.set(&name, FieldValue::Text(v)).unwrap();
            let data = a.build().unwrap();
            assert_eq!(data.len() % BLOCK_SIZE, 0);
            assert_eq!(data[1] as usize * BLOCK_SIZE, data.len());
            assert_eq!(sum(&data), 0);
        }
    }
}

#[test]
fn single_byte_field_is_rejected() {
    let mut a = acme_board();
    a.set("Board Serial", "X".into()).unwrap();
    assert!(matches!(
        a.build(),
        Err(AreaError::SingleByteField { field }) if field == "Board Serial"
    ));
}

#[test]
fn long_field_is_truncated() {
    let mut a = Area::new(AreaKind::Product);
    a.set("Product Name", FieldValue::Text("n".repeat(70))).unwrap();
    let data = a.build().unwrap();
    assert_eq!(data[3], EMPTY_FIELD);
    assert_eq!(data[4], 0xff);
    let parsed = Area::parse(&data, AreaKind::Product, 0).unwrap().area;
    assert_eq!(
        parsed.get("Product Name"),
        Some(&FieldValue::Text("n".repeat(MAX_FIELD_LEN)))
    );
}

#[test]
fn chassis_type_zero_is_default() {
    let a = Area {
        header: AreaHeader::Chassis { chassis_type: 0 },
        fields: BTreeMap::new(),
    };
    let data = a.build().unwrap();
    assert_eq!(data[2], DEFAULT_CHASSIS_TYPE);
    // two empty fixed fields
    assert_eq!(&data[3..6], &[EMPTY_FIELD, EMPTY_FIELD, END_OF_FIELDS]);
    assert_eq!(data.len(), 8);
}

#[test]
fn wrong_checksum_is_a_warning() {
    let mut data = acme_board().build().unwrap();
    let last = data.len() - 1;
    data[last] = data[last].wrapping_add(1);
    let parsed = Area::parse(&data, AreaKind::Board, 0x18).unwrap();
    assert_eq!(parsed.area, acme_board());
    assert_eq!(parsed.warnings.len(), 1);
    assert!(matches!(
        parsed.warnings[0],
        Warning::AreaChecksum {
            area: AreaKind::Board,
            ..
        }
    ));
}

#[test]
fn non_ascii_is_kept_as_bytes() {
    let mut a = Area::new(AreaKind::Chassis);
    a.set("Chassis Part Number", FieldValue::Bytes(vec![0xde, 0xad, 0xbe]))
        .unwrap();
    let data = a.build().unwrap();
    let parsed = Area::parse(&data, AreaKind::Chassis, 0).unwrap();
    assert_eq!(
        parsed.warnings,
        vec![Warning::NonAscii {
            area: AreaKind::Chassis,
            field: "Chassis Part Number".to_string(),
        }]
    );
    assert_eq!(parsed.area, a);
    assert_eq!(parsed.area.build().unwrap(), data);
}

#[test]
fn nul_padded_value_is_stripped() {
    let mut a = Area::new(AreaKind::Product);
    a.set("Product Version", FieldValue::Bytes(b"A1\0\0".to_vec()))
        .unwrap();
    a.set("Product Serial", FieldValue::Bytes(vec![0, 0, 0]))
        .unwrap();
    let data = a.build().unwrap();
    let parsed = Area::parse(&data, AreaKind::Product, 0).unwrap();
    assert!(parsed.warnings.is_empty());
    assert_eq!(parsed.area.get("Product Version"), Some(&FieldValue::from("A1")));
    assert!(parsed.area.get("Product Serial").is_none());
}

#[test]
fn field_overrun() {
    // length byte says 1 block, field claims 10 bytes
    let data = [0x01, 0x01, 0x19, 0xca, b'a', b'b', b'c', 0x00];
    assert!(matches!(
        Area::parse(&data, AreaKind::Product, 0),
        Err(AreaError::FieldOverrun { len: 10, .. })
    ));
}

#[test]
fn bad_lengths() {
    assert!(matches!(
        Area::parse(&[0x01, 0x00, 0x17], AreaKind::Chassis, 0),
        Err(AreaError::ZeroLength)
    ));
    assert!(matches!(
        Area::parse(&[0x01, 0x02, 0x17, 0xc1, 0, 0, 0, 0], AreaKind::Chassis, 0),
        Err(AreaError::PastEnd {
            len: 16,
            available: 8
        })
    ));
    assert!(matches!(
        Area::parse(&[0x01], AreaKind::Chassis, 0),
        Err(AreaError::TooShort { .. })
    ));
}

#[test]
fn missing_end_marker() {
    let mut data = vec![0x01, 0x01, 0x17, 0xc2, b'a', b'b', 0x00];
    data.push(checksum::checksum(&data));
    let parsed = Area::parse(&data, AreaKind::Chassis, 0).unwrap();
    assert_eq!(
        parsed.warnings,
        vec![Warning::MissingEndMarker {
            area: AreaKind::Chassis
        }]
    );
    assert_eq!(
        parsed.area.get("Chassis Part Number"),
        Some(&FieldValue::from("ab"))
    );
}

#[test]
fn area_too_large() {
    let mut a = Area::new(AreaKind::Product);
    for n in 0..40 {
        let name = AreaKind::Product.field_name(n);
        a.set(&name, FieldValue::Text("y".repeat(MAX_FIELD_LEN)))
            .unwrap();
    }
    assert!(matches!(a.build(), Err(AreaError::TooLarge(_))));
}

#[test]
fn detail_rows() {
    let data = acme_board().build().unwrap();
    let parsed = Area::parse(&data, AreaKind::Board, 0x08).unwrap();
    let d = &parsed.details;
    assert_eq!(d[0].offset, detail::Offset::Single(0x08));
    assert_eq!(d[0].value, "01");
    assert_eq!(d[3].offset, detail::Offset::Range(0x0b, 0x0d));
    assert_eq!(d[3].value, "00 00 00 (\"1996-01-01 00:00:00\")");
    assert_eq!(d[4].value, "c4 41 63 6d 65 (\"Acme\")");
    assert_eq!(d[4].description, "Board Mfg");
    assert_eq!(d[6].value, "00");
    assert_eq!(d[6].description, "Board Serial (empty)");
    let n = d.len();
    assert_eq!(d[n - 3].description, "End of fields");
    assert_eq!(d[n - 2].description, "Padding");
    assert_eq!(d[n - 2].offset, detail::Offset::Range(0x08 + 28, 0x08 + 30));
    assert_eq!(d[n - 1].offset, detail::Offset::Single(0x08 + 31));
}

#[test]
fn masked_detail_row() {
    let mut a = acme_board();
    a.set("Board Serial", "SN0001".into()).unwrap();
    let data = a.build().unwrap();
    let parsed = Area::parse(&data, AreaKind::Board, 0).unwrap();
    let row = parsed
        .details
        .iter()
        .find(|r| r.description == "Board Serial")
        .unwrap();
    assert_eq!(row.value, "<hidden, 7 bytes>");
}

#[test]
fn masked_non_ascii_detail_row() {
    let mut a = acme_board();
    a.set("Board Serial", FieldValue::Bytes(vec![0xff, 0xfe, 0xfd]))
        .unwrap();
    let data = a.build().unwrap();
    let parsed = Area::parse(&data, AreaKind::Board, 0).unwrap();
    assert_eq!(parsed.warnings.len(), 1);
    let row = parsed
        .details
        .iter()
        .find(|r| r.description == "Board Serial")
        .unwrap();
    assert_eq!(row.value, "<hidden, 4 bytes>");
    assert_eq!(row.offset, detail::Offset::Range(18, 21));
}

#[test]
fn trailing_empty_custom_slots_are_kept() {
    let mut a = Area::new(AreaKind::Chassis);
    a.set("Chassis Part Number", "PN-01".into()).unwrap();
    a.set("Chassis Custom Data 1", "".into()).unwrap();
    a.set("Chassis Custom Data 2", "".into()).unwrap();
    let data = a.build().unwrap();
    // part number, empty serial, two empty custom slots
    assert_eq!(&data[9..13], &[EMPTY_FIELD, EMPTY_FIELD, EMPTY_FIELD, END_OF_FIELDS]);

    let parsed = Area::parse(&data, AreaKind::Chassis, 0).unwrap().area;
    assert_eq!(parsed.slot_count(), 4);
    assert_eq!(parsed.fields().count(), 1);
    assert!(parsed.get("Chassis Custom Data 2").is_none());
    assert_eq!(parsed.build().unwrap(), data);
}

#[test]
fn json_presentation() {
    let mut a = acme_board();
    a.set_mfg_date(MfgDate::parse("2024-05-06 07:08:00").unwrap());
    let j = a.to_json();
    let keys: Vec<&String> = j.keys().collect();
    assert_eq!(
        keys,
        [
            "Language",
            "Board Mfg Date",
            "Board Mfg",
            "Board Product",
            "Board Serial",
            "Board Part Number",
            "Board FRU ID"
        ]
    );
    assert_eq!(j["Board Mfg Date"], "2024-05-06 07:08:00");
    assert_eq!(j["Board Serial"], "");
    assert_eq!(j["Language"], 0x19);
}
