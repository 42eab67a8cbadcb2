#![doc = include_str!("../README.md")]

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use core::fmt::{self, Display};

use log::{error, info, warn};
use serde_json::{Map, Value};
use thiserror::Error;

pub mod area;
pub mod checksum;
pub mod date;
pub mod detail;
pub mod header;
pub mod registry;

use area::{AREA_KINDS, Area, AreaError, AreaKind, FieldValue};
use date::{DateError, MfgDate};
use detail::DetailRow;
use header::{BLOCK_SIZE, CommonHeader, FORMAT_VERSION, HEADER_SIZE};

#[derive(Debug, Error)]
pub enum FruError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("image too small ({size} bytes, need at least {min})")]
    TooSmall { size: usize, min: usize },
    #[error("unsupported FRU format version {0}, only version 1 is supported")]
    UnsupportedVersion(u8),
    #[error("{kind} area @ {offset:#06x} is outside of the {size} bytes image")]
    OffsetOutOfBounds {
        kind: AreaKind,
        offset: usize,
        size: usize,
    },
    #[error("cannot parse {kind} area @ {offset:#06x}: {source}")]
    Parse {
        kind: AreaKind,
        offset: usize,
        source: AreaError,
    },
    #[error("{kind} area: {source}")]
    Build { kind: AreaKind, source: AreaError },
    #[error("{kind} area would start @ {offset:#06x}, beyond the last addressable offset")]
    TooLarge { kind: AreaKind, offset: usize },
    #[error("unknown field code: {0}")]
    UnknownField(String),
    #[error("field {0} cannot take a raw value")]
    RawNotSupported(String),
    #[error(transparent)]
    Date(#[from] DateError),
}

/// Anomalies found while parsing; none of them stop the parser.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Warning {
    HeaderChecksum {
        calculated: u8,
        stored: u8,
    },
    AreaChecksum {
        area: AreaKind,
        calculated: u8,
        stored: u8,
    },
    AreaVersion {
        area: AreaKind,
        version: u8,
    },
    NonAscii {
        area: AreaKind,
        field: String,
    },
    MissingEndMarker {
        area: AreaKind,
    },
    /// Internal use and MultiRecord areas are not parsed and not written back.
    Unsupported {
        area: &'static str,
        offset: u8,
    },
}

impl Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeaderChecksum { calculated, stored } => write!(
                f,
                "Common header checksum mismatch: calculated {calculated:02x}, stored {stored:02x}"
            ),
            Self::AreaChecksum {
                area,
                calculated,
                stored,
            } => write!(
                f,
                "{area} area checksum mismatch: calculated {calculated:02x}, stored {stored:02x}"
            ),
            Self::AreaVersion { area, version } => {
                write!(f, "{area} area has format version {version}, expected 1")
            }
            Self::NonAscii { area, field } => {
                write!(f, "{area} area field '{field}' is not ASCII, keeping raw bytes")
            }
            Self::MissingEndMarker { area } => {
                write!(f, "{area} area has no end-of-fields marker")
            }
            Self::Unsupported { area, offset } => write!(
                f,
                "{area} area @ {:#06x} is not supported and will be dropped on rebuild",
                *offset as usize * BLOCK_SIZE
            ),
        }
    }
}

impl Warning {
    pub(crate) fn raise(self, warnings: &mut Vec<Warning>) {
        warn!("{self}");
        warnings.push(self);
    }
}

/// A FRU image along with its decoded info areas
///
/// The raw image only changes on a successful `rebuild`; field modifications
/// go to the decoded areas.
#[derive(Clone, Debug)]
pub struct Fru {
    pub header: CommonHeader,
    areas: BTreeMap<AreaKind, Area>,
    raw: Vec<u8>,
    warnings: Vec<Warning>,
}

impl Default for Fru {
    fn default() -> Self {
        Self::new()
    }
}

impl Fru {
    /// An empty record without any areas, as a starting point for new images.
    pub fn new() -> Self {
        Self {
            header: CommonHeader::default(),
            areas: BTreeMap::new(),
            raw: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn parse(data: &[u8]) -> Result<Self, FruError> {
        let (fru, _) = Self::parse_detailed(data)?;
        Ok(fru)
    }

    /// Parse an image and describe every byte range of it, in image order.
    pub fn parse_detailed(data: &[u8]) -> Result<(Self, Vec<DetailRow>), FruError> {
        let Some(header) = CommonHeader::parse(data) else {
            return Err(FruError::TooSmall {
                size: data.len(),
                min: HEADER_SIZE,
            });
        };
        if header.format_version != FORMAT_VERSION {
            return Err(FruError::UnsupportedVersion(header.format_version));
        }

        let mut warnings = Vec::new();
        let mut details = header.details();
        if !header.checksum_ok() {
            Warning::HeaderChecksum {
                calculated: header.calculate_checksum(),
                stored: header.checksum,
            }
            .raise(&mut warnings);
        }
        for (area, offset) in [
            ("Internal use", header.internal_offset),
            ("MultiRecord", header.multirecord_offset),
        ] {
            if offset != 0 {
                Warning::Unsupported { area, offset }.raise(&mut warnings);
            }
        }

        let mut areas = BTreeMap::new();
        for kind in AREA_KINDS {
            let o = header.area_offset(kind) as usize * BLOCK_SIZE;
            if o == 0 {
                continue;
            }
            if o >= data.len() {
                return Err(FruError::OffsetOutOfBounds {
                    kind,
                    offset: o,
                    size: data.len(),
                });
            }
            info!("{kind} area @ {o:04x}");
            let parsed = match Area::parse(&data[o..], kind, o) {
                Ok(p) => p,
                Err(source) => {
                    return Err(FruError::Parse {
                        kind,
                        offset: o,
                        source,
                    });
                }
            };
            warnings.extend(parsed.warnings);
            details.extend(parsed.details);
            areas.insert(kind, parsed.area);
        }
        details.sort_by_key(|r| r.offset.start());

        let fru = Self {
            header,
            areas,
            raw: data.to_vec(),
            warnings,
        };
        Ok((fru, details))
    }

    /// Read and parse an image file.
    pub fn read(path: &Path) -> Result<Self, FruError> {
        let data = fs::read(path)?;
        Self::parse(&data)
    }

    /// Write out the current raw image.
    pub fn write(&self, path: &Path) -> Result<(), FruError> {
        fs::write(path, &self.raw)?;
        Ok(())
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn area(&self, kind: AreaKind) -> Option<&Area> {
        self.areas.get(&kind)
    }

    fn area_for(&mut self, kind: AreaKind) -> &mut Area {
        self.areas.entry(kind).or_insert_with(|| Area::new(kind))
    }

    /// Set a field by its code, e.g. `BSN`. The board manufacturing date
    /// (`BMD`) takes a `YYYY-MM-DD HH:MM:SS` timestamp.
    pub fn modify_field(&mut self, code: &str, value: &str) -> Result<(), FruError> {
        let Some(entry) = registry::lookup(code) else {
            return Err(FruError::UnknownField(code.to_string()));
        };
        if entry.is_mfg_date() {
            let d = MfgDate::parse(value)?;
            self.area_for(entry.area).set_mfg_date(d);
            return Ok(());
        }
        self.set(entry, FieldValue::Text(value.to_string()))
    }

    /// Set a field by its code to raw bytes, which are written as they are.
    pub fn modify_field_raw(&mut self, code: &str, value: Vec<u8>) -> Result<(), FruError> {
        let Some(entry) = registry::lookup(code) else {
            return Err(FruError::UnknownField(code.to_string()));
        };
        if entry.is_mfg_date() {
            return Err(FruError::RawNotSupported(code.to_string()));
        }
        self.set(entry, FieldValue::Bytes(value))
    }

    fn set(&mut self, entry: &registry::FieldEntry, value: FieldValue) -> Result<(), FruError> {
        let kind = entry.area;
        match self.area_for(kind).set(entry.name, value) {
            Ok(()) => Ok(()),
            Err(source) => Err(FruError::Build { kind, source }),
        }
    }

    /// Build a new raw image from the decoded areas, with fresh offsets and
    /// checksums. On error, the previous raw image is kept.
    pub fn rebuild(&mut self) -> Result<(), FruError> {
        let mut data = vec![0; HEADER_SIZE];
        let mut offsets = [0u8; AREA_KINDS.len()];
        for (i, kind) in AREA_KINDS.into_iter().enumerate() {
            let Some(area) = self.areas.get(&kind) else {
                continue;
            };
            let built = match area.build() {
                Ok(b) => b,
                Err(source) => {
                    error!("Error building {kind} area: {source}");
                    return Err(FruError::Build { kind, source });
                }
            };
            let offset = data.len();
            let Ok(o) = u8::try_from(offset / BLOCK_SIZE) else {
                error!("No room for {kind} area @ {offset:04x}");
                return Err(FruError::TooLarge { kind, offset });
            };
            offsets[i] = o;
            data.extend_from_slice(&built);
        }
        let [chassis, board, product] = offsets;
        let header = CommonHeader::build(chassis, board, product);
        data[..HEADER_SIZE].copy_from_slice(&header.to_vec());
        self.header = header;
        self.raw = data;
        Ok(())
    }

    /// Presentation of all areas; absent areas show as empty objects.
    pub fn to_json(&self) -> Value {
        let mut m = Map::new();
        for kind in AREA_KINDS {
            let a = match self.area(kind) {
                Some(a) => a.to_json(),
                None => Map::new(),
            };
            m.insert(format!("{kind} Info"), Value::Object(a));
        }
        Value::Object(m)
    }
}

#[cfg(test)]
static DATA: &[u8] = include_bytes!("../tests/fru.bin");

#[cfg(test)]
fn sum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |a, b| a.wrapping_add(*b))
}

#[test]
fn parse_fixture() {
    let fru = Fru::parse(DATA).unwrap();
    assert!(fru.warnings().is_empty());
    assert_eq!(fru.header.chassis_offset, 1);
    assert_eq!(fru.header.board_offset, 5);
    assert_eq!(fru.header.product_offset, 11);

    let c = fru.area(AreaKind::Chassis).unwrap();
    assert_eq!(c.get("Chassis Serial Number"), Some(&"CSN0000001".into()));
    assert_eq!(c.get("Chassis Custom Data 1"), Some(&"ABCD".into()));

    let b = fru.area(AreaKind::Board).unwrap();
    assert_eq!(b.mfg_date().unwrap().formatted, "2024-05-06 07:08:00");
    assert_eq!(b.get("Board Serial"), Some(&"BSN123456".into()));
    assert!(b.get("Board Custom Data 1").is_none());
    assert_eq!(b.get("Board Custom Data 2"), Some(&"C2".into()));

    let p = fru.area(AreaKind::Product).unwrap();
    assert_eq!(p.get("Product Name"), Some(&"Widget Pro".into()));
    assert!(p.get("Product Serial").is_none());
    assert_eq!(p.get("Product FRU ID"), Some(&"1.0".into()));
}

#[test]
/// We should be able to write back the original data 1:1.
fn rebuild_fixture() {
    let mut fru = Fru::parse(DATA).unwrap();
    fru.rebuild().unwrap();
    assert_eq!(fru.raw(), DATA);
}

#[test]
fn modify_and_rebuild() {
    let mut fru = Fru::parse(DATA).unwrap();
    fru.modify_field("BSN", "BSN999").unwrap();
    fru.modify_field("PCD3", "extra").unwrap();
    fru.modify_field("BMD", "2025-02-03 04:05:06").unwrap();
    assert_eq!(fru.raw(), DATA);
    fru.rebuild().unwrap();

    let raw = fru.raw().to_vec();
    assert_eq!(sum(&raw[..HEADER_SIZE]), 0);
    let again = Fru::parse(&raw).unwrap();
    assert!(again.warnings().is_empty());
    let b = again.area(AreaKind::Board).unwrap();
    assert_eq!(b.get("Board Serial"), Some(&"BSN999".into()));
    assert_eq!(b.mfg_date().unwrap().formatted, "2025-02-03 04:05:00");
    let p = again.area(AreaKind::Product).unwrap();
    assert_eq!(p.get("Product Custom Data 3"), Some(&"extra".into()));
    assert!(p.get("Product Custom Data 1").is_none());

    for kind in AREA_KINDS {
        let o = again.header.area_offset(kind) as usize * BLOCK_SIZE;
        let len = raw[o + 1] as usize * BLOCK_SIZE;
        assert_eq!(sum(&raw[o..o + len]), 0);
    }
}

#[test]
fn failed_rebuild_keeps_image() {
    let mut fru = Fru::parse(DATA).unwrap();
    fru.modify_field("PV", "X").unwrap();
    let res = fru.rebuild();
    assert!(matches!(
        res,
        Err(FruError::Build {
            kind: AreaKind::Product,
            source: AreaError::SingleByteField { .. }
        })
    ));
    assert_eq!(fru.raw(), DATA);
    assert_eq!(fru.header.product_offset, 11);
}

#[test]
fn new_image() {
    let mut fru = Fru::new();
    fru.modify_field("BM", "Acme").unwrap();
    fru.modify_field("BP", "Widget").unwrap();
    fru.modify_field("BPN", "PN1").unwrap();
    fru.modify_field("BFI", "1.0").unwrap();
    fru.rebuild().unwrap();
    let raw = fru.raw();
    // header + one board area of 4 blocks
    assert_eq!(raw.len(), 8 + 32);
    assert_eq!(&raw[..8], &[0x01, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0xfe]);
    assert_eq!(sum(&raw[8..]), 0);
    assert!(fru.area(AreaKind::Chassis).is_none());
}

#[test]
fn empty_value_creates_area() {
    let mut fru = Fru::new();
    fru.modify_field("CPN", "").unwrap();
    fru.rebuild().unwrap();
    let raw = fru.raw();
    assert_eq!(fru.header.chassis_offset, 1);
    assert_eq!(
        &raw[8..16],
        &[0x01, 0x01, 0x17, 0x00, 0x00, 0xc1, 0x00, 0x26]
    );
}

#[test]
fn empty_custom_slot_survives_rebuild() {
    let mut fru = Fru::new();
    fru.modify_field("CPN", "PN-01").unwrap();
    fru.modify_field("CCD1", "").unwrap();
    fru.rebuild().unwrap();
    let first = fru.raw().to_vec();
    assert_eq!(&first[17..21], &[0x00, 0x00, 0xc1, 0x00]);

    let mut again = Fru::parse(&first).unwrap();
    again.rebuild().unwrap();
    assert_eq!(again.raw(), first);
}

#[test]
fn unknown_code() {
    let mut fru = Fru::new();
    assert!(matches!(
        fru.modify_field("XYZ", "abc"),
        Err(FruError::UnknownField(_))
    ));
    assert!(matches!(
        fru.modify_field_raw("BMD", vec![0, 0, 0]),
        Err(FruError::RawNotSupported(_))
    ));
    assert!(matches!(
        fru.modify_field("BMD", "yesterday"),
        Err(FruError::Date(_))
    ));
    assert!(fru.area(AreaKind::Board).is_none());
}

#[test]
fn raw_placeholder_value() {
    let mut fru = Fru::parse(DATA).unwrap();
    fru.modify_field_raw("BSN", vec![0; 9]).unwrap();
    fru.rebuild().unwrap();
    // same length as the original serial number, all zero
    let o = 5 * BLOCK_SIZE + 6 + 5 + 7;
    assert_eq!(fru.raw()[o], 0xc9);
    assert_eq!(&fru.raw()[o + 1..o + 10], &[0; 9]);
    let again = Fru::parse(fru.raw()).unwrap();
    assert!(again.area(AreaKind::Board).unwrap().get("Board Serial").is_none());
}

#[test]
fn header_checksum_warning() {
    let mut data = DATA.to_vec();
    data[7] ^= 0x01;
    let fru = Fru::parse(&data).unwrap();
    assert_eq!(fru.warnings().len(), 1);
    assert!(matches!(fru.warnings()[0], Warning::HeaderChecksum { .. }));
    assert!(fru.area(AreaKind::Product).is_some());
}

#[test]
fn area_checksum_warning() {
    let mut data = DATA.to_vec();
    // last byte of the board area
    data[11 * BLOCK_SIZE - 1] ^= 0xff;
    let fru = Fru::parse(&data).unwrap();
    assert_eq!(
        fru.warnings(),
        &[Warning::AreaChecksum {
            area: AreaKind::Board,
            calculated: DATA[11 * BLOCK_SIZE - 1],
            stored: DATA[11 * BLOCK_SIZE - 1] ^ 0xff,
        }]
    );
    let b = fru.area(AreaKind::Board).unwrap();
    assert_eq!(b.get("Board Mfg"), Some(&"Acme".into()));
}

#[test]
fn bad_images() {
    assert!(matches!(
        Fru::parse(&DATA[..5]),
        Err(FruError::TooSmall { size: 5, min: 8 })
    ));
    let mut data = DATA.to_vec();
    data[0] = 2;
    assert!(matches!(
        Fru::parse(&data),
        Err(FruError::UnsupportedVersion(2))
    ));
    assert!(matches!(
        Fru::parse(&DATA[..64]),
        Err(FruError::Parse {
            kind: AreaKind::Board,
            ..
        })
    ));
    assert!(matches!(
        Fru::parse(&DATA[..88]),
        Err(FruError::OffsetOutOfBounds {
            kind: AreaKind::Product,
            offset: 88,
            size: 88
        })
    ));
}

#[test]
fn unsupported_areas_are_dropped() {
    let mut data = DATA.to_vec();
    data[5] = 0x0f;
    data[7] = checksum::checksum(&data[..7]);
    let mut fru = Fru::parse(&data).unwrap();
    assert!(matches!(
        fru.warnings(),
        [Warning::Unsupported {
            area: "MultiRecord",
            offset: 0x0f
        }]
    ));
    fru.rebuild().unwrap();
    assert_eq!(fru.raw(), DATA);
}

#[test]
fn details_cover_image() {
    let (_, rows) = Fru::parse_detailed(DATA).unwrap();
    assert_eq!(rows[0].description, "Common header format version");
    let mut next = 0;
    for r in &rows {
        let (s, e) = match r.offset {
            detail::Offset::Single(o) => (o, o),
            detail::Offset::Range(s, e) => (s, e),
        };
        assert_eq!(s, next);
        next = e + 1;
    }
    assert_eq!(next, DATA.len());
}

#[test]
fn json_document() {
    let fru = Fru::parse(DATA).unwrap();
    let j = fru.to_json();
    let keys: Vec<&String> = j.as_object().unwrap().keys().collect();
    assert_eq!(keys, ["Chassis Info", "Board Info", "Product Info"]);
    assert_eq!(j["Chassis Info"]["Chassis Type"], 0x17);
    assert_eq!(j["Board Info"]["Board Mfg Date"], "2024-05-06 07:08:00");
    assert_eq!(j["Board Info"]["Board Custom Data 1"], "");
    assert_eq!(j["Product Info"]["Product Name"], "Widget Pro");
    assert_eq!(Fru::new().to_json()["Board Info"], serde_json::json!({}));
}
