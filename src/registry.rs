//! Field codes as used on the command line, mapped to the info area and the
//! canonical field name they refer to.
//!
//! Each area has room for any number of custom data fields; the registry only
//! names the first 26 of them per area.

use phf::phf_ordered_map;
use serde::Serialize;

use crate::area::AreaKind;

/// Number of custom data fields per area that have a field code.
pub const CUSTOM_DATA_CODES: usize = 26;

/// Code of the board manufacturing date, which is not a TLV field.
pub const MFG_DATE_CODE: &str = "BMD";

/// How a field value shows up in detail rows.
#[derive(Serialize, Clone, Copy, Debug, Eq, PartialEq)]
pub enum Hint {
    /// Hex bytes annotated with the decoded text
    Reveal,
    /// A placeholder instead of the value, e.g. for serial numbers
    Mask,
}

#[derive(Serialize, Clone, Copy, Debug)]
pub struct FieldEntry {
    pub code: &'static str,
    pub area: AreaKind,
    pub name: &'static str,
    pub hint: Hint,
    pub description: Option<&'static str>,
}

impl FieldEntry {
    const fn describe(self, description: &'static str) -> Self {
        Self {
            description: Some(description),
            ..self
        }
    }

    pub fn description(&self) -> &'static str {
        self.description.unwrap_or(self.name)
    }

    pub fn is_mfg_date(&self) -> bool {
        self.code == MFG_DATE_CODE
    }
}

const fn reveal(code: &'static str, area: AreaKind, name: &'static str) -> FieldEntry {
    FieldEntry {
        code,
        area,
        name,
        hint: Hint::Reveal,
        description: None,
    }
}

const fn mask(code: &'static str, area: AreaKind, name: &'static str) -> FieldEntry {
    FieldEntry {
        code,
        area,
        name,
        hint: Hint::Mask,
        description: None,
    }
}

static FIELDS: phf::OrderedMap<&'static str, FieldEntry> = phf_ordered_map! {
    "CPN" => reveal("CPN", AreaKind::Chassis, "Chassis Part Number"),
    "CSN" => mask("CSN", AreaKind::Chassis, "Chassis Serial Number"),
    "CCD1" => reveal("CCD1", AreaKind::Chassis, "Chassis Custom Data 1"),
    "CCD2" => mask("CCD2", AreaKind::Chassis, "Chassis Custom Data 2"),
    "CCD3" => reveal("CCD3", AreaKind::Chassis, "Chassis Custom Data 3"),
    "CCD4" => reveal("CCD4", AreaKind::Chassis, "Chassis Custom Data 4"),
    "CCD5" => reveal("CCD5", AreaKind::Chassis, "Chassis Custom Data 5"),
    "CCD6" => reveal("CCD6", AreaKind::Chassis, "Chassis Custom Data 6"),
    "CCD7" => reveal("CCD7", AreaKind::Chassis, "Chassis Custom Data 7"),
    "CCD8" => reveal("CCD8", AreaKind::Chassis, "Chassis Custom Data 8"),
    "CCD9" => reveal("CCD9", AreaKind::Chassis, "Chassis Custom Data 9"),
    "CCD10" => reveal("CCD10", AreaKind::Chassis, "Chassis Custom Data 10"),
    "CCD11" => reveal("CCD11", AreaKind::Chassis, "Chassis Custom Data 11"),
    "CCD12" => reveal("CCD12", AreaKind::Chassis, "Chassis Custom Data 12"),
    "CCD13" => reveal("CCD13", AreaKind::Chassis, "Chassis Custom Data 13"),
    "CCD14" => reveal("CCD14", AreaKind::Chassis, "Chassis Custom Data 14"),
    "CCD15" => reveal("CCD15", AreaKind::Chassis, "Chassis Custom Data 15"),
    "CCD16" => reveal("CCD16", AreaKind::Chassis, "Chassis Custom Data 16"),
    "CCD17" => reveal("CCD17", AreaKind::Chassis, "Chassis Custom Data 17"),
    "CCD18" => reveal("CCD18", AreaKind::Chassis, "Chassis Custom Data 18"),
    "CCD19" => reveal("CCD19", AreaKind::Chassis, "Chassis Custom Data 19"),
    "CCD20" => reveal("CCD20", AreaKind::Chassis, "Chassis Custom Data 20"),
    "CCD21" => reveal("CCD21", AreaKind::Chassis, "Chassis Custom Data 21"),
    "CCD22" => reveal("CCD22", AreaKind::Chassis, "Chassis Custom Data 22"),
    "CCD23" => reveal("CCD23", AreaKind::Chassis, "Chassis Custom Data 23"),
    "CCD24" => reveal("CCD24", AreaKind::Chassis, "Chassis Custom Data 24"),
    "CCD25" => reveal("CCD25", AreaKind::Chassis, "Chassis Custom Data 25"),
    "CCD26" => reveal("CCD26", AreaKind::Chassis, "Chassis Custom Data 26"),
    "BMD" => reveal("BMD", AreaKind::Board, "Board Mfg Date").describe("Minutes since 1996-01-01 00:00"),
    "BM" => reveal("BM", AreaKind::Board, "Board Mfg"),
    "BP" => reveal("BP", AreaKind::Board, "Board Product"),
    "BSN" => mask("BSN", AreaKind::Board, "Board Serial"),
    "BPN" => reveal("BPN", AreaKind::Board, "Board Part Number"),
    "BFI" => reveal("BFI", AreaKind::Board, "Board FRU ID").describe("FRU file version"),
    "BCD1" => reveal("BCD1", AreaKind::Board, "Board Custom Data 1"),
    "BCD2" => mask("BCD2", AreaKind::Board, "Board Custom Data 2"),
    "BCD3" => mask("BCD3", AreaKind::Board, "Board Custom Data 3"),
    "BCD4" => reveal("BCD4", AreaKind::Board, "Board Custom Data 4"),
    "BCD5" => reveal("BCD5", AreaKind::Board, "Board Custom Data 5"),
    "BCD6" => reveal("BCD6", AreaKind::Board, "Board Custom Data 6"),
    "BCD7" => reveal("BCD7", AreaKind::Board, "Board Custom Data 7"),
    "BCD8" => reveal("BCD8", AreaKind::Board, "Board Custom Data 8"),
    "BCD9" => reveal("BCD9", AreaKind::Board, "Board Custom Data 9"),
    "BCD10" => reveal("BCD10", AreaKind::Board, "Board Custom Data 10"),
    "BCD11" => reveal("BCD11", AreaKind::Board, "Board Custom Data 11"),
    "BCD12" => reveal("BCD12", AreaKind::Board, "Board Custom Data 12"),
    "BCD13" => reveal("BCD13", AreaKind::Board, "Board Custom Data 13"),
    "BCD14" => reveal("BCD14", AreaKind::Board, "Board Custom Data 14"),
    "BCD15" => reveal("BCD15", AreaKind::Board, "Board Custom Data 15"),
    "BCD16" => reveal("BCD16", AreaKind::Board, "Board Custom Data 16"),
    "BCD17" => reveal("BCD17", AreaKind::Board, "Board Custom Data 17"),
    "BCD18" => reveal("BCD18", AreaKind::Board, "Board Custom Data 18"),
    "BCD19" => reveal("BCD19", AreaKind::Board, "Board Custom Data 19"),
    "BCD20" => reveal("BCD20", AreaKind::Board, "Board Custom Data 20"),
    "BCD21" => reveal("BCD21", AreaKind::Board, "Board Custom Data 21"),
    "BCD22" => reveal("BCD22", AreaKind::Board, "Board Custom Data 22"),
    "BCD23" => reveal("BCD23", AreaKind::Board, "Board Custom Data 23"),
    "BCD24" => reveal("BCD24", AreaKind::Board, "Board Custom Data 24"),
    "BCD25" => reveal("BCD25", AreaKind::Board, "Board Custom Data 25"),
    "BCD26" => reveal("BCD26", AreaKind::Board, "Board Custom Data 26"),
    "PM" => reveal("PM", AreaKind::Product, "Product Manufacturer"),
    "PN" => reveal("PN", AreaKind::Product, "Product Name"),
    "PPN" => reveal("PPN", AreaKind::Product, "Product Part Number"),
    "PV" => reveal("PV", AreaKind::Product, "Product Version"),
    "PSN" => mask("PSN", AreaKind::Product, "Product Serial"),
    "PAT" => mask("PAT", AreaKind::Product, "Product Asset Tag"),
    "PFI" => reveal("PFI", AreaKind::Product, "Product FRU ID").describe("FRU file version"),
    "PCD1" => reveal("PCD1", AreaKind::Product, "Product Custom Data 1"),
    "PCD2" => reveal("PCD2", AreaKind::Product, "Product Custom Data 2"),
    "PCD3" => reveal("PCD3", AreaKind::Product, "Product Custom Data 3"),
    "PCD4" => reveal("PCD4", AreaKind::Product, "Product Custom Data 4"),
    "PCD5" => reveal("PCD5", AreaKind::Product, "Product Custom Data 5"),
    "PCD6" => reveal("PCD6", AreaKind::Product, "Product Custom Data 6"),
    "PCD7" => reveal("PCD7", AreaKind::Product, "Product Custom Data 7"),
    "PCD8" => reveal("PCD8", AreaKind::Product, "Product Custom Data 8"),
    "PCD9" => reveal("PCD9", AreaKind::Product, "Product Custom Data 9"),
    "PCD10" => reveal("PCD10", AreaKind::Product, "Product Custom Data 10"),
    "PCD11" => reveal("PCD11", AreaKind::Product, "Product Custom Data 11"),
    "PCD12" => reveal("PCD12", AreaKind::Product, "Product Custom Data 12"),
    "PCD13" => reveal("PCD13", AreaKind::Product, "Product Custom Data 13"),
    "PCD14" => reveal("PCD14", AreaKind::Product, "Product Custom Data 14"),
    "PCD15" => reveal("PCD15", AreaKind::Product, "Product Custom Data 15"),
    "PCD16" => reveal("PCD16", AreaKind::Product, "Product Custom Data 16"),
    "PCD17" => reveal("PCD17", AreaKind::Product, "Product Custom Data 17"),
    "PCD18" => reveal("PCD18", AreaKind::Product, "Product Custom Data 18"),
    "PCD19" => reveal("PCD19", AreaKind::Product, "Product Custom Data 19"),
    "PCD20" => reveal("PCD20", AreaKind::Product, "Product Custom Data 20"),
    "PCD21" => reveal("PCD21", AreaKind::Product, "Product Custom Data 21"),
    "PCD22" => reveal("PCD22", AreaKind::Product, "Product Custom Data 22"),
    "PCD23" => reveal("PCD23", AreaKind::Product, "Product Custom Data 23"),
    "PCD24" => reveal("PCD24", AreaKind::Product, "Product Custom Data 24"),
    "PCD25" => reveal("PCD25", AreaKind::Product, "Product Custom Data 25"),
    "PCD26" => reveal("PCD26", AreaKind::Product, "Product Custom Data 26"),
};

/// Get the entry for a field code, e.g. `BSN`.
pub fn lookup(code: &str) -> Option<&'static FieldEntry> {
    FIELDS.get(code)
}

/// Find the entry of a canonical field name within an area.
pub fn find_field(area: AreaKind, name: &str) -> Option<&'static FieldEntry> {
    FIELDS.values().find(|e| e.area == area && e.name == name)
}

/// All entries, chassis first, then board, then product.
pub fn fields() -> impl Iterator<Item = &'static FieldEntry> {
    FIELDS.values()
}

#[test]
fn lookup_codes() {
    let e = lookup("BSN").unwrap();
    assert_eq!(e.area, AreaKind::Board);
    assert_eq!(e.name, "Board Serial");
    assert_eq!(e.hint, Hint::Mask);
    assert_eq!(e.description(), "Board Serial");

    let e = lookup("PCD26").unwrap();
    assert_eq!(e.area, AreaKind::Product);
    assert_eq!(e.name, "Product Custom Data 26");

    assert!(lookup("PCD27").is_none());
    assert!(lookup("bsn").is_none());
}

#[test]
fn find_by_name() {
    let e = find_field(AreaKind::Chassis, "Chassis Custom Data 3").unwrap();
    assert_eq!(e.code, "CCD3");
    assert!(find_field(AreaKind::Board, "Chassis Custom Data 3").is_none());
    assert!(find_field(AreaKind::Board, "Board Mfg Date").unwrap().is_mfg_date());
}

#[test]
fn every_area_field_is_registered() {
    for kind in [AreaKind::Chassis, AreaKind::Board, AreaKind::Product] {
        let count = kind.fixed_fields().len() + CUSTOM_DATA_CODES;
        for i in 0..count {
            let name = kind.field_name(i);
            let e = find_field(kind, &name).unwrap();
            assert_eq!(lookup(e.code).unwrap().name, name);
        }
    }
    assert_eq!(fields().count(), 2 + 5 + 7 + 3 * CUSTOM_DATA_CODES + 1);
    assert_eq!(fields().next().unwrap().code, "CPN");
}
