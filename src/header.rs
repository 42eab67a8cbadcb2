//! FRU common header
//!
//! The first 8 bytes of a FRU image. Area offsets are given in multiples of
//! 8 bytes from the start of the image, where 0 means the area is absent.

use core::fmt::{self, Display};
use core::mem::size_of;

use serde::{Deserialize, Serialize};
use zerocopy::{FromBytes, IntoBytes};
use zerocopy_derive::{FromBytes, Immutable, IntoBytes};

use crate::area::AreaKind;
use crate::checksum;
use crate::detail::DetailRow;

pub const FORMAT_VERSION: u8 = 0x01;

/// Offsets and lengths are stored in units of this many bytes.
pub const BLOCK_SIZE: usize = 8;

#[derive(
    Immutable, IntoBytes, FromBytes, Serialize, Deserialize, Clone, Copy, Debug, Eq, PartialEq,
)]
#[repr(C)]
pub struct CommonHeader {
    pub format_version: u8,
    pub internal_offset: u8,
    pub chassis_offset: u8,
    pub board_offset: u8,
    pub product_offset: u8,
    pub multirecord_offset: u8,
    pub pad: u8,
    pub checksum: u8,
}

pub const HEADER_SIZE: usize = size_of::<CommonHeader>();

impl Display for CommonHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.format_version;
        let i = self.internal_offset;
        let c = self.chassis_offset;
        let b = self.board_offset;
        let p = self.product_offset;
        let m = self.multirecord_offset;
        let cs = self.checksum;
        write!(
            f,
            "v{v}, internal {i}, chassis {c}, board {b}, product {p}, multirecord {m}, checksum {cs:02x}"
        )
    }
}

impl Default for CommonHeader {
    fn default() -> Self {
        Self::build(0, 0, 0)
    }
}

impl CommonHeader {
    /// Read the header from the start of an image. The caller is expected to
    /// check the format version and the checksum.
    pub fn parse(data: &[u8]) -> Option<Self> {
        match Self::read_from_prefix(data) {
            Ok((h, _)) => Some(h),
            Err(_) => None,
        }
    }

    /// Create a header from area offsets in 8-byte units, with its checksum.
    pub fn build(chassis_offset: u8, board_offset: u8, product_offset: u8) -> Self {
        let mut h = Self {
            format_version: FORMAT_VERSION,
            internal_offset: 0,
            chassis_offset,
            board_offset,
            product_offset,
            multirecord_offset: 0,
            pad: 0,
            checksum: 0,
        };
        h.checksum = h.calculate_checksum();
        h
    }

    /// Checksum over the first 7 bytes
    pub fn calculate_checksum(&self) -> u8 {
        checksum::checksum(&self.as_bytes()[..HEADER_SIZE - 1])
    }

    pub fn checksum_ok(&self) -> bool {
        checksum::verify(&self.as_bytes()[..HEADER_SIZE - 1], self.checksum)
    }

    /// Offset of an area in 8-byte units, 0 if absent.
    pub fn area_offset(&self, kind: AreaKind) -> u8 {
        match kind {
            AreaKind::Chassis => self.chassis_offset,
            AreaKind::Board => self.board_offset,
            AreaKind::Product => self.product_offset,
        }
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    pub fn details(&self) -> Vec<DetailRow> {
        const NAMES: [&str; HEADER_SIZE] = [
            "Common header format version",
            "Internal use area offset (* 8 bytes)",
            "Chassis info area offset (* 8 bytes)",
            "Board info area offset (* 8 bytes)",
            "Product info area offset (* 8 bytes)",
            "MultiRecord area offset (* 8 bytes)",
            "Pad",
            "Common header checksum",
        ];
        self.as_bytes()
            .iter()
            .zip(NAMES)
            .enumerate()
            .map(|(o, (b, n))| DetailRow::bytes(o, &[*b], n))
            .collect()
    }
}

#[test]
fn parse_header() {
    let data = [0x01, 0x00, 0x01, 0x03, 0x0a, 0x00, 0x00, 0xf1, 0xff];
    let h = CommonHeader::parse(&data).unwrap();
    assert_eq!(h.format_version, 1);
    assert_eq!(h.area_offset(AreaKind::Chassis), 1);
    assert_eq!(h.area_offset(AreaKind::Board), 3);
    assert_eq!(h.area_offset(AreaKind::Product), 10);
    assert!(h.checksum_ok());
}

#[test]
fn parse_short_header() {
    assert!(CommonHeader::parse(&[0x01, 0x00, 0x01]).is_none());
}

#[test]
fn build_header() {
    let h = CommonHeader::build(1, 3, 10);
    assert_eq!(h.to_vec(), [0x01, 0x00, 0x01, 0x03, 0x0a, 0x00, 0x00, 0xf1]);
    let sum = h.to_vec().iter().fold(0u8, |a, b| a.wrapping_add(*b));
    assert_eq!(sum, 0);
}

#[test]
fn header_details() {
    let rows = CommonHeader::build(1, 3, 0).details();
    assert_eq!(rows.len(), HEADER_SIZE);
    assert_eq!(rows[3].value, "03");
    assert_eq!(rows[3].description, "Board info area offset (* 8 bytes)");
    assert_eq!(rows[7].offset, crate::detail::Offset::Single(7));
}

#[test]
fn bad_header_checksum() {
    let mut h = CommonHeader::build(1, 0, 0);
    h.checksum ^= 0xff;
    assert!(!h.checksum_ok());
}
