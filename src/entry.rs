use nom::number::complete::be_u32;
use nom::IResult;

use crate::error::{ReadError, Result};

/// The nine storable entry types plus `Null`, matching the on-disk type
/// code 0–9. `size()` gives the fixed per-element size for fixed-width
/// types; string-like types return `None` and must be measured by
/// scanning for their NUL terminator(s).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    Null,
    Char,
    Int8,
    Int16,
    Int32,
    Int64,
    String,
    Bin,
    StringArray,
    I18nString,
}

impl EntryType {
    pub fn from_u32(v: u32) -> Option<EntryType> {
        Some(match v {
            0 => EntryType::Null,
            1 => EntryType::Char,
            2 => EntryType::Int8,
            3 => EntryType::Int16,
            4 => EntryType::Int32,
            5 => EntryType::Int64,
            6 => EntryType::String,
            7 => EntryType::Bin,
            8 => EntryType::StringArray,
            9 => EntryType::I18nString,
            _ => return None,
        })
    }

    pub fn as_u32(self) -> u32 {
        match self {
            EntryType::Null => 0,
            EntryType::Char => 1,
            EntryType::Int8 => 2,
            EntryType::Int16 => 3,
            EntryType::Int32 => 4,
            EntryType::Int64 => 5,
            EntryType::String => 6,
            EntryType::Bin => 7,
            EntryType::StringArray => 8,
            EntryType::I18nString => 9,
        }
    }

    /// Fixed per-element byte size, or `None` for the NUL-delimited
    /// string-like types whose total length isn't `count * elem_size`.
    /// `Bin` is fixed-size at 1 byte/element: its `count` is the raw
    /// byte length directly, unlike `String`/`StringArray`/`I18nString`
    /// which are NUL-terminated and must be measured by scanning.
    pub fn fixed_size(self) -> Option<usize> {
        match self {
            EntryType::Null => Some(0),
            EntryType::Char | EntryType::Int8 | EntryType::Bin => Some(1),
            EntryType::Int16 => Some(2),
            EntryType::Int32 => Some(4),
            EntryType::Int64 => Some(8),
            EntryType::String | EntryType::StringArray | EntryType::I18nString => None,
        }
    }

    pub fn is_string_like(self) -> bool {
        matches!(
            self,
            EntryType::String | EntryType::StringArray | EntryType::I18nString
        )
    }
}

/// One 16-byte on-disk entry-index record, decoded to host order.
#[derive(Debug, Clone, Copy)]
pub struct RawRecord {
    pub tag: u32,
    pub ty: u32,
    pub offset: u32,
    pub count: u32,
}

pub fn parse_raw_record(buf: &[u8]) -> IResult<&[u8], RawRecord> {
    let (rest, tag) = be_u32(buf)?;
    let (rest, ty) = be_u32(rest)?;
    let (rest, offset) = be_u32(rest)?;
    let (rest, count) = be_u32(rest)?;
    Ok((
        rest,
        RawRecord {
            tag,
            ty,
            offset,
            count,
        },
    ))
}

impl RawRecord {
    pub const SIZE: usize = 16;

    /// Decode one 16-byte record at `pe[index * 16 ..]`.
    pub fn read_at(pe: &[u8], index: usize) -> Result<RawRecord> {
        let start = index
            .checked_mul(RawRecord::SIZE)
            .ok_or(ReadError::BadHeaderEntry(index, "index overflow"))?;
        let end = start + RawRecord::SIZE;
        let slice = pe
            .get(start..end)
            .ok_or(ReadError::BadHeaderEntry(index, "truncated record"))?;
        let (_, record) =
            parse_raw_record(slice).map_err(|_| ReadError::BadHeaderEntry(index, "malformed"))?;
        Ok(record)
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.tag.to_be_bytes());
        out.extend_from_slice(&self.ty.to_be_bytes());
        out.extend_from_slice(&self.offset.to_be_bytes());
        out.extend_from_slice(&self.count.to_be_bytes());
    }
}

/// A fully validated entry: tag, decoded type, offset/count into the
/// data segment. Produced by `StructureVerifier`.
#[derive(Debug, Clone, Copy)]
pub struct Entry {
    pub tag: u32,
    pub ty: EntryType,
    pub offset: u32,
    pub count: u32,
}

/// Computed byte length of an entry's payload within the data segment.
pub fn payload_len(ty: EntryType, count: u32, data: &[u8], offset: u32) -> Result<usize> {
    match ty.fixed_size() {
        Some(elem) => elem
            .checked_mul(count as usize)
            .ok_or(ReadError::BadHeaderEntry(0, "count overflow")),
        None => {
            // String-like: scan forward from `offset` for `count` NULs.
            let start = offset as usize;
            let slice = data
                .get(start..)
                .ok_or(ReadError::BadHeaderEntry(0, "offset out of range"))?;
            let mut seen = 0u32;
            for (i, b) in slice.iter().enumerate() {
                if *b == 0 {
                    seen += 1;
                    if seen == count {
                        return Ok(i + 1);
                    }
                }
            }
            Err(ReadError::BadHeaderEntry(0, "missing NUL terminator(s)"))
        }
    }
}
