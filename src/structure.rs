//! §4.3 StructureVerifier: tag-by-tag sanity of the entry index.

use crate::entry::{payload_len, Entry, EntryType, RawRecord};
use crate::error::{ReadError, Result};

/// Validate all `il` entries and return them decoded, in index order.
///
/// `has_region` marks entry 0 as the immutable-region tag (§4.2): its
/// `offset` points at the trailer near the *end* of the data segment,
/// the maximum offset in the header, so it is excluded from the
/// non-decreasing-offset check applied to the remaining entries.
pub fn verify_structure(pe: &[u8], data: &[u8], il: u32, dl: u32, has_region: bool) -> Result<Vec<Entry>> {
    let mut entries = Vec::with_capacity(il as usize);
    let mut last_offset = 0u32;

    for i in 0..il as usize {
        let raw = RawRecord::read_at(pe, i)?;

        let ty = EntryType::from_u32(raw.ty)
            .ok_or(ReadError::BadHeaderEntry(i, "unknown type code"))?;

        if raw.count == 0 {
            return Err(ReadError::BadHeaderEntry(i, "zero count"));
        }

        let is_region_entry = has_region && i == 0;
        if !is_region_entry {
            if raw.offset < last_offset {
                return Err(ReadError::BadHeaderEntry(i, "offsets not non-decreasing"));
            }
            last_offset = raw.offset;
        }

        let len = payload_len(ty, raw.count, data, raw.offset)
            .map_err(|_| ReadError::BadHeaderEntry(i, "malformed payload"))?;
        let end = (raw.offset as usize)
            .checked_add(len)
            .ok_or(ReadError::BadHeaderEntry(i, "payload length overflow"))?;
        if end > dl as usize {
            return Err(ReadError::BadHeaderEntry(i, "payload exceeds data segment"));
        }

        entries.push(Entry {
            tag: raw.tag,
            ty,
            offset: raw.offset,
            count: raw.count,
        });
    }

    Ok(entries)
}
