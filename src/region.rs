//! §4.2 RegionVerifier: locate the immutable region and compute its
//! entry-count/data-size sub-bounds (`ril`/`rdl`).

use crate::entry::RawRecord;
use crate::error::{ReadError, Result};

const REGION_TRAILER_SIZE: u32 = 16;
const REGION_ENTRY_TYPE_BIN: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionOutcome {
    Found { ril: u32, rdl: u32 },
    NotFound,
}

/// `uc`/`il`/`dl` are already bounds-checked by the caller (`HeaderBlob`
/// construction, §4.1 steps 1–4). `pe`/`data` are the already-sliced
/// entry index and data segment.
pub fn verify_region(
    pe: &[u8],
    data: &[u8],
    il: u32,
    dl: u32,
    expected_tag: u32,
    exact_size: bool,
) -> Result<RegionOutcome> {
    if il < 1 {
        return Err(ReadError::RegionMissing);
    }

    let entry0 = RawRecord::read_at(pe, 0)?;
    if entry0.tag != expected_tag {
        return Ok(RegionOutcome::NotFound);
    }
    if entry0.ty != REGION_ENTRY_TYPE_BIN || entry0.count != REGION_TRAILER_SIZE {
        return Err(ReadError::BadRegionTag);
    }

    let region_offset = entry0.offset;
    if region_offset
        .checked_add(REGION_TRAILER_SIZE)
        .map(|end| end > dl)
        .unwrap_or(true)
    {
        return Err(ReadError::BadRegionOffset);
    }
    let rdl = region_offset + REGION_TRAILER_SIZE;

    let trailer_start = region_offset as usize;
    let trailer = data
        .get(trailer_start..trailer_start + REGION_TRAILER_SIZE as usize)
        .ok_or(ReadError::BadRegionOffset)?;
    let trailer = crate::entry::parse_raw_record(trailer)
        .map(|(_, r)| r)
        .map_err(|_| ReadError::BadRegionTrailer)?;

    if trailer.tag != expected_tag || trailer.ty != REGION_ENTRY_TYPE_BIN || trailer.count != REGION_TRAILER_SIZE
    {
        return Err(ReadError::BadRegionTrailer);
    }

    // The trailer's offset field is the two's-complement negation of the
    // region's entry-index size in bytes; invert the sign to recover it.
    let negated = trailer.offset as i32;
    let region_index_bytes = negated.checked_neg().ok_or(ReadError::BadRegionSize)?;
    if region_index_bytes < 0 || region_index_bytes % (RawRecord::SIZE as i32) != 0 {
        return Err(ReadError::BadRegionSize);
    }
    let ril = (region_index_bytes as u32) / RawRecord::SIZE as u32;
    if ril > il || rdl > dl {
        return Err(ReadError::BadRegionSize);
    }

    if exact_size && (il != ril || dl != rdl) {
        return Err(ReadError::RegionSizeMismatch);
    }

    Ok(RegionOutcome::Found { ril, rdl })
}
