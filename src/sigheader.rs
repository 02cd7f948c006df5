//! §4.5 step 2: the signature header is just a [`HeaderBlob`] read with
//! `HEADER_SIGNATURES` as the expected region tag, `exact_size = true`
//! (package files, never the on-disk rpmdb variant).

use std::io::Read;

use crate::error::Result;
use crate::header_blob::HeaderBlob;
use crate::sig::HEADER_MAGIC;
use crate::tags::HEADER_SIGNATURES;

pub fn read_signature_header<R: Read>(reader: &mut R) -> Result<HeaderBlob> {
    let blob = HeaderBlob::read_from_stream(reader, HEADER_MAGIC, HEADER_SIGNATURES, true)?;
    skip_padding(reader, blob.dl())?;
    Ok(blob)
}

/// §6: the signature header's data segment is padded with `0..7` bytes
/// so the following header (the metadata header) starts 8-byte aligned.
/// The metadata header itself carries no such padding.
fn skip_padding<R: Read>(reader: &mut R, dl: u32) -> Result<()> {
    let pad = (8 - (dl % 8)) % 8;
    if pad == 0 {
        return Ok(());
    }
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf[..pad as usize])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::HEADER_IMMUTABLE;
    use pretty_assertions::assert_eq;

    fn record(tag: u32, ty: u32, offset: u32, count: u32) -> [u8; 16] {
        let mut buf = [0u8; 16];
        buf[0..4].copy_from_slice(&tag.to_be_bytes());
        buf[4..8].copy_from_slice(&ty.to_be_bytes());
        buf[8..12].copy_from_slice(&offset.to_be_bytes());
        buf[12..16].copy_from_slice(&count.to_be_bytes());
        buf
    }

    fn minimal_sig_header_bytes() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&HEADER_MAGIC);
        buf.extend_from_slice(&1u32.to_be_bytes());
        buf.extend_from_slice(&16u32.to_be_bytes());
        buf.extend_from_slice(&record(HEADER_SIGNATURES, 7, 0, 16));
        buf.extend_from_slice(&record(HEADER_SIGNATURES, 7, (-16i32) as u32, 16));
        buf
    }

    #[test]
    fn reads_minimal_signature_header() {
        let mut cursor = std::io::Cursor::new(minimal_sig_header_bytes());
        let blob = read_signature_header(&mut cursor).unwrap();
        assert_eq!(HEADER_SIGNATURES, blob.region_tag());
        assert!(blob.has_region());
    }

    /// §6: `dl=20` is not 8-byte aligned, so 4 padding bytes follow the
    /// signature header before the next header's intro. Entry 0's
    /// offset is 4 (not 0), so the 16-byte trailer lands at the very
    /// end of a 20-byte data segment and `exact_size` still holds.
    #[test]
    fn reads_past_non_aligned_padding() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&HEADER_MAGIC);
        buf.extend_from_slice(&1u32.to_be_bytes());
        buf.extend_from_slice(&20u32.to_be_bytes());
        buf.extend_from_slice(&record(HEADER_SIGNATURES, 7, 4, 16));
        buf.extend_from_slice(&[0u8; 4]);
        buf.extend_from_slice(&record(HEADER_SIGNATURES, 7, (-16i32) as u32, 16));
        buf.extend_from_slice(&[0u8; 4]); // alignment padding
        buf.extend_from_slice(b"NEXT"); // marks the start of the next header

        let mut cursor = std::io::Cursor::new(buf);
        let blob = read_signature_header(&mut cursor).unwrap();
        assert_eq!(20, blob.dl());

        let mut rest = Vec::new();
        cursor.read_to_end(&mut rest).unwrap();
        assert_eq!(b"NEXT".to_vec(), rest);
    }

    #[test]
    fn mismatched_region_tag_reports_no_region_found() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&HEADER_MAGIC);
        buf.extend_from_slice(&1u32.to_be_bytes());
        buf.extend_from_slice(&16u32.to_be_bytes());
        buf.extend_from_slice(&record(HEADER_IMMUTABLE, 7, 0, 16));
        buf.extend_from_slice(&record(HEADER_IMMUTABLE, 7, (-16i32) as u32, 16));
        let mut cursor = std::io::Cursor::new(buf);
        let blob = read_signature_header(&mut cursor).unwrap();
        assert!(!blob.has_region());
    }
}
