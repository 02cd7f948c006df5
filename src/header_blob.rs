//! §4.1 HeaderBlob construction: a raw, validated view over one
//! serialized header (signature header or metadata header).

use std::io::Read;

use crate::entry::Entry;
use crate::error::{ReadError, Result};
use crate::region::{self, RegionOutcome};
use crate::structure;

/// `HeaderBlob` owns its serialized bytes (`ei`): `[il_be, dl_be,
/// entry_index, data]`, no magic. The caller strips the 8-byte magic (if
/// any) before handing bytes here — see [`crate::lead`] / the stream
/// constructor for the on-wire `{magic, il, dl}` lead-in.
#[derive(Debug)]
pub struct HeaderBlob {
    ei: Vec<u8>,
    il: u32,
    dl: u32,
    region_tag: u32,
    has_region: bool,
    ril: u32,
    rdl: u32,
    entries: Vec<Entry>,
}

impl HeaderBlob {
    /// `il` invariant: `0 <= il <= IL_MAX`.
    pub const IL_MAX: u32 = 1 << 16;
    /// `dl` invariant: `0 <= dl <= DL_MAX`.
    pub const DL_MAX: u32 = 256 * 1024 * 1024;

    /// Build a `HeaderBlob` from an in-memory buffer already known to be
    /// exactly `il_be || dl_be || entry_index || data`. `expected_region_tag`
    /// distinguishes a metadata header (`HEADER_IMMUTABLE`) from a
    /// signature header (`HEADER_SIGNATURES`). `exact_size` selects the
    /// package-file region check (§4.2 step 8) vs. the on-disk-database
    /// variant, which this crate does not otherwise exercise.
    pub fn parse(uh: Vec<u8>, expected_region_tag: u32, exact_size: bool) -> Result<HeaderBlob> {
        let uc = uh.len();
        if uc < 8 {
            return Err(ReadError::ShortRead {
                expected: 8,
                actual: uc,
            });
        }
        let il = u32::from_be_bytes(uh[0..4].try_into().unwrap());
        let dl = u32::from_be_bytes(uh[4..8].try_into().unwrap());
        if il > Self::IL_MAX {
            return Err(ReadError::BadHeaderTags(il));
        }
        if dl > Self::DL_MAX {
            return Err(ReadError::BadHeaderData(dl));
        }

        let pvlen = 8 + 16 * il as usize + dl as usize;
        if uc != pvlen {
            return Err(ReadError::BadBlobSize {
                expected: pvlen,
                actual: uc,
            });
        }

        let pe_start = 8;
        let (pe, data) = {
            let (pe, data) = uh[pe_start..].split_at(16 * il as usize);
            (pe, &data[..dl as usize])
        };

        let (has_region, ril, rdl) =
            match region::verify_region(pe, data, il, dl, expected_region_tag, exact_size)? {
                RegionOutcome::Found { ril, rdl } => (true, ril, rdl),
                RegionOutcome::NotFound => (false, 0, 0),
            };

        let entries = structure::verify_structure(pe, data, il, dl, has_region)?;

        Ok(HeaderBlob {
            ei: uh,
            il,
            dl,
            region_tag: expected_region_tag,
            has_region,
            ril,
            rdl,
            entries,
        })
    }

    /// Read the on-wire form `{magic(8), il_be, dl_be} + entry_index +
    /// data` from a stream: the 16-byte lead-in (§4.1) validated before
    /// any allocation happens.
    pub fn read_from_stream<R: Read>(
        reader: &mut R,
        expected_magic: [u8; 8],
        expected_region_tag: u32,
        exact_size: bool,
    ) -> Result<HeaderBlob> {
        let mut lead = [0u8; 16];
        let mut read_total = 0usize;
        loop {
            let n = reader.read(&mut lead[read_total..])?;
            if n == 0 {
                break;
            }
            read_total += n;
            if read_total == lead.len() {
                break;
            }
        }
        if read_total != lead.len() {
            return Err(ReadError::ShortRead {
                expected: lead.len(),
                actual: read_total,
            });
        }
        if lead[0..8] != expected_magic {
            return Err(ReadError::BadMagic);
        }
        let il = u32::from_be_bytes(lead[8..12].try_into().unwrap());
        let dl = u32::from_be_bytes(lead[12..16].try_into().unwrap());
        if il > Self::IL_MAX {
            return Err(ReadError::BadHeaderTags(il));
        }
        if dl > Self::DL_MAX {
            return Err(ReadError::BadHeaderData(dl));
        }

        let rest_len = 16 * il as usize + dl as usize;
        let mut rest = vec![0u8; rest_len];
        reader.read_exact(&mut rest)?;

        let mut uh = Vec::with_capacity(8 + rest_len);
        uh.extend_from_slice(&lead[8..16]);
        uh.extend_from_slice(&rest);
        Self::parse(uh, expected_region_tag, exact_size)
    }

    pub fn il(&self) -> u32 {
        self.il
    }

    pub fn dl(&self) -> u32 {
        self.dl
    }

    pub fn ril(&self) -> u32 {
        self.ril
    }

    pub fn rdl(&self) -> u32 {
        self.rdl
    }

    pub fn has_region(&self) -> bool {
        self.has_region
    }

    pub fn region_tag(&self) -> u32 {
        self.region_tag
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn pe(&self) -> &[u8] {
        &self.ei[8..8 + 16 * self.il as usize]
    }

    pub fn data(&self) -> &[u8] {
        &self.ei[8 + 16 * self.il as usize..]
    }

    /// Consume the blob, returning the owned `ei` buffer. Used when
    /// ownership transfers to the final `Header` on success (§3
    /// lifetimes note).
    pub fn into_ei(self) -> Vec<u8> {
        self.ei
    }

    /// The canonical `be32(ril) || be32(rdl) || pe[0..ril] || data[0..rdl]`
    /// blob fed to a digest alongside `HEADER_MAGIC`, per §4.4/§4.5.
    pub fn immutable_region_blob(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(8 + 16 * self.ril as usize + self.rdl as usize);
        out.extend_from_slice(&self.ril.to_be_bytes());
        out.extend_from_slice(&self.rdl.to_be_bytes());
        out.extend_from_slice(&self.pe()[..16 * self.ril as usize]);
        out.extend_from_slice(&self.data()[..self.rdl as usize]);
        out
    }
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

    /// Builds a minimal well-formed header: one region tag + one
    /// trailer covering it entirely, `exact_size = true`.
    fn minimal_region_header() -> Vec<u8> {
        let il = 1u32;
        let dl = 16u32;
        let mut buf = Vec::new();
        buf.extend_from_slice(&il.to_be_bytes());
        buf.extend_from_slice(&dl.to_be_bytes());
        // entry 0: region tag, BIN, offset 0, count 16
        buf.extend_from_slice(&record(HEADER_IMMUTABLE, 7, 0, 16));
        // data: the trailer itself, offset field = -(1*16) = -16
        buf.extend_from_slice(&record(HEADER_IMMUTABLE, 7, (-16i32) as u32, 16));
        buf
    }

    #[test]
    fn parses_minimal_region_header() {
        let blob = HeaderBlob::parse(minimal_region_header(), HEADER_IMMUTABLE, true).unwrap();
        assert_eq!(1, blob.il());
        assert_eq!(16, blob.dl());
        assert_eq!(1, blob.ril());
        assert_eq!(16, blob.rdl());
        assert!(blob.has_region());
    }

    #[test]
    fn rejects_truncated_lead_in() {
        let err = HeaderBlob::parse(vec![0u8; 4], crate::tags::HEADER_IMMUTABLE, true).unwrap_err();
        assert!(matches!(err, ReadError::ShortRead { expected: 8, actual: 4 }));
    }

    #[test]
    fn rejects_oversize_il() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(0x0010_0000u32).to_be_bytes());
        buf.extend_from_slice(&0u32.to_be_bytes());
        let err = HeaderBlob::parse(buf, HEADER_IMMUTABLE, true).unwrap_err();
        assert!(matches!(err, ReadError::BadHeaderTags(0x0010_0000)));
    }

    #[test]
    fn rejects_blob_size_mismatch() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&1u32.to_be_bytes());
        buf.extend_from_slice(&16u32.to_be_bytes());
        // missing entry index + data
        let err = HeaderBlob::parse(buf, HEADER_IMMUTABLE, true).unwrap_err();
        assert!(matches!(err, ReadError::BadBlobSize { .. }));
    }

    const MAGIC: [u8; 8] = crate::sig::HEADER_MAGIC;

    #[test]
    fn stream_reports_short_lead_in_with_exact_message() {
        let mut cursor = std::io::Cursor::new(vec![0u8; 4]);
        let err = HeaderBlob::read_from_stream(&mut cursor, MAGIC, HEADER_IMMUTABLE, true)
            .unwrap_err();
        assert_eq!("hdr size(16): BAD, read returned 4", err.to_string());
    }

    #[test]
    fn stream_reports_bad_magic() {
        let mut cursor = std::io::Cursor::new(vec![0u8; 16]);
        let err = HeaderBlob::read_from_stream(&mut cursor, MAGIC, HEADER_IMMUTABLE, true)
            .unwrap_err();
        assert_eq!("hdr magic: BAD", err.to_string());
    }

    #[test]
    fn stream_reports_oversize_il() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&MAGIC);
        buf.extend_from_slice(&(0x0010_0000u32).to_be_bytes());
        buf.extend_from_slice(&0u32.to_be_bytes());
        let mut cursor = std::io::Cursor::new(buf);
        let err = HeaderBlob::read_from_stream(&mut cursor, MAGIC, HEADER_IMMUTABLE, true)
            .unwrap_err();
        assert_eq!(
            "hdr tags: BAD, no. of tags(1048576) out of range",
            err.to_string()
        );
    }
}
