//! §3/§4.5 the owned metadata header produced by a successful read, plus
//! the two retrofit operations (v3 region synthesis, old-filenames
//! expansion) and the legacy signature-tag merge (step 7).

use crate::entry::{Entry, EntryType};
use crate::error::{ReadError, Result};
use crate::header_blob::HeaderBlob;
use crate::tags;

/// An owned, validated metadata header: the consumed [`HeaderBlob`]
/// buffer plus its decoded entries. `get`/`put`/`is_entry` are the
/// narrow accessor surface the retrofit and merge steps need; this is
/// not a general-purpose header-editing API (out of scope, §1).
#[derive(Debug)]
pub struct Header {
    data: Vec<u8>,
    entries: Vec<Entry>,
}

impl Header {
    /// Takes ownership of the blob's data segment; the raw entry-index
    /// bytes are dropped once `entries` has been decoded from them.
    pub fn from_blob(blob: HeaderBlob) -> Header {
        let entries = blob.entries().to_vec();
        let data = blob.data().to_vec();
        Header { data, entries }
    }

    pub fn il(&self) -> u32 {
        self.entries.len() as u32
    }

    pub fn dl(&self) -> u32 {
        self.data.len() as u32
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn is_entry(&self, tag: u32) -> bool {
        self.entries.iter().any(|e| e.tag == tag)
    }

    /// Read an entry's raw payload bytes, if present.
    pub fn get(&self, tag: u32) -> Option<(&Entry, &[u8])> {
        let entry = self.entries.iter().find(|e| e.tag == tag)?;
        let len = crate::entry::payload_len(entry.ty, entry.count, &self.data, entry.offset).ok()?;
        let start = entry.offset as usize;
        Some((entry, &self.data[start..start + len]))
    }

    /// Append a new entry whose payload is placed after the current end
    /// of the data segment. Used by the retrofit/merge operations below;
    /// not a general mutation API.
    pub fn put(&mut self, tag: u32, ty: EntryType, payload: &[u8]) {
        let offset = self.data.len() as u32;
        self.data.extend_from_slice(payload);
        let count = match ty {
            EntryType::String => 1,
            _ => ty.fixed_size().map(|sz| (payload.len() / sz.max(1)) as u32).unwrap_or(1),
        };
        self.entries.push(Entry {
            tag,
            ty,
            offset,
            count,
        });
    }

    /// §4.5 step 6 / legacy v3 packages: synthesize a `HEADER_IMAGE`
    /// region tag when the loaded header predates the region convention
    /// entirely. A v3 header has no region tag at index 0 at all; this
    /// does not change which entries are present, only records that the
    /// whole header is (trivially) the region.
    pub fn convert_v3_region(&mut self) {
        if self.is_entry(tags::HEADER_IMAGE) {
            return;
        }
        let region_data = self.il().to_be_bytes();
        self.put(tags::HEADER_IMAGE, EntryType::Bin, &region_data);
    }

    /// §4.5 step 6 / legacy compressed file lists: a v3-era header
    /// stores `OLDFILENAMES` as one big `StringArray` of full paths;
    /// modern headers split the same information into `BASENAMES`
    /// (the final path component), `DIRNAME` (the deduplicated
    /// directory prefixes, each ending in `/`), and `DIRINDEXES` (one
    /// `Int32` per file, indexing into `DIRNAME`).
    pub fn needs_old_filenames_conversion(&self) -> bool {
        self.is_entry(tags::OLDFILENAMES) && !self.is_entry(tags::BASENAMES)
    }

    /// Perform the split described above. No-op if the condition in
    /// [`Self::needs_old_filenames_conversion`] doesn't hold.
    pub fn convert_old_filenames(&mut self) -> Result<()> {
        if !self.needs_old_filenames_conversion() {
            return Ok(());
        }
        let (entry, raw) = self.get(tags::OLDFILENAMES).expect("checked above");
        let count = entry.count;
        let paths = split_nul_strings(raw, count)?;

        let mut dirnames: Vec<Vec<u8>> = Vec::new();
        let mut dirindexes: Vec<u32> = Vec::with_capacity(paths.len());
        let mut basenames: Vec<Vec<u8>> = Vec::with_capacity(paths.len());

        for path in &paths {
            let split_at = path.iter().rposition(|&b| b == b'/').map(|i| i + 1);
            let (dir, base) = match split_at {
                Some(i) => (&path[..i], &path[i..]),
                None => (&path[..0], &path[..]),
            };
            let idx = match dirnames.iter().position(|d| d.as_slice() == dir) {
                Some(i) => i,
                None => {
                    dirnames.push(dir.to_vec());
                    dirnames.len() - 1
                }
            };
            dirindexes.push(idx as u32);
            basenames.push(base.to_vec());
        }

        let basenames_payload = join_nul_strings(&basenames);
        let dirname_payload = join_nul_strings(&dirnames);
        let mut dirindexes_payload = Vec::with_capacity(dirindexes.len() * 4);
        for idx in &dirindexes {
            dirindexes_payload.extend_from_slice(&idx.to_be_bytes());
        }

        self.put_array(tags::BASENAMES, EntryType::StringArray, &basenames_payload, basenames.len() as u32);
        self.put_array(tags::DIRNAME, EntryType::StringArray, &dirname_payload, dirnames.len() as u32);
        self.put_array(tags::DIRINDEXES, EntryType::Int32, &dirindexes_payload, dirindexes.len() as u32);
        self.remove(tags::OLDFILENAMES);
        Ok(())
    }

    /// Like [`Self::put`] but for entries whose `count` isn't derivable
    /// from `payload.len()` alone (a `StringArray`'s element count is
    /// the number of NUL-terminated strings, not a fixed division).
    fn put_array(&mut self, tag: u32, ty: EntryType, payload: &[u8], count: u32) {
        let offset = self.data.len() as u32;
        self.data.extend_from_slice(payload);
        self.entries.push(Entry {
            tag,
            ty,
            offset,
            count,
        });
    }

    /// Drop an entry from the index. Leaves its payload bytes in `data`
    /// (never reused, but not worth compacting for a one-shot retrofit).
    fn remove(&mut self, tag: u32) {
        self.entries.retain(|e| e.tag != tag);
    }

    /// §4.5 step 7: merge tags from the signature header into this
    /// metadata header, remapping legacy tag numbers and skipping
    /// anything already present. `sig_entries`/`sig_data` come from the
    /// already-verified signature header.
    pub fn merge_legacy_signature_tags(&mut self, sig_entries: &[Entry], sig_data: &[u8]) -> Result<()> {
        for entry in sig_entries {
            let Some(modern_tag) = tags::remap_legacy_tag(entry.tag) else {
                continue;
            };
            if self.is_entry(modern_tag) {
                continue;
            }
            if !sanity_check_legacy_type(entry.ty, entry.count) {
                continue;
            }
            let len = crate::entry::payload_len(entry.ty, entry.count, sig_data, entry.offset)?;
            let start = entry.offset as usize;
            let payload = &sig_data[start..start + len];
            self.put(modern_tag, entry.ty, payload);
        }
        Ok(())
    }
}

/// Split `count` NUL-terminated strings out of `raw` (NULs excluded).
fn split_nul_strings(raw: &[u8], count: u32) -> Result<Vec<Vec<u8>>> {
    let mut out = Vec::with_capacity(count as usize);
    let mut rest = raw;
    for _ in 0..count {
        let nul_at = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(ReadError::BadHeaderEntry(0, "missing NUL terminator(s)"))?;
        out.push(rest[..nul_at].to_vec());
        rest = &rest[nul_at + 1..];
    }
    Ok(out)
}

/// Join strings back into a NUL-terminated, NUL-delimited byte blob.
fn join_nul_strings(strings: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    for s in strings {
        out.extend_from_slice(s);
        out.push(0);
    }
    out
}

/// Scalar numeric types, `String`, and `Bin` are eligible for the legacy
/// merge (§4.5 step 7: scalar types require `count == 1`; `String`/`Bin`
/// require `count < 16*1024`). `StringArray`/`I18nString` are always
/// dropped — the spec's documented open question, resolved as "drop"
/// (§9 design note).
fn sanity_check_legacy_type(ty: EntryType, count: u32) -> bool {
    const COUNT_LIMIT: u32 = 16 * 1024;
    match ty {
        EntryType::Char
        | EntryType::Int8
        | EntryType::Int16
        | EntryType::Int32
        | EntryType::Int64 => count == 1,
        EntryType::String | EntryType::Bin => count < COUNT_LIMIT,
        EntryType::StringArray | EntryType::I18nString | EntryType::Null => false,
    }
}
