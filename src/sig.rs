//! §4.4 HeaderSigVerifier and the algorithm-selection policy shared with
//! §4.5 step 3.

use crate::entry::Entry;
use crate::error::{ReadError, Result, Verdict};
use crate::header_blob::HeaderBlob;
use crate::tags::{RPMTAG_DSAHEADER, RPMTAG_RSAHEADER, RPMTAG_SHA1HEADER, SIG_DSA, SIG_RSA, SIG_SHA1};
use crate::verify::{Keyring, SignatureParser, SignatureVerifier};

/// Fixed 8-byte magic fed to every canonical digest, and the first
/// bytes of the on-disk signature-header intro (§6).
pub const HEADER_MAGIC: [u8; 8] = [0x8e, 0xad, 0xe8, 0x01, 0, 0, 0, 0];

/// bitfield disable switches honored during algorithm selection, §6
/// `vsflags`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SigPolicy {
    pub no_sha1: bool,
    pub no_dsa: bool,
    pub no_rsa: bool,
}

impl SigPolicy {
    pub const NO_SHA1HEADER: u32 = 1 << 0;
    pub const NO_DSAHEADER: u32 = 1 << 1;
    pub const NO_RSAHEADER: u32 = 1 << 2;
    pub const ALL_DISABLE: u32 =
        Self::NO_SHA1HEADER | Self::NO_DSAHEADER | Self::NO_RSAHEADER;

    pub fn none_disabled() -> SigPolicy {
        SigPolicy::default()
    }

    pub fn from_bits(bits: u32) -> SigPolicy {
        SigPolicy {
            no_sha1: bits & Self::NO_SHA1HEADER != 0,
            no_dsa: bits & Self::NO_DSAHEADER != 0,
            no_rsa: bits & Self::NO_RSAHEADER != 0,
        }
    }
}

/// Pick the strongest enabled candidate tag out of `entries[search_from..]`
/// by the fixed priority `RSA > DSA > SHA1` (§4.4), or the signature
/// header's own `SIG_DSA/SIG_RSA/SIG_SHA1` priority `DSA > RSA > SHA1`
/// (§4.5 step 3) — callers pass the tag triple in priority order.
fn select_candidate(entries: &[Entry], search_from: usize, priority: [(u32, bool); 3]) -> Option<usize> {
    let trailing = &entries[search_from..];
    for (tag, disabled) in priority {
        if disabled {
            continue;
        }
        if let Some(pos) = trailing.iter().position(|e| e.tag == tag) {
            return Some(search_from + pos);
        }
    }
    None
}

/// §4.4: scan the header-only tags appended outside the immutable
/// region of the metadata header.
pub fn select_header_signature(blob: &HeaderBlob, policy: SigPolicy) -> Option<usize> {
    select_candidate(
        blob.entries(),
        blob.ril() as usize,
        [
            (RPMTAG_RSAHEADER, policy.no_rsa),
            (RPMTAG_DSAHEADER, policy.no_dsa),
            (RPMTAG_SHA1HEADER, policy.no_sha1),
        ],
    )
}

/// §4.5 step 3: scan the whole signature header, `DSA > RSA > SHA1`.
pub fn select_package_signature(entries: &[Entry], policy: SigPolicy) -> Option<usize> {
    select_candidate(
        entries,
        0,
        [
            (SIG_DSA, policy.no_dsa),
            (SIG_RSA, policy.no_rsa),
            (SIG_SHA1, policy.no_sha1),
        ],
    )
}

/// §4.4 in full: find, parse, and verify the header-only signature or
/// digest. `Ok(Verdict::NotFound)` (not an error) when no enabled
/// candidate exists — the caller treats the blob's structural validity
/// as sufficient in that case.
pub fn verify_header_signature(
    blob: &HeaderBlob,
    policy: SigPolicy,
    parser: &dyn SignatureParser,
    verifier: &dyn SignatureVerifier,
    keyring: &dyn Keyring,
) -> Result<Verdict> {
    let Some(idx) = select_header_signature(blob, policy) else {
        return Ok(Verdict::NotFound);
    };
    let entry = blob.entries()[idx];
    let len = crate::entry::payload_len(entry.ty, entry.count, blob.data(), entry.offset)
        .map_err(|_| ReadError::BadHeaderEntry(idx, "malformed signature payload"))?;
    let start = entry.offset as usize;
    let raw = &blob.data()[start..start + len];

    let sig_info = parser.parse(entry.tag, entry.ty, raw)?;

    let mut ctx = crate::digest::init(sig_info.hash_algo);
    ctx.update(&HEADER_MAGIC);
    ctx.update(&blob.immutable_region_blob());
    let digest = ctx.finalize();

    Ok(verifier.verify(keyring, &sig_info, &digest))
}
