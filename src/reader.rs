//! §4.5 PackageReader: the orchestrator. Wires together every other
//! component in the fixed sequence the on-disk format requires.

use std::io::Read;

use crate::entry::EntryType;
use crate::error::Verdict;
use crate::errormapper;
use crate::header::Header;
use crate::header_blob::HeaderBlob;
use crate::keystash::KeyIdStash;
use crate::lead::{LeadOutcome, LeadReader, LeadType};
use crate::sig::{self, SigPolicy, HEADER_MAGIC};
use crate::sigheader;
use crate::tags;
use crate::verify::{Keyring, SignatureParser, SignatureVerifier};

/// `read_package`'s return value, matching §6.
#[derive(Debug)]
pub struct ReadOutcome {
    pub verdict: Verdict,
    pub header: Option<Header>,
    pub keyid: u32,
    pub message: Option<String>,
}

impl ReadOutcome {
    fn not_a_package() -> ReadOutcome {
        ReadOutcome {
            verdict: Verdict::NotFound,
            header: None,
            keyid: 0,
            message: None,
        }
    }

    fn fail(message: impl Into<String>) -> ReadOutcome {
        ReadOutcome {
            verdict: Verdict::Fail,
            header: None,
            keyid: 0,
            message: Some(message.into()),
        }
    }
}

/// The orchestrator's collaborators, bundled so embedding applications
/// can swap any of them. `keyring` and `verifier` have no default —
/// trust policy and key management are out of scope for this crate.
pub struct PackageReader<'a> {
    pub lead_reader: &'a dyn LeadReader,
    pub sig_parser: &'a dyn SignatureParser,
    pub verifier: &'a dyn SignatureVerifier,
    pub keyring: &'a dyn Keyring,
    pub policy: SigPolicy,
    pub stash: &'a KeyIdStash,
}

impl<'a> PackageReader<'a> {
    /// §4.5 in full, steps 1–8.
    pub fn read<R: Read>(&self, reader: &mut R) -> ReadOutcome {
        let outcome = self.read_inner(reader);
        errormapper::log_verdict(outcome.verdict, outcome.keyid, outcome.message.as_deref(), self.stash);
        outcome
    }

    fn read_inner<R: Read>(&self, reader: &mut R) -> ReadOutcome {
        // step 1: lead.
        let lead_type = match self.lead_reader.read(reader) {
            Ok(LeadOutcome::Found(ty)) => Some(ty),
            Ok(LeadOutcome::NotFound) => return ReadOutcome::not_a_package(),
            Err(e) => return ReadOutcome::fail(e.to_string()),
        };

        // step 2: signature header.
        let sig_header = match sigheader::read_signature_header(reader) {
            Ok(blob) => blob,
            Err(e) => return ReadOutcome::fail(e.to_string()),
        };

        // step 3: algorithm selection over the signature header.
        let chosen_idx = sig::select_package_signature(sig_header.entries(), self.policy);

        // step 4: metadata header.
        let meta_header = match HeaderBlob::read_from_stream(
            reader,
            HEADER_MAGIC,
            tags::HEADER_IMMUTABLE,
            true,
        ) {
            Ok(blob) => blob,
            Err(e) => return ReadOutcome::fail(e.to_string()),
        };

        if meta_header.has_region() && meta_header.il() > meta_header.ril() {
            let header_sig_tag = sig::select_header_signature(&meta_header, self.policy)
                .and_then(|idx| meta_header.entries().get(idx))
                .map(|e| e.tag);
            match sig::verify_header_signature(
                &meta_header,
                self.policy,
                self.sig_parser,
                self.verifier,
                self.keyring,
            ) {
                Ok(Verdict::Fail) => {
                    return ReadOutcome::fail(format!(
                        "verification failed: header-only signature over tag {}",
                        header_sig_tag.unwrap_or(0)
                    ))
                }
                Ok(_) => {}
                Err(e) => return ReadOutcome::fail(e.to_string()),
            }
        }

        // step 5: package-level verification.
        let (verdict, keyid, chosen_algo_name) = match chosen_idx {
            None => (Verdict::NotFound, 0u32, None),
            Some(idx) => {
                let entry = sig_header.entries()[idx];
                let len = match crate::entry::payload_len(
                    entry.ty,
                    entry.count,
                    sig_header.data(),
                    entry.offset,
                ) {
                    Ok(len) => len,
                    Err(e) => return ReadOutcome::fail(e.to_string()),
                };
                let start = entry.offset as usize;
                let raw = &sig_header.data()[start..start + len];

                let sig_info = match self.sig_parser.parse(entry.tag, entry.ty, raw) {
                    Ok(info) => info,
                    Err(e) => return ReadOutcome::fail(e.to_string()),
                };

                let mut ctx = crate::digest::init(sig_info.hash_algo);
                ctx.update(&HEADER_MAGIC);
                ctx.update(&meta_header.immutable_region_blob());
                let digest = ctx.finalize();

                let verdict = self.verifier.verify(self.keyring, &sig_info, &digest);
                let keyid = sig_info
                    .signer_keyid
                    .map(|id| u32::from_be_bytes([id[4], id[5], id[6], id[7]]))
                    .unwrap_or(0);
                (verdict, keyid, Some(sig_info.hash_algo.name()))
            }
        };

        if verdict == Verdict::Fail {
            let tag = chosen_idx
                .and_then(|idx| sig_header.entries().get(idx))
                .map(|e| e.tag)
                .unwrap_or(0);
            return ReadOutcome {
                verdict,
                header: None,
                keyid,
                message: Some(format!(
                    "verification failed: {} over tag {}",
                    chosen_algo_name.unwrap_or("unknown"),
                    tag
                )),
            };
        }

        let had_region = meta_header.has_region();
        let mut header = Header::from_blob(meta_header);

        // step 6: retrofits.
        let is_source = matches!(lead_type, Some(LeadType::Source));
        if is_source && !header.is_entry(tags::SOURCEPACKAGE) {
            header.put(tags::SOURCEPACKAGE, EntryType::Int32, &1i32.to_be_bytes());
        }
        // §4.5 step 6, literal reading: "if the header is a source package
        // but SOURCEPACKAGE is still absent, set SOURCERPM". The only
        // source-package signal this crate has is `is_source` above, and
        // the branch just above always adds SOURCEPACKAGE when it was
        // missing — so "still absent" never holds and this is a no-op.
        if is_source && !header.is_entry(tags::SOURCEPACKAGE) && !header.is_entry(tags::SOURCERPM) {
            header.put(tags::SOURCERPM, EntryType::String, b"(none)\0");
        }
        if !had_region {
            header.convert_v3_region();
        } else if header.needs_old_filenames_conversion() {
            if let Err(e) = header.convert_old_filenames() {
                return ReadOutcome::fail(e.to_string());
            }
        }

        // step 7: legacy signature-tag merge.
        if let Err(e) = header.merge_legacy_signature_tags(sig_header.entries(), sig_header.data()) {
            return ReadOutcome::fail(e.to_string());
        }

        // step 8: key id extraction already folded into `keyid` above.
        let message = match verdict {
            Verdict::Ok => Some("Header sanity check: OK".to_string()),
            Verdict::NotFound => Some("no enabled signature or digest tag present".to_string()),
            _ => None,
        };

        ReadOutcome {
            verdict,
            header: Some(header),
            keyid,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::HashAlgo;
    use crate::entry::EntryType as EType;
    use crate::lead::DefaultLeadReader;
    use crate::sig::HEADER_MAGIC as MAGIC;
    use crate::verify::{DefaultSignatureParser, SigInfo};
    use pretty_assertions::assert_eq;

    struct NullKeyring;
    impl Keyring for NullKeyring {}

    struct AlwaysOk;
    impl SignatureVerifier for AlwaysOk {
        fn verify(&self, _keyring: &dyn Keyring, _sig: &SigInfo, _digest: &[u8]) -> Verdict {
            Verdict::Ok
        }
    }

    struct AlwaysNoKey;
    impl SignatureVerifier for AlwaysNoKey {
        fn verify(&self, _keyring: &dyn Keyring, _sig: &SigInfo, _digest: &[u8]) -> Verdict {
            Verdict::NoKey
        }
    }

    fn record(tag: u32, ty: u32, offset: u32, count: u32) -> [u8; 16] {
        let mut buf = [0u8; 16];
        buf[0..4].copy_from_slice(&tag.to_be_bytes());
        buf[4..8].copy_from_slice(&ty.to_be_bytes());
        buf[8..12].copy_from_slice(&offset.to_be_bytes());
        buf[12..16].copy_from_slice(&count.to_be_bytes());
        buf
    }

    fn lead_bytes(type_field: u16) -> Vec<u8> {
        let mut buf = vec![0u8; 96];
        buf[0..4].copy_from_slice(&[0xed, 0xab, 0xee, 0xdb]);
        buf[6..8].copy_from_slice(&type_field.to_be_bytes());
        buf
    }

    /// A signature header with no signature/digest tags and a metadata
    /// header with a trivial immutable region; `vsflags = ALL_DISABLE`
    /// should yield `Ok` with an empty keyid (scenario 4, spec.md §8).
    fn well_formed_unsigned_package() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&lead_bytes(0));

        // signature header: il=0, dl=0.
        buf.extend_from_slice(&MAGIC);
        buf.extend_from_slice(&0u32.to_be_bytes());
        buf.extend_from_slice(&0u32.to_be_bytes());

        // metadata header: one region tag + trailer, il=1 dl=16.
        buf.extend_from_slice(&MAGIC);
        buf.extend_from_slice(&1u32.to_be_bytes());
        buf.extend_from_slice(&16u32.to_be_bytes());
        buf.extend_from_slice(&record(tags::HEADER_IMMUTABLE, 7, 0, 16));
        buf.extend_from_slice(&record(tags::HEADER_IMMUTABLE, 7, (-16i32) as u32, 16));

        buf
    }

    #[test]
    fn well_formed_unsigned_header_reports_ok() {
        let stash = KeyIdStash::new();
        let parser = DefaultSignatureParser;
        let verifier = AlwaysOk;
        let keyring = NullKeyring;
        let lead_reader = DefaultLeadReader;
        let pr = PackageReader {
            lead_reader: &lead_reader,
            sig_parser: &parser,
            verifier: &verifier,
            keyring: &keyring,
            policy: SigPolicy::from_bits(SigPolicy::ALL_DISABLE),
            stash: &stash,
        };
        let mut cursor = std::io::Cursor::new(well_formed_unsigned_package());
        let outcome = pr.read(&mut cursor);
        assert_eq!(Verdict::Ok, outcome.verdict);
        assert_eq!(0, outcome.keyid);
        assert!(outcome.header.is_some());
    }

    #[test]
    fn text_manifest_is_not_found() {
        let stash = KeyIdStash::new();
        let parser = DefaultSignatureParser;
        let verifier = AlwaysOk;
        let keyring = NullKeyring;
        let lead_reader = DefaultLeadReader;
        let pr = PackageReader {
            lead_reader: &lead_reader,
            sig_parser: &parser,
            verifier: &verifier,
            keyring: &keyring,
            policy: SigPolicy::none_disabled(),
            stash: &stash,
        };
        let mut cursor = std::io::Cursor::new(b"Name: foo\n".to_vec());
        let outcome = pr.read(&mut cursor);
        assert_eq!(Verdict::NotFound, outcome.verdict);
        assert!(outcome.header.is_none());
        assert_eq!(0, outcome.keyid);
    }

    #[test]
    fn no_key_verdict_still_returns_header() {
        let stash = KeyIdStash::new();
        let parser = DefaultSignatureParser;
        let verifier = AlwaysNoKey;
        let keyring = NullKeyring;
        let lead_reader = DefaultLeadReader;
        let pr = PackageReader {
            lead_reader: &lead_reader,
            sig_parser: &parser,
            verifier: &verifier,
            keyring: &keyring,
            policy: SigPolicy::none_disabled(),
            stash: &stash,
        };

        // signature header with one SHA1 tag covering nothing meaningful.
        let mut buf = Vec::new();
        buf.extend_from_slice(&lead_bytes(0));
        buf.extend_from_slice(&MAGIC);
        buf.extend_from_slice(&1u32.to_be_bytes());
        buf.extend_from_slice(&41u32.to_be_bytes());
        buf.extend_from_slice(&record(tags::SIG_SHA1, EType::String.as_u32(), 0, 1));
        let mut hex = vec![b'a'; 40];
        hex.push(0);
        buf.extend_from_slice(&hex);
        buf.extend_from_slice(&[0u8; 7]); // dl=41 is not 8-aligned: §6 padding

        buf.extend_from_slice(&MAGIC);
        buf.extend_from_slice(&1u32.to_be_bytes());
        buf.extend_from_slice(&16u32.to_be_bytes());
        buf.extend_from_slice(&record(tags::HEADER_IMMUTABLE, 7, 0, 16));
        buf.extend_from_slice(&record(tags::HEADER_IMMUTABLE, 7, (-16i32) as u32, 16));

        let mut cursor = std::io::Cursor::new(buf);
        let outcome = pr.read(&mut cursor);
        assert_eq!(Verdict::NoKey, outcome.verdict);
        assert!(outcome.header.is_some());
        let _ = HashAlgo::Sha1;
    }
}
